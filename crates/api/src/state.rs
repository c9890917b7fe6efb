use std::sync::Arc;

use danke_domain::access::AccessService;
use danke_domain::boards::{Board, BoardService};
use danke_domain::moderation::ModerationService;
use danke_domain::ports::boards::BoardRepository;
use danke_domain::ports::notifications::NotificationSink;
use danke_domain::ports::posts::PostRepository;
use danke_domain::posts::PostService;
use danke_domain::screening::ContentScreener;
use danke_infra::cache::TtlCache;
use danke_infra::config::AppConfig;
use danke_infra::repositories::{
    InMemoryBoardRepository, InMemoryPostRepository, TracingNotificationSink,
};

/// Composition root: every collaborator is constructed and wired here, then
/// shared by cloning. The board cache is plain state on this struct; its
/// sweeper lifecycle belongs to `main`.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub boards: BoardService,
    pub posts: PostService,
    pub moderation: ModerationService,
    pub access: AccessService,
    pub board_cache: TtlCache<String, Board>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self::with_components(
            config,
            Arc::new(InMemoryBoardRepository::new()),
            Arc::new(InMemoryPostRepository::new()),
            Arc::new(TracingNotificationSink::new()),
        )
    }

    pub fn with_components(
        config: AppConfig,
        board_repo: Arc<dyn BoardRepository>,
        post_repo: Arc<dyn PostRepository>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        let screener = ContentScreener::default();
        let board_cache = TtlCache::new(config.board_cache_ttl_ms);
        Self {
            config,
            boards: BoardService::new(board_repo.clone()),
            posts: PostService::new(board_repo.clone(), post_repo.clone(), screener),
            moderation: ModerationService::new(board_repo.clone(), post_repo, notifications),
            access: AccessService::new(board_repo),
            board_cache,
        }
    }
}
