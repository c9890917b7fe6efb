//! In-memory adapters for the domain ports. The `RwLock` serializes writes
//! within one process; no transactional guarantee is claimed beyond that,
//! in particular the posting-limit read-count-then-insert race is only
//! masked here, not solved.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use danke_domain::DomainResult;
use danke_domain::boards::{Board, ModeratorGrant};
use danke_domain::error::DomainError;
use danke_domain::notifications::Notification;
use danke_domain::ports::BoxFuture;
use danke_domain::ports::boards::BoardRepository;
use danke_domain::ports::notifications::NotificationSink;
use danke_domain::ports::posts::PostRepository;
use danke_domain::posts::Post;
use danke_domain::util::format_ms_rfc3339;

#[derive(Default)]
pub struct InMemoryBoardRepository {
    boards: Arc<RwLock<HashMap<String, Board>>>,
    grants: Arc<RwLock<HashMap<(String, String), ModeratorGrant>>>,
}

impl InMemoryBoardRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BoardRepository for InMemoryBoardRepository {
    fn create_board(&self, board: &Board) -> BoxFuture<'_, DomainResult<Board>> {
        let board = board.clone();
        let map = self.boards.clone();
        Box::pin(async move {
            let mut map = map.write().await;
            if map.contains_key(&board.board_id) {
                return Err(DomainError::Conflict);
            }
            map.insert(board.board_id.clone(), board.clone());
            Ok(board)
        })
    }

    fn get_board(&self, board_id: &str) -> BoxFuture<'_, DomainResult<Option<Board>>> {
        let key = board_id.to_string();
        let map = self.boards.clone();
        Box::pin(async move { Ok(map.read().await.get(&key).cloned()) })
    }

    fn update_board(&self, board: &Board) -> BoxFuture<'_, DomainResult<Board>> {
        let board = board.clone();
        let map = self.boards.clone();
        Box::pin(async move {
            let mut map = map.write().await;
            if !map.contains_key(&board.board_id) {
                return Err(DomainError::NotFound);
            }
            map.insert(board.board_id.clone(), board.clone());
            Ok(board)
        })
    }

    fn create_grant(
        &self,
        grant: &ModeratorGrant,
    ) -> BoxFuture<'_, DomainResult<ModeratorGrant>> {
        let grant = grant.clone();
        let map = self.grants.clone();
        Box::pin(async move {
            let key = (grant.board_id.clone(), grant.user_id.clone());
            let mut map = map.write().await;
            if map.contains_key(&key) {
                return Err(DomainError::Conflict);
            }
            map.insert(key, grant.clone());
            Ok(grant)
        })
    }

    fn delete_grant(&self, board_id: &str, user_id: &str) -> BoxFuture<'_, DomainResult<bool>> {
        let key = (board_id.to_string(), user_id.to_string());
        let map = self.grants.clone();
        Box::pin(async move { Ok(map.write().await.remove(&key).is_some()) })
    }

    fn get_grant(
        &self,
        board_id: &str,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<ModeratorGrant>>> {
        let key = (board_id.to_string(), user_id.to_string());
        let map = self.grants.clone();
        Box::pin(async move { Ok(map.read().await.get(&key).cloned()) })
    }

    fn list_grants(&self, board_id: &str) -> BoxFuture<'_, DomainResult<Vec<ModeratorGrant>>> {
        let target = board_id.to_string();
        let map = self.grants.clone();
        Box::pin(async move {
            let mut rows: Vec<_> = map
                .read()
                .await
                .values()
                .filter(|grant| grant.board_id == target)
                .cloned()
                .collect();
            rows.sort_by(|left, right| {
                left.created_at_ms
                    .cmp(&right.created_at_ms)
                    .then_with(|| left.user_id.cmp(&right.user_id))
            });
            Ok(rows)
        })
    }
}

#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: Arc<RwLock<HashMap<String, Post>>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostRepository for InMemoryPostRepository {
    fn create_post(&self, post: &Post) -> BoxFuture<'_, DomainResult<Post>> {
        let post = post.clone();
        let map = self.posts.clone();
        Box::pin(async move {
            let mut map = map.write().await;
            if map.contains_key(&post.post_id) {
                return Err(DomainError::Conflict);
            }
            map.insert(post.post_id.clone(), post.clone());
            Ok(post)
        })
    }

    fn get_post(&self, post_id: &str) -> BoxFuture<'_, DomainResult<Option<Post>>> {
        let key = post_id.to_string();
        let map = self.posts.clone();
        Box::pin(async move { Ok(map.read().await.get(&key).cloned()) })
    }

    fn update_post(&self, post: &Post) -> BoxFuture<'_, DomainResult<Post>> {
        let post = post.clone();
        let map = self.posts.clone();
        Box::pin(async move {
            let mut map = map.write().await;
            if !map.contains_key(&post.post_id) {
                return Err(DomainError::NotFound);
            }
            map.insert(post.post_id.clone(), post.clone());
            Ok(post)
        })
    }

    fn list_by_board(&self, board_id: &str) -> BoxFuture<'_, DomainResult<Vec<Post>>> {
        let target = board_id.to_string();
        let map = self.posts.clone();
        Box::pin(async move {
            let mut rows: Vec<_> = map
                .read()
                .await
                .values()
                .filter(|post| post.board_id == target && !post.is_deleted)
                .cloned()
                .collect();
            rows.sort_by(|left, right| {
                right
                    .created_at_ms
                    .cmp(&left.created_at_ms)
                    .then_with(|| right.post_id.cmp(&left.post_id))
            });
            Ok(rows)
        })
    }

    fn count_active_by_author(
        &self,
        board_id: &str,
        author_id: &str,
    ) -> BoxFuture<'_, DomainResult<u64>> {
        let board_id = board_id.to_string();
        let author_id = author_id.to_string();
        let map = self.posts.clone();
        Box::pin(async move {
            let count = map
                .read()
                .await
                .values()
                .filter(|post| {
                    post.board_id == board_id && post.author_id == author_id && !post.is_deleted
                })
                .count();
            Ok(count as u64)
        })
    }
}

/// Default sink: deliveries are logged. The real delivery channel (email,
/// in-app inbox) lives outside this system.
#[derive(Default)]
pub struct TracingNotificationSink;

impl TracingNotificationSink {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for TracingNotificationSink {
    fn deliver(&self, notification: &Notification) -> BoxFuture<'_, DomainResult<()>> {
        let notification = notification.clone();
        Box::pin(async move {
            tracing::info!(
                user_id = %notification.user_id,
                kind = notification.kind.as_str(),
                title = %notification.title,
                post_id = notification.post_id.as_deref().unwrap_or("-"),
                at = %format_ms_rfc3339(notification.created_at_ms),
                "notification"
            );
            Ok(())
        })
    }
}

/// Captures deliveries for inspection in tests.
#[derive(Default)]
pub struct RecordingNotificationSink {
    delivered: Arc<RwLock<Vec<Notification>>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn delivered(&self) -> Vec<Notification> {
        self.delivered.read().await.clone()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn deliver(&self, notification: &Notification) -> BoxFuture<'_, DomainResult<()>> {
        let notification = notification.clone();
        let delivered = self.delivered.clone();
        Box::pin(async move {
            delivered.write().await.push(notification);
            Ok(())
        })
    }
}
