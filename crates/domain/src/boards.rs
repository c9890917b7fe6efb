use std::sync::Arc;
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::ports::boards::BoardRepository;
use crate::util::{now_ms, uuid_v7_without_dashes};

const MAX_TITLE_LENGTH: usize = 200;
const MAX_RECIPIENT_LENGTH: usize = 120;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PostingMode {
    Single,
    Multiple,
}

impl PostingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
        }
    }
}

impl fmt::Display for PostingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostingMode {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "single" => Ok(Self::Single),
            "multiple" => Ok(Self::Multiple),
            _ => Err("unknown posting mode"),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BoardVisibility {
    Public,
    Private,
}

impl BoardVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for BoardVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoardVisibility {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            _ => Err("unknown board visibility"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Board {
    pub board_id: String,
    pub creator_id: String,
    pub title: String,
    pub recipient_name: String,
    pub posting_mode: PostingMode,
    pub max_posts_per_user: Option<u32>,
    pub moderation_enabled: bool,
    pub allow_anonymous: bool,
    pub visibility: BoardVisibility,
    pub expires_at_ms: Option<i64>,
    pub is_deleted: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Board {
    pub fn is_expired(&self, at_ms: i64) -> bool {
        self.expires_at_ms.is_some_and(|expires| expires <= at_ms)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeratorGrant {
    pub board_id: String,
    pub user_id: String,
    pub granted_by: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct BoardCreate {
    pub title: String,
    pub recipient_name: String,
    pub posting_mode: PostingMode,
    pub max_posts_per_user: Option<u32>,
    pub moderation_enabled: bool,
    pub allow_anonymous: bool,
    pub visibility: BoardVisibility,
    pub expires_at_ms: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct BoardUpdate {
    pub title: Option<String>,
    pub recipient_name: Option<String>,
    pub posting_mode: Option<PostingMode>,
    pub max_posts_per_user: Option<u32>,
    pub moderation_enabled: Option<bool>,
    pub allow_anonymous: Option<bool>,
    pub visibility: Option<BoardVisibility>,
    pub expires_at_ms: Option<i64>,
}

#[derive(Clone)]
pub struct BoardService {
    repository: Arc<dyn BoardRepository>,
}

impl BoardService {
    pub fn new(repository: Arc<dyn BoardRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, actor: &ActorIdentity, input: BoardCreate) -> DomainResult<Board> {
        let now = now_ms();
        let input = validate_board_create(input, now)?;
        let board = Board {
            board_id: uuid_v7_without_dashes(),
            creator_id: actor.user_id.clone(),
            title: input.title,
            recipient_name: input.recipient_name,
            posting_mode: input.posting_mode,
            max_posts_per_user: input.max_posts_per_user,
            moderation_enabled: input.moderation_enabled,
            allow_anonymous: input.allow_anonymous,
            visibility: input.visibility,
            expires_at_ms: input.expires_at_ms,
            is_deleted: false,
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.repository.create_board(&board).await
    }

    pub async fn get(&self, board_id: &str) -> DomainResult<Board> {
        self.repository
            .get_board(board_id)
            .await?
            .filter(|board| !board.is_deleted)
            .ok_or(DomainError::NotFound)
    }

    pub async fn update(
        &self,
        actor: &ActorIdentity,
        board_id: &str,
        update: BoardUpdate,
    ) -> DomainResult<Board> {
        let mut board = self.get(board_id).await?;
        ensure_creator(&board, actor)?;

        let now = now_ms();
        if let Some(title) = update.title {
            board.title = title;
        }
        if let Some(recipient_name) = update.recipient_name {
            board.recipient_name = recipient_name;
        }
        if let Some(posting_mode) = update.posting_mode {
            board.posting_mode = posting_mode;
        }
        if let Some(max) = update.max_posts_per_user {
            board.max_posts_per_user = Some(max);
        }
        if let Some(moderation_enabled) = update.moderation_enabled {
            board.moderation_enabled = moderation_enabled;
        }
        if let Some(allow_anonymous) = update.allow_anonymous {
            board.allow_anonymous = allow_anonymous;
        }
        if let Some(visibility) = update.visibility {
            board.visibility = visibility;
        }
        if let Some(expires_at_ms) = update.expires_at_ms {
            board.expires_at_ms = Some(expires_at_ms);
        }

        // The merged configuration must satisfy the same invariants as a
        // fresh board; the posting-mode cap invariant is only enforced here
        // and at creation, never per post.
        validate_board_config(&board)?;
        board.updated_at_ms = now;
        self.repository.update_board(&board).await
    }

    pub async fn delete(&self, actor: &ActorIdentity, board_id: &str) -> DomainResult<()> {
        let mut board = self.get(board_id).await?;
        ensure_creator(&board, actor)?;
        board.is_deleted = true;
        board.updated_at_ms = now_ms();
        self.repository.update_board(&board).await?;
        Ok(())
    }

    pub async fn add_moderator(
        &self,
        actor: &ActorIdentity,
        board_id: &str,
        user_id: &str,
    ) -> DomainResult<ModeratorGrant> {
        let board = self.get(board_id).await?;
        ensure_creator(&board, actor)?;

        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(DomainError::Validation("user_id is required".into()));
        }
        if user_id == board.creator_id {
            return Err(DomainError::Validation(
                "board creator already has moderation rights".into(),
            ));
        }
        if self.repository.get_grant(board_id, user_id).await?.is_some() {
            return Err(DomainError::Validation(
                "user is already a moderator on this board".into(),
            ));
        }

        let grant = ModeratorGrant {
            board_id: board.board_id,
            user_id: user_id.to_string(),
            granted_by: actor.user_id.clone(),
            created_at_ms: now_ms(),
        };
        self.repository.create_grant(&grant).await
    }

    pub async fn remove_moderator(
        &self,
        actor: &ActorIdentity,
        board_id: &str,
        user_id: &str,
    ) -> DomainResult<()> {
        let board = self.get(board_id).await?;
        ensure_creator(&board, actor)?;
        let removed = self.repository.delete_grant(board_id, user_id).await?;
        if !removed {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    pub async fn list_moderators(
        &self,
        actor: &ActorIdentity,
        board_id: &str,
    ) -> DomainResult<Vec<ModeratorGrant>> {
        let board = self.get(board_id).await?;
        if actor.user_id != board.creator_id
            && self
                .repository
                .get_grant(board_id, &actor.user_id)
                .await?
                .is_none()
        {
            return Err(DomainError::Forbidden(
                "moderation rights required for this board".into(),
            ));
        }
        self.repository.list_grants(board_id).await
    }
}

fn ensure_creator(board: &Board, actor: &ActorIdentity) -> DomainResult<()> {
    if actor.user_id == board.creator_id {
        return Ok(());
    }
    Err(DomainError::Forbidden(
        "only the board creator can do this".into(),
    ))
}

fn validate_board_create(mut input: BoardCreate, now_ms: i64) -> DomainResult<BoardCreate> {
    input.title = input.title.trim().to_string();
    if input.title.is_empty() {
        return Err(DomainError::Validation("title is required".into()));
    }
    if input.title.chars().count() > MAX_TITLE_LENGTH {
        return Err(DomainError::Validation(format!(
            "title exceeds max length of {MAX_TITLE_LENGTH}"
        )));
    }

    input.recipient_name = input.recipient_name.trim().to_string();
    if input.recipient_name.is_empty() {
        return Err(DomainError::Validation("recipient_name is required".into()));
    }
    if input.recipient_name.chars().count() > MAX_RECIPIENT_LENGTH {
        return Err(DomainError::Validation(format!(
            "recipient_name exceeds max length of {MAX_RECIPIENT_LENGTH}"
        )));
    }

    if input.expires_at_ms.is_some_and(|expires| expires <= now_ms) {
        return Err(DomainError::Validation(
            "expiration must be in the future".into(),
        ));
    }

    validate_posting_config(input.posting_mode, input.max_posts_per_user)?;
    Ok(input)
}

fn validate_board_config(board: &Board) -> DomainResult<()> {
    validate_posting_config(board.posting_mode, board.max_posts_per_user)
}

fn validate_posting_config(mode: PostingMode, max_posts_per_user: Option<u32>) -> DomainResult<()> {
    if max_posts_per_user == Some(0) {
        return Err(DomainError::Validation(
            "max_posts_per_user must be at least 1".into(),
        ));
    }
    if mode == PostingMode::Single && max_posts_per_user.is_some_and(|max| max > 1) {
        return Err(DomainError::Validation(
            "single posting mode allows at most one post per user".into(),
        ));
    }
    Ok(())
}
