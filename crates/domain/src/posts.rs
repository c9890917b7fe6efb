use std::sync::Arc;
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::moderation::{Verdict, evaluate_new_post};
use crate::ports::boards::BoardRepository;
use crate::ports::posts::PostRepository;
use crate::screening::{ContentScreener, extract_plain_text};
use crate::util::{now_ms, uuid_v7_without_dashes};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    Approved,
    ChangeRequested,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::ChangeRequested => "change_requested",
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "change_requested" => Ok(Self::ChangeRequested),
            _ => Err("unknown moderation status"),
        }
    }
}

/// The rich-text payload is opaque to this crate: it is stored as-is and
/// only walked for plain text when the screener needs it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PostContent(serde_json::Value);

impl PostContent {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn plain_text(&self) -> String {
        extract_plain_text(&self.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub post_id: String,
    pub board_id: String,
    pub author_id: String,
    pub content: PostContent,
    pub is_anonymous: bool,
    pub is_deleted: bool,
    pub moderation_status: ModerationStatus,
    pub moderation_reason: Option<String>,
    pub moderated_by: Option<String>,
    pub moderated_at_ms: Option<i64>,
    pub delete_scheduled_at_ms: Option<i64>,
    pub delete_reason: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct PostCreate {
    pub content: PostContent,
    pub is_anonymous: bool,
}

/// The normal-path outcome of a submission. A denied verdict is an expected
/// branch of the creation flow, not an error; nothing is persisted for it.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Submission {
    Created(Post),
    Denied { reason: String },
}

#[derive(Clone)]
pub struct PostService {
    boards: Arc<dyn BoardRepository>,
    posts: Arc<dyn PostRepository>,
    screener: ContentScreener,
}

impl PostService {
    pub fn new(
        boards: Arc<dyn BoardRepository>,
        posts: Arc<dyn PostRepository>,
        screener: ContentScreener,
    ) -> Self {
        Self {
            boards,
            posts,
            screener,
        }
    }

    pub async fn submit(
        &self,
        actor: Option<&ActorIdentity>,
        board_id: &str,
        input: PostCreate,
    ) -> DomainResult<Submission> {
        let board = self
            .boards
            .get_board(board_id)
            .await?
            .filter(|board| !board.is_deleted)
            .ok_or(DomainError::NotFound)?;

        let now = now_ms();
        if board.is_expired(now) {
            return Err(DomainError::Validation("board has expired".into()));
        }
        if input.is_anonymous && !board.allow_anonymous {
            return Err(DomainError::Validation(
                "anonymous posts are not allowed on this board".into(),
            ));
        }

        // Unauthenticated contributors are only accepted where the board
        // allows anonymous posting; each gets a fresh guest principal, so
        // per-user limits cannot track them across submissions.
        let (author_id, is_anonymous) = match actor {
            Some(actor) => (actor.user_id.clone(), input.is_anonymous),
            None => {
                if !board.allow_anonymous {
                    return Err(DomainError::Forbidden(
                        "sign in to post on this board".into(),
                    ));
                }
                (format!("guest-{}", uuid_v7_without_dashes()), true)
            }
        };

        let text = input.content.plain_text();
        if text.is_empty() {
            return Err(DomainError::Validation("post content is required".into()));
        }

        let existing = self
            .posts
            .count_active_by_author(&board.board_id, &author_id)
            .await?;

        match evaluate_new_post(&self.screener, &board, &text, existing) {
            Verdict::Denied { reason } => Ok(Submission::Denied { reason }),
            Verdict::Allowed => {
                let status = if board.moderation_enabled {
                    ModerationStatus::Pending
                } else {
                    ModerationStatus::Approved
                };
                let post = Post {
                    post_id: uuid_v7_without_dashes(),
                    board_id: board.board_id,
                    author_id,
                    content: input.content,
                    is_anonymous,
                    is_deleted: false,
                    moderation_status: status,
                    moderation_reason: None,
                    moderated_by: None,
                    moderated_at_ms: None,
                    delete_scheduled_at_ms: None,
                    delete_reason: None,
                    created_at_ms: now,
                    updated_at_ms: now,
                };
                let post = self.posts.create_post(&post).await?;
                Ok(Submission::Created(post))
            }
        }
    }

    pub async fn get(&self, post_id: &str) -> DomainResult<Post> {
        self.posts
            .get_post(post_id)
            .await?
            .filter(|post| !post.is_deleted)
            .ok_or(DomainError::NotFound)
    }

    pub async fn list_for_board(&self, board_id: &str) -> DomainResult<Vec<Post>> {
        self.boards
            .get_board(board_id)
            .await?
            .filter(|board| !board.is_deleted)
            .ok_or(DomainError::NotFound)?;
        self.posts.list_by_board(board_id).await
    }

    /// Authors soft-delete their own posts here; moderators go through the
    /// moderation service's delete transition instead.
    pub async fn delete_own(&self, actor: &ActorIdentity, post_id: &str) -> DomainResult<()> {
        let mut post = self.get(post_id).await?;
        if post.author_id != actor.user_id {
            return Err(DomainError::Forbidden(
                "only the author can delete this post".into(),
            ));
        }
        post.is_deleted = true;
        post.updated_at_ms = now_ms();
        self.posts.update_post(&post).await?;
        Ok(())
    }
}
