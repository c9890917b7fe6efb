use std::sync::Arc;

use serde::Serialize;

use crate::DomainResult;
use crate::boards::Board;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::limits::evaluate_posting_limit;
use crate::notifications::{Notification, NotificationKind, dispatch};
use crate::ports::boards::BoardRepository;
use crate::ports::notifications::NotificationSink;
use crate::ports::posts::PostRepository;
use crate::posts::{ModerationStatus, Post};
use crate::screening::ContentScreener;
use crate::util::now_ms;

pub const CONTENT_FLAGGED_PREFIX: &str = "Content flagged for: ";
const DEFAULT_DELETE_REASON: &str = "Deleted by moderator";

/// Allow/deny decision for a new post. Denial is an expected branch of the
/// submission flow and carries a human-readable reason.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Allowed,
    Denied { reason: String },
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Post-creation decision, short-circuiting on the first denial:
/// limits first, then content screening. Screening is a moderation feature,
/// so it is skipped entirely when the board has moderation off.
pub fn evaluate_new_post(
    screener: &ContentScreener,
    board: &Board,
    text: &str,
    existing_post_count: u64,
) -> Verdict {
    let limit = evaluate_posting_limit(board, existing_post_count);
    if !limit.allowed {
        return Verdict::Denied {
            reason: limit
                .reason
                .unwrap_or_else(|| "posting limit exceeded".to_string()),
        };
    }

    if !board.moderation_enabled {
        return Verdict::Allowed;
    }

    let outcome = screener.screen(text);
    if !outcome.allowed {
        return Verdict::Denied {
            reason: format!("{CONTENT_FLAGGED_PREFIX}{}", outcome.reasons.join(", ")),
        };
    }
    Verdict::Allowed
}

/// Moderator-initiated state transitions on existing posts. Every transition
/// requires moderation rights on the post's board: the board creator or a
/// granted moderator.
#[derive(Clone)]
pub struct ModerationService {
    boards: Arc<dyn BoardRepository>,
    posts: Arc<dyn PostRepository>,
    notifications: Arc<dyn NotificationSink>,
}

impl ModerationService {
    pub fn new(
        boards: Arc<dyn BoardRepository>,
        posts: Arc<dyn PostRepository>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            boards,
            posts,
            notifications,
        }
    }

    pub async fn approve(&self, actor: &ActorIdentity, post_id: &str) -> DomainResult<Post> {
        let (mut post, _board) = self.load_for_moderation(actor, post_id).await?;
        let now = now_ms();
        post.moderation_status = ModerationStatus::Approved;
        post.moderation_reason = None;
        post.moderated_by = Some(actor.user_id.clone());
        post.moderated_at_ms = Some(now);
        post.updated_at_ms = now;
        let post = self.posts.update_post(&post).await?;

        dispatch(
            &*self.notifications,
            Notification::for_post(
                &post.author_id,
                NotificationKind::PostApproved,
                "Post approved",
                "Your post was approved by a moderator.",
                &post.post_id,
                &post.board_id,
            ),
        )
        .await;
        Ok(post)
    }

    pub async fn request_change(
        &self,
        actor: &ActorIdentity,
        post_id: &str,
        reason: &str,
    ) -> DomainResult<Post> {
        let reason = non_empty_reason(reason)?;
        let (mut post, _board) = self.load_for_moderation(actor, post_id).await?;
        let now = now_ms();
        post.moderation_status = ModerationStatus::ChangeRequested;
        post.moderation_reason = Some(reason.clone());
        post.moderated_by = Some(actor.user_id.clone());
        post.moderated_at_ms = Some(now);
        post.updated_at_ms = now;
        let post = self.posts.update_post(&post).await?;

        dispatch(
            &*self.notifications,
            Notification::for_post(
                &post.author_id,
                NotificationKind::PostRejected,
                "Changes requested",
                format!("A moderator requested changes: {reason}"),
                &post.post_id,
                &post.board_id,
            ),
        )
        .await;
        Ok(post)
    }

    /// Records when the post should be swept and why. Deletion itself is the
    /// external scheduled job's business; if the post is updated before the
    /// date, that job skips it.
    pub async fn schedule_deletion(
        &self,
        actor: &ActorIdentity,
        post_id: &str,
        delete_at_ms: i64,
        reason: &str,
    ) -> DomainResult<Post> {
        let reason = non_empty_reason(reason)?;
        let (mut post, _board) = self.load_for_moderation(actor, post_id).await?;
        let now = now_ms();
        if delete_at_ms <= now {
            return Err(DomainError::Validation(
                "delete date must be in the future".into(),
            ));
        }
        post.delete_scheduled_at_ms = Some(delete_at_ms);
        post.delete_reason = Some(reason);
        post.moderated_by = Some(actor.user_id.clone());
        post.moderated_at_ms = Some(now);
        post.updated_at_ms = now;
        self.posts.update_post(&post).await
    }

    pub async fn delete(
        &self,
        actor: &ActorIdentity,
        post_id: &str,
        reason: Option<&str>,
    ) -> DomainResult<Post> {
        let (mut post, _board) = self.load_for_moderation(actor, post_id).await?;
        let now = now_ms();
        let reason = reason
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or(DEFAULT_DELETE_REASON)
            .to_string();
        post.is_deleted = true;
        post.delete_reason = Some(reason.clone());
        post.moderated_by = Some(actor.user_id.clone());
        post.moderated_at_ms = Some(now);
        post.updated_at_ms = now;
        let post = self.posts.update_post(&post).await?;

        dispatch(
            &*self.notifications,
            Notification::for_post(
                &post.author_id,
                NotificationKind::PostHidden,
                "Post removed",
                reason,
                &post.post_id,
                &post.board_id,
            ),
        )
        .await;
        Ok(post)
    }

    async fn load_for_moderation(
        &self,
        actor: &ActorIdentity,
        post_id: &str,
    ) -> DomainResult<(Post, Board)> {
        let post = self
            .posts
            .get_post(post_id)
            .await?
            .filter(|post| !post.is_deleted)
            .ok_or(DomainError::NotFound)?;
        let board = self
            .boards
            .get_board(&post.board_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        if actor.user_id != board.creator_id
            && self
                .boards
                .get_grant(&board.board_id, &actor.user_id)
                .await?
                .is_none()
        {
            return Err(DomainError::Forbidden(
                "moderation rights required for this board".into(),
            ));
        }
        Ok((post, board))
    }
}

fn non_empty_reason(reason: &str) -> DomainResult<String> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(DomainError::Validation("reason is required".into()));
    }
    Ok(reason.to_string())
}
