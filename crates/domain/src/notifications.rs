use serde::{Deserialize, Serialize};

use crate::ports::notifications::NotificationSink;
use crate::util::now_ms;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PostApproved,
    PostRejected,
    PostHidden,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostApproved => "post_approved",
            Self::PostRejected => "post_rejected",
            Self::PostHidden => "post_hidden",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub post_id: Option<String>,
    pub board_id: Option<String>,
    pub created_at_ms: i64,
}

impl Notification {
    pub fn for_post(
        user_id: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        post_id: impl Into<String>,
        board_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            post_id: Some(post_id.into()),
            board_id: Some(board_id.into()),
            created_at_ms: now_ms(),
        }
    }
}

/// Fire-and-forget delivery: sink errors are logged and swallowed so they
/// never fail the moderation transition that produced the notification.
pub async fn dispatch(sink: &dyn NotificationSink, notification: Notification) {
    if let Err(err) = sink.deliver(&notification).await {
        tracing::warn!(
            error = %err,
            kind = notification.kind.as_str(),
            user_id = %notification.user_id,
            "notification delivery failed"
        );
    }
}
