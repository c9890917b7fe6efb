use crate::DomainResult;
use crate::notifications::Notification;
use crate::ports::BoxFuture;

/// Delivery is fire-and-forget from the domain's point of view: callers go
/// through [`crate::notifications::dispatch`], which logs and swallows
/// errors so a failed delivery never rolls back a moderation transition.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: &Notification) -> BoxFuture<'_, DomainResult<()>>;
}
