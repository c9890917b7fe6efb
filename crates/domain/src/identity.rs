use serde::{Deserialize, Serialize};

/// Authenticated principal supplied by the external identity provider.
/// Danke never authenticates directly; anonymous callers are represented
/// as an absent identity, not as a sentinel value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActorIdentity {
    pub user_id: String,
    pub email: String,
}

impl ActorIdentity {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }
}
