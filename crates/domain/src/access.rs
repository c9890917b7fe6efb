use std::sync::Arc;

use serde::Serialize;

use crate::DomainResult;
use crate::boards::{Board, BoardVisibility};
use crate::identity::ActorIdentity;
use crate::ports::boards::BoardRepository;

pub const ACCESS_SIGN_IN_REQUIRED: &str = "sign in to view this board";
pub const ACCESS_NOT_AUTHORIZED: &str = "you do not have access to this board";

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct BoardAccess {
    pub has_access: bool,
    pub reason: Option<String>,
    pub is_creator: bool,
    pub is_moderator: bool,
}

/// Pure access decision. `has_grant` is whether a moderator grant exists for
/// (board, user); looking it up is the caller's job. The denial reason
/// distinguishes an anonymous caller from a signed-in but unauthorized one
/// so the surface layer can word its message accordingly.
pub fn evaluate_board_access(
    board: &Board,
    user: Option<&ActorIdentity>,
    has_grant: bool,
) -> BoardAccess {
    let is_creator = user.is_some_and(|user| user.user_id == board.creator_id);
    let is_moderator = !is_creator && user.is_some() && has_grant;

    if board.visibility == BoardVisibility::Public || is_creator || is_moderator {
        return BoardAccess {
            has_access: true,
            reason: None,
            is_creator,
            is_moderator,
        };
    }

    let reason = if user.is_none() {
        ACCESS_SIGN_IN_REQUIRED
    } else {
        ACCESS_NOT_AUTHORIZED
    };
    BoardAccess {
        has_access: false,
        reason: Some(reason.to_string()),
        is_creator,
        is_moderator,
    }
}

#[derive(Clone)]
pub struct AccessService {
    boards: Arc<dyn BoardRepository>,
}

impl AccessService {
    pub fn new(boards: Arc<dyn BoardRepository>) -> Self {
        Self { boards }
    }

    pub async fn check_access(
        &self,
        board: &Board,
        user: Option<&ActorIdentity>,
    ) -> DomainResult<BoardAccess> {
        let has_grant = match user {
            Some(user) => self
                .boards
                .get_grant(&board.board_id, &user.user_id)
                .await?
                .is_some(),
            None => false,
        };
        Ok(evaluate_board_access(board, user, has_grant))
    }
}
