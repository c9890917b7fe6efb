use crate::DomainResult;
use crate::boards::{Board, ModeratorGrant};
use crate::ports::BoxFuture;

pub trait BoardRepository: Send + Sync {
    fn create_board(&self, board: &Board) -> BoxFuture<'_, DomainResult<Board>>;

    fn get_board(&self, board_id: &str) -> BoxFuture<'_, DomainResult<Option<Board>>>;

    fn update_board(&self, board: &Board) -> BoxFuture<'_, DomainResult<Board>>;

    fn create_grant(&self, grant: &ModeratorGrant)
    -> BoxFuture<'_, DomainResult<ModeratorGrant>>;

    fn delete_grant(&self, board_id: &str, user_id: &str) -> BoxFuture<'_, DomainResult<bool>>;

    fn get_grant(
        &self,
        board_id: &str,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<ModeratorGrant>>>;

    fn list_grants(&self, board_id: &str) -> BoxFuture<'_, DomainResult<Vec<ModeratorGrant>>>;
}
