use crate::DomainResult;
use crate::ports::BoxFuture;
use crate::posts::Post;

pub trait PostRepository: Send + Sync {
    fn create_post(&self, post: &Post) -> BoxFuture<'_, DomainResult<Post>>;

    fn get_post(&self, post_id: &str) -> BoxFuture<'_, DomainResult<Option<Post>>>;

    fn update_post(&self, post: &Post) -> BoxFuture<'_, DomainResult<Post>>;

    /// Non-deleted posts on a board, newest first.
    fn list_by_board(&self, board_id: &str) -> BoxFuture<'_, DomainResult<Vec<Post>>>;

    /// Count of non-deleted posts by one author on one board. This is the
    /// count the posting-limit evaluator is fed; it deliberately includes
    /// pending and change-requested posts.
    fn count_active_by_author(
        &self,
        board_id: &str,
        author_id: &str,
    ) -> BoxFuture<'_, DomainResult<u64>>;
}
