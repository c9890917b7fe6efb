//! In-memory fakes shared by the unit tests in this crate.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::DomainResult;
use crate::boards::{Board, ModeratorGrant};
use crate::error::DomainError;
use crate::notifications::Notification;
use crate::ports::BoxFuture;
use crate::ports::boards::BoardRepository;
use crate::ports::notifications::NotificationSink;
use crate::ports::posts::PostRepository;
use crate::posts::Post;

#[derive(Default)]
pub(crate) struct MockBoardRepository {
    boards: Arc<RwLock<HashMap<String, Board>>>,
    grants: Arc<RwLock<HashMap<(String, String), ModeratorGrant>>>,
}

impl MockBoardRepository {
    pub(crate) async fn seed_board(&self, board: Board) {
        self.boards
            .write()
            .await
            .insert(board.board_id.clone(), board);
    }

    pub(crate) async fn seed_grant(&self, grant: ModeratorGrant) {
        self.grants
            .write()
            .await
            .insert((grant.board_id.clone(), grant.user_id.clone()), grant);
    }
}

impl BoardRepository for MockBoardRepository {
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
pub(crate) struct MockPostRepository {
    posts: Arc<RwLock<HashMap<String, Post>>>,
}

impl MockPostRepository {
    pub(crate) async fn seed_post(&self, post: Post) {
        self.posts.write().await.insert(post.post_id.clone(), post);
    }
}

impl PostRepository for MockPostRepository {
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

#[derive(Default)]
pub(crate) struct RecordingSink {
    delivered: Arc<RwLock<Vec<Notification>>>,
}

impl RecordingSink {
    pub(crate) async fn delivered(&self) -> Vec<Notification> {
        self.delivered.read().await.clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, notification: &Notification) -> BoxFuture<'_, DomainResult<()>> {
        let notification = notification.clone();
        let delivered = self.delivered.clone();
        Box::pin(async move {
            delivered.write().await.push(notification);
            Ok(())
        })
    }
}
