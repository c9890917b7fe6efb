use serde::Serialize;

use crate::boards::{Board, PostingMode};

pub const SINGLE_POST_LIMIT_REASON: &str = "single post per user exceeded";

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct LimitOutcome {
    pub allowed: bool,
    pub reason: Option<String>,
    pub post_count: u64,
}

impl LimitOutcome {
    fn allowed(post_count: u64) -> Self {
        Self {
            allowed: true,
            reason: None,
            post_count,
        }
    }

    fn denied(reason: String, post_count: u64) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            post_count,
        }
    }
}

/// Pure given the count; fetching the author's non-deleted post count on the
/// board is the persistence layer's job. Two concurrent submissions can both
/// read the same count; no transactional guarantee is claimed here.
pub fn evaluate_posting_limit(board: &Board, existing_post_count: u64) -> LimitOutcome {
    if board.posting_mode == PostingMode::Single && existing_post_count >= 1 {
        return LimitOutcome::denied(SINGLE_POST_LIMIT_REASON.to_string(), existing_post_count);
    }
    if let Some(max) = board.max_posts_per_user {
        if existing_post_count >= u64::from(max) {
            return LimitOutcome::denied(
                format!("maximum of {max} posts per user exceeded"),
                existing_post_count,
            );
        }
    }
    LimitOutcome::allowed(existing_post_count)
}
