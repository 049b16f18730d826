// ABOUTME: Live progress reconciliation for import jobs
// ABOUTME: Push-channel resource plus the last-write-wins board it maintains

pub mod board;
pub mod feed;
pub mod stomp;

pub use board::{ProgressBoard, ProgressReconciler};
pub use feed::{FeedSettings, ProgressFeed};
