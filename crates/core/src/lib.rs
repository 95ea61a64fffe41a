//! Domain core for the ReplyDesk comment moderation client.
//!
//! Pure state: the comment board and its cards, the per-card reply state
//! machine, stats deltas and widget reconciliation, bulk selection, and
//! bulk progress. Nothing in this crate performs I/O.

pub mod board;
pub mod card;
pub mod comment;
pub mod error;
pub mod progress;
pub mod selection;
pub mod stats;
pub mod types;
