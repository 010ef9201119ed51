//! Core business logic for pollhub.
//!
//! - [`comment_tree`]: assembles a poll's flat comment list into reply trees
//! - [`tally`]: validates vote selections and computes new counts
//! - [`services`]: poll, vote and comment services on top of `pollhub-db`

pub mod comment_tree;
pub mod services;
pub mod tally;

pub use comment_tree::{CommentNode, assemble_comment_tree};
pub use services::*;
pub use tally::{PollOption, Selection};
