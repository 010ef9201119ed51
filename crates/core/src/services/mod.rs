//! Business logic services.

pub mod comment;
pub mod poll;
pub mod poll_store;
pub mod vote;

pub use comment::{CommentService, CreateCommentInput};
pub use poll::{CreatePollInput, PollService, PollView, UpdatePollInput, is_open};
pub use poll_store::{MemoryPollStore, PollStore, PollStoreService, WriteOutcome};
pub use vote::VoteService;
