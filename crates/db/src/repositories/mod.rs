//! Repositories wrapping database access per entity.

pub mod comment;
pub mod poll;

pub use comment::CommentRepository;
pub use poll::PollRepository;
