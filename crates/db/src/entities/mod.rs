//! Database entities.

pub mod comment;
pub mod poll;

pub use comment::Entity as Comment;
pub use poll::Entity as Poll;
