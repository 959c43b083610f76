//! Database entities.

pub mod comment;
pub mod paper;
pub mod vote;

pub use comment::Entity as Comment;
pub use paper::Entity as Paper;
pub use vote::Entity as Vote;
