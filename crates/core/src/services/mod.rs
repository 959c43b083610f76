//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod external_id;
pub mod paper;
pub mod vote;

pub use comment::{CommentResponse, CommentService, CreateCommentInput};
pub use external_id::external_id;
pub use paper::{
    CreatePaperInput, ListPapersInput, PaperResponse, PaperService, PaperUpload,
    ALLOWED_EXTENSIONS, RAW_CONTENT_LIMIT,
};
pub use vote::{Ballot, SubmitVoteInput, VoteService, VoteStore, VoteTally};
