use thiserror::Error;

use crate::id::PollOptionId;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("invalid poll: {0}")]
    InvalidPoll(String),

    #[error("user has already voted in this poll")]
    AlreadyVoted,

    #[error("poll has no option {0}")]
    UnknownPollOption(PollOptionId),
}
