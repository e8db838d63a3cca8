use murmur_types::{CommentId, NotificationId, PollOptionId, PostId, TypeError, UserId};
use thiserror::Error;

/// Errors from social-graph operations.
///
/// Absence on a pure lookup is `Ok(None)`, not an error; these variants are
/// returned by operations that were asked to act on something.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no active session")]
    Unauthenticated,

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("post {post} not found for author {author}")]
    PostNotFound { post: PostId, author: UserId },

    #[error("comment {comment} not found on post {post}")]
    CommentNotFound { post: PostId, comment: CommentId },

    #[error("comment {comment} on post {post} belongs to another user")]
    NotCommentAuthor { post: PostId, comment: CommentId },

    #[error("post {0} has no poll")]
    PollNotFound(PostId),

    #[error("poll option not found: {0}")]
    PollOptionNotFound(PollOptionId),

    #[error("already voted in the poll on post {0}")]
    AlreadyVoted(PostId),

    #[error("notification not found: {0}")]
    NotificationNotFound(NotificationId),

    #[error("users cannot follow themselves")]
    SelfFollow,

    #[error("users cannot message themselves")]
    SelfMessage,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store error: {0}")]
    Store(#[from] murmur_store::StoreError),
}

impl From<TypeError> for GraphError {
    fn from(e: TypeError) -> Self {
        match e {
            TypeError::UnknownPollOption(option) => Self::PollOptionNotFound(option),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
