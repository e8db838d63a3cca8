use murmur_types::UserId;

/// Errors from repository and slot operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another account already uses this email address.
    #[error("email {email} is already registered to {existing}")]
    DuplicateEmail { email: String, existing: UserId },

    /// Slot key contains characters that cannot name a slot.
    #[error("invalid slot key: {0:?}")]
    InvalidKey(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying slot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
