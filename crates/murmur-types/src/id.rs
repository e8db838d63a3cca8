use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Generate a new time-ordered identifier (UUID v7).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// Create from an existing UUID.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }

            /// Short representation (first 8 characters of the UUID).
            ///
            /// This is the high part of the timestamp, so ids created close
            /// together share it. Use [`Self::handle`] to refer to one id.
            pub fn short_id(&self) -> String {
                self.0.to_string()[..8].to_string()
            }

            /// Last 12 hex characters of the UUID. For v7 ids these are
            /// random bits, so the handle tells apart ids minted in the
            /// same millisecond.
            pub fn handle(&self) -> String {
                let text = self.0.to_string();
                text[text.len() - 12..].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short_id())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|e| TypeError::InvalidId(format!("{s}: {e}")))
            }
        }
    };
}

uuid_id!(
    /// Identity of a user account.
    UserId
);
uuid_id!(
    /// Identity of a post within its author's post list.
    PostId
);
uuid_id!(
    /// Identity of a comment within a post's comment tree.
    CommentId
);
uuid_id!(
    /// Identity of a direct message.
    MessageId
);
uuid_id!(
    /// Identity of a notification.
    NotificationId
);
uuid_id!(
    /// Identity of an education or experience entry on a profile.
    ItemId
);

/// Identity of a poll option, assigned in declaration order starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollOptionId(pub u32);

impl fmt::Display for PollOptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
