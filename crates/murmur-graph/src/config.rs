use serde::{Deserialize, Serialize};

/// Tunables for [`SocialGraph`](crate::SocialGraph).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Longest accepted post, comment or message body, in characters.
    pub max_content_len: usize,
    /// Emit notifications for likes, comments, follows and messages.
    pub notifications: bool,
    /// Default length of the trending list.
    pub trending_limit: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_content_len: 5_000,
            notifications: true,
            trending_limit: 10,
        }
    }
}
