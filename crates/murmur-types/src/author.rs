use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Author fields copied onto a post or comment when it is created.
///
/// Later profile edits do not rewrite existing stamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorStamp {
    pub id: UserId,
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}
