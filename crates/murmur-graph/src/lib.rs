//! The Murmur social graph.
//!
//! [`SocialGraph`] is the single mutation point for users, posts, reactions,
//! comment trees, follows, direct messages and notifications. It is generic
//! over a [`murmur_store::Repository`], so the same operations run against
//! the in-memory backend in tests and the slot-persisted backend in the CLI.
//!
//! # Operations
//!
//! - Session — `login`, `signup`, `logout`, `current_user`
//! - Profile — `update_profile`, education and experience entries
//! - Posts — `create_post`, like/dislike toggles, poll votes, views
//! - Comments — nested replies at any depth, comment like/dislike toggles
//! - Follows — `toggle_follow`, follower and following lists
//! - Feeds — global feed, following feed, trending
//! - Inbox — direct messages and notifications
//!
//! Operations that act on something return [`GraphError`] when the session,
//! user, post or comment is missing; pure lookups return `Ok(None)`.

mod comments;
pub mod config;
pub mod error;
mod feed;
mod follows;
pub mod graph;
pub mod inbox;
mod posts;
mod profile;

pub use config::GraphConfig;
pub use error::{GraphError, GraphResult};
pub use graph::SocialGraph;
pub use inbox::ConversationSummary;
