//! Foundation types for Murmur.
//!
//! This crate provides the entities of the social graph: users and the posts
//! they own, comment trees, reactions, polls, direct messages and
//! notifications. Every other Murmur crate depends on `murmur-types`.
//!
//! # Key Types
//!
//! - [`User`] — account record owning its posts, profile entries and follow edges
//! - [`Post`] — feed entry with media, optional [`Poll`], [`Reactions`] and a [`CommentTree`]
//! - [`CommentTree`] — arena of comments keyed by [`CommentId`], unbounded depth
//! - [`Reactions`] — like/dislike sets with mutual exclusion enforced by the type
//! - [`Message`] / [`Notification`] — inbox records
//!
//! All identifiers are UUID v7 newtypes, so creation order and id order agree.

pub mod author;
pub mod comment;
pub mod error;
pub mod id;
pub mod inbox;
pub mod poll;
pub mod post;
pub mod reaction;
pub mod user;

pub use author::AuthorStamp;
pub use comment::{Comment, CommentThread, CommentTree};
pub use error::TypeError;
pub use id::{CommentId, ItemId, MessageId, NotificationId, PollOptionId, PostId, UserId};
pub use inbox::{Message, Notification, NotificationKind};
pub use poll::{NewPoll, Poll, PollOption};
pub use post::{NewPost, Post};
pub use reaction::{Reaction, Reactions};
pub use user::{normalize_email, EducationItem, ExperienceItem, ProfileUpdate, User};
