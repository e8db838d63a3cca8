use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{MessageId, NotificationId, PostId, UserId};

/// A direct message between two users.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender_id: UserId, receiver_id: UserId, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender_id,
            receiver_id,
            content: content.into(),
            read: false,
            created_at: Utc::now(),
        }
    }

    /// True if `user` sent or received this message.
    pub fn involves(&self, user: &UserId) -> bool {
        self.sender_id == *user || self.receiver_id == *user
    }

    /// The participant that is not `user`.
    pub fn counterpart(&self, user: &UserId) -> UserId {
        if self.sender_id == *user {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

/// What triggered a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PostLiked,
    PostDisliked,
    PostCommented,
    CommentReplied,
    CommentLiked,
    NewFollower,
    NewMessage,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PostLiked => "post_liked",
            Self::PostDisliked => "post_disliked",
            Self::PostCommented => "post_commented",
            Self::CommentReplied => "comment_replied",
            Self::CommentLiked => "comment_liked",
            Self::NewFollower => "new_follower",
            Self::NewMessage => "new_message",
        };
        f.write_str(s)
    }
}

/// A notice addressed to one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub content: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_post_id: Option<PostId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: UserId, kind: NotificationKind, content: impl Into<String>) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind,
            content: content.into(),
            read: false,
            related_post_id: None,
            related_user_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_post(mut self, post: PostId) -> Self {
        self.related_post_id = Some(post);
        self
    }

    pub fn with_user(mut self, user: UserId) -> Self {
        self.related_user_id = Some(user);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_counterpart() {
        let a = UserId::new();
        let b = UserId::new();
        let msg = Message::new(a, b, "hi");
        assert_eq!(msg.counterpart(&a), b);
        assert_eq!(msg.counterpart(&b), a);
        assert!(msg.involves(&a));
        assert!(!msg.involves(&UserId::new()));
        assert!(!msg.read);
    }

    #[test]
    fn notification_builders() {
        let post = PostId::new();
        let actor = UserId::new();
        let n = Notification::new(UserId::new(), NotificationKind::PostLiked, "liked")
            .with_post(post)
            .with_user(actor);
        assert_eq!(n.related_post_id, Some(post));
        assert_eq!(n.related_user_id, Some(actor));
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&NotificationKind::NewFollower).unwrap();
        assert_eq!(json, "\"new_follower\"");
        assert_eq!(NotificationKind::CommentReplied.to_string(), "comment_replied");
    }
}
