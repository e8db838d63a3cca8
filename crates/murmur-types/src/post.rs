use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::author::AuthorStamp;
use crate::comment::CommentTree;
use crate::error::TypeError;
use crate::id::{PostId, UserId};
use crate::poll::{NewPoll, Poll};
use crate::reaction::Reactions;

/// A feed entry owned by its author's [`User`](crate::User) record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    id: PostId,
    author: AuthorStamp,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<Poll>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub reactions: Reactions,
    #[serde(default)]
    pub comments: CommentTree,
    #[serde(default)]
    pub views: u64,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields of a new post. Everything else is synthesized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub poll: Option<NewPoll>,
    #[serde(default)]
    pub location: Option<String>,
}

impl NewPost {
    /// A text-only post.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// True when the post carries neither text nor media nor a poll.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
            && self.images.is_empty()
            && self.videos.is_empty()
            && self.poll.is_none()
    }
}

impl Post {
    /// Create a post with a fresh id, empty reactions and comments, zero views
    /// and the current timestamp.
    pub fn new(author: AuthorStamp, draft: NewPost) -> Result<Self, TypeError> {
        let poll = draft.poll.map(Poll::new).transpose()?;
        let location = draft
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        Ok(Self {
            id: PostId::new(),
            author,
            content: draft.content,
            images: draft.images,
            videos: draft.videos,
            poll,
            location,
            reactions: Reactions::new(),
            comments: CommentTree::new(),
            views: 0,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> PostId {
        self.id
    }

    pub fn author(&self) -> &AuthorStamp {
        &self.author
    }

    pub fn author_id(&self) -> UserId {
        self.author.id
    }

    /// Likes plus comments at every depth; the trending rank.
    pub fn engagement(&self) -> usize {
        self.reactions.like_count() + self.comments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::Comment;

    fn author() -> AuthorStamp {
        AuthorStamp {
            id: UserId::new(),
            name: "grace".into(),
            username: "grace".into(),
            avatar: Some("https://cdn.example/grace.png".into()),
        }
    }

    #[test]
    fn new_post_is_zeroed() {
        let post = Post::new(author(), NewPost::text("Hello world")).unwrap();
        assert_eq!(post.content, "Hello world");
        assert!(post.reactions.is_empty());
        assert!(post.comments.is_empty());
        assert_eq!(post.views, 0);
        assert!(post.poll.is_none());
    }

    #[test]
    fn blank_location_is_dropped() {
        let draft = NewPost {
            location: Some("  ".into()),
            ..NewPost::text("hi")
        };
        let post = Post::new(author(), draft).unwrap();
        assert!(post.location.is_none());
    }

    #[test]
    fn invalid_poll_is_rejected() {
        let draft = NewPost {
            poll: Some(NewPoll {
                question: "?".into(),
                options: vec!["one".into()],
            }),
            ..NewPost::default()
        };
        assert!(Post::new(author(), draft).is_err());
    }

    #[test]
    fn empty_draft_detection() {
        assert!(NewPost::text("   ").is_empty());
        let with_image = NewPost {
            images: vec!["a.png".into()],
            ..NewPost::default()
        };
        assert!(!with_image.is_empty());
    }

    #[test]
    fn engagement_counts_likes_and_comments() {
        let mut post = Post::new(author(), NewPost::text("x")).unwrap();
        post.reactions.toggle_like(UserId::new());
        let root = post
            .comments
            .push_root(Comment::new(post.id(), author(), "c"));
        post.comments
            .push_reply(&root, Comment::new(post.id(), author(), "r"))
            .unwrap();
        assert_eq!(post.engagement(), 3);
    }

    #[test]
    fn serde_roundtrip() {
        let post = Post::new(author(), NewPost::text("persist me")).unwrap();
        let json = serde_json::to_string(&post).unwrap();
        let back: Post = serde_json::from_str(&json).unwrap();
        assert_eq!(back, post);
    }
}
