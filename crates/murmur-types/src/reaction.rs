use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// A single user's reaction to a post or comment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reaction {
    Like,
    Dislike,
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Like => write!(f, "like"),
            Self::Dislike => write!(f, "dislike"),
        }
    }
}

/// Like and dislike sets attached to a post or comment.
///
/// A user id is a member of at most one of the two sets. The sets are only
/// reachable through the toggle operations, so the exclusion cannot be
/// broken by construction. Deserialized data that violates it keeps the
/// like and drops the dislike.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawReactions")]
pub struct Reactions {
    likes: BTreeSet<UserId>,
    dislikes: BTreeSet<UserId>,
}

#[derive(Deserialize)]
struct RawReactions {
    #[serde(default)]
    likes: BTreeSet<UserId>,
    #[serde(default)]
    dislikes: BTreeSet<UserId>,
}

impl From<RawReactions> for Reactions {
    fn from(raw: RawReactions) -> Self {
        let RawReactions { likes, mut dislikes } = raw;
        dislikes.retain(|id| !likes.contains(id));
        Self { likes, dislikes }
    }
}

impl Reactions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle `user`'s like, clearing any dislike first.
    ///
    /// Returns the user's reaction after the toggle.
    pub fn toggle_like(&mut self, user: UserId) -> Option<Reaction> {
        self.dislikes.remove(&user);
        if self.likes.remove(&user) {
            None
        } else {
            self.likes.insert(user);
            Some(Reaction::Like)
        }
    }

    /// Toggle `user`'s dislike, clearing any like first.
    ///
    /// Returns the user's reaction after the toggle.
    pub fn toggle_dislike(&mut self, user: UserId) -> Option<Reaction> {
        self.likes.remove(&user);
        if self.dislikes.remove(&user) {
            None
        } else {
            self.dislikes.insert(user);
            Some(Reaction::Dislike)
        }
    }

    /// Apply a toggle for the given reaction kind.
    pub fn toggle(&mut self, user: UserId, reaction: Reaction) -> Option<Reaction> {
        match reaction {
            Reaction::Like => self.toggle_like(user),
            Reaction::Dislike => self.toggle_dislike(user),
        }
    }

    /// The current reaction of `user`, if any.
    pub fn reaction_of(&self, user: &UserId) -> Option<Reaction> {
        if self.likes.contains(user) {
            Some(Reaction::Like)
        } else if self.dislikes.contains(user) {
            Some(Reaction::Dislike)
        } else {
            None
        }
    }

    pub fn likes(&self) -> &BTreeSet<UserId> {
        &self.likes
    }

    pub fn dislikes(&self) -> &BTreeSet<UserId> {
        &self.dislikes
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn dislike_count(&self) -> usize {
        self.dislikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.likes.is_empty() && self.dislikes.is_empty()
    }
}
