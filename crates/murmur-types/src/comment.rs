//! Comment trees.
//!
//! Comments on a post form a tree of unbounded depth. The tree is stored as
//! an arena keyed by [`CommentId`]: every node records its parent and its
//! ordered children, and the tree keeps the ordered list of top-level ids.
//! Locating a comment at any depth is a map lookup. Nodes are never
//! relinked, so the structure cannot acquire cycles; removing a comment
//! removes its whole subtree.
//!
//! [`CommentTree::threads`] renders the nested [`CommentThread`] view for
//! callers that want replies inline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::author::AuthorStamp;
use crate::id::{CommentId, PostId, UserId};
use crate::reaction::Reactions;

/// A single comment or reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    id: CommentId,
    post_id: PostId,
    author: AuthorStamp,
    pub content: String,
    #[serde(default)]
    pub reactions: Reactions,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a comment with a fresh id and no reactions.
    pub fn new(post_id: PostId, author: AuthorStamp, content: impl Into<String>) -> Self {
        Self {
            id: CommentId::new(),
            post_id,
            author,
            content: content.into(),
            reactions: Reactions::new(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> CommentId {
        self.id
    }

    /// The post this comment belongs to.
    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn author(&self) -> &AuthorStamp {
        &self.author
    }

    pub fn author_id(&self) -> UserId {
        self.author.id
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct CommentNode {
    comment: Comment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<CommentId>,
    #[serde(default)]
    children: Vec<CommentId>,
}

/// Arena-backed comment tree for one post.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCommentTree")]
pub struct CommentTree {
    nodes: BTreeMap<CommentId, CommentNode>,
    roots: Vec<CommentId>,
}

#[derive(Deserialize)]
struct RawCommentTree {
    #[serde(default)]
    nodes: BTreeMap<CommentId, CommentNode>,
    #[serde(default)]
    roots: Vec<CommentId>,
}

impl TryFrom<RawCommentTree> for CommentTree {
    type Error = String;

    /// Every node must be reachable exactly once from the roots, and every
    /// child must name its actual parent.
    fn try_from(raw: RawCommentTree) -> Result<Self, Self::Error> {
        let mut seen = 0usize;
        let mut stack: Vec<(Option<CommentId>, CommentId)> =
            raw.roots.iter().rev().map(|id| (None, *id)).collect();
        let mut visited = std::collections::BTreeSet::new();

        while let Some((parent, id)) = stack.pop() {
            let node = raw
                .nodes
                .get(&id)
                .ok_or_else(|| format!("comment {id} is referenced but missing"))?;
            if node.parent != parent {
                return Err(format!("comment {id} has an inconsistent parent link"));
            }
            if node.comment.id != id {
                return Err(format!("comment {id} is stored under the wrong key"));
            }
            if !visited.insert(id) {
                return Err(format!("comment {id} is reachable more than once"));
            }
            seen += 1;
            stack.extend(node.children.iter().rev().map(|child| (Some(id), *child)));
        }

        if seen != raw.nodes.len() {
            return Err(format!(
                "{} comment(s) are unreachable from the roots",
                raw.nodes.len() - seen
            ));
        }

        Ok(Self {
            nodes: raw.nodes,
            roots: raw.roots,
        })
    }
}

impl CommentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of comments at every depth.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of top-level comments.
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Top-level comment ids in insertion order.
    pub fn roots(&self) -> &[CommentId] {
        &self.roots
    }

    pub fn contains(&self, id: &CommentId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.nodes.get(id).map(|node| &node.comment)
    }

    pub fn get_mut(&mut self, id: &CommentId) -> Option<&mut Comment> {
        self.nodes.get_mut(id).map(|node| &mut node.comment)
    }

    /// Parent of `id`, or `None` for top-level or unknown comments.
    pub fn parent_of(&self, id: &CommentId) -> Option<CommentId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Direct replies of `id` in insertion order. Empty for unknown ids.
    pub fn children_of(&self, id: &CommentId) -> &[CommentId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Append a top-level comment.
    pub fn push_root(&mut self, comment: Comment) -> CommentId {
        let id = comment.id;
        self.nodes.insert(
            id,
            CommentNode {
                comment,
                parent: None,
                children: Vec::new(),
            },
        );
        self.roots.push(id);
        id
    }

    /// Append `comment` to the replies of `parent`.
    ///
    /// Returns `None` and leaves the tree untouched when `parent` is not in
    /// this tree.
    pub fn push_reply(&mut self, parent: &CommentId, comment: Comment) -> Option<CommentId> {
        let id = comment.id;
        let parent_node = self.nodes.get_mut(parent)?;
        parent_node.children.push(id);
        self.nodes.insert(
            id,
            CommentNode {
                comment,
                parent: Some(*parent),
                children: Vec::new(),
            },
        );
        Some(id)
    }

    /// Remove `id` together with every reply below it.
    ///
    /// Returns the removed subtree, or `None` when `id` is not in this tree.
    pub fn remove(&mut self, id: &CommentId) -> Option<CommentThread> {
        let removed = self.thread(id)?;
        match self.parent_of(id) {
            Some(parent) => {
                if let Some(node) = self.nodes.get_mut(&parent) {
                    node.children.retain(|child| child != id);
                }
            }
            None => self.roots.retain(|root| root != id),
        }
        let mut stack = vec![*id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children);
            }
        }
        Some(removed)
    }

    /// Number of comments strictly below `id`.
    pub fn descendant_count(&self, id: &CommentId) -> usize {
        let mut count = 0;
        let mut stack: Vec<CommentId> = self.children_of(id).to_vec();
        while let Some(next) = stack.pop() {
            count += 1;
            stack.extend_from_slice(self.children_of(&next));
        }
        count
    }

    /// Depth of `id`: 0 for top-level comments.
    pub fn depth(&self, id: &CommentId) -> Option<usize> {
        let mut node = self.nodes.get(id)?;
        let mut depth = 0;
        while let Some(parent) = node.parent {
            depth += 1;
            node = self.nodes.get(&parent)?;
        }
        Some(depth)
    }

    /// Iterate over every comment in depth-first, insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Comment> + '_ {
        let mut stack: Vec<CommentId> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let node = self.nodes.get(&id)?;
            stack.extend(node.children.iter().rev().copied());
            Some(&node.comment)
        })
    }

    /// Nested view of the whole tree.
    pub fn threads(&self) -> Vec<CommentThread> {
        self.roots.iter().filter_map(|id| self.thread(id)).collect()
    }

    /// Nested view of the subtree rooted at `id`.
    pub fn thread(&self, id: &CommentId) -> Option<CommentThread> {
        let node = self.nodes.get(id)?;
        Some(CommentThread {
            comment: node.comment.clone(),
            replies: node
                .children
                .iter()
                .filter_map(|child| self.thread(child))
                .collect(),
        })
    }
}

/// A comment with its replies nested inline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentThread>,
}

impl CommentThread {
    /// Number of comments in this thread, including the head.
    pub fn size(&self) -> usize {
        1 + self.replies.iter().map(CommentThread::size).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn author() -> AuthorStamp {
        AuthorStamp {
            id: UserId::new(),
            name: "ada".into(),
            username: "ada".into(),
            avatar: None,
        }
    }

    fn comment(post: PostId, text: &str) -> Comment {
        Comment::new(post, author(), text)
    }

    #[test]
    fn push_root_keeps_order() {
        let post = PostId::new();
        let mut tree = CommentTree::new();
        let a = tree.push_root(comment(post, "a"));
        let b = tree.push_root(comment(post, "b"));
        assert_eq!(tree.roots(), &[a, b]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.root_count(), 2);
    }

    #[test]
    fn nested_reply_leaves_siblings_alone() {
        let post = PostId::new();
        let mut tree = CommentTree::new();
        let c0 = tree.push_root(comment(post, "c0"));
        let c1 = tree.push_reply(&c0, comment(post, "c1")).unwrap();
        let sibling = tree.push_reply(&c0, comment(post, "sibling")).unwrap();
        tree.push_reply(&sibling, comment(post, "nested")).unwrap();

        let reply = tree.push_reply(&c1, comment(post, "deep")).unwrap();

        assert_eq!(tree.children_of(&c1), &[reply]);
        assert_eq!(tree.children_of(&c0), &[c1, sibling]);
        assert_eq!(tree.descendant_count(&sibling), 1);
        assert_eq!(tree.root_count(), 1);
        assert_eq!(tree.depth(&reply), Some(2));
        assert_eq!(tree.parent_of(&reply), Some(c1));
    }

    #[test]
    fn reply_to_missing_parent_is_rejected() {
        let post = PostId::new();
        let mut tree = CommentTree::new();
        tree.push_root(comment(post, "a"));
        assert!(tree.push_reply(&CommentId::new(), comment(post, "x")).is_none());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn iter_is_depth_first() {
        let post = PostId::new();
        let mut tree = CommentTree::new();
        let a = tree.push_root(comment(post, "a"));
        tree.push_root(comment(post, "b"));
        tree.push_reply(&a, comment(post, "a1")).unwrap();

        let order: Vec<&str> = tree.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(order, vec!["a", "a1", "b"]);
    }

    #[test]
    fn threads_nest_replies() {
        let post = PostId::new();
        let mut tree = CommentTree::new();
        let a = tree.push_root(comment(post, "a"));
        let a1 = tree.push_reply(&a, comment(post, "a1")).unwrap();
        tree.push_reply(&a1, comment(post, "a11")).unwrap();

        let threads = tree.threads();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].size(), 3);
        assert_eq!(threads[0].replies[0].replies[0].comment.content, "a11");
    }

    #[test]
    fn remove_drops_whole_subtree() {
        let post = PostId::new();
        let mut tree = CommentTree::new();
        let a = tree.push_root(comment(post, "a"));
        let b = tree.push_root(comment(post, "b"));
        let a1 = tree.push_reply(&a, comment(post, "a1")).unwrap();
        let a2 = tree.push_reply(&a, comment(post, "a2")).unwrap();
        let a11 = tree.push_reply(&a1, comment(post, "a11")).unwrap();

        let removed = tree.remove(&a1).unwrap();
        assert_eq!(removed.size(), 2);
        assert!(!tree.contains(&a1));
        assert!(!tree.contains(&a11));
        assert_eq!(tree.children_of(&a), &[a2]);
        assert_eq!(tree.len(), 3);

        tree.remove(&a).unwrap();
        assert_eq!(tree.roots(), &[b]);
        assert_eq!(tree.len(), 1);
        assert!(tree.remove(&a).is_none());

        // Still a valid tree after removals.
        let json = serde_json::to_string(&tree).unwrap();
        assert_eq!(serde_json::from_str::<CommentTree>(&json).unwrap(), tree);
    }

    #[test]
    fn serde_roundtrip_preserves_structure() {
        let post = PostId::new();
        let mut tree = CommentTree::new();
        let a = tree.push_root(comment(post, "a"));
        tree.push_reply(&a, comment(post, "a1")).unwrap();

        let json = serde_json::to_string(&tree).unwrap();
        let back: CommentTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn deserialize_rejects_dangling_root() {
        let json = format!(r#"{{"nodes":{{}},"roots":["{}"]}}"#, CommentId::new());
        assert!(serde_json::from_str::<CommentTree>(&json).is_err());
    }

    #[test]
    fn deserialize_rejects_orphans() {
        let post = PostId::new();
        let mut tree = CommentTree::new();
        tree.push_root(comment(post, "a"));
        let mut value = serde_json::to_value(&tree).unwrap();
        value["roots"] = serde_json::json!([]);
        assert!(serde_json::from_value::<CommentTree>(value).is_err());
    }

    proptest! {
        // Each step appends under a random existing comment (or as a root).
        #[test]
        fn reply_adds_exactly_one_descendant(parents in prop::collection::vec(any::<prop::sample::Index>(), 1..40)) {
            let post = PostId::new();
            let mut tree = CommentTree::new();
            let mut ids = vec![tree.push_root(comment(post, "root"))];

            for pick in parents {
                let parent = ids[pick.index(ids.len())];
                let before = tree.descendant_count(&parent);
                let siblings: Vec<(CommentId, usize)> = tree
                    .children_of(&parent)
                    .iter()
                    .map(|c| (*c, tree.descendant_count(c)))
                    .collect();
                let roots = tree.root_count();

                let id = tree.push_reply(&parent, comment(post, "r")).unwrap();
                ids.push(id);

                prop_assert_eq!(tree.descendant_count(&parent), before + 1);
                prop_assert_eq!(tree.root_count(), roots);
                for (sibling, count) in siblings {
                    prop_assert_eq!(tree.descendant_count(&sibling), count);
                }
            }
            prop_assert_eq!(tree.iter().count(), tree.len());
        }
    }
}
