use murmur_store::Repository;
use murmur_types::{Comment, CommentId, NotificationKind, PostId, Reaction, UserId};
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::graph::SocialGraph;

impl<R: Repository> SocialGraph<R> {
    /// Comment on a post as the signed-in user.
    ///
    /// Without `parent` the comment is appended to the post's top-level
    /// list; with `parent` it is appended to that comment's replies, at any
    /// depth.
    pub fn add_comment(
        &self,
        post: &PostId,
        author: &UserId,
        content: &str,
        parent: Option<&CommentId>,
    ) -> GraphResult<Comment> {
        let actor = self.active_user()?;
        let content = self.validate_content(content, "comment")?;

        let (comment, parent_author) = self.edit_post(&actor, post, author, |actor, target| {
            let comment = Comment::new(target.id(), actor.author_stamp(), content);
            match parent {
                None => {
                    target.comments.push_root(comment.clone());
                    Ok((comment, None))
                }
                Some(parent) => {
                    let parent_author = target
                        .comments
                        .get(parent)
                        .map(Comment::author_id)
                        .ok_or(GraphError::CommentNotFound {
                            post: *post,
                            comment: *parent,
                        })?;
                    target.comments.push_reply(parent, comment.clone());
                    Ok((comment, Some(parent_author)))
                }
            }
        })?;
        debug!(post = %post, comment = %comment.id(), reply = parent.is_some(), "comment added");

        let snippet = preview(&comment.content);
        match parent_author {
            Some(recipient) => self.notify(
                &actor,
                recipient,
                NotificationKind::CommentReplied,
                format!("{} replied to your comment: {snippet}", actor.username),
                Some(*post),
            ),
            None => self.notify(
                &actor,
                *author,
                NotificationKind::PostCommented,
                format!("{} commented on your post: {snippet}", actor.username),
                Some(*post),
            ),
        }
        Ok(comment)
    }

    /// Toggle the signed-in user's like on a comment at any depth.
    pub fn toggle_comment_like(
        &self,
        post: &PostId,
        author: &UserId,
        comment: &CommentId,
    ) -> GraphResult<Option<Reaction>> {
        self.react_to_comment(post, author, comment, Reaction::Like)
    }

    /// Toggle the signed-in user's dislike on a comment at any depth.
    pub fn toggle_comment_dislike(
        &self,
        post: &PostId,
        author: &UserId,
        comment: &CommentId,
    ) -> GraphResult<Option<Reaction>> {
        self.react_to_comment(post, author, comment, Reaction::Dislike)
    }

    fn react_to_comment(
        &self,
        post: &PostId,
        author: &UserId,
        comment: &CommentId,
        reaction: Reaction,
    ) -> GraphResult<Option<Reaction>> {
        let actor = self.active_user()?;
        let (outcome, comment_author) =
            self.edit_post(&actor, post, author, |actor, target| {
                let node = target
                    .comments
                    .get_mut(comment)
                    .ok_or(GraphError::CommentNotFound {
                        post: *post,
                        comment: *comment,
                    })?;
                Ok((node.reactions.toggle(actor.id(), reaction), node.author_id()))
            })?;
        debug!(post = %post, comment = %comment, ?outcome, "comment reaction toggled");

        if outcome == Some(Reaction::Like) {
            self.notify(
                &actor,
                comment_author,
                NotificationKind::CommentLiked,
                format!("{} liked your comment", actor.username),
                Some(*post),
            );
        }
        Ok(outcome)
    }

    /// Delete one of the signed-in user's own comments, together with every
    /// reply below it. Returns the number of comments removed.
    pub fn delete_comment(
        &self,
        post: &PostId,
        author: &UserId,
        comment: &CommentId,
    ) -> GraphResult<usize> {
        let actor = self.active_user()?;
        let removed = self.edit_post(&actor, post, author, |actor, target| {
            let not_found = GraphError::CommentNotFound {
                post: *post,
                comment: *comment,
            };
            let owner = target.comments.get(comment).ok_or(not_found)?.author_id();
            if owner != actor.id() {
                return Err(GraphError::NotCommentAuthor {
                    post: *post,
                    comment: *comment,
                });
            }
            Ok(target.comments.remove(comment).map_or(0, |thread| thread.size()))
        })?;
        debug!(post = %post, comment = %comment, removed, "comment deleted");
        Ok(removed)
    }
}

/// First 40 characters of a body, for notification text.
fn preview(content: &str) -> String {
    const LIMIT: usize = 40;
    if content.chars().count() <= LIMIT {
        content.to_string()
    } else {
        let cut: String = content.chars().take(LIMIT).collect();
        format!("{cut}…")
    }
}
