use murmur_store::Repository;
use murmur_types::{
    NewPost, NotificationKind, PollOptionId, Post, PostId, Reaction, TypeError, UserId,
};
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::graph::SocialGraph;

impl<R: Repository> SocialGraph<R> {
    /// Publish a post as the signed-in user.
    ///
    /// The post gets a fresh id, the author's current name and avatar, no
    /// reactions or comments, zero views and the current time, and is placed
    /// at the front of the author's post list.
    pub fn create_post(&self, mut draft: NewPost) -> GraphResult<Post> {
        let mut author = self.active_user()?;
        if draft.is_empty() {
            return Err(GraphError::InvalidInput("post is empty".into()));
        }
        draft.content = draft.content.trim().to_string();
        self.check_length(&draft.content, "post")?;

        let post = Post::new(author.author_stamp(), draft)?;
        author.posts.insert(0, post.clone());
        self.repo.upsert(&author)?;
        debug!(post = %post.id(), author = %author.id(), "post created");
        Ok(post)
    }

    /// Toggle the signed-in user's like on a post, clearing a dislike first.
    /// Returns the user's reaction afterwards.
    pub fn toggle_post_like(&self, post: &PostId, author: &UserId) -> GraphResult<Option<Reaction>> {
        self.react_to_post(post, author, Reaction::Like)
    }

    /// Toggle the signed-in user's dislike on a post, clearing a like first.
    /// Returns the user's reaction afterwards.
    pub fn toggle_post_dislike(
        &self,
        post: &PostId,
        author: &UserId,
    ) -> GraphResult<Option<Reaction>> {
        self.react_to_post(post, author, Reaction::Dislike)
    }

    fn react_to_post(
        &self,
        post: &PostId,
        author: &UserId,
        reaction: Reaction,
    ) -> GraphResult<Option<Reaction>> {
        let actor = self.active_user()?;
        let outcome = self.edit_post(&actor, post, author, |actor, target| {
            Ok(target.reactions.toggle(actor.id(), reaction))
        })?;
        debug!(post = %post, user = %actor.id(), ?outcome, "post reaction toggled");

        if let Some(added) = outcome {
            let kind = match added {
                Reaction::Like => NotificationKind::PostLiked,
                Reaction::Dislike => NotificationKind::PostDisliked,
            };
            self.notify(
                &actor,
                *author,
                kind,
                format!("{} reacted with a {added} to your post", actor.username),
                Some(*post),
            );
        }
        Ok(outcome)
    }

    /// Cast the signed-in user's vote in a post's poll. Returns the chosen
    /// option's new tally.
    pub fn vote_poll(
        &self,
        post: &PostId,
        author: &UserId,
        option: PollOptionId,
    ) -> GraphResult<u64> {
        let actor = self.active_user()?;
        let votes = self.edit_post(&actor, post, author, |actor, target| {
            let poll = target.poll.as_mut().ok_or(GraphError::PollNotFound(*post))?;
            poll.vote(actor.id(), option).map_err(|e| match e {
                TypeError::AlreadyVoted => GraphError::AlreadyVoted(*post),
                other => other.into(),
            })
        })?;
        debug!(post = %post, %option, votes, "poll vote recorded");
        Ok(votes)
    }

    /// Count one view of a post. No session is required.
    pub fn record_view(&self, post: &PostId, author: &UserId) -> GraphResult<u64> {
        let mut owner = self.load_user(author)?;
        let target = owner.post_mut(post).ok_or(GraphError::PostNotFound {
            post: *post,
            author: *author,
        })?;
        target.views += 1;
        let views = target.views;
        self.repo.upsert(&owner)?;
        Ok(views)
    }
}
