use murmur_store::Repository;
use murmur_types::{NotificationKind, User, UserId};
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::graph::SocialGraph;

impl<R: Repository> SocialGraph<R> {
    /// Follow `target` as the signed-in user, or unfollow if already
    /// following. Both ends of the edge are written together.
    ///
    /// Returns `true` if the user follows `target` afterwards.
    pub fn toggle_follow(&self, target: &UserId) -> GraphResult<bool> {
        let mut actor = self.active_user()?;
        if actor.id() == *target {
            return Err(GraphError::SelfFollow);
        }
        let mut followed = self.load_user(target)?;

        let now_following = if actor.following.remove(target) {
            followed.followers.remove(&actor.id());
            false
        } else {
            actor.following.insert(*target);
            followed.followers.insert(actor.id());
            true
        };
        self.repo.upsert_batch(&[actor.clone(), followed])?;
        debug!(user = %actor.id(), target = %target, now_following, "follow toggled");

        if now_following {
            self.notify(
                &actor,
                *target,
                NotificationKind::NewFollower,
                format!("{} started following you", actor.username),
                None,
            );
        }
        Ok(now_following)
    }

    /// Users following `user`, in store order. Empty for unknown users.
    pub fn followers_of(&self, user: &UserId) -> GraphResult<Vec<User>> {
        let Some(record) = self.repo.get(user)? else {
            return Ok(Vec::new());
        };
        Ok(self
            .repo
            .list()?
            .into_iter()
            .filter(|u| record.followers.contains(&u.id()))
            .collect())
    }

    /// Users `user` follows, in store order. Empty for unknown users.
    pub fn following_of(&self, user: &UserId) -> GraphResult<Vec<User>> {
        let Some(record) = self.repo.get(user)? else {
            return Ok(Vec::new());
        };
        Ok(self
            .repo
            .list()?
            .into_iter()
            .filter(|u| record.following.contains(&u.id()))
            .collect())
    }
}
