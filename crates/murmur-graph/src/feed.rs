use std::cmp::Reverse;

use murmur_store::Repository;
use murmur_types::Post;

use crate::error::GraphResult;
use crate::graph::SocialGraph;

/// Newest first; ids break timestamp ties so the order is total.
fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by_key(|p| Reverse((p.created_at, p.id())));
}

impl<R: Repository> SocialGraph<R> {
    /// Every post by every user, newest first. No session is required.
    pub fn feed(&self) -> GraphResult<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .repo
            .list()?
            .into_iter()
            .flat_map(|user| user.posts)
            .collect();
        sort_newest_first(&mut posts);
        Ok(posts)
    }

    /// Posts by the signed-in user and the users they follow, newest first.
    pub fn following_feed(&self) -> GraphResult<Vec<Post>> {
        let me = self.active_user()?;
        let mut posts: Vec<Post> = self
            .repo
            .list()?
            .into_iter()
            .filter(|user| user.id() == me.id() || me.following.contains(&user.id()))
            .flat_map(|user| user.posts)
            .collect();
        sort_newest_first(&mut posts);
        Ok(posts)
    }

    /// The `limit` most engaged-with posts. Engagement is likes plus
    /// comments at every depth; newer posts win ties. `None` uses the
    /// configured default.
    pub fn trending(&self, limit: Option<usize>) -> GraphResult<Vec<Post>> {
        let limit = limit.unwrap_or(self.config.trending_limit);
        let mut posts = self.feed()?;
        // Stable sort keeps the newest-first order among equal engagement.
        posts.sort_by_key(|p| Reverse(p.engagement()));
        posts.truncate(limit);
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{graph, two_users};
    use crate::GraphError;
    use murmur_types::NewPost;

    #[test]
    fn feed_merges_all_authors_newest_first() {
        let g = graph();
        two_users(&g);
        g.login("u1@example.com").unwrap();
        let a = g.create_post(NewPost::text("a")).unwrap();
        g.login("u2@example.com").unwrap();
        let b = g.create_post(NewPost::text("b")).unwrap();
        g.login("u1@example.com").unwrap();
        let c = g.create_post(NewPost::text("c")).unwrap();

        g.logout().unwrap();
        let feed = g.feed().unwrap();
        assert_eq!(feed.len(), 3);
        for pair in feed.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
        let ids: Vec<_> = feed.iter().map(Post::id).collect();
        for id in [a.id(), b.id(), c.id()] {
            assert!(ids.contains(&id));
        }
    }

    #[test]
    fn following_feed_only_includes_followed_and_self() {
        let g = graph();
        let (_, u2) = two_users(&g);
        g.login("u3@example.com").unwrap();
        g.create_post(NewPost::text("stranger")).unwrap();
        g.login("u2@example.com").unwrap();
        g.create_post(NewPost::text("followed")).unwrap();

        g.login("u1@example.com").unwrap();
        g.create_post(NewPost::text("mine")).unwrap();
        assert_eq!(g.following_feed().unwrap().len(), 1);

        g.toggle_follow(&u2.id()).unwrap();
        let bodies: Vec<_> = g
            .following_feed()
            .unwrap()
            .into_iter()
            .map(|p| p.content)
            .collect();
        assert_eq!(bodies.len(), 2);
        assert!(bodies.contains(&"followed".to_string()));
        assert!(!bodies.contains(&"stranger".to_string()));
    }

    #[test]
    fn following_feed_requires_session() {
        let g = graph();
        assert!(matches!(g.following_feed(), Err(GraphError::Unauthenticated)));
    }

    #[test]
    fn trending_ranks_by_engagement() {
        let g = graph();
        let (u1, u2) = two_users(&g);
        g.login("u2@example.com").unwrap();
        let quiet = g.create_post(NewPost::text("quiet")).unwrap();
        let liked = g.create_post(NewPost::text("liked")).unwrap();
        let busy = g.create_post(NewPost::text("busy")).unwrap();
        g.add_comment(&busy.id(), &u2.id(), "one", None).unwrap();

        g.login("u1@example.com").unwrap();
        g.toggle_post_like(&liked.id(), &u2.id()).unwrap();
        let c = g.add_comment(&busy.id(), &u2.id(), "two", None).unwrap();
        g.add_comment(&busy.id(), &u2.id(), "three", Some(&c.id()))
            .unwrap();
        g.create_post(NewPost::text("fresh")).unwrap();

        let top = g.trending(Some(2)).unwrap();
        let ids: Vec<_> = top.iter().map(Post::id).collect();
        assert_eq!(ids, vec![busy.id(), liked.id()]);

        let all = g.trending(None).unwrap();
        assert_eq!(all.len(), 4);
        // Both zero-engagement posts trail, the newer one first.
        assert_eq!(all[3].id(), quiet.id());
        assert_eq!(all[2].author_id(), u1.id());
    }

    #[test]
    fn trending_respects_configured_limit() {
        let g = crate::SocialGraph::with_config(
            murmur_store::InMemoryRepository::new(),
            crate::GraphConfig {
                trending_limit: 1,
                ..crate::GraphConfig::default()
            },
        );
        g.login("u1@example.com").unwrap();
        g.create_post(NewPost::text("a")).unwrap();
        g.create_post(NewPost::text("b")).unwrap();
        assert_eq!(g.trending(None).unwrap().len(), 1);
        assert!(g.trending(Some(0)).unwrap().is_empty());
    }
}
