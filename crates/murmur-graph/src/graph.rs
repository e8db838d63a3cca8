use murmur_store::Repository;
use murmur_types::{
    normalize_email, Notification, NotificationKind, Post, PostId, ProfileUpdate, User, UserId,
};
use tracing::{debug, info, warn};

use crate::config::GraphConfig;
use crate::error::{GraphError, GraphResult};

/// The social graph: the one place where users, posts, comments, follows and
/// inbox records are mutated.
///
/// The active session is a reference to a user stored in the repository, so
/// [`current_user`](Self::current_user) always reads the same record that
/// every other operation writes.
pub struct SocialGraph<R: Repository> {
    pub(crate) repo: R,
    pub(crate) config: GraphConfig,
}

impl<R: Repository> SocialGraph<R> {
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, GraphConfig::default())
    }

    pub fn with_config(repo: R, config: GraphConfig) -> Self {
        Self { repo, config }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // ---- Session ----

    /// Sign in as the account registered to `email`, creating it on first
    /// use. No password is checked.
    pub fn login(&self, email: &str) -> GraphResult<User> {
        self.establish_session(email)
    }

    /// Register `email`, or sign in if it is already registered.
    pub fn signup(&self, email: &str) -> GraphResult<User> {
        self.establish_session(email)
    }

    fn establish_session(&self, email: &str) -> GraphResult<User> {
        let email = normalize_email(email)?;
        let user = match self.repo.find_by_email(&email)? {
            Some(existing) => existing,
            None => {
                let created = User::new(&email)?;
                self.repo.upsert(&created)?;
                info!(user = %created.id(), "user created");
                created
            }
        };
        self.repo.set_session(Some(user.id()))?;
        info!(user = %user.id(), "session started");
        Ok(user)
    }

    /// End the active session. The user record is kept.
    pub fn logout(&self) -> GraphResult<()> {
        if let Some(id) = self.repo.session()? {
            self.repo.set_session(None)?;
            info!(user = %id, "session ended");
        }
        Ok(())
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> GraphResult<Option<User>> {
        match self.repo.session()? {
            Some(id) => Ok(self.repo.get(&id)?),
            None => Ok(None),
        }
    }

    pub fn is_authenticated(&self) -> GraphResult<bool> {
        Ok(self.current_user()?.is_some())
    }

    // ---- Profile ----

    /// Merge `update` into the signed-in user in a single write.
    /// The username is stored trimmed and must not be blank.
    pub fn update_profile(&self, mut update: ProfileUpdate) -> GraphResult<User> {
        let mut user = self.active_user()?;
        if let Some(username) = update.username.as_mut() {
            let trimmed = username.trim();
            if trimmed.is_empty() {
                return Err(GraphError::InvalidInput("username is empty".into()));
            }
            *username = trimmed.to_string();
        }
        update.apply(&mut user);
        self.repo.upsert(&user)?;
        debug!(user = %user.id(), "profile updated");
        Ok(user)
    }

    // ---- Lookups ----

    pub fn get_user_by_id(&self, id: &UserId) -> GraphResult<Option<User>> {
        Ok(self.repo.get(id)?)
    }

    pub fn get_all_users(&self) -> GraphResult<Vec<User>> {
        Ok(self.repo.list()?)
    }

    pub fn get_post_by_id(&self, post: &PostId, author: &UserId) -> GraphResult<Option<Post>> {
        Ok(self
            .repo
            .get(author)?
            .and_then(|user| user.post(post).cloned()))
    }

    // ---- Internal helpers ----

    /// The signed-in user's current record.
    pub(crate) fn active_user(&self) -> GraphResult<User> {
        let id = self.repo.session()?.ok_or(GraphError::Unauthenticated)?;
        self.repo.get(&id)?.ok_or(GraphError::Unauthenticated)
    }

    pub(crate) fn load_user(&self, id: &UserId) -> GraphResult<User> {
        self.repo.get(id)?.ok_or(GraphError::UserNotFound(*id))
    }

    /// Run `op` on a post owned by `author` and write the author back.
    ///
    /// `op` receives the acting user (a snapshot taken before the change)
    /// and the post. Nothing is written when `op` fails.
    pub(crate) fn edit_post<T>(
        &self,
        actor: &User,
        post: &PostId,
        author: &UserId,
        op: impl FnOnce(&User, &mut Post) -> GraphResult<T>,
    ) -> GraphResult<T> {
        let mut owner = if actor.id() == *author {
            actor.clone()
        } else {
            self.load_user(author)?
        };
        let target = owner.post_mut(post).ok_or(GraphError::PostNotFound {
            post: *post,
            author: *author,
        })?;
        let out = op(actor, target)?;
        self.repo.upsert(&owner)?;
        Ok(out)
    }

    /// Trim `content` and check it against the configured bounds.
    pub(crate) fn validate_content(&self, content: &str, what: &str) -> GraphResult<String> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(GraphError::InvalidInput(format!("{what} is empty")));
        }
        self.check_length(trimmed, what)?;
        Ok(trimmed.to_string())
    }

    pub(crate) fn check_length(&self, content: &str, what: &str) -> GraphResult<()> {
        let len = content.chars().count();
        if len > self.config.max_content_len {
            return Err(GraphError::InvalidInput(format!(
                "{what} is {len} characters, limit is {}",
                self.config.max_content_len
            )));
        }
        Ok(())
    }

    /// Record a notification for `recipient` about something `actor` did.
    /// Nothing is recorded for self-directed actions or when notifications
    /// are disabled.
    ///
    /// Runs after the action itself has been stored, so a failure here is
    /// logged and otherwise ignored: the caller's action stands.
    pub(crate) fn notify(
        &self,
        actor: &User,
        recipient: UserId,
        kind: NotificationKind,
        content: String,
        post: Option<PostId>,
    ) {
        if !self.config.notifications || recipient == actor.id() {
            return;
        }
        let mut note = Notification::new(recipient, kind, content).with_user(actor.id());
        if let Some(post) = post {
            note = note.with_post(post);
        }
        match self.repo.upsert_notifications(&[note]) {
            Ok(()) => debug!(recipient = %recipient, %kind, "notification recorded"),
            Err(e) => warn!(recipient = %recipient, %kind, error = %e, "notification dropped"),
        }
    }
}

impl<R: Repository + std::fmt::Debug> std::fmt::Debug for SocialGraph<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialGraph")
            .field("repo", &self.repo)
            .field("config", &self.config)
            .finish()
    }
}
