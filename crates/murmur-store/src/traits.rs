use murmur_types::{Message, Notification, User, UserId};

use crate::error::StoreResult;

/// User table.
///
/// Implementations must satisfy these invariants:
/// - `list()` returns users in first-insert order.
/// - Emails are unique; `upsert` rejects a user whose email belongs to a
///   different id.
/// - A missing user is `Ok(None)`, never an error.
pub trait UserRepository: Send + Sync {
    /// Read a user by id. Returns `Ok(None)` if the user does not exist.
    fn get(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// Read a user by (already normalized) email address.
    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// All users in first-insert order.
    fn list(&self) -> StoreResult<Vec<User>>;

    /// Insert a new user or replace the stored record with the same id.
    fn upsert(&self, user: &User) -> StoreResult<()>;

    /// Upsert several users as one logical write.
    ///
    /// Default implementation calls `upsert()` for each user. Backends that
    /// persist on every write should override it to persist once.
    fn upsert_batch(&self, users: &[User]) -> StoreResult<()> {
        users.iter().try_for_each(|user| self.upsert(user))
    }
}

/// Direct messages and notifications.
pub trait InboxRepository: Send + Sync {
    fn append_message(&self, message: &Message) -> StoreResult<()>;

    /// Messages sent or received by `user`, in insertion order.
    fn messages_for(&self, user: &UserId) -> StoreResult<Vec<Message>>;

    /// Replace stored messages that share an id with the given ones.
    /// Returns how many were found.
    fn update_messages(&self, messages: &[Message]) -> StoreResult<usize>;

    /// Insert or replace notifications by id.
    fn upsert_notifications(&self, notifications: &[Notification]) -> StoreResult<()>;

    /// Notifications addressed to `user`, in insertion order.
    fn notifications_for(&self, user: &UserId) -> StoreResult<Vec<Notification>>;
}

/// The active session: a reference to one user, or none.
pub trait SessionStore: Send + Sync {
    fn session(&self) -> StoreResult<Option<UserId>>;

    fn set_session(&self, user: Option<UserId>) -> StoreResult<()>;
}

/// Everything the social graph needs from its backing store.
pub trait Repository: UserRepository + InboxRepository + SessionStore {}

impl<T: UserRepository + InboxRepository + SessionStore> Repository for T {}
