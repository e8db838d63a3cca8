use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use murmur_types::{Message, Notification, User, UserId};

use crate::error::{StoreError, StoreResult};
use crate::snapshot::StoreSnapshot;
use crate::traits::{InboxRepository, SessionStore, UserRepository};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    by_id: HashMap<UserId, usize>,
    messages: Vec<Message>,
    notifications: Vec<Notification>,
    session: Option<UserId>,
}

impl Tables {
    fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut tables = Tables::default();
        for user in &snapshot.users {
            if let Err(e) = tables.upsert(user) {
                tracing::warn!(user = %user.id(), error = %e, "skipping user while loading snapshot");
            }
        }
        tables.session = snapshot
            .session
            .filter(|id| tables.by_id.contains_key(id));
        tables.messages = snapshot.messages;
        tables.notifications = snapshot.notifications;
        tables
    }

    fn upsert(&mut self, user: &User) -> StoreResult<()> {
        if let Some(existing) = self
            .users
            .iter()
            .find(|u| u.email() == user.email() && u.id() != user.id())
        {
            return Err(StoreError::DuplicateEmail {
                email: user.email().to_string(),
                existing: existing.id(),
            });
        }
        match self.by_id.get(&user.id()) {
            Some(&idx) => self.users[idx] = user.clone(),
            None => {
                self.by_id.insert(user.id(), self.users.len());
                self.users.push(user.clone());
            }
        }
        Ok(())
    }
}

/// In-memory repository.
///
/// Intended for tests and embedding, and used as the working set of
/// [`SlotRepository`](crate::SlotRepository). All tables live behind one
/// `RwLock`, so a batch write is observed all at once. Records are cloned on
/// read and write.
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    /// Create a new empty repository.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Build a repository holding the contents of `snapshot`.
    ///
    /// Users sharing an email with an earlier user are skipped.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            tables: RwLock::new(Tables::from_snapshot(snapshot)),
        }
    }

    /// Replace the whole state with `snapshot`.
    pub fn restore(&self, snapshot: StoreSnapshot) -> StoreResult<()> {
        *self.write()? = Tables::from_snapshot(snapshot);
        Ok(())
    }

    /// Copy of the full state.
    pub fn snapshot(&self) -> StoreResult<StoreSnapshot> {
        let tables = self.read()?;
        Ok(StoreSnapshot {
            session: tables.session,
            users: tables.users.clone(),
            messages: tables.messages.clone(),
            notifications: tables.notifications.clone(),
        })
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.read().map(|t| t.users.len()).unwrap_or(0)
    }

    /// Returns `true` if no user has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRepository for InMemoryRepository {
    fn get(&self, id: &UserId) -> StoreResult<Option<User>> {
        let tables = self.read()?;
        Ok(tables.by_id.get(id).map(|&idx| tables.users[idx].clone()))
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.read()?;
        Ok(tables.users.iter().find(|u| u.email() == email).cloned())
    }

    fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.read()?.users.clone())
    }

    fn upsert(&self, user: &User) -> StoreResult<()> {
        self.write()?.upsert(user)
    }

    /// All-or-nothing: every user is checked before any is written.
    fn upsert_batch(&self, users: &[User]) -> StoreResult<()> {
        let mut tables = self.write()?;
        let mut staged = Tables {
            users: tables.users.clone(),
            by_id: tables.by_id.clone(),
            ..Tables::default()
        };
        for user in users {
            staged.upsert(user)?;
        }
        tables.users = staged.users;
        tables.by_id = staged.by_id;
        Ok(())
    }
}

impl InboxRepository for InMemoryRepository {
    fn append_message(&self, message: &Message) -> StoreResult<()> {
        self.write()?.messages.push(message.clone());
        Ok(())
    }

    fn messages_for(&self, user: &UserId) -> StoreResult<Vec<Message>> {
        let tables = self.read()?;
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.involves(user))
            .cloned()
            .collect())
    }

    fn update_messages(&self, messages: &[Message]) -> StoreResult<usize> {
        let mut tables = self.write()?;
        let mut found = 0;
        for message in messages {
            if let Some(slot) = tables.messages.iter_mut().find(|m| m.id == message.id) {
                *slot = message.clone();
                found += 1;
            }
        }
        Ok(found)
    }

    fn upsert_notifications(&self, notifications: &[Notification]) -> StoreResult<()> {
        let mut tables = self.write()?;
        for notification in notifications {
            match tables
                .notifications
                .iter_mut()
                .find(|n| n.id == notification.id)
            {
                Some(existing) => *existing = notification.clone(),
                None => tables.notifications.push(notification.clone()),
            }
        }
        Ok(())
    }

    fn notifications_for(&self, user: &UserId) -> StoreResult<Vec<Notification>> {
        let tables = self.read()?;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.user_id == *user)
            .cloned()
            .collect())
    }
}

impl SessionStore for InMemoryRepository {
    fn session(&self) -> StoreResult<Option<UserId>> {
        Ok(self.read()?.session)
    }

    fn set_session(&self, user: Option<UserId>) -> StoreResult<()> {
        self.write()?.session = user;
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("user_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_types::NotificationKind;

    fn user(email: &str) -> User {
        User::new(email).unwrap()
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    #[test]
    fn upsert_and_get() {
        let repo = InMemoryRepository::new();
        let ada = user("ada@example.com");
        repo.upsert(&ada).unwrap();
        assert_eq!(repo.get(&ada.id()).unwrap(), Some(ada.clone()));
        assert_eq!(
            repo.find_by_email("ada@example.com").unwrap(),
            Some(ada)
        );
    }

    #[test]
    fn missing_user_is_none() {
        let repo = InMemoryRepository::new();
        assert!(repo.get(&UserId::new()).unwrap().is_none());
        assert!(repo.find_by_email("nobody@example.com").unwrap().is_none());
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn upsert_replaces_in_place() {
        let repo = InMemoryRepository::new();
        let mut ada = user("ada@example.com");
        let bob = user("bob@example.com");
        repo.upsert(&ada).unwrap();
        repo.upsert(&bob).unwrap();

        ada.username = "lovelace".into();
        repo.upsert(&ada).unwrap();

        let listed = repo.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].username, "lovelace");
        assert_eq!(listed[1].id(), bob.id());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let repo = InMemoryRepository::new();
        let first = user("ada@example.com");
        repo.upsert(&first).unwrap();
        let err = repo.upsert(&user("ada@example.com")).unwrap_err();
        match err {
            StoreError::DuplicateEmail { existing, .. } => assert_eq!(existing, first.id()),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let repo = InMemoryRepository::new();
        let ada = user("ada@example.com");
        repo.upsert(&ada).unwrap();

        let mut renamed = ada.clone();
        renamed.username = "changed".into();
        let clash = user("ada@example.com");
        assert!(repo.upsert_batch(&[renamed, clash]).is_err());
        assert_eq!(repo.get(&ada.id()).unwrap().unwrap().username, "ada");
        assert_eq!(repo.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Inbox
    // -----------------------------------------------------------------------

    #[test]
    fn messages_are_filtered_by_participant() {
        let repo = InMemoryRepository::new();
        let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());
        repo.append_message(&Message::new(a, b, "a->b")).unwrap();
        repo.append_message(&Message::new(c, a, "c->a")).unwrap();
        repo.append_message(&Message::new(b, c, "b->c")).unwrap();

        assert_eq!(repo.messages_for(&a).unwrap().len(), 2);
        assert_eq!(repo.messages_for(&b).unwrap().len(), 2);
    }

    #[test]
    fn update_messages_reports_hits() {
        let repo = InMemoryRepository::new();
        let mut msg = Message::new(UserId::new(), UserId::new(), "hi");
        repo.append_message(&msg).unwrap();
        msg.read = true;
        let stray = Message::new(UserId::new(), UserId::new(), "never stored");
        assert_eq!(repo.update_messages(&[msg.clone(), stray]).unwrap(), 1);
        assert!(repo.messages_for(&msg.sender_id).unwrap()[0].read);
    }

    #[test]
    fn notifications_upsert_by_id() {
        let repo = InMemoryRepository::new();
        let owner = UserId::new();
        let mut n = Notification::new(owner, NotificationKind::NewFollower, "followed");
        repo.upsert_notifications(&[n.clone()]).unwrap();
        n.read = true;
        repo.upsert_notifications(&[n]).unwrap();

        let stored = repo.notifications_for(&owner).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].read);
        assert!(repo.notifications_for(&UserId::new()).unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Session and snapshots
    // -----------------------------------------------------------------------

    #[test]
    fn session_roundtrip() {
        let repo = InMemoryRepository::new();
        assert!(repo.session().unwrap().is_none());
        let id = UserId::new();
        repo.set_session(Some(id)).unwrap();
        assert_eq!(repo.session().unwrap(), Some(id));
        repo.set_session(None).unwrap();
        assert!(repo.session().unwrap().is_none());
    }

    #[test]
    fn snapshot_roundtrip() {
        let repo = InMemoryRepository::new();
        let ada = user("ada@example.com");
        repo.upsert(&ada).unwrap();
        repo.set_session(Some(ada.id())).unwrap();

        let restored = InMemoryRepository::from_snapshot(repo.snapshot().unwrap());
        assert_eq!(restored.session().unwrap(), Some(ada.id()));
        assert_eq!(restored.get(&ada.id()).unwrap(), Some(ada));
    }

    #[test]
    fn from_snapshot_skips_duplicate_emails() {
        let first = user("ada@example.com");
        let snapshot = StoreSnapshot {
            users: vec![first.clone(), user("ada@example.com")],
            ..StoreSnapshot::default()
        };
        let repo = InMemoryRepository::from_snapshot(snapshot);
        assert_eq!(repo.list().unwrap(), vec![first]);
    }

    #[test]
    fn debug_format() {
        let repo = InMemoryRepository::new();
        repo.upsert(&user("x@example.com")).unwrap();
        let debug = format!("{repo:?}");
        assert!(debug.contains("InMemoryRepository"));
        assert!(debug.contains("user_count"));
    }
}
