use std::sync::Mutex;

use murmur_types::{Message, Notification, User, UserId};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryRepository;
use crate::slot::DurableSlot;
use crate::snapshot::StoreSnapshot;
use crate::traits::{InboxRepository, SessionStore, UserRepository};

/// Repository persisted to a [`DurableSlot`].
///
/// The slot is read once when the repository is opened. Reads are served
/// from an in-memory working set; every mutating call updates the working
/// set and then writes the complete state back to the slot before
/// returning. There is no merge with other writers of the same slot: the
/// last write wins.
pub struct SlotRepository<S: DurableSlot> {
    slot: S,
    working: InMemoryRepository,
    // Serializes mutate-then-persist so two writers cannot interleave their
    // slot writes out of order.
    flush: Mutex<()>,
}

impl<S: DurableSlot> SlotRepository<S> {
    /// Hydrate from `slot`. Missing or malformed values start empty.
    pub fn open(slot: S) -> StoreResult<Self> {
        let snapshot = StoreSnapshot::load(&slot)?;
        Ok(Self {
            working: InMemoryRepository::from_snapshot(snapshot),
            slot,
            flush: Mutex::new(()),
        })
    }

    /// The underlying slot.
    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Apply `op` to the working set and persist the result.
    ///
    /// If the slot write fails the working set is rolled back, so a
    /// rejected change is neither visible to reads nor carried out by the
    /// next successful write.
    fn mutate<T>(&self, op: impl FnOnce(&InMemoryRepository) -> StoreResult<T>) -> StoreResult<T> {
        let _guard = self
            .flush
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        let previous = self.working.snapshot()?;
        let out = op(&self.working)?;
        let snapshot = self.working.snapshot()?;
        if let Err(e) = snapshot.save(&self.slot) {
            warn!(error = %e, "store write failed; rolling back");
            // A partial write may have replaced some keys already.
            if let Err(restore) = previous.save(&self.slot) {
                warn!(error = %restore, "could not rewrite previous state to slot");
            }
            self.working.restore(previous)?;
            return Err(e);
        }
        debug!(users = snapshot.users.len(), "store persisted");
        Ok(out)
    }
}

impl<S: DurableSlot> UserRepository for SlotRepository<S> {
    fn get(&self, id: &UserId) -> StoreResult<Option<User>> {
        self.working.get(id)
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.working.find_by_email(email)
    }

    fn list(&self) -> StoreResult<Vec<User>> {
        self.working.list()
    }

    fn upsert(&self, user: &User) -> StoreResult<()> {
        self.mutate(|repo| repo.upsert(user))
    }

    fn upsert_batch(&self, users: &[User]) -> StoreResult<()> {
        self.mutate(|repo| repo.upsert_batch(users))
    }
}

impl<S: DurableSlot> InboxRepository for SlotRepository<S> {
    fn append_message(&self, message: &Message) -> StoreResult<()> {
        self.mutate(|repo| repo.append_message(message))
    }

    fn messages_for(&self, user: &UserId) -> StoreResult<Vec<Message>> {
        self.working.messages_for(user)
    }

    fn update_messages(&self, messages: &[Message]) -> StoreResult<usize> {
        self.mutate(|repo| repo.update_messages(messages))
    }

    fn upsert_notifications(&self, notifications: &[Notification]) -> StoreResult<()> {
        self.mutate(|repo| repo.upsert_notifications(notifications))
    }

    fn notifications_for(&self, user: &UserId) -> StoreResult<Vec<Notification>> {
        self.working.notifications_for(user)
    }
}

impl<S: DurableSlot> SessionStore for SlotRepository<S> {
    fn session(&self) -> StoreResult<Option<UserId>> {
        self.working.session()
    }

    fn set_session(&self, user: Option<UserId>) -> StoreResult<()> {
        self.mutate(|repo| repo.set_session(user))
    }
}

impl<S: DurableSlot> std::fmt::Debug for SlotRepository<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotRepository")
            .field("working", &self.working)
            .finish()
    }
}
