use murmur_types::{Message, Notification, User, UserId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::StoreResult;
use crate::slot::DurableSlot;

/// Slot key holding the active session.
pub const SESSION_KEY: &str = "user";
/// Slot key holding the full user list.
pub const USERS_KEY: &str = "mockUsers";
/// Slot key holding every direct message.
pub const MESSAGES_KEY: &str = "messages";
/// Slot key holding every notification.
pub const NOTIFICATIONS_KEY: &str = "notifications";

/// The entire persisted state of a store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub session: Option<UserId>,
    pub users: Vec<User>,
    pub messages: Vec<Message>,
    pub notifications: Vec<Notification>,
}

impl StoreSnapshot {
    /// Read every key from `slot`.
    ///
    /// A missing key is empty. A malformed value is logged and treated as
    /// empty; only I/O failures of the slot itself are returned. A session
    /// naming a user that is not in the list is dropped.
    pub fn load(slot: &dyn DurableSlot) -> StoreResult<Self> {
        let users: Vec<User> = read_key(slot, USERS_KEY)?.unwrap_or_default();
        let messages = read_key(slot, MESSAGES_KEY)?.unwrap_or_default();
        let notifications = read_key(slot, NOTIFICATIONS_KEY)?.unwrap_or_default();

        let mut session: Option<UserId> = read_key(slot, SESSION_KEY)?;
        if let Some(id) = session {
            if !users.iter().any(|u| u.id() == id) {
                warn!(user = %id, "session refers to an unknown user; starting anonymous");
                session = None;
            }
        }

        info!(
            users = users.len(),
            authenticated = session.is_some(),
            "store rehydrated"
        );
        Ok(Self {
            session,
            users,
            messages,
            notifications,
        })
    }

    /// Write every key to `slot`. An anonymous session clears the session key.
    pub fn save(&self, slot: &dyn DurableSlot) -> StoreResult<()> {
        slot.save(USERS_KEY, &serde_json::to_string(&self.users)?)?;
        slot.save(MESSAGES_KEY, &serde_json::to_string(&self.messages)?)?;
        slot.save(
            NOTIFICATIONS_KEY,
            &serde_json::to_string(&self.notifications)?,
        )?;
        match self.session {
            Some(id) => slot.save(SESSION_KEY, &serde_json::to_string(&id)?)?,
            None => {
                slot.clear(SESSION_KEY)?;
            }
        }
        Ok(())
    }
}

fn read_key<T: DeserializeOwned>(slot: &dyn DurableSlot, key: &str) -> StoreResult<Option<T>> {
    let Some(raw) = slot.load(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "malformed slot value; treating as empty");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::MemorySlot;

    #[test]
    fn empty_slot_loads_empty_snapshot() {
        let slot = MemorySlot::new();
        let snapshot = StoreSnapshot::load(&slot).unwrap();
        assert_eq!(snapshot, StoreSnapshot::default());
    }

    #[test]
    fn save_then_load() {
        let slot = MemorySlot::new();
        let user = User::new("ada@example.com").unwrap();
        let other = User::new("bob@example.com").unwrap();
        let snapshot = StoreSnapshot {
            session: Some(user.id()),
            messages: vec![Message::new(user.id(), other.id(), "hi")],
            users: vec![user, other],
            notifications: vec![],
        };
        snapshot.save(&slot).unwrap();

        let loaded = StoreSnapshot::load(&slot).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn malformed_values_are_treated_as_empty() {
        let slot = MemorySlot::new();
        slot.save(USERS_KEY, "{not json").unwrap();
        slot.save(MESSAGES_KEY, "42").unwrap();
        slot.save(SESSION_KEY, "\"nope\"").unwrap();

        let loaded = StoreSnapshot::load(&slot).unwrap();
        assert!(loaded.users.is_empty());
        assert!(loaded.messages.is_empty());
        assert!(loaded.session.is_none());
    }

    #[test]
    fn dangling_session_is_dropped() {
        let slot = MemorySlot::new();
        slot.save(USERS_KEY, "[]").unwrap();
        slot.save(SESSION_KEY, &serde_json::to_string(&UserId::new()).unwrap())
            .unwrap();
        assert!(StoreSnapshot::load(&slot).unwrap().session.is_none());
    }

    #[test]
    fn anonymous_save_clears_session_key() {
        let slot = MemorySlot::new();
        slot.save(SESSION_KEY, "\"stale\"").unwrap();
        StoreSnapshot::default().save(&slot).unwrap();
        assert!(slot.load(SESSION_KEY).unwrap().is_none());
        assert_eq!(slot.load(USERS_KEY).unwrap().as_deref(), Some("[]"));
    }
}
