//! Storage for the Murmur social graph.
//!
//! The graph never touches storage directly; it is handed a
//! [`Repository`], which bundles three capability traits:
//!
//! - [`UserRepository`] — get by id or email, list, upsert
//! - [`InboxRepository`] — direct messages and notifications
//! - [`SessionStore`] — the active session as a reference to one user
//!
//! # Backends
//!
//! - [`InMemoryRepository`] — lock-guarded tables for tests and embedding
//! - [`SlotRepository`] — in-memory working set persisted to a [`DurableSlot`]
//!   after every mutation and rehydrated once on open
//!
//! # Durable Slots
//!
//! - [`MemorySlot`] — `HashMap`-backed, for tests
//! - [`FileSlot`] — one JSON file per key, atomically replaced
//!
//! The state is split over fixed keys (`"user"`, `"mockUsers"`,
//! `"messages"`, `"notifications"`). A missing or malformed value loads as
//! empty; there is no schema versioning.

pub mod error;
pub mod memory;
pub mod persistent;
pub mod slot;
pub mod snapshot;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryRepository;
pub use persistent::SlotRepository;
pub use slot::{DurableSlot, FileSlot, MemorySlot};
pub use snapshot::{StoreSnapshot, MESSAGES_KEY, NOTIFICATIONS_KEY, SESSION_KEY, USERS_KEY};
pub use traits::{InboxRepository, Repository, SessionStore, UserRepository};
