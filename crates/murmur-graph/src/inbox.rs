use std::collections::BTreeMap;

use murmur_store::Repository;
use murmur_types::{Message, Notification, NotificationId, NotificationKind, UserId};
use serde::Serialize;
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::graph::SocialGraph;

/// One row of the conversation list: the other participant, the latest
/// message exchanged, and how many of their messages are unread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    pub with: UserId,
    pub last: Message,
    pub unread: usize,
}

impl<R: Repository> SocialGraph<R> {
    // ---- Messages ----

    /// Send a direct message from the signed-in user to `to`.
    pub fn send_message(&self, to: &UserId, content: &str) -> GraphResult<Message> {
        let sender = self.active_user()?;
        if sender.id() == *to {
            return Err(GraphError::SelfMessage);
        }
        self.load_user(to)?;
        let content = self.validate_content(content, "message")?;

        let message = Message::new(sender.id(), *to, content);
        self.repo.append_message(&message)?;
        debug!(message = %message.id, from = %sender.id(), to = %to, "message sent");

        self.notify(
            &sender,
            *to,
            NotificationKind::NewMessage,
            format!("New message from {}", sender.username),
            None,
        );
        Ok(message)
    }

    /// Every message the signed-in user sent or received, newest first.
    pub fn inbox(&self) -> GraphResult<Vec<Message>> {
        let me = self.active_user()?;
        let mut messages = self.repo.messages_for(&me.id())?;
        messages.reverse();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    /// Messages exchanged with `other`, oldest first.
    pub fn conversation(&self, other: &UserId) -> GraphResult<Vec<Message>> {
        let me = self.active_user()?;
        let mut messages: Vec<Message> = self
            .repo
            .messages_for(&me.id())?
            .into_iter()
            .filter(|m| m.counterpart(&me.id()) == *other)
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    /// One summary per conversation partner, most recent activity first.
    pub fn conversations(&self) -> GraphResult<Vec<ConversationSummary>> {
        let me = self.active_user()?;
        let mut by_partner: BTreeMap<UserId, ConversationSummary> = BTreeMap::new();
        for message in self.repo.messages_for(&me.id())? {
            let with = message.counterpart(&me.id());
            let unread = usize::from(message.receiver_id == me.id() && !message.read);
            match by_partner.get_mut(&with) {
                Some(summary) => {
                    summary.unread += unread;
                    if message.created_at >= summary.last.created_at {
                        summary.last = message;
                    }
                }
                None => {
                    by_partner.insert(
                        with,
                        ConversationSummary {
                            with,
                            last: message,
                            unread,
                        },
                    );
                }
            }
        }
        let mut summaries: Vec<_> = by_partner.into_values().collect();
        summaries.sort_by(|a, b| b.last.created_at.cmp(&a.last.created_at));
        Ok(summaries)
    }

    /// Mark every message `other` sent to the signed-in user as read.
    /// Returns how many changed.
    pub fn mark_conversation_read(&self, other: &UserId) -> GraphResult<usize> {
        let me = self.active_user()?;
        let changed: Vec<Message> = self
            .repo
            .messages_for(&me.id())?
            .into_iter()
            .filter(|m| m.sender_id == *other && m.receiver_id == me.id() && !m.read)
            .map(|mut m| {
                m.read = true;
                m
            })
            .collect();
        if changed.is_empty() {
            return Ok(0);
        }
        let count = self.repo.update_messages(&changed)?;
        debug!(user = %me.id(), with = %other, count, "conversation marked read");
        Ok(count)
    }

    pub fn unread_message_count(&self) -> GraphResult<usize> {
        let me = self.active_user()?;
        Ok(self
            .repo
            .messages_for(&me.id())?
            .iter()
            .filter(|m| m.receiver_id == me.id() && !m.read)
            .count())
    }

    // ---- Notifications ----

    /// The signed-in user's notifications, newest first.
    pub fn notifications(&self) -> GraphResult<Vec<Notification>> {
        let me = self.active_user()?;
        let mut notes = self.repo.notifications_for(&me.id())?;
        notes.reverse();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    pub fn mark_notification_read(&self, id: &NotificationId) -> GraphResult<()> {
        let me = self.active_user()?;
        let mut note = self
            .repo
            .notifications_for(&me.id())?
            .into_iter()
            .find(|n| n.id == *id)
            .ok_or(GraphError::NotificationNotFound(*id))?;
        if !note.read {
            note.read = true;
            self.repo.upsert_notifications(&[note])?;
        }
        Ok(())
    }

    /// Returns how many notifications changed.
    pub fn mark_all_notifications_read(&self) -> GraphResult<usize> {
        let me = self.active_user()?;
        let changed: Vec<Notification> = self
            .repo
            .notifications_for(&me.id())?
            .into_iter()
            .filter(|n| !n.read)
            .map(|mut n| {
                n.read = true;
                n
            })
            .collect();
        if !changed.is_empty() {
            self.repo.upsert_notifications(&changed)?;
        }
        Ok(changed.len())
    }

    pub fn unread_notification_count(&self) -> GraphResult<usize> {
        let me = self.active_user()?;
        Ok(self
            .repo
            .notifications_for(&me.id())?
            .iter()
            .filter(|n| !n.read)
            .count())
    }
}
