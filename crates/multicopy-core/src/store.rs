//! Per-host message stores
//!
//! The router never owns messages; it reads the local host's store to find
//! an existing replica and hands the new replica back to the caller for
//! admission. [`MessageStore`] is the seam, [`MemoryStore`] the in-memory
//! implementation used by the simulator and the tests.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::StoreError;
use crate::message::{Message, MessageId};

/// Storage abstraction for a host's message replicas
///
/// A store holds at most one replica per message id; `put` replaces any
/// replica already present for the same id.
pub trait MessageStore {
    /// Whether a replica of `id` is held
    fn has(&self, id: &MessageId) -> bool;

    /// Get the replica of `id`, if held
    fn get(&self, id: &MessageId) -> Option<&Message>;

    /// Insert a replica, returning the one it replaced
    fn put(&mut self, message: Message) -> Option<Message>;

    /// Remove the replica of `id`
    fn remove(&mut self, id: &MessageId) -> Result<Message, StoreError>;

    /// All held replicas, ordered by id
    fn messages(&self) -> Vec<&Message>;

    /// Number of held replicas
    fn len(&self) -> usize;

    /// Whether the store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Credits held by the replica of `id`, 0 if none
    fn copies_of(&self, id: &MessageId) -> u32 {
        self.get(id).map(Message::copies).unwrap_or(0)
    }

    /// Sum of the credits of every held replica
    fn total_copies(&self) -> u64 {
        self.messages()
            .iter()
            .map(|m| u64::from(m.copies()))
            .sum()
    }
}

/// In-memory message store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    messages: BTreeMap<MessageId, Message>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageStore for MemoryStore {
    fn has(&self, id: &MessageId) -> bool {
        self.messages.contains_key(id)
    }

    fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.get(id)
    }

    fn put(&mut self, message: Message) -> Option<Message> {
        trace!(message_id = %message.id, copies = message.copies(), "Storing replica");
        self.messages.insert(message.id.clone(), message)
    }

    fn remove(&mut self, id: &MessageId) -> Result<Message, StoreError> {
        self.messages
            .remove(id)
            .ok_or_else(|| StoreError::MessageNotFound(id.to_string()))
    }

    fn messages(&self) -> Vec<&Message> {
        self.messages.values().collect()
    }

    fn len(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::HostId;

    fn make_message(id: &str, copies: u32) -> Message {
        Message::new(
            MessageId::new(id).unwrap(),
            HostId::new("n1").unwrap(),
            [HostId::new("n9").unwrap()],
            100,
            0,
        )
        .unwrap()
        .with_copies(copies)
    }

    #[test]
    fn test_put_get_remove() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());

        assert!(store.put(make_message("M1", 4)).is_none());
        assert!(store.has(&MessageId::new("M1").unwrap()));
        assert_eq!(store.len(), 1);

        let removed = store.remove(&MessageId::new("M1").unwrap()).unwrap();
        assert_eq!(removed.copies(), 4);
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_replaces_existing_replica() {
        let mut store = MemoryStore::new();
        store.put(make_message("M1", 4));

        let replaced = store.put(make_message("M1", 7)).unwrap();
        assert_eq!(replaced.copies(), 4);
        assert_eq!(store.len(), 1);
        assert_eq!(store.copies_of(&MessageId::new("M1").unwrap()), 7);
    }

    #[test]
    fn test_remove_missing() {
        let mut store = MemoryStore::new();
        let result = store.remove(&MessageId::new("nope").unwrap());
        assert!(matches!(result, Err(StoreError::MessageNotFound(_))));
    }

    #[test]
    fn test_total_copies() {
        let mut store = MemoryStore::new();
        store.put(make_message("M1", 4));
        store.put(make_message("M2", 3));
        store.put(make_message("M3", 0));

        assert_eq!(store.total_copies(), 7);
        assert_eq!(store.copies_of(&MessageId::new("M9").unwrap()), 0);
    }
}
