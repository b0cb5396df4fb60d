use std::{collections::HashMap, sync::Arc};

use tether_core::{Event, ObjectId};

/// What a listener wants to happen to itself once it has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retain {
    Keep,
    Remove,
}

pub type Listener = Arc<dyn Fn(&Event) -> Retain + Send + Sync>;

/// Handle returned when a listener is registered, used to remove it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listeners indexed by target id, then by event name.
///
/// Each listener carries a unique id so removal never depends on its
/// position, which may shift while a dispatch pass is running.
#[derive(Default)]
pub(crate) struct Registry {
    listeners: HashMap<ObjectId, HashMap<String, Vec<(ListenerId, Listener)>>>,
    next_id: u64,
}

impl Registry {
    pub(crate) fn add(
        &mut self,
        target_id: ObjectId,
        event_name: &str,
        listener: Listener,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(target_id)
            .or_default()
            .entry(event_name.to_owned())
            .or_default()
            .push((id, listener));
        id
    }

    pub(crate) fn remove(
        &mut self,
        target_id: &ObjectId,
        event_name: &str,
        id: ListenerId,
    ) -> bool {
        let Some(by_name) = self.listeners.get_mut(target_id) else {
            return false;
        };
        let Some(listeners) = by_name.get_mut(event_name) else {
            return false;
        };

        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        let removed = listeners.len() != before;

        if listeners.is_empty() {
            by_name.remove(event_name);
        }
        if by_name.is_empty() {
            self.listeners.remove(target_id);
        }
        removed
    }

    /// Drop every listener registered for `target_id`. Returns how many
    /// there were.
    pub(crate) fn remove_target(&mut self, target_id: &ObjectId) -> usize {
        self.listeners
            .remove(target_id)
            .map_or(0, |by_name| by_name.values().map(Vec::len).sum())
    }

    /// Copy of the listeners for one pair, in registration order.
    pub(crate) fn snapshot(
        &self,
        target_id: &ObjectId,
        event_name: &str,
    ) -> Vec<(ListenerId, Listener)> {
        self.listeners
            .get(target_id)
            .and_then(|by_name| by_name.get(event_name))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, target_id: &ObjectId, event_name: &str) -> usize {
        self.listeners
            .get(target_id)
            .and_then(|by_name| by_name.get(event_name))
            .map_or(0, Vec::len)
    }
}
