use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DegenerateJoinery;
use crate::geometry::WallEntity;

/// Why a change notification fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    Created,
    Updated,
    Deleted,
    /// A batch ended or a recompute was requested explicitly.
    JoineryRecomputed,
}

/// Payload handed to every listener, once per logical mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub reason: ChangeReason,
    /// Every wall in the store, with resolved joinery.
    pub walls: Vec<WallEntity>,
    /// Clamping warnings from the latest joinery pass.
    pub warnings: Vec<DegenerateJoinery>,
}

/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&ChangeEvent)>;

/// Synchronous observer list.
///
/// Listeners run in registration order on the caller's stack.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl ChangeNotifier {
    /// Creates a notifier with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns its handle.
    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Hands `event` to every listener in registration order.
    pub fn emit(&mut self, event: &ChangeEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
