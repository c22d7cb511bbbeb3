//! Bookkeeping for live client sessions.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::dispatch::Privilege;

#[derive(Debug, Default)]
struct Registry {
    next_id: AtomicU64,
    active: Mutex<BTreeMap<u64, Privilege>>,
}

/// Bounded set of active sessions.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    inner: Arc<Registry>,
    capacity: usize,
}

impl SessionRegistry {
    /// Builds a registry admitting at most `capacity` sessions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Registry::default()),
            capacity: capacity.max(1),
        }
    }

    /// Admits a session, or returns `None` when the registry is full.
    ///
    /// The session stays registered until the ticket is dropped.
    #[must_use]
    pub fn register(&self, privilege: Privilege) -> Option<SessionTicket> {
        let mut active = self.active();
        if active.len() >= self.capacity {
            return None;
        }
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        active.insert(id, privilege);
        Some(SessionTicket {
            id,
            privilege,
            registry: Arc::clone(&self.inner),
        })
    }

    /// Number of sessions currently registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active().len()
    }

    /// Whether no session is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of concurrent sessions.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn active(&self) -> MutexGuard<'_, BTreeMap<u64, Privilege>> {
        self.inner.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration of one live session; deregisters on drop.
#[derive(Debug)]
pub struct SessionTicket {
    id: u64,
    privilege: Privilege,
    registry: Arc<Registry>,
}

impl SessionTicket {
    /// Registry-assigned session number.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Privilege tier granted to the session.
    #[must_use]
    pub const fn privilege(&self) -> Privilege {
        self.privilege
    }
}

impl Drop for SessionTicket {
    fn drop(&mut self) {
        self.registry
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_enforces_capacity_until_a_ticket_drops() {
        let registry = SessionRegistry::new(2);
        let first = registry.register(Privilege::Control).expect("room for first");
        let second = registry.register(Privilege::ReadOnly).expect("room for second");
        assert!(registry.register(Privilege::ReadOnly).is_none());
        assert_ne!(first.id(), second.id());

        drop(first);

        assert_eq!(registry.len(), 1);
        let third = registry.register(Privilege::ReadOnly).expect("slot released");
        assert_eq!(third.privilege(), Privilege::ReadOnly);
    }

    #[test]
    fn zero_capacity_still_admits_one_session() {
        let registry = SessionRegistry::new(0);
        assert_eq!(registry.capacity(), 1);
        let _ticket = registry.register(Privilege::Control).expect("one slot");
        assert!(registry.register(Privilege::Control).is_none());
    }
}
