//! # Allocation State Store
//!
//! Stateful allocation remembers every loopback and link subnet it has
//! ever handed out, keyed by a stable name that survives topology
//! re-derivation:
//!
//! - `loopbacks`: hostname -> loopback address with prefix
//! - `transit`: `"{leaf}-{spine}"` -> `{subnet}`
//! - `inter_leaf`: `"{leaf1}-{leaf2}"` -> `{subnet}`
//!
//! The store is append-only. Keys are never removed, even when the device
//! they name disappears from a later run; such keys simply stop having an
//! effect on the device graph while still holding their address.
//!
//! The allocator only talks to the [`StateStore`] trait, so the backend can
//! be swapped without touching allocation logic. [`FileStateStore`] keeps the
//! state as a YAML document on disk; [`MemoryStateStore`] keeps it in memory
//! for tests and dry runs.
//!
//! ## Persisted layout
//!
//! ```yaml
//! loopbacks:
//!   s01: 10.10.20.1/32
//! transit:
//!   l01-s01:
//!     subnet: 10.10.10.0/31
//! inter_leaf:
//!   l01-l02:
//!     subnet: 10.10.10.8/31
//! ```

pub mod file;
pub mod types;

pub use file::FileStateStore;
pub use types::{AllocationState, StateSection, SubnetRecord};

use ipnet::Ipv4Net;

use crate::error::Result;

/// Key -> assignment store consulted by stateful allocation
pub trait StateStore {
    /// Previously recorded assignment for a key
    fn get(&self, section: StateSection, key: &str) -> Option<Ipv4Net>;

    /// Record an assignment; existing keys keep their first value
    fn put(&mut self, section: StateSection, key: &str, value: Ipv4Net);

    /// Every recorded assignment, whether or not its device still exists
    fn claimed(&self) -> Vec<(StateSection, String, Ipv4Net)>;

    /// Make the recorded assignments durable
    fn persist(&mut self) -> Result<()>;
}

/// In-memory store, never written anywhere
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    state: AllocationState,
    persist_count: usize,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: AllocationState) -> Self {
        Self {
            state,
            persist_count: 0,
        }
    }

    pub fn state(&self) -> &AllocationState {
        &self.state
    }

    /// How many times `persist` has been called
    pub fn persist_count(&self) -> usize {
        self.persist_count
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, section: StateSection, key: &str) -> Option<Ipv4Net> {
        self.state.get(section, key)
    }

    fn put(&mut self, section: StateSection, key: &str, value: Ipv4Net) {
        self.state.insert(section, key, value);
    }

    fn claimed(&self) -> Vec<(StateSection, String, Ipv4Net)> {
        self.state.entries()
    }

    fn persist(&mut self) -> Result<()> {
        self.persist_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_is_append_only() {
        let mut store = MemoryStateStore::new();
        let first: Ipv4Net = "10.0.1.1/32".parse().unwrap();
        let second: Ipv4Net = "10.0.1.2/32".parse().unwrap();

        store.put(StateSection::Loopbacks, "s01", first);
        store.put(StateSection::Loopbacks, "s01", second);

        assert_eq!(store.get(StateSection::Loopbacks, "s01"), Some(first));
        assert_eq!(store.claimed().len(), 1);
        assert_eq!(store.get(StateSection::Transit, "s01"), None);
    }
}
