//! Allocation registry.
//!
//! Tracks every address and subnet handed out during one allocation run,
//! including values carried over from persisted state, so no two owners
//! ever end up with overlapping address space.

use std::collections::HashMap;

use ipnet::Ipv4Net;

use crate::error::{FabricError, Result};
use crate::utils::ip_utils::overlaps;

/// Ownership ledger for allocated networks
#[derive(Debug, Default)]
pub struct AllocationRegistry {
    /// Network -> owner id
    assigned: HashMap<Ipv4Net, String>,
    /// Registration order, for overlap scans
    order: Vec<Ipv4Net>,
}

impl AllocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `net` as owned by `owner`.
    ///
    /// Registering the same network again for the same owner is a no-op;
    /// any overlap with a network held by someone else is an error.
    pub fn register(&mut self, net: Ipv4Net, owner: &str) -> Result<()> {
        if let Some(existing) = self.assigned.get(&net) {
            if existing == owner {
                return Ok(());
            }
        }
        if let Some(other) = self.conflict(&net) {
            let holder = self.owner_of(&other).unwrap_or("?");
            return Err(FabricError::consistency(
                "allocation",
                format!("{} for {} overlaps {} held by {}", net, owner, other, holder),
            ));
        }
        self.assigned.insert(net, owner.to_string());
        self.order.push(net);
        Ok(())
    }

    fn conflict(&self, net: &Ipv4Net) -> Option<Ipv4Net> {
        self.order.iter().find(|held| overlaps(held, net)).copied()
    }

    /// Whether any registered network shares an address with `net`
    pub fn is_claimed(&self, net: &Ipv4Net) -> bool {
        self.conflict(net).is_some()
    }

    fn owner_of(&self, net: &Ipv4Net) -> Option<&str> {
        self.assigned.get(net).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
