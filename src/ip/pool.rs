//! Cursor-based address pools.

use ipnet::Ipv4Net;

use super::registry::AllocationRegistry;
use crate::error::{FabricError, Result};
use crate::utils::ip_utils::{block_count, first_host_offset, host_at_offset, host_end_offset, nth_block};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Single host addresses, handed out as /32
    Host,
    /// Disjoint subnets of the given prefix length
    Block(u8),
}

/// A window of a network consumed front to back.
///
/// The cursor only moves forward; values already present in the registry
/// are skipped, so a pool never hands out space someone else holds.
#[derive(Debug, Clone)]
pub struct AddressPool {
    label: String,
    network: Ipv4Net,
    slot: Slot,
    cursor: u64,
    end: u64,
    taken: usize,
}

impl AddressPool {
    /// Host addresses at offsets `[start, end)` of `network`, clamped to its
    /// usable range
    pub fn hosts(label: &str, network: Ipv4Net, start: u64, end: u64) -> Self {
        let start = start.max(first_host_offset(&network));
        let end = end.min(host_end_offset(&network)).max(start);
        Self {
            label: label.to_string(),
            network,
            slot: Slot::Host,
            cursor: start,
            end,
            taken: 0,
        }
    }

    /// `/prefix_len` blocks of `network` from block index `start` to the end
    pub fn blocks(label: &str, network: Ipv4Net, prefix_len: u8, start: u64) -> Self {
        let end = block_count(&network, prefix_len);
        let start = start.min(end);
        Self {
            label: label.to_string(),
            network,
            slot: Slot::Block(prefix_len),
            cursor: start,
            end,
            taken: 0,
        }
    }

    fn value_at(&self, index: u64) -> Option<Ipv4Net> {
        match self.slot {
            Slot::Host => host_at_offset(&self.network, index).map(Ipv4Net::from),
            Slot::Block(prefix_len) => nth_block(&self.network, prefix_len, index),
        }
    }

    /// Next value not held in `registry`
    pub fn take(&mut self, registry: &AllocationRegistry) -> Result<Ipv4Net> {
        while self.cursor < self.end {
            let index = self.cursor;
            self.cursor += 1;
            match self.value_at(index) {
                Some(value) if !registry.is_claimed(&value) => {
                    self.taken += 1;
                    return Ok(value);
                }
                _ => continue,
            }
        }
        Err(FabricError::capacity(
            format!("{} in {}", self.label, self.network),
            self.taken + 1,
            self.taken,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv4Net {
        s.parse().unwrap()
    }

    #[test]
    fn test_host_pool_skips_claimed() {
        let mut registry = AllocationRegistry::new();
        registry.register(net("10.10.20.2/32"), "loopbacks:old").unwrap();

        let mut pool = AddressPool::hosts("loopbacks", net("10.10.20.0/24"), 0, 4);
        assert_eq!(pool.take(&registry).unwrap(), net("10.10.20.1/32"));
        assert_eq!(pool.take(&registry).unwrap(), net("10.10.20.3/32"));
        match pool.take(&registry).unwrap_err() {
            FabricError::Capacity { required, available, .. } => {
                assert_eq!(required, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected capacity error, got {}", other),
        }
    }

    #[test]
    fn test_block_pool_from_offset() {
        let registry = AllocationRegistry::new();
        let mut pool = AddressPool::blocks("inter-leaf subnets", net("10.0.0.0/29"), 31, 2);
        assert_eq!(pool.take(&registry).unwrap(), net("10.0.0.4/31"));
        assert_eq!(pool.take(&registry).unwrap(), net("10.0.0.6/31"));
        assert!(pool.take(&registry).unwrap_err().is_capacity());
    }

    #[test]
    fn test_empty_window() {
        let registry = AllocationRegistry::new();
        let mut pool = AddressPool::hosts("leaf loopbacks", net("10.10.20.0/29"), 102, 200);
        assert!(pool.take(&registry).unwrap_err().is_capacity());
    }
}
