//! Leaf uplink selection.

/// Chooses which spine each leaf is cabled to
pub trait UplinkSelector {
    /// Indexes of the spines participating in leaf uplinks, in spine order
    fn uplink_set(&self, num_spines: usize) -> Vec<usize>;

    /// Index of the spine the leaf at `leaf_index` connects to
    fn select(&self, leaf_index: usize, num_spines: usize) -> usize;
}

/// Round-robin over the first `uplinks` spines.
///
/// With two uplinks this is the classic dual-homing split: even leafs on
/// the first spine, odd leafs on the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRobin {
    uplinks: usize,
}

impl RoundRobin {
    pub fn new(uplinks: usize) -> Self {
        Self { uplinks }
    }

    fn width(&self, num_spines: usize) -> usize {
        self.uplinks.min(num_spines).max(1)
    }
}

impl UplinkSelector for RoundRobin {
    fn uplink_set(&self, num_spines: usize) -> Vec<usize> {
        (0..self.uplinks.min(num_spines)).collect()
    }

    fn select(&self, leaf_index: usize, num_spines: usize) -> usize {
        leaf_index % self.width(num_spines)
    }
}
