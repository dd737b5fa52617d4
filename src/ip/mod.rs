//! Address allocation module.
//!
//! This module assigns loopback addresses and point-to-point link subnets
//! to a built device graph, either recomputed from scratch every run or
//! carried forward from a state store.

pub mod allocator;
pub mod pool;
pub mod registry;

// Re-export commonly used types
pub use allocator::{allocate, AllocationReport, LEAF_LOOPBACK_BASE};
pub use pool::AddressPool;
pub use registry::AllocationRegistry;
