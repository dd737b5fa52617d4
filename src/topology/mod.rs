//! Fabric topology module.
//!
//! This module contains the device graph types, the leaf uplink policy and
//! the builder that turns hostname lists and a validated configuration into
//! an unaddressed spine/leaf graph.

pub mod builder;
pub mod types;
pub mod uplink;

// Re-export key types and functions for easier access
pub use builder::{build_topology, build_topology_with};
pub use types::{Device, DeviceGraph, Interface, InterfaceKind, Link, LinkKind, Neighbor, Role};
pub use uplink::{RoundRobin, UplinkSelector};
