//! Address allocation over a built device graph.
//!
//! Two modes share one walk over the graph:
//!
//! - **stateless**: loopbacks are the first usable hosts of the loopback
//!   network in declaration order (spines, then leafs); leaf-spine subnets
//!   are the first `num_leafs` blocks of the transit network and inter-leaf
//!   subnets the `num_leafs / 2` blocks after them.
//! - **stateful**: every stable key already present in the state store keeps
//!   its value; only new keys draw from the pools, and the pools skip every
//!   value the store already holds. New assignments are staged and written
//!   to the store only once the whole graph has been addressed.

use std::collections::HashSet;

use ipnet::Ipv4Net;
use log::{debug, info};

use super::pool::AddressPool;
use super::registry::AllocationRegistry;
use crate::config::{AllocationMode, ValidatedConfig};
use crate::error::{FabricError, Result};
use crate::state::{StateSection, StateStore};
use crate::topology::{DeviceGraph, LinkKind, Neighbor, Role};
use crate::utils::ip_utils::{host_end_offset, link_endpoints};

/// Loopback offset where stateful leaf addresses start; spines sit below it
pub const LEAF_LOOPBACK_BASE: u64 = 102;

/// What an allocation run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationReport {
    /// Keys that received a fresh value this run
    pub allocated: usize,
    /// Keys whose value came from the state store
    pub reused: usize,
    /// Persisted keys that no device or link in this run refers to
    pub stale: Vec<String>,
}

/// Address the graph according to `config.mode`.
///
/// Stateful mode needs a store; stateless mode ignores it. The graph is
/// consumed so a failure never hands back a half-addressed graph, and the
/// store is only written to when the run succeeds.
pub fn allocate(
    mut graph: DeviceGraph,
    config: &ValidatedConfig,
    store: Option<&mut dyn StateStore>,
) -> Result<(DeviceGraph, AllocationReport)> {
    let mut store = match config.mode {
        AllocationMode::Stateless => None,
        AllocationMode::Stateful => Some(store.ok_or_else(|| {
            FabricError::consistency("allocation_mode", "stateful allocation needs a state store")
        })?),
    };

    let outcome = {
        let mut run = AllocationRun::new(config, store.as_deref())?;
        run.assign_loopbacks(&mut graph)?;
        run.assign_links(&mut graph)?;
        assign_bgp_neighbors(&mut graph, config)?;
        run.finish()
    };

    if let Some(store) = store.as_deref_mut() {
        for (section, key, value) in &outcome.staged {
            store.put(*section, key, *value);
        }
    }

    info!(
        "Allocated {} new and reused {} existing assignments ({:?} mode)",
        outcome.report.allocated, outcome.report.reused, config.mode
    );
    if !outcome.report.stale.is_empty() {
        info!(
            "{} recorded keys no longer match any device: {}",
            outcome.report.stale.len(),
            outcome.report.stale.join(", ")
        );
    }

    Ok((graph, outcome.report))
}

struct Outcome {
    staged: Vec<(StateSection, String, Ipv4Net)>,
    report: AllocationReport,
}

#[derive(Debug, Clone, Copy)]
enum PoolId {
    Loopbacks,
    LeafLoopbacks,
    LeafSpine,
    InterLeaf,
}

/// Pools, registry and bookkeeping for a single run
struct AllocationRun<'a> {
    store: Option<&'a dyn StateStore>,
    registry: AllocationRegistry,
    /// All loopbacks when stateless, spine loopbacks when stateful
    loopbacks: AddressPool,
    leaf_loopbacks: AddressPool,
    leaf_spine: AddressPool,
    inter_leaf: AddressPool,
    staged: Vec<(StateSection, String, Ipv4Net)>,
    seen: HashSet<(StateSection, String)>,
    reused: usize,
}

impl<'a> AllocationRun<'a> {
    fn new(config: &ValidatedConfig, store: Option<&'a dyn StateStore>) -> Result<Self> {
        let loopback = config.loopback;
        let transit = config.transit;
        let linknet = config.leaf_spine_linknet;
        let loopback_end = host_end_offset(&loopback);

        let (loopbacks, leaf_loopbacks) = match store {
            None => (
                AddressPool::hosts("loopback addresses", loopback, 0, loopback_end),
                AddressPool::hosts("leaf loopback addresses", loopback, 0, 0),
            ),
            Some(_) => (
                AddressPool::hosts("spine loopback addresses", loopback, 0, LEAF_LOOPBACK_BASE),
                AddressPool::hosts("leaf loopback addresses", loopback, LEAF_LOOPBACK_BASE, loopback_end),
            ),
        };

        let mut registry = AllocationRegistry::new();
        if let Some(store) = store {
            for (section, key, value) in store.claimed() {
                registry.register(value, &owner(section, &key))?;
            }
            if !registry.is_empty() {
                debug!("Loaded {} recorded assignments into the registry", registry.len());
            }
        }

        Ok(Self {
            store,
            registry,
            loopbacks,
            leaf_loopbacks,
            leaf_spine: AddressPool::blocks("leaf-spine subnets", transit, linknet, 0),
            inter_leaf: AddressPool::blocks("inter-leaf subnets", transit, linknet, config.num_leafs as u64),
            staged: Vec::new(),
            seen: HashSet::new(),
            reused: 0,
        })
    }

    fn assign_loopbacks(&mut self, graph: &mut DeviceGraph) -> Result<()> {
        let devices: Vec<(String, Role)> = graph
            .devices()
            .iter()
            .map(|d| (d.hostname.clone(), d.role))
            .collect();

        for (hostname, role) in devices {
            let pool = match (role, self.store) {
                (Role::Leaf, Some(_)) => PoolId::LeafLoopbacks,
                _ => PoolId::Loopbacks,
            };
            let value = self.resolve(StateSection::Loopbacks, &hostname, pool)?;
            graph.device_mut(&hostname)?.loopback_ip = Some(value);
        }
        Ok(())
    }

    fn assign_links(&mut self, graph: &mut DeviceGraph) -> Result<()> {
        let links = graph.links().to_vec();
        for link in links {
            let key = link.key();
            let subnet = match link.kind {
                LinkKind::LeafSpine => self.resolve(StateSection::Transit, &key, PoolId::LeafSpine)?,
                LinkKind::InterLeaf => self.resolve(StateSection::InterLeaf, &key, PoolId::InterLeaf)?,
            };

            let (a_ip, b_ip) = link_endpoints(&subnet).ok_or_else(|| {
                FabricError::consistency(key.as_str(), format!("subnet {} has fewer than two hosts", subnet))
            })?;

            let a_side = graph.interface_mut(&link.a, &link.b)?;
            a_side.ip = Some(a_ip);
            a_side.transit_subnet = Some(subnet);

            let b_side = graph.interface_mut(&link.b, &link.a)?;
            b_side.ip = Some(b_ip);
            b_side.transit_subnet = Some(subnet);
        }
        Ok(())
    }

    /// Value for a stable key: the recorded one if any, otherwise the next
    /// free value of the pool
    fn resolve(&mut self, section: StateSection, key: &str, pool: PoolId) -> Result<Ipv4Net> {
        if !self.seen.insert((section, key.to_string())) {
            return Err(FabricError::consistency(
                owner(section, key),
                "key is shared by more than one link, hostnames containing '-' make link keys ambiguous",
            ));
        }

        if let Some(prior) = self.store.and_then(|store| store.get(section, key)) {
            debug!("Reusing {} for {} {}", prior, section, key);
            self.reused += 1;
            return Ok(prior);
        }

        let pool = match pool {
            PoolId::Loopbacks => &mut self.loopbacks,
            PoolId::LeafLoopbacks => &mut self.leaf_loopbacks,
            PoolId::LeafSpine => &mut self.leaf_spine,
            PoolId::InterLeaf => &mut self.inter_leaf,
        };
        let value = pool.take(&self.registry)?;
        self.registry.register(value, &owner(section, key))?;
        debug!("Allocated {} to {} {}", value, section, key);
        if self.store.is_some() {
            self.staged.push((section, key.to_string(), value));
        }
        Ok(value)
    }

    fn finish(self) -> Outcome {
        let (allocated, stale) = match self.store {
            Some(store) => {
                let stale = store
                    .claimed()
                    .into_iter()
                    .filter(|(section, key, _)| !self.seen.contains(&(*section, key.clone())))
                    .map(|(section, key, _)| owner(section, &key))
                    .collect();
                (self.staged.len(), stale)
            }
            None => (self.seen.len(), Vec::new()),
        };
        Outcome {
            report: AllocationReport {
                allocated,
                reused: self.reused,
                stale,
            },
            staged: self.staged,
        }
    }
}

fn owner(section: StateSection, key: &str) -> String {
    format!("{}:{}", section, key)
}

/// Each leaf peers with every uplink spine's loopback
fn assign_bgp_neighbors(graph: &mut DeviceGraph, config: &ValidatedConfig) -> Result<()> {
    let mut neighbors = Vec::new();
    for spine in graph.uplink_spines() {
        let neighbor_ip = graph.loopback_addr(spine).ok_or_else(|| {
            FabricError::consistency("bgp neighbors", format!("spine {} has no loopback", spine))
        })?;
        neighbors.push(Neighbor {
            peer_hostname: spine.clone(),
            neighbor_ip,
            remote_asn: config.bgp_asn,
        });
    }

    let leafs: Vec<String> = graph.leafs().map(|leaf| leaf.hostname.clone()).collect();
    for leaf in leafs {
        graph.device_mut(&leaf)?.bgp_neighbors = neighbors.clone();
    }
    Ok(())
}
