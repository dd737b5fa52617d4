//! Topology construction.
//!
//! Builds the spine/leaf device graph from expanded hostname lists and a
//! validated configuration. No addresses are assigned here.

use log::{debug, info};

use crate::config::ValidatedConfig;
use crate::error::{FabricError, Result};
use crate::topology::types::{Device, DeviceGraph, Interface, Link, LinkKind, Role};
use crate::topology::uplink::{RoundRobin, UplinkSelector};

/// Build the device graph using round-robin uplinks over the configured
/// number of uplink spines
///
/// # Arguments
/// * `spines` - Spine hostnames in declaration order
/// * `leafs` - Leaf hostnames in declaration order
/// * `config` - Validated fabric configuration
///
/// # Returns
/// A graph with every device, port-channel and link, and no addressing
pub fn build_topology(spines: &[String], leafs: &[String], config: &ValidatedConfig) -> Result<DeviceGraph> {
    let policy = RoundRobin::new(config.uplink_spines);
    build_topology_with(spines, leafs, config, &policy)
}

/// Build the device graph with an explicit uplink policy
pub fn build_topology_with(
    spines: &[String],
    leafs: &[String],
    config: &ValidatedConfig,
    policy: &dyn UplinkSelector,
) -> Result<DeviceGraph> {
    if spines.is_empty() {
        return Err(FabricError::consistency("spine_hostnames", "at least one spine is required"));
    }

    let mut graph = DeviceGraph::new();

    for spine in spines {
        graph.add_device(Device::new(spine, Role::Spine, config.bgp_asn))?;
    }
    for (i, leaf) in leafs.iter().enumerate() {
        let mut device = Device::new(leaf, Role::Leaf, config.bgp_asn);
        if config.leaf_pair {
            device.pair_id = Some((i / 2) as u32 + 1);
        }
        graph.add_device(device)?;
    }

    let uplinks: Vec<String> = policy
        .uplink_set(spines.len())
        .into_iter()
        .filter_map(|idx| spines.get(idx).cloned())
        .collect();
    graph.set_uplink_spines(uplinks);

    connect_leafs_to_spines(&mut graph, spines, leafs, config, policy)?;

    if config.leaf_pair {
        connect_leaf_pairs(&mut graph, leafs, config)?;
    }

    info!(
        "Built topology: {} spines, {} leafs, {} links",
        spines.len(),
        leafs.len(),
        graph.links().len()
    );
    Ok(graph)
}

/// One port-channel per leaf toward its selected spine. Spine member ports
/// are drawn from `spine_ports_range` in leaf order, `leaf_spine_ports.len()`
/// at a time.
fn connect_leafs_to_spines(
    graph: &mut DeviceGraph,
    spines: &[String],
    leafs: &[String],
    config: &ValidatedConfig,
    policy: &dyn UplinkSelector,
) -> Result<()> {
    let per_leaf = config.leaf_spine_ports.len();
    let po = config.leaf_spine_port_channel_id;

    for (i, leaf) in leafs.iter().enumerate() {
        let spine_idx = policy.select(i, spines.len());
        let spine = spines.get(spine_idx).ok_or_else(|| {
            FabricError::consistency(
                "uplink_spines",
                format!("uplink policy chose spine {} of {}", spine_idx + 1, spines.len()),
            )
        })?;

        let start = i * per_leaf;
        let spine_ports = config
            .spine_ports_range
            .get(start..start + per_leaf)
            .ok_or_else(|| {
                FabricError::capacity(
                    "spine_ports_range",
                    leafs.len() * per_leaf,
                    config.spine_ports_range.len(),
                )
            })?
            .to_vec();
        let leaf_ports = config.leaf_spine_ports.clone();

        debug!(
            "{} {:?} <-> {} {:?} (Port-Channel{})",
            leaf, leaf_ports, spine, spine_ports, po
        );

        graph.add_interface(
            leaf,
            Interface::port_channel(spine, po, po, leaf_ports.clone(), spine_ports.clone()),
        )?;
        graph.add_interface(spine, Interface::port_channel(leaf, po, po, spine_ports, leaf_ports))?;
        graph.add_link(Link {
            kind: LinkKind::LeafSpine,
            a: leaf.clone(),
            b: spine.clone(),
        });
    }
    Ok(())
}

/// Mirror-image port-channel between leafs (0,1), (2,3), ...
fn connect_leaf_pairs(graph: &mut DeviceGraph, leafs: &[String], config: &ValidatedConfig) -> Result<()> {
    if leafs.len() % 2 != 0 {
        return Err(FabricError::consistency(
            "leaf_pair",
            format!("leaf pairing needs an even number of leafs, got {}", leafs.len()),
        ));
    }

    let po = config.inter_leaf_port_channel_id;
    let ports = &config.inter_leaf_ports;

    for pair in leafs.chunks_exact(2) {
        let (first, second) = (&pair[0], &pair[1]);
        debug!("{} <-> {} inter-leaf {:?} (Port-Channel{})", first, second, ports, po);

        graph.add_interface(first, Interface::port_channel(second, po, po, ports.clone(), ports.clone()))?;
        graph.add_interface(second, Interface::port_channel(first, po, po, ports.clone(), ports.clone()))?;
        graph.add_link(Link {
            kind: LinkKind::InterLeaf,
            a: first.clone(),
            b: second.clone(),
        });
    }
    Ok(())
}
