//! Device graph type definitions.
//!
//! The graph holds devices in declaration order (spines first, then leafs)
//! together with two lookup indexes: hostname -> device slot and
//! (device slot, peer hostname) -> interface slot. The builder appends
//! devices and interfaces; the allocator later writes addresses through the
//! index instead of scanning interface lists.

use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::error::{FabricError, Result};

/// Device role in the two-tier fabric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Spine,
    Leaf,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Spine => write!(f, "spine"),
            Role::Leaf => write!(f, "leaf"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceKind {
    #[serde(rename = "port-channel")]
    PortChannel,
}

/// Logical port-channel toward one peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub peer_hostname: String,
    pub peer_interface_name: String,
    pub kind: InterfaceKind,
    pub port_channel_id: u32,
    pub peer_port_channel_id: u32,
    /// Local member ports; position `i` is cabled to `remote_physical_ports[i]`
    pub local_physical_ports: Vec<u32>,
    pub remote_physical_ports: Vec<u32>,
    pub ip: Option<Ipv4Net>,
    pub transit_subnet: Option<Ipv4Net>,
}

impl Interface {
    /// A port-channel with no addressing yet
    pub fn port_channel(
        peer_hostname: &str,
        port_channel_id: u32,
        peer_port_channel_id: u32,
        local_physical_ports: Vec<u32>,
        remote_physical_ports: Vec<u32>,
    ) -> Self {
        Self {
            name: port_channel_name(port_channel_id),
            peer_hostname: peer_hostname.to_string(),
            peer_interface_name: port_channel_name(peer_port_channel_id),
            kind: InterfaceKind::PortChannel,
            port_channel_id,
            peer_port_channel_id,
            local_physical_ports,
            remote_physical_ports,
            ip: None,
            transit_subnet: None,
        }
    }
}

pub fn port_channel_name(id: u32) -> String {
    format!("Port-Channel{}", id)
}

/// BGP adjacency from a leaf toward one spine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    pub peer_hostname: String,
    pub neighbor_ip: Ipv4Addr,
    pub remote_asn: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub hostname: String,
    pub role: Role,
    pub bgp_asn: u32,
    pub loopback_ip: Option<Ipv4Net>,
    pub pair_id: Option<u32>,
    pub interfaces: Vec<Interface>,
    pub bgp_neighbors: Vec<Neighbor>,
}

impl Device {
    pub fn new(hostname: &str, role: Role, bgp_asn: u32) -> Self {
        Self {
            hostname: hostname.to_string(),
            role,
            bgp_asn,
            loopback_ip: None,
            pair_id: None,
            interfaces: Vec::new(),
            bgp_neighbors: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.role == Role::Leaf
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
    LeafSpine,
    InterLeaf,
}

/// One point-to-point link needing a subnet.
///
/// `a` is the leaf (or first leaf of a pair) and takes the first host of
/// the subnet; `b` is the spine (or second leaf) and takes the second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub kind: LinkKind,
    pub a: String,
    pub b: String,
}

impl Link {
    /// Stable key identifying this link across runs
    pub fn key(&self) -> String {
        format!("{}-{}", self.a, self.b)
    }
}

/// Spines, leafs and the links between them
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceGraph {
    devices: Vec<Device>,
    links: Vec<Link>,
    /// Spines every leaf peers with over BGP
    uplink_spines: Vec<String>,
    #[serde(skip)]
    device_index: HashMap<String, usize>,
    #[serde(skip)]
    interface_index: HashMap<(usize, String), usize>,
}

impl DeviceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a device; hostnames must be unique within the graph
    pub fn add_device(&mut self, device: Device) -> Result<usize> {
        if self.device_index.contains_key(&device.hostname) {
            return Err(FabricError::consistency(
                "hostnames",
                format!("duplicate hostname '{}'", device.hostname),
            ));
        }
        let slot = self.devices.len();
        self.device_index.insert(device.hostname.clone(), slot);
        self.devices.push(device);
        Ok(slot)
    }

    /// Attach an interface to `hostname`; at most one per peer
    pub fn add_interface(&mut self, hostname: &str, interface: Interface) -> Result<()> {
        let slot = self.slot(hostname)?;
        let key = (slot, interface.peer_hostname.clone());
        if self.interface_index.contains_key(&key) {
            return Err(FabricError::consistency(
                "interfaces",
                format!(
                    "{} already has an interface toward {}",
                    hostname, interface.peer_hostname
                ),
            ));
        }
        let device = &mut self.devices[slot];
        self.interface_index.insert(key, device.interfaces.len());
        device.interfaces.push(interface);
        Ok(())
    }

    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
    }

    pub fn set_uplink_spines(&mut self, spines: Vec<String>) {
        self.uplink_spines = spines;
    }

    fn slot(&self, hostname: &str) -> Result<usize> {
        self.device_index
            .get(hostname)
            .copied()
            .ok_or_else(|| FabricError::consistency("device graph", format!("unknown device '{}'", hostname)))
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn uplink_spines(&self) -> &[String] {
        &self.uplink_spines
    }

    pub fn leafs(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(|d| d.is_leaf())
    }

    pub fn device(&self, hostname: &str) -> Option<&Device> {
        self.device_index.get(hostname).map(|&slot| &self.devices[slot])
    }

    pub fn device_mut(&mut self, hostname: &str) -> Result<&mut Device> {
        let slot = self.slot(hostname)?;
        Ok(&mut self.devices[slot])
    }

    pub fn interface(&self, hostname: &str, peer: &str) -> Option<&Interface> {
        let slot = *self.device_index.get(hostname)?;
        let idx = *self.interface_index.get(&(slot, peer.to_string()))?;
        self.devices[slot].interfaces.get(idx)
    }

    pub fn interface_mut(&mut self, hostname: &str, peer: &str) -> Result<&mut Interface> {
        let slot = self.slot(hostname)?;
        let idx = self
            .interface_index
            .get(&(slot, peer.to_string()))
            .copied()
            .ok_or_else(|| {
                FabricError::consistency(
                    "device graph",
                    format!("{} has no interface toward {}", hostname, peer),
                )
            })?;
        Ok(&mut self.devices[slot].interfaces[idx])
    }

    /// Loopback address of a device, without prefix
    pub fn loopback_addr(&self, hostname: &str) -> Option<Ipv4Addr> {
        self.device(hostname)?.loopback_ip.map(|net| net.addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_device_rejected() {
        let mut graph = DeviceGraph::new();
        graph.add_device(Device::new("s01", Role::Spine, 65000)).unwrap();
        let err = graph.add_device(Device::new("s01", Role::Leaf, 65000)).unwrap_err();
        assert!(err.is_consistency());
    }

    #[test]
    fn test_interface_index() {
        let mut graph = DeviceGraph::new();
        graph.add_device(Device::new("s01", Role::Spine, 65000)).unwrap();
        graph.add_device(Device::new("l01", Role::Leaf, 65000)).unwrap();
        graph
            .add_interface("l01", Interface::port_channel("s01", 1, 1, vec![47, 48], vec![1, 2]))
            .unwrap();

        let intf = graph.interface("l01", "s01").unwrap();
        assert_eq!(intf.name, "Port-Channel1");
        assert_eq!(intf.remote_physical_ports, vec![1, 2]);
        assert!(graph.interface("s01", "l01").is_none());

        graph.interface_mut("l01", "s01").unwrap().ip = Some("10.0.0.0/31".parse().unwrap());
        assert!(graph.interface("l01", "s01").unwrap().ip.is_some());

        let dup = Interface::port_channel("s01", 2, 2, vec![49], vec![3]);
        assert!(graph.add_interface("l01", dup).unwrap_err().is_consistency());
        assert!(graph.interface_mut("l01", "s09").is_err());
    }

    #[test]
    fn test_interface_kind_serializes_as_port_channel() {
        let intf = Interface::port_channel("s01", 1, 1, vec![47], vec![1]);
        let json = serde_json::to_value(&intf).unwrap();
        assert_eq!(json["kind"], "port-channel");
    }
}
