//! Per-device variables for configuration templates.

use serde::Serialize;

use crate::error::{FabricError, Result};
use crate::topology::{Device, DeviceGraph};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostVars {
    pub local_host: String,
    pub loopback_ip: Option<String>,
    pub bgp_asn: u32,
    pub interfaces: Vec<InterfaceVars>,
    pub bgp_neighbors: Vec<NeighborVars>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceVars {
    pub local_ports: Vec<u32>,
    pub remote_host: String,
    pub remote_ports: Vec<u32>,
    pub local_po: u32,
    pub remote_po: u32,
    pub ip: Option<String>,
    pub transit_subnet: Option<String>,
    pub remote_bgp_neighbor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborVars {
    pub hostname: String,
    pub neighbor_ip: String,
    pub remote_asn: u32,
}

impl HostVars {
    pub fn from_device(graph: &DeviceGraph, device: &Device) -> Self {
        let interfaces = device
            .interfaces
            .iter()
            .map(|intf| InterfaceVars {
                local_ports: intf.local_physical_ports.clone(),
                remote_host: intf.peer_hostname.clone(),
                remote_ports: intf.remote_physical_ports.clone(),
                local_po: intf.port_channel_id,
                remote_po: intf.peer_port_channel_id,
                ip: intf.ip.map(|ip| ip.to_string()),
                transit_subnet: intf.transit_subnet.map(|net| net.to_string()),
                remote_bgp_neighbor: graph.loopback_addr(&intf.peer_hostname).map(|ip| ip.to_string()),
            })
            .collect();

        let bgp_neighbors = device
            .bgp_neighbors
            .iter()
            .map(|n| NeighborVars {
                hostname: n.peer_hostname.clone(),
                neighbor_ip: n.neighbor_ip.to_string(),
                remote_asn: n.remote_asn,
            })
            .collect();

        Self {
            local_host: device.hostname.clone(),
            loopback_ip: device.loopback_ip.map(|ip| ip.to_string()),
            bgp_asn: device.bgp_asn,
            interfaces,
            bgp_neighbors,
        }
    }
}

/// `(hostname, yaml)` for every device, spines first
pub fn render_host_vars(graph: &DeviceGraph) -> Result<Vec<(String, String)>> {
    graph
        .devices()
        .iter()
        .map(|device| {
            let vars = HostVars::from_device(graph, device);
            let yaml = serde_yaml::to_string(&vars)
                .map_err(|e| FabricError::Output(format!("host_vars/{}.yml: {}", device.hostname, e)))?;
            Ok((device.hostname.clone(), yaml))
        })
        .collect()
}
