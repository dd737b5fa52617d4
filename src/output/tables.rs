//! Connection and address tables.

use csv::Writer;

use crate::error::{FabricError, Result};
use crate::topology::DeviceGraph;

const CONNECTION_HEADERS: [&str; 8] = [
    "Host",
    "Local Port",
    "Remote Host",
    "Remote Port",
    "Local PO",
    "Remote PO",
    "Transit Subnet",
    "Remote BGP Neighbor",
];

const IP_ASSIGNMENT_HEADERS: [&str; 8] = [
    "Device",
    "Role",
    "Loopback IP",
    "Interface",
    "Transit IP",
    "Remote Device",
    "Remote Transit IP",
    "Transit Subnet",
];

/// One cabled member port of a leaf port-channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRow {
    pub host: String,
    pub local_port: u32,
    pub remote_host: String,
    pub remote_port: u32,
    pub local_po: u32,
    pub remote_po: u32,
    pub transit_subnet: String,
    pub remote_bgp_neighbor: String,
}

impl ConnectionRow {
    fn fields(&self) -> [String; 8] {
        [
            self.host.clone(),
            self.local_port.to_string(),
            self.remote_host.clone(),
            self.remote_port.to_string(),
            self.local_po.to_string(),
            self.remote_po.to_string(),
            self.transit_subnet.clone(),
            self.remote_bgp_neighbor.clone(),
        ]
    }
}

/// Every leaf member port, leafs in declaration order
pub fn connection_rows(graph: &DeviceGraph) -> Vec<ConnectionRow> {
    let mut rows = Vec::new();
    for leaf in graph.leafs() {
        for intf in &leaf.interfaces {
            let remote_bgp_neighbor = graph
                .loopback_addr(&intf.peer_hostname)
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "-".to_string());
            let transit_subnet = intf
                .transit_subnet
                .map(|net| net.to_string())
                .unwrap_or_else(|| "-".to_string());

            for (local, remote) in intf.local_physical_ports.iter().zip(&intf.remote_physical_ports) {
                rows.push(ConnectionRow {
                    host: leaf.hostname.clone(),
                    local_port: *local,
                    remote_host: intf.peer_hostname.clone(),
                    remote_port: *remote,
                    local_po: intf.port_channel_id,
                    remote_po: intf.peer_port_channel_id,
                    transit_subnet: transit_subnet.clone(),
                    remote_bgp_neighbor: remote_bgp_neighbor.clone(),
                });
            }
        }
    }
    rows
}

pub fn connections_csv(rows: &[ConnectionRow]) -> Result<String> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(CONNECTION_HEADERS).map_err(csv_error)?;
    for row in rows {
        wtr.write_record(row.fields()).map_err(csv_error)?;
    }
    finish(wtr)
}

/// Aligned plain-text rendering of the connection table for the terminal
pub fn format_connections(rows: &[ConnectionRow]) -> String {
    let body: Vec<[String; 8]> = rows.iter().map(ConnectionRow::fields).collect();

    let mut widths: Vec<usize> = CONNECTION_HEADERS.iter().map(|h| h.len()).collect();
    for fields in &body {
        for (width, field) in widths.iter_mut().zip(fields.iter()) {
            *width = (*width).max(field.len());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(body.len() + 2);
    out.push(line(CONNECTION_HEADERS.to_vec()));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push(line(rule.iter().map(String::as_str).collect()));
    for fields in &body {
        out.push(line(fields.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

/// Loopback row per device, then one row per member port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpAssignmentRow {
    pub device: String,
    pub role: String,
    pub loopback_ip: String,
    pub interface: String,
    pub transit_ip: String,
    pub remote_device: String,
    pub remote_transit_ip: String,
    pub transit_subnet: String,
}

pub fn ip_assignment_rows(graph: &DeviceGraph) -> Vec<IpAssignmentRow> {
    let dash = || "-".to_string();
    let mut rows = Vec::new();

    for device in graph.devices() {
        let loopback = device.loopback_ip.map(|ip| ip.to_string()).unwrap_or_else(dash);
        rows.push(IpAssignmentRow {
            device: device.hostname.clone(),
            role: device.role.to_string(),
            loopback_ip: loopback.clone(),
            interface: dash(),
            transit_ip: dash(),
            remote_device: dash(),
            remote_transit_ip: dash(),
            transit_subnet: dash(),
        });

        for intf in &device.interfaces {
            let remote_ip = graph
                .interface(&intf.peer_hostname, &device.hostname)
                .and_then(|remote| remote.ip)
                .map(|ip| ip.to_string())
                .unwrap_or_else(dash);
            for port in &intf.local_physical_ports {
                rows.push(IpAssignmentRow {
                    device: device.hostname.clone(),
                    role: device.role.to_string(),
                    loopback_ip: loopback.clone(),
                    interface: format!("Ethernet{}", port),
                    transit_ip: intf.ip.map(|ip| ip.to_string()).unwrap_or_else(dash),
                    remote_device: intf.peer_hostname.clone(),
                    remote_transit_ip: remote_ip.clone(),
                    transit_subnet: intf.transit_subnet.map(|net| net.to_string()).unwrap_or_else(dash),
                });
            }
        }
    }
    rows
}

pub fn ip_assignments_csv(rows: &[IpAssignmentRow]) -> Result<String> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(IP_ASSIGNMENT_HEADERS).map_err(csv_error)?;
    for row in rows {
        wtr.write_record([
            &row.device,
            &row.role,
            &row.loopback_ip,
            &row.interface,
            &row.transit_ip,
            &row.remote_device,
            &row.remote_transit_ip,
            &row.transit_subnet,
        ])
        .map_err(csv_error)?;
    }
    finish(wtr)
}

fn csv_error(e: csv::Error) -> FabricError {
    FabricError::Output(format!("CSV writer error: {}", e))
}

fn finish(wtr: Writer<Vec<u8>>) -> Result<String> {
    let data = wtr
        .into_inner()
        .map_err(|e| FabricError::Output(format!("CSV writer error: {}", e)))?;
    String::from_utf8(data).map_err(|e| FabricError::Output(format!("UTF-8 conversion error: {}", e)))
}
