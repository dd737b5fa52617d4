//! Ansible inventory.

use serde_yaml::{Mapping, Value};

use crate::error::{FabricError, Result};
use crate::topology::{DeviceGraph, Role};

/// `all.children.{spines,leafs}.hosts.<host>.ansible_host`, in declaration order
pub fn render_inventory(graph: &DeviceGraph) -> Result<String> {
    let mut children = Mapping::new();
    children.insert("spines".into(), group(graph, Role::Spine));
    children.insert("leafs".into(), group(graph, Role::Leaf));

    let mut all = Mapping::new();
    all.insert("children".into(), Value::Mapping(children));
    let mut root = Mapping::new();
    root.insert("all".into(), Value::Mapping(all));

    serde_yaml::to_string(&root).map_err(|e| FabricError::Output(format!("hosts.yml: {}", e)))
}

fn group(graph: &DeviceGraph, role: Role) -> Value {
    let mut hosts = Mapping::new();
    for device in graph.devices().iter().filter(|d| d.role == role) {
        let mut vars = Mapping::new();
        let address = device
            .loopback_ip
            .map(|net| net.addr().to_string())
            .unwrap_or_else(|| "-".to_string());
        vars.insert("ansible_host".into(), address.into());
        hosts.insert(device.hostname.as_str().into(), Value::Mapping(vars));
    }
    let mut group = Mapping::new();
    group.insert("hosts".into(), Value::Mapping(hosts));
    Value::Mapping(group)
}
