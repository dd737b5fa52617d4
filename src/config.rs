use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::error::{FabricError, Result};

/// How the address allocator treats previous runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AllocationMode {
    /// Reuse addresses recorded in the state store, allocate only for new keys
    Stateful,
    /// Recompute everything from the configuration in declaration order
    #[default]
    Stateless,
}

/// A flag that may be written as a YAML bool or as `yes`/`no`/`true`/`false`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Toggle {
    Flag(bool),
    Text(String),
}

impl Toggle {
    pub fn enabled(&self, field: &str) -> Result<bool> {
        match self {
            Toggle::Flag(flag) => Ok(*flag),
            Toggle::Text(text) => match text.trim().to_lowercase().as_str() {
                "yes" | "true" => Ok(true),
                "no" | "false" => Ok(false),
                other => Err(FabricError::format(
                    field,
                    format!("expected yes/no/true/false, got '{}'", other),
                )),
            },
        }
    }
}

/// One entry of a port list written as a YAML sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortItem {
    Number(i64),
    Text(String),
}

/// A port list in either bracket form (`"[1,3,5-10]"`) or YAML list form
/// (`[1, 3, "5-10"]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    Expr(String),
    List(Vec<PortItem>),
}

impl PortSpec {
    /// Render as a bracket expression for the flexible range grammar
    pub fn to_expression(&self) -> String {
        match self {
            PortSpec::Expr(expr) => expr.clone(),
            PortSpec::List(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        PortItem::Number(n) => n.to_string(),
                        PortItem::Text(s) => s.trim().to_string(),
                    })
                    .collect();
                format!("[{}]", parts.join(","))
            }
        }
    }
}

/// A link prefix length written as `/31`, `"31"` or `31`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefixSpec {
    Len(i64),
    Text(String),
}

impl PrefixSpec {
    pub fn prefix_len(&self, field: &str) -> Result<u8> {
        let len = match self {
            PrefixSpec::Len(n) => *n,
            PrefixSpec::Text(s) => s
                .trim()
                .trim_start_matches('/')
                .parse::<i64>()
                .map_err(|_| FabricError::format(field, format!("'{}' is not a prefix length", s)))?,
        };
        if !(1..=31).contains(&len) {
            return Err(FabricError::format(
                field,
                format!("prefix length /{} must be between /1 and /31", len),
            ));
        }
        Ok(len as u8)
    }
}

/// Merged fabric configuration exactly as read from YAML.
///
/// Every field is optional; which ones must be present depends on the
/// allocation mode and is decided by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FabricConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fabric_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_mode: Option<AllocationMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_of_spines: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_of_leafs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spine_hostnames: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_hostnames: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loopback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgp_asn: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_spine_linknet: Option<PrefixSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_spine_ports: Option<PortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_spine_port_channel_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_spine_link_agg: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spine_ports_range: Option<PortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spine_port_channel_range: Option<PortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uplink_spines: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_pair: Option<Toggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inter_leaf_ports: Option<PortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inter_leaf_port_channel_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inter_leaf_linknet: Option<PrefixSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inter_leaf_link_agg: Option<bool>,
}

impl FabricConfig {
    /// Allocation mode requested by the configuration, or the default
    pub fn mode(&self) -> AllocationMode {
        self.allocation_mode.unwrap_or_default()
    }

    /// Validate and resolve defaults, producing the config every later stage consumes
    pub fn validate(&self) -> Result<ValidatedConfig> {
        crate::utils::validation::validate_config(self)
    }

    /// Whether leaf pairing is switched on; unreadable values count as off here
    /// and are reported properly by validation
    pub fn leaf_pair_requested(&self) -> bool {
        self.leaf_pair
            .as_ref()
            .and_then(|toggle| toggle.enabled("leaf_pair").ok())
            .unwrap_or(false)
    }
}

/// Fully validated configuration with every default resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedConfig {
    pub profile: Option<String>,
    pub mode: AllocationMode,
    pub num_spines: usize,
    pub num_leafs: usize,
    pub transit: Ipv4Net,
    pub loopback: Ipv4Net,
    pub bgp_asn: u32,
    pub leaf_spine_linknet: u8,
    pub leaf_spine_ports: Vec<u32>,
    pub leaf_spine_port_channel_id: u32,
    pub leaf_spine_link_agg: bool,
    pub spine_ports_range: Vec<u32>,
    pub spine_port_channel_range: Vec<u32>,
    pub uplink_spines: usize,
    pub leaf_pair: bool,
    pub inter_leaf_ports: Vec<u32>,
    pub inter_leaf_port_channel_id: u32,
    pub inter_leaf_linknet: u8,
    pub inter_leaf_link_agg: bool,
}

impl ValidatedConfig {
    /// Number of link subnets the fabric consumes from the transit network
    pub fn required_link_subnets(&self) -> usize {
        if self.leaf_pair {
            self.num_leafs + self.num_leafs / 2
        } else {
            self.num_leafs
        }
    }
}
