//! Configuration validation.
//!
//! `validate_config` is the single gate between the loosely typed YAML
//! configuration and the rest of the engine: it checks every key that is
//! present, fills in mode-dependent defaults, and returns a
//! [`ValidatedConfig`] with no optional fields left. Validation fails on the
//! first violation and never accepts a configuration partially.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{AllocationMode, FabricConfig, PortSpec, PrefixSpec, ValidatedConfig};
use crate::error::{FabricError, Result};
use crate::range::parse_flexible_range;
use crate::utils::ip_utils::{block_count, overlaps, parse_network, usable_host_count};

const DEFAULT_TRANSIT: &str = "10.10.10.0/24";
const DEFAULT_LOOPBACK: &str = "10.10.20.0/24";
const DEFAULT_BGP_ASN: u32 = 65000;
const DEFAULT_LINKNET: u8 = 31;
const DEFAULT_LEAF_SPINE_PORTS: [u32; 2] = [47, 48];
const DEFAULT_INTER_LEAF_PORTS: [u32; 2] = [51, 52];
const DEFAULT_LEAF_SPINE_PORT_CHANNEL: u32 = 1;
const DEFAULT_INTER_LEAF_PORT_CHANNEL: u32 = 600;
const DEFAULT_UPLINK_SPINES: usize = 2;
const DEFAULT_SPINE_PORT_CHANNEL_RANGE: std::ops::RangeInclusive<u32> = 1..=20;
const STATEFUL_SPINE_PORTS_RANGE: std::ops::RangeInclusive<u32> = 1..=40;

static HOSTNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("Invalid hostname regex"));

/// Validate a merged configuration and resolve its defaults
///
/// # Arguments
/// * `config` - The merged configuration as read from YAML
///
/// # Returns
/// * `Ok(ValidatedConfig)` with every field resolved
/// * `Err(FabricError)` naming the first violated field
pub fn validate_config(config: &FabricConfig) -> Result<ValidatedConfig> {
    let mode = config.mode();
    if mode == AllocationMode::Stateful {
        check_required_keys(config)?;
    }

    let transit = match &config.transit {
        Some(value) => parse_network("transit", value)?,
        None => parse_network("transit", DEFAULT_TRANSIT)?,
    };
    let loopback = match &config.loopback {
        Some(value) => parse_network("loopback", value)?,
        None => parse_network("loopback", DEFAULT_LOOPBACK)?,
    };
    if overlaps(&transit, &loopback) {
        return Err(FabricError::consistency(
            "transit",
            format!("transit network {} overlaps loopback network {}", transit, loopback),
        ));
    }

    let num_spines = positive_count("num_of_spines", config.num_of_spines)?;
    let num_leafs = positive_count("num_of_leafs", config.num_of_leafs)?;

    let leaf_pair = match &config.leaf_pair {
        Some(toggle) => toggle.enabled("leaf_pair")?,
        None => false,
    };
    if leaf_pair && num_leafs % 2 != 0 {
        return Err(FabricError::consistency(
            "num_of_leafs",
            format!("must be even when leaf_pair is enabled, got {}", num_leafs),
        ));
    }

    let bgp_asn = match config.bgp_asn {
        Some(asn) => positive_u32("bgp_asn", asn)?,
        None => DEFAULT_BGP_ASN,
    };

    let uplink_spines = match config.uplink_spines {
        Some(count) => {
            let count = positive_count("uplink_spines", Some(count))?;
            if count > num_spines {
                return Err(FabricError::consistency(
                    "uplink_spines",
                    format!("{} uplink spines requested but only {} spines declared", count, num_spines),
                ));
            }
            count
        }
        None => DEFAULT_UPLINK_SPINES.min(num_spines),
    };

    let leaf_spine_linknet = prefix_or_default("leaf_spine_linknet", config.leaf_spine_linknet.as_ref())?;
    let inter_leaf_linknet = prefix_or_default("inter_leaf_linknet", config.inter_leaf_linknet.as_ref())?;

    if leaf_spine_linknet < transit.prefix_len() {
        return Err(FabricError::format(
            "leaf_spine_linknet",
            format!(
                "/{} link subnets do not fit inside transit network {}",
                leaf_spine_linknet, transit
            ),
        ));
    }

    let total_devices = num_spines + num_leafs;
    let usable = usable_host_count(&loopback) as usize;
    if usable < total_devices {
        return Err(FabricError::capacity(
            format!("loopback addresses in {}", loopback),
            total_devices,
            usable,
        ));
    }

    let mut required_subnets = num_leafs;
    if leaf_pair {
        required_subnets += num_leafs / 2;
    }
    let available_subnets = block_count(&transit, leaf_spine_linknet) as usize;
    if available_subnets < required_subnets {
        return Err(FabricError::capacity(
            format!("/{} subnets in transit network {}", leaf_spine_linknet, transit),
            required_subnets,
            available_subnets,
        ));
    }

    let leaf_spine_ports = match &config.leaf_spine_ports {
        Some(spec) => parse_port_list("leaf_spine_ports", spec)?,
        None => DEFAULT_LEAF_SPINE_PORTS.to_vec(),
    };
    let inter_leaf_ports = match &config.inter_leaf_ports {
        Some(spec) => parse_port_list("inter_leaf_ports", spec)?,
        None => DEFAULT_INTER_LEAF_PORTS.to_vec(),
    };
    let spine_port_channel_range = match &config.spine_port_channel_range {
        Some(spec) => parse_port_list("spine_port_channel_range", spec)?,
        None => DEFAULT_SPINE_PORT_CHANNEL_RANGE.collect(),
    };
    let spine_ports_range = match &config.spine_ports_range {
        Some(spec) => parse_port_list("spine_ports_range", spec)?,
        None => match mode {
            AllocationMode::Stateful => STATEFUL_SPINE_PORTS_RANGE.collect(),
            AllocationMode::Stateless => (1..=(num_leafs * leaf_spine_ports.len()) as u32).collect(),
        },
    };

    let leaf_spine_link_agg = config.leaf_spine_link_agg.unwrap_or(false);
    if leaf_spine_link_agg && leaf_spine_ports.len() != 2 {
        return Err(FabricError::consistency(
            "leaf_spine_ports",
            format!("link aggregation requires exactly 2 ports, got {}", leaf_spine_ports.len()),
        ));
    }
    let inter_leaf_link_agg = config.inter_leaf_link_agg.unwrap_or(false);
    if leaf_pair && inter_leaf_link_agg && inter_leaf_ports.len() != 2 {
        return Err(FabricError::consistency(
            "inter_leaf_ports",
            format!("link aggregation requires exactly 2 ports, got {}", inter_leaf_ports.len()),
        ));
    }

    let required_spine_ports = num_leafs * leaf_spine_ports.len();
    if spine_ports_range.len() < required_spine_ports {
        return Err(FabricError::capacity(
            "ports in spine_ports_range",
            required_spine_ports,
            spine_ports_range.len(),
        ));
    }

    let leaf_spine_port_channel_id = match config.leaf_spine_port_channel_id {
        Some(id) => positive_u32("leaf_spine_port_channel_id", id)?,
        None => DEFAULT_LEAF_SPINE_PORT_CHANNEL,
    };
    let inter_leaf_port_channel_id = match config.inter_leaf_port_channel_id {
        Some(id) => positive_u32("inter_leaf_port_channel_id", id)?,
        None => DEFAULT_INTER_LEAF_PORT_CHANNEL,
    };

    log::debug!(
        "Validated {:?} configuration: {} spines, {} leafs, transit {}, loopback {}",
        mode, num_spines, num_leafs, transit, loopback
    );

    Ok(ValidatedConfig {
        profile: config.fabric_context.clone(),
        mode,
        num_spines,
        num_leafs,
        transit,
        loopback,
        bgp_asn,
        leaf_spine_linknet,
        leaf_spine_ports,
        leaf_spine_port_channel_id,
        leaf_spine_link_agg,
        spine_ports_range,
        spine_port_channel_range,
        uplink_spines,
        leaf_pair,
        inter_leaf_ports,
        inter_leaf_port_channel_id,
        inter_leaf_linknet,
        inter_leaf_link_agg,
    })
}

/// Validate expanded hostname lists against a validated configuration
///
/// Checks for:
/// - Hostname counts matching `num_of_spines` / `num_of_leafs`
/// - Duplicate hostnames across both roles
/// - Characters outside `[A-Za-z0-9-]`
pub fn validate_hostnames(config: &ValidatedConfig, spines: &[String], leafs: &[String]) -> Result<()> {
    if spines.len() != config.num_spines {
        return Err(FabricError::consistency(
            "spine_hostnames",
            format!("expected {} spine hostnames, got {}", config.num_spines, spines.len()),
        ));
    }
    if leafs.len() != config.num_leafs {
        return Err(FabricError::consistency(
            "leaf_hostnames",
            format!("expected {} leaf hostnames, got {}", config.num_leafs, leafs.len()),
        ));
    }

    let mut seen = HashSet::new();
    for hostname in spines.iter().chain(leafs) {
        if !HOSTNAME.is_match(hostname) {
            return Err(FabricError::format(
                "hostname",
                format!("'{}' may only contain letters, digits and hyphens", hostname),
            ));
        }
        if !seen.insert(hostname.as_str()) {
            return Err(FabricError::consistency(
                "hostname",
                format!("duplicate hostname '{}'", hostname),
            ));
        }
    }

    Ok(())
}

/// Parse a port list and reject empty or repeated entries
fn parse_port_list(field: &str, spec: &PortSpec) -> Result<Vec<u32>> {
    let expression = spec.to_expression();
    let ports = parse_flexible_range(&expression).map_err(|e| FabricError::range(field, e))?;
    if ports.is_empty() {
        return Err(FabricError::format(field, "port list must not be empty"));
    }

    // The grammar deduplicates, so count each item on its own to spot repeats
    let inner = expression.trim().trim_start_matches('[').trim_end_matches(']');
    let mut expanded = 0usize;
    for item in inner.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        expanded += parse_flexible_range(&format!("[{}]", item))
            .map_err(|e| FabricError::range(field, e))?
            .len();
    }
    if expanded != ports.len() {
        return Err(FabricError::consistency(
            field,
            format!("duplicate port numbers in {}", expression),
        ));
    }

    Ok(ports)
}

fn check_required_keys(config: &FabricConfig) -> Result<()> {
    let mut required: Vec<(&str, bool)> = vec![
        ("num_of_spines", config.num_of_spines.is_some()),
        ("num_of_leafs", config.num_of_leafs.is_some()),
        ("transit", config.transit.is_some()),
        ("loopback", config.loopback.is_some()),
        ("bgp_asn", config.bgp_asn.is_some()),
        ("leaf_spine_linknet", config.leaf_spine_linknet.is_some()),
        ("leaf_spine_ports", config.leaf_spine_ports.is_some()),
        ("leaf_spine_port_channel_id", config.leaf_spine_port_channel_id.is_some()),
        ("leaf_pair", config.leaf_pair.is_some()),
    ];
    if config.leaf_pair_requested() {
        required.extend([
            ("inter_leaf_ports", config.inter_leaf_ports.is_some()),
            ("inter_leaf_port_channel_id", config.inter_leaf_port_channel_id.is_some()),
            ("inter_leaf_linknet", config.inter_leaf_linknet.is_some()),
        ]);
    }

    match required.iter().find(|(_, present)| !present) {
        Some((key, _)) => Err(FabricError::consistency(
            *key,
            "missing required configuration key for stateful allocation",
        )),
        None => Ok(()),
    }
}

fn positive_count(field: &str, value: Option<i64>) -> Result<usize> {
    match value {
        Some(n) if n >= 1 => Ok(n as usize),
        Some(n) => Err(FabricError::format(field, format!("must be a positive integer, got {}", n))),
        None => Err(FabricError::consistency(field, "missing required configuration key")),
    }
}

fn positive_u32(field: &str, value: i64) -> Result<u32> {
    if value < 1 {
        return Err(FabricError::format(field, format!("must be a positive integer, got {}", value)));
    }
    u32::try_from(value).map_err(|_| FabricError::format(field, format!("{} is out of range", value)))
}

fn prefix_or_default(field: &str, spec: Option<&PrefixSpec>) -> Result<u8> {
    match spec {
        Some(spec) => spec.prefix_len(field),
        None => Ok(DEFAULT_LINKNET),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> FabricConfig {
        serde_yaml::from_str(
            r#"
fabric_context: lab
num_of_spines: 2
num_of_leafs: 4
transit: "10.0.0.0/24"
loopback: "10.0.1.0/24"
bgp_asn: 65201
leaf_spine_linknet: "/31"
leaf_spine_ports: "[47,48]"
leaf_spine_port_channel_id: 1
leaf_pair: yes
inter_leaf_ports: "[51,52]"
inter_leaf_port_channel_id: 600
inter_leaf_linknet: "/31"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_config_resolves_defaults() {
        let validated = validate_config(&base_config()).unwrap();
        assert_eq!(validated.num_spines, 2);
        assert_eq!(validated.num_leafs, 4);
        assert!(validated.leaf_pair);
        assert_eq!(validated.uplink_spines, 2);
        assert_eq!(validated.spine_ports_range, (1..=8).collect::<Vec<u32>>());
        assert_eq!(validated.spine_port_channel_range.len(), 20);
        assert_eq!(validated.required_link_subnets(), 6);
    }

    #[test]
    fn test_stateless_defaults_need_only_counts() {
        let config: FabricConfig = serde_yaml::from_str("num_of_spines: 2\nnum_of_leafs: 2").unwrap();
        let validated = validate_config(&config).unwrap();
        assert_eq!(validated.transit.to_string(), "10.10.10.0/24");
        assert_eq!(validated.loopback.to_string(), "10.10.20.0/24");
        assert_eq!(validated.bgp_asn, 65000);
        assert_eq!(validated.leaf_spine_ports, vec![47, 48]);
        assert_eq!(validated.inter_leaf_port_channel_id, 600);
        assert!(!validated.leaf_pair);
    }

    #[test]
    fn test_stateful_requires_keys() {
        let mut config = base_config();
        config.allocation_mode = Some(AllocationMode::Stateful);
        assert!(validate_config(&config).is_ok());

        config.bgp_asn = None;
        let err = validate_config(&config).unwrap_err();
        assert!(err.is_consistency());
        assert!(err.to_string().contains("bgp_asn"));

        let mut config = base_config();
        config.allocation_mode = Some(AllocationMode::Stateful);
        config.inter_leaf_linknet = None;
        assert!(validate_config(&config).unwrap_err().to_string().contains("inter_leaf_linknet"));
    }

    #[test]
    fn test_stateful_spine_ports_default() {
        let mut config = base_config();
        config.allocation_mode = Some(AllocationMode::Stateful);
        let validated = validate_config(&config).unwrap();
        assert_eq!(validated.spine_ports_range, (1..=40).collect::<Vec<u32>>());
    }

    #[test]
    fn test_overlapping_networks() {
        let mut config = base_config();
        config.loopback = Some("10.0.0.128/25".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.is_consistency());
        assert!(err.to_string().contains("overlaps"));
    }

    #[test]
    fn test_bad_network_literal() {
        let mut config = base_config();
        config.transit = Some("10.0.0.0/40".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("transit"));
    }

    #[test]
    fn test_counts_must_be_positive() {
        let mut config = base_config();
        config.num_of_spines = Some(0);
        assert!(validate_config(&config).unwrap_err().to_string().contains("num_of_spines"));

        let mut config = base_config();
        config.num_of_leafs = None;
        assert!(validate_config(&config).unwrap_err().is_consistency());
    }

    #[test]
    fn test_odd_leafs_only_rejected_with_pairing() {
        let mut config = base_config();
        config.num_of_leafs = Some(3);
        assert!(validate_config(&config).unwrap_err().to_string().contains("even"));

        config.leaf_pair = Some(crate::config::Toggle::Flag(false));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_loopback_capacity_boundary() {
        let mut config = base_config();
        config.leaf_pair = Some(crate::config::Toggle::Flag(false));
        // A /29 holds exactly six usable hosts
        config.loopback = Some("10.0.1.0/29".to_string());
        assert!(validate_config(&config).is_ok());

        config.num_of_leafs = Some(5);
        config.spine_ports_range = Some(PortSpec::Expr("[1-10]".to_string()));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, FabricError::Capacity { required: 7, available: 6, .. }));
    }

    #[test]
    fn test_transit_capacity() {
        let mut config = base_config();
        // Eight /31s, pairing needs six
        config.transit = Some("10.0.0.0/28".to_string());
        assert!(validate_config(&config).is_ok());

        // Four /31s
        config.transit = Some("10.0.0.0/29".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, FabricError::Capacity { required: 6, available: 4, .. }));
    }

    #[test]
    fn test_linknet_longer_than_transit() {
        let mut config = base_config();
        config.leaf_spine_linknet = Some(PrefixSpec::Text("/23".to_string()));
        let err = validate_config(&config).unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("leaf_spine_linknet"));

        config.leaf_spine_linknet = Some(PrefixSpec::Len(24));
        config.leaf_pair = None;
        config.num_of_leafs = Some(1);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_port_list_errors() {
        let mut config = base_config();
        config.leaf_spine_ports = Some(PortSpec::Expr("[47,x]".to_string()));
        let err = validate_config(&config).unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("leaf_spine_ports"));

        let mut config = base_config();
        config.leaf_spine_ports = Some(PortSpec::Expr("[]".to_string()));
        assert!(validate_config(&config).unwrap_err().to_string().contains("empty"));

        let mut config = base_config();
        config.inter_leaf_ports = Some(PortSpec::Expr("[51,51]".to_string()));
        let err = validate_config(&config).unwrap_err();
        assert!(err.is_consistency());
        assert!(err.to_string().contains("duplicate"));

        let mut config = base_config();
        config.spine_ports_range = Some(PortSpec::Expr("[1-4,3-6]".to_string()));
        assert!(validate_config(&config).unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_link_aggregation_needs_two_ports() {
        let mut config = base_config();
        config.leaf_spine_link_agg = Some(true);
        assert!(validate_config(&config).is_ok());

        config.leaf_spine_ports = Some(PortSpec::Expr("[45-48]".to_string()));
        config.spine_ports_range = Some(PortSpec::Expr("[1-16]".to_string()));
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("exactly 2 ports"));
    }

    #[test]
    fn test_spine_ports_capacity() {
        let mut config = base_config();
        config.spine_ports_range = Some(PortSpec::Expr("[1-7]".to_string()));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, FabricError::Capacity { required: 8, available: 7, .. }));
    }

    #[test]
    fn test_uplink_spines_bound() {
        let mut config = base_config();
        config.uplink_spines = Some(3);
        assert!(validate_config(&config).unwrap_err().to_string().contains("uplink_spines"));
    }

    #[test]
    fn test_hostnames() {
        let validated = validate_config(&base_config()).unwrap();
        let spines = vec!["s01".to_string(), "s02".to_string()];
        let leafs: Vec<String> = ["l01", "l02", "l03", "l04"].iter().map(|s| s.to_string()).collect();
        assert!(validate_hostnames(&validated, &spines, &leafs).is_ok());

        let err = validate_hostnames(&validated, &spines[..1], &leafs).unwrap_err();
        assert!(err.to_string().contains("expected 2 spine hostnames, got 1"));

        let dup: Vec<String> = ["l01", "s01", "l03", "l04"].iter().map(|s| s.to_string()).collect();
        let err = validate_hostnames(&validated, &spines, &dup).unwrap_err();
        assert!(err.is_consistency());
        assert!(err.to_string().contains("s01"));

        let bad: Vec<String> = ["l01", "l_02", "l03", "l04"].iter().map(|s| s.to_string()).collect();
        assert!(validate_hostnames(&validated, &spines, &bad).unwrap_err().is_format());
    }
}
