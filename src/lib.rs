//! # Fabricplan - Topology and address planner for leaf-spine fabrics
//!
//! This library turns a small declarative description of a two-tier
//! leaf-spine network into a complete device graph: port-channels between
//! leafs and spines (and optionally between leaf pairs), loopback addresses,
//! point-to-point link subnets and BGP neighbor lists.
//!
//! ## Key Features
//!
//! - **Compact ranges**: `nj01pamr[101-106]` for hostnames, `[1,3,5-10]` for ports
//! - **Typed validation**: every configuration problem is reported as a
//!   format, capacity or consistency error naming the offending field
//! - **Two allocation modes**: stateless (recomputed from scratch every
//!   run) or stateful (addresses survive topology edits via a state file)
//! - **Pluggable uplinks**: leaf-to-spine selection behind a trait,
//!   round-robin by default
//! - **Plain outputs**: inventory, CSV tables, per-host YAML and JSON
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `range`: Hostname and port range grammars
//! - `config`: Typed configuration structures
//! - `config_loader`: Fabric/input file loading and profile selection
//! - `utils`: Validation and IPv4 helpers
//! - `topology`: Device graph and topology builder
//! - `ip`: Loopback and link subnet allocation
//! - `state`: Persisted allocation state
//! - `output`: Inventory, tables and host variables
//! - `orchestrator`: End-to-end planning runs
//!
//! ## Example Usage
//!
//! ```rust
//! use fabricplan::config::FabricConfig;
//! use fabricplan::orchestrator::plan_fabric;
//!
//! let config: FabricConfig = serde_yaml::from_str(
//!     r#"
//! num_of_spines: 2
//! num_of_leafs: 4
//! spine_hostnames: spine[1-2]
//! leaf_hostnames: leaf[1-4]
//! transit: 10.0.0.0/24
//! leaf_pair: yes
//! "#,
//! )?;
//!
//! let plan = plan_fabric(&config, None)?;
//! let leaf = plan.graph.device("leaf003").unwrap();
//! assert_eq!(leaf.bgp_neighbors.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`error::Result`], whose [`error::FabricError`]
//! tells malformed input, exhausted address space and contradictory input
//! apart. The CLI and the [`orchestrator::run`] glue use `color_eyre` for
//! reporting with context.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod range;

pub mod ip;
pub mod output;
pub mod state;
pub mod topology;
pub mod utils;

pub mod orchestrator;
