//! Fabric planning orchestrator.
//!
//! This module coordinates one planning run: configuration loading and
//! validation, hostname expansion, topology construction, address
//! allocation, output rendering and, last of all, state persistence.

use crate::config::{AllocationMode, FabricConfig, ValidatedConfig};
use crate::config_loader::{load_config, CliOverrides};
use crate::error::{FabricError, Result};
use crate::ip::{allocate, AllocationReport};
use crate::output::{connection_rows, format_connections, preview, render_all, write_all};
use crate::range::parse_hostname_range;
use crate::state::{FileStateStore, StateStore};
use crate::topology::{build_topology, DeviceGraph};
use crate::utils::validate_hostnames;
use color_eyre::eyre::WrapErr;
use log::info;
use std::path::PathBuf;

/// A fully addressed fabric
#[derive(Debug, Clone)]
pub struct FabricPlan {
    pub config: ValidatedConfig,
    pub spines: Vec<String>,
    pub leafs: Vec<String>,
    pub graph: DeviceGraph,
    pub report: AllocationReport,
}

/// Everything a run needs from the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub fabric: PathBuf,
    pub input: Option<PathBuf>,
    pub overrides: CliOverrides,
    pub state: PathBuf,
    pub output: PathBuf,
    pub dry_run: bool,
}

/// Validate, build and address a fabric.
///
/// All validation happens before the topology is built, and the store only
/// receives new assignments when allocation succeeds. Persisting the store
/// is left to the caller.
pub fn plan_fabric(config: &FabricConfig, store: Option<&mut dyn StateStore>) -> Result<FabricPlan> {
    let validated = config.validate()?;

    let spines = expand_hostnames("spine_hostnames", config.spine_hostnames.as_deref())?;
    let leafs = expand_hostnames("leaf_hostnames", config.leaf_hostnames.as_deref())?;
    validate_hostnames(&validated, &spines, &leafs)?;
    info!("Planning fabric with spines {:?} and leafs {:?}", spines, leafs);

    let graph = build_topology(&spines, &leafs, &validated)?;
    let (graph, report) = allocate(graph, &validated, store)?;

    Ok(FabricPlan {
        config: validated,
        spines,
        leafs,
        graph,
        report,
    })
}

fn expand_hostnames(field: &str, expression: Option<&str>) -> Result<Vec<String>> {
    let expression =
        expression.ok_or_else(|| FabricError::consistency(field, "missing required configuration key"))?;
    parse_hostname_range(expression).map_err(|e| FabricError::range(field, e))
}

/// Run a complete planning pass as driven by the CLI
pub fn run(options: &RunOptions) -> color_eyre::Result<()> {
    let config = load_config(&options.fabric, options.input.as_deref(), &options.overrides)?;

    let mut store = match config.mode() {
        AllocationMode::Stateful => Some(FileStateStore::open(&options.state)),
        AllocationMode::Stateless => None,
    };

    let plan = plan_fabric(&config, store.as_mut().map(|s| s as &mut dyn StateStore))?;
    let files = render_all(&plan.graph)?;

    println!("\nIP and Port Connections Table:");
    println!("{}", format_connections(&connection_rows(&plan.graph)));

    if options.dry_run {
        print!("{}", preview(&files));
        info!("Dry run: no files written, allocation state left untouched");
        return Ok(());
    }

    write_all(&files, &options.output)
        .wrap_err_with(|| format!("Failed to write output to {}", options.output.display()))?;

    if let Some(store) = store.as_mut() {
        store
            .persist()
            .wrap_err_with(|| format!("Failed to persist allocation state to {}", store.path().display()))?;
    }

    info!(
        "Fabric plan complete: {} devices, {} links ({} new, {} reused assignments)",
        plan.graph.devices().len(),
        plan.graph.links().len(),
        plan.report.allocated,
        plan.report.reused
    );
    Ok(())
}
