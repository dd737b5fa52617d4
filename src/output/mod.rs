//! # Plan Output
//!
//! Renders an addressed device graph into the artifacts downstream tooling
//! consumes. Nothing here allocates anything; every file is a view of the
//! graph.
//!
//! | File | Contents |
//! |---|---|
//! | `hosts.yml` | Ansible inventory, spines and leafs keyed by loopback |
//! | `connections.csv` | One row per leaf member port with its peer and subnet |
//! | `ip_assignments.csv` | Loopback and link addresses per device |
//! | `host_vars/<host>.yml` | Per-device interfaces and BGP neighbors |
//! | `fabric.json` | The full device graph |

pub mod host_vars;
pub mod inventory;
pub mod tables;

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{FabricError, Result};
use crate::topology::DeviceGraph;

pub use host_vars::{render_host_vars, HostVars};
pub use inventory::render_inventory;
pub use tables::{connection_rows, connections_csv, format_connections, ip_assignment_rows, ip_assignments_csv};

/// One rendered artifact, with a path relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: String,
}

impl OutputFile {
    fn new(path: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }
}

/// Render every artifact for the graph
pub fn render_all(graph: &DeviceGraph) -> Result<Vec<OutputFile>> {
    let mut files = vec![
        OutputFile::new("hosts.yml", render_inventory(graph)?),
        OutputFile::new("connections.csv", connections_csv(&connection_rows(graph))?),
        OutputFile::new("ip_assignments.csv", ip_assignments_csv(&ip_assignment_rows(graph))?),
    ];
    for (hostname, contents) in render_host_vars(graph)? {
        files.push(OutputFile::new(Path::new("host_vars").join(format!("{}.yml", hostname)), contents));
    }
    files.push(OutputFile::new("fabric.json", render_fabric_json(graph)?));
    Ok(files)
}

/// The full graph as pretty-printed JSON
pub fn render_fabric_json(graph: &DeviceGraph) -> Result<String> {
    serde_json::to_string_pretty(graph).map_err(|e| FabricError::Output(format!("fabric.json: {}", e)))
}

/// Write rendered files below `dir`, creating directories as needed
pub fn write_all(files: &[OutputFile], dir: &Path) -> Result<()> {
    for file in files {
        let target = dir.join(&file.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &file.contents)?;
        info!("Wrote {}", target.display());
    }
    Ok(())
}

/// Dry-run view of what `write_all` would produce
pub fn preview(files: &[OutputFile]) -> String {
    let mut out = String::new();
    for file in files {
        out.push_str(&format!("\nDry run: would write {}:\n", file.path.display()));
        out.push_str(&file.contents);
        if !file.contents.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}
