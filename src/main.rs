use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use fabricplan::config::AllocationMode;
use fabricplan::config_loader::CliOverrides;
use fabricplan::orchestrator::{run, RunOptions};

/// Topology and address planner for two-tier leaf-spine fabrics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Fabric YAML file (flat settings, or a map of profile name to settings)
    #[arg(short, long, default_value = "config/fabric.yml")]
    fabric: PathBuf,

    /// Per-run input YAML file merged over the fabric settings
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Fabric profile to use; overrides `fabric_context` from the input file
    #[arg(short, long)]
    profile: Option<String>,

    /// Allocation mode; overrides `allocation_mode` from the configuration
    #[arg(short, long, value_enum)]
    mode: Option<AllocationMode>,

    /// Allocation state file used in stateful mode
    #[arg(short, long, default_value = "state.yml")]
    state: PathBuf,

    /// Output directory for inventory, tables and host_vars
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Print everything instead of writing files or state
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            fabric: self.fabric.clone(),
            input: self.input.clone(),
            overrides: CliOverrides {
                profile: self.profile.clone(),
                mode: self.mode,
            },
            state: self.state.clone(),
            output: self.output.clone(),
            dry_run: self.dry_run,
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("Starting fabricplan");
    info!("Fabric file: {:?}", args.fabric);
    info!("Output directory: {:?}", args.output);

    run(&args.run_options())?;

    info!("Fabric planning completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = Args::parse_from(["fabricplan"]);

        assert_eq!(args.fabric, PathBuf::from("config/fabric.yml"));
        assert_eq!(args.state, PathBuf::from("state.yml"));
        assert_eq!(args.output, PathBuf::from("."));
        assert!(args.mode.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "fabricplan",
            "--fabric", "fabric.yml",
            "--input", "input.yml",
            "--profile", "dc1",
            "--mode", "stateful",
            "--dry-run",
        ]);

        let options = args.run_options();
        assert_eq!(options.input, Some(PathBuf::from("input.yml")));
        assert_eq!(options.overrides.profile.as_deref(), Some("dc1"));
        assert_eq!(options.overrides.mode, Some(AllocationMode::Stateful));
        assert!(options.dry_run);
    }
}
