use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use flowdeck_engine::{FlowRunner, NullObserver, RunEvent, RunObserver, WorkspaceDirs, load_flow, validate_flow};
use flowdeck_triggers::{TriggerCallback, TriggerFire, TriggerManager};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "flowdeck", version, about = "Local workflow automation: flows, actions, triggers")]
struct Cli {
    /// Workspace base directory; defaults to ~/.flowdeck
    #[arg(long, global = true, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a flow document to completion
    Run {
        /// Path to the flow document (YAML or JSON)
        flow: PathBuf,
        /// Seed variable, NAME=VALUE; may be given multiple times
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
        /// Suppress per-step log output
        #[arg(long)]
        quiet: bool,
    },
    /// Check a flow document without running it
    Validate {
        /// Path to the flow document
        flow: PathBuf,
    },
    /// List the available action types
    Actions,
    /// List the registered triggers
    Triggers,
    /// Run registered triggers until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let dirs = workspace_dirs(cli.base_dir.as_deref())?;

    match cli.command {
        Command::Run { flow, vars, quiet } => run_flow(&dirs, &flow, &vars, quiet),
        Command::Validate { flow } => validate(&flow),
        Command::Actions => list_actions(),
        Command::Triggers => list_triggers(&dirs),
        Command::Watch => watch(&dirs).await,
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .try_init();
}

fn workspace_dirs(base_dir: Option<&Path>) -> Result<WorkspaceDirs> {
    let base = match base_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs_next::home_dir().context("cannot determine the home directory")?.join(".flowdeck"),
    };
    WorkspaceDirs::ensure(base)
}

/// Prints each run-log line as it is produced.
struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn on_event(&self, event: &RunEvent) {
        if let RunEvent::LogLine(line) = event {
            println!("{line}");
        }
    }
}

fn parse_seed_vars(vars: &[String]) -> Result<IndexMap<String, Value>> {
    let mut seeds = IndexMap::new();
    for var in vars {
        let Some((name, value)) = var.split_once('=') else {
            bail!("invalid --var '{var}', expected NAME=VALUE");
        };
        seeds.insert(name.to_string(), Value::String(value.to_string()));
    }
    Ok(seeds)
}

fn run_flow(dirs: &WorkspaceDirs, flow_path: &Path, vars: &[String], quiet: bool) -> Result<()> {
    let flow = load_flow(flow_path)?;
    validate_flow(&flow)?;
    let seeds = parse_seed_vars(vars)?;

    let registry = flowdeck_actions::builtin_registry()?;
    let runner = FlowRunner::new(registry, dirs.logs.clone());
    let report = if quiet {
        runner.run_with_seed(&flow, seeds, &NullObserver)?
    } else {
        runner.run_with_seed(&flow, seeds, &ConsoleObserver)?
    };

    println!("log: {}", report.log_path.display());
    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}

fn validate(flow_path: &Path) -> Result<()> {
    let flow = load_flow(flow_path)?;
    validate_flow(&flow)?;
    println!("{}: ok ({} actions)", flow.display_name(), flow.actions.len());
    Ok(())
}

fn list_actions() -> Result<()> {
    let registry = flowdeck_actions::builtin_registry()?;
    for (category, specs) in registry.categories() {
        println!("{category}:");
        for spec in specs {
            println!("  {:<28} {}", spec.action_type, spec.description);
        }
    }
    Ok(())
}

fn list_triggers(dirs: &WorkspaceDirs) -> Result<()> {
    let mut manager = TriggerManager::new(&dirs.data, Arc::new(|_| {}));
    manager.load()?;
    let records = manager.records();
    if records.is_empty() {
        println!("no triggers registered");
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

async fn watch(dirs: &WorkspaceDirs) -> Result<()> {
    let registry = flowdeck_actions::builtin_registry()?;
    let runner = Arc::new(FlowRunner::new(registry, dirs.logs.clone()));
    let flows_dir = dirs.flows.clone();

    let callback: TriggerCallback = {
        let runner = runner.clone();
        Arc::new(move |fire: TriggerFire| {
            let flow_path = resolve_flow_path(&flows_dir, fire.flow_path());
            if let Err(err) = run_fired_flow(&runner, &flow_path, &fire) {
                error!(flow = %flow_path.display(), error = %err, "triggered run failed");
            }
        })
    };

    let mut manager = TriggerManager::new(&dirs.data, callback);
    manager.load()?;
    if manager.records().is_empty() {
        println!("no triggers registered; nothing to watch");
        return Ok(());
    }

    manager.start_all();
    info!(triggers = manager.records().len(), "watching; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await.context("failed to wait for Ctrl-C")?;
    manager.stop_all();
    Ok(())
}

/// Trigger records may carry flow paths relative to the flows directory.
fn resolve_flow_path(flows_dir: &Path, flow_path: &str) -> PathBuf {
    let path = Path::new(flow_path);
    if path.is_absolute() { path.to_path_buf() } else { flows_dir.join(path) }
}

fn run_fired_flow(runner: &FlowRunner, flow_path: &Path, fire: &TriggerFire) -> Result<()> {
    let flow = load_flow(flow_path)?;
    let mut seeds = IndexMap::new();
    if let TriggerFire::FolderWatch { new_file, .. } = fire {
        seeds.insert(
            "__trigger_new_file__".to_string(),
            Value::String(new_file.to_string_lossy().into_owned()),
        );
    }
    let report = runner.run_with_seed(&flow, seeds, &ConsoleObserver)?;
    info!(flow = %flow.display_name(), success = report.success, log = %report.log_path.display(), "triggered run finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_vars_parse_name_value_pairs() {
        let seeds = parse_seed_vars(&["a=1".into(), "path=/tmp/x=y".into()]).expect("parse");
        assert_eq!(seeds["a"], Value::String("1".into()));
        // only the first '=' splits
        assert_eq!(seeds["path"], Value::String("/tmp/x=y".into()));
        assert!(parse_seed_vars(&["novalue".into()]).is_err());
    }

    #[test]
    fn relative_flow_paths_resolve_under_the_flows_dir() {
        let resolved = resolve_flow_path(Path::new("/ws/flows"), "daily.yaml");
        assert_eq!(resolved, Path::new("/ws/flows/daily.yaml"));
        let absolute = resolve_flow_path(Path::new("/ws/flows"), "/abs/flow.yaml");
        assert_eq!(absolute, Path::new("/abs/flow.yaml"));
    }
}
