use anyhow::Context;
use clap::Parser;
use log::{error, info};
use patrolcore::control::{CancelToken, SystemClock};
use status_bridge::bridge::StatusBridge;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod status_bridge;
mod workflow;

const OFFLINE_HOST: &str = "simulated-camera.local";

#[derive(Parser)]
#[command(author, version, about = "PTZ preset patrol with person tracking")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Run on virtual time for a fixed number of cycles and print a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Full passes over the preset order in offline mode
    #[arg(long, default_value_t = 3)]
    cycles: u64,
    /// Seed for the simulated scenario
    #[arg(long)]
    seed: Option<u64>,
    /// Skip the event subscription and use status polling
    #[arg(long, default_value_t = false)]
    no_events: bool,
    /// Serve patrol status over HTTP while running
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value = "127.0.0.1:9000")]
    bind: SocketAddr,
    /// Append the offline summary to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.workflow {
        Some(path) => WorkflowConfig::load(path)?,
        None => WorkflowConfig::default(),
    };
    config
        .apply_process_env()
        .context("reading configuration from the environment")?;
    let dotenv_file = dotenv_file_values();
    config.apply_dotenv_credentials(|key| dotenv_file.get(key).cloned());
    if let Some(seed) = args.seed {
        config.scenario.seed = seed;
    }
    if args.no_events {
        config.patrol.use_events = false;
    }

    if args.offline {
        if config.camera.host.is_none() {
            info!("No HOST configured, using {} for the offline run", OFFLINE_HOST);
            config.camera.host = Some(OFFLINE_HOST.to_string());
        }
        return run_offline(Runner::new(config), args.cycles, args.report.as_ref());
    }

    run_live(Runner::new(config), args.serve.then_some(args.bind))
}

/// Entries of the `.env` file alone, without the process environment.
fn dotenv_file_values() -> HashMap<String, String> {
    dotenvy::dotenv_iter()
        .map(|entries| entries.filter_map(Result::ok).collect())
        .unwrap_or_default()
}

fn run_offline(runner: Runner, cycles: u64, report: Option<&PathBuf>) -> anyhow::Result<()> {
    let result = runner.execute_offline(cycles)?;
    println!("Offline run -> {}", result.summary_line());

    if let Some(report_path) = report {
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(report_path)
            .with_context(|| format!("opening report {}", report_path.display()))?;
        writeln!(file, "{}", result.summary_line())?;
    }
    Ok(())
}

fn run_live(runner: Runner, bind: Option<SocketAddr>) -> anyhow::Result<()> {
    let cancel = CancelToken::new();
    let mut session = runner.prepare(Arc::new(SystemClock::new()), cancel.clone())?;

    let bridge = match bind {
        Some(addr) => {
            let bridge = StatusBridge::start(session.snapshots(), session.metrics.clone(), addr)?;
            println!("Status available at http://{}/status", bridge.local_addr());
            Some(bridge)
        }
        None => None,
    };

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for signal handling")?;
    let interrupt = cancel.clone();
    thread::spawn(move || {
        let received = runtime.block_on(signal::ctrl_c());
        if let Err(err) = received {
            error!("listening for Ctrl+C failed: {}", err);
        }
        interrupt.cancel();
    });

    info!("Patrol running (Ctrl+C to stop)...");
    let metrics = session.controller.run();
    println!(
        "Patrol stopped -> cycles={} visits={} tracking={} faults={} (camera gotos={} stops={})",
        session.controller.cycles_completed(),
        metrics.preset_visits,
        metrics.tracking_sessions,
        metrics.transport_faults,
        session.camera.goto_count(),
        session.camera.stop_count()
    );

    if let Some(bridge) = bridge {
        bridge.shutdown();
    }
    Ok(())
}
