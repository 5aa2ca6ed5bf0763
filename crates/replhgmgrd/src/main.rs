//! replhgmgrd - replication hostgroup configuration manager
//!
//! Runs one reconciliation pass of `mysql_replication_hostgroups` against a
//! catalog file and exits.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use proxysql_cfgmgr_common::{AdminClient, CfgMgr, FailurePolicy, ProcessExecutor, RunMode};
use proxysql_replhgmgrd::{Catalog, MgrConfig, ReplicationHostgroupMgr, DEFAULT_CONFIG_PATH};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// ProxySQL replication hostgroup manager
#[derive(Parser, Debug)]
#[command(name = "replhgmgrd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Desired-state catalog (YAML)
    #[arg(short = 'c', long)]
    catalog: PathBuf,

    /// Daemon configuration file (TOML)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// mysql client binary
    #[arg(long)]
    mysql: Option<PathBuf>,

    /// Option file with admin credentials
    #[arg(long)]
    defaults_file: Option<PathBuf>,

    /// Keep going when a resource fails
    #[arg(long)]
    continue_on_error: bool,

    /// Plan only; issue no mutating statement
    #[arg(long)]
    noop: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .init();
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let mut config = MgrConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(mysql) = args.mysql {
        config.client.mysql_binary = mysql;
    }
    if args.defaults_file.is_some() {
        config.client.defaults_file = args.defaults_file;
    }
    if args.continue_on_error {
        config.reconcile.failure_policy = FailurePolicy::Continue;
    }
    config.validate()?;

    let catalog = Catalog::load(&args.catalog)
        .with_context(|| format!("loading catalog {}", args.catalog.display()))?;

    let client = AdminClient::new(ProcessExecutor::new(&config.client.mysql_binary))
        .with_defaults_file(config.resolved_defaults_file());
    let mode = if args.noop { RunMode::Noop } else { RunMode::Apply };
    let mut mgr = ReplicationHostgroupMgr::new(client)
        .with_failure_policy(config.reconcile.failure_policy)
        .with_run_mode(mode);

    info!(
        "{}: reconciling {} resources into {:?} (policy {}, {:?})",
        mgr.daemon_name(),
        catalog.resources().len(),
        mgr.admin_table_names(),
        mgr.failure_policy(),
        mgr.run_mode()
    );
    let client = mgr.session();
    info!(
        "Admin client: {} (defaults file {})",
        client.executor().program().display(),
        client
            .defaults_file()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string())
    );

    let report = mgr.reconcile(catalog.resources()).await?;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(state) => info!(
                resource = %outcome.name,
                action = outcome.action_name(),
                ensure = %state.ensure,
                "Resource reconciled"
            ),
            Err(e) => warn!(
                resource = %outcome.name,
                action = outcome.action_name(),
                error = %e,
                "Resource failed"
            ),
        }
    }
    if let Some(e) = &report.commit_error {
        warn!(error = %e, "Commit failed");
    }
    info!(
        "Pass complete: {} changes, activated={}, persisted={}",
        report.mutation_count(),
        report.commit.activated,
        report.commit.persisted
    );

    Ok(!report.has_failures())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("--- Starting replhgmgrd ---");

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("replhgmgrd: pass finished with failed resources");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("replhgmgrd error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
