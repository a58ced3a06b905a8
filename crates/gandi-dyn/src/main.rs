// # gandi-dyn - dynamic DNS for Gandi zones
//
// Points every A record of a Gandi-hosted domain at the current public IPv4
// address of this machine. Meant to be run periodically (cron, systemd
// timer); each invocation performs at most one zone version swap and exits.
//
// This binary is a thin integration layer: it reads arguments and
// environment, wires the IP resolver and the registrar into the zone
// updater, and maps the outcome to an exit code. All update logic lives in
// gandi-dyn-core.
//
// ## Usage
//
// ```bash
// gandi-dyn [--dry-run] <api-key> <domain>
// ```
//
// ## Configuration
//
// Optional environment overrides:
//
// - `GANDI_DYN_IP_URL`: Public-IP lookup service (default: ipify, JSON)
// - `GANDI_DYN_IP_JSON_FIELD`: JSON field holding the address (default: ip)
// - `GANDI_DYN_IP_TIMEOUT_SECS`: Lookup timeout (default: 5)
// - `GANDI_DYN_RPC_URL`: Gandi XML-RPC endpoint
// - `GANDI_DYN_RPC_TIMEOUT_SECS`: Registrar call timeout (default: 60)
// - `GANDI_DYN_MODE`: `dry-run` to report drift without publishing
// - `GANDI_DYN_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Exit codes
//
// - 0: Every A record already matched the current address
// - 1: The zone was updated (or, in dry-run mode, would have been)
// - 2: Usage or configuration error
// - 3: The update failed (any partial work was rolled back)

use anyhow::{Context, Result};
use clap::Parser;
use gandi_dyn_core::{Outcome, UpdateError, UpdaterConfig, ZoneUpdater};
use gandi_dyn_ip_http::HttpIpResolver;
use gandi_dyn_provider_gandi::GandiRegistrar;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible run outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DynExitCode {
    /// No record needed updating
    Unchanged = 0,
    /// A new zone version was activated (or is pending in dry-run mode)
    Changed = 1,
    /// Bad arguments or configuration
    Usage = 2,
    /// The update failed
    Failed = 3,
}

impl From<DynExitCode> for ExitCode {
    fn from(code: DynExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Update the A records of a Gandi domain to this machine's public IPv4 address
#[derive(Debug, Parser)]
#[command(name = "gandi-dyn", version, about)]
struct Cli {
    /// Gandi API key
    #[arg(value_name = "API_KEY")]
    api_key: String,

    /// Domain whose zone is updated (e.g. mydomain.org)
    #[arg(value_name = "DOMAIN")]
    domain: String,

    /// Report stale records without changing anything
    #[arg(long)]
    dry_run: bool,
}

/// Build the updater configuration from arguments and settings
///
/// `setting` looks up an optional override by name; the binary passes the
/// process environment.
fn load_config(cli: Cli, setting: impl Fn(&str) -> Option<String>) -> Result<UpdaterConfig> {
    let dry_run = cli.dry_run
        || match setting("GANDI_DYN_MODE").as_deref() {
            Some("dry-run") => true,
            None | Some("") | Some("update") => false,
            Some(other) => anyhow::bail!(
                "GANDI_DYN_MODE '{}' is not valid. Valid modes: update, dry-run",
                other
            ),
        };

    let mut config = UpdaterConfig::new(cli.api_key, cli.domain).with_dry_run(dry_run);

    if let Some(url) = setting("GANDI_DYN_IP_URL") {
        config.ip_endpoint.url = url;
    }
    if let Some(field) = setting("GANDI_DYN_IP_JSON_FIELD") {
        config.ip_endpoint.json_field = field;
    }
    if let Some(secs) = seconds(&setting, "GANDI_DYN_IP_TIMEOUT_SECS")? {
        config.ip_endpoint.timeout_secs = secs;
    }
    if let Some(url) = setting("GANDI_DYN_RPC_URL") {
        config.registrar.url = url;
    }
    if let Some(secs) = seconds(&setting, "GANDI_DYN_RPC_TIMEOUT_SECS")? {
        config.registrar.timeout_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

/// Read an optional duration in whole seconds
fn seconds(setting: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<u64>> {
    match setting(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a number of seconds. Got: {:?}", name, value)),
        None => Ok(None),
    }
}

/// Read the log level from `GANDI_DYN_LOG_LEVEL`
fn log_level(setting: impl Fn(&str) -> Option<String>) -> Result<Level> {
    let level = setting("GANDI_DYN_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "GANDI_DYN_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Process environment lookup
fn env_setting(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version requests are not errors
            if !e.use_stderr() {
                print!("{}", e.render());
                return DynExitCode::Unchanged.into();
            }
            println!("{}", e.render());
            return DynExitCode::Usage.into();
        }
    };

    let config = match load_config(cli, env_setting) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return DynExitCode::Usage.into();
        }
    };

    let log_level = match log_level(env_setting) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return DynExitCode::Usage.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("error: failed to set tracing subscriber: {}", e);
        return DynExitCode::Usage.into();
    }

    info!("Starting gandi-dyn for {}", config.domain);

    let updater = match build_updater(&config) {
        Ok(updater) => updater,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return DynExitCode::Usage.into();
        }
    };

    // Every call is sequential; one thread is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {}", e);
            return DynExitCode::Failed.into();
        }
    };

    let result = rt.block_on(updater.run(&config.domain));
    if let Err(e) = &result {
        error!("Update of {} failed: {}", config.domain, e);
    }

    report(&result).into()
}

/// Wire the configured IP resolver and registrar into an updater
fn build_updater(config: &UpdaterConfig) -> Result<ZoneUpdater> {
    let ip_resolver = HttpIpResolver::from_config(&config.ip_endpoint)
        .context("failed to create IP resolver")?;
    let registrar = GandiRegistrar::from_config(config.api_key.clone(), &config.registrar)
        .context("failed to create registrar client")?;

    Ok(ZoneUpdater::new(Box::new(ip_resolver), Box::new(registrar)).with_dry_run(config.dry_run))
}

/// Print the result of a run and pick the exit code
fn report(result: &std::result::Result<Outcome, UpdateError>) -> DynExitCode {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("error: {}", e);
            return DynExitCode::Failed;
        }
    };

    println!("{}", outcome.ip());

    match outcome {
        Outcome::Unchanged { .. } => {
            println!("unchanged ip");
            DynExitCode::Unchanged
        }
        Outcome::Changed {
            ip,
            zone,
            version,
            replaced,
        } => {
            println!("zoneid {}", zone.0);
            for record in replaced {
                println!("updated {}", record.current);
            }
            println!("zone version {} activated", version.0);
            eprintln!("ip changed to {}", ip);
            DynExitCode::Changed
        }
        Outcome::Pending { zone, stale, .. } => {
            println!("zoneid {}", zone.0);
            for record in stale {
                println!("would update {}", record);
            }
            DynExitCode::Changed
        }
    }
}
