//! Tablero Access Probe
//!
//! Logs in with the given credentials, loads the module catalog through the
//! access gate and prints what the user may do in every module.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tb_access::{AccessSnapshot, CapabilityCheck, ModuleCapabilities};
use tb_client::AccessClient;
use tb_common::{ModuleName, PermissionAction};
use tb_config::{AppConfig, ConfigLoader};
use tracing::{info, warn};

/// Tablero access probe
#[derive(Parser, Debug)]
#[command(name = "tb-access-probe")]
#[command(about = "Print the capability matrix of a Tablero user")]
struct Args {
    /// Config file path (defaults to the standard search paths)
    #[arg(long, env = "TABLERO_CONFIG")]
    config: Option<PathBuf>,

    /// Login email
    #[arg(long, env = "TABLERO_EMAIL")]
    email: Option<String>,

    /// Login password
    #[arg(long, env = "TABLERO_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Print an example config file and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Serialize)]
struct Row<'a> {
    module: &'a str,
    id: Option<&'a str>,
    capabilities: ModuleCapabilities,
    read_denied_because: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    if args.print_config {
        print!("{}", AppConfig::example_toml());
        return Ok(());
    }

    tb_common::logging::init_logging("tb-access-probe");
    let email = args.email.as_deref().context("--email or TABLERO_EMAIL is required")?;
    let password = args
        .password
        .as_deref()
        .context("--password or TABLERO_PASSWORD is required")?;

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load().context("Failed to load configuration")?;
    info!(base_url = %config.api.base_url, "Starting access probe");

    let access = AccessClient::from_config(&config)?;
    let session = access
        .login(email, password)
        .await
        .context("Login failed")?;

    let snapshot = access.load_catalog().await;
    if let Some(error) = snapshot.error() {
        warn!(%error, "Module catalog unavailable");
    }

    let effective = access.resolver().effective();
    let names = module_names(&snapshot);
    let rows: Vec<Row<'_>> = names
        .iter()
        .map(|name| Row {
            module: name,
            id: snapshot.module_id(name),
            capabilities: effective.module_capabilities(name),
            read_denied_because: snapshot
                .explain(name, PermissionAction::Read)
                .reason
                .filter(|_| !effective.is_bypassed())
                .map(|r| r.to_string()),
        })
        .collect();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "user": session.user.profile.email,
                "role": session.role_name(),
                "hasModuleAccess": snapshot.has_module_access(),
                "ready": snapshot.is_ready(),
                "roleOverride": effective.is_bypassed(),
                "modules": rows,
            }))?
        );
        return Ok(());
    }

    println!(
        "user: {}  role: {}  module access: {}  override: {}",
        session.user.profile.email,
        session.role_name().unwrap_or("-"),
        snapshot.has_module_access(),
        effective.is_bypassed(),
    );
    println!("{:<14} {:<10} R W E D  reason", "module", "id");
    for row in &rows {
        println!(
            "{:<14} {:<10} {} {} {} {}  {}",
            row.module,
            row.id.unwrap_or("-"),
            flag(row.capabilities.can_read),
            flag(row.capabilities.can_write),
            flag(row.capabilities.can_edit),
            flag(row.capabilities.can_delete),
            row.read_denied_because.as_deref().unwrap_or(""),
        );
    }

    access.logout();
    Ok(())
}

/// Catalog names, plus the well-known names the catalog did not list.
fn module_names(snapshot: &AccessSnapshot) -> Vec<String> {
    let mut names: Vec<String> = snapshot
        .available_module_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    for known in ModuleName::ALL {
        if !snapshot.module_exists(known.as_str()) {
            names.push(known.as_str().to_string());
        }
    }
    names
}

fn flag(allowed: bool) -> char {
    if allowed {
        'x'
    } else {
        '.'
    }
}
