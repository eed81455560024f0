//! Fuzzynote - A terminal client for a fuzzy-search note server.
//!
//! # Usage
//!
//! ```bash
//! fuzzynote
//! fuzzynote --server notes.local:9020 --edit
//! fuzzynote --edit --reconnect --save
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;

use fuzzynote::app::App;
use fuzzynote::config::{
    clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags, ConfigFlags,
};
use fuzzynote::wirelog;

/// A terminal client for a fuzzy-search note server
#[derive(Parser, Debug)]
#[command(name = "fuzzynote", version, about, long_about = None)]
struct Cli {
    /// Server address (host:port)
    #[arg(long, value_name = "ADDR")]
    server: Option<String>,

    /// Path below the /__fuzzy/ endpoint
    #[arg(long, value_name = "PATH")]
    subpath: Option<String>,

    /// Allow editing documents (read-only viewer otherwise)
    #[arg(long)]
    edit: bool,

    /// Reconnect with exponential backoff after the connection drops
    #[arg(long)]
    reconnect: bool,

    /// First reconnect delay in milliseconds
    #[arg(long, value_name = "MS")]
    reconnect_initial_ms: Option<u64>,

    /// Upper bound for the reconnect delay in milliseconds
    #[arg(long, value_name = "MS")]
    reconnect_max_ms: Option<u64>,

    /// Snippet lines shown per search result
    #[arg(long, value_name = "N")]
    max_snippets: Option<usize>,

    /// Append every sent and received frame to a file
    #[arg(long, value_name = "PATH")]
    wire_log: Option<PathBuf>,

    /// Write diagnostics to a file (filtered by RUST_LOG)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

/// Route tracing output to `path`. The terminal belongs to the UI, so
/// without a path diagnostics are not collected.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    let log_path = effective
        .log_file
        .clone()
        .or_else(|| std::env::var_os("FUZZYNOTE_LOG").map(PathBuf::from));
    init_logging(log_path.as_deref())?;

    let wire_log_path = effective
        .wire_log
        .clone()
        .or_else(|| std::env::var_os("FUZZYNOTE_WIRE_LOG").map(PathBuf::from));
    if let Err(err) = wirelog::set_log_path(wire_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize wire log {}: {}",
            wire_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    let mut app = App::new(effective.server())
        .with_subpath(effective.subpath())
        .with_editing(effective.edit)
        .with_reconnect(effective.reconnect_policy())
        .with_max_snippets(effective.max_snippets());

    app.run().context("Application error")
}
