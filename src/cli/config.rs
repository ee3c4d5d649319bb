use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::browser::session::BrowserConfig;
use crate::fill::Timing;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-autofill",
    version,
    about = "Detect, save and refill survey form answers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: form-autofill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Work on a DOM snapshot (JSON) instead of a live browser
    #[arg(long, global = true, conflicts_with = "url")]
    pub snapshot: Option<PathBuf>,

    /// Write the snapshot back here after filling
    #[arg(long, global = true, requires = "snapshot")]
    pub out: Option<PathBuf>,

    /// Open this URL in the browser bridge
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Store file (default: platform data dir)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Append one JSONL trace line per filled record to this file
    #[arg(long, global = true)]
    pub trace: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect the form's questions
    Detect {
        /// Output format: console or json
        #[arg(long, default_value = "console")]
        format: String,
    },

    /// Save records from a file, or detect and save the page's answers
    Save {
        /// JSON array of field records
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Fill the form from a JSON array of field records
    Fill {
        #[arg(long)]
        data: PathBuf,

        /// Output format: console or json
        #[arg(long, default_value = "console")]
        format: String,
    },

    /// Fill the form from the saved records
    LoadAndFill {
        /// Output format: console or json
        #[arg(long, default_value = "console")]
        format: String,
    },

    /// Show the saved records
    Show {
        /// Output format: console or json
        #[arg(long, default_value = "console")]
        format: String,
    },

    /// Delete the saved records
    Clear,

    /// Answer NDJSON commands on stdin, one response line each
    Serve,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-autofill.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    pub path: Option<PathBuf>,
}

// ============================================================================
// Config File Loading
// ============================================================================

pub const DEFAULT_CONFIG_FILE: &str = "form-autofill.yaml";

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "ignoring malformed config file");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, serde_yaml::Error> {
    // An empty file deserializes to unit, not to an empty map.
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(content)
}

// ============================================================================
// Resolution (CLI > config file > defaults)
// ============================================================================

impl AppConfig {
    pub fn store_path(&self, cli: &Cli) -> PathBuf {
        cli.store
            .clone()
            .or_else(|| self.store.path.clone())
            .unwrap_or_else(crate::store::JsonFileStore::default_path)
    }

    pub fn trace_path(&self, cli: &Cli) -> Option<PathBuf> {
        cli.trace.clone().or_else(|| self.trace.path.clone())
    }
}
