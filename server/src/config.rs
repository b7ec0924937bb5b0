use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// ARSOUND marketplace server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "arsound-server", version, about = "ARSOUND marketplace server")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "ARSOUND_PORT", default_value = "4242")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "ARSOUND_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./arsound.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "ARSOUND_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Data directory for persistent state (DB, pack archives, keys)
    #[arg(long, env = "ARSOUND_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Upload limits (loaded from [uploads] section in TOML)
    #[arg(skip)]
    #[serde(default)]
    pub uploads: Option<UploadsConfig>,
}

/// Configuration for pack uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// Maximum upload size in megabytes per pack archive (default: 200)
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u32,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: 200,
        }
    }
}

fn default_max_upload_size() -> u32 {
    200
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4242,
            bind_address: "0.0.0.0".to_string(),
            config: "./arsound.toml".to_string(),
            json_logs: false,
            generate_config: false,
            data_dir: "./data".to_string(),
            uploads: None,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (ARSOUND_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("ARSOUND_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# ARSOUND Marketplace Server Configuration
# Place this file at ./arsound.toml or specify with --config <path>
# All settings can be overridden via environment variables (ARSOUND_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 4242)
# port = 4242

# Bind address (default: 0.0.0.0 — all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Data directory for SQLite database, pack archives, and JWT signing key
# data_dir = "./data"

# ---- Uploads ----
# [uploads]

# Maximum upload size in megabytes per pack archive (default: 200)
# max_upload_size_mb = 200
"#
    .to_string()
}
