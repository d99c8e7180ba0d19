use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments; constructed once at
/// startup and passed into components explicitly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    /// Token required by the admin purge endpoint. Purge is refused when
    /// unset.
    pub admin_token: Option<String>,
    /// When set, download `Content-Length` is measured from the stored chunk
    /// sizes instead of trusting the manifest's declared total.
    pub strict_content_length: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Chunked file-share service")]
pub struct Args {
    /// Host to bind to (overrides FILEDROP_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILEDROP_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where blobs are stored (overrides FILEDROP_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Admin purge token (overrides FILEDROP_ADMIN_TOKEN)
    #[arg(long)]
    pub admin_token: Option<String>,

    /// Measure download Content-Length from stored chunks instead of the
    /// manifest's declared size (overrides FILEDROP_STRICT_CONTENT_LENGTH)
    #[arg(long)]
    pub strict_content_length: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("FILEDROP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("FILEDROP_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing FILEDROP_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading FILEDROP_PORT"),
        };
        let env_storage =
            env::var("FILEDROP_STORAGE_DIR").unwrap_or_else(|_| "./data/blobs".into());
        let env_admin_token = env::var("FILEDROP_ADMIN_TOKEN").ok();
        let env_strict = env::var("FILEDROP_STRICT_CONTENT_LENGTH")
            .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            admin_token: args.admin_token.or(env_admin_token),
            strict_content_length: args.strict_content_length || env_strict,
        };

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
