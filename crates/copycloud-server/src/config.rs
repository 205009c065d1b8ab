use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub sweep_interval: Duration,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source. Unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("COPYCLOUD_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("COPYCLOUD_PORT")
            .unwrap_or_else(|| "3001".into())
            .parse()
            .context("COPYCLOUD_PORT must be a port number")?;
        let db_path: PathBuf = lookup("COPYCLOUD_DB_PATH")
            .unwrap_or_else(|| "data.db".into())
            .into();
        let upload_dir: PathBuf = lookup("COPYCLOUD_UPLOAD_DIR")
            .unwrap_or_else(|| "./uploads".into())
            .into();

        let sweep_secs: u64 = lookup("COPYCLOUD_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("COPYCLOUD_SWEEP_INTERVAL_SECS must be a whole number of seconds")?;
        if sweep_secs == 0 {
            bail!("COPYCLOUD_SWEEP_INTERVAL_SECS must be greater than zero");
        }

        let mut cors_origins: Vec<String> =
            DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect();
        if let Some(extra) = lookup("COPYCLOUD_CORS_ORIGINS") {
            cors_origins.extend(
                extra
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
            );
        }

        Ok(Self {
            host,
            port,
            db_path,
            upload_dir,
            sweep_interval: Duration::from_secs(sweep_secs),
            cors_origins,
        })
    }
}
