//! Configuration loading from environment variables.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

use crate::data::{JsonFile, Persistence};
use crate::db::Sqlite;
use crate::form::Catalog;
use crate::geometry::GridLayout;

/// Storage used for the lesson collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    Sqlite,
    Json,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "json" => Ok(Backend::Json),
            other => anyhow::bail!("unknown backend '{}' (expected sqlite or json)", other),
        }
    }
}

/// Runtime settings for the schedule service
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: Backend,
    pub port: u16,
    /// Optional JSON file replacing the built-in course/teacher tables
    pub catalog_path: Option<PathBuf>,
    pub grid: GridLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            backend: Backend::Sqlite,
            port: 8080,
            catalog_path: None,
            grid: GridLayout::default(),
        }
    }
}

impl Config {
    /// Load settings from the environment.
    ///
    /// Reads `JADVAL_DATA_DIR`, `JADVAL_BACKEND`, `JADVAL_PORT`,
    /// `JADVAL_CATALOG`, `JADVAL_GRID_START_HOUR` and `JADVAL_PX_PER_HOUR`,
    /// either from the environment or from a `.env` file. Unset variables
    /// keep their defaults.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(dir) = get("JADVAL_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = get("JADVAL_BACKEND") {
            config.backend = backend.parse().context("Invalid JADVAL_BACKEND")?;
        }
        if let Some(port) = get("JADVAL_PORT") {
            config.port = port.trim().parse().context("Invalid JADVAL_PORT")?;
        }
        if let Some(path) = get("JADVAL_CATALOG") {
            config.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(hour) = get("JADVAL_GRID_START_HOUR") {
            let hour: u32 = hour.trim().parse().context("Invalid JADVAL_GRID_START_HOUR")?;
            anyhow::ensure!(hour < 24, "JADVAL_GRID_START_HOUR must be below 24");
            config.grid.start_hour = hour;
        }
        if let Some(px) = get("JADVAL_PX_PER_HOUR") {
            let px: f64 = px.trim().parse().context("Invalid JADVAL_PX_PER_HOUR")?;
            anyhow::ensure!(px > 0.0, "JADVAL_PX_PER_HOUR must be positive");
            config.grid.px_per_hour = px;
        }

        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("jadval.db")
    }

    /// Open the configured storage backend
    pub fn open_persistence(&self) -> Result<Box<dyn Persistence>> {
        match self.backend {
            Backend::Sqlite => Ok(Box::new(Sqlite::open(&self.database_path())?)),
            Backend::Json => Ok(Box::new(JsonFile::new(&self.data_dir))),
        }
    }

    /// The course/teacher catalog, from file when one is configured
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::from_file(path),
            None => Ok(Catalog::default()),
        }
    }
}
