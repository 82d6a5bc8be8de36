use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_PATH: &str = "./database/music_library.db";

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Reads the TOML config at `path`, or starts from defaults when no path is given,
    /// then applies environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                toml::from_str(&contents).with_context(|| "Failed to parse config TOML")?
            }
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overrides file values with `PORT`, `BIND_ADDR` and `DB_PATH`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(port) = lookup("PORT") {
            self.http.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {port:?}"))?;
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            self.http.bind_addr = addr;
        }
        if let Some(path) = lookup("DB_PATH") {
            self.database.in_memory = false;
            self.database.path = PathBuf::from(path);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Database {
    #[serde(default)]
    pub in_memory: bool,
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// refuse to start serving when the startup connectivity check fails
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

impl Default for Database {
    fn default() -> Self {
        Self {
            in_memory: false,
            path: default_db_path(),
            fail_fast: false,
        }
    }
}
