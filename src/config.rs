use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Default)]
#[command(name = "bookshop")]
#[command(about = "Runs the bookshop inventory service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,

    /// Overrides `app.port` from the config file.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Overrides `app.database` from the config file.
    #[arg(short = 'd', long = "database")]
    pub database: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bookshop")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_database")]
    database: String,
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_database() -> String {
    "bookdb.sqlite".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    crate::DEFAULT_UPLOAD_LIMIT
}

impl Default for App {
    fn default() -> Self {
        App {
            database: default_database(),
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Relative database paths are resolved against `data_dir`.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub app: App,
}

/// A loaded configuration plus the directory its relative paths hang off.
#[derive(Debug)]
pub struct Loaded {
    pub config: Config,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    /// Picks the config for this run: an explicit `--config` must load, the
    /// default location is used when present, and built-in defaults apply
    /// otherwise. Command line overrides are applied last.
    pub fn resolve(cli: &Cli) -> Result<Loaded> {
        let (config, data_dir) = match &cli.config_path {
            Some(path) => {
                let cfg = Config::new(path).with_context(|| format!("failed to load config file {path}"))?;
                (cfg, parent_dir(Path::new(path)))
            }
            None => {
                let path = default_config_path();
                if path.exists() {
                    let cfg = Config::new(&path.to_string_lossy())
                        .with_context(|| format!("failed to load config file {}", path.display()))?;
                    (cfg, default_config_dir())
                } else {
                    tracing::info!(path = %path.display(), "no config file found, using defaults");
                    (Config::default(), PathBuf::from("."))
                }
            }
        };

        let mut config = config;
        if let Some(port) = cli.port {
            config.app.port = port;
        }
        if let Some(database) = &cli.database {
            config.app.database = database.clone();
        }

        Ok(Loaded { config, data_dir })
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        Config::parse(&yaml_str)
    }

    fn parse(yaml_str: &str) -> Result<Config> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!(variable = var_name, "environment variable not found");
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
