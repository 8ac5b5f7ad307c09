use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub history: HistoryConfig,
    pub store: StoreConfig,
    pub resolver: ResolverConfig,
    pub report: ReportConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }

    /// Loads `path` if given, otherwise uses defaults.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Config> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Config::default()),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    /// Directory holding the DJ software's history exports
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Start with an empty store when `path` does not exist yet
    pub create_if_missing: bool,
    /// Save after this many new records; 0 saves only at the end of a run
    pub save_every: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("link_database.json"),
            create_if_missing: false,
            save_every: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ResolverConfig {
    pub search_url: String,
    pub query_param: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            search_url: "https://bandcamp.com/search".to_string(),
            query_param: "q".to_string(),
            timeout_secs: 10,
            max_retries: 0,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    pub output: PathBuf,
    pub link_text: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("track_list_html_table.html"),
            link_text: "Bandcamp Link".to_string(),
        }
    }
}
