use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::{NetworkType, TagFilter};

/// Default initial zoom for the exported map
pub const DEFAULT_ZOOM: u8 = 14;

fn default_zoom() -> u8 {
    DEFAULT_ZOOM
}
fn default_network() -> NetworkType {
    NetworkType::Walk
}
fn default_verbose() -> bool {
    false
}

/// Tag values in the config file may be a single string or a list
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TagValues {
    One(String),
    Many(Vec<String>),
}

impl TagValues {
    fn into_vec(self) -> Vec<String> {
        match self {
            TagValues::One(v) => vec![v],
            TagValues::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default = "default_network")]
    pub network: NetworkType,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, TagValues>>,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(default)]
    pub provider: Option<ProviderConfig>,
}

impl FileConfig {
    /// Search the standard locations and load the first config that parses
    pub fn load() -> Option<Self> {
        for path in get_config_paths() {
            if !path.exists() {
                continue;
            }
            match Self::from_path(&path) {
                Ok(config) => return Some(config),
                Err(e) => {
                    tracing::warn!("Failed to load config file {:?}: {}", path, e);
                }
            }
        }
        None
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Configured tag filter, if the file has a `[tags]` table
    pub fn tag_filter(&self) -> Option<TagFilter> {
        self.tags.clone().map(|tags| {
            tags.into_iter()
                .map(|(key, values)| (key, values.into_vec()))
                .collect()
        })
    }
}

/// Tags requested when neither the CLI nor the config names any
pub fn default_tags() -> TagFilter {
    TagFilter::new()
        .with("tourism", ["attraction", "museum"])
        .with("amenity", ["cafe", "restaurant"])
        .with("leisure", ["park"])
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_overpass_urls() -> Vec<String> {
    vec![
        "https://overpass-api.de/api/interpreter".to_string(),
        "https://overpass.private.coffee/api/interpreter".to_string(),
        "https://maps.mail.ru/osm/tools/overpass/api/interpreter".to_string(),
    ]
}

fn default_timeout_secs() -> u64 {
    200
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("findmyroute/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Endpoints and HTTP behaviour of the OpenStreetMap services
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,
    #[serde(default = "default_overpass_urls")]
    pub overpass_urls: Vec<String>,
    /// Client timeout, slightly above the 180s server-side query timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Wait before retry `n` is `n * retry_backoff_secs`
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            nominatim_url: default_nominatim_url(),
            overpass_urls: default_overpass_urls(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_secs: default_retry_backoff_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("findmyroute.toml"));
    paths.push(PathBuf::from(".findmyroute.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("findmyroute").join("config.toml"));
        paths.push(config_dir.join("findmyroute.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".findmyroute.toml"));
    }

    paths
}
