use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::PatentError;
use crate::fetcher::{ClientOptions, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

pub const DEFAULT_CONFIG_FILE: &str = "patcite.json";
pub const DEFAULT_INPUT_ROOT: &str = "data/json/query";
pub const DEFAULT_IMAGE_ROOT: &str = "data/front_imgs/document";
pub const DEFAULT_OUTPUT_ROOT: &str = "data/json/document";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub json_dir_input: Option<String>,
    #[serde(default)]
    pub front_imgs_dir: Option<String>,
    #[serde(default)]
    pub json_dir_output: Option<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Values given on the command line; each one wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub json_dir_input: Option<String>,
    pub front_imgs_dir: Option<String>,
    pub json_dir_output: Option<String>,
    pub exclude: Vec<String>,
    pub timeout_secs: Option<u64>,
}

/// The three directory roots a batch run works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    pub input: Utf8PathBuf,
    pub images: Utf8PathBuf,
    pub documents: Utf8PathBuf,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub roots: Roots,
    pub exclude: Vec<String>,
    pub client: ClientOptions,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `patcite.json` when present, then applies overrides.
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, PatentError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| PatentError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| PatentError::ConfigParse(err.to_string()))?
        };

        Ok(Self::resolve_config(config, overrides))
    }

    pub fn resolve_config(config: Config, overrides: ConfigOverrides) -> ResolvedConfig {
        let remote = config.remote.unwrap_or_default();
        let pick = |flag: Option<String>, file: Option<String>, default: &str| {
            Utf8PathBuf::from(flag.or(file).unwrap_or_else(|| default.to_string()))
        };

        let roots = Roots {
            input: pick(
                overrides.json_dir_input,
                config.json_dir_input,
                DEFAULT_INPUT_ROOT,
            ),
            images: pick(
                overrides.front_imgs_dir,
                config.front_imgs_dir,
                DEFAULT_IMAGE_ROOT,
            ),
            documents: pick(
                overrides.json_dir_output,
                config.json_dir_output,
                DEFAULT_OUTPUT_ROOT,
            ),
        };

        let mut exclude = config.exclude;
        for category in overrides.exclude {
            if !exclude.contains(&category) {
                exclude.push(category);
            }
        }

        let timeout_secs = overrides
            .timeout_secs
            .or(remote.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = ClientOptions {
            base_url: remote
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            user_agent: remote.user_agent,
        };

        ResolvedConfig {
            roots,
            exclude,
            client,
        }
    }
}
