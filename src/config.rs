use crate::constants;
use crate::error::{HarvestError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "harvester.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GithubConfig,
    pub paths: PathsConfig,
    pub concurrency: ConcurrencyConfig,
    pub retry: RetryConfig,
    pub filter: FilterConfig,
    pub sync: SyncConfig,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_base: String,
    pub raw_base: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Never read from the file; filled from the environment.
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: constants::JACKETT_OWNER.to_string(),
            repo: constants::JACKETT_REPO.to_string(),
            branch: constants::JACKETT_BRANCH.to_string(),
            api_base: constants::GITHUB_API.to_string(),
            raw_base: constants::RAW_BASE.to_string(),
            user_agent: constants::USER_AGENT.to_string(),
            timeout_seconds: 30,
            token: None,
        }
    }
}

impl GithubConfig {
    /// Hint printed on any aborted run made without a token.
    pub fn token_hint(&self) -> Option<String> {
        match self.token {
            Some(_) => None,
            None => Some(format!(
                "Hint: set {} to increase rate limits and avoid 403 errors.",
                constants::GITHUB_TOKEN_ENV
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub definitions_prefix: String,
    pub indexers_prefix: String,
    pub known_dataset: PathBuf,
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            definitions_prefix: constants::DEFINITIONS_PREFIX.to_string(),
            indexers_prefix: constants::INDEXERS_PREFIX.to_string(),
            known_dataset: PathBuf::from(constants::KNOWN_DATASET_PATH),
            output: PathBuf::from(constants::OUTPUT_PATH),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub definitions: usize,
    pub indexers: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            definitions: constants::DEFINITIONS_CONCURRENCY,
            indexers: constants::INDEXERS_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_ms: u64,
    pub cap_ms: u64,
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: constants::MAX_ATTEMPTS,
            base_ms: constants::BACKOFF_BASE_MS,
            cap_ms: constants::BACKOFF_CAP_MS,
            jitter_ms: constants::JITTER_MS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Appended to the built-in ignore list
    pub extra_ignore: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub upstream_url: String,
    pub excluded_fields: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            upstream_url: constants::UPSTREAM_DATASET_URL.to_string(),
            excluded_fields: constants::SYNC_EXCLUDED_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Config {
    /// Load configuration. An explicitly requested file must exist; the
    /// default `harvester.toml` is optional and falls back to built-in values.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.github.token = std::env::var(constants::GITHUB_TOKEN_ENV)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HarvestError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(HarvestError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.concurrency.definitions == 0 || self.concurrency.indexers == 0 {
            return Err(HarvestError::Config(
                "concurrency limits must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.github.timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github: GithubConfig::default(),
            paths: PathsConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            retry: RetryConfig::default(),
            filter: FilterConfig::default(),
            sync: SyncConfig::default(),
            log_dir: default_log_dir(),
        }
    }
}
