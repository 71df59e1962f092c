use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::{Deserialize, Deserializer, de};
use std::time::Duration;
use std::{env, fs, path::Path};
use tracing::info;

pub const DEFAULT_DIGEST_CAPACITY: usize = 4096;
pub const DEFAULT_REPOSITORY_CAPACITY_PER_DIGEST: usize = 2048;
pub const DEFAULT_TTL_SECONDS: u64 = 600;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub webserver: Webserver,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize)]
pub struct Webserver {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for Webserver {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

/// Sizing and lifetime of a [`DigestCache`](crate::cache::DigestCache).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    /// Maximum number of distinct digests held at once.
    pub digest_capacity: usize,
    /// Maximum number of repository names remembered per digest.
    pub repository_capacity_per_digest: usize,
    /// Entry lifetime, read from `ttlSeconds`. Fractions of a second are kept.
    /// Zero turns the cache off.
    #[serde(rename = "ttlSeconds", deserialize_with = "deserialize_seconds")]
    ttl: Duration,
}

impl CacheConfig {
    pub fn new(digest_capacity: usize, repository_capacity_per_digest: usize, ttl: Duration) -> Self {
        Self {
            digest_capacity,
            repository_capacity_per_digest,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            digest_capacity: DEFAULT_DIGEST_CAPACITY,
            repository_capacity_per_digest: DEFAULT_REPOSITORY_CAPACITY_PER_DIGEST,
            ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
        }
    }
}

fn deserialize_seconds<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs)
        .map_err(|e| de::Error::custom(format!("invalid ttlSeconds {}: {}", secs, e)))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    info!("Loading config from file {}", path.as_ref().display());
    let yaml_str = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

    let expanded = expand_env_vars(&yaml_str)?;

    let config = serde_yaml_ng::from_str(&expanded)
        .context("Failed to parse YAML config after environment variable expansion")?;

    Ok(config)
}

/// Replaces `${VAR}` placeholders with environment variables values.
/// Returns an error naming every variable that is not set.
fn expand_env_vars(input: &str) -> Result<String> {
    let re =
        Regex::new(r"\$\{([^}]+)}").context("Invalid regex pattern for env var substitution")?;

    let mut missing = Vec::new();
    let result = re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        env::var(var_name).unwrap_or_else(|_| {
            missing.push(var_name.to_string());
            String::new()
        })
    });

    if !missing.is_empty() {
        bail!("Missing environment variable: {}", missing.join(", "));
    }

    Ok(result.into_owned())
}
