use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::constants::{
    API_REQUEST_SPACING_SECS, CLOUDWATCH_LOG_GROUP, CONFIG_FILE_ENV_VAR,
    LEGACY_MARKER_TABLE_ENV_VAR, LOG_LEVEL, MARKER_TABLE,
    POLL_INTERVAL_SECS, RETRY_BACKOFF_FACTOR, RETRY_INITIAL_DELAY_SECS, RETRY_MAX_ATTEMPTS,
};
use crate::retry::BackoffPolicy;
use config::{Config as RConfig, Environment, File, FileFormat};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub log_level: String,
    pub log_dir: Option<String>,

    pub cloudwatch_log_group: String,
    pub marker_table: String,
    pub create_missing_resources: bool,

    /// Seconds between the starts of two poll cycles.
    pub poll_interval: f64,
    /// Seconds to wait before each remote write and between streams.
    pub api_request_spacing: f64,

    pub retry_max_attempts: u32,
    pub retry_initial_delay: f64,
    pub retry_backoff_factor: f64,

    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub aws_profile: Option<String>,

    pub sentry_dsn: Option<String>,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval)
    }

    pub fn request_spacing(&self) -> Duration {
        Duration::from_secs_f64(self.api_request_spacing)
    }

    pub fn backoff_policy(&self) -> Result<BackoffPolicy> {
        let initial_delay = Duration::try_from_secs_f64(self.retry_initial_delay)
            .with_context(|| format!("invalid retry_initial_delay {}", self.retry_initial_delay))?;
        BackoffPolicy::new(
            self.retry_max_attempts,
            initial_delay,
            self.retry_backoff_factor,
        )
        .context("invalid retry settings")
    }

    /// Rejects settings the daemon cannot run with, before anything touches AWS.
    pub fn validate(&self) -> Result<()> {
        let poll_interval = Duration::try_from_secs_f64(self.poll_interval)
            .with_context(|| format!("invalid poll_interval {}", self.poll_interval))?;
        if poll_interval.is_zero() {
            bail!("poll_interval must be a positive number of seconds, got {}", self.poll_interval);
        }
        Duration::try_from_secs_f64(self.api_request_spacing)
            .with_context(|| format!("invalid api_request_spacing {}", self.api_request_spacing))?;
        self.backoff_policy()?;

        if self.cloudwatch_log_group.trim().is_empty() {
            bail!("cloudwatch_log_group must not be empty");
        }
        if self.marker_table.trim().is_empty() {
            bail!("marker_table must not be empty");
        }
        if self.access_key.is_some() != self.secret_key.is_some() {
            bail!("access_key and secret_key must be set together");
        }
        if let Some(dsn) = self.sentry_dsn.as_deref().filter(|dsn| !dsn.trim().is_empty()) {
            dsn.parse::<sentry::types::Dsn>()
                .with_context(|| format!("invalid sentry_dsn '{}'", dsn))?;
        }
        Ok(())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads defaults, then the optional config file, then the process environment.
    pub fn load() -> Result<Config> {
        Self::load_from(std::env::vars().collect())
    }

    /// Same as [`ConfigLoader::load`] with an explicit set of environment variables.
    pub fn load_from(env: HashMap<String, String>) -> Result<Config> {
        let mut builder = RConfig::builder();

        // set defaults
        builder = builder
            .set_default("log_level", LOG_LEVEL)?
            .set_default("cloudwatch_log_group", CLOUDWATCH_LOG_GROUP)?
            .set_default("marker_table", MARKER_TABLE)?
            .set_default("create_missing_resources", true)?
            .set_default("poll_interval", POLL_INTERVAL_SECS)?
            .set_default("api_request_spacing", API_REQUEST_SPACING_SECS)?
            .set_default("retry_max_attempts", i64::from(RETRY_MAX_ATTEMPTS))?
            .set_default("retry_initial_delay", RETRY_INITIAL_DELAY_SECS)?
            .set_default("retry_backoff_factor", RETRY_BACKOFF_FACTOR)?;

        // SDB_DOMAIN is the older name of the marker table setting
        if let Some(table) = env.get(LEGACY_MARKER_TABLE_ENV_VAR).filter(|_| !env.contains_key("MARKER_TABLE")) {
            builder = builder.set_override("marker_table", table.as_str())?;
        }

        if let Some(path) = env.get(CONFIG_FILE_ENV_VAR).filter(|path| !path.is_empty()) {
            builder = builder.add_source(File::new(path, FileFormat::Toml).required(true));
        }

        let env_source: config::Map<String, String> = env
            .into_iter()
            .filter(|(key, _)| key != CONFIG_FILE_ENV_VAR && key != LEGACY_MARKER_TABLE_ENV_VAR)
            .collect();
        // values stay strings here; numeric fields are converted on deserialize
        builder = builder.add_source(Environment::default().source(Some(env_source)));

        let config: Config = builder
            .build()?
            .try_deserialize()
            .context("failed to parse configuration")?;

        Ok(config)
    }
}
