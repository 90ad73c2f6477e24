//! Layered configuration.
//!
//! Precedence, lowest first: built-in defaults, the TOML file, `CHRONOS_*`
//! environment variables, then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::api::JobQuery;
use crate::core::dashboard::DashboardSettings;
use crate::core::models::JobType;
use crate::core::status::DEFAULT_TEXTUAL_TYPES;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "chronos-dash.toml";

const ENV_PREFIX: &str = "CHRONOS_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root URL of the Chronos server.
    pub api_url: String,
    /// Settle delay before refreshing after a run trigger.
    pub refresh_delay_ms: u64,
    /// Per-request timeout for calls to the server.
    pub request_timeout_secs: u64,
    /// Job types whose last run output is shown on job cards.
    pub textual_output_types: Vec<JobType>,
    /// Restrict the list to one owner.
    pub owner: Option<String>,
    /// Page size sent to the list endpoint; the server default applies when unset.
    pub page_size: Option<u32>,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
    pub json_logs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            refresh_delay_ms: 1000,
            request_timeout_secs: 30,
            textual_output_types: DEFAULT_TEXTUAL_TYPES.to_vec(),
            owner: None,
            page_size: None,
            log_file: None,
            verbose: false,
            json_logs: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from every layer.
    ///
    /// An explicit `config_path` must exist; the default file is optional.
    /// `overrides` is any serializable set of CLI flags whose `None` fields
    /// are skipped.
    pub fn load<T: Serialize>(config_path: Option<&Path>, overrides: Option<&T>) -> Result<Self> {
        let file = match config_path {
            Some(path) => {
                if !path.is_file() {
                    bail!("Config file not found: {}", path.display());
                }
                Toml::file(path)
            }
            None => Toml::file(DEFAULT_CONFIG_FILE),
        };

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX));

        if let Some(overrides) = overrides {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        figment.extract().context("Invalid configuration")
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn job_query(&self) -> JobQuery {
        JobQuery {
            owner: self.owner.clone(),
            page: None,
            size: self.page_size,
        }
    }

    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            refresh_delay: self.refresh_delay(),
            textual_output_types: self.textual_output_types.clone(),
            query: self.job_query(),
        }
    }
}
