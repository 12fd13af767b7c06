//! TOML configuration for unit tables and acquisition defaults.
//!
//! Config keys (TOML): `[units]` with `allowed`, `corrections`, `entities`;
//! `[acquire]` with `limit_per_group`, `retries`, `retry_delay_secs`,
//! `timeout_secs`, `parallel`, `worker_count`, `replication`.

mod defaults;
mod io;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::acquire::{AcquireOptions, ReplicationMode};
use crate::units::{AllowedUnits, CorrectionRule, EntityUnitMap, UnitParser};

use defaults::{
    clamp_worker_count, default_corrections, default_limit_per_group, default_retries,
    default_retry_delay_secs, default_timeout_secs, default_true,
};

pub use io::{CONFIG_FILE_NAME, config_path, load_from, load_or_default, save_to_path};

/// Everything read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrepConfig {
    #[serde(default)]
    pub units: UnitSettings,
    #[serde(default)]
    pub acquire: AcquireSettings,
}

impl PrepConfig {
    pub(crate) fn normalized(mut self) -> Self {
        self.acquire = self.acquire.normalized();
        self
    }
}

/// Unit table overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSettings {
    /// Replaces the accepted unit set; defaults to the union of `entities`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    /// Spelling corrections, tried in order.
    #[serde(default = "default_corrections")]
    pub corrections: Vec<CorrectionRule>,
    /// Units per entity name; defaults to the built-in table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<BTreeMap<String, Vec<String>>>,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            allowed: None,
            corrections: default_corrections(),
            entities: None,
        }
    }
}

impl UnitSettings {
    pub fn build_parser(&self) -> UnitParser {
        let entities = match &self.entities {
            Some(table) => EntityUnitMap::new(
                table
                    .iter()
                    .map(|(entity, units)| {
                        (entity.clone(), AllowedUnits::new(units.iter().cloned()))
                    })
                    .collect(),
            ),
            None => EntityUnitMap::default(),
        };
        let parser = UnitParser::new(entities, self.corrections.clone());
        let parser = match &self.allowed {
            Some(allowed) => parser.with_allowed_set(AllowedUnits::new(allowed.iter().cloned())),
            None => parser,
        };
        if parser.allowed_units().is_empty() {
            warn!("Unit configuration allows no units; every measurement will be rejected");
        }
        parser
    }
}

/// Acquisition defaults; command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquireSettings {
    #[serde(default = "default_limit_per_group")]
    pub limit_per_group: usize,
    #[serde(default = "default_retries")]
    pub retries: usize,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_count: Option<usize>,
    #[serde(default)]
    pub replication: ReplicationMode,
}

impl Default for AcquireSettings {
    fn default() -> Self {
        Self {
            limit_per_group: default_limit_per_group(),
            retries: default_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            timeout_secs: default_timeout_secs(),
            parallel: true,
            worker_count: None,
            replication: ReplicationMode::Off,
        }
    }
}

impl AcquireSettings {
    fn normalized(mut self) -> Self {
        self.limit_per_group = self.limit_per_group.max(1);
        self.retries = self.retries.max(1);
        self.worker_count = clamp_worker_count(self.worker_count);
        self
    }

    /// Acquisition options rooted at `download_folder`.
    pub fn to_options(&self, download_folder: &Path) -> AcquireOptions {
        AcquireOptions {
            download_folder: download_folder.to_path_buf(),
            parallel: self.parallel,
            limit_per_group: self.limit_per_group,
            retries: self.retries,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            request_timeout: Duration::from_secs(self.timeout_secs),
            worker_count: self.worker_count,
            seed: None,
            replication: self.replication,
        }
    }
}

/// Errors raised while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No suitable base config directory available")]
    NoConfigDir,
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
}
