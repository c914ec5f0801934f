//! Configuration management for fast_word_search
//!
//! Supports loading configuration from TOML files with CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::index::DEFAULT_BUCKETS;
use crate::pool::DEFAULT_QUEUE_CAPACITY;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub activity: ActivityConfig,
}

/// Index-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Initial bucket count of the hash index
    #[serde(default = "default_buckets")]
    pub buckets: usize,
}

/// Job-queue-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Job slots in the circular buffer (one slot stays reserved)
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    /// Seconds a blocked push waits before logging a back-pressure warning
    #[serde(default = "default_block_warn_secs")]
    pub block_warn_secs: f64,
}

/// Worker-pool-related configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PoolConfig {
    /// Worker threads (0 = number of online CPUs)
    #[serde(default)]
    pub workers: usize,
}

/// Activity-log-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Path of the append-only activity log
    #[serde(default = "default_activity_path")]
    pub path: PathBuf,
}

fn default_buckets() -> usize {
    DEFAULT_BUCKETS
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_block_warn_secs() -> f64 {
    1.0
}

fn default_activity_path() -> PathBuf {
    PathBuf::from("activity.log")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buckets: default_buckets(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            block_warn_secs: default_block_warn_secs(),
        }
    }
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            path: default_activity_path(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from default locations
    ///
    /// Search order:
    /// 1. FWS_CONFIG environment variable
    /// 2. ./fast_word_search.toml (current directory)
    /// 3. ~/.config/fast_word_search/config.toml (user config)
    pub fn from_default_locations() -> Result<Option<(Self, PathBuf)>> {
        // Check environment variable first
        if let Ok(env_path) = std::env::var("FWS_CONFIG") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                let config = Self::from_file(&path)?;
                return Ok(Some((config, path)));
            }
        }

        // Check current directory
        let local_path = PathBuf::from("fast_word_search.toml");
        if local_path.exists() {
            let config = Self::from_file(&local_path)?;
            return Ok(Some((config, local_path)));
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let user_path = config_dir.join("fast_word_search").join("config.toml");
            if user_path.exists() {
                let config = Self::from_file(&user_path)?;
                return Ok(Some((config, user_path)));
            }
        }

        Ok(None)
    }

    /// Merge CLI overrides into the configuration
    pub fn with_overrides(
        mut self,
        workers: Option<usize>,
        queue_capacity: Option<usize>,
        buckets: Option<usize>,
        activity_log: Option<PathBuf>,
    ) -> Self {
        if let Some(workers) = workers {
            self.pool.workers = workers;
        }
        if let Some(capacity) = queue_capacity {
            self.queue.capacity = capacity;
        }
        if let Some(buckets) = buckets {
            self.engine.buckets = buckets;
        }
        if let Some(path) = activity_log {
            self.activity.path = path;
        }

        self
    }
}
