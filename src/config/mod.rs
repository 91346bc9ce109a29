//! Configuration management
//!
//! This module handles loading and parsing configuration for CRAS Agenda.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Agenda (slot grid) configuration
    #[serde(default)]
    pub agenda: AgendaConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Data source configuration
    #[serde(default)]
    pub data: DataConfig,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// Agenda configuration: the fixed daily slot list and booking rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgendaConfig {
    /// Start times of the daily slots, as "HH:MM"
    #[serde(default = "default_slots")]
    pub slots: Vec<String>,
    /// Length of every slot in minutes
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
    /// Weekdays the units are open ("mon".."sun")
    #[serde(default = "default_working_days")]
    pub working_days: Vec<String>,
    /// Local time offset of the units, in hours from UTC
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// Whether appointments may be booked in slots that already started
    #[serde(default)]
    pub allow_past_booking: bool,
    /// How many days ahead the next-free-slot search looks
    #[serde(default = "default_search_horizon_days")]
    pub search_horizon_days: u32,
}

impl Default for AgendaConfig {
    fn default() -> Self {
        Self {
            slots: default_slots(),
            slot_minutes: default_slot_minutes(),
            working_days: default_working_days(),
            utc_offset_hours: default_utc_offset_hours(),
            allow_past_booking: false,
            search_horizon_days: default_search_horizon_days(),
        }
    }
}

fn default_slots() -> Vec<String> {
    [
        "08:00", "08:30", "09:00", "09:30", "10:00", "10:30", "11:00", "11:30",
        "13:00", "13:30", "14:00", "14:30", "15:00", "15:30", "16:00",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_slot_minutes() -> u32 {
    30
}

fn default_working_days() -> Vec<String> {
    ["mon", "tue", "wed", "thu", "fri"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_utc_offset_hours() -> i32 {
    -3
}

fn default_search_horizon_days() -> u32 {
    30
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    60
}

fn default_max_capacity() -> u64 {
    10_000
}

/// Data source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON snapshot loaded into the in-memory store at startup
    #[serde(default = "default_seed_path")]
    pub seed_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            seed_path: default_seed_path(),
        }
    }
}

fn default_seed_path() -> PathBuf {
    PathBuf::from("data/seed.json")
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default `tracing` filter directive, used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "cras_agenda=info".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - CRAS_AGENDA_AGENDA_SLOTS (comma separated "HH:MM" list)
    /// - CRAS_AGENDA_AGENDA_SLOT_MINUTES
    /// - CRAS_AGENDA_AGENDA_WORKING_DAYS (comma separated)
    /// - CRAS_AGENDA_AGENDA_UTC_OFFSET_HOURS
    /// - CRAS_AGENDA_AGENDA_ALLOW_PAST_BOOKING
    /// - CRAS_AGENDA_AGENDA_SEARCH_HORIZON_DAYS
    /// - CRAS_AGENDA_CACHE_TTL_SECONDS
    /// - CRAS_AGENDA_CACHE_MAX_CAPACITY
    /// - CRAS_AGENDA_DATA_SEED_PATH
    /// - CRAS_AGENDA_LOG_FILTER
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check the values serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agenda.slots.is_empty() {
            return Err(ConfigError::ValidationError(
                "agenda.slots must contain at least one slot".to_string(),
            ));
        }
        if self.agenda.slot_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "agenda.slot_minutes must be greater than zero".to_string(),
            ));
        }
        if !(-12..=14).contains(&self.agenda.utc_offset_hours) {
            return Err(ConfigError::ValidationError(format!(
                "agenda.utc_offset_hours out of range: {}",
                self.agenda.utc_offset_hours
            )));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Agenda configuration
        if let Ok(slots) = std::env::var("CRAS_AGENDA_AGENDA_SLOTS") {
            let slots = split_list(&slots);
            if !slots.is_empty() {
                self.agenda.slots = slots;
            }
        }
        if let Ok(minutes) = std::env::var("CRAS_AGENDA_AGENDA_SLOT_MINUTES") {
            if let Ok(minutes) = minutes.parse::<u32>() {
                self.agenda.slot_minutes = minutes;
            }
        }
        if let Ok(days) = std::env::var("CRAS_AGENDA_AGENDA_WORKING_DAYS") {
            let days = split_list(&days);
            if !days.is_empty() {
                self.agenda.working_days = days;
            }
        }
        if let Ok(offset) = std::env::var("CRAS_AGENDA_AGENDA_UTC_OFFSET_HOURS") {
            if let Ok(offset) = offset.parse::<i32>() {
                self.agenda.utc_offset_hours = offset;
            }
        }
        if let Ok(allow) = std::env::var("CRAS_AGENDA_AGENDA_ALLOW_PAST_BOOKING") {
            match allow.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.agenda.allow_past_booking = true,
                "false" | "0" | "no" => self.agenda.allow_past_booking = false,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(days) = std::env::var("CRAS_AGENDA_AGENDA_SEARCH_HORIZON_DAYS") {
            if let Ok(days) = days.parse::<u32>() {
                self.agenda.search_horizon_days = days;
            }
        }

        // Cache configuration
        if let Ok(ttl) = std::env::var("CRAS_AGENDA_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }
        if let Ok(capacity) = std::env::var("CRAS_AGENDA_CACHE_MAX_CAPACITY") {
            if let Ok(capacity) = capacity.parse::<u64>() {
                self.cache.max_capacity = capacity;
            }
        }

        // Data configuration
        if let Ok(path) = std::env::var("CRAS_AGENDA_DATA_SEED_PATH") {
            self.data.seed_path = PathBuf::from(path);
        }

        // Log configuration
        if let Ok(filter) = std::env::var("CRAS_AGENDA_LOG_FILTER") {
            self.log.filter = filter;
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
