//! # Configuration State
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`EMPRENDE_*`)
//! 2. Defaults (this file)
//!
//! Configuration is read-only after initialization, so no mutex is needed.

use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use emprende_core::intent::IntentParser;
use emprende_core::{payment_method, DEFAULT_MERCHANT_ID, QUANTITY_THRESHOLD};

/// Chile continental standard time.
const DEFAULT_UTC_OFFSET_HOURS: i32 = -3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: String, value: String },
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Merchant every command is scoped to.
    pub merchant_id: String,

    /// Store name (console banner)
    pub store_name: String,

    /// Database file override. `None` uses the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Spoken numbers below this are unit counts, the rest are pesos.
    pub quantity_threshold: i64,

    /// Used by `/cobrar` when no method is given.
    pub default_payment_method: String,

    /// Local offset for "today", month starts and peak-hour buckets.
    pub utc_offset_hours: i32,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            merchant_id: DEFAULT_MERCHANT_ID.to_string(),
            store_name: "Mi Emprendimiento".to_string(),
            database_path: None,
            quantity_threshold: QUANTITY_THRESHOLD,
            default_payment_method: payment_method::CASH.to_string(),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
        }
    }
}

impl ConfigState {
    /// Creates a new ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `EMPRENDE_MERCHANT_ID`
    /// - `EMPRENDE_STORE_NAME`
    /// - `EMPRENDE_DB_PATH`
    /// - `EMPRENDE_QUANTITY_THRESHOLD` (positive integer)
    /// - `EMPRENDE_DEFAULT_PAYMENT_METHOD`
    /// - `EMPRENDE_UTC_OFFSET_HOURS` (-12 to 14)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`ConfigState::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ConfigState::default();

        if let Some(merchant_id) = non_empty(lookup("EMPRENDE_MERCHANT_ID")) {
            config.merchant_id = merchant_id;
        }

        if let Some(store_name) = non_empty(lookup("EMPRENDE_STORE_NAME")) {
            config.store_name = store_name;
        }

        if let Some(path) = non_empty(lookup("EMPRENDE_DB_PATH")) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = non_empty(lookup("EMPRENDE_QUANTITY_THRESHOLD")) {
            config.quantity_threshold = raw
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid("EMPRENDE_QUANTITY_THRESHOLD", &raw))?;
        }

        if let Some(method) = non_empty(lookup("EMPRENDE_DEFAULT_PAYMENT_METHOD")) {
            config.default_payment_method = method.to_uppercase();
        }

        if let Some(raw) = non_empty(lookup("EMPRENDE_UTC_OFFSET_HOURS")) {
            config.utc_offset_hours = raw
                .parse::<i32>()
                .ok()
                .filter(|h| (-12..=14).contains(h))
                .ok_or_else(|| invalid("EMPRENDE_UTC_OFFSET_HOURS", &raw))?;
        }

        Ok(config)
    }

    /// The configured offset, or UTC if it is out of range.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    /// Parser tuned to this store's quantity threshold.
    pub fn parser(&self) -> IntentParser {
        IntentParser::new().with_quantity_threshold(self.quantity_threshold)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn invalid(var: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.to_string(),
        value: value.to_string(),
    }
}
