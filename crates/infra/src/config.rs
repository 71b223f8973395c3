//! Ledger configuration.
//!
//! Loaded from the environment (a `.env` file is honoured through `dotenvy`)
//! or built in code; every field has a default.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use folio_accounting::{BalanceMode, ValidationPolicy};
use folio_core::Currency;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Currency used for balances of accounts without a fixed currency.
    pub base_currency: Currency,
    pub balance_mode: BalanceMode,
    /// When false, soft-closed periods are informational only.
    pub soft_close_blocks_posting: bool,
    pub allow_reversal_of_reversal: bool,
    /// JSON-lines journal location; `None` keeps the journal in memory.
    pub event_log_path: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_currency: Currency::new("USD").expect("USD is a valid currency code"),
            balance_mode: BalanceMode::PerCurrency,
            soft_close_blocks_posting: false,
            allow_reversal_of_reversal: false,
            event_log_path: None,
        }
    }
}

impl LedgerConfig {
    /// Load configuration from `FOLIO_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = var("FOLIO_BASE_CURRENCY") {
            config.base_currency = Currency::new(&raw).map_err(|e| ConfigError::InvalidValue {
                var: "FOLIO_BASE_CURRENCY",
                reason: e.to_string(),
            })?;
        }

        if let Some(raw) = var("FOLIO_BALANCE_MODE") {
            config.balance_mode = match raw.trim().to_ascii_lowercase().as_str() {
                "per_currency" => BalanceMode::PerCurrency,
                "combined" => BalanceMode::Combined,
                other => {
                    return Err(ConfigError::InvalidValue {
                        var: "FOLIO_BALANCE_MODE",
                        reason: format!("expected 'per_currency' or 'combined', got '{other}'"),
                    });
                }
            };
        }

        if let Some(raw) = var("FOLIO_SOFT_CLOSE_BLOCKS") {
            config.soft_close_blocks_posting = parse_bool("FOLIO_SOFT_CLOSE_BLOCKS", &raw)?;
        }

        if let Some(raw) = var("FOLIO_ALLOW_REVERSAL_OF_REVERSAL") {
            config.allow_reversal_of_reversal =
                parse_bool("FOLIO_ALLOW_REVERSAL_OF_REVERSAL", &raw)?;
        }

        config.event_log_path = var("FOLIO_EVENT_LOG_PATH").map(PathBuf::from);

        Ok(config)
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            balance_mode: self.balance_mode,
            soft_close_blocks_posting: self.soft_close_blocks_posting,
        }
    }
}

fn var(name: &str) -> Option<String> {
    dotenvy::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            var,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = LedgerConfig::default();
        assert_eq!(config.base_currency.as_str(), "USD");
        assert_eq!(config.balance_mode, BalanceMode::PerCurrency);
        assert!(!config.soft_close_blocks_posting);
        assert!(!config.allow_reversal_of_reversal);
        assert!(config.event_log_path.is_none());
    }

    #[test]
    fn booleans_accept_common_spellings() {
        assert!(parse_bool("X", "Yes").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"base_currency":"EUR","balance_mode":"combined"}"#).unwrap();
        assert_eq!(config.base_currency.as_str(), "EUR");
        assert_eq!(config.balance_mode, BalanceMode::Combined);
        assert!(!config.allow_reversal_of_reversal);
    }
}
