//! Ledger configuration.

use serde::{Deserialize, Serialize};
use tracing::warn;

use stockledger_consignment::AgingPolicy;
use stockledger_core::{DomainError, DomainResult};

pub const ENV_MAX_CONFLICT_RETRIES: &str = "STOCKLEDGER_MAX_CONFLICT_RETRIES";
pub const ENV_KPI_WINDOW_DAYS: &str = "STOCKLEDGER_KPI_WINDOW_DAYS";
pub const ENV_CONSIGNMENT_ATTENTION_DAYS: &str = "STOCKLEDGER_CONSIGNMENT_ATTENTION_DAYS";
pub const ENV_CONSIGNMENT_OVERDUE_DAYS: &str = "STOCKLEDGER_CONSIGNMENT_OVERDUE_DAYS";

/// Upper bound for `kpi_window_days` (one hundred years).
pub const MAX_KPI_WINDOW_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Extra attempts after a conflicting commit before giving up.
    pub max_conflict_retries: u32,
    /// Trailing window for dashboard KPIs.
    pub kpi_window_days: i64,
    pub consignment_attention_days: i64,
    pub consignment_overdue_days: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            kpi_window_days: 30,
            consignment_attention_days: 15,
            consignment_overdue_days: 30,
        }
    }
}

impl LedgerConfig {
    /// Read overrides from `STOCKLEDGER_*` environment variables.
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparsable values fall back to the
    /// default with a warning.
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            max_conflict_retries: read(&lookup, ENV_MAX_CONFLICT_RETRIES, defaults.max_conflict_retries),
            kpi_window_days: read(&lookup, ENV_KPI_WINDOW_DAYS, defaults.kpi_window_days),
            consignment_attention_days: read(
                &lookup,
                ENV_CONSIGNMENT_ATTENTION_DAYS,
                defaults.consignment_attention_days,
            ),
            consignment_overdue_days: read(
                &lookup,
                ENV_CONSIGNMENT_OVERDUE_DAYS,
                defaults.consignment_overdue_days,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if !(1..=MAX_KPI_WINDOW_DAYS).contains(&self.kpi_window_days) {
            return Err(DomainError::validation(format!(
                "kpi window must be between 1 and {MAX_KPI_WINDOW_DAYS} days (got {})",
                self.kpi_window_days
            )));
        }
        self.aging_policy().map(|_| ())
    }

    pub fn aging_policy(&self) -> DomainResult<AgingPolicy> {
        AgingPolicy::new(self.consignment_attention_days, self.consignment_overdue_days)
    }
}

fn read<F, T>(lookup: &F, key: &'static str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, default = %default, "ignoring unparsable config value");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = LedgerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = LedgerConfig::from_lookup(lookup(&[
            (ENV_MAX_CONFLICT_RETRIES, "7"),
            (ENV_CONSIGNMENT_ATTENTION_DAYS, " 10 "),
        ]))
        .unwrap();
        assert_eq!(config.max_conflict_retries, 7);
        assert_eq!(config.consignment_attention_days, 10);
        assert_eq!(config.kpi_window_days, 30);
    }

    #[test]
    fn garbage_falls_back_to_default() {
        let config = LedgerConfig::from_lookup(lookup(&[(ENV_KPI_WINDOW_DAYS, "thirty")])).unwrap();
        assert_eq!(config.kpi_window_days, 30);
    }

    #[test]
    fn kpi_window_is_bounded() {
        let err = LedgerConfig::from_lookup(lookup(&[(ENV_KPI_WINDOW_DAYS, "100000000000")]))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let max = MAX_KPI_WINDOW_DAYS.to_string();
        let config = LedgerConfig::from_lookup(lookup(&[(ENV_KPI_WINDOW_DAYS, max.as_str())])).unwrap();
        assert_eq!(config.kpi_window_days, MAX_KPI_WINDOW_DAYS);

        assert!(LedgerConfig::from_lookup(lookup(&[(ENV_KPI_WINDOW_DAYS, "0")])).is_err());
    }

    #[test]
    fn overdue_must_exceed_attention() {
        let err = LedgerConfig::from_lookup(lookup(&[
            (ENV_CONSIGNMENT_ATTENTION_DAYS, "30"),
            (ENV_CONSIGNMENT_OVERDUE_DAYS, "20"),
        ]));
        assert!(err.is_err());
    }

    #[test]
    fn deserializes_partial_json() {
        let config: LedgerConfig = serde_json::from_str(r#"{"kpi_window_days": 7}"#).unwrap();
        assert_eq!(config.kpi_window_days, 7);
        assert_eq!(config.max_conflict_retries, 3);
    }
}
