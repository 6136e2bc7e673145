//! Consignment aging buckets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsignmentAge {
    Recent,
    Attention,
    Overdue,
}

/// Day thresholds for classifying outstanding consignment stock.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingPolicy {
    pub attention_after_days: i64,
    pub overdue_after_days: i64,
}

impl Default for AgingPolicy {
    fn default() -> Self {
        Self {
            attention_after_days: 15,
            overdue_after_days: 30,
        }
    }
}

impl AgingPolicy {
    pub fn new(attention_after_days: i64, overdue_after_days: i64) -> DomainResult<Self> {
        if attention_after_days < 0 || overdue_after_days <= attention_after_days {
            return Err(DomainError::validation(format!(
                "aging thresholds must satisfy 0 <= attention ({attention_after_days}) < overdue ({overdue_after_days})"
            )));
        }
        Ok(Self {
            attention_after_days,
            overdue_after_days,
        })
    }

    /// Whole days elapsed since `since` (never negative).
    pub fn age_days(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        (now - since).num_days().max(0)
    }

    pub fn classify(&self, age_days: i64) -> ConsignmentAge {
        if age_days <= self.attention_after_days {
            ConsignmentAge::Recent
        } else if age_days <= self.overdue_after_days {
            ConsignmentAge::Attention
        } else {
            ConsignmentAge::Overdue
        }
    }
}
