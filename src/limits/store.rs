//! Counter store contract
//!
//! Daily action counters are persisted by an external store keyed by ISO
//! calendar date. A new day is a new row; past rows are never touched.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Action kinds with a persisted daily quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    Connection,
    Message,
}

impl QuotaKind {
    pub const ALL: [QuotaKind; 2] = [QuotaKind::Connection, QuotaKind::Message];

    pub const fn as_str(self) -> &'static str {
        match self {
            QuotaKind::Connection => "connection",
            QuotaKind::Message => "message",
        }
    }
}

impl std::fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured quotas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaLimits {
    pub daily_connections: u32,
    pub daily_messages: u32,
    /// Rolling one-hour cap on connections, unset to disable
    pub hourly_connections: Option<u32>,
    /// Rolling one-hour cap on messages, unset to disable
    pub hourly_messages: Option<u32>,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            daily_connections: 50,
            daily_messages: 30,
            hourly_connections: None,
            hourly_messages: None,
        }
    }
}

impl QuotaLimits {
    pub fn daily(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::Connection => self.daily_connections,
            QuotaKind::Message => self.daily_messages,
        }
    }

    pub fn hourly(&self, kind: QuotaKind) -> Option<u32> {
        match kind {
            QuotaKind::Connection => self.hourly_connections,
            QuotaKind::Message => self.hourly_messages,
        }
    }

    /// Every limit must be positive
    pub fn validate(&self) -> Result<()> {
        for kind in QuotaKind::ALL {
            if self.daily(kind) == 0 {
                return Err(Error::configuration(format!(
                    "daily {} limit must be greater than 0",
                    kind
                )));
            }
            if self.hourly(kind) == Some(0) {
                return Err(Error::configuration(format!(
                    "hourly {} limit must be greater than 0",
                    kind
                )));
            }
        }
        Ok(())
    }
}

/// Sent count and limit of one kind on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KindCounter {
    pub sent: u32,
    pub limit: u32,
}

impl KindCounter {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.sent)
    }

    pub fn exhausted(&self) -> bool {
        self.sent >= self.limit
    }
}

/// Persisted counter row for one calendar date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounter {
    /// ISO calendar date, `YYYY-MM-DD`
    pub date: String,
    pub connection: KindCounter,
    pub message: KindCounter,
}

impl ActionCounter {
    /// Row as it looks before the first action of the day
    pub fn fresh(date: &str, limits: &QuotaLimits) -> Self {
        Self {
            date: date.to_string(),
            connection: KindCounter {
                sent: 0,
                limit: limits.daily_connections,
            },
            message: KindCounter {
                sent: 0,
                limit: limits.daily_messages,
            },
        }
    }

    pub fn get(&self, kind: QuotaKind) -> KindCounter {
        match kind {
            QuotaKind::Connection => self.connection,
            QuotaKind::Message => self.message,
        }
    }

    pub fn get_mut(&mut self, kind: QuotaKind) -> &mut KindCounter {
        match kind {
            QuotaKind::Connection => &mut self.connection,
            QuotaKind::Message => &mut self.message,
        }
    }

    /// Combined sent count across every kind
    pub fn total_sent(&self) -> u32 {
        QuotaKind::ALL.iter().map(|k| self.get(*k).sent).sum()
    }
}

/// ISO date key used by every store
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Persisted daily counter store
///
/// `upsert_increment` must behave as one atomic read-modify-write: two
/// concurrent increments on the same row both land.
#[async_trait]
pub trait CounterStore: Send + Sync + std::fmt::Debug {
    /// Row for `date`, if any action was recorded that day
    async fn get_counter_row(&self, date: &str) -> Result<Option<ActionCounter>>;

    /// Add one to `kind` on `date`, creating the row from `limits` when absent.
    /// Returns the row after the increment.
    async fn upsert_increment(
        &self,
        date: &str,
        kind: QuotaKind,
        limits: &QuotaLimits,
    ) -> Result<ActionCounter>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_key_format() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(date_key(date), "2024-01-05");
    }

    #[test]
    fn test_fresh_row_uses_configured_limits() {
        let row = ActionCounter::fresh("2024-01-05", &QuotaLimits::default());
        assert_eq!(row.get(QuotaKind::Connection), KindCounter { sent: 0, limit: 50 });
        assert_eq!(row.get(QuotaKind::Message), KindCounter { sent: 0, limit: 30 });
        assert_eq!(row.total_sent(), 0);
    }

    #[test]
    fn test_remaining_saturates() {
        let counter = KindCounter { sent: 55, limit: 50 };
        assert_eq!(counter.remaining(), 0);
        assert!(counter.exhausted());
    }

    #[test]
    fn test_limits_validation() {
        assert!(QuotaLimits::default().validate().is_ok());

        let limits = QuotaLimits {
            daily_connections: 0,
            ..Default::default()
        };
        assert!(matches!(limits.validate(), Err(Error::Configuration(_))));

        let limits = QuotaLimits {
            hourly_messages: Some(0),
            ..Default::default()
        };
        assert!(limits.validate().is_err());
    }
}
