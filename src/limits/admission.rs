//! Admission controller
//!
//! Gates rate-limited actions on today's persisted counters, an optional
//! rolling hourly cap and the business window, then paces admitted actions
//! with a progressive cooldown.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::store::{date_key, ActionCounter, CounterStore, KindCounter, QuotaKind, QuotaLimits};
use crate::timing::{BusinessWindow, Clock, DelayPolicy, SystemClock};
use crate::{Error, Result};

/// Combined sent count above which the cooldown doubles
pub const COOLDOWN_THRESHOLD: u32 = 30;

/// Span of the rolling hourly cap
const HOURLY_SPAN_MINUTES: i64 = 60;

/// Per-kind figures in a [`QuotaStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KindStatus {
    pub kind: QuotaKind,
    pub sent: u32,
    /// Limit in force: the lower of the stored and configured limits
    pub limit: u32,
    /// Limit recorded when the day's row was created
    pub stored_limit: u32,
    pub remaining: u32,
    /// Completions recorded by this process in the last hour
    pub last_hour: u32,
}

/// Snapshot of today's quota state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    pub date: String,
    pub kinds: Vec<KindStatus>,
    pub window_open: bool,
    pub business_hours_only: bool,
}

impl QuotaStatus {
    pub fn kind(&self, kind: QuotaKind) -> Option<&KindStatus> {
        self.kinds.iter().find(|k| k.kind == kind)
    }

    /// Compact JSON for log lines
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Quota and time-of-day gate for rate-limited actions
#[derive(Debug)]
pub struct AdmissionController {
    store: Arc<dyn CounterStore>,
    limits: QuotaLimits,
    business_hours_only: bool,
    window: BusinessWindow,
    clock: Arc<dyn Clock>,
    delays: Mutex<DelayPolicy>,
    recent: Mutex<HashMap<QuotaKind, VecDeque<NaiveDateTime>>>,
}

impl AdmissionController {
    pub fn new(store: Arc<dyn CounterStore>, limits: QuotaLimits, delays: DelayPolicy) -> Result<Self> {
        limits.validate()?;
        Ok(Self {
            store,
            limits,
            business_hours_only: false,
            window: BusinessWindow::default(),
            clock: Arc::new(SystemClock),
            delays: Mutex::new(delays),
            recent: Mutex::new(HashMap::new()),
        })
    }

    /// Refuse actions outside the business window
    pub fn with_business_hours(mut self, only: bool) -> Self {
        self.business_hours_only = only;
        self
    }

    pub fn with_window(mut self, window: BusinessWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn limits(&self) -> &QuotaLimits {
        &self.limits
    }

    /// Whether an action of `kind` may start now.
    ///
    /// A reached quota yields `Ok(false)`; only store failures are errors.
    pub async fn can_perform(&self, kind: QuotaKind) -> Result<bool> {
        let now = self.clock.now();
        let counter = self.today(kind, now).await?;

        if counter.exhausted() {
            warn!(
                "Daily {} limit reached ({}/{})",
                kind, counter.sent, counter.limit
            );
            return Ok(false);
        }

        if let Some(cap) = self.limits.hourly(kind) {
            let last_hour = self.last_hour(kind, now)?;
            if last_hour >= cap {
                warn!("Hourly {} limit reached ({}/{})", kind, last_hour, cap);
                return Ok(false);
            }
        }

        if self.business_hours_only && !self.window.contains(&now) {
            info!("Outside business hours, {} deferred", kind);
            return Ok(false);
        }

        debug!("{} admitted ({}/{})", kind, counter.sent, counter.limit);
        Ok(true)
    }

    /// Actions of `kind` still allowed today
    pub async fn remaining_quota(&self, kind: QuotaKind) -> Result<u32> {
        let now = self.clock.now();
        Ok(self.today(kind, now).await?.remaining())
    }

    /// Count one finished action of `kind` against today's quota
    pub async fn record_completion(&self, kind: QuotaKind) -> Result<ActionCounter> {
        let now = self.clock.now();
        let date = date_key(now.date());
        let row = self.store.upsert_increment(&date, kind, &self.limits).await?;

        {
            let mut recent = self.recent()?;
            let entries = recent.entry(kind).or_default();
            entries.push_back(now);
            prune(entries, now);
        }

        let counter = row.get(kind);
        info!(
            "Recorded {} on {} ({}/{})",
            kind, date, counter.sent, counter.limit
        );
        Ok(row)
    }

    /// Pause owed before the next action, doubled past [`COOLDOWN_THRESHOLD`]
    pub async fn cooldown(&self) -> Result<Duration> {
        let base = self.base_cooldown()?;
        let date = date_key(self.clock.now().date());
        let total = match self.store.get_counter_row(&date).await? {
            Some(row) => row.total_sent(),
            None => 0,
        };

        if total > COOLDOWN_THRESHOLD {
            debug!(
                "{} actions today, cooldown doubled to {:?}",
                total,
                base * 2
            );
            return Ok(base * 2);
        }
        Ok(base)
    }

    /// Sleep the cooldown after an action of `kind`. Returns the time slept.
    pub async fn enforce_delay(&self, kind: QuotaKind) -> Result<Duration> {
        let delay = match self.cooldown().await {
            Ok(delay) => delay,
            Err(e) => {
                warn!("Cooldown lookup failed, using base delay: {}", e);
                self.base_cooldown()?
            }
        };
        debug!("Cooling down {:?} after {}", delay, kind);
        tokio::time::sleep(delay).await;
        Ok(delay)
    }

    /// Earliest instant the next action should start
    pub fn next_allowed_window(&self) -> Result<NaiveDateTime> {
        let now = self.clock.now();
        if self.business_hours_only && !self.window.contains(&now) {
            return Ok(self.window.next_open(now));
        }
        let gap = self.delays()?.between_actions_delay();
        Ok(now + to_chrono(gap))
    }

    /// Time until actions may resume once today's quota is spent.
    ///
    /// Outside business hours this is the next open instant, otherwise the
    /// coming midnight.
    pub fn wait_until_next_window(&self) -> Duration {
        let now = self.clock.now();
        let resume = if self.business_hours_only && !self.window.contains(&now) {
            self.window.next_open(now)
        } else {
            match now.date().succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)) {
                Some(midnight) => midnight,
                None => now,
            }
        };
        (resume - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Today's figures for every kind
    pub async fn status(&self) -> Result<QuotaStatus> {
        let now = self.clock.now();
        let date = date_key(now.date());
        let row = self
            .store
            .get_counter_row(&date)
            .await?
            .unwrap_or_else(|| ActionCounter::fresh(&date, &self.limits));

        let mut kinds = Vec::with_capacity(QuotaKind::ALL.len());
        for kind in QuotaKind::ALL {
            let counter = self.effective(row.get(kind), kind);
            kinds.push(KindStatus {
                kind,
                sent: counter.sent,
                limit: counter.limit,
                stored_limit: row.get(kind).limit,
                remaining: counter.remaining(),
                last_hour: self.last_hour(kind, now)?,
            });
        }

        Ok(QuotaStatus {
            date,
            kinds,
            window_open: self.window.contains(&now),
            business_hours_only: self.business_hours_only,
        })
    }

    async fn today(&self, kind: QuotaKind, now: NaiveDateTime) -> Result<KindCounter> {
        let date = date_key(now.date());
        let counter = match self.store.get_counter_row(&date).await? {
            Some(row) => self.effective(row.get(kind), kind),
            None => KindCounter {
                sent: 0,
                limit: self.limits.daily(kind),
            },
        };
        Ok(counter)
    }

    /// Gate on the tighter of the stored and configured limits, so a limit
    /// lowered mid-day applies at once
    fn effective(&self, stored: KindCounter, kind: QuotaKind) -> KindCounter {
        KindCounter {
            sent: stored.sent,
            limit: stored.limit.min(self.limits.daily(kind)),
        }
    }

    fn last_hour(&self, kind: QuotaKind, now: NaiveDateTime) -> Result<u32> {
        let mut recent = self.recent()?;
        Ok(match recent.get_mut(&kind) {
            Some(entries) => {
                prune(entries, now);
                entries.len() as u32
            }
            None => 0,
        })
    }

    fn base_cooldown(&self) -> Result<Duration> {
        Ok(Duration::from_secs(self.delays()?.profile().between_actions_secs))
    }

    fn delays(&self) -> Result<std::sync::MutexGuard<'_, DelayPolicy>> {
        self.delays
            .lock()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))
    }

    fn recent(&self) -> Result<std::sync::MutexGuard<'_, HashMap<QuotaKind, VecDeque<NaiveDateTime>>>> {
        self.recent
            .lock()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))
    }
}

fn prune(entries: &mut VecDeque<NaiveDateTime>, now: NaiveDateTime) {
    let cutoff = now - ChronoDuration::minutes(HOURLY_SPAN_MINUTES);
    while entries.front().is_some_and(|at| *at <= cutoff) {
        entries.pop_front();
    }
}

fn to_chrono(d: Duration) -> ChronoDuration {
    ChronoDuration::milliseconds(d.as_millis().min(i64::MAX as u128) as i64)
}
