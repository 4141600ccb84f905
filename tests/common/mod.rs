//! Common test utilities
//!
//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use pacer_oxide::limits::{AdmissionController, CounterStore, QuotaLimits};
use pacer_oxide::timing::{DelayPolicy, DelayProfile, FixedClock};
use std::sync::Arc;

/// Local date-time shorthand
pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// Tuesday 2024-06-04, inside default business hours
pub fn tuesday_morning() -> NaiveDateTime {
    at(2024, 6, 4, 9, 15)
}

/// Profile with short cooldowns so paused-time tests stay readable
pub fn quick_profile() -> DelayProfile {
    DelayProfile {
        between_actions_secs: 5,
        ..Default::default()
    }
}

/// Controller over `store` pinned to `clock`
pub fn controller(
    store: Arc<dyn CounterStore>,
    limits: QuotaLimits,
    clock: Arc<FixedClock>,
) -> AdmissionController {
    let delays = DelayPolicy::with_seed(quick_profile(), 7).unwrap();
    AdmissionController::new(store, limits, delays)
        .unwrap()
        .with_clock(clock)
}
