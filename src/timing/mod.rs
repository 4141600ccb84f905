//! # Timing
//!
//! Randomized durations, business-hour windows and deadline polling.
//!
//! ## Module structure
//! - `delay`: delay policy and action kinds
//! - `window`: business window predicate and forward scan
//! - `clock`: injectable wall-clock sources
//! - `wait`: deadline-bounded condition polling
//!
//! ## Example
//! ```rust
//! use pacer_oxide::timing::{DelayPolicy, DelayProfile, ActionKind};
//!
//! let mut policy = DelayPolicy::with_seed(DelayProfile::default(), 42).unwrap();
//! let pause = policy.humanized_delay(ActionKind::Click);
//! assert!(pause.as_millis() <= 420);
//! ```

pub mod delay;
pub mod window;
pub mod clock;
pub mod wait;

pub use delay::{backoff_floor, ActionKind, DelayPolicy, DelayProfile};
pub use window::{BusinessWindow, SCAN_LIMIT_HOURS};
pub use clock::{Clock, FixedClock, SystemClock};
pub use wait::{wait_for_condition, POLL_INTERVAL};
