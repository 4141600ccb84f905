//! # Limits
//!
//! Persisted daily quotas and admission control.
//!
//! ## Module structure
//! - `store`: counter rows, quota limits and the `CounterStore` trait
//! - `memory`: in-process store
//! - `sqlite`: SQLite-backed store
//! - `admission`: quota, hourly cap and business-window gate with cooldowns
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use pacer_oxide::limits::{AdmissionController, MemoryCounterStore, QuotaKind, QuotaLimits};
//! use pacer_oxide::timing::{DelayPolicy, DelayProfile};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let store = Arc::new(MemoryCounterStore::new());
//!     let delays = DelayPolicy::with_seed(DelayProfile::default(), 1).unwrap();
//!     let controller = AdmissionController::new(store, QuotaLimits::default(), delays).unwrap();
//!
//!     assert!(controller.can_perform(QuotaKind::Message).await.unwrap());
//!     controller.record_completion(QuotaKind::Message).await.unwrap();
//!     assert_eq!(controller.remaining_quota(QuotaKind::Message).await.unwrap(), 29);
//! });
//! ```

pub mod store;
pub mod memory;
pub mod sqlite;
pub mod admission;


pub use store::{date_key, ActionCounter, CounterStore, KindCounter, QuotaKind, QuotaLimits};
pub use memory::MemoryCounterStore;
pub use sqlite::SqliteCounterStore;
pub use admission::{AdmissionController, KindStatus, QuotaStatus, COOLDOWN_THRESHOLD};
