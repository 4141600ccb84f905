//! Pacer-Oxide: human-behavior emulation and quota engine
//!
//! This library paces a browser-automation agent: pointer paths, keystroke
//! timing, semantic delays and a persisted admission controller.

pub mod error;
pub mod config;

pub mod abort;
pub mod input;
pub mod limits;
pub mod stealth;
pub mod timing;

// Re-exports
pub use error::{Error, Result};
pub use abort::AbortSignal;

/// Pacer-Oxide library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
