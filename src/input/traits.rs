//! Input dispatch traits
//!
//! The browser driving layer implements [`InputDispatcher`]; the behavior
//! engine only ever talks to it through this interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Visible viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

/// Low-level input dispatch collaborator
#[async_trait]
pub trait InputDispatcher: Send + Sync + std::fmt::Debug {
    /// Move the pointer to `(x, y)` interpolating over `steps` events
    async fn move_pointer(&self, x: f64, y: f64, steps: u32) -> Result<(), crate::Error>;

    /// Press the primary button at the current pointer position
    async fn mouse_down(&self) -> Result<(), crate::Error>;

    /// Release the primary button
    async fn mouse_up(&self) -> Result<(), crate::Error>;

    /// Send one character to the focused input
    async fn send_char(&self, ch: char) -> Result<(), crate::Error>;

    /// Delete the character before the caret
    async fn delete_previous(&self) -> Result<(), crate::Error>;

    /// Insert a run of text at once
    async fn insert_text(&self, text: &str) -> Result<(), crate::Error>;

    /// Current viewport dimensions
    async fn viewport(&self) -> Result<Viewport, crate::Error>;

    /// Scroll by a relative offset
    async fn scroll_by(&self, dx: f64, dy: f64) -> Result<(), crate::Error>;
}
