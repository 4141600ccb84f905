//! Behavior engine traits
//!
//! This module defines the shared geometry types, the mouse motion
//! configuration and the abstract interface for human-like input simulation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::timing::ActionKind;
use crate::{Error, Result};

// ============================================================================
// Geometry
// ============================================================================

/// Planar coordinate in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`
    pub fn distance(&self, other: &Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation towards `other`
    pub fn lerp(&self, other: &Point2D, t: f64) -> Point2D {
        Point2D::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point2D {
        Point2D::new(self.x + dx, self.y + dy)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Point2D::new(x, y)
    }
}

// ============================================================================
// Mouse motion configuration
// ============================================================================

/// Mouse motion toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MouseMotionConfig {
    /// Humanized motion at all; when off the pointer jumps straight to the target
    pub enabled: bool,
    /// Follow a randomized cubic Bezier curve
    #[serde(alias = "bezier_curves")]
    pub use_curve: bool,
    /// Briefly pass the target before settling
    #[serde(alias = "overshoot")]
    pub allow_overshoot: bool,
    /// Small adjustments around the target before settling
    #[serde(alias = "micro_corrections")]
    pub allow_micro_corrections: bool,
    /// Relative velocity perturbation, in `[0, 1)`
    pub velocity_variance: f64,
}

impl Default for MouseMotionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_curve: true,
            allow_overshoot: true,
            allow_micro_corrections: true,
            velocity_variance: 0.3,
        }
    }
}

impl MouseMotionConfig {
    /// Straight-line motion with no embellishments
    pub fn direct() -> Self {
        Self {
            enabled: true,
            use_curve: false,
            allow_overshoot: false,
            allow_micro_corrections: false,
            velocity_variance: 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.velocity_variance) {
            return Err(Error::configuration(format!(
                "velocity_variance must be in [0, 1), got {}",
                self.velocity_variance
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Behavior Simulator
// ============================================================================

/// Behavior simulator trait
///
/// Drives the input dispatcher with human-like pacing. The caller owns the
/// pointer position: every pointer operation takes the current position and
/// returns where the pointer ended up.
#[async_trait]
pub trait BehaviorSimulator: Send + Sync {
    /// Move the pointer from `from` to `to` along a generated path
    async fn move_to(&self, from: Point2D, to: Point2D) -> Result<Point2D>;

    /// Move onto `target` and linger
    async fn hover(&self, from: Point2D, target: Point2D) -> Result<Point2D>;

    /// Move onto `target`, hesitate, then press and release the button
    async fn click(&self, from: Point2D, target: Point2D) -> Result<Point2D>;

    /// Type `text` into the focused input keystroke by keystroke
    async fn type_text(&self, text: &str) -> Result<()>;

    /// Insert `text` in a few chunks, the way a paste followed by edits looks
    async fn paste_text(&self, text: &str) -> Result<()>;

    /// Occasionally drift the pointer somewhere inside the viewport
    async fn idle_wander(&self, from: Point2D) -> Result<Point2D>;

    /// Scroll using one of the randomized scroll styles
    async fn random_scroll(&self) -> Result<()>;

    /// Sleep the humanized delay for `kind`
    async fn pause(&self, kind: ActionKind) -> Result<()>;
}
