//! # Behavior engine
//!
//! Generates human-like pointer motion and keystroke timing, and replays them
//! against the input dispatcher.
//!
//! ## Main features
//! - **Motion paths**: randomized cubic Bezier curves with a three-phase velocity profile
//! - **Overshoot and corrections**: short-lived points around the target before settling
//! - **Typing plans**: per-character delays by key class, think pauses, typo detours
//! - **Replay**: paced dispatch with an abort check between steps
//!
//! ## Module structure
//! - `traits`: geometry, motion configuration and the `BehaviorSimulator` trait
//! - `motion`: path generation
//! - `typing`: keystroke scheduling
//! - `behavior`: simulator implementation driving an `InputDispatcher`
//!
//! ## Example
//! ```rust
//! use pacer_oxide::stealth::{PathGenerator, MouseMotionConfig, Point2D};
//!
//! let mut generator = PathGenerator::with_seed(MouseMotionConfig::default(), 7).unwrap();
//! let path = generator.generate(Point2D::new(0.0, 0.0), Point2D::new(300.0, 200.0));
//! assert_eq!(path.first().unwrap().position, Point2D::new(0.0, 0.0));
//! ```

pub mod traits;
pub mod motion;
pub mod typing;
pub mod behavior;


pub use traits::{BehaviorSimulator, MouseMotionConfig, Point2D};

pub use motion::{cubic_bezier, generate_path, MotionPath, PathGenerator, PathPoint, PointKind};
pub use typing::{
    plan_typing, KeyAction, Keystroke, KeystrokeScheduler, PastePlan, TypingPlan, TYPO_PROBABILITY,
};
pub use behavior::{
    BehaviorSimulatorImpl, ScrollStyle, IDLE_WANDER_PROBABILITY, READING_SCROLL_PROBABILITY,
};
