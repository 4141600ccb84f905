//! Behavior simulator implementation
//!
//! Replays generated motion paths and typing plans against the input
//! dispatcher, sleeping the planned durations between steps.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tokio::time::Instant;
use rand::Rng;

use super::motion::{MotionPath, PathGenerator};
use super::traits::*;
use super::typing::{KeyAction, KeystrokeScheduler, TypingPlan};
use crate::abort::AbortSignal;
use crate::input::InputDispatcher;
use crate::timing::{ActionKind, DelayPolicy, DelayProfile};
use crate::{Error, Result};

/// Chance that an idle wander actually moves the pointer
pub const IDLE_WANDER_PROBABILITY: f64 = 0.3;

/// Chance of a random scroll on each pass of a reading session
pub const READING_SCROLL_PROBABILITY: f64 = 0.7;

/// Randomized scroll patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStyle {
    /// One long scroll
    Smooth,
    /// One short scroll and a brief pause
    Partial,
    /// Down, pause, then a quarter of the way back up
    Bounce,
    /// Several short scrolls with reading pauses
    Read,
}

impl ScrollStyle {
    pub const ALL: [ScrollStyle; 4] = [
        ScrollStyle::Smooth,
        ScrollStyle::Partial,
        ScrollStyle::Bounce,
        ScrollStyle::Read,
    ];
}

/// Vertical offsets and the pause after each, drawn before any await
fn scroll_steps(style: ScrollStyle, delays: &mut DelayPolicy) -> Vec<(f64, Duration)> {
    match style {
        ScrollStyle::Smooth => {
            let dy = delays.rng().gen_range(200..600) as f64;
            vec![(dy, Duration::ZERO)]
        }
        ScrollStyle::Partial => {
            let dy = delays.rng().gen_range(50..200) as f64;
            let pause = Duration::from_millis(delays.rng().gen_range(100..400));
            vec![(dy, pause)]
        }
        ScrollStyle::Bounce => {
            let down = delays.rng().gen_range(300..500);
            let pause = Duration::from_millis(delays.rng().gen_range(200..500));
            vec![(down as f64, pause), (-((down / 4) as f64), Duration::ZERO)]
        }
        ScrollStyle::Read => {
            let count = delays.rng().gen_range(2..=5);
            (0..count)
                .map(|_| {
                    let dy = delays.rng().gen_range(100..300) as f64;
                    (dy, delays.read_pause())
                })
                .collect()
        }
    }
}

/// Behavior simulator implementation
pub struct BehaviorSimulatorImpl {
    /// Identifies this simulator in logs
    session_id: String,
    dispatcher: Arc<dyn InputDispatcher>,
    paths: Mutex<PathGenerator>,
    keys: Mutex<KeystrokeScheduler>,
    delays: Mutex<DelayPolicy>,
    abort: AbortSignal,
    random_scrolling: bool,
}

impl BehaviorSimulatorImpl {
    /// Create a behavior simulator seeded from OS entropy
    pub fn new(
        dispatcher: Arc<dyn InputDispatcher>,
        motion: MouseMotionConfig,
        profile: DelayProfile,
    ) -> Result<Self> {
        Ok(Self::assemble(
            dispatcher,
            PathGenerator::new(motion)?,
            KeystrokeScheduler::new(profile.clone())?,
            DelayPolicy::new(profile)?,
        ))
    }

    /// Create a behavior simulator whose every random draw follows `seed`
    pub fn with_seed(
        dispatcher: Arc<dyn InputDispatcher>,
        motion: MouseMotionConfig,
        profile: DelayProfile,
        seed: u64,
    ) -> Result<Self> {
        Ok(Self::assemble(
            dispatcher,
            PathGenerator::with_seed(motion, seed)?,
            KeystrokeScheduler::with_seed(profile.clone(), seed.wrapping_add(1))?,
            DelayPolicy::with_seed(profile, seed.wrapping_add(2))?,
        ))
    }

    fn assemble(
        dispatcher: Arc<dyn InputDispatcher>,
        paths: PathGenerator,
        keys: KeystrokeScheduler,
        delays: DelayPolicy,
    ) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            dispatcher,
            paths: Mutex::new(paths),
            keys: Mutex::new(keys),
            delays: Mutex::new(delays),
            abort: AbortSignal::new(),
            random_scrolling: true,
        }
    }

    /// Share an abort signal with the caller
    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    pub fn with_random_scrolling(mut self, enabled: bool) -> Self {
        self.random_scrolling = enabled;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn abort_signal(&self) -> &AbortSignal {
        &self.abort
    }

    fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
        mutex
            .lock()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))
    }

    /// Dispatch every point after the first; the pointer already sits there
    async fn follow(&self, path: &MotionPath) -> Result<()> {
        for point in path.points().iter().skip(1) {
            self.abort.check()?;
            self.dispatcher
                .move_pointer(point.position.x, point.position.y, point.steps)
                .await?;
            if !point.dwell.is_zero() {
                tokio::time::sleep(point.dwell).await;
            }
        }
        Ok(())
    }

    async fn execute_plan(&self, plan: &TypingPlan) -> Result<()> {
        for keystroke in plan.keystrokes() {
            self.abort.check()?;
            match keystroke.action {
                KeyAction::Type(c) | KeyAction::Typo(c) => self.dispatcher.send_char(c).await?,
                KeyAction::Backspace => self.dispatcher.delete_previous().await?,
            }
            tokio::time::sleep(keystroke.delay).await;
        }
        Ok(())
    }

    /// Run one scroll pattern
    pub async fn scroll_with(&self, style: ScrollStyle) -> Result<()> {
        let steps = scroll_steps(style, &mut *Self::lock(&self.delays)?);
        tracing::debug!(session = %self.session_id, ?style, steps = steps.len(), "scrolling");

        for (dy, pause) in steps {
            self.abort.check()?;
            self.dispatcher.scroll_by(0.0, dy).await?;
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }
        Ok(())
    }

    /// Linger on the page for `duration`, scrolling now and then.
    ///
    /// Each pass may run a random scroll, then pauses 2-7 s. The last pause is
    /// cut short at the deadline; a scroll already under way finishes.
    pub async fn simulate_reading(&self, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        tracing::debug!(session = %self.session_id, ?duration, "reading");

        while Instant::now() < deadline {
            self.abort.check()?;
            let scroll = Self::lock(&self.delays)?
                .rng()
                .gen_bool(READING_SCROLL_PROBABILITY);
            if scroll {
                self.random_scroll().await?;
            }

            let pause = Self::lock(&self.delays)?.reading_pause();
            let left = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(pause.min(left)).await;
        }
        Ok(())
    }

    /// Think first, then type
    pub async fn type_after_thinking(&self, text: &str) -> Result<()> {
        let think = Self::lock(&self.delays)?.think_delay();
        tokio::time::sleep(think).await;
        self.type_text(text).await
    }
}

#[async_trait]
impl BehaviorSimulator for BehaviorSimulatorImpl {
    async fn move_to(&self, from: Point2D, to: Point2D) -> Result<Point2D> {
        let path = Self::lock(&self.paths)?.generate(from, to);
        tracing::debug!(
            session = %self.session_id,
            points = path.len(),
            "moving pointer from ({:.1}, {:.1}) to ({:.1}, {:.1})",
            from.x, from.y, to.x, to.y
        );

        self.follow(&path).await?;
        Ok(path.last().map(|p| p.position).unwrap_or(to))
    }

    async fn hover(&self, from: Point2D, target: Point2D) -> Result<Point2D> {
        let at = self.move_to(from, target).await?;
        let linger = Self::lock(&self.delays)?.hover_delay();
        tokio::time::sleep(linger).await;
        Ok(at)
    }

    async fn click(&self, from: Point2D, target: Point2D) -> Result<Point2D> {
        let at = self.move_to(from, target).await?;
        let (think, hold) = {
            let mut delays = Self::lock(&self.delays)?;
            (delays.pre_click_delay(), delays.click_hold())
        };

        tokio::time::sleep(think).await;
        self.abort.check()?;
        self.dispatcher.mouse_down().await?;
        tokio::time::sleep(hold).await;
        self.dispatcher.mouse_up().await?;
        Ok(at)
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        let plan = Self::lock(&self.keys)?.plan(text);
        tracing::debug!(
            session = %self.session_id,
            keystrokes = plan.len(),
            corrected = plan.has_correction(),
            "typing"
        );
        self.execute_plan(&plan).await
    }

    async fn paste_text(&self, text: &str) -> Result<()> {
        let plan = Self::lock(&self.keys)?.plan_paste(text);
        tokio::time::sleep(plan.lead_in).await;

        for chunk in &plan.chunks {
            self.abort.check()?;
            self.dispatcher.insert_text(&chunk.text).await?;
            if !chunk.delay.is_zero() {
                tokio::time::sleep(chunk.delay).await;
            }
        }
        Ok(())
    }

    async fn idle_wander(&self, from: Point2D) -> Result<Point2D> {
        let wander = Self::lock(&self.delays)?.rng().gen_bool(IDLE_WANDER_PROBABILITY);
        if !wander {
            return Ok(from);
        }

        let viewport = self.dispatcher.viewport().await?;
        let target = {
            let mut delays = Self::lock(&self.delays)?;
            let rng = delays.rng();
            Point2D::new(
                rng.gen_range(viewport.width * 0.2..=viewport.width * 0.8),
                rng.gen_range(viewport.height * 0.2..=viewport.height * 0.8),
            )
        };
        self.move_to(from, target).await
    }

    async fn random_scroll(&self) -> Result<()> {
        if !self.random_scrolling {
            return Ok(());
        }
        let style = *ScrollStyle::ALL
            .choose(Self::lock(&self.delays)?.rng())
            .unwrap_or(&ScrollStyle::Smooth);
        self.scroll_with(style).await
    }

    async fn pause(&self, kind: ActionKind) -> Result<()> {
        let delay = Self::lock(&self.delays)?.humanized_delay(kind);
        tracing::trace!(session = %self.session_id, kind = kind.as_str(), ?delay, "pausing");
        tokio::time::sleep(delay).await;
        Ok(())
    }
}
