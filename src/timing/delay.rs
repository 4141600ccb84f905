//! Delay policy implementation
//!
//! Produces randomized durations for semantic actions and retry backoff.
//! Nothing here sleeps; callers decide when to suspend.

use std::str::FromStr;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Upper bound (exclusive) of the millisecond jitter added to coarse delays
const JITTER_MS: u64 = 1000;

/// Relative jitter applied to the between-actions base
const BETWEEN_ACTIONS_JITTER: f64 = 0.2;

/// Relative jitter applied to humanized action delays
const HUMANIZED_JITTER: f64 = 0.4;

/// Timing bounds shared by the delay policy and the keystroke scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayProfile {
    /// Lower bound of the coarse random delay, in seconds
    pub min_delay_secs: u64,
    /// Upper bound of the coarse random delay, in seconds
    pub max_delay_secs: u64,
    /// Base pause between two admitted actions, in seconds
    pub between_actions_secs: u64,
    /// Lower bound of a single keystroke delay, in milliseconds
    pub typing_min_ms: u64,
    /// Upper bound of a single keystroke delay, in milliseconds
    pub typing_max_ms: u64,
    /// Lower bound of a think pause, in milliseconds
    pub think_min_ms: u64,
    /// Upper bound of a think pause, in milliseconds
    pub think_max_ms: u64,
}

impl Default for DelayProfile {
    fn default() -> Self {
        Self {
            min_delay_secs: 2,
            max_delay_secs: 8,
            between_actions_secs: 30,
            typing_min_ms: 45,
            typing_max_ms: 120,
            think_min_ms: 500,
            think_max_ms: 2000,
        }
    }
}

impl DelayProfile {
    /// Reject inverted bounds. Values are never clamped.
    pub fn validate(&self) -> Result<()> {
        if self.max_delay_secs < self.min_delay_secs {
            return Err(Error::configuration(format!(
                "max_delay ({}) is below min_delay ({})",
                self.max_delay_secs, self.min_delay_secs
            )));
        }
        if self.typing_max_ms < self.typing_min_ms {
            return Err(Error::configuration(format!(
                "typing_max ({}) is below typing_min ({})",
                self.typing_max_ms, self.typing_min_ms
            )));
        }
        if self.think_max_ms < self.think_min_ms {
            return Err(Error::configuration(format!(
                "think_max ({}) is below think_min ({})",
                self.think_max_ms, self.think_min_ms
            )));
        }
        Ok(())
    }
}

/// Semantic action kinds with their base delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    Scroll,
    Read,
    FormFill,
    Navigation,
    Hover,
    /// Anything without a dedicated entry
    Other,
}

impl ActionKind {
    /// Base delay in milliseconds before jitter
    pub const fn base_ms(self) -> u64 {
        match self {
            ActionKind::Click => 300,
            ActionKind::Scroll => 200,
            ActionKind::Read => 1000,
            ActionKind::FormFill => 500,
            ActionKind::Navigation => 800,
            ActionKind::Hover => 150,
            ActionKind::Other => 500,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Scroll => "scroll",
            ActionKind::Read => "read",
            ActionKind::FormFill => "form_fill",
            ActionKind::Navigation => "navigation",
            ActionKind::Hover => "hover",
            ActionKind::Other => "other",
        }
    }
}

impl FromStr for ActionKind {
    type Err = std::convert::Infallible;

    /// Unknown names map to `Other` so they get the default base delay
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "click" => ActionKind::Click,
            "scroll" => ActionKind::Scroll,
            "read" => ActionKind::Read,
            "form_fill" => ActionKind::FormFill,
            "navigation" => ActionKind::Navigation,
            "hover" => ActionKind::Hover,
            _ => ActionKind::Other,
        })
    }
}

/// Uniform duration in `[lo, hi]` milliseconds
pub(crate) fn uniform_millis<R: Rng + ?Sized>(rng: &mut R, lo: u64, hi: u64) -> Duration {
    if hi <= lo {
        return Duration::from_millis(lo);
    }
    Duration::from_millis(rng.gen_range(lo..=hi))
}

/// `base_ms` shifted by a uniform offset of at most `fraction * base_ms`
fn jittered_millis<R: Rng + ?Sized>(rng: &mut R, base_ms: u64, fraction: f64) -> Duration {
    let spread = (base_ms as f64 * fraction) as i64;
    if spread == 0 {
        return Duration::from_millis(base_ms);
    }
    let offset = rng.gen_range(-spread..=spread);
    Duration::from_millis((base_ms as i64 + offset).max(0) as u64)
}

/// Deterministic part of the exponential backoff: `min(2^attempt s, max_delay)`
pub fn backoff_floor(attempt: u32, max_delay: Duration) -> Duration {
    let secs = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(max_delay)
}

/// Delay policy
///
/// Owns its random source so a fixed seed reproduces every duration.
#[derive(Debug, Clone)]
pub struct DelayPolicy {
    profile: DelayProfile,
    rng: StdRng,
}

impl DelayPolicy {
    /// Create a delay policy seeded from OS entropy
    pub fn new(profile: DelayProfile) -> Result<Self> {
        Self::with_rng(profile, StdRng::from_entropy())
    }

    /// Create a delay policy with a fixed seed
    pub fn with_seed(profile: DelayProfile, seed: u64) -> Result<Self> {
        Self::with_rng(profile, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(profile: DelayProfile, rng: StdRng) -> Result<Self> {
        profile.validate()?;
        Ok(Self { profile, rng })
    }

    pub fn profile(&self) -> &DelayProfile {
        &self.profile
    }

    /// Coarse pause: whole seconds in `[min_delay, max_delay]` plus sub-second jitter
    pub fn random_delay(&mut self) -> Duration {
        let secs = self
            .rng
            .gen_range(self.profile.min_delay_secs..=self.profile.max_delay_secs);
        let jitter = self.rng.gen_range(0..JITTER_MS);
        Duration::from_secs(secs) + Duration::from_millis(jitter)
    }

    /// Hesitation before acting on something just read
    pub fn think_delay(&mut self) -> Duration {
        uniform_millis(&mut self.rng, self.profile.think_min_ms, self.profile.think_max_ms)
    }

    /// Between-actions base with ±20% jitter
    pub fn between_actions_delay(&mut self) -> Duration {
        jittered_millis(
            &mut self.rng,
            self.profile.between_actions_secs * 1000,
            BETWEEN_ACTIONS_JITTER,
        )
    }

    /// Base delay of `kind` with ±40% jitter
    pub fn humanized_delay(&mut self, kind: ActionKind) -> Duration {
        jittered_millis(&mut self.rng, kind.base_ms(), HUMANIZED_JITTER)
    }

    /// `min(2^attempt s, max_delay)` plus up to one second of jitter.
    ///
    /// `attempt` is zero-based. The jitter is added after the cap, so the
    /// result never exceeds `max_delay + 1s`.
    pub fn exponential_backoff(&mut self, attempt: u32, max_delay: Duration) -> Duration {
        backoff_floor(attempt, max_delay) + Duration::from_millis(self.rng.gen_range(0..JITTER_MS))
    }

    pub fn scroll_delay(&mut self) -> Duration {
        uniform_millis(&mut self.rng, 100, 500)
    }

    pub fn page_load_delay(&mut self) -> Duration {
        Duration::from_secs(self.rng.gen_range(2..=4))
    }

    /// Dwell over a hovered target
    pub fn hover_delay(&mut self) -> Duration {
        uniform_millis(&mut self.rng, 100, 400)
    }

    /// Pause between arriving on a target and pressing the button
    pub fn pre_click_delay(&mut self) -> Duration {
        uniform_millis(&mut self.rng, 300, 1300)
    }

    /// Time the button stays pressed
    pub fn click_hold(&mut self) -> Duration {
        uniform_millis(&mut self.rng, 50, 150)
    }

    /// Pause while reading after a scroll
    pub fn read_pause(&mut self) -> Duration {
        uniform_millis(&mut self.rng, 1000, 4000)
    }

    /// Gap between scroll decisions while reading a page
    pub fn reading_pause(&mut self) -> Duration {
        uniform_millis(&mut self.rng, 2000, 7000)
    }

    /// Raw access for callers that need extra draws from the same source
    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
