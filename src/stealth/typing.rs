//! Keystroke scheduling
//!
//! Plans per-character emissions with human-like delays and an occasional
//! typo-correction detour. Planning is pure; execution lives in the
//! behavior simulator.

use std::time::Duration;

use phf::phf_set;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::timing::delay::uniform_millis;
use crate::timing::DelayProfile;
use crate::Result;

/// Chance that a plan takes a typo-correction detour
pub const TYPO_PROBABILITY: f64 = 0.15;
/// Chance of an extra think pause after any typed character
pub const THINK_PAUSE_PROBABILITY: f64 = 0.05;
/// Shortest text eligible for a typo detour
pub const MIN_TYPO_LEN: usize = 3;

/// Pause after a correction keystroke
const BACKSPACE_DELAY: Duration = Duration::from_millis(100);

static HOME_ROW: phf::Set<char> = phf_set! {'a', 's', 'd', 'f', 'j', 'k', 'l', ';'};
static AWKWARD: phf::Set<char> = phf_set! {'q', 'w', 'e', 'r', 't', 'y', 'z', 'x', 'c', 'v', 'b'};

/// Characters a wrong keystroke is drawn from
const CONFUSABLES: [char; 9] = ['a', 'e', 'i', 'o', 'u', 't', 's', 'r', 'n'];

/// What a single keystroke emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// The intended character
    Type(char),
    /// A wrong character that a later `Backspace` removes
    Typo(char),
    /// Delete the previous character
    Backspace,
}

/// One planned emission followed by its pause
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keystroke {
    pub action: KeyAction,
    pub delay: Duration,
}

impl Keystroke {
    pub fn is_correction(&self) -> bool {
        self.action == KeyAction::Backspace
    }

    /// The emitted character, if any
    pub fn char(&self) -> Option<char> {
        match self.action {
            KeyAction::Type(c) | KeyAction::Typo(c) => Some(c),
            KeyAction::Backspace => None,
        }
    }
}

/// Ordered keystrokes for one text input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypingPlan {
    keystrokes: Vec<Keystroke>,
}

impl TypingPlan {
    pub fn keystrokes(&self) -> &[Keystroke] {
        &self.keystrokes
    }

    pub fn len(&self) -> usize {
        self.keystrokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keystrokes.is_empty()
    }

    pub fn has_correction(&self) -> bool {
        self.keystrokes.iter().any(Keystroke::is_correction)
    }

    pub fn total_duration(&self) -> Duration {
        self.keystrokes.iter().map(|k| k.delay).sum()
    }

    /// Text left in the input after applying every keystroke in order
    pub fn replay(&self) -> String {
        let mut text = String::new();
        for keystroke in &self.keystrokes {
            match keystroke.action {
                KeyAction::Type(c) | KeyAction::Typo(c) => text.push(c),
                KeyAction::Backspace => {
                    text.pop();
                }
            }
        }
        text
    }
}

/// One chunk of a paste plan followed by its pause
#[derive(Debug, Clone, PartialEq)]
pub struct PasteChunk {
    pub text: String,
    pub delay: Duration,
}

/// Chunked insertion plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PastePlan {
    /// Hesitation before the first chunk
    pub lead_in: Duration,
    pub chunks: Vec<PasteChunk>,
}

impl PastePlan {
    pub fn text(&self) -> String {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }
}

/// Delay after typing `ch`: a uniform base with per-class multipliers
pub fn char_delay<R: Rng + ?Sized>(ch: char, profile: &DelayProfile, rng: &mut R) -> Duration {
    let base = uniform_millis(rng, profile.typing_min_ms, profile.typing_max_ms);
    let mut ms = base.as_millis() as f64;

    if HOME_ROW.contains(&ch) {
        ms *= 0.8;
    }
    if AWKWARD.contains(&ch) {
        ms *= 1.2;
    }
    if ch.is_uppercase() {
        ms *= 1.3;
    }
    if ch == ' ' {
        ms *= 1.5;
    }

    Duration::from_millis(ms.round() as u64)
}

fn typed<R: Rng + ?Sized>(ch: char, profile: &DelayProfile, rng: &mut R) -> Keystroke {
    let mut delay = char_delay(ch, profile, rng);
    if rng.gen_bool(THINK_PAUSE_PROBABILITY) {
        delay += uniform_millis(rng, 200, 800);
    }
    Keystroke {
        action: KeyAction::Type(ch),
        delay,
    }
}

fn confusable_for<R: Rng + ?Sized>(correct: char, rng: &mut R) -> char {
    let candidates: Vec<char> = CONFUSABLES.iter().copied().filter(|c| *c != correct).collect();
    candidates.choose(rng).copied().unwrap_or('e')
}

/// Plan `text` without any typo.
pub fn plan_plain<R: Rng + ?Sized>(text: &str, profile: &DelayProfile, rng: &mut R) -> TypingPlan {
    TypingPlan {
        keystrokes: text.chars().map(|ch| typed(ch, profile, rng)).collect(),
    }
}

/// Plan `text` with one typo detour at a random interior position.
///
/// Falls back to [`plan_plain`] for text shorter than [`MIN_TYPO_LEN`].
pub fn plan_with_typo<R: Rng + ?Sized>(text: &str, profile: &DelayProfile, rng: &mut R) -> TypingPlan {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < MIN_TYPO_LEN {
        return plan_plain(text, profile, rng);
    }

    let typo_at = rng.gen_range(1..chars.len() - 1);
    let mut keystrokes = Vec::with_capacity(chars.len() + 2);

    for (i, &ch) in chars.iter().enumerate() {
        if i == typo_at {
            let wrong = confusable_for(ch, rng);
            let recognition = uniform_millis(rng, 200, 600);
            keystrokes.push(Keystroke {
                action: KeyAction::Typo(wrong),
                delay: char_delay(wrong, profile, rng) + recognition,
            });
            keystrokes.push(Keystroke {
                action: KeyAction::Backspace,
                delay: BACKSPACE_DELAY,
            });
        }
        keystrokes.push(typed(ch, profile, rng));
    }

    TypingPlan { keystrokes }
}

/// Plan `text`, taking the typo detour with [`TYPO_PROBABILITY`].
pub fn plan_typing<R: Rng + ?Sized>(text: &str, profile: &DelayProfile, rng: &mut R) -> TypingPlan {
    if text.chars().count() >= MIN_TYPO_LEN && rng.gen_bool(TYPO_PROBABILITY) {
        plan_with_typo(text, profile, rng)
    } else {
        plan_plain(text, profile, rng)
    }
}

/// Split `text` into roughly three-character chunks with short gaps.
pub fn plan_paste<R: Rng + ?Sized>(text: &str, rng: &mut R) -> PastePlan {
    let chars: Vec<char> = text.chars().collect();
    let lead_in = uniform_millis(rng, 400, 1200);
    if chars.is_empty() {
        return PastePlan {
            lead_in,
            chunks: Vec::new(),
        };
    }

    let count = (chars.len() / 3).max(1);
    let size = chars.len() / count;
    let mut chunks = Vec::with_capacity(count);

    for i in 0..count {
        let start = i * size;
        let end = if i == count - 1 { chars.len() } else { start + size };
        let delay = if i == count - 1 {
            Duration::ZERO
        } else {
            uniform_millis(rng, 50, 200)
        };
        chunks.push(PasteChunk {
            text: chars[start..end].iter().collect(),
            delay,
        });
    }

    PastePlan { lead_in, chunks }
}

/// Keystroke scheduler owning its profile and random source
#[derive(Debug, Clone)]
pub struct KeystrokeScheduler {
    profile: DelayProfile,
    rng: StdRng,
}

impl KeystrokeScheduler {
    pub fn new(profile: DelayProfile) -> Result<Self> {
        Self::with_rng(profile, StdRng::from_entropy())
    }

    pub fn with_seed(profile: DelayProfile, seed: u64) -> Result<Self> {
        Self::with_rng(profile, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(profile: DelayProfile, rng: StdRng) -> Result<Self> {
        profile.validate()?;
        Ok(Self { profile, rng })
    }

    pub fn plan(&mut self, text: &str) -> TypingPlan {
        let plan = plan_typing(text, &self.profile, &mut self.rng);
        tracing::trace!(
            keystrokes = plan.len(),
            corrected = plan.has_correction(),
            "planned typing"
        );
        plan
    }

    pub fn plan_with_typo(&mut self, text: &str) -> TypingPlan {
        plan_with_typo(text, &self.profile, &mut self.rng)
    }

    pub fn plan_paste(&mut self, text: &str) -> PastePlan {
        plan_paste(text, &mut self.rng)
    }
}
