//! Named per-entity behaviors, evaluated by the render tick.
//!
//! An entity carries an ordered list of [`Animation`]s.  New behaviors are
//! appended, never substituted, and [`evaluate`] folds them in order so a
//! later behavior sees what earlier ones produced.

use hand_landmarks::Timestamp;

#[derive(Clone, Debug, PartialEq)]
pub enum Animation {
    /// Linear scale from `from` to 1.0 over `duration_ms`.
    ScaleIn { start: Timestamp, duration_ms: u64, from: f32 },
    /// Text alpha from 0.0 to 1.0 over `duration_ms`.
    TextFade { start: Timestamp, duration_ms: u64 },
    /// Card content follows the palm-open broadcast.
    ContentReveal,
}

impl Animation {
    pub fn name(&self) -> &'static str {
        match self {
            Animation::ScaleIn { .. }  => "scale-in",
            Animation::TextFade { .. } => "text-fade",
            Animation::ContentReveal   => "content-reveal",
        }
    }
}

/// Visual state after all behaviors have run for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimatedState {
    pub scale:      f32,
    pub text_alpha: f32,
    pub reveal:     bool,
}

impl Default for AnimatedState {
    fn default() -> Self {
        AnimatedState { scale: 1.0, text_alpha: 1.0, reveal: true }
    }
}

fn progress(now: Timestamp, start: Timestamp, duration_ms: u64) -> f32 {
    if duration_ms == 0 {
        return 1.0;
    }
    (now.saturating_sub(start) as f32 / duration_ms as f32).clamp(0.0, 1.0)
}

pub fn evaluate(animations: &[Animation], now: Timestamp, palm_open: bool) -> AnimatedState {
    animations.iter().fold(AnimatedState::default(), |mut s, a| {
        match *a {
            Animation::ScaleIn { start, duration_ms, from } => {
                let t = progress(now, start, duration_ms);
                s.scale *= from + (1.0 - from) * t;
            }
            Animation::TextFade { start, duration_ms } => {
                s.text_alpha *= progress(now, start, duration_ms);
            }
            Animation::ContentReveal => {
                s.reveal = s.reveal && palm_open;
            }
        }
        s
    })
}
