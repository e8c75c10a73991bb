//! Hold-and-cooldown debouncing for the palm-hold spawn gesture.
//!
//! `Idle → Holding{since} → fire → Idle`.  Any frame that fails the
//! qualifying condition drops straight back to `Idle`.  When the hold has
//! matured and the cooldown has passed but nothing is queued, the gesture
//! stays armed: the hold is kept and no cooldown is spent.

use hand_landmarks::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoldPhase {
    Idle,
    Holding { since: Timestamp },
}

/// What [`PalmHold::update`] decided for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoldOutcome {
    Idle,
    Holding { elapsed: u64 },
    /// Hold matured but the previous spawn is too recent.
    CoolingDown,
    /// Hold matured and cooldown passed, waiting for queued content.
    Armed,
    Fire,
}

#[derive(Clone, Debug)]
pub struct PalmHold {
    phase:        HoldPhase,
    last_trigger: Option<Timestamp>,
    hold_ms:      u64,
    cooldown_ms:  u64,
}

impl PalmHold {
    pub fn new(hold_ms: u64, cooldown_ms: u64) -> Self {
        PalmHold { phase: HoldPhase::Idle, last_trigger: None, hold_ms, cooldown_ms }
    }

    pub fn phase(&self) -> HoldPhase {
        self.phase
    }

    pub fn last_trigger(&self) -> Option<Timestamp> {
        self.last_trigger
    }

    /// Advance one frame.  `qualifies` is open-palm and not pinching on the
    /// candidate hand; `queue_ready` is whether an item can be consumed.
    pub fn update(&mut self, qualifies: bool, now: Timestamp, queue_ready: bool) -> HoldOutcome {
        if !qualifies {
            self.phase = HoldPhase::Idle;
            return HoldOutcome::Idle;
        }
        let since = match self.phase {
            HoldPhase::Holding { since } => since,
            HoldPhase::Idle => {
                self.phase = HoldPhase::Holding { since: now };
                now
            }
        };
        let elapsed = now.saturating_sub(since);
        if elapsed < self.hold_ms {
            return HoldOutcome::Holding { elapsed };
        }
        let cooled = self
            .last_trigger
            .map_or(true, |t| now.saturating_sub(t) > self.cooldown_ms);
        if !cooled {
            return HoldOutcome::CoolingDown;
        }
        if !queue_ready {
            return HoldOutcome::Armed;
        }
        self.last_trigger = Some(now);
        self.phase = HoldPhase::Idle;
        HoldOutcome::Fire
    }
}
