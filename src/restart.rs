//! Restart policy and the reluctant-doubling sequence (component I, spec.md
//! §4.I). Grounded on the teacher's `restart.rs` (`Ema2`-driven blocking /
//! forcing restart, `luby`-style reluctant state machine), reworked around
//! SPEC_FULL's two explicit modes (focused / stable) instead of the
//! teacher's single strategy-adaptive controller.
use crate::types::{DecisionLevel, Ema, Ema2};

/// Glucose-style fast/slow glue EMAs plus the trail-fraction/decision-level
/// EMAs spec.md §3 "Averages / EMAs" lists.
#[derive(Debug)]
pub struct RestartState {
    pub glue: Ema2,
    pub trail_fraction: Ema,
    pub decision_level: Ema,
    conflicts_since_restart: u64,
    reluctant: Reluctant,
}

impl RestartState {
    pub fn new(emafast: f64, emaslow: f64) -> RestartState {
        RestartState {
            glue: Ema2::new(emafast, emaslow),
            trail_fraction: Ema::new(emafast),
            decision_level: Ema::new(emafast),
            conflicts_since_restart: 0,
            reluctant: Reluctant::new(),
        }
    }

    pub fn on_conflict(&mut self, glue: u32, trail_fraction: f64, level: DecisionLevel) {
        self.glue.update(glue as f64);
        self.trail_fraction.update(trail_fraction);
        self.decision_level.update(level as f64);
        self.conflicts_since_restart += 1;
    }

    pub fn on_restart(&mut self) {
        self.conflicts_since_restart = 0;
    }

    /// Focused-mode Glucose restart test (spec.md §4.I): fire once
    /// `restartint` conflicts have passed since the last restart and the
    /// fast glue EMA exceeds the slow one by the configured margin.
    pub fn should_restart_focused(&self, restartint: u64, restartmargin: u32) -> bool {
        if self.conflicts_since_restart < restartint {
            return false;
        }
        let margin = 1.0 + restartmargin as f64 / 100.0;
        self.glue.fast() * margin > self.glue.slow()
    }

    /// Stable-mode reluctant-doubling restart test, triggered by a tick
    /// count rather than glue EMAs (spec.md §4.I).
    pub fn should_restart_stable(&mut self, ticks: u64, reluctantint: u64, reluctantlim: u64) -> bool {
        self.reluctant.tick(ticks, reluctantint, reluctantlim)
    }

    pub fn reset_reluctant(&mut self) {
        self.reluctant = Reluctant::new();
    }
}

/// Luby-like reluctant-doubling sequence: `u, u, 2u, u, u, 2u, 4u, ...`.
/// Grounded on the teacher's own reluctant-doubling implementation
/// (`restart.rs`'s `luby` state machine), kept here as a tick-driven rather
/// than conflict-driven counter per spec.md §4.I.
#[derive(Debug)]
struct Reluctant {
    u: u64,
    v: u64,
    countdown: u64,
    armed: bool,
}

impl Reluctant {
    fn new() -> Reluctant {
        Reluctant {
            u: 1,
            v: 1,
            countdown: 0,
            armed: false,
        }
    }

    fn advance(&mut self) {
        if self.u & self.u.wrapping_neg() == self.v {
            self.u += 1;
            self.v = 1;
        } else {
            self.v *= 2;
        }
    }

    fn tick(&mut self, ticks: u64, interval: u64, limit: u64) -> bool {
        if !self.armed {
            self.countdown = self.v.saturating_mul(interval);
            self.armed = true;
        }
        if ticks < self.countdown {
            return false;
        }
        if limit != 0 && self.v * interval > limit {
            // capped: fall back to a flat interval once the sequence
            // would exceed the configured ceiling.
            self.countdown = ticks + limit;
            return true;
        }
        self.advance();
        self.armed = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focused_restart_requires_margin_and_interval() {
        let mut rst = RestartState::new(33.0, 1e5);
        for _ in 0..200 {
            rst.on_conflict(20, 0.5, 3);
        }
        assert!(!rst.should_restart_focused(1000, 10));
        for _ in 0..1000 {
            rst.on_conflict(5, 0.1, 1);
        }
        assert!(rst.should_restart_focused(1000, 10));
    }

    #[test]
    fn reluctant_sequence_doubles_then_resets() {
        let mut r = Reluctant::new();
        assert!(r.tick(1, 1, 0));
        assert!(!r.tick(1, 1, 0));
    }
}
