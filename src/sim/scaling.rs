//! Difficulty curves and phase progression
//!
//! Everything here is a pure function of the run clock (and score for phase
//! gates). Calling any of it twice with the same input gives the same answer.

use serde::{Deserialize, Serialize};

use crate::tuning::PhaseDef;

/// Stepped exponential curve: `min(base * growth^floor(t / interval), cap)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleCurve {
    pub base: f32,
    pub growth: f32,
    /// Seconds per growth step
    pub interval: f32,
    pub cap: f32,
}

impl ScaleCurve {
    pub const fn new(base: f32, growth: f32, interval: f32, cap: f32) -> Self {
        Self {
            base,
            growth,
            interval,
            cap,
        }
    }

    /// A curve that never changes
    pub const fn constant(value: f32) -> Self {
        Self::new(value, 1.0, 1.0, value)
    }

    /// Whether every parameter is a finite number
    pub fn is_finite(&self) -> bool {
        self.base.is_finite()
            && self.growth.is_finite()
            && self.interval.is_finite()
            && self.cap.is_finite()
    }

    /// Evaluate at `t` seconds. Result always lies in `[base, cap]`.
    pub fn value(&self, t: f32) -> f32 {
        let base = if self.base.is_finite() { self.base } else { 0.0 };
        let cap = if self.cap.is_finite() { self.cap.max(base) } else { base };
        let growth = if self.growth.is_finite() { self.growth.max(1.0) } else { 1.0 };
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return base;
        }
        let t = if t.is_finite() { t.max(0.0) } else { 0.0 };

        let steps = (t / self.interval).floor();
        let scaled = base * growth.powf(steps);
        if scaled.is_finite() {
            scaled.clamp(base, cap)
        } else {
            cap
        }
    }
}

/// Curves for each scaled quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyCurves {
    pub hp: ScaleCurve,
    pub speed: ScaleCurve,
    pub spawn_rate: ScaleCurve,
    pub elite_chance: ScaleCurve,
}

impl Default for DifficultyCurves {
    fn default() -> Self {
        Self {
            hp: ScaleCurve::new(1.0, 1.15, 30.0, 4.0),
            speed: ScaleCurve::new(1.0, 1.06, 20.0, 2.0),
            spawn_rate: ScaleCurve::new(1.0, 1.1, 15.0, 3.0),
            elite_chance: ScaleCurve::new(0.04, 1.2, 25.0, 0.35),
        }
    }
}

/// Derived difficulty at a point in time. Never stored, only recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    pub elapsed_seconds: f32,
    pub hp_multiplier: f32,
    pub speed_multiplier: f32,
    pub spawn_rate_multiplier: f32,
    pub elite_chance: f32,
}

impl DifficultyState {
    pub fn at(curves: &DifficultyCurves, elapsed_seconds: f32) -> Self {
        Self {
            elapsed_seconds,
            hp_multiplier: curves.hp.value(elapsed_seconds),
            speed_multiplier: curves.speed.value(elapsed_seconds),
            spawn_rate_multiplier: curves.spawn_rate.value(elapsed_seconds),
            elite_chance: curves.elite_chance.value(elapsed_seconds).clamp(0.0, 1.0),
        }
    }
}

/// A single forward phase transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: usize,
    pub to: usize,
}

/// Current phase and when it was entered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseState {
    pub current_phase: usize,
    pub phase_start_time: f32,
    pub score_at_entry: u64,
}

impl Default for PhaseState {
    fn default() -> Self {
        Self {
            current_phase: 0,
            phase_start_time: 0.0,
            score_at_entry: 0,
        }
    }
}

impl PhaseState {
    /// Advance through as many phases as the clock and score allow.
    ///
    /// Phases only move forward. A phase with neither a duration nor a score
    /// gate is terminal, as is the last phase in the table.
    pub fn update(&mut self, phases: &[PhaseDef], elapsed: f32, score: u64) -> Vec<PhaseChange> {
        let mut changes = Vec::new();
        while self.current_phase + 1 < phases.len() {
            let phase = &phases[self.current_phase];
            let time_in_phase = elapsed - self.phase_start_time;

            let by_time = phase.duration.is_some_and(|d| time_in_phase > d);
            let by_score = phase.advance_score.is_some_and(|s| score >= s);
            if !(by_time || by_score) {
                break;
            }

            // Timed exits carry the exact boundary forward so chained phases keep their length
            let start = match phase.duration {
                Some(d) if by_time && !by_score => self.phase_start_time + d,
                _ => elapsed,
            };

            let from = self.current_phase;
            self.current_phase += 1;
            self.phase_start_time = start.min(elapsed);
            self.score_at_entry = score;
            changes.push(PhaseChange {
                from,
                to: self.current_phase,
            });
        }
        changes
    }

    /// True when the current phase can never advance
    pub fn is_terminal(&self, phases: &[PhaseDef]) -> bool {
        match phases.get(self.current_phase) {
            Some(p) => {
                self.current_phase + 1 >= phases.len()
                    || (p.duration.is_none() && p.advance_score.is_none())
            }
            None => true,
        }
    }
}
