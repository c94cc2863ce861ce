//! Heightened (fever) mode
//!
//! Kills and coins charge a meter. A full meter starts stage 1; during a
//! stage the meter works as fuel and drains over time. Filling it again moves
//! to the next stage, running dry ends the mode early, and the stage timer
//! running out ends it normally.

use serde::{Deserialize, Serialize};

use super::timer::{Scheduler, TimerHandle};

/// Meter level a fresh stage starts from, as a fraction of the maximum
const STAGE_START_FRACTION: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightenedStageDef {
    /// Global score multiplier while the stage runs
    pub multiplier: f64,
    /// Stage length in seconds
    pub duration: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightenedTuning {
    pub meter_max: f32,
    pub per_kill: f32,
    pub per_coin: f32,
    /// Meter drained per second while a stage runs
    pub drain_per_second: f32,
    pub stages: Vec<HeightenedStageDef>,
}

impl Default for HeightenedTuning {
    fn default() -> Self {
        Self {
            meter_max: 100.0,
            per_kill: 8.0,
            per_coin: 2.0,
            drain_per_second: 6.0,
            stages: vec![
                HeightenedStageDef { multiplier: 2.0, duration: 6.0 },
                HeightenedStageDef { multiplier: 3.0, duration: 5.0 },
                HeightenedStageDef { multiplier: 5.0, duration: 4.0 },
            ],
        }
    }
}

/// Mode transitions reported to the tick loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightenedTransition {
    /// Entered `stage` (0-based); hold the shield for `duration`
    Stage { stage: usize, duration: f32 },
    /// Mode ended. `early` when the meter ran dry before the stage timer.
    Ended { early: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightenedMode {
    tuning: HeightenedTuning,
    meter: f32,
    stage: Option<usize>,
    timer: Option<TimerHandle>,
    /// Bumped on every stage start so stale stage timers can be told apart
    generation: u32,
}

impl HeightenedMode {
    pub fn new(tuning: HeightenedTuning) -> Self {
        Self {
            tuning,
            meter: 0.0,
            stage: None,
            timer: None,
            generation: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stage.is_some()
    }

    /// Current stage (0-based)
    pub fn stage(&self) -> Option<usize> {
        self.stage
    }

    pub fn meter(&self) -> f32 {
        self.meter
    }

    /// Meter fill in `[0, 1]`
    pub fn meter_fraction(&self) -> f32 {
        if self.tuning.meter_max > 0.0 {
            (self.meter / self.tuning.meter_max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Global score multiplier from the running stage
    pub fn multiplier(&self) -> f64 {
        self.stage
            .and_then(|s| self.tuning.stages.get(s))
            .map(|s| s.multiplier)
            .filter(|m| m.is_finite() && *m > 0.0)
            .unwrap_or(1.0)
    }

    pub fn charge_for_kill(&self) -> f32 {
        self.tuning.per_kill
    }

    pub fn charge_for_coin(&self) -> f32 {
        self.tuning.per_coin
    }

    /// Add charge. May start the mode or advance to the next stage.
    /// `task` builds the stage-end task from the stage generation.
    pub fn add_charge<T>(
        &mut self,
        amount: f32,
        sched: &mut Scheduler<T>,
        task: impl FnOnce(u32) -> T,
    ) -> Option<HeightenedTransition> {
        if self.tuning.stages.is_empty() || !amount.is_finite() || amount <= 0.0 {
            return None;
        }
        self.meter = (self.meter + amount).min(self.tuning.meter_max);
        if self.meter < self.tuning.meter_max {
            return None;
        }
        let next = match self.stage {
            None => 0,
            Some(s) if s + 1 < self.tuning.stages.len() => s + 1,
            // Final stage: meter just stays topped up
            Some(_) => return None,
        };
        Some(self.start_stage(next, sched, task))
    }

    fn start_stage<T>(
        &mut self,
        stage: usize,
        sched: &mut Scheduler<T>,
        task: impl FnOnce(u32) -> T,
    ) -> HeightenedTransition {
        if let Some(handle) = self.timer.take() {
            sched.cancel(handle);
        }
        let duration = self.tuning.stages[stage].duration;
        self.generation = self.generation.wrapping_add(1);
        self.timer = Some(sched.schedule(duration, task(self.generation)));
        self.stage = Some(stage);
        self.meter = self.tuning.meter_max * STAGE_START_FRACTION;
        log::info!(
            "Heightened mode stage {} (x{})",
            stage + 1,
            self.tuning.stages[stage].multiplier
        );
        HeightenedTransition::Stage { stage, duration }
    }

    /// Drain fuel while active. Ends the mode early when the meter empties.
    pub fn tick<T>(&mut self, dt: f32, sched: &mut Scheduler<T>) -> Option<HeightenedTransition> {
        self.stage?;
        self.meter -= self.tuning.drain_per_second.max(0.0) * dt.max(0.0);
        if self.meter > 0.0 {
            return None;
        }
        if let Some(handle) = self.timer.take() {
            sched.cancel(handle);
        }
        self.end();
        log::info!("Heightened mode ran dry");
        Some(HeightenedTransition::Ended { early: true })
    }

    /// Stage timer callback. Stale generations are ignored.
    pub fn stage_expired(&mut self, generation: u32) -> Option<HeightenedTransition> {
        if self.stage.is_none() || generation != self.generation {
            return None;
        }
        self.timer = None;
        self.end();
        log::info!("Heightened mode finished");
        Some(HeightenedTransition::Ended { early: false })
    }

    fn end(&mut self) {
        self.stage = None;
        self.meter = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode() -> HeightenedMode {
        HeightenedMode::new(HeightenedTuning {
            meter_max: 10.0,
            per_kill: 5.0,
            per_coin: 1.0,
            drain_per_second: 1.0,
            stages: vec![
                HeightenedStageDef { multiplier: 2.0, duration: 8.0 },
                HeightenedStageDef { multiplier: 4.0, duration: 8.0 },
            ],
        })
    }

    #[test]
    fn test_full_meter_starts_stage_one() {
        let mut sched = Scheduler::new();
        let mut m = mode();
        assert!(m.add_charge(5.0, &mut sched, |g| g).is_none());
        let t = m.add_charge(5.0, &mut sched, |g| g);
        assert_eq!(t, Some(HeightenedTransition::Stage { stage: 0, duration: 8.0 }));
        assert_eq!(m.multiplier(), 2.0);
        assert_eq!(m.meter(), 5.0);
    }

    #[test]
    fn test_refill_advances_and_replaces_timer() {
        let mut sched = Scheduler::new();
        let mut m = mode();
        m.add_charge(10.0, &mut sched, |g| g);
        let t = m.add_charge(5.0, &mut sched, |g| g);
        assert_eq!(t, Some(HeightenedTransition::Stage { stage: 1, duration: 8.0 }));
        assert_eq!(sched.len(), 1);
        // Last stage cannot advance further
        assert!(m.add_charge(50.0, &mut sched, |g| g).is_none());
        assert_eq!(m.multiplier(), 4.0);
    }

    #[test]
    fn test_running_dry_ends_early() {
        let mut sched = Scheduler::new();
        let mut m = mode();
        m.add_charge(10.0, &mut sched, |g| g);
        assert!(m.tick(4.0, &mut sched).is_none());
        assert_eq!(m.tick(1.5, &mut sched), Some(HeightenedTransition::Ended { early: true }));
        assert!(!m.is_active());
        assert!(sched.is_empty());
        assert_eq!(m.multiplier(), 1.0);
    }

    #[test]
    fn test_stale_stage_timer_is_ignored() {
        let mut sched = Scheduler::new();
        let mut m = mode();
        m.add_charge(10.0, &mut sched, |g| g);
        m.add_charge(5.0, &mut sched, |g| g);
        // Generation 1 belonged to the replaced stage
        assert!(m.stage_expired(1).is_none());
        assert!(m.is_active());
        let fired = sched.advance(8.0);
        assert_eq!(fired, vec![2]);
        assert_eq!(m.stage_expired(fired[0]), Some(HeightenedTransition::Ended { early: false }));
    }
}
