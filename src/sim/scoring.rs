//! Score accumulation and kill combos
//!
//! Points pass through a fixed multiplier chain:
//! 1. heightened-stage global multiplier
//! 2. external multiplier from running effects and synergies
//! 3. combo multiplier
//! 4. weakpoint (critical) bonus

use serde::{Deserialize, Serialize};

use crate::consts::CRIT_MULTIPLIER;

/// What produced a score gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreSource {
    Pickup,
    Kill,
    StyleBonus,
    Synergy,
}

/// Multipliers in effect for one score gain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreMultipliers {
    pub heightened: f64,
    pub external: f64,
    pub combo: f64,
}

impl Default for ScoreMultipliers {
    fn default() -> Self {
        Self {
            heightened: 1.0,
            external: 1.0,
            combo: 1.0,
        }
    }
}

/// Apply the multiplier chain to a base value
pub fn compute_points(base: f64, mults: &ScoreMultipliers, critical: bool) -> f64 {
    let mut points = base;
    points *= mults.heightened;
    points *= mults.external;
    points *= mults.combo;
    if critical {
        points *= CRIT_MULTIPLIER;
    }
    points
}

/// Running score with a fallback to the last finite total
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreKeeper {
    total: f64,
    last_good: f64,
}

impl ScoreKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score as shown to players
    pub fn score(&self) -> u64 {
        self.total.max(0.0).floor() as u64
    }

    /// Add a gain after running it through the multiplier chain.
    /// Returns the points actually awarded, or None if the arithmetic went
    /// non-finite and the total was restored.
    /// Negative gains are refused and leave the total alone.
    pub fn add_score(
        &mut self,
        base: f64,
        source: ScoreSource,
        mults: &ScoreMultipliers,
        critical: bool,
    ) -> Option<f64> {
        let points = compute_points(base, mults, critical);
        if !points.is_finite() {
            log::warn!("Discarding non-finite {:?} score gain (base {})", source, base);
            self.total = self.last_good;
            return None;
        }
        if points < 0.0 {
            log::warn!("Discarding negative {:?} score gain {} (base {})", source, points, base);
            return None;
        }
        let next = self.total + points;
        if !next.is_finite() {
            log::warn!("Score overflowed, restoring last good total {}", self.last_good);
            self.total = self.last_good;
            return None;
        }
        self.total = next;
        self.last_good = next;
        Some(points)
    }
}

/// One step of the combo multiplier table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboTier {
    pub min_streak: u32,
    pub multiplier: f64,
}

/// Combo window and multiplier tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboTuning {
    /// Window after the first kill (seconds)
    pub window_base: f32,
    /// Extra window per streak step
    pub window_increment: f32,
    pub window_cap: f32,
    pub tiers: Vec<ComboTier>,
    pub max_multiplier: f64,
}

impl Default for ComboTuning {
    fn default() -> Self {
        Self {
            window_base: 2.0,
            window_increment: 0.25,
            window_cap: 4.0,
            tiers: vec![
                ComboTier { min_streak: 0, multiplier: 1.0 },
                ComboTier { min_streak: 3, multiplier: 1.5 },
                ComboTier { min_streak: 5, multiplier: 2.0 },
                ComboTier { min_streak: 10, multiplier: 3.0 },
                ComboTier { min_streak: 20, multiplier: 4.0 },
            ],
            max_multiplier: 4.0,
        }
    }
}

/// Observable combo state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboState {
    pub kill_streak: u32,
    pub window_remaining: f32,
    pub multiplier: f64,
}

impl Default for ComboState {
    fn default() -> Self {
        Self {
            kill_streak: 0,
            window_remaining: 0.0,
            multiplier: 1.0,
        }
    }
}

/// Kill streak tracking with a countdown window
#[derive(Debug, Clone)]
pub struct ComboTracker {
    tuning: ComboTuning,
    state: ComboState,
}

impl ComboTracker {
    pub fn new(mut tuning: ComboTuning) -> Self {
        tuning.tiers.retain(|t| t.multiplier.is_finite());
        tuning.tiers.sort_by_key(|t| t.min_streak);
        if !(tuning.max_multiplier.is_finite() && tuning.max_multiplier >= 1.0) {
            tuning.max_multiplier = 1.0;
        }
        Self {
            tuning,
            state: ComboState::default(),
        }
    }

    pub fn state(&self) -> ComboState {
        self.state
    }

    pub fn streak(&self) -> u32 {
        self.state.kill_streak
    }

    pub fn multiplier(&self) -> f64 {
        self.state.multiplier
    }

    /// Multiplier for a streak length. Non-decreasing in `streak` and
    /// bounded by `[1, max_multiplier]`.
    pub fn multiplier_for(&self, streak: u32) -> f64 {
        let mut best = 1.0_f64;
        for tier in &self.tuning.tiers {
            if tier.min_streak > streak {
                break;
            }
            best = best.max(tier.multiplier);
        }
        best.clamp(1.0, self.tuning.max_multiplier)
    }

    /// Window length granted at a streak length
    pub fn window_for(&self, streak: u32) -> f32 {
        let t = &self.tuning;
        (t.window_base + streak as f32 * t.window_increment)
            .min(t.window_cap)
            .max(0.0)
    }

    /// Count a qualifying kill and restart the window
    pub fn register_kill(&mut self) -> ComboState {
        let streak = self.state.kill_streak.saturating_add(1);
        let window = self.window_for(streak);
        if window <= 0.0 {
            // A zero-length window can never hold a streak
            self.state = ComboState::default();
            return self.state;
        }
        self.state = ComboState {
            kill_streak: streak,
            window_remaining: window,
            multiplier: self.multiplier_for(streak),
        };
        self.state
    }

    /// Count down the window. Returns the broken streak length when it runs out.
    pub fn tick(&mut self, dt: f32) -> Option<u32> {
        if self.state.kill_streak == 0 {
            return None;
        }
        self.state.window_remaining -= dt.max(0.0);
        if self.state.window_remaining <= 0.0 {
            let broken = self.state.kill_streak;
            self.state = ComboState::default();
            return Some(broken);
        }
        None
    }

    /// Drop the streak without a break signal (new run)
    pub fn reset(&mut self) {
        self.state = ComboState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_order() {
        let mults = ScoreMultipliers {
            heightened: 2.0,
            external: 3.0,
            combo: 1.5,
        };
        assert_eq!(compute_points(100.0, &mults, false), 900.0);
        assert_eq!(compute_points(100.0, &mults, true), 900.0 * CRIT_MULTIPLIER);
    }

    #[test]
    fn test_non_finite_gain_restores_total() {
        let mut keeper = ScoreKeeper::new();
        let mults = ScoreMultipliers::default();
        assert_eq!(keeper.add_score(50.0, ScoreSource::Pickup, &mults, false), Some(50.0));

        let bad = ScoreMultipliers {
            external: f64::INFINITY,
            ..Default::default()
        };
        assert!(keeper.add_score(10.0, ScoreSource::Kill, &bad, false).is_none());
        assert!(keeper.add_score(f64::NAN, ScoreSource::Kill, &mults, false).is_none());
        assert_eq!(keeper.score(), 50);
    }

    #[test]
    fn test_negative_gain_is_refused() {
        let mut keeper = ScoreKeeper::new();
        let mults = ScoreMultipliers::default();
        keeper.add_score(80.0, ScoreSource::Kill, &mults, false);
        assert!(keeper.add_score(-30.0, ScoreSource::StyleBonus, &mults, false).is_none());
        assert_eq!(keeper.score(), 80);
        assert_eq!(keeper.add_score(20.0, ScoreSource::Pickup, &mults, false), Some(20.0));
        assert_eq!(keeper.score(), 100);
    }

    #[test]
    fn test_combo_window_grows_to_cap() {
        let mut combo = ComboTracker::new(ComboTuning::default());
        assert!((combo.register_kill().window_remaining - 2.25).abs() < 1e-6);
        for _ in 0..20 {
            combo.register_kill();
        }
        assert_eq!(combo.state().window_remaining, 4.0);
    }

    #[test]
    fn test_combo_break() {
        let mut combo = ComboTracker::new(ComboTuning::default());
        combo.register_kill();
        combo.register_kill();
        let state = combo.register_kill();
        assert_eq!(state.kill_streak, 3);
        assert_eq!(state.multiplier, 1.5);

        assert!(combo.tick(1.0).is_none());
        assert_eq!(combo.tick(5.0), Some(3));
        assert_eq!(combo.streak(), 0);
        assert_eq!(combo.multiplier(), 1.0);
        // No repeat signal once broken
        assert!(combo.tick(1.0).is_none());
    }

    #[test]
    fn test_unsorted_tiers_stay_monotonic() {
        let tuning = ComboTuning {
            tiers: vec![
                ComboTier { min_streak: 10, multiplier: 2.0 },
                ComboTier { min_streak: 2, multiplier: 3.0 },
            ],
            max_multiplier: 2.5,
            ..Default::default()
        };
        let combo = ComboTracker::new(tuning);
        assert_eq!(combo.multiplier_for(1), 1.0);
        assert_eq!(combo.multiplier_for(2), 2.5);
        assert_eq!(combo.multiplier_for(12), 2.5);
    }
}
