//! Temporary effects and synergy resolution
//!
//! `ActiveEffectSet` tracks which power-up effects are running and when each
//! one ends. `EffectResolver` watches the set for synergy rules (sets of effects
//! that must overlap) and reports only the rising and falling edges.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::timer::{Scheduler, TimerHandle};
use crate::tuning::SynergyDef;

/// Temporary power-up effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Magnet,
    Shield,
    DoubleScore,
    SlowMotion,
    Overdrive,
}

impl EffectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::Magnet => "magnet",
            EffectKind::Shield => "shield",
            EffectKind::DoubleScore => "double_score",
            EffectKind::SlowMotion => "slow_motion",
            EffectKind::Overdrive => "overdrive",
        }
    }

    pub fn from_id(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "magnet" => Some(EffectKind::Magnet),
            "shield" => Some(EffectKind::Shield),
            "double_score" | "double" => Some(EffectKind::DoubleScore),
            "slow_motion" | "slow" => Some(EffectKind::SlowMotion),
            "overdrive" => Some(EffectKind::Overdrive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ActiveEffect {
    expires_at: f32,
    handle: TimerHandle,
}

/// Currently running effects with their expiry times
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveEffectSet {
    effects: BTreeMap<EffectKind, ActiveEffect>,
}

impl ActiveEffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start or renew an effect. A running timer for the same effect is
    /// cancelled before the new one is scheduled. Returns true if the effect
    /// was not already running.
    pub fn activate<T>(
        &mut self,
        kind: EffectKind,
        duration: f32,
        sched: &mut Scheduler<T>,
        task: T,
    ) -> bool {
        let fresh = match self.effects.remove(&kind) {
            Some(previous) => {
                sched.cancel(previous.handle);
                false
            }
            None => true,
        };
        let handle = sched.schedule(duration, task);
        // Use the delay the scheduler settled on
        let expires_at = sched.now() + sched.remaining(handle).unwrap_or(0.0);
        self.effects.insert(kind, ActiveEffect { expires_at, handle });
        fresh
    }

    /// Timer callback: drop the effect if its expiry has passed.
    /// Returns true if the effect was removed.
    pub fn expire(&mut self, kind: EffectKind, now: f32) -> bool {
        match self.effects.get(&kind) {
            Some(active) if active.expires_at <= now + 1e-4 => {
                self.effects.remove(&kind);
                true
            }
            _ => false,
        }
    }

    /// End an effect early, cancelling its timer
    pub fn remove<T>(&mut self, kind: EffectKind, sched: &mut Scheduler<T>) -> bool {
        match self.effects.remove(&kind) {
            Some(active) => {
                sched.cancel(active.handle);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        self.effects.contains_key(&kind)
    }

    /// Seconds left on an effect
    pub fn remaining(&self, kind: EffectKind, now: f32) -> Option<f32> {
        self.effects.get(&kind).map(|a| (a.expires_at - now).max(0.0))
    }

    pub fn kinds(&self) -> impl Iterator<Item = EffectKind> + '_ {
        self.effects.keys().copied()
    }

    pub fn contains_all(&self, required: &BTreeSet<EffectKind>) -> bool {
        required.iter().all(|k| self.effects.contains_key(k))
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Bonus applied when a synergy rule becomes satisfied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SynergyBonus {
    /// Extra external score multiplier while the rule holds
    ScoreMultiplier { factor: f64 },
    /// Request the shield for a fixed duration
    Invincibility { duration: f32 },
    /// One-shot damage to hostiles around the player
    AreaPulse { radius: f32, damage: f32 },
}

/// A resolved synergy rule
#[derive(Debug, Clone)]
pub struct SynergyRule {
    pub id: String,
    pub requires: BTreeSet<EffectKind>,
    pub bonus: SynergyBonus,
}

impl SynergyRule {
    /// Resolve effect ids from content. Rules naming an unknown effect are
    /// skipped rather than half-applied.
    pub fn from_def(def: &SynergyDef) -> Option<Self> {
        let mut requires = BTreeSet::new();
        for id in &def.effects {
            match EffectKind::from_id(id) {
                Some(kind) => {
                    requires.insert(kind);
                }
                None => {
                    log::warn!("Synergy '{}' names unknown effect '{}', skipping rule", def.id, id);
                    return None;
                }
            }
        }
        if requires.is_empty() {
            log::warn!("Synergy '{}' has no required effects, skipping rule", def.id);
            return None;
        }
        Some(Self {
            id: def.id.clone(),
            requires,
            bonus: def.bonus,
        })
    }
}

/// Edge transition of a synergy rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynergyEdge {
    pub rule: usize,
    pub activated: bool,
}

/// Edge-triggered synergy detector
#[derive(Debug, Clone, Default)]
pub struct EffectResolver {
    rules: Vec<SynergyRule>,
    satisfied: Vec<bool>,
}

impl EffectResolver {
    pub fn new(rules: Vec<SynergyRule>) -> Self {
        let satisfied = vec![false; rules.len()];
        Self { rules, satisfied }
    }

    pub fn from_defs(defs: &[SynergyDef]) -> Self {
        Self::new(defs.iter().filter_map(SynergyRule::from_def).collect())
    }

    /// Compare every rule against the set, returning only state changes
    pub fn evaluate(&mut self, active: &ActiveEffectSet) -> Vec<SynergyEdge> {
        let mut edges = Vec::new();
        for (idx, rule) in self.rules.iter().enumerate() {
            let now_satisfied = active.contains_all(&rule.requires);
            if now_satisfied != self.satisfied[idx] {
                self.satisfied[idx] = now_satisfied;
                edges.push(SynergyEdge {
                    rule: idx,
                    activated: now_satisfied,
                });
            }
        }
        edges
    }

    pub fn rule(&self, idx: usize) -> Option<&SynergyRule> {
        self.rules.get(idx)
    }

    pub fn rules(&self) -> &[SynergyRule] {
        &self.rules
    }

    pub fn is_active(&self, idx: usize) -> bool {
        self.satisfied.get(idx).copied().unwrap_or(false)
    }

    /// Product of score multipliers from every satisfied rule
    pub fn score_multiplier(&self) -> f64 {
        self.rules
            .iter()
            .zip(&self.satisfied)
            .filter(|(_, on)| **on)
            .map(|(rule, _)| match rule.bonus {
                SynergyBonus::ScoreMultiplier { factor } if factor.is_finite() && factor > 0.0 => {
                    factor
                }
                _ => 1.0,
            })
            .product()
    }

    /// Ids of the rules currently satisfied
    pub fn active_ids(&self) -> Vec<&str> {
        self.rules
            .iter()
            .zip(&self.satisfied)
            .filter(|(_, on)| **on)
            .map(|(rule, _)| rule.id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: &str, effects: &[&str]) -> SynergyDef {
        SynergyDef {
            id: id.to_string(),
            effects: effects.iter().map(|s| s.to_string()).collect(),
            bonus: SynergyBonus::ScoreMultiplier { factor: 1.5 },
        }
    }

    #[test]
    fn test_effect_renewal_replaces_timer() {
        let mut sched = Scheduler::new();
        let mut set = ActiveEffectSet::new();
        assert!(set.activate(EffectKind::Magnet, 2.0, &mut sched, EffectKind::Magnet));
        sched.advance(1.5);
        assert!(!set.activate(EffectKind::Magnet, 2.0, &mut sched, EffectKind::Magnet));
        assert_eq!(sched.len(), 1);

        // The original 2s timer would have fired here
        assert!(sched.advance(1.0).is_empty());
        let fired = sched.advance(1.0);
        assert_eq!(fired, vec![EffectKind::Magnet]);
        assert!(set.expire(EffectKind::Magnet, sched.now()));
        assert!(!set.contains(EffectKind::Magnet));
    }

    #[test]
    fn test_non_finite_duration_still_expires() {
        let mut sched = Scheduler::new();
        let mut active = ActiveEffectSet::new();
        active.activate(EffectKind::Magnet, f32::INFINITY, &mut sched, EffectKind::Magnet);
        active.activate(EffectKind::SlowMotion, f32::NAN, &mut sched, EffectKind::SlowMotion);

        let fired = sched.advance(0.016);
        assert_eq!(fired, vec![EffectKind::Magnet, EffectKind::SlowMotion]);
        for kind in fired {
            assert!(active.expire(kind, sched.now()));
        }
        assert!(!active.contains(EffectKind::Magnet));
        assert!(!active.contains(EffectKind::SlowMotion));
    }

    #[test]
    fn test_early_expire_is_ignored() {
        let mut sched: Scheduler<()> = Scheduler::new();
        let mut set = ActiveEffectSet::new();
        set.activate(EffectKind::Shield, 5.0, &mut sched, ());
        assert!(!set.expire(EffectKind::Shield, 1.0));
        assert!(set.contains(EffectKind::Shield));
    }

    #[test]
    fn test_unknown_effect_skips_rule() {
        let defs = [def("bad", &["magnet", "teleport"]), def("ok", &["magnet"])];
        let resolver = EffectResolver::from_defs(&defs);
        assert_eq!(resolver.rules().len(), 1);
        assert_eq!(resolver.rules()[0].id, "ok");
    }

    #[test]
    fn test_rule_fires_on_edges_only() {
        let mut sched: Scheduler<()> = Scheduler::new();
        let mut set = ActiveEffectSet::new();
        let mut resolver =
            EffectResolver::from_defs(&[def("gold_rush", &["magnet", "double_score"])]);

        set.activate(EffectKind::Magnet, 10.0, &mut sched, ());
        assert!(resolver.evaluate(&set).is_empty());

        set.activate(EffectKind::DoubleScore, 10.0, &mut sched, ());
        assert_eq!(resolver.evaluate(&set), vec![SynergyEdge { rule: 0, activated: true }]);
        assert!(resolver.evaluate(&set).is_empty());
        assert!((resolver.score_multiplier() - 1.5).abs() < 1e-9);

        set.remove(EffectKind::Magnet, &mut sched);
        assert_eq!(resolver.evaluate(&set), vec![SynergyEdge { rule: 0, activated: false }]);
        assert!(resolver.evaluate(&set).is_empty());
        assert_eq!(resolver.score_multiplier(), 1.0);
    }
}
