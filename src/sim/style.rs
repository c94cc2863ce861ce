//! Style bonus detectors
//!
//! Each detector watches a short rolling history and pays out once per
//! qualifying window. After paying out its history is cleared, so a single
//! long streak cannot trigger the same bonus every frame.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Bonus categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleKind {
    RapidKills,
    Untouchable,
    EliteHunter,
}

impl StyleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleKind::RapidKills => "rapid_kills",
            StyleKind::Untouchable => "untouchable",
            StyleKind::EliteHunter => "elite_hunter",
        }
    }
}

/// A configured style rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StyleRule {
    /// `count` kills within `within` seconds
    RapidKills { count: u32, within: f32, points: f64 },
    /// No damage taken for `seconds`
    Untouchable { seconds: f32, points: f64 },
    /// `count` elite kills within `within` seconds
    EliteHunter { count: u32, within: f32, points: f64 },
}

impl StyleRule {
    pub fn kind(&self) -> StyleKind {
        match self {
            StyleRule::RapidKills { .. } => StyleKind::RapidKills,
            StyleRule::Untouchable { .. } => StyleKind::Untouchable,
            StyleRule::EliteHunter { .. } => StyleKind::EliteHunter,
        }
    }

    pub fn points(&self) -> f64 {
        match *self {
            StyleRule::RapidKills { points, .. }
            | StyleRule::Untouchable { points, .. }
            | StyleRule::EliteHunter { points, .. } => points,
        }
    }

    /// Whether the rule can ever pay out and keeps a bounded history
    pub fn is_usable(&self) -> bool {
        match *self {
            StyleRule::RapidKills { count, within, .. }
            | StyleRule::EliteHunter { count, within, .. } => {
                count > 0 && within.is_finite() && within >= 0.0
            }
            StyleRule::Untouchable { seconds, .. } => seconds.is_finite(),
        }
    }
}

pub fn default_style_rules() -> Vec<StyleRule> {
    vec![
        StyleRule::RapidKills {
            count: 5,
            within: 2.0,
            points: 500.0,
        },
        StyleRule::Untouchable {
            seconds: 20.0,
            points: 1000.0,
        },
        StyleRule::EliteHunter {
            count: 3,
            within: 10.0,
            points: 1500.0,
        },
    ]
}

/// A bonus that just paid out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleAward {
    pub kind: StyleKind,
    pub points: f64,
}

#[derive(Debug, Clone)]
enum DetectorState {
    /// Timestamps of recent qualifying kills
    History(VecDeque<f32>),
    /// Seconds since last damage, and whether a payout is still available
    Clean { since_damage: f32, armed: bool },
}

#[derive(Debug, Clone)]
struct Detector {
    rule: StyleRule,
    state: DetectorState,
}

impl Detector {
    fn new(rule: StyleRule) -> Self {
        let state = match rule {
            StyleRule::Untouchable { .. } => DetectorState::Clean {
                since_damage: 0.0,
                armed: true,
            },
            _ => DetectorState::History(VecDeque::new()),
        };
        Self { rule, state }
    }

    fn on_kill(&mut self, now: f32, elite: bool) -> Option<StyleAward> {
        let (count, within) = match self.rule {
            StyleRule::RapidKills { count, within, .. } => (count, within),
            StyleRule::EliteHunter { count, within, .. } if elite => (count, within),
            _ => return None,
        };
        let DetectorState::History(history) = &mut self.state else {
            return None;
        };
        history.push_back(now);
        while history.front().is_some_and(|&t| now - t > within) {
            history.pop_front();
        }
        if history.len() as u32 >= count {
            history.clear();
            return Some(self.award());
        }
        None
    }

    fn on_damage(&mut self) {
        if let DetectorState::Clean { since_damage, armed } = &mut self.state {
            *since_damage = 0.0;
            *armed = true;
        }
    }

    fn on_tick(&mut self, dt: f32) -> Option<StyleAward> {
        let StyleRule::Untouchable { seconds, .. } = self.rule else {
            return None;
        };
        let DetectorState::Clean { since_damage, armed } = &mut self.state else {
            return None;
        };
        *since_damage += dt.max(0.0);
        if *armed && *since_damage >= seconds {
            *armed = false;
            return Some(self.award());
        }
        None
    }

    fn award(&self) -> StyleAward {
        StyleAward {
            kind: self.rule.kind(),
            points: self.rule.points(),
        }
    }
}

/// All style detectors for a run
#[derive(Debug, Clone)]
pub struct StyleTracker {
    detectors: Vec<Detector>,
}

impl StyleTracker {
    /// Build one detector per rule. Rules that could never pay out are skipped.
    pub fn new(rules: &[StyleRule]) -> Self {
        let detectors = rules
            .iter()
            .copied()
            .filter(|rule| {
                let usable = rule.is_usable();
                if !usable {
                    log::warn!("Skipping unusable style rule {:?}", rule);
                }
                usable
            })
            .map(Detector::new)
            .collect();
        Self { detectors }
    }

    /// Feed a kill at virtual time `now`
    pub fn record_kill(&mut self, now: f32, elite: bool) -> Vec<StyleAward> {
        self.detectors
            .iter_mut()
            .filter_map(|d| d.on_kill(now, elite))
            .collect()
    }

    /// Player took damage: re-arms the clean-play detectors
    pub fn record_damage(&mut self) {
        for d in &mut self.detectors {
            d.on_damage();
        }
    }

    /// Advance time-based detectors
    pub fn tick(&mut self, dt: f32) -> Vec<StyleAward> {
        self.detectors
            .iter_mut()
            .filter_map(|d| d.on_tick(dt))
            .collect()
    }
}
