//! Mission progress tracking
//!
//! Progress tracking is a service the game state is constructed with, not a
//! global. Tests and tools can run several isolated boards side by side, or
//! plug in `NoProgress` to opt out.

use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use super::entity::PickupKind;

/// Objective of a mission
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MissionGoal {
    CollectCoins { count: u32 },
    DefeatHostiles { count: u32 },
    DefeatElites { count: u32 },
    ReachCombo { streak: u32 },
    SurviveSeconds { seconds: f32 },
    EarnStyleBonuses { count: u32 },
}

impl MissionGoal {
    fn target(&self) -> f64 {
        match *self {
            MissionGoal::CollectCoins { count }
            | MissionGoal::DefeatHostiles { count }
            | MissionGoal::DefeatElites { count }
            | MissionGoal::EarnStyleBonuses { count } => count as f64,
            MissionGoal::ReachCombo { streak } => streak as f64,
            MissionGoal::SurviveSeconds { seconds } => seconds as f64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionDef {
    pub id: String,
    pub goal: MissionGoal,
}

pub fn default_missions() -> Vec<MissionDef> {
    let mission = |id: &str, goal| MissionDef {
        id: id.to_string(),
        goal,
    };
    vec![
        mission("coin_collector", MissionGoal::CollectCoins { count: 50 }),
        mission("exterminator", MissionGoal::DefeatHostiles { count: 40 }),
        mission("elite_breaker", MissionGoal::DefeatElites { count: 5 }),
        mission("combo_artist", MissionGoal::ReachCombo { streak: 10 }),
        mission("survivor", MissionGoal::SurviveSeconds { seconds: 120.0 }),
        mission("showoff", MissionGoal::EarnStyleBonuses { count: 3 }),
    ]
}

/// Observes simulation progress. Returns ids of missions completed by the call.
pub trait ProgressTracker {
    fn observe(&mut self, event: &GameEvent) -> Vec<String>;

    /// Called once per tick with the run clock
    fn on_tick(&mut self, _elapsed: f32) -> Vec<String> {
        Vec::new()
    }
}

/// Tracker that records nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressTracker for NoProgress {
    fn observe(&mut self, _event: &GameEvent) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionProgress {
    pub def: MissionDef,
    pub progress: f64,
    pub completed: bool,
}

impl MissionProgress {
    /// Progress toward the target in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        let target = self.def.goal.target();
        if target <= 0.0 {
            1.0
        } else {
            (self.progress / target).clamp(0.0, 1.0)
        }
    }
}

/// Standard mission tracker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissionBoard {
    missions: Vec<MissionProgress>,
}

impl MissionBoard {
    pub fn new(defs: &[MissionDef]) -> Self {
        Self {
            missions: defs
                .iter()
                .cloned()
                .map(|def| MissionProgress {
                    def,
                    progress: 0.0,
                    completed: false,
                })
                .collect(),
        }
    }

    pub fn missions(&self) -> &[MissionProgress] {
        &self.missions
    }

    pub fn completed_count(&self) -> usize {
        self.missions.iter().filter(|m| m.completed).count()
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.missions.iter().any(|m| m.def.id == id && m.completed)
    }

    /// Apply `update` to every open mission and collect the ones it finished
    fn update<F>(&mut self, mut update: F) -> Vec<String>
    where
        F: FnMut(&MissionGoal, &mut f64),
    {
        let mut done = Vec::new();
        for mission in self.missions.iter_mut().filter(|m| !m.completed) {
            update(&mission.def.goal, &mut mission.progress);
            if mission.progress >= mission.def.goal.target() {
                mission.completed = true;
                log::info!("Mission complete: {}", mission.def.id);
                done.push(mission.def.id.clone());
            }
        }
        done
    }
}

impl ProgressTracker for MissionBoard {
    fn observe(&mut self, event: &GameEvent) -> Vec<String> {
        match event {
            GameEvent::PickupCollected {
                kind: PickupKind::Coin, ..
            } => self.update(|goal, p| {
                if matches!(goal, MissionGoal::CollectCoins { .. }) {
                    *p += 1.0;
                }
            }),
            GameEvent::EnemyDeath { elite, .. } => {
                let elite = *elite;
                self.update(|goal, p| match goal {
                    MissionGoal::DefeatHostiles { .. } => *p += 1.0,
                    MissionGoal::DefeatElites { .. } if elite => *p += 1.0,
                    _ => {}
                })
            }
            GameEvent::ComboChanged { streak, .. } => {
                let streak = *streak as f64;
                self.update(|goal, p| {
                    if matches!(goal, MissionGoal::ReachCombo { .. }) {
                        *p = p.max(streak);
                    }
                })
            }
            GameEvent::StyleBonus { .. } => self.update(|goal, p| {
                if matches!(goal, MissionGoal::EarnStyleBonuses { .. }) {
                    *p += 1.0;
                }
            }),
            _ => Vec::new(),
        }
    }

    fn on_tick(&mut self, elapsed: f32) -> Vec<String> {
        let elapsed = elapsed as f64;
        self.update(|goal, p| {
            if matches!(goal, MissionGoal::SurviveSeconds { .. }) {
                *p = p.max(elapsed);
            }
        })
    }
}
