//! Data-driven game balance
//!
//! Content tables (hostiles, pickups, power-ups, phases) and every balance
//! knob the simulation reads. Built-in defaults cover a full run; a JSON file
//! can override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::ai::AiKind;
use crate::sim::effects::SynergyBonus;
use crate::sim::entity::PickupKind;
use crate::sim::heightened::HeightenedTuning;
use crate::sim::missions::MissionDef;
use crate::sim::scaling::DifficultyCurves;
use crate::sim::scoring::ComboTuning;
use crate::sim::style::{StyleRule, default_style_rules};

/// Errors from loading content
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tuning defines no phases")]
    NoPhases,
    #[error("difficulty curve '{0}' has a non-finite parameter")]
    InvalidCurve(&'static str),
}

/// Hostile archetype
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostileDef {
    pub id: String,
    pub hp: f32,
    /// Pixels per second before difficulty scaling
    pub speed: f32,
    pub radius: f32,
    pub ai: AiKind,
    /// Points awarded for the kill
    pub score: f64,
    /// Hits absorbed before hp drops
    #[serde(default)]
    pub armor: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupDef {
    pub id: String,
    pub kind: PickupKind,
    pub value: f64,
    pub radius: f32,
    pub speed: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpDef {
    pub id: String,
    /// Effect id, resolved when the power-up spawns
    pub effect: String,
    pub duration: f32,
    pub radius: f32,
    pub speed: f32,
}

/// Weighted reference into a definition table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry {
    pub id: String,
    pub weight: f32,
}

impl PoolEntry {
    pub fn new(id: &str, weight: f32) -> Self {
        Self {
            id: id.to_string(),
            weight,
        }
    }
}

/// A segment of the run. Hostile pools are ordered weakest to strongest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseDef {
    pub id: String,
    /// Seconds before advancing; `None` means no time limit
    #[serde(default)]
    pub duration: Option<f32>,
    /// Score that advances the phase regardless of time
    #[serde(default)]
    pub advance_score: Option<u64>,
    #[serde(default)]
    pub hostiles: Vec<PoolEntry>,
    #[serde(default)]
    pub pickups: Vec<PoolEntry>,
    #[serde(default)]
    pub power_ups: Vec<PoolEntry>,
    /// Hostile spawned once when the phase begins
    #[serde(default)]
    pub boss: Option<String>,
}

/// Base seconds between spawns per category
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpawnIntervals {
    pub hostile: f32,
    pub pickup: f32,
    pub power_up: f32,
}

impl Default for SpawnIntervals {
    fn default() -> Self {
        Self {
            hostile: 1.4,
            pickup: 0.6,
            power_up: 9.0,
        }
    }
}

/// Effect synergy as written in content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergyDef {
    pub id: String,
    pub effects: Vec<String>,
    pub bonus: SynergyBonus,
}

/// All balance data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub hostiles: Vec<HostileDef>,
    pub pickups: Vec<PickupDef>,
    pub power_ups: Vec<PowerUpDef>,
    pub phases: Vec<PhaseDef>,
    pub spawn_intervals: SpawnIntervals,
    pub difficulty: DifficultyCurves,
    pub combo: ComboTuning,
    pub style: Vec<StyleRule>,
    pub synergies: Vec<SynergyDef>,
    pub heightened: HeightenedTuning,
    pub missions: Vec<MissionDef>,
}

fn hostile(
    id: &str,
    hp: f32,
    speed: f32,
    radius: f32,
    ai: AiKind,
    score: f64,
    armor: u32,
) -> HostileDef {
    HostileDef {
        id: id.to_string(),
        hp,
        speed,
        radius,
        ai,
        score,
        armor,
    }
}

fn power_up(id: &str, effect: &str, duration: f32) -> PowerUpDef {
    PowerUpDef {
        id: id.to_string(),
        effect: effect.to_string(),
        duration,
        radius: 12.0,
        speed: 110.0,
    }
}

impl Default for Tuning {
    fn default() -> Self {
        let hostiles = vec![
            hostile("drifter", 1.0, 120.0, 14.0, AiKind::Straight, 100.0, 0),
            hostile("weaver", 2.0, 110.0, 14.0, AiKind::Zigzag, 150.0, 0),
            hostile("swarmling", 1.0, 150.0, 10.0, AiKind::Swarm, 120.0, 0),
            hostile("sniper", 3.0, 90.0, 16.0, AiKind::Sniper, 250.0, 0),
            hostile("bulwark", 4.0, 70.0, 20.0, AiKind::Shielded, 350.0, 2),
            hostile("bomber", 3.0, 100.0, 18.0, AiKind::Exploder, 400.0, 0),
            hostile("overseer", 60.0, 40.0, 48.0, AiKind::Sniper, 5000.0, 5),
        ];

        let pickups = vec![
            PickupDef {
                id: "coin".to_string(),
                kind: PickupKind::Coin,
                value: 10.0,
                radius: 8.0,
                speed: 140.0,
            },
            PickupDef {
                id: "gem".to_string(),
                kind: PickupKind::Gem,
                value: 50.0,
                radius: 10.0,
                speed: 170.0,
            },
        ];

        let power_ups = vec![
            power_up("magnet", "magnet", 8.0),
            power_up("shield", "shield", 5.0),
            power_up("double_score", "double_score", 8.0),
            power_up("slow_motion", "slow_motion", 6.0),
            power_up("overdrive", "overdrive", 6.0),
        ];

        let all_power_ups = || {
            vec![
                PoolEntry::new("magnet", 3.0),
                PoolEntry::new("shield", 2.0),
                PoolEntry::new("double_score", 2.0),
                PoolEntry::new("slow_motion", 1.5),
                PoolEntry::new("overdrive", 1.5),
            ]
        };
        let coins = |gem_weight: f32| {
            vec![PoolEntry::new("coin", 10.0), PoolEntry::new("gem", gem_weight)]
        };

        let phases = vec![
            PhaseDef {
                id: "warmup".to_string(),
                duration: Some(45.0),
                advance_score: Some(15_000),
                hostiles: vec![
                    PoolEntry::new("drifter", 6.0),
                    PoolEntry::new("weaver", 3.0),
                    PoolEntry::new("swarmling", 2.0),
                ],
                pickups: coins(1.0),
                power_ups: all_power_ups(),
                boss: None,
            },
            PhaseDef {
                id: "assault".to_string(),
                duration: Some(90.0),
                advance_score: Some(60_000),
                hostiles: vec![
                    PoolEntry::new("drifter", 4.0),
                    PoolEntry::new("weaver", 4.0),
                    PoolEntry::new("swarmling", 3.0),
                    PoolEntry::new("sniper", 2.0),
                    PoolEntry::new("bulwark", 1.5),
                    PoolEntry::new("bomber", 1.0),
                ],
                pickups: coins(2.0),
                power_ups: all_power_ups(),
                boss: None,
            },
            PhaseDef {
                id: "siege".to_string(),
                duration: Some(60.0),
                advance_score: None,
                hostiles: vec![
                    PoolEntry::new("weaver", 3.0),
                    PoolEntry::new("swarmling", 3.0),
                    PoolEntry::new("sniper", 2.0),
                    PoolEntry::new("bomber", 2.0),
                ],
                pickups: coins(3.0),
                power_ups: all_power_ups(),
                boss: Some("overseer".to_string()),
            },
            PhaseDef {
                id: "endless".to_string(),
                duration: None,
                advance_score: None,
                hostiles: vec![
                    PoolEntry::new("drifter", 3.0),
                    PoolEntry::new("weaver", 3.0),
                    PoolEntry::new("swarmling", 3.0),
                    PoolEntry::new("sniper", 2.5),
                    PoolEntry::new("bulwark", 2.0),
                    PoolEntry::new("bomber", 2.0),
                ],
                pickups: coins(3.0),
                power_ups: all_power_ups(),
                boss: None,
            },
        ];

        let synergies = vec![
            SynergyDef {
                id: "gold_rush".to_string(),
                effects: vec!["magnet".to_string(), "double_score".to_string()],
                bonus: SynergyBonus::ScoreMultiplier { factor: 1.5 },
            },
            SynergyDef {
                id: "juggernaut".to_string(),
                effects: vec!["overdrive".to_string(), "slow_motion".to_string()],
                bonus: SynergyBonus::Invincibility { duration: 4.0 },
            },
            SynergyDef {
                id: "vortex".to_string(),
                effects: vec!["magnet".to_string(), "slow_motion".to_string()],
                bonus: SynergyBonus::AreaPulse {
                    radius: 220.0,
                    damage: 3.0,
                },
            },
        ];

        Self {
            hostiles,
            pickups,
            power_ups,
            phases,
            spawn_intervals: SpawnIntervals::default(),
            difficulty: DifficultyCurves::default(),
            combo: ComboTuning::default(),
            style: default_style_rules(),
            synergies,
            heightened: HeightenedTuning::default(),
            missions: crate::sim::missions::default_missions(),
        }
    }
}

impl Tuning {
    /// Parse and validate tuning JSON. Missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read a tuning file
    pub fn load(path: &Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Read a tuning file, falling back to built-in defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(err) => {
                log::warn!("Using default tuning ({})", err);
                Self::default()
            }
        }
    }

    /// Structural checks. Dangling ids are not errors here: the simulation
    /// skips them at spawn time.
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.phases.is_empty() {
            return Err(TuningError::NoPhases);
        }
        let curves = [
            ("hp", &self.difficulty.hp),
            ("speed", &self.difficulty.speed),
            ("spawn_rate", &self.difficulty.spawn_rate),
            ("elite_chance", &self.difficulty.elite_chance),
        ];
        for (name, curve) in curves {
            if !curve.is_finite() {
                return Err(TuningError::InvalidCurve(name));
            }
        }
        Ok(())
    }

    pub fn hostile(&self, id: &str) -> Option<&HostileDef> {
        self.hostiles.iter().find(|h| h.id == id)
    }

    pub fn pickup(&self, id: &str) -> Option<&PickupDef> {
        self.pickups.iter().find(|p| p.id == id)
    }

    pub fn power_up(&self, id: &str) -> Option<&PowerUpDef> {
        self.power_ups.iter().find(|p| p.id == id)
    }

    /// Serialize for editing
    pub fn to_json_pretty(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
