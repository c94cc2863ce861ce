//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Virtual clock only (every delay is a scheduler task)
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod ai;
pub mod arbiter;
pub mod collision;
pub mod effects;
pub mod entity;
pub mod events;
pub mod heightened;
pub mod missions;
pub mod player;
pub mod scaling;
pub mod scoring;
pub mod snapshot;
pub mod spawner;
pub mod state;
pub mod style;
pub mod tick;
pub mod timer;
pub mod world;

pub use arbiter::{Arbiter, Grant, ShieldArbiter, ShieldOwner};
pub use collision::{Hit, Interaction};
pub use effects::{ActiveEffectSet, EffectKind, EffectResolver, SynergyBonus};
pub use entity::{Entity, EntityBody, EntityId, EntityKind, Faction, PickupKind};
pub use events::{EventHandlers, GameEvent};
pub use heightened::HeightenedMode;
pub use missions::{MissionBoard, MissionDef, MissionGoal, NoProgress, ProgressTracker};
pub use scaling::{DifficultyState, PhaseState, ScaleCurve};
pub use scoring::{ComboState, ScoreSource};
pub use snapshot::RenderSnapshot;
pub use spawner::SpawnCategory;
pub use state::{GameState, SimTask};
pub use style::StyleKind;
pub use tick::{TickInput, tick};
pub use timer::{Scheduler, TimerHandle};
pub use world::World;
