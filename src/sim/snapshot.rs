//! Read-only view of a frame for renderers and tools

use serde::Serialize;

use super::arbiter::ShieldOwner;
use super::effects::EffectKind;
use super::entity::{Entity, EntityBody, EntityId, EntityKind, Faction};
use super::scoring::ComboState;

#[derive(Debug, Clone, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// Content id for hostiles, effect id for power-ups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub elite: bool,
    pub boss: bool,
    /// Remaining hp in `[0, 1]` for hostiles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<f32>,
    pub hostile_shot: bool,
}

impl From<&Entity> for EntityView {
    fn from(e: &Entity) -> Self {
        let mut view = EntityView {
            id: e.id,
            kind: e.kind(),
            x: e.pos.x,
            y: e.pos.y,
            radius: e.radius,
            label: None,
            elite: false,
            boss: false,
            health: None,
            hostile_shot: false,
        };
        match &e.body {
            EntityBody::Hostile(h) => {
                view.label = Some(h.def_id.clone());
                view.elite = h.is_elite;
                view.boss = h.is_boss;
                view.health = Some(if h.max_hp > 0.0 {
                    (h.hp / h.max_hp).clamp(0.0, 1.0)
                } else {
                    0.0
                });
            }
            EntityBody::PowerUp(p) => view.label = Some(p.effect.as_str().to_string()),
            EntityBody::Projectile(p) => view.hostile_shot = p.faction == Faction::Hostile,
            EntityBody::Pickup(_) => {}
        }
        view
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub hp: u32,
    pub protected: bool,
}

/// Everything a frontend needs to draw one frame
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub time: f32,
    pub score: u64,
    pub combo: ComboState,
    pub phase: String,
    pub shield_owner: Option<ShieldOwner>,
    pub heightened_stage: Option<usize>,
    pub heightened_meter: f32,
    pub effects: Vec<EffectKind>,
    pub synergies: Vec<String>,
    pub elite_active: bool,
    pub boss_active: bool,
    pub game_over: bool,
    pub player: PlayerView,
    pub entities: Vec<EntityView>,
}

impl RenderSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
