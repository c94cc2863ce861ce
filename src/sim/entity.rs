//! Entity types owned by the world store

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ai::{AiKind, AiState};
use super::effects::EffectKind;

pub type EntityId = u32;

/// Which world collection an entity lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Pickup,
    Hostile,
    Projectile,
    PowerUp,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Pickup,
        EntityKind::Hostile,
        EntityKind::Projectile,
        EntityKind::PowerUp,
    ];

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            EntityKind::Pickup => 0,
            EntityKind::Hostile => 1,
            EntityKind::Projectile => 2,
            EntityKind::PowerUp => 3,
        }
    }
}

/// Collectible types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    Coin,
    Gem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupData {
    pub kind: PickupKind,
    pub base_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostileData {
    /// Content id this hostile was spawned from
    pub def_id: String,
    pub hp: f32,
    pub max_hp: f32,
    pub ai: AiKind,
    pub is_elite: bool,
    pub is_boss: bool,
    pub score_value: f64,
    /// Hits absorbed before hp starts dropping
    pub armor: u32,
    pub ai_state: AiState,
}

impl HostileData {
    /// Apply damage. Returns true if this hit killed the hostile.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.hp <= 0.0 {
            return false;
        }
        if self.armor > 0 {
            self.armor -= 1;
            return false;
        }
        self.hp -= amount.max(0.0);
        self.hp <= 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Hostile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileData {
    pub faction: Faction,
    pub damage: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpData {
    pub effect: EffectKind,
    /// Seconds the effect lasts once collected
    pub duration: f32,
}

/// Variant-specific entity data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntityBody {
    Pickup(PickupData),
    Hostile(HostileData),
    Projectile(ProjectileData),
    PowerUp(PowerUpData),
}

/// A simulated entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Cleared when the entity is scheduled for removal at end of tick
    pub active: bool,
    /// Set once the entity registered a hit this tick
    #[serde(skip)]
    pub consumed: bool,
    pub body: EntityBody,
}

impl Entity {
    pub fn new(id: EntityId, pos: Vec2, vel: Vec2, radius: f32, body: EntityBody) -> Self {
        Self {
            id,
            pos,
            vel,
            radius,
            active: true,
            consumed: false,
            body,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self.body {
            EntityBody::Pickup(_) => EntityKind::Pickup,
            EntityBody::Hostile(_) => EntityKind::Hostile,
            EntityBody::Projectile(_) => EntityKind::Projectile,
            EntityBody::PowerUp(_) => EntityKind::PowerUp,
        }
    }

    pub fn hostile(&self) -> Option<&HostileData> {
        match &self.body {
            EntityBody::Hostile(h) => Some(h),
            _ => None,
        }
    }

    pub fn hostile_mut(&mut self) -> Option<&mut HostileData> {
        match &mut self.body {
            EntityBody::Hostile(h) => Some(h),
            _ => None,
        }
    }

    pub fn pickup(&self) -> Option<&PickupData> {
        match &self.body {
            EntityBody::Pickup(p) => Some(p),
            _ => None,
        }
    }

    pub fn projectile(&self) -> Option<&ProjectileData> {
        match &self.body {
            EntityBody::Projectile(p) => Some(p),
            _ => None,
        }
    }

    pub fn power_up(&self) -> Option<&PowerUpData> {
        match &self.body {
            EntityBody::PowerUp(p) => Some(p),
            _ => None,
        }
    }

    /// Hostile projectile (can hurt the player)
    pub fn is_hostile_shot(&self) -> bool {
        self.projectile().is_some_and(|p| p.faction == Faction::Hostile)
    }

    /// Player projectile (can hurt hostiles)
    pub fn is_player_shot(&self) -> bool {
        self.projectile().is_some_and(|p| p.faction == Faction::Player)
    }

    /// Integrate position
    #[inline]
    pub fn advance(&mut self, dt: f32, speed_scale: f32) {
        self.pos += self.vel * dt * speed_scale;
    }
}
