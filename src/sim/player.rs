//! The player-controlled actor

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub hp: u32,
    /// Seconds of post-hit invulnerability left
    pub invuln: f32,
    /// Seconds until the next shot is allowed
    pub fire_cooldown: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(ARENA_WIDTH * 0.5, ARENA_HEIGHT * 0.85),
            vel: Vec2::ZERO,
            radius: PLAYER_RADIUS,
            hp: PLAYER_START_HP,
            invuln: 0.0,
            fire_cooldown: 0.0,
        }
    }
}

impl Player {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Shielded, recently hit, or forced invincible from outside
    pub fn is_protected(&self, shield_active: bool, override_flag: bool) -> bool {
        shield_active || self.invuln > 0.0 || override_flag
    }

    /// Move toward a target point, limited to `max_speed`, staying inside the arena
    pub fn move_toward(&mut self, target: Vec2, dt: f32, max_speed: f32) {
        if dt <= 0.0 {
            self.vel = Vec2::ZERO;
            return;
        }
        let target = target.clamp(
            Vec2::splat(self.radius),
            Vec2::new(ARENA_WIDTH - self.radius, ARENA_HEIGHT - self.radius),
        );
        let delta = target - self.pos;
        let max_step = max_speed.max(0.0) * dt;
        let step = delta.clamp_length_max(max_step);
        self.vel = step / dt;
        self.pos += step;
    }

    /// Count down timers
    pub fn tick(&mut self, dt: f32) {
        self.invuln = (self.invuln - dt).max(0.0);
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
    }

    /// Consume the fire cooldown. Returns true if a shot should spawn.
    pub fn try_fire(&mut self, cooldown: f32) -> bool {
        if self.fire_cooldown > 0.0 {
            return false;
        }
        self.fire_cooldown = cooldown.max(0.0);
        true
    }

    /// Take one point of damage. Returns true if that was the last one.
    pub fn take_hit(&mut self) -> bool {
        self.hp = self.hp.saturating_sub(1);
        self.invuln = PLAYER_HIT_INVULN;
        self.hp == 0
    }
}
