//! Hostile behaviors
//!
//! Each `AiKind` resolves to one steering function through `AiKind::behavior`.
//! Adding a kind means adding a variant and a function, nothing else.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::ARENA_HEIGHT;
use crate::direction_to;

/// Sideways oscillation for zigzag movers
const ZIGZAG_FREQUENCY: f32 = 3.0;
const ZIGZAG_AMPLITUDE: f32 = 140.0;
/// Snipers slow to a crawl once they pass this line
const SNIPER_HOLD_LINE: f32 = ARENA_HEIGHT * 0.25;
const SNIPER_HOLD_SPEED: f32 = 0.15;
const SNIPER_FIRE_INTERVAL: f32 = 1.8;
/// How fast homing kinds bend toward the player (per second)
const SWARM_TURN_RATE: f32 = 2.5;
const EXPLODER_TURN_RATE: f32 = 1.2;
/// Projectiles released when an exploder dies
const EXPLODER_BURST_COUNT: usize = 8;

/// Movement/attack pattern of a hostile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiKind {
    #[default]
    Straight,
    Zigzag,
    Sniper,
    Swarm,
    Shielded,
    Exploder,
}

/// Per-hostile behavior memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiState {
    /// Seconds since spawn
    pub age: f32,
    /// Velocity at spawn time; behaviors steer relative to it
    pub base_vel: Vec2,
    /// Offset so neighbours don't move in lockstep
    pub phase_offset: f32,
    pub fire_cooldown: f32,
}

impl AiState {
    pub fn new(base_vel: Vec2, phase_offset: f32) -> Self {
        Self {
            age: 0.0,
            base_vel,
            phase_offset,
            fire_cooldown: SNIPER_FIRE_INTERVAL * 0.5,
        }
    }
}

/// Read-only inputs for a behavior step
#[derive(Debug, Clone, Copy)]
pub struct AiContext {
    pub player_pos: Vec2,
    pub dt: f32,
}

/// Something a behavior wants the simulation to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AiAction {
    /// Fire a projectile along this unit direction
    Fire(Vec2),
}

pub type Behavior = fn(&mut AiState, Vec2, &mut Vec2, &AiContext) -> Option<AiAction>;

impl AiKind {
    /// Steering function for this kind
    pub fn behavior(self) -> Behavior {
        match self {
            AiKind::Straight | AiKind::Shielded => straight,
            AiKind::Zigzag => zigzag,
            AiKind::Sniper => sniper,
            AiKind::Swarm => swarm,
            AiKind::Exploder => exploder,
        }
    }

    /// Number of projectiles released on death, if any
    pub fn death_burst(self) -> Option<usize> {
        match self {
            AiKind::Exploder => Some(EXPLODER_BURST_COUNT),
            _ => None,
        }
    }

    /// Advance one hostile's behavior
    pub fn step(
        self,
        state: &mut AiState,
        pos: Vec2,
        vel: &mut Vec2,
        ctx: &AiContext,
    ) -> Option<AiAction> {
        state.age += ctx.dt;
        (self.behavior())(state, pos, vel, ctx)
    }
}

fn straight(
    _state: &mut AiState,
    _pos: Vec2,
    _vel: &mut Vec2,
    _ctx: &AiContext,
) -> Option<AiAction> {
    None
}

fn zigzag(state: &mut AiState, _pos: Vec2, vel: &mut Vec2, _ctx: &AiContext) -> Option<AiAction> {
    let sway = (state.age * ZIGZAG_FREQUENCY + state.phase_offset).sin() * ZIGZAG_AMPLITUDE;
    *vel = Vec2::new(state.base_vel.x + sway, state.base_vel.y);
    None
}

fn sniper(state: &mut AiState, pos: Vec2, vel: &mut Vec2, ctx: &AiContext) -> Option<AiAction> {
    *vel = if pos.y < SNIPER_HOLD_LINE {
        state.base_vel
    } else {
        state.base_vel * SNIPER_HOLD_SPEED
    };

    // Only shoot once on screen
    if pos.y < 0.0 {
        return None;
    }
    state.fire_cooldown -= ctx.dt;
    if state.fire_cooldown > 0.0 {
        return None;
    }
    state.fire_cooldown = SNIPER_FIRE_INTERVAL;
    let dir = direction_to(pos, ctx.player_pos);
    if dir == Vec2::ZERO {
        None
    } else {
        Some(AiAction::Fire(dir))
    }
}

fn home(state: &AiState, pos: Vec2, vel: &mut Vec2, ctx: &AiContext, turn_rate: f32) {
    let dir = direction_to(pos, ctx.player_pos);
    if dir == Vec2::ZERO {
        return;
    }
    let desired = dir * state.base_vel.length();
    let t = (turn_rate * ctx.dt).clamp(0.0, 1.0);
    *vel = vel.lerp(desired, t);
}

fn swarm(state: &mut AiState, pos: Vec2, vel: &mut Vec2, ctx: &AiContext) -> Option<AiAction> {
    home(state, pos, vel, ctx, SWARM_TURN_RATE);
    None
}

fn exploder(state: &mut AiState, pos: Vec2, vel: &mut Vec2, ctx: &AiContext) -> Option<AiAction> {
    home(state, pos, vel, ctx, EXPLODER_TURN_RATE);
    None
}

/// Evenly spaced unit directions for a death burst
pub fn burst_directions(count: usize, rotation: f32) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let angle = rotation + i as f32 * std::f32::consts::TAU / count.max(1) as f32;
            Vec2::new(angle.cos(), angle.sin())
        })
        .collect()
}
