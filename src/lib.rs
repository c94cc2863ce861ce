//! Fever Dash - A dodge-and-collect arcade simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, collisions, scoring, effects)
//! - `tuning`: Data-driven game balance and content tables

pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest frame delta fed into rate math (guards against frame hitches)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Arena dimensions (y grows downward, entities enter from the top)
    pub const ARENA_WIDTH: f32 = 480.0;
    pub const ARENA_HEIGHT: f32 = 800.0;
    /// Distance past the arena edge before an entity counts as off-bounds
    pub const OFF_BOUNDS_MARGIN: f32 = 64.0;
    /// Spawn height above the top edge
    pub const SPAWN_OFFSET: f32 = 24.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 14.0;
    pub const PLAYER_MAX_SPEED: f32 = 420.0;
    pub const PLAYER_START_HP: u32 = 3;
    /// Invulnerability after taking a hit (seconds)
    pub const PLAYER_HIT_INVULN: f32 = 1.2;
    /// Seconds between player shots
    pub const PLAYER_FIRE_COOLDOWN: f32 = 0.18;
    pub const PLAYER_SHOT_SPEED: f32 = 720.0;
    pub const PLAYER_SHOT_RADIUS: f32 = 4.0;
    pub const PLAYER_SHOT_DAMAGE: f32 = 1.0;

    /// Hostile projectile defaults
    pub const HOSTILE_SHOT_SPEED: f32 = 260.0;
    pub const HOSTILE_SHOT_RADIUS: f32 = 5.0;

    /// Elite stat scaling
    pub const ELITE_HP_MULTIPLIER: f32 = 2.5;
    pub const ELITE_SCORE_MULTIPLIER: f32 = 3.0;
    pub const ELITE_RADIUS_MULTIPLIER: f32 = 1.25;
    /// Fraction of a phase's hostile pool (strongest end) eligible for elite rolls
    pub const ELITE_POOL_FRACTION: f32 = 0.3;

    /// Share of a hostile's radius that counts as its weakpoint
    pub const CRIT_RADIUS_FRACTION: f32 = 0.35;
    /// Score multiplier applied to weakpoint kills
    pub const CRIT_MULTIPLIER: f64 = 1.5;

    /// Magnet effect reach and pull speed
    pub const MAGNET_RADIUS: f32 = 180.0;
    pub const MAGNET_PULL_SPEED: f32 = 520.0;

    /// Effect tuning
    pub const DOUBLE_SCORE_MULTIPLIER: f64 = 2.0;
    pub const SLOW_MOTION_FACTOR: f32 = 0.5;
    pub const OVERDRIVE_SPEED_FACTOR: f32 = 1.5;
    pub const OVERDRIVE_FIRE_FACTOR: f32 = 0.5;
}

/// Clamp a raw frame delta into the range the simulation accepts.
///
/// Non-finite and negative deltas become zero, large ones are capped.
#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    if !dt.is_finite() {
        return 0.0;
    }
    dt.clamp(0.0, consts::MAX_FRAME_DT)
}

/// True when a position has left the arena by more than the off-bounds margin
#[inline]
pub fn is_off_bounds(pos: Vec2) -> bool {
    use consts::*;
    pos.x < -OFF_BOUNDS_MARGIN
        || pos.x > ARENA_WIDTH + OFF_BOUNDS_MARGIN
        || pos.y < -OFF_BOUNDS_MARGIN * 2.0
        || pos.y > ARENA_HEIGHT + OFF_BOUNDS_MARGIN
}

/// Unit vector from `from` toward `to`, or zero when the points coincide
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    let delta = to - from;
    let len_sq = delta.length_squared();
    if len_sq <= f32::EPSILON || !len_sq.is_finite() {
        return Vec2::ZERO;
    }
    delta / len_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_dt() {
        assert_eq!(clamp_dt(f32::NAN), 0.0);
        assert_eq!(clamp_dt(-1.0), 0.0);
        assert_eq!(clamp_dt(5.0), consts::MAX_FRAME_DT);
        assert!((clamp_dt(0.016) - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_direction_to_zero_distance() {
        let p = Vec2::new(10.0, 10.0);
        assert_eq!(direction_to(p, p), Vec2::ZERO);
        let d = direction_to(Vec2::ZERO, Vec2::new(3.0, 4.0));
        assert!((d.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_off_bounds() {
        assert!(!is_off_bounds(Vec2::new(100.0, 100.0)));
        assert!(!is_off_bounds(Vec2::new(100.0, -40.0)));
        assert!(is_off_bounds(Vec2::new(100.0, consts::ARENA_HEIGHT + 100.0)));
    }
}
