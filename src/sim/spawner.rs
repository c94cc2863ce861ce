//! Timed entity spawning
//!
//! Each category (hostile, pickup, power-up) owns one pending scheduler task.
//! When it fires the tick loop spawns one entity from the current phase pool
//! and asks the spawner to schedule the next one.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ai::AiState;
use super::effects::EffectKind;
use super::entity::{Entity, EntityBody, EntityId, HostileData, PickupData, PowerUpData};
use super::scaling::DifficultyState;
use super::timer::{Scheduler, TimerHandle};
use super::world::World;
use crate::consts::*;
use crate::tuning::{HostileDef, PhaseDef, PoolEntry, SpawnIntervals, Tuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnCategory {
    Hostile,
    Pickup,
    PowerUp,
}

impl SpawnCategory {
    pub const ALL: [SpawnCategory; 3] =
        [SpawnCategory::Hostile, SpawnCategory::Pickup, SpawnCategory::PowerUp];

    fn index(self) -> usize {
        match self {
            SpawnCategory::Hostile => 0,
            SpawnCategory::Pickup => 1,
            SpawnCategory::PowerUp => 2,
        }
    }

    fn base_interval(self, base: &SpawnIntervals) -> f32 {
        match self {
            SpawnCategory::Hostile => base.hostile,
            SpawnCategory::Pickup => base.pickup,
            SpawnCategory::PowerUp => base.power_up,
        }
    }
}

/// Effective interval for a category at a spawn-rate multiplier.
/// `None` disables the category.
fn effective_interval(category: SpawnCategory, base: &SpawnIntervals, rate: f32) -> Option<f32> {
    let base = category.base_interval(base);
    if !(base.is_finite() && base > 0.0) {
        return None;
    }
    let rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
    Some(base / rate)
}

/// Per-category spawn timers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    timers: [Option<TimerHandle>; 3],
    intervals: [Option<f32>; 3],
    rate: f32,
}

impl Default for Spawner {
    fn default() -> Self {
        Self::new()
    }
}

impl Spawner {
    pub fn new() -> Self {
        Self {
            timers: [None; 3],
            intervals: [None; 3],
            rate: 1.0,
        }
    }

    /// Spawn-rate multiplier the current timers were built with
    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn interval(&self, category: SpawnCategory) -> Option<f32> {
        self.intervals[category.index()]
    }

    pub fn is_armed(&self, category: SpawnCategory) -> bool {
        self.timers[category.index()].is_some()
    }

    /// Start every category timer from scratch
    pub fn arm<T>(
        &mut self,
        base: &SpawnIntervals,
        rate: f32,
        sched: &mut Scheduler<T>,
        task: impl Fn(SpawnCategory) -> T,
    ) {
        self.rate = rate;
        for category in SpawnCategory::ALL {
            let idx = category.index();
            if let Some(handle) = self.timers[idx].take() {
                sched.cancel(handle);
            }
            let interval = effective_interval(category, base, rate);
            self.intervals[idx] = interval;
            self.timers[idx] = interval.map(|delay| sched.schedule(delay, task(category)));
        }
    }

    /// Rebuild the timers for a new spawn-rate multiplier.
    ///
    /// The share of the old interval already waited out carries over, so a
    /// timer that was 60% through stays 60% through on the new interval.
    /// Returns false when the multiplier is unchanged.
    pub fn rearm<T>(
        &mut self,
        base: &SpawnIntervals,
        rate: f32,
        sched: &mut Scheduler<T>,
        task: impl Fn(SpawnCategory) -> T,
    ) -> bool {
        if (rate - self.rate).abs() <= f32::EPSILON {
            return false;
        }
        for category in SpawnCategory::ALL {
            let idx = category.index();
            let new_interval = effective_interval(category, base, rate);
            let remaining = self.timers[idx].take().and_then(|handle| {
                let left = sched.remaining(handle);
                sched.cancel(handle);
                left
            });
            let delay = match (remaining, self.intervals[idx], new_interval) {
                (Some(left), Some(old), Some(new)) if old > 0.0 => left * (new / old),
                (_, _, Some(new)) => new,
                (_, _, None) => {
                    self.intervals[idx] = None;
                    continue;
                }
            };
            self.intervals[idx] = new_interval;
            self.timers[idx] = Some(sched.schedule(delay, task(category)));
        }
        log::debug!("Spawn rate x{:.2} -> x{:.2}", self.rate, rate);
        self.rate = rate;
        true
    }

    /// A category timer fired: schedule its next run
    pub fn on_fired<T>(&mut self, category: SpawnCategory, sched: &mut Scheduler<T>, task: T) {
        let idx = category.index();
        self.timers[idx] = self.intervals[idx].map(|delay| sched.schedule(delay, task));
    }

    /// Cancel every pending spawn
    pub fn disarm<T>(&mut self, sched: &mut Scheduler<T>) {
        for timer in self.timers.iter_mut() {
            if let Some(handle) = timer.take() {
                sched.cancel(handle);
            }
        }
    }
}

/// Content and scaling a spawn reads
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext<'a> {
    pub tuning: &'a Tuning,
    pub phase: &'a PhaseDef,
    pub difficulty: &'a DifficultyState,
}

/// Weighted draw. Non-positive and non-finite weights never win unless every
/// weight is unusable, in which case the draw is uniform.
pub fn pick_weighted<'a, R: Rng>(pool: &'a [PoolEntry], rng: &mut R) -> Option<&'a PoolEntry> {
    if pool.is_empty() {
        return None;
    }
    let weight = |e: &PoolEntry| if e.weight.is_finite() { e.weight.max(0.0) } else { 0.0 };
    let total: f32 = pool.iter().map(weight).sum();
    if !(total.is_finite() && total > 0.0) {
        return pool.get(rng.random_range(0..pool.len()));
    }
    let mut roll = rng.random_range(0.0..total);
    for entry in pool {
        let w = weight(entry);
        if w > 0.0 && roll < w {
            return Some(entry);
        }
        roll -= w;
    }
    // Float rounding can leave a sliver past the last entry
    pool.iter().rev().find(|e| weight(e) > 0.0)
}

/// Elite candidates: the strongest `floor(len * ELITE_POOL_FRACTION)` entries
/// of a weakest-first pool, or the whole pool when that share is empty.
pub fn elite_pool(pool: &[PoolEntry]) -> &[PoolEntry] {
    let count = (pool.len() as f32 * ELITE_POOL_FRACTION).floor() as usize;
    if count == 0 {
        pool
    } else {
        &pool[pool.len() - count.min(pool.len())..]
    }
}

fn spawn_x<R: Rng>(rng: &mut R, radius: f32) -> f32 {
    let lo = radius.clamp(0.0, ARENA_WIDTH * 0.5);
    let hi = ARENA_WIDTH - lo;
    if hi > lo {
        rng.random_range(lo..hi)
    } else {
        ARENA_WIDTH * 0.5
    }
}

/// Spawn one entity of `category` from the phase pool
pub fn spawn<R: Rng>(
    category: SpawnCategory,
    ctx: &SpawnContext,
    rng: &mut R,
    world: &mut World,
) -> Option<EntityId> {
    match category {
        SpawnCategory::Hostile => spawn_hostile(ctx, rng, world),
        SpawnCategory::Pickup => spawn_pickup(ctx, rng, world),
        SpawnCategory::PowerUp => spawn_power_up(ctx, rng, world),
    }
}

fn spawn_hostile<R: Rng>(ctx: &SpawnContext, rng: &mut R, world: &mut World) -> Option<EntityId> {
    let pool = &ctx.phase.hostiles;
    if pool.is_empty() {
        return None;
    }
    let chance = f64::from(ctx.difficulty.elite_chance);
    let elite = chance.is_finite() && rng.random_bool(chance.clamp(0.0, 1.0));
    let candidates = if elite { elite_pool(pool) } else { pool.as_slice() };
    let entry = pick_weighted(candidates, rng)?;
    let Some(def) = ctx.tuning.hostile(&entry.id) else {
        log::warn!("Phase '{}' names unknown hostile '{}'", ctx.phase.id, entry.id);
        return None;
    };
    insert_hostile(def, elite, false, ctx.difficulty, rng, world)
}

/// Spawn a phase boss at the top center
pub fn spawn_boss<R: Rng>(
    id: &str,
    ctx: &SpawnContext,
    rng: &mut R,
    world: &mut World,
) -> Option<EntityId> {
    let Some(def) = ctx.tuning.hostile(id) else {
        log::warn!("Phase '{}' names unknown boss '{}'", ctx.phase.id, id);
        return None;
    };
    insert_hostile(def, false, true, ctx.difficulty, rng, world)
}

fn insert_hostile<R: Rng>(
    def: &HostileDef,
    elite: bool,
    boss: bool,
    difficulty: &DifficultyState,
    rng: &mut R,
    world: &mut World,
) -> Option<EntityId> {
    let (hp_scale, score_scale, radius_scale) = if elite {
        (ELITE_HP_MULTIPLIER, ELITE_SCORE_MULTIPLIER, ELITE_RADIUS_MULTIPLIER)
    } else {
        (1.0, 1.0, 1.0)
    };
    let hp = (def.hp * difficulty.hp_multiplier * hp_scale).max(1.0);
    let radius = def.radius * radius_scale;
    let x = if boss { ARENA_WIDTH * 0.5 } else { spawn_x(rng, radius) };
    let vel = Vec2::new(0.0, def.speed * difficulty.speed_multiplier);
    let phase_offset = rng.random_range(0.0..std::f32::consts::TAU);

    let id = world.next_entity_id();
    let pos = Vec2::new(x, -SPAWN_OFFSET - radius);
    world.add(Entity::new(
        id,
        pos,
        vel,
        radius,
        EntityBody::Hostile(HostileData {
            def_id: def.id.clone(),
            hp,
            max_hp: hp,
            ai: def.ai,
            is_elite: elite,
            is_boss: boss,
            score_value: def.score * f64::from(score_scale),
            armor: def.armor,
            ai_state: AiState::new(vel, phase_offset),
        }),
    ))?;
    let label = if elite { "elite " } else { "" };
    log::debug!("Spawned {}{} #{} at x={:.0}", label, def.id, id, x);
    Some(id)
}

fn spawn_pickup<R: Rng>(ctx: &SpawnContext, rng: &mut R, world: &mut World) -> Option<EntityId> {
    let entry = pick_weighted(&ctx.phase.pickups, rng)?;
    let Some(def) = ctx.tuning.pickup(&entry.id) else {
        log::warn!("Phase '{}' names unknown pickup '{}'", ctx.phase.id, entry.id);
        return None;
    };
    let id = world.next_entity_id();
    let pos = Vec2::new(spawn_x(rng, def.radius), -SPAWN_OFFSET - def.radius);
    world.add(Entity::new(
        id,
        pos,
        Vec2::new(0.0, def.speed),
        def.radius,
        EntityBody::Pickup(PickupData {
            kind: def.kind,
            base_value: def.value,
        }),
    ))
}

fn spawn_power_up<R: Rng>(ctx: &SpawnContext, rng: &mut R, world: &mut World) -> Option<EntityId> {
    let entry = pick_weighted(&ctx.phase.power_ups, rng)?;
    let Some(def) = ctx.tuning.power_up(&entry.id) else {
        log::warn!("Phase '{}' names unknown power-up '{}'", ctx.phase.id, entry.id);
        return None;
    };
    let Some(effect) = EffectKind::from_id(&def.effect) else {
        log::warn!("Power-up '{}' has unknown effect '{}'", def.id, def.effect);
        return None;
    };
    let id = world.next_entity_id();
    let pos = Vec2::new(spawn_x(rng, def.radius), -SPAWN_OFFSET - def.radius);
    world.add(Entity::new(
        id,
        pos,
        Vec2::new(0.0, def.speed),
        def.radius,
        EntityBody::PowerUp(PowerUpData {
            effect,
            duration: def.duration,
        }),
    ))
}
