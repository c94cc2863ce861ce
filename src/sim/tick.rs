//! Fixed timestep simulation tick
//!
//! Core game loop. Every component advances in the same order each frame:
//! difficulty and phase, scheduled tasks, player, AI and movement, collision
//! resolution, countdowns, synergies, cleanup, and finally event delivery.

use glam::Vec2;
use rand::Rng;

use super::ai::{AiAction, AiContext, burst_directions};
use super::arbiter::ShieldOwner;
use super::collision::{self, Hit, Interaction};
use super::effects::{EffectKind, SynergyBonus};
use super::entity::{Entity, EntityBody, EntityId, EntityKind, Faction, PickupKind, ProjectileData};
use super::events::GameEvent;
use super::heightened::HeightenedTransition;
use super::missions::ProgressTracker;
use super::scaling::DifficultyState;
use super::scoring::ScoreSource;
use super::spawner::{self, SpawnContext};
use super::state::{GameState, SimTask};
use super::style::StyleAward;
use super::world::World;
use crate::consts::*;
use crate::{clamp_dt, direction_to, is_off_bounds};

/// Autopilot reacts to threats inside this radius
const AUTOPILOT_DANGER_RADIUS: f32 = 120.0;
const AUTOPILOT_DODGE_DISTANCE: f32 = 90.0;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Point the player steers toward (arena coordinates)
    pub move_target: Option<Vec2>,
    /// Hold to shoot
    pub fire: bool,
    /// Treat the player as invincible regardless of the shield (debug)
    pub invincible_override: bool,
    /// Demo mode - a simple bot steers and shoots
    pub autopilot: bool,
}

/// Advance the game state by one timestep
pub fn tick<P: ProgressTracker>(state: &mut GameState<P>, input: &TickInput, dt: f32) {
    state.frame_events.clear();
    if state.game_over {
        return;
    }
    let dt = clamp_dt(dt);
    state.time_ticks += 1;
    state.world.reset_consumed();

    let mut input = input.clone();
    if input.autopilot {
        autopilot(state, &mut input);
    }

    update_difficulty(state, dt);
    run_scheduled(state, dt);
    update_player(state, &input, dt);
    update_entities(state, dt);
    resolve_player_hits(state, &input);
    resolve_shot_hits(state);
    tick_countdowns(state, dt);
    resolve_synergies(state);

    for kind in EntityKind::ALL {
        state.world.remove_where(kind, |e| is_off_bounds(e.pos));
    }
    state.world.compact();

    finish_frame(state);
}

fn update_difficulty<P: ProgressTracker>(state: &mut GameState<P>, dt: f32) {
    let elapsed = state.scheduler.now() + dt;
    state.difficulty = DifficultyState::at(&state.tuning.difficulty, elapsed);

    let changes = state
        .phase
        .update(&state.tuning.phases, elapsed, state.score.score());
    for change in changes {
        let name = |idx: usize| {
            state
                .tuning
                .phases
                .get(idx)
                .map(|p| p.id.clone())
                .unwrap_or_default()
        };
        let (from, to) = (name(change.from), name(change.to));
        log::info!("Phase {} -> {} at {:.1}s", from, to, elapsed);
        state.emit(GameEvent::PhaseChanged {
            from,
            to,
            index: change.to,
        });
    }
    spawn_phase_boss(state);

    let rate = state.difficulty.spawn_rate_multiplier;
    state
        .spawner
        .rearm(&state.tuning.spawn_intervals, rate, &mut state.scheduler, SimTask::Spawn);
}

fn spawn_phase_boss<P: ProgressTracker>(state: &mut GameState<P>) {
    let idx = state.phase.current_phase;
    if state.boss_spawned_for == Some(idx) {
        return;
    }
    state.boss_spawned_for = Some(idx);
    let Some(phase) = state.tuning.phases.get(idx) else {
        return;
    };
    let Some(boss) = phase.boss.as_deref() else {
        return;
    };
    let ctx = SpawnContext {
        tuning: &state.tuning,
        phase,
        difficulty: &state.difficulty,
    };
    if let Some(id) = spawner::spawn_boss(boss, &ctx, &mut state.rng, &mut state.world) {
        log::info!("Boss {} entered", boss);
        state.emit(GameEvent::BossSpawned { id });
    }
}

fn run_scheduled<P: ProgressTracker>(state: &mut GameState<P>, dt: f32) {
    let fired = state.scheduler.advance(dt);
    let now = state.scheduler.now();
    for task in fired {
        match task {
            SimTask::Spawn(category) => {
                if let Some(phase) = state.tuning.phases.get(state.phase.current_phase) {
                    let ctx = SpawnContext {
                        tuning: &state.tuning,
                        phase,
                        difficulty: &state.difficulty,
                    };
                    spawner::spawn(category, &ctx, &mut state.rng, &mut state.world);
                }
                state
                    .spawner
                    .on_fired(category, &mut state.scheduler, SimTask::Spawn(category));
            }
            SimTask::ShieldExpire(owner) => {
                let change = state.shield.expire(owner, &mut state.scheduler);
                state.report_shield_change(change);
            }
            SimTask::EffectExpire(effect) => {
                if state.effects.expire(effect, now) {
                    log::debug!("Effect {} expired", effect.as_str());
                    state.emit(GameEvent::EffectExpired { effect });
                }
            }
            SimTask::HeightenedStageEnd(generation) => {
                if let Some(transition) = state.heightened.stage_expired(generation) {
                    apply_heightened(state, transition);
                }
            }
        }
    }
}

fn update_player<P: ProgressTracker>(state: &mut GameState<P>, input: &TickInput, dt: f32) {
    let overdrive = state.effects.contains(EffectKind::Overdrive);
    let speed = PLAYER_MAX_SPEED * if overdrive { OVERDRIVE_SPEED_FACTOR } else { 1.0 };
    match input.move_target {
        Some(target) => state.player.move_toward(target, dt, speed),
        None => state.player.vel = Vec2::ZERO,
    }
    state.player.tick(dt);

    let cooldown = PLAYER_FIRE_COOLDOWN * if overdrive { OVERDRIVE_FIRE_FACTOR } else { 1.0 };
    if input.fire && state.player.try_fire(cooldown) {
        let muzzle = state.player.pos - Vec2::new(0.0, state.player.radius);
        spawn_projectile(
            &mut state.world,
            muzzle,
            Vec2::new(0.0, -PLAYER_SHOT_SPEED),
            Faction::Player,
        );
    }
}

/// Insert a projectile and return its id
pub fn spawn_projectile(
    world: &mut World,
    pos: Vec2,
    vel: Vec2,
    faction: Faction,
) -> Option<EntityId> {
    let (radius, damage) = match faction {
        Faction::Player => (PLAYER_SHOT_RADIUS, PLAYER_SHOT_DAMAGE),
        Faction::Hostile => (HOSTILE_SHOT_RADIUS, 1.0),
    };
    let id = world.next_entity_id();
    world.add(Entity::new(
        id,
        pos,
        vel,
        radius,
        EntityBody::Projectile(ProjectileData { faction, damage }),
    ))
}

fn update_entities<P: ProgressTracker>(state: &mut GameState<P>, dt: f32) {
    let slow = if state.effects.contains(EffectKind::SlowMotion) {
        SLOW_MOTION_FACTOR
    } else {
        1.0
    };
    let player_pos = state.player.pos;
    let ctx = AiContext {
        player_pos,
        dt: dt * slow,
    };

    let mut shots = Vec::new();
    state.world.for_each(EntityKind::Hostile, |e| {
        if let EntityBody::Hostile(h) = &mut e.body {
            if let Some(AiAction::Fire(dir)) = h.ai.step(&mut h.ai_state, e.pos, &mut e.vel, &ctx) {
                shots.push((e.pos, dir));
            }
        }
        e.advance(dt, slow);
    });
    for (pos, dir) in shots {
        spawn_projectile(&mut state.world, pos, dir * HOSTILE_SHOT_SPEED, Faction::Hostile);
    }

    state.world.for_each(EntityKind::Projectile, |e| {
        let scale = if e.is_hostile_shot() { slow } else { 1.0 };
        e.advance(dt, scale);
    });

    let magnet = state.effects.contains(EffectKind::Magnet);
    state.world.for_each(EntityKind::Pickup, |e| {
        e.advance(dt, 1.0);
        if magnet {
            e.pos +=
                collision::magnet_pull(e.pos, player_pos, MAGNET_RADIUS, MAGNET_PULL_SPEED, dt);
        }
    });
    state.world.for_each(EntityKind::PowerUp, |e| e.advance(dt, 1.0));
}

fn resolve_player_hits<P: ProgressTracker>(state: &mut GameState<P>, input: &TickInput) {
    let hits =
        collision::detect_player_hits(&mut state.world, state.player.pos, state.player.radius);
    for hit in hits {
        if state.game_over {
            break;
        }
        match hit.interaction {
            Interaction::Collect => collect_pickup(state, hit.entity),
            Interaction::PowerUp => collect_power_up(state, hit.entity),
            Interaction::Contact => contact(state, &hit, input.invincible_override),
            Interaction::Shot { .. } => {}
        }
    }
}

fn collect_pickup<P: ProgressTracker>(state: &mut GameState<P>, id: EntityId) {
    let Some(e) = state.world.get_mut(id) else {
        return;
    };
    e.active = false;
    let Some(pickup) = e.pickup() else {
        return;
    };
    let (kind, value) = (pickup.kind, pickup.base_value);

    state.award(value, ScoreSource::Pickup, false);
    state.emit(GameEvent::PickupCollected { kind, value });
    if kind == PickupKind::Coin {
        let charge = state.heightened.charge_for_coin();
        add_heightened_charge(state, charge);
    }
}

fn collect_power_up<P: ProgressTracker>(state: &mut GameState<P>, id: EntityId) {
    let Some(e) = state.world.get_mut(id) else {
        return;
    };
    e.active = false;
    let Some(power_up) = e.power_up() else {
        return;
    };
    let (effect, duration) = (power_up.effect, power_up.duration);

    state
        .effects
        .activate(effect, duration, &mut state.scheduler, SimTask::EffectExpire(effect));
    log::debug!("Effect {} for {:.1}s", effect.as_str(), duration);
    state.emit(GameEvent::PowerUpCollected { effect });
    if effect == EffectKind::Shield {
        state.request_shield(ShieldOwner::ShieldPowerUp, duration);
    }
}

fn contact<P: ProgressTracker>(state: &mut GameState<P>, hit: &Hit, invincible_override: bool) {
    let protected = state
        .player
        .is_protected(state.shield.is_active(), invincible_override);
    match hit.kind {
        EntityKind::Projectile => {
            if let Some(e) = state.world.get_mut(hit.entity) {
                e.active = false;
            }
            if !protected {
                damage_player(state);
            }
        }
        EntityKind::Hostile => {
            let boss = state
                .world
                .get(hit.entity)
                .and_then(|e| e.hostile())
                .is_some_and(|h| h.is_boss);
            match (protected, boss) {
                // Ram kill
                (true, false) => kill_hostile(state, hit.entity, false),
                // Bosses shrug off rams
                (true, true) => {}
                (false, _) => {
                    damage_player(state);
                    if !boss {
                        if let Some(e) = state.world.get_mut(hit.entity) {
                            e.active = false;
                        }
                    }
                }
            }
        }
        EntityKind::Pickup | EntityKind::PowerUp => {}
    }
}

fn damage_player<P: ProgressTracker>(state: &mut GameState<P>) {
    let dead = state.player.take_hit();
    state.style.record_damage();
    let hp = state.player.hp;
    state.emit(GameEvent::PlayerHit { hp });
    if dead {
        state.game_over = true;
        let score = state.score.score();
        log::info!("Game over at {:.1}s with {} points", state.scheduler.now(), score);
        state.emit(GameEvent::GameOver { score });
    }
}

fn resolve_shot_hits<P: ProgressTracker>(state: &mut GameState<P>) {
    let hits = collision::detect_shot_hits(&mut state.world);
    for hit in hits {
        let Interaction::Shot { projectile, critical } = hit.interaction else {
            continue;
        };
        let damage = state
            .world
            .get_mut(projectile)
            .and_then(|shot| {
                shot.active = false;
                shot.projectile().map(|p| p.damage)
            })
            .unwrap_or(PLAYER_SHOT_DAMAGE);
        let killed = state
            .world
            .get_mut(hit.entity)
            .and_then(|e| e.hostile_mut())
            .is_some_and(|h| h.take_damage(damage));
        if killed {
            kill_hostile(state, hit.entity, critical);
        }
    }
}

/// Remove a hostile and pay out everything a kill earns
fn kill_hostile<P: ProgressTracker>(state: &mut GameState<P>, id: EntityId, critical: bool) {
    let Some(e) = state.world.get_mut(id) else {
        return;
    };
    if !e.active {
        return;
    }
    e.active = false;
    let pos = e.pos;
    let Some(h) = e.hostile() else {
        return;
    };
    let (score_value, elite, boss, burst) =
        (h.score_value, h.is_elite, h.is_boss, h.ai.death_burst());

    let combo = state.combo.register_kill();
    state.emit(GameEvent::ComboChanged {
        streak: combo.kill_streak,
        multiplier: combo.multiplier,
    });
    state.award(score_value, ScoreSource::Kill, critical);

    let now = state.scheduler.now();
    for award in state.style.record_kill(now, elite) {
        apply_style(state, award);
    }

    if boss {
        log::info!("Boss #{} defeated", id);
    }
    state.emit(GameEvent::EnemyDeath {
        id,
        x: pos.x,
        y: pos.y,
        elite,
        boss,
    });

    if let Some(count) = burst {
        let rotation = state.rng.random_range(0.0..std::f32::consts::TAU);
        for dir in burst_directions(count, rotation) {
            spawn_projectile(&mut state.world, pos, dir * HOSTILE_SHOT_SPEED, Faction::Hostile);
        }
    }

    let charge = state.heightened.charge_for_kill();
    add_heightened_charge(state, charge);
}

fn apply_style<P: ProgressTracker>(state: &mut GameState<P>, award: StyleAward) {
    log::info!("Style bonus {} (+{})", award.kind.as_str(), award.points);
    state.award(award.points, ScoreSource::StyleBonus, false);
    state.emit(GameEvent::StyleBonus {
        kind: award.kind,
        points: award.points,
    });
}

fn add_heightened_charge<P: ProgressTracker>(state: &mut GameState<P>, amount: f32) {
    let transition = state
        .heightened
        .add_charge(amount, &mut state.scheduler, SimTask::HeightenedStageEnd);
    if let Some(transition) = transition {
        apply_heightened(state, transition);
    }
}

fn apply_heightened<P: ProgressTracker>(
    state: &mut GameState<P>,
    transition: HeightenedTransition,
) {
    match transition {
        HeightenedTransition::Stage { stage, duration } => {
            state.request_shield(ShieldOwner::Heightened, duration);
            let multiplier = state.heightened.multiplier();
            state.emit(GameEvent::HeightenedStage { stage, multiplier });
        }
        HeightenedTransition::Ended { early } => {
            if early {
                let change = state
                    .shield
                    .force_release(ShieldOwner::Heightened, &mut state.scheduler);
                state.report_shield_change(change);
            }
            state.emit(GameEvent::HeightenedEnded { early });
        }
    }
}

fn tick_countdowns<P: ProgressTracker>(state: &mut GameState<P>, dt: f32) {
    if let Some(streak) = state.combo.tick(dt) {
        log::debug!("Combo of {} broken", streak);
        state.emit(GameEvent::ComboBroken { streak });
        let multiplier = state.combo.multiplier();
        state.emit(GameEvent::ComboChanged { streak: 0, multiplier });
    }

    for award in state.style.tick(dt) {
        apply_style(state, award);
    }

    let transition = state.heightened.tick(dt, &mut state.scheduler);
    if let Some(transition) = transition {
        apply_heightened(state, transition);
    }
}

fn resolve_synergies<P: ProgressTracker>(state: &mut GameState<P>) {
    let edges = state.resolver.evaluate(&state.effects);
    for edge in edges {
        let Some(rule) = state.resolver.rule(edge.rule) else {
            continue;
        };
        let (rule, bonus) = (rule.id.clone(), rule.bonus);
        if !edge.activated {
            log::info!("Effect combo {} ended", rule);
            state.emit(GameEvent::EffectComboDeactivated { rule });
            continue;
        }

        log::info!("Effect combo {} active", rule);
        match bonus {
            // Read through the resolver on every score gain
            SynergyBonus::ScoreMultiplier { .. } => {}
            SynergyBonus::Invincibility { duration } => {
                state.request_shield(ShieldOwner::SynergyBarrier, duration);
            }
            SynergyBonus::AreaPulse { radius, damage } => {
                for id in collision::hostiles_within(&state.world, state.player.pos, radius) {
                    let killed = state
                        .world
                        .get_mut(id)
                        .and_then(|e| e.hostile_mut())
                        .is_some_and(|h| h.take_damage(damage));
                    if killed {
                        kill_hostile(state, id, false);
                    }
                }
            }
        }
        state.emit(GameEvent::EffectComboActivated { rule });
    }
}

fn finish_frame<P: ProgressTracker>(state: &mut GameState<P>) {
    let mut completed = state.tracker.on_tick(state.scheduler.now());
    for event in &state.frame_events {
        completed.extend(state.tracker.observe(event));
    }
    for id in completed {
        state.emit(GameEvent::MissionComplete { id });
    }
    state.handlers.dispatch(&state.frame_events);
}

fn nearest<'a>(pos: Vec2, entities: impl Iterator<Item = &'a Entity>) -> Option<Vec2> {
    entities
        .map(|e| (e.pos.distance_squared(pos), e.pos))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, p)| p)
}

/// Demo steering: dodge the nearest threat, otherwise chase pickups, otherwise
/// line up under a hostile
fn autopilot<P: ProgressTracker>(state: &GameState<P>, input: &mut TickInput) {
    input.fire = true;
    let pos = state.player.pos;
    let world = &state.world;

    let threats = world
        .iter(EntityKind::Hostile)
        .chain(world.iter(EntityKind::Projectile).filter(|e| e.is_hostile_shot()));
    let threat = nearest(pos, threats)
        .filter(|t| t.distance_squared(pos) < AUTOPILOT_DANGER_RADIUS * AUTOPILOT_DANGER_RADIUS);
    if let Some(threat) = threat {
        let away = direction_to(threat, pos);
        let away = if away == Vec2::ZERO { Vec2::X } else { away };
        input.move_target = Some(pos + away * AUTOPILOT_DODGE_DISTANCE);
        return;
    }

    let goals = world.iter(EntityKind::PowerUp).chain(world.iter(EntityKind::Pickup));
    if let Some(goal) = nearest(pos, goals) {
        input.move_target = Some(goal);
        return;
    }

    if let Some(target) = nearest(pos, world.iter(EntityKind::Hostile)) {
        input.move_target = Some(Vec2::new(target.x, pos.y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ai::{AiKind, AiState};
    use crate::sim::entity::{HostileData, PowerUpData};
    use crate::sim::missions::{MissionBoard, MissionDef, MissionGoal, NoProgress};
    use crate::tuning::{PhaseDef, SpawnIntervals, Tuning};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn add_hostile<P: ProgressTracker>(state: &mut GameState<P>, pos: Vec2, hp: f32) -> EntityId {
        let id = state.world.next_entity_id();
        state.world.add(Entity::new(
            id,
            pos,
            Vec2::ZERO,
            14.0,
            EntityBody::Hostile(HostileData {
                def_id: "drifter".to_string(),
                hp,
                max_hp: hp,
                ai: AiKind::Straight,
                is_elite: false,
                is_boss: false,
                score_value: 100.0,
                armor: 0,
                ai_state: AiState::default(),
            }),
        ))
        .unwrap()
    }

    fn quiet_state() -> GameState<NoProgress> {
        GameState::with_tracker(42, Tuning::default(), NoProgress)
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = GameState::new(99999);
        let mut state2 = GameState::new(99999);
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };

        for _ in 0..1200 {
            tick(&mut state1, &input, SIM_DT);
            tick(&mut state2, &input, SIM_DT);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.score(), state2.score());
        assert_eq!(state1.world.total(), state2.world.total());
        assert_eq!(
            state1.snapshot().to_json().unwrap(),
            state2.snapshot().to_json().unwrap()
        );
    }

    #[test]
    fn test_spawners_populate_world() {
        let mut state = quiet_state();
        for _ in 0..180 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(state.world.len(EntityKind::Hostile) > 0);
        assert!(state.world.len(EntityKind::Pickup) > 0);
    }

    #[test]
    fn test_bad_dt_does_not_advance_clock() {
        let mut state = quiet_state();
        tick(&mut state, &TickInput::default(), f32::NAN);
        tick(&mut state, &TickInput::default(), -1.0);
        assert_eq!(state.elapsed(), 0.0);
        tick(&mut state, &TickInput::default(), 10.0);
        assert!((state.elapsed() - MAX_FRAME_DT).abs() < 1e-6);
    }

    #[test]
    fn test_shot_kill_scores_and_counts_combo() {
        let mut state = quiet_state();
        let pos = Vec2::new(200.0, 300.0);
        add_hostile(&mut state, pos, 1.0);
        let vel = Vec2::new(0.0, -PLAYER_SHOT_SPEED);
        spawn_projectile(&mut state.world, pos, vel, Faction::Player);

        tick(&mut state, &TickInput::default(), SIM_DT);

        assert_eq!(state.score(), 100);
        assert_eq!(state.combo().kill_streak, 1);
        assert!(state
            .frame_events()
            .iter()
            .any(|e| matches!(e, GameEvent::EnemyDeath { elite: false, .. })));
        assert_eq!(state.world.len(EntityKind::Hostile), 0);
        assert_eq!(state.world.len(EntityKind::Projectile), 0);
    }

    #[test]
    fn test_contact_costs_hp_then_game_over() {
        let mut state = quiet_state();
        state.player.hp = 1;
        let pos = state.player.pos;
        add_hostile(&mut state, pos, 1.0);

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.is_game_over());
        assert!(state
            .frame_events()
            .iter()
            .any(|e| matches!(e, GameEvent::GameOver { score: 0 })));

        let ticks = state.time_ticks;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, ticks);
        assert!(state.frame_events().is_empty());
    }

    #[test]
    fn test_shield_power_up_turns_contact_into_ram() {
        let mut state = quiet_state();
        let pos = state.player.pos;
        let id = state.world.next_entity_id();
        state.world.add(Entity::new(
            id,
            pos,
            Vec2::ZERO,
            12.0,
            EntityBody::PowerUp(PowerUpData {
                effect: EffectKind::Shield,
                duration: 5.0,
            }),
        ));
        add_hostile(&mut state, pos, 3.0);

        tick(&mut state, &TickInput::default(), SIM_DT);

        assert_eq!(state.shield_owner(), Some(ShieldOwner::ShieldPowerUp));
        assert_eq!(state.player.hp, PLAYER_START_HP);
        assert_eq!(state.combo().kill_streak, 1);
        assert!(state.effects.contains(EffectKind::Shield));
    }

    #[test]
    fn test_invincible_override_blocks_damage() {
        let mut state = quiet_state();
        let pos = state.player.pos;
        let shot = spawn_projectile(&mut state.world, pos, Vec2::ZERO, Faction::Hostile).unwrap();
        let input = TickInput {
            invincible_override: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.player.hp, PLAYER_START_HP);
        assert!(state.world.get(shot).is_none());
    }

    #[test]
    fn test_phase_change_reaches_handlers() {
        let tuning = Tuning {
            phases: vec![
                PhaseDef {
                    id: "first".to_string(),
                    duration: Some(0.05),
                    ..Default::default()
                },
                PhaseDef {
                    id: "second".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let mut state = GameState::with_tracker(7, tuning, NoProgress);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        state
            .handlers_mut()
            .on_phase_change(move |from, to| s.borrow_mut().push(format!("{from}->{to}")));

        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(*seen.borrow(), vec!["first->second".to_string()]);
        assert_eq!(state.phase_id(), "second");
    }

    #[test]
    fn test_boss_spawns_once_on_phase_entry() {
        let tuning = Tuning {
            phases: vec![PhaseDef {
                id: "boss_rush".to_string(),
                boss: Some("overseer".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut state = GameState::with_tracker(3, tuning, NoProgress);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.boss_active());
        assert!(state
            .frame_events()
            .iter()
            .any(|e| matches!(e, GameEvent::BossSpawned { .. })));

        tick(&mut state, &TickInput::default(), SIM_DT);
        let bosses = state
            .world
            .iter(EntityKind::Hostile)
            .filter(|e| e.hostile().is_some_and(|h| h.is_boss))
            .count();
        assert_eq!(bosses, 1);
    }

    #[test]
    fn test_mission_completes_from_kill() {
        let tuning = Tuning {
            missions: vec![MissionDef {
                id: "first_blood".to_string(),
                goal: MissionGoal::DefeatHostiles { count: 1 },
            }],
            ..Default::default()
        };
        let board = MissionBoard::new(&tuning.missions);
        let mut state = GameState::with_tracker(9, tuning, board);
        let pos = Vec2::new(100.0, 300.0);
        add_hostile(&mut state, pos, 1.0);
        spawn_projectile(&mut state.world, pos, Vec2::ZERO, Faction::Player);

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.tracker().is_completed("first_blood"));
        assert!(state
            .frame_events()
            .iter()
            .any(|e| matches!(e, GameEvent::MissionComplete { id } if id == "first_blood")));
    }

    #[test]
    fn test_area_pulse_synergy_kills_nearby() {
        let mut state = quiet_state();
        let near = state.player.pos - Vec2::new(0.0, 150.0);
        add_hostile(&mut state, near, 1.0);
        for effect in [EffectKind::Magnet, EffectKind::SlowMotion] {
            state
                .effects
                .activate(effect, 5.0, &mut state.scheduler, SimTask::EffectExpire(effect));
        }

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state
            .frame_events()
            .iter()
            .any(|e| matches!(e, GameEvent::EffectComboActivated { rule } if rule == "vortex")));
        assert_eq!(state.world.len(EntityKind::Hostile), 0);

        // Still satisfied next frame: no repeat
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(!state
            .frame_events()
            .iter()
            .any(|e| matches!(e, GameEvent::EffectComboActivated { .. })));
    }

    #[test]
    fn test_invincibility_synergy_takes_shield() {
        let tuning = Tuning {
            spawn_intervals: SpawnIntervals {
                hostile: 0.0,
                pickup: 0.0,
                power_up: 0.0,
            },
            ..Default::default()
        };
        let mut state = GameState::with_tracker(42, tuning, NoProgress);
        let owners = Rc::new(RefCell::new(Vec::new()));
        let o = owners.clone();
        state.handlers_mut().on_shield_owner_change(move |_, to| o.borrow_mut().push(to));
        for effect in [EffectKind::Overdrive, EffectKind::SlowMotion] {
            state
                .effects
                .activate(effect, 8.0, &mut state.scheduler, SimTask::EffectExpire(effect));
        }

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state
            .frame_events()
            .iter()
            .any(|e| matches!(
                e,
                GameEvent::EffectComboActivated { rule } if rule == "juggernaut"
            )));
        assert_eq!(state.shield_owner(), Some(ShieldOwner::SynergyBarrier));

        // The barrier lasts 4 seconds even though the combo is still running
        let steps = (4.2 / SIM_DT) as usize;
        for _ in 0..steps {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(state.effects.contains(EffectKind::Overdrive));
        assert_eq!(state.shield_owner(), None);
        assert_eq!(*owners.borrow(), vec![Some(ShieldOwner::SynergyBarrier), None]);
    }
}
