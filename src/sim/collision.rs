//! Proximity detection
//!
//! Every check compares squared distance against the squared radius sum, so
//! the hot path never takes a square root. Detection only reports hits; the
//! tick loop decides what they mean. An entity that registered a hit is
//! marked consumed and ignored by later checks in the same tick.

use glam::Vec2;

use super::entity::{EntityId, EntityKind};
use super::world::World;
use crate::consts::CRIT_RADIUS_FRACTION;

/// What a detected contact means for the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    /// Player touched a pickup
    Collect,
    /// Player touched a power-up
    PowerUp,
    /// Player touched a hostile or a hostile projectile
    Contact,
    /// A player projectile struck a hostile
    Shot { projectile: EntityId, critical: bool },
}

/// A contact found this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub entity: EntityId,
    pub kind: EntityKind,
    pub interaction: Interaction,
}

/// Circle overlap on squared distance. Touching counts.
#[inline]
pub fn overlaps(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) <= reach * reach
}

/// Whether a shot landed inside the weakpoint of a hostile
#[inline]
pub fn is_critical(shot: Vec2, center: Vec2, radius: f32) -> bool {
    let core = radius * CRIT_RADIUS_FRACTION;
    shot.distance_squared(center) <= core * core
}

/// Player against everything that can touch it.
///
/// Pickups and power-ups are checked before threats so a shield collected on
/// the same frame as a contact already protects.
pub fn detect_player_hits(world: &mut World, pos: Vec2, radius: f32) -> Vec<Hit> {
    let mut hits = Vec::new();
    let passes = [
        (EntityKind::Pickup, Interaction::Collect),
        (EntityKind::PowerUp, Interaction::PowerUp),
        (EntityKind::Projectile, Interaction::Contact),
        (EntityKind::Hostile, Interaction::Contact),
    ];
    for (kind, interaction) in passes {
        for entity in world.iter_mut(kind) {
            if entity.consumed || (kind == EntityKind::Projectile && !entity.is_hostile_shot()) {
                continue;
            }
            if overlaps(pos, radius, entity.pos, entity.radius) {
                entity.consumed = true;
                hits.push(Hit {
                    entity: entity.id,
                    kind,
                    interaction,
                });
            }
        }
    }
    hits
}

/// Player projectiles against hostiles. Each shot hits at most one hostile.
pub fn detect_shot_hits(world: &mut World) -> Vec<Hit> {
    let shots: Vec<(EntityId, Vec2, f32)> = world
        .iter(EntityKind::Projectile)
        .filter(|e| e.is_player_shot() && !e.consumed)
        .map(|e| (e.id, e.pos, e.radius))
        .collect();

    let mut hits = Vec::new();
    for (shot_id, shot_pos, shot_radius) in shots {
        let Some(hostile) = world
            .iter_mut(EntityKind::Hostile)
            .find(|h| !h.consumed && overlaps(shot_pos, shot_radius, h.pos, h.radius))
        else {
            continue;
        };
        hostile.consumed = true;
        let hit = Hit {
            entity: hostile.id,
            kind: EntityKind::Hostile,
            interaction: Interaction::Shot {
                projectile: shot_id,
                critical: is_critical(shot_pos, hostile.pos, hostile.radius),
            },
        };
        if let Some(shot) = world.get_mut(shot_id) {
            shot.consumed = true;
        }
        hits.push(hit);
    }
    hits
}

/// Active hostiles within `radius` of `center`
pub fn hostiles_within(world: &World, center: Vec2, radius: f32) -> Vec<EntityId> {
    world
        .iter(EntityKind::Hostile)
        .filter(|h| overlaps(center, radius, h.pos, 0.0))
        .map(|h| h.id)
        .collect()
}

/// Displacement pulling `pos` toward `center` this step.
///
/// Zero outside `reach` and when the points coincide. Never overshoots.
pub fn magnet_pull(pos: Vec2, center: Vec2, reach: f32, speed: f32, dt: f32) -> Vec2 {
    let delta = center - pos;
    let dist_sq = delta.length_squared();
    if dist_sq > reach * reach || dist_sq <= f32::EPSILON || !dist_sq.is_finite() {
        return Vec2::ZERO;
    }
    let dist = dist_sq.sqrt();
    let step = (speed * dt).clamp(0.0, dist);
    delta / dist * step
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ai::{AiKind, AiState};
    use crate::sim::entity::{
        Entity, EntityBody, Faction, HostileData, PickupData, PickupKind, ProjectileData,
    };

    fn add_hostile(world: &mut World, pos: Vec2, radius: f32) -> EntityId {
        let id = world.next_entity_id();
        world.add(Entity::new(
            id,
            pos,
            Vec2::ZERO,
            radius,
            EntityBody::Hostile(HostileData {
                def_id: "drifter".to_string(),
                hp: 1.0,
                max_hp: 1.0,
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

    fn add_shot(world: &mut World, pos: Vec2, faction: Faction) -> EntityId {
        let id = world.next_entity_id();
        world.add(Entity::new(
            id,
            pos,
            Vec2::ZERO,
            4.0,
            EntityBody::Projectile(ProjectileData { faction, damage: 1.0 }),
        ))
        .unwrap()
    }

    fn add_coin(world: &mut World, pos: Vec2) -> EntityId {
        let id = world.next_entity_id();
        world.add(Entity::new(
            id,
            pos,
            Vec2::ZERO,
            8.0,
            EntityBody::Pickup(PickupData {
                kind: PickupKind::Coin,
                base_value: 10.0,
            }),
        ))
        .unwrap()
    }

    #[test]
    fn test_overlap_boundary() {
        // Exactly touching
        assert!(overlaps(Vec2::ZERO, 3.0, Vec2::new(5.0, 0.0), 2.0));
        assert!(!overlaps(Vec2::ZERO, 3.0, Vec2::new(5.01, 0.0), 2.0));
        assert!(overlaps(Vec2::ONE, 0.0, Vec2::ONE, 0.0));
    }

    #[test]
    fn test_player_hits_mark_consumed() {
        let mut world = World::new();
        let coin = add_coin(&mut world, Vec2::new(10.0, 0.0));
        add_coin(&mut world, Vec2::new(500.0, 0.0));
        let hostile = add_hostile(&mut world, Vec2::new(0.0, 10.0), 10.0);
        // Player's own shots never hurt the player
        add_shot(&mut world, Vec2::ZERO, Faction::Player);

        let hits = detect_player_hits(&mut world, Vec2::ZERO, 10.0);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entity, coin);
        assert_eq!(hits[0].interaction, Interaction::Collect);
        assert_eq!(hits[1].entity, hostile);
        assert_eq!(hits[1].interaction, Interaction::Contact);

        // Same tick: nothing registers twice
        assert!(detect_player_hits(&mut world, Vec2::ZERO, 10.0).is_empty());

        world.reset_consumed();
        assert_eq!(detect_player_hits(&mut world, Vec2::ZERO, 10.0).len(), 2);
    }

    #[test]
    fn test_hostile_shot_hits_player() {
        let mut world = World::new();
        let shot = add_shot(&mut world, Vec2::new(12.0, 0.0), Faction::Hostile);
        let hits = detect_player_hits(&mut world, Vec2::ZERO, 10.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity, shot);
        assert_eq!(hits[0].kind, EntityKind::Projectile);
    }

    #[test]
    fn test_shot_hits_one_hostile_and_flags_crit() {
        let mut world = World::new();
        let a = add_hostile(&mut world, Vec2::new(100.0, 100.0), 20.0);
        let b = add_hostile(&mut world, Vec2::new(105.0, 100.0), 20.0);
        let shot = add_shot(&mut world, Vec2::new(101.0, 100.0), Faction::Player);
        let graze = add_shot(&mut world, Vec2::new(120.0, 110.0), Faction::Player);

        let hits = detect_shot_hits(&mut world);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entity, a);
        assert_eq!(
            hits[0].interaction,
            Interaction::Shot {
                projectile: shot,
                critical: true
            }
        );
        // `a` is consumed, so the second shot lands on `b`, off-center
        assert_eq!(hits[1].entity, b);
        assert_eq!(
            hits[1].interaction,
            Interaction::Shot {
                projectile: graze,
                critical: false
            }
        );
    }

    #[test]
    fn test_magnet_pull_guards_zero_distance() {
        let p = Vec2::new(50.0, 50.0);
        assert_eq!(magnet_pull(p, p, 100.0, 500.0, 0.1), Vec2::ZERO);
        // Out of reach
        assert_eq!(magnet_pull(Vec2::ZERO, Vec2::new(300.0, 0.0), 100.0, 500.0, 0.1), Vec2::ZERO);
        // Never overshoots the center
        let step = magnet_pull(Vec2::ZERO, Vec2::new(10.0, 0.0), 100.0, 500.0, 0.1);
        assert!((step - Vec2::new(10.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_hostiles_within_radius() {
        let mut world = World::new();
        let near = add_hostile(&mut world, Vec2::new(30.0, 40.0), 10.0);
        add_hostile(&mut world, Vec2::new(300.0, 0.0), 10.0);
        assert_eq!(hostiles_within(&world, Vec2::ZERO, 50.0), vec![near]);
    }
}
