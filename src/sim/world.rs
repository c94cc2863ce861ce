//! Entity store
//!
//! One collection per entity kind. Removal is two-step: `remove_where` only
//! clears the `active` flag, and `compact` drops inactive entities at the end
//! of the tick by walking each collection from the back. Forward iteration
//! during a tick therefore never skips or repeats an entity.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, EntityKind};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    /// Indexed by `EntityKind::index`, each sorted by id
    collections: [Vec<Entity>; 4],
    next_id: EntityId,
}

impl World {
    pub fn new() -> Self {
        Self {
            collections: Default::default(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    /// Insert an entity into the collection matching its variant.
    ///
    /// An id already stored in any collection is refused, so no entity can be
    /// visible in two places.
    pub fn add(&mut self, entity: Entity) -> Option<EntityId> {
        let id = entity.id;
        if self.get(id).is_some() {
            log::warn!("Entity id {} already in use, dropping {:?}", id, entity.kind());
            return None;
        }
        let bucket = &mut self.collections[entity.kind().index()];
        // Ids are allocated monotonically, so pushing keeps the bucket sorted
        // unless a caller hands in an out-of-order id.
        if bucket.last().is_some_and(|last| last.id > id) {
            let pos = bucket.partition_point(|e| e.id < id);
            bucket.insert(pos, entity);
        } else {
            bucket.push(entity);
        }
        if id >= self.next_id {
            self.next_id = id + 1;
        }
        Some(id)
    }

    /// Mark every active entity matching the predicate for removal.
    /// Returns how many were marked.
    pub fn remove_where<F>(&mut self, kind: EntityKind, mut predicate: F) -> usize
    where
        F: FnMut(&Entity) -> bool,
    {
        let mut marked = 0;
        for entity in self.collections[kind.index()].iter_mut() {
            if entity.active && predicate(entity) {
                entity.active = false;
                marked += 1;
            }
        }
        marked
    }

    /// Visit every active entity of a kind
    pub fn for_each<F>(&mut self, kind: EntityKind, mut f: F)
    where
        F: FnMut(&mut Entity),
    {
        for entity in self.collections[kind.index()].iter_mut() {
            if entity.active {
                f(entity);
            }
        }
    }

    /// Active entities of a kind
    pub fn iter(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.collections[kind.index()].iter().filter(|e| e.active)
    }

    /// Active entities of a kind, mutably
    pub fn iter_mut(&mut self, kind: EntityKind) -> impl Iterator<Item = &mut Entity> {
        self.collections[kind.index()]
            .iter_mut()
            .filter(|e| e.active)
    }

    /// Raw slice including entities already marked inactive this tick
    pub(crate) fn slice_mut(&mut self, kind: EntityKind) -> &mut [Entity] {
        &mut self.collections[kind.index()]
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.collections.iter().find_map(|bucket| {
            bucket
                .binary_search_by_key(&id, |e| e.id)
                .ok()
                .map(|idx| &bucket[idx])
        })
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        for bucket in self.collections.iter_mut() {
            if let Ok(idx) = bucket.binary_search_by_key(&id, |e| e.id) {
                return Some(&mut bucket[idx]);
            }
        }
        None
    }

    /// Number of active entities of a kind
    pub fn len(&self, kind: EntityKind) -> usize {
        self.iter(kind).count()
    }

    /// Total active entities across all collections
    pub fn total(&self) -> usize {
        EntityKind::ALL.iter().map(|k| self.len(*k)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Clear per-tick hit markers
    pub fn reset_consumed(&mut self) {
        for bucket in self.collections.iter_mut() {
            for entity in bucket.iter_mut() {
                entity.consumed = false;
            }
        }
    }

    /// Drop inactive entities. Returns how many were removed.
    pub fn compact(&mut self) -> usize {
        let mut removed = 0;
        for bucket in self.collections.iter_mut() {
            for idx in (0..bucket.len()).rev() {
                if !bucket[idx].active {
                    bucket.remove(idx);
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Remove everything (new run)
    pub fn clear(&mut self) {
        for bucket in self.collections.iter_mut() {
            bucket.clear();
        }
    }
}
