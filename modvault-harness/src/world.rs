//! Loose item entities.

use modvault_core::ItemEntity;
use modvault_registry::ItemStack;
use modvault_utils::Vector3;

struct Spawned {
    world: String,
    entity: ItemEntity,
}

/// Item entities lying around, across any number of worlds.
#[derive(Default)]
pub struct TestWorld {
    entities: Vec<Spawned>,
    next_entity_id: i32,
}

impl TestWorld {
    /// Drops `stack` at `pos` and returns the new entity id.
    pub fn spawn(&mut self, world: &str, stack: ItemStack, pos: Vector3<f64>) -> i32 {
        self.next_entity_id += 1;
        let entity_id = self.next_entity_id;
        self.entities.push(Spawned {
            world: world.to_string(),
            entity: ItemEntity {
                entity_id,
                stack,
                pos,
            },
        });
        entity_id
    }

    /// The entity with `entity_id`, if it still exists.
    #[must_use]
    pub fn entity(&self, entity_id: i32) -> Option<&ItemEntity> {
        self.entities
            .iter()
            .map(|spawned| &spawned.entity)
            .find(|entity| entity.entity_id == entity_id)
    }

    /// Number of entities left.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entities are left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities within `radius` of `center`, oldest first, at most `limit`.
    #[must_use]
    pub fn nearby(
        &self,
        world: &str,
        center: Vector3<f64>,
        radius: f64,
        limit: usize,
    ) -> Vec<ItemEntity> {
        self.entities
            .iter()
            .filter(|spawned| spawned.world == world && center.is_within(&spawned.entity.pos, radius))
            .take(limit)
            .map(|spawned| spawned.entity.clone())
            .collect()
    }

    /// Replaces an entity's stack; an empty stack removes it.
    pub fn update(&mut self, entity_id: i32, remaining: ItemStack) {
        let Some(index) = self
            .entities
            .iter()
            .position(|spawned| spawned.entity.entity_id == entity_id)
        else {
            log::debug!("Item entity {entity_id} is gone");
            return;
        };
        if remaining.is_empty() {
            self.entities.remove(index);
        } else {
            self.entities[index].entity.stack = remaining;
        }
    }
}
