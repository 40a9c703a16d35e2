//! # EntityResource Spawner
//!
//! Turns a resource blob into a runtime population of live entities, in
//! three passes:
//!
//! 1. Create all entities, building the position-to-entity lookup
//! 2. Run each component block's spawn function, ascending spawn order,
//!    one call per block
//! 3. Link `parent_index` through the transform hierarchy, once every
//!    transform exists
//!
//! Spawning is not cancellable mid-flight: it completes for the whole
//! resource or returns an error. On error the world may hold a partial
//! population; rolling it back by destroying the created entities is the
//! caller's decision, not the spawner's.

use fafnir_core::{Entity, World};

use crate::blob::{EntityResource, NO_PARENT};
use crate::error::ResourceError;
use crate::registry::{ComponentRegistry, SpawnBatch};

/// Spawns every entity and component instance described by a resource blob.
///
/// Blocks whose identifier has no registered spawn function are skipped
/// over by their declared sizes with a warning - an older runtime keeps
/// loading newer resources. Within one block, instances are created in
/// array order, so creation order is reproducible given the same resource.
///
/// Returns the created entities, indexed by resource position (the same
/// lookup handed to spawn functions).
///
/// # Errors
///
/// [`ResourceError`] from parsing or from a component spawn function. On
/// error, entities created so far are *not* destroyed; rolling back is the
/// caller's responsibility.
pub fn spawn(
    world: &mut World,
    registry: &ComponentRegistry,
    bytes: &[u8],
) -> Result<Vec<Entity>, ResourceError> {
    let resource = EntityResource::parse(bytes)?;

    // Pass 1: all entities, one sweep.
    let entity_lookup: Vec<Entity> = (0..resource.num_entities)
        .map(|_| world.entities.create())
        .collect();

    // Pass 2: component blocks, ascending spawn order. Type-major blocks
    // keep instruction and data streams uniform per pass, and let an
    // unsupported type be skipped in one jump.
    let mut order: Vec<(i32, usize)> = Vec::new();
    for (position, block) in resource.blocks.iter().enumerate() {
        match registry.by_id(block.identifier) {
            Some(entry) if entry.spawn.is_some() => {
                order.push((entry.spawn_order, position));
            }
            Some(entry) => {
                tracing::warn!(
                    identifier = block.identifier,
                    name = entry.name.as_str(),
                    num_instances = block.num_instances,
                    "skipping component block with no registered spawn function"
                );
            }
            None => {
                tracing::warn!(
                    identifier = block.identifier,
                    num_instances = block.num_instances,
                    "skipping unknown component block"
                );
            }
        }
    }
    order.sort_unstable();

    for &(_, position) in &order {
        let block = &resource.blocks[position];
        // Unwraps are safe: membership in `order` required a spawn fn.
        let spawn_fn = registry
            .by_id(block.identifier)
            .and_then(|t| t.spawn.as_ref())
            .unwrap_or_else(|| unreachable!());
        spawn_fn(
            world,
            &SpawnBatch {
                entity_lookup: &entity_lookup,
                entity_index: &block.entity_index,
                payload: block.payload,
            },
        )?;
    }

    // Pass 3: hierarchy, after all transforms exist. Entities without a
    // transform ignore their parent entry.
    for (position, &parent) in resource.parent_index.iter().enumerate() {
        if parent == NO_PARENT {
            continue;
        }
        let child = world.transforms.lookup(entity_lookup[position]);
        let parent = world.transforms.lookup(entity_lookup[parent as usize]);
        if child.is_some() && parent.is_some() {
            world.transforms.set_parent(child, parent);
        }
    }

    tracing::debug!(
        num_entities = resource.num_entities,
        num_blocks = resource.blocks.len(),
        applied_blocks = order.len(),
        "spawned entity resource"
    );

    Ok(entity_lookup)
}
