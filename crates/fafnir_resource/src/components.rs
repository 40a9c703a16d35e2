//! # Standard Component Bindings
//!
//! Compile/spawn function pairs for the component types the core ships:
//! transform and velocity. Payloads are the raw `Pod` bytes of the
//! component data, one fixed-size record per instance, decoded with
//! unaligned reads (a resource blob carries no alignment guarantee).
//!
//! Transforms spawn first (order 0): later types may look their owner's
//! transform up. The spawner links `parent_index` into the transform
//! hierarchy only after the whole transform block exists.

use std::mem::size_of;

use fafnir_core::{Mat4, Velocity};

use crate::error::{CompileError, ResourceError};
use crate::registry::{ComponentRegistry, SpawnBatch};

/// Spawn order of the transform component. First: others depend on it.
pub const TRANSFORM_SPAWN_ORDER: i32 = 0;

/// Spawn order of the velocity component.
pub const VELOCITY_SPAWN_ORDER: i32 = 10;

/// Authoring config for one transform instance.
pub struct TransformDesc {
    /// Pose relative to the parent entity (world pose for roots).
    pub local: Mat4,
}

/// Splits a block payload into per-instance records of `record_size` bytes.
///
/// # Errors
///
/// [`ResourceError::MalformedPayload`] when the payload size is not exactly
/// `num_instances * record_size`.
fn instance_records<'a>(
    batch: &SpawnBatch<'a>,
    identifier: u32,
    record_size: usize,
) -> Result<std::slice::ChunksExact<'a, u8>, ResourceError> {
    if batch.payload.len() != batch.entity_index.len() * record_size {
        return Err(ResourceError::MalformedPayload {
            identifier,
            payload_size: batch.payload.len() as u32,
            num_instances: batch.entity_index.len() as u32,
        });
    }
    Ok(batch.payload.chunks_exact(record_size))
}

/// Registers the transform compile/spawn pair with a registry.
pub fn register_transform(registry: &mut ComponentRegistry) {
    registry.register_component_compiler(
        "transform",
        Box::new(|config, payload| {
            let desc = config
                .downcast_ref::<TransformDesc>()
                .ok_or_else(|| CompileError::ConfigTypeMismatch("transform".to_owned()))?;
            payload.extend_from_slice(bytemuck::bytes_of(&desc.local));
            Ok(())
        }),
        TRANSFORM_SPAWN_ORDER,
    );

    registry.register_component_spawner(
        "transform",
        Box::new(|world, batch| {
            let id = crate::registry::component_identifier("transform");
            let records = instance_records(batch, id, size_of::<Mat4>())?;
            for (&position, record) in batch.entity_index.iter().zip(records) {
                let e = batch.entity_lookup[position as usize];
                let local: Mat4 = bytemuck::pod_read_unaligned(record);
                world.transforms.create(e, local);
            }
            Ok(())
        }),
    );
}

/// Registers the velocity compile/spawn pair with a registry.
pub fn register_velocity(registry: &mut ComponentRegistry) {
    registry.register_component_compiler(
        "velocity",
        Box::new(|config, payload| {
            let v = config
                .downcast_ref::<Velocity>()
                .ok_or_else(|| CompileError::ConfigTypeMismatch("velocity".to_owned()))?;
            payload.extend_from_slice(bytemuck::bytes_of(v));
            Ok(())
        }),
        VELOCITY_SPAWN_ORDER,
    );

    registry.register_component_spawner(
        "velocity",
        Box::new(|world, batch| {
            let id = crate::registry::component_identifier("velocity");
            let records = instance_records(batch, id, size_of::<Velocity>())?;
            for (&position, record) in batch.entity_index.iter().zip(records) {
                let e = batch.entity_lookup[position as usize];
                let v: Velocity = bytemuck::pod_read_unaligned(record);
                world.velocities.create_with(e, v);
            }
            Ok(())
        }),
    );
}
