//! # World
//!
//! The container for one simulation's entities and component managers.
//!
//! Structural mutation (create/destroy/reparent) on a world is
//! single-threaded by contract. Bulk passes like [`World::update`] walk
//! dense arrays sequentially; forking those passes across worker threads is
//! the caller's business, the core neither requires nor forbids it.

use rand::Rng;

use crate::component::{DataComponentManager, Velocity};
use crate::config::CoreConfig;
use crate::entity::EntityManager;
use crate::math::{Mat4, Vec3};
use crate::transform::TransformManager;

/// Container for all entity and component state of one simulation.
///
/// Component managers are listed as plain fields; each is the exclusive
/// owner of its buffers, and only it may resize or reindex them.
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new();
/// let e = world.entities.create();
/// world.transforms.create(e, Mat4::IDENTITY);
/// world.update(0.016);
/// ```
pub struct World {
    /// Entity identity and liveness.
    pub entities: EntityManager,
    /// Transform hierarchy manager.
    pub transforms: TransformManager,
    /// Velocity component manager.
    pub velocities: DataComponentManager<Velocity>,
}

impl World {
    /// Creates a world with default tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&CoreConfig::default())
    }

    /// Creates a world tuned by a [`CoreConfig`].
    #[must_use]
    pub fn with_config(config: &CoreConfig) -> Self {
        Self {
            entities: EntityManager::with_config(config),
            transforms: TransformManager::with_config(config),
            velocities: DataComponentManager::with_config(config),
        }
    }

    /// Integrates velocities into transform local poses.
    ///
    /// One batch pass over the velocity manager's arrays in index order -
    /// the central performance contract of the component framework. No
    /// per-object dispatch, no aliveness checks on the hot path: instances
    /// whose entity has died keep integrating until a [`World::gc`] pass
    /// reclaims them, which is harmless for POD data.
    ///
    /// # Arguments
    ///
    /// * `delta_time` - Time step in seconds
    pub fn update(&mut self, delta_time: f32) {
        for k in 0..self.velocities.len() {
            let e = self.velocities.entities()[k];
            let v = self.velocities.data()[k];
            let t = self.transforms.lookup(e);
            if t.is_none() {
                continue;
            }
            let step = Mat4::from_translation(
                Vec3::new(v.x, v.y, v.z) * delta_time,
            );
            let local = self.transforms.local(t);
            self.transforms.set_local(t, step * local);
        }
    }

    /// Runs one lazy garbage-collection pass over every component manager.
    ///
    /// O(1) amortized when nothing is dead. Returns the total number of
    /// instances reclaimed.
    pub fn gc(&mut self, rng: &mut impl Rng) -> usize {
        let mut destroyed = 0;
        destroyed += self.transforms.gc(&self.entities, rng);
        destroyed += self.velocities.gc(&self.entities, rng);
        destroyed
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
