//! # Component Framework
//!
//! Every component type is owned, for all entities, by exactly one manager.
//! A manager keeps its data in dense index-parallel arrays, reached through
//! an opaque [`Instance`] index, and stays dense by swap-erasing on destroy.
//!
//! ## Design Philosophy
//!
//! - `update()`-style work is one batch pass over the arrays in index order,
//!   never a virtual call per object
//! - The [`EntityManager`](crate::EntityManager) does not notify managers of
//!   death; POD managers reclaim through the lazy [`gc`] probe instead
//! - An [`Instance`] is only meaningful inside the manager that issued it,
//!   and does not survive structural mutation
//!
//! [`gc`]: DataComponentManager::gc

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use rand::Rng;

use crate::config::CoreConfig;
use crate::entity::{Entity, EntityManager};

/// Opaque index into one component manager's dense arrays.
///
/// Meaningless outside the issuing manager. Swap-erase relocates instances,
/// so callers must not retain `Instance` values across structural mutation -
/// re-run [`DataComponentManager::lookup`] instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Instance(u32);

impl Instance {
    /// Sentinel meaning "no instance" / "no link".
    pub const NONE: Self = Self(u32::MAX);

    /// Creates an instance from a raw slot index.
    #[inline]
    #[must_use]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the slot index as a usize for array access.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Checks whether this is the "no instance" sentinel.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Checks whether this refers to an actual slot.
    #[inline]
    #[must_use]
    pub const fn is_some(self) -> bool {
        !self.is_none()
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::NONE
    }
}

/// Marker trait for component data.
///
/// Components must be:
/// - `Copy`: No heap allocations, bitwise copyable
/// - `Pod` / `Zeroable`: Plain old data, byte-exact in resource payloads
/// - `Default`: Zero/default-initialized on create
///
/// `NAME` is the authoring-time identifier; the resource pipeline hashes it
/// into the on-disk `component_identifier`.
pub trait Component: Copy + Pod + Zeroable + Default + Send + Sync + 'static {
    /// Stable authoring-time name of this component type.
    const NAME: &'static str;
}

/// Entity-to-instance mapping with two storage strategies.
///
/// Use [`InstanceMap::direct`] when nearly every entity carries the
/// component (one slot per entity index), [`InstanceMap::sparse`] otherwise
/// (hash map, the default).
pub struct InstanceMap {
    kind: MapKind,
}

enum MapKind {
    /// Indexed by entity index. Entries for absent entities are NONE.
    Direct(Vec<Instance>),
    /// Keyed by full entity handle.
    Sparse(HashMap<Entity, Instance>),
}

impl InstanceMap {
    /// Creates a direct-array map, for near-universal components.
    #[must_use]
    pub fn direct() -> Self {
        Self {
            kind: MapKind::Direct(Vec::new()),
        }
    }

    /// Creates a hash-map backed map, for sparse components.
    #[must_use]
    pub fn sparse() -> Self {
        Self {
            kind: MapKind::Sparse(HashMap::new()),
        }
    }

    /// Looks up the instance owned by an entity, NONE if absent. O(1) average.
    #[inline]
    #[must_use]
    pub fn get(&self, e: Entity) -> Instance {
        match &self.kind {
            MapKind::Direct(slots) => slots
                .get(e.index() as usize)
                .copied()
                .unwrap_or(Instance::NONE),
            MapKind::Sparse(map) => map.get(&e).copied().unwrap_or(Instance::NONE),
        }
    }

    /// Records that `e` owns instance `i`.
    pub fn set(&mut self, e: Entity, i: Instance) {
        match &mut self.kind {
            MapKind::Direct(slots) => {
                let index = e.index() as usize;
                if index >= slots.len() {
                    slots.resize(index + 1, Instance::NONE);
                }
                slots[index] = i;
            }
            MapKind::Sparse(map) => {
                map.insert(e, i);
            }
        }
    }

    /// Removes the entry for `e`, if any.
    pub fn remove(&mut self, e: Entity) {
        match &mut self.kind {
            MapKind::Direct(slots) => {
                if let Some(slot) = slots.get_mut(e.index() as usize) {
                    *slot = Instance::NONE;
                }
            }
            MapKind::Sparse(map) => {
                map.remove(&e);
            }
        }
    }
}

impl Default for InstanceMap {
    fn default() -> Self {
        Self::sparse()
    }
}

/// Generic dense manager for a single POD component type.
///
/// Holds index-parallel arrays (`entity[i]`, `data[i]` describe the same
/// logical instance `i`) plus an entity-to-instance map. Growth doubles
/// capacity through `Vec`; removal is swap-erase, keeping the arrays dense
/// with no holes.
///
/// Multiplicity (0, 1, or many instances per entity) is a per-manager
/// policy; this framework does not enforce it, and the map records the most
/// recently created instance for an entity.
pub struct DataComponentManager<T: Component> {
    /// Owning entity per instance, index-parallel with `data`.
    entity: Vec<Entity>,
    /// Component payload per instance.
    data: Vec<T>,
    /// Entity-to-instance map, kept in sync across swap-erase.
    map: InstanceMap,
    /// Consecutive live probes after which a GC pass concludes.
    gc_alive_streak: u32,
}

impl<T: Component> DataComponentManager<T> {
    /// Creates a manager with a sparse map and default tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&CoreConfig::default())
    }

    /// Creates a manager with a sparse map, tuned by a [`CoreConfig`].
    #[must_use]
    pub fn with_config(config: &CoreConfig) -> Self {
        Self::with_map(InstanceMap::sparse(), config)
    }

    /// Creates a manager with an explicit map strategy.
    #[must_use]
    pub fn with_map(map: InstanceMap, config: &CoreConfig) -> Self {
        Self {
            entity: Vec::new(),
            data: Vec::new(),
            map,
            gc_alive_streak: config.gc_alive_streak,
        }
    }

    /// Number of live instances.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entity.len()
    }

    /// Checks whether the manager holds no instances.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entity.is_empty()
    }

    /// Creates a default-initialized instance for `e`.
    pub fn create(&mut self, e: Entity) -> Instance {
        self.create_with(e, T::default())
    }

    /// Creates an instance for `e` with an explicit initial value.
    pub fn create_with(&mut self, e: Entity, value: T) -> Instance {
        let i = Instance::from_raw(self.entity.len() as u32);
        self.entity.push(e);
        self.data.push(value);
        self.map.set(e, i);
        i
    }

    /// Looks up the instance owned by `e`, NONE if absent. O(1) average.
    ///
    /// A direct-strategy map can hold a stale entry for a dead entity whose
    /// index `e` has recycled before lazy GC caught the old instance; such
    /// entries are filtered here, never returned.
    #[inline]
    #[must_use]
    pub fn lookup(&self, e: Entity) -> Instance {
        let i = self.map.get(e);
        if i.is_some() && self.entity[i.index()] != e {
            return Instance::NONE;
        }
        i
    }

    /// Returns the entity owning instance `i`.
    #[inline]
    #[must_use]
    pub fn entity(&self, i: Instance) -> Entity {
        self.entity[i.index()]
    }

    /// Returns the data for instance `i`.
    #[inline]
    #[must_use]
    pub fn get(&self, i: Instance) -> &T {
        &self.data[i.index()]
    }

    /// Returns mutable data for instance `i`.
    #[inline]
    pub fn get_mut(&mut self, i: Instance) -> &mut T {
        &mut self.data[i.index()]
    }

    /// All instance data in index order, for batch passes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// All instance data in index order, mutable, for batch passes.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// All owning entities in index order, parallel with [`Self::data`].
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entity
    }

    /// Destroys instance `i` by swap-erase.
    ///
    /// The last live instance moves into slot `i` and its map entry is
    /// re-pointed, so the arrays stay dense. Any previously cached
    /// [`Instance`] for the moved element is invalidated.
    pub fn destroy(&mut self, i: Instance) {
        let slot = i.index();
        let dead = self.entity[slot];
        let last = Instance::from_raw((self.entity.len() - 1) as u32);
        let moved = self.entity[last.index()];

        self.entity.swap_remove(slot);
        self.data.swap_remove(slot);
        // Under a direct map a recycled index aliases the dead entity's
        // entry with a live entity's; only clear or re-point entries that
        // actually refer to the slots touched here.
        if self.map.get(dead) == i {
            self.map.remove(dead);
        }
        if moved != dead && self.map.get(moved) == last {
            self.map.set(moved, i);
        }
    }

    /// Lazy garbage collection: reclaims instances whose entity has died.
    ///
    /// Probes pseudo-random instances and destroys dead ones, stopping after
    /// the configured number of consecutive live probes. Amortizes to O(1)
    /// when nothing is dead and converges quickly when much is.
    ///
    /// Returns the number of instances destroyed.
    pub fn gc(&mut self, entities: &EntityManager, rng: &mut impl Rng) -> usize {
        let mut alive_streak = 0;
        let mut destroyed = 0;
        while alive_streak < self.gc_alive_streak && !self.entity.is_empty() {
            let slot = rng.gen_range(0..self.entity.len());
            if entities.alive(self.entity[slot]) {
                alive_streak += 1;
            } else {
                self.destroy(Instance::from_raw(slot as u32));
                destroyed += 1;
                alive_streak = 0;
            }
        }
        destroyed
    }
}

impl<T: Component> Default for DataComponentManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Velocity component for entities.
///
/// Movement in world units per second; integrated into transform locals by
/// the world's batch update pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Velocity {
    /// X velocity component.
    pub x: f32,
    /// Y velocity component.
    pub y: f32,
    /// Z velocity component.
    pub z: f32,
    /// Padding for alignment (keeps the payload 16 bytes, SIMD-friendly).
    pub _padding: f32,
}

impl Component for Velocity {
    const NAME: &'static str = "velocity";
}

impl Velocity {
    /// Creates a new velocity.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            _padding: 0.0,
        }
    }
}
