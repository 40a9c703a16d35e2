//! # Entity Management
//!
//! Entities are weak 32-bit identifiers consisting of:
//! - A 24-bit index into per-manager component arrays
//! - An 8-bit generation counter for detecting recycled indices
//!
//! An entity owns no memory. Liveness is answered by comparing the handle's
//! generation against the generation currently stored at its index - never by
//! dereferencing anything. A destroyed index is parked in a FIFO and only
//! reused once the FIFO holds [`EntityManager::free_index_margin`] entries,
//! so a stale handle needs `256 * margin` create/destroy cycles before it can
//! alias a new entity.

use std::collections::VecDeque;

use crate::config::CoreConfig;

/// Number of bits used for the index portion of an entity handle.
pub const ENTITY_INDEX_BITS: u32 = 24;

/// Number of bits used for the generation portion of an entity handle.
pub const ENTITY_GENERATION_BITS: u32 = 8;

/// Mask extracting the index from a raw handle.
pub const ENTITY_INDEX_MASK: u32 = (1 << ENTITY_INDEX_BITS) - 1;

/// Mask applied to the generation after shifting.
pub const ENTITY_GENERATION_MASK: u32 = (1 << ENTITY_GENERATION_BITS) - 1;

/// Unique identifier for an entity.
///
/// The handle is split into two parts:
/// - Bits `[0, 24)`: Index into component arrays
/// - Bits `[24, 32)`: Generation counter for detecting stale references
///
/// The generation wraps at 256; combined with the free-index margin this
/// bounds, but does not eliminate, the aliasing window for stale handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Entity(u32);

impl Entity {
    /// Creates an entity handle from index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - The index into component arrays (0 to 2^24-1)
    /// * `generation` - The generation counter (0 to 255)
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u8) -> Self {
        Self(((generation as u32) << ENTITY_INDEX_BITS) | (index & ENTITY_INDEX_MASK))
    }

    /// Returns the index portion of the handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 & ENTITY_INDEX_MASK
    }

    /// Returns the generation portion of the handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u8 {
        ((self.0 >> ENTITY_INDEX_BITS) & ENTITY_GENERATION_MASK) as u8
    }

    /// Null/invalid entity handle.
    pub const NULL: Self = Self(u32::MAX);

    /// Checks if this handle is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

/// Owner of entity identity and liveness.
///
/// Holds one generation byte per ever-allocated index plus a FIFO of
/// recycled indices. No component data lives here - component managers
/// discover entity death on their own (lazy GC) or through a registered
/// destruction callback.
///
/// # Example
///
/// ```rust,ignore
/// let mut entities = EntityManager::new();
/// let e = entities.create();
/// assert!(entities.alive(e));
/// entities.destroy(e);
/// assert!(!entities.alive(e));
/// ```
pub struct EntityManager {
    /// Generation currently stored at each index. `alive(e)` iff
    /// `generation[e.index] == e.generation`.
    generations: Vec<u8>,
    /// Recycled indices, oldest first. An index re-enters circulation only
    /// once this queue is longer than `free_index_margin`.
    free_indices: VecDeque<u32>,
    /// Minimum number of parked indices before any of them is reused.
    free_index_margin: usize,
    /// Callbacks invoked synchronously by [`EntityManager::destroy`], for
    /// managers holding external resources that cannot wait for lazy GC.
    destroy_callbacks: Vec<Box<dyn FnMut(Entity)>>,
}

impl EntityManager {
    /// Creates an entity manager with the default recycle margin (1024).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&CoreConfig::default())
    }

    /// Creates an entity manager tuned by a [`CoreConfig`].
    #[must_use]
    pub fn with_config(config: &CoreConfig) -> Self {
        Self {
            generations: Vec::new(),
            free_indices: VecDeque::new(),
            free_index_margin: config.free_index_margin as usize,
            destroy_callbacks: Vec::new(),
        }
    }

    /// Returns the recycle margin this manager was configured with.
    #[inline]
    #[must_use]
    pub fn free_index_margin(&self) -> usize {
        self.free_index_margin
    }

    /// Returns the number of indices ever allocated (live or parked).
    #[inline]
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.generations.len()
    }

    /// Creates a new entity.
    ///
    /// Pops the oldest recycled index once enough of them have accumulated,
    /// otherwise appends a fresh index with generation 0.
    ///
    /// # Panics
    ///
    /// Debug builds panic if the 24-bit index space is exhausted.
    pub fn create(&mut self) -> Entity {
        let index = if self.free_indices.len() > self.free_index_margin {
            // Unwrap is safe: length was just checked against the margin.
            self.free_indices.pop_front().unwrap_or_default()
        } else {
            self.generations.push(0);
            debug_assert!(
                self.generations.len() - 1 <= ENTITY_INDEX_MASK as usize,
                "entity index space exhausted"
            );
            (self.generations.len() - 1) as u32
        };
        Entity::new(index, self.generations[index as usize])
    }

    /// Checks whether an entity handle is still valid.
    ///
    /// O(1), no error cases. Passing a handle whose index was never allocated
    /// by this manager is a contract violation (asserted in debug builds).
    #[inline]
    #[must_use]
    pub fn alive(&self, e: Entity) -> bool {
        debug_assert!(
            (e.index() as usize) < self.generations.len(),
            "entity index out of range"
        );
        self.generations[e.index() as usize] == e.generation()
    }

    /// Destroys an entity.
    ///
    /// Requires `alive(e)` (asserted in debug builds; behavior is unspecified
    /// otherwise). Bumps the stored generation so every outstanding handle to
    /// this index goes stale, parks the index in the FIFO, then invokes the
    /// registered destruction callbacks synchronously. Component managers are
    /// otherwise not notified - POD managers reclaim through lazy GC.
    pub fn destroy(&mut self, e: Entity) {
        debug_assert!(self.alive(e), "destroy() on a dead entity");
        let index = e.index();
        self.generations[index as usize] = self.generations[index as usize].wrapping_add(1);
        self.free_indices.push_back(index);
        for callback in &mut self.destroy_callbacks {
            callback(e);
        }
    }

    /// Registers a callback invoked synchronously for every destroyed entity.
    ///
    /// Intended for managers holding external resources (GPU buffers, file
    /// handles) where lazy reclamation is not acceptable. POD-only managers
    /// should prefer [`crate::DataComponentManager::gc`].
    pub fn register_destroy_callback(&mut self, callback: impl FnMut(Entity) + 'static) {
        self.destroy_callbacks.push(Box::new(callback));
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}
