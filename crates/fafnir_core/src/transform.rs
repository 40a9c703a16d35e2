//! # Transform Component Manager
//!
//! Parent/child hierarchy and world-pose propagation over dense arrays.
//!
//! ## Layout
//!
//! ```text
//! entity[]:       owning entity per instance
//! local[]:        pose relative to parent
//! world[]:        pose in world space (always current)
//! parent[]:       instance index links forming an intrusive n-ary tree
//! first_child[]:    (NONE = no link; the tree is over instances,
//! next_sibling[]:    never over entities)
//! prev_sibling[]:
//! ```
//!
//! ## Policies
//!
//! - **Immediate update**: every `set_local`/`set_parent` re-derives the
//!   world pose of the whole moved subtree, so `world[]` is always accurate.
//!   Cost is O(subtree), acceptable because long simultaneously-moving
//!   chains belong in model skeletons, which live outside this tree
//! - **Swap-erase with a scratch slot**: removal moves instances through a
//!   scratch slot at index `size` so every incoming link is re-patched
//!   atomically relative to each move
//! - **Cycle policy**: debug builds assert the prospective parent is not a
//!   descendant of the child; release builds trust the resource compiler

use rand::Rng;

use crate::component::{Instance, InstanceMap};
use crate::config::CoreConfig;
use crate::entity::{Entity, EntityManager};
use crate::math::Mat4;

/// Manager for the transform component: the sole owner of hierarchy and
/// pose data for all entities.
///
/// Child lists are doubly linked for O(1) unlink; sibling order is most
/// recently parented first (prepend).
pub struct TransformManager {
    /// Owning entity per instance.
    entity: Vec<Entity>,
    /// Pose relative to the parent (world pose for roots).
    local: Vec<Mat4>,
    /// World pose; invariant: `world[i] = world[parent[i]] * local[i]`.
    world: Vec<Mat4>,
    /// Parent instance, NONE for roots.
    parent: Vec<Instance>,
    /// Head of the child list, NONE if childless.
    first_child: Vec<Instance>,
    /// Next sibling in the parent's child list.
    next_sibling: Vec<Instance>,
    /// Previous sibling in the parent's child list.
    prev_sibling: Vec<Instance>,
    /// Entity-to-instance map. Direct strategy: nearly every entity has a
    /// transform.
    map: InstanceMap,
    /// Consecutive live probes after which a GC pass concludes.
    gc_alive_streak: u32,
}

impl TransformManager {
    /// Creates an empty transform manager.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&CoreConfig::default())
    }

    /// Creates an empty transform manager tuned by a [`CoreConfig`].
    #[must_use]
    pub fn with_config(config: &CoreConfig) -> Self {
        Self {
            entity: Vec::new(),
            local: Vec::new(),
            world: Vec::new(),
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            map: InstanceMap::direct(),
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

    /// Creates a transform for `e` with no parent; world pose = local pose.
    ///
    /// Policy: at most one transform per entity (asserted in debug builds).
    pub fn create(&mut self, e: Entity, local: Mat4) -> Instance {
        debug_assert!(
            self.lookup(e).is_none(),
            "entity already has a transform"
        );
        let i = Instance::from_raw(self.entity.len() as u32);
        self.entity.push(e);
        self.local.push(local);
        self.world.push(local);
        self.parent.push(Instance::NONE);
        self.first_child.push(Instance::NONE);
        self.next_sibling.push(Instance::NONE);
        self.prev_sibling.push(Instance::NONE);
        self.map.set(e, i);
        i
    }

    /// Looks up the transform owned by `e`, NONE if absent.
    ///
    /// The direct map can hold a stale entry for a dead entity whose index
    /// `e` has recycled before lazy GC caught the old instance; such entries
    /// are filtered here, never returned.
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

    /// Returns the local pose of instance `i`.
    #[inline]
    #[must_use]
    pub fn local(&self, i: Instance) -> Mat4 {
        self.local[i.index()]
    }

    /// Returns the world pose of instance `i`. Always current - poses are
    /// re-derived immediately on every structural or local change.
    #[inline]
    #[must_use]
    pub fn world(&self, i: Instance) -> Mat4 {
        self.world[i.index()]
    }

    /// Returns the parent of instance `i`, NONE for roots.
    #[inline]
    #[must_use]
    pub fn parent(&self, i: Instance) -> Instance {
        self.parent[i.index()]
    }

    /// Returns the head of `i`'s child list, NONE if childless.
    #[inline]
    #[must_use]
    pub fn first_child(&self, i: Instance) -> Instance {
        self.first_child[i.index()]
    }

    /// Returns the sibling after `i` in its parent's child list.
    #[inline]
    #[must_use]
    pub fn next_sibling(&self, i: Instance) -> Instance {
        self.next_sibling[i.index()]
    }

    /// Sets the local pose of `i` and immediately re-derives the world pose
    /// of `i` and every descendant.
    pub fn set_local(&mut self, i: Instance, m: Mat4) {
        self.local[i.index()] = m;
        let parent_world = self.parent_world(i);
        self.transform_subtree(i, parent_world);
    }

    /// Re-parents `child` under `parent`.
    ///
    /// Unlinks `child` from its current sibling list (O(1), doubly linked),
    /// prepends it as `parent`'s new first child, and re-derives the world
    /// pose of `child`'s subtree from `parent`'s current world pose.
    ///
    /// Debug builds assert the operation does not close a cycle; release
    /// builds trust the caller.
    pub fn set_parent(&mut self, child: Instance, parent: Instance) {
        debug_assert!(child != parent, "cannot parent an instance to itself");
        debug_assert!(
            !self.is_ancestor(child, parent),
            "reparent would create a cycle"
        );

        self.unlink(child);

        let old_first = self.first_child[parent.index()];
        self.next_sibling[child.index()] = old_first;
        if old_first.is_some() {
            self.prev_sibling[old_first.index()] = child;
        }
        self.first_child[parent.index()] = child;
        self.parent[child.index()] = parent;

        let parent_world = self.world[parent.index()];
        self.transform_subtree(child, parent_world);
    }

    /// Detaches `child` from its parent, making it a root again.
    ///
    /// The subtree's world poses are re-derived with `child`'s local pose as
    /// the new root pose.
    pub fn detach(&mut self, child: Instance) {
        self.unlink(child);
        self.transform_subtree(child, Mat4::IDENTITY);
    }

    /// Destroys instance `i` by swap-erase.
    ///
    /// Children of `i` are promoted to roots keeping their current world
    /// pose (their local pose is rewritten to it). The vacated slot is then
    /// filled by the last live instance via a three-step move through a
    /// scratch slot at index `size`, so that `parent`/`first_child`/
    /// `next_sibling`/`prev_sibling` entries referring to a moved slot are
    /// re-patched atomically relative to each move - never left pointing at
    /// a stale position mid-swap.
    pub fn destroy(&mut self, i: Instance) {
        let dead_entity = self.entity[i.index()];
        self.unlink(i);

        // Promote children to roots. World poses are unchanged, so the
        // subtree invariant holds without propagation.
        let mut c = self.first_child[i.index()];
        while c.is_some() {
            let next = self.next_sibling[c.index()];
            self.parent[c.index()] = Instance::NONE;
            self.prev_sibling[c.index()] = Instance::NONE;
            self.next_sibling[c.index()] = Instance::NONE;
            self.local[c.index()] = self.world[c.index()];
            c = next;
        }
        self.first_child[i.index()] = Instance::NONE;

        // Clear the map entry and the slot's entity before the dance. Under
        // the direct map a recycled index aliases the dead entity's entry
        // with a live entity's, so only an entry still referring to this
        // slot may be removed.
        if self.map.get(dead_entity) == i {
            self.map.remove(dead_entity);
        }
        self.entity[i.index()] = Entity::NULL;

        let last = self.entity.len() - 1;
        if i.index() < last {
            // Three-step dance through the scratch slot at `size`.
            let scratch = self.push_scratch_slot();
            self.move_slot(i, scratch);
            self.move_slot(Instance::from_raw(last as u32), i);
            self.move_slot(scratch, Instance::from_raw(last as u32));
        }
        self.truncate(last);
    }

    /// Lazy garbage collection: reclaims transforms whose entity has died.
    ///
    /// Same policy as [`crate::DataComponentManager::gc`]: pseudo-random
    /// probes, stopping after the configured number of consecutive live
    /// ones. Children of reclaimed transforms are promoted to roots.
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

    /// World pose of `i`'s parent, identity for roots.
    fn parent_world(&self, i: Instance) -> Mat4 {
        let p = self.parent[i.index()];
        if p.is_none() {
            Mat4::IDENTITY
        } else {
            self.world[p.index()]
        }
    }

    /// Re-derives world poses for `i` and all descendants, iteratively.
    ///
    /// Explicit stack rather than recursion: hierarchy depth is data-driven
    /// and must not translate into call-stack pressure.
    fn transform_subtree(&mut self, i: Instance, parent_world: Mat4) {
        let mut stack = vec![(i, parent_world)];
        while let Some((node, parent_world)) = stack.pop() {
            let world = parent_world * self.local[node.index()];
            self.world[node.index()] = world;

            let mut c = self.first_child[node.index()];
            while c.is_some() {
                stack.push((c, world));
                c = self.next_sibling[c.index()];
            }
        }
    }

    /// Removes `i` from its parent's child list and clears its links.
    /// Children and subtree poses are untouched.
    fn unlink(&mut self, i: Instance) {
        let p = self.parent[i.index()];
        let prev = self.prev_sibling[i.index()];
        let next = self.next_sibling[i.index()];

        if prev.is_some() {
            self.next_sibling[prev.index()] = next;
        } else if p.is_some() {
            self.first_child[p.index()] = next;
        }
        if next.is_some() {
            self.prev_sibling[next.index()] = prev;
        }

        self.parent[i.index()] = Instance::NONE;
        self.prev_sibling[i.index()] = Instance::NONE;
        self.next_sibling[i.index()] = Instance::NONE;
    }

    /// Checks whether `a` is `b` or an ancestor of `b`. Debug-build guard
    /// for [`Self::set_parent`].
    fn is_ancestor(&self, a: Instance, b: Instance) -> bool {
        let mut node = b;
        while node.is_some() {
            if node == a {
                return true;
            }
            node = self.parent[node.index()];
        }
        false
    }

    /// Appends an empty scratch slot at index `size` and returns it.
    fn push_scratch_slot(&mut self) -> Instance {
        let scratch = Instance::from_raw(self.entity.len() as u32);
        self.entity.push(Entity::NULL);
        self.local.push(Mat4::IDENTITY);
        self.world.push(Mat4::IDENTITY);
        self.parent.push(Instance::NONE);
        self.first_child.push(Instance::NONE);
        self.next_sibling.push(Instance::NONE);
        self.prev_sibling.push(Instance::NONE);
        scratch
    }

    /// Moves the instance in slot `from` into slot `to`, re-pointing every
    /// incoming reference (map entry, parent's `first_child`, both sibling
    /// links, children's `parent`) at the new slot.
    fn move_slot(&mut self, from: Instance, to: Instance) {
        self.entity[to.index()] = self.entity[from.index()];
        self.local[to.index()] = self.local[from.index()];
        self.world[to.index()] = self.world[from.index()];
        self.parent[to.index()] = self.parent[from.index()];
        self.first_child[to.index()] = self.first_child[from.index()];
        self.next_sibling[to.index()] = self.next_sibling[from.index()];
        self.prev_sibling[to.index()] = self.prev_sibling[from.index()];

        // Re-point the map entry only when it refers to the slot being
        // vacated; an entry aliased by a recycled index belongs to a
        // different, live entity and must stay put.
        let e = self.entity[to.index()];
        if !e.is_null() && self.map.get(e) == from {
            self.map.set(e, to);
        }

        let p = self.parent[to.index()];
        if p.is_some() && self.first_child[p.index()] == from {
            self.first_child[p.index()] = to;
        }
        let prev = self.prev_sibling[to.index()];
        if prev.is_some() {
            self.next_sibling[prev.index()] = to;
        }
        let next = self.next_sibling[to.index()];
        if next.is_some() {
            self.prev_sibling[next.index()] = to;
        }
        let mut c = self.first_child[to.index()];
        while c.is_some() {
            self.parent[c.index()] = to;
            c = self.next_sibling[c.index()];
        }
    }

    /// Shrinks every parallel array to `len` after a destroy.
    fn truncate(&mut self, len: usize) {
        self.entity.truncate(len);
        self.local.truncate(len);
        self.world.truncate(len);
        self.parent.truncate(len);
        self.first_child.truncate(len);
        self.next_sibling.truncate(len);
        self.prev_sibling.truncate(len);
    }
}

impl Default for TransformManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    const EPS: f32 = 1e-5;

    fn translate(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(x, y, z))
    }

    /// Asserts `world[i] == world[parent[i]] * local[i]` for every instance.
    fn assert_pose_invariant(t: &TransformManager) {
        for raw in 0..t.len() as u32 {
            let i = Instance::from_raw(raw);
            let p = t.parent(i);
            let expected = if p.is_none() {
                t.local(i)
            } else {
                t.world(p) * t.local(i)
            };
            assert!(
                t.world(i).approx_eq(&expected, EPS),
                "pose invariant broken at slot {raw}"
            );
        }
    }

    fn children_of(t: &TransformManager, i: Instance) -> Vec<Instance> {
        let mut out = Vec::new();
        let mut c = t.first_child(i);
        while c.is_some() {
            out.push(c);
            c = t.next_sibling(c);
        }
        out
    }

    #[test]
    fn test_root_world_equals_local() {
        let mut entities = EntityManager::new();
        let mut t = TransformManager::new();
        let i = t.create(entities.create(), translate(1.0, 2.0, 3.0));
        assert!(t.world(i).approx_eq(&t.local(i), EPS));
        assert!(t.parent(i).is_none());
    }

    #[test]
    fn test_set_parent_composes_world() {
        let mut entities = EntityManager::new();
        let mut t = TransformManager::new();
        let root = t.create(entities.create(), translate(10.0, 0.0, 0.0));
        let child = t.create(entities.create(), translate(0.0, 5.0, 0.0));

        t.set_parent(child, root);
        assert_eq!(t.parent(child), root);
        assert_eq!(t.world(child).translation().to_array(), [10.0, 5.0, 0.0]);
        assert_pose_invariant(&t);
    }

    #[test]
    fn test_set_local_propagates_to_descendants() {
        let mut entities = EntityManager::new();
        let mut t = TransformManager::new();
        let root = t.create(entities.create(), translate(0.0, 0.0, 0.0));
        let mid = t.create(entities.create(), translate(1.0, 0.0, 0.0));
        let leaf = t.create(entities.create(), translate(0.0, 1.0, 0.0));
        t.set_parent(mid, root);
        t.set_parent(leaf, mid);

        t.set_local(root, translate(0.0, 0.0, 7.0));
        assert_eq!(t.world(leaf).translation().to_array(), [1.0, 1.0, 7.0]);
        assert_eq!(t.world(mid).translation().to_array(), [1.0, 0.0, 7.0]);
        assert_pose_invariant(&t);
    }

    #[test]
    fn test_child_list_prepend_and_unlink() {
        let mut entities = EntityManager::new();
        let mut t = TransformManager::new();
        let root = t.create(entities.create(), Mat4::IDENTITY);
        let a = t.create(entities.create(), Mat4::IDENTITY);
        let b = t.create(entities.create(), Mat4::IDENTITY);
        let c = t.create(entities.create(), Mat4::IDENTITY);
        t.set_parent(a, root);
        t.set_parent(b, root);
        t.set_parent(c, root);

        // Prepend order: most recently parented first.
        assert_eq!(children_of(&t, root), vec![c, b, a]);

        // Unlink the middle of the doubly linked list.
        t.detach(b);
        assert_eq!(children_of(&t, root), vec![c, a]);
        assert!(t.parent(b).is_none());
        assert_pose_invariant(&t);
    }

    #[test]
    fn test_detach_rebases_world_on_local() {
        let mut entities = EntityManager::new();
        let mut t = TransformManager::new();
        let root = t.create(entities.create(), translate(10.0, 0.0, 0.0));
        let child = t.create(entities.create(), translate(0.0, 2.0, 0.0));
        t.set_parent(child, root);

        t.detach(child);
        assert_eq!(t.world(child).translation().to_array(), [0.0, 2.0, 0.0]);
        assert_pose_invariant(&t);
    }

    #[test]
    fn test_destroy_repatches_links_and_map() {
        let mut entities = EntityManager::new();
        let mut t = TransformManager::new();
        let owners: Vec<Entity> = (0..5).map(|_| entities.create()).collect();
        let root = t.create(owners[0], Mat4::IDENTITY);
        let a = t.create(owners[1], translate(1.0, 0.0, 0.0));
        let b = t.create(owners[2], translate(2.0, 0.0, 0.0));
        let c = t.create(owners[3], translate(3.0, 0.0, 0.0));
        let d = t.create(owners[4], translate(4.0, 0.0, 0.0));
        t.set_parent(a, root);
        t.set_parent(b, root);
        t.set_parent(c, root);
        t.set_parent(d, c);

        // Destroying slot 1 (a) forces the last slot (d) through the
        // scratch dance into a's position.
        t.destroy(a);
        assert_eq!(t.len(), 4);
        assert!(t.lookup(owners[1]).is_none());

        // Every surviving entity still maps to a slot that owns it.
        for &e in &[owners[0], owners[2], owners[3], owners[4]] {
            let i = t.lookup(e);
            assert!(i.is_some());
            assert_eq!(t.entity(i), e);
        }

        // The child list of root lost exactly `a`; d is still under c.
        let root_i = t.lookup(owners[0]);
        let kids = children_of(&t, root_i);
        assert_eq!(kids.len(), 2);
        assert_eq!(t.entity(kids[0]), owners[3]);
        assert_eq!(t.entity(kids[1]), owners[2]);
        let c_i = t.lookup(owners[3]);
        let d_i = t.lookup(owners[4]);
        assert_eq!(t.parent(d_i), c_i);
        assert_eq!(t.first_child(c_i), d_i);
        assert_pose_invariant(&t);
    }

    #[test]
    fn test_destroy_promotes_children_to_roots() {
        let mut entities = EntityManager::new();
        let mut t = TransformManager::new();
        let e_root = entities.create();
        let e_mid = entities.create();
        let e_leaf = entities.create();
        let root = t.create(e_root, translate(10.0, 0.0, 0.0));
        let mid = t.create(e_mid, translate(0.0, 1.0, 0.0));
        let leaf = t.create(e_leaf, translate(0.0, 0.0, 2.0));
        t.set_parent(mid, root);
        t.set_parent(leaf, mid);

        let leaf_world_before = t.world(leaf);
        t.destroy(mid);

        let leaf_i = t.lookup(e_leaf);
        assert!(t.parent(leaf_i).is_none());
        assert!(t.world(leaf_i).approx_eq(&leaf_world_before, EPS));
        assert_pose_invariant(&t);
    }

    #[test]
    fn test_destroy_last_slot() {
        let mut entities = EntityManager::new();
        let mut t = TransformManager::new();
        let e0 = entities.create();
        let e1 = entities.create();
        t.create(e0, Mat4::IDENTITY);
        let last = t.create(e1, Mat4::IDENTITY);

        t.destroy(last);
        assert_eq!(t.len(), 1);
        assert!(t.lookup(e1).is_none());
        assert!(t.lookup(e0).is_some());
    }

    #[test]
    fn test_create_after_index_recycle() {
        use rand::SeedableRng;

        // Margin 0: a destroyed index recycles on the very next create,
        // while the dead entity's transform still occupies a slot.
        let config = CoreConfig {
            free_index_margin: 0,
            ..CoreConfig::default()
        };
        let mut entities = EntityManager::with_config(&config);
        let mut t = TransformManager::with_config(&config);

        let keeper = entities.create();
        t.create(keeper, translate(5.0, 0.0, 0.0));
        let a = entities.create();
        t.create(a, Mat4::IDENTITY);
        entities.destroy(a);

        let b = entities.create();
        assert_eq!(b.index(), a.index());
        assert!(t.lookup(b).is_none(), "stale entry leaked to the recycled entity");

        let bt = t.create(b, translate(1.0, 0.0, 0.0));
        assert_eq!(t.lookup(b), bt);

        // GC reclaims a's orphaned slot without touching the live entries.
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(9);
        for _ in 0..64 {
            t.gc(&entities, &mut rng);
        }
        assert_eq!(t.len(), 2);
        for &e in &[keeper, b] {
            let i = t.lookup(e);
            assert!(i.is_some(), "live entity lost its map entry");
            assert_eq!(t.entity(i), e);
        }
        assert_eq!(
            t.world(t.lookup(b)).translation().to_array(),
            [1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_gc_reclaims_dead_transforms() {
        use rand::SeedableRng;
        let mut entities = EntityManager::new();
        let mut t = TransformManager::new();
        let keep = entities.create();
        let drop_me = entities.create();
        t.create(keep, Mat4::IDENTITY);
        t.create(drop_me, Mat4::IDENTITY);
        entities.destroy(drop_me);

        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        let mut destroyed = 0;
        for _ in 0..16 {
            destroyed += t.gc(&entities, &mut rng);
        }
        assert_eq!(destroyed, 1);
        assert_eq!(t.len(), 1);
        assert!(t.lookup(keep).is_some());
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn test_reparent_cycle_asserts_in_debug() {
        let mut entities = EntityManager::new();
        let mut t = TransformManager::new();
        let a = t.create(entities.create(), Mat4::IDENTITY);
        let b = t.create(entities.create(), Mat4::IDENTITY);
        t.set_parent(b, a);
        t.set_parent(a, b);
    }
}
