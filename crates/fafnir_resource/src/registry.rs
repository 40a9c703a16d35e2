//! # Component Registry
//!
//! An explicit lookup table mapping component-type names to their hashed
//! identifier, spawn order, and compile/spawn functions. The registry is an
//! ordinary object handed to [`crate::compile`] and [`crate::spawn`] at call
//! time - never a process-wide singleton - so multiple resource dialects and
//! test harnesses coexist without ceremony.
//!
//! Dispatch by component identifier is a table of closures, not virtual
//! inheritance.

use std::any::Any;
use std::collections::HashMap;

use fafnir_core::{Entity, World};

use crate::error::{CompileError, ResourceError};

/// Hashes a component-type name into its on-disk identifier.
///
/// FNV-1a, 32-bit: stable across runs, platforms, and versions, which is
/// what a persisted identifier requires.
#[must_use]
pub const fn component_identifier(name: &str) -> u32 {
    let bytes = name.as_bytes();
    let mut hash: u32 = 0x811c_9dc5;
    let mut k = 0;
    while k < bytes.len() {
        hash ^= bytes[k] as u32;
        hash = hash.wrapping_mul(0x0100_0193);
        k += 1;
    }
    hash
}

/// Compile function: turns one authoring config value into payload bytes,
/// appended to the block under construction.
///
/// The config arrives as `&dyn Any`; each compile function downcasts to the
/// concrete authoring type it expects.
pub type CompileFn = Box<dyn Fn(&dyn Any, &mut Vec<u8>) -> Result<(), CompileError>>;

/// One component type's whole block, handed to its spawn function in a
/// single call.
pub struct SpawnBatch<'a> {
    /// Real entity per resource position, built by the spawner's first pass.
    pub entity_lookup: &'a [Entity],
    /// Owning entity per instance, as resource positions. Length is the
    /// block's instance count.
    pub entity_index: &'a [u32],
    /// Raw instance payload for the whole block.
    pub payload: &'a [u8],
}

/// Spawn function: turns a whole block into `entity_index.len()` manager
/// calls, resolving owners through `entity_lookup`.
pub type SpawnFn = Box<dyn Fn(&mut World, &SpawnBatch<'_>) -> Result<(), ResourceError>>;

/// Everything the registry knows about one component type.
pub struct ComponentType {
    /// Authoring-time name.
    pub name: String,
    /// Hashed on-disk identifier.
    pub id: u32,
    /// Topological order among component types: lower spawns (and
    /// compiles) first, so types depended on by others already exist.
    pub spawn_order: i32,
    /// Compile function, if the authoring side registered one.
    pub compile: Option<CompileFn>,
    /// Spawn function, if the runtime side registered one.
    pub spawn: Option<SpawnFn>,
}

/// Explicit registry of component compile/spawn functions.
#[derive(Default)]
pub struct ComponentRegistry {
    entries: Vec<ComponentType>,
    by_id: HashMap<u32, usize>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the compile function and spawn order for `name`.
    ///
    /// The spawn order declared here governs both compile-time grouping and
    /// runtime instantiation sequence for this type.
    pub fn register_component_compiler(
        &mut self,
        name: &str,
        compile: CompileFn,
        spawn_order: i32,
    ) {
        let slot = self.entry_slot(name);
        self.entries[slot].compile = Some(compile);
        self.entries[slot].spawn_order = spawn_order;
    }

    /// Registers the spawn function for `name`.
    pub fn register_component_spawner(&mut self, name: &str, spawn: SpawnFn) {
        let slot = self.entry_slot(name);
        self.entries[slot].spawn = Some(spawn);
    }

    /// Looks up a component type by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&ComponentType> {
        self.by_id
            .get(&component_identifier(name))
            .map(|&slot| &self.entries[slot])
    }

    /// Looks up a component type by hashed identifier.
    #[must_use]
    pub fn by_id(&self, id: u32) -> Option<&ComponentType> {
        self.by_id.get(&id).map(|&slot| &self.entries[slot])
    }

    /// Finds the existing entry for `name` or creates a blank one.
    fn entry_slot(&mut self, name: &str) -> usize {
        let id = component_identifier(name);
        if let Some(&slot) = self.by_id.get(&id) {
            return slot;
        }
        let slot = self.entries.len();
        self.entries.push(ComponentType {
            name: name.to_owned(),
            id,
            spawn_order: 0,
            compile: None,
            spawn: None,
        });
        self.by_id.insert(id, slot);
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_is_fnv1a32() {
        // Known FNV-1a test vectors.
        assert_eq!(component_identifier(""), 0x811c_9dc5);
        assert_eq!(component_identifier("a"), 0xe40c_292c);
    }

    #[test]
    fn test_identifiers_distinguish_names() {
        assert_ne!(
            component_identifier("transform"),
            component_identifier("velocity")
        );
    }

    #[test]
    fn test_compiler_and_spawner_share_an_entry() {
        let mut registry = ComponentRegistry::new();
        registry.register_component_compiler("thing", Box::new(|_, _| Ok(())), 3);
        registry.register_component_spawner("thing", Box::new(|_, _| Ok(())));

        let entry = registry.by_name("thing").unwrap();
        assert_eq!(entry.spawn_order, 3);
        assert!(entry.compile.is_some());
        assert!(entry.spawn.is_some());
        assert_eq!(registry.by_id(entry.id).unwrap().name, "thing");
    }

    #[test]
    fn test_unknown_name_is_none() {
        let registry = ComponentRegistry::new();
        assert!(registry.by_name("ghost").is_none());
    }
}
