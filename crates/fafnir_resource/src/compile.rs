//! # EntityResource Compiler
//!
//! Turns an authoring-time description of an entity hierarchy into a
//! resource blob. Instances are grouped by component type - never
//! interleaved - and blocks are emitted in ascending spawn order, so the
//! spawner's passes are uniform per type and dependencies already exist
//! when later types spawn.
//!
//! Owners are recorded as positions in the description, not as entities:
//! entities do not exist until spawn time.

use std::any::Any;

use crate::blob::{BlobWriter, NO_PARENT};
use crate::error::CompileError;
use crate::registry::ComponentRegistry;

/// Authoring-time description of one entity.
struct EntityDesc {
    /// Position of the parent entity in the description, `None` for roots.
    parent: Option<u32>,
    /// Named component configs, in authoring order. The concrete config
    /// type is private to each component's compile function.
    components: Vec<(String, Box<dyn Any>)>,
}

/// Authoring-time description of an entity hierarchy.
///
/// # Example
///
/// ```rust,ignore
/// let mut desc = EntityResourceDesc::new();
/// let root = desc.add_entity(None);
/// let child = desc.add_entity(Some(root));
/// desc.add_component(root, "transform", TransformDesc { local: Mat4::IDENTITY });
/// let bytes = compile(&desc, &registry)?;
/// ```
#[derive(Default)]
pub struct EntityResourceDesc {
    entities: Vec<EntityDesc>,
}

impl EntityResourceDesc {
    /// Creates an empty description.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity, returning its position in the description.
    ///
    /// `parent` may name an entity added later; positions are validated at
    /// compile time, not here.
    pub fn add_entity(&mut self, parent: Option<u32>) -> u32 {
        self.entities.push(EntityDesc {
            parent,
            components: Vec::new(),
        });
        (self.entities.len() - 1) as u32
    }

    /// Attaches a named component config to an entity.
    ///
    /// An entity may carry several components of the same type; whether
    /// that is meaningful is the component manager's policy.
    pub fn add_component<C: Any>(&mut self, entity: u32, name: &str, config: C) {
        self.entities[entity as usize]
            .components
            .push((name.to_owned(), Box::new(config)));
    }

    /// Number of entities described.
    #[must_use]
    pub fn num_entities(&self) -> u32 {
        self.entities.len() as u32
    }
}

/// Compiles an authoring description into a resource blob.
///
/// # Errors
///
/// - [`CompileError::ParentOutOfRange`] for a parent position outside the
///   description
/// - [`CompileError::UnknownComponentType`] / [`CompileError::MissingCompiler`]
///   for component names the registry cannot compile
/// - Whatever a component's compile function returns for its own config
pub fn compile(
    desc: &EntityResourceDesc,
    registry: &ComponentRegistry,
) -> Result<Vec<u8>, CompileError> {
    let num_entities = desc.num_entities();

    for entity in &desc.entities {
        if let Some(parent) = entity.parent {
            if parent >= num_entities {
                return Err(CompileError::ParentOutOfRange {
                    parent,
                    num_entities,
                });
            }
        }
    }

    // Resolve every component type used, then order them by declared spawn
    // order (name as a deterministic tie-break).
    let mut types: Vec<(i32, &str, u32)> = Vec::new();
    for entity in &desc.entities {
        for (name, _) in &entity.components {
            let entry = registry
                .by_name(name)
                .ok_or_else(|| CompileError::UnknownComponentType(name.clone()))?;
            if entry.compile.is_none() {
                return Err(CompileError::MissingCompiler(name.clone()));
            }
            if !types.iter().any(|&(_, n, _)| n == name) {
                types.push((entry.spawn_order, entry.name.as_str(), entry.id));
            }
        }
    }
    types.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    // One block per type: gather owners and payload across all entities in
    // position order, so instance order inside a block is reproducible.
    let mut writer = BlobWriter::new();
    writer.write_u32(num_entities);
    writer.write_u32(types.len() as u32);

    for entity in &desc.entities {
        writer.write_u32(entity.parent.unwrap_or(NO_PARENT));
    }

    for &(_, type_name, id) in &types {
        let mut entity_index: Vec<u32> = Vec::new();
        let mut payload: Vec<u8> = Vec::new();

        // Unwraps are safe: membership in `types` required a compiler.
        let entry = registry.by_name(type_name).unwrap_or_else(|| unreachable!());
        let compile_fn = entry.compile.as_ref().unwrap_or_else(|| unreachable!());

        for (position, entity) in desc.entities.iter().enumerate() {
            for (name, config) in &entity.components {
                if name == type_name {
                    entity_index.push(position as u32);
                    compile_fn(config.as_ref(), &mut payload)?;
                }
            }
        }

        writer.write_u32(id);
        writer.write_u32(entity_index.len() as u32);
        writer.write_u32(payload.len() as u32);
        writer.write_u32_slice(&entity_index);
        writer.write_bytes(&payload);
    }

    Ok(writer.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::EntityResource;
    use crate::registry::component_identifier;

    fn byte_emitter(value: u8) -> crate::registry::CompileFn {
        Box::new(move |_, payload| {
            payload.push(value);
            Ok(())
        })
    }

    #[test]
    fn test_blocks_are_type_major_in_spawn_order() {
        let mut registry = ComponentRegistry::new();
        registry.register_component_compiler("late", byte_emitter(0xBB), 10);
        registry.register_component_compiler("early", byte_emitter(0xAA), 0);

        // Authoring interleaves the types; the blob must not.
        let mut desc = EntityResourceDesc::new();
        let a = desc.add_entity(None);
        let b = desc.add_entity(Some(a));
        desc.add_component(a, "late", ());
        desc.add_component(a, "early", ());
        desc.add_component(b, "late", ());

        let bytes = compile(&desc, &registry).unwrap();
        let resource = EntityResource::parse(&bytes).unwrap();

        assert_eq!(resource.num_entities, 2);
        assert_eq!(resource.parent_index, vec![NO_PARENT, 0]);
        assert_eq!(resource.blocks.len(), 2);

        let early = &resource.blocks[0];
        assert_eq!(early.identifier, component_identifier("early"));
        assert_eq!(early.entity_index, vec![0]);
        assert_eq!(early.payload, &[0xAA][..]);

        let late = &resource.blocks[1];
        assert_eq!(late.identifier, component_identifier("late"));
        assert_eq!(late.entity_index, vec![0, 1]);
        assert_eq!(late.payload, &[0xBB, 0xBB][..]);
    }

    #[test]
    fn test_unknown_component_name_fails() {
        let registry = ComponentRegistry::new();
        let mut desc = EntityResourceDesc::new();
        let e = desc.add_entity(None);
        desc.add_component(e, "ghost", ());
        assert_eq!(
            compile(&desc, &registry).err(),
            Some(CompileError::UnknownComponentType("ghost".to_owned()))
        );
    }

    #[test]
    fn test_spawner_only_registration_cannot_compile() {
        let mut registry = ComponentRegistry::new();
        registry.register_component_spawner("runtime_only", Box::new(|_, _| Ok(())));
        let mut desc = EntityResourceDesc::new();
        let e = desc.add_entity(None);
        desc.add_component(e, "runtime_only", ());
        assert_eq!(
            compile(&desc, &registry).err(),
            Some(CompileError::MissingCompiler("runtime_only".to_owned()))
        );
    }

    #[test]
    fn test_parent_out_of_range_fails() {
        let registry = ComponentRegistry::new();
        let mut desc = EntityResourceDesc::new();
        desc.add_entity(Some(5));
        assert_eq!(
            compile(&desc, &registry).err(),
            Some(CompileError::ParentOutOfRange {
                parent: 5,
                num_entities: 1
            })
        );
    }

    #[test]
    fn test_empty_description_compiles() {
        let registry = ComponentRegistry::new();
        let desc = EntityResourceDesc::new();
        let bytes = compile(&desc, &registry).unwrap();
        let resource = EntityResource::parse(&bytes).unwrap();
        assert_eq!(resource.num_entities, 0);
        assert!(resource.blocks.is_empty());
    }
}
