//! # FAFNIR Resource Pipeline
//!
//! Turns an authoring-time description of an entity hierarchy into a binary
//! EntityResource, and an EntityResource into a runtime population of live
//! entities.
//!
//! Data flows one direction at runtime:
//!
//! ```text
//! authoring desc --compile--> resource bytes --spawn--> entities + components
//! ```
//!
//! ## Architecture Rules
//!
//! 1. **Type-major blocks** - The compiler groups all instances of one
//!    component type together; the spawner makes one call per block, keeping
//!    instruction and data streams uniform per pass
//! 2. **Explicit registries** - Compile/spawn functions live in a
//!    [`ComponentRegistry`] object passed in at call time; multiple resource
//!    dialects and test harnesses coexist freely
//! 3. **Forward compatible** - A block whose identifier nobody registered is
//!    skipped over by its declared sizes with a warning, never an error

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod blob;
pub mod compile;
pub mod components;
pub mod error;
pub mod registry;
pub mod spawn;

pub use blob::{BlobReader, BlobWriter, ComponentTypeData, EntityResource, NO_PARENT};
pub use compile::{compile, EntityResourceDesc};
pub use components::{register_transform, register_velocity, TransformDesc};
pub use error::{CompileError, ResourceError};
pub use registry::{component_identifier, CompileFn, ComponentRegistry, SpawnBatch, SpawnFn};
pub use spawn::spawn;
