//! # FAFNIR Core Engine
//!
//! Data-oriented entity/component core designed for:
//! - Weak 32-bit entity handles that never dangle silently
//! - Component data in dense, index-parallel arrays
//! - Bulk `update()` passes, no per-object virtual dispatch
//!
//! ## Architecture Rules
//!
//! 1. **Entities own nothing** - An [`Entity`] is an index plus a generation
//!    counter; validity is a comparison, never a dereference
//! 2. **Managers own everything** - Each component type has exactly one
//!    manager holding all of its data for all entities
//! 3. **Arrays stay dense** - Removal is swap-erase; cached [`Instance`]
//!    values do not survive structural mutation
//!
//! ## Example
//!
//! ```rust,ignore
//! use fafnir_core::{World, Mat4};
//!
//! let mut world = World::new();
//! let e = world.entities.create();
//! let t = world.transforms.create(e, Mat4::IDENTITY);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod component;
pub mod config;
pub mod entity;
pub mod error;
pub mod math;
pub mod transform;
pub mod world;

pub use component::{Component, DataComponentManager, Instance, InstanceMap, Velocity};
pub use config::CoreConfig;
pub use entity::{Entity, EntityManager};
pub use error::ConfigError;
pub use math::{Mat4, Vec3};
pub use transform::TransformManager;
pub use world::World;
