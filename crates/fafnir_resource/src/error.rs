//! # Resource Error Types
//!
//! Two recoverable families: authoring mistakes surface at compile time as
//! [`CompileError`], malformed bytes surface at parse/spawn time as
//! [`ResourceError`]. An *unknown* component identifier at spawn time is
//! neither - it is skipped with a warning for forward compatibility.

use thiserror::Error;

/// Errors from compiling an authoring description into a resource blob.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A component name was never registered.
    #[error("component type not registered: {0}")]
    UnknownComponentType(String),

    /// The component is registered but has no compile function.
    #[error("component type has no registered compiler: {0}")]
    MissingCompiler(String),

    /// An entity names a parent position outside the description.
    #[error("parent index {parent} out of range for {num_entities} entities")]
    ParentOutOfRange {
        /// The offending parent position.
        parent: u32,
        /// Number of entities in the description.
        num_entities: u32,
    },

    /// An authoring config value could not be downcast to the type the
    /// compile function expects.
    #[error("authoring config for component {0} has the wrong type")]
    ConfigTypeMismatch(String),
}

/// Errors from parsing or spawning a resource blob.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The blob ended before a declared field or block.
    #[error("resource truncated at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        /// Byte offset of the failed read.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes remaining in the blob.
        available: usize,
    },

    /// Bytes remained after the last declared component block.
    #[error("{0} trailing bytes after the last component block")]
    TrailingBytes(usize),

    /// A `parent_index` entry names a position outside the resource.
    #[error("parent index {index} out of range for {num_entities} entities")]
    ParentIndexOutOfRange {
        /// The offending parent position.
        index: u32,
        /// Entity count declared in the header.
        num_entities: u32,
    },

    /// An `entity_index` entry names a position outside the resource.
    #[error("entity index {index} out of range for {num_entities} entities")]
    EntityIndexOutOfRange {
        /// The offending entity position.
        index: u32,
        /// Entity count declared in the header.
        num_entities: u32,
    },

    /// A block's payload size does not match its instance count for the
    /// spawn function's per-instance layout.
    #[error(
        "malformed payload for component {identifier:#010x}: \
         {payload_size} bytes for {num_instances} instances"
    )]
    MalformedPayload {
        /// Component identifier of the block.
        identifier: u32,
        /// Declared payload size in bytes.
        payload_size: u32,
        /// Declared instance count.
        num_instances: u32,
    },
}
