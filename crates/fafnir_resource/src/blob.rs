//! # EntityResource Binary Layout
//!
//! Bit-exact little-endian contract between the authoring compiler and the
//! runtime spawner:
//!
//! ```text
//! { num_entities: u32, num_component_types: u32,
//!   parent_index[num_entities]: u32 (0xFFFF_FFFF = root),
//!   blocks... }
//!
//! block = { component_identifier: u32, num_instances: u32,
//!           payload_size: u32, entity_index[num_instances]: u32,
//!           payload[payload_size]: bytes }
//! ```
//!
//! All internal references are positions, never pointers; every read goes
//! through a bounds-checked offset computed from the declared sizes. The
//! blob is consumed read-only, byte for byte, and never mutated in place.

use crate::error::ResourceError;

/// `parent_index` sentinel marking a root entity.
pub const NO_PARENT: u32 = 0xFFFF_FFFF;

/// Little-endian byte writer for building resource blobs.
///
/// Used by the compiler; the runtime never writes resources.
#[derive(Default)]
pub struct BlobWriter {
    bytes: Vec<u8>,
}

impl BlobWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one little-endian u32.
    pub fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a slice of little-endian u32s.
    pub fn write_u32_slice(&mut self, values: &[u32]) {
        for &value in values {
            self.write_u32(value);
        }
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Consumes the writer, returning the finished blob.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Bounds-checked little-endian reader over a resource blob.
pub struct BlobReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> BlobReader<'a> {
    /// Creates a reader at the start of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Bytes left after the current offset.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Takes `len` raw bytes.
    ///
    /// # Errors
    ///
    /// [`ResourceError::Truncated`] if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ResourceError> {
        if self.remaining() < len {
            return Err(ResourceError::Truncated {
                offset: self.offset,
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    /// Reads one little-endian u32.
    ///
    /// # Errors
    ///
    /// [`ResourceError::Truncated`] if fewer than 4 bytes remain.
    pub fn read_u32(&mut self) -> Result<u32, ResourceError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads `count` little-endian u32s.
    ///
    /// # Errors
    ///
    /// [`ResourceError::Truncated`] if fewer than `4 * count` bytes remain.
    pub fn read_u32_vec(&mut self, count: usize) -> Result<Vec<u32>, ResourceError> {
        let bytes = self.read_bytes(count * 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}

/// One component type's block inside a parsed resource.
///
/// Instances are grouped type-major: the block carries every instance of
/// this component type in the resource, with `entity_index[k]` naming the
/// resource position of instance `k`'s owning entity.
#[derive(Debug)]
pub struct ComponentTypeData<'a> {
    /// Hashed component-type identifier.
    pub identifier: u32,
    /// Number of instances in this block.
    pub num_instances: u32,
    /// Owning entity per instance, as positions into the resource's entity
    /// list (entities do not exist until spawn time).
    pub entity_index: Vec<u32>,
    /// Raw instance payload; layout is private to the component's
    /// compile/spawn pair.
    pub payload: &'a [u8],
}

/// A parsed, validated view over a resource blob.
///
/// Borrows the payload bytes; the blob itself is never copied or mutated.
#[derive(Debug)]
pub struct EntityResource<'a> {
    /// Number of entities the resource describes.
    pub num_entities: u32,
    /// Parent position per entity, [`NO_PARENT`] for roots.
    pub parent_index: Vec<u32>,
    /// Component blocks, in the order the compiler emitted them.
    pub blocks: Vec<ComponentTypeData<'a>>,
}

impl<'a> EntityResource<'a> {
    /// Parses and validates a resource blob.
    ///
    /// Validation covers structure only: sizes, offsets, and index ranges.
    /// Component identifiers are *not* checked here - unknown blocks are a
    /// spawner policy, not a format error.
    ///
    /// # Errors
    ///
    /// Any [`ResourceError`] variant except `MalformedPayload` (which is
    /// per-component and surfaces at spawn time).
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ResourceError> {
        let mut reader = BlobReader::new(bytes);

        let num_entities = reader.read_u32()?;
        let num_component_types = reader.read_u32()?;

        let parent_index = reader.read_u32_vec(num_entities as usize)?;
        for &parent in &parent_index {
            if parent != NO_PARENT && parent >= num_entities {
                return Err(ResourceError::ParentIndexOutOfRange {
                    index: parent,
                    num_entities,
                });
            }
        }

        // A block needs at least its 12 header bytes; cap the pre-allocation
        // by what the remaining bytes could actually hold, so a malformed
        // count stays a recoverable Truncated error instead of an
        // allocation failure.
        let mut blocks =
            Vec::with_capacity((num_component_types as usize).min(reader.remaining() / 12));
        for _ in 0..num_component_types {
            let identifier = reader.read_u32()?;
            let num_instances = reader.read_u32()?;
            let payload_size = reader.read_u32()?;
            let entity_index = reader.read_u32_vec(num_instances as usize)?;
            for &index in &entity_index {
                if index >= num_entities {
                    return Err(ResourceError::EntityIndexOutOfRange {
                        index,
                        num_entities,
                    });
                }
            }
            let payload = reader.read_bytes(payload_size as usize)?;
            blocks.push(ComponentTypeData {
                identifier,
                num_instances,
                entity_index,
                payload,
            });
        }

        if reader.remaining() != 0 {
            return Err(ResourceError::TrailingBytes(reader.remaining()));
        }

        Ok(Self {
            num_entities,
            parent_index,
            blocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_entity_blob() -> Vec<u8> {
        let mut w = BlobWriter::new();
        w.write_u32(2); // num_entities
        w.write_u32(1); // num_component_types
        w.write_u32_slice(&[NO_PARENT, 0]); // B is a child of A
        w.write_u32(0xDEAD_BEEF); // identifier
        w.write_u32(2); // num_instances
        w.write_u32(8); // payload_size
        w.write_u32_slice(&[0, 1]); // entity_index
        w.write_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]);
        w.into_bytes()
    }

    #[test]
    fn test_parse_roundtrip() {
        let bytes = two_entity_blob();
        let resource = EntityResource::parse(&bytes).unwrap();
        assert_eq!(resource.num_entities, 2);
        assert_eq!(resource.parent_index, vec![NO_PARENT, 0]);
        assert_eq!(resource.blocks.len(), 1);

        let block = &resource.blocks[0];
        assert_eq!(block.identifier, 0xDEAD_BEEF);
        assert_eq!(block.num_instances, 2);
        assert_eq!(block.entity_index, vec![0, 1]);
        assert_eq!(block.payload, &[1u8, 2, 3, 4, 5, 6, 7, 8][..]);
    }

    #[test]
    fn test_truncation_at_every_boundary() {
        let bytes = two_entity_blob();
        // Chopping the blob anywhere must produce Truncated, never a panic.
        for len in 0..bytes.len() {
            match EntityResource::parse(&bytes[..len]) {
                Err(ResourceError::Truncated { .. }) => {}
                other => panic!("cut at {len}: expected Truncated, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_huge_declared_type_count_stays_recoverable() {
        // 8 bytes claiming u32::MAX component blocks must not reserve
        // memory for them; the first missing block header is a clean error.
        let mut w = BlobWriter::new();
        w.write_u32(0);
        w.write_u32(u32::MAX);
        assert!(matches!(
            EntityResource::parse(&w.into_bytes()).err(),
            Some(ResourceError::Truncated { .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = two_entity_blob();
        bytes.push(0);
        assert_eq!(
            EntityResource::parse(&bytes).err(),
            Some(ResourceError::TrailingBytes(1))
        );
    }

    #[test]
    fn test_parent_index_range_checked() {
        let mut w = BlobWriter::new();
        w.write_u32(1);
        w.write_u32(0);
        w.write_u32_slice(&[7]); // parent out of range
        assert_eq!(
            EntityResource::parse(&w.into_bytes()).err(),
            Some(ResourceError::ParentIndexOutOfRange {
                index: 7,
                num_entities: 1
            })
        );
    }

    #[test]
    fn test_entity_index_range_checked() {
        let mut w = BlobWriter::new();
        w.write_u32(1);
        w.write_u32(1);
        w.write_u32_slice(&[NO_PARENT]);
        w.write_u32(1); // identifier
        w.write_u32(1); // num_instances
        w.write_u32(0); // payload_size
        w.write_u32_slice(&[3]); // entity_index out of range
        assert_eq!(
            EntityResource::parse(&w.into_bytes()).err(),
            Some(ResourceError::EntityIndexOutOfRange {
                index: 3,
                num_entities: 1
            })
        );
    }
}
