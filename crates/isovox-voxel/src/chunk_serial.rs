//! Binary record format for persisted chunks.
//!
//! A record is a flat concatenation of 16-byte entries, one per voxel:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | x (`i32`, big-endian) |
//! | 4 | 4 | y (`i32`, big-endian) |
//! | 8 | 4 | z (`i32`, big-endian) |
//! | 12 | 4 | voxel id (`i32`, big-endian) |
//!
//! Structure templates use the same layout with template-relative positions.

use crate::coords::VoxelPos;
use crate::registry::VoxelTypeId;

/// Size of one encoded voxel.
pub const ENTRY_SIZE: usize = 16;

/// Errors that can occur while decoding a chunk record.
#[derive(Debug, thiserror::Error)]
pub enum ChunkSerError {
    /// The record is not a whole number of entries.
    #[error("record length {0} is not a multiple of {ENTRY_SIZE}")]
    BadLength(usize),
    /// An entry carries an id outside the registry.
    #[error("invalid voxel id {id} at entry {entry}")]
    InvalidVoxelId { id: i32, entry: usize },
}

/// Encodes voxels into a record.
pub fn encode<I>(voxels: I) -> Vec<u8>
where
    I: IntoIterator<Item = (VoxelPos, VoxelTypeId)>,
{
    let iter = voxels.into_iter();
    let mut buf = Vec::with_capacity(iter.size_hint().0 * ENTRY_SIZE);
    for (pos, id) in iter {
        buf.extend_from_slice(&pos.x.to_be_bytes());
        buf.extend_from_slice(&pos.y.to_be_bytes());
        buf.extend_from_slice(&pos.z.to_be_bytes());
        buf.extend_from_slice(&i32::from(id.0).to_be_bytes());
    }
    buf
}

/// Decodes a record, rejecting ids `>= type_count`.
pub fn decode(
    bytes: &[u8],
    type_count: usize,
) -> Result<Vec<(VoxelPos, VoxelTypeId)>, ChunkSerError> {
    if bytes.len() % ENTRY_SIZE != 0 {
        return Err(ChunkSerError::BadLength(bytes.len()));
    }
    bytes
        .chunks_exact(ENTRY_SIZE)
        .enumerate()
        .map(|(entry, raw)| {
            let field = |i: usize| {
                i32::from_be_bytes([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]])
            };
            let id = field(12);
            let valid = usize::try_from(id).is_ok_and(|v| v < type_count);
            if !valid {
                return Err(ChunkSerError::InvalidVoxelId { id, entry });
            }
            Ok((VoxelPos::new(field(0), field(4), field(8)), VoxelTypeId(id as u16)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_big_endian() {
        let bytes = encode([(VoxelPos::new(1, -1, 256), VoxelTypeId(3))]);
        assert_eq!(
            bytes,
            vec![0, 0, 0, 1, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 1, 0, 0, 0, 0, 3]
        );
    }

    #[test]
    fn test_decode_restores_entries() {
        let voxels = vec![
            (VoxelPos::new(-20, 7, 0), VoxelTypeId(0)),
            (VoxelPos::new(-19, 7, 12), VoxelTypeId(4)),
        ];
        let decoded = decode(&encode(voxels.clone()), 5).unwrap();
        assert_eq!(decoded, voxels);
    }

    #[test]
    fn test_truncated_record_rejected() {
        let mut bytes = encode([(VoxelPos::new(0, 0, 0), VoxelTypeId(0))]);
        bytes.pop();
        assert!(matches!(decode(&bytes, 1), Err(ChunkSerError::BadLength(15))));
    }

    #[test]
    fn test_unknown_or_negative_id_rejected() {
        let bytes = encode([(VoxelPos::new(0, 0, 0), VoxelTypeId(9))]);
        assert!(matches!(
            decode(&bytes, 9),
            Err(ChunkSerError::InvalidVoxelId { id: 9, entry: 0 })
        ));

        let mut negative = encode([(VoxelPos::new(0, 0, 0), VoxelTypeId(0))]);
        negative[12..16].copy_from_slice(&(-1i32).to_be_bytes());
        assert!(matches!(
            decode(&negative, 9),
            Err(ChunkSerError::InvalidVoxelId { id: -1, .. })
        ));
    }

    #[test]
    fn test_empty_record_is_empty_chunk() {
        assert!(decode(&[], 0).unwrap().is_empty());
    }
}
