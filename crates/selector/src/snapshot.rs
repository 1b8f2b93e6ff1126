//! Compact snapshots of the split trees and leaf labels.
//!
//! Each painted facet is stored as a pre-order bit stream: `1` for a split
//! node followed by its four children, `0` for a leaf followed by its label.
//! Labels below 3 take two bits; larger labels are `11` plus four bits of
//! `label - 3`. Untouched facets (unsplit, unlabeled) are omitted.

use std::collections::HashMap;

use bitvec::order::Lsb0;
use bitvec::slice::BitSlice;
use bitvec::vec::BitVec;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::{SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
use crate::events::SelectorEvent;
use crate::selector::{Triangle, TriangleSelector};
use crate::types::{Label, TriangleId, VertexId};

type Bits = BitVec<u8, Lsb0>;

/// Label values at or above this use the extended encoding
const EXTENDED_LABEL_BASE: u8 = 3;

/// Errors raised while decoding or restoring a snapshot
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot has bad magic bytes")]
    BadMagic,
    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u16),
    #[error("Snapshot data is truncated")]
    Truncated,
    #[error("Snapshot has {0} unexpected trailing bytes")]
    TrailingBytes(usize),
    #[error("Snapshot facet {facet} is out of range for {facet_count} facets")]
    FacetOutOfRange { facet: u32, facet_count: u32 },
    #[error("Snapshot was taken from a mesh with {found} facets, this mesh has {expected}")]
    FacetCountMismatch { expected: u32, found: u32 },
    #[error("Snapshot lists facet {0} more than once")]
    DuplicateFacet(u32),
    #[error("Snapshot contains invalid label {0}")]
    InvalidLabel(u8),
    #[error("Snapshot split tree for facet {0} is malformed")]
    MalformedTree(u32),
}

/// Split tree and labels of one level-0 facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetState {
    pub facet: u32,
    /// Number of meaningful bits in `bits`
    pub bit_len: u32,
    pub bits: Vec<u8>,
}

/// Serializable label state of a whole selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSnapshot {
    pub version: u16,
    pub facet_count: u32,
    pub facets: Vec<FacetState>,
}

/// Fixed-size prefix of the binary encoding (little-endian fields)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SnapshotHeader {
    magic: [u8; 4],
    version: u16,
    reserved: u16,
    facet_count: u32,
    entry_count: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct EntryHeader {
    facet: u32,
    bit_len: u32,
}

const HEADER_SIZE: usize = std::mem::size_of::<SnapshotHeader>();
const ENTRY_HEADER_SIZE: usize = std::mem::size_of::<EntryHeader>();

impl SelectorSnapshot {
    /// Whether the snapshot holds no paint at all
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Encode as an opaque binary blob
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload: usize = self
            .facets
            .iter()
            .map(|f| ENTRY_HEADER_SIZE + f.bits.len())
            .sum();
        let mut out = Vec::with_capacity(HEADER_SIZE + payload);

        let header = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            version: self.version.to_le(),
            reserved: 0,
            facet_count: self.facet_count.to_le(),
            entry_count: (self.facets.len() as u32).to_le(),
        };
        out.extend_from_slice(bytemuck::bytes_of(&header));

        for facet in &self.facets {
            let entry = EntryHeader {
                facet: facet.facet.to_le(),
                bit_len: facet.bit_len.to_le(),
            };
            out.extend_from_slice(bytemuck::bytes_of(&entry));
            out.extend_from_slice(&facet.bits);
        }
        out
    }

    /// Decode a blob produced by [`Self::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let header_bytes = bytes.get(..HEADER_SIZE).ok_or(SnapshotError::Truncated)?;
        let header: SnapshotHeader = bytemuck::pod_read_unaligned(header_bytes);
        if header.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::BadMagic);
        }
        let version = u16::from_le(header.version);
        if version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(version));
        }

        let entry_count = u32::from_le(header.entry_count) as usize;
        let mut rest = &bytes[HEADER_SIZE..];
        let mut facets = Vec::with_capacity(entry_count.min(rest.len() / ENTRY_HEADER_SIZE));
        for _ in 0..entry_count {
            let entry_bytes = rest.get(..ENTRY_HEADER_SIZE).ok_or(SnapshotError::Truncated)?;
            let entry: EntryHeader = bytemuck::pod_read_unaligned(entry_bytes);
            let bit_len = u32::from_le(entry.bit_len);
            let byte_len = bit_len.div_ceil(8) as usize;
            let bits = rest
                .get(ENTRY_HEADER_SIZE..ENTRY_HEADER_SIZE + byte_len)
                .ok_or(SnapshotError::Truncated)?;
            facets.push(FacetState {
                facet: u32::from_le(entry.facet),
                bit_len,
                bits: bits.to_vec(),
            });
            rest = &rest[ENTRY_HEADER_SIZE + byte_len..];
        }
        if !rest.is_empty() {
            return Err(SnapshotError::TrailingBytes(rest.len()));
        }

        Ok(Self {
            version,
            facet_count: u32::from_le(header.facet_count),
            facets,
        })
    }
}

struct BitReader<'a> {
    bits: &'a BitSlice<u8, Lsb0>,
    len: usize,
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(state: &'a FacetState) -> Result<Self, SnapshotError> {
        let bits = BitSlice::<u8, Lsb0>::from_slice(&state.bits);
        let len = state.bit_len as usize;
        if bits.len() < len {
            return Err(SnapshotError::Truncated);
        }
        Ok(Self { bits, len, pos: 0 })
    }

    fn read_bit(&mut self) -> Result<bool, SnapshotError> {
        if self.pos >= self.len {
            return Err(SnapshotError::Truncated);
        }
        let bit = self.bits[self.pos];
        self.pos += 1;
        Ok(bit)
    }

    fn read_bits(&mut self, count: u32) -> Result<u8, SnapshotError> {
        let mut value = 0u8;
        for i in 0..count {
            value |= u8::from(self.read_bit()?) << i;
        }
        Ok(value)
    }

    fn read_label(&mut self) -> Result<Label, SnapshotError> {
        let short = self.read_bits(2)?;
        let raw = if short < EXTENDED_LABEL_BASE {
            short
        } else {
            EXTENDED_LABEL_BASE + self.read_bits(4)?
        };
        Label::new(raw).ok_or(SnapshotError::InvalidLabel(raw))
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.len
    }
}

fn push_bits(bits: &mut Bits, value: u8, count: u32) {
    for i in 0..count {
        bits.push((value >> i) & 1 == 1);
    }
}

fn push_label(bits: &mut Bits, label: Label) {
    let raw = label.raw();
    if raw < EXTENDED_LABEL_BASE {
        push_bits(bits, raw, 2);
    } else {
        push_bits(bits, EXTENDED_LABEL_BASE, 2);
        push_bits(bits, raw - EXTENDED_LABEL_BASE, 4);
    }
}

/// Arena state kept aside while a restore is attempted
struct ArenaBackup {
    vertices: Vec<glam::Vec3>,
    triangles: Vec<Triangle>,
    midpoints: HashMap<(VertexId, VertexId), VertexId>,
    revision: u64,
}

impl TriangleSelector {
    /// Capture split trees and labels of every painted facet
    pub fn snapshot(&self) -> SelectorSnapshot {
        let mut facets = Vec::new();
        for facet in 0..self.facet_count {
            let id = TriangleId(facet);
            let tri = &self.triangles[id.index()];
            if tri.is_leaf() && tri.label.is_none() {
                continue;
            }
            let mut bits = Bits::new();
            self.encode_tree(id, &mut bits);
            facets.push(FacetState {
                facet,
                bit_len: bits.len() as u32,
                bits: bits.into_vec(),
            });
        }
        SelectorSnapshot {
            version: SNAPSHOT_VERSION,
            facet_count: self.facet_count,
            facets,
        }
    }

    fn encode_tree(&self, id: TriangleId, bits: &mut Bits) {
        let tri = &self.triangles[id.index()];
        match tri.children {
            Some(children) => {
                bits.push(true);
                for child in children {
                    self.encode_tree(child, bits);
                }
            }
            None => {
                bits.push(false);
                push_label(bits, tri.label);
            }
        }
    }

    /// Replace all splits and labels with the snapshot's.
    ///
    /// The snapshot is replayed into a fresh arena; on any error the
    /// previous state is kept untouched.
    pub fn restore(&mut self, snapshot: &SelectorSnapshot) -> Result<(), SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        if snapshot.facet_count != self.facet_count {
            return Err(SnapshotError::FacetCountMismatch {
                expected: self.facet_count,
                found: snapshot.facet_count,
            });
        }

        let backup = ArenaBackup {
            vertices: self.vertices.clone(),
            triangles: self.triangles.clone(),
            midpoints: self.midpoints.clone(),
            revision: self.revision,
        };
        self.clear_to_level0();

        if let Err(err) = self.replay(snapshot) {
            self.vertices = backup.vertices;
            self.triangles = backup.triangles;
            self.midpoints = backup.midpoints;
            self.revision = backup.revision;
            return Err(err);
        }

        self.generation += 1;
        self.touch();
        info!(
            "Snapshot restored: {} painted facets, {} triangles, generation {}",
            snapshot.facets.len(),
            self.triangles.len(),
            self.generation
        );
        self.emit(SelectorEvent::Restored {
            generation: self.generation,
        });
        Ok(())
    }

    /// Restore, falling back to an unpainted mesh when the snapshot is
    /// rejected. Returns whether the snapshot was applied.
    pub fn restore_or_reset(&mut self, snapshot: &SelectorSnapshot) -> bool {
        match self.restore(snapshot) {
            Ok(()) => true,
            Err(err) => {
                warn!("Snapshot rejected, resetting paint: {}", err);
                self.reset();
                false
            }
        }
    }

    fn replay(&mut self, snapshot: &SelectorSnapshot) -> Result<(), SnapshotError> {
        for state in &snapshot.facets {
            if state.facet >= self.facet_count {
                return Err(SnapshotError::FacetOutOfRange {
                    facet: state.facet,
                    facet_count: self.facet_count,
                });
            }
            let id = TriangleId(state.facet);
            let tri = &self.triangles[id.index()];
            if tri.is_split() || !tri.label.is_none() {
                return Err(SnapshotError::DuplicateFacet(state.facet));
            }

            let mut reader = BitReader::new(state)?;
            self.decode_tree(id, state.facet, &mut reader)?;
            if !reader.is_exhausted() {
                return Err(SnapshotError::MalformedTree(state.facet));
            }
        }
        Ok(())
    }

    fn decode_tree(
        &mut self,
        id: TriangleId,
        facet: u32,
        reader: &mut BitReader<'_>,
    ) -> Result<(), SnapshotError> {
        if reader.read_bit()? {
            if self.triangles[id.index()].depth >= self.config.max_depth {
                return Err(SnapshotError::MalformedTree(facet));
            }
            for child in self.split_unchecked(id) {
                self.decode_tree(child, facet, reader)?;
            }
        } else {
            self.triangles[id.index()].label = reader.read_label()?;
        }
        Ok(())
    }
}
