//! Cell implementation for TON.
//!
//! A Cell is the fundamental data unit in TON, containing up to 1023 bits
//! of data and up to 4 references to other cells. Only ordinary cells are
//! modelled; their level is always 0, so each cell carries exactly one hash
//! and one depth, both computed when the cell is created.

use std::sync::Arc;

use crate::{sha256, CellError, CellResult, MAX_CELL_BITS, MAX_CELL_REFS};

/// Hash size in bytes (SHA256).
pub const HASH_BYTES: usize = 32;

/// Depth size in bytes.
pub const DEPTH_BYTES: usize = 2;

/// A TON Cell - the basic unit of data storage.
///
/// Cells form a DAG where each cell can reference up to 4 other cells.
/// The representation hash identifies the cell and its entire subtree.
#[derive(Debug, Clone)]
pub struct Cell {
    /// Raw data bytes (may contain a partial byte at the end).
    data: Vec<u8>,
    /// Number of bits stored in data.
    bit_len: usize,
    /// References to child cells.
    references: Vec<Arc<Cell>>,
    /// Representation hash.
    hash: [u8; HASH_BYTES],
    /// 0 for leaves, otherwise 1 + the deepest child.
    depth: u16,
}

impl Cell {
    /// Create a cell from its parts.
    ///
    /// Called by `CellBuilder::build()` and the BoC reader. Bits past
    /// `bit_len` in the last byte are cleared.
    pub(crate) fn new(
        mut data: Vec<u8>,
        bit_len: usize,
        references: Vec<Arc<Cell>>,
    ) -> CellResult<Self> {
        if bit_len > MAX_CELL_BITS {
            return Err(CellError::DataTooLong(bit_len));
        }
        if references.len() > MAX_CELL_REFS {
            return Err(CellError::TooManyRefs(references.len()));
        }
        let byte_len = bit_len.div_ceil(8);
        if data.len() < byte_len {
            return Err(CellError::NotEnoughBits {
                need: bit_len,
                have: data.len() * 8,
            });
        }
        data.truncate(byte_len);
        let remainder = bit_len % 8;
        if remainder != 0
            && let Some(last) = data.last_mut()
        {
            *last &= 0xFFu8 << (8 - remainder);
        }

        let depth = references
            .iter()
            .map(|r| r.depth.saturating_add(1))
            .max()
            .unwrap_or(0);

        let mut cell = Cell {
            data,
            bit_len,
            references,
            hash: [0u8; HASH_BYTES],
            depth,
        };
        cell.hash = sha256(&cell.representation());
        Ok(cell)
    }

    /// Create an empty cell.
    pub fn empty() -> Self {
        let mut cell = Cell {
            data: Vec::new(),
            bit_len: 0,
            references: Vec::new(),
            hash: [0u8; HASH_BYTES],
            depth: 0,
        };
        cell.hash = sha256(&cell.representation());
        cell
    }

    /// Bytes hashed to obtain the representation hash: descriptors, data
    /// with completion tag, child depths, child hashes.
    fn representation(&self) -> Vec<u8> {
        let mut repr =
            Vec::with_capacity(2 + 128 + self.references.len() * (DEPTH_BYTES + HASH_BYTES));

        let (d1, d2) = self.descriptors();
        repr.push(d1);
        repr.push(d2);
        repr.extend_from_slice(&self.data_with_completion_tag());

        for reference in &self.references {
            repr.extend_from_slice(&reference.depth.to_be_bytes());
        }
        for reference in &self.references {
            repr.extend_from_slice(&reference.hash);
        }
        repr
    }

    /// Get the SHA256 representation hash of this cell.
    pub fn hash(&self) -> [u8; HASH_BYTES] {
        self.hash
    }

    /// Get the depth of this cell.
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Get the descriptor bytes (d1, d2).
    ///
    /// d1 = refs_count (ordinary, level 0)
    /// d2 = ceil(bit_len / 8) + floor(bit_len / 8)
    pub fn descriptors(&self) -> (u8, u8) {
        let d1 = self.references.len() as u8;
        let d2 = (self.bit_len.div_ceil(8) + self.bit_len / 8) as u8;
        (d1, d2)
    }

    /// Get data with completion tag.
    ///
    /// If bit_len is not byte-aligned, the bit after the last data bit is
    /// set to 1 and the rest of the byte stays 0.
    pub fn data_with_completion_tag(&self) -> Vec<u8> {
        let mut result = self.data.clone();
        let remainder = self.bit_len % 8;
        if remainder != 0
            && let Some(last) = result.last_mut()
        {
            *last |= 1 << (7 - remainder);
        }
        result
    }

    /// Get the raw data bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the number of bits in this cell.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Get all references to child cells.
    pub fn references(&self) -> &[Arc<Cell>] {
        &self.references
    }

    /// Get a reference by index.
    pub fn reference(&self, index: usize) -> Option<&Arc<Cell>> {
        self.references.get(index)
    }

    /// Get the number of references.
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Get a specific bit from the cell data.
    ///
    /// Returns None if the index is out of bounds.
    pub fn get_bit(&self, index: usize) -> Option<bool> {
        if index >= self.bit_len {
            return None;
        }
        Some((self.data[index / 8] >> (7 - (index % 8))) & 1 == 1)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Cell {}

impl std::hash::Hash for Cell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}
