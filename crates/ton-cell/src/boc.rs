//! Bag of Cells (BoC) serialization format.
//!
//! Only the generic `serialized_boc` layout (magic `0xb5ee9c72`) is produced
//! and accepted. Cells are written parent-first: a root precedes everything
//! it references and every reference points to a higher index.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::{crc32c, Cell, CellError, CellResult, BOC_GENERIC_MAGIC, HASH_BYTES};

/// Bag of Cells - a serialized collection of cells.
///
/// Identical subtrees are stored once.
#[derive(Debug, Clone)]
pub struct BagOfCells {
    /// Root cells.
    roots: Vec<Arc<Cell>>,
}

impl BagOfCells {
    /// Create a new BoC with the given root cells.
    pub fn new(roots: Vec<Arc<Cell>>) -> Self {
        BagOfCells { roots }
    }

    /// Create a BoC with a single root cell.
    pub fn from_root(root: Cell) -> Self {
        BagOfCells {
            roots: vec![Arc::new(root)],
        }
    }

    /// Get all root cells.
    pub fn roots(&self) -> &[Arc<Cell>] {
        &self.roots
    }

    /// Get a single root cell (errors if not exactly one root).
    pub fn single_root(&self) -> CellResult<&Arc<Cell>> {
        if self.roots.len() != 1 {
            return Err(CellError::NotSingleRoot(self.roots.len()));
        }
        Ok(&self.roots[0])
    }

    /// Get the number of root cells.
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Serialize the BoC to bytes with a CRC32-C trailer and no index.
    pub fn serialize(&self) -> CellResult<Vec<u8>> {
        self.serialize_with_options(true, false)
    }

    /// Serialize with options.
    ///
    /// # Arguments
    /// * `with_crc` - Append a CRC32-C checksum (little-endian)
    /// * `with_index` - Include the cell offset index
    pub fn serialize_with_options(&self, with_crc: bool, with_index: bool) -> CellResult<Vec<u8>> {
        if self.roots.is_empty() {
            return Err(CellError::InvalidBoc("No root cells".to_string()));
        }

        let cells = self.collect_cells_parent_first();
        let cell_count = cells.len();

        let hash_to_index: HashMap<[u8; HASH_BYTES], usize> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| (c.hash(), i))
            .collect();

        let root_indices = self
            .roots
            .iter()
            .map(|r| {
                hash_to_index
                    .get(&r.hash())
                    .copied()
                    .ok_or_else(|| CellError::InvalidBoc("Root not collected".to_string()))
            })
            .collect::<CellResult<Vec<_>>>()?;

        let size_bytes = Self::bytes_needed(cell_count);
        let mut cell_data: Vec<Vec<u8>> = Vec::with_capacity(cell_count);
        let mut total_cells_size = 0usize;
        for cell in &cells {
            let serialized = Self::serialize_cell(cell, &hash_to_index, size_bytes)?;
            total_cells_size += serialized.len();
            cell_data.push(serialized);
        }

        let off_bytes = Self::bytes_needed(total_cells_size);

        let mut result = Vec::with_capacity(16 + total_cells_size);
        result.extend_from_slice(&BOC_GENERIC_MAGIC.to_be_bytes());

        // has_idx (bit 7) | has_crc32c (bit 6) | has_cache_bits (bit 5) | flags (bits 4-3) | size (bits 2-0)
        let flags: u8 = (if with_index { 1 << 7 } else { 0 })
            | (if with_crc { 1 << 6 } else { 0 })
            | (size_bytes as u8);
        result.push(flags);
        result.push(off_bytes as u8);

        Self::write_uint(&mut result, cell_count as u64, size_bytes);
        Self::write_uint(&mut result, self.roots.len() as u64, size_bytes);
        Self::write_uint(&mut result, 0, size_bytes); // absent
        Self::write_uint(&mut result, total_cells_size as u64, off_bytes);

        for idx in &root_indices {
            Self::write_uint(&mut result, *idx as u64, size_bytes);
        }

        if with_index {
            let mut offset = 0usize;
            for data in &cell_data {
                offset += data.len();
                Self::write_uint(&mut result, offset as u64, off_bytes);
            }
        }

        for data in cell_data {
            result.extend_from_slice(&data);
        }

        if with_crc {
            let crc = crc32c(&result);
            result.extend_from_slice(&crc.to_le_bytes());
        }

        Ok(result)
    }

    /// Serialize to a standard base64 string.
    pub fn serialize_to_base64(&self) -> CellResult<String> {
        Ok(STANDARD.encode(self.serialize()?))
    }

    /// Deserialize from bytes.
    pub fn deserialize(data: &[u8]) -> CellResult<Self> {
        if data.len() < 6 {
            return Err(CellError::UnexpectedEof);
        }

        let magic = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        if magic != BOC_GENERIC_MAGIC {
            return Err(CellError::InvalidBoc(format!(
                "Invalid magic: {magic:08x}, expected {BOC_GENERIC_MAGIC:08x}"
            )));
        }

        let flags = data[4];
        let has_idx = flags & 0x80 != 0;
        let has_crc = flags & 0x40 != 0;
        let size_bytes = (flags & 0x07) as usize;
        let off_bytes = data[5] as usize;
        if !(1..=4).contains(&size_bytes) || !(1..=8).contains(&off_bytes) {
            return Err(CellError::InvalidBoc(format!(
                "Unsupported field sizes: size={size_bytes}, offset={off_bytes}"
            )));
        }

        let data_end = if has_crc {
            if data.len() < 10 {
                return Err(CellError::UnexpectedEof);
            }
            let data_end = data.len() - 4;
            let expected = u32::from_le_bytes([
                data[data_end],
                data[data_end + 1],
                data[data_end + 2],
                data[data_end + 3],
            ]);
            let actual = crc32c(&data[..data_end]);
            if expected != actual {
                return Err(CellError::CrcMismatch { expected, actual });
            }
            data_end
        } else {
            data.len()
        };
        let data = &data[..data_end];

        let mut offset = 6;
        let cells_count = Self::read_uint(data, &mut offset, size_bytes)? as usize;
        let roots_count = Self::read_uint(data, &mut offset, size_bytes)? as usize;
        let absent_count = Self::read_uint(data, &mut offset, size_bytes)? as usize;
        let total_cells_size = Self::read_uint(data, &mut offset, off_bytes)? as usize;

        if absent_count != 0 {
            return Err(CellError::InvalidBoc("Absent cells are not supported".to_string()));
        }
        if roots_count == 0 || roots_count > cells_count {
            return Err(CellError::InvalidBoc(format!(
                "Invalid root count {roots_count} for {cells_count} cells"
            )));
        }

        // Every root index takes `size_bytes` and every cell at least 2 bytes.
        let remaining = data.len().saturating_sub(offset);
        if roots_count.saturating_mul(size_bytes) > remaining
            || cells_count.saturating_mul(2) > remaining
        {
            return Err(CellError::UnexpectedEof);
        }

        let mut root_indices = Vec::with_capacity(roots_count);
        for _ in 0..roots_count {
            root_indices.push(Self::read_uint(data, &mut offset, size_bytes)? as usize);
        }

        if has_idx {
            offset = cells_count
                .checked_mul(off_bytes)
                .and_then(|len| offset.checked_add(len))
                .ok_or(CellError::UnexpectedEof)?;
        }

        let cells_end = offset
            .checked_add(total_cells_size)
            .filter(|&end| end <= data.len())
            .ok_or(CellError::UnexpectedEof)?;
        let cells = Self::parse_cells(&data[offset..cells_end], cells_count, size_bytes)?;

        let roots = root_indices
            .iter()
            .map(|&idx| cells.get(idx).cloned().ok_or(CellError::CellNotFound(idx)))
            .collect::<CellResult<Vec<_>>>()?;

        Ok(BagOfCells { roots })
    }

    /// Deserialize from a standard base64 string.
    pub fn deserialize_from_base64(base64_str: &str) -> CellResult<Self> {
        let bytes = STANDARD
            .decode(base64_str.trim())
            .map_err(|e| CellError::InvalidBase64(e.to_string()))?;
        Self::deserialize(&bytes)
    }

    /// Collect all distinct cells so that each parent precedes its children.
    ///
    /// Reverse post-order of a depth-first walk; for a single root the root
    /// gets index 0.
    fn collect_cells_parent_first(&self) -> Vec<Arc<Cell>> {
        let mut post_order: Vec<Arc<Cell>> = Vec::new();
        let mut visited: HashMap<[u8; HASH_BYTES], ()> = HashMap::new();

        for root in self.roots.iter().rev() {
            Self::visit_post_order(root, &mut post_order, &mut visited);
        }

        post_order.reverse();
        post_order
    }

    fn visit_post_order(
        cell: &Arc<Cell>,
        post_order: &mut Vec<Arc<Cell>>,
        visited: &mut HashMap<[u8; HASH_BYTES], ()>,
    ) {
        if visited.insert(cell.hash(), ()).is_some() {
            return;
        }
        // Reversed so that siblings keep their left-to-right order once the
        // whole list is flipped.
        for reference in cell.references().iter().rev() {
            Self::visit_post_order(reference, post_order, visited);
        }
        post_order.push(cell.clone());
    }

    fn serialize_cell(
        cell: &Cell,
        hash_to_index: &HashMap<[u8; HASH_BYTES], usize>,
        ref_size: usize,
    ) -> CellResult<Vec<u8>> {
        let mut result = Vec::with_capacity(2 + cell.data().len() + cell.reference_count() * ref_size);

        let (d1, d2) = cell.descriptors();
        result.push(d1);
        result.push(d2);
        result.extend_from_slice(&cell.data_with_completion_tag());

        for reference in cell.references() {
            let idx = hash_to_index
                .get(&reference.hash())
                .ok_or_else(|| CellError::InvalidBoc("Reference not found".to_string()))?;
            Self::write_uint(&mut result, *idx as u64, ref_size);
        }

        Ok(result)
    }

    /// Parse cells from serialized data.
    ///
    /// References must point to higher indices, so cells are materialized
    /// from the last one backwards.
    fn parse_cells(data: &[u8], cell_count: usize, size_bytes: usize) -> CellResult<Vec<Arc<Cell>>> {
        struct RawCell<'a> {
            data: &'a [u8],
            bit_len: usize,
            refs: Vec<usize>,
        }

        let mut raw_cells: Vec<RawCell<'_>> = Vec::with_capacity(cell_count.min(data.len() / 2));
        let mut offset = 0;

        for index in 0..cell_count {
            if offset + 2 > data.len() {
                return Err(CellError::UnexpectedEof);
            }
            let d1 = data[offset];
            let d2 = data[offset + 1];
            offset += 2;

            if d1 & 0x08 != 0 {
                return Err(CellError::ExoticCell);
            }
            if d1 >> 5 != 0 {
                return Err(CellError::InvalidBoc(format!("Cell {index} has a non-zero level")));
            }
            let refs_count = (d1 & 0x07) as usize;
            if refs_count > crate::MAX_CELL_REFS {
                return Err(CellError::TooManyRefs(refs_count));
            }

            let data_len = (d2 as usize).div_ceil(2);
            if offset + data_len > data.len() {
                return Err(CellError::UnexpectedEof);
            }
            let cell_data = &data[offset..offset + data_len];
            offset += data_len;

            let bit_len = if d2.is_multiple_of(2) {
                data_len * 8
            } else {
                Self::bit_len_from_completion_tag(cell_data)?
            };

            let mut refs = Vec::with_capacity(refs_count);
            for _ in 0..refs_count {
                let ref_idx = Self::read_uint(data, &mut offset, size_bytes)? as usize;
                if ref_idx <= index || ref_idx >= cell_count {
                    return Err(CellError::InvalidBoc(format!(
                        "Cell {index} references invalid index {ref_idx}"
                    )));
                }
                refs.push(ref_idx);
            }

            raw_cells.push(RawCell {
                data: cell_data,
                bit_len,
                refs,
            });
        }

        let mut cells: Vec<Option<Arc<Cell>>> = vec![None; cell_count];
        for (i, raw) in raw_cells.iter().enumerate().rev() {
            let references = raw
                .refs
                .iter()
                .map(|&idx| cells[idx].clone().ok_or(CellError::CellNotFound(idx)))
                .collect::<CellResult<Vec<_>>>()?;
            cells[i] = Some(Arc::new(Cell::new(raw.data.to_vec(), raw.bit_len, references)?));
        }

        cells
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.ok_or(CellError::CellNotFound(i)))
            .collect()
    }

    /// Bit length of a non-aligned cell: the completion tag is the lowest
    /// set bit of the last byte.
    fn bit_len_from_completion_tag(data: &[u8]) -> CellResult<usize> {
        match data.last() {
            Some(&last) if last != 0 => {
                Ok(data.len() * 8 - last.trailing_zeros() as usize - 1)
            }
            _ => Err(CellError::InvalidBoc("Missing completion tag".to_string())),
        }
    }

    /// Calculate bytes needed to represent a number.
    fn bytes_needed(n: usize) -> usize {
        if n == 0 {
            1
        } else {
            (64 - (n as u64).leading_zeros()).div_ceil(8) as usize
        }
    }

    /// Write an unsigned integer with specified byte width.
    fn write_uint(buf: &mut Vec<u8>, value: u64, bytes: usize) {
        for i in (0..bytes).rev() {
            buf.push((value >> (i * 8)) as u8);
        }
    }

    /// Read an unsigned integer with specified byte width.
    fn read_uint(data: &[u8], offset: &mut usize, bytes: usize) -> CellResult<u64> {
        if *offset + bytes > data.len() {
            return Err(CellError::UnexpectedEof);
        }
        let mut result: u64 = 0;
        for &byte in &data[*offset..*offset + bytes] {
            result = (result << 8) | byte as u64;
        }
        *offset += bytes;
        Ok(result)
    }
}
