//! CellSlice for reading data from TON cells.
//!
//! A CellSlice provides methods to sequentially read data from a cell,
//! tracking the current position within the cell's data and references.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::{Cell, CellError, CellResult, MsgAddress};

/// A slice view into a Cell for reading data.
///
/// # Example
///
/// ```
/// use ton_cell::{CellBuilder, CellSlice};
///
/// let mut builder = CellBuilder::new();
/// builder.store_u32(0x12345678).unwrap();
/// let cell = builder.build().unwrap();
///
/// let mut slice = CellSlice::new(&cell);
/// let value = slice.load_u32().unwrap();
/// assert_eq!(value, 0x12345678);
/// ```
#[derive(Debug, Clone)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    /// Current bit offset within the cell data.
    bit_offset: usize,
    /// Number of bits remaining (from bit_offset).
    bit_len: usize,
    /// Current reference offset.
    ref_offset: usize,
}

impl<'a> CellSlice<'a> {
    /// Create a new slice from a cell.
    pub fn new(cell: &'a Cell) -> Self {
        CellSlice {
            cell,
            bit_offset: 0,
            bit_len: cell.bit_len(),
            ref_offset: 0,
        }
    }

    fn ensure_bits(&self, count: usize) -> CellResult<()> {
        if count > self.bit_len {
            return Err(CellError::NotEnoughBits {
                need: count,
                have: self.bit_len,
            });
        }
        Ok(())
    }

    /// Load a single bit.
    pub fn load_bit(&mut self) -> CellResult<bool> {
        self.ensure_bits(1)?;
        let bit = self.cell.get_bit(self.bit_offset).unwrap_or(false);
        self.bit_offset += 1;
        self.bit_len -= 1;
        Ok(bit)
    }

    /// Load multiple bits.
    pub fn load_bits(&mut self, count: usize) -> CellResult<Vec<bool>> {
        self.ensure_bits(count)?;
        (0..count).map(|_| self.load_bit()).collect()
    }

    /// Load an unsigned 8-bit integer.
    pub fn load_u8(&mut self) -> CellResult<u8> {
        self.load_uint(8).map(|v| v as u8)
    }

    /// Load an unsigned 16-bit integer (big-endian).
    pub fn load_u16(&mut self) -> CellResult<u16> {
        self.load_uint(16).map(|v| v as u16)
    }

    /// Load an unsigned 32-bit integer (big-endian).
    pub fn load_u32(&mut self) -> CellResult<u32> {
        self.load_uint(32).map(|v| v as u32)
    }

    /// Load an unsigned 64-bit integer (big-endian).
    pub fn load_u64(&mut self) -> CellResult<u64> {
        self.load_uint(64)
    }

    /// Load a signed 8-bit integer.
    pub fn load_i8(&mut self) -> CellResult<i8> {
        self.load_int(8).map(|v| v as i8)
    }

    /// Load an unsigned integer with a specific bit width.
    pub fn load_uint(&mut self, bits: usize) -> CellResult<u64> {
        if bits > 64 {
            return Err(CellError::InvalidBitLength(bits));
        }
        self.ensure_bits(bits)?;

        let mut result: u64 = 0;
        for _ in 0..bits {
            result = (result << 1) | (self.load_bit()? as u64);
        }
        Ok(result)
    }

    /// Load a signed integer with a specific bit width (two's complement).
    pub fn load_int(&mut self, bits: usize) -> CellResult<i64> {
        if bits == 0 {
            return Ok(0);
        }
        let unsigned = self.load_uint(bits)?;
        if bits < 64 && unsigned & (1u64 << (bits - 1)) != 0 {
            return Ok((unsigned | !((1u64 << bits) - 1)) as i64);
        }
        Ok(unsigned as i64)
    }

    /// Load a byte array.
    pub fn load_bytes(&mut self, count: usize) -> CellResult<Vec<u8>> {
        self.ensure_bits(count * 8)?;
        (0..count).map(|_| self.load_u8()).collect()
    }

    /// Load a reference to another cell.
    pub fn load_ref(&mut self) -> CellResult<&'a Cell> {
        let reference = self
            .cell
            .reference(self.ref_offset)
            .ok_or(CellError::NotEnoughRefs { need: 1, have: 0 })?;
        self.ref_offset += 1;
        Ok(reference.as_ref())
    }

    /// Load coins (VarUInteger 16).
    pub fn load_coins(&mut self) -> CellResult<BigUint> {
        let byte_len = self.load_uint(4)? as usize;
        let bytes = self.load_bytes(byte_len)?;
        Ok(BigUint::from_bytes_be(&bytes))
    }

    /// Load coins that are known to fit into a nanoton `u128`.
    pub fn load_coins_u128(&mut self) -> CellResult<u128> {
        let value = self.load_coins()?;
        value.to_u128().ok_or(CellError::CoinsOverflow {
            bits: value.bits(),
        })
    }

    /// Load a message address (`addr_none` or `addr_std`).
    pub fn load_address(&mut self) -> CellResult<MsgAddress> {
        let addr_type = self.load_uint(2)? as u8;

        match addr_type {
            0b00 => Ok(MsgAddress::Null),
            0b10 => {
                if self.load_bit()? {
                    // anycast: depth:5 rewrite_pfx:(depth * Bit)
                    let depth = self.load_uint(5)?;
                    self.skip_bits(depth as usize)?;
                }

                let workchain = self.load_int(8)? as i32;
                let mut address = [0u8; 32];
                address.copy_from_slice(&self.load_bytes(32)?);

                Ok(MsgAddress::Internal { workchain, address })
            }
            _ => Err(CellError::InvalidAddress(format!(
                "Unsupported address type: {addr_type:#04b}"
            ))),
        }
    }

    /// Get the number of bits remaining.
    pub fn bits_left(&self) -> usize {
        self.bit_len
    }

    /// Get the number of references remaining.
    pub fn refs_left(&self) -> usize {
        self.cell.reference_count() - self.ref_offset
    }

    /// Skip a number of bits.
    pub fn skip_bits(&mut self, count: usize) -> CellResult<()> {
        self.ensure_bits(count)?;
        self.bit_offset += count;
        self.bit_len -= count;
        Ok(())
    }

    /// Check if the slice is empty (no bits or refs left).
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0 && self.refs_left() == 0
    }
}
