//! CellBuilder for constructing TON cells.
//!
//! The builder is an append-only bit buffer. Each typed write validates its
//! own width, value range and the remaining cell capacity up front and only
//! then appends, so an error never leaves a half-written field behind.

use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::Zero;

use crate::{Cell, CellError, CellResult, MsgAddress, MAX_CELL_BITS, MAX_CELL_REFS, MAX_COINS_BYTES};

/// Builder for constructing TON cells.
///
/// # Example
///
/// ```
/// use ton_cell::CellBuilder;
///
/// let mut builder = CellBuilder::new();
/// builder.store_u32(0x12345678).unwrap();
/// builder.store_bytes(&[1, 2, 3, 4]).unwrap();
/// assert_eq!(builder.bit_len(), 64);
///
/// // 300 does not fit into 8 bits; nothing is appended.
/// assert!(builder.store_uint(300, 8).is_err());
/// assert_eq!(builder.bit_len(), 64);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    /// Data buffer, big-endian bit order within each byte.
    data: Vec<u8>,
    /// Number of bits written.
    bit_len: usize,
    /// References to other cells.
    references: Vec<Arc<Cell>>,
}

impl CellBuilder {
    /// Create a new empty CellBuilder.
    pub fn new() -> Self {
        CellBuilder {
            data: Vec::with_capacity(128),
            bit_len: 0,
            references: Vec::new(),
        }
    }

    /// Fail unless `bits` more bits fit into the cell.
    fn ensure_bits(&self, bits: usize) -> CellResult<()> {
        if self.bit_len + bits > MAX_CELL_BITS {
            return Err(CellError::DataTooLong(self.bit_len + bits));
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        let byte_index = self.bit_len / 8;
        if byte_index >= self.data.len() {
            self.data.push(0);
        }
        if bit {
            self.data[byte_index] |= 1 << (7 - (self.bit_len % 8));
        }
        self.bit_len += 1;
    }

    /// Append the first `bit_len` bits of `data`. Capacity must be checked.
    fn push_bits_from(&mut self, data: &[u8], bit_len: usize) {
        if self.bit_len.is_multiple_of(8) && bit_len.is_multiple_of(8) {
            self.data.extend_from_slice(&data[..bit_len / 8]);
            self.bit_len += bit_len;
            return;
        }
        for i in 0..bit_len {
            self.push_bit((data[i / 8] >> (7 - (i % 8))) & 1 == 1);
        }
    }

    /// Store a single bit.
    pub fn store_bit(&mut self, bit: bool) -> CellResult<&mut Self> {
        self.ensure_bits(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Store multiple bits.
    pub fn store_bits(&mut self, bits: &[bool]) -> CellResult<&mut Self> {
        self.ensure_bits(bits.len())?;
        for &bit in bits {
            self.push_bit(bit);
        }
        Ok(self)
    }

    /// Store an unsigned 8-bit integer.
    pub fn store_u8(&mut self, value: u8) -> CellResult<&mut Self> {
        self.store_uint(value as u64, 8)
    }

    /// Store an unsigned 32-bit integer (big-endian).
    pub fn store_u32(&mut self, value: u32) -> CellResult<&mut Self> {
        self.store_uint(value as u64, 32)
    }

    /// Store an unsigned 64-bit integer (big-endian).
    pub fn store_u64(&mut self, value: u64) -> CellResult<&mut Self> {
        self.store_uint(value, 64)
    }

    /// Store a signed 8-bit integer.
    pub fn store_i8(&mut self, value: i8) -> CellResult<&mut Self> {
        self.store_int(value as i64, 8)
    }

    /// Store an unsigned integer with a specific bit width (big-endian).
    ///
    /// Fails with [`CellError::ValueOutOfRange`] if `value` needs more than
    /// `bits` bits.
    pub fn store_uint(&mut self, value: u64, bits: usize) -> CellResult<&mut Self> {
        if bits > 64 {
            return Err(CellError::InvalidBitLength(bits));
        }
        if bits < 64 && value >> bits != 0 {
            return Err(CellError::ValueOutOfRange { bits });
        }
        self.ensure_bits(bits)?;

        for i in (0..bits).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Store a signed integer with a specific bit width (two's complement).
    pub fn store_int(&mut self, value: i64, bits: usize) -> CellResult<&mut Self> {
        if bits > 64 {
            return Err(CellError::InvalidBitLength(bits));
        }
        if bits == 0 {
            if value != 0 {
                return Err(CellError::ValueOutOfRange { bits });
            }
            return Ok(self);
        }
        if bits < 64 {
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << (bits - 1)) - 1;
            if value < min || value > max {
                return Err(CellError::ValueOutOfRange { bits });
            }
        }
        self.ensure_bits(bits)?;

        let unsigned = value as u64;
        for i in (0..bits).rev() {
            self.push_bit((unsigned >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Store a byte array.
    pub fn store_bytes(&mut self, bytes: &[u8]) -> CellResult<&mut Self> {
        self.ensure_bits(bytes.len() * 8)?;
        self.push_bits_from(bytes, bytes.len() * 8);
        Ok(self)
    }

    /// Store coins (VarUInteger 16).
    ///
    /// Format: 4 bits of byte length, then the value in exactly that many
    /// big-endian bytes. The length is always minimal and zero is stored as
    /// a zero length with no value bytes. Amounts of 2^120 and above do not
    /// fit and fail with [`CellError::CoinsOverflow`].
    pub fn store_coins(&mut self, amount: &BigUint) -> CellResult<&mut Self> {
        if amount.is_zero() {
            return self.store_uint(0, 4);
        }

        let value_bits = amount.bits();
        let byte_len = value_bits.div_ceil(8) as usize;
        if byte_len > MAX_COINS_BYTES {
            return Err(CellError::CoinsOverflow { bits: value_bits });
        }
        self.ensure_bits(4 + byte_len * 8)?;

        let bytes = amount.to_bytes_be();
        debug_assert_eq!(bytes.len(), byte_len);
        for i in (0..4).rev() {
            self.push_bit((byte_len >> i) & 1 == 1);
        }
        self.push_bits_from(&bytes, byte_len * 8);
        Ok(self)
    }

    /// Store a nanoton amount in coin format.
    pub fn store_coins_u128(&mut self, nanotons: u128) -> CellResult<&mut Self> {
        self.store_coins(&BigUint::from(nanotons))
    }

    /// Store a message address.
    pub fn store_address(&mut self, addr: &MsgAddress) -> CellResult<&mut Self> {
        match addr {
            MsgAddress::Null => self.store_uint(0b00, 2),
            MsgAddress::Internal { workchain, address } => {
                // addr_std$10 anycast:(Maybe Anycast) workchain_id:int8 address:bits256
                let workchain = i8::try_from(*workchain).map_err(|_| {
                    CellError::InvalidAddress(format!("workchain {workchain} does not fit into int8"))
                })?;
                self.ensure_bits(crate::STD_ADDRESS_BITS)?;
                self.push_bit(true);
                self.push_bit(false);
                self.push_bit(false); // no anycast
                self.push_bits_from(&[workchain as u8], 8);
                self.push_bits_from(address, 256);
                Ok(self)
            }
        }
    }

    /// Store a reference to another cell.
    pub fn store_ref(&mut self, cell: Arc<Cell>) -> CellResult<&mut Self> {
        if self.references.len() >= MAX_CELL_REFS {
            return Err(CellError::TooManyRefs(self.references.len() + 1));
        }
        self.references.push(cell);
        Ok(self)
    }

    /// Inline the bits and references of `cell` into this builder.
    pub fn store_cell_contents(&mut self, cell: &Cell) -> CellResult<&mut Self> {
        self.ensure_bits(cell.bit_len())?;
        let refs = self.references.len() + cell.reference_count();
        if refs > MAX_CELL_REFS {
            return Err(CellError::TooManyRefs(refs));
        }
        self.push_bits_from(cell.data(), cell.bit_len());
        self.references.extend(cell.references().iter().cloned());
        Ok(self)
    }

    /// Get the number of bits that can still be stored.
    pub fn bits_left(&self) -> usize {
        MAX_CELL_BITS - self.bit_len
    }

    /// Get the number of references that can still be added.
    pub fn refs_left(&self) -> usize {
        MAX_CELL_REFS - self.references.len()
    }

    /// Get the current number of bits stored.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Get the current number of references.
    pub fn ref_count(&self) -> usize {
        self.references.len()
    }

    /// Finish the cell.
    pub fn build(self) -> CellResult<Cell> {
        Cell::new(self.data, self.bit_len, self.references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellSlice;

    #[test]
    fn test_new_builder() {
        let builder = CellBuilder::new();
        assert_eq!(builder.bit_len(), 0);
        assert_eq!(builder.ref_count(), 0);
        assert_eq!(builder.bits_left(), MAX_CELL_BITS);
        assert_eq!(builder.refs_left(), MAX_CELL_REFS);
    }

    #[test]
    fn test_store_bit() {
        let mut builder = CellBuilder::new();
        builder.store_bit(true).unwrap();
        builder.store_bit(false).unwrap();
        builder.store_bit(true).unwrap();

        let cell = builder.build().unwrap();
        assert_eq!(cell.bit_len(), 3);
        assert_eq!(cell.data(), &[0b10100000]);
    }

    #[test]
    fn test_store_uint_range_is_checked_before_append() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0b10101, 5).unwrap();
        assert!(matches!(
            builder.store_uint(16, 4),
            Err(CellError::ValueOutOfRange { bits: 4 })
        ));
        assert_eq!(builder.bit_len(), 5);

        let cell = builder.build().unwrap();
        assert_eq!(cell.data(), &[0b10101000]);
    }

    #[test]
    fn test_store_int_range() {
        let mut builder = CellBuilder::new();
        builder.store_int(-128, 8).unwrap();
        builder.store_int(127, 8).unwrap();
        assert!(builder.store_int(128, 8).is_err());
        assert!(builder.store_int(-129, 8).is_err());
        assert_eq!(builder.bit_len(), 16);
        assert_eq!(builder.build().unwrap().data(), &[0x80, 0x7f]);
    }

    #[test]
    fn test_store_u32() {
        let mut builder = CellBuilder::new();
        builder.store_u32(0x12345678).unwrap();
        let cell = builder.build().unwrap();
        assert_eq!(cell.data(), &[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_unaligned_bytes() {
        let mut builder = CellBuilder::new();
        builder.store_bit(true).unwrap();
        builder.store_bytes(&[0xFF, 0x00]).unwrap();
        let cell = builder.build().unwrap();
        assert_eq!(cell.bit_len(), 17);
        assert_eq!(cell.data(), &[0xFF, 0x80, 0x00]);
    }

    #[test]
    fn test_overflowing_write_leaves_builder_unchanged() {
        let mut builder = CellBuilder::new();
        builder.store_bytes(&[0xAA; 127]).unwrap();
        assert_eq!(builder.bits_left(), 7);
        assert!(builder.store_u8(0xFF).is_err());
        assert!(builder.store_bytes(&[1, 2]).is_err());
        assert_eq!(builder.bits_left(), 7);
        builder.store_uint(0b1111111, 7).unwrap();
        assert_eq!(builder.bits_left(), 0);
        assert!(builder.store_bit(true).is_err());
    }

    #[test]
    fn test_coins_minimal_encoding() {
        let mut builder = CellBuilder::new();
        builder.store_coins_u128(0).unwrap();
        assert_eq!(builder.bit_len(), 4);

        let mut builder = CellBuilder::new();
        builder.store_coins_u128(255).unwrap();
        assert_eq!(builder.bit_len(), 4 + 8);

        let mut builder = CellBuilder::new();
        builder.store_coins_u128(256).unwrap();
        assert_eq!(builder.bit_len(), 4 + 16);
        // length nibble 2, then 0x01 0x00
        assert_eq!(builder.build().unwrap().data(), &[0x20, 0x10, 0x00]);
    }

    #[test]
    fn test_coins_upper_bound() {
        let limit = BigUint::from(1u8) << 120u32;
        let max = &limit - 1u8;

        let mut builder = CellBuilder::new();
        builder.store_coins(&max).unwrap();
        assert_eq!(builder.bit_len(), 4 + 120);

        let mut builder = CellBuilder::new();
        assert!(matches!(
            builder.store_coins(&limit),
            Err(CellError::CoinsOverflow { bits: 121 })
        ));
        assert_eq!(builder.bit_len(), 0);
    }

    #[test]
    fn test_store_address_rejects_wide_workchain() {
        let mut builder = CellBuilder::new();
        let addr = MsgAddress::Internal {
            workchain: 300,
            address: [0; 32],
        };
        assert!(builder.store_address(&addr).is_err());
        assert_eq!(builder.bit_len(), 0);
    }

    #[test]
    fn test_store_cell_contents() {
        let inner = Arc::new(CellBuilder::new().build().unwrap());
        let mut source = CellBuilder::new();
        source.store_uint(0b101, 3).unwrap();
        source.store_ref(inner).unwrap();
        let source = source.build().unwrap();

        let mut dest = CellBuilder::new();
        dest.store_u8(0x12).unwrap();
        dest.store_cell_contents(&source).unwrap();
        let dest = dest.build().unwrap();

        assert_eq!(dest.bit_len(), 11);
        assert_eq!(dest.reference_count(), 1);
        let mut slice = CellSlice::new(&dest);
        assert_eq!(slice.load_u8().unwrap(), 0x12);
        assert_eq!(slice.load_uint(3).unwrap(), 0b101);
    }

    #[test]
    fn test_max_refs() {
        let inner = Arc::new(CellBuilder::new().build().unwrap());
        let mut builder = CellBuilder::new();
        for _ in 0..4 {
            builder.store_ref(inner.clone()).unwrap();
        }
        assert!(builder.store_ref(inner).is_err());
        assert!(builder.build().is_ok());
    }
}
