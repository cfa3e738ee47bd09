//! TON Cell and Bag of Cells (BoC) Library
//!
//! This crate provides the data structures needed to build TON messages:
//!
//! - **Cell**: An immutable unit of up to 1023 bits and 4 references
//! - **CellBuilder**: Append-only bit buffer with validating typed writes
//! - **CellSlice**: Sequential reader over a cell
//! - **BagOfCells**: The wire serialization of a cell tree
//! - **MsgAddress**: TON message addresses
//!
//! Every `store_*` call on [`CellBuilder`] checks width, value range and the
//! remaining capacity before it appends anything, so a failed write leaves
//! the builder exactly as it was.
//!
//! # Example
//!
//! ```
//! use ton_cell::{BagOfCells, CellBuilder, CellSlice};
//!
//! let mut builder = CellBuilder::new();
//! builder.store_u32(0x0f8a7ea5).unwrap();
//! builder.store_coins_u128(1_500_000_000).unwrap();
//! let cell = builder.build().unwrap();
//!
//! let mut slice = CellSlice::new(&cell);
//! assert_eq!(slice.load_u32().unwrap(), 0x0f8a7ea5);
//! assert_eq!(slice.load_coins_u128().unwrap(), 1_500_000_000);
//!
//! let bytes = BagOfCells::from_root(cell).serialize().unwrap();
//! let restored = BagOfCells::deserialize(&bytes).unwrap();
//! assert_eq!(restored.single_root().unwrap().bit_len(), 32 + 4 + 32);
//! ```

use sha2::{Digest, Sha256};
use thiserror::Error;

mod address;
mod boc;
mod builder;
mod cell;
mod slice;

pub use address::MsgAddress;
pub use boc::BagOfCells;
pub use builder::CellBuilder;
pub use cell::{Cell, DEPTH_BYTES, HASH_BYTES};
pub use slice::CellSlice;

/// Errors that can occur during Cell/BoC operations.
#[derive(Debug, Error)]
pub enum CellError {
    /// The cell data would exceed the maximum of 1023 bits.
    #[error("Cell data too long: {0} bits (max 1023)")]
    DataTooLong(usize),

    /// The cell would have too many references (max 4).
    #[error("Too many cell references: {0} (max 4)")]
    TooManyRefs(usize),

    /// An integer does not fit into the requested bit width.
    #[error("Value does not fit into {bits} bits")]
    ValueOutOfRange { bits: usize },

    /// A coin amount needs more than the 15 bytes VarUInteger 16 allows.
    #[error("Coin amount needs {bits} bits (max 120)")]
    CoinsOverflow { bits: u64 },

    /// Invalid BoC format.
    #[error("Invalid BoC format: {0}")]
    InvalidBoc(String),

    /// Cell not found in BoC.
    #[error("Cell not found: index {0}")]
    CellNotFound(usize),

    /// CRC32 checksum mismatch.
    #[error("CRC32 mismatch: expected 0x{expected:08x}, got 0x{actual:08x}")]
    CrcMismatch { expected: u32, actual: u32 },

    /// Unexpected end of data.
    #[error("Unexpected end of data")]
    UnexpectedEof,

    /// Not enough bits available.
    #[error("Not enough bits: need {need}, have {have}")]
    NotEnoughBits { need: usize, have: usize },

    /// Not enough references available.
    #[error("Not enough refs: need {need}, have {have}")]
    NotEnoughRefs { need: usize, have: usize },

    /// Invalid address format.
    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    /// Invalid base64 encoding.
    #[error("Invalid base64: {0}")]
    InvalidBase64(String),

    /// Expected single root but found multiple or none.
    #[error("Expected single root, found {0}")]
    NotSingleRoot(usize),

    /// Exotic cells are not supported by this crate.
    #[error("Exotic cells are not supported")]
    ExoticCell,

    /// Invalid bit length.
    #[error("Invalid bit length: {0}")]
    InvalidBitLength(usize),
}

/// Result type for Cell/BoC operations.
pub type CellResult<T> = Result<T, CellError>;

/// Maximum number of bits in a cell's data.
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references a cell can have.
pub const MAX_CELL_REFS: usize = 4;

/// Maximum byte length of a VarUInteger 16 (`Coins`) value.
pub const MAX_COINS_BYTES: usize = 15;

/// Bit width of a standard internal address (`addr_std$10` without anycast).
pub const STD_ADDRESS_BITS: usize = 2 + 1 + 8 + 256;

/// BoC magic number for generic BoC.
pub const BOC_GENERIC_MAGIC: u32 = 0xb5ee9c72;

/// Compute SHA256 hash of the input data.
fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute CRC32-C checksum (Castagnoli polynomial).
fn crc32c(data: &[u8]) -> u32 {
    const CRC32C: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISCSI);
    CRC32C.checksum(data)
}
