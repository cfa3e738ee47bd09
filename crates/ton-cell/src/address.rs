//! TON Message Address types.
//!
//! Only the two forms needed to address messages are modelled: `addr_none`
//! and `addr_std` without anycast.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};

use crate::{CellError, CellResult};

/// Tag byte of a bounceable user-friendly address.
const TAG_BOUNCEABLE: u8 = 0x11;
/// Tag byte of a non-bounceable user-friendly address.
const TAG_NON_BOUNCEABLE: u8 = 0x51;
/// Flag OR-ed into the tag for testnet-only addresses.
const TAG_TESTNET: u8 = 0x80;

/// Length of a decoded user-friendly address: tag, workchain, hash, CRC16.
const USER_FRIENDLY_BYTES: usize = 36;
/// Length of a base64-encoded user-friendly address.
const USER_FRIENDLY_CHARS: usize = 48;

const CRC16_XMODEM: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_XMODEM);

/// TON Message Address.
///
/// # Example
///
/// ```
/// use ton_cell::MsgAddress;
///
/// let addr = MsgAddress::from_string(
///     "0:0000000000000000000000000000000000000000000000000000000000000000",
/// )
/// .unwrap();
/// assert_eq!(addr.workchain(), Some(0));
///
/// let friendly = addr.to_user_friendly(true, false).unwrap();
/// assert_eq!(MsgAddress::from_string(&friendly).unwrap(), addr);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum MsgAddress {
    /// No address (addr_none$00).
    #[default]
    Null,

    /// Standard internal address (addr_std$10).
    Internal {
        /// Workchain ID (-1 for masterchain, 0 for basechain).
        workchain: i32,
        /// 256-bit account ID.
        address: [u8; 32],
    },
}

impl MsgAddress {
    /// Parse an address from a string.
    ///
    /// Supported formats:
    /// - Raw: "workchain:hex_address" (e.g., "0:abc123...")
    /// - User-friendly base64, URL-safe or standard alphabet ("EQ...", "UQ...")
    pub fn from_string(s: &str) -> CellResult<Self> {
        let s = s.trim();

        if s.is_empty() {
            return Err(CellError::InvalidAddress("empty address".to_string()));
        }

        if let Some((workchain_str, address_str)) = s.split_once(':') {
            return Self::from_raw(workchain_str, address_str);
        }

        if s.len() == USER_FRIENDLY_CHARS {
            return Self::from_user_friendly(s);
        }

        Err(CellError::InvalidAddress(format!("Unrecognized address format: {s}")))
    }

    fn from_raw(workchain_str: &str, address_str: &str) -> CellResult<Self> {
        let workchain: i8 = workchain_str
            .parse()
            .map_err(|_| CellError::InvalidAddress(format!("Invalid workchain: {workchain_str}")))?;

        if address_str.len() != 64 {
            return Err(CellError::InvalidAddress(format!(
                "Address hex must be 64 characters, got {}",
                address_str.len()
            )));
        }

        let mut address = [0u8; 32];
        hex::decode_to_slice(address_str, &mut address)
            .map_err(|e| CellError::InvalidAddress(format!("Invalid hex: {e}")))?;

        Ok(MsgAddress::Internal {
            workchain: workchain as i32,
            address,
        })
    }

    /// Parse a user-friendly address.
    ///
    /// Format: 1 byte tag + 1 byte workchain + 32 bytes address + 2 bytes CRC16
    fn from_user_friendly(s: &str) -> CellResult<Self> {
        let bytes = if s.contains(['-', '_']) {
            URL_SAFE.decode(s)
        } else {
            STANDARD.decode(s)
        }
        .map_err(|e| CellError::InvalidBase64(e.to_string()))?;

        if bytes.len() != USER_FRIENDLY_BYTES {
            return Err(CellError::InvalidAddress(format!(
                "User-friendly address must be {USER_FRIENDLY_BYTES} bytes, got {}",
                bytes.len()
            )));
        }

        let expected_crc = u16::from_be_bytes([bytes[34], bytes[35]]);
        let actual_crc = CRC16_XMODEM.checksum(&bytes[..34]);
        if expected_crc != actual_crc {
            return Err(CellError::InvalidAddress(format!(
                "CRC16 mismatch: expected {expected_crc:04x}, got {actual_crc:04x}"
            )));
        }

        let tag = bytes[0] & !TAG_TESTNET;
        if tag != TAG_BOUNCEABLE && tag != TAG_NON_BOUNCEABLE {
            return Err(CellError::InvalidAddress(format!(
                "Unknown address tag: {:#04x}",
                bytes[0]
            )));
        }

        let workchain = bytes[1] as i8 as i32;
        let mut address = [0u8; 32];
        address.copy_from_slice(&bytes[2..34]);

        Ok(MsgAddress::Internal { workchain, address })
    }

    /// Convert to raw string representation ("workchain:hex_address").
    ///
    /// The null address renders as an empty string.
    pub fn to_raw_string(&self) -> String {
        match self {
            MsgAddress::Null => String::new(),
            MsgAddress::Internal { workchain, address } => {
                format!("{workchain}:{}", hex::encode(address))
            }
        }
    }

    /// Convert to URL-safe user-friendly format.
    ///
    /// Returns `None` for the null address.
    pub fn to_user_friendly(&self, bounceable: bool, testnet: bool) -> Option<String> {
        let MsgAddress::Internal { workchain, address } = self else {
            return None;
        };

        let mut data = Vec::with_capacity(USER_FRIENDLY_BYTES);
        let mut tag = if bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if testnet {
            tag |= TAG_TESTNET;
        }
        data.push(tag);
        data.push(*workchain as i8 as u8);
        data.extend_from_slice(address);
        data.extend_from_slice(&CRC16_XMODEM.checksum(&data).to_be_bytes());

        Some(URL_SAFE_NO_PAD.encode(&data))
    }

    /// Get the workchain ID (if internal address).
    pub fn workchain(&self) -> Option<i32> {
        match self {
            MsgAddress::Internal { workchain, .. } => Some(*workchain),
            MsgAddress::Null => None,
        }
    }

    /// Get the 256-bit address hash (if internal address).
    pub fn hash_part(&self) -> Option<&[u8; 32]> {
        match self {
            MsgAddress::Internal { address, .. } => Some(address),
            MsgAddress::Null => None,
        }
    }

    /// Check if this is a null address.
    pub fn is_null(&self) -> bool {
        matches!(self, MsgAddress::Null)
    }

    /// Check if this is an internal address.
    pub fn is_internal(&self) -> bool {
        matches!(self, MsgAddress::Internal { .. })
    }
}

impl fmt::Display for MsgAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_raw_string())
    }
}

impl FromStr for MsgAddress {
    type Err = CellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}
