//! TON Cryptography Library
//!
//! Ed25519 keys as used by TON wallet contracts: a wallet transfer is
//! authorized by signing the representation hash of its body cell.
//!
//! # Example
//!
//! ```
//! use ton_crypto::{verify_signature, Ed25519Keypair};
//!
//! let keypair = Ed25519Keypair::generate();
//! let body_hash = [7u8; 32];
//! let signature = keypair.sign(&body_hash);
//! assert!(verify_signature(&keypair.public_key, &body_hash, &signature).is_ok());
//! ```

pub mod ed25519;

pub use ed25519::{verify_signature, Ed25519Error, Ed25519Keypair, PUBLIC_KEY_BYTES, SECRET_KEY_BYTES, SEED_BYTES, SIGNATURE_BYTES};
