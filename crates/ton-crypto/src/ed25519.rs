//! Ed25519 signing keys for TON wallets.
//!
//! Wallet secrets arrive either as the bare 32-byte seed or in the 64-byte
//! NaCl layout (`seed || public_key`) produced by most TON key derivations.
//! Both are accepted by [`Ed25519Keypair::from_secret`].

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of an Ed25519 seed.
pub const SEED_BYTES: usize = 32;
/// Length of an Ed25519 public key.
pub const PUBLIC_KEY_BYTES: usize = 32;
/// Length of a NaCl-style secret key (`seed || public_key`).
pub const SECRET_KEY_BYTES: usize = SEED_BYTES + PUBLIC_KEY_BYTES;
/// Length of an Ed25519 signature.
pub const SIGNATURE_BYTES: usize = 64;

/// Errors that can occur during Ed25519 operations.
#[derive(Debug, Error)]
pub enum Ed25519Error {
    /// The provided key bytes are invalid.
    #[error("Invalid key bytes: {0}")]
    InvalidKey(String),

    /// The secret is neither a 32-byte seed nor a 64-byte secret key.
    #[error("Invalid secret length: {0} bytes (expected 32 or 64)")]
    InvalidSecretLength(usize),

    /// The public half of a 64-byte secret does not belong to its seed.
    #[error("Public key half of the secret does not match the seed")]
    PublicKeyMismatch,

    /// The signature verification failed.
    #[error("Signature verification failed")]
    VerificationFailed,
}

/// An Ed25519 keypair for signing and verification.
///
/// # Example
/// ```
/// use ton_crypto::ed25519::Ed25519Keypair;
///
/// let keypair = Ed25519Keypair::generate();
/// let signature = keypair.sign(b"Hello, TON!");
/// assert!(keypair.verify(b"Hello, TON!", &signature).is_ok());
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Ed25519Keypair {
    /// The 32-byte seed. Zeroized on drop.
    private_key: [u8; SEED_BYTES],
    /// The 32-byte public key.
    #[zeroize(skip)]
    pub public_key: [u8; PUBLIC_KEY_BYTES],
    /// `SigningKey` wipes itself on drop.
    #[zeroize(skip)]
    signing_key: SigningKey,
}

impl Ed25519Keypair {
    /// Generate a new random Ed25519 keypair from the OS RNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        Self {
            private_key: signing_key.to_bytes(),
            public_key: signing_key.verifying_key().to_bytes(),
            signing_key,
        }
    }

    /// Create a keypair from a 32-byte private key (seed).
    pub fn from_private_key(private_key: [u8; SEED_BYTES]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(&private_key))
    }

    /// Create a keypair from wallet secret bytes.
    ///
    /// Accepts a 32-byte seed or a 64-byte `seed || public_key` secret. For
    /// the latter the public half must be the key derived from the seed.
    pub fn from_secret(secret: &[u8]) -> Result<Self, Ed25519Error> {
        match secret.len() {
            SEED_BYTES | SECRET_KEY_BYTES => {}
            len => return Err(Ed25519Error::InvalidSecretLength(len)),
        }

        let mut seed = [0u8; SEED_BYTES];
        seed.copy_from_slice(&secret[..SEED_BYTES]);
        let keypair = Self::from_private_key(seed);
        seed.zeroize();

        if secret.len() == SECRET_KEY_BYTES && secret[SEED_BYTES..] != keypair.public_key {
            return Err(Ed25519Error::PublicKeyMismatch);
        }
        Ok(keypair)
    }

    /// Sign a message with this keypair.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_BYTES] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Verify a signature against a message using this keypair's public key.
    pub fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_BYTES]) -> Result<(), Ed25519Error> {
        let signature = Signature::from_bytes(signature);
        self.signing_key
            .verifying_key()
            .verify(message, &signature)
            .map_err(|_| Ed25519Error::VerificationFailed)
    }

    /// Get the public key as bytes.
    pub fn public_key_bytes(&self) -> &[u8; PUBLIC_KEY_BYTES] {
        &self.public_key
    }

    /// Get the private key (seed) as bytes.
    pub fn private_key_bytes(&self) -> &[u8; SEED_BYTES] {
        &self.private_key
    }
}

impl std::fmt::Debug for Ed25519Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Keypair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Verify a signature using a public key.
pub fn verify_signature(
    public_key: &[u8; PUBLIC_KEY_BYTES],
    message: &[u8],
    signature: &[u8; SIGNATURE_BYTES],
) -> Result<(), Ed25519Error> {
    let verifying_key = VerifyingKey::from_bytes(public_key)
        .map_err(|e| Ed25519Error::InvalidKey(e.to_string()))?;
    let signature = Signature::from_bytes(signature);
    verifying_key
        .verify(message, &signature)
        .map_err(|_| Ed25519Error::VerificationFailed)
}
