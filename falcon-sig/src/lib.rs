//! Falcon lattice-based digital signatures.
//!
//! The crate covers the complete scheme over the ring Z_q\[x\]/(x^n + 1) with q = 12289 for
//! every power-of-two degree from 2 to 1024:
//!
//! - NTRU key generation producing a short basis `[f, g, F, G]` with `fG - gF = q`;
//! - a fast-Fourier LDL tree over that basis driving a Gaussian trapdoor sampler;
//! - SHAKE256 hash-to-point, the compressed signature encoding and verification;
//! - a public-key-recovery mode where the signature carries enough information to recompute
//!   the signer's public key.
//!
//! ```
//! use falcon_sig::SecretKey;
//!
//! let sk = SecretKey::with_rng(64, &mut rand::rng()).unwrap();
//! let pk = sk.public_key();
//!
//! let signature = sk.sign_with_seed(b"Hello World!", &[7u8; 32]);
//! assert!(pk.verify(b"Hello World!", &signature));
//! ```
#![no_std]

#[macro_use]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod error;
mod hash_to_point;
mod keys;
mod math;
mod params;
mod signature;
pub mod utils;

#[cfg(test)]
mod tests;

use utils::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable};

// RE-EXPORTS
// ================================================================================================

pub use self::{
    error::FalconError,
    hash_to_point::{hash_to_point, hash_to_point_shake256},
    keys::{PublicKey, SecretKey, generate_keypair_with_rng},
    math::{FalconFelt, FastFft, LdlTree, Polynomial},
    params::FalconParams,
    signature::{
        RecoverableSignature, Signature, SignatureHeader, SignaturePoly, compress, decompress,
    },
};

#[cfg(feature = "std")]
pub use keys::generate_keypair;

// CONSTANTS
// ================================================================================================

/// The Falcon modulus q.
pub const MODULUS: i16 = 12289;

/// Length of the signature header in bytes.
pub const HEAD_LEN: usize = 1;

/// Length of the salt mixed into hash-to-point.
pub const SALT_LEN: usize = 40;

/// Length of the seed accepted by the deterministic signing path.
pub const SEED_LEN: usize = 32;

// TYPE ALIASES
// ================================================================================================

/// The four short polynomials `[f, g, F, G]` satisfying `fG - gF = q mod (x^n + 1)`.
pub type ShortLatticeBasis = [Polynomial<i16>; 4];

// SALT
// ================================================================================================

/// Random salt drawn for every signing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Returns a new [Salt] instantiated from the provided bytes.
    pub fn new(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// Draws a fresh salt from the provided randomness source.
    pub fn random<R: rand::RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SALT_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Returns the underlying bytes of this salt.
    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

impl Serializable for Salt {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_bytes(&self.0)
    }
}

impl Deserializable for Salt {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let bytes = source.read_array()?;
        Ok(Self(bytes))
    }
}
