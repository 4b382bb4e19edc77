use alloc::vec::Vec;

use sha3::{
    Shake256,
    digest::{ExtendableOutput, Update, XofReader},
};

use super::{MODULUS, Polynomial, Salt, math::FalconFelt};

/// Largest multiple of q that fits in 16 bits; two-byte samples at or above it are discarded so
/// that the accepted values are uniform modulo q.
const REJECTION_BOUND: u32 = (1u32 << 16) / MODULUS as u32 * MODULUS as u32;

// HASH-TO-POINT FUNCTIONS
// ================================================================================================

/// Returns a polynomial in Z_q\[x\]/(x^n + 1) representing the hash of the provided message and
/// salt, squeezed out of the extendable-output function `X`.
///
/// The XOF absorbs `salt || message`. Its output is read two bytes at a time as big-endian
/// integers; values below 61445 are reduced modulo q and become the next coefficient, larger
/// values are skipped.
pub fn hash_to_point<X>(message: &[u8], salt: &Salt, n: usize) -> Polynomial<FalconFelt>
where
    X: Update + ExtendableOutput + Default,
{
    let mut hasher = X::default();
    hasher.update(salt.as_bytes());
    hasher.update(message);
    let mut reader = hasher.finalize_xof();

    let mut coefficients: Vec<FalconFelt> = Vec::with_capacity(n);
    while coefficients.len() != n {
        let mut randomness = [0u8; 2];
        reader.read(&mut randomness);
        let t = u16::from_be_bytes(randomness) as u32;
        if t < REJECTION_BOUND {
            coefficients.push(FalconFelt::new((t % MODULUS as u32) as u16));
        }
    }

    Polynomial { coefficients }
}

/// Returns a polynomial in Z_q\[x\]/(x^n + 1) representing the hash of the provided message and
/// salt using SHAKE256. This is the hash-to-point algorithm of the Falcon paper.
pub fn hash_to_point_shake256(message: &[u8], salt: &Salt, n: usize) -> Polynomial<FalconFelt> {
    hash_to_point::<Shake256>(message, salt, n)
}
