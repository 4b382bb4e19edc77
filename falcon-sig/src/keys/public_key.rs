//! Public key types for the Falcon digital signature scheme.

use alloc::{string::ToString, vec::Vec};

use super::{
    super::{
        FalconError, FalconParams, MODULUS,
        math::{FalconFelt, Polynomial},
        signature::{RecoverableSignature, Signature, pair_norm},
    },
    ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable,
};

/// Number of bits used to encode one coefficient of `h`.
const FALCON_ENCODING_BITS: u32 = 14;

/// High nibble of the public key header byte.
const PK_HEADER: u8 = 0x00;

// PUBLIC KEY
// ================================================================================================

/// Public key for Falcon DSA: the polynomial `h = g / f mod q` together with its parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicKey {
    params: &'static FalconParams,
    h: Polynomial<FalconFelt>,
}

impl PublicKey {
    pub(crate) fn new(params: &'static FalconParams, h: Polynomial<FalconFelt>) -> Self {
        Self { params, h }
    }

    /// Returns the parameter set of this key.
    pub fn params(&self) -> &'static FalconParams {
        self.params
    }

    /// Returns the public key polynomial `h`.
    pub fn h(&self) -> &Polynomial<FalconFelt> {
        &self.h
    }

    // VERIFICATION
    // --------------------------------------------------------------------------------------------

    /// Verifies the provided signature against provided message and this public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        signature.verify(message, self)
    }

    /// Verifies an encoded signature; any decoding failure makes verification fail.
    pub fn verify_bytes(&self, message: &[u8], signature: &[u8]) -> bool {
        Signature::from_bytes(signature).is_ok_and(|signature| self.verify(message, &signature))
    }

    /// Verifies a public-key-recovery signature: `(s1, s2)` must be short and must recover
    /// exactly this key for the given message.
    pub fn verify_recoverable(&self, message: &[u8], signature: &RecoverableSignature) -> bool {
        signature.params() == self.params && signature.verify_against(message, &self.h)
    }

    /// Verifies an encoded public-key-recovery signature; both halves must decode.
    pub fn verify_recoverable_bytes(&self, message: &[u8], signature: &[u8]) -> bool {
        RecoverableSignature::from_bytes(signature)
            .is_ok_and(|signature| self.verify_recoverable(message, &signature))
    }

    /// Recovers from the signature the public key associated to the secret key used to sign
    /// a message.
    ///
    /// The result authenticates nothing by itself: it must be compared against a trusted key or
    /// key commitment.
    ///
    /// # Errors
    /// - [FalconError::NormBoundExceeded] if `(s1, s2)` is too long to be a valid signature.
    /// - [FalconError::NonInvertible] if `s2` is not invertible modulo q.
    pub fn recover_from(
        message: &[u8],
        signature: &RecoverableSignature,
    ) -> Result<Self, FalconError> {
        let params = signature.params();
        let (s1, s2) = signature.sig_polys();
        let norm = pair_norm(s1, s2);
        if norm > params.sig_bound {
            return Err(FalconError::NormBoundExceeded { norm, bound: params.sig_bound });
        }
        let h = signature.recover_h(message)?;
        Ok(Self::new(params, h))
    }
}

// SERIALIZATION / DESERIALIZATION
// ================================================================================================

impl Serializable for PublicKey {
    /// Writes `0x00 + log2(n)` followed by the coefficients of `h`, 14 bits each, packed
    /// MSB-first and zero-padded to a whole byte.
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u8(PK_HEADER + self.params.log_n);

        let mut bytes = Vec::with_capacity(encoded_len(self.params.n));
        let mut acc = 0u32;
        let mut acc_len = 0u32;
        for coefficient in self.h.coefficients.iter() {
            acc = (acc << FALCON_ENCODING_BITS) | coefficient.value() as u32;
            acc_len += FALCON_ENCODING_BITS;
            while acc_len >= 8 {
                acc_len -= 8;
                bytes.push((acc >> acc_len) as u8);
            }
            acc &= (1 << acc_len) - 1;
        }
        if acc_len > 0 {
            bytes.push((acc << (8 - acc_len)) as u8);
        }
        target.write_bytes(&bytes);
    }

    fn get_size_hint(&self) -> usize {
        1 + encoded_len(self.params.n)
    }
}

impl Deserializable for PublicKey {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let header = source.read_u8()?;
        if header >> 4 != PK_HEADER >> 4 {
            return Err(DeserializationError::InvalidValue(format!(
                "Failed to decode public key: unexpected header byte {header:#04x}"
            )));
        }
        let params = FalconParams::for_log_degree(header & 0x0f)
            .map_err(|err| DeserializationError::InvalidValue(err.to_string()))?;

        let bytes = source.read_vec(encoded_len(params.n))?;
        let mut coefficients = Vec::with_capacity(params.n);
        let mut acc = 0u32;
        let mut acc_len = 0u32;
        for &byte in bytes.iter() {
            acc = (acc << 8) | byte as u32;
            acc_len += 8;
            if acc_len >= FALCON_ENCODING_BITS && coefficients.len() < params.n {
                acc_len -= FALCON_ENCODING_BITS;
                let value = (acc >> acc_len) & ((1 << FALCON_ENCODING_BITS) - 1);
                if value >= MODULUS as u32 {
                    return Err(DeserializationError::InvalidValue(
                        "Failed to decode public key: coefficient out of range".to_string(),
                    ));
                }
                coefficients.push(FalconFelt::new(value as u16));
            }
            acc &= (1 << acc_len) - 1;
        }
        if acc != 0 {
            return Err(DeserializationError::InvalidValue(
                "Failed to decode public key: non-zero padding".to_string(),
            ));
        }

        Ok(Self::new(params, Polynomial::new(coefficients)))
    }
}

/// Byte length of the packed coefficients of `h` for degree `n`.
fn encoded_len(n: usize) -> usize {
    (n * FALCON_ENCODING_BITS as usize).div_ceil(8)
}
