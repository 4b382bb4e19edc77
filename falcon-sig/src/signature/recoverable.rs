use super::{
    ByteReader, ByteWriter, CompressedPoly, Deserializable, DeserializationError, FalconParams,
    Polynomial, Salt, Serializable, SignatureHeader, SignaturePoly, hash_to_point_shake256,
    pair_norm, read_exact, read_poly,
};
use crate::{FalconError, FalconFelt};

// RECOVERABLE SIGNATURE
// ================================================================================================

/// A Falcon signature in public-key-recovery mode.
///
/// Instead of only `s2`, the signature carries both short polynomials `(s1, s2)` satisfying
/// `s1 + s2 * h = c mod q` with `c = HashToPoint(r || message)`. Since `s2` is invertible modulo
/// q, anyone holding the message can recompute the signer's public key as
/// `h = s2^-1 * (c - s1)`, so a verifier only needs to know (a commitment to) `h`.
///
/// ## Serialization Format
///
/// 1. Header byte (1 byte): `0x30 + log2(n)`, as for [super::Signature].
/// 2. Salt (40 bytes).
/// 3. s1 polynomial (`sig_bytelen - 41` bytes): compressed.
/// 4. s2 polynomial (`sig_bytelen - 41` bytes): compressed.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoverableSignature {
    header: SignatureHeader,
    salt: Salt,
    s1: CompressedPoly,
    s2: CompressedPoly,
}

impl RecoverableSignature {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Creates a recoverable signature from the given parameter set, salt and polynomials.
    ///
    /// # Errors
    /// Returns [FalconError::EncodingOverflow] if either polynomial does not compress into
    /// `params.body_len()` bytes.
    pub(crate) fn new(
        params: &'static FalconParams,
        salt: Salt,
        s1: SignaturePoly,
        s2: SignaturePoly,
    ) -> Result<Self, FalconError> {
        let s1 = CompressedPoly::new(s1, params.body_len())?;
        let s2 = CompressedPoly::new(s2, params.body_len())?;
        Ok(Self { header: SignatureHeader::new(params), salt, s1, s2 })
    }

    /// Decodes a recoverable signature from its canonical byte encoding, rejecting trailing
    /// bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeserializationError> {
        read_exact(bytes)
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the parameter set this signature was produced for.
    pub fn params(&self) -> &'static FalconParams {
        self.header.params()
    }

    /// Returns the salt component of the signature.
    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// Returns the short polynomials `(s1, s2)`.
    pub fn sig_polys(&self) -> (&SignaturePoly, &SignaturePoly) {
        (&self.s1.poly, &self.s2.poly)
    }

    // KEY RECOVERY
    // --------------------------------------------------------------------------------------------

    /// Recomputes the public key polynomial `h = (c - s1) / s2 mod q` for the given message.
    ///
    /// # Errors
    /// Returns [FalconError::NonInvertible] if `s2` has no inverse modulo q.
    pub fn recover_h(&self, message: &[u8]) -> Result<Polynomial<FalconFelt>, FalconError> {
        let c = hash_to_point_shake256(message, &self.salt, self.params().n);
        (&c - &self.s1.poly.to_field()).div_zq(&self.s2.poly.to_field())
    }

    /// Returns true if `(s1, s2)` is short enough and recovers to `h` for the given message.
    pub(crate) fn verify_against(&self, message: &[u8], h: &Polynomial<FalconFelt>) -> bool {
        if pair_norm(&self.s1.poly, &self.s2.poly) > self.params().sig_bound {
            return false;
        }
        match self.recover_h(message) {
            Ok(recovered) => recovered == *h,
            Err(_) => false,
        }
    }
}

impl Serializable for RecoverableSignature {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.header.write_into(target);
        self.salt.write_into(target);
        self.s1.write_into(target);
        self.s2.write_into(target);
    }

    fn get_size_hint(&self) -> usize {
        self.params().recoverable_bytelen()
    }
}

impl Deserializable for RecoverableSignature {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let header = SignatureHeader::read_from(source)?;
        let salt = Salt::read_from(source)?;
        let s1 = read_poly(source, header.params())?;
        let s2 = read_poly(source, header.params())?;

        Ok(Self { header, salt, s1, s2 })
    }
}
