use alloc::{string::ToString, vec::Vec};
use core::ops::Deref;

use super::{
    ByteReader, ByteWriter, Deserializable, DeserializationError, FalconError, FalconParams, Salt,
    Serializable,
    hash_to_point::hash_to_point_shake256,
    keys::PublicKey,
    math::{FalconFelt, Polynomial},
};
use crate::utils::SliceReader;

mod codec;
pub use codec::{compress, decompress};

mod recoverable;
pub use recoverable::RecoverableSignature;

// FALCON SIGNATURE
// ================================================================================================

/// A Falcon signature over a message.
///
/// The signature is a short polynomial `s1` in Z\[x\]/(x^n + 1) together with a salt `r`. It
/// verifies against a public key `h` if and only if:
/// 1. s0 = c - s1 * h mod q, taken with coefficients in `[-(q-1)/2, (q-1)/2]`;
/// 2. |s0|^2 + |s1|^2 <= β² (where β² is the `sig_bound` of the parameter set)
///
/// where |.| is the norm and c = HashToPoint(r || message) using SHAKE256.
///
/// ## Serialization Format
///
/// The signature is serialized as:
/// 1. Header byte (1 byte): `0x30 + log2(n)`, the compressed-encoding header of the Falcon
///    paper.
/// 2. Salt (40 bytes): The salt used in hash-to-point.
/// 3. s1 polynomial (`sig_bytelen - 41` bytes): Compressed signature polynomial.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    header: SignatureHeader,
    salt: Salt,
    s1: CompressedPoly,
}

impl Signature {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Creates a new signature from the given parameter set, salt and signature polynomial.
    ///
    /// # Errors
    /// Returns [FalconError::EncodingOverflow] if `s1` does not compress into
    /// `params.body_len()` bytes.
    pub(crate) fn new(
        params: &'static FalconParams,
        salt: Salt,
        s1: SignaturePoly,
    ) -> Result<Self, FalconError> {
        let s1 = CompressedPoly::new(s1, params.body_len())?;
        Ok(Self { header: SignatureHeader::new(params), salt, s1 })
    }

    /// Decodes a signature from its canonical byte encoding, rejecting trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeserializationError> {
        read_exact(bytes)
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the header of this signature.
    pub fn header(&self) -> &SignatureHeader {
        &self.header
    }

    /// Returns the parameter set this signature was produced for.
    pub fn params(&self) -> &'static FalconParams {
        self.header.params()
    }

    /// Returns the salt component of the signature.
    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// Returns the short polynomial `s1` of the signature.
    pub fn sig_poly(&self) -> &SignaturePoly {
        &self.s1.poly
    }

    // SIGNATURE VERIFICATION
    // --------------------------------------------------------------------------------------------

    /// Returns true if this signature is a valid signature for the specified message generated
    /// against the secret key matching the specified public key.
    pub fn verify(&self, message: &[u8], pub_key: &PublicKey) -> bool {
        let params = self.params();
        if pub_key.params() != params {
            return false;
        }
        let c = hash_to_point_shake256(message, &self.salt, params.n);
        verify_helper(&c, &self.s1.poly, pub_key.h(), params.sig_bound)
    }
}

impl Serializable for Signature {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.header.write_into(target);
        self.salt.write_into(target);
        self.s1.write_into(target);
    }

    fn get_size_hint(&self) -> usize {
        self.params().sig_bytelen
    }
}

impl Deserializable for Signature {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let header = SignatureHeader::read_from(source)?;
        let salt = Salt::read_from(source)?;
        let s1 = read_poly(source, header.params())?;

        Ok(Self { header, salt, s1 })
    }
}

// SIGNATURE HEADER
// ================================================================================================

/// The header byte used to encode the signature metadata.
///
/// According to section 3.11.3 of the Falcon paper [1], the signature header has the format
/// `0cc1nnnn` where:
///
/// 1. `cc` signifies the encoding method. `01` denotes using the compression encoding method
///    and `10` denotes encoding using the uncompressed method.
/// 2. `nnnn` encodes `log2(n)`.
///
/// This crate only produces and accepts compressed signatures, i.e. headers `0x31..=0x3a`.
///
/// [1]: https://falcon-sign.info/falcon.pdf
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignatureHeader {
    params: &'static FalconParams,
}

impl SignatureHeader {
    /// Returns the header for signatures of the given parameter set.
    pub fn new(params: &'static FalconParams) -> Self {
        Self { params }
    }

    /// Returns the header byte.
    pub fn as_byte(&self) -> u8 {
        self.params.signature_header()
    }

    /// Returns the parameter set encoded in the header.
    pub fn params(&self) -> &'static FalconParams {
        self.params
    }
}

impl Serializable for SignatureHeader {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u8(self.as_byte())
    }
}

impl Deserializable for SignatureHeader {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let header = source.read_u8()?;
        let (encoding, log_n) = (header >> 4, header & 0b00001111);
        if encoding != 0b0011 {
            return Err(DeserializationError::InvalidValue(
                "Failed to decode signature: not supported encoding algorithm".to_string(),
            ));
        }

        let params = FalconParams::for_log_degree(log_n).map_err(|_| {
            DeserializationError::InvalidValue(format!(
                "Failed to decode signature: unsupported polynomial degree 2^{log_n}"
            ))
        })?;

        Ok(Self { params })
    }
}

// SIGNATURE POLYNOMIAL
// ================================================================================================

/// A short polynomial carried by a signature, with coefficients kept as exact integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePoly(pub Polynomial<i16>);

impl Deref for SignaturePoly {
    type Target = Polynomial<i16>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Polynomial<i16>> for SignaturePoly {
    fn from(poly: Polynomial<i16>) -> Self {
        Self(poly)
    }
}

impl SignaturePoly {
    /// Returns the polynomial reduced modulo q.
    pub fn to_field(&self) -> Polynomial<FalconFelt> {
        (&self.0).into()
    }
}

// COMPRESSED POLYNOMIAL
// ================================================================================================

/// A signature polynomial kept next to its fixed-length compressed encoding, so that the
/// encoding computed while signing is the one written out.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompressedPoly {
    pub(crate) poly: SignaturePoly,
    bytes: Vec<u8>,
}

impl CompressedPoly {
    /// Compresses `poly` into exactly `body_len` bytes.
    pub(crate) fn new(poly: SignaturePoly, body_len: usize) -> Result<Self, FalconError> {
        let bytes = compress(&poly.coefficients, body_len)?;
        Ok(Self { poly, bytes })
    }

    /// Returns the compressed encoding.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Serializable for CompressedPoly {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_bytes(self.as_bytes());
    }

    fn get_size_hint(&self) -> usize {
        self.bytes.len()
    }
}

// HELPER FUNCTIONS
// ================================================================================================

/// Reads one compressed polynomial of the given parameter set.
pub(crate) fn read_poly<R: ByteReader>(
    source: &mut R,
    params: &FalconParams,
) -> Result<CompressedPoly, DeserializationError> {
    let bytes = source.read_vec(params.body_len())?;
    let coefficients = decompress(&bytes, params.body_len(), params.n)
        .map_err(|err| DeserializationError::InvalidValue(err.to_string()))?;
    // decoding is canonical, so `bytes` is also the encoding `compress` would produce
    Ok(CompressedPoly { poly: Polynomial::new(coefficients).into(), bytes })
}

/// Deserializes `T` from `bytes`, failing if any byte is left over.
pub(crate) fn read_exact<T: Deserializable>(bytes: &[u8]) -> Result<T, DeserializationError> {
    let mut reader = SliceReader::new(bytes);
    let value = T::read_from(&mut reader)?;
    if reader.has_more_bytes() {
        return Err(DeserializationError::InvalidValue(
            "unexpected trailing bytes after signature".to_string(),
        ));
    }
    Ok(value)
}

/// Takes the hash-to-point polynomial `c` of a message, the signature polynomial over
/// the message `s1` and a public key polynomial and returns `true` if the signature is valid,
/// otherwise it returns `false`.
pub(crate) fn verify_helper(
    c: &Polynomial<FalconFelt>,
    s1: &SignaturePoly,
    h: &Polynomial<FalconFelt>,
    sig_bound: u64,
) -> bool {
    if s1.coefficients.len() != h.coefficients.len() {
        return false;
    }
    let s0 = (c - &s1.to_field().mul_zq(h)).to_balanced();
    s0.sq_norm() + s1.sq_norm() <= sig_bound
}

/// Squared Euclidean norm of the concatenation of two signature polynomials.
pub(crate) fn pair_norm(s1: &SignaturePoly, s2: &SignaturePoly) -> u64 {
    s1.sq_norm() + s2.sq_norm()
}

// TESTS
// ================================================================================================
