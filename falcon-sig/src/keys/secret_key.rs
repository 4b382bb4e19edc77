use alloc::{string::ToString, vec::Vec};
use core::fmt;

#[cfg(not(feature = "std"))]
use num::Float;
use num_complex::Complex64;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use subtle::{Choice, ConstantTimeEq};
use tracing::{debug, trace};

use super::{
    super::{
        FalconError, FalconParams, MODULUS, SEED_LEN, Salt, ShortLatticeBasis,
        error::Attempt,
        hash_to_point::hash_to_point_shake256,
        math::{
            FalconFelt, FastFft, LdlTree, Polynomial, ffldl, ffsampling, gram, normalize_tree,
            ntru_gen,
        },
        signature::{RecoverableSignature, Signature},
    },
    ByteReader, ByteWriter, Deserializable, DeserializationError, PublicKey, Serializable,
};
use crate::utils::zeroize::{Zeroize, ZeroizeOnDrop};

/// High nibble of the secret key header byte.
const SK_HEADER: u8 = 0x50;

// SECRET KEY
// ================================================================================================

/// Represents the secret key for Falcon DSA.
///
/// The secret key is a short basis `[f, g, F, G]` of the NTRU lattice defined by
/// `h = g / f mod q`, i.e. four short polynomials satisfying `f * G - g * F = q mod x^n + 1`.
/// Alongside the basis the key keeps the values needed for signing:
///
/// 1. the basis `B0 = [[g, -f], [G, -F]]` in FFT form;
/// 2. the Falcon tree of the Gram matrix `B0 * B0^*`, with leaves normalized by `sigma`;
/// 3. the public key polynomial `h`.
///
/// The key is immutable once built and may be shared between threads. All secret material is
/// zeroized on drop.
///
/// ## Serialization Format
///
/// 1. Header byte: `0x50 + log2(n)`.
/// 2. The coefficients of `f`, `g`, `F` and `G`, in that order, as little-endian `i16`.
#[derive(Clone)]
pub struct SecretKey {
    params: &'static FalconParams,
    secret_key: ShortLatticeBasis,
    b0_fft: [Polynomial<Complex64>; 4],
    tree: LdlTree,
    h: Polynomial<FalconFelt>,
}

impl SecretKey {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    /// Generates a secret key of degree `n` from OS-provided randomness.
    ///
    /// # Errors
    /// Returns [FalconError::InvalidParameter] if `n` is not a supported ring degree.
    #[cfg(feature = "std")]
    pub fn new(n: usize) -> Result<Self, FalconError> {
        let mut rng = rand::rng();
        Self::with_rng(n, &mut rng)
    }

    /// Generates a secret key of degree `n` using the provided random number generator.
    ///
    /// # Security Requirements
    ///
    /// The provided RNG must be cryptographically secure. Using a weak or predictable
    /// RNG will completely compromise security.
    ///
    /// # Errors
    /// Returns [FalconError::InvalidParameter] if `n` is not a supported ring degree.
    pub fn with_rng<R: RngCore + CryptoRng>(n: usize, rng: &mut R) -> Result<Self, FalconError> {
        let params = FalconParams::for_degree(n)?;
        let basis = ntru_gen(n, rng);
        Self::from_valid_basis(params, basis)
    }

    /// Builds a secret key of degree `n` from an existing short lattice basis `[f, g, F, G]`.
    ///
    /// # Errors
    /// Returns [FalconError::InvalidParameter] if `n` is not a supported ring degree, if any of
    /// the four polynomials does not have exactly `n` coefficients, if `f` is not invertible
    /// modulo q, or if the polynomials do not satisfy `f * G - g * F = q`.
    pub fn from_short_lattice_basis(
        n: usize,
        basis: ShortLatticeBasis,
    ) -> Result<Self, FalconError> {
        let params = FalconParams::for_degree(n)?;
        if basis.iter().any(|poly| poly.coefficients.len() != n) {
            return Err(FalconError::InvalidParameter(format!(
                "every basis polynomial must have {n} coefficients"
            )));
        }
        if !satisfies_ntru_equation(&basis) {
            return Err(FalconError::InvalidParameter(
                "basis does not satisfy f * G - g * F = q".to_string(),
            ));
        }
        Self::from_valid_basis(params, basis).map_err(|_| {
            FalconError::InvalidParameter("f is not invertible modulo q".to_string())
        })
    }

    /// Derives the signing data from a basis known to satisfy the NTRU equation.
    fn from_valid_basis(
        params: &'static FalconParams,
        basis: ShortLatticeBasis,
    ) -> Result<Self, FalconError> {
        let [f, g, big_f, big_g] = &basis;
        let h = Polynomial::<FalconFelt>::from(g).div_zq(&f.into())?;

        // B0 = [[g, -f], [G, -F]]
        let b0 = [g.clone(), -f, big_g.clone(), -big_f];
        let b0_fft = b0.map(|poly| poly.map(|&c| Complex64::new(c as f64, 0.0)).fft());

        let mut tree = ffldl(gram(&b0_fft));
        normalize_tree(&mut tree, params.sigma);

        Ok(Self { params, secret_key: basis, b0_fft, tree, h })
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the parameter set of this key.
    pub fn params(&self) -> &'static FalconParams {
        self.params
    }

    /// Returns the polynomials of the short lattice basis of this secret key.
    pub fn short_lattice_basis(&self) -> &ShortLatticeBasis {
        &self.secret_key
    }

    /// Returns the public key corresponding to this secret key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::new(self.params, self.h.clone())
    }

    /// Returns the normalized Falcon tree of this key.
    pub fn tree(&self) -> &LdlTree {
        &self.tree
    }

    // SIGNATURE GENERATION
    // --------------------------------------------------------------------------------------------

    /// Signs a message with this secret key using OS-provided randomness.
    #[cfg(feature = "std")]
    pub fn sign(&self, message: &[u8]) -> Signature {
        let mut rng = rand::rng();
        self.sign_with_rng(message, &mut rng)
    }

    /// Signs a message with randomness drawn from a ChaCha20 PRNG seeded with `seed`, so that the
    /// same key, message and seed always produce the same signature.
    pub fn sign_with_seed(&self, message: &[u8], seed: &[u8; SEED_LEN]) -> Signature {
        let mut rng = ChaCha20Rng::from_seed(*seed);
        self.sign_with_rng(message, &mut rng)
    }

    /// Signs a message with this secret key using the provided random number generator.
    ///
    /// Every attempt draws a fresh salt; attempts whose signature is too long or does not fit
    /// the fixed-size encoding are discarded.
    pub fn sign_with_rng<R: RngCore + CryptoRng>(&self, message: &[u8], rng: &mut R) -> Signature {
        retry_until_accepted("signature", || self.try_sign(message, &mut *rng).into())
    }

    /// Signs a message in public-key-recovery mode using OS-provided randomness.
    #[cfg(feature = "std")]
    pub fn sign_recoverable(&self, message: &[u8]) -> RecoverableSignature {
        let mut rng = rand::rng();
        self.sign_recoverable_with_rng(message, &mut rng)
    }

    /// Signs a message in public-key-recovery mode with a ChaCha20 PRNG seeded with `seed`.
    pub fn sign_recoverable_with_seed(
        &self,
        message: &[u8],
        seed: &[u8; SEED_LEN],
    ) -> RecoverableSignature {
        let mut rng = ChaCha20Rng::from_seed(*seed);
        self.sign_recoverable_with_rng(message, &mut rng)
    }

    /// Signs a message in public-key-recovery mode using the provided random number generator.
    ///
    /// On top of the checks of [SecretKey::sign_with_rng], attempts whose `s2` is not invertible
    /// modulo q are discarded, since the verifier divides by it.
    pub fn sign_recoverable_with_rng<R: RngCore + CryptoRng>(
        &self,
        message: &[u8],
        rng: &mut R,
    ) -> RecoverableSignature {
        retry_until_accepted("recoverable signature", || {
            self.try_sign_recoverable(message, &mut *rng).into()
        })
    }

    // HELPER METHODS
    // --------------------------------------------------------------------------------------------

    /// Runs one attempt of the signing procedure.
    fn try_sign<R: RngCore + ?Sized>(
        &self,
        message: &[u8],
        rng: &mut R,
    ) -> Result<Signature, FalconError> {
        let params = self.params;
        let salt = Salt::random(rng);
        let c = hash_to_point_shake256(message, &salt, params.n);
        let (s0, s1) = self.sample_preimage(&c, rng);
        let (_, s1) = self.check_norm(&s0, &s1)?;

        Signature::new(params, salt, s1.into())
    }

    /// Runs one attempt of the recoverable signing procedure.
    fn try_sign_recoverable<R: RngCore + ?Sized>(
        &self,
        message: &[u8],
        rng: &mut R,
    ) -> Result<RecoverableSignature, FalconError> {
        let params = self.params;
        let salt = Salt::random(rng);
        let c = hash_to_point_shake256(message, &salt, params.n);
        let (s0, s1) = self.sample_preimage(&c, rng);
        if !s1.map(|&x| FalconFelt::from(x)).is_invertible() {
            return Err(FalconError::NonInvertible);
        }
        let (s1, s2) = self.check_norm(&s0, &s1)?;

        RecoverableSignature::new(params, salt, s1.into(), s2.into())
    }

    /// Samples a short `(s0, s1)` with `s0 + s1 * h = point mod q`.
    ///
    /// The target `(point, 0)` is expressed in the basis `B0` as `t = (point * d / q,
    /// -point * b / q)`; the Falcon tree samples a lattice vector `z * B0` close to it and the
    /// difference between target and lattice vector is returned.
    pub(crate) fn sample_preimage<R: RngCore + ?Sized>(
        &self,
        point: &Polynomial<FalconFelt>,
        rng: &mut R,
    ) -> (Polynomial<i64>, Polynomial<i64>) {
        let [a, b, c, d] = &self.b0_fft;
        let q = MODULUS as f64;

        let point_fft = point.map(|x| Complex64::new(x.value() as f64, 0.0)).fft();
        let t0 = point_fft.hadamard_mul(d).map(|z| z / q);
        let t1 = point_fft.hadamard_mul(b).map(|z| -z / q);

        let (z0, z1) = ffsampling(&(t0, t1), &self.tree, self.params.sigmin, rng);

        // v = z * B0 is a lattice vector close to (point, 0)
        let v0 = (&z0.hadamard_mul(a) + &z1.hadamard_mul(c)).ifft();
        let v1 = (&z0.hadamard_mul(b) + &z1.hadamard_mul(d)).ifft();

        let s0 = Polynomial::new(
            point
                .coefficients
                .iter()
                .zip(v0.coefficients.iter())
                .map(|(p, v)| p.value() as i64 - v.re.round() as i64)
                .collect(),
        );
        let s1 = v1.map(|v| -(v.re.round() as i64));
        (s0, s1)
    }

    /// Checks `||s0||^2 + ||s1||^2` against the signature bound and narrows both halves to
    /// 16-bit coefficients.
    fn check_norm(
        &self,
        s0: &Polynomial<i64>,
        s1: &Polynomial<i64>,
    ) -> Result<(Polynomial<i16>, Polynomial<i16>), FalconError> {
        let bound = self.params.sig_bound;
        let norm = wide_sq_norm(s0).saturating_add(wide_sq_norm(s1));
        if norm > bound {
            return Err(FalconError::NormBoundExceeded { norm, bound });
        }
        match (narrow(s0), narrow(s1)) {
            (Some(s0), Some(s1)) => Ok((s0, s1)),
            _ => Err(FalconError::NormBoundExceeded { norm, bound }),
        }
    }
}

/// Repeats `attempt` until it produces a value.
fn retry_until_accepted<T>(kind: &'static str, mut attempt: impl FnMut() -> Attempt<T>) -> T {
    let mut attempts = 0usize;
    loop {
        attempts += 1;
        match attempt() {
            Attempt::Accept(value) => {
                trace!(kind, attempts, "signing attempt accepted");
                return value;
            },
            Attempt::Retry(reason) => {
                debug!(kind, attempt = attempts, %reason, "signing attempt rejected");
            },
        }
    }
}

fn wide_sq_norm(poly: &Polynomial<i64>) -> u64 {
    poly.fold(0u64, |acc, &c| {
        let magnitude = c.unsigned_abs();
        acc.saturating_add(magnitude.saturating_mul(magnitude))
    })
}

fn narrow(poly: &Polynomial<i64>) -> Option<Polynomial<i16>> {
    poly.coefficients
        .iter()
        .map(|&c| i16::try_from(c).ok())
        .collect::<Option<Vec<_>>>()
        .map(Polynomial::new)
}

/// Returns true if `f * G - g * F = q mod x^n + 1`, computed over exact integers.
fn satisfies_ntru_equation(basis: &ShortLatticeBasis) -> bool {
    let [f, g, big_f, big_g] = basis.each_ref().map(|poly| poly.map(|&c| c as i64));
    let lhs = &f.mul_negacyclic(&big_g) - &g.mul_negacyclic(&big_f);
    lhs.coefficients
        .iter()
        .enumerate()
        .all(|(i, &c)| c == if i == 0 { MODULUS as i64 } else { 0 })
}

// TRAIT IMPLEMENTATIONS
// ================================================================================================

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<elided secret for SecretKey>")
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<elided secret for SecretKey>")
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        let mut equal = Choice::from((self.params == other.params) as u8);
        for (lhs, rhs) in self.secret_key.iter().zip(other.secret_key.iter()) {
            equal &= lhs.coefficients.as_slice().ct_eq(rhs.coefficients.as_slice());
        }
        equal.into()
    }
}

impl Eq for SecretKey {}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        for poly in self.secret_key.iter_mut() {
            poly.zeroize();
        }
        for poly in self.b0_fft.iter_mut() {
            for coeff in poly.coefficients.iter_mut() {
                // Complex64 does not implement Zeroize
                unsafe {
                    core::ptr::write_volatile(coeff, Complex64::new(0.0, 0.0));
                }
            }
        }
        core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
        self.tree.zeroize();
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for SecretKey {}

// SERIALIZATION / DESERIALIZATION
// ================================================================================================

impl Serializable for SecretKey {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u8(SK_HEADER + self.params.log_n);
        for poly in self.secret_key.iter() {
            for c in poly.coefficients.iter() {
                target.write_bytes(&c.to_le_bytes());
            }
        }
    }

    fn get_size_hint(&self) -> usize {
        1 + 4 * 2 * self.params.n
    }
}

impl Deserializable for SecretKey {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let header = source.read_u8()?;
        if header >> 4 != SK_HEADER >> 4 {
            return Err(DeserializationError::InvalidValue(format!(
                "Failed to decode secret key: unexpected header byte {header:#04x}"
            )));
        }
        let params = FalconParams::for_log_degree(header & 0x0f)
            .map_err(|err| DeserializationError::InvalidValue(err.to_string()))?;

        let mut read_poly = || -> Result<Polynomial<i16>, DeserializationError> {
            let coefficients = (0..params.n)
                .map(|_| source.read_array::<2>().map(i16::from_le_bytes))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Polynomial::new(coefficients))
        };
        let basis = [read_poly()?, read_poly()?, read_poly()?, read_poly()?];

        Self::from_short_lattice_basis(params.n, basis)
            .map_err(|err| DeserializationError::InvalidValue(err.to_string()))
    }
}
