//! Generation of NTRU trapdoors `[f, g, F, G]` satisfying `f * G - g * F = q mod x^n + 1`.

use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use num::Float;
use num::{BigInt, Integer, One, Signed, ToPrimitive, Zero};
use num_complex::Complex64;
use rand::RngCore;
use tracing::debug;

use super::{FalconError, FalconFelt, FastFft, MODULUS, Polynomial, samplerz::sampler_z};
use crate::{ShortLatticeBasis, utils::zeroize::Zeroize};

/// Standard deviation of the coefficients of `f` and `g` when summed over `4096 / n` samples.
const SIGMA_FG: f64 = 1.43300980528773;

/// Number of `sampler_z` draws shared out among the coefficients of one polynomial.
const FG_SAMPLES: usize = 4096;

/// Bound on the Gram-Schmidt norm of the basis, relative to q.
const GS_NORM_FACTOR: f64 = 1.17 * 1.17;

/// Bits of precision kept when size-reducing big polynomials in floating point.
const REDUCTION_PRECISION: u64 = 53;

// NTRU GENERATION
// ================================================================================================

/// Samples a short lattice basis `[f, g, F, G]` for the ring of degree `n`.
///
/// Candidates are drawn until `(f, g)` has a small enough Gram-Schmidt norm, `f` and `g` are
/// invertible modulo q, and the NTRU equation has a solution `(F, G)` with 16-bit coefficients.
pub fn ntru_gen<R: RngCore + ?Sized>(n: usize, rng: &mut R) -> ShortLatticeBasis {
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        let mut f = gen_poly(n, rng);
        let mut g = gen_poly(n, rng);

        let rejection = if gram_schmidt_norm_squared(&f, &g) > GS_NORM_FACTOR * MODULUS as f64 {
            Some("Gram-Schmidt norm too large")
        } else if !has_ntt_inverse(&f) || !has_ntt_inverse(&g) {
            Some("f or g not invertible modulo q")
        } else {
            None
        };
        if let Some(reason) = rejection {
            debug!(attempt, reason, "rejected NTRU candidate");
            f.zeroize();
            g.zeroize();
            continue;
        }

        match solve_short(&f, &g) {
            Ok((big_f, big_g)) => {
                debug!(attempt, n, "NTRU basis found");
                return [f, g, big_f, big_g];
            },
            Err(err) => {
                debug!(attempt, %err, "rejected NTRU candidate");
                f.zeroize();
                g.zeroize();
            },
        }
    }
}

/// Generates a polynomial whose coefficients each sum `4096 / n` discrete Gaussian samples.
fn gen_poly<R: RngCore + ?Sized>(n: usize, rng: &mut R) -> Polynomial<i16> {
    let k = FG_SAMPLES / n;
    let coefficients = (0..n)
        .map(|_| (0..k).map(|_| sampler_z(0.0, SIGMA_FG, SIGMA_FG - 0.001, rng)).sum())
        .collect();
    Polynomial::new(coefficients)
}

fn to_complex_fft(p: &Polynomial<i16>) -> Polynomial<Complex64> {
    p.map(|&c| Complex64::new(c as f64, 0.0)).fft()
}

/// Squared Gram-Schmidt norm of the basis generated by `(f, g)`:
/// `max(||(f, g)||^2, q^2 * ||(F~, G~)||^2)` where `F~ = g* / (f f* + g g*)` and
/// `G~ = f* / (f f* + g g*)`.
fn gram_schmidt_norm_squared(f: &Polynomial<i16>, g: &Polynomial<i16>) -> f64 {
    let sqnorm_fg = (f.sq_norm() + g.sq_norm()) as f64;

    let f_fft = to_complex_fft(f);
    let g_fft = to_complex_fft(g);
    let f_adj = f_fft.map(|c| c.conj());
    let g_adj = g_fft.map(|c| c.conj());
    let ffgg = &f_fft.hadamard_mul(&f_adj) + &g_fft.hadamard_mul(&g_adj);
    let ft = g_adj.hadamard_div(&ffgg).ifft();
    let gt = f_adj.hadamard_div(&ffgg).ifft();
    let sqnorm_ft_gt: f64 =
        ft.coefficients.iter().chain(gt.coefficients.iter()).map(|c| c.re * c.re).sum();

    let q = MODULUS as f64;
    sqnorm_fg.max(q * q * sqnorm_ft_gt)
}

fn has_ntt_inverse(p: &Polynomial<i16>) -> bool {
    !Polynomial::<FalconFelt>::from(p).fft().coefficients.iter().any(|c| c.is_zero())
}

/// Solves the NTRU equation for `(f, g)` and narrows the solution to 16-bit coefficients.
fn solve_short(
    f: &Polynomial<i16>,
    g: &Polynomial<i16>,
) -> Result<(Polynomial<i16>, Polynomial<i16>), FalconError> {
    let to_big = |p: &Polynomial<i16>| p.map(|&c| BigInt::from(c));
    let (big_f, big_g) = ntru_solve(&to_big(f), &to_big(g))?;
    Ok((narrow(&big_f)?, narrow(&big_g)?))
}

fn narrow(p: &Polynomial<BigInt>) -> Result<Polynomial<i16>, FalconError> {
    let coefficients = p
        .coefficients
        .iter()
        .map(|c| c.to_i16().ok_or(FalconError::NtruUnsolvable))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polynomial::new(coefficients))
}

// NTRU SOLVE
// ================================================================================================

/// Finds `(F, G)` with `f * G - g * F = q mod x^n + 1` by the field-norm descent of
/// Pornin and Prest.
///
/// # Errors
/// Returns [FalconError::NtruUnsolvable] if the resultants of `f` and `g` are not coprime.
pub fn ntru_solve(
    f: &Polynomial<BigInt>,
    g: &Polynomial<BigInt>,
) -> Result<(Polynomial<BigInt>, Polynomial<BigInt>), FalconError> {
    let n = f.coefficients.len();
    if n == 1 {
        let (d, u, v) = xgcd(&f.coefficients[0], &g.coefficients[0]);
        if !d.is_one() {
            return Err(FalconError::NtruUnsolvable);
        }
        let q = BigInt::from(MODULUS);
        return Ok((Polynomial::new(vec![-(&q * v)]), Polynomial::new(vec![q * u])));
    }

    let (big_f_prime, big_g_prime) = ntru_solve(&f.field_norm(), &g.field_norm())?;
    let big_f = big_f_prime.lift().mul_negacyclic(&g.galois_conjugate());
    let big_g = big_g_prime.lift().mul_negacyclic(&f.galois_conjugate());
    reduce(f, g, big_f, big_g)
}

/// Extended Euclid with floor division: returns `(d, u, v)` with `a * u + b * v = d`.
fn xgcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut x0, mut x1) = (BigInt::one(), BigInt::zero());
    let (mut y0, mut y1) = (BigInt::zero(), BigInt::one());
    let (mut a, mut b) = (a.clone(), b.clone());
    while !b.is_zero() {
        let (quotient, remainder) = a.div_mod_floor(&b);
        a = core::mem::replace(&mut b, remainder);
        let x2 = &x0 - &quotient * &x1;
        x0 = core::mem::replace(&mut x1, x2);
        let y2 = &y0 - &quotient * &y1;
        y0 = core::mem::replace(&mut y1, y2);
    }
    (a, x0, y0)
}

/// Byte-granular bit length of the largest coefficient magnitude.
fn bitsize(p: &Polynomial<BigInt>) -> u64 {
    p.coefficients.iter().map(|c| c.abs().bits().div_ceil(8) * 8).max().unwrap_or(0)
}

/// Converts the top 53 bits of each coefficient into the FFT domain.
fn scaled_fft(p: &Polynomial<BigInt>, shift: u64) -> Result<Polynomial<Complex64>, FalconError> {
    let coefficients = p
        .coefficients
        .iter()
        .map(|c| {
            (c >> shift)
                .to_f64()
                .map(|re| Complex64::new(re, 0.0))
                .ok_or(FalconError::NtruUnsolvable)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polynomial::new(coefficients).fft())
}

/// Babai size reduction of `(F, G)` against `(f, g)`.
///
/// Repeatedly subtracts `k * (f, g)` with `k = round((F f* + G g*) / (f f* + g g*))`, computed on
/// 53-bit approximations, until `(F, G)` is no larger than `(f, g)` or no progress is made.
fn reduce(
    f: &Polynomial<BigInt>,
    g: &Polynomial<BigInt>,
    mut big_f: Polynomial<BigInt>,
    mut big_g: Polynomial<BigInt>,
) -> Result<(Polynomial<BigInt>, Polynomial<BigInt>), FalconError> {
    let size = REDUCTION_PRECISION.max(bitsize(f)).max(bitsize(g));
    let f_fft = scaled_fft(f, size - REDUCTION_PRECISION)?;
    let g_fft = scaled_fft(g, size - REDUCTION_PRECISION)?;
    let f_adj = f_fft.map(|c| c.conj());
    let g_adj = g_fft.map(|c| c.conj());
    let den = &f_fft.hadamard_mul(&f_adj) + &g_fft.hadamard_mul(&g_adj);

    loop {
        let big_size = REDUCTION_PRECISION.max(bitsize(&big_f)).max(bitsize(&big_g));
        if big_size < size {
            break;
        }

        let big_f_fft = scaled_fft(&big_f, big_size - REDUCTION_PRECISION)?;
        let big_g_fft = scaled_fft(&big_g, big_size - REDUCTION_PRECISION)?;
        let num = &big_f_fft.hadamard_mul(&f_adj) + &big_g_fft.hadamard_mul(&g_adj);
        let k = num.hadamard_div(&den).ifft();
        let k = k.map(|c| BigInt::from(c.re.round() as i64));
        if k.coefficients.iter().all(Zero::is_zero) {
            break;
        }

        let shift = big_size - size;
        let fk = f.mul_negacyclic(&k);
        let gk = g.mul_negacyclic(&k);
        for (c, d) in big_f.coefficients.iter_mut().zip(fk.coefficients.iter()) {
            *c -= d << shift;
        }
        for (c, d) in big_g.coefficients.iter_mut().zip(gk.coefficients.iter()) {
            *c -= d << shift;
        }
    }

    Ok((big_f, big_g))
}
