//! Fast Fourier transforms over the cyclotomic ring `x^n + 1`.
//!
//! The same radix-2 code runs over two fields: `Complex64`, giving the floating-point FFT used
//! by the trapdoor sampler, and [FalconFelt], giving the exact NTT used for arithmetic modulo q.
//!
//! A transformed polynomial of length `n` stores at index `i` the evaluation at
//! `psi^(2 * bitrev(i) + 1)`, where `psi` is a primitive `2n`-th root of unity. In this order
//! the evaluation points at `2i` and `2i + 1` are opposite, and their common square is the
//! evaluation point at `i` for length `n / 2`. This is what lets [FastFft::split_fft] and
//! [FastFft::merge_fft] move between sizes without leaving the transform domain.

use alloc::vec::Vec;
use core::{
    f64::consts::PI,
    ops::{Add, Mul, Neg, Sub},
};

use num_complex::Complex64;

use super::{
    Inverse, MODULUS, Polynomial,
    field::{FalconFelt, pow_mod},
};

/// Largest supported transform size.
const MAX_N: usize = 1024;
const LOG_MAX_N: u32 = 10;

// CYCLOTOMIC FOURIER
// ================================================================================================

/// A field containing a primitive `2 * MAX_N`-th root of unity `psi`.
pub trait CyclotomicFourier:
    Copy
    + Inverse
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    /// Returns `psi^bitrev(k)`, bit-reversal taken over `log2(MAX_N)` bits.
    ///
    /// For a transform of size `n <= MAX_N` the first `n` entries of this table are exactly the
    /// bit-reversed powers of the size-`n` root `psi^(MAX_N / n)`.
    fn bitreversed_root(k: usize) -> Self;

    /// Returns the inverse of [CyclotomicFourier::bitreversed_root].
    fn bitreversed_root_inverse(k: usize) -> Self {
        Self::bitreversed_root(k).inverse_or_zero()
    }

    /// Embeds a small integer into the field.
    fn from_usize(value: usize) -> Self;

    /// Forward transform, in place (Cooley-Tukey, natural order in, bit-reversed order out).
    fn fft(a: &mut [Self]) {
        let n = a.len();
        debug_assert!(n.is_power_of_two() && n <= MAX_N);
        let mut t = n;
        let mut m = 1;
        while m < n {
            t >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let s = Self::bitreversed_root(m + i);
                for j in j1..j1 + t {
                    let u = a[j];
                    let v = a[j + t] * s;
                    a[j] = u + v;
                    a[j + t] = u - v;
                }
            }
            m <<= 1;
        }
    }

    /// Inverse transform, in place (Gentleman-Sande), including the `1/n` scaling.
    fn ifft(a: &mut [Self]) {
        let n = a.len();
        debug_assert!(n.is_power_of_two() && n <= MAX_N);
        let mut t = 1;
        let mut m = n;
        while m > 1 {
            let h = m >> 1;
            let mut j1 = 0;
            for i in 0..h {
                let s = Self::bitreversed_root_inverse(h + i);
                for j in j1..j1 + t {
                    let u = a[j];
                    let v = a[j + t];
                    a[j] = u + v;
                    a[j + t] = (u - v) * s;
                }
                j1 += 2 * t;
            }
            t <<= 1;
            m = h;
        }

        let ninv = Self::from_usize(n).inverse_or_zero();
        for x in a.iter_mut() {
            *x = *x * ninv;
        }
    }
}

const fn bitreverse(k: usize, bits: u32) -> usize {
    k.reverse_bits() >> (usize::BITS - bits)
}

impl CyclotomicFourier for Complex64 {
    fn bitreversed_root(k: usize) -> Self {
        Complex64::from_polar(1.0, PI * bitreverse(k, LOG_MAX_N) as f64 / MAX_N as f64)
    }

    fn bitreversed_root_inverse(k: usize) -> Self {
        Self::bitreversed_root(k).conj()
    }

    fn from_usize(value: usize) -> Self {
        Complex64::new(value as f64, 0.0)
    }
}

/// Searches for a primitive 2048-th root of unity modulo q: `g^((q-1)/2048)` for the smallest
/// `g` whose 1024-th power of that value is `-1`.
const fn primitive_root_2048() -> u32 {
    let q = MODULUS as u32;
    let mut g = 2;
    loop {
        let psi = pow_mod(g, (q - 1) / (2 * MAX_N as u32));
        if pow_mod(psi, MAX_N as u32) == q - 1 {
            return psi;
        }
        g += 1;
    }
}

const fn ntt_bitreversed_powers() -> [u16; MAX_N] {
    let psi = primitive_root_2048();
    let mut table = [0u16; MAX_N];
    let mut k = 0;
    while k < MAX_N {
        table[k] = pow_mod(psi, bitreverse(k, LOG_MAX_N) as u32) as u16;
        k += 1;
    }
    table
}

const NTT_ROOTS: [u16; MAX_N] = ntt_bitreversed_powers();

impl CyclotomicFourier for FalconFelt {
    fn bitreversed_root(k: usize) -> Self {
        FalconFelt::new(NTT_ROOTS[k])
    }

    fn from_usize(value: usize) -> Self {
        FalconFelt::new((value % MODULUS as usize) as u16)
    }
}

// FAST FFT
// ================================================================================================

/// Transforms between coefficient and evaluation representations of ring elements.
pub trait FastFft: Sized + Clone {
    /// Replaces the coefficients by their transform.
    fn fft_inplace(&mut self);

    /// Returns the transform of this polynomial.
    fn fft(&self) -> Self {
        let mut a = self.clone();
        a.fft_inplace();
        a
    }

    /// Replaces the transform by the coefficients it was computed from.
    fn ifft_inplace(&mut self);

    /// Returns the inverse transform of this polynomial.
    fn ifft(&self) -> Self {
        let mut a = self.clone();
        a.ifft_inplace();
        a
    }

    /// Given the transform of f(x) = f0(x^2) + x * f1(x^2), returns the transforms of f0 and f1.
    fn split_fft(&self) -> (Self, Self);

    /// Inverse of [FastFft::split_fft].
    fn merge_fft(a: &Self, b: &Self) -> Self;
}

impl<F: CyclotomicFourier> FastFft for Polynomial<F> {
    fn fft_inplace(&mut self) {
        F::fft(&mut self.coefficients);
    }

    fn ifft_inplace(&mut self) {
        F::ifft(&mut self.coefficients);
    }

    fn split_fft(&self) -> (Self, Self) {
        let n = self.coefficients.len();
        let half = F::from_usize(2).inverse_or_zero();
        let mut f0 = Vec::with_capacity(n / 2);
        let mut f1 = Vec::with_capacity(n / 2);
        for (i, pair) in self.coefficients.chunks_exact(2).enumerate() {
            let (even, odd) = (pair[0], pair[1]);
            f0.push((even + odd) * half);
            f1.push((even - odd) * half * F::bitreversed_root_inverse(n / 2 + i));
        }
        (Polynomial::new(f0), Polynomial::new(f1))
    }

    fn merge_fft(a: &Self, b: &Self) -> Self {
        let n = 2 * a.coefficients.len();
        let mut coefficients = Vec::with_capacity(n);
        for (i, (&f0, &f1)) in a.coefficients.iter().zip(b.coefficients.iter()).enumerate() {
            let t = f1 * F::bitreversed_root(n / 2 + i);
            coefficients.push(f0 + t);
            coefficients.push(f0 - t);
        }
        Polynomial::new(coefficients)
    }
}
