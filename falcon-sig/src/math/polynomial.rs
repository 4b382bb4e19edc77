//! Generic polynomial type and operations used in Falcon.

use alloc::vec::Vec;
use core::ops::{Add, AddAssign, Mul, Neg, Sub};

use num::{One, Zero};

use super::{FalconError, FastFft, Inverse, field::FalconFelt};
use crate::utils::zeroize::Zeroize;

/// Represents a polynomial with coefficients of type F.
///
/// Depending on `F` the same container holds an element of Z\[x\]/(x^n + 1) (`i16`, `i64`,
/// `BigInt`), of Z_q\[x\]/(x^n + 1) in coefficient or NTT form (`FalconFelt`), or of
/// R\[x\]/(x^n + 1) in FFT form (`Complex64`).
#[derive(Debug, Clone, Default)]
pub struct Polynomial<F> {
    /// Coefficients of the polynomial, ordered from lowest to highest degree.
    pub coefficients: Vec<F>,
}

impl<F> Polynomial<F> {
    /// Creates a new polynomial from the provided coefficients.
    pub fn new(coefficients: Vec<F>) -> Self {
        Self { coefficients }
    }

    /// Applies a function to each coefficient and returns a new polynomial.
    pub fn map<G, C: FnMut(&F) -> G>(&self, closure: C) -> Polynomial<G> {
        Polynomial::new(self.coefficients.iter().map(closure).collect())
    }

    /// Folds the coefficients using the provided function and initial value.
    pub fn fold<G, C: FnMut(G, &F) -> G>(&self, initial_value: G, closure: C) -> G {
        self.coefficients.iter().fold(initial_value, closure)
    }
}

impl<F: Copy + Inverse> Polynomial<F> {
    /// Multiplies two polynomials coefficient-wise (Hadamard multiplication).
    pub fn hadamard_mul(&self, other: &Self) -> Self {
        Polynomial::new(
            self.coefficients
                .iter()
                .zip(other.coefficients.iter())
                .map(|(a, b)| *a * *b)
                .collect(),
        )
    }

    /// Divides two polynomials coefficient-wise (Hadamard division).
    ///
    /// Positions where `other` is zero are mapped to zero.
    pub fn hadamard_div(&self, other: &Self) -> Self {
        let other_coefficients_inverse = F::batch_inverse_or_zero(&other.coefficients);
        Polynomial::new(
            self.coefficients
                .iter()
                .zip(other_coefficients_inverse.iter())
                .map(|(a, b)| *a * *b)
                .collect(),
        )
    }

    /// Computes the coefficient-wise inverse (Hadamard inverse), mapping zero to zero.
    pub fn hadamard_inv(&self) -> Self {
        Polynomial::new(F::batch_inverse_or_zero(&self.coefficients))
    }
}

impl<F: Zero + PartialEq> PartialEq for Polynomial<F> {
    /// Polynomials are equal when they agree up to trailing zero coefficients.
    fn eq(&self, other: &Self) -> bool {
        let len = self.coefficients.len().max(other.coefficients.len());
        (0..len).all(|i| match (self.coefficients.get(i), other.coefficients.get(i)) {
            (Some(a), Some(b)) => a == b,
            (Some(c), None) | (None, Some(c)) => c.is_zero(),
            (None, None) => true,
        })
    }
}

impl<F: Zero + Eq> Eq for Polynomial<F> {}

// RING OPERATIONS
// ================================================================================================

impl<F> Add for &Polynomial<F>
where
    F: AddAssign + Clone,
{
    type Output = Polynomial<F>;

    fn add(self, rhs: Self) -> Self::Output {
        let (long, short) = if self.coefficients.len() >= rhs.coefficients.len() {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let mut coefficients = long.coefficients.clone();
        for (c, s) in coefficients.iter_mut().zip(short.coefficients.iter()) {
            *c += s.clone();
        }
        Polynomial { coefficients }
    }
}

impl<F> Add for Polynomial<F>
where
    F: AddAssign + Clone,
{
    type Output = Polynomial<F>;

    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl<F> Sub for &Polynomial<F>
where
    F: AddAssign + Neg<Output = F> + Clone,
{
    type Output = Polynomial<F>;

    fn sub(self, rhs: Self) -> Self::Output {
        self + &(-rhs)
    }
}

impl<F> Sub for Polynomial<F>
where
    F: AddAssign + Neg<Output = F> + Clone,
{
    type Output = Polynomial<F>;

    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl<F: Neg<Output = F> + Clone> Neg for &Polynomial<F> {
    type Output = Polynomial<F>;

    fn neg(self) -> Self::Output {
        self.map(|a| -a.clone())
    }
}

impl<F: Neg<Output = F> + Clone> Neg for Polynomial<F> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(self.coefficients.into_iter().map(|a| -a).collect())
    }
}

impl<F: Mul<Output = F> + Clone> Mul<F> for &Polynomial<F> {
    type Output = Polynomial<F>;

    fn mul(self, scalar: F) -> Self::Output {
        self.map(|a| a.clone() * scalar.clone())
    }
}

impl<F: Mul<Output = F> + Clone> Mul<F> for Polynomial<F> {
    type Output = Polynomial<F>;

    fn mul(self, scalar: F) -> Self::Output {
        &self * scalar
    }
}

// EXACT INTEGER ARITHMETIC
// ================================================================================================

impl<F> Polynomial<F>
where
    F: Zero + Clone + Add<Output = F> + Sub<Output = F> + Mul<Output = F> + Neg<Output = F>,
{
    /// Multiplies two polynomials of equal power-of-two length modulo `x^n + 1`.
    pub fn mul_negacyclic(&self, other: &Self) -> Self {
        let n = self.coefficients.len();
        debug_assert_eq!(n, other.coefficients.len());
        let product = karatsuba(&self.coefficients, &other.coefficients);
        Self::new((0..n).map(|i| product[i].clone() - product[i + n].clone()).collect())
    }

    /// Computes the field norm N(f) = f0^2 - x * f1^2 mod `x^(n/2) + 1`, where
    /// f(x) = f0(x^2) + x * f1(x^2).
    pub fn field_norm(&self) -> Self {
        let n2 = self.coefficients.len() / 2;
        let even = Polynomial::new(self.coefficients.iter().step_by(2).cloned().collect());
        let odd = Polynomial::new(self.coefficients.iter().skip(1).step_by(2).cloned().collect());
        let even_squared = even.mul_negacyclic(&even);
        let odd_squared = odd.mul_negacyclic(&odd);

        let mut coefficients = even_squared.coefficients;
        for i in 0..n2 - 1 {
            coefficients[i + 1] = coefficients[i + 1].clone() - odd_squared.coefficients[i].clone();
        }
        coefficients[0] = coefficients[0].clone() + odd_squared.coefficients[n2 - 1].clone();
        Self::new(coefficients)
    }

    /// Maps p(x) to p(x^2), doubling the length.
    pub fn lift(&self) -> Self {
        let mut coefficients = vec![F::zero(); 2 * self.coefficients.len()];
        for (i, c) in self.coefficients.iter().enumerate() {
            coefficients[2 * i] = c.clone();
        }
        Self::new(coefficients)
    }

    /// Maps f(x) to f(-x).
    pub fn galois_conjugate(&self) -> Self {
        Self::new(
            self.coefficients
                .iter()
                .enumerate()
                .map(|(i, c)| if i % 2 == 0 { c.clone() } else { -c.clone() })
                .collect(),
        )
    }
}

/// Karatsuba product of two equal-length power-of-two coefficient slices. The result has twice
/// the input length (the top coefficient is always zero).
fn karatsuba<F>(a: &[F], b: &[F]) -> Vec<F>
where
    F: Zero + Clone + Add<Output = F> + Sub<Output = F> + Mul<Output = F>,
{
    let n = a.len();
    if n == 1 {
        return vec![a[0].clone() * b[0].clone(), F::zero()];
    }

    let n2 = n / 2;
    let (a0, a1) = a.split_at(n2);
    let (b0, b1) = b.split_at(n2);
    let ax: Vec<F> = a0.iter().zip(a1).map(|(x, y)| x.clone() + y.clone()).collect();
    let bx: Vec<F> = b0.iter().zip(b1).map(|(x, y)| x.clone() + y.clone()).collect();

    let a0b0 = karatsuba(a0, b0);
    let a1b1 = karatsuba(a1, b1);
    let mut axbx = karatsuba(&ax, &bx);
    for i in 0..n {
        axbx[i] = axbx[i].clone() - (a0b0[i].clone() + a1b1[i].clone());
    }

    let mut ab = vec![F::zero(); 2 * n];
    for i in 0..n {
        ab[i] = ab[i].clone() + a0b0[i].clone();
        ab[i + n] = ab[i + n].clone() + a1b1[i].clone();
        ab[i + n2] = ab[i + n2].clone() + axbx[i].clone();
    }
    ab
}

// ARITHMETIC MODULO q
// ================================================================================================

impl Polynomial<FalconFelt> {
    /// Multiplies two polynomials in Z_q\[x\]/(x^n + 1) through the NTT.
    pub fn mul_zq(&self, other: &Self) -> Self {
        self.fft().hadamard_mul(&other.fft()).ifft()
    }

    /// Divides two polynomials in Z_q\[x\]/(x^n + 1) through the NTT.
    ///
    /// # Errors
    /// Returns [FalconError::NonInvertible] if `other` has no inverse modulo q, i.e. one of its
    /// NTT coefficients is zero.
    pub fn div_zq(&self, other: &Self) -> Result<Self, FalconError> {
        let other_ntt = other.fft();
        if other_ntt.coefficients.iter().any(|c| c.is_zero()) {
            return Err(FalconError::NonInvertible);
        }
        Ok(self.fft().hadamard_div(&other_ntt).ifft())
    }

    /// Returns true if `self * self^-1 = 1` in Z_q\[x\]/(x^n + 1), where the candidate inverse
    /// maps every zero NTT coefficient to zero.
    pub fn is_invertible(&self) -> bool {
        let n = self.coefficients.len();
        let inverse = self.fft().hadamard_inv().ifft();
        let mut identity = vec![FalconFelt::zero(); n];
        identity[0] = FalconFelt::one();
        self.mul_zq(&inverse) == Polynomial::new(identity)
    }

    /// Returns the coefficients in balanced representation `[-(q-1)/2, (q-1)/2]`.
    pub fn to_balanced(&self) -> Polynomial<i16> {
        self.map(|c| c.balanced_value())
    }
}

impl From<&Polynomial<i16>> for Polynomial<FalconFelt> {
    fn from(item: &Polynomial<i16>) -> Self {
        item.map(|&c| FalconFelt::from(c))
    }
}

impl From<Polynomial<i16>> for Polynomial<FalconFelt> {
    fn from(item: Polynomial<i16>) -> Self {
        (&item).into()
    }
}

impl From<Vec<i16>> for Polynomial<FalconFelt> {
    fn from(item: Vec<i16>) -> Self {
        Polynomial::new(item.into_iter().map(FalconFelt::from).collect())
    }
}

impl Polynomial<i16> {
    /// Squared Euclidean norm of the coefficient vector.
    pub fn sq_norm(&self) -> u64 {
        self.fold(0u64, |acc, &c| acc + (c as i64 * c as i64) as u64)
    }
}

// ZEROIZE IMPLEMENTATIONS
// ================================================================================================

impl<F: Zeroize> Zeroize for Polynomial<F> {
    fn zeroize(&mut self) {
        self.coefficients.zeroize();
    }
}
