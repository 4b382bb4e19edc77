use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num::{One, Zero};

use super::{Inverse, MODULUS};
use crate::utils::zeroize::Zeroize;

const Q: u32 = MODULUS as u32;

// FALCON FIELD ELEMENT
// ================================================================================================

/// An element of Z/qZ for the Falcon prime q = 12289, stored in canonical form `[0, q)`.
///
/// Elements carry no sign: short polynomials such as keys and signatures are lifted into the
/// field with [From<i16>] and brought back with [FalconFelt::balanced_value].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FalconFelt(u16);

impl FalconFelt {
    /// Creates a field element from an unsigned integer, reducing it modulo q.
    pub const fn new(value: u16) -> Self {
        Self((value as u32 % Q) as u16)
    }

    /// Returns the canonical representative in `[0, q)`.
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Returns the representative in `[-(q-1)/2, (q-1)/2]`.
    ///
    /// Lattice vectors are short only in this representation: -1 is small, 12288 is not.
    pub const fn balanced_value(&self) -> i16 {
        let value = self.0 as i16;
        if value > MODULUS / 2 { value - MODULUS } else { value }
    }

    /// Raises this element to the power `exp`.
    pub const fn pow(self, exp: u32) -> Self {
        Self(pow_mod(self.0 as u32, exp) as u16)
    }
}

/// Square-and-multiply exponentiation modulo q, usable in constant contexts.
pub(crate) const fn pow_mod(base: u32, mut exp: u32) -> u32 {
    let mut base = base % Q;
    let mut acc = 1;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc * base % Q;
        }
        base = base * base % Q;
        exp >>= 1;
    }
    acc
}

impl Add for FalconFelt {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let sum = self.0 as u32 + rhs.0 as u32;
        let reduced = if sum >= Q { sum - Q } else { sum };
        Self(reduced as u16)
    }
}

impl AddAssign for FalconFelt {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for FalconFelt {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl SubAssign for FalconFelt {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for FalconFelt {
    type Output = FalconFelt;

    fn neg(self) -> Self::Output {
        if self.0 == 0 { self } else { Self((Q - self.0 as u32) as u16) }
    }
}

impl Mul for FalconFelt {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self((self.0 as u32 * rhs.0 as u32 % Q) as u16)
    }
}

impl MulAssign for FalconFelt {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Div for FalconFelt {
    type Output = FalconFelt;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn div(self, rhs: Self) -> Self::Output {
        self * rhs.inverse_or_zero()
    }
}

impl DivAssign for FalconFelt {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs
    }
}

impl Zero for FalconFelt {
    fn zero() -> Self {
        Self(0)
    }

    fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl One for FalconFelt {
    fn one() -> Self {
        Self(1)
    }
}

impl Inverse for FalconFelt {
    fn inverse_or_zero(self) -> Self {
        // Fermat: x^(q-2) = 1/x for x != 0, and 0^(q-2) = 0
        self.pow(Q - 2)
    }
}

impl Zeroize for FalconFelt {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl From<i16> for FalconFelt {
    fn from(value: i16) -> Self {
        Self((value as i32).rem_euclid(Q as i32) as u16)
    }
}

impl From<i64> for FalconFelt {
    fn from(value: i64) -> Self {
        Self(value.rem_euclid(Q as i64) as u16)
    }
}
