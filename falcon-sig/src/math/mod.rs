//! Contains the ring arithmetic, trapdoor sampling and key generation behind Falcon.
//!
//! It uses and acknowledges the work in:
//!
//! 1. The [reference](https://falcon-sign.info/impl/README.txt.html) implementation by Thomas
//!    Pornin.
//! 2. The Rust fn-dsa implementation by Thomas Pornin: https://github.com/pornin/rust-fn-dsa
//! 3. The [Rust](https://github.com/aszepieniec/falcon-rust) implementation by Alan Szepieniec.
use alloc::vec::Vec;
use core::ops::MulAssign;

use num::{One, Zero};
use num_complex::Complex64;

use super::{FalconError, MODULUS};

mod fft;
pub use fft::FastFft;

mod field;
pub use field::FalconFelt;

mod ffsampling;
pub use ffsampling::LdlTree;
pub(crate) use ffsampling::{ffldl, ffsampling, gram, normalize_tree};

mod ntru;
pub(crate) use ntru::ntru_gen;

mod polynomial;
pub use polynomial::Polynomial;

mod samplerz;

pub trait Inverse: Copy + Zero + MulAssign + One {
    /// Gets the inverse of a, or zero if it is zero.
    fn inverse_or_zero(self) -> Self;

    /// Gets the inverses of a batch of elements, and skip over any that are zero.
    fn batch_inverse_or_zero(batch: &[Self]) -> Vec<Self> {
        let mut acc = Self::one();
        let mut rp: Vec<Self> = Vec::with_capacity(batch.len());
        for batch_item in batch {
            if !batch_item.is_zero() {
                rp.push(acc);
                acc = *batch_item * acc;
            } else {
                rp.push(Self::zero());
            }
        }
        let mut inv = Self::inverse_or_zero(acc);
        for i in (0..batch.len()).rev() {
            if !batch[i].is_zero() {
                rp[i] *= inv;
                inv *= batch[i];
            }
        }
        rp
    }
}

impl Inverse for Complex64 {
    fn inverse_or_zero(self) -> Self {
        let norm = self.norm_sqr();
        if norm == 0.0 {
            Complex64::zero()
        } else {
            self.conj() / norm
        }
    }

    // Products of many Gram-matrix entries overflow f64, so each element is inverted on its own.
    fn batch_inverse_or_zero(batch: &[Self]) -> Vec<Self> {
        batch.iter().map(|&c| c.inverse_or_zero()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_batch_inverse_skips_zero() {
        let batch = [Complex64::new(2.0, 0.0), Complex64::zero(), Complex64::new(0.0, 4.0)];
        let inverses = Complex64::batch_inverse_or_zero(&batch);
        assert_eq!(inverses[0], Complex64::new(0.5, 0.0));
        assert_eq!(inverses[1], Complex64::zero());
        assert_eq!(inverses[2], Complex64::new(0.0, -0.25));
    }

    #[test]
    fn field_batch_inverse_matches_single_inverses() {
        let batch: Vec<FalconFelt> =
            [3u16, 0, 12288, 77].iter().map(|&v| FalconFelt::new(v)).collect();
        let inverses = FalconFelt::batch_inverse_or_zero(&batch);
        for (x, inv) in batch.iter().zip(inverses.iter()) {
            assert_eq!(*inv, x.inverse_or_zero());
        }
    }
}
