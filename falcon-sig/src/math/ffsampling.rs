use alloc::boxed::Box;

#[cfg(not(feature = "std"))]
use num::Float;
use num_complex::Complex64;
use rand::RngCore;

use super::{fft::FastFft, polynomial::Polynomial, samplerz::sampler_z};
use crate::utils::zeroize::{Zeroize, ZeroizeOnDrop};

/// Computes the Gram matrix. The argument must be a 2x2 matrix
/// whose elements are equal-length vectors of complex numbers,
/// representing polynomials in FFT domain.
pub fn gram(b: &[Polynomial<Complex64>; 4]) -> [Polynomial<Complex64>; 4] {
    const N: usize = 2;
    let n = b[0].coefficients.len();
    let zero = || Polynomial::new(vec![Complex64::new(0.0, 0.0); n]);
    let mut g: [Polynomial<Complex64>; 4] = [zero(), zero(), zero(), zero()];
    for i in 0..N {
        for j in 0..N {
            for k in 0..N {
                g[N * i + j] = &g[N * i + j]
                    + &b[N * i + k].hadamard_mul(&b[N * j + k].map(|c| c.conj()));
            }
        }
    }
    g
}

/// Computes the LDL decomposition of a 2x2 matrix G such that
///     L D L* = G
/// where D is diagonal, and L is lower-triangular. The elements of the matrices are in FFT domain.
///
/// Returns only the non-trivial elements: (l10, d00, d11) where:
/// - l10: the lower-left element of L (L[1,0])
/// - d00: the top-left diagonal element of D (D[0,0])
/// - d11: the bottom-right diagonal element of D (D[1,1])
pub fn ldl(
    g: [Polynomial<Complex64>; 4],
) -> (Polynomial<Complex64>, Polynomial<Complex64>, Polynomial<Complex64>) {
    let [g00, _, g10, g11] = g;
    let l10 = g10.hadamard_div(&g00);
    let bc = l10.map(|c| c * c.conj());
    let abc = g00.hadamard_mul(&bc);
    let d11 = g11 - abc;

    (l10, g00, d11)
}

/// The Falcon tree: a binary tree whose inner nodes hold the `l10` factor of an LDL
/// decomposition in FFT form, and whose leaves hold a real number.
///
/// Right after [ffldl] the leaves are diagonal entries of D; once [normalize_tree] has run they
/// are the per-coordinate standard deviations used by [ffsampling].
#[derive(Debug, Clone)]
pub enum LdlTree {
    Branch(Polynomial<Complex64>, Box<LdlTree>, Box<LdlTree>),
    Leaf(f64),
}

impl LdlTree {
    /// Number of edges on a path from the root to a leaf.
    pub fn depth(&self) -> usize {
        match self {
            LdlTree::Branch(_, left, _) => 1 + left.depth(),
            LdlTree::Leaf(_) => 0,
        }
    }

    /// Calls `f` on every leaf value, left to right.
    pub fn for_each_leaf<F: FnMut(f64)>(&self, f: &mut F) {
        match self {
            LdlTree::Branch(_, left, right) => {
                left.for_each_leaf(f);
                right.for_each_leaf(f);
            },
            LdlTree::Leaf(value) => f(*value),
        }
    }
}

impl Zeroize for LdlTree {
    fn zeroize(&mut self) {
        match self {
            LdlTree::Branch(poly, left, right) => {
                // write_volatile keeps the stores from being elided as dead
                for coeff in poly.coefficients.iter_mut() {
                    unsafe {
                        core::ptr::write_volatile(coeff, Complex64::new(0.0, 0.0));
                    }
                }

                left.zeroize();
                right.zeroize();

                // all writes, including those of the recursive calls, complete before any
                // subsequent code can observe them
                core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
            },
            LdlTree::Leaf(value) => {
                unsafe {
                    core::ptr::write_volatile(value, 0.0);
                }
                core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
            },
        }
    }
}

// Complex64 doesn't implement Zeroize, so the tree cannot derive ZeroizeOnDrop.
impl Drop for LdlTree {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for LdlTree {}

/// Computes the LDL Tree of G. Corresponds to Algorithm 9 of the Falcon paper [1, p.37].
/// The argument is a 2x2 matrix of polynomials, given in FFT form.
/// [1]: https://falcon-sign.info/falcon.pdf
pub fn ffldl(gram_matrix: [Polynomial<Complex64>; 4]) -> LdlTree {
    let n = gram_matrix[0].coefficients.len();
    let (l10, d00, d11) = ldl(gram_matrix);

    if n > 2 {
        let (d00_left, d00_right) = d00.split_fft();
        let (d11_left, d11_right) = d11.split_fft();
        let g0 = [d00_left.clone(), d00_right.clone(), d00_right.map(|c| c.conj()), d00_left];
        let g1 = [d11_left.clone(), d11_right.clone(), d11_right.map(|c| c.conj()), d11_left];
        LdlTree::Branch(l10, Box::new(ffldl(g0)), Box::new(ffldl(g1)))
    } else {
        // at n = 2 the two FFT slots are conjugate, so either one carries the real diagonal entry
        LdlTree::Branch(
            l10,
            Box::new(LdlTree::Leaf(d00.coefficients[0].re)),
            Box::new(LdlTree::Leaf(d11.coefficients[0].re)),
        )
    }
}

/// Normalizes the leaves of an LDL tree using a given normalization value `sigma`.
pub fn normalize_tree(tree: &mut LdlTree, sigma: f64) {
    match tree {
        LdlTree::Branch(_ell, left, right) => {
            normalize_tree(left, sigma);
            normalize_tree(right, sigma);
        },
        LdlTree::Leaf(value) => {
            *value = sigma / value.sqrt();
        },
    }
}

/// Samples short polynomials using a Falcon tree. Algorithm 11 of the Falcon paper [1, p.40].
///
/// Leaf standard deviations below `sigmin` are raised to it, which only happens for degenerate
/// bases.
///
/// [1]: https://falcon-sign.info/falcon.pdf
pub fn ffsampling<R: RngCore + ?Sized>(
    t: &(Polynomial<Complex64>, Polynomial<Complex64>),
    tree: &LdlTree,
    sigmin: f64,
    rng: &mut R,
) -> (Polynomial<Complex64>, Polynomial<Complex64>) {
    match tree {
        LdlTree::Branch(ell, left, right) => {
            let bold_t1 = t.1.split_fft();
            let bold_z1 = ffsampling(&bold_t1, right, sigmin, rng);
            let z1 = Polynomial::<Complex64>::merge_fft(&bold_z1.0, &bold_z1.1);

            // t0' = t0  + (t1 - z1) * l
            let t0_prime = &t.0 + &(&t.1 - &z1).hadamard_mul(ell);

            let bold_t0 = t0_prime.split_fft();
            let bold_z0 = ffsampling(&bold_t0, left, sigmin, rng);
            let z0 = Polynomial::<Complex64>::merge_fft(&bold_z0.0, &bold_z0.1);

            (z0, z1)
        },
        LdlTree::Leaf(value) => {
            let sigma = value.max(sigmin);
            let z0 = sampler_z(t.0.coefficients[0].re, sigma, sigmin, rng);
            let z1 = sampler_z(t.1.coefficients[0].re, sigma, sigmin, rng);
            (
                Polynomial::new(vec![Complex64::new(z0 as f64, 0.0)]),
                Polynomial::new(vec![Complex64::new(z1 as f64, 0.0)]),
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::{ChaCha20Rng, rand_core::SeedableRng};

    use super::*;

    fn to_fft(coefficients: &[i16]) -> Polynomial<Complex64> {
        Polynomial::new(coefficients.iter().map(|&c| Complex64::new(c as f64, 0.0)).collect())
            .fft()
    }

    fn sample_basis(n: usize) -> [Polynomial<Complex64>; 4] {
        let f: alloc::vec::Vec<i16> = (0..n).map(|i| ((i * 5 + 1) % 7) as i16 - 3).collect();
        let g: alloc::vec::Vec<i16> = (0..n).map(|i| ((i * 3 + 2) % 5) as i16 - 2).collect();
        let big_f: alloc::vec::Vec<i16> = (0..n).map(|i| ((i * 11 + 4) % 13) as i16 - 6).collect();
        let big_g: alloc::vec::Vec<i16> = (0..n).map(|i| ((i * 7 + 3) % 9) as i16 - 4).collect();
        [to_fft(&g), -to_fft(&f), to_fft(&big_g), -to_fft(&big_f)]
    }

    #[test]
    fn ldl_reconstructs_gram_matrix() {
        let g = gram(&sample_basis(8));
        let (l10, d00, d11) = ldl(g.clone());
        // G10 = l10 * d00 and G11 = l10 * d00 * conj(l10) + d11
        let g10 = l10.hadamard_mul(&d00);
        let g11 = &l10.hadamard_mul(&d00).hadamard_mul(&l10.map(|c| c.conj())) + &d11;
        for (a, b) in g10.coefficients.iter().zip(g[2].coefficients.iter()) {
            assert!((a - b).norm() < 1e-6);
        }
        for (a, b) in g11.coefficients.iter().zip(g[3].coefficients.iter()) {
            assert!((a - b).norm() < 1e-6);
        }
    }

    #[test]
    fn tree_shape_matches_degree() {
        for log_n in 1..=6 {
            let n = 1 << log_n;
            let tree = ffldl(gram(&sample_basis(n)));
            assert_eq!(tree.depth(), log_n);
            let mut leaves = 0;
            tree.for_each_leaf(&mut |_| leaves += 1);
            assert_eq!(leaves, n);
        }
    }

    #[test]
    fn normalized_leaves_are_positive() {
        let mut tree = ffldl(gram(&sample_basis(16)));
        normalize_tree(&mut tree, 150.0);
        tree.for_each_leaf(&mut |leaf| assert!(leaf.is_finite() && leaf > 0.0));
    }

    #[test]
    fn samples_are_integers() {
        let mut tree = ffldl(gram(&sample_basis(16)));
        normalize_tree(&mut tree, 150.0);
        let t = (to_fft(&[3; 16]), to_fft(&[-2; 16]));
        let mut rng = ChaCha20Rng::from_seed([9u8; 32]);
        let (z0, z1) = ffsampling(&t, &tree, 1.17, &mut rng);
        for z in z0.ifft().coefficients.iter().chain(z1.ifft().coefficients.iter()) {
            assert!((z.re - z.re.round()).abs() < 1e-6);
            assert!(z.im.abs() < 1e-6);
        }
    }

    #[test]
    fn zeroize_clears_tree() {
        let mut tree = ffldl(gram(&sample_basis(4)));
        tree.zeroize();
        tree.for_each_leaf(&mut |leaf| assert_eq!(leaf, 0.0));
        if let LdlTree::Branch(l10, ..) = &tree {
            assert!(l10.coefficients.iter().all(|c| *c == Complex64::new(0.0, 0.0)));
        }
    }
}
