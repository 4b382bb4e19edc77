use alloc::string::ToString;

use super::{FalconError, HEAD_LEN, SALT_LEN};

// PARAMETER SETS
// ================================================================================================

/// Parameters of one Falcon instance, identified by the ring degree `n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FalconParams {
    /// Degree of the cyclotomic polynomial `x^n + 1`.
    pub n: usize,
    /// `log2(n)`, stored in the low nibble of every header byte.
    pub log_n: u8,
    /// Standard deviation of signatures (Gaussian over the lattice).
    pub sigma: f64,
    /// Lower bound on the standard deviation of each Gaussian over the integers.
    pub sigmin: f64,
    /// Upper bound on `||s0||^2 + ||s1||^2`.
    pub sig_bound: u64,
    /// Byte length of a canonical signature.
    pub sig_bytelen: usize,
}

const PARAMS: [FalconParams; 10] = [
    FalconParams {
        n: 2,
        log_n: 1,
        sigma: 144.81253976308423,
        sigmin: 1.1165085072329104,
        sig_bound: 101498,
        sig_bytelen: 44,
    },
    FalconParams {
        n: 4,
        log_n: 2,
        sigma: 146.83798833523608,
        sigmin: 1.1321247692325274,
        sig_bound: 208714,
        sig_bytelen: 47,
    },
    FalconParams {
        n: 8,
        log_n: 3,
        sigma: 148.83587593064718,
        sigmin: 1.147528535373367,
        sig_bound: 428865,
        sig_bytelen: 52,
    },
    FalconParams {
        n: 16,
        log_n: 4,
        sigma: 151.78340713845503,
        sigmin: 1.170254078853483,
        sig_bound: 892039,
        sig_bytelen: 63,
    },
    FalconParams {
        n: 32,
        log_n: 5,
        sigma: 154.6747794602761,
        sigmin: 1.1925466358390344,
        sig_bound: 1852696,
        sig_bytelen: 82,
    },
    FalconParams {
        n: 64,
        log_n: 6,
        sigma: 157.51308555044122,
        sigmin: 1.2144300507766141,
        sig_bound: 3842630,
        sig_bytelen: 122,
    },
    FalconParams {
        n: 128,
        log_n: 7,
        sigma: 160.30114421975344,
        sigmin: 1.235926056771981,
        sig_bound: 7959734,
        sig_bytelen: 200,
    },
    FalconParams {
        n: 256,
        log_n: 8,
        sigma: 163.04153322607107,
        sigmin: 1.2570545284063217,
        sig_bound: 16468416,
        sig_bytelen: 356,
    },
    FalconParams {
        n: 512,
        log_n: 9,
        sigma: 165.7366171829776,
        sigmin: 1.2778336969128337,
        sig_bound: 34034726,
        sig_bytelen: 666,
    },
    FalconParams {
        n: 1024,
        log_n: 10,
        sigma: 168.38857144654395,
        sigmin: 1.298280334344292,
        sig_bound: 70265242,
        sig_bytelen: 1280,
    },
];

impl FalconParams {
    /// Returns the parameter set for ring degree `n`.
    ///
    /// # Errors
    /// Returns [FalconError::InvalidParameter] unless `n` is a power of two in `[2, 1024]`.
    pub fn for_degree(n: usize) -> Result<&'static Self, FalconError> {
        PARAMS.iter().find(|params| params.n == n).ok_or_else(|| {
            FalconError::InvalidParameter(format!(
                "unsupported ring degree {n}, expected a power of two between 2 and 1024"
            ))
        })
    }

    /// Returns the parameter set whose `log2(n)` equals `log_n`.
    pub fn for_log_degree(log_n: u8) -> Result<&'static Self, FalconError> {
        PARAMS.iter().find(|params| params.log_n == log_n).ok_or_else(|| {
            FalconError::InvalidParameter("unsupported log2 of ring degree".to_string())
        })
    }

    /// Header byte of a compressed signature: `0b0011_nnnn` with `nnnn = log2(n)`.
    pub const fn signature_header(&self) -> u8 {
        0x30 + self.log_n
    }

    /// Byte length of one compressed polynomial inside a signature.
    pub const fn body_len(&self) -> usize {
        self.sig_bytelen - HEAD_LEN - SALT_LEN
    }

    /// Byte length of a public-key-recovery signature, which carries two compressed
    /// polynomials.
    pub const fn recoverable_bytelen(&self) -> usize {
        HEAD_LEN + SALT_LEN + 2 * self.body_len()
    }
}
