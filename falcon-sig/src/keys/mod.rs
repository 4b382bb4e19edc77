use rand::{CryptoRng, RngCore};

use super::{
    ByteReader, ByteWriter, Deserializable, DeserializationError, FalconError, Serializable,
    ShortLatticeBasis,
};

mod public_key;
pub use public_key::PublicKey;

mod secret_key;
pub use secret_key::SecretKey;

// KEY GENERATION
// ================================================================================================

/// Generates a key pair of degree `n` from OS-provided randomness.
///
/// When `basis` is provided it is used instead of sampling a new one, after validation.
///
/// # Errors
/// Returns [FalconError::InvalidParameter] if `n` is not a supported ring degree or the provided
/// basis is not a valid NTRU trapdoor of degree `n`.
#[cfg(feature = "std")]
pub fn generate_keypair(
    n: usize,
    basis: Option<ShortLatticeBasis>,
) -> Result<(PublicKey, SecretKey), FalconError> {
    let mut rng = rand::rng();
    generate_keypair_with_rng(n, basis, &mut rng)
}

/// Generates a key pair of degree `n` using the provided random number generator.
///
/// When `basis` is provided no randomness is consumed: the basis is validated and used as is.
///
/// # Errors
/// Returns [FalconError::InvalidParameter] if `n` is not a supported ring degree or the provided
/// basis is not a valid NTRU trapdoor of degree `n`.
pub fn generate_keypair_with_rng<R: RngCore + CryptoRng>(
    n: usize,
    basis: Option<ShortLatticeBasis>,
    rng: &mut R,
) -> Result<(PublicKey, SecretKey), FalconError> {
    let sk = match basis {
        Some(basis) => SecretKey::from_short_lattice_basis(n, basis)?,
        None => SecretKey::with_rng(n, rng)?,
    };
    Ok((sk.public_key(), sk))
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use assert_matches::assert_matches;
    use rand_chacha::{ChaCha20Rng, rand_core::SeedableRng};

    use super::*;
    use crate::Polynomial;

    #[test]
    fn test_falcon_verification() {
        let seed = [0_u8; 32];
        let mut rng = ChaCha20Rng::from_seed(seed);

        // generate random keys
        let (pk, sk) = generate_keypair_with_rng(512, None, &mut rng).unwrap();

        // test secret key serialization/deserialization
        let mut buffer = vec![];
        sk.write_into(&mut buffer);
        let sk_deserialized = SecretKey::read_from_bytes(&buffer).unwrap();
        assert_eq!(sk.short_lattice_basis(), sk_deserialized.short_lattice_basis());

        // sign a random message
        let message = b"a message to sign";
        let signature = sk.sign_with_rng(message, &mut rng);

        // make sure the signature verifies correctly
        assert!(pk.verify(message, &signature));

        // a signature should not verify against a wrong message
        assert!(!pk.verify(b"another message", &signature));

        // a signature should not verify against a wrong public key
        let sk2 = SecretKey::with_rng(512, &mut rng).unwrap();
        assert!(!sk2.public_key().verify(message, &signature))
    }

    #[test]
    fn supplied_basis_consumes_no_randomness() {
        let mut rng = ChaCha20Rng::from_seed([3_u8; 32]);
        let (pk, sk) = generate_keypair_with_rng(32, None, &mut rng).unwrap();

        let mut untouched = ChaCha20Rng::from_seed([9_u8; 32]);
        let (pk2, sk2) =
            generate_keypair_with_rng(32, Some(sk.short_lattice_basis().clone()), &mut untouched)
                .unwrap();
        assert_eq!(pk, pk2);
        assert_eq!(sk, sk2);
        assert_eq!(untouched, ChaCha20Rng::from_seed([9_u8; 32]));
    }

    #[test]
    fn invalid_requests_are_rejected() {
        let mut rng = ChaCha20Rng::from_seed([4_u8; 32]);
        assert_matches!(
            generate_keypair_with_rng(48, None, &mut rng),
            Err(FalconError::InvalidParameter(_))
        );

        let zero = || Polynomial::new(Vec::from([0i16; 8]));
        let basis = [zero(), zero(), zero(), zero()];
        assert_matches!(
            generate_keypair_with_rng(8, Some(basis), &mut rng),
            Err(FalconError::InvalidParameter(_))
        );
    }
}
