use alloc::vec::Vec;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rstest::rstest;

use crate::{
    Deserializable, FalconFelt, HEAD_LEN, Polynomial, PublicKey, RecoverableSignature, SALT_LEN,
    Salt, SecretKey, Serializable, Signature, SignaturePoly, generate_keypair_with_rng,
    hash_to_point_shake256,
};

fn keypair(n: usize, seed: u8) -> (PublicKey, SecretKey) {
    let mut rng = ChaCha20Rng::from_seed([seed; 32]);
    generate_keypair_with_rng(n, None, &mut rng).unwrap()
}

/// Distinct messages of varying length, including the empty one.
fn messages(count: usize) -> impl Iterator<Item = Vec<u8>> {
    (0..count).map(|i| (0..i % 257).map(|j| (i * 31 + j) as u8).collect())
}

// SIGN / VERIFY
// ================================================================================================

#[rstest]
#[case(2, 200)]
#[case(4, 200)]
#[case(8, 200)]
#[case(16, 200)]
#[case(32, 100)]
#[case(64, 100)]
#[case(128, 50)]
#[case(256, 50)]
#[case(512, 20)]
#[case(1024, 10)]
fn test_sign_verify_round_trip(#[case] n: usize, #[case] count: usize) {
    let (pk, sk) = keypair(n, n as u8);
    let mut rng = ChaCha20Rng::from_seed([1_u8; 32]);

    for message in messages(count) {
        let signature = sk.sign_with_rng(&message, &mut rng);
        assert!(pk.verify(&message, &signature));
        assert!(signature.sig_poly().sq_norm() <= sk.params().sig_bound);

        let bytes = signature.to_bytes();
        assert_eq!(bytes.len(), sk.params().sig_bytelen);
        assert_eq!(bytes[0], 0x30 + sk.params().log_n);
        assert!(pk.verify_bytes(&message, &bytes));
        assert!(!pk.verify_bytes(b"another message", &bytes));
    }
}

#[rstest]
#[case(16)]
#[case(64)]
fn test_every_body_bit_flip_is_rejected(#[case] n: usize) {
    let (pk, sk) = keypair(n, 2);
    let bytes = sk.sign_with_seed(b"message", &[2_u8; 32]).to_bytes();
    assert!(pk.verify_bytes(b"message", &bytes));

    let body_start = HEAD_LEN + SALT_LEN;
    for position in body_start * 8..bytes.len() * 8 {
        let mut tampered = bytes.clone();
        tampered[position / 8] ^= 1 << (position % 8);
        assert!(!pk.verify_bytes(b"message", &tampered), "bit {position} flip was accepted");
    }
}

#[test]
fn test_tampered_signatures_are_rejected() {
    let (pk, sk) = keypair(64, 2);
    let bytes = sk.sign_with_seed(b"message", &[2_u8; 32]).to_bytes();

    // every bit of the salt
    for position in HEAD_LEN * 8..(HEAD_LEN + SALT_LEN) * 8 {
        let mut tampered = bytes.clone();
        tampered[position / 8] ^= 1 << (position % 8);
        assert!(!pk.verify_bytes(b"message", &tampered));
    }

    // wrong header, truncation and trailing bytes
    let mut tampered = bytes.clone();
    tampered[0] = 0x37;
    assert!(!pk.verify_bytes(b"message", &tampered));
    assert!(!pk.verify_bytes(b"message", &bytes[..bytes.len() - 1]));
    let mut extended = bytes.clone();
    extended.push(0);
    assert!(!pk.verify_bytes(b"message", &extended));
}

#[test]
fn test_signatures_beyond_the_norm_bound_are_rejected() {
    let (pk, sk) = keypair(64, 3);
    let signature = sk.sign_with_seed(b"message", &[3_u8; 32]);
    let params = signature.params();

    // s1 = 0 makes s0 = c, whose coefficients are spread over the whole of Z_q
    let zero = SignaturePoly::from(Polynomial::new(vec![0i16; 64]));
    let forged = Signature::new(params, signature.salt().clone(), zero).unwrap();
    assert!(!pk.verify(b"message", &forged));

    // an s1 that on its own exceeds the bound: 1961^2 > 3842630
    let mut long = vec![0i16; 64];
    long[5] = 1961;
    let long = SignaturePoly::from(Polynomial::new(long));
    let forged = Signature::new(params, signature.salt().clone(), long).unwrap();
    assert!(!pk.verify(b"message", &forged));
    assert!(!pk.verify_bytes(b"message", &forged.to_bytes()));

    // a signature for a different degree never verifies
    let (other_pk, _) = keypair(128, 3);
    assert!(!other_pk.verify(b"message", &signature));
}

#[test]
fn test_seeded_signing_is_deterministic() {
    let (pk, sk) = keypair(512, 4);
    let message = b"Hello World!";

    let signature = sk.sign_with_seed(message, &[7_u8; 32]);
    assert_eq!(signature.to_bytes(), sk.sign_with_seed(message, &[7_u8; 32]).to_bytes());
    assert_ne!(signature.to_bytes(), sk.sign_with_seed(message, &[8_u8; 32]).to_bytes());
    assert!(pk.verify(message, &signature));
    assert_eq!(signature.to_bytes().len(), 666);
}

#[test]
fn test_keygen_satisfies_ntru_equation() {
    for n in [2, 8, 32, 128, 512] {
        let (_, sk) = keypair(n, 5);
        let [f, g, big_f, big_g] =
            sk.short_lattice_basis().each_ref().map(|p| p.map(|&c| c as i64));
        let lhs = &f.mul_negacyclic(&big_g) - &g.mul_negacyclic(&big_f);
        let mut expected = vec![0i64; n];
        expected[0] = 12289;
        assert_eq!(lhs.coefficients, expected);

        // h * f = g mod q
        let h = sk.public_key().h().clone();
        let f_q: Polynomial<FalconFelt> = sk.short_lattice_basis()[0].clone().into();
        let g_q: Polynomial<FalconFelt> = sk.short_lattice_basis()[1].clone().into();
        assert_eq!(h.mul_zq(&f_q), g_q);
    }
}

// RECOVERABLE SIGNATURES
// ================================================================================================

#[rstest]
#[case(2, 50)]
#[case(4, 50)]
#[case(8, 50)]
#[case(16, 50)]
#[case(32, 20)]
#[case(64, 20)]
#[case(128, 10)]
#[case(256, 10)]
#[case(512, 5)]
#[case(1024, 3)]
fn test_recoverable_round_trip(#[case] n: usize, #[case] count: usize) {
    let (pk, sk) = keypair(n, 6);
    let mut rng = ChaCha20Rng::from_seed([6_u8; 32]);

    for message in messages(count) {
        let signature = sk.sign_recoverable_with_rng(&message, &mut rng);

        assert!(pk.verify_recoverable(&message, &signature));
        assert_eq!(PublicKey::recover_from(&message, &signature).unwrap(), pk);

        let bytes = signature.to_bytes();
        assert_eq!(bytes.len(), sk.params().recoverable_bytelen());
        assert!(pk.verify_recoverable_bytes(&message, &bytes));
        assert_eq!(RecoverableSignature::from_bytes(&bytes).unwrap(), signature);
    }

    // another message recovers another key
    let message = b"recover the key";
    let signature = sk.sign_recoverable_with_seed(message, &[6_u8; 32]);
    assert!(!pk.verify_recoverable(b"other message", &signature));
    assert_ne!(PublicKey::recover_from(b"other message", &signature).unwrap(), pk);
}

#[test]
fn test_recoverable_signature_rejects_wrong_key() {
    let (pk, sk) = keypair(64, 7);
    let (other_pk, other_sk) = keypair(64, 8);
    let message = b"recover the key";

    let signature = sk.sign_recoverable_with_seed(message, &[0_u8; 32]);
    assert!(!other_pk.verify_recoverable(message, &signature));
    let other_signature = other_sk.sign_recoverable_with_seed(message, &[0_u8; 32]);
    assert!(other_pk.verify_recoverable(message, &other_signature));
    assert!(pk.verify_recoverable(message, &signature));
}

#[test]
fn test_recoverable_halves_must_both_decode() {
    let (pk, sk) = keypair(64, 9);
    let message = b"recover the key";
    let bytes = sk.sign_recoverable_with_seed(message, &[9_u8; 32]).to_bytes();
    let body_len = sk.params().body_len();

    // an all-zero half is an unterminated high-bits run, so either half alone breaks decoding
    for half in 0..2 {
        let mut tampered = bytes.clone();
        let start = 1 + SALT_LEN + half * body_len;
        tampered[start..start + body_len].fill(0);
        assert!(!pk.verify_recoverable_bytes(message, &tampered));
        assert!(RecoverableSignature::from_bytes(&tampered).is_err());
    }
    assert!(pk.verify_recoverable_bytes(message, &bytes));
}

#[test]
fn test_recovery_checks_the_norm() {
    let (_, sk) = keypair(16, 10);
    let params = sk.params();
    // 2 * 1000^2 > 892039, while each half still fits the 22-byte body
    let huge = || {
        let mut coefficients = vec![0i16; 16];
        coefficients[0] = 1000;
        SignaturePoly::from(Polynomial::new(coefficients))
    };
    let salt = Salt::new([0u8; SALT_LEN]);
    let signature = RecoverableSignature::new(params, salt, huge(), huge()).unwrap();
    assert!(PublicKey::recover_from(b"message", &signature).is_err());
}

// KNOWN-ANSWER TESTS
// ================================================================================================

#[test]
fn test_salt_stream_kat() {
    // first 40 bytes of the ChaCha20 keystream for the all-zero key and nonce
    let mut rng = ChaCha20Rng::from_seed([0_u8; 32]);
    let salt = Salt::random(&mut rng);
    let expected = hex::decode(
        "76b8e0ada0f13d90405d6ae55386bd28bdd219b8a08ded1aa836efcc8b770dc7da41597c5157488d",
    )
    .unwrap();
    assert_eq!(salt.as_bytes().as_slice(), expected.as_slice());
}

#[test]
fn test_hash_to_point_kat() {
    let salt = Salt::new([0xa5; SALT_LEN]);
    let c = hash_to_point_shake256(b"Hello World!", &salt, 16);
    let expected: Vec<FalconFelt> = [
        11283, 1218, 3570, 8895, 9433, 6788, 11787, 6057, 11218, 4251, 1377, 11447, 4695, 9429,
        5003, 11842,
    ]
    .into_iter()
    .map(FalconFelt::new)
    .collect();
    assert_eq!(c.coefficients, expected);
}

// KEYS
// ================================================================================================

#[test]
fn test_key_serialization_round_trip() {
    let (pk, sk) = keypair(256, 11);
    let signature = sk.sign_with_seed(b"message", &[11_u8; 32]);

    let pk = PublicKey::read_from_bytes(&pk.to_bytes()).unwrap();
    assert!(pk.verify(b"message", &signature));

    let sk_bytes = sk.to_bytes();
    assert_eq!(sk_bytes.len(), 1 + 8 * 256);
    let restored = SecretKey::read_from_bytes(&sk_bytes).unwrap();
    assert_eq!(restored, sk);
    assert_eq!(restored.sign_with_seed(b"message", &[11_u8; 32]).to_bytes(), signature.to_bytes());
}

#[test]
fn test_secret_key_debug_redaction() {
    let (_, sk) = keypair(8, 12);
    assert_eq!(format!("{sk:?}"), "<elided secret for SecretKey>");
    assert_eq!(format!("{sk}"), "<elided secret for SecretKey>");
}

// OS RANDOMNESS AND THREADS
// ================================================================================================

#[cfg(feature = "std")]
#[test]
fn test_os_randomness_path() {
    let (pk, sk) = crate::generate_keypair(64, None).unwrap();
    assert!(pk.verify(b"message", &sk.sign(b"message")));
    assert!(pk.verify_recoverable(b"message", &sk.sign_recoverable(b"message")));

    let sk = SecretKey::new(32).unwrap();
    assert!(sk.public_key().verify(b"message", &sk.sign(b"message")));
}

#[cfg(feature = "std")]
#[test]
fn test_concurrent_signing_with_shared_key() {
    use std::{sync::Arc, thread};

    let (pk, sk) = keypair(128, 13);
    let sk = Arc::new(sk);

    let handles: Vec<_> = (0..4u8)
        .map(|i| {
            let sk = Arc::clone(&sk);
            thread::spawn(move || {
                let message = [i; 16];
                (message, sk.sign_with_seed(&message, &[i; 32]))
            })
        })
        .collect();

    for handle in handles {
        let (message, signature) = handle.join().unwrap();
        assert!(pk.verify(&message, &signature));
        let again = sk.sign_with_seed(&message, &[message[0]; 32]);
        assert_eq!(signature.to_bytes(), again.to_bytes());
    }
}
