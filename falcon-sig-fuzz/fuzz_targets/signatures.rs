#![no_main]

use std::sync::OnceLock;

use falcon_sig::{
    PublicKey, RecoverableSignature, SecretKey, Signature, decompress, utils::Deserializable,
};
use libfuzzer_sys::fuzz_target;

fn verifying_key() -> &'static PublicKey {
    static KEY: OnceLock<PublicKey> = OnceLock::new();
    KEY.get_or_init(|| SecretKey::new(64).expect("64 is a supported degree").public_key())
}

fuzz_target!(|data: &[u8]| {
    // Decoding must return Err on malformed input and never panic
    let _ = PublicKey::read_from_bytes(data);
    let _ = SecretKey::read_from_bytes(data);
    let _ = Signature::from_bytes(data);
    let _ = RecoverableSignature::from_bytes(data);

    // Every accepted encoding is canonical
    if let Ok(signature) = Signature::from_bytes(data) {
        assert_eq!(falcon_sig::utils::Serializable::to_bytes(&signature), data);
    }

    // Codec over the raw bytes, with the Falcon-64 body length
    let _ = decompress(data, data.len(), 64);

    // Verification of arbitrary bytes must simply fail
    let pk = verifying_key();
    let _ = pk.verify_bytes(b"fuzz", data);
    let _ = pk.verify_recoverable_bytes(b"fuzz", data);
    if let Ok(signature) = RecoverableSignature::from_bytes(data) {
        let _ = PublicKey::recover_from(b"fuzz", &signature);
    }
});
