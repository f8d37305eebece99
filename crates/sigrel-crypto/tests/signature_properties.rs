//! Signature engine properties with real P-256 keys.

use proptest::prelude::*;
use sigrel_crypto::{sign, verify, KeyPair};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// A fresh key pair always verifies its own signature.
    #[test]
    fn verify_round_trip(content in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let kp = KeyPair::generate();
        let sig = sign(&kp, content.as_slice()).unwrap();
        let tk = kp.trusted_key().unwrap();
        prop_assert!(verify(&tk, content.as_slice(), &sig).unwrap());
    }

    /// Changing the content invalidates the signature.
    #[test]
    fn tamper_detection(
        content in proptest::collection::vec(any::<u8>(), 1..512),
        idx in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let kp = KeyPair::generate();
        let sig = sign(&kp, content.as_slice()).unwrap();
        let mut tampered = content.clone();
        let i = idx.index(tampered.len());
        tampered[i] ^= flip;
        let tk = kp.trusted_key().unwrap();
        prop_assert!(!verify(&tk, tampered.as_slice(), &sig).unwrap());
    }

    /// A signature from one key never verifies under another.
    #[test]
    fn wrong_key_rejection(content in proptest::collection::vec(any::<u8>(), 0..512)) {
        let signer = KeyPair::generate();
        let other = KeyPair::generate();
        let sig = sign(&signer, content.as_slice()).unwrap();
        let tk = other.trusted_key().unwrap();
        prop_assert!(!verify(&tk, content.as_slice(), &sig).unwrap());
    }
}

#[test]
fn appended_bytes_invalidate() {
    let kp = KeyPair::generate();
    let sig = sign(&kp, &b"0123456789"[..]).unwrap();
    let tk = kp.trusted_key().unwrap();
    assert!(!verify(&tk, &b"0123456789\n"[..], &sig).unwrap());
}
