use keyward_crypto::{
    derive_key, generate_random_key, seal_with_aad, unwrap_key, wrap_key, CryptoError, FactorTag,
    KdfParams, Salt, WrapEnvelope,
};

#[test]
fn wrap_unwrap_roundtrip() {
    let vault_key = generate_random_key();
    let wrapping = generate_random_key();

    let envelope = wrap_key(&vault_key, &wrapping, FactorTag::Password).unwrap();
    let recovered = unwrap_key(&envelope, &wrapping, FactorTag::Password).unwrap();

    assert_eq!(recovered.as_bytes(), vault_key.as_bytes());
}

#[test]
fn each_factor_unwraps_the_same_vault_key() {
    let vault_key = generate_random_key();
    let salt = Salt::random();
    let params = KdfParams::fast_insecure();

    let password_key = derive_key("password-factor", &salt, &params).unwrap();
    let recovery_key = derive_key("RECOVERYPHRASEFACTOR", &salt, &params).unwrap();
    let biometry_key = derive_key("device-secret-factor", &salt, &params).unwrap();

    let by_password = wrap_key(&vault_key, &password_key, FactorTag::Password).unwrap();
    let by_recovery = wrap_key(&vault_key, &recovery_key, FactorTag::Recovery).unwrap();
    let by_biometry = wrap_key(&vault_key, &biometry_key, FactorTag::Biometry).unwrap();

    let k1 = unwrap_key(&by_password, &password_key, FactorTag::Password).unwrap();
    let k2 = unwrap_key(&by_recovery, &recovery_key, FactorTag::Recovery).unwrap();
    let k3 = unwrap_key(&by_biometry, &biometry_key, FactorTag::Biometry).unwrap();

    assert_eq!(k1.as_bytes(), vault_key.as_bytes());
    assert_eq!(k2.as_bytes(), vault_key.as_bytes());
    assert_eq!(k3.as_bytes(), vault_key.as_bytes());
}

#[test]
fn wrong_wrapping_key_fails() {
    let vault_key = generate_random_key();
    let wrapping = generate_random_key();
    let other = generate_random_key();

    let envelope = wrap_key(&vault_key, &wrapping, FactorTag::Password).unwrap();
    let result = unwrap_key(&envelope, &other, FactorTag::Password);

    assert!(result.is_err());
}

#[test]
fn wrong_factor_fails_even_with_right_key() {
    let vault_key = generate_random_key();
    let wrapping = generate_random_key();

    let envelope = wrap_key(&vault_key, &wrapping, FactorTag::Password).unwrap();
    // Same wrapping key, but the envelope was not made for recovery
    let result = unwrap_key(&envelope, &wrapping, FactorTag::Recovery);

    assert!(matches!(result, Err(CryptoError::Decryption(_))));
}

#[test]
fn tampered_envelope_fails() {
    let vault_key = generate_random_key();
    let wrapping = generate_random_key();

    let mut envelope = wrap_key(&vault_key, &wrapping, FactorTag::Password).unwrap();
    if let Some(byte) = envelope.sealed_key.ciphertext.first_mut() {
        *byte ^= 0xFF;
    }

    let result = unwrap_key(&envelope, &wrapping, FactorTag::Password);
    assert!(result.is_err());
}

#[test]
fn undersized_payload_is_rejected() {
    let wrapping = generate_random_key();

    // Hand-build an envelope whose sealed payload is 31 bytes, not a key
    let sealed_key = seal_with_aad(&wrapping, &[0u8; 31], FactorTag::Password.aad()).unwrap();
    let envelope = WrapEnvelope {
        factor: FactorTag::Password,
        sealed_key,
    };

    let result = unwrap_key(&envelope, &wrapping, FactorTag::Password);
    assert!(matches!(
        result,
        Err(CryptoError::InvalidKeyLength {
            expected: 32,
            actual: 31
        })
    ));
}

#[test]
fn envelope_serialization_roundtrip() {
    let vault_key = generate_random_key();
    let wrapping = generate_random_key();

    let envelope = wrap_key(&vault_key, &wrapping, FactorTag::Biometry).unwrap();

    let json = serde_json::to_string(&envelope).unwrap();
    let deserialized: WrapEnvelope = serde_json::from_str(&json).unwrap();

    assert_eq!(envelope, deserialized);

    let recovered = unwrap_key(&deserialized, &wrapping, FactorTag::Biometry).unwrap();
    assert_eq!(recovered.as_bytes(), vault_key.as_bytes());
}

#[test]
fn factor_tag_serializes_stably() {
    // Persisted envelopes depend on these names not changing
    assert_eq!(
        serde_json::to_string(&FactorTag::Password).unwrap(),
        "\"password\""
    );
    assert_eq!(
        serde_json::to_string(&FactorTag::Recovery).unwrap(),
        "\"recovery\""
    );
    assert_eq!(
        serde_json::to_string(&FactorTag::Biometry).unwrap(),
        "\"biometry\""
    );
}

// Property-based tests
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn wrap_unwrap_always_roundtrips(secret in "[a-zA-Z0-9]{8,40}") {
            let vault_key = generate_random_key();
            let salt = Salt::random();
            let wrapping = derive_key(&secret, &salt, &KdfParams::fast_insecure()).unwrap();

            let envelope = wrap_key(&vault_key, &wrapping, FactorTag::Password).unwrap();
            let recovered = unwrap_key(&envelope, &wrapping, FactorTag::Password).unwrap();

            prop_assert_eq!(recovered.as_bytes(), vault_key.as_bytes());
        }
    }
}
