//! Parity between a vault-backed key and the same key held locally.
//!
//! Application code is written against `RsaAlgorithm`. These tests run the
//! same code against `SoftwareRsa` (the key in process memory) and
//! `RsaKeyVault` (the key behind a software vault) and check that callers
//! cannot tell them apart, except where the vault deliberately refuses.

use keyvault_crypto_local::{Fault, LocalKeyVaultClient, SoftwareRsa};
use keyvault_rsa::{
    BridgeConfig, BridgeStrategy, CryptoError, EncryptionPadding, HashAlgorithmName,
    RsaAlgorithm, RsaKeyVault, SignaturePadding,
};
use proptest::prelude::*;
use std::io::Cursor;
use std::sync::{Arc, OnceLock};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Fixtures
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn shared_key() -> &'static SoftwareRsa {
    static KEY: OnceLock<SoftwareRsa> = OnceLock::new();
    KEY.get_or_init(|| SoftwareRsa::generate(2048).expect("key generation"))
}

fn vault() -> (Arc<LocalKeyVaultClient>, RsaKeyVault) {
    let client = Arc::new(
        LocalKeyVaultClient::new(shared_key().private_key())
            .with_key_id("https://signing.vault.example/keys/release/7f3a"),
    );
    let rsa = RsaKeyVault::new(client.context()).expect("valid context");
    (client, rsa)
}

/// Caller code that only knows the trait.
fn sign_release(rsa: &dyn RsaAlgorithm, artifact: &[u8]) -> Result<Vec<u8>, CryptoError> {
    rsa.sign_data(artifact, &HashAlgorithmName::SHA256, SignaturePadding::Pkcs1)
}

fn verify_release(rsa: &dyn RsaAlgorithm, artifact: &[u8], sig: &[u8]) -> bool {
    rsa.verify_data(artifact, sig, &HashAlgorithmName::SHA256, SignaturePadding::Pkcs1)
        .expect("verification runs")
}

const ALGORITHMS: [HashAlgorithmName; 4] = [
    HashAlgorithmName::SHA1,
    HashAlgorithmName::SHA256,
    HashAlgorithmName::SHA384,
    HashAlgorithmName::SHA512,
];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Signing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn vault_and_local_signatures_are_identical() {
    let (_client, rsa) = vault();
    let local = shared_key();
    for algorithm in ALGORITHMS {
        let hash = local.hash_data(b"artifact", 0, 8, &algorithm).unwrap();
        let remote_sig = rsa
            .sign_hash(&hash, &algorithm, SignaturePadding::Pkcs1)
            .unwrap();
        let local_sig = local
            .sign_hash(&hash, &algorithm, SignaturePadding::Pkcs1)
            .unwrap();
        // PKCS#1 v1.5 is deterministic.
        assert_eq!(remote_sig, local_sig, "{algorithm}");
    }
}

#[test]
fn signatures_cross_verify() {
    let (_client, rsa) = vault();
    let local: &dyn RsaAlgorithm = shared_key();

    let sig = sign_release(&rsa, b"v1.2.3").unwrap();
    assert!(verify_release(local, b"v1.2.3", &sig));
    assert!(!verify_release(local, b"v1.2.4", &sig));

    let sig = sign_release(local, b"v1.2.3").unwrap();
    assert!(verify_release(&rsa, b"v1.2.3", &sig));
}

#[test]
fn pss_verifies_locally_but_cannot_be_signed_remotely() {
    let (client, rsa) = vault();
    let local = shared_key();
    let hash = local
        .hash_data(b"artifact", 0, 8, &HashAlgorithmName::SHA256)
        .unwrap();
    let sig = local
        .sign_hash(&hash, &HashAlgorithmName::SHA256, SignaturePadding::Pss)
        .unwrap();
    assert!(
        rsa.verify_hash(&hash, &sig, &HashAlgorithmName::SHA256, SignaturePadding::Pss)
            .unwrap()
    );
    let err = rsa
        .sign_hash(&hash, &HashAlgorithmName::SHA256, SignaturePadding::Pss)
        .unwrap_err();
    assert!(matches!(err, CryptoError::UnsupportedOperation(_)));
    assert_eq!(client.sign_calls(), 0);
}

#[test]
fn mislabelled_digests_fail_like_a_local_key() {
    let (client, rsa) = vault();
    let local = shared_key();
    let sha256 = local
        .hash_data(b"artifact", 0, 8, &HashAlgorithmName::SHA256)
        .unwrap();
    assert!(
        local
            .sign_hash(&sha256, &HashAlgorithmName::SHA1, SignaturePadding::Pkcs1)
            .is_err()
    );
    let err = rsa
        .sign_hash(&sha256, &HashAlgorithmName::SHA1, SignaturePadding::Pkcs1)
        .unwrap_err();
    assert!(matches!(err, CryptoError::InvalidArgument(_)));
    assert_eq!(client.sign_calls(), 0);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Encryption
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn ciphertexts_cross_decrypt() {
    let (client, rsa) = vault();
    let local = shared_key();
    for padding in [
        EncryptionPadding::Pkcs1,
        EncryptionPadding::OAEP_SHA1,
        EncryptionPadding::OAEP_SHA256,
    ] {
        let ct = rsa.encrypt(b"data key", &padding).unwrap();
        assert_eq!(local.decrypt(&ct, &padding).unwrap(), b"data key");

        let ct = local.encrypt(b"data key", &padding).unwrap();
        assert_eq!(rsa.decrypt(&ct, &padding).unwrap(), b"data key");
    }
    assert_eq!(client.decrypt_calls(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_remote_calls_are_independent() {
    let (client, rsa) = vault();
    let rsa = Arc::new(rsa);
    let mut tasks = Vec::new();
    for i in 0..8u8 {
        let rsa = rsa.clone();
        tasks.push(tokio::spawn(async move {
            let message = vec![i; 16];
            let ct = rsa.encrypt(&message, &EncryptionPadding::OAEP_SHA256)?;
            let pt = rsa
                .decrypt_async(&ct, &EncryptionPadding::OAEP_SHA256)
                .await?;
            Ok::<_, CryptoError>((message, pt))
        }));
    }
    for task in tasks {
        let (message, pt) = task.await.unwrap().unwrap();
        assert_eq!(message, pt);
    }
    assert_eq!(client.decrypt_calls(), 8);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Where the vault deliberately differs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn private_material_stays_in_the_vault() {
    let (_client, rsa) = vault();
    let local = shared_key();
    assert_eq!(
        rsa.export_parameters(false).unwrap(),
        local.export_parameters(false).unwrap()
    );
    assert!(local.export_parameters(true).unwrap().has_private());
    assert!(matches!(
        rsa.export_parameters(true),
        Err(CryptoError::OperationFailed { .. })
    ));
    let params = local.export_parameters(true).unwrap();
    assert!(matches!(
        rsa.import_parameters(&params),
        Err(CryptoError::UnsupportedOperation(_))
    ));
}

#[test]
fn key_sizes_are_fixed_to_the_vault_key() {
    let (_client, rsa) = vault();
    assert_eq!(rsa.key_size(), shared_key().key_size());
    let sizes = rsa.legal_key_sizes();
    assert_eq!(sizes.len(), 1);
    assert_eq!(sizes[0].min_size, 2048);
    assert_eq!(sizes[0].max_size, 2048);
    assert_eq!(sizes[0].skip_size, 0);
}

#[test]
fn vault_outage_fails_without_partial_results() {
    let (client, rsa) = vault();
    client.fail_with(Fault::Transient("503 service unavailable".into()));
    for strategy in [BridgeStrategy::Auto, BridgeStrategy::DedicatedThread] {
        let rsa = RsaKeyVault::with_config(
            client.context(),
            BridgeConfig::new().with_strategy(strategy),
        )
        .unwrap();
        let err = sign_release(&rsa, b"v1.2.3").unwrap_err();
        assert!(err.client_error().is_some_and(|e| e.is_transient()));
    }
    client.clear_fault();
    assert!(sign_release(&rsa, b"v1.2.3").is_ok());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Digests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

proptest! {
    #[test]
    fn digests_match_local_for_buffers_and_streams(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        skip in 0usize..16,
    ) {
        let (_client, rsa) = vault();
        let local = shared_key();
        let offset = skip.min(data.len());
        let count = data.len() - offset;
        for algorithm in ALGORITHMS {
            let remote = rsa.hash_data(&data, offset, count, &algorithm).unwrap();
            let expected = local.hash_data(&data, offset, count, &algorithm).unwrap();
            let streamed = rsa
                .hash_reader(&mut Cursor::new(&data[offset..]), &algorithm)
                .unwrap();
            prop_assert_eq!(&remote, &expected);
            prop_assert_eq!(&remote, &streamed);
        }
    }
}
