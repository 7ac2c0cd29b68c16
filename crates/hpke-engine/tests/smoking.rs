//! Smoke tests for hpke-engine crate

use hpke_engine::*;

#[test_case::test_matrix(
    [
        hpke_engine::crypto::backend::HpkeCryptoRustCrypto::new
    ],
    [
        HpkeMode::Base,
        HpkeMode::Auth,
        HpkeMode::Psk,
        HpkeMode::AuthPsk
    ],
    [
        HpkeKemId::DHKEM_P256_HKDF_SHA256,
        HpkeKemId::DHKEM_P384_HKDF_SHA384,
        HpkeKemId::DHKEM_P521_HKDF_SHA512,
        HpkeKemId::DHKEM_X25519_HKDF_SHA256,
        HpkeKemId::DHKEM_X448_HKDF_SHA512
    ],
    [
        HpkeKdfId::HKDF_SHA256,
        HpkeKdfId::HKDF_SHA384,
        HpkeKdfId::HKDF_SHA512,
    ],
    [
        HpkeAeadId::AES_128_GCM,
        HpkeAeadId::AES_256_GCM,
        HpkeAeadId::CHACHA20_POLY1305,
        HpkeAeadId::EXPORT_ONLY
    ]
)]
fn smoking<C, F>(
    crypto_backend_f: F,
    mode: HpkeMode,
    kem_id: HpkeKemId,
    kdf_id: HpkeKdfId,
    aead_id: HpkeAeadId,
) where
    C: Crypto,
    F: Fn() -> Result<C, CryptoError> + Copy,
{
    let suite = Suite::new(kem_id, kdf_id, aead_id);

    let mut crypto_backend_general = crypto_backend_f().unwrap();

    if !suite.is_supported_by(&crypto_backend_general) {
        eprintln!("skipping unsupported cipher suite: mode={mode:?}, suite={suite}");

        assert!(matches!(
            HpkeContext::<_, Sender>::new(mode, suite, crypto_backend_f().unwrap()),
            Err(Error::UnsupportedSuite)
        ));
        return;
    }

    let sk_r = kem::keygen(&mut crypto_backend_general, suite, None).expect("keygen failure");
    let sk_s = kem::keygen(&mut crypto_backend_general, suite, None).expect("keygen failure");
    let pk_s = sk_s.pk().to_vec();

    let mut psk = [0u8; 32];
    crypto_backend_general
        .secure_random_fill(&mut psk)
        .expect("RNG failure");
    let psk_id = b"HPKE self test psk_id";

    let mut ctx_s = HpkeContext::<_, Sender>::new(mode, suite, crypto_backend_f().unwrap())
        .expect("sender context failure");
    let mut ctx_r = HpkeContext::<_, Recipient>::new(mode, suite, crypto_backend_f().unwrap())
        .expect("recipient context failure");

    if mode.uses_psk() {
        ctx_s.set_psk(psk_id, &psk).expect("set_psk failure");
        ctx_r.set_psk(psk_id, &psk).expect("set_psk failure");
    }

    if mode.is_auth() {
        ctx_s.set_auth_priv(sk_s).expect("set_auth_priv failure");
        ctx_r.set_auth_pub(&pk_s).expect("set_auth_pub failure");
    }

    let info = b"HPKE self test info";

    if aead_id.is_export_only() {
        let enc = ctx_s.setup(&sk_r.pk(), info).expect("sender setup failure");
        assert_eq!(enc.len(), kem_id.n_enc());

        ctx_r.setup(&enc, &sk_r, info).expect("recipient setup failure");
    } else {
        let aad = b"HPKE self test aad";
        let pt = b"HPKE self test plain text";

        let mut enc_first = None;

        for _ in 0..3 {
            let (enc, ct) = ctx_s
                .seal(&sk_r.pk(), info, aad, pt)
                .expect("seal failure");
            assert_eq!(ct.len(), suite.expansion(pt.len()).unwrap().cipher_len);

            let enc_first = enc_first.get_or_insert_with(|| enc.clone());
            assert_eq!(*enc_first, enc);

            let pt_decrypted = ctx_r
                .open(&enc, &sk_r, info, aad, &ct)
                .expect("open failure");

            assert_eq!(pt_decrypted, pt);
        }

        assert_eq!(ctx_s.seq(), 3);
        assert_eq!(ctx_r.seq(), 3);
    }

    let exporter_context = b"HPKE self test exporter context";
    assert_eq!(
        ctx_s
            .export(exporter_context, 32)
            .expect("ctx_s export failure"),
        ctx_r
            .export(exporter_context, 32)
            .expect("ctx_r export failure"),
        "export failure, ctx_s and ctx_r exports different values"
    );
}
