//! Known-answer tests, RFC 9180 Appendix A (base mode).

use hpke_engine::crypto::backend::HpkeCryptoRustCrypto;
use hpke_engine::*;

const INFO: &str = "4f6465206f6e2061204772656369616e2055726e";
const PT: &[u8] = b"Beauty is truth, truth beauty";
const AAD_0: &[u8] = b"Count-0";
const EXPORTER_CONTEXT: &[u8] = b"TestContext";

/// A.1.1 `ikmE`, which derives the A.1.1 `skEm`.
const IKM_E: &str = "7268600d403fce431561aef583ee1613527cff655c1343f29812e66706df3234";

struct Vector {
    suite: Suite,
    sk_em: &'static str,
    pk_em: &'static str,
    sk_rm: &'static str,
    pk_rm: &'static str,
    ct_0: &'static str,
    exported: &'static str,
}

impl Vector {
    fn ephemeral(&self) -> HpkeKeyPair {
        HpkeKeyPair::new_unchecked(self.suite.kem_id, hex(self.sk_em), hex(self.pk_em)).unwrap()
    }

    fn recipient(&self) -> HpkeKeyPair {
        HpkeKeyPair::new_unchecked(self.suite.kem_id, hex(self.sk_rm), hex(self.pk_rm)).unwrap()
    }
}

// https://www.rfc-editor.org/rfc/rfc9180.html#appendix-A.1
const X25519_AES_128_GCM: Vector = Vector {
    suite: Suite::new(
        HpkeKemId::DHKEM_X25519_HKDF_SHA256,
        HpkeKdfId::HKDF_SHA256,
        HpkeAeadId::AES_128_GCM,
    ),
    sk_em: "52c4a758a802cd8b936eceea314432798d5baf2d7e9235dc084ab1b9cfa2f736",
    pk_em: "37fda3567bdbd628e88668c3c8d7e97d1d1253b6d4ea6d44c150f741f1bf4431",
    sk_rm: "4612c550263fc8ad58375df3f557aac531d26850903e55a9f23f21d8534e8ac8",
    pk_rm: "3948cfe0ad1ddb695d780e59077195da6c56506b027329794ab02bca80815c4d",
    ct_0: "f938558b5d72f1a23810b4be2ab4f84331acc02fc97babc53a52ae8218a355a96d8770ac83d07bea87e13c512a",
    exported: "e9e43065102c3836401bed8c3c3c75ae46be1639869391d62c61f1ec7af54931",
};

// https://www.rfc-editor.org/rfc/rfc9180.html#appendix-A.2
const X25519_CHACHA20_POLY1305: Vector = Vector {
    suite: Suite::new(
        HpkeKemId::DHKEM_X25519_HKDF_SHA256,
        HpkeKdfId::HKDF_SHA256,
        HpkeAeadId::CHACHA20_POLY1305,
    ),
    sk_em: "f4ec9b33b792c372c1d2c2063507b684ef925b8c75a42dbcbf57d63ccd381600",
    pk_em: "1afa08d3dec047a643885163f1180476fa7ddb54c6a8029ea33f95796bf2ac4a",
    sk_rm: "8057991eef8f1f1af18f4a9491d16a1ce333f695d4db8e38da75975c4478e0fb",
    pk_rm: "4310ee97d88cc1f088a5576c77ab0cf5c3ac797f3d95139c6c84b5429c59662a",
    ct_0: "1c5250d8034ec2b784ba2cfd69dbdb8af406cfe3ff938e131f0def8c8b60b4db21993c62ce81883d2dd1b51a28",
    exported: "5acb09211139c43b3090489a9da433e8a30ee7188ba8b0a9a1ccf0c229283e53",
};

// https://www.rfc-editor.org/rfc/rfc9180.html#appendix-A.3
const P256_AES_128_GCM: Vector = Vector {
    suite: Suite::new(
        HpkeKemId::DHKEM_P256_HKDF_SHA256,
        HpkeKdfId::HKDF_SHA256,
        HpkeAeadId::AES_128_GCM,
    ),
    sk_em: "4270e54ffd08d79d5928020af4686d8f6b7d35dbe470265f1f5aa22816ce860e",
    pk_em: "04a92719c6195d5085104f469a8b9814d5838ff72b60501e2c4466e5e67b325ac98536d7b61a1af4b78e5b7f951c0900be863c403ce65c9bfcb9382657222d18c4",
    sk_rm: "f3ce7fdae57e1a310d87f1ebbde6f328be0a99cdbcadf4d6589cf29de4b8ffd2",
    pk_rm: "04fe8c19ce0905191ebc298a9245792531f26f0cece2460639e8bc39cb7f706a826a779b4cf969b8a0e539c7f62fb3d30ad6aa8f80e30f1d128aafd68a2ce72ea0",
    ct_0: "5ad590bb8baa577f8619db35a36311226a896e7342a6d836d8b7bcd2f20b6c7f9076ac232e3ab2523f39513434",
    exported: "d8f1ea7942adbba7412c6d431c62d01371ea476b823eb697e1f6e6cae1dab85a",
};

fn hex(s: &str) -> Vec<u8> {
    const_hex::decode(s).unwrap()
}

fn backend() -> HpkeCryptoRustCrypto {
    HpkeCryptoRustCrypto::from_seed([0; 32])
}

#[test_case::test_case(X25519_AES_128_GCM; "x25519 aes-128-gcm")]
#[test_case::test_case(X25519_CHACHA20_POLY1305; "x25519 chacha20-poly1305")]
#[test_case::test_case(P256_AES_128_GCM; "p256 aes-128-gcm")]
fn test_base_seal(v: Vector) {
    let mut ctx_s = HpkeContext::<_, Sender>::new(HpkeMode::Base, v.suite, backend()).unwrap();
    ctx_s.set_sender_priv(v.ephemeral()).unwrap();

    let (enc, ct) = ctx_s.seal(&hex(v.pk_rm), &hex(INFO), AAD_0, PT).unwrap();

    assert_eq!(&enc[..], &hex(v.pk_em)[..]);
    assert_eq!(ct, hex(v.ct_0));
    assert_eq!(ctx_s.seq(), 1);

    assert_eq!(&ctx_s.export(EXPORTER_CONTEXT, 32).unwrap()[..], &hex(v.exported)[..]);
}

#[test_case::test_case(X25519_AES_128_GCM; "x25519 aes-128-gcm")]
#[test_case::test_case(X25519_CHACHA20_POLY1305; "x25519 chacha20-poly1305")]
#[test_case::test_case(P256_AES_128_GCM; "p256 aes-128-gcm")]
fn test_base_open(v: Vector) {
    let sk_r = v.recipient();

    let mut ctx_r = HpkeContext::<_, Recipient>::new(HpkeMode::Base, v.suite, backend()).unwrap();

    let pt = ctx_r
        .open(&hex(v.pk_em), &sk_r, &hex(INFO), AAD_0, &hex(v.ct_0))
        .unwrap();
    assert_eq!(pt, PT);

    assert_eq!(&ctx_r.export(EXPORTER_CONTEXT, 32).unwrap()[..], &hex(v.exported)[..]);

    // the same ciphertext is not valid at seq 1
    assert!(matches!(
        ctx_r.open(&hex(v.pk_em), &sk_r, &hex(INFO), AAD_0, &hex(v.ct_0)),
        Err(Error::AuthenticationFailure)
    ));
}

#[test_case::test_case(X25519_AES_128_GCM; "x25519 aes-128-gcm")]
#[test_case::test_case(X25519_CHACHA20_POLY1305; "x25519 chacha20-poly1305")]
#[test_case::test_case(P256_AES_128_GCM; "p256 aes-128-gcm")]
fn test_base_single_shot(v: Vector) {
    let (enc, ct) = single_shot::encrypt(
        backend(),
        HpkeMode::Base,
        v.suite,
        &hex(v.pk_rm),
        &hex(INFO),
        AAD_0,
        PT,
        None,
        None,
        Some(v.ephemeral()),
        None,
    )
    .unwrap();

    assert_eq!(&enc[..], &hex(v.pk_em)[..]);
    assert_eq!(ct, hex(v.ct_0));

    let pt = single_shot::decrypt(
        backend(),
        HpkeMode::Base,
        v.suite,
        &hex(v.pk_em),
        &v.recipient(),
        &hex(INFO),
        AAD_0,
        &hex(v.ct_0),
        None,
        None,
        None,
    )
    .unwrap();

    assert_eq!(pt, PT);
}

#[test]
fn test_derive_key_pair_x25519() {
    let ephemeral =
        kem::derive_key_pair(&backend(), HpkeKemId::DHKEM_X25519_HKDF_SHA256, &hex(IKM_E)).unwrap();

    assert_eq!(&*ephemeral.sk(), &hex(X25519_AES_128_GCM.sk_em)[..]);
    assert_eq!(&*ephemeral.pk(), &hex(X25519_AES_128_GCM.pk_em)[..]);
}
