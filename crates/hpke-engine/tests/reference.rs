//! PSK and authenticated modes against a direct RFC 9180 computation of
//! DHKEM(X25519, HKDF-SHA256), HKDF-SHA256, AES-128-GCM.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Nonce};
use hkdf::Hkdf;
use hpke_engine::crypto::backend::HpkeCryptoRustCrypto;
use hpke_engine::*;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};

const KEM_SUITE_ID: &[u8] = b"KEM\x00\x20";
const HPKE_SUITE_ID: &[u8] = b"HPKE\x00\x20\x00\x01\x00\x01";

const SK_E: [u8; 32] = [0x11; 32];
const SK_R: [u8; 32] = [0x22; 32];
const SK_S: [u8; 32] = [0x33; 32];

const PSK: &str = "0247fd33b913760fa1fa51e1892d9f307fbe65eb171e8132c2af18555a738b82";
const PSK_ID: &[u8] = b"Ennyn Durin aran Moria";

const INFO: &[u8] = b"Ode on a Grecian Urn";
const PT: &[u8] = b"Beauty is truth, truth beauty";

fn labeled_extract(suite_id: &[u8], salt: &[u8], label: &[u8], ikm: &[u8]) -> Vec<u8> {
    let labeled_ikm = [&b"HPKE-v1"[..], suite_id, label, ikm].concat();
    let (prk, _) = Hkdf::<Sha256>::extract(Some(salt), &labeled_ikm);
    prk.to_vec()
}

fn labeled_expand(suite_id: &[u8], prk: &[u8], label: &[u8], info: &[u8], len: usize) -> Vec<u8> {
    let len_be = u16::try_from(len).unwrap().to_be_bytes();
    let labeled_info = [&len_be[..], &b"HPKE-v1"[..], suite_id, label, info].concat();

    let mut okm = vec![0u8; len];
    Hkdf::<Sha256>::from_prk(prk)
        .unwrap()
        .expand(&labeled_info, &mut okm)
        .unwrap();
    okm
}

fn public(sk: [u8; 32]) -> [u8; 32] {
    PublicKey::from(&StaticSecret::from(sk)).to_bytes()
}

fn dh(sk: [u8; 32], pk: [u8; 32]) -> [u8; 32] {
    StaticSecret::from(sk)
        .diffie_hellman(&PublicKey::from(pk))
        .to_bytes()
}

fn key_pair(sk: [u8; 32]) -> HpkeKeyPair {
    HpkeKeyPair::new_unchecked(HpkeKemId::DHKEM_X25519_HKDF_SHA256, sk, public(sk)).unwrap()
}

struct Expected {
    enc: [u8; 32],
    key: Vec<u8>,
    base_nonce: Vec<u8>,
    exporter_secret: Vec<u8>,
}

impl Expected {
    fn compute(mode: HpkeMode, psk: &[u8], psk_id: &[u8]) -> Self {
        let enc = public(SK_E);
        let pk_r = public(SK_R);

        let mut dh_out = dh(SK_E, pk_r).to_vec();
        let mut kem_context = [enc, pk_r].concat();
        if mode.is_auth() {
            dh_out.extend_from_slice(&dh(SK_S, pk_r));
            kem_context.extend_from_slice(&public(SK_S));
        }

        let eae_prk = labeled_extract(KEM_SUITE_ID, b"", b"eae_prk", &dh_out);
        let shared_secret =
            labeled_expand(KEM_SUITE_ID, &eae_prk, b"shared_secret", &kem_context, 32);

        let psk_id_hash = labeled_extract(HPKE_SUITE_ID, b"", b"psk_id_hash", psk_id);
        let info_hash = labeled_extract(HPKE_SUITE_ID, b"", b"info_hash", INFO);
        let context = [&[mode as u8][..], &psk_id_hash[..], &info_hash[..]].concat();

        let secret = labeled_extract(HPKE_SUITE_ID, &shared_secret, b"secret", psk);

        Self {
            enc,
            key: labeled_expand(HPKE_SUITE_ID, &secret, b"key", &context, 16),
            base_nonce: labeled_expand(HPKE_SUITE_ID, &secret, b"base_nonce", &context, 12),
            exporter_secret: labeled_expand(HPKE_SUITE_ID, &secret, b"exp", &context, 32),
        }
    }

    fn seal(&self, seq: u64, aad: &[u8], pt: &[u8]) -> Vec<u8> {
        let mut nonce = self.base_nonce.clone();
        for (n, s) in nonce[4..].iter_mut().zip(seq.to_be_bytes()) {
            *n ^= s;
        }

        Aes128Gcm::new_from_slice(&self.key)
            .unwrap()
            .encrypt(Nonce::from_slice(&nonce), Payload { msg: pt, aad })
            .unwrap()
    }

    fn export(&self, exporter_context: &[u8], len: usize) -> Vec<u8> {
        labeled_expand(HPKE_SUITE_ID, &self.exporter_secret, b"sec", exporter_context, len)
    }
}

fn backend() -> HpkeCryptoRustCrypto {
    HpkeCryptoRustCrypto::from_seed([0; 32])
}

fn psk_material(mode: HpkeMode) -> (Vec<u8>, &'static [u8]) {
    if mode.uses_psk() {
        (const_hex::decode(PSK).unwrap(), PSK_ID)
    } else {
        (Vec::new(), &b""[..])
    }
}

#[test_case::test_case(HpkeMode::Base; "base")]
#[test_case::test_case(HpkeMode::Psk; "psk")]
#[test_case::test_case(HpkeMode::Auth; "auth")]
#[test_case::test_case(HpkeMode::AuthPsk; "auth psk")]
fn test_sender_matches_reference(mode: HpkeMode) {
    let (psk, psk_id) = psk_material(mode);
    let expected = Expected::compute(mode, &psk, psk_id);

    let mut ctx_s = HpkeContext::<_, Sender>::new(mode, Suite::DEFAULT, backend()).unwrap();
    ctx_s.set_sender_priv(key_pair(SK_E)).unwrap();
    if mode.uses_psk() {
        ctx_s.set_psk(psk_id, &psk).unwrap();
    }
    if mode.is_auth() {
        ctx_s.set_auth_priv(key_pair(SK_S)).unwrap();
    }

    for seq in 0..3u64 {
        let aad = format!("Count-{seq}");
        let (enc, ct) = ctx_s.seal(&public(SK_R), INFO, aad.as_bytes(), PT).unwrap();

        assert_eq!(&enc[..], &expected.enc[..]);
        assert_eq!(ct, expected.seal(seq, aad.as_bytes(), PT), "seq {seq}");
    }

    for (exporter_context, len) in [(&b""[..], 32), (&b"TestContext"[..], 32), (&b"\x00"[..], 77)] {
        assert_eq!(
            &ctx_s.export(exporter_context, len).unwrap()[..],
            &expected.export(exporter_context, len)[..]
        );
    }
}

#[test_case::test_case(HpkeMode::Base; "base")]
#[test_case::test_case(HpkeMode::Psk; "psk")]
#[test_case::test_case(HpkeMode::Auth; "auth")]
#[test_case::test_case(HpkeMode::AuthPsk; "auth psk")]
fn test_recipient_matches_reference(mode: HpkeMode) {
    let (psk, psk_id) = psk_material(mode);
    let expected = Expected::compute(mode, &psk, psk_id);

    let mut ctx_r = HpkeContext::<_, Recipient>::new(mode, Suite::DEFAULT, backend()).unwrap();
    if mode.uses_psk() {
        ctx_r.set_psk(psk_id, &psk).unwrap();
    }
    if mode.is_auth() {
        ctx_r.set_auth_pub(&public(SK_S)).unwrap();
    }

    let sk_r = key_pair(SK_R);

    // skipping ahead through set_seq
    ctx_r.set_seq(1).unwrap();
    let ct = expected.seal(1, b"Count-1", PT);
    assert_eq!(
        ctx_r.open(&expected.enc, &sk_r, INFO, b"Count-1", &ct).unwrap(),
        PT
    );

    assert_eq!(
        &ctx_r.export(b"TestContext", 32).unwrap()[..],
        &expected.export(b"TestContext", 32)[..]
    );
}
