//! Key encapsulation adapter: DH-based KEM functions for HPKE as defined in
//! [RFC 9180, section 4.1].
//!
//! The primitives provider only exposes `DH`, `pk` and the KDF; this module
//! composes them into `Encap`/`Decap` and their authenticated variants, and
//! into deterministic key pair derivation.
//!
//! [RFC 9180, section 4.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-4.1

use alloc::vec::Vec;

use hpke_engine_crypto::{
    Crypto, CryptoError, EncapsulatedSecret, HpkeKemId, HpkeKeyPair, HpkePublicKey,
    HpkePublicKeyRef, SharedSecret, kdf,
};

use crate::error::Error;
use crate::suite::Suite;

/// `GenerateKeyPair()`: Randomized algorithm to generate a key pair (skX, pkX).
///
/// Delegates to the primitives provider's own key generation.
///
/// # Errors
///
/// [`Error::UnsupportedSuite`] if the provider lacks the KEM,
/// [`Error::KeyGen`] if the provider fails to generate a key pair.
pub fn generate_key_pair<C: Crypto + ?Sized>(
    crypto_backend: &mut C,
    alg: HpkeKemId,
) -> Result<HpkeKeyPair, Error> {
    if !crypto_backend.is_kem_supported(&alg) {
        return Err(Error::UnsupportedSuite);
    }

    crypto_backend
        .kem_generate_key_pair(alg)
        .map_err(|e| match e {
            CryptoError::KemUnsupported => Error::UnsupportedSuite,
            _ => Error::KeyGen,
        })
}

/// `DeriveKeyPair(ikm)`: Deterministic algorithm to derive a key pair (skX,
/// pkX) from the byte string `ikm`.
///
/// For P-256, P-384, and P-521 this performs rejection sampling over field
/// elements:
///
/// ```text
/// def DeriveKeyPair(ikm):
///   dkp_prk = LabeledExtract("", "dkp_prk", ikm)
///   sk = 0
///   counter = 0
///   while sk == 0 or sk >= order:
///     if counter > 255:
///       raise DeriveKeyPairError
///     bytes = LabeledExpand(dkp_prk, "candidate",
///                           I2OSP(counter, 1), Nsk)
///     bytes[0] = bytes[0] & bitmask
///     sk = OS2IP(bytes)
///     counter = counter + 1
///   return (sk, pk(sk))
/// ```
///
/// For X25519 and X448 the KDF output is the private key:
///
/// ```text
/// def DeriveKeyPair(ikm):
///   dkp_prk = LabeledExtract("", "dkp_prk", ikm)
///   sk = LabeledExpand(dkp_prk, "sk", "", Nsk)
///   return (sk, pk(sk))
/// ```
///
/// See [RFC 9180, Section 7.1.3] for details.
///
/// # Errors
///
/// [`Error::UnsupportedSuite`] if the provider lacks the KEM,
/// [`Error::KeyGen`] if no valid private key could be derived.
///
/// [RFC 9180, Section 7.1.3]: https://www.rfc-editor.org/rfc/rfc9180.html#section-7.1.3
pub fn derive_key_pair<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    ikm: &[u8],
) -> Result<HpkeKeyPair, Error> {
    if !crypto_backend.is_kem_supported(&alg) {
        return Err(Error::UnsupportedSuite);
    }

    let dkp_prk = kdf::labeled_extract(
        crypto_backend,
        alg.kdf_id(),
        &alg.suite_id(),
        &[],
        "dkp_prk",
        ikm,
    )
    .map_err(|_| Error::KeyGen)?;

    let sk = match alg {
        HpkeKemId::DHKEM_X25519_HKDF_SHA256 | HpkeKemId::DHKEM_X448_HKDF_SHA512 => {
            let sk = kdf::labeled_expand(
                crypto_backend,
                alg.kdf_id(),
                &alg.suite_id(),
                &dkp_prk,
                "sk",
                &[],
                alg.n_sk(),
            )
            .map_err(|_| Error::KeyGen)?;

            crypto_backend
                .sk(alg, &sk)
                .map_err(|_| Error::KeyGen)?
        }
        HpkeKemId::DHKEM_P256_HKDF_SHA256
        | HpkeKemId::DHKEM_P384_HKDF_SHA384
        | HpkeKemId::DHKEM_P521_HKDF_SHA512 => {
            // P-521 private keys are 66 bytes for a 521 bit order.
            let bitmask = if alg == HpkeKemId::DHKEM_P521_HKDF_SHA512 {
                0x01
            } else {
                0xFF
            };

            let mut counter = 0u8;

            loop {
                let mut candidate = kdf::labeled_expand(
                    crypto_backend,
                    alg.kdf_id(),
                    &alg.suite_id(),
                    &dkp_prk,
                    "candidate",
                    &[counter],
                    alg.n_sk(),
                )
                .map_err(|_| Error::KeyGen)?
                .into_inner();

                candidate[0] &= bitmask;

                // the provider rejects zero and values not below the order
                match crypto_backend.sk(alg, &candidate) {
                    Ok(sk) => break sk,
                    Err(CryptoError::KemMalformedSkX) => {}
                    Err(_) => return Err(Error::KeyGen),
                }

                counter = counter.checked_add(1).ok_or(Error::KeyGen)?;
            }
        }
    };

    let pk = crypto_backend
        .pk(alg, (&sk).into())
        .map_err(|_| Error::KeyGen)?;

    Ok(HpkeKeyPair::from_parts(alg, sk, pk))
}

/// Generates a key pair for `suite`'s KEM, deterministically when `ikm` is
/// given.
///
/// # Errors
///
/// [`Error::UnsupportedSuite`] if the suite is unregistered or unsupported by
/// the provider, [`Error::KeyGen`] if `ikm` is shorter than `Nsk` or the
/// derivation fails.
pub fn keygen<C: Crypto + ?Sized>(
    crypto_backend: &mut C,
    suite: Suite,
    ikm: Option<&[u8]>,
) -> Result<HpkeKeyPair, Error> {
    suite.check()?;

    if !suite.is_supported_by(crypto_backend) {
        return Err(Error::UnsupportedSuite);
    }

    let key_pair = match ikm {
        Some(ikm) if ikm.len() < suite.kem_id.n_sk() => return Err(Error::KeyGen),
        Some(ikm) => derive_key_pair(crypto_backend, suite.kem_id, ikm)?,
        None => generate_key_pair(crypto_backend, suite.kem_id)?,
    };

    tracing::debug!(kem = %suite.kem_id, deterministic = ikm.is_some(), "generated key pair");

    Ok(key_pair)
}

/// `Encap(pkR)` or, with a sender key pair, `AuthEncap(pkR, skS)`.
///
/// ```text
/// def AuthEncap(pkR, skS):
///   skE, pkE = GenerateKeyPair()
///   dh = concat(DH(skE, pkR), DH(skS, pkR))
///   enc = SerializePublicKey(pkE)
///
///   pkRm = SerializePublicKey(pkR)
///   pkSm = SerializePublicKey(pk(skS))
///   kem_context = concat(enc, pkRm, pkSm)
///
///   shared_secret = ExtractAndExpand(dh, kem_context)
///   return shared_secret, enc
/// ```
///
/// The ephemeral key pair is supplied by the caller so that a context can
/// keep it for its whole lifetime.
///
/// # Errors
///
/// [`Error::ModeKeyMismatch`] if a key pair belongs to another KEM,
/// [`Error::InvalidInput`] if `pk_r` is malformed.
pub fn encap<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    pk_r: HpkePublicKeyRef<'_>,
    sk_e: &HpkeKeyPair,
    sk_s: Option<&HpkeKeyPair>,
) -> Result<(SharedSecret, EncapsulatedSecret), Error> {
    if sk_e.kem_id() != alg || sk_s.is_some_and(|sk_s| sk_s.kem_id() != alg) {
        return Err(Error::ModeKeyMismatch("key pair belongs to another KEM"));
    }

    // pkR is deserialized by the provider; only its length is checked here.
    let pk_r = pk_r
        .to_public_key(alg)
        .map_err(|_| Error::InvalidInput("malformed recipient public key"))?;

    let dh_err = |e: CryptoError| match e {
        CryptoError::KemMalformedPkX | CryptoError::KemNonContributory => {
            Error::InvalidInput("malformed recipient public key")
        }
        e => Error::Crypto(e),
    };

    // dh = DH(skE, pkR), or concat(DH(skE, pkR), DH(skS, pkR))
    let dh_e = crypto_backend
        .dh(alg, sk_e.sk(), (&pk_r).into())
        .map_err(dh_err)?;
    let dh = match sk_s {
        Some(sk_s) => {
            let dh_s = crypto_backend
                .dh(alg, sk_s.sk(), (&pk_r).into())
                .map_err(dh_err)?;

            SharedSecret::concat(&[&dh_e, &dh_s])
        }
        None => dh_e,
    };

    // enc = SerializePublicKey(pkE)
    let enc = EncapsulatedSecret::from_pk_e(sk_e.public_key());

    // kem_context = concat(enc, pkRm) or concat(enc, pkRm, pkSm)
    let mut kem_context = Vec::with_capacity(3 * alg.n_pk());
    kem_context.extend_from_slice(&enc);
    kem_context.extend_from_slice(&pk_r);
    if let Some(sk_s) = sk_s {
        kem_context.extend_from_slice(&sk_s.pk());
    }

    // shared_secret = ExtractAndExpand(dh, kem_context)
    let shared_secret = extract_and_expand(crypto_backend, alg, &dh, &kem_context)?;

    tracing::debug!(kem = %alg, auth = sk_s.is_some(), "encapsulated");

    Ok((shared_secret, enc))
}

/// `Decap(enc, skR)` or, with a sender public key, `AuthDecap(enc, skR, pkS)`.
///
/// ```text
/// def AuthDecap(enc, skR, pkS):
///   pkE = DeserializePublicKey(enc)
///   dh = concat(DH(skR, pkE), DH(skR, pkS))
///
///   pkRm = SerializePublicKey(pk(skR))
///   pkSm = SerializePublicKey(pkS)
///   kem_context = concat(enc, pkRm, pkSm)
///
///   shared_secret = ExtractAndExpand(dh, kem_context)
///   return shared_secret
/// ```
///
/// # Errors
///
/// [`Error::Decap`] for any malformed input: wrong `enc` length, an invalid
/// point, or an all-zero DH output. The error does not say which.
pub fn decap<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    enc: &[u8],
    sk_r: &HpkeKeyPair,
    pk_s: Option<HpkePublicKeyRef<'_>>,
) -> Result<SharedSecret, Error> {
    if sk_r.kem_id() != alg {
        return Err(Error::ModeKeyMismatch("key pair belongs to another KEM"));
    }

    if enc.len() != alg.n_enc() || pk_s.is_some_and(|pk_s| pk_s.len() != alg.n_pk()) {
        return Err(Error::Decap);
    }

    // pkE = DeserializePublicKey(enc)
    let pk_e = HpkePublicKey::new(alg, enc).map_err(|_| Error::Decap)?;

    // dh = DH(skR, pkE), or concat(DH(skR, pkE), DH(skR, pkS))
    let dh_e = crypto_backend
        .dh(alg, sk_r.sk(), (&pk_e).into())
        .map_err(|_| Error::Decap)?;
    let dh = match pk_s {
        Some(pk_s) => {
            let dh_s = crypto_backend
                .dh(alg, sk_r.sk(), pk_s)
                .map_err(|_| Error::Decap)?;

            SharedSecret::concat(&[&dh_e, &dh_s])
        }
        None => dh_e,
    };

    // kem_context = concat(enc, pkRm) or concat(enc, pkRm, pkSm)
    let mut kem_context = Vec::with_capacity(3 * alg.n_pk());
    kem_context.extend_from_slice(enc);
    kem_context.extend_from_slice(&sk_r.pk());
    if let Some(pk_s) = pk_s {
        kem_context.extend_from_slice(&pk_s);
    }

    let shared_secret =
        extract_and_expand(crypto_backend, alg, &dh, &kem_context).map_err(|_| Error::Decap)?;

    tracing::debug!(kem = %alg, auth = pk_s.is_some(), "decapsulated");

    Ok(shared_secret)
}

/// ```text
/// def ExtractAndExpand(dh, kem_context):
///   eae_prk = LabeledExtract("", "eae_prk", dh)
///   shared_secret = LabeledExpand(eae_prk, "shared_secret",
///                                 kem_context, Nsecret)
///   return shared_secret
/// ```
fn extract_and_expand<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    dh: &[u8],
    kem_context: &[u8],
) -> Result<SharedSecret, Error> {
    let suite_id = alg.suite_id();

    let eae_prk = kdf::labeled_extract(
        crypto_backend,
        alg.kdf_id(),
        &suite_id,
        &[],
        "eae_prk",
        dh,
    )?;

    let okm = kdf::labeled_expand(
        crypto_backend,
        alg.kdf_id(),
        &suite_id,
        &eae_prk,
        "shared_secret",
        kem_context,
        alg.n_secret(),
    )?;

    Ok(SharedSecret::from_okm(okm))
}
