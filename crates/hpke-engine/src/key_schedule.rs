//! The HPKE key schedule ([RFC 9180, Section 5.1]) and secret export
//! ([RFC 9180, Section 5.3]).
//!
//! [RFC 9180, Section 5.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.1
//! [RFC 9180, Section 5.3]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.3

use alloc::vec::Vec;
use core::fmt;

use hpke_engine_crypto::{Crypto, CryptoError, HpkeAead, Okm, Prk, SharedSecret, kdf};

use crate::HpkeMode;
use crate::error::Error;
use crate::suite::Suite;

/// Minimum PSK length in bytes, see [RFC 9180, Section 9.5].
///
/// [RFC 9180, Section 9.5]: https://www.rfc-editor.org/rfc/rfc9180.html#section-9.5
pub const MIN_PSK_LEN: usize = 32;

/// The symmetric state derived from a KEM shared secret.
///
/// `aead` is `None` for export-only suites. Every field is zeroized on drop.
pub struct KeySchedule {
    aead: Option<HpkeAead>,
    exporter_secret: Okm,
}

impl fmt::Debug for KeySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySchedule")
            .field("aead", &self.aead)
            .finish_non_exhaustive()
    }
}

impl KeySchedule {
    /// ```text
    /// def KeySchedule<ROLE>(mode, shared_secret, info, psk, psk_id):
    ///   VerifyPSKInputs(mode, psk, psk_id)
    ///
    ///   psk_id_hash = LabeledExtract("", "psk_id_hash", psk_id)
    ///   info_hash = LabeledExtract("", "info_hash", info)
    ///   key_schedule_context = concat(mode, psk_id_hash, info_hash)
    ///
    ///   secret = LabeledExtract(shared_secret, "secret", psk)
    ///
    ///   key = LabeledExpand(secret, "key", key_schedule_context, Nk)
    ///   base_nonce = LabeledExpand(secret, "base_nonce",
    ///                              key_schedule_context, Nn)
    ///   exporter_secret = LabeledExpand(secret, "exp",
    ///                                   key_schedule_context, Nh)
    /// ```
    ///
    /// `psk` is `(psk_id, psk)`.
    ///
    /// # Errors
    ///
    /// [`Error::ModeKeyMismatch`] or [`Error::InsecurePsk`] from the PSK
    /// checks, otherwise errors from the primitives provider.
    pub fn derive<C: Crypto + ?Sized>(
        crypto_backend: &C,
        mode: HpkeMode,
        suite: Suite,
        shared_secret: &SharedSecret,
        info: &[u8],
        psk: Option<(&[u8], &[u8])>,
    ) -> Result<Self, Error> {
        let (psk_id, psk) = psk.unwrap_or_default();

        verify_psk_inputs(mode, psk, psk_id)?;

        let key_schedule_context = key_schedule_context(crypto_backend, mode, suite, info, psk_id)?;

        // secret = LabeledExtract(shared_secret, "secret", psk)
        let secret = kdf::labeled_extract(
            crypto_backend,
            suite.kdf_id,
            &suite.suite_id(),
            shared_secret,
            "secret",
            psk,
        )?;

        let aead = if suite.is_export_only() {
            None
        } else {
            // key = LabeledExpand(secret, "key", key_schedule_context, Nk)
            let key = expand(
                crypto_backend,
                suite,
                &secret,
                "key",
                &key_schedule_context,
                suite.aead_id.n_key(),
            )?;

            // base_nonce = LabeledExpand(secret, "base_nonce", key_schedule_context, Nn)
            let base_nonce = expand(
                crypto_backend,
                suite,
                &secret,
                "base_nonce",
                &key_schedule_context,
                suite.aead_id.n_nonce(),
            )?;

            HpkeAead::new(suite.aead_id, &key, &base_nonce)?
        };

        // exporter_secret = LabeledExpand(secret, "exp", key_schedule_context, Nh)
        let exporter_secret = expand(
            crypto_backend,
            suite,
            &secret,
            "exp",
            &key_schedule_context,
            suite.kdf_id.n_hash(),
        )?;

        tracing::debug!(%suite, %mode, export_only = aead.is_none(), "key schedule derived");

        Ok(Self {
            aead,
            exporter_secret,
        })
    }

    #[inline]
    /// The AEAD key and base nonce, `None` for export-only suites.
    pub const fn aead(&self) -> Option<&HpkeAead> {
        self.aead.as_ref()
    }

    /// ```text
    /// def Context.Export(exporter_context, L):
    ///   return LabeledExpand(self.exporter_secret, "sec", exporter_context, L)
    /// ```
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if `len` exceeds `255 * Nh`.
    pub fn export<C: Crypto + ?Sized>(
        &self,
        crypto_backend: &C,
        suite: Suite,
        exporter_context: &[u8],
        len: usize,
    ) -> Result<Okm, Error> {
        expand(
            crypto_backend,
            suite,
            &self.exporter_secret,
            "sec",
            exporter_context,
            len,
        )
        .map_err(|e| match e {
            Error::Crypto(CryptoError::KdfExpandInvalidOutputLen) => {
                Error::InvalidInput("export length exceeds 255 * Nh")
            }
            e => e,
        })
    }
}

/// ```text
/// def VerifyPSKInputs(mode, psk, psk_id):
///   got_psk = (psk != default_psk)
///   got_psk_id = (psk_id != default_psk_id)
///   if got_psk != got_psk_id:
///     raise Exception("Inconsistent PSK inputs")
///
///   if got_psk and (mode in [mode_base, mode_auth]):
///     raise Exception("PSK input provided when not needed")
///   if (not got_psk) and (mode in [mode_psk, mode_auth_psk]):
///     raise Exception("Missing required PSK input")
/// ```
///
/// Also rejects PSKs shorter than [`MIN_PSK_LEN`].
pub(crate) const fn verify_psk_inputs(mode: HpkeMode, psk: &[u8], psk_id: &[u8]) -> Result<(), Error> {
    let got_psk = !psk.is_empty();
    let got_psk_id = !psk_id.is_empty();

    if got_psk != got_psk_id {
        return Err(Error::ModeKeyMismatch("psk and psk_id must be given together"));
    }

    if got_psk && !mode.uses_psk() {
        return Err(Error::ModeKeyMismatch("PSK given to a mode without PSK"));
    }

    if !got_psk && mode.uses_psk() {
        return Err(Error::ModeKeyMismatch("PSK mode requires a PSK"));
    }

    if got_psk && psk.len() < MIN_PSK_LEN {
        return Err(Error::InsecurePsk);
    }

    Ok(())
}

/// `key_schedule_context = concat(mode, psk_id_hash, info_hash)`
fn key_schedule_context<C: Crypto + ?Sized>(
    crypto_backend: &C,
    mode: HpkeMode,
    suite: Suite,
    info: &[u8],
    psk_id: &[u8],
) -> Result<Vec<u8>, Error> {
    let suite_id = suite.suite_id();

    // psk_id_hash = LabeledExtract("", "psk_id_hash", psk_id)
    let psk_id_hash: Prk = kdf::labeled_extract(
        crypto_backend,
        suite.kdf_id,
        &suite_id,
        &[],
        "psk_id_hash",
        psk_id,
    )?;

    // info_hash = LabeledExtract("", "info_hash", info)
    let info_hash = kdf::labeled_extract(
        crypto_backend,
        suite.kdf_id,
        &suite_id,
        &[],
        "info_hash",
        info,
    )?;

    Ok([&[mode as u8][..], &*psk_id_hash, &*info_hash].concat())
}

fn expand<C: Crypto + ?Sized>(
    crypto_backend: &C,
    suite: Suite,
    prk: &[u8],
    label: &str,
    info: &[u8],
    len: usize,
) -> Result<Okm, Error> {
    kdf::labeled_expand(
        crypto_backend,
        suite.kdf_id,
        &suite.suite_id(),
        prk,
        label,
        info,
        len,
    )
    .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use hpke_engine_crypto::backend::HpkeCryptoRustCrypto;
    use hpke_engine_crypto::{HpkeAeadId, HpkeKdfId, HpkeKemId};

    use super::*;

    const PSK: [u8; 32] = [0x5a; 32];
    const PSK_ID: &[u8] = b"Ennyn Durin aran Moria";

    fn shared_secret() -> SharedSecret {
        SharedSecret::new(&[0x11; 32])
    }

    #[test_case::test_case(HpkeMode::Base, None; "base")]
    #[test_case::test_case(HpkeMode::Psk, Some((PSK_ID, &PSK[..])); "psk")]
    #[test_case::test_case(HpkeMode::Auth, None; "auth")]
    #[test_case::test_case(HpkeMode::AuthPsk, Some((PSK_ID, &PSK[..])); "auth psk")]
    fn test_derive_lengths(mode: HpkeMode, psk: Option<(&[u8], &[u8])>) {
        let backend = HpkeCryptoRustCrypto::from_seed([0; 32]);

        for suite in Suite::SUPPORTED
            .iter()
            .filter(|s| s.kem_id == HpkeKemId::DHKEM_X25519_HKDF_SHA256)
        {
            let ks = KeySchedule::derive(&backend, mode, *suite, &shared_secret(), b"info", psk)
                .unwrap();

            match ks.aead() {
                Some(aead) => {
                    assert_eq!(aead.aead_id(), suite.aead_id);
                    assert_eq!(aead.key().len(), suite.aead_id.n_key());
                    assert_eq!(aead.nonce().len(), suite.aead_id.n_nonce());
                }
                None => assert_eq!(suite.aead_id, HpkeAeadId::EXPORT_ONLY),
            }

            let exported = ks.export(&backend, *suite, b"ctx", 17).unwrap();
            assert_eq!(exported.len(), 17);
        }
    }

    #[test]
    fn test_psk_inputs() {
        assert!(verify_psk_inputs(HpkeMode::Base, &[], &[]).is_ok());
        assert!(verify_psk_inputs(HpkeMode::Psk, &PSK, PSK_ID).is_ok());

        assert!(matches!(
            verify_psk_inputs(HpkeMode::Base, &PSK, PSK_ID),
            Err(Error::ModeKeyMismatch(_))
        ));
        assert!(matches!(
            verify_psk_inputs(HpkeMode::AuthPsk, &[], &[]),
            Err(Error::ModeKeyMismatch(_))
        ));
        assert!(matches!(
            verify_psk_inputs(HpkeMode::Psk, &PSK, &[]),
            Err(Error::ModeKeyMismatch(_))
        ));
        assert!(matches!(
            verify_psk_inputs(HpkeMode::Psk, &PSK[..31], PSK_ID),
            Err(Error::InsecurePsk)
        ));
    }

    #[test]
    fn test_inputs_separate_outputs() {
        let backend = HpkeCryptoRustCrypto::from_seed([0; 32]);
        let suite = Suite::DEFAULT;

        let base = KeySchedule::derive(&backend, HpkeMode::Base, suite, &shared_secret(), b"info", None)
            .unwrap();
        let other_info =
            KeySchedule::derive(&backend, HpkeMode::Base, suite, &shared_secret(), b"info2", None)
                .unwrap();
        let other_mode =
            KeySchedule::derive(&backend, HpkeMode::Auth, suite, &shared_secret(), b"info", None)
                .unwrap();
        let again = KeySchedule::derive(&backend, HpkeMode::Base, suite, &shared_secret(), b"info", None)
            .unwrap();

        let key = |ks: &KeySchedule| ks.aead().unwrap().key().to_vec();

        assert_eq!(key(&base), key(&again));
        assert_ne!(key(&base), key(&other_info));
        assert_ne!(key(&base), key(&other_mode));
    }

    #[test]
    fn test_export_length_limit() {
        let backend = HpkeCryptoRustCrypto::from_seed([0; 32]);
        let suite = Suite::new(
            HpkeKemId::DHKEM_X25519_HKDF_SHA256,
            HpkeKdfId::HKDF_SHA256,
            HpkeAeadId::EXPORT_ONLY,
        );

        let ks = KeySchedule::derive(&backend, HpkeMode::Base, suite, &shared_secret(), b"", None)
            .unwrap();

        assert!(ks.export(&backend, suite, b"", 255 * 32).is_ok());
        assert!(matches!(
            ks.export(&backend, suite, b"", 255 * 32 + 1),
            Err(Error::InvalidInput(_))
        ));
    }
}
