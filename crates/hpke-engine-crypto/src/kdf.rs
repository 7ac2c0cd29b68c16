//! Labeled KDF helpers shared by the KEM and the key schedule.
//!
//! Every HPKE derivation binds the protocol version, the suite and a purpose
//! label into the KDF input, so the same secret never yields the same output
//! for two different purposes.

use crate::{Crypto, CryptoError, HpkeKdfId, Okm, Prk};

/// The version label prepended to every labeled KDF input.
pub const HPKE_VERSION: &[u8] = b"HPKE-v1";

/// `LabeledExtract(salt, label, ikm)`.
///
/// ```text
/// def LabeledExtract(salt, label, ikm):
///   labeled_ikm = concat("HPKE-v1", suite_id, label, ikm)
///   return Extract(salt, labeled_ikm)
/// ```
///
/// See [RFC 9180, Section 4] for details.
///
/// # Errors
///
/// See [`CryptoError`] for possible error conditions.
///
/// [RFC 9180, Section 4]: https://www.rfc-editor.org/rfc/rfc9180.html#section-4
pub fn labeled_extract<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKdfId,
    suite_id: &[u8],
    salt: &[u8],
    label: &str,
    ikm: &[u8],
) -> Result<Prk, CryptoError> {
    crypto_backend.kdf_extract_concated(
        alg,
        salt,
        &[HPKE_VERSION, suite_id, label.as_bytes(), ikm],
    )
}

/// `LabeledExpand(prk, label, info, L)`.
///
/// ```text
/// def LabeledExpand(prk, label, info, L):
///   labeled_info = concat(I2OSP(L, 2), "HPKE-v1", suite_id, label, info)
///   return Expand(prk, labeled_info, L)
/// ```
///
/// See [RFC 9180, Section 4] for details.
///
/// # Errors
///
/// [`CryptoError::KdfExpandInvalidOutputLen`] if `len` does not fit the two
/// byte length prefix, otherwise whatever the backend's `Expand` reports.
///
/// [RFC 9180, Section 4]: https://www.rfc-editor.org/rfc/rfc9180.html#section-4
pub fn labeled_expand<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKdfId,
    suite_id: &[u8],
    prk: &[u8],
    label: &str,
    info: &[u8],
    len: usize,
) -> Result<Okm, CryptoError> {
    let len_prefix = u16::try_from(len)
        .map_err(|_| CryptoError::KdfExpandInvalidOutputLen)?
        .to_be_bytes();

    crypto_backend.kdf_expand_multi_info(
        alg,
        prk,
        &[&len_prefix[..], HPKE_VERSION, suite_id, label.as_bytes(), info],
        len,
    )
}
