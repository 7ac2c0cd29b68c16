#![doc = include_str!("../README.md")]
#![no_std]
#![forbid(unsafe_code, unused_must_use, unstable_features)]
#![deny(
    trivial_casts,
    trivial_numeric_casts,
    missing_docs,
    unused_import_braces,
    unused_extern_crates,
    unused_qualifications
)]

mod aead;
#[cfg(feature = "_backend")]
pub mod backend;
mod id;
pub mod kdf;
mod keys;

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use alloc::vec::Vec;
use core::fmt;

use zeroize::Zeroizing;

pub use crate::aead::HpkeAead;
pub use crate::id::{HpkeAeadId, HpkeKdfId, HpkeKemId, UnknownIdentifier};
pub use crate::keys::{
    EncapsulatedSecret, HpkeKeyPair, HpkePrivateKey, HpkePrivateKeyRef, HpkePublicKey,
    HpkePublicKeyRef, Okm, Prk, SharedSecret,
};

/// The primitives provider behind an HPKE context.
///
/// It owns the random source and does the DH, KDF and AEAD work for whatever
/// algorithms it reports as supported. Everything above the primitives, the
/// labeled derivations included, lives outside it.
pub trait Crypto: fmt::Debug + Send + Sync {
    /// Fills `buf` from the provider's random source.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InsufficientRandomness`] if the source fails.
    fn secure_random_fill(&mut self, buf: &mut [u8]) -> Result<(), CryptoError>;

    /// Whether `alg` can be used with this provider.
    fn is_kem_supported(&self, alg: &HpkeKemId) -> bool;

    /// `GenerateKeyPair()`, [RFC 9180, Section 4].
    ///
    /// # Errors
    ///
    /// [`CryptoError::KemUnsupported`] for a KEM the provider lacks.
    ///
    /// [RFC 9180, Section 4]: https://www.rfc-editor.org/rfc/rfc9180.html#section-4
    fn kem_generate_key_pair(&mut self, alg: HpkeKemId) -> Result<HpkeKeyPair, CryptoError>;

    /// Whether `alg` can be used with this provider.
    fn is_kdf_supported(&self, alg: &HpkeKdfId) -> bool;

    /// `Extract(salt, ikm)`, returning `Nh` bytes.
    ///
    /// # Errors
    ///
    /// Provider specific.
    fn kdf_extract(&self, alg: HpkeKdfId, salt: &[u8], ikm: &[u8]) -> Result<Prk, CryptoError>;

    /// `Extract(salt, concat(ikms...))`.
    ///
    /// The default joins `ikms` in a zeroizing buffer first.
    ///
    /// # Errors
    ///
    /// As for [`kdf_extract`](Crypto::kdf_extract).
    fn kdf_extract_concated(
        &self,
        alg: HpkeKdfId,
        salt: &[u8],
        ikms: &[&[u8]],
    ) -> Result<Prk, CryptoError> {
        self.kdf_extract(alg, salt, &Zeroizing::new(ikms.concat()))
    }

    /// `Expand(prk, info, L)`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::KdfExpandInvalidPrkLen`] for a `prk` shorter than `Nh`,
    /// [`CryptoError::KdfExpandInvalidOutputLen`] for `L > 255 * Nh`.
    fn kdf_expand(
        &self,
        alg: HpkeKdfId,
        prk: &[u8],
        info: &[u8],
        l: usize,
    ) -> Result<Okm, CryptoError>;

    /// `Expand(prk, concat(infos...), L)`.
    ///
    /// # Errors
    ///
    /// As for [`kdf_expand`](Crypto::kdf_expand).
    fn kdf_expand_multi_info(
        &self,
        alg: HpkeKdfId,
        prk: &[u8],
        infos: &[&[u8]],
        l: usize,
    ) -> Result<Okm, CryptoError> {
        self.kdf_expand(alg, prk, &infos.concat(), l)
    }

    /// Whether `alg` can be used with this provider.
    fn is_aead_supported(&self, alg: &HpkeAeadId) -> bool;

    /// `Seal(key, nonce, aad, pt)` over `buffer`, which ends up holding the
    /// ciphertext with the tag appended.
    ///
    /// # Errors
    ///
    /// [`CryptoError::AeadSeal`] or [`CryptoError::AeadUnsupported`].
    fn aead_seal_in_place(
        &self,
        crypto_info: &HpkeAead,
        aad: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<(), CryptoError>;

    /// `Open(key, nonce, aad, ct)` over `buffer`, which ends up holding the
    /// plaintext. Its contents are unspecified after a failure.
    ///
    /// # Errors
    ///
    /// [`CryptoError::AeadInvalidCt`] if `buffer` is shorter than a tag,
    /// [`CryptoError::AeadOpen`] if authentication fails.
    fn aead_open_in_place(
        &self,
        crypto_info: &HpkeAead,
        aad: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<(), CryptoError>;

    /// Accepts `sk` as a private key of `alg` if it is a valid scalar.
    ///
    /// # Errors
    ///
    /// [`CryptoError::KemMalformedSkX`] otherwise.
    fn sk(&self, alg: HpkeKemId, sk: &[u8]) -> Result<HpkePrivateKey, CryptoError>;

    /// `pk(skX)`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::KemMalformedSkX`] for an invalid scalar.
    fn pk(&self, alg: HpkeKemId, sk: HpkePrivateKeyRef<'_>) -> Result<HpkePublicKey, CryptoError>;

    /// `DH(skX, pkY)`, [RFC 9180, Section 4.1], producing `Ndh` bytes.
    ///
    /// # Errors
    ///
    /// [`CryptoError::KemMalformedPkX`] for a peer key that fails validation,
    /// [`CryptoError::KemNonContributory`] for an all-zero output.
    ///
    /// [RFC 9180, Section 4.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-4.1
    fn dh(
        &self,
        alg: HpkeKemId,
        sk_x: HpkePrivateKeyRef<'_>,
        pk_y: HpkePublicKeyRef<'_>,
    ) -> Result<SharedSecret, CryptoError>;
}

/// Failures reported by a [`Crypto`] provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    /// `Expand` got a PRK shorter than `Nh`.
    #[error("KDF expand: invalid PRK length")]
    KdfExpandInvalidPrkLen,

    /// `Expand` was asked for more than `255 * Nh` bytes, or for more than a
    /// two byte length prefix can describe.
    #[error("KDF expand: invalid output length")]
    KdfExpandInvalidOutputLen,

    /// Not a valid private key for the KEM.
    #[error("KEM malformed private key")]
    KemMalformedSkX,

    /// Not a valid public key for the KEM.
    #[error("KEM malformed public key")]
    KemMalformedPkX,

    /// The DH output was all zeros.
    #[error("KEM non-contributory DH output")]
    KemNonContributory,

    /// The provider does not implement the KEM.
    #[error("KEM unsupported")]
    KemUnsupported,

    /// Key length does not match `Nk`.
    #[error("AEAD invalid key")]
    AeadInvalidKey,

    /// Nonce length does not match `Nn`.
    #[error("AEAD invalid nonce")]
    AeadInvalidNonce,

    /// Ciphertext shorter than `Nt`.
    #[error("AEAD invalid cipher text")]
    AeadInvalidCt,

    /// Sealing failed.
    #[error("AEAD seal error")]
    AeadSeal,

    /// Authentication failed on open.
    #[error("AEAD open error")]
    AeadOpen,

    /// The provider does not implement the AEAD.
    #[error("AEAD unsupported")]
    AeadUnsupported,

    /// The random source failed.
    #[error("insufficient randomness")]
    InsufficientRandomness,
}
