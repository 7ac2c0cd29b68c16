//! [`Crypto`] primitives implementation using crates from RustCrypto.
//!
//! Requires the `backend-rustcrypto` feature.
//!
//! # Supported
//!
//! | KEM | Supported |
//! |:-:|:-:|
//! | DHKEM_P256_HKDF_SHA256 | ✅ |
//! | DHKEM_P384_HKDF_SHA384 | ✅ |
//! | DHKEM_P521_HKDF_SHA512 | ✅ |
//! | DHKEM_X25519_HKDF_SHA256 | ✅ |
//! | DHKEM_X448_HKDF_SHA512 | ❌ |
//!
//! | KDF | Supported |
//! |:-:|:-:|
//! | HKDF_SHA256 | ✅ |
//! | HKDF_SHA384 | ✅ |
//! | HKDF_SHA512 | ✅ |
//!
//! | AEAD | Supported |
//! |:-:|:-:|
//! | AES_128_GCM | ✅ |
//! | AES_256_GCM | ✅ |
//! | CHACHA20_POLY1305 | ✅ |
//! | EXPORT_ONLY | ✅ |
//!
//! - ✅: Fully supported
//! - ❌: Not supported

use alloc::vec::Vec;

use rand_chacha::ChaCha20Rng;
use rand_core::{OsRng, RngCore, SeedableRng};

use crate::{
    Crypto, CryptoError, HpkeAead, HpkeAeadId, HpkeKdfId, HpkeKemId, HpkeKeyPair, HpkePrivateKey,
    HpkePrivateKeyRef, HpkePublicKey, HpkePublicKeyRef, Okm, Prk, SharedSecret,
};

#[derive(Debug, Clone)]
/// See [module-level](self) documentation.
///
/// The random source is a ChaCha20 stream seeded once at construction. Each
/// HPKE context owns its own instance, so no state is shared between them.
pub struct HpkeCrypto {
    rng: ChaCha20Rng,
}

impl HpkeCrypto {
    /// Prepare a new `HpkeCrypto` instance seeded from the operating system.
    ///
    /// # Errors
    ///
    /// This function returns an error if the operating system's random number
    /// generator is not available.
    pub fn new() -> Result<Self, CryptoError> {
        Ok(Self {
            rng: ChaCha20Rng::from_rng(OsRng).map_err(|_| CryptoError::InsufficientRandomness)?,
        })
    }

    /// Prepare a new `HpkeCrypto` instance with a fixed seed.
    ///
    /// Every key and nonce drawn from the instance is then reproducible, which
    /// is only ever wanted in tests.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(seed),
        }
    }
}

macro_rules! fixed {
    ($bytes:expr, $err:expr) => {
        TryInto::<[u8; 32]>::try_into($bytes).map_err(|_| $err)?
    };
}

impl Crypto for HpkeCrypto {
    fn secure_random_fill(&mut self, buf: &mut [u8]) -> Result<(), CryptoError> {
        self.rng
            .try_fill_bytes(buf)
            .map_err(|_| CryptoError::InsufficientRandomness)
    }

    fn is_kem_supported(&self, alg: &HpkeKemId) -> bool {
        matches!(
            alg,
            HpkeKemId::DHKEM_P256_HKDF_SHA256
                | HpkeKemId::DHKEM_P384_HKDF_SHA384
                | HpkeKemId::DHKEM_P521_HKDF_SHA512
                | HpkeKemId::DHKEM_X25519_HKDF_SHA256
        )
    }

    fn kem_generate_key_pair(&mut self, alg: HpkeKemId) -> Result<HpkeKeyPair, CryptoError> {
        macro_rules! kem_generate_key_pair {
            ($i:ident) => {{
                use elliptic_curve::sec1::ToEncodedPoint as _;

                let sk = $i::SecretKey::random(&mut self.rng);

                HpkeKeyPair::new_unchecked(
                    alg,
                    sk.to_bytes(),
                    sk.public_key().to_encoded_point(false),
                )
            }};
        }

        match alg {
            HpkeKemId::DHKEM_P256_HKDF_SHA256 => kem_generate_key_pair!(p256),
            HpkeKemId::DHKEM_P384_HKDF_SHA384 => kem_generate_key_pair!(p384),
            HpkeKemId::DHKEM_P521_HKDF_SHA512 => kem_generate_key_pair!(p521),
            HpkeKemId::DHKEM_X25519_HKDF_SHA256 => {
                let sk = x25519_dalek::StaticSecret::random_from_rng(&mut self.rng);

                HpkeKeyPair::new_unchecked(
                    alg,
                    sk.as_bytes(),
                    x25519_dalek::PublicKey::from(&sk).as_bytes(),
                )
            }
            HpkeKemId::DHKEM_X448_HKDF_SHA512 => Err(CryptoError::KemUnsupported),
        }
    }

    fn is_kdf_supported(&self, alg: &HpkeKdfId) -> bool {
        matches!(
            alg,
            HpkeKdfId::HKDF_SHA256 | HpkeKdfId::HKDF_SHA384 | HpkeKdfId::HKDF_SHA512
        )
    }

    fn kdf_extract(&self, alg: HpkeKdfId, salt: &[u8], ikm: &[u8]) -> Result<Prk, CryptoError> {
        macro_rules! extract {
            ($hash:ty) => {{
                let (prk, _) = hkdf::Hkdf::<$hash>::extract(Some(salt), ikm);
                Ok(Prk::new(prk.as_slice()))
            }};
        }

        match alg {
            HpkeKdfId::HKDF_SHA256 => extract!(sha2::Sha256),
            HpkeKdfId::HKDF_SHA384 => extract!(sha2::Sha384),
            HpkeKdfId::HKDF_SHA512 => extract!(sha2::Sha512),
        }
    }

    fn kdf_expand(
        &self,
        alg: HpkeKdfId,
        prk: &[u8],
        info: &[u8],
        l: usize,
    ) -> Result<Okm, CryptoError> {
        self.kdf_expand_multi_info(alg, prk, &[info], l)
    }

    fn kdf_expand_multi_info(
        &self,
        alg: HpkeKdfId,
        prk: &[u8],
        infos: &[&[u8]],
        l: usize,
    ) -> Result<Okm, CryptoError> {
        macro_rules! expand {
            ($hash:ty) => {{
                let hkdf = hkdf::Hkdf::<$hash>::from_prk(prk)
                    .map_err(|_| CryptoError::KdfExpandInvalidPrkLen)?;
                let mut okm = Okm::zeroed(l);
                hkdf.expand_multi_info(infos, okm.buffer_mut())
                    .map_err(|_| CryptoError::KdfExpandInvalidOutputLen)?;
                Ok(okm)
            }};
        }

        match alg {
            HpkeKdfId::HKDF_SHA256 => expand!(sha2::Sha256),
            HpkeKdfId::HKDF_SHA384 => expand!(sha2::Sha384),
            HpkeKdfId::HKDF_SHA512 => expand!(sha2::Sha512),
        }
    }

    fn is_aead_supported(&self, alg: &HpkeAeadId) -> bool {
        matches!(
            alg,
            HpkeAeadId::AES_128_GCM
                | HpkeAeadId::AES_256_GCM
                | HpkeAeadId::CHACHA20_POLY1305
                | HpkeAeadId::EXPORT_ONLY
        )
    }

    fn aead_seal_in_place(
        &self,
        crypto_info: &HpkeAead,
        aad: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<(), CryptoError> {
        macro_rules! seal {
            ($c:ident, $alg:ident) => {{
                use aead::{AeadInPlace as _, KeyInit as _};

                $c::$alg::new_from_slice(crypto_info.key())
                    .map_err(|_| CryptoError::AeadInvalidKey)?
                    .encrypt_in_place($c::Nonce::from_slice(crypto_info.nonce()), aad, buffer)
                    .map_err(|_| CryptoError::AeadSeal)
            }};
        }

        match crypto_info.aead_id() {
            HpkeAeadId::AES_128_GCM => seal!(aes_gcm, Aes128Gcm),
            HpkeAeadId::AES_256_GCM => seal!(aes_gcm, Aes256Gcm),
            HpkeAeadId::CHACHA20_POLY1305 => seal!(chacha20poly1305, ChaCha20Poly1305),
            HpkeAeadId::EXPORT_ONLY => Err(CryptoError::AeadUnsupported),
        }
    }

    fn aead_open_in_place(
        &self,
        crypto_info: &HpkeAead,
        aad: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<(), CryptoError> {
        macro_rules! open {
            ($c:ident, $alg:ident) => {{
                use aead::{AeadInPlace as _, KeyInit as _};

                $c::$alg::new_from_slice(crypto_info.key())
                    .map_err(|_| CryptoError::AeadInvalidKey)?
                    .decrypt_in_place($c::Nonce::from_slice(crypto_info.nonce()), aad, buffer)
                    .map_err(|_| CryptoError::AeadOpen)
            }};
        }

        if buffer.len() < crypto_info.aead_id().n_tag() {
            return Err(CryptoError::AeadInvalidCt);
        }

        match crypto_info.aead_id() {
            HpkeAeadId::AES_128_GCM => open!(aes_gcm, Aes128Gcm),
            HpkeAeadId::AES_256_GCM => open!(aes_gcm, Aes256Gcm),
            HpkeAeadId::CHACHA20_POLY1305 => open!(chacha20poly1305, ChaCha20Poly1305),
            HpkeAeadId::EXPORT_ONLY => Err(CryptoError::AeadUnsupported),
        }
    }

    fn sk(&self, alg: HpkeKemId, sk: &[u8]) -> Result<HpkePrivateKey, CryptoError> {
        macro_rules! sk {
            ($i:ident) => {{
                if sk.len() != alg.n_sk() {
                    return Err(CryptoError::KemMalformedSkX);
                }

                let sk = $i::SecretKey::from_slice(sk).map_err(|_| CryptoError::KemMalformedSkX)?;

                HpkePrivateKey::new(alg, sk.to_bytes().as_slice())
            }};
        }

        match alg {
            HpkeKemId::DHKEM_P256_HKDF_SHA256 => sk!(p256),
            HpkeKemId::DHKEM_P384_HKDF_SHA384 => sk!(p384),
            HpkeKemId::DHKEM_P521_HKDF_SHA512 => sk!(p521),
            HpkeKemId::DHKEM_X25519_HKDF_SHA256 => HpkePrivateKey::new(alg, sk),
            HpkeKemId::DHKEM_X448_HKDF_SHA512 => Err(CryptoError::KemUnsupported),
        }
    }

    fn pk(&self, alg: HpkeKemId, sk: HpkePrivateKeyRef<'_>) -> Result<HpkePublicKey, CryptoError> {
        macro_rules! pk {
            ($i:ident) => {{
                use elliptic_curve::sec1::ToEncodedPoint as _;

                let sk = $i::SecretKey::from_slice(&sk).map_err(|_| CryptoError::KemMalformedSkX)?;

                HpkePublicKey::new(alg, sk.public_key().to_encoded_point(false).as_bytes())
            }};
        }

        match alg {
            HpkeKemId::DHKEM_P256_HKDF_SHA256 => pk!(p256),
            HpkeKemId::DHKEM_P384_HKDF_SHA384 => pk!(p384),
            HpkeKemId::DHKEM_P521_HKDF_SHA512 => pk!(p521),
            HpkeKemId::DHKEM_X25519_HKDF_SHA256 => {
                let sk = x25519_dalek::StaticSecret::from(fixed!(&*sk, CryptoError::KemMalformedSkX));

                HpkePublicKey::new(alg, x25519_dalek::PublicKey::from(&sk).as_bytes())
            }
            HpkeKemId::DHKEM_X448_HKDF_SHA512 => Err(CryptoError::KemUnsupported),
        }
    }

    fn dh(
        &self,
        alg: HpkeKemId,
        sk_x: HpkePrivateKeyRef<'_>,
        pk_y: HpkePublicKeyRef<'_>,
    ) -> Result<SharedSecret, CryptoError> {
        macro_rules! dh {
            ($c:ident) => {{
                let sk = $c::SecretKey::from_slice(&sk_x).map_err(|_| CryptoError::KemMalformedSkX)?;
                let pk = $c::PublicKey::from_sec1_bytes(&pk_y)
                    .map_err(|_| CryptoError::KemMalformedPkX)?;

                let shared_secret =
                    elliptic_curve::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());

                Ok(SharedSecret::new(shared_secret.raw_secret_bytes().as_slice()))
            }};
        }

        match alg {
            HpkeKemId::DHKEM_P256_HKDF_SHA256 => dh!(p256),
            HpkeKemId::DHKEM_P384_HKDF_SHA384 => dh!(p384),
            HpkeKemId::DHKEM_P521_HKDF_SHA512 => dh!(p521),
            HpkeKemId::DHKEM_X25519_HKDF_SHA256 => {
                let pk = x25519_dalek::PublicKey::from(fixed!(&*pk_y, CryptoError::KemMalformedPkX));
                let sk = x25519_dalek::StaticSecret::from(fixed!(&*sk_x, CryptoError::KemMalformedSkX));

                let shared_secret = sk.diffie_hellman(&pk);

                // Low-order peer points collapse to the all-zero output.
                if !shared_secret.was_contributory() {
                    return Err(CryptoError::KemNonContributory);
                }

                Ok(SharedSecret::new(shared_secret.as_bytes()))
            }
            HpkeKemId::DHKEM_X448_HKDF_SHA512 => Err(CryptoError::KemUnsupported),
        }
    }
}
