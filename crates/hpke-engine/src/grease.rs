//! GREASE: plausible-looking HPKE output for protocols that send a dummy
//! encapsulated key and ciphertext when no real one is available.

use alloc::vec;
use alloc::vec::Vec;

use hpke_engine_crypto::Crypto;

use crate::error::Error;
use crate::kem;
use crate::suite::Suite;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Random values shaped like the output of one `seal`.
pub struct Grease {
    /// The suite the values were shaped for.
    pub suite: Suite,

    /// `Npk` bytes standing in for the encapsulated key.
    pub pub_key: Vec<u8>,

    /// `clear_len + Nt` random bytes standing in for the ciphertext.
    pub cipher: Vec<u8>,
}

/// Produces GREASE values for `suite_in`, or for a uniformly chosen
/// registered suite that can seal when `suite_in` is `None`.
///
/// When the primitives provider supports the suite's KEM, `pub_key` is the
/// public half of a fresh key pair that is thrown away, so NIST curve
/// encodings are valid points. Otherwise it is random.
///
/// # Errors
///
/// Randomness or key generation failures of the primitives provider,
/// [`Error::InvalidInput`] if `clear_len + Nt` overflows.
pub fn good4grease<C: Crypto + ?Sized>(
    crypto_backend: &mut C,
    suite_in: Option<Suite>,
    clear_len: usize,
) -> Result<Grease, Error> {
    let suite = match suite_in {
        Some(suite) => suite,
        None => random_suite(crypto_backend)?,
    };

    let expansion = suite.expansion(clear_len)?;

    let pub_key = if crypto_backend.is_kem_supported(&suite.kem_id) {
        kem::generate_key_pair(crypto_backend, suite.kem_id)?
            .pk()
            .to_vec()
    } else {
        let mut pub_key = vec![0u8; suite.kem_id.n_pk()];
        crypto_backend.secure_random_fill(&mut pub_key)?;
        pub_key
    };

    let mut cipher = vec![0u8; expansion.cipher_len];
    crypto_backend.secure_random_fill(&mut cipher)?;

    tracing::debug!(%suite, clear_len, "generated GREASE values");

    Ok(Grease {
        suite,
        pub_key,
        cipher,
    })
}

fn random_suite<C: Crypto + ?Sized>(crypto_backend: &mut C) -> Result<Suite, Error> {
    let candidates: Vec<Suite> = Suite::SUPPORTED
        .iter()
        .copied()
        .filter(|suite| !suite.is_export_only())
        .collect();

    let idx = uniform_index(crypto_backend, candidates.len())?;

    candidates
        .get(idx)
        .copied()
        .ok_or(Error::UnsupportedSuite)
}

/// Draws an index in `0..n` without modulo bias.
fn uniform_index<C: Crypto + ?Sized>(crypto_backend: &mut C, n: usize) -> Result<usize, Error> {
    let n = u32::try_from(n).map_err(|_| Error::InvalidInput("too many candidates"))?;

    if n == 0 {
        return Err(Error::UnsupportedSuite);
    }

    // largest multiple of n that fits, values at or above it are redrawn
    let zone = u32::MAX - (u32::MAX % n);

    loop {
        let mut buf = [0u8; 4];
        crypto_backend.secure_random_fill(&mut buf)?;

        let value = u32::from_be_bytes(buf);
        if value < zone {
            return Ok((value % n) as usize);
        }
    }
}

#[cfg(test)]
mod tests {
    use hpke_engine_crypto::backend::HpkeCryptoRustCrypto;
    use hpke_engine_crypto::{HpkeAeadId, HpkeKdfId, HpkeKemId, HpkePublicKey};

    use super::*;

    #[test]
    fn test_preferred_suite() {
        let mut backend = HpkeCryptoRustCrypto::from_seed([7; 32]);

        let suite = Suite::new(
            HpkeKemId::DHKEM_P256_HKDF_SHA256,
            HpkeKdfId::HKDF_SHA256,
            HpkeAeadId::CHACHA20_POLY1305,
        );

        let grease = good4grease(&mut backend, Some(suite), 100).unwrap();

        assert_eq!(grease.suite, suite);
        assert_eq!(grease.pub_key.len(), 65);
        assert_eq!(grease.pub_key[0], 0x04);
        assert_eq!(grease.cipher.len(), 116);

        assert!(HpkePublicKey::new(suite.kem_id, &grease.pub_key).is_ok());
    }

    #[test]
    fn test_unsupported_kem_gets_random_bytes() {
        let mut backend = HpkeCryptoRustCrypto::from_seed([7; 32]);

        let suite = Suite::new(
            HpkeKemId::DHKEM_X448_HKDF_SHA512,
            HpkeKdfId::HKDF_SHA512,
            HpkeAeadId::AES_256_GCM,
        );

        let grease = good4grease(&mut backend, Some(suite), 0).unwrap();

        assert_eq!(grease.pub_key.len(), 56);
        assert_eq!(grease.cipher.len(), 16);
    }

    #[test]
    fn test_random_suite() {
        let mut backend = HpkeCryptoRustCrypto::from_seed([9; 32]);

        for _ in 0..32 {
            let grease = good4grease(&mut backend, None, 10).unwrap();

            assert!(Suite::SUPPORTED.contains(&grease.suite));
            assert!(!grease.suite.is_export_only());
            assert_eq!(grease.pub_key.len(), grease.suite.kem_id.n_pk());
            assert_eq!(
                grease.cipher.len(),
                10 + grease.suite.aead_id.n_tag()
            );
        }
    }

    #[test]
    fn test_uniform_index() {
        let mut backend = HpkeCryptoRustCrypto::from_seed([3; 32]);

        let mut seen = [false; 5];
        for _ in 0..200 {
            let idx = uniform_index(&mut backend, 5).unwrap();
            seen[idx] = true;
        }

        assert!(seen.iter().all(|seen| *seen));
        assert!(matches!(
            uniform_index(&mut backend, 0),
            Err(Error::UnsupportedSuite)
        ));
    }
}
