//! AEAD key material.

use core::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, HpkeAeadId};

const MAX_KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// The key and a nonce of one of the real AEADs. Zeroized on drop.
///
/// The key schedule holds the base nonce here; every seal or open works on a
/// copy carrying that message's nonce.
pub struct HpkeAead {
    aead_id: HpkeAeadId,
    key: [u8; MAX_KEY_LEN],
    nonce: [u8; NONCE_LEN],
}

impl HpkeAead {
    /// Checks `key` and `nonce` against `aead_id`'s `Nk` and `Nn`.
    ///
    /// Returns `Ok(None)` for export-only, which has no key.
    ///
    /// # Errors
    ///
    /// [`CryptoError::AeadInvalidKey`] or [`CryptoError::AeadInvalidNonce`]
    /// on a length mismatch.
    pub fn new(aead_id: HpkeAeadId, key: &[u8], nonce: &[u8]) -> Result<Option<Self>, CryptoError> {
        if aead_id.is_export_only() {
            return Ok(None);
        }

        if key.len() != aead_id.n_key() {
            return Err(CryptoError::AeadInvalidKey);
        }

        if nonce.len() != aead_id.n_nonce() {
            return Err(CryptoError::AeadInvalidNonce);
        }

        let mut this = Self {
            aead_id,
            key: [0; MAX_KEY_LEN],
            nonce: [0; NONCE_LEN],
        };
        this.key[..key.len()].copy_from_slice(key);
        this.nonce.copy_from_slice(nonce);

        Ok(Some(this))
    }

    #[inline]
    /// The AEAD this material is for.
    pub const fn aead_id(&self) -> HpkeAeadId {
        self.aead_id
    }

    #[inline]
    /// The `Nk` key bytes.
    pub fn key(&self) -> &[u8] {
        &self.key[..self.aead_id.n_key()]
    }

    #[inline]
    /// The `Nn` nonce bytes.
    pub const fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    /// A copy whose nonce `f` has rewritten, leaving `self` untouched.
    pub fn with_nonce(&self, f: impl FnOnce(&mut [u8])) -> Self {
        let mut nonce = self.nonce;
        f(&mut nonce);

        Self {
            aead_id: self.aead_id,
            key: self.key,
            nonce,
        }
    }
}

impl fmt::Debug for HpkeAead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HpkeAead")
            .field("aead_id", &self.aead_id)
            .finish_non_exhaustive()
    }
}

impl Drop for HpkeAead {
    fn drop(&mut self) {
        self.key.zeroize();
        self.nonce.zeroize();
    }
}

impl ZeroizeOnDrop for HpkeAead {}
