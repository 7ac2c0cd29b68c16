//! Byte-string newtypes for keys and KEM/KDF outputs.
//!
//! Secret material lives in a [`Zeroizing`] buffer, compares in constant time
//! and prints only its length. Public material is kept inline and printed as
//! hex.

use alloc::vec::Vec;
use core::fmt;
use core::ops::Deref;

use smallvec::SmallVec;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::{CryptoError, HpkeKemId};

/// `Npk` of DHKEM(P-521), the largest registered.
const MAX_PK_LEN: usize = HpkeKemId::DHKEM_P521_HKDF_SHA512.n_pk();

macro_rules! bytes_view {
    ($name:ty, |$this:ident| $bytes:expr) => {
        impl Deref for $name {
            type Target = [u8];

            #[inline]
            fn deref(&self) -> &[u8] {
                let $this = self;
                $bytes
            }
        }

        impl AsRef<[u8]> for $name {
            #[inline]
            fn as_ref(&self) -> &[u8] {
                self
            }
        }
    };
}

macro_rules! secret {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name(Zeroizing<Vec<u8>>);

        bytes_view!($name, |this| &this.0);
        redacted!($name);
    };
}

macro_rules! redacted {
    ($name:ty) => {
        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(<{} bytes>)", stringify!($name), self.len())
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.as_ref().ct_eq(other.as_ref()).into()
            }
        }

        impl Eq for $name {}
    };
}

macro_rules! public {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name(SmallVec<[u8; MAX_PK_LEN]>);

        bytes_view!($name, |this| &this.0);

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), const_hex::encode(&**self))
            }
        }
    };
}

public!(
    /// A serialized public key (`pkX`). Only its length is checked.
    HpkePublicKey
);

impl HpkePublicKey {
    /// Copies `bytes` in as a public key of `alg`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::KemMalformedPkX`] if `bytes` is not `Npk` long.
    pub fn new(alg: HpkeKemId, bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != alg.n_pk() {
            return Err(CryptoError::KemMalformedPkX);
        }

        Ok(Self(SmallVec::from_slice(bytes)))
    }
}

public!(
    /// The encapsulated key `enc`.
    EncapsulatedSecret
);

impl EncapsulatedSecret {
    #[inline]
    /// Wraps an `enc` received from the sender.
    pub fn new(bytes: &[u8]) -> Self {
        Self(SmallVec::from_slice(bytes))
    }

    #[inline]
    /// `enc = SerializePublicKey(pkE)`.
    pub fn from_pk_e(pk_e: &HpkePublicKey) -> Self {
        Self(pk_e.0.clone())
    }
}

secret!(
    /// A private key (`skX`). Only its length is checked.
    HpkePrivateKey
);

impl HpkePrivateKey {
    /// Copies `bytes` in as a private key of `alg`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::KemMalformedSkX`] if `bytes` is not `Nsk` long.
    pub fn new(alg: HpkeKemId, bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != alg.n_sk() {
            return Err(CryptoError::KemMalformedSkX);
        }

        Ok(Self(Zeroizing::new(bytes.to_vec())))
    }
}

secret!(
    /// A KEM shared secret, or a raw DH output on its way to becoming one.
    SharedSecret
);

impl SharedSecret {
    #[inline]
    /// Copies `bytes` in.
    pub fn new(bytes: &[u8]) -> Self {
        Self(Zeroizing::new(bytes.to_vec()))
    }

    #[inline]
    /// Takes over the buffer of an `Expand` output.
    pub fn from_okm(okm: Okm) -> Self {
        Self(okm.0)
    }

    /// `concat(dh_1, dh_2, ...)`, for the authenticated KEM.
    pub fn concat(parts: &[&SharedSecret]) -> Self {
        Self(Zeroizing::new(
            parts.iter().flat_map(|part| part.iter().copied()).collect(),
        ))
    }
}

secret!(
    /// An `Extract` output.
    Prk
);

impl Prk {
    #[inline]
    /// Copies `bytes` in.
    pub fn new(bytes: &[u8]) -> Self {
        Self(Zeroizing::new(bytes.to_vec()))
    }
}

secret!(
    /// An `Expand` output.
    Okm
);

impl Okm {
    #[inline]
    /// `len` zero bytes, to be filled through [`Okm::buffer_mut`].
    pub fn zeroed(len: usize) -> Self {
        Self(Zeroizing::new(alloc::vec![0; len]))
    }

    #[inline]
    /// The writable buffer.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    #[inline]
    /// Unwraps the zeroizing buffer.
    pub fn into_inner(self) -> Zeroizing<Vec<u8>> {
        self.0
    }
}

/// A borrowed public key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HpkePublicKeyRef<'a>(&'a [u8]);

bytes_view!(HpkePublicKeyRef<'_>, |this| this.0);

impl fmt::Debug for HpkePublicKeyRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HpkePublicKeyRef({})", const_hex::encode(self.0))
    }
}

impl HpkePublicKeyRef<'_> {
    /// Copies the key out, checking its length against `alg`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::KemMalformedPkX`] if it is not `Npk` long.
    pub fn to_public_key(&self, alg: HpkeKemId) -> Result<HpkePublicKey, CryptoError> {
        HpkePublicKey::new(alg, self.0)
    }
}

impl<'a> From<&'a [u8]> for HpkePublicKeyRef<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for HpkePublicKeyRef<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Self(value)
    }
}

impl<'a> From<&'a HpkePublicKey> for HpkePublicKeyRef<'a> {
    fn from(value: &'a HpkePublicKey) -> Self {
        Self(&value.0)
    }
}

/// A borrowed private key.
#[derive(Clone, Copy)]
pub struct HpkePrivateKeyRef<'a>(&'a [u8]);

bytes_view!(HpkePrivateKeyRef<'_>, |this| this.0);
redacted!(HpkePrivateKeyRef<'_>);

impl<'a> From<&'a HpkePrivateKey> for HpkePrivateKeyRef<'a> {
    fn from(value: &'a HpkePrivateKey) -> Self {
        Self(&value.0)
    }
}

/// A private key together with its public key and KEM.
///
/// The private half is zeroized on drop and only handed out borrowed.
pub struct HpkeKeyPair {
    alg: HpkeKemId,
    sk: HpkePrivateKey,
    pk: HpkePublicKey,
}

impl fmt::Debug for HpkeKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HpkeKeyPair")
            .field("alg", &self.alg)
            .field("pk", &self.pk)
            .finish_non_exhaustive()
    }
}

impl HpkeKeyPair {
    /// Pairs `sk` and `pk` after checking only their lengths against `alg`.
    ///
    /// Nothing verifies that `pk` is `pk(sk)`, so this is for keys whose
    /// pairing is already known, such as stored keys or test vectors.
    ///
    /// # Errors
    ///
    /// [`CryptoError::KemMalformedSkX`] or [`CryptoError::KemMalformedPkX`]
    /// on a length mismatch.
    pub fn new_unchecked(
        alg: HpkeKemId,
        sk: impl AsRef<[u8]>,
        pk: impl AsRef<[u8]>,
    ) -> Result<Self, CryptoError> {
        let sk = HpkePrivateKey::new(alg, sk.as_ref())?;
        let pk = HpkePublicKey::new(alg, pk.as_ref())?;

        Ok(Self::from_parts(alg, sk, pk))
    }

    #[inline]
    /// Pairs two already length-checked halves.
    pub fn from_parts(alg: HpkeKemId, sk: HpkePrivateKey, pk: HpkePublicKey) -> Self {
        Self { alg, sk, pk }
    }

    #[inline]
    /// The KEM the keys belong to.
    pub const fn kem_id(&self) -> HpkeKemId {
        self.alg
    }

    #[inline]
    /// `skX`.
    pub fn sk(&self) -> HpkePrivateKeyRef<'_> {
        (&self.sk).into()
    }

    #[inline]
    /// `pkX`.
    pub fn pk(&self) -> HpkePublicKeyRef<'_> {
        (&self.pk).into()
    }

    #[inline]
    /// `pkX`, owned.
    pub const fn public_key(&self) -> &HpkePublicKey {
        &self.pk
    }
}
