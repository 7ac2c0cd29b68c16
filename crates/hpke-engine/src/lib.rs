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
#![allow(clippy::must_use_candidate)]

pub mod aead;
pub mod context;
pub mod error;
pub mod grease;
pub mod kem;
pub mod key_schedule;
pub mod single_shot;
pub mod suite;

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

use core::fmt;
use core::str::FromStr;

pub use hpke_engine_crypto as crypto;
pub use hpke_engine_crypto::{
    Crypto, CryptoError, EncapsulatedSecret, HpkeAeadId, HpkeKdfId, HpkeKemId, HpkeKeyPair,
    HpkePrivateKeyRef, HpkePublicKey, HpkePublicKeyRef,
};

pub use crate::context::{HpkeContext, Recipient, Sender};
pub use crate::error::Error;
pub use crate::suite::Suite;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The HPKE mode.
///
/// | Mode | Value | Name |
/// |:-:|:-:|:-:|
/// | base | 0x00 | `base` |
/// | psk  | 0x01 | `psk` |
/// | auth | 0x02 | `auth` |
/// | auth_psk | 0x03 | `pskauth` |
pub enum HpkeMode {
    /// Base mode.
    Base = 0x00,

    /// PSK mode.
    Psk = 0x01,

    /// Authenticated mode.
    Auth = 0x02,

    /// Authenticated PSK mode.
    AuthPsk = 0x03,
}

impl HpkeMode {
    /// Every mode, in codepoint order.
    pub const ALL: [Self; 4] = [Self::Base, Self::Psk, Self::Auth, Self::AuthPsk];

    #[inline]
    /// Try to convert a `u8` into an `HpkeMode`.
    ///
    /// # Errors
    ///
    /// [`UnknownHpkeMode`] if the value does not correspond to a known mode.
    pub const fn try_from(value: u8) -> Result<Self, UnknownHpkeMode> {
        match value {
            0x00 => Ok(Self::Base),
            0x01 => Ok(Self::Psk),
            0x02 => Ok(Self::Auth),
            0x03 => Ok(Self::AuthPsk),
            other => Err(UnknownHpkeMode(other)),
        }
    }

    #[inline]
    /// Whether the mode mixes a pre-shared key into the key schedule.
    pub const fn uses_psk(self) -> bool {
        matches!(self, Self::Psk | Self::AuthPsk)
    }

    #[inline]
    /// Whether the mode authenticates the sender with a static key pair.
    pub const fn is_auth(self) -> bool {
        matches!(self, Self::Auth | Self::AuthPsk)
    }

    #[inline]
    /// The canonical name of the mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Psk => "psk",
            Self::Auth => "auth",
            Self::AuthPsk => "pskauth",
        }
    }
}

impl TryFrom<u8> for HpkeMode {
    type Error = UnknownHpkeMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from(value)
    }
}

impl fmt::Display for HpkeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HpkeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or(Error::Parse("unknown mode"))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for HpkeMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(*self as u8)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for HpkeMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        HpkeMode::try_from(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown HPKE mode: {0}")]
/// Error indicating an unknown HPKE mode.
pub struct UnknownHpkeMode(pub u8);
