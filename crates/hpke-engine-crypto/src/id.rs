//! Registered KEM, KDF and AEAD codepoints ([RFC 9180, Section 7]) and the
//! sizes each one fixes.
//!
//! [RFC 9180, Section 7]: https://www.rfc-editor.org/rfc/rfc9180.html#section-7

use core::fmt;

/// A codepoint with no entry in the registry it was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown HPKE {registry} identifier 0x{value:04x}")]
pub struct UnknownIdentifier {
    /// `"KEM"`, `"KDF"` or `"AEAD"`.
    pub registry: &'static str,

    /// The rejected codepoint.
    pub value: u16,
}

macro_rules! registry {
    (
        $(#[$meta:meta])*
        pub enum $name:ident in $registry:literal {
            $(
                $(#[doc = $doc:literal])*
                $variant:ident = $value:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum $name {
            $(
                $(#[doc = $doc])*
                $variant = $value,
            )+
        }

        impl $name {
            /// Every registered value, in codepoint order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[inline]
            /// The codepoint.
            pub const fn to_int(self) -> u16 {
                self as u16
            }

            #[inline]
            /// `I2OSP(id, 2)`.
            pub const fn to_array(self) -> [u8; 2] {
                self.to_int().to_be_bytes()
            }

            const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }

        impl From<$name> for u16 {
            fn from(value: $name) -> Self {
                value.to_int()
            }
        }

        impl TryFrom<u16> for $name {
            type Error = UnknownIdentifier;

            fn try_from(value: u16) -> Result<Self, Self::Error> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|id| id.to_int() == value)
                    .ok_or(UnknownIdentifier {
                        registry: $registry,
                        value,
                    })
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{:04x})", self.name(), self.to_int())
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u16(self.to_int())
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = <u16 as serde::Deserialize>::deserialize(deserializer)?;

                Self::try_from(value).map_err(serde::de::Error::custom)
            }
        }
    };
}

registry! {
    /// KEM identifiers, [RFC 9180, Section 7.1].
    ///
    /// [RFC 9180, Section 7.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-7.1
    pub enum HpkeKemId in "KEM" {
        /// DHKEM(P-256, HKDF-SHA256)
        DHKEM_P256_HKDF_SHA256 = 0x0010,
        /// DHKEM(P-384, HKDF-SHA384)
        DHKEM_P384_HKDF_SHA384 = 0x0011,
        /// DHKEM(P-521, HKDF-SHA512)
        DHKEM_P521_HKDF_SHA512 = 0x0012,
        /// DHKEM(X25519, HKDF-SHA256)
        DHKEM_X25519_HKDF_SHA256 = 0x0020,
        /// DHKEM(X448, HKDF-SHA512)
        DHKEM_X448_HKDF_SHA512 = 0x0021,
    }
}

registry! {
    /// KDF identifiers, [RFC 9180, Section 7.2].
    ///
    /// [RFC 9180, Section 7.2]: https://www.rfc-editor.org/rfc/rfc9180.html#section-7.2
    pub enum HpkeKdfId in "KDF" {
        /// HKDF-SHA256
        HKDF_SHA256 = 0x0001,
        /// HKDF-SHA384
        HKDF_SHA384 = 0x0002,
        /// HKDF-SHA512
        HKDF_SHA512 = 0x0003,
    }
}

registry! {
    /// AEAD identifiers, [RFC 9180, Section 7.3].
    ///
    /// [RFC 9180, Section 7.3]: https://www.rfc-editor.org/rfc/rfc9180.html#section-7.3
    pub enum HpkeAeadId in "AEAD" {
        /// AES-128-GCM
        AES_128_GCM = 0x0001,
        /// AES-256-GCM
        AES_256_GCM = 0x0002,
        /// ChaCha20Poly1305
        CHACHA20_POLY1305 = 0x0003,
        /// Export-only: the context derives exporter secrets but never seals.
        EXPORT_ONLY = 0xFFFF,
    }
}

impl HpkeKemId {
    /// Length of a scalar, which is also `Ndh`.
    const fn scalar_len(self) -> usize {
        match self {
            Self::DHKEM_P256_HKDF_SHA256 | Self::DHKEM_X25519_HKDF_SHA256 => 32,
            Self::DHKEM_P384_HKDF_SHA384 => 48,
            Self::DHKEM_X448_HKDF_SHA512 => 56,
            Self::DHKEM_P521_HKDF_SHA512 => 66,
        }
    }

    /// NIST curves encode public keys as uncompressed SEC1 points.
    const fn is_nist_curve(self) -> bool {
        matches!(
            self,
            Self::DHKEM_P256_HKDF_SHA256 | Self::DHKEM_P384_HKDF_SHA384 | Self::DHKEM_P521_HKDF_SHA512
        )
    }

    #[inline]
    /// The KDF the DHKEM runs `ExtractAndExpand` with.
    pub const fn kdf_id(self) -> HpkeKdfId {
        match self {
            Self::DHKEM_P256_HKDF_SHA256 | Self::DHKEM_X25519_HKDF_SHA256 => HpkeKdfId::HKDF_SHA256,
            Self::DHKEM_P384_HKDF_SHA384 => HpkeKdfId::HKDF_SHA384,
            Self::DHKEM_P521_HKDF_SHA512 | Self::DHKEM_X448_HKDF_SHA512 => HpkeKdfId::HKDF_SHA512,
        }
    }

    /// `suite_id = concat("KEM", I2OSP(kem_id, 2))`, the label context of
    /// every KDF call inside the KEM.
    ///
    /// ```
    /// # use hpke_engine_crypto::HpkeKemId;
    /// assert_eq!(HpkeKemId::DHKEM_P521_HKDF_SHA512.suite_id(), *b"KEM\x00\x12");
    /// ```
    pub const fn suite_id(self) -> [u8; 5] {
        let [hi, lo] = self.to_array();

        [b'K', b'E', b'M', hi, lo]
    }

    #[inline]
    /// `Nsecret`. A DHKEM's shared secret is one hash output of its KDF.
    pub const fn n_secret(self) -> usize {
        self.kdf_id().n_hash()
    }

    #[inline]
    /// `Nenc`. The encapsulation is the serialized ephemeral public key.
    pub const fn n_enc(self) -> usize {
        self.n_pk()
    }

    #[inline]
    /// `Npk`.
    pub const fn n_pk(self) -> usize {
        if self.is_nist_curve() {
            1 + 2 * self.scalar_len()
        } else {
            self.scalar_len()
        }
    }

    #[inline]
    /// `Nsk`.
    pub const fn n_sk(self) -> usize {
        self.scalar_len()
    }
}

impl HpkeKdfId {
    #[inline]
    /// `Nh`, the hash output length.
    pub const fn n_hash(self) -> usize {
        match self {
            Self::HKDF_SHA256 => 32,
            Self::HKDF_SHA384 => 48,
            Self::HKDF_SHA512 => 64,
        }
    }
}

impl HpkeAeadId {
    #[inline]
    /// `Nk`. Zero for export-only.
    pub const fn n_key(self) -> usize {
        match self {
            Self::AES_128_GCM => 16,
            Self::AES_256_GCM | Self::CHACHA20_POLY1305 => 32,
            Self::EXPORT_ONLY => 0,
        }
    }

    #[inline]
    /// `Nn`. Zero for export-only.
    pub const fn n_nonce(self) -> usize {
        if self.is_export_only() { 0 } else { 12 }
    }

    #[inline]
    /// `Nt`. Zero for export-only.
    pub const fn n_tag(self) -> usize {
        if self.is_export_only() { 0 } else { 16 }
    }

    #[inline]
    /// Whether this is the export-only pseudo-AEAD.
    pub const fn is_export_only(self) -> bool {
        matches!(self, Self::EXPORT_ONLY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case::test_case(HpkeKemId::DHKEM_P256_HKDF_SHA256, 32, 65, 32)]
    #[test_case::test_case(HpkeKemId::DHKEM_P384_HKDF_SHA384, 48, 97, 48)]
    #[test_case::test_case(HpkeKemId::DHKEM_P521_HKDF_SHA512, 64, 133, 66)]
    #[test_case::test_case(HpkeKemId::DHKEM_X25519_HKDF_SHA256, 32, 32, 32)]
    #[test_case::test_case(HpkeKemId::DHKEM_X448_HKDF_SHA512, 64, 56, 56)]
    fn test_kem_sizes(alg: HpkeKemId, n_secret: usize, n_pk: usize, n_sk: usize) {
        assert_eq!(alg.n_secret(), n_secret);
        assert_eq!(alg.n_enc(), n_pk);
        assert_eq!(alg.n_pk(), n_pk);
        assert_eq!(alg.n_sk(), n_sk);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(HpkeAeadId::try_from(0xffff), Ok(HpkeAeadId::EXPORT_ONLY));
        assert_eq!(
            HpkeKdfId::try_from(0x0004),
            Err(UnknownIdentifier {
                registry: "KDF",
                value: 4
            })
        );

        for id in HpkeKemId::ALL {
            assert_eq!(HpkeKemId::try_from(u16::from(*id)), Ok(*id));
        }
    }
}
