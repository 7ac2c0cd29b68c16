//! Suite registry and the `KEM,KDF,AEAD` suite string format.

use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use hpke_engine_crypto::{Crypto, HpkeAeadId, HpkeKdfId, HpkeKemId};

use crate::error::Error;

/// An HPKE cipher suite: one KEM, one KDF and one AEAD identifier.
///
/// A `Suite` built from the typed identifiers is always registered; raw
/// codepoints go through [`Suite::try_from_ids`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Suite {
    /// The KEM in use.
    pub kem_id: HpkeKemId,

    /// The KDF used by the key schedule.
    pub kdf_id: HpkeKdfId,

    /// The AEAD in use, possibly export-only.
    pub aead_id: HpkeAeadId,
}

/// The lengths a suite fixes for its wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteSizes {
    /// `Nenc`
    pub enc_len: usize,

    /// `Npk`
    pub pk_len: usize,

    /// `Nk`
    pub aead_key_len: usize,

    /// `Nn`
    pub aead_nonce_len: usize,

    /// `Nt`
    pub aead_tag_len: usize,
}

/// Output sizes for sealing a plaintext of a given length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expansion {
    /// Length of the encapsulated key.
    pub enc_len: usize,

    /// Length of the ciphertext, tag included.
    pub cipher_len: usize,
}

const N_SUITES: usize = HpkeKemId::ALL.len() * HpkeKdfId::ALL.len() * HpkeAeadId::ALL.len();

const fn all_suites() -> [Suite; N_SUITES] {
    let mut suites = [Suite::DEFAULT; N_SUITES];
    let mut i = 0;

    let mut k = 0;
    while k < HpkeKemId::ALL.len() {
        let mut d = 0;
        while d < HpkeKdfId::ALL.len() {
            let mut a = 0;
            while a < HpkeAeadId::ALL.len() {
                suites[i] = Suite::new(HpkeKemId::ALL[k], HpkeKdfId::ALL[d], HpkeAeadId::ALL[a]);
                i += 1;
                a += 1;
            }
            d += 1;
        }
        k += 1;
    }

    suites
}

impl Suite {
    /// `DHKEM(X25519, HKDF-SHA256)`, `HKDF-SHA256`, `AES-128-GCM`.
    pub const DEFAULT: Self = Self::new(
        HpkeKemId::DHKEM_X25519_HKDF_SHA256,
        HpkeKdfId::HKDF_SHA256,
        HpkeAeadId::AES_128_GCM,
    );

    /// Every registered suite.
    ///
    /// All combinations of registered identifiers are accepted, export-only
    /// included.
    pub const SUPPORTED: &'static [Self] = &all_suites();

    #[inline]
    /// Creates a suite from typed identifiers.
    pub const fn new(kem_id: HpkeKemId, kdf_id: HpkeKdfId, aead_id: HpkeAeadId) -> Self {
        Self {
            kem_id,
            kdf_id,
            aead_id,
        }
    }

    /// Creates a suite from raw codepoints.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedSuite`] if any identifier is unknown or the
    /// combination is not registered.
    pub fn try_from_ids(kem_id: u16, kdf_id: u16, aead_id: u16) -> Result<Self, Error> {
        let suite = Self::new(
            HpkeKemId::try_from(kem_id).map_err(|_| Error::UnsupportedSuite)?,
            HpkeKdfId::try_from(kdf_id).map_err(|_| Error::UnsupportedSuite)?,
            HpkeAeadId::try_from(aead_id).map_err(|_| Error::UnsupportedSuite)?,
        );

        suite.check()?;

        Ok(suite)
    }

    /// Checks the suite against the registry.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedSuite`] if the combination is not registered.
    pub fn check(&self) -> Result<(), Error> {
        if Self::SUPPORTED.contains(self) {
            Ok(())
        } else {
            Err(Error::UnsupportedSuite)
        }
    }

    /// Whether the primitives provider implements every algorithm of the
    /// suite.
    pub fn is_supported_by<C: Crypto + ?Sized>(&self, crypto_backend: &C) -> bool {
        crypto_backend.is_kem_supported(&self.kem_id)
            && crypto_backend.is_kdf_supported(&self.kdf_id)
            && crypto_backend.is_aead_supported(&self.aead_id)
    }

    #[inline]
    /// Whether seal and open are disabled for this suite.
    pub const fn is_export_only(&self) -> bool {
        self.aead_id.is_export_only()
    }

    /// The `suite_id` used by `LabeledExtract` and `LabeledExpand` in the key
    /// schedule:
    ///
    /// ```text
    /// suite_id = concat(
    ///   "HPKE",
    ///   I2OSP(kem_id, 2),
    ///   I2OSP(kdf_id, 2),
    ///   I2OSP(aead_id, 2)
    /// )
    /// ```
    pub fn suite_id(&self) -> [u8; 10] {
        let mut suite_id = [0u8; 10];

        suite_id[0..4].copy_from_slice(b"HPKE");
        suite_id[4..6].copy_from_slice(&self.kem_id.to_array());
        suite_id[6..8].copy_from_slice(&self.kdf_id.to_array());
        suite_id[8..10].copy_from_slice(&self.aead_id.to_array());

        suite_id
    }

    #[inline]
    /// Wire sizes of the suite.
    pub const fn sizes(&self) -> SuiteSizes {
        SuiteSizes {
            enc_len: self.kem_id.n_enc(),
            pk_len: self.kem_id.n_pk(),
            aead_key_len: self.aead_id.n_key(),
            aead_nonce_len: self.aead_id.n_nonce(),
            aead_tag_len: self.aead_id.n_tag(),
        }
    }

    /// Output sizes for sealing `clear_len` bytes.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedSuite`] for an unregistered suite,
    /// [`Error::InvalidInput`] if the ciphertext length overflows.
    pub fn expansion(&self, clear_len: usize) -> Result<Expansion, Error> {
        self.check()?;

        let sizes = self.sizes();

        Ok(Expansion {
            enc_len: sizes.enc_len,
            cipher_len: clear_len
                .checked_add(sizes.aead_tag_len)
                .ok_or(Error::InvalidInput("plaintext length overflows"))?,
        })
    }
}

impl Default for Suite {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Checks raw codepoints against the registry.
pub fn suite_check(kem_id: u16, kdf_id: u16, aead_id: u16) -> bool {
    Suite::try_from_ids(kem_id, kdf_id, aead_id).is_ok()
}

// === Suite strings ===

const SUITE_DELIMITER: char = ',';

const KEM_NAMES: &[(HpkeKemId, &str)] = &[
    (HpkeKemId::DHKEM_P256_HKDF_SHA256, "P-256"),
    (HpkeKemId::DHKEM_P384_HKDF_SHA384, "P-384"),
    (HpkeKemId::DHKEM_P521_HKDF_SHA512, "P-521"),
    (HpkeKemId::DHKEM_X25519_HKDF_SHA256, "X25519"),
    (HpkeKemId::DHKEM_X448_HKDF_SHA512, "X448"),
];

const KDF_NAMES: &[(HpkeKdfId, &str)] = &[
    (HpkeKdfId::HKDF_SHA256, "hkdf-sha256"),
    (HpkeKdfId::HKDF_SHA384, "hkdf-sha384"),
    (HpkeKdfId::HKDF_SHA512, "hkdf-sha512"),
];

const AEAD_NAMES: &[(HpkeAeadId, &str)] = &[
    (HpkeAeadId::AES_128_GCM, "aes-128-gcm"),
    (HpkeAeadId::AES_256_GCM, "aes-256-gcm"),
    (HpkeAeadId::CHACHA20_POLY1305, "chacha20-poly1305"),
    (HpkeAeadId::EXPORT_ONLY, "exporter"),
];

fn name_of<T: PartialEq + Copy>(table: &[(T, &'static str)], id: T) -> &'static str {
    table
        .iter()
        .find(|(candidate, _)| *candidate == id)
        .map_or("", |(_, name)| name)
}

/// Parses one field: a canonical name (any case) or a decimal / `0x` hex
/// codepoint.
fn parse_component<T: Copy>(
    field: &str,
    table: &[(T, &'static str)],
    from_int: impl Fn(u16) -> Option<T>,
    unknown: &'static str,
) -> Result<T, Error> {
    let field = field.trim();

    if field.is_empty() {
        return Err(Error::Parse("empty suite component"));
    }

    if let Some((id, _)) = table
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(field))
    {
        return Ok(*id);
    }

    // digits only, `from_str_radix` alone would take a leading `+`
    let codepoint = match field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
    {
        Some(hex) if hex.bytes().all(|b| b.is_ascii_hexdigit()) => u16::from_str_radix(hex, 16).ok(),
        None if field.bytes().all(|b| b.is_ascii_digit()) => field.parse::<u16>().ok(),
        _ => None,
    }
    .ok_or(Error::Parse(unknown))?;

    from_int(codepoint).ok_or(Error::Parse(unknown))
}

impl FromStr for Suite {
    type Err = Error;

    /// Parses `"KEM,KDF,AEAD"`, e.g. `"X25519,hkdf-sha256,aes-128-gcm"` or
    /// `"0x20,1,1"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split(SUITE_DELIMITER);

        let (Some(kem), Some(kdf), Some(aead), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(Error::Parse("expected exactly three comma-separated components"));
        };

        let suite = Self::new(
            parse_component(kem, KEM_NAMES, |v| HpkeKemId::try_from(v).ok(), "unknown KEM")?,
            parse_component(kdf, KDF_NAMES, |v| HpkeKdfId::try_from(v).ok(), "unknown KDF")?,
            parse_component(aead, AEAD_NAMES, |v| HpkeAeadId::try_from(v).ok(), "unknown AEAD")?,
        );

        suite.check().map_err(|_| Error::Parse("unregistered suite"))?;

        Ok(suite)
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SUITE_DELIMITER}{}{SUITE_DELIMITER}{}",
            name_of(KEM_NAMES, self.kem_id),
            name_of(KDF_NAMES, self.kdf_id),
            name_of(AEAD_NAMES, self.aead_id),
        )
    }
}

/// Parses a suite string.
///
/// # Errors
///
/// [`Error::Parse`] on missing, extra or unknown components.
pub fn string_to_suite(s: &str) -> Result<Suite, Error> {
    s.parse()
}

/// Formats a suite with canonical component names.
pub fn suite_to_string(suite: &Suite) -> String {
    use alloc::string::ToString;

    suite.to_string()
}

#[cfg(feature = "serde")]
impl serde::Serialize for Suite {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Suite {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_complete() {
        assert_eq!(Suite::SUPPORTED.len(), 60);
        assert!(Suite::SUPPORTED.contains(&Suite::DEFAULT));

        for suite in Suite::SUPPORTED {
            assert!(suite.check().is_ok());
            assert!(suite_check(
                suite.kem_id.to_int(),
                suite.kdf_id.to_int(),
                suite.aead_id.to_int()
            ));
        }
    }

    #[test]
    fn test_suite_check_unknown_ids() {
        assert!(!suite_check(0x0013, 0x0001, 0x0001));
        assert!(!suite_check(0x0020, 0x0004, 0x0001));
        assert!(!suite_check(0x0020, 0x0001, 0x0004));
        assert!(matches!(
            Suite::try_from_ids(0, 0, 0),
            Err(Error::UnsupportedSuite)
        ));
    }

    #[test]
    fn test_suite_id() {
        assert_eq!(
            Suite::new(
                HpkeKemId::DHKEM_P256_HKDF_SHA256,
                HpkeKdfId::HKDF_SHA256,
                HpkeAeadId::CHACHA20_POLY1305
            )
            .suite_id(),
            [72, 80, 75, 69, 0, 16, 0, 1, 0, 3]
        );
    }

    #[test]
    fn test_expansion() {
        let expansion = Suite::DEFAULT.expansion(100).unwrap();
        assert_eq!(expansion, Expansion { enc_len: 32, cipher_len: 116 });

        let p521 = Suite::new(
            HpkeKemId::DHKEM_P521_HKDF_SHA512,
            HpkeKdfId::HKDF_SHA512,
            HpkeAeadId::EXPORT_ONLY,
        );
        assert_eq!(
            p521.expansion(7).unwrap(),
            Expansion { enc_len: 133, cipher_len: 7 }
        );

        assert!(Suite::DEFAULT.expansion(usize::MAX).is_err());
    }

    #[test_case::test_case("X25519,hkdf-sha256,aes-128-gcm", Suite::DEFAULT)]
    #[test_case::test_case("x25519,HKDF-SHA256,AES-128-GCM", Suite::DEFAULT)]
    #[test_case::test_case(" 0x20 , 1 , 0x1 ", Suite::DEFAULT)]
    #[test_case::test_case("32,1,1", Suite::DEFAULT)]
    #[test_case::test_case(
        "P-521,hkdf-sha512,exporter",
        Suite::new(HpkeKemId::DHKEM_P521_HKDF_SHA512, HpkeKdfId::HKDF_SHA512, HpkeAeadId::EXPORT_ONLY)
    )]
    #[test_case::test_case(
        "0x10,0x2,chacha20-poly1305",
        Suite::new(HpkeKemId::DHKEM_P256_HKDF_SHA256, HpkeKdfId::HKDF_SHA384, HpkeAeadId::CHACHA20_POLY1305)
    )]
    fn test_parse(s: &str, expected: Suite) {
        assert_eq!(string_to_suite(s).unwrap(), expected);
    }

    #[test_case::test_case(""; "empty")]
    #[test_case::test_case("X25519,hkdf-sha256"; "missing component")]
    #[test_case::test_case("X25519,hkdf-sha256,aes-128-gcm,extra"; "extra component")]
    #[test_case::test_case("X25519,,aes-128-gcm"; "empty component")]
    #[test_case::test_case("X25519,hkdf-sha1,aes-128-gcm"; "unknown kdf")]
    #[test_case::test_case("0x99,1,1"; "unknown kem codepoint")]
    #[test_case::test_case("0xzz,1,1"; "bad hex")]
    #[test_case::test_case("X25519;hkdf-sha256;aes-128-gcm"; "wrong delimiter")]
    #[test_case::test_case("+32,1,1"; "plus sign")]
    #[test_case::test_case("-1,1,1"; "minus sign")]
    #[test_case::test_case("0x+20,1,1"; "signed hex")]
    #[test_case::test_case("32,1,0x"; "bare hex prefix")]
    fn test_parse_rejects(s: &str) {
        assert!(matches!(string_to_suite(s), Err(Error::Parse(_))));
    }

    #[test]
    fn test_to_string_round_trip() {
        assert_eq!(
            suite_to_string(&Suite::DEFAULT),
            "X25519,hkdf-sha256,aes-128-gcm"
        );

        for suite in Suite::SUPPORTED {
            assert_eq!(string_to_suite(&suite_to_string(suite)).unwrap(), *suite);
        }
    }
}
