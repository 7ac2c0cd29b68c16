//! Error types

use hpke_engine_crypto::CryptoError;

/// HPKE context engine errors.
///
/// Apart from [`Error::Crypto`], every variant is reported by the engine
/// itself before or instead of delegating to the primitives provider.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The suite is not registered, or the primitives provider cannot run it.
    #[error("unsupported HPKE suite")]
    UnsupportedSuite,

    /// A suite string could not be parsed.
    #[error("malformed suite string: {0}")]
    Parse(&'static str),

    /// The mode and the supplied PSK or authentication material disagree.
    #[error("mode and key material mismatch: {0}")]
    ModeKeyMismatch(&'static str),

    /// The caller-provided output buffer is too small.
    #[error("output buffer too small, {needed} bytes needed")]
    BufferTooSmall {
        /// The number of bytes the operation would have written.
        needed: usize,
    },

    /// Key pair generation or derivation failed.
    #[error("key generation failed")]
    KeyGen,

    /// Decapsulation failed. Deliberately silent about which check failed.
    #[error("decapsulation failed")]
    Decap,

    /// AEAD tag verification failed.
    #[error("authentication failed")]
    AuthenticationFailure,

    /// The sequence number reached the nonce-width limit. The context cannot
    /// seal or open any further message.
    #[error("sequence number exhausted")]
    SequenceExhausted,

    /// The operation needs a derived key schedule.
    #[error("key schedule not derived yet")]
    NotScheduled,

    /// Pre-schedule configuration was changed after the key schedule exists.
    #[error("key schedule already derived")]
    AlreadyScheduled,

    /// PSK input is too short (needs to be at least 32 bytes).
    #[error("PSK too short, at least 32 bytes required")]
    InsecurePsk,

    /// Seal or open was called on an export-only suite.
    #[error("export-only suite cannot seal or open")]
    ExportOnly,

    /// Generic invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Error passed from the primitives provider.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl Error {
    /// Returns true if the error is `Error::InvalidInput`.
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}
