//! Sequenced AEAD engine ([RFC 9180, Section 5.2]).
//!
//! Each message is sealed under `base_nonce XOR I2OSP(seq, Nn)`. The caller
//! owns `seq` and advances it only after a successful call.
//!
//! [RFC 9180, Section 5.2]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.2

use alloc::vec::Vec;

use hpke_engine_crypto::{Crypto, HpkeAead, HpkeAeadId};

use crate::error::Error;
use crate::key_schedule::KeySchedule;

/// The exhaustion bound for `seq`: `min(u64::MAX, 2^(8 * Nn) - 1)`.
///
/// Calls with `seq >= max_seq(aead_id)` fail with
/// [`Error::SequenceExhausted`]. Export-only suites have a bound of zero.
///
/// The counter is a `u64`, so for the registered AEADs (`Nn = 12`) the bound
/// is `u64::MAX` rather than the nonce's own `2^96 - 1`, and `seq = u64::MAX`
/// itself is refused.
pub const fn max_seq(aead_id: HpkeAeadId) -> u64 {
    let bits = 8 * aead_id.n_nonce();

    if bits >= u64::BITS as usize {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

#[inline]
/// ```text
/// def Context<ROLE>.ComputeNonce(seq):
///   seq_bytes = I2OSP(seq, Nn)
///   return xor(self.base_nonce, seq_bytes)
/// ```
pub fn compute_nonce(base_nonce: &mut [u8], seq: u64) {
    // I2OSP left pads with zeros, so XOR from the right.
    for (o, i) in base_nonce
        .iter_mut()
        .rev()
        .zip(seq.to_be_bytes().into_iter().rev())
    {
        *o ^= i;
    }
}

fn nonce_for(key_schedule: &KeySchedule, seq: u64) -> Result<HpkeAead, Error> {
    let aead = key_schedule.aead().ok_or(Error::ExportOnly)?;

    if seq >= max_seq(aead.aead_id()) {
        return Err(Error::SequenceExhausted);
    }

    Ok(aead.with_nonce(|base_nonce| compute_nonce(base_nonce, seq)))
}

/// See [`seal_in_place`].
///
/// # Errors
///
/// See [`seal_in_place`].
pub fn seal<C: Crypto + ?Sized>(
    crypto_backend: &C,
    key_schedule: &KeySchedule,
    seq: u64,
    aad: &[u8],
    pt: &[u8],
) -> Result<Vec<u8>, Error> {
    let n_tag = key_schedule
        .aead()
        .map_or(0, |aead| aead.aead_id().n_tag());

    let mut in_out = Vec::with_capacity(pt.len().saturating_add(n_tag));
    in_out.extend_from_slice(pt);

    seal_in_place(crypto_backend, key_schedule, seq, aad, &mut in_out)?;

    Ok(in_out)
}

/// `Seal(key, ComputeNonce(seq), aad, pt)`; the tag is appended to `in_out`.
///
/// # Errors
///
/// [`Error::ExportOnly`] without an AEAD, [`Error::SequenceExhausted`] at the
/// bound, or the provider's seal error.
pub fn seal_in_place<C: Crypto + ?Sized>(
    crypto_backend: &C,
    key_schedule: &KeySchedule,
    seq: u64,
    aad: &[u8],
    in_out: &mut Vec<u8>,
) -> Result<(), Error> {
    let aead = nonce_for(key_schedule, seq)?;

    crypto_backend.aead_seal_in_place(&aead, aad, in_out)?;

    Ok(())
}

/// See [`open_in_place`].
///
/// # Errors
///
/// See [`open_in_place`].
pub fn open<C: Crypto + ?Sized>(
    crypto_backend: &C,
    key_schedule: &KeySchedule,
    seq: u64,
    aad: &[u8],
    ct: &[u8],
) -> Result<Vec<u8>, Error> {
    let mut in_out = ct.to_vec();

    open_in_place(crypto_backend, key_schedule, seq, aad, &mut in_out)?;

    Ok(in_out)
}

/// `Open(key, ComputeNonce(seq), aad, ct)`; on success `in_out` holds the
/// plaintext.
///
/// # Errors
///
/// [`Error::ExportOnly`] without an AEAD, [`Error::SequenceExhausted`] at the
/// bound. Every provider failure, a truncated ciphertext included, is
/// reported as [`Error::AuthenticationFailure`].
pub fn open_in_place<C: Crypto + ?Sized>(
    crypto_backend: &C,
    key_schedule: &KeySchedule,
    seq: u64,
    aad: &[u8],
    in_out: &mut Vec<u8>,
) -> Result<(), Error> {
    let aead = nonce_for(key_schedule, seq)?;

    crypto_backend
        .aead_open_in_place(&aead, aad, in_out)
        .map_err(|_| Error::AuthenticationFailure)
}
