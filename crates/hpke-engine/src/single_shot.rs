//! Single-shot encryption ([RFC 9180, Section 6]): set up a context, seal or
//! open exactly one message, and drop the context.
//!
//! [RFC 9180, Section 6]: https://www.rfc-editor.org/rfc/rfc9180.html#section-6

use alloc::vec::Vec;

use hpke_engine_crypto::{Crypto, EncapsulatedSecret, HpkeKeyPair};

use crate::HpkeMode;
use crate::context::{HpkeContext, Recipient, Sender};
use crate::error::Error;
use crate::suite::Suite;

#[allow(clippy::too_many_arguments)]
/// ```text
/// def Seal<MODE>(pkR, info, aad, pt, ...):
///   enc, ctx = Setup<MODE>S(pkR, info, ...)
///   ct = ctx.Seal(aad, pt)
///   return enc, ct
/// ```
///
/// `psk` is `(psk_id, psk)`. `auth_key` is the sender's static key pair.
/// `sender_key` pins the ephemeral key pair instead of generating one, and
/// `seq` seals at that sequence number instead of 0.
///
/// # Errors
///
/// As for [`HpkeContext::<C, Sender>::seal`](HpkeContext::seal), plus the
/// setter errors for `psk`, `auth_key`, `sender_key` and `seq`.
pub fn encrypt<C: Crypto>(
    crypto_backend: C,
    mode: HpkeMode,
    suite: Suite,
    pk_r: &[u8],
    info: &[u8],
    aad: &[u8],
    pt: &[u8],
    psk: Option<(&[u8], &[u8])>,
    auth_key: Option<HpkeKeyPair>,
    sender_key: Option<HpkeKeyPair>,
    seq: Option<u64>,
) -> Result<(EncapsulatedSecret, Vec<u8>), Error> {
    let mut ctx = HpkeContext::<C, Sender>::new(mode, suite, crypto_backend)?;

    if let Some((psk_id, psk)) = psk {
        ctx.set_psk(psk_id, psk)?;
    }

    if let Some(auth_key) = auth_key {
        ctx.set_auth_priv(auth_key)?;
    }

    if let Some(sender_key) = sender_key {
        ctx.set_sender_priv(sender_key)?;
    }

    if let Some(seq) = seq {
        ctx.set_seq(seq)?;
    }

    ctx.seal(pk_r, info, aad, pt)
}

#[allow(clippy::too_many_arguments)]
/// ```text
/// def Open<MODE>(enc, skR, info, aad, ct, ...):
///   ctx = Setup<MODE>R(enc, skR, info, ...)
///   return ctx.Open(aad, ct)
/// ```
///
/// `psk` is `(psk_id, psk)`. `auth_pub` is the sender's static public key.
/// `seq` opens at that sequence number instead of 0.
///
/// # Errors
///
/// As for [`HpkeContext::<C, Recipient>::open`](HpkeContext::open), plus the
/// setter errors for `psk`, `auth_pub` and `seq`.
pub fn decrypt<C: Crypto>(
    crypto_backend: C,
    mode: HpkeMode,
    suite: Suite,
    enc: &[u8],
    sk_r: &HpkeKeyPair,
    info: &[u8],
    aad: &[u8],
    ct: &[u8],
    psk: Option<(&[u8], &[u8])>,
    auth_pub: Option<&[u8]>,
    seq: Option<u64>,
) -> Result<Vec<u8>, Error> {
    let mut ctx = HpkeContext::<C, Recipient>::new(mode, suite, crypto_backend)?;

    if let Some((psk_id, psk)) = psk {
        ctx.set_psk(psk_id, psk)?;
    }

    if let Some(auth_pub) = auth_pub {
        ctx.set_auth_pub(auth_pub)?;
    }

    if let Some(seq) = seq {
        ctx.set_seq(seq)?;
    }

    ctx.open(enc, sk_r, info, aad, ct)
}
