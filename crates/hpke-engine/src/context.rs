//! The stateful HPKE context.
//!
//! A context is created for one role, optionally configured with PSK and
//! authentication material, and derives its key schedule lazily: on the first
//! `seal`/`open`, or on an explicit `setup` when only secret export is wanted.
//!
//! ```text
//! Created -> (PSK / auth material)* -> KeyScheduled -> Sealing|Opening* -> Exhausted|Closed
//! ```
//!
//! Roles are encoded in the type: [`HpkeContext<C, Sender>`] can only seal,
//! [`HpkeContext<C, Recipient>`] can only open.

use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use hpke_engine_crypto::{
    Crypto, EncapsulatedSecret, HpkeKeyPair, HpkePublicKey, HpkePublicKeyRef,
};
use zeroize::Zeroizing;

use crate::HpkeMode;
use crate::error::Error;
use crate::key_schedule::{KeySchedule, MIN_PSK_LEN};
use crate::suite::Suite;
use crate::{aead, kem};

mod sealed {
    pub trait Sealed {}
}

/// A context role, see [`Sender`] and [`Recipient`].
pub trait Role: sealed::Sealed + fmt::Debug {
    /// Name used in log events.
    const NAME: &'static str;
}

#[derive(Debug)]
/// Marker type for [`HpkeContext`] that indicates the `sender` role.
pub struct Sender;

#[derive(Debug)]
/// Marker type for [`HpkeContext`] that indicates the `recipient` role.
pub struct Recipient;

impl sealed::Sealed for Sender {}
impl sealed::Sealed for Recipient {}

impl Role for Sender {
    const NAME: &'static str = "sender";
}

impl Role for Recipient {
    const NAME: &'static str = "recipient";
}

struct Psk {
    id: Vec<u8>,
    psk: Zeroizing<Vec<u8>>,
}

/// The HPKE cryptographic context.
///
/// HPKE allows multiple encryption operations to be done based on a given
/// setup transaction. Since the public key operations involved in setup are
/// typically more expensive than symmetric encryption or decryption, this
/// allows applications to amortize the cost of the public key operations.
///
/// In order to avoid nonce reuse, encryption is stateful: the context keeps
/// the sequence number of the next message and refuses to go past the nonce
/// width.
///
/// The context owns its primitives provider `C` for its whole lifetime.
/// Dropping the context (or [`close`](Self::close)-ing it) zeroizes every
/// secret it holds.
pub struct HpkeContext<C, R> {
    crypto_backend: C,

    mode: HpkeMode,
    suite: Suite,

    psk: Option<Psk>,

    /// Sender: the ephemeral key pair, kept for the context's lifetime.
    ephemeral: Option<HpkeKeyPair>,

    /// Sender: the static key pair authenticating the sender.
    auth_priv: Option<HpkeKeyPair>,

    /// Recipient: the sender's static public key.
    auth_pub: Option<HpkePublicKey>,

    enc: Option<EncapsulatedSecret>,
    key_schedule: Option<KeySchedule>,

    /// The sequence number of the next message.
    seq: u64,
    exhausted: bool,

    _role: PhantomData<R>,
}

impl<C, R: Role> fmt::Debug for HpkeContext<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HpkeContext")
            .field("role", &R::NAME)
            .field("mode", &self.mode)
            .field("suite", &self.suite)
            .field("scheduled", &self.key_schedule.is_some())
            .field("seq", &self.seq)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl<C: Crypto, R: Role> HpkeContext<C, R> {
    fn new_for_role(mode: HpkeMode, suite: Suite, crypto_backend: C) -> Result<Self, Error> {
        suite.check()?;

        if !suite.is_supported_by(&crypto_backend) {
            tracing::debug!(%suite, "suite not supported by the crypto backend");

            return Err(Error::UnsupportedSuite);
        }

        tracing::debug!(role = R::NAME, %mode, %suite, "created context");

        Ok(Self {
            crypto_backend,
            mode,
            suite,
            psk: None,
            ephemeral: None,
            auth_priv: None,
            auth_pub: None,
            enc: None,
            key_schedule: None,
            seq: 0,
            exhausted: false,
            _role: PhantomData,
        })
    }

    #[inline]
    /// The mode of the context.
    pub const fn mode(&self) -> HpkeMode {
        self.mode
    }

    #[inline]
    /// The suite of the context.
    pub const fn suite(&self) -> Suite {
        self.suite
    }

    #[inline]
    /// Whether the key schedule has been derived.
    pub const fn is_scheduled(&self) -> bool {
        self.key_schedule.is_some()
    }

    #[inline]
    /// The sequence number the next `seal`/`open` will consume.
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Overrides the next sequence number, e.g. to resume a context after an
    /// out-of-band state transfer. The caller must never let a (key, nonce)
    /// pair be used twice.
    ///
    /// # Errors
    ///
    /// [`Error::SequenceExhausted`] if the context is exhausted or `seq` lies
    /// beyond the suite's bound.
    pub fn set_seq(&mut self, seq: u64) -> Result<(), Error> {
        if self.exhausted || seq > aead::max_seq(self.suite.aead_id) {
            return Err(Error::SequenceExhausted);
        }

        tracing::debug!(role = R::NAME, from = self.seq, to = seq, "sequence reset");

        self.seq = seq;

        Ok(())
    }

    /// Attaches the pre-shared key and its identifier.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyScheduled`] after the key schedule exists.
    /// - [`Error::ModeKeyMismatch`] if the mode takes no PSK or either input
    ///   is empty.
    /// - [`Error::InsecurePsk`] if `psk` is shorter than 32 bytes.
    pub fn set_psk(&mut self, psk_id: &[u8], psk: &[u8]) -> Result<(), Error> {
        self.ensure_unscheduled()?;

        if !self.mode.uses_psk() {
            return Err(Error::ModeKeyMismatch("mode does not take a PSK"));
        }

        if psk_id.is_empty() || psk.is_empty() {
            return Err(Error::ModeKeyMismatch("psk and psk_id must be non-empty"));
        }

        if psk.len() < MIN_PSK_LEN {
            return Err(Error::InsecurePsk);
        }

        self.psk = Some(Psk {
            id: psk_id.to_vec(),
            psk: Zeroizing::new(psk.to_vec()),
        });

        Ok(())
    }

    /// See [`export_into`](Self::export_into).
    ///
    /// # Errors
    ///
    /// See [`export_into`](Self::export_into).
    pub fn export(&self, exporter_context: &[u8], len: usize) -> Result<Zeroizing<Vec<u8>>, Error> {
        let key_schedule = self.key_schedule.as_ref().ok_or(Error::NotScheduled)?;

        Ok(key_schedule
            .export(&self.crypto_backend, self.suite, exporter_context, len)?
            .into_inner())
    }

    /// 5.3. Secret Export
    ///
    /// Fills `out` with `LabeledExpand(exporter_secret, "sec",
    /// exporter_context, out.len())`. Does not touch the sequence number.
    ///
    /// # Errors
    ///
    /// [`Error::NotScheduled`] before the key schedule exists,
    /// [`Error::InvalidInput`] if `out` is longer than `255 * Nh`.
    pub fn export_into(&self, exporter_context: &[u8], out: &mut [u8]) -> Result<(), Error> {
        let secret = self.export(exporter_context, out.len())?;

        out.copy_from_slice(&secret);

        Ok(())
    }

    /// Ends the context. Every secret is zeroized.
    pub fn close(self) {
        tracing::debug!(role = R::NAME, seq = self.seq, "closed context");
    }

    #[inline]
    /// Returns the primitives provider.
    pub const fn crypto_backend(&self) -> &C {
        &self.crypto_backend
    }

    const fn ensure_unscheduled(&self) -> Result<(), Error> {
        if self.key_schedule.is_some() {
            return Err(Error::AlreadyScheduled);
        }

        Ok(())
    }

    /// Checks that the next AEAD call may run: the suite can seal/open and
    /// `seq` is below the bound. Reaching the bound is terminal.
    fn ensure_sequence(&mut self) -> Result<(), Error> {
        if self.suite.is_export_only() {
            return Err(Error::ExportOnly);
        }

        if self.exhausted || self.seq >= aead::max_seq(self.suite.aead_id) {
            if !self.exhausted {
                tracing::warn!(role = R::NAME, suite = %self.suite, "sequence number exhausted");
            }

            self.exhausted = true;

            return Err(Error::SequenceExhausted);
        }

        Ok(())
    }

    fn psk_input(&self) -> Option<(&[u8], &[u8])> {
        self.psk
            .as_ref()
            .map(|psk| (psk.id.as_slice(), psk.psk.as_slice()))
    }

    fn ensure_psk_material(&self) -> Result<(), Error> {
        if self.mode.uses_psk() && self.psk.is_none() {
            return Err(Error::ModeKeyMismatch("PSK mode requires a PSK"));
        }

        Ok(())
    }

    fn key_schedule(&self) -> Result<&KeySchedule, Error> {
        self.key_schedule.as_ref().ok_or(Error::NotScheduled)
    }
}

impl<C: Crypto> HpkeContext<C, Sender> {
    /// Creates a sender context.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedSuite`] if the suite is not registered or the
    /// primitives provider cannot run it.
    pub fn new(mode: HpkeMode, suite: Suite, crypto_backend: C) -> Result<Self, Error> {
        Self::new_for_role(mode, suite, crypto_backend)
    }

    /// Sets the ephemeral key pair instead of generating one on first use.
    ///
    /// Mostly useful for deterministic tests.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyScheduled`] after the key schedule exists,
    /// [`Error::ModeKeyMismatch`] if the key pair is for another KEM.
    pub fn set_sender_priv(&mut self, key_pair: HpkeKeyPair) -> Result<(), Error> {
        self.ensure_unscheduled()?;
        self.ensure_kem(&key_pair)?;

        self.ephemeral = Some(key_pair);

        Ok(())
    }

    /// Sets the sender's static key pair for the authenticated modes.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyScheduled`] after the key schedule exists,
    /// [`Error::ModeKeyMismatch`] if the mode is not authenticated or the key
    /// pair is for another KEM.
    pub fn set_auth_priv(&mut self, key_pair: HpkeKeyPair) -> Result<(), Error> {
        self.ensure_unscheduled()?;

        if !self.mode.is_auth() {
            return Err(Error::ModeKeyMismatch("mode does not authenticate the sender"));
        }

        self.ensure_kem(&key_pair)?;

        self.auth_priv = Some(key_pair);

        Ok(())
    }

    #[inline]
    /// The encapsulated key, once the key schedule exists.
    pub const fn enc(&self) -> Option<&EncapsulatedSecret> {
        self.enc.as_ref()
    }

    /// Derives the key schedule without sealing, e.g. for export-only use.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyScheduled`] if already derived, otherwise as for
    /// [`seal`](Self::seal).
    pub fn setup(&mut self, pk_r: &[u8], info: &[u8]) -> Result<EncapsulatedSecret, Error> {
        self.ensure_unscheduled()?;

        self.schedule(pk_r, info)
    }

    /// See [`seal_in_place`](Self::seal_in_place).
    ///
    /// # Errors
    ///
    /// See [`seal_in_place`](Self::seal_in_place).
    pub fn seal(
        &mut self,
        pk_r: &[u8],
        info: &[u8],
        aad: &[u8],
        pt: &[u8],
    ) -> Result<(EncapsulatedSecret, Vec<u8>), Error> {
        let mut in_out = pt.to_vec();

        let enc = self.seal_in_place(pk_r, info, aad, &mut in_out)?;

        Ok((enc, in_out))
    }

    /// Like [`seal`](Self::seal), writing the ciphertext into `ct_out`.
    ///
    /// Returns the encapsulated key and the number of bytes written.
    ///
    /// # Errors
    ///
    /// [`Error::BufferTooSmall`] if `ct_out` cannot hold `pt.len() + Nt`
    /// bytes, checked before any other work; otherwise as for
    /// [`seal`](Self::seal).
    pub fn seal_into(
        &mut self,
        pk_r: &[u8],
        info: &[u8],
        aad: &[u8],
        pt: &[u8],
        ct_out: &mut [u8],
    ) -> Result<(EncapsulatedSecret, usize), Error> {
        let needed = self.suite.expansion(pt.len())?.cipher_len;

        if ct_out.len() < needed {
            return Err(Error::BufferTooSmall { needed });
        }

        let (enc, ct) = self.seal(pk_r, info, aad, pt)?;

        ct_out[..ct.len()].copy_from_slice(&ct);

        Ok((enc, ct.len()))
    }

    /// 5.2. Encryption and Decryption
    ///
    /// ```text
    /// def Context.Seal(aad, pt):
    ///   ct = Seal(self.key, self.ComputeNonce(self.seq), aad, pt)
    ///   self.IncrementSeq()
    ///   return ct
    /// ```
    ///
    /// On the first call this encapsulates to `pk_r` and derives the key
    /// schedule from `info`; later calls reuse both and ignore `pk_r` and
    /// `info`. The returned `enc` is the same for every call.
    ///
    /// # Errors
    ///
    /// - [`Error::ExportOnly`] for export-only suites.
    /// - [`Error::SequenceExhausted`] once `seq` reached the bound.
    /// - [`Error::ModeKeyMismatch`] if PSK or auth material does not match the
    ///   mode.
    /// - [`Error::InvalidInput`] if `pk_r` is malformed.
    ///
    /// A failed call does not advance the sequence number.
    pub fn seal_in_place(
        &mut self,
        pk_r: &[u8],
        info: &[u8],
        aad: &[u8],
        in_out: &mut Vec<u8>,
    ) -> Result<EncapsulatedSecret, Error> {
        self.ensure_sequence()?;

        // enc is only ever stored together with the key schedule
        let enc = match self.enc.clone() {
            Some(enc) => enc,
            None => self.schedule(pk_r, info)?,
        };

        aead::seal_in_place(
            &self.crypto_backend,
            self.key_schedule()?,
            self.seq,
            aad,
            in_out,
        )?;

        self.seq += 1;

        Ok(enc)
    }

    fn ensure_kem(&self, key_pair: &HpkeKeyPair) -> Result<(), Error> {
        if key_pair.kem_id() != self.suite.kem_id {
            return Err(Error::ModeKeyMismatch("key pair belongs to another KEM"));
        }

        Ok(())
    }

    fn schedule(&mut self, pk_r: &[u8], info: &[u8]) -> Result<EncapsulatedSecret, Error> {
        self.ensure_psk_material()?;

        match (self.mode.is_auth(), self.auth_priv.is_some()) {
            (true, false) => return Err(Error::ModeKeyMismatch("auth mode requires a sender key pair")),
            (false, true) => return Err(Error::ModeKeyMismatch("sender key pair given to a mode without auth")),
            _ => {}
        }

        let kem_id = self.suite.kem_id;

        let ephemeral = match self.ephemeral.take() {
            Some(ephemeral) => ephemeral,
            None => kem::generate_key_pair(&mut self.crypto_backend, kem_id)?,
        };

        let encapsulated = kem::encap(
            &self.crypto_backend,
            kem_id,
            HpkePublicKeyRef::from(pk_r),
            &ephemeral,
            self.auth_priv.as_ref(),
        );

        // keep the ephemeral key whatever happened, so every enc matches
        self.ephemeral = Some(ephemeral);

        let (shared_secret, enc) = encapsulated?;

        let key_schedule = KeySchedule::derive(
            &self.crypto_backend,
            self.mode,
            self.suite,
            &shared_secret,
            info,
            self.psk_input(),
        )?;

        self.key_schedule = Some(key_schedule);
        self.enc = Some(enc.clone());

        Ok(enc)
    }
}

impl<C: Crypto> HpkeContext<C, Recipient> {
    /// Creates a recipient context.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedSuite`] if the suite is not registered or the
    /// primitives provider cannot run it.
    pub fn new(mode: HpkeMode, suite: Suite, crypto_backend: C) -> Result<Self, Error> {
        Self::new_for_role(mode, suite, crypto_backend)
    }

    /// Sets the sender's static public key for the authenticated modes.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyScheduled`] after the key schedule exists.
    /// - [`Error::ModeKeyMismatch`] if the mode is not authenticated.
    /// - [`Error::Decap`] if the key has the wrong length for the KEM.
    pub fn set_auth_pub(&mut self, pk_s: &[u8]) -> Result<(), Error> {
        self.ensure_unscheduled()?;

        if !self.mode.is_auth() {
            return Err(Error::ModeKeyMismatch("mode does not authenticate the sender"));
        }

        self.auth_pub = Some(HpkePublicKey::new(self.suite.kem_id, pk_s).map_err(|_| Error::Decap)?);

        Ok(())
    }

    /// Derives the key schedule without opening, e.g. for export-only use.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyScheduled`] if already derived, otherwise as for
    /// [`open`](Self::open).
    pub fn setup(&mut self, enc: &[u8], sk_r: &HpkeKeyPair, info: &[u8]) -> Result<(), Error> {
        self.ensure_unscheduled()?;

        self.schedule(enc, sk_r, info)
    }

    /// See [`open_in_place`](Self::open_in_place).
    ///
    /// # Errors
    ///
    /// See [`open_in_place`](Self::open_in_place).
    pub fn open(
        &mut self,
        enc: &[u8],
        sk_r: &HpkeKeyPair,
        info: &[u8],
        aad: &[u8],
        ct: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let mut in_out = ct.to_vec();

        self.open_in_place(enc, sk_r, info, aad, &mut in_out)?;

        Ok(in_out)
    }

    /// Like [`open`](Self::open), writing the plaintext into `pt_out`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// [`Error::BufferTooSmall`] if `pt_out` cannot hold `ct.len() - Nt`
    /// bytes, checked before any other work; otherwise as for
    /// [`open`](Self::open).
    pub fn open_into(
        &mut self,
        enc: &[u8],
        sk_r: &HpkeKeyPair,
        info: &[u8],
        aad: &[u8],
        ct: &[u8],
        pt_out: &mut [u8],
    ) -> Result<usize, Error> {
        let needed = ct.len().saturating_sub(self.suite.aead_id.n_tag());

        if pt_out.len() < needed {
            return Err(Error::BufferTooSmall { needed });
        }

        let pt = Zeroizing::new(self.open(enc, sk_r, info, aad, ct)?);

        pt_out[..pt.len()].copy_from_slice(&pt);

        Ok(pt.len())
    }

    /// 5.2. Encryption and Decryption
    ///
    /// ```text
    /// def Context.Open(aad, ct):
    ///   pt = Open(self.key, self.ComputeNonce(self.seq), aad, ct)
    ///   if pt == OpenError:
    ///     raise OpenError
    ///   self.IncrementSeq()
    ///   return pt
    /// ```
    ///
    /// On the first call this decapsulates `enc` with `sk_r` and derives the
    /// key schedule from `info`; later calls reuse it and ignore `enc`,
    /// `sk_r` and `info`.
    ///
    /// # Errors
    ///
    /// - [`Error::ExportOnly`] for export-only suites.
    /// - [`Error::SequenceExhausted`] once `seq` reached the bound.
    /// - [`Error::ModeKeyMismatch`] if PSK or auth material does not match the
    ///   mode.
    /// - [`Error::Decap`] if `enc` is malformed.
    /// - [`Error::AuthenticationFailure`] if the ciphertext does not verify.
    ///
    /// A failed call does not advance the sequence number.
    pub fn open_in_place(
        &mut self,
        enc: &[u8],
        sk_r: &HpkeKeyPair,
        info: &[u8],
        aad: &[u8],
        in_out: &mut Vec<u8>,
    ) -> Result<(), Error> {
        self.ensure_sequence()?;

        if self.key_schedule.is_none() {
            self.schedule(enc, sk_r, info)?;
        }

        aead::open_in_place(
            &self.crypto_backend,
            self.key_schedule()?,
            self.seq,
            aad,
            in_out,
        )?;

        self.seq += 1;

        Ok(())
    }

    fn schedule(&mut self, enc: &[u8], sk_r: &HpkeKeyPair, info: &[u8]) -> Result<(), Error> {
        self.ensure_psk_material()?;

        if self.mode.is_auth() && self.auth_pub.is_none() {
            return Err(Error::ModeKeyMismatch("auth mode requires the sender public key"));
        }

        if sk_r.kem_id() != self.suite.kem_id {
            return Err(Error::ModeKeyMismatch("key pair belongs to another KEM"));
        }

        let shared_secret = kem::decap(
            &self.crypto_backend,
            self.suite.kem_id,
            enc,
            sk_r,
            self.auth_pub.as_ref().map(HpkePublicKeyRef::from),
        )?;

        let key_schedule = KeySchedule::derive(
            &self.crypto_backend,
            self.mode,
            self.suite,
            &shared_secret,
            info,
            self.psk_input(),
        )?;

        self.key_schedule = Some(key_schedule);
        self.enc = Some(EncapsulatedSecret::new(enc));

        Ok(())
    }
}
