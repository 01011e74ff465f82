// gcm implements the Galois Counter Mode of NIST SP 800-38D over any block
// cipher with a 128-bit block. See
// https://csrc.nist.gov/groups/ST/toolkit/BCM/documents/proposedmodes/gcm/gcm-revised-spec.pdf
mod aead;
mod ghash;
mod table;

pub use aead::*;
pub use table::MultiplicationTable;

use ghash::{GHasher, xor_into};

use super::{Error, Result};
use crate::traits::Block;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

pub const BLOCK_SIZE: usize = 16;
pub const TAG_SIZE: usize = 16;
pub const MIN_TAG_SIZE: usize = 4;
pub const STD_NONCE_SIZE: usize = 12;

/// A block cipher bound to GCM, together with the multiplication table of
/// its hash subkey. Messages are processed by [`GcmSession`]s obtained from
/// [`Gcm::start`]; any number of them may borrow the same `Gcm`.
pub struct Gcm<B: Block> {
    cipher: B,
    table: MultiplicationTable,
}

impl<B: Block> Gcm<B> {
    /// Binds `cipher`, which must have a 16 byte block.
    pub fn new(cipher: B) -> Result<Self> {
        let block_size = cipher.block_size();
        if block_size != BLOCK_SIZE {
            return Err(Error::InvalidBlockSize(block_size));
        }
        Ok(Gcm::bind(cipher))
    }

    // The caller has checked that cipher has a 16 byte block.
    fn bind(cipher: B) -> Self {
        // h = CIPH_K(0^128)
        let mut h = [0u8; BLOCK_SIZE];
        cipher.encrypt_inplace(&mut h);
        let table = MultiplicationTable::new(&h);
        h.zeroize();

        Gcm { cipher, table }
    }

    pub fn cipher(&self) -> &B {
        &self.cipher
    }

    /// Starts a message under `iv`.
    ///
    /// The caller must never start two messages with the same IV under the
    /// same key.
    pub fn start(&self, iv: &[u8]) -> Result<GcmSession<'_, B>> {
        if iv.is_empty() {
            return Err(Error::EmptyNonce);
        }

        let counter = self.table.derive_counter(iv);
        let mut tag_mask = [0; BLOCK_SIZE];
        self.cipher.encrypt(&mut tag_mask, &counter);

        Ok(GcmSession {
            cipher: &self.cipher,
            ghash: GHasher::new(&self.table),
            counter,
            tag_mask,
            keystream: [0; BLOCK_SIZE],
            keystream_used: BLOCK_SIZE,
            aad_len: 0,
            text_len: 0,
            payload_started: false,
        })
    }

    /// Encrypts `input` into `output[..input.len()]` and writes the tag. The
    /// tag length, between 4 and 16, is `tag.len()`.
    pub fn encrypt(&self, iv: &[u8], aad: &[u8], input: &[u8], output: &mut [u8], tag: &mut [u8]) -> Result<()> {
        check_tag_size(tag.len())?;
        check_output_size(input.len(), output.len())?;

        let mut session = self.start(iv)?;
        session.put(aad)?;
        session.encrypt(input, output)?;
        session.finish(tag)
    }

    /// Decrypts `input` into `output[..input.len()]` and verifies `tag`.
    ///
    /// If authentication fails the recovered bytes in `output` are wiped and
    /// [`Error::GCMAuthenticationError`] is returned.
    pub fn decrypt(&self, iv: &[u8], aad: &[u8], input: &[u8], output: &mut [u8], tag: &[u8]) -> Result<()> {
        check_tag_size(tag.len())?;
        check_output_size(input.len(), output.len())?;

        let mut session = self.start(iv)?;
        session.put(aad)?;
        session.decrypt(input, output)?;
        let res = session.finish_and_check_tag(tag);
        if res.is_err() {
            output[..input.len()].zeroize();
        }
        res
    }

    /// Verifies `tag` over `aad` and `ciphertext` without decrypting.
    pub fn check(&self, iv: &[u8], aad: &[u8], ciphertext: &[u8], tag: &[u8]) -> Result<()> {
        check_tag_size(tag.len())?;

        let mut session = self.start(iv)?;
        session.put(aad)?;
        session.authenticate(ciphertext);
        session.finish_and_check_tag(tag)
    }
}

/// The per-message state of GCM: the counter, the tag mask E(K, Y0) and the
/// running GHASH.
///
/// Calls must follow `put`* then `encrypt`/`decrypt`* and end with one of
/// the consuming [`finish`](GcmSession::finish) or
/// [`finish_and_check_tag`](GcmSession::finish_and_check_tag). Data may be
/// fed in pieces of any size, the result is the same as for one call over
/// the concatenation.
pub struct GcmSession<'a, B: Block> {
    cipher: &'a B,
    ghash: GHasher<'a>,

    // the counter block of the last keystream block generated.
    counter: [u8; BLOCK_SIZE],
    tag_mask: [u8; BLOCK_SIZE],

    keystream: [u8; BLOCK_SIZE],
    // keystream[keystream_used..] is still unused.
    keystream_used: usize,

    aad_len: u64,
    text_len: u64,
    payload_started: bool,
}

impl<B: Block> GcmSession<'_, B> {
    /// Adds additional authenticated data. All of it must come before the
    /// first call to encrypt or decrypt.
    pub fn put(&mut self, aad: &[u8]) -> Result<()> {
        if self.payload_started {
            return Err(Error::AadAfterPayload);
        }
        self.ghash.update(aad);
        self.aad_len += aad.len() as u64;
        Ok(())
    }

    pub fn encrypt(&mut self, src: &[u8], dst: &mut [u8]) -> Result<()> {
        check_output_size(src.len(), dst.len())?;
        let dst = &mut dst[..src.len()];
        dst.copy_from_slice(src);
        self.encrypt_inplace(dst);
        Ok(())
    }

    pub fn encrypt_inplace(&mut self, in_out: &mut [u8]) {
        self.begin_payload();
        self.xor_keystream(in_out);
        self.ghash.update(in_out);
        self.text_len += in_out.len() as u64;
    }

    /// Decrypts `src` into `dst`.
    ///
    /// The plaintext must not be used before
    /// [`finish_and_check_tag`](GcmSession::finish_and_check_tag) succeeds.
    pub fn decrypt(&mut self, src: &[u8], dst: &mut [u8]) -> Result<()> {
        check_output_size(src.len(), dst.len())?;
        let dst = &mut dst[..src.len()];
        dst.copy_from_slice(src);
        self.decrypt_inplace(dst);
        Ok(())
    }

    pub fn decrypt_inplace(&mut self, in_out: &mut [u8]) {
        self.begin_payload();
        // GHASH runs over the ciphertext, before it is overwritten.
        self.ghash.update(in_out);
        self.xor_keystream(in_out);
        self.text_len += in_out.len() as u64;
    }

    /// Computes the tag and writes its first `tag.len()` bytes, 4 to 16,
    /// into `tag`.
    pub fn finish(mut self, tag: &mut [u8]) -> Result<()> {
        check_tag_size(tag.len())?;
        let mut full = self.compute_tag();
        tag.copy_from_slice(&full[..tag.len()]);
        full.zeroize();
        Ok(())
    }

    /// Computes the tag and compares its first `tag.len()` bytes, 4 to 16,
    /// with `tag` in constant time.
    pub fn finish_and_check_tag(mut self, tag: &[u8]) -> Result<()> {
        check_tag_size(tag.len())?;
        let mut expected = self.compute_tag();
        let ok: bool = expected[..tag.len()].ct_eq(tag).into();
        expected.zeroize();
        if ok { Ok(()) } else { Err(Error::GCMAuthenticationError) }
    }

    // Folds ciphertext into GHASH without decrypting it.
    fn authenticate(&mut self, ciphertext: &[u8]) {
        self.begin_payload();
        self.ghash.update(ciphertext);
        self.text_len += ciphertext.len() as u64;
    }

    fn begin_payload(&mut self) {
        if !self.payload_started {
            self.ghash.pad();
            self.payload_started = true;
        }
    }

    // Generates the keystream of the next counter. The counter is
    // incremented before use, so the first block is E(K, Y1).
    fn next_keystream(&mut self) {
        inc32(&mut self.counter);
        self.cipher.encrypt(&mut self.keystream, &self.counter);
        self.keystream_used = 0;
    }

    fn xor_keystream(&mut self, in_out: &mut [u8]) {
        let mut off = 0;
        while off < in_out.len() {
            if self.keystream_used == BLOCK_SIZE {
                self.next_keystream();
            }
            let n = core::cmp::min(BLOCK_SIZE - self.keystream_used, in_out.len() - off);
            xor_into(
                &mut in_out[off..off + n],
                &self.keystream[self.keystream_used..self.keystream_used + n],
            );
            self.keystream_used += n;
            off += n;
        }
    }

    fn compute_tag(&mut self) -> [u8; BLOCK_SIZE] {
        self.begin_payload();
        let mut s = self.ghash.sum(self.aad_len, self.text_len);
        xor_into(&mut s, &self.tag_mask);
        s
    }
}

impl<B: Block> Drop for GcmSession<'_, B> {
    fn drop(&mut self) {
        self.counter.zeroize();
        self.tag_mask.zeroize();
        self.keystream.zeroize();
    }
}

#[inline]
fn check_tag_size(n: usize) -> Result<()> {
    if !(MIN_TAG_SIZE..=TAG_SIZE).contains(&n) {
        return Err(Error::InvalidTagSize(n));
    }
    Ok(())
}

#[inline]
fn check_output_size(want: usize, got: usize) -> Result<()> {
    if got < want {
        return Err(Error::OutputTooSmall(want, got));
    }
    Ok(())
}

// inc32 increments the rightmost 32 bits of the counter block, wrapping
// modulo 2^32.
#[inline]
fn inc32(counter: &mut [u8; BLOCK_SIZE]) {
    let mut ctr = [0u8; 4];
    ctr.copy_from_slice(&counter[BLOCK_SIZE - 4..]);
    let x = u32::from_be_bytes(ctr).wrapping_add(1);
    counter[BLOCK_SIZE - 4..].copy_from_slice(&x.to_be_bytes());
}
