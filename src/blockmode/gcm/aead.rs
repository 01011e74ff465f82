use super::{Gcm, STD_NONCE_SIZE, TAG_SIZE, check_tag_size};
use crate::blockmode::{Error, Result};
use crate::traits::{AEAD, Block};

/// GCM with a fixed nonce size `N` and tag size `T`, behind the [`AEAD`]
/// interface. `seal` writes `ciphertext || tag`; `open` verifies the tag
/// before any plaintext is written.
pub struct GcmAead<B: Block, const N: usize, const T: usize> {
    gcm: Gcm<B>,
}

#[cfg(feature = "aes")]
pub type Aes128Gcm = GcmAead<aes::Aes128, STD_NONCE_SIZE, TAG_SIZE>;
#[cfg(feature = "aes")]
pub type Aes256Gcm = GcmAead<aes::Aes256, STD_NONCE_SIZE, TAG_SIZE>;

// Returns an AES-128-GCM instance with standard nonce size 12 and tag size 16.
// The key must have length 16.
#[cfg(feature = "aes")]
pub fn new_aes128_gcm_std(key: &[u8; 16]) -> Aes128Gcm {
    use aes::cipher::{KeyInit, generic_array::GenericArray};

    GcmAead {
        gcm: Gcm::bind(aes::Aes128::new(GenericArray::from_slice(key))),
    }
}

impl<B: Block, const N: usize, const T: usize> GcmAead<B, N, T> {
    pub fn new(block: B) -> Result<Self> {
        check_tag_size(T)?;
        if N == 0 {
            return Err(Error::EmptyNonce);
        }
        Ok(GcmAead { gcm: Gcm::new(block)? })
    }

    pub fn gcm(&self) -> &Gcm<B> {
        &self.gcm
    }

    fn check_nonce(&self, nonce: &[u8]) -> Result<()> {
        if nonce.len() != N {
            return Err(Error::InvalidNonceSize(N, nonce.len()));
        }
        Ok(())
    }

    fn check_tag(&self, tag_len: usize) -> Result<()> {
        if tag_len != T {
            return Err(Error::InvalidTagSize(tag_len));
        }
        Ok(())
    }

    // CTR only, for ciphertext whose tag has already been verified.
    fn counter_crypt_inplace(&self, in_out: &mut [u8], nonce: &[u8]) -> Result<()> {
        let mut session = self.gcm.start(nonce)?;
        session.decrypt_inplace(in_out);
        Ok(())
    }
}

impl<B: Block, const N: usize, const T: usize> AEAD for GcmAead<B, N, T> {
    type Error = Error;

    fn overhead(&self) -> usize {
        T
    }

    fn nonce_size(&self) -> usize {
        N
    }

    fn seal(&self, out: &mut [u8], nonce: &[u8], plaintext: &[u8], add: Option<&[u8]>) -> Result<()> {
        self.check_nonce(nonce)?;

        let plaintext_length = plaintext.len();
        if out.len() < plaintext_length + T {
            return Err(Error::OutputTooSmall(plaintext_length + T, out.len()));
        }

        let (ciphertext, tag) = out.split_at_mut(plaintext_length);
        self.gcm
            .encrypt(nonce, add.unwrap_or(&[]), plaintext, ciphertext, &mut tag[..T])
    }

    fn open(&self, out: &mut [u8], nonce: &[u8], ciphertext: &[u8], add: Option<&[u8]>) -> Result<usize> {
        self.check_nonce(nonce)?;

        if ciphertext.len() < T {
            return Err(Error::GCMCiphertextTooSmall(ciphertext.len(), T));
        }

        let (ciphertext, tag) = ciphertext.split_at(ciphertext.len() - T);
        if out.len() < ciphertext.len() {
            return Err(Error::OutputTooSmall(ciphertext.len(), out.len()));
        }

        self.gcm.check(nonce, add.unwrap_or(&[]), ciphertext, tag)?;

        let out = &mut out[..ciphertext.len()];
        out.copy_from_slice(ciphertext);
        self.counter_crypt_inplace(out, nonce)?;
        Ok(ciphertext.len())
    }

    fn seal_inplace(&self, in_out: &mut [u8], tag: &mut [u8], nonce: &[u8], add: Option<&[u8]>) -> Result<()> {
        self.check_nonce(nonce)?;
        self.check_tag(tag.len())?;

        let mut session = self.gcm.start(nonce)?;
        session.put(add.unwrap_or(&[]))?;
        session.encrypt_inplace(in_out);
        session.finish(tag)
    }

    fn open_inplace(&self, in_out: &mut [u8], tag: &[u8], nonce: &[u8], add: Option<&[u8]>) -> Result<()> {
        self.check_nonce(nonce)?;
        self.check_tag(tag.len())?;

        self.gcm.check(nonce, add.unwrap_or(&[]), in_out, tag)?;
        self.counter_crypt_inplace(in_out, nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::Aes128;
    use aes::cipher::KeyInit;
    use hex_literal::hex;
    use std::vec::Vec;

    const KEY: [u8; 16] = hex!("feffe9928665731c6d6a8f9467308308");
    const NONCE: [u8; 12] = hex!("cafebabefacedbaddecaf888");
    const AAD: [u8; 20] = hex!("feedfacedeadbeeffeedfacedeadbeefabaddad2");
    const PLAIN: [u8; 60] = hex!(
        "d9313225f88406e5a55909c5aff5269a86a7a9531534f7da2e4c303d8a318a72"
        "1c3c0c95956809532fcf0e2449a6b525b16aedf5aa0de657ba637b39"
    );
    // NIST GCM test case 4, ciphertext || tag
    const SEALED: [u8; 76] = hex!(
        "42831ec2217774244b7221b784d0d49ce3aa212f2c02a4e035c17e2329aca12e"
        "21d514b25466931c7d8f6a5aac84aa051ba30b396a0aac973d58e091"
        "5bc94fbc3221a5db94fae95ae7121a47"
    );

    #[test]
    fn test_gcm_std() {
        let g = new_aes128_gcm_std(&KEY);
        assert_eq!(g.overhead(), 16);
        assert_eq!(g.nonce_size(), 12);

        let mut out = vec![0u8; PLAIN.len() + g.overhead()];
        g.seal(&mut out, &NONCE, &PLAIN, Some(&AAD[..])).unwrap();
        assert_eq!(out, SEALED);

        let mut decrypted = [0u8; 128];
        let n = g.open(&mut decrypted, &NONCE, &out, Some(&AAD[..])).unwrap();
        assert_eq!(decrypted[..n], PLAIN);

        let mut in_out = PLAIN.to_vec();
        let mut tag = [0u8; 16];
        g.seal_inplace(&mut in_out, &mut tag, &NONCE, Some(&AAD[..])).unwrap();
        assert_eq!(in_out, SEALED[..60]);
        assert_eq!(tag, SEALED[60..]);

        g.open_inplace(&mut in_out, &tag, &NONCE, Some(&AAD[..])).unwrap();
        assert_eq!(in_out, PLAIN);
    }

    #[test]
    fn test_none_equals_empty_add() {
        let g = new_aes128_gcm_std(&KEY);
        let mut a = vec![0u8; PLAIN.len() + 16];
        let mut b = vec![0u8; PLAIN.len() + 16];
        g.seal(&mut a, &NONCE, &PLAIN, None).unwrap();
        g.seal(&mut b, &NONCE, &PLAIN, Some("".as_bytes())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_open_rejects_before_writing() {
        let g = new_aes128_gcm_std(&KEY);

        let mut sealed = SEALED;
        sealed[3] ^= 0x10;
        let mut out = [0x55u8; 60];
        assert_eq!(
            g.open(&mut out, &NONCE, &sealed, Some(&AAD[..])),
            Err(Error::GCMAuthenticationError)
        );
        assert_eq!(out, [0x55; 60]);

        let mut in_out = SEALED[..60].to_vec();
        let untouched = in_out.clone();
        assert_eq!(
            g.open_inplace(&mut in_out, &SEALED[60..], &NONCE, None),
            Err(Error::GCMAuthenticationError)
        );
        assert_eq!(in_out, untouched);
    }

    #[test]
    fn test_size_errors() {
        let g = new_aes128_gcm_std(&KEY);

        let mut out = vec![0u8; PLAIN.len() + 15];
        assert_eq!(
            g.seal(&mut out, &NONCE, &PLAIN, None),
            Err(Error::OutputTooSmall(76, 75))
        );
        assert_eq!(
            g.seal(&mut out, &NONCE[..8], &PLAIN, None),
            Err(Error::InvalidNonceSize(12, 8))
        );
        assert_eq!(
            g.open(&mut out, &NONCE, &SEALED[..15], None),
            Err(Error::GCMCiphertextTooSmall(15, 16))
        );
        let mut short = [0u8; 10];
        assert_eq!(
            g.open(&mut short, &NONCE, &SEALED, Some(&AAD[..])),
            Err(Error::OutputTooSmall(60, 10))
        );
        let mut buf = PLAIN.to_vec();
        assert_eq!(
            g.seal_inplace(&mut buf, &mut [0u8; 12], &NONCE, None),
            Err(Error::InvalidTagSize(12))
        );
    }

    #[test]
    fn test_gcm_nonce8_tag12() {
        // NIST GCM test case 5, tag truncated to 12 bytes
        let g = GcmAead::<_, 8, 12>::new(Aes128::new_from_slice(&KEY).unwrap()).unwrap();
        let nonce = hex!("cafebabefacedbad");
        let wanted: Vec<u8> = [
            &hex!(
                "61353b4c2806934a777ff51fa22a4755699b2a714fcdc6f83766e5f97b6c7423"
                "73806900e49f24b22b097544d4896b424989b5e1ebac0f07c23f4598"
            )[..],
            &hex!("3612d2e79e3b0785561be14a")[..],
        ]
        .concat();

        let mut out = vec![0u8; PLAIN.len() + 12];
        g.seal(&mut out, &nonce, &PLAIN, Some(&AAD[..])).unwrap();
        assert_eq!(out, wanted);

        let mut decrypted = vec![0u8; PLAIN.len()];
        assert_eq!(g.open(&mut decrypted, &nonce, &out, Some(&AAD[..])), Ok(60));
        assert_eq!(decrypted, PLAIN);
    }

    #[test]
    fn test_invalid_parameters() {
        let key = Aes128::new_from_slice(&KEY).unwrap();
        assert!(matches!(GcmAead::<_, 12, 2>::new(key.clone()), Err(Error::InvalidTagSize(2))));
        assert!(matches!(GcmAead::<_, 0, 16>::new(key), Err(Error::EmptyNonce)));
    }
}
