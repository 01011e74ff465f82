pub trait Block {
    fn block_size(&self) -> usize;

    // Encrypt as many blocks as possible from src to dst.
    // More precisely, encrypt min(dst.len()/BLOCK_SIZE, src.len()/BLOCK_SIZE) blocks.
    // Returns the number of bytes encrypted.
    fn encrypt(&self, dst: &mut [u8], src: &[u8]) -> usize;

    fn encrypt_inplace(&self, in_out: &mut [u8]) -> usize;
}

pub trait AEAD {
    type Error;

    // NonceSize returns the size of the nonce that must be passed to Seal
    // and Open.
    fn nonce_size(&self) -> usize;

    // Overhead returns the maximum difference between the lengths of a
    // plaintext and its ciphertext.
    fn overhead(&self) -> usize;

    fn seal(&self, out: &mut [u8], nonce: &[u8], plaintext: &[u8], add: Option<&[u8]>) -> Result<(), Self::Error>;

    fn open(&self, out: &mut [u8], nonce: &[u8], ciphertext: &[u8], add: Option<&[u8]>) -> Result<usize, Self::Error>;

    fn seal_inplace(&self, in_out: &mut [u8], tag: &mut [u8], nonce: &[u8], add: Option<&[u8]>) -> Result<(), Self::Error>;

    // On failure in_out is left untouched.
    fn open_inplace(&self, in_out: &mut [u8], tag: &[u8], nonce: &[u8], add: Option<&[u8]>) -> Result<(), Self::Error>;
}

#[cfg(feature = "aes")]
mod aes_block {
    use super::Block;
    use aes::cipher::{BlockEncrypt, generic_array::GenericArray};
    use core::cmp::min;

    const AES_BLOCK_SIZE: usize = 16;

    macro_rules! impl_block_for_aes {
        ($($aes:ty),*) => {
            $(
                impl Block for $aes {
                    fn block_size(&self) -> usize {
                        AES_BLOCK_SIZE
                    }

                    fn encrypt(&self, dst: &mut [u8], src: &[u8]) -> usize {
                        let n = min(dst.len(), src.len()) / AES_BLOCK_SIZE * AES_BLOCK_SIZE;
                        for (d, s) in dst[..n]
                            .chunks_exact_mut(AES_BLOCK_SIZE)
                            .zip(src[..n].chunks_exact(AES_BLOCK_SIZE))
                        {
                            BlockEncrypt::encrypt_block_b2b(
                                self,
                                GenericArray::from_slice(s),
                                GenericArray::from_mut_slice(d),
                            );
                        }
                        n
                    }

                    fn encrypt_inplace(&self, in_out: &mut [u8]) -> usize {
                        let n = in_out.len() / AES_BLOCK_SIZE * AES_BLOCK_SIZE;
                        for chunk in in_out[..n].chunks_exact_mut(AES_BLOCK_SIZE) {
                            BlockEncrypt::encrypt_block(self, GenericArray::from_mut_slice(chunk));
                        }
                        n
                    }
                }
            )*
        };
    }

    impl_block_for_aes!(aes::Aes128, aes::Aes192, aes::Aes256);

}
