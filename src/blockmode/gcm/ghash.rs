use super::table::MultiplicationTable;
use super::{BLOCK_SIZE, STD_NONCE_SIZE};
use core::cmp::min;
use zeroize::Zeroize;

impl MultiplicationTable {
    /// Extends `x` with more polynomial terms from `data`, based on Horner's
    /// rule: every 16 byte chunk is xored into `x` which is then multiplied
    /// by H. A trailing partial chunk is treated as if padded with zeros.
    pub fn multiply_data(&self, x: &mut [u8; BLOCK_SIZE], data: &[u8]) {
        let mut chunks = data.chunks_exact(BLOCK_SIZE);
        for chunk in &mut chunks {
            xor_into(x, chunk);
            *x = self.multiply_h(x);
        }

        let rem = chunks.remainder();
        if !rem.is_empty() {
            xor_into(x, rem);
            *x = self.multiply_h(x);
        }
    }

    /// Folds the length block `[len1 * 8]_64 || [len2 * 8]_64` into `x`.
    /// The lengths are given in bytes.
    pub fn multiply_length(&self, x: &mut [u8; BLOCK_SIZE], len1: u64, len2: u64) {
        xor_into(&mut x[..8], &(len1 << 3).to_be_bytes());
        xor_into(&mut x[8..], &(len2 << 3).to_be_bytes());
        *x = self.multiply_h(x);
    }

    /// GHASH_H(A, C) of NIST SP 800-38D.
    pub fn ghash(&self, a: &[u8], c: &[u8]) -> [u8; BLOCK_SIZE] {
        let mut x = [0; BLOCK_SIZE];
        self.multiply_data(&mut x, a);
        self.multiply_data(&mut x, c);
        self.multiply_length(&mut x, a.len() as u64, c.len() as u64);
        x
    }

    // deriveCounter computes the initial GCM counter state from the given nonce.
    // See NIST SP 800-38D, section 7.1. A 96-bit nonce is used directly, along
    // with a four-byte big-endian counter starting at one. Nonces of other
    // sizes are passed through GHASH.
    pub fn derive_counter(&self, nonce: &[u8]) -> [u8; BLOCK_SIZE] {
        if nonce.len() == STD_NONCE_SIZE {
            let mut counter = [0; BLOCK_SIZE];
            counter[..STD_NONCE_SIZE].copy_from_slice(nonce);
            counter[BLOCK_SIZE - 1] = 1;
            counter
        } else {
            self.ghash(&[], nonce)
        }
    }
}

#[inline]
pub(crate) fn xor_into(dst: &mut [u8], src: &[u8]) {
    dst.iter_mut().zip(src).for_each(|(d, s)| *d ^= *s);
}

// GHasher accumulates GHASH over data that arrives in arbitrary pieces.
// Bytes are buffered until a full block is available so that splitting the
// input never changes the result; pad() closes the current field (AAD or
// ciphertext) by folding in whatever is buffered.
pub(crate) struct GHasher<'a> {
    table: &'a MultiplicationTable,
    x: [u8; BLOCK_SIZE],
    buf: [u8; BLOCK_SIZE],
    buf_len: usize,
}

impl<'a> GHasher<'a> {
    pub fn new(table: &'a MultiplicationTable) -> Self {
        GHasher {
            table,
            x: [0; BLOCK_SIZE],
            buf: [0; BLOCK_SIZE],
            buf_len: 0,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        let mut data = data;
        if self.buf_len > 0 {
            let n = min(BLOCK_SIZE - self.buf_len, data.len());
            self.buf[self.buf_len..self.buf_len + n].copy_from_slice(&data[..n]);
            self.buf_len += n;
            data = &data[n..];
            if self.buf_len < BLOCK_SIZE {
                return;
            }
            self.table.multiply_data(&mut self.x, &self.buf);
            self.buf_len = 0;
        }

        let full_blocks = data.len() & !(BLOCK_SIZE - 1);
        self.table.multiply_data(&mut self.x, &data[..full_blocks]);

        let rest = &data[full_blocks..];
        self.buf[..rest.len()].copy_from_slice(rest);
        self.buf_len = rest.len();
    }

    pub fn pad(&mut self) {
        if self.buf_len > 0 {
            self.table.multiply_data(&mut self.x, &self.buf[..self.buf_len]);
            self.buf_len = 0;
        }
    }

    // Folds the length block and returns GHASH. Lengths are in bytes.
    pub fn sum(&mut self, len_a: u64, len_c: u64) -> [u8; BLOCK_SIZE] {
        self.pad();
        self.table.multiply_length(&mut self.x, len_a, len_c);
        self.x
    }
}

impl Drop for GHasher<'_> {
    fn drop(&mut self) {
        self.x.zeroize();
        self.buf.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use rand::{Rng, RngCore};
    use std::vec::Vec;

    // H = AES-128(0^128, 0^128)
    const H: [u8; 16] = hex!("66e94bd4ef8a2c3b884cfa59ca342b2e");

    #[test]
    fn test_ghash_known_answer() {
        // NIST GCM test case 2: GHASH(H, {}, C)
        let t = MultiplicationTable::new(&H);
        let c = hex!("0388dace60b6a392f328c2b971b2fe78");
        assert_eq!(t.ghash(&[], &c), hex!("f38cbb1ad69223dcc3457ae5b6b0f885"));
    }

    #[test]
    fn test_multiply_data() {
        let t = MultiplicationTable::new(&H);

        let mut x = hex!("000102030405060708090a0b0c0d0e0f");
        let before = x;
        t.multiply_data(&mut x, &[]);
        assert_eq!(x, before);

        // a partial chunk hashes like its zero padded block
        let data = hex!("0102030405060708090a0b0c0d0e0f10111213");
        let mut padded = [0u8; 32];
        padded[..data.len()].copy_from_slice(&data);

        let mut x1 = [0u8; 16];
        let mut x2 = [0u8; 16];
        t.multiply_data(&mut x1, &data);
        t.multiply_data(&mut x2, &padded);
        assert_eq!(x1, x2);
    }

    #[test]
    fn test_multiply_length() {
        let t = MultiplicationTable::new(&H);
        let mut x = [0u8; 16];
        t.multiply_length(&mut x, 20, 60);

        let mut wanted = [0u8; 16];
        wanted[..8].copy_from_slice(&160u64.to_be_bytes());
        wanted[8..].copy_from_slice(&480u64.to_be_bytes());
        assert_eq!(x, t.multiply_h(&wanted));
    }

    #[test]
    fn test_derive_counter() {
        let t = MultiplicationTable::new(&H);

        let nonce = hex!("cafebabefacedbaddecaf888");
        assert_eq!(t.derive_counter(&nonce), hex!("cafebabefacedbaddecaf88800000001"));

        let nonce = hex!("cafebabefacedbad");
        assert_eq!(t.derive_counter(&nonce), t.ghash(&[], &nonce));
    }

    #[test]
    fn test_ghasher_chunked() {
        let mut rng = rand::rng();
        let mut h = [0u8; 16];
        rng.fill_bytes(&mut h);
        let t = MultiplicationTable::new(&h);

        for (a_len, c_len) in [(0, 0), (0, 33), (13, 0), (16, 16), (20, 47), (31, 64)] {
            let mut a = vec![0u8; a_len];
            let mut c = vec![0u8; c_len];
            rng.fill_bytes(&mut a);
            rng.fill_bytes(&mut c);
            let wanted = t.ghash(&a, &c);

            let mut g = GHasher::new(&t);
            for part in split_randomly(&mut rng, &a) {
                g.update(part);
            }
            g.pad();
            for part in split_randomly(&mut rng, &c) {
                g.update(part);
            }
            assert_eq!(g.sum(a_len as u64, c_len as u64), wanted);
        }
    }

    fn split_randomly<'a, R: Rng>(rng: &mut R, data: &'a [u8]) -> Vec<&'a [u8]> {
        let mut parts = Vec::new();
        let mut rest = data;
        while !rest.is_empty() {
            let n = rng.random_range(1..=rest.len().min(20));
            let (head, tail) = rest.split_at(n);
            parts.push(head);
            rest = tail;
        }
        parts
    }
}
