// GCM reads a 16 byte block as a polynomial of degree 127 in GF(2)[x] with
// the lowest degree first: byte 0 holds x^0..x^7, byte 15 holds x^120..x^127,
// and inside a byte the most significant bit carries the lowest power.
// [0x80, 00, ..., 0x01] <=> x^127 + 1
use super::BLOCK_SIZE;
use core::ops::{BitXor, BitXorAssign};
use zeroize::Zeroize;

// x^128 = x^7 + x^2 + x + 1, the top byte of the reflected polynomial.
const R: u64 = 0xe100_0000_0000_0000;

// reverse order of bits of f(x) * (x^7 + x^2 + x + 1) for deg(x) <= 3.
// The result is represented by two bytes.
// EX: f(x) = 1 and x^7 + x^2 + x + 1 = 0b0000_0000_1000_0111 => 0b1110_0001_0000_0000 = 0xe100
// reverse bits of f(x) = 1 is 1000 = 8.
// So GCM_REDUCTION_TABLE[8] = 0xe100.
const GCM_REDUCTION_TABLE: [u64; 16] = [
    0x0000, 0x1c20, 0x3840, 0x2460, 0x7080, 0x6ca0, 0x48c0, 0x54e0, 0xe100,
    0xfd20, 0xd940, 0xc560, 0x9180, 0x8da0, 0xa9c0, 0xb5e0,
];

// FieldElement represents a value in GF(2¹²⁸) as two big endian halves:
//
//	the coefficient of x⁰ can be obtained by v.high >> 63.
//	the coefficient of x⁶³ can be obtained by v.high & 1.
//	the coefficient of x⁶⁴ can be obtained by v.low >> 63.
//	the coefficient of x¹²⁷ can be obtained by v.low & 1.
// GF(2^128) = GF(2)[x]/(x^128 + x^7 + x^2 + x + 1)
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct FieldElement {
    high: u64,
    low: u64,
}

impl BitXor for FieldElement {
    type Output = FieldElement;
    #[inline]
    fn bitxor(self, rhs: Self) -> Self::Output {
        FieldElement {
            high: self.high ^ rhs.high,
            low: self.low ^ rhs.low,
        }
    }
}

impl BitXorAssign for FieldElement {
    #[inline]
    fn bitxor_assign(&mut self, rhs: Self) {
        self.high ^= rhs.high;
        self.low ^= rhs.low;
    }
}

impl FieldElement {
    #[inline]
    pub fn from_be_bytes(b: &[u8; BLOCK_SIZE]) -> Self {
        let mut high = [0u8; 8];
        let mut low = [0u8; 8];
        high.copy_from_slice(&b[..8]);
        low.copy_from_slice(&b[8..]);
        FieldElement {
            high: u64::from_be_bytes(high),
            low: u64::from_be_bytes(low),
        }
    }

    #[inline]
    pub fn to_be_bytes(self) -> [u8; BLOCK_SIZE] {
        let mut out = [0; BLOCK_SIZE];
        out[..8].copy_from_slice(&self.high.to_be_bytes());
        out[8..].copy_from_slice(&self.low.to_be_bytes());
        out
    }

    // Multiplies by x: a right shift by one bit in the reflected order.
    #[inline]
    fn mul_x(self) -> Self {
        let carry = self.low & 1;
        let low = (self.high << 63) | (self.low >> 1);
        let mut high = self.high >> 1;

        // If the bit shifted out was set then it, conceptually, becomes a
        // term of x^128. The irreducible polynomial is 1+x+x^2+x^7+x^128, so
        // the x^128 term is replaced by the other four terms. In
        // characteristic 2 fields, subtraction == addition == XOR.
        if carry == 1 {
            high ^= R;
        }
        FieldElement { high, low }
    }

    // Multiplies by x^4, folding the four bits shifted out back in through
    // GCM_REDUCTION_TABLE.
    #[inline]
    fn mul_x4(self) -> Self {
        let rem = (self.low & 0xf) as usize;
        FieldElement {
            high: (self.high >> 4) ^ (GCM_REDUCTION_TABLE[rem] << 48),
            low: (self.high << 60) | (self.low >> 4),
        }
    }
}

/// The 16 multiples of the hash subkey H used by the 4-bit windowed
/// multiplication: `m[8] = H`, `m[4] = H*x`, `m[2] = H*x^2`, `m[1] = H*x^3`
/// and `m[a ^ b] = m[a] ^ m[b]`.
///
/// The table is read-only once built and can be shared by any number of
/// sessions under the same key.
pub struct MultiplicationTable {
    m: [FieldElement; 16],
}

impl MultiplicationTable {
    /// Builds the table for the hash subkey `h = E_K(0^128)`.
    pub fn new(h: &[u8; BLOCK_SIZE]) -> Self {
        let mut m = [FieldElement::default(); 16];

        // The bits of a nibble are taken most significant first, so the
        // multiple for x^0 lands at index 8 and the one for x^3 at index 1.
        let mut v = FieldElement::from_be_bytes(h);
        m[8] = v;
        let mut i = 4;
        while i > 0 {
            v = v.mul_x();
            m[i] = v;
            i >>= 1;
        }

        let mut i = 2;
        while i <= 8 {
            for j in 1..i {
                m[i + j] = m[i] ^ m[j];
            }
            i *= 2;
        }
        MultiplicationTable { m }
    }

    /// Returns `x * H`.
    ///
    /// Bytes are consumed from the last to the first, the low nibble of each
    /// byte before its high nibble. Every nibble but the final one (the high
    /// nibble of `x[0]`) is followed by a multiplication by x^4.
    pub fn multiply_h(&self, x: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
        let mut z = FieldElement::default();
        for i in (0..BLOCK_SIZE).rev() {
            let lo = (x[i] & 0xf) as usize;
            let hi = (x[i] >> 4) as usize;

            z ^= self.m[lo];
            z = z.mul_x4();
            z ^= self.m[hi];
            if i != 0 {
                z = z.mul_x4();
            }
        }
        z.to_be_bytes()
    }

    #[cfg(test)]
    pub(crate) fn entry(&self, i: usize) -> FieldElement {
        self.m[i]
    }
}

impl Drop for MultiplicationTable {
    fn drop(&mut self) {
        for e in &mut self.m {
            e.high.zeroize();
            e.low.zeroize();
        }
    }
}
