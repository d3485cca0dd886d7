//! Hashing helpers shared by the unique table and the compute table.
//!
//! Both tables use multiplicative hashing over 32-bit words: the key words are
//! folded with two large odd multipliers and the bucket index is taken from
//! the *top* bits of the product, where the mixing is best.

const P1: u32 = 12_582_917;
const P2: u32 = 4_256_249;

pub trait MyHash {
    /// Multiplicative hash. Use [`bucket`] to turn it into an index.
    fn hash(&self) -> u32;
}

/// Hash of two words.
#[inline]
pub fn hash2(a: u32, b: u32) -> u32 {
    a.wrapping_mul(P1).wrapping_add(b).wrapping_mul(P2)
}

/// Hash of three words.
#[inline]
pub fn hash3(a: u32, b: u32, c: u32) -> u32 {
    a.wrapping_add(b)
        .wrapping_mul(P1)
        .wrapping_add(c)
        .wrapping_mul(P2)
}

/// Hash of four words.
#[inline]
pub fn hash4(a: u32, b: u32, c: u32, d: u32) -> u32 {
    hash2(hash3(a, b, c), d)
}

/// Bucket index in a table of `2^bits` buckets.
#[inline]
pub fn bucket(hash: u32, bits: u32) -> usize {
    debug_assert!((1..=31).contains(&bits));
    (hash >> (32 - bits)) as usize
}
