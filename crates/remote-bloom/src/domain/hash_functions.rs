//! Hash functions for the remote Bloom filter
//!
//! Each probe uses MurmurHash3 (x86, 32-bit) with its own seed, so the probes behave
//! as independent hash functions rather than shifts of a single hash.
//!
//! The 32-bit output is read as a signed integer and reduced with a Euclidean modulo.
//! Offsets therefore match the signed-hash convention used by common MurmurHash3
//! bindings, which lets filters written by other clients of the same store be shared.

use std::io::Cursor;

/// Hash an element with MurmurHash3 x86_32 under the given seed
pub fn murmur_hash(element: &[u8], seed: u32) -> i32 {
    let mut cursor = Cursor::new(element);

    // Reading from an in-memory cursor cannot fail
    murmur3::murmur3_32(&mut cursor, seed).unwrap_or(0) as i32
}

/// Map an element to a single bit offset in `[0, bit_count)` for one seed
pub fn bit_offset(element: &[u8], seed: u32, bit_count: u64) -> u64 {
    let hash = murmur_hash(element, seed) as i64;
    hash.rem_euclid(bit_count as i64) as u64
}

/// Compute the `hash_count` bit offsets for an element
///
/// Seeds run from `0` to `hash_count - 1`. Duplicate offsets are possible and harmless.
pub fn compute_bit_offsets(element: &[u8], hash_count: u32, bit_count: u64) -> Vec<u64> {
    (0..hash_count)
        .map(|seed| bit_offset(element, seed, bit_count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_murmur3_reference_vectors() {
        assert_eq!(murmur_hash(b"", 0), 0);
        assert_eq!(murmur_hash(b"", 1), 0x514E_28B7);
        assert_eq!(murmur_hash(b"foo", 0), -156_908_512);
    }

    #[test]
    fn test_negative_hash_maps_to_non_negative_offset() {
        // murmur3("foo", 0) is negative; Euclidean modulo keeps the offset in range
        assert_eq!(bit_offset(b"foo", 0, 1000), 488);
    }

    #[test]
    fn test_different_seed_different_output() {
        let element = b"test_address_0xABCD";

        let hash1 = murmur_hash(element, 0);
        let hash2 = murmur_hash(element, 1);

        assert_ne!(
            hash1, hash2,
            "Different seeds must produce different outputs"
        );
    }

    #[test]
    fn test_offsets_use_one_seed_per_probe() {
        let element = b"order:42";
        let offsets = compute_bit_offsets(element, 5, 959);

        for (seed, offset) in offsets.iter().enumerate() {
            assert_eq!(*offset, bit_offset(element, seed as u32, 959));
        }
    }

    #[test]
    fn test_multiple_hash_functions_independent() {
        let element = b"test_address_0xABCD";
        let k = 7;
        let m = 10_000;

        let offsets = compute_bit_offsets(element, k, m);

        assert_eq!(offsets.len(), k as usize, "Should produce k offsets");

        let unique: std::collections::HashSet<_> = offsets.iter().collect();
        assert!(
            unique.len() >= 3,
            "Hash functions should produce varied offsets"
        );
    }

    #[test]
    fn test_hash_uniformity() {
        let m = 1000;
        let k = 7;
        let mut counts = vec![0usize; 10];

        for i in 0..1000 {
            let element = format!("element_{}", i);
            for offset in compute_bit_offsets(element.as_bytes(), k, m) {
                counts[(offset / 100) as usize] += 1;
            }
        }

        // ~700 per bucket, allow 50% either way
        let expected = 700;
        for (i, count) in counts.iter().enumerate() {
            assert!(
                *count >= expected / 2 && *count <= expected * 3 / 2,
                "Bucket {} has {} entries, expected ~{}",
                i,
                count,
                expected
            );
        }
    }

    proptest! {
        #[test]
        fn prop_offsets_in_range(
            element in proptest::collection::vec(any::<u8>(), 0..64),
            hash_count in 1u32..20,
            bit_count in 1u64..(1u64 << 32),
        ) {
            let offsets = compute_bit_offsets(&element, hash_count, bit_count);
            prop_assert_eq!(offsets.len(), hash_count as usize);
            for offset in offsets {
                prop_assert!(offset < bit_count);
            }
        }

        #[test]
        fn prop_offsets_deterministic(
            element in proptest::collection::vec(any::<u8>(), 0..64),
            hash_count in 1u32..20,
            bit_count in 1u64..1_000_000,
        ) {
            prop_assert_eq!(
                compute_bit_offsets(&element, hash_count, bit_count),
                compute_bit_offsets(&element, hash_count, bit_count)
            );
        }
    }
}
