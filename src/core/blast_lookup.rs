//! Infrastructure shared by the lookup table variants.
//!
//! The presence vector (PV) is a flat bit array with one bit per possible
//! packed word. Scanning consults it before touching the backbone, so words
//! absent from the query cost a single load.

/// log2 of bits per PV bucket.
pub const PV_ARRAY_BTS: usize = 6;
/// Bit index mask within a PV bucket.
pub const PV_ARRAY_MASK: usize = 63;
/// Bits per PV bucket.
pub const PV_BUCKET_BITS: usize = 64;

/// Test a bit in the presence vector.
#[inline(always)]
pub fn pv_test(pv: &[u64], index: usize) -> bool {
    (pv[index >> PV_ARRAY_BTS] & (1u64 << (index & PV_ARRAY_MASK))) != 0
}

/// Set a bit in the presence vector.
#[inline(always)]
pub fn pv_set(pv: &mut [u64], index: usize) {
    pv[index >> PV_ARRAY_BTS] |= 1u64 << (index & PV_ARRAY_MASK);
}

/// Buckets needed to cover `backbone_size` bits.
#[inline]
pub fn pv_array_size(backbone_size: usize) -> usize {
    (backbone_size + PV_BUCKET_BITS - 1) / PV_BUCKET_BITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pv_set_and_test() {
        let mut pv = vec![0u64; pv_array_size(256)];
        assert_eq!(pv.len(), 4);
        for idx in [0usize, 63, 64, 130, 255] {
            assert!(!pv_test(&pv, idx));
            pv_set(&mut pv, idx);
            assert!(pv_test(&pv, idx));
        }
        // Neighbors stay clear.
        assert!(!pv_test(&pv, 1));
        assert!(!pv_test(&pv, 129));
    }

    #[test]
    fn test_pv_array_size_rounds_up() {
        assert_eq!(pv_array_size(1), 1);
        assert_eq!(pv_array_size(64), 1);
        assert_eq!(pv_array_size(65), 2);
    }
}
