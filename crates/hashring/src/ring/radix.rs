//! Least-significant-digit radix sort for ring positions.
//!
//! Positions are `u64` and a batch of membership changes appends whole
//! servers' worth of unsorted replicas, so the ring re-sorts the full array
//! once per batch. Four counting-sort passes over 16-bit digits do that in
//! O(n + 4 · 65536) time with one scratch buffer of the same length.

const RADIX_BITS: u32 = 16;
const BUCKETS: usize = 1 << RADIX_BITS;
const PASSES: usize = (u64::BITS / RADIX_BITS) as usize;
const DIGIT_MASK: u64 = (BUCKETS - 1) as u64;

#[inline]
fn digit(value: u64, pass: usize) -> usize {
    ((value >> (RADIX_BITS as usize * pass)) & DIGIT_MASK) as usize
}

/// Sort `values` ascending, using `scratch` as the second buffer.
///
/// The sorted result ends up in `values`; the contents of `scratch` are
/// unspecified afterwards.
///
/// # Panics
///
/// If `scratch` is shorter than `values`.
pub fn radix_sort(values: &mut [u64], scratch: &mut [u64]) {
    let len = values.len();
    if len < 2 {
        return;
    }
    let scratch = &mut scratch[..len];

    // Histogram every digit in a single read of the input.
    let mut counts = vec![0usize; PASSES * BUCKETS];
    for &value in values.iter() {
        for pass in 0..PASSES {
            counts[pass * BUCKETS + digit(value, pass)] += 1;
        }
    }

    // Inclusive prefix sums: counts[d] becomes one past the last slot for d.
    for table in counts.chunks_exact_mut(BUCKETS) {
        for d in 1..BUCKETS {
            table[d] += table[d - 1];
        }
    }

    let mut src: &mut [u64] = values;
    let mut dst: &mut [u64] = scratch;
    for (pass, table) in counts.chunks_exact_mut(BUCKETS).enumerate() {
        // Walk backwards so equal digits keep their relative order.
        for &value in src.iter().rev() {
            let slot = &mut table[digit(value, pass)];
            *slot -= 1;
            dst[*slot] = value;
        }
        std::mem::swap(&mut src, &mut dst);
    }
    // PASSES is even, so `src` is `values` again here.
}

/// Sort `values` ascending, allocating the scratch buffer.
pub fn radix_sort_vec(values: &mut [u64]) {
    let mut scratch = vec![0u64; values.len()];
    radix_sort(values, &mut scratch);
}
