//! Operations on sorted position arrays.

/// Index of the first element `>= value`, or `sorted.len()` when every
/// element is smaller. Callers treat `len` as a wrap to index 0.
#[inline]
pub fn index_of(sorted: &[u64], value: u64) -> usize {
    sorted.partition_point(|&position| position < value)
}

/// Remove `values` from `sorted` in one merge pass, compacting in place.
///
/// `values` is sorted first and may arrive in any order. Each entry cancels
/// at most one equal element, so a position shared by two servers survives
/// the removal of one of them. Values with no match are ignored.
///
/// Returns the new length of `sorted`.
pub fn remove_sorted(sorted: &mut Vec<u64>, values: &mut [u64]) -> usize {
    values.sort_unstable();

    let mut next = 0;
    let mut kept = 0;
    for i in 0..sorted.len() {
        let position = sorted[i];
        while next < values.len() && values[next] < position {
            next += 1;
        }
        if next < values.len() && values[next] == position {
            next += 1;
            continue;
        }
        sorted[kept] = position;
        kept += 1;
    }

    sorted.truncate(kept);
    kept
}
