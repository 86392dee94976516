//! Work splitting for multi-threaded driver loops.
//!
//! The engine's kernels are single-threaded per call; parallelism belongs
//! to the drivers, which hand each thread a contiguous share of the matrix
//! set. This module only computes that split. Spawning stays at the call
//! site (scoped threads), so each driver owns the shape of its per-thread
//! results.

use std::ops::Range;

/// Split `[0, total)` into at most `available_parallelism()` chunks via
/// [`chunk_ranges`].
pub fn thread_chunks(total: usize) -> Vec<Range<usize>> {
    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    chunk_ranges(total, threads)
}

/// Split `[0, total)` into at most `max_chunks` contiguous non-empty
/// ranges whose lengths differ by at most one.
///
/// The remainder is spread over the leading ranges, so a 10-element range
/// split four ways yields lengths 3, 3, 2, 2 rather than 3, 3, 3, 1.
/// Returns an empty vector when `total` or `max_chunks` is zero.
pub fn chunk_ranges(total: usize, max_chunks: usize) -> Vec<Range<usize>> {
    if total == 0 || max_chunks == 0 {
        return Vec::new();
    }
    let count = max_chunks.min(total);
    let base = total / count;
    let extra = total % count;

    let mut ranges = Vec::with_capacity(count);
    let mut start = 0;
    for c in 0..count {
        let len = base + usize::from(c < extra);
        ranges.push(start..start + len);
        start += len;
    }
    debug_assert_eq!(start, total);
    ranges
}
