//! Shared kernel preamble and stack scratch.
//!
//! Every level-2 operation runs through [`blas2_frame`], which handles the
//! trivial scalar cases before the block sweep starts: zero-extent shapes
//! return immediately, `alpha == 0` reduces to scaling the output by
//! `beta`, and otherwise the output is pre-scaled in place so the inner op
//! only ever *adds* contributions.
//!
//! The output and input slices cannot alias (`&mut [T]` is exclusive), so
//! the op may read the input at any point of the sweep.

use crate::scalar::Scalar;
use crate::MAX_BLOCK_SIZE;

const BLOCK_AREA: usize = MAX_BLOCK_SIZE * MAX_BLOCK_SIZE;

/// 64-byte-aligned scratch for one decompressed tile.
#[repr(align(64))]
pub(crate) struct BlockScratch<T: Scalar>(pub [T; BLOCK_AREA]);

impl<T: Scalar> BlockScratch<T> {
    #[inline]
    pub fn new() -> Self {
        BlockScratch([T::ZERO; BLOCK_AREA])
    }
}

/// 64-byte-aligned scratch for one block-row accumulator or x-slice copy.
#[repr(align(64))]
pub(crate) struct LaneScratch<T: Scalar>(pub [T; MAX_BLOCK_SIZE]);

impl<T: Scalar> LaneScratch<T> {
    #[inline]
    pub fn new() -> Self {
        LaneScratch([T::ZERO; MAX_BLOCK_SIZE])
    }
}

/// Run a level-2 operation `y := alpha * op(A) * x + beta * y`.
///
/// `op` receives `(transpose, alpha, x, y)` with `y` already scaled by
/// `beta`; it must only accumulate added contributions and never scale or
/// re-read what it wrote through `beta`.
pub(crate) fn blas2_frame<T, F>(
    rows: usize,
    cols: usize,
    transpose: bool,
    alpha: T,
    x: &[T],
    beta: T,
    y: &mut [T],
    op: F,
) where
    T: Scalar,
    F: FnOnce(bool, T, &[T], &mut [T]),
{
    if rows == 0 || cols == 0 {
        return;
    }

    let mn = if transpose { cols } else { rows };
    debug_assert!(x.len() >= if transpose { rows } else { cols });
    debug_assert!(y.len() >= mn);

    if alpha == T::ZERO {
        if beta == T::ZERO {
            y[..mn].fill(T::ZERO);
        } else if beta != T::ONE {
            T::scal(beta, &mut y[..mn]);
        }
        return;
    }

    if beta == T::ZERO {
        y[..mn].fill(T::ZERO);
    } else if beta != T::ONE {
        T::scal(beta, &mut y[..mn]);
    }

    op(transpose, alpha, x, y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_zero_scales_only() {
        let x = vec![5.0f64; 4];
        let mut y = vec![2.0f64; 4];
        blas2_frame(4, 4, false, 0.0, &x, 3.0, &mut y, |_, _, _, _| {
            panic!("op must not run when alpha == 0");
        });
        assert_eq!(y, vec![6.0; 4]);
    }

    #[test]
    fn test_alpha_zero_beta_zero_clears() {
        let x = vec![5.0f64; 4];
        let mut y = vec![2.0f64; 4];
        blas2_frame(4, 4, false, 0.0, &x, 0.0, &mut y, |_, _, _, _| {
            panic!("op must not run when alpha == 0");
        });
        assert_eq!(y, vec![0.0; 4]);
    }

    #[test]
    fn test_transpose_scales_cols_extent() {
        // 2x3 shape, transposed output has 3 entries; the 4th must be untouched.
        let x = vec![1.0f64; 2];
        let mut y = vec![1.0f64, 1.0, 1.0, 7.0];
        blas2_frame(2, 3, true, 0.0, &x, 2.0, &mut y, |_, _, _, _| {});
        assert_eq!(y, vec![2.0, 2.0, 2.0, 7.0]);
    }

    #[test]
    fn test_prescale_then_accumulate() {
        let x = vec![1.0f64; 3];
        let mut y = vec![10.0f64; 3];
        blas2_frame(3, 3, false, 1.0, &x, 0.5, &mut y, |_, alpha, _, out| {
            for v in out.iter_mut().take(3) {
                *v += alpha * 2.0;
            }
        });
        assert_eq!(y, vec![7.0; 3]);
    }

    #[test]
    fn test_zero_extent_is_noop() {
        let x: Vec<f64> = vec![];
        let mut y = vec![9.0f64; 2];
        blas2_frame(0, 5, false, 1.0, &x, 0.0, &mut y, |_, _, _, _| {
            panic!("op must not run for empty shapes");
        });
        assert_eq!(y, vec![9.0; 2]);
    }

    #[test]
    fn test_scratch_alignment() {
        let block = BlockScratch::<f32>::new();
        let lane = LaneScratch::<f64>::new();
        assert_eq!(block.0.as_ptr() as usize % 64, 0);
        assert_eq!(lane.0.as_ptr() as usize % 64, 0);
    }
}
