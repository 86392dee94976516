//! BLAS dispatch for the engine's element types.
//!
//! The engine is generic over [`Scalar`], which wires a `Real` element type
//! to the precision-specific CBLAS routines in `fprus-blas`. All tile
//! kernels run row-major with unit strides and a non-unit diagonal, so the
//! hooks fix those parameters.

use fprus_core::layout::{Diag, Layout, Transpose, Uplo};
use fprus_core::real::Real;
use fprus_blas::{level1, level2};

/// Element type of a blocked matrix: a real scalar with BLAS-2 dispatch.
pub trait Scalar: Real {
    /// `y := alpha * op(A) * x + beta * y` on a row-major `m x n` tile.
    fn gemv(
        trans: Transpose,
        m: usize,
        n: usize,
        alpha: Self,
        a: &[Self],
        lda: usize,
        x: &[Self],
        beta: Self,
        y: &mut [Self],
    );

    /// `x := op(A) * x` on a packed row-major triangle of order `n`.
    fn tpmv(uplo: Uplo, trans: Transpose, n: usize, ap: &[Self], x: &mut [Self]);

    /// `x := op(A)^{-1} * x` on a packed row-major triangle of order `n`.
    fn tpsv(uplo: Uplo, trans: Transpose, n: usize, ap: &[Self], x: &mut [Self]);

    /// `y := alpha * A * x + beta * y` with `A` symmetric, one packed triangle stored.
    fn spmv(
        uplo: Uplo,
        n: usize,
        alpha: Self,
        ap: &[Self],
        x: &[Self],
        beta: Self,
        y: &mut [Self],
    );

    /// `y := alpha * y`.
    fn scal(alpha: Self, y: &mut [Self]);
}

impl Scalar for f32 {
    #[inline]
    fn gemv(
        trans: Transpose,
        m: usize,
        n: usize,
        alpha: f32,
        a: &[f32],
        lda: usize,
        x: &[f32],
        beta: f32,
        y: &mut [f32],
    ) {
        level2::sgemv(Layout::RowMajor, trans, m, n, alpha, a, lda, x, 1, beta, y, 1);
    }

    #[inline]
    fn tpmv(uplo: Uplo, trans: Transpose, n: usize, ap: &[f32], x: &mut [f32]) {
        level2::stpmv(Layout::RowMajor, uplo, trans, Diag::NonUnit, n, ap, x, 1);
    }

    #[inline]
    fn tpsv(uplo: Uplo, trans: Transpose, n: usize, ap: &[f32], x: &mut [f32]) {
        level2::stpsv(Layout::RowMajor, uplo, trans, Diag::NonUnit, n, ap, x, 1);
    }

    #[inline]
    fn spmv(uplo: Uplo, n: usize, alpha: f32, ap: &[f32], x: &[f32], beta: f32, y: &mut [f32]) {
        level2::sspmv(Layout::RowMajor, uplo, n, alpha, ap, x, 1, beta, y, 1);
    }

    #[inline]
    fn scal(alpha: f32, y: &mut [f32]) {
        level1::sscal(y.len(), alpha, y, 1);
    }
}

impl Scalar for f64 {
    #[inline]
    fn gemv(
        trans: Transpose,
        m: usize,
        n: usize,
        alpha: f64,
        a: &[f64],
        lda: usize,
        x: &[f64],
        beta: f64,
        y: &mut [f64],
    ) {
        level2::dgemv(Layout::RowMajor, trans, m, n, alpha, a, lda, x, 1, beta, y, 1);
    }

    #[inline]
    fn tpmv(uplo: Uplo, trans: Transpose, n: usize, ap: &[f64], x: &mut [f64]) {
        level2::dtpmv(Layout::RowMajor, uplo, trans, Diag::NonUnit, n, ap, x, 1);
    }

    #[inline]
    fn tpsv(uplo: Uplo, trans: Transpose, n: usize, ap: &[f64], x: &mut [f64]) {
        level2::dtpsv(Layout::RowMajor, uplo, trans, Diag::NonUnit, n, ap, x, 1);
    }

    #[inline]
    fn spmv(uplo: Uplo, n: usize, alpha: f64, ap: &[f64], x: &[f64], beta: f64, y: &mut [f64]) {
        level2::dspmv(Layout::RowMajor, uplo, n, alpha, ap, x, 1, beta, y, 1);
    }

    #[inline]
    fn scal(alpha: f64, y: &mut [f64]) {
        level1::dscal(y.len(), alpha, y, 1);
    }
}
