//! BLAS Level 2: matrix-vector operations.
//!
//! Row-major is the native code path. Column-major calls remap onto it:
//! a column-major matrix is the row-major storage of its transpose, so
//! flipping the transpose flag (and the triangle, for packed storage)
//! reduces every routine to a single row-major body.
//!
//! Packed triangular storage (row-major): the upper triangle stores row i
//! starting at `i*n - i*(i-1)/2` with `n - i` entries for columns `i..n`;
//! the lower triangle stores row i starting at `i*(i+1)/2` with `i + 1`
//! entries for columns `0..=i`.
//!
//! SIMD strategy: no-transpose paths run dots/axpys over the contiguous
//! packed rows. Transpose paths walk packed columns, whose stride varies
//! per row; those stay scalar.

use fprus_core::layout::{Diag, Layout, Transpose, Uplo};
use fprus_core::simd;

/// Start of row `i` in a row-major upper packed triangle of order `n`.
#[inline(always)]
fn upper_row(i: usize, n: usize) -> usize {
    (i * (2 * n + 1 - i)) / 2
}

/// Start of row `i` in a row-major lower packed triangle.
#[inline(always)]
fn lower_row(i: usize) -> usize {
    (i * (i + 1)) / 2
}

// ============================================================================
// GEMV: general matrix-vector multiply
// y := alpha * op(A) * x + beta * y
// ============================================================================

/// Single-precision GEMV: y := alpha * op(A) * x + beta * y
pub fn sgemv(
    layout: Layout,
    trans: Transpose,
    m: usize,
    n: usize,
    alpha: f32,
    a: &[f32],
    lda: usize,
    x: &[f32],
    incx: usize,
    beta: f32,
    y: &mut [f32],
    incy: usize,
) {
    #[cfg(feature = "mkl")]
    {
        unsafe {
            fprus_core::mkl_ffi::cblas_sgemv(
                layout as i32,
                trans as i32,
                m as i32,
                n as i32,
                alpha,
                a.as_ptr(),
                lda as i32,
                x.as_ptr(),
                incx as i32,
                beta,
                y.as_mut_ptr(),
                incy as i32,
            );
        }
        return;
    }
    #[allow(unreachable_code)]
    if layout == Layout::ColMajor {
        // Column-major A is the row-major storage of A^T.
        return sgemv(
            Layout::RowMajor,
            trans.flipped(),
            n,
            m,
            alpha,
            a,
            lda,
            x,
            incx,
            beta,
            y,
            incy,
        );
    }

    let rows = if trans.is_transposed() { n } else { m };
    scale_f32(beta, y, rows, incy);
    if alpha == 0.0 || m == 0 || n == 0 {
        return;
    }

    if !trans.is_transposed() {
        // y[i] += alpha * dot(A_row_i, x)
        if incx == 1 {
            for i in 0..m {
                let row = &a[i * lda..i * lda + n];
                y[i * incy] += alpha * simd::dot_f32(row, &x[..n]);
            }
        } else {
            for i in 0..m {
                let mut sum = 0.0;
                for j in 0..n {
                    sum += a[i * lda + j] * x[j * incx];
                }
                y[i * incy] += alpha * sum;
            }
        }
    } else {
        // y += alpha * x[i] * A_row_i  (axpy per row)
        if incy == 1 {
            for i in 0..m {
                let row = &a[i * lda..i * lda + n];
                simd::axpy_f32(alpha * x[i * incx], row, &mut y[..n]);
            }
        } else {
            for i in 0..m {
                let xi = alpha * x[i * incx];
                for j in 0..n {
                    y[j * incy] += xi * a[i * lda + j];
                }
            }
        }
    }
}

/// Double-precision GEMV: y := alpha * op(A) * x + beta * y
pub fn dgemv(
    layout: Layout,
    trans: Transpose,
    m: usize,
    n: usize,
    alpha: f64,
    a: &[f64],
    lda: usize,
    x: &[f64],
    incx: usize,
    beta: f64,
    y: &mut [f64],
    incy: usize,
) {
    #[cfg(feature = "mkl")]
    {
        unsafe {
            fprus_core::mkl_ffi::cblas_dgemv(
                layout as i32,
                trans as i32,
                m as i32,
                n as i32,
                alpha,
                a.as_ptr(),
                lda as i32,
                x.as_ptr(),
                incx as i32,
                beta,
                y.as_mut_ptr(),
                incy as i32,
            );
        }
        return;
    }
    #[allow(unreachable_code)]
    if layout == Layout::ColMajor {
        return dgemv(
            Layout::RowMajor,
            trans.flipped(),
            n,
            m,
            alpha,
            a,
            lda,
            x,
            incx,
            beta,
            y,
            incy,
        );
    }

    let rows = if trans.is_transposed() { n } else { m };
    scale_f64(beta, y, rows, incy);
    if alpha == 0.0 || m == 0 || n == 0 {
        return;
    }

    if !trans.is_transposed() {
        if incx == 1 {
            for i in 0..m {
                let row = &a[i * lda..i * lda + n];
                y[i * incy] += alpha * simd::dot_f64(row, &x[..n]);
            }
        } else {
            for i in 0..m {
                let mut sum = 0.0;
                for j in 0..n {
                    sum += a[i * lda + j] * x[j * incx];
                }
                y[i * incy] += alpha * sum;
            }
        }
    } else if incy == 1 {
        for i in 0..m {
            let row = &a[i * lda..i * lda + n];
            simd::axpy_f64(alpha * x[i * incx], row, &mut y[..n]);
        }
    } else {
        for i in 0..m {
            let xi = alpha * x[i * incx];
            for j in 0..n {
                y[j * incy] += xi * a[i * lda + j];
            }
        }
    }
}

#[inline]
fn scale_f32(beta: f32, y: &mut [f32], rows: usize, incy: usize) {
    if beta == 0.0 {
        if incy == 1 {
            y[..rows].fill(0.0);
        } else {
            for i in 0..rows {
                y[i * incy] = 0.0;
            }
        }
    } else if beta != 1.0 {
        if incy == 1 {
            simd::scal_f32(beta, &mut y[..rows]);
        } else {
            for i in 0..rows {
                y[i * incy] *= beta;
            }
        }
    }
}

#[inline]
fn scale_f64(beta: f64, y: &mut [f64], rows: usize, incy: usize) {
    if beta == 0.0 {
        if incy == 1 {
            y[..rows].fill(0.0);
        } else {
            for i in 0..rows {
                y[i * incy] = 0.0;
            }
        }
    } else if beta != 1.0 {
        if incy == 1 {
            simd::scal_f64(beta, &mut y[..rows]);
        } else {
            for i in 0..rows {
                y[i * incy] *= beta;
            }
        }
    }
}

// ============================================================================
// TPMV: packed triangular matrix-vector multiply  x := op(A) * x
// ============================================================================

macro_rules! tpmv_impl {
    ($name:ident, $t:ty, $dot:path, $mkl:ident) => {
        /// Packed triangular matrix-vector multiply: x := op(A) * x
        pub fn $name(
            layout: Layout,
            uplo: Uplo,
            trans: Transpose,
            diag: Diag,
            n: usize,
            ap: &[$t],
            x: &mut [$t],
            incx: usize,
        ) {
            #[cfg(feature = "mkl")]
            {
                unsafe {
                    fprus_core::mkl_ffi::$mkl(
                        layout as i32,
                        uplo as i32,
                        trans as i32,
                        diag as i32,
                        n as i32,
                        ap.as_ptr(),
                        x.as_mut_ptr(),
                        incx as i32,
                    );
                }
                return;
            }
            #[allow(unreachable_code)]
            if layout == Layout::ColMajor {
                // Column-major packed upper bytes are row-major packed lower
                // bytes of the transpose, and vice versa.
                return $name(
                    Layout::RowMajor,
                    uplo.flipped(),
                    trans.flipped(),
                    diag,
                    n,
                    ap,
                    x,
                    incx,
                );
            }
            if n == 0 {
                return;
            }

            let unit = diag == Diag::Unit;
            match (uplo, trans.is_transposed()) {
                (Uplo::Upper, false) => {
                    // Ascending rows: row i only reads x[i..], not yet overwritten.
                    for i in 0..n {
                        let row = &ap[upper_row(i, n)..upper_row(i, n) + (n - i)];
                        let mut sum = if unit { x[i * incx] } else { row[0] * x[i * incx] };
                        if incx == 1 {
                            sum += $dot(&row[1..], &x[i + 1..n]);
                        } else {
                            for j in (i + 1)..n {
                                sum += row[j - i] * x[j * incx];
                            }
                        }
                        x[i * incx] = sum;
                    }
                }
                (Uplo::Lower, false) => {
                    // Descending rows: row i only reads x[..=i].
                    for i in (0..n).rev() {
                        let row = &ap[lower_row(i)..lower_row(i) + i + 1];
                        let mut sum = if unit { x[i * incx] } else { row[i] * x[i * incx] };
                        if incx == 1 {
                            sum += $dot(&row[..i], &x[..i]);
                        } else {
                            for j in 0..i {
                                sum += row[j] * x[j * incx];
                            }
                        }
                        x[i * incx] = sum;
                    }
                }
                (Uplo::Upper, true) => {
                    // x := A^T x with A upper: output i sums column i, rows 0..=i.
                    // Descending output order keeps the inputs it reads intact.
                    for i in (0..n).rev() {
                        let mut sum = if unit {
                            x[i * incx]
                        } else {
                            ap[upper_row(i, n)] * x[i * incx]
                        };
                        for j in 0..i {
                            sum += ap[upper_row(j, n) + (i - j)] * x[j * incx];
                        }
                        x[i * incx] = sum;
                    }
                }
                (Uplo::Lower, true) => {
                    // x := A^T x with A lower: output i sums column i, rows i..n.
                    for i in 0..n {
                        let mut sum = if unit {
                            x[i * incx]
                        } else {
                            ap[lower_row(i) + i] * x[i * incx]
                        };
                        for j in (i + 1)..n {
                            sum += ap[lower_row(j) + i] * x[j * incx];
                        }
                        x[i * incx] = sum;
                    }
                }
            }
        }
    };
}

tpmv_impl!(stpmv, f32, simd::dot_f32, cblas_stpmv);
tpmv_impl!(dtpmv, f64, simd::dot_f64, cblas_dtpmv);

// ============================================================================
// TPSV: packed triangular solve  x := op(A)^{-1} * x
// ============================================================================

macro_rules! tpsv_impl {
    ($name:ident, $t:ty, $dot:path, $mkl:ident) => {
        /// Packed triangular solve: x := op(A)^{-1} * x
        pub fn $name(
            layout: Layout,
            uplo: Uplo,
            trans: Transpose,
            diag: Diag,
            n: usize,
            ap: &[$t],
            x: &mut [$t],
            incx: usize,
        ) {
            #[cfg(feature = "mkl")]
            {
                unsafe {
                    fprus_core::mkl_ffi::$mkl(
                        layout as i32,
                        uplo as i32,
                        trans as i32,
                        diag as i32,
                        n as i32,
                        ap.as_ptr(),
                        x.as_mut_ptr(),
                        incx as i32,
                    );
                }
                return;
            }
            #[allow(unreachable_code)]
            if layout == Layout::ColMajor {
                return $name(
                    Layout::RowMajor,
                    uplo.flipped(),
                    trans.flipped(),
                    diag,
                    n,
                    ap,
                    x,
                    incx,
                );
            }
            if n == 0 {
                return;
            }

            let unit = diag == Diag::Unit;
            match (uplo, trans.is_transposed()) {
                (Uplo::Upper, false) => {
                    // Back substitution.
                    for i in (0..n).rev() {
                        let row = &ap[upper_row(i, n)..upper_row(i, n) + (n - i)];
                        let mut sum = x[i * incx];
                        if incx == 1 {
                            sum -= $dot(&row[1..], &x[i + 1..n]);
                        } else {
                            for j in (i + 1)..n {
                                sum -= row[j - i] * x[j * incx];
                            }
                        }
                        x[i * incx] = if unit { sum } else { sum / row[0] };
                    }
                }
                (Uplo::Lower, false) => {
                    // Forward substitution.
                    for i in 0..n {
                        let row = &ap[lower_row(i)..lower_row(i) + i + 1];
                        let mut sum = x[i * incx];
                        if incx == 1 {
                            sum -= $dot(&row[..i], &x[..i]);
                        } else {
                            for j in 0..i {
                                sum -= row[j] * x[j * incx];
                            }
                        }
                        x[i * incx] = if unit { sum } else { sum / row[i] };
                    }
                }
                (Uplo::Upper, true) => {
                    // A^T is lower triangular: forward substitution over columns.
                    for i in 0..n {
                        let mut sum = x[i * incx];
                        for j in 0..i {
                            sum -= ap[upper_row(j, n) + (i - j)] * x[j * incx];
                        }
                        x[i * incx] = if unit {
                            sum
                        } else {
                            sum / ap[upper_row(i, n)]
                        };
                    }
                }
                (Uplo::Lower, true) => {
                    // A^T is upper triangular: back substitution over columns.
                    for i in (0..n).rev() {
                        let mut sum = x[i * incx];
                        for j in (i + 1)..n {
                            sum -= ap[lower_row(j) + i] * x[j * incx];
                        }
                        x[i * incx] = if unit {
                            sum
                        } else {
                            sum / ap[lower_row(i) + i]
                        };
                    }
                }
            }
        }
    };
}

tpsv_impl!(stpsv, f32, simd::dot_f32, cblas_stpsv);
tpsv_impl!(dtpsv, f64, simd::dot_f64, cblas_dtpsv);

// ============================================================================
// SPMV: packed symmetric matrix-vector multiply
// y := alpha * A * x + beta * y  (A symmetric, one triangle stored)
// ============================================================================

macro_rules! spmv_impl {
    ($name:ident, $t:ty, $dot:path, $axpy:path, $scale:ident, $mkl:ident) => {
        /// Packed symmetric matrix-vector multiply: y := alpha * A * x + beta * y
        pub fn $name(
            layout: Layout,
            uplo: Uplo,
            n: usize,
            alpha: $t,
            ap: &[$t],
            x: &[$t],
            incx: usize,
            beta: $t,
            y: &mut [$t],
            incy: usize,
        ) {
            #[cfg(feature = "mkl")]
            {
                unsafe {
                    fprus_core::mkl_ffi::$mkl(
                        layout as i32,
                        uplo as i32,
                        n as i32,
                        alpha,
                        ap.as_ptr(),
                        x.as_ptr(),
                        incx as i32,
                        beta,
                        y.as_mut_ptr(),
                        incy as i32,
                    );
                }
                return;
            }
            #[allow(unreachable_code)]
            if layout == Layout::ColMajor {
                // Symmetric: transposing is a no-op, only the triangle flips.
                return $name(
                    Layout::RowMajor,
                    uplo.flipped(),
                    n,
                    alpha,
                    ap,
                    x,
                    incx,
                    beta,
                    y,
                    incy,
                );
            }

            $scale(beta, y, n, incy);
            if alpha == 0.0 || n == 0 {
                return;
            }

            let contiguous = incx == 1 && incy == 1;
            match uplo {
                Uplo::Upper => {
                    // Row i covers the diagonal and columns i+1..n; the
                    // mirrored half is applied with an axpy on the fly.
                    for i in 0..n {
                        let xi = x[i * incx];
                        let row = &ap[upper_row(i, n)..upper_row(i, n) + (n - i)];
                        let mut sum = row[0] * xi;
                        if contiguous {
                            sum += $dot(&row[1..], &x[i + 1..n]);
                            $axpy(alpha * xi, &row[1..], &mut y[i + 1..n]);
                        } else {
                            for j in (i + 1)..n {
                                let aij = row[j - i];
                                sum += aij * x[j * incx];
                                y[j * incy] += alpha * aij * xi;
                            }
                        }
                        y[i * incy] += alpha * sum;
                    }
                }
                Uplo::Lower => {
                    for i in 0..n {
                        let xi = x[i * incx];
                        let row = &ap[lower_row(i)..lower_row(i) + i + 1];
                        let mut sum = 0.0;
                        if contiguous {
                            sum += $dot(&row[..i], &x[..i]);
                            $axpy(alpha * xi, &row[..i], &mut y[..i]);
                        } else {
                            for j in 0..i {
                                let aij = row[j];
                                sum += aij * x[j * incx];
                                y[j * incy] += alpha * aij * xi;
                            }
                        }
                        sum += row[i] * xi;
                        y[i * incy] += alpha * sum;
                    }
                }
            }
        }
    };
}

spmv_impl!(sspmv, f32, simd::dot_f32, simd::axpy_f32, scale_f32, cblas_sspmv);
spmv_impl!(dspmv, f64, simd::dot_f64, simd::axpy_f64, scale_f64, cblas_dspmv);

#[cfg(test)]
mod tests {
    use super::*;

    /// Pack the `uplo` triangle of a dense row-major matrix.
    fn pack(dense: &[f64], n: usize, uplo: Uplo) -> Vec<f64> {
        let mut ap = Vec::with_capacity(n * (n + 1) / 2);
        for i in 0..n {
            let (lo, hi) = match uplo {
                Uplo::Upper => (i, n),
                Uplo::Lower => (0, i + 1),
            };
            for j in lo..hi {
                ap.push(dense[i * n + j]);
            }
        }
        ap
    }

    fn dense_mv(dense: &[f64], n: usize, x: &[f64], trans: bool) -> Vec<f64> {
        let mut y = vec![0.0; n];
        for i in 0..n {
            for j in 0..n {
                if trans {
                    y[j] += dense[i * n + j] * x[i];
                } else {
                    y[i] += dense[i * n + j] * x[j];
                }
            }
        }
        y
    }

    fn upper_test_matrix(n: usize) -> Vec<f64> {
        let mut dense = vec![0.0; n * n];
        for i in 0..n {
            for j in i..n {
                dense[i * n + j] = (i * n + j) as f64 * 0.1 + 1.0;
            }
        }
        dense
    }

    fn lower_test_matrix(n: usize) -> Vec<f64> {
        let mut dense = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..=i {
                dense[i * n + j] = (i * n + j) as f64 * 0.1 + 1.0;
            }
        }
        dense
    }

    #[test]
    fn test_sgemv_rowmajor_notrans() {
        let a = vec![1.0f32, 2.0, 3.0, 4.0];
        let x = vec![1.0f32, 1.0];
        let mut y = vec![0.0f32; 2];
        sgemv(
            Layout::RowMajor,
            Transpose::NoTrans,
            2,
            2,
            1.0,
            &a,
            2,
            &x,
            1,
            0.0,
            &mut y,
            1,
        );
        assert_eq!(y, vec![3.0, 7.0]);
    }

    #[test]
    fn test_dgemv_with_alpha_beta() {
        let a = vec![1.0f64, 2.0, 3.0, 4.0];
        let x = vec![1.0f64, 1.0];
        let mut y = vec![10.0f64, 20.0];
        dgemv(
            Layout::RowMajor,
            Transpose::NoTrans,
            2,
            2,
            2.0,
            &a,
            2,
            &x,
            1,
            3.0,
            &mut y,
            1,
        );
        assert_eq!(y, vec![36.0, 74.0]);
    }

    #[test]
    fn test_dgemv_trans() {
        let a = vec![1.0f64, 2.0, 3.0, 4.0];
        let x = vec![1.0f64, 1.0];
        let mut y = vec![0.0f64; 2];
        dgemv(
            Layout::RowMajor,
            Transpose::Trans,
            2,
            2,
            1.0,
            &a,
            2,
            &x,
            1,
            0.0,
            &mut y,
            1,
        );
        assert_eq!(y, vec![4.0, 6.0]);
    }

    #[test]
    fn test_dgemv_rectangular() {
        // 2x3 matrix
        let a = vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let x = vec![1.0f64, 1.0, 1.0];
        let mut y = vec![0.0f64; 2];
        dgemv(
            Layout::RowMajor,
            Transpose::NoTrans,
            2,
            3,
            1.0,
            &a,
            3,
            &x,
            1,
            0.0,
            &mut y,
            1,
        );
        assert_eq!(y, vec![6.0, 15.0]);

        let xt = vec![1.0f64, 1.0];
        let mut yt = vec![0.0f64; 3];
        dgemv(
            Layout::RowMajor,
            Transpose::Trans,
            2,
            3,
            1.0,
            &a,
            3,
            &xt,
            1,
            0.0,
            &mut yt,
            1,
        );
        assert_eq!(yt, vec![5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_dgemv_colmajor_matches_rowmajor() {
        // A = [[1, 3], [2, 4]] stored col-major as [1, 2, 3, 4]
        let a = vec![1.0f64, 2.0, 3.0, 4.0];
        let x = vec![1.0f64, 2.0];
        let mut y = vec![0.0f64; 2];
        dgemv(
            Layout::ColMajor,
            Transpose::NoTrans,
            2,
            2,
            1.0,
            &a,
            2,
            &x,
            1,
            0.0,
            &mut y,
            1,
        );
        assert_eq!(y, vec![7.0, 10.0]);
    }

    #[test]
    fn test_sgemv_strided() {
        let a = vec![1.0f32, 2.0, 3.0, 4.0];
        let x = vec![1.0f32, 0.0, 1.0]; // x[0]=1, x[2]=1 with incx=2
        let mut y = vec![0.0f32; 2];
        sgemv(
            Layout::RowMajor,
            Transpose::NoTrans,
            2,
            2,
            1.0,
            &a,
            2,
            &x,
            2,
            0.0,
            &mut y,
            1,
        );
        assert_eq!(y, vec![3.0, 7.0]);
    }

    #[test]
    fn test_dtpmv_upper_matches_dense() {
        let n = 7;
        let dense = upper_test_matrix(n);
        let ap = pack(&dense, n, Uplo::Upper);
        let x0: Vec<f64> = (0..n).map(|i| (i as f64 * 0.3).cos()).collect();

        for trans in [Transpose::NoTrans, Transpose::Trans] {
            let mut x = x0.clone();
            dtpmv(
                Layout::RowMajor,
                Uplo::Upper,
                trans,
                Diag::NonUnit,
                n,
                &ap,
                &mut x,
                1,
            );
            let expect = dense_mv(&dense, n, &x0, trans.is_transposed());
            for (a, b) in x.iter().zip(expect.iter()) {
                assert!((a - b).abs() < 1e-12, "{trans:?}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_dtpmv_lower_matches_dense() {
        let n = 6;
        let dense = lower_test_matrix(n);
        let ap = pack(&dense, n, Uplo::Lower);
        let x0: Vec<f64> = (0..n).map(|i| 1.0 - 0.2 * i as f64).collect();

        for trans in [Transpose::NoTrans, Transpose::Trans] {
            let mut x = x0.clone();
            dtpmv(
                Layout::RowMajor,
                Uplo::Lower,
                trans,
                Diag::NonUnit,
                n,
                &ap,
                &mut x,
                1,
            );
            let expect = dense_mv(&dense, n, &x0, trans.is_transposed());
            for (a, b) in x.iter().zip(expect.iter()) {
                assert!((a - b).abs() < 1e-12, "{trans:?}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_dtpsv_inverts_dtpmv() {
        let n = 9;
        for uplo in [Uplo::Upper, Uplo::Lower] {
            let dense = match uplo {
                Uplo::Upper => upper_test_matrix(n),
                Uplo::Lower => lower_test_matrix(n),
            };
            // Strengthen the diagonal so the solve is well-conditioned.
            let mut dense = dense;
            for i in 0..n {
                dense[i * n + i] += 10.0;
            }
            let ap = pack(&dense, n, uplo);
            let x0: Vec<f64> = (0..n).map(|i| (i as f64 * 0.7).sin() + 2.0).collect();

            for trans in [Transpose::NoTrans, Transpose::Trans] {
                let mut x = x0.clone();
                dtpmv(Layout::RowMajor, uplo, trans, Diag::NonUnit, n, &ap, &mut x, 1);
                dtpsv(Layout::RowMajor, uplo, trans, Diag::NonUnit, n, &ap, &mut x, 1);
                for (a, b) in x.iter().zip(x0.iter()) {
                    assert!((a - b).abs() < 1e-10, "{uplo:?} {trans:?}: {a} vs {b}");
                }
            }
        }
    }

    #[test]
    fn test_stpsv_lower() {
        // A = [[2, 0], [1, 3]], solve A x = [4, 7]
        let ap = vec![2.0f32, 1.0, 3.0];
        let mut x = vec![4.0f32, 7.0];
        stpsv(
            Layout::RowMajor,
            Uplo::Lower,
            Transpose::NoTrans,
            Diag::NonUnit,
            2,
            &ap,
            &mut x,
            1,
        );
        assert!((x[0] - 2.0).abs() < 1e-6);
        assert!((x[1] - 5.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_dspmv_matches_dense_symv() {
        let n = 8;
        // Build a symmetric matrix, then exercise both stored triangles.
        let mut sym = vec![0.0f64; n * n];
        for i in 0..n {
            for j in 0..n {
                sym[i * n + j] = ((i + 1) * (j + 1)) as f64 * 0.05
                    + if i == j { 3.0 } else { 0.0 };
            }
        }
        let x: Vec<f64> = (0..n).map(|i| (i as f64 * 0.4).sin()).collect();
        let expect = dense_mv(&sym, n, &x, false);

        for uplo in [Uplo::Upper, Uplo::Lower] {
            let ap = pack(&sym, n, uplo);
            let mut y = vec![1.0f64; n];
            dspmv(Layout::RowMajor, uplo, n, 1.0, &ap, &x, 1, 1.0, &mut y, 1);
            for (a, b) in y.iter().zip(expect.iter()) {
                assert!((a - (b + 1.0)).abs() < 1e-12, "{uplo:?}: {a} vs {}", b + 1.0);
            }
        }
    }

    #[test]
    fn test_dspmv_beta_zero() {
        let ap = vec![1.0f64, 2.0, 3.0]; // [[1,2],[2,3]]
        let x = vec![1.0f64, 1.0];
        let mut y = vec![99.0f64, -99.0];
        dspmv(
            Layout::RowMajor,
            Uplo::Upper,
            2,
            1.0,
            &ap,
            &x,
            1,
            0.0,
            &mut y,
            1,
        );
        assert_eq!(y, vec![3.0, 5.0]);
    }

    #[test]
    fn test_tpmv_unit_diag() {
        // Unit diag ignores stored diagonal entries.
        let ap = vec![99.0f64, 2.0, 77.0]; // upper [[*,2],[0,*]] treated unit
        let mut x = vec![1.0f64, 3.0];
        dtpmv(
            Layout::RowMajor,
            Uplo::Upper,
            Transpose::NoTrans,
            Diag::Unit,
            2,
            &ap,
            &mut x,
            1,
        );
        assert_eq!(x, vec![7.0, 3.0]);
    }

    #[test]
    fn test_tpmv_colmajor_maps_to_rowmajor() {
        // Col-major upper packed of A equals row-major lower packed of A^T.
        let n = 5;
        let dense = upper_test_matrix(n);
        // Column-major upper packed: columns j, rows 0..=j.
        let mut ap = Vec::new();
        for j in 0..n {
            for i in 0..=j {
                ap.push(dense[i * n + j]);
            }
        }
        let x0: Vec<f64> = (0..n).map(|i| 0.5 + i as f64).collect();
        let mut x = x0.clone();
        dtpmv(
            Layout::ColMajor,
            Uplo::Upper,
            Transpose::NoTrans,
            Diag::NonUnit,
            n,
            &ap,
            &mut x,
            1,
        );
        let expect = dense_mv(&dense, n, &x0, false);
        for (a, b) in x.iter().zip(expect.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
