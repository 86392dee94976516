//! SIMD primitive operations shared across the fprus crates.
//!
//! Each primitive has a portable scalar body (four independent accumulators,
//! which the compiler vectorizes on most targets) and an AVX2+FMA body using
//! `std::arch` intrinsics. The implementation is selected once per process
//! through a `OnceLock` function pointer; the CPUID probe never runs twice.

use std::sync::OnceLock;

/// f32 lanes per AVX2 register (256 / 32 = 8).
pub const F32_LANES: usize = 8;
/// f64 lanes per AVX2 register (256 / 64 = 4).
pub const F64_LANES: usize = 4;

// ============================================================================
// Scalar bodies
// ============================================================================

fn dot_f32_scalar(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let quads = len / 4;
    let (mut s0, mut s1, mut s2, mut s3) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
    for i in 0..quads {
        let k = i * 4;
        s0 += a[k] * b[k];
        s1 += a[k + 1] * b[k + 1];
        s2 += a[k + 2] * b[k + 2];
        s3 += a[k + 3] * b[k + 3];
    }
    let mut sum = (s0 + s1) + (s2 + s3);
    for i in (quads * 4)..len {
        sum += a[i] * b[i];
    }
    sum
}

fn dot_f64_scalar(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len();
    let quads = len / 4;
    let (mut s0, mut s1, mut s2, mut s3) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for i in 0..quads {
        let k = i * 4;
        s0 += a[k] * b[k];
        s1 += a[k + 1] * b[k + 1];
        s2 += a[k + 2] * b[k + 2];
        s3 += a[k + 3] * b[k + 3];
    }
    let mut sum = (s0 + s1) + (s2 + s3);
    for i in (quads * 4)..len {
        sum += a[i] * b[i];
    }
    sum
}

fn axpy_f32_scalar(alpha: f32, x: &[f32], y: &mut [f32]) {
    for (yi, xi) in y.iter_mut().zip(x.iter()) {
        *yi += alpha * xi;
    }
}

fn axpy_f64_scalar(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x.iter()) {
        *yi += alpha * xi;
    }
}

// ============================================================================
// AVX2 + FMA bodies
// ============================================================================

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2,fma")]
unsafe fn dot_f32_avx2(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::x86_64::*;

    let len = a.len();
    let chunks = len / F32_LANES;

    let mut acc0 = _mm256_setzero_ps();
    let mut acc1 = _mm256_setzero_ps();
    let mut acc2 = _mm256_setzero_ps();
    let mut acc3 = _mm256_setzero_ps();

    // 4x unrolled for ILP
    let full = chunks / 4;
    for i in 0..full {
        let k = i * 4 * F32_LANES;
        acc0 = _mm256_fmadd_ps(
            _mm256_loadu_ps(a.as_ptr().add(k)),
            _mm256_loadu_ps(b.as_ptr().add(k)),
            acc0,
        );
        acc1 = _mm256_fmadd_ps(
            _mm256_loadu_ps(a.as_ptr().add(k + F32_LANES)),
            _mm256_loadu_ps(b.as_ptr().add(k + F32_LANES)),
            acc1,
        );
        acc2 = _mm256_fmadd_ps(
            _mm256_loadu_ps(a.as_ptr().add(k + 2 * F32_LANES)),
            _mm256_loadu_ps(b.as_ptr().add(k + 2 * F32_LANES)),
            acc2,
        );
        acc3 = _mm256_fmadd_ps(
            _mm256_loadu_ps(a.as_ptr().add(k + 3 * F32_LANES)),
            _mm256_loadu_ps(b.as_ptr().add(k + 3 * F32_LANES)),
            acc3,
        );
    }

    for i in (full * 4)..chunks {
        let k = i * F32_LANES;
        acc0 = _mm256_fmadd_ps(
            _mm256_loadu_ps(a.as_ptr().add(k)),
            _mm256_loadu_ps(b.as_ptr().add(k)),
            acc0,
        );
    }

    let acc = _mm256_add_ps(_mm256_add_ps(acc0, acc1), _mm256_add_ps(acc2, acc3));
    let mut lanes = [0.0f32; F32_LANES];
    _mm256_storeu_ps(lanes.as_mut_ptr(), acc);
    let mut sum: f32 = lanes.iter().sum();

    for i in (chunks * F32_LANES)..len {
        sum += a[i] * b[i];
    }
    sum
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2,fma")]
unsafe fn dot_f64_avx2(a: &[f64], b: &[f64]) -> f64 {
    use std::arch::x86_64::*;

    let len = a.len();
    let chunks = len / F64_LANES;

    let mut acc0 = _mm256_setzero_pd();
    let mut acc1 = _mm256_setzero_pd();
    let mut acc2 = _mm256_setzero_pd();
    let mut acc3 = _mm256_setzero_pd();

    let full = chunks / 4;
    for i in 0..full {
        let k = i * 4 * F64_LANES;
        acc0 = _mm256_fmadd_pd(
            _mm256_loadu_pd(a.as_ptr().add(k)),
            _mm256_loadu_pd(b.as_ptr().add(k)),
            acc0,
        );
        acc1 = _mm256_fmadd_pd(
            _mm256_loadu_pd(a.as_ptr().add(k + F64_LANES)),
            _mm256_loadu_pd(b.as_ptr().add(k + F64_LANES)),
            acc1,
        );
        acc2 = _mm256_fmadd_pd(
            _mm256_loadu_pd(a.as_ptr().add(k + 2 * F64_LANES)),
            _mm256_loadu_pd(b.as_ptr().add(k + 2 * F64_LANES)),
            acc2,
        );
        acc3 = _mm256_fmadd_pd(
            _mm256_loadu_pd(a.as_ptr().add(k + 3 * F64_LANES)),
            _mm256_loadu_pd(b.as_ptr().add(k + 3 * F64_LANES)),
            acc3,
        );
    }

    for i in (full * 4)..chunks {
        let k = i * F64_LANES;
        acc0 = _mm256_fmadd_pd(
            _mm256_loadu_pd(a.as_ptr().add(k)),
            _mm256_loadu_pd(b.as_ptr().add(k)),
            acc0,
        );
    }

    let acc = _mm256_add_pd(_mm256_add_pd(acc0, acc1), _mm256_add_pd(acc2, acc3));
    let mut lanes = [0.0f64; F64_LANES];
    _mm256_storeu_pd(lanes.as_mut_ptr(), acc);
    let mut sum: f64 = lanes.iter().sum();

    for i in (chunks * F64_LANES)..len {
        sum += a[i] * b[i];
    }
    sum
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2,fma")]
unsafe fn axpy_f32_avx2(alpha: f32, x: &[f32], y: &mut [f32]) {
    use std::arch::x86_64::*;

    let len = x.len().min(y.len());
    let chunks = len / F32_LANES;
    let av = _mm256_set1_ps(alpha);

    for i in 0..chunks {
        let k = i * F32_LANES;
        let xv = _mm256_loadu_ps(x.as_ptr().add(k));
        let yv = _mm256_loadu_ps(y.as_ptr().add(k));
        _mm256_storeu_ps(y.as_mut_ptr().add(k), _mm256_fmadd_ps(av, xv, yv));
    }

    for i in (chunks * F32_LANES)..len {
        y[i] += alpha * x[i];
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2,fma")]
unsafe fn axpy_f64_avx2(alpha: f64, x: &[f64], y: &mut [f64]) {
    use std::arch::x86_64::*;

    let len = x.len().min(y.len());
    let chunks = len / F64_LANES;
    let av = _mm256_set1_pd(alpha);

    for i in 0..chunks {
        let k = i * F64_LANES;
        let xv = _mm256_loadu_pd(x.as_ptr().add(k));
        let yv = _mm256_loadu_pd(y.as_ptr().add(k));
        _mm256_storeu_pd(y.as_mut_ptr().add(k), _mm256_fmadd_pd(av, xv, yv));
    }

    for i in (chunks * F64_LANES)..len {
        y[i] += alpha * x[i];
    }
}

// Safe shims so the dispatch table stores plain fn pointers.

#[cfg(target_arch = "x86_64")]
fn dot_f32_avx2_shim(a: &[f32], b: &[f32]) -> f32 {
    unsafe { dot_f32_avx2(a, b) }
}

#[cfg(target_arch = "x86_64")]
fn dot_f64_avx2_shim(a: &[f64], b: &[f64]) -> f64 {
    unsafe { dot_f64_avx2(a, b) }
}

#[cfg(target_arch = "x86_64")]
fn axpy_f32_avx2_shim(alpha: f32, x: &[f32], y: &mut [f32]) {
    unsafe { axpy_f32_avx2(alpha, x, y) }
}

#[cfg(target_arch = "x86_64")]
fn axpy_f64_avx2_shim(alpha: f64, x: &[f64], y: &mut [f64]) {
    unsafe { axpy_f64_avx2(alpha, x, y) }
}

// ============================================================================
// Dispatch
// ============================================================================

#[cfg(target_arch = "x86_64")]
fn has_avx2_fma() -> bool {
    is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
}

/// Dot product: `sum(a[i] * b[i])`. Slices must have equal length.
#[inline]
pub fn dot_f32(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len());
    static FN: OnceLock<fn(&[f32], &[f32]) -> f32> = OnceLock::new();
    FN.get_or_init(|| {
        #[cfg(target_arch = "x86_64")]
        if has_avx2_fma() {
            return dot_f32_avx2_shim;
        }
        dot_f32_scalar
    })(a, b)
}

/// Dot product: `sum(a[i] * b[i])`. Slices must have equal length.
#[inline]
pub fn dot_f64(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    static FN: OnceLock<fn(&[f64], &[f64]) -> f64> = OnceLock::new();
    FN.get_or_init(|| {
        #[cfg(target_arch = "x86_64")]
        if has_avx2_fma() {
            return dot_f64_avx2_shim;
        }
        dot_f64_scalar
    })(a, b)
}

/// `y[i] += alpha * x[i]` over `min(x.len(), y.len())` elements.
#[inline]
pub fn axpy_f32(alpha: f32, x: &[f32], y: &mut [f32]) {
    static FN: OnceLock<fn(f32, &[f32], &mut [f32])> = OnceLock::new();
    FN.get_or_init(|| {
        #[cfg(target_arch = "x86_64")]
        if has_avx2_fma() {
            return axpy_f32_avx2_shim;
        }
        axpy_f32_scalar
    })(alpha, x, y)
}

/// `y[i] += alpha * x[i]` over `min(x.len(), y.len())` elements.
#[inline]
pub fn axpy_f64(alpha: f64, x: &[f64], y: &mut [f64]) {
    static FN: OnceLock<fn(f64, &[f64], &mut [f64])> = OnceLock::new();
    FN.get_or_init(|| {
        #[cfg(target_arch = "x86_64")]
        if has_avx2_fma() {
            return axpy_f64_avx2_shim;
        }
        axpy_f64_scalar
    })(alpha, x, y)
}

/// `y[i] *= alpha`. Bandwidth-bound; the plain loop vectorizes as-is.
#[inline]
pub fn scal_f32(alpha: f32, y: &mut [f32]) {
    for v in y.iter_mut() {
        *v *= alpha;
    }
}

/// `y[i] *= alpha`. Bandwidth-bound; the plain loop vectorizes as-is.
#[inline]
pub fn scal_f64(alpha: f64, y: &mut [f64]) {
    for v in y.iter_mut() {
        *v *= alpha;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot_reference_f64(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_dot_f32_matches_reference() {
        // Length 67 exercises the unrolled body, the single-chunk loop and the tail.
        let a: Vec<f32> = (0..67).map(|i| (i as f32 * 0.37).sin()).collect();
        let b: Vec<f32> = (0..67).map(|i| (i as f32 * 0.11).cos()).collect();
        let expect: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        assert!((dot_f32(&a, &b) - expect).abs() < 1e-4);
    }

    #[test]
    fn test_dot_f64_matches_reference() {
        let a: Vec<f64> = (0..67).map(|i| (i as f64 * 0.37).sin()).collect();
        let b: Vec<f64> = (0..67).map(|i| (i as f64 * 0.11).cos()).collect();
        assert!((dot_f64(&a, &b) - dot_reference_f64(&a, &b)).abs() < 1e-12);
    }

    #[test]
    fn test_dot_empty() {
        assert_eq!(dot_f32(&[], &[]), 0.0);
        assert_eq!(dot_f64(&[], &[]), 0.0);
    }

    #[test]
    fn test_axpy_f32() {
        let x: Vec<f32> = (0..37).map(|i| i as f32).collect();
        let mut y = vec![1.0f32; 37];
        axpy_f32(2.0, &x, &mut y);
        for (i, v) in y.iter().enumerate() {
            assert_eq!(*v, 1.0 + 2.0 * i as f32);
        }
    }

    #[test]
    fn test_axpy_f64() {
        let x: Vec<f64> = (0..37).map(|i| i as f64).collect();
        let mut y = vec![1.0f64; 37];
        axpy_f64(-0.5, &x, &mut y);
        for (i, v) in y.iter().enumerate() {
            assert!((*v - (1.0 - 0.5 * i as f64)).abs() < 1e-15);
        }
    }

    #[test]
    fn test_scal() {
        let mut y = vec![2.0f64; 9];
        scal_f64(0.25, &mut y);
        assert!(y.iter().all(|&v| v == 0.5));

        let mut z = vec![4.0f32; 5];
        scal_f32(0.0, &mut z);
        assert!(z.iter().all(|&v| v == 0.0));
    }
}
