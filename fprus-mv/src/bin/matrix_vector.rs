//! Throughput and accuracy driver for the blocked compressed GEMV.
//!
//! Usage: `matrix_vector [m] [n] [num_matrices] [bs] [use_reference_blas]`
//! with defaults `256 256 100 32 0`.
//!
//! Builds `num_matrices` seeded random systems, compresses each matrix to
//! single-precision storage (f64 data, 8/23 format), then hands each thread
//! a contiguous chunk of the matrix set. Every thread reports its own
//! gflops and the maximum absolute relative error against a reference
//! dense GEMV pass.

use std::ops::Range;
use std::time::Instant;

use fprus_blas::level2;
use fprus_core::layout::{Layout, Transpose};
use fprus_core::{thread_chunks, SplitMix64};
use fprus_fp::Format;
use fprus_mv::Matrix;

const M_DEFAULT: usize = 256;
const N_DEFAULT: usize = 256;
const NUM_MATRICES_DEFAULT: usize = 100;
const BS_DEFAULT: usize = 32;

const WARMUP: usize = 100;
const MEASUREMENT: usize = 1000;

/// One thread's share of the measurement.
struct ThreadReport {
    seconds: f64,
    max_abs_rel_err: f64,
    matrices: usize,
}

fn arg(args: &[String], idx: usize, default: usize) -> usize {
    args.get(idx)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let m = arg(&args, 1, M_DEFAULT);
    let n = arg(&args, 2, N_DEFAULT);
    let num_matrices = arg(&args, 3, NUM_MATRICES_DEFAULT);
    let bs = arg(&args, 4, BS_DEFAULT);
    let use_reference_blas = arg(&args, 5, 0) != 0;

    println!("matrix multiply: {m} x {n}");
    println!("num matrices: {num_matrices}");

    // Seeded data; entries near 1 keep the relative-error denominators sane.
    let mut a = vec![0.0f64; num_matrices * m * n];
    let mut x = vec![0.0f64; num_matrices * n];
    for k in 0..num_matrices {
        let mut rng = SplitMix64::new(k as u64 + 1);
        for v in a[k * m * n..(k + 1) * m * n].iter_mut() {
            *v = 0.9 + 0.2 * rng.next_f64();
        }
        for v in x[k * n..(k + 1) * n].iter_mut() {
            *v = 0.9 + 0.2 * rng.next_f64();
        }
    }

    // Reference pass
    let mut y_ref = vec![0.0f64; num_matrices * m];
    for k in 0..num_matrices {
        level2::dgemv(
            Layout::RowMajor,
            Transpose::NoTrans,
            m,
            n,
            1.0,
            &a[k * m * n..],
            n,
            &x[k * n..],
            1,
            0.0,
            &mut y_ref[k * m..],
            1,
        );
    }

    let format = Format::new(8, 23);
    let compressed: Vec<Matrix<f64>> = if use_reference_blas {
        Vec::new()
    } else {
        (0..num_matrices)
            .map(|k| Matrix::from_dense(&a[k * m * n..(k + 1) * m * n], m, n, n, format, bs))
            .collect()
    };

    if use_reference_blas {
        println!(
            "mode: reference blas (matrix memory consumption: {} MiB)",
            num_matrices * m * n * std::mem::size_of::<f64>() / (1024 * 1024)
        );
    } else {
        let bytes: usize = compressed.iter().map(|c| c.memory_footprint_bytes()).sum();
        println!("block size: {bs}");
        println!(
            "mode: compressed, exponent bits {}, mantissa bits {} (matrix memory consumption: {} MiB)",
            format.exponent_bits,
            format.mantissa_bits,
            bytes / (1024 * 1024)
        );
    }

    // Per-thread chunk of the matrix set: warmup, timed loop, then the
    // accuracy check against the reference pass.
    let run_chunk = |chunk: Range<usize>| -> ThreadReport {
        let (start, end) = (chunk.start, chunk.end);
        let count = end - start;
        let mut y = vec![0.0f64; count * m];

        let run = |y: &mut [f64]| {
            for k in start..end {
                let yk = &mut y[(k - start) * m..(k - start + 1) * m];
                if use_reference_blas {
                    level2::dgemv(
                        Layout::RowMajor,
                        Transpose::NoTrans,
                        m,
                        n,
                        1.0,
                        &a[k * m * n..],
                        n,
                        &x[k * n..],
                        1,
                        0.0,
                        yk,
                        1,
                    );
                } else {
                    compressed[k].matrix_vector(false, 1.0, &x[k * n..], 0.0, yk);
                }
            }
        };

        for _ in 0..WARMUP {
            run(&mut y);
        }
        let clock = Instant::now();
        for _ in 0..MEASUREMENT {
            run(&mut y);
        }
        let seconds = clock.elapsed().as_secs_f64();

        let mut max_abs_rel_err = 0.0f64;
        for k in start..end {
            for i in 0..m {
                let reference = y_ref[k * m + i];
                let err = ((y[(k - start) * m + i] - reference) / reference).abs();
                max_abs_rel_err = max_abs_rel_err.max(err);
            }
        }

        ThreadReport {
            seconds,
            max_abs_rel_err,
            matrices: count,
        }
    };

    let reports: Vec<ThreadReport> = std::thread::scope(|s| {
        let handles: Vec<_> = thread_chunks(num_matrices)
            .into_iter()
            .map(|chunk| s.spawn(move || run_chunk(chunk)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("benchmark thread panicked"))
            .collect()
    });

    for (t, report) in reports.iter().enumerate() {
        let flops = (MEASUREMENT * report.matrices * 2 * m * n) as f64;
        println!("... thread {t} ...");
        println!("gflops: {:.3}", flops / report.seconds * 1.0e-9);
        println!("max abs error: {:.3e}", report.max_abs_rel_err);
    }
}
