//! # fprus-core
//!
//! Shared substrate for the fprus workspace.
//!
//! This crate provides:
//! - **CBLAS layout types**: row-major / column-major, transpose, triangle
//!   and diagonal specifiers with CBLAS-compatible discriminants.
//! - **SIMD primitives**: dot / axpy / scal for f32 and f64 with runtime
//!   AVX2 dispatch and portable scalar fallbacks.
//! - **Aligned buffers**: 64-byte-aligned heap allocations for compressed
//!   streams, so downstream kernels can rely on aligned SIMD loads.
//! - **Work splitting**: balanced chunk ranges for the drivers' scoped
//!   thread fan-out.
//! - **Scalar abstraction**: the `Real` trait over f32/f64 exposing the
//!   IEEE-754 bit layout consumed by the reduced-precision codec.

pub mod aligned;
pub mod layout;
pub mod parallel;
pub mod real;
pub mod rng;
pub mod simd;

// Intel MKL FFI declarations (only compiled when --features mkl is enabled)
#[cfg(feature = "mkl")]
pub mod mkl_ffi;

pub use aligned::{AlignedBuf, ALIGNMENT};
pub use layout::{Diag, Layout, Transpose, Uplo};
pub use parallel::{chunk_ranges, thread_chunks};
pub use real::Real;
pub use rng::SplitMix64;
