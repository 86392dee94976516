// Kernel entry points mirror BLAS calling conventions.
#![allow(clippy::too_many_arguments)]

//! # fprus-mv
//!
//! Block-compressed dense matrix-vector engine.
//!
//! A dense matrix is cut into `bs x bs` tiles (ragged tiles on the borders,
//! packed tiles on triangular diagonals), each tile compressed with a
//! reduced-precision codec from `fprus-fp` and appended to one contiguous
//! stream. The level-2 kernels walk the stream tile by tile, decompress
//! into an aligned stack buffer, and hand each tile to a dense BLAS-2
//! routine from `fprus-blas`.
//!
//! Two matrix kinds:
//!
//! - [`Matrix`]: full rectangular storage; general matrix-vector multiply.
//! - [`TriangularMatrix`]: one triangle stored, diagonal tiles packed;
//!   triangular multiply, symmetric multiply, and triangular solve.
//!
//! Matrices are immutable once built and hold no interior mutability, so
//! sharing one across threads for concurrent reads is safe. Each kernel
//! call is synchronous, single-threaded, and allocation-free when the
//! matrix owns its stream.
//!
//! ```
//! use fprus_fp::Format;
//! use fprus_mv::{Matrix, DEFAULT_BLOCK_SIZE};
//!
//! let dense: Vec<f64> = (0..40 * 40).map(|i| (i % 7) as f64 * 0.25).collect();
//! let x = vec![1.0; 40];
//! let mut y = vec![0.0; 40];
//!
//! // Store at bf16-like precision: 8 exponent bits, 7 mantissa bits.
//! let a = Matrix::from_dense(&dense, 40, 40, 40, Format::new(8, 7), DEFAULT_BLOCK_SIZE);
//! a.matrix_vector(false, 1.0, &x, 0.0, &mut y);
//! ```

pub mod geometry;
pub mod matrix;
pub mod scalar;
pub mod triangular;

mod frame;

pub use fprus_core::layout::Uplo;
pub use fprus_fp::{Codec, Format};
pub use geometry::{BlockKind, Geometry, Shape};
pub use matrix::Matrix;
pub use scalar::Scalar;
pub use triangular::TriangularMatrix;

/// Default block edge length.
pub const DEFAULT_BLOCK_SIZE: usize = 32;

/// Largest supported block edge length. Kernel scratch buffers are sized
/// for this bound at compile time, so they live on the stack.
pub const MAX_BLOCK_SIZE: usize = 64;
