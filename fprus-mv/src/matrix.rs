//! Full rectangular blocked matrix.
//!
//! Construction compresses a dense row-major source block by block into one
//! contiguous stream; the matrix is immutable afterwards. The general
//! matrix-vector multiply walks the stream in layout order, decompressing
//! each tile into an aligned stack buffer and issuing one dense GEMV per
//! tile with `beta = 1` so contributions accumulate.

use fprus_core::aligned::AlignedBuf;
use fprus_core::layout::Transpose;
use fprus_fp::{Codec, Format};

use crate::frame::{blas2_frame, BlockScratch};
use crate::geometry::{Geometry, Shape};
use crate::scalar::Scalar;
use crate::MAX_BLOCK_SIZE;

/// Compressed stream storage: owned or borrowed from the caller.
pub(crate) enum Stream<'a> {
    Owned(AlignedBuf),
    Borrowed(&'a [u8]),
}

impl Stream<'_> {
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Stream::Owned(buf) => buf,
            Stream::Borrowed(s) => s,
        }
    }
}

/// Block-compressed dense rectangular matrix.
///
/// The lifetime is `'static` for matrices that own their stream and tied
/// to the caller's buffer for borrowed ones.
pub struct Matrix<'a, T: Scalar> {
    rows: usize,
    cols: usize,
    bs: usize,
    codec: Codec<T>,
    geo: Geometry,
    stream: Stream<'a>,
}

pub(crate) fn check_block_size(bs: usize) {
    assert!(
        (1..=MAX_BLOCK_SIZE).contains(&bs),
        "block size {bs} outside 1..={MAX_BLOCK_SIZE}"
    );
}

impl<T: Scalar> Matrix<'static, T> {
    /// Compress a dense row-major source with leading dimension `ld`.
    pub fn from_dense(
        data: &[T],
        rows: usize,
        cols: usize,
        ld: usize,
        format: Format,
        bs: usize,
    ) -> Matrix<'static, T> {
        check_block_size(bs);
        assert!(ld >= cols, "leading dimension {ld} shorter than row of {cols}");
        let codec = Codec::new(format);
        let geo = Geometry::new(Shape::Full { rows, cols }, bs, &codec);
        let mut buf = AlignedBuf::zeroed(geo.total_elements() * codec.element_bytes());
        let written = Self::compress_into(data, rows, cols, ld, format, bs, &mut buf);
        debug_assert_eq!(written, geo.total_elements());
        Matrix {
            rows,
            cols,
            bs,
            codec,
            geo,
            stream: Stream::Owned(buf),
        }
    }

}

impl<'a, T: Scalar> Matrix<'a, T> {
    /// Borrow an already-compressed stream. The stream must have been
    /// produced with the same shape, format and block size (for example by
    /// [`Matrix::compress_into`]); the producer carries that contract.
    pub fn from_stream(
        stream: &'a [u8],
        rows: usize,
        cols: usize,
        format: Format,
        bs: usize,
    ) -> Matrix<'a, T> {
        check_block_size(bs);
        let codec = Codec::new(format);
        let geo = Geometry::new(Shape::Full { rows, cols }, bs, &codec);
        debug_assert!(stream.len() >= geo.total_elements() * codec.element_bytes());
        Matrix {
            rows,
            cols,
            bs,
            codec,
            geo,
            stream: Stream::Borrowed(stream),
        }
    }

    /// Compress a dense source into a caller-provided buffer without
    /// building a matrix. Returns the number of stream elements written;
    /// zero-extent inputs write nothing and return 0.
    pub fn compress_into(
        data: &[T],
        rows: usize,
        cols: usize,
        ld: usize,
        format: Format,
        bs: usize,
        out: &mut [u8],
    ) -> usize {
        check_block_size(bs);
        if rows == 0 || cols == 0 {
            return 0;
        }
        assert!(ld >= cols, "leading dimension {ld} shorter than row of {cols}");
        assert!(
            data.len() >= (rows - 1) * ld + cols,
            "dense source shorter than {rows}x{cols} with ld {ld}"
        );

        let codec = Codec::<T>::new(format);
        let geo = Geometry::new(Shape::Full { rows, cols }, bs, &codec);
        let esz = codec.element_bytes();
        debug_assert!(out.len() >= geo.total_elements() * esz);

        let mut scratch = BlockScratch::<T>::new();
        let mut k = 0usize;
        for bj in 0..geo.block_rows() {
            for bi in 0..geo.block_cols() {
                let (mm, nn) = geo.block_dims(bj, bi);
                for jj in 0..mm {
                    let src = (bj * bs + jj) * ld + bi * bs;
                    scratch.0[jj * nn..jj * nn + nn].copy_from_slice(&data[src..src + nn]);
                }
                codec.compress(&mut out[k * esz..], &scratch.0[..mm * nn]);
                k += geo.element_size_at(bj, bi);
            }
        }
        k
    }

    /// Stream elements needed for a `rows x cols` matrix, for pre-sizing.
    pub fn footprint_elements(rows: usize, cols: usize, format: Format, bs: usize) -> usize {
        check_block_size(bs);
        let codec = Codec::<T>::new(format);
        Geometry::new(Shape::Full { rows, cols }, bs, &codec).total_elements()
    }

    /// Stream bytes needed for a `rows x cols` matrix.
    pub fn footprint_bytes(rows: usize, cols: usize, format: Format, bs: usize) -> usize {
        let codec = Codec::<T>::new(format);
        Self::footprint_elements(rows, cols, format, bs) * codec.element_bytes()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn block_size(&self) -> usize {
        self.bs
    }

    pub fn format(&self) -> Format {
        self.codec.format()
    }

    /// True when the stream was supplied by the caller.
    pub fn borrows_stream(&self) -> bool {
        matches!(self.stream, Stream::Borrowed(_))
    }

    /// Stream element offset of block `(bj, bi)`.
    pub fn block_offset(&self, bj: usize, bi: usize) -> usize {
        self.geo.offset(bj, bi)
    }

    /// Compressed bytes of block `(bj, bi)`.
    pub fn block_slice(&self, bj: usize, bi: usize) -> &[u8] {
        let esz = self.codec.element_bytes();
        let start = self.geo.offset(bj, bi) * esz;
        let len = self.geo.element_size_at(bj, bi) * esz;
        &self.stream.as_slice()[start..start + len]
    }

    /// Stream elements held by this matrix.
    pub fn memory_footprint_elements(&self) -> usize {
        self.geo.total_elements()
    }

    /// Stream bytes held by this matrix.
    pub fn memory_footprint_bytes(&self) -> usize {
        self.geo.total_elements() * self.codec.element_bytes()
    }

    /// General matrix-vector multiply: `y := alpha * op(A) * x + beta * y`.
    ///
    /// `x` must hold at least `cols` elements (`rows` under transpose) and
    /// `y` at least `rows` (`cols` under transpose).
    pub fn matrix_vector(&self, transpose: bool, alpha: T, x: &[T], beta: T, y: &mut [T]) {
        blas2_frame(
            self.rows,
            self.cols,
            transpose,
            alpha,
            x,
            beta,
            y,
            |transpose, alpha, x, y| self.apply_blocks(transpose, alpha, x, y),
        );
    }

    /// Accumulate `alpha * op(A) * x` into `y`, one tile at a time.
    fn apply_blocks(&self, transpose: bool, alpha: T, x: &[T], y: &mut [T]) {
        let stream = self.stream.as_slice();
        let esz = self.codec.element_bytes();
        let trans = if transpose {
            Transpose::Trans
        } else {
            Transpose::NoTrans
        };

        let mut scratch = BlockScratch::<T>::new();
        let mut k = 0usize;
        for bj in 0..self.geo.block_rows() {
            for bi in 0..self.geo.block_cols() {
                let (mm, nn) = self.geo.block_dims(bj, bi);
                self.codec
                    .decompress(&mut scratch.0[..mm * nn], &stream[k * esz..]);

                let j = bj * self.bs;
                let i = bi * self.bs;
                let (xs, ys) = if transpose { (j, i) } else { (i, j) };
                T::gemv(
                    trans,
                    mm,
                    nn,
                    alpha,
                    &scratch.0[..mm * nn],
                    nn,
                    &x[xs..],
                    T::ONE,
                    &mut y[ys..],
                );

                k += self.geo.element_size_at(bj, bi);
            }
        }
    }
}
