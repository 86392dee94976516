//! Triangular blocked matrix.
//!
//! One triangle is stored: diagonal tiles in packed form (`bs(bs+1)/2`
//! entries), off-diagonal tiles dense. Three kernels run over the same
//! layout:
//!
//! - `matrix_vector`: triangular multiply. Two sweeps, so every diagonal
//!   tile sees the caller's `x` before any accumulation: first packed TPMV
//!   per diagonal tile, then dense GEMV per off-diagonal tile.
//! - `symmetric_matrix_vector`: treats the stored triangle as one half of
//!   a symmetric matrix; packed SPMV per diagonal tile, and each
//!   off-diagonal tile applied twice (straight and transposed) to cover
//!   the mirror half without storing it.
//! - `solve`: block forward/back substitution. The sweep direction follows
//!   the dependency order, which flips with both the orientation and the
//!   transpose flag; off-diagonal tiles are located by offset lookup since
//!   the sweep does not follow stream order.

use fprus_core::aligned::AlignedBuf;
use fprus_core::layout::{Transpose, Uplo};
use fprus_fp::{Codec, Format};

use crate::frame::{blas2_frame, BlockScratch, LaneScratch};
use crate::geometry::{Geometry, Shape};
use crate::matrix::{check_block_size, Stream};
use crate::scalar::Scalar;

/// Block-compressed triangular matrix.
pub struct TriangularMatrix<'a, T: Scalar> {
    order: usize,
    uplo: Uplo,
    bs: usize,
    codec: Codec<T>,
    geo: Geometry,
    stream: Stream<'a>,
}

impl<T: Scalar> TriangularMatrix<'static, T> {
    /// Compress the `uplo` triangle of a dense row-major source with
    /// leading dimension `ld`. The opposite triangle is never read.
    pub fn from_dense(
        data: &[T],
        order: usize,
        ld: usize,
        uplo: Uplo,
        format: Format,
        bs: usize,
    ) -> TriangularMatrix<'static, T> {
        check_block_size(bs);
        assert!(ld >= order, "leading dimension {ld} shorter than row of {order}");
        let codec = Codec::new(format);
        let geo = Geometry::new(Shape::Triangular { order, uplo }, bs, &codec);
        let mut buf = AlignedBuf::zeroed(geo.total_elements() * codec.element_bytes());
        let written = Self::compress_into(data, order, ld, uplo, format, bs, &mut buf);
        debug_assert_eq!(written, geo.total_elements());
        TriangularMatrix {
            order,
            uplo,
            bs,
            codec,
            geo,
            stream: Stream::Owned(buf),
        }
    }
}

impl<'a, T: Scalar> TriangularMatrix<'a, T> {
    /// Borrow an already-compressed stream produced with the same order,
    /// orientation, format and block size.
    pub fn from_stream(
        stream: &'a [u8],
        order: usize,
        uplo: Uplo,
        format: Format,
        bs: usize,
    ) -> TriangularMatrix<'a, T> {
        check_block_size(bs);
        let codec = Codec::new(format);
        let geo = Geometry::new(Shape::Triangular { order, uplo }, bs, &codec);
        debug_assert!(stream.len() >= geo.total_elements() * codec.element_bytes());
        TriangularMatrix {
            order,
            uplo,
            bs,
            codec,
            geo,
            stream: Stream::Borrowed(stream),
        }
    }

    /// Compress the `uplo` triangle into a caller-provided buffer. Returns
    /// the stream elements written; 0 for a zero-order matrix.
    pub fn compress_into(
        data: &[T],
        order: usize,
        ld: usize,
        uplo: Uplo,
        format: Format,
        bs: usize,
        out: &mut [u8],
    ) -> usize {
        check_block_size(bs);
        if order == 0 {
            return 0;
        }
        assert!(ld >= order, "leading dimension {ld} shorter than row of {order}");
        assert!(
            data.len() >= (order - 1) * ld + order,
            "dense source shorter than {order}x{order} with ld {ld}"
        );

        let codec = Codec::<T>::new(format);
        let geo = Geometry::new(Shape::Triangular { order, uplo }, bs, &codec);
        let esz = codec.element_bytes();
        debug_assert!(out.len() >= geo.total_elements() * esz);

        let mut scratch = BlockScratch::<T>::new();
        let mut k = 0usize;
        let nb = geo.block_rows();
        for bj in 0..nb {
            let (lo, hi) = match uplo {
                Uplo::Upper => (bj, nb),
                Uplo::Lower => (0, bj + 1),
            };
            for bi in lo..hi {
                let (mm, nn) = geo.block_dims(bj, bi);
                if bi == bj {
                    // Diagonal tile: pack the stored triangle row by row.
                    let mut kk = 0usize;
                    for jj in 0..mm {
                        let (c0, c1) = match uplo {
                            Uplo::Upper => (jj, nn),
                            Uplo::Lower => (0, jj + 1),
                        };
                        let src = (bj * bs + jj) * ld + bj * bs;
                        scratch.0[kk..kk + (c1 - c0)]
                            .copy_from_slice(&data[src + c0..src + c1]);
                        kk += c1 - c0;
                    }
                    codec.compress(&mut out[k * esz..], &scratch.0[..kk]);
                } else {
                    for jj in 0..mm {
                        let src = (bj * bs + jj) * ld + bi * bs;
                        scratch.0[jj * nn..jj * nn + nn]
                            .copy_from_slice(&data[src..src + nn]);
                    }
                    codec.compress(&mut out[k * esz..], &scratch.0[..mm * nn]);
                }
                k += geo.element_size_at(bj, bi);
            }
        }
        k
    }

    /// Stream elements needed for an order-`order` triangle, for pre-sizing.
    pub fn footprint_elements(order: usize, format: Format, bs: usize) -> usize {
        check_block_size(bs);
        let codec = Codec::<T>::new(format);
        // Both orientations occupy the same stream space.
        Geometry::new(
            Shape::Triangular { order, uplo: Uplo::Upper },
            bs,
            &codec,
        )
        .total_elements()
    }

    /// Stream bytes needed for an order-`order` triangle.
    pub fn footprint_bytes(order: usize, format: Format, bs: usize) -> usize {
        let codec = Codec::<T>::new(format);
        Self::footprint_elements(order, format, bs) * codec.element_bytes()
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn uplo(&self) -> Uplo {
        self.uplo
    }

    pub fn block_size(&self) -> usize {
        self.bs
    }

    pub fn format(&self) -> Format {
        self.codec.format()
    }

    pub fn borrows_stream(&self) -> bool {
        matches!(self.stream, Stream::Borrowed(_))
    }

    /// Stream element offset of block `(bj, bi)`. The coordinates must lie
    /// inside the stored triangle.
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

    pub fn memory_footprint_elements(&self) -> usize {
        self.geo.total_elements()
    }

    pub fn memory_footprint_bytes(&self) -> usize {
        self.geo.total_elements() * self.codec.element_bytes()
    }

    /// Column range of block row `bj` inside the stored triangle.
    #[inline]
    fn col_range(&self, bj: usize) -> (usize, usize) {
        match self.uplo {
            Uplo::Upper => (bj, self.geo.block_rows()),
            Uplo::Lower => (0, bj + 1),
        }
    }

    /// Triangular matrix-vector multiply: `y := alpha * op(A) * x + beta * y`.
    pub fn matrix_vector(&self, transpose: bool, alpha: T, x: &[T], beta: T, y: &mut [T]) {
        blas2_frame(
            self.order,
            self.order,
            transpose,
            alpha,
            x,
            beta,
            y,
            |transpose, alpha, x, y| {
                let stream = self.stream.as_slice();
                let esz = self.codec.element_bytes();
                let trans = if transpose {
                    Transpose::Trans
                } else {
                    Transpose::NoTrans
                };
                let nb = self.geo.block_rows();
                let mut scratch = BlockScratch::<T>::new();
                let mut lane = LaneScratch::<T>::new();

                // Diagonal tiles first, on the caller's unmutated x: the
                // TPMV result is weighted by alpha exactly once here.
                let mut k = 0usize;
                for bj in 0..nb {
                    let (lo, hi) = self.col_range(bj);
                    for bi in lo..hi {
                        if bi == bj {
                            let (nn, _) = self.geo.block_dims(bj, bj);
                            let tri = nn * (nn + 1) / 2;
                            self.codec
                                .decompress(&mut scratch.0[..tri], &stream[k * esz..]);
                            let j = bj * self.bs;
                            lane.0[..nn].copy_from_slice(&x[j..j + nn]);
                            T::tpmv(self.uplo, trans, nn, &scratch.0[..tri], &mut lane.0[..nn]);
                            for jj in 0..nn {
                                y[j + jj] = y[j + jj] + alpha * lane.0[jj];
                            }
                        }
                        k += self.geo.element_size_at(bj, bi);
                    }
                }

                // Off-diagonal tiles accumulate through dense GEMV.
                let mut k = 0usize;
                for bj in 0..nb {
                    let (lo, hi) = self.col_range(bj);
                    for bi in lo..hi {
                        if bi != bj {
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
                        }
                        k += self.geo.element_size_at(bj, bi);
                    }
                }
            },
        );
    }

    /// Symmetric matrix-vector multiply, reading the stored triangle as one
    /// half of a symmetric matrix: `y := alpha * S * x + beta * y`.
    pub fn symmetric_matrix_vector(&self, alpha: T, x: &[T], beta: T, y: &mut [T]) {
        blas2_frame(
            self.order,
            self.order,
            false,
            alpha,
            x,
            beta,
            y,
            |_, alpha, x, y| {
                let stream = self.stream.as_slice();
                let esz = self.codec.element_bytes();
                let nb = self.geo.block_rows();
                let mut scratch = BlockScratch::<T>::new();

                let mut k = 0usize;
                for bj in 0..nb {
                    let (lo, hi) = self.col_range(bj);
                    for bi in lo..hi {
                        let (mm, nn) = self.geo.block_dims(bj, bi);
                        let j = bj * self.bs;
                        let i = bi * self.bs;
                        if bi == bj {
                            let tri = nn * (nn + 1) / 2;
                            self.codec
                                .decompress(&mut scratch.0[..tri], &stream[k * esz..]);
                            T::spmv(
                                self.uplo,
                                nn,
                                alpha,
                                &scratch.0[..tri],
                                &x[i..i + nn],
                                T::ONE,
                                &mut y[i..i + nn],
                            );
                        } else {
                            self.codec
                                .decompress(&mut scratch.0[..mm * nn], &stream[k * esz..]);
                            // The tile and its mirror image, without
                            // materializing the mirror half.
                            T::gemv(
                                Transpose::NoTrans,
                                mm,
                                nn,
                                alpha,
                                &scratch.0[..mm * nn],
                                nn,
                                &x[i..],
                                T::ONE,
                                &mut y[j..],
                            );
                            T::gemv(
                                Transpose::Trans,
                                mm,
                                nn,
                                alpha,
                                &scratch.0[..mm * nn],
                                nn,
                                &x[j..],
                                T::ONE,
                                &mut y[i..],
                            );
                        }
                        k += self.geo.element_size_at(bj, bi);
                    }
                }
            },
        );
    }

    /// Solve `(alpha * op(A)) * x = y` by block substitution.
    ///
    /// `x` receives the solution; `y` is the right-hand side. With
    /// `alpha == 0` the solution is left as zeros, mirroring the multiply
    /// kernels' alpha-zero behavior.
    pub fn solve(&self, transpose: bool, alpha: T, x: &mut [T], y: &[T]) {
        blas2_frame(
            self.order,
            self.order,
            transpose,
            alpha,
            y,
            T::ZERO,
            x,
            |transpose, alpha, rhs, out| {
                let nb = self.geo.block_rows();
                let mut scratch = BlockScratch::<T>::new();
                let mut acc = LaneScratch::<T>::new();

                // Dependency order: ascending block rows when the operated
                // matrix is effectively lower triangular, descending when
                // it is effectively upper triangular.
                let ascending = transpose == (self.uplo == Uplo::Upper);
                if ascending {
                    for bj in 0..nb {
                        self.solve_block_row(transpose, bj, 0..bj, rhs, out, &mut scratch, &mut acc);
                    }
                } else {
                    for bj in (0..nb).rev() {
                        self.solve_block_row(
                            transpose,
                            bj,
                            (bj + 1..nb).rev(),
                            rhs,
                            out,
                            &mut scratch,
                            &mut acc,
                        );
                    }
                }

                T::scal(alpha.recip(), &mut out[..self.order]);
            },
        );
    }

    /// One block row of the substitution sweep: accumulate the already
    /// solved blocks' contribution, subtract it from the right-hand side,
    /// then solve against the packed diagonal tile.
    fn solve_block_row(
        &self,
        transpose: bool,
        bj: usize,
        inner: impl Iterator<Item = usize>,
        rhs: &[T],
        out: &mut [T],
        scratch: &mut BlockScratch<T>,
        acc: &mut LaneScratch<T>,
    ) {
        let stream = self.stream.as_slice();
        let esz = self.codec.element_bytes();
        let bs = self.bs;
        let mm = (self.order - bj * bs).min(bs);

        acc.0[..mm].fill(T::ZERO);
        for bi in inner {
            let nn = (self.order - bi * bs).min(bs);
            // Under transpose the coefficient tile lives at the mirrored
            // block coordinates.
            let k = if transpose {
                self.geo.offset(bi, bj)
            } else {
                self.geo.offset(bj, bi)
            };
            self.codec
                .decompress(&mut scratch.0[..mm * nn], &stream[k * esz..]);
            if transpose {
                // Stored tile is nn x mm; apply its transpose.
                T::gemv(
                    Transpose::Trans,
                    nn,
                    mm,
                    T::ONE,
                    &scratch.0[..mm * nn],
                    mm,
                    &out[bi * bs..],
                    T::ONE,
                    &mut acc.0[..mm],
                );
            } else {
                T::gemv(
                    Transpose::NoTrans,
                    mm,
                    nn,
                    T::ONE,
                    &scratch.0[..mm * nn],
                    nn,
                    &out[bi * bs..],
                    T::ONE,
                    &mut acc.0[..mm],
                );
            }
        }

        for jj in 0..mm {
            out[bj * bs + jj] = rhs[bj * bs + jj] - acc.0[jj];
        }

        let k = self.geo.offset(bj, bj);
        let tri = mm * (mm + 1) / 2;
        self.codec
            .decompress(&mut scratch.0[..tri], &stream[k * esz..]);
        let trans = if transpose {
            Transpose::Trans
        } else {
            Transpose::NoTrans
        };
        T::tpsv(
            self.uplo,
            trans,
            mm,
            &scratch.0[..tri],
            &mut out[bj * bs..bj * bs + mm],
        );
    }
}
