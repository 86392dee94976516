//! Blocked layout geometry.
//!
//! A matrix is tiled with edge length `bs`. Four storage classes exist per
//! shape, because border tiles and packed diagonal tiles occupy fewer
//! stream elements than interior tiles:
//!
//! ```text
//! full (m x n):          triangular (upper, order n):
//!   a a a | b              d f f | e
//!   a a a | b              . d f | e
//!   ------+--              . . d | e
//!   c c c | x              ------+--
//!                          . . . | g
//! ```
//!
//! full: `a` interior (`bs x bs`), `b` right edge (`bs x rn`),
//! `c` bottom edge (`rm x bs`), `x` corner (`rm x rn`).
//!
//! triangular: `d` packed diagonal (`bs(bs+1)/2` entries), `f` dense
//! off-diagonal (`bs x bs`), `e` dense off-diagonal edge, `g` packed
//! diagonal corner (`rn(rn+1)/2` entries). For the lower orientation the
//! edge blocks sit in the last block row (`rn x bs`) instead of the last
//! block column.
//!
//! Blocks are stored in traversal order: block-row-major, and for
//! triangular shapes only the columns inside the stored triangle. The
//! stream offset of any block is the sum of the element sizes of every
//! block before it in that order; [`Geometry::offset`] computes it in
//! closed form, and construction advances a cursor by each block's own
//! element size, so the two always agree.

use fprus_core::layout::Uplo;
use fprus_core::real::Real;
use fprus_fp::Codec;

/// Logical shape of a blocked matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Dense rectangular matrix.
    Full { rows: usize, cols: usize },
    /// One triangle of a square matrix.
    Triangular { order: usize, uplo: Uplo },
}

impl Shape {
    pub fn rows(&self) -> usize {
        match *self {
            Shape::Full { rows, .. } => rows,
            Shape::Triangular { order, .. } => order,
        }
    }

    pub fn cols(&self) -> usize {
        match *self {
            Shape::Full { cols, .. } => cols,
            Shape::Triangular { order, .. } => order,
        }
    }

    /// Block counts per storage class, in stream-accounting order.
    pub fn block_counts(&self, bs: usize) -> [usize; 4] {
        match *self {
            Shape::Full { rows: m, cols: n } => {
                if m == 0 || n == 0 {
                    return [0; 4];
                }
                let mf = m / bs;
                let nf = n / bs;
                let me = m.div_ceil(bs) - mf; // 0 or 1
                let ne = n.div_ceil(bs) - nf;
                [mf * nf, mf * ne, me * nf, me * ne]
            }
            Shape::Triangular { order: n, .. } => {
                if n == 0 {
                    return [0; 4];
                }
                let nf = n / bs;
                let ne = n.div_ceil(bs) - nf;
                [nf, (nf * (nf + 1)) / 2 - nf, nf * ne, ne]
            }
        }
    }

    /// Logical scalar entries per block of each storage class.
    pub fn block_entries(&self, bs: usize) -> [usize; 4] {
        match *self {
            Shape::Full { rows: m, cols: n } => {
                if m == 0 || n == 0 {
                    return [0; 4];
                }
                let rm = m % bs;
                let rn = n % bs;
                [bs * bs, bs * rn, rm * bs, rm * rn]
            }
            Shape::Triangular { order: n, .. } => {
                if n == 0 {
                    return [0; 4];
                }
                let rn = n % bs;
                [(bs * (bs + 1)) / 2, bs * bs, bs * rn, (rn * (rn + 1)) / 2]
            }
        }
    }
}

/// Position class of one block inside the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Dense `bs x bs` block: interior of a full matrix, or an off-diagonal
    /// block of a triangular one.
    Interior,
    /// Dense block on the ragged last block column, `bs x rn`.
    RightEdge,
    /// Dense block on the ragged last block row, `rm x bs`.
    BottomEdge,
    /// Dense corner block of a full matrix, `rm x rn`.
    Corner,
    /// Packed diagonal block of a triangular matrix, `bs(bs+1)/2` entries.
    Diagonal,
    /// Packed diagonal block in the ragged corner, `rn(rn+1)/2` entries.
    DiagonalCorner,
}

/// Complete layout bookkeeping for one blocked matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    shape: Shape,
    bs: usize,
    counts: [usize; 4],
    entries: [usize; 4],
    elements: [usize; 4],
    total_elements: usize,
}

impl Geometry {
    /// Combine the shape's block accounting with the codec's per-block
    /// stream element sizes.
    pub fn new<T: Real>(shape: Shape, bs: usize, codec: &Codec<T>) -> Geometry {
        assert!(bs >= 1, "geometry: block size must be positive");
        let counts = shape.block_counts(bs);
        let entries = shape.block_entries(bs);
        let mut elements = [0usize; 4];
        for (e, &n) in elements.iter_mut().zip(entries.iter()) {
            *e = codec.memory_footprint_elements(n);
        }
        let total_elements = counts
            .iter()
            .zip(elements.iter())
            .map(|(&c, &e)| c * e)
            .sum();
        Geometry {
            shape,
            bs,
            counts,
            entries,
            elements,
            total_elements,
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn block_size(&self) -> usize {
        self.bs
    }

    pub fn block_counts(&self) -> [usize; 4] {
        self.counts
    }

    /// Stream elements occupied by all blocks together.
    pub fn total_elements(&self) -> usize {
        self.total_elements
    }

    /// Number of block rows (0 when the shape is empty).
    pub fn block_rows(&self) -> usize {
        self.shape.rows().div_ceil(self.bs)
    }

    /// Number of block columns.
    pub fn block_cols(&self) -> usize {
        self.shape.cols().div_ceil(self.bs)
    }

    /// Row/column extent of block `(bj, bi)`.
    pub fn block_dims(&self, bj: usize, bi: usize) -> (usize, usize) {
        let mm = (self.shape.rows() - bj * self.bs).min(self.bs);
        let nn = (self.shape.cols() - bi * self.bs).min(self.bs);
        (mm, nn)
    }

    /// Classify block `(bj, bi)`. The coordinates must lie inside the
    /// stored layout (inside the triangle, for triangular shapes).
    pub fn kind(&self, bj: usize, bi: usize) -> BlockKind {
        match self.shape {
            Shape::Full { rows: m, cols: n } => {
                let bottom = bj + 1 == self.block_rows() && m % self.bs != 0;
                let right = bi + 1 == self.block_cols() && n % self.bs != 0;
                match (bottom, right) {
                    (false, false) => BlockKind::Interior,
                    (false, true) => BlockKind::RightEdge,
                    (true, false) => BlockKind::BottomEdge,
                    (true, true) => BlockKind::Corner,
                }
            }
            Shape::Triangular { order: n, uplo } => {
                let nb = self.block_rows();
                let ragged = n % self.bs != 0;
                if bi == bj {
                    if ragged && bj + 1 == nb {
                        BlockKind::DiagonalCorner
                    } else {
                        BlockKind::Diagonal
                    }
                } else {
                    debug_assert!(match uplo {
                        Uplo::Upper => bi > bj,
                        Uplo::Lower => bi < bj,
                    });
                    match uplo {
                        Uplo::Upper if ragged && bi + 1 == nb => BlockKind::RightEdge,
                        Uplo::Lower if ragged && bj + 1 == nb => BlockKind::BottomEdge,
                        _ => BlockKind::Interior,
                    }
                }
            }
        }
    }

    /// Storage-accounting slot of a kind under this shape.
    fn slot(&self, kind: BlockKind) -> usize {
        match self.shape {
            Shape::Full { .. } => match kind {
                BlockKind::Interior => 0,
                BlockKind::RightEdge => 1,
                BlockKind::BottomEdge => 2,
                BlockKind::Corner => 3,
                BlockKind::Diagonal | BlockKind::DiagonalCorner => {
                    unreachable!("packed blocks do not occur in full shapes")
                }
            },
            Shape::Triangular { .. } => match kind {
                BlockKind::Diagonal => 0,
                BlockKind::Interior => 1,
                BlockKind::RightEdge | BlockKind::BottomEdge => 2,
                BlockKind::DiagonalCorner => 3,
                BlockKind::Corner => unreachable!("full corners do not occur in triangles"),
            },
        }
    }

    /// Logical scalar entries stored by block `(bj, bi)`.
    pub fn entries_at(&self, bj: usize, bi: usize) -> usize {
        self.entries[self.slot(self.kind(bj, bi))]
    }

    /// Stream elements occupied by block `(bj, bi)`.
    pub fn element_size_at(&self, bj: usize, bi: usize) -> usize {
        self.elements[self.slot(self.kind(bj, bi))]
    }

    /// Stream element offset of block `(bj, bi)`, i.e. the cumulative
    /// element size of every block preceding it in traversal order.
    pub fn offset(&self, bj: usize, bi: usize) -> usize {
        let [ea, eb, ec, _ed] = self.elements;
        match self.shape {
            Shape::Full { rows: m, cols: n } => {
                let mf = m / self.bs;
                let nf = n / self.bs;
                let row_elements = nf * ea + if n % self.bs != 0 { eb } else { 0 };
                if bj < mf {
                    bj * row_elements + bi * ea
                } else {
                    mf * row_elements + bi * ec
                }
            }
            Shape::Triangular { order: n, uplo } => {
                let nb = self.block_rows();
                let ragged = n % self.bs != 0;
                match uplo {
                    Uplo::Upper => {
                        // Rows before bj each hold one diagonal, then their
                        // off-diagonals; with a ragged border the last
                        // off-diagonal of every preceding row is an edge block.
                        let offdiag_before = bj * (nb - 1) - (bj * bj - bj) / 2;
                        let edge_before = if ragged { bj } else { 0 };
                        let mut n_diag = bj;
                        let mut n_full = offdiag_before - edge_before;
                        if bi > bj {
                            n_diag += 1;
                            n_full += bi - bj - 1;
                        }
                        n_diag * ea + n_full * eb + edge_before * ec
                    }
                    Uplo::Lower => {
                        // Row r holds r off-diagonals then its diagonal; only
                        // the ragged last block row stores edge blocks.
                        let full_before = (bj * bj - bj) / 2;
                        if ragged && bj + 1 == nb {
                            bj * ea + full_before * eb + bi * ec
                        } else {
                            bj * ea + (full_before + bi) * eb
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fprus_fp::Format;

    fn geo_full(m: usize, n: usize, bs: usize) -> Geometry {
        let codec = Codec::<f64>::identity();
        Geometry::new(Shape::Full { rows: m, cols: n }, bs, &codec)
    }

    fn geo_tri(n: usize, uplo: Uplo, bs: usize) -> Geometry {
        let codec = Codec::<f64>::identity();
        Geometry::new(Shape::Triangular { order: n, uplo }, bs, &codec)
    }

    /// Walk the traversal order accumulating each block's element size.
    fn traversal(geo: &Geometry) -> Vec<((usize, usize), usize)> {
        let mut out = Vec::new();
        let mut cursor = 0usize;
        let nb_r = geo.block_rows();
        let nb_c = geo.block_cols();
        for bj in 0..nb_r {
            let (start, end) = match geo.shape() {
                Shape::Full { .. } => (0, nb_c),
                Shape::Triangular { uplo: Uplo::Upper, .. } => (bj, nb_c),
                Shape::Triangular { uplo: Uplo::Lower, .. } => (0, bj + 1),
            };
            for bi in start..end {
                out.push(((bj, bi), cursor));
                cursor += geo.element_size_at(bj, bi);
            }
        }
        assert_eq!(cursor, geo.total_elements());
        out
    }

    #[test]
    fn test_full_counts_all_border_parities() {
        // (blocks, entries) for all four m/n divisibility combinations, bs = 32
        let cases = [
            (64, 64, [4, 0, 0, 0], [1024, 0, 0, 0]),
            (64, 40, [2, 2, 0, 0], [1024, 32 * 8, 0, 0]),
            (40, 64, [2, 0, 2, 0], [1024, 0, 8 * 32, 0]),
            (40, 40, [1, 1, 1, 1], [1024, 32 * 8, 8 * 32, 64]),
        ];
        for (m, n, counts, entries) in cases {
            let shape = Shape::Full { rows: m, cols: n };
            assert_eq!(shape.block_counts(32), counts, "{m}x{n}");
            assert_eq!(shape.block_entries(32), entries, "{m}x{n}");
        }
    }

    #[test]
    fn test_full_total_matches_dense_storage() {
        // Identity codec: total stream elements equal the dense element count.
        for (m, n) in [(64, 64), (64, 40), (40, 64), (40, 40), (1, 1), (33, 95)] {
            let geo = geo_full(m, n, 32);
            assert_eq!(geo.total_elements(), m * n, "{m}x{n}");
        }
    }

    #[test]
    fn test_triangular_counts() {
        // n = 64: two diagonal blocks, one off-diagonal, no border
        let shape = Shape::Triangular { order: 64, uplo: Uplo::Upper };
        assert_eq!(shape.block_counts(32), [2, 1, 0, 0]);
        assert_eq!(shape.block_entries(32), [528, 1024, 0, 0]);

        // n = 100: three full diagonals, three off-diagonals, three edge, one corner
        let shape = Shape::Triangular { order: 100, uplo: Uplo::Lower };
        assert_eq!(shape.block_counts(32), [3, 3, 3, 1]);
        assert_eq!(shape.block_entries(32), [528, 1024, 32 * 4, 10]);
    }

    #[test]
    fn test_triangular_total_matches_packed_storage() {
        // Identity codec: the stream holds exactly the triangle's entries.
        for n in [32, 64, 96, 100, 33, 1, 31] {
            for uplo in [Uplo::Upper, Uplo::Lower] {
                let geo = geo_tri(n, uplo, 32);
                assert_eq!(geo.total_elements(), n * (n + 1) / 2, "n={n} {uplo:?}");
            }
        }
    }

    #[test]
    fn test_zero_extent_shapes() {
        assert_eq!(geo_full(0, 17, 32).total_elements(), 0);
        assert_eq!(geo_full(17, 0, 32).total_elements(), 0);
        assert_eq!(geo_tri(0, Uplo::Upper, 32).total_elements(), 0);
        assert_eq!(geo_full(0, 17, 32).block_rows(), 0);
    }

    #[test]
    fn test_full_kinds() {
        let geo = geo_full(40, 40, 32);
        assert_eq!(geo.kind(0, 0), BlockKind::Interior);
        assert_eq!(geo.kind(0, 1), BlockKind::RightEdge);
        assert_eq!(geo.kind(1, 0), BlockKind::BottomEdge);
        assert_eq!(geo.kind(1, 1), BlockKind::Corner);

        // Exact fit: no edge classes anywhere
        let geo = geo_full(64, 64, 32);
        for bj in 0..2 {
            for bi in 0..2 {
                assert_eq!(geo.kind(bj, bi), BlockKind::Interior);
            }
        }
    }

    #[test]
    fn test_triangular_kinds() {
        let geo = geo_tri(100, Uplo::Upper, 32);
        assert_eq!(geo.kind(0, 0), BlockKind::Diagonal);
        assert_eq!(geo.kind(0, 1), BlockKind::Interior);
        assert_eq!(geo.kind(0, 3), BlockKind::RightEdge);
        assert_eq!(geo.kind(3, 3), BlockKind::DiagonalCorner);

        let geo = geo_tri(100, Uplo::Lower, 32);
        assert_eq!(geo.kind(2, 0), BlockKind::Interior);
        assert_eq!(geo.kind(3, 0), BlockKind::BottomEdge);
        assert_eq!(geo.kind(3, 3), BlockKind::DiagonalCorner);
        assert_eq!(geo.kind(2, 2), BlockKind::Diagonal);
    }

    #[test]
    fn test_offset_consistency_full() {
        for (m, n) in [(64, 64), (64, 40), (40, 64), (40, 40), (96, 96), (70, 130)] {
            let geo = geo_full(m, n, 32);
            for ((bj, bi), cursor) in traversal(&geo) {
                assert_eq!(
                    geo.offset(bj, bi),
                    cursor,
                    "{m}x{n} block ({bj},{bi})"
                );
            }
        }
    }

    #[test]
    fn test_offset_consistency_triangular() {
        for n in [32, 64, 96, 100, 33, 130] {
            for uplo in [Uplo::Upper, Uplo::Lower] {
                let geo = geo_tri(n, uplo, 32);
                for ((bj, bi), cursor) in traversal(&geo) {
                    assert_eq!(
                        geo.offset(bj, bi),
                        cursor,
                        "n={n} {uplo:?} block ({bj},{bi})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_offset_consistency_compressed_codec() {
        // Non-identity codec gives distinct element sizes per class.
        let codec = Codec::<f64>::new(Format::new(8, 15));
        for n in [100, 96] {
            for uplo in [Uplo::Upper, Uplo::Lower] {
                let geo = Geometry::new(Shape::Triangular { order: n, uplo }, 32, &codec);
                for ((bj, bi), cursor) in traversal(&geo) {
                    assert_eq!(geo.offset(bj, bi), cursor, "n={n} {uplo:?} ({bj},{bi})");
                }
            }
        }
        let geo = Geometry::new(Shape::Full { rows: 70, cols: 41 }, 32, &codec);
        for ((bj, bi), cursor) in traversal(&geo) {
            assert_eq!(geo.offset(bj, bi), cursor, "({bj},{bi})");
        }
    }

    #[test]
    fn test_block_dims() {
        let geo = geo_full(40, 70, 32);
        assert_eq!(geo.block_dims(0, 0), (32, 32));
        assert_eq!(geo.block_dims(1, 0), (8, 32));
        assert_eq!(geo.block_dims(0, 2), (32, 6));
        assert_eq!(geo.block_dims(1, 2), (8, 6));
    }

    #[test]
    fn test_footprint_matches_component_formulas() {
        // total == sum over classes of count * element size, recomputed here
        let codec = Codec::<f64>::new(Format::new(8, 7));
        let shape = Shape::Full { rows: 100, cols: 70 };
        let geo = Geometry::new(shape, 32, &codec);
        let counts = shape.block_counts(32);
        let entries = shape.block_entries(32);
        let expect: usize = counts
            .iter()
            .zip(entries.iter())
            .map(|(&c, &e)| c * codec.memory_footprint_elements(e))
            .sum();
        assert_eq!(geo.total_elements(), expect);
    }

    #[test]
    fn test_single_block_shapes() {
        // Smaller than one block: everything is a corner (full) or the
        // diagonal corner (triangular).
        let geo = geo_full(5, 7, 32);
        assert_eq!(geo.kind(0, 0), BlockKind::Corner);
        assert_eq!(geo.total_elements(), 35);
        assert_eq!(geo.offset(0, 0), 0);

        let geo = geo_tri(5, Uplo::Upper, 32);
        assert_eq!(geo.kind(0, 0), BlockKind::DiagonalCorner);
        assert_eq!(geo.total_elements(), 15);
    }
}
