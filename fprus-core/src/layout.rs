//! CBLAS-style layout and transpose enumerations.
//!
//! The discriminants match the CBLAS integer constants so the enums cast
//! directly to `c_int` for the MKL passthrough.

/// Memory layout for matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Layout {
    /// Row-major (C-style): elements in a row are contiguous.
    #[default]
    RowMajor = 101,
    /// Column-major (Fortran-style): elements in a column are contiguous.
    ColMajor = 102,
}

/// Transpose operation for matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Transpose {
    /// No transpose.
    #[default]
    NoTrans = 111,
    /// Transpose.
    Trans = 112,
    /// Conjugate transpose (identical to `Trans` for real types).
    ConjTrans = 113,
}

impl Transpose {
    /// True for either transposed variant.
    #[inline(always)]
    pub fn is_transposed(self) -> bool {
        !matches!(self, Transpose::NoTrans)
    }

    /// The opposite operation (conjugation collapses onto `Trans`).
    #[inline(always)]
    pub fn flipped(self) -> Transpose {
        match self {
            Transpose::NoTrans => Transpose::Trans,
            Transpose::Trans | Transpose::ConjTrans => Transpose::NoTrans,
        }
    }
}

impl Layout {
    /// Leading dimension stride for an M x N matrix.
    #[inline(always)]
    pub fn leading_dim(self, rows: usize, cols: usize) -> usize {
        match self {
            Layout::RowMajor => cols,
            Layout::ColMajor => rows,
        }
    }

    /// Linear index into a flat array for element (i, j) of an M x N matrix.
    #[inline(always)]
    pub fn index(self, i: usize, j: usize, ld: usize) -> usize {
        match self {
            Layout::RowMajor => i * ld + j,
            Layout::ColMajor => j * ld + i,
        }
    }
}

/// BLAS triangle specifier (upper/lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Uplo {
    #[default]
    Upper = 121,
    Lower = 122,
}

impl Uplo {
    /// The other triangle. A stored triangle read transposed is the
    /// opposite triangle of the transposed matrix.
    #[inline(always)]
    pub fn flipped(self) -> Uplo {
        match self {
            Uplo::Upper => Uplo::Lower,
            Uplo::Lower => Uplo::Upper,
        }
    }
}

/// BLAS diagonal specifier (unit/non-unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Diag {
    #[default]
    NonUnit = 131,
    Unit = 132,
}
