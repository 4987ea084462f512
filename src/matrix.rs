/// Module-matrix input.
///
/// The renderer never encodes data itself. It consumes a finished grid of dark and light
/// modules through [`ModuleMatrix`], which any QR encoder can implement. [`BitMatrix`] is an
/// owned implementation for callers that already hold the modules as booleans.
use serde::{Deserialize, Serialize};

/// A finished, square QR module grid.
///
/// Implementations must be fully computed before rendering starts and must not change while
/// a render is in flight.
pub trait ModuleMatrix {
    /// Side length of the grid, in modules.
    fn module_count(&self) -> usize;

    /// Returns `true` for a dark module. Callers only query `row, col < module_count()`.
    fn is_dark(&self, row: usize, col: usize) -> bool;
}

impl<M: ModuleMatrix + ?Sized> ModuleMatrix for &M {
    fn module_count(&self) -> usize {
        (**self).module_count()
    }

    fn is_dark(&self, row: usize, col: usize) -> bool {
        (**self).is_dark(row, col)
    }
}

/// An owned module grid, packed bitwise into bytes.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BitMatrix {
    size: usize,

    /// Row-major modules (0 = light, 1 = dark), eight per byte.
    modules: Vec<u8>,
}

impl BitMatrix {
    /// Creates an all-light grid of `size` × `size` modules.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            modules: vec![0u8; (size * size + 7) / 8],
        }
    }

    /// Builds a grid from rows of booleans.
    ///
    /// Returns `None` when the rows do not form a square.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qirust_style::matrix::{BitMatrix, ModuleMatrix};
    ///
    /// let m = BitMatrix::from_rows(&[vec![true, false], vec![false, true]]).unwrap();
    /// assert_eq!(m.module_count(), 2);
    /// assert!(m.is_dark(1, 1));
    /// ```
    pub fn from_rows(rows: &[Vec<bool>]) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }
        let mut result = Self::new(size);
        for (r, row) in rows.iter().enumerate() {
            for (c, &dark) in row.iter().enumerate() {
                result.set(r, c, dark);
            }
        }
        Some(result)
    }

    /// Copies any other matrix into an owned grid.
    pub fn from_matrix<M: ModuleMatrix + ?Sized>(source: &M) -> Self {
        let size = source.module_count();
        let mut result = Self::new(size);
        for r in 0..size {
            for c in 0..size {
                result.set(r, c, source.is_dark(r, c));
            }
        }
        result
    }

    /// Sets one module. Out-of-range coordinates are ignored.
    pub fn set(&mut self, row: usize, col: usize, dark: bool) {
        if row >= self.size || col >= self.size {
            return;
        }
        let index = row * self.size + col;
        let byteindex = index >> 3;
        let bitindex = (index & 7) as u8;
        if dark {
            self.modules[byteindex] |= 1 << bitindex;
        } else {
            self.modules[byteindex] &= !(1 << bitindex);
        }
    }
}

impl ModuleMatrix for BitMatrix {
    fn module_count(&self) -> usize {
        self.size
    }

    fn is_dark(&self, row: usize, col: usize) -> bool {
        if row >= self.size || col >= self.size {
            return false;
        }
        let index = row * self.size + col;
        get_bit(self.modules[index >> 3].into(), (index & 7) as u8)
    }
}

fn get_bit(x: u32, i: u8) -> bool {
    ((x >> i) & 1) != 0
}

/// Error correction level the symbol was encoded with.
///
/// The level decides how much of the symbol a logo may cover: the renderer keeps the covered
/// share below the level's recovery tolerance.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
pub enum ErrorCorrectionLevel {
    /// Tolerates ~7% erroneous codewords.
    #[serde(rename = "L")]
    Low,
    /// Tolerates ~15% erroneous codewords.
    #[serde(rename = "M")]
    Medium,
    /// Tolerates ~25% erroneous codewords.
    #[default]
    #[serde(rename = "Q")]
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    #[serde(rename = "H")]
    High,
}

impl ErrorCorrectionLevel {
    /// Fraction of the symbol that may be damaged while it still decodes.
    pub fn tolerance(self) -> f64 {
        use ErrorCorrectionLevel::*;
        match self {
            Low => 0.07,
            Medium => 0.15,
            Quartile => 0.25,
            High => 0.30,
        }
    }
}

#[cfg(feature = "encode")]
mod qrcode_adapter {
    use super::{ErrorCorrectionLevel, ModuleMatrix};

    impl ModuleMatrix for qrcode::QrCode {
        fn module_count(&self) -> usize {
            self.width()
        }

        fn is_dark(&self, row: usize, col: usize) -> bool {
            self[(col, row)] == qrcode::Color::Dark
        }
    }

    impl From<qrcode::EcLevel> for ErrorCorrectionLevel {
        fn from(level: qrcode::EcLevel) -> Self {
            match level {
                qrcode::EcLevel::L => ErrorCorrectionLevel::Low,
                qrcode::EcLevel::M => ErrorCorrectionLevel::Medium,
                qrcode::EcLevel::Q => ErrorCorrectionLevel::Quartile,
                qrcode::EcLevel::H => ErrorCorrectionLevel::High,
            }
        }
    }
}
