//! Shape variants for body modules and finder corners.
//!
//! Every variant turns a placement `(x, y, size, rotation)` into a [`Figure`]. Body dot
//! variants may also look at their immediate neighbours to decide which edges to round, which
//! is what lets adjacent modules merge visually.
//!
//! Variants are plain enums with a name table. Parsing an unknown name fails while the
//! configuration is read, never mid-render.

/// Generates `FromStr`, `name()` and the list of accepted names from one table.
macro_rules! shape_registry {
    ($ty:ident, $what:literal, [$(($name:literal, $variant:ident)),+ $(,)?]) => {
        impl $ty {
            /// Every accepted tag with its variant.
            pub const ALL: &'static [(&'static str, $ty)] = &[$(($name, $ty::$variant)),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = crate::error::QrStyleError;

            fn from_str(tag: &str) -> crate::error::Result<Self> {
                Self::ALL
                    .iter()
                    .find(|(name, _)| *name == tag)
                    .map(|(_, variant)| *variant)
                    .ok_or_else(|| {
                        crate::error::QrStyleError::Configuration(format!(
                            "unknown {} type {:?}",
                            $what, tag
                        ))
                    })
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

mod corner;
mod dot;
mod figure;

pub use corner::{CornerDotType, CornerSquareType};
pub use dot::DotType;
pub use figure::{Figure, FigureBuilder, FillRule, Point, Segment};

/// Answers "is the module at this offset dark (and drawn)?" for the module being drawn.
///
/// Offsets are `(row_offset, col_offset)`. Only the eight immediate neighbours are ever
/// reported; anything further away, and the module itself, reads as absent.
#[derive(Clone, Copy)]
pub struct Neighborhood<'a> {
    lookup: Option<&'a dyn Fn(i32, i32) -> bool>,
}

impl<'a> Neighborhood<'a> {
    /// A module with no neighbours, e.g. a decorative dot.
    pub fn none() -> Self {
        Self { lookup: None }
    }

    pub fn new(lookup: &'a dyn Fn(i32, i32) -> bool) -> Self {
        Self { lookup: Some(lookup) }
    }

    pub fn has(&self, row_offset: i32, col_offset: i32) -> bool {
        if row_offset.abs() > 1 || col_offset.abs() > 1 || (row_offset == 0 && col_offset == 0) {
            return false;
        }
        self.lookup.map_or(false, |lookup| lookup(row_offset, col_offset))
    }

    pub fn left(&self) -> bool {
        self.has(0, -1)
    }

    pub fn right(&self) -> bool {
        self.has(0, 1)
    }

    pub fn top(&self) -> bool {
        self.has(-1, 0)
    }

    pub fn bottom(&self) -> bool {
        self.has(1, 0)
    }
}

/// Draw interface shared by every shape family.
pub trait Shape {
    /// Outline of the shape in the `size` × `size` square at `(x, y)`, turned by `rotation`
    /// radians about its centre.
    fn figure(&self, x: f32, y: f32, size: f32, rotation: f64, neighbors: &Neighborhood<'_>) -> Figure;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighborhood_is_bounded() {
        let everything = |_: i32, _: i32| true;
        let n = Neighborhood::new(&everything);
        assert!(n.left() && n.right() && n.top() && n.bottom());
        assert!(n.has(-1, -1) && n.has(1, 1));
        assert!(!n.has(0, 0));
        assert!(!n.has(2, 0));
        assert!(!n.has(0, -2));
        assert!(!Neighborhood::none().left());
    }

    #[test]
    fn test_offsets_are_row_then_col() {
        let only_right = |row: i32, col: i32| row == 0 && col == 1;
        let n = Neighborhood::new(&only_right);
        assert!(n.right());
        assert!(!n.bottom());
    }
}
