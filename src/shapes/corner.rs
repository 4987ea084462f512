use serde::{Deserialize, Serialize};

use super::figure::{Figure, FigureBuilder};
use super::{Neighborhood, Shape};

/// Outer 7×7 ring of a finder pattern.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerSquareType {
    Square,
    Dot,
    ExtraRounded,
    /// Rounded on the outer corner and the corner facing the symbol centre.
    Classy,
}

shape_registry!(CornerSquareType, "corner square", [
    ("square", Square),
    ("dot", Dot),
    ("extra-rounded", ExtraRounded),
    ("classy", Classy),
]);

/// Inner 3×3 square of a finder pattern.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerDotType {
    Square,
    Dot,
    ExtraRounded,
    Rhombus,
}

shape_registry!(CornerDotType, "corner dot", [
    ("square", Square),
    ("dot", Dot),
    ("extra-rounded", ExtraRounded),
    ("rhombus", Rhombus),
]);

impl Shape for CornerSquareType {
    /// The ring is one module thick (`size / 7`) and drawn even-odd.
    fn figure(&self, x: f32, y: f32, size: f32, rotation: f64, _neighbors: &Neighborhood<'_>) -> Figure {
        let dot = size / 7.0;
        let inner = size - 2.0 * dot;
        let (cx, cy) = (x + size / 2.0, y + size / 2.0);
        let mut builder = FigureBuilder::new().even_odd();
        match self {
            CornerSquareType::Square => {
                builder.rect(x, y, size, size).rect(x + dot, y + dot, inner, inner);
            }
            CornerSquareType::Dot => {
                builder.circle(cx, cy, size / 2.0).circle(cx, cy, size / 2.0 - dot);
            }
            CornerSquareType::ExtraRounded => {
                builder
                    .rounded_rect(x, y, size, size, [2.5 * dot; 4])
                    .rounded_rect(x + dot, y + dot, inner, inner, [1.5 * dot; 4]);
            }
            CornerSquareType::Classy => {
                let (outer, hole) = (2.5 * dot, 1.5 * dot);
                builder
                    .rounded_rect(x, y, size, size, [outer, 0.0, outer, 0.0])
                    .rounded_rect(x + dot, y + dot, inner, inner, [hole, 0.0, hole, 0.0]);
            }
        }
        builder.finish(rotation, cx, cy)
    }
}

impl Shape for CornerDotType {
    fn figure(&self, x: f32, y: f32, size: f32, rotation: f64, _neighbors: &Neighborhood<'_>) -> Figure {
        let (cx, cy) = (x + size / 2.0, y + size / 2.0);
        let mut builder = FigureBuilder::new();
        match self {
            CornerDotType::Square => {
                builder.rect(x, y, size, size);
            }
            CornerDotType::Dot => {
                builder.circle(cx, cy, size / 2.0);
            }
            CornerDotType::ExtraRounded => {
                builder.rounded_rect(x, y, size, size, [size / 3.0; 4]);
            }
            CornerDotType::Rhombus => {
                builder.rhombus(x, y, size, size);
            }
        }
        builder.finish(rotation, cx, cy)
    }
}
