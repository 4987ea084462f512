use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use super::figure::{Figure, FigureBuilder};
use super::{Neighborhood, Shape};

/// Body module shapes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DotType {
    #[default]
    Square,
    Dots,
    /// Merges with neighbours; isolated modules become circles.
    Rounded,
    /// Like `Rounded` with quarter-circle corners the size of the module.
    ExtraRounded,
    /// Leaf-like modules rounded away from their neighbours.
    Classy,
    ClassyRounded,
    SmallSquare,
    SmallDots,
    Rhombus,
}

shape_registry!(DotType, "dot", [
    ("square", Square),
    ("dots", Dots),
    ("rounded", Rounded),
    ("extra-rounded", ExtraRounded),
    ("classy", Classy),
    ("classy-rounded", ClassyRounded),
    ("small-square", SmallSquare),
    ("small-dots", SmallDots),
    ("rhombus", Rhombus),
]);

impl Shape for DotType {
    fn figure(&self, x: f32, y: f32, size: f32, rotation: f64, neighbors: &Neighborhood<'_>) -> Figure {
        let cell = Cell { x, y, size, rotation };
        match self {
            DotType::Square => cell.square(0.0),
            DotType::Dots => cell.dot(0.0),
            DotType::Rounded => rounded(cell, neighbors, Cell::corner_rounded),
            DotType::ExtraRounded => rounded(cell, neighbors, Cell::corner_extra_rounded),
            DotType::Classy => classy(cell, neighbors, Cell::corner_rounded),
            DotType::ClassyRounded => classy(cell, neighbors, Cell::corner_extra_rounded),
            DotType::SmallSquare => {
                let inset = size * 0.15;
                let mut builder = FigureBuilder::new();
                builder.rect(x + inset, y + inset, size - 2.0 * inset, size - 2.0 * inset);
                cell.finish(&mut builder, 0.0)
            }
            DotType::SmallDots => {
                let (cx, cy) = cell.center();
                let mut builder = FigureBuilder::new();
                builder.circle(cx, cy, size * 0.35);
                cell.finish(&mut builder, 0.0)
            }
            DotType::Rhombus => {
                let mut builder = FigureBuilder::new();
                builder.rhombus(x, y, size, size);
                cell.finish(&mut builder, 0.0)
            }
        }
    }
}

struct Neighbors {
    left: bool,
    right: bool,
    top: bool,
    bottom: bool,
}

impl Neighbors {
    fn of(neighbors: &Neighborhood<'_>) -> Self {
        Self {
            left: neighbors.left(),
            right: neighbors.right(),
            top: neighbors.top(),
            bottom: neighbors.bottom(),
        }
    }

    fn count(&self) -> u8 {
        [self.left, self.right, self.top, self.bottom]
            .iter()
            .filter(|&&present| present)
            .count() as u8
    }
}

/// Rounds every edge that has no dark neighbour.
fn rounded(cell: Cell, neighbors: &Neighborhood<'_>, corner: fn(&Cell, f64) -> Figure) -> Figure {
    let n = Neighbors::of(neighbors);
    match n.count() {
        0 => cell.dot(0.0),
        count if count > 2 || (n.left && n.right) || (n.top && n.bottom) => cell.square(0.0),
        2 => {
            let rotation = if n.left && n.top {
                FRAC_PI_2
            } else if n.top && n.right {
                PI
            } else if n.right && n.bottom {
                -FRAC_PI_2
            } else {
                0.0
            };
            corner(&cell, rotation)
        }
        _ => {
            let rotation = if n.top {
                FRAC_PI_2
            } else if n.right {
                PI
            } else if n.bottom {
                -FRAC_PI_2
            } else {
                0.0
            };
            cell.side_rounded(rotation)
        }
    }
}

/// Rounds the top-left or bottom-right corner when both adjoining edges are exposed.
fn classy(cell: Cell, neighbors: &Neighborhood<'_>, corner: fn(&Cell, f64) -> Figure) -> Figure {
    let n = Neighbors::of(neighbors);
    if n.count() == 0 {
        return cell.corners_rounded(FRAC_PI_2);
    }
    if !n.left && !n.top {
        return corner(&cell, -FRAC_PI_2);
    }
    if !n.right && !n.bottom {
        return corner(&cell, FRAC_PI_2);
    }
    cell.square(0.0)
}

/// Placement of one module. The basic outlines below are described at rotation 0 and turned
/// about the cell centre by `rotation + own rotation`.
#[derive(Clone, Copy)]
struct Cell {
    x: f32,
    y: f32,
    size: f32,
    rotation: f64,
}

impl Cell {
    fn center(&self) -> (f32, f32) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }

    fn finish(&self, builder: &mut FigureBuilder, own_rotation: f64) -> Figure {
        let (cx, cy) = self.center();
        builder.finish(self.rotation + own_rotation, cx, cy)
    }

    fn dot(&self, own_rotation: f64) -> Figure {
        let (cx, cy) = self.center();
        let mut builder = FigureBuilder::new();
        builder.circle(cx, cy, self.size / 2.0);
        self.finish(&mut builder, own_rotation)
    }

    fn square(&self, own_rotation: f64) -> Figure {
        let mut builder = FigureBuilder::new();
        builder.rect(self.x, self.y, self.size, self.size);
        self.finish(&mut builder, own_rotation)
    }

    /// Right side is a half circle.
    fn side_rounded(&self, own_rotation: f64) -> Figure {
        let Cell { x, y, size: s, .. } = *self;
        let (cx, cy) = self.center();
        let mut builder = FigureBuilder::new();
        builder
            .move_to(x, y)
            .line_to(x, y + s)
            .line_to(cx, y + s)
            .arc(cx, cy, s / 2.0, std::f32::consts::FRAC_PI_2, -std::f32::consts::FRAC_PI_2)
            .close();
        self.finish(&mut builder, own_rotation)
    }

    /// Top-right corner is a quarter circle of half the module.
    fn corner_rounded(&self, own_rotation: f64) -> Figure {
        let Cell { x, y, size: s, .. } = *self;
        let (cx, cy) = self.center();
        let mut builder = FigureBuilder::new();
        builder
            .move_to(x, y)
            .line_to(x, y + s)
            .line_to(x + s, y + s)
            .line_to(x + s, cy)
            .arc(cx, cy, s / 2.0, 0.0, -std::f32::consts::FRAC_PI_2)
            .close();
        self.finish(&mut builder, own_rotation)
    }

    /// Top-right corner is a quarter circle of the whole module.
    fn corner_extra_rounded(&self, own_rotation: f64) -> Figure {
        let Cell { x, y, size: s, .. } = *self;
        let mut builder = FigureBuilder::new();
        builder
            .move_to(x, y)
            .line_to(x, y + s)
            .line_to(x + s, y + s)
            .arc(x, y + s, s, 0.0, -std::f32::consts::FRAC_PI_2)
            .close();
        self.finish(&mut builder, own_rotation)
    }

    /// Bottom-left and top-right corners are quarter circles of half the module.
    fn corners_rounded(&self, own_rotation: f64) -> Figure {
        let Cell { x, y, size: s, .. } = *self;
        let (cx, cy) = self.center();
        let half = s / 2.0;
        let mut builder = FigureBuilder::new();
        builder
            .move_to(x, y)
            .line_to(x, cy)
            .arc(cx, cy, half, std::f32::consts::PI, std::f32::consts::FRAC_PI_2)
            .line_to(x + s, y + s)
            .line_to(x + s, cy)
            .arc(cx, cy, half, 0.0, -std::f32::consts::FRAC_PI_2)
            .close();
        self.finish(&mut builder, own_rotation)
    }
}
