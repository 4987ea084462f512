use std::f32::consts::{FRAC_PI_2, PI};

/// A point in canvas pixels.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Segment {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
    Close,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    /// Needed by ring shapes drawn as an outer and an inner contour.
    EvenOdd,
}

/// One resolved shape outline in absolute canvas coordinates.
///
/// Rotation has already been applied, so backends only translate segments into their own
/// path type.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Figure {
    pub segments: Vec<Segment>,
    pub fill_rule: FillRule,
}

impl Figure {
    /// Bounding box of every point, control points included, as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        let mut points = self.segments.iter().flat_map(|segment| match *segment {
            Segment::MoveTo(p) | Segment::LineTo(p) => vec![p],
            Segment::CubicTo(a, b, c) => vec![a, b, c],
            Segment::Close => vec![],
        });
        let first = points.next()?;
        Some(points.fold((first.x, first.y, first.x, first.y), |(x0, y0, x1, y1), p| {
            (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y))
        }))
    }
}

/// Builds a [`Figure`] with primitives matching the way QR shapes are described: straight
/// edges, circular arcs and rectangles.
#[derive(Default)]
pub struct FigureBuilder {
    segments: Vec<Segment>,
    fill_rule: FillRule,
}

impl FigureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn even_odd(mut self) -> Self {
        self.fill_rule = FillRule::EvenOdd;
        self
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.segments.push(Segment::MoveTo(Point::new(x, y)));
        self
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.segments.push(Segment::LineTo(Point::new(x, y)));
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.segments.push(Segment::Close);
        self
    }

    /// Appends a circular arc around `(cx, cy)` from angle `start` to `end`.
    ///
    /// Angles are in radians with y pointing down, so increasing angles turn clockwise on
    /// screen. The current point is expected to already sit on the arc's start.
    pub fn arc(&mut self, cx: f32, cy: f32, r: f32, start: f32, end: f32) -> &mut Self {
        let sweep = end - start;
        let pieces = (sweep.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
        let step = sweep / pieces as f32;
        let k = 4.0 / 3.0 * (step / 4.0).tan();
        let mut a0 = start;
        for _ in 0..pieces {
            let a1 = a0 + step;
            let (s0, c0) = a0.sin_cos();
            let (s1, c1) = a1.sin_cos();
            let p0 = Point::new(cx + r * c0, cy + r * s0);
            let p3 = Point::new(cx + r * c1, cy + r * s1);
            let ctrl1 = Point::new(p0.x - k * r * s0, p0.y + k * r * c0);
            let ctrl2 = Point::new(p3.x + k * r * s1, p3.y - k * r * c1);
            self.segments.push(Segment::CubicTo(ctrl1, ctrl2, p3));
            a0 = a1;
        }
        self
    }

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) -> &mut Self {
        self.move_to(x, y)
            .line_to(x + w, y)
            .line_to(x + w, y + h)
            .line_to(x, y + h)
            .close()
    }

    pub fn circle(&mut self, cx: f32, cy: f32, r: f32) -> &mut Self {
        self.move_to(cx + r, cy).arc(cx, cy, r, 0.0, 2.0 * PI).close()
    }

    /// Rectangle with corner radii `[top_left, top_right, bottom_right, bottom_left]`.
    /// A zero radius gives a sharp corner.
    pub fn rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radii: [f32; 4]) -> &mut Self {
        let [tl, tr, br, bl] = radii;
        self.move_to(x + tl, y).line_to(x + w - tr, y);
        if tr > 0.0 {
            self.arc(x + w - tr, y + tr, tr, -FRAC_PI_2, 0.0);
        }
        self.line_to(x + w, y + h - br);
        if br > 0.0 {
            self.arc(x + w - br, y + h - br, br, 0.0, FRAC_PI_2);
        }
        self.line_to(x + bl, y + h);
        if bl > 0.0 {
            self.arc(x + bl, y + h - bl, bl, FRAC_PI_2, PI);
        }
        self.line_to(x, y + tl);
        if tl > 0.0 {
            self.arc(x + tl, y + tl, tl, PI, PI + FRAC_PI_2);
        }
        self.close()
    }

    pub fn rhombus(&mut self, x: f32, y: f32, w: f32, h: f32) -> &mut Self {
        self.move_to(x + w / 2.0, y)
            .line_to(x + w, y + h / 2.0)
            .line_to(x + w / 2.0, y + h)
            .line_to(x, y + h / 2.0)
            .close()
    }

    /// Finishes the figure, turning it by `rotation` radians (clockwise on screen) about
    /// `(cx, cy)`.
    pub fn finish(&mut self, rotation: f64, cx: f32, cy: f32) -> Figure {
        let segments = std::mem::take(&mut self.segments);
        let segments = if rotation == 0.0 {
            segments
        } else {
            let (sin, cos) = rotation.sin_cos();
            let turn = |p: Point| {
                let dx = f64::from(p.x - cx);
                let dy = f64::from(p.y - cy);
                Point::new(
                    cx + (dx * cos - dy * sin) as f32,
                    cy + (dx * sin + dy * cos) as f32,
                )
            };
            segments
                .into_iter()
                .map(|segment| match segment {
                    Segment::MoveTo(p) => Segment::MoveTo(turn(p)),
                    Segment::LineTo(p) => Segment::LineTo(turn(p)),
                    Segment::CubicTo(a, b, c) => Segment::CubicTo(turn(a), turn(b), turn(c)),
                    Segment::Close => Segment::Close,
                })
                .collect()
        };
        Figure {
            segments,
            fill_rule: self.fill_rule,
        }
    }
}
