//! Backend-agnostic draw instructions.
//!
//! The paint phase never talks to a backend while it is deciding what to draw. It first
//! turns matrix, configuration and layout into a [`RenderPlan`]: a flat list of [`DrawOp`]s
//! with every shape, fill and image rectangle already resolved. Replaying the same plan on
//! either backend issues the same calls in the same order.

use std::f64::consts::FRAC_PI_2;

use crate::backend::{ImagePlacement, RenderBackend};
use crate::color::{resolve_fill, FillDescriptor, ResolvedColor};
use crate::config::{FillSpec, StyleConfig};
use crate::error::{QrStyleError, Result};
use crate::image_loader::LoadedImage;
use crate::layout::{DrawRegion, Layout};
use crate::mask::{MaskPolicy, ModuleDecision, DOT_STENCIL, SQUARE_STENCIL};
use crate::matrix::ModuleMatrix;
use crate::overlay::{background_rect, logo_rect, ImageFit, ImageRect, ImageSize};
use crate::shapes::{DotType, Figure, FigureBuilder, Neighborhood, Shape};

pub const BACKGROUND_REGION: &str = "background-color";
pub const DOTS_REGION: &str = "dot-color";
pub const MASK_DOTS_REGION: &str = "mask-dot-color";

/// Finder corners as `(column, row, rotation)`: top-left, top-right, bottom-left.
/// Drawing order and rotations are fixed so both backends agree.
pub const CORNERS: [(u32, u32, f64); 3] = [(0, 0, 0.0), (1, 0, FRAC_PI_2), (0, 1, -FRAC_PI_2)];

/// Which prepared image a [`DrawOp::PlaceImage`] refers to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ImageSlot {
    Logo,
    MaskImage,
}

#[derive(Clone, PartialEq, Debug)]
pub enum DrawOp {
    Clear { width: u32, height: u32 },
    BeginRegion { name: String },
    Shape(Figure),
    EndRegion,
    FillRegion {
        name: String,
        region: DrawRegion,
        fill: FillDescriptor,
    },
    PlaceImage {
        slot: ImageSlot,
        rect: ImageRect,
        fit: ImageFit,
        embed: bool,
    },
}

/// Images a plan may place, already loaded.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlanImages<'a> {
    pub logo: Option<&'a LoadedImage>,
    pub mask_image: Option<&'a LoadedImage>,
}

/// Inputs of one plan, all resolved by the prepare phase.
pub struct PlanInputs<'a, M: ModuleMatrix + ?Sized> {
    pub matrix: &'a M,
    pub config: &'a StyleConfig,
    pub layout: Layout,
    /// Logo footprint; `None` when there is no logo to place.
    pub logo: Option<ImageSize>,
    pub has_mask_image: bool,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct RenderPlan {
    pub ops: Vec<DrawOp>,
}

impl RenderPlan {
    /// Shapes of the named region, in drawing order.
    pub fn region_shapes(&self, name: &str) -> Vec<&Figure> {
        let mut inside = false;
        let mut shapes = Vec::new();
        for op in &self.ops {
            match op {
                DrawOp::BeginRegion { name: open } => inside = open == name,
                DrawOp::EndRegion => inside = false,
                DrawOp::Shape(figure) if inside => shapes.push(figure),
                _ => {}
            }
        }
        shapes
    }

    /// Issues every op against `backend`.
    pub fn replay<B: RenderBackend + ?Sized>(&self, backend: &mut B, images: PlanImages<'_>) -> Result<()> {
        for op in &self.ops {
            match op {
                DrawOp::Clear { width, height } => backend.clear(*width, *height)?,
                DrawOp::BeginRegion { name } => backend.begin_styled_region(name)?,
                DrawOp::Shape(figure) => backend.draw_shape(figure)?,
                DrawOp::EndRegion => backend.end_styled_region()?,
                DrawOp::FillRegion { name, region, fill } => backend.fill_region(name, *region, fill)?,
                DrawOp::PlaceImage { slot, rect, fit, embed } => {
                    let image = match slot {
                        ImageSlot::Logo => images.logo,
                        ImageSlot::MaskImage => images.mask_image,
                    }
                    .ok_or_else(|| {
                        QrStyleError::RenderTarget(format!("plan places a {:?} that was not loaded", slot))
                    })?;
                    backend.place_image(&ImagePlacement {
                        image,
                        rect: *rect,
                        fit: *fit,
                        embed: *embed,
                    })?;
                }
            }
        }
        Ok(())
    }

    fn region(&mut self, name: String, shapes: Vec<Figure>, region: DrawRegion, fill: FillDescriptor) {
        log::trace!("region {}: {} shapes", name, shapes.len());
        self.ops.push(DrawOp::BeginRegion { name: name.clone() });
        self.ops.extend(shapes.into_iter().map(DrawOp::Shape));
        self.ops.push(DrawOp::EndRegion);
        self.ops.push(DrawOp::FillRegion { name, region, fill });
    }
}

/// Shapes of one finder corner, sorted by the region that paints them.
struct CornerPieces {
    column: u32,
    row: u32,
    rotation: f64,
    x: f32,
    y: f32,
    square: Vec<Figure>,
    dot: Vec<Figure>,
}

/// Body dots drawn over one stencil of a corner, merging only with their stencil neighbours.
fn stencil_dots(kind: DotType, stencil: &[[u8; 7]; 7], x: f32, y: f32, dot_size: f32) -> Vec<Figure> {
    let inside = |row: i32, col: i32| {
        (0..7).contains(&row) && (0..7).contains(&col) && stencil[row as usize][col as usize] == 1
    };
    let mut shapes = Vec::new();
    for row in 0..7i32 {
        for col in 0..7i32 {
            if !inside(row, col) {
                continue;
            }
            let lookup = |ro: i32, co: i32| inside(row + ro, col + co);
            shapes.push(kind.figure(
                x + col as f32 * dot_size,
                y + row as f32 * dot_size,
                dot_size,
                0.0,
                &Neighborhood::new(&lookup),
            ));
        }
    }
    shapes
}

/// Builds the draw plan for one render.
///
/// Order: background, mask image, body dots (with every unstyled corner piece), decorative
/// dots, styled corners in [`CORNERS`] order, logo.
pub fn build_plan<M: ModuleMatrix + ?Sized>(inputs: &PlanInputs<'_, M>) -> Result<RenderPlan> {
    let PlanInputs { matrix, config, layout, .. } = *inputs;
    let count = layout.count;
    let dot_size = layout.dot_size as f32;
    let dots = &config.dots_options;
    let mask = &config.mask_options;
    let mut plan = RenderPlan::default();

    plan.ops.push(DrawOp::Clear {
        width: config.width,
        height: config.height,
    });

    let background = config.background_options.fill();
    if background.is_styled() {
        let canvas = DrawRegion::new(0.0, 0.0, config.width as f32, config.height as f32);
        let outline = FigureBuilder::new()
            .rect(0.0, 0.0, canvas.width, canvas.height)
            .finish(0.0, 0.0, 0.0);
        plan.region(
            BACKGROUND_REGION.to_string(),
            vec![outline],
            canvas,
            resolve_fill(canvas, background, 0.0)?,
        );
    }

    if inputs.has_mask_image {
        plan.ops.push(DrawOp::PlaceImage {
            slot: ImageSlot::MaskImage,
            rect: background_rect(&layout, mask.image_size()),
            fit: ImageFit::Cover,
            embed: false,
        });
    }

    let hidden = inputs
        .logo
        .filter(|_| config.image_options.hide_background_dots)
        .map(|size| size.hidden_area());
    let policy = MaskPolicy::new(matrix, hidden, mask.draw_mask, mask.corners_mask());

    let mut body = Vec::new();
    let mut decorative = Vec::new();
    for row in 0..count {
        for col in 0..count {
            let (x, y) = layout.module_origin(row, col);
            match policy.decide(row, col) {
                ModuleDecision::Dark => {
                    let lookup = |ro: i32, co: i32| policy.is_drawn_neighbor(row, col, ro, co);
                    body.push(dots.kind.figure(x, y, dot_size, 0.0, &Neighborhood::new(&lookup)));
                }
                ModuleDecision::Decorative => {
                    decorative.push(dots.kind.figure(x, y, dot_size, 0.0, &Neighborhood::none()));
                }
                ModuleDecision::Suppressed | ModuleDecision::Finder | ModuleDecision::Light => {}
            }
        }
    }

    let square_options = config.corners_square_options.as_ref();
    let dot_options = config.corners_dot_options.as_ref();
    let square_fill = square_options.map_or(FillSpec::new(None, None), |o| o.fill());
    let dot_fill = dot_options.map_or(FillSpec::new(None, None), |o| o.fill());

    let far = count.saturating_sub(7);
    let mut corners: Vec<CornerPieces> = CORNERS
        .iter()
        .map(|&(column, row, rotation)| {
            let (x, y) = layout.module_origin(row * far, column * far);
            let square = match square_options.and_then(|o| o.kind) {
                Some(kind) => vec![kind.figure(x, y, dot_size * 7.0, rotation, &Neighborhood::none())],
                None => stencil_dots(dots.kind, &SQUARE_STENCIL, x, y, dot_size),
            };
            let dot = match dot_options.and_then(|o| o.kind) {
                Some(kind) => vec![kind.figure(
                    x + dot_size * 2.0,
                    y + dot_size * 2.0,
                    dot_size * 3.0,
                    rotation,
                    &Neighborhood::none(),
                )],
                None => stencil_dots(dots.kind, &DOT_STENCIL, x, y, dot_size),
            };
            CornerPieces { column, row, rotation, x, y, square, dot }
        })
        .collect();

    // Unstyled corner pieces fall back to the nearest styled region: a corner dot to its
    // square, anything else to the body dots.
    for corner in &mut corners {
        if !square_fill.is_styled() {
            body.append(&mut corner.square);
            if !dot_fill.is_styled() {
                body.append(&mut corner.dot);
            }
        } else if !dot_fill.is_styled() {
            let mut dot = std::mem::take(&mut corner.dot);
            corner.square.append(&mut dot);
        }
    }

    let grid = layout.grid_region();
    plan.region(DOTS_REGION.to_string(), body, grid, resolve_fill(grid, dots.fill(), 0.0)?);

    if !decorative.is_empty() {
        let color = ResolvedColor::parse(mask.dot_color())?;
        plan.region(
            MASK_DOTS_REGION.to_string(),
            decorative,
            grid,
            FillDescriptor::Solid(color),
        );
    }

    for corner in corners {
        if square_fill.is_styled() {
            let region = DrawRegion::square(corner.x, corner.y, dot_size * 7.0);
            plan.region(
                format!("corners-square-color-{}-{}", corner.column, corner.row),
                corner.square,
                region,
                resolve_fill(region, square_fill, corner.rotation)?,
            );
        }
        if dot_fill.is_styled() {
            let region = DrawRegion::square(corner.x + dot_size * 2.0, corner.y + dot_size * 2.0, dot_size * 3.0);
            plan.region(
                format!("corners-dot-color-{}-{}", corner.column, corner.row),
                corner.dot,
                region,
                resolve_fill(region, dot_fill, corner.rotation)?,
            );
        }
    }

    if let Some(size) = inputs.logo {
        plan.ops.push(DrawOp::PlaceImage {
            slot: ImageSlot::Logo,
            rect: logo_rect(&layout, &size, config.image_options.margin),
            fit: ImageFit::Fill,
            embed: config.image_options.save_as_blob,
        });
    }

    log::debug!("plan: {} ops for {} modules", plan.ops.len(), count);
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColorStop, CornersDotOptions, CornersSquareOptions, Gradient, GradientType};
    use crate::layout::compute_layout;
    use crate::mask::in_finder_stencil;
    use crate::matrix::BitMatrix;
    use crate::shapes::{CornerDotType, CornerSquareType};
    use crate::testing::{finder_matrix, init_logging};

    fn plan_for(matrix: &BitMatrix, config: &StyleConfig, logo: Option<ImageSize>) -> RenderPlan {
        let count = matrix.module_count() as u32;
        let layout = compute_layout(config.width, config.height, config.margin, count).unwrap();
        build_plan(&PlanInputs { matrix, config, layout, logo, has_mask_image: false }).unwrap()
    }

    fn region_names(plan: &RenderPlan) -> Vec<&str> {
        plan.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::BeginRegion { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    fn dark_body_modules(matrix: &BitMatrix) -> Vec<(u32, u32)> {
        let count = matrix.module_count() as u32;
        let mut cells = Vec::new();
        for row in 0..count {
            for col in 0..count {
                if matrix.is_dark(row as usize, col as usize) && !in_finder_stencil(count, row, col) {
                    cells.push((row, col));
                }
            }
        }
        cells
    }

    fn styled_corners() -> StyleConfig {
        StyleConfig {
            width: 210,
            height: 210,
            corners_square_options: Some(CornersSquareOptions {
                kind: Some(CornerSquareType::Square),
                color: Some("#f00".into()),
                gradient: None,
            }),
            corners_dot_options: Some(CornersDotOptions {
                kind: Some(CornerDotType::Square),
                color: Some("#00f".into()),
                gradient: None,
            }),
            ..StyleConfig::default()
        }
    }

    #[test]
    fn test_version_one_scenario() {
        init_logging();
        let matrix = finder_matrix(21);
        let plan = plan_for(&matrix, &styled_corners(), None);

        assert_eq!(
            region_names(&plan),
            vec![
                "background-color",
                "dot-color",
                "corners-square-color-0-0",
                "corners-dot-color-0-0",
                "corners-square-color-1-0",
                "corners-dot-color-1-0",
                "corners-square-color-0-1",
                "corners-dot-color-0-1",
            ]
        );

        // One square per dark body module, at (col * 10, row * 10).
        let body = plan.region_shapes("dot-color");
        let expected = dark_body_modules(&matrix);
        assert_eq!(body.len(), expected.len());
        for (figure, (row, col)) in body.iter().zip(expected) {
            let x = (col * 10) as f32;
            let y = (row * 10) as f32;
            assert_eq!(figure.bounds(), Some((x, y, x + 10.0, y + 10.0)));
        }

        // Corners come from the corner path at the three finder anchors.
        let anchors: Vec<_> = ["corners-square-color-0-0", "corners-square-color-1-0", "corners-square-color-0-1"]
            .iter()
            .map(|name| {
                let shapes = plan.region_shapes(name);
                assert_eq!(shapes.len(), 1);
                let (x0, y0, x1, _y1) = shapes[0].bounds().unwrap();
                ((x0.round(), y0.round()), (x1 - x0).round())
            })
            .collect();
        assert_eq!(
            anchors,
            vec![((0.0, 0.0), 70.0), ((140.0, 0.0), 70.0), ((0.0, 140.0), 70.0)]
        );
    }

    #[test]
    fn test_unstyled_corners_join_body_region() {
        let matrix = finder_matrix(21);
        let config = StyleConfig { width: 210, height: 210, ..StyleConfig::default() };
        let plan = plan_for(&matrix, &config, None);
        assert_eq!(region_names(&plan), vec!["background-color", "dot-color"]);
        // 24 ring modules and 9 centre modules per corner.
        let body = plan.region_shapes("dot-color");
        assert_eq!(body.len(), dark_body_modules(&matrix).len() + 3 * 33);
    }

    #[test]
    fn test_unstyled_corner_dot_inherits_square_region() {
        let matrix = finder_matrix(25);
        let mut config = styled_corners();
        config.corners_dot_options = Some(CornersDotOptions {
            kind: Some(CornerDotType::Dot),
            color: None,
            gradient: None,
        });
        let plan = plan_for(&matrix, &config, None);
        assert!(!region_names(&plan).iter().any(|name| name.starts_with("corners-dot-color")));
        assert_eq!(plan.region_shapes("corners-square-color-1-0").len(), 2);
    }

    #[test]
    fn test_corner_fill_turns_with_corner() {
        let matrix = finder_matrix(21);
        let mut config = styled_corners();
        config.corners_square_options = Some(CornersSquareOptions {
            kind: Some(CornerSquareType::ExtraRounded),
            color: None,
            gradient: Some(Gradient {
                kind: GradientType::Linear,
                rotation: Some(0.0),
                color_stops: vec![
                    ColorStop { offset: 0.0, color: "#000".into() },
                    ColorStop { offset: 1.0, color: "#fff".into() },
                ],
            }),
        });
        let plan = plan_for(&matrix, &config, None);
        let axes: Vec<_> = plan
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillRegion { name, fill: FillDescriptor::Linear { x0, y0, x1, y1, .. }, .. }
                    if name.starts_with("corners-square") =>
                {
                    Some((x0.round(), y0.round(), x1.round(), y1.round()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            axes,
            vec![
                (0.0, 35.0, 70.0, 35.0),
                (175.0, 0.0, 175.0, 70.0),
                (35.0, 210.0, 35.0, 140.0),
            ]
        );
    }

    #[test]
    fn test_logo_suppresses_modules_and_is_drawn_last() {
        let matrix = finder_matrix(21);
        let config = StyleConfig { width: 210, height: 210, ..StyleConfig::default() };
        let logo = ImageSize { width: 50, height: 50, hide_x_dots: 5, hide_y_dots: 5 };
        let plan = plan_for(&matrix, &config, Some(logo));

        for figure in plan.region_shapes("dot-color") {
            let (x0, y0, _, _) = figure.bounds().unwrap();
            let inside = (80.0..130.0).contains(&x0) && (80.0..130.0).contains(&y0);
            assert!(!inside, "module at {} {} should be hidden", x0, y0);
        }
        match plan.ops.last() {
            Some(DrawOp::PlaceImage { slot: ImageSlot::Logo, rect, fit: ImageFit::Fill, embed: false }) => {
                assert_eq!(*rect, ImageRect { x: 80.0, y: 80.0, width: 50.0, height: 50.0 });
            }
            other => panic!("expected the logo last, got {:?}", other),
        }

        // Without hideBackgroundDots the logo is placed over every module.
        let mut config = config;
        config.image_options.hide_background_dots = false;
        let covered = plan_for(&matrix, &config, Some(logo));
        assert_eq!(
            covered.region_shapes("dot-color").len(),
            plan_for(&matrix, &config, None).region_shapes("dot-color").len()
        );
    }

    #[test]
    fn test_decorative_dots_use_mask_color() {
        let matrix = finder_matrix(21);
        let mut config = StyleConfig { width: 210, height: 210, ..StyleConfig::default() };
        config.mask_options.draw_mask = true;
        config.mask_options.color = Some("#eee".into());
        config.mask_options.corners_mask = Some(false);
        let plan = plan_for(&matrix, &config, None);
        let fill = plan.ops.iter().find_map(|op| match op {
            DrawOp::FillRegion { name, fill, .. } if name == MASK_DOTS_REGION => Some(fill.clone()),
            _ => None,
        });
        assert_eq!(fill, Some(FillDescriptor::Solid(ResolvedColor::parse("#eee").unwrap())));
        for figure in plan.region_shapes(MASK_DOTS_REGION) {
            let (x0, y0, _, _) = figure.bounds().unwrap();
            let (col, row) = ((x0 / 10.0) as u32, (y0 / 10.0) as u32);
            assert!(!crate::mask::in_corner_region(21, row, col));
        }
    }

    #[test]
    fn test_mask_image_follows_background() {
        let matrix = finder_matrix(21);
        let config = StyleConfig { width: 210, height: 210, ..StyleConfig::default() };
        let layout = compute_layout(210, 210, 0, 21).unwrap();
        let plan = build_plan(&PlanInputs {
            matrix: &matrix,
            config: &config,
            layout,
            logo: None,
            has_mask_image: true,
        })
        .unwrap();
        assert!(matches!(plan.ops[4], DrawOp::FillRegion { .. }));
        assert!(matches!(
            plan.ops[5],
            DrawOp::PlaceImage { slot: ImageSlot::MaskImage, fit: ImageFit::Cover, .. }
        ));
    }

    #[test]
    fn test_transparent_background_is_skipped() {
        let matrix = finder_matrix(21);
        let mut config = StyleConfig { width: 210, height: 210, ..StyleConfig::default() };
        config.background_options.color = None;
        let plan = plan_for(&matrix, &config, None);
        assert_eq!(region_names(&plan), vec!["dot-color"]);
    }

    #[test]
    fn test_replay_requires_loaded_images() {
        let matrix = finder_matrix(21);
        let config = StyleConfig { width: 210, height: 210, ..StyleConfig::default() };
        let logo = ImageSize { width: 30, height: 30, hide_x_dots: 3, hide_y_dots: 3 };
        let plan = plan_for(&matrix, &config, Some(logo));
        let mut backend = crate::backend::VectorBackend::new(210, 210);
        let err = plan.replay(&mut backend, PlanImages::default()).unwrap_err();
        assert!(matches!(err, QrStyleError::RenderTarget(_)));
    }
}
