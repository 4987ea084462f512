use std::collections::HashMap;

use tiny_skia::{
    FillRule as SkiaFillRule, FilterQuality, GradientStop, LinearGradient, Mask, Paint, PathBuilder,
    Pixmap, PixmapPaint, Point, RadialGradient, Rect, Shader, SpreadMode, Transform,
};

use super::{encode_image, image_to_pixmap, pixmap_to_image, ImagePlacement, OutputFormat, RenderBackend};
use crate::color::{FillDescriptor, ResolvedColor, ResolvedStop};
use crate::error::{QrStyleError, Result};
use crate::layout::DrawRegion;
use crate::overlay::{cover_crop, ImageFit};
use crate::shapes::{Figure, FillRule, Segment};

/// Immediate-mode target backed by a `tiny_skia` pixmap.
///
/// A styled region is an alpha mask: shapes are rasterized into it as they arrive, and the
/// fill is painted through it once the region is filled. Later paint covers earlier paint.
pub struct RasterBackend {
    pixmap: Pixmap,
    open: Option<(String, Mask)>,
    closed: HashMap<String, Mask>,
}

impl RasterBackend {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            pixmap: allocate(width, height)?,
            open: None,
            closed: HashMap::new(),
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Copies the canvas out as a straight-alpha image.
    pub fn to_image(&self) -> Result<image::RgbaImage> {
        pixmap_to_image(&self.pixmap)
    }
}

fn allocate(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width, height).ok_or_else(|| {
        QrStyleError::RenderTarget(format!("cannot allocate a {}x{} canvas", width, height))
    })
}

impl RenderBackend for RasterBackend {
    fn clear(&mut self, width: u32, height: u32) -> Result<()> {
        if self.pixmap.width() == width && self.pixmap.height() == height {
            self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
        } else {
            self.pixmap = allocate(width, height)?;
        }
        self.open = None;
        self.closed.clear();
        Ok(())
    }

    fn begin_styled_region(&mut self, name: &str) -> Result<()> {
        if let Some((open, _)) = &self.open {
            return Err(QrStyleError::RenderTarget(format!(
                "region {:?} opened while {:?} is still open",
                name, open
            )));
        }
        let mask = Mask::new(self.pixmap.width(), self.pixmap.height())
            .ok_or_else(|| QrStyleError::RenderTarget("cannot allocate a clip mask".to_string()))?;
        self.open = Some((name.to_string(), mask));
        Ok(())
    }

    fn draw_shape(&mut self, figure: &Figure) -> Result<()> {
        let Some((_, mask)) = self.open.as_mut() else {
            return Err(QrStyleError::RenderTarget(
                "shape drawn outside a styled region".to_string(),
            ));
        };
        // Degenerate outlines cover nothing.
        if let Some(path) = to_path(figure) {
            let rule = match figure.fill_rule {
                FillRule::NonZero => SkiaFillRule::Winding,
                FillRule::EvenOdd => SkiaFillRule::EvenOdd,
            };
            mask.fill_path(&path, rule, true, Transform::identity());
        }
        Ok(())
    }

    fn end_styled_region(&mut self) -> Result<()> {
        let (name, mask) = self
            .open
            .take()
            .ok_or_else(|| QrStyleError::RenderTarget("no styled region is open".to_string()))?;
        self.closed.insert(name, mask);
        Ok(())
    }

    fn fill_region(&mut self, name: &str, region: DrawRegion, fill: &FillDescriptor) -> Result<()> {
        let mask = self.closed.remove(name).ok_or_else(|| {
            QrStyleError::RenderTarget(format!("region {:?} was never drawn", name))
        })?;
        let Some(shader) = shader_for(fill) else {
            return Ok(());
        };
        let Some(rect) = Rect::from_xywh(region.x, region.y, region.width, region.height) else {
            return Ok(());
        };
        let paint = Paint {
            shader,
            anti_alias: true,
            ..Paint::default()
        };
        self.pixmap.fill_rect(rect, &paint, Transform::identity(), Some(&mask));
        Ok(())
    }

    fn place_image(&mut self, placement: &ImagePlacement<'_>) -> Result<()> {
        let rect = placement.rect;
        let image = placement.image;
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Ok(());
        }
        let source = image_to_pixmap(image.pixels())?;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };

        match placement.fit {
            ImageFit::Fill => {
                let sx = rect.width / image.width() as f32;
                let sy = rect.height / image.height() as f32;
                let transform = Transform::from_row(sx, 0.0, 0.0, sy, rect.x, rect.y);
                self.pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
            }
            ImageFit::Cover => {
                let (cx, cy, cw, _) = cover_crop(image.width(), image.height(), &rect);
                let scale = rect.width / cw;
                let transform =
                    Transform::from_row(scale, 0.0, 0.0, scale, rect.x - cx * scale, rect.y - cy * scale);
                let clip = rect_mask(self.pixmap.width(), self.pixmap.height(), &rect)?;
                self.pixmap
                    .draw_pixmap(0, 0, source.as_ref(), &paint, transform, clip.as_ref());
            }
        }
        Ok(())
    }

    fn encode(&self, format: OutputFormat) -> Result<Vec<u8>> {
        encode_image(&self.to_image()?, format)
    }
}

fn to_path(figure: &Figure) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for segment in &figure.segments {
        match *segment {
            Segment::MoveTo(p) => pb.move_to(p.x, p.y),
            Segment::LineTo(p) => pb.line_to(p.x, p.y),
            Segment::CubicTo(a, b, c) => pb.cubic_to(a.x, a.y, b.x, b.y, c.x, c.y),
            Segment::Close => pb.close(),
        }
    }
    pb.finish()
}

fn skia_color(color: &ResolvedColor) -> tiny_skia::Color {
    let c = color.rgba;
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn skia_stops(stops: &[ResolvedStop]) -> Vec<GradientStop> {
    stops
        .iter()
        .map(|stop| GradientStop::new(stop.offset, skia_color(&stop.color)))
        .collect()
}

/// `None` for a transparent fill.
fn shader_for(fill: &FillDescriptor) -> Option<Shader<'static>> {
    // tiny-skia refuses zero-length axes; those paint the last stop like a browser does.
    let last_stop = |stops: &[ResolvedStop]| {
        stops
            .last()
            .map(|stop| Shader::SolidColor(skia_color(&stop.color)))
    };
    match fill {
        FillDescriptor::Transparent => None,
        FillDescriptor::Solid(color) => Some(Shader::SolidColor(skia_color(color))),
        FillDescriptor::Linear { x0, y0, x1, y1, stops } => LinearGradient::new(
            Point::from_xy(*x0, *y0),
            Point::from_xy(*x1, *y1),
            skia_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        )
        .or_else(|| last_stop(stops)),
        FillDescriptor::Radial { cx, cy, radius, stops } => RadialGradient::new(
            Point::from_xy(*cx, *cy),
            Point::from_xy(*cx, *cy),
            *radius,
            skia_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        )
        .or_else(|| last_stop(stops)),
    }
}

fn rect_mask(width: u32, height: u32, rect: &crate::overlay::ImageRect) -> Result<Option<Mask>> {
    let Some(skia_rect) = Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) else {
        return Ok(None);
    };
    let mut mask = Mask::new(width, height)
        .ok_or_else(|| QrStyleError::RenderTarget("cannot allocate a clip mask".to_string()))?;
    mask.fill_path(
        &PathBuilder::from_rect(skia_rect),
        SkiaFillRule::Winding,
        true,
        Transform::identity(),
    );
    Ok(Some(mask))
}
