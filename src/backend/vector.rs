use std::fmt::Write as _;

use super::{encode_image, pixmap_to_image, ImagePlacement, OutputFormat, RenderBackend};
use crate::color::{FillDescriptor, ResolvedStop};
use crate::error::{QrStyleError, Result};
use crate::layout::DrawRegion;
use crate::overlay::ImageFit;
use crate::shapes::{Figure, FillRule, Segment};

/// One node of the retained document.
#[derive(Clone, Debug, PartialEq)]
struct SvgElement {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<SvgElement>,
    /// Self-contained `href` used when rasterizing, for images linked by source.
    inline_href: Option<String>,
}

impl SvgElement {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
            inline_href: None,
        }
    }

    fn attr(mut self, name: &'static str, value: impl ToString) -> Self {
        self.attrs.push((name, value.to_string()));
        self
    }

    fn write(&self, out: &mut String, inline_images: bool) {
        out.push('<');
        out.push_str(self.tag);
        for (name, value) in &self.attrs {
            let value = match (&self.inline_href, *name) {
                (Some(inline), "xlink:href") if inline_images => inline.as_str(),
                _ => value.as_str(),
            };
            let _ = write!(out, " {}=\"{}\"", name, escape(value));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.write(out, inline_images);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Retained-mode target building an SVG document.
///
/// Each styled region becomes a `<clipPath id="clip-path-{name}">` in `<defs>`, and its fill a
/// `<rect>` clipped by it. Gradients are `userSpaceOnUse` definitions named after the region,
/// so the document carries the same absolute geometry the raster backend paints.
#[derive(Clone, Debug, Default)]
pub struct VectorBackend {
    width: u32,
    height: u32,
    defs: Vec<SvgElement>,
    body: Vec<SvgElement>,
    open: Option<(String, SvgElement)>,
}

impl VectorBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Serializes the document.
    pub fn to_svg_string(&self) -> String {
        self.serialize(false)
    }

    fn serialize(&self, inline_images: bool) -> String {
        let mut out = String::new();
        out += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
        let _ = write!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
             width=\"{0}\" height=\"{1}\" viewBox=\"0 0 {0} {1}\">",
            self.width, self.height
        );
        out += "<defs>";
        for def in &self.defs {
            def.write(&mut out, inline_images);
        }
        out += "</defs>";
        for element in &self.body {
            element.write(&mut out, inline_images);
        }
        out += "</svg>\n";
        out
    }

    /// Draws the document onto a fresh pixmap with `resvg`.
    pub fn rasterize(&self) -> Result<tiny_skia::Pixmap> {
        let markup = self.serialize(true);
        let tree = resvg::usvg::Tree::from_str(&markup, &resvg::usvg::Options::default())
            .map_err(|e| QrStyleError::RenderTarget(format!("generated SVG did not parse: {}", e)))?;
        let mut pixmap = tiny_skia::Pixmap::new(self.width, self.height).ok_or_else(|| {
            QrStyleError::RenderTarget(format!(
                "cannot allocate a {}x{} canvas",
                self.width, self.height
            ))
        })?;
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

fn path_data(figure: &Figure) -> String {
    let mut d = String::new();
    for segment in &figure.segments {
        let _ = match *segment {
            Segment::MoveTo(p) => write!(d, "M{} {}", p.x, p.y),
            Segment::LineTo(p) => write!(d, "L{} {}", p.x, p.y),
            Segment::CubicTo(a, b, c) => {
                write!(d, "C{} {} {} {} {} {}", a.x, a.y, b.x, b.y, c.x, c.y)
            }
            Segment::Close => write!(d, "Z"),
        };
    }
    d
}

fn stop_elements(gradient: SvgElement, stops: &[ResolvedStop]) -> SvgElement {
    stops.iter().fold(gradient, |mut gradient, stop| {
        gradient.children.push(
            SvgElement::new("stop")
                .attr("offset", format!("{}%", 100.0 * stop.offset))
                .attr("stop-color", &stop.color.css),
        );
        gradient
    })
}

impl RenderBackend for VectorBackend {
    fn clear(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width;
        self.height = height;
        self.defs.clear();
        self.body.clear();
        self.open = None;
        Ok(())
    }

    fn begin_styled_region(&mut self, name: &str) -> Result<()> {
        if let Some((open, _)) = &self.open {
            return Err(QrStyleError::RenderTarget(format!(
                "region {:?} opened while {:?} is still open",
                name, open
            )));
        }
        let clip = SvgElement::new("clipPath").attr("id", format!("clip-path-{}", name));
        self.open = Some((name.to_string(), clip));
        Ok(())
    }

    fn draw_shape(&mut self, figure: &Figure) -> Result<()> {
        let (_, clip) = self.open.as_mut().ok_or_else(|| {
            QrStyleError::RenderTarget("shape drawn outside a styled region".to_string())
        })?;
        let mut path = SvgElement::new("path").attr("d", path_data(figure));
        if figure.fill_rule == FillRule::EvenOdd {
            path = path.attr("clip-rule", "evenodd");
        }
        clip.children.push(path);
        Ok(())
    }

    fn end_styled_region(&mut self) -> Result<()> {
        let (_, clip) = self
            .open
            .take()
            .ok_or_else(|| QrStyleError::RenderTarget("no styled region is open".to_string()))?;
        self.defs.push(clip);
        Ok(())
    }

    fn fill_region(&mut self, name: &str, region: DrawRegion, fill: &FillDescriptor) -> Result<()> {
        let clip_id = format!("clip-path-{}", name);
        if !self
            .defs
            .iter()
            .any(|def| def.attrs.iter().any(|(k, v)| *k == "id" && *v == clip_id))
        {
            return Err(QrStyleError::RenderTarget(format!(
                "region {:?} was never drawn",
                name
            )));
        }

        let paint = match fill {
            FillDescriptor::Transparent => return Ok(()),
            FillDescriptor::Solid(color) => color.css.clone(),
            FillDescriptor::Linear { x0, y0, x1, y1, stops } => {
                let gradient = SvgElement::new("linearGradient")
                    .attr("id", name)
                    .attr("gradientUnits", "userSpaceOnUse")
                    .attr("x1", x0)
                    .attr("y1", y0)
                    .attr("x2", x1)
                    .attr("y2", y1);
                self.defs.push(stop_elements(gradient, stops));
                format!("url(#{})", name)
            }
            FillDescriptor::Radial { cx, cy, radius, stops } => {
                let gradient = SvgElement::new("radialGradient")
                    .attr("id", name)
                    .attr("gradientUnits", "userSpaceOnUse")
                    .attr("fx", cx)
                    .attr("fy", cy)
                    .attr("cx", cx)
                    .attr("cy", cy)
                    .attr("r", radius);
                self.defs.push(stop_elements(gradient, stops));
                format!("url(#{})", name)
            }
        };

        self.body.push(
            SvgElement::new("rect")
                .attr("x", region.x)
                .attr("y", region.y)
                .attr("width", region.width)
                .attr("height", region.height)
                .attr("clip-path", format!("url(#{})", clip_id))
                .attr("fill", paint),
        );
        Ok(())
    }

    fn place_image(&mut self, placement: &ImagePlacement<'_>) -> Result<()> {
        let rect = placement.rect;
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Ok(());
        }
        let image = placement.image;
        let (href, inline_href) = if placement.embed || image.source().starts_with("data:") {
            let href = if placement.embed {
                image.to_png_data_uri()?
            } else {
                image.source().to_string()
            };
            (href, None)
        } else {
            (image.source().to_string(), Some(image.to_png_data_uri()?))
        };
        let aspect = match placement.fit {
            ImageFit::Fill => "none",
            ImageFit::Cover => "xMidYMid slice",
        };

        let mut element = SvgElement::new("image")
            .attr("xlink:href", href)
            .attr("x", rect.x)
            .attr("y", rect.y)
            .attr("width", rect.width)
            .attr("height", rect.height)
            .attr("preserveAspectRatio", aspect);
        element.inline_href = inline_href;
        self.body.push(element);
        Ok(())
    }

    fn encode(&self, format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Svg => Ok(self.to_svg_string().into_bytes()),
            _ => encode_image(&pixmap_to_image(&self.rasterize()?)?, format),
        }
    }
}
