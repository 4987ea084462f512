//! Render targets.
//!
//! Both backends interpret the same call sequence. Geometry, fills and image rectangles are
//! fully resolved before they get here; a backend only translates them into its own
//! primitives. The raster backend paints immediately into a `tiny_skia` pixmap. The vector
//! backend keeps an SVG element tree and serializes it on demand.

mod raster;
mod vector;

pub use raster::RasterBackend;
pub use vector::VectorBackend;

use std::io::Cursor;
use std::str::FromStr;

use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::color::FillDescriptor;
use crate::error::{QrStyleError, Result};
use crate::image_loader::LoadedImage;
use crate::layout::DrawRegion;
use crate::overlay::{ImageFit, ImageRect};
use crate::shapes::Figure;

/// Encoded output formats.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
    /// Markup; vector backend only.
    Svg,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Svg => "image/svg+xml",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
            OutputFormat::Svg => "svg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = QrStyleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::Webp),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(QrStyleError::Configuration(format!(
                "unknown output format {:?}",
                other
            ))),
        }
    }
}

/// One image to place, already sized and positioned.
#[derive(Clone, Copy, Debug)]
pub struct ImagePlacement<'a> {
    pub image: &'a LoadedImage,
    pub rect: ImageRect,
    pub fit: ImageFit,
    /// Vector output embeds the pixels as a PNG data URI instead of linking the source.
    pub embed: bool,
}

/// The draw contract shared by every render target.
///
/// A styled region collects shapes between [`begin_styled_region`] and
/// [`end_styled_region`]; a later [`fill_region`] with the same name paints its fill through
/// the union of those shapes, and nowhere else.
///
/// [`begin_styled_region`]: RenderBackend::begin_styled_region
/// [`end_styled_region`]: RenderBackend::end_styled_region
/// [`fill_region`]: RenderBackend::fill_region
pub trait RenderBackend {
    /// Resets the target to an empty `width` × `height` canvas, keeping the backend itself.
    fn clear(&mut self, width: u32, height: u32) -> Result<()>;

    fn begin_styled_region(&mut self, name: &str) -> Result<()>;

    /// Adds a shape to the open region.
    fn draw_shape(&mut self, figure: &Figure) -> Result<()>;

    fn end_styled_region(&mut self) -> Result<()>;

    /// Paints `fill` over `region`, clipped to the named region's shapes.
    fn fill_region(&mut self, name: &str, region: DrawRegion, fill: &FillDescriptor) -> Result<()>;

    fn place_image(&mut self, placement: &ImagePlacement<'_>) -> Result<()>;

    /// Encodes the current contents.
    fn encode(&self, format: OutputFormat) -> Result<Vec<u8>>;
}

/// Converts a premultiplied pixmap into a straight-alpha image.
pub(crate) fn pixmap_to_image(pixmap: &tiny_skia::Pixmap) -> Result<RgbaImage> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data).ok_or_else(|| {
        QrStyleError::RenderTarget(format!(
            "pixel buffer does not match {}x{}",
            pixmap.width(),
            pixmap.height()
        ))
    })
}

/// Converts a straight-alpha image into a premultiplied pixmap.
pub(crate) fn image_to_pixmap(image: &RgbaImage) -> Result<tiny_skia::Pixmap> {
    let mut rgba = image.as_raw().clone();
    for pixel in rgba.chunks_exact_mut(4) {
        let alpha = pixel[3] as u16;
        pixel[0] = ((pixel[0] as u16 * alpha + 127) / 255) as u8;
        pixel[1] = ((pixel[1] as u16 * alpha + 127) / 255) as u8;
        pixel[2] = ((pixel[2] as u16 * alpha + 127) / 255) as u8;
    }
    let size = tiny_skia::IntSize::from_wh(image.width(), image.height()).ok_or_else(|| {
        QrStyleError::RenderTarget(format!(
            "cannot build a {}x{} pixmap",
            image.width(),
            image.height()
        ))
    })?;
    tiny_skia::Pixmap::from_vec(rgba, size)
        .ok_or_else(|| QrStyleError::RenderTarget("pixmap data has the wrong length".to_string()))
}

/// Encodes a finished image as PNG, JPEG or WebP.
pub(crate) fn encode_image(image: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    let written = match format {
        OutputFormat::Png => image.write_to(&mut cursor, ImageFormat::Png),
        OutputFormat::Webp => image.write_to(&mut cursor, ImageFormat::WebP),
        // JPEG has no alpha channel.
        OutputFormat::Jpeg => DynamicImage::ImageRgba8(image.clone())
            .to_rgb8()
            .write_to(&mut cursor, ImageFormat::Jpeg),
        OutputFormat::Svg => {
            return Err(QrStyleError::RenderTarget(
                "svg output needs the vector backend".to_string(),
            ))
        }
    };
    written.map_err(|e| {
        QrStyleError::RenderTarget(format!("failed to encode {}: {}", format.extension(), e))
    })?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_names() {
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("webp".parse::<OutputFormat>().unwrap().mime_type(), "image/webp");
        assert!("gif".parse::<OutputFormat>().is_err());
        let json = serde_json::to_string(&OutputFormat::Svg).unwrap();
        assert_eq!(json, "\"svg\"");
    }

    #[test]
    fn test_pixmap_conversion_keeps_straight_alpha() {
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        image.put_pixel(2, 1, image::Rgba([0, 0, 255, 0]));
        let pixmap = image_to_pixmap(&image).unwrap();
        let back = pixmap_to_image(&pixmap).unwrap();
        assert_eq!(back.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(back.get_pixel(2, 1).0[3], 0);
    }

    #[test]
    fn test_encode_signatures() {
        let image = RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        let png = encode_image(&image, OutputFormat::Png).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        let jpeg = encode_image(&image, OutputFormat::Jpeg).unwrap();
        assert_eq!(&jpeg[..2], b"\xFF\xD8");
        let webp = encode_image(&image, OutputFormat::Webp).unwrap();
        assert_eq!(&webp[8..12], b"WEBP");
        assert!(matches!(
            encode_image(&image, OutputFormat::Svg),
            Err(QrStyleError::RenderTarget(_))
        ));
    }
}
