//! Logo and mask image loading.
//!
//! Loading is the only suspension point of a render. [`ImageLoader`] is the seam: the
//! renderer awaits it while preparing, and never touches image sources after that. The
//! [`DefaultImageLoader`] understands data URIs and filesystem paths; anything that needs a
//! network client is left to a caller-supplied loader.

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, RgbaImage};

use crate::error::{QrStyleError, Result};

/// A decoded image plus the source it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedImage {
    source: String,
    pixels: RgbaImage,
}

impl LoadedImage {
    pub fn new(source: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            source: source.into(),
            pixels,
        }
    }

    /// Decodes raster bytes, or rasterizes them when they hold SVG markup.
    pub fn decode(source: &str, bytes: &[u8]) -> Result<Self> {
        let pixels = if looks_like_svg(source, bytes) {
            rasterize_svg(source, bytes)?
        } else {
            image::load_from_memory(bytes)
                .map_err(|e| QrStyleError::ImageLoad(format!("{}: {}", describe(source), e)))?
                .to_rgba8()
        };
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(QrStyleError::ImageLoad(format!(
                "{}: image has no pixels",
                describe(source)
            )));
        }
        Ok(Self::new(source, pixels))
    }

    /// The URL, path or data URI the image was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Re-encodes the pixels as a `data:image/png;base64,...` URI.
    pub fn to_png_data_uri(&self) -> Result<String> {
        let mut png = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| QrStyleError::RenderTarget(format!("failed to encode image as PNG: {}", e)))?;
        Ok(format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(png)
        ))
    }
}

/// Fetches and decodes an image.
///
/// A render awaits at most two loads (logo, mask image) and never retries; a failed load is
/// reported once and handled by the caller.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Loads `source`. `cross_origin` is the configured CORS mode, for loaders that fetch
    /// over the network.
    async fn load(&self, source: &str, cross_origin: Option<&str>) -> Result<LoadedImage>;
}

/// Loads data URIs and files. Remote URLs are rejected with [`QrStyleError::ImageLoad`].
#[derive(Clone, Debug, Default)]
pub struct DefaultImageLoader {
    base_dir: Option<PathBuf>,
}

impl DefaultImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative paths against `dir` instead of the working directory.
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    fn resolve_path(&self, source: &str) -> PathBuf {
        let path = PathBuf::from(source.strip_prefix("file://").unwrap_or(source));
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }
}

#[async_trait]
impl ImageLoader for DefaultImageLoader {
    async fn load(&self, source: &str, cross_origin: Option<&str>) -> Result<LoadedImage> {
        if let Some(mode) = cross_origin {
            log::trace!("crossOrigin {:?} ignored for {}", mode, describe(source));
        }

        let bytes = if source.starts_with("data:") {
            decode_data_uri(source)?
        } else if source.starts_with("http://") || source.starts_with("https://") {
            return Err(QrStyleError::ImageLoad(format!(
                "{}: remote images need a network-capable ImageLoader",
                source
            )));
        } else {
            let path = self.resolve_path(source);
            tokio::fs::read(&path)
                .await
                .map_err(|e| QrStyleError::ImageLoad(format!("{}: {}", path.display(), e)))?
        };

        let image = LoadedImage::decode(source, &bytes)?;
        log::debug!(
            "loaded {} ({}x{})",
            describe(source),
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

/// Short form of a source for messages; data URIs can be megabytes long.
fn describe(source: &str) -> &str {
    if source.starts_with("data:") {
        source.split(',').next().unwrap_or("data URI")
    } else {
        source
    }
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let invalid = |why: &str| QrStyleError::ImageLoad(format!("{}: {}", describe(uri), why));
    let rest = uri.strip_prefix("data:").ok_or_else(|| invalid("not a data URI"))?;
    let (meta, payload) = rest.split_once(',').ok_or_else(|| invalid("missing ','"))?;

    if meta.ends_with(";base64") {
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| invalid(&e.to_string()))
    } else {
        percent_decode(payload).ok_or_else(|| invalid("bad percent escape"))
    }
}

fn percent_decode(input: &str) -> Option<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = (*bytes.get(i + 1)? as char).to_digit(16)?;
            let lo = (*bytes.get(i + 2)? as char).to_digit(16)?;
            out.push(((hi << 4) | lo) as u8);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(out)
}

fn looks_like_svg(source: &str, bytes: &[u8]) -> bool {
    if source.starts_with("data:image/svg") || source.to_ascii_lowercase().ends_with(".svg") {
        return true;
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Rasterizes SVG markup at its intrinsic size.
fn rasterize_svg(source: &str, bytes: &[u8]) -> Result<RgbaImage> {
    let tree = resvg::usvg::Tree::from_data(bytes, &resvg::usvg::Options::default())
        .map_err(|e| QrStyleError::ImageLoad(format!("{}: failed to parse SVG: {}", describe(source), e)))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        QrStyleError::ImageLoad(format!(
            "{}: cannot rasterize SVG at {}x{}",
            describe(source),
            size.width(),
            size.height()
        ))
    })?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    crate::backend::pixmap_to_image(&pixmap)
}
