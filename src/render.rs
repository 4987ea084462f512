//! Render orchestration.
//!
//! A render runs in two phases. [`prepare`] is async: it validates the configuration, lays out
//! the grid and awaits the logo and background images, so every size the geometry depends on
//! is known when it returns. [`PreparedRender::paint`] is synchronous: it builds the draw plan
//! and replays it on a backend. Nothing in the paint phase can suspend.
//!
//! [`QrStyler`] bundles a configuration, a loader and an owned render target for callers that
//! render repeatedly into the same target.

use crate::backend::{OutputFormat, RasterBackend, RenderBackend, VectorBackend};
use crate::config::StyleConfig;
use crate::error::Result;
use crate::image_loader::{DefaultImageLoader, ImageLoader, LoadedImage};
use crate::layout::{compute_image_occlusion_budget, compute_layout, Layout};
use crate::matrix::ModuleMatrix;
use crate::overlay::{calculate_image_size, ImageSize};
use crate::plan::{build_plan, PlanImages, PlanInputs, RenderPlan};

/// Everything a paint needs, with images already loaded.
pub struct PreparedRender<'a, M: ModuleMatrix + ?Sized> {
    matrix: &'a M,
    config: &'a StyleConfig,
    layout: Layout,
    logo: Option<(LoadedImage, ImageSize)>,
    mask_image: Option<LoadedImage>,
}

impl<'a, M: ModuleMatrix + ?Sized> PreparedRender<'a, M> {
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Logo footprint, when a logo will be drawn.
    pub fn logo_size(&self) -> Option<ImageSize> {
        self.logo.as_ref().map(|(_, size)| *size)
    }

    pub fn has_mask_image(&self) -> bool {
        self.mask_image.is_some()
    }

    pub fn plan(&self) -> Result<RenderPlan> {
        build_plan(&PlanInputs {
            matrix: self.matrix,
            config: self.config,
            layout: self.layout,
            logo: self.logo_size(),
            has_mask_image: self.mask_image.is_some(),
        })
    }

    /// Clears `backend` and draws the whole symbol into it.
    pub fn paint<B: RenderBackend + ?Sized>(&self, backend: &mut B) -> Result<()> {
        let plan = self.plan()?;
        plan.replay(
            backend,
            PlanImages {
                logo: self.logo.as_ref().map(|(image, _)| image),
                mask_image: self.mask_image.as_ref(),
            },
        )
    }
}

/// Validates, lays out and loads every image a render of `matrix` needs.
///
/// A logo that fails to load, or that leaves no room under the occlusion budget, is dropped
/// with a warning and the symbol renders without it. A background image that fails to load
/// fails the render.
pub async fn prepare<'a, M: ModuleMatrix + ?Sized>(
    matrix: &'a M,
    config: &'a StyleConfig,
    loader: &dyn ImageLoader,
) -> Result<PreparedRender<'a, M>> {
    config.validate()?;
    let count = matrix.module_count() as u32;
    let layout = compute_layout(config.width, config.height, config.margin, count)?;
    let cross_origin = config.image_options.cross_origin.as_deref();

    let logo = match &config.image {
        Some(source) => match loader.load(source, cross_origin).await {
            Ok(image) => {
                let budget = compute_image_occlusion_budget(
                    config.image_options.image_size,
                    config.qr_options.error_correction_level,
                    count,
                );
                let size = calculate_image_size(
                    image.width(),
                    image.height(),
                    budget,
                    count.saturating_sub(14),
                    layout.dot_size,
                );
                if size.width == 0 || size.height == 0 {
                    log::warn!("logo {} has no room under a budget of {} modules; skipped", image.source(), budget);
                    None
                } else {
                    log::debug!(
                        "logo {}x{}px hides {}x{} modules",
                        size.width,
                        size.height,
                        size.hide_x_dots,
                        size.hide_y_dots
                    );
                    Some((image, size))
                }
            }
            Err(err) => {
                log::warn!("rendering without logo: {}", err);
                None
            }
        },
        None => None,
    };

    let mask_image = match &config.mask_options.image {
        Some(source) => Some(loader.load(source, cross_origin).await?),
        None => None,
    };

    Ok(PreparedRender {
        matrix,
        config,
        layout,
        logo,
        mask_image,
    })
}

/// A configuration bound to a render target.
///
/// Each [`render`](QrStyler::render) clears the target first, so one styler can render any
/// number of matrices in turn. Taking `&mut self` keeps it to one render at a time.
///
/// # Example
///
/// ```rust
/// use qirust_style::backend::OutputFormat;
/// use qirust_style::config::StyleConfig;
/// use qirust_style::matrix::BitMatrix;
/// use qirust_style::render::QrStyler;
///
/// let config = StyleConfig { width: 84, height: 84, ..StyleConfig::default() };
/// let mut styler = QrStyler::vector(config).unwrap();
/// let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// runtime.block_on(styler.render(&BitMatrix::new(21))).unwrap();
/// let svg = styler.encode(OutputFormat::Svg).unwrap();
/// assert!(svg.starts_with(b"<?xml"));
/// ```
pub struct QrStyler<B: RenderBackend> {
    config: StyleConfig,
    backend: B,
    loader: Box<dyn ImageLoader>,
}

impl QrStyler<RasterBackend> {
    /// A styler painting into a pixel buffer.
    pub fn raster(config: StyleConfig) -> Result<Self> {
        config.validate()?;
        let backend = RasterBackend::new(config.width, config.height)?;
        Ok(Self::with_backend(config, backend))
    }
}

impl QrStyler<VectorBackend> {
    /// A styler building an SVG document.
    pub fn vector(config: StyleConfig) -> Result<Self> {
        config.validate()?;
        let backend = VectorBackend::new(config.width, config.height);
        Ok(Self::with_backend(config, backend))
    }
}

impl<B: RenderBackend> QrStyler<B> {
    pub fn with_backend(config: StyleConfig, backend: B) -> Self {
        Self {
            config,
            backend,
            loader: Box::new(DefaultImageLoader::new()),
        }
    }

    /// Replaces the image loader, e.g. with one that can fetch remote URLs.
    pub fn with_loader(mut self, loader: impl ImageLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// Draws `matrix` into the target, replacing whatever it held.
    pub async fn render<M: ModuleMatrix + ?Sized>(&mut self, matrix: &M) -> Result<()> {
        let prepared = prepare(matrix, &self.config, self.loader.as_ref()).await?;
        prepared.paint(&mut self.backend)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>> {
        self.backend.encode(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::pixmap_to_image;
    use crate::config::DotsOptions;
    use crate::error::QrStyleError;
    use crate::matrix::{BitMatrix, ErrorCorrectionLevel};
    use crate::shapes::DotType;
    use crate::testing::{finder_matrix, init_logging, png_data_uri};

    fn config_210() -> StyleConfig {
        StyleConfig {
            width: 210,
            height: 210,
            ..StyleConfig::default()
        }
    }

    #[tokio::test]
    async fn test_repeated_renders_are_identical() {
        init_logging();
        let matrix = finder_matrix(21);
        let mut styler = QrStyler::vector(config_210()).unwrap();
        styler.render(&matrix).await.unwrap();
        let first = styler.backend().to_svg_string();
        styler.render(&matrix).await.unwrap();
        assert_eq!(styler.backend().to_svg_string(), first);

        let mut raster = QrStyler::raster(config_210()).unwrap();
        raster.render(&matrix).await.unwrap();
        let first = raster.backend().to_image().unwrap();
        raster.render(&matrix).await.unwrap();
        assert_eq!(raster.backend().to_image().unwrap(), first);
    }

    #[tokio::test]
    async fn test_backends_agree_on_modules() {
        let matrix = finder_matrix(21);
        let mut vector = QrStyler::vector(config_210()).unwrap();
        vector.render(&matrix).await.unwrap();
        let from_svg = pixmap_to_image(&vector.backend().rasterize().unwrap()).unwrap();

        let mut raster = QrStyler::raster(config_210()).unwrap();
        raster.render(&matrix).await.unwrap();
        let from_pixels = raster.backend().to_image().unwrap();

        for row in 0..21u32 {
            for col in 0..21u32 {
                let (x, y) = (col * 10 + 5, row * 10 + 5);
                let expected = if matrix.is_dark(row as usize, col as usize) { 0 } else { 255 };
                assert_eq!(from_pixels.get_pixel(x, y).0, [expected, expected, expected, 255]);
                assert_eq!(from_svg.get_pixel(x, y).0, [expected, expected, expected, 255]);
            }
        }
    }

    #[tokio::test]
    async fn test_missing_logo_degrades() {
        let matrix = finder_matrix(21);
        let mut config = config_210();
        config.image = Some("/no/such/logo.png".to_string());
        let mut styler = QrStyler::vector(config).unwrap();
        styler.render(&matrix).await.unwrap();
        assert!(!styler.backend().to_svg_string().contains("<image"));
    }

    #[tokio::test]
    async fn test_logo_is_sized_under_budget() {
        let matrix = finder_matrix(29);
        let mut config = StyleConfig {
            width: 290,
            height: 290,
            image: Some(png_data_uri(300, 300, [255, 0, 0, 255])),
            ..StyleConfig::default()
        };
        config.qr_options.error_correction_level = ErrorCorrectionLevel::Medium;
        config.image_options.image_size = 0.3;

        let prepared = prepare(&matrix, &config, &DefaultImageLoader::new()).await.unwrap();
        let size = prepared.logo_size().unwrap();
        assert!(size.hide_x_dots * size.hide_y_dots <= 37);
        assert_eq!(size.width, size.hide_x_dots * 10);

        let mut raster = RasterBackend::new(290, 290).unwrap();
        prepared.paint(&mut raster).unwrap();
        let image = raster.to_image().unwrap();
        assert_eq!(image.get_pixel(145, 145).0, [255, 0, 0, 255]);
    }

    #[tokio::test]
    async fn test_failed_mask_image_aborts() {
        let matrix = finder_matrix(21);
        let mut config = config_210();
        config.mask_options.image = Some("/no/such/background.png".to_string());
        let mut styler = QrStyler::raster(config).unwrap();
        let err = styler.render(&matrix).await.unwrap_err();
        assert!(matches!(err, QrStyleError::ImageLoad(_)));
    }

    #[tokio::test]
    async fn test_layout_errors_surface_before_drawing() {
        let config = StyleConfig {
            width: 20,
            height: 20,
            ..StyleConfig::default()
        };
        let mut styler = QrStyler::vector(config).unwrap();
        let err = styler.render(&BitMatrix::new(21)).await.unwrap_err();
        assert!(matches!(err, QrStyleError::Layout(_)));
    }

    #[tokio::test]
    async fn test_render_encodes_after_paint() {
        let matrix = finder_matrix(25);
        let config = StyleConfig {
            width: 100,
            height: 100,
            dots_options: DotsOptions {
                kind: DotType::Rounded,
                ..DotsOptions::default()
            },
            ..StyleConfig::default()
        };
        let mut styler = QrStyler::raster(config).unwrap();
        styler.render(&matrix).await.unwrap();
        let png = styler.encode(OutputFormat::Png).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        assert!(matches!(styler.encode(OutputFormat::Svg), Err(QrStyleError::RenderTarget(_))));
    }
}
