use crate::backend::OutputFormat;
use crate::config::StyleConfig;
use crate::error::{QrStyleError, Result};
use crate::matrix::ModuleMatrix;
use crate::render::QrStyler;

use image::RgbaImage;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/*---- Utilities ----*/

// Drives one render to completion on a private single-threaded runtime.
// Refused inside a running runtime; async callers use `QrStyler` directly.
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(QrStyleError::RenderTarget(
            "blocking helpers cannot run inside an async runtime; use QrStyler::render".to_string(),
        ));
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| QrStyleError::RenderTarget(format!("failed to start runtime: {}", e)))?;
    Ok(runtime.block_on(future))
}

/// Renders a styled QR Code as an SVG document.
///
/// # Arguments
///
/// * `matrix` - The encoded module grid.
/// * `config` - Canvas size, shapes, colours and images.
///
/// # Returns
///
/// The SVG markup, starting with an XML declaration.
///
/// # Example
///
/// ```
/// use qirust_style::config::StyleConfig;
/// use qirust_style::helper::generate_svg_string;
/// use qirust_style::matrix::BitMatrix;
///
/// let svg = generate_svg_string(&BitMatrix::new(21), &StyleConfig::default()).unwrap();
/// assert!(svg.contains("<svg"));
/// ```
pub fn generate_svg_string<M: ModuleMatrix + ?Sized>(matrix: &M, config: &StyleConfig) -> Result<String> {
    let mut styler = QrStyler::vector(config.clone())?;
    block_on(styler.render(matrix))??;
    Ok(styler.backend().to_svg_string())
}

/// Renders a styled QR Code into an RGBA image buffer.
///
/// # Arguments
///
/// * `matrix` - The encoded module grid.
/// * `config` - Canvas size, shapes, colours and images.
///
/// # Returns
///
/// A `config.width` × `config.height` image with straight alpha.
///
/// # Example
///
/// ```
/// use qirust_style::config::StyleConfig;
/// use qirust_style::helper::generate_image_buffer;
/// use qirust_style::matrix::BitMatrix;
///
/// let img = generate_image_buffer(&BitMatrix::new(21), &StyleConfig::default()).unwrap();
/// assert_eq!(img.dimensions(), (300, 300));
/// ```
pub fn generate_image_buffer<M: ModuleMatrix + ?Sized>(matrix: &M, config: &StyleConfig) -> Result<RgbaImage> {
    let mut styler = QrStyler::raster(config.clone())?;
    block_on(styler.render(matrix))??;
    styler.backend().to_image()
}

/// Renders a styled QR Code and encodes it.
///
/// SVG comes from the vector backend; every raster format from the raster backend.
pub fn generate_bytes<M: ModuleMatrix + ?Sized>(
    matrix: &M,
    config: &StyleConfig,
    format: OutputFormat,
) -> Result<Vec<u8>> {
    if format == OutputFormat::Svg {
        return Ok(generate_svg_string(matrix, config)?.into_bytes());
    }
    let mut styler = QrStyler::raster(config.clone())?;
    block_on(styler.render(matrix))??;
    styler.encode(format)
}

/// Renders a styled QR Code and saves it to a file.
///
/// # Arguments
///
/// * `matrix` - The encoded module grid.
/// * `config` - Canvas size, shapes, colours and images.
/// * `format` - Output format; also decides the file extension.
/// * `directory_path` - Optional. The directory path where the image will be saved. If not provided, the default directory is "generated".
/// * `filename` - Optional. The name of the image file, without extension. If not provided, a timestamp-based filename will be used.
///
/// # Returns
///
/// The path of the written file.
///
/// # Example
///
/// ```rust,no_run
/// use qirust_style::backend::OutputFormat;
/// use qirust_style::config::StyleConfig;
/// use qirust_style::helper::qr_to_image_and_save;
/// use qirust_style::matrix::BitMatrix;
///
/// let path = qr_to_image_and_save(
///     &BitMatrix::new(21),
///     &StyleConfig::default(),
///     OutputFormat::Png,
///     Some("images"),
///     Some("qr_code"),
/// )
/// .unwrap();
/// println!("saved to {}", path.display());
/// ```
pub fn qr_to_image_and_save<M: ModuleMatrix + ?Sized>(
    matrix: &M,
    config: &StyleConfig,
    format: OutputFormat,
    directory_path: Option<&str>,
    filename: Option<&str>,
) -> Result<PathBuf> {
    let bytes = generate_bytes(matrix, config, format)?;

    let directory_path = directory_path.unwrap_or("generated");
    let filename = match filename {
        Some(name) => name.to_string(),
        None => {
            let since_the_epoch = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default();
            since_the_epoch.as_millis().to_string()
        }
    };

    let file_path = Path::new(directory_path).join(format!("{}.{}", filename, format.extension()));

    // Check if the directory exists, create it if it doesn't
    let write_error = |e: std::io::Error| {
        QrStyleError::RenderTarget(format!("failed to write {}: {}", file_path.display(), e))
    };
    if !Path::new(directory_path).exists() {
        fs::create_dir_all(directory_path).map_err(write_error)?;
    }
    fs::write(&file_path, bytes).map_err(write_error)?;
    log::debug!("saved {}", file_path.display());
    Ok(file_path)
}
