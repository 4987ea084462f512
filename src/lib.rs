//! # qirust-style
//!
//! A Rust library for drawing styled QR codes from an already-encoded module matrix.
//!
//! `qirust-style` takes a finished grid of dark and light modules plus a [`config::StyleConfig`]
//! and draws it with custom dot and finder-corner shapes, solid or gradient fills, an optional
//! centred logo and an optional decorative background. The same draw plan can target a pixel
//! buffer or an SVG document.
//!
//! ## Features
//!
//! - Nine body dot shapes, four corner square shapes and four corner dot shapes.
//! - Solid colours or linear/radial gradients per styled area.
//! - Logos sized so the hidden modules stay within the error-correction budget.
//! - Decorative mask dots and a background image behind the modules.
//! - Raster output (PNG, JPEG, WebP) and SVG output.
//! - JSON options (`StyleConfig::from_json`) with camelCase keys.
//!
//! ## Shape tags
//!
//! The shape registry is a fixed, deliberate subset. Any other tag is rejected as a
//! configuration error instead of falling back to a default shape.
//!
//! - `dotsOptions.type`: `square`, `dots`, `rounded`, `extra-rounded`, `classy`,
//!   `classy-rounded`, `small-square`, `small-dots`, `rhombus`.
//! - `cornersSquareOptions.type`: `square`, `dot`, `extra-rounded`, `classy`.
//! - `cornersDotOptions.type`: `square`, `dot`, `extra-rounded`, `rhombus`.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qirust-style = "0.2" # Replace with the latest version
//! ```
//!
//! Enable the `encode` feature to render `qrcode::QrCode` values directly.
//!
//! ## Example
//!
//! Render rounded dots on a 21×21 grid into an image buffer:
//!
//! ```rust
//! use qirust_style::config::StyleConfig;
//! use qirust_style::helper::generate_image_buffer;
//! use qirust_style::matrix::BitMatrix;
//!
//! let config = StyleConfig::from_json(r##"{
//!     "width": 210,
//!     "height": 210,
//!     "dotsOptions": { "type": "rounded", "color": "#4267b2" }
//! }"##).unwrap();
//!
//! let mut matrix = BitMatrix::new(21);
//! matrix.set(10, 10, true);
//!
//! let img = generate_image_buffer(&matrix, &config).unwrap();
//! assert_eq!(img.dimensions(), (210, 210));
//! ```
//!
//! Render asynchronously into an SVG document:
//!
//! ```rust
//! use qirust_style::config::StyleConfig;
//! use qirust_style::matrix::BitMatrix;
//! use qirust_style::render::QrStyler;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut styler = QrStyler::vector(StyleConfig::default()).unwrap();
//! styler.render(&BitMatrix::new(25)).await.unwrap();
//! let svg = styler.backend().to_svg_string();
//! assert!(svg.contains("clip-path-dot-color"));
//! # });
//! ```
//!
//! ## Modules
//!
//! - [`matrix`]: The module-matrix input and error-correction levels.
//! - [`config`]: Style options, defaults and validation.
//! - [`layout`]: Grid geometry and the logo occlusion budget.
//! - [`shapes`]: Dot and corner shape geometry.
//! - [`render`]: Two-phase rendering and [`render::QrStyler`].
//! - [`backend`]: Raster and SVG render targets.
//! - [`helper`]: Blocking one-call rendering helpers.

pub mod backend;
pub mod color;
pub mod config;
pub mod error;
pub mod helper;
pub mod image_loader;
pub mod layout;
pub mod mask;
pub mod matrix;
pub mod overlay;
pub mod plan;
pub mod render;
pub mod shapes;

#[cfg(test)]
mod testing;

pub use config::StyleConfig;
pub use error::{QrStyleError, Result};
pub use matrix::{BitMatrix, ErrorCorrectionLevel, ModuleMatrix};
pub use render::QrStyler;
