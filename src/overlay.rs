//! Logo and background-image placement.
//!
//! The logo is sized so the modules it hides stay within the occlusion budget, and never wider
//! or taller than the gap between two finder patterns. The background mask image only
//! decorates, so it simply covers a fixed share of the grid.

use crate::layout::Layout;
use crate::mask::HiddenArea;

/// Logo footprint in pixels and in hidden modules.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
    pub hide_x_dots: u32,
    pub hide_y_dots: u32,
}

impl ImageSize {
    pub fn hidden_area(&self) -> HiddenArea {
        HiddenArea {
            hide_x_dots: self.hide_x_dots,
            hide_y_dots: self.hide_y_dots,
        }
    }
}

/// Largest logo footprint that keeps the symbol decodable.
///
/// Works in hidden modules: the widest odd column count that fits the budget at the image's
/// aspect ratio, then the odd row count it implies. When that overshoots the budget or the
/// per-axis cap, the rows are reduced and the columns recomputed from them until it fits.
/// Odd counts keep the footprint centred on a module.
///
/// Non-positive dimensions, budget or module size produce an empty footprint.
///
/// # Example
///
/// ```rust
/// use qirust_style::overlay::calculate_image_size;
///
/// let size = calculate_image_size(300, 300, 37, 15, 10);
/// assert_eq!((size.hide_x_dots, size.hide_y_dots), (5, 5));
/// assert_eq!((size.width, size.height), (50, 50));
/// ```
pub fn calculate_image_size(
    original_width: u32,
    original_height: u32,
    max_hidden_dots: u32,
    max_hidden_axis_dots: u32,
    dot_size: u32,
) -> ImageSize {
    if original_width == 0 || original_height == 0 || max_hidden_dots == 0 || dot_size == 0 {
        return ImageSize::default();
    }

    let k = f64::from(original_height) / f64::from(original_width);
    let budget = i64::from(max_hidden_dots);
    let axis_cap = i64::from(max_hidden_axis_dots);
    let dot = i64::from(dot_size);

    let exceeds_cap = |dots: i64| axis_cap > 0 && dots > axis_cap;
    let largest_odd = |n: i64| if n % 2 == 0 { n - 1 } else { n };

    let mut hide_x = (f64::from(max_hidden_dots) / k).sqrt().floor() as i64;
    if hide_x <= 0 {
        hide_x = 1;
    }
    if exceeds_cap(hide_x) {
        hide_x = axis_cap;
    }
    hide_x = largest_odd(hide_x).max(1);
    let mut width = hide_x * dot;

    // Ceil so the logo never overlaps a module that is still drawn.
    let mut hide_y = 1 + 2 * ((hide_x as f64 * k - 1.0) / 2.0).ceil() as i64;
    let mut height = (width as f64 * k).round() as i64;

    if hide_y * hide_x > budget || exceeds_cap(hide_y) {
        hide_y = if exceeds_cap(hide_y) {
            largest_odd(axis_cap).max(1)
        } else {
            (hide_y - 2).max(1)
        };
        loop {
            hide_x = 1 + 2 * ((hide_y as f64 / k - 1.0) / 2.0).ceil() as i64;
            if hide_x * hide_y <= budget || hide_y == 1 {
                break;
            }
            hide_y = (hide_y - 2).max(1);
        }
        height = hide_y * dot;
        width = (height as f64 / k).round() as i64;
    }

    // A very wide image reduced to a single row can still overshoot; trim columns last.
    if hide_x * hide_y > budget || exceeds_cap(hide_x) {
        let mut limit = budget / hide_y;
        if axis_cap > 0 {
            limit = limit.min(axis_cap);
        }
        hide_x = largest_odd(limit).max(1);
        width = hide_x * dot;
        height = (width as f64 * k).round() as i64;
    }

    let clamp = |v: i64| v.max(0) as u32;
    ImageSize {
        width: clamp(width),
        height: clamp(height),
        hide_x_dots: clamp(hide_x),
        hide_y_dots: clamp(hide_y),
    }
}

/// Pixel rectangle an image is drawn into.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ImageRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// How an image fills its rectangle.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ImageFit {
    /// Stretched to the rectangle; the rectangle already has the image's aspect ratio.
    Fill,
    /// Scaled to cover the rectangle and cropped around the centre.
    Cover,
}

/// Logo rectangle: centred on the grid, then shrunk by `margin` on every side.
pub fn logo_rect(layout: &Layout, size: &ImageSize, margin: u32) -> ImageRect {
    let grid = layout.grid_size() as f32;
    let margin = margin as f32;
    let (width, height) = (size.width as f32, size.height as f32);
    ImageRect {
        x: layout.x_origin as f32 + margin + (grid - width) / 2.0,
        y: layout.y_origin as f32 + margin + (grid - height) / 2.0,
        width: width - margin * 2.0,
        height: height - margin * 2.0,
    }
}

/// Background mask rectangle: `image_size` of the grid, centred. Drawn with [`ImageFit::Cover`].
pub fn background_rect(layout: &Layout, image_size: f64) -> ImageRect {
    let grid = layout.grid_size() as f32;
    let side = grid * image_size as f32;
    ImageRect {
        x: layout.x_origin as f32 + (grid - side) / 2.0,
        y: layout.y_origin as f32 + (grid - side) / 2.0,
        width: side,
        height: side,
    }
}

/// Source crop `(x, y, width, height)` that makes an image of the given size cover `rect`
/// without distortion.
pub fn cover_crop(image_width: u32, image_height: u32, rect: &ImageRect) -> (f32, f32, f32, f32) {
    let (iw, ih) = (image_width as f32, image_height as f32);
    if iw <= 0.0 || ih <= 0.0 || rect.width <= 0.0 || rect.height <= 0.0 {
        return (0.0, 0.0, iw, ih);
    }
    let scale = (rect.width / iw).max(rect.height / ih);
    let (cw, ch) = (rect.width / scale, rect.height / scale);
    ((iw - cw) / 2.0, (ih - ch) / 2.0, cw, ch)
}
