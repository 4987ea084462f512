/// Grid geometry.
///
/// Maps a module count onto a pixel canvas: how big one module is and where the grid's
/// top-left corner sits. Everything downstream (shape placement, fill geometry, logo sizing)
/// is derived from these integers.
use crate::error::{QrStyleError, Result};
use crate::matrix::ErrorCorrectionLevel;

/// Module size and grid origin for one render.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Layout {
    /// Side length of the grid, in modules.
    pub count: u32,
    /// Side length of one module, in pixels. Always at least 1.
    pub dot_size: u32,
    pub x_origin: u32,
    pub y_origin: u32,
}

impl Layout {
    /// Side length of the whole grid in pixels.
    pub fn grid_size(&self) -> u32 {
        self.count * self.dot_size
    }

    /// Pixel rectangle covered by the grid.
    pub fn grid_region(&self) -> DrawRegion {
        let size = self.grid_size() as f32;
        DrawRegion::new(self.x_origin as f32, self.y_origin as f32, size, size)
    }

    /// Top-left pixel of the module at `(row, col)`.
    pub fn module_origin(&self, row: u32, col: u32) -> (f32, f32) {
        (
            (self.x_origin + col * self.dot_size) as f32,
            (self.y_origin + row * self.dot_size) as f32,
        )
    }
}

/// An axis-aligned rectangle used for shape placement and fill geometry.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct DrawRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DrawRegion {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn square(x: f32, y: f32, size: f32) -> Self {
        Self::new(x, y, size, size)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Computes module size and grid origin.
///
/// The module size is floored so every module lands on whole pixels. Leftover pixels are
/// split between both sides with the odd pixel going right/bottom, so the grid leans
/// top-left by at most one pixel.
///
/// # Errors
///
/// Returns [`QrStyleError::Layout`] when the grid has more modules than the canvas has
/// pixels along either axis, or when the margin leaves no room for a 1px module.
///
/// # Example
///
/// ```rust
/// use qirust_style::layout::compute_layout;
///
/// let layout = compute_layout(210, 210, 0, 21).unwrap();
/// assert_eq!((layout.dot_size, layout.x_origin, layout.y_origin), (10, 0, 0));
/// ```
pub fn compute_layout(width: u32, height: u32, margin: u32, count: u32) -> Result<Layout> {
    if count == 0 {
        return Err(QrStyleError::Layout("module matrix is empty".to_string()));
    }
    if count > width || count > height {
        return Err(QrStyleError::Layout(format!(
            "grid too large: {} modules do not fit a {}x{} canvas",
            count, width, height
        )));
    }

    let min_size = i64::from(width.min(height)) - 2 * i64::from(margin);
    let dot_size = min_size.div_euclid(i64::from(count));
    if dot_size < 1 {
        return Err(QrStyleError::Layout(format!(
            "grid too large: margin {} leaves {}px for {} modules",
            margin, min_size, count
        )));
    }
    let dot_size = dot_size as u32;
    let grid = count * dot_size;

    let layout = Layout {
        count,
        dot_size,
        x_origin: (width - grid) / 2,
        y_origin: (height - grid) / 2,
    };
    log::debug!(
        "layout: {} modules at {}px, origin ({}, {})",
        count,
        dot_size,
        layout.x_origin,
        layout.y_origin
    );
    Ok(layout)
}

/// Maximum number of modules a logo may cover while the symbol still decodes.
///
/// `image_size` is the share of the level's error-correction tolerance the caller is willing
/// to spend on the logo.
///
/// # Example
///
/// ```rust
/// use qirust_style::layout::compute_image_occlusion_budget;
/// use qirust_style::matrix::ErrorCorrectionLevel;
///
/// assert_eq!(compute_image_occlusion_budget(0.4, ErrorCorrectionLevel::Quartile, 25), 62);
/// ```
pub fn compute_image_occlusion_budget(
    image_size: f64,
    level: ErrorCorrectionLevel,
    count: u32,
) -> u32 {
    let cover_level = image_size * level.tolerance();
    let budget = (cover_level * f64::from(count) * f64::from(count)).floor();
    if budget.is_finite() && budget > 0.0 {
        budget as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_one_fills_canvas() {
        let layout = compute_layout(210, 210, 0, 21).unwrap();
        assert_eq!(layout, Layout { count: 21, dot_size: 10, x_origin: 0, y_origin: 0 });
        assert_eq!(layout.module_origin(3, 14), (140.0, 30.0));
    }

    #[test]
    fn test_odd_leftover_leans_top_left() {
        // 300 / 29 = 10 -> grid of 290, leaving 10 on width and 110 on height.
        let layout = compute_layout(300, 401, 0, 29).unwrap();
        assert_eq!(layout.dot_size, 10);
        assert_eq!(layout.x_origin, 5);
        assert_eq!(layout.y_origin, 55);

        let layout = compute_layout(211, 211, 0, 21).unwrap();
        assert_eq!((layout.x_origin, layout.y_origin), (0, 0));
        let layout = compute_layout(213, 213, 0, 21).unwrap();
        assert_eq!((layout.x_origin, layout.y_origin), (1, 1));
    }

    #[test]
    fn test_margin_shrinks_modules() {
        let layout = compute_layout(300, 300, 20, 25).unwrap();
        assert_eq!(layout.dot_size, 10);
        assert_eq!(layout.x_origin, 25);
    }

    #[test]
    fn test_grid_too_large() {
        assert!(matches!(compute_layout(20, 300, 0, 21), Err(QrStyleError::Layout(_))));
        assert!(matches!(compute_layout(300, 20, 0, 21), Err(QrStyleError::Layout(_))));
        assert!(matches!(compute_layout(30, 30, 10, 21), Err(QrStyleError::Layout(_))));
        assert!(matches!(compute_layout(30, 30, 0, 0), Err(QrStyleError::Layout(_))));
    }

    #[test]
    fn test_grid_never_overflows() {
        for count in [21u32, 25, 33, 57, 177] {
            for width in [count, count + 1, 200, 333, 1024] {
                for height in [count, 250, 999] {
                    for margin in [0u32, 1, 7] {
                        let Ok(layout) = compute_layout(width, height, margin, count) else {
                            continue;
                        };
                        assert!(layout.dot_size >= 1);
                        assert!(layout.x_origin + count * layout.dot_size <= width);
                        assert!(layout.y_origin + count * layout.dot_size <= height);
                    }
                }
            }
        }
    }

    #[test]
    fn test_occlusion_budget() {
        use ErrorCorrectionLevel::*;
        assert_eq!(compute_image_occlusion_budget(0.4, Quartile, 25), 62);
        assert_eq!(compute_image_occlusion_budget(0.3, Medium, 29), 37);
        assert_eq!(compute_image_occlusion_budget(0.0, High, 29), 0);
    }

    #[test]
    fn test_occlusion_budget_is_monotonic() {
        use ErrorCorrectionLevel::*;
        let levels = [Low, Medium, Quartile, High];
        for count in [21u32, 29, 45] {
            let mut previous = 0;
            for level in levels {
                let budget = compute_image_occlusion_budget(0.5, level, count);
                assert!(budget >= previous);
                previous = budget;
            }
            let mut previous = 0;
            for step in 0..=10 {
                let budget = compute_image_occlusion_budget(step as f64 / 10.0, Medium, count);
                assert!(budget >= previous);
                previous = budget;
            }
        }
    }
}
