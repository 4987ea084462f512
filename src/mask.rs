/// Per-module visibility.
///
/// Decides for every module whether it is hidden under the logo, left to the finder-corner
/// renderer, drawn as a styled dot, painted as a decorative light dot, or skipped. Decisions
/// are independent of each other and of evaluation order.
use crate::matrix::ModuleMatrix;

/// Outer ring of a finder pattern, row-major.
pub const SQUARE_STENCIL: [[u8; 7]; 7] = [
    [1, 1, 1, 1, 1, 1, 1],
    [1, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 1],
    [1, 1, 1, 1, 1, 1, 1],
];

/// Inner 3×3 of a finder pattern, row-major.
pub const DOT_STENCIL: [[u8; 7]; 7] = [
    [0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0],
    [0, 0, 1, 1, 1, 0, 0],
    [0, 0, 1, 1, 1, 0, 0],
    [0, 0, 1, 1, 1, 0, 0],
    [0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0],
];

/// What to do with one module.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ModuleDecision {
    /// Under the logo; nothing is drawn.
    Suppressed,
    /// Part of a finder pattern; the corner renderer owns it.
    Finder,
    /// Dark module drawn with the body dot style.
    Dark,
    /// Light module painted with a decorative mask dot.
    Decorative,
    /// Light module left empty.
    Light,
}

/// Top-left module of each finder pattern as `(row, col)`, in drawing order.
/// The bottom-right corner never carries one.
pub fn finder_anchors(count: u32) -> [(u32, u32); 3] {
    let far = count.saturating_sub(7);
    [(0, 0), (0, far), (far, 0)]
}

fn stencil_hit(stencil: &[[u8; 7]; 7], count: u32, row: u32, col: u32) -> bool {
    finder_anchors(count).iter().any(|&(ar, ac)| {
        row >= ar
            && col >= ac
            && stencil
                .get((row - ar) as usize)
                .and_then(|r| r.get((col - ac) as usize))
                .map_or(false, |&v| v == 1)
    })
}

/// `true` when the module is covered by a finder ring or finder centre.
pub fn in_finder_stencil(count: u32, row: u32, col: u32) -> bool {
    stencil_hit(&SQUARE_STENCIL, count, row, col) || stencil_hit(&DOT_STENCIL, count, row, col)
}

/// `true` anywhere inside one of the three 7×7 corner blocks, light separator ring included.
pub fn in_corner_region(count: u32, row: u32, col: u32) -> bool {
    let far = count.saturating_sub(7);
    let top_left = row < 7 && col < 7;
    let top_right = row < 7 && col >= far;
    let bottom_left = row >= far && col < 7;
    top_left || top_right || bottom_left
}

/// Centered block of modules reserved for the logo, in modules per axis.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct HiddenArea {
    pub hide_x_dots: u32,
    pub hide_y_dots: u32,
}

impl HiddenArea {
    pub fn contains(&self, count: u32, row: u32, col: u32) -> bool {
        // Doubled to keep the half-module bounds of odd differences exact.
        let within = |index: u32, hide: u32| {
            let (index, count, hide) = (2 * i64::from(index), i64::from(count), i64::from(hide));
            index >= count - hide && index < count + hide
        };
        within(col, self.hide_x_dots) && within(row, self.hide_y_dots)
    }
}

/// Visibility rules for one render.
pub struct MaskPolicy<'a, M: ModuleMatrix + ?Sized> {
    matrix: &'a M,
    count: u32,
    /// Present only when modules under the logo are hidden.
    hidden: Option<HiddenArea>,
    draw_mask: bool,
    corners_mask: bool,
}

impl<'a, M: ModuleMatrix + ?Sized> MaskPolicy<'a, M> {
    pub fn new(
        matrix: &'a M,
        hidden: Option<HiddenArea>,
        draw_mask: bool,
        corners_mask: bool,
    ) -> Self {
        Self {
            count: matrix.module_count() as u32,
            matrix,
            hidden,
            draw_mask,
            corners_mask,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Decides one module.
    ///
    /// Logo suppression and finder exclusion are checked before darkness, so neither a dark
    /// dot nor a decorative dot is ever painted under the logo or over a finder.
    pub fn decide(&self, row: u32, col: u32) -> ModuleDecision {
        if self.hidden.map_or(false, |h| h.contains(self.count, row, col)) {
            return ModuleDecision::Suppressed;
        }
        if in_finder_stencil(self.count, row, col) {
            return ModuleDecision::Finder;
        }
        if self.matrix.is_dark(row as usize, col as usize) {
            return ModuleDecision::Dark;
        }
        if self.draw_mask && (self.corners_mask || !in_corner_region(self.count, row, col)) {
            return ModuleDecision::Decorative;
        }
        ModuleDecision::Light
    }

    /// `true` when the module at the given offset from `(row, col)` is drawn as a body dot.
    /// Offsets leaving the grid read as absent.
    pub fn is_drawn_neighbor(&self, row: u32, col: u32, row_offset: i32, col_offset: i32) -> bool {
        let r = i64::from(row) + i64::from(row_offset);
        let c = i64::from(col) + i64::from(col_offset);
        let count = i64::from(self.count);
        if r < 0 || c < 0 || r >= count || c >= count {
            return false;
        }
        self.decide(r as u32, c as u32) == ModuleDecision::Dark
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::BitMatrix;

    fn checkerboard(count: usize) -> BitMatrix {
        let rows: Vec<Vec<bool>> = (0..count)
            .map(|r| (0..count).map(|c| (r + c) % 2 == 0).collect())
            .collect();
        BitMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_anchor_positions() {
        assert_eq!(finder_anchors(21), [(0, 0), (0, 14), (14, 0)]);
    }

    #[test]
    fn test_stencils_cover_rings_and_centres_only() {
        assert!(in_finder_stencil(21, 0, 0));
        assert!(in_finder_stencil(21, 3, 3));
        assert!(!in_finder_stencil(21, 1, 1)); // light ring inside the finder
        assert!(in_finder_stencil(21, 0, 20));
        assert!(in_finder_stencil(21, 16, 2));
        assert!(!in_finder_stencil(21, 7, 7)); // separator
        assert!(!in_finder_stencil(21, 20, 20)); // no bottom-right finder
        assert!(!in_finder_stencil(21, 16, 16));
    }

    #[test]
    fn test_corner_region() {
        assert!(in_corner_region(21, 1, 1));
        assert!(in_corner_region(21, 6, 14));
        assert!(in_corner_region(21, 20, 6));
        assert!(!in_corner_region(21, 7, 0));
        assert!(!in_corner_region(21, 20, 20));
    }

    #[test]
    fn test_hidden_area_is_centered() {
        let area = HiddenArea { hide_x_dots: 5, hide_y_dots: 3 };
        // count 21: columns 8..13, rows 9..12
        assert!(area.contains(21, 10, 10));
        assert!(area.contains(21, 9, 8));
        assert!(area.contains(21, 11, 12));
        assert!(!area.contains(21, 8, 10));
        assert!(!area.contains(21, 12, 10));
        assert!(!area.contains(21, 10, 7));
        assert!(!area.contains(21, 10, 13));
        assert!(!HiddenArea::default().contains(21, 10, 10));
    }

    #[test]
    fn test_decision_priority() {
        let matrix = checkerboard(21);
        let hidden = HiddenArea { hide_x_dots: 5, hide_y_dots: 5 };
        let policy = MaskPolicy::new(&matrix, Some(hidden), true, false);
        assert_eq!(policy.decide(10, 10), ModuleDecision::Suppressed);
        assert_eq!(policy.decide(0, 0), ModuleDecision::Finder);
        assert_eq!(policy.decide(8, 8), ModuleDecision::Suppressed);
        assert_eq!(policy.decide(6, 8), ModuleDecision::Dark);
        assert_eq!(policy.decide(6, 9), ModuleDecision::Decorative);
        // Light cell inside a corner block with cornersMask off.
        assert_eq!(policy.decide(1, 2), ModuleDecision::Light);

        let policy = MaskPolicy::new(&matrix, None, false, true);
        assert_eq!(policy.decide(10, 10), ModuleDecision::Dark);
        assert_eq!(policy.decide(8, 9), ModuleDecision::Light);
    }

    #[test]
    fn test_policy_is_total_and_respects_corners_mask() {
        let matrix = checkerboard(25);
        for corners_mask in [false, true] {
            let policy = MaskPolicy::new(
                &matrix,
                Some(HiddenArea { hide_x_dots: 7, hide_y_dots: 5 }),
                true,
                corners_mask,
            );
            for row in 0..25 {
                for col in 0..25 {
                    let decision = policy.decide(row, col);
                    if !corners_mask && in_corner_region(25, row, col) {
                        assert_ne!(decision, ModuleDecision::Decorative);
                    }
                    if decision == ModuleDecision::Decorative {
                        assert!(!matrix.is_dark(row as usize, col as usize));
                    }
                    // Same inputs, same answer.
                    assert_eq!(decision, policy.decide(row, col));
                }
            }
        }
    }

    #[test]
    fn test_neighbors_ignore_suppressed_and_finder_modules() {
        let mut matrix = BitMatrix::new(21);
        for (r, c) in [(7, 7), (7, 8), (10, 10), (10, 11)] {
            matrix.set(r, c, true);
        }
        matrix.set(0, 0, true);
        let hidden = HiddenArea { hide_x_dots: 1, hide_y_dots: 1 };
        let policy = MaskPolicy::new(&matrix, Some(hidden), false, true);
        assert!(policy.is_drawn_neighbor(7, 7, 0, 1));
        assert!(!policy.is_drawn_neighbor(7, 7, -1, 0));
        // (10, 10) is hidden under the logo.
        assert!(!policy.is_drawn_neighbor(10, 11, 0, -1));
        // (0, 0) is a finder module.
        assert!(!policy.is_drawn_neighbor(1, 0, -1, 0));
        assert!(!policy.is_drawn_neighbor(0, 0, -1, 0));
    }
}
