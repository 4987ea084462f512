/// Fixtures shared by the unit tests.
use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::matrix::BitMatrix;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A `count` × `count` symbol with the three finder patterns, timing lines and a fixed
/// scatter of data modules.
pub fn finder_matrix(count: usize) -> BitMatrix {
    let mut matrix = BitMatrix::new(count);
    let far = count - 7;
    for (top, left) in [(0, 0), (0, far), (far, 0)] {
        for r in 0..7 {
            for c in 0..7 {
                let ring = r == 0 || r == 6 || c == 0 || c == 6;
                let centre = (2..5).contains(&r) && (2..5).contains(&c);
                matrix.set(top + r, left + c, ring || centre);
            }
        }
    }
    for i in 8..far - 1 {
        matrix.set(6, i, i % 2 == 0);
        matrix.set(i, 6, i % 2 == 0);
    }
    for row in 8..count {
        for col in 8..count {
            if (row * 3 + col * 5) % 7 < 3 {
                matrix.set(row, col, true);
            }
        }
    }
    matrix
}

/// A solid-colour PNG as a base64 data URI.
pub fn png_data_uri(width: u32, height: u32, rgba: [u8; 4]) -> String {
    let image = RgbaImage::from_pixel(width, height, Rgba(rgba));
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();
    format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(png))
}
