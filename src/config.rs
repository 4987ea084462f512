//! Styling configuration.
//!
//! [`StyleConfig`] is the whole external contract of the renderer. It deserializes from the
//! camelCase JSON options object used by browser QR stylers, and every field has a default so
//! a partial object is enough:
//!
//! ```rust
//! use qirust_style::config::StyleConfig;
//!
//! let config = StyleConfig::from_json(r##"{
//!     "width": 210,
//!     "height": 210,
//!     "dotsOptions": { "type": "rounded", "color": "#1b4d3e" },
//!     "qrOptions": { "errorCorrectionLevel": "H" }
//! }"##).unwrap();
//! assert_eq!(config.margin, 0);
//! assert_eq!(config.background_options.color.as_deref(), Some("#fff"));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{QrStyleError, Result};
use crate::matrix::ErrorCorrectionLevel;
use crate::shapes::{CornerDotType, CornerSquareType, DotType};

/// Fully-defaulted render configuration. Read-only for the duration of a render.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Minimum free space around the grid, in pixels.
    pub margin: u32,
    /// Logo drawn over the centre of the symbol (URL, path or data URI).
    pub image: Option<String>,
    pub qr_options: QrOptions,
    pub image_options: ImageOptions,
    pub dots_options: DotsOptions,
    /// Finder-pattern outer rings. Absent: drawn with body dots.
    pub corners_square_options: Option<CornersSquareOptions>,
    /// Finder-pattern inner squares. Absent: drawn with body dots.
    pub corners_dot_options: Option<CornersDotOptions>,
    pub background_options: BackgroundOptions,
    pub mask_options: MaskOptions,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
            margin: 0,
            image: None,
            qr_options: QrOptions::default(),
            image_options: ImageOptions::default(),
            dots_options: DotsOptions::default(),
            corners_square_options: None,
            corners_dot_options: None,
            background_options: BackgroundOptions::default(),
            mask_options: MaskOptions::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QrOptions {
    /// Level the matrix was encoded with; bounds how much a logo may hide.
    pub error_correction_level: ErrorCorrectionLevel,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageOptions {
    /// Embed the logo as a PNG data URI in vector output instead of linking its source.
    pub save_as_blob: bool,
    /// Skip modules that sit under the logo.
    pub hide_background_dots: bool,
    /// Share of the error-correction budget the logo may use, in `0..=1`.
    pub image_size: f64,
    /// Forwarded to the image loader.
    pub cross_origin: Option<String>,
    /// Pixels trimmed from each side of the logo rectangle.
    pub margin: u32,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            save_as_blob: false,
            hide_background_dots: true,
            image_size: 0.4,
            cross_origin: None,
            margin: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DotsOptions {
    #[serde(rename = "type")]
    pub kind: DotType,
    pub color: Option<String>,
    pub gradient: Option<Gradient>,
}

impl Default for DotsOptions {
    fn default() -> Self {
        Self {
            kind: DotType::Square,
            color: Some("#000".to_string()),
            gradient: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CornersSquareOptions {
    #[serde(rename = "type")]
    pub kind: Option<CornerSquareType>,
    pub color: Option<String>,
    pub gradient: Option<Gradient>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CornersDotOptions {
    #[serde(rename = "type")]
    pub kind: Option<CornerDotType>,
    pub color: Option<String>,
    pub gradient: Option<Gradient>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackgroundOptions {
    pub color: Option<String>,
    pub gradient: Option<Gradient>,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            color: Some("#fff".to_string()),
            gradient: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaskOptions {
    /// Paint light modules with decorative dots.
    pub draw_mask: bool,
    /// Decorative dot colour; `#fff` when absent.
    pub color: Option<String>,
    /// Decorative image placed behind the modules.
    pub image: Option<String>,
    /// Size of the decorative image relative to the grid.
    pub image_size: Option<f64>,
    /// Whether decorative dots may appear inside the finder corners.
    pub corners_mask: Option<bool>,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            draw_mask: false,
            color: None,
            image: None,
            image_size: Some(0.8),
            corners_mask: Some(true),
        }
    }
}

impl MaskOptions {
    pub fn dot_color(&self) -> &str {
        self.color.as_deref().unwrap_or("#fff")
    }

    pub fn corners_mask(&self) -> bool {
        self.corners_mask.unwrap_or(true)
    }

    pub fn image_size(&self) -> f64 {
        self.image_size.unwrap_or(1.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientType {
    Linear,
    Radial,
}

/// A gradient fill. Stops are applied in the order given.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gradient {
    #[serde(rename = "type")]
    pub kind: GradientType,
    /// Radians, clockwise on screen. Linear gradients only.
    #[serde(default)]
    pub rotation: Option<f64>,
    pub color_stops: Vec<ColorStop>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f64,
    pub color: String,
}

/// Where a styled area takes its paint from.
///
/// A gradient wins over a colour when both are set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillSpec<'a> {
    pub color: Option<&'a str>,
    pub gradient: Option<&'a Gradient>,
}

impl<'a> FillSpec<'a> {
    pub fn new(color: Option<&'a str>, gradient: Option<&'a Gradient>) -> Self {
        Self { color, gradient }
    }

    pub fn solid(color: &'a str) -> Self {
        Self { color: Some(color), gradient: None }
    }

    /// `true` when the area has its own paint.
    pub fn is_styled(&self) -> bool {
        self.color.is_some() || self.gradient.is_some()
    }
}

impl DotsOptions {
    pub fn fill(&self) -> FillSpec<'_> {
        FillSpec::new(self.color.as_deref(), self.gradient.as_ref())
    }
}

impl CornersSquareOptions {
    pub fn fill(&self) -> FillSpec<'_> {
        FillSpec::new(self.color.as_deref(), self.gradient.as_ref())
    }
}

impl CornersDotOptions {
    pub fn fill(&self) -> FillSpec<'_> {
        FillSpec::new(self.color.as_deref(), self.gradient.as_ref())
    }
}

impl BackgroundOptions {
    pub fn fill(&self) -> FillSpec<'_> {
        FillSpec::new(self.color.as_deref(), self.gradient.as_ref())
    }
}

impl StyleConfig {
    /// Parses and validates a JSON options object.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: StyleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks everything that can be checked before drawing.
    ///
    /// Shape tags are already typed by the time a config exists, so what remains is colour
    /// syntax, gradient stops and numeric ranges.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(QrStyleError::Configuration(format!(
                "canvas must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }

        let image_size = self.image_options.image_size;
        if !(0.0..=1.0).contains(&image_size) {
            return Err(QrStyleError::Configuration(format!(
                "imageOptions.imageSize must be within 0..=1, got {}",
                image_size
            )));
        }
        if let Some(size) = self.mask_options.image_size {
            if !size.is_finite() || size < 0.0 {
                return Err(QrStyleError::Configuration(format!(
                    "maskOptions.imageSize must be a non-negative number, got {}",
                    size
                )));
            }
        }

        validate_fill("dotsOptions", self.dots_options.fill())?;
        validate_fill("backgroundOptions", self.background_options.fill())?;
        if let Some(options) = &self.corners_square_options {
            validate_fill("cornersSquareOptions", options.fill())?;
        }
        if let Some(options) = &self.corners_dot_options {
            validate_fill("cornersDotOptions", options.fill())?;
        }
        if let Some(color) = &self.mask_options.color {
            parse_color(color).map_err(|e| prefix("maskOptions.color", e))?;
        }
        Ok(())
    }
}

fn validate_fill(area: &str, fill: FillSpec<'_>) -> Result<()> {
    if let Some(color) = fill.color {
        parse_color(color).map_err(|e| prefix(&format!("{}.color", area), e))?;
    }
    if let Some(gradient) = fill.gradient {
        if gradient.color_stops.is_empty() {
            return Err(QrStyleError::Configuration(format!(
                "{}.gradient has no color stops",
                area
            )));
        }
        if let Some(rotation) = gradient.rotation {
            if !rotation.is_finite() {
                return Err(QrStyleError::Configuration(format!(
                    "{}.gradient.rotation is not finite",
                    area
                )));
            }
        }
        for stop in &gradient.color_stops {
            if !(0.0..=1.0).contains(&stop.offset) {
                return Err(QrStyleError::Configuration(format!(
                    "{}.gradient stop offset {} is outside 0..=1",
                    area, stop.offset
                )));
            }
            parse_color(&stop.color).map_err(|e| prefix(&format!("{}.gradient", area), e))?;
        }
    }
    Ok(())
}

fn prefix(area: &str, err: QrStyleError) -> QrStyleError {
    match err {
        QrStyleError::Configuration(msg) => QrStyleError::Configuration(format!("{}: {}", area, msg)),
        other => other,
    }
}

/// An 8-bit straight-alpha colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

const NAMED_COLORS: &[(&str, Color)] = &[
    ("aliceblue", Color::rgba(240, 248, 255, 255)),
    ("antiquewhite", Color::rgba(250, 235, 215, 255)),
    ("aqua", Color::rgba(0, 255, 255, 255)),
    ("aquamarine", Color::rgba(127, 255, 212, 255)),
    ("azure", Color::rgba(240, 255, 255, 255)),
    ("beige", Color::rgba(245, 245, 220, 255)),
    ("bisque", Color::rgba(255, 228, 196, 255)),
    ("black", Color::rgba(0, 0, 0, 255)),
    ("blanchedalmond", Color::rgba(255, 235, 205, 255)),
    ("blue", Color::rgba(0, 0, 255, 255)),
    ("blueviolet", Color::rgba(138, 43, 226, 255)),
    ("brown", Color::rgba(165, 42, 42, 255)),
    ("burlywood", Color::rgba(222, 184, 135, 255)),
    ("cadetblue", Color::rgba(95, 158, 160, 255)),
    ("chartreuse", Color::rgba(127, 255, 0, 255)),
    ("chocolate", Color::rgba(210, 105, 30, 255)),
    ("coral", Color::rgba(255, 127, 80, 255)),
    ("cornflowerblue", Color::rgba(100, 149, 237, 255)),
    ("cornsilk", Color::rgba(255, 248, 220, 255)),
    ("crimson", Color::rgba(220, 20, 60, 255)),
    ("cyan", Color::rgba(0, 255, 255, 255)),
    ("darkblue", Color::rgba(0, 0, 139, 255)),
    ("darkcyan", Color::rgba(0, 139, 139, 255)),
    ("darkgoldenrod", Color::rgba(184, 134, 11, 255)),
    ("darkgray", Color::rgba(169, 169, 169, 255)),
    ("darkgreen", Color::rgba(0, 100, 0, 255)),
    ("darkgrey", Color::rgba(169, 169, 169, 255)),
    ("darkkhaki", Color::rgba(189, 183, 107, 255)),
    ("darkmagenta", Color::rgba(139, 0, 139, 255)),
    ("darkolivegreen", Color::rgba(85, 107, 47, 255)),
    ("darkorange", Color::rgba(255, 140, 0, 255)),
    ("darkorchid", Color::rgba(153, 50, 204, 255)),
    ("darkred", Color::rgba(139, 0, 0, 255)),
    ("darksalmon", Color::rgba(233, 150, 122, 255)),
    ("darkseagreen", Color::rgba(143, 188, 143, 255)),
    ("darkslateblue", Color::rgba(72, 61, 139, 255)),
    ("darkslategray", Color::rgba(47, 79, 79, 255)),
    ("darkslategrey", Color::rgba(47, 79, 79, 255)),
    ("darkturquoise", Color::rgba(0, 206, 209, 255)),
    ("darkviolet", Color::rgba(148, 0, 211, 255)),
    ("deeppink", Color::rgba(255, 20, 147, 255)),
    ("deepskyblue", Color::rgba(0, 191, 255, 255)),
    ("dimgray", Color::rgba(105, 105, 105, 255)),
    ("dimgrey", Color::rgba(105, 105, 105, 255)),
    ("dodgerblue", Color::rgba(30, 144, 255, 255)),
    ("firebrick", Color::rgba(178, 34, 34, 255)),
    ("floralwhite", Color::rgba(255, 250, 240, 255)),
    ("forestgreen", Color::rgba(34, 139, 34, 255)),
    ("fuchsia", Color::rgba(255, 0, 255, 255)),
    ("gainsboro", Color::rgba(220, 220, 220, 255)),
    ("ghostwhite", Color::rgba(248, 248, 255, 255)),
    ("gold", Color::rgba(255, 215, 0, 255)),
    ("goldenrod", Color::rgba(218, 165, 32, 255)),
    ("gray", Color::rgba(128, 128, 128, 255)),
    ("green", Color::rgba(0, 128, 0, 255)),
    ("greenyellow", Color::rgba(173, 255, 47, 255)),
    ("grey", Color::rgba(128, 128, 128, 255)),
    ("honeydew", Color::rgba(240, 255, 240, 255)),
    ("hotpink", Color::rgba(255, 105, 180, 255)),
    ("indianred", Color::rgba(205, 92, 92, 255)),
    ("indigo", Color::rgba(75, 0, 130, 255)),
    ("ivory", Color::rgba(255, 255, 240, 255)),
    ("khaki", Color::rgba(240, 230, 140, 255)),
    ("lavender", Color::rgba(230, 230, 250, 255)),
    ("lavenderblush", Color::rgba(255, 240, 245, 255)),
    ("lawngreen", Color::rgba(124, 252, 0, 255)),
    ("lemonchiffon", Color::rgba(255, 250, 205, 255)),
    ("lightblue", Color::rgba(173, 216, 230, 255)),
    ("lightcoral", Color::rgba(240, 128, 128, 255)),
    ("lightcyan", Color::rgba(224, 255, 255, 255)),
    ("lightgoldenrodyellow", Color::rgba(250, 250, 210, 255)),
    ("lightgray", Color::rgba(211, 211, 211, 255)),
    ("lightgreen", Color::rgba(144, 238, 144, 255)),
    ("lightgrey", Color::rgba(211, 211, 211, 255)),
    ("lightpink", Color::rgba(255, 182, 193, 255)),
    ("lightsalmon", Color::rgba(255, 160, 122, 255)),
    ("lightseagreen", Color::rgba(32, 178, 170, 255)),
    ("lightskyblue", Color::rgba(135, 206, 250, 255)),
    ("lightslategray", Color::rgba(119, 136, 153, 255)),
    ("lightslategrey", Color::rgba(119, 136, 153, 255)),
    ("lightsteelblue", Color::rgba(176, 196, 222, 255)),
    ("lightyellow", Color::rgba(255, 255, 224, 255)),
    ("lime", Color::rgba(0, 255, 0, 255)),
    ("limegreen", Color::rgba(50, 205, 50, 255)),
    ("linen", Color::rgba(250, 240, 230, 255)),
    ("magenta", Color::rgba(255, 0, 255, 255)),
    ("maroon", Color::rgba(128, 0, 0, 255)),
    ("mediumaquamarine", Color::rgba(102, 205, 170, 255)),
    ("mediumblue", Color::rgba(0, 0, 205, 255)),
    ("mediumorchid", Color::rgba(186, 85, 211, 255)),
    ("mediumpurple", Color::rgba(147, 112, 219, 255)),
    ("mediumseagreen", Color::rgba(60, 179, 113, 255)),
    ("mediumslateblue", Color::rgba(123, 104, 238, 255)),
    ("mediumspringgreen", Color::rgba(0, 250, 154, 255)),
    ("mediumturquoise", Color::rgba(72, 209, 204, 255)),
    ("mediumvioletred", Color::rgba(199, 21, 133, 255)),
    ("midnightblue", Color::rgba(25, 25, 112, 255)),
    ("mintcream", Color::rgba(245, 255, 250, 255)),
    ("mistyrose", Color::rgba(255, 228, 225, 255)),
    ("moccasin", Color::rgba(255, 228, 181, 255)),
    ("navajowhite", Color::rgba(255, 222, 173, 255)),
    ("navy", Color::rgba(0, 0, 128, 255)),
    ("oldlace", Color::rgba(253, 245, 230, 255)),
    ("olive", Color::rgba(128, 128, 0, 255)),
    ("olivedrab", Color::rgba(107, 142, 35, 255)),
    ("orange", Color::rgba(255, 165, 0, 255)),
    ("orangered", Color::rgba(255, 69, 0, 255)),
    ("orchid", Color::rgba(218, 112, 214, 255)),
    ("palegoldenrod", Color::rgba(238, 232, 170, 255)),
    ("palegreen", Color::rgba(152, 251, 152, 255)),
    ("paleturquoise", Color::rgba(175, 238, 238, 255)),
    ("palevioletred", Color::rgba(219, 112, 147, 255)),
    ("papayawhip", Color::rgba(255, 239, 213, 255)),
    ("peachpuff", Color::rgba(255, 218, 185, 255)),
    ("peru", Color::rgba(205, 133, 63, 255)),
    ("pink", Color::rgba(255, 192, 203, 255)),
    ("plum", Color::rgba(221, 160, 221, 255)),
    ("powderblue", Color::rgba(176, 224, 230, 255)),
    ("purple", Color::rgba(128, 0, 128, 255)),
    ("rebeccapurple", Color::rgba(102, 51, 153, 255)),
    ("red", Color::rgba(255, 0, 0, 255)),
    ("rosybrown", Color::rgba(188, 143, 143, 255)),
    ("royalblue", Color::rgba(65, 105, 225, 255)),
    ("saddlebrown", Color::rgba(139, 69, 19, 255)),
    ("salmon", Color::rgba(250, 128, 114, 255)),
    ("sandybrown", Color::rgba(244, 164, 96, 255)),
    ("seagreen", Color::rgba(46, 139, 87, 255)),
    ("seashell", Color::rgba(255, 245, 238, 255)),
    ("sienna", Color::rgba(160, 82, 45, 255)),
    ("silver", Color::rgba(192, 192, 192, 255)),
    ("skyblue", Color::rgba(135, 206, 235, 255)),
    ("slateblue", Color::rgba(106, 90, 205, 255)),
    ("slategray", Color::rgba(112, 128, 144, 255)),
    ("slategrey", Color::rgba(112, 128, 144, 255)),
    ("snow", Color::rgba(255, 250, 250, 255)),
    ("springgreen", Color::rgba(0, 255, 127, 255)),
    ("steelblue", Color::rgba(70, 130, 180, 255)),
    ("tan", Color::rgba(210, 180, 140, 255)),
    ("teal", Color::rgba(0, 128, 128, 255)),
    ("thistle", Color::rgba(216, 191, 216, 255)),
    ("tomato", Color::rgba(255, 99, 71, 255)),
    ("turquoise", Color::rgba(64, 224, 208, 255)),
    ("violet", Color::rgba(238, 130, 238, 255)),
    ("wheat", Color::rgba(245, 222, 179, 255)),
    ("white", Color::rgba(255, 255, 255, 255)),
    ("whitesmoke", Color::rgba(245, 245, 245, 255)),
    ("yellow", Color::rgba(255, 255, 0, 255)),
    ("yellowgreen", Color::rgba(154, 205, 50, 255)),
    ("transparent", Color::rgba(0, 0, 0, 0)),
];

/// Parses the colour syntaxes accepted in configuration.
///
/// Supports `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`/`rgba()` and `hsl()`/`hsla()` in
/// both the comma and the space-separated (`/ alpha`) forms, the CSS named colours and
/// `transparent`. Channels are `0..=255` or percentages; alpha is `0..=1` or a percentage.
pub fn parse_color(input: &str) -> Result<Color> {
    let s = input.trim();
    let invalid = || QrStyleError::Configuration(format!("invalid color {:?}", input));

    if let Some(hex) = s.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        return match hex.len() {
            3 => Ok(Color::rgba(
                nibble(0).map_err(|_| invalid())?,
                nibble(1).map_err(|_| invalid())?,
                nibble(2).map_err(|_| invalid())?,
                255,
            )),
            4 => Ok(Color::rgba(
                nibble(0).map_err(|_| invalid())?,
                nibble(1).map_err(|_| invalid())?,
                nibble(2).map_err(|_| invalid())?,
                nibble(3).map_err(|_| invalid())?,
            )),
            6 => Ok(Color::rgba(
                byte(0).map_err(|_| invalid())?,
                byte(2).map_err(|_| invalid())?,
                byte(4).map_err(|_| invalid())?,
                255,
            )),
            8 => Ok(Color::rgba(
                byte(0).map_err(|_| invalid())?,
                byte(2).map_err(|_| invalid())?,
                byte(4).map_err(|_| invalid())?,
                byte(6).map_err(|_| invalid())?,
            )),
            _ => Err(invalid()),
        };
    }

    let lower = s.to_ascii_lowercase();
    if let Some((name, args)) = function_args(&lower) {
        if args.len() != 3 && args.len() != 4 {
            return Err(invalid());
        }
        let alpha = match args.get(3) {
            Some(a) => parse_alpha(a).ok_or_else(invalid)?,
            None => 255,
        };
        return match name {
            "rgb" | "rgba" => Ok(Color::rgba(
                parse_channel(args[0]).ok_or_else(invalid)?,
                parse_channel(args[1]).ok_or_else(invalid)?,
                parse_channel(args[2]).ok_or_else(invalid)?,
                alpha,
            )),
            "hsl" | "hsla" => {
                let hue: f64 = args[0]
                    .strip_suffix("deg")
                    .unwrap_or(args[0])
                    .parse()
                    .map_err(|_| invalid())?;
                let saturation = parse_percentage(args[1]).ok_or_else(invalid)?;
                let lightness = parse_percentage(args[2]).ok_or_else(invalid)?;
                let (r, g, b) = hsl_to_rgb(hue, saturation, lightness);
                Ok(Color::rgba(r, g, b, alpha))
            }
            _ => Err(invalid()),
        };
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, color)| *color)
        .ok_or_else(invalid)
}

/// Splits `name(a, b, c[, d])` or `name(a b c[ / d])` into its name and arguments.
fn function_args(s: &str) -> Option<(&str, Vec<&str>)> {
    let (name, rest) = s.split_once('(')?;
    let inner = rest.strip_suffix(')')?;
    let (main, alpha) = match inner.split_once('/') {
        Some((main, alpha)) => (main, Some(alpha.trim())),
        None => (inner, None),
    };
    let mut args: Vec<&str> = if main.contains(',') {
        main.split(',').map(str::trim).collect()
    } else {
        main.split_whitespace().collect()
    };
    if let Some(alpha) = alpha {
        if args.len() != 3 || main.contains(',') {
            return None;
        }
        args.push(alpha);
    }
    Some((name.trim(), args))
}

/// `0..=255`, or a percentage of 255.
fn parse_channel(s: &str) -> Option<u8> {
    match s.strip_suffix('%') {
        Some(percent) => {
            let percent: f64 = percent.parse().ok()?;
            (0.0..=100.0)
                .contains(&percent)
                .then(|| (percent / 100.0 * 255.0).round() as u8)
        }
        None => s.parse::<u8>().ok(),
    }
}

fn parse_alpha(s: &str) -> Option<u8> {
    let alpha = match s.strip_suffix('%') {
        Some(percent) => percent.parse::<f64>().ok()? / 100.0,
        None => s.parse::<f64>().ok()?,
    };
    (0.0..=1.0).contains(&alpha).then(|| (alpha * 255.0).round() as u8)
}

/// A percentage as a fraction in `0..=1`.
fn parse_percentage(s: &str) -> Option<f64> {
    let percent: f64 = s.strip_suffix('%')?.parse().ok()?;
    (0.0..=100.0).contains(&percent).then(|| percent / 100.0)
}

fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (u8, u8, u8) {
    let h = hue.rem_euclid(360.0) / 360.0;
    if saturation == 0.0 {
        let v = (lightness * 255.0).round() as u8;
        return (v, v, v);
    }
    let q = if lightness < 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let p = 2.0 * lightness - q;
    let channel = |t: f64| {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round() as u8
    };
    (channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = StyleConfig::default();
        assert_eq!((config.width, config.height, config.margin), (300, 300, 0));
        assert_eq!(config.dots_options.kind, DotType::Square);
        assert_eq!(config.dots_options.color.as_deref(), Some("#000"));
        assert_eq!(config.background_options.color.as_deref(), Some("#fff"));
        assert_eq!(config.qr_options.error_correction_level, ErrorCorrectionLevel::Quartile);
        assert!(config.image_options.hide_background_dots);
        assert_eq!(config.image_options.image_size, 0.4);
        assert!(!config.mask_options.draw_mask);
        assert!(config.mask_options.corners_mask());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = StyleConfig::from_json(
            r##"{
                "width": 400,
                "image": "logo.png",
                "imageOptions": { "imageSize": 0.3, "margin": 4 },
                "cornersSquareOptions": { "type": "extra-rounded", "color": "#ff0000" },
                "dotsOptions": {
                    "type": "classy-rounded",
                    "gradient": {
                        "type": "linear",
                        "rotation": 0.785,
                        "colorStops": [
                            { "offset": 0, "color": "#000" },
                            { "offset": 1, "color": "rgba(0, 0, 255, 0.5)" }
                        ]
                    }
                }
            }"##,
        )
        .unwrap();
        assert_eq!(config.width, 400);
        assert_eq!(config.height, 300);
        assert!(config.image_options.hide_background_dots);
        assert_eq!(config.image_options.margin, 4);
        assert_eq!(config.dots_options.kind, DotType::ClassyRounded);
        // Partial dotsOptions keep the default colour alongside the gradient.
        assert_eq!(config.dots_options.color.as_deref(), Some("#000"));
        let corners = config.corners_square_options.unwrap();
        assert_eq!(corners.kind, Some(CornerSquareType::ExtraRounded));
        assert!(config.corners_dot_options.is_none());
    }

    #[test]
    fn test_unknown_dot_type_is_configuration_error() {
        let err = StyleConfig::from_json(r#"{ "dotsOptions": { "type": "hexagon" } }"#).unwrap_err();
        assert!(matches!(err, QrStyleError::Configuration(_)));
    }

    #[test]
    fn test_tags_outside_the_registry_are_rejected() {
        for json in [
            r#"{ "dotsOptions": { "type": "gear" } }"#,
            r#"{ "dotsOptions": { "type": "dots-horizontal" } }"#,
            r#"{ "cornersSquareOptions": { "type": "heart" } }"#,
            r#"{ "cornersDotOptions": { "type": "star" } }"#,
        ] {
            let err = StyleConfig::from_json(json).unwrap_err();
            assert!(matches!(err, QrStyleError::Configuration(_)), "{}", json);
        }
        assert!(StyleConfig::from_json(r#"{ "cornersDotOptions": { "type": "rhombus" } }"#).is_ok());
    }

    #[test]
    fn test_gradient_without_stops_is_rejected() {
        let err = StyleConfig::from_json(
            r#"{ "backgroundOptions": { "gradient": { "type": "radial", "colorStops": [] } } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no color stops"));
    }

    #[test]
    fn test_bad_color_is_rejected() {
        let mut config = StyleConfig::default();
        config.dots_options.color = Some("#12345".to_string());
        assert!(matches!(config.validate(), Err(QrStyleError::Configuration(_))));
    }

    #[test]
    fn test_image_size_range() {
        let mut config = StyleConfig::default();
        config.image_options.image_size = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_color_forms() {
        assert_eq!(parse_color("#000").unwrap(), Color::rgba(0, 0, 0, 255));
        assert_eq!(parse_color("#fff8").unwrap(), Color::rgba(255, 255, 255, 136));
        assert_eq!(parse_color("#1B4D3E").unwrap(), Color::rgba(27, 77, 62, 255));
        assert_eq!(parse_color("#ff000080").unwrap(), Color::rgba(255, 0, 0, 128));
        assert_eq!(parse_color("rgb(1, 2, 3)").unwrap(), Color::rgba(1, 2, 3, 255));
        assert_eq!(parse_color("RGBA(1,2,3,0)").unwrap(), Color::rgba(1, 2, 3, 0));
        assert_eq!(parse_color("transparent").unwrap().a, 0);
        assert!(parse_color("#ggg").is_err());
        assert!(parse_color("rgb(300, 0, 0)").is_err());
        assert!(parse_color("chartreuse-ish").is_err());
    }

    #[test]
    fn test_parse_css_colors() {
        assert_eq!(parse_color("navy").unwrap(), Color::rgba(0, 0, 128, 255));
        assert_eq!(parse_color("Teal").unwrap(), Color::rgba(0, 128, 128, 255));
        assert_eq!(parse_color("rebeccapurple").unwrap(), Color::rgba(102, 51, 153, 255));
        assert_eq!(parse_color("hsl(120, 100%, 50%)").unwrap(), Color::rgba(0, 255, 0, 255));
        assert_eq!(parse_color("hsla(0, 100%, 50%, 0.5)").unwrap(), Color::rgba(255, 0, 0, 128));
        assert_eq!(parse_color("hsl(240deg 100% 25%)").unwrap(), Color::rgba(0, 0, 128, 255));
        assert_eq!(parse_color("rgb(0 0 0)").unwrap(), Color::rgba(0, 0, 0, 255));
        assert_eq!(parse_color("rgb(255 0 0 / 50%)").unwrap(), Color::rgba(255, 0, 0, 128));
        assert_eq!(parse_color("rgb(100%, 0%, 50%)").unwrap(), Color::rgba(255, 0, 128, 255));
        assert!(parse_color("hsl(120, 100, 50)").is_err());
        assert!(parse_color("rgb(1, 2, 3 / 0.5)").is_err());
        assert!(parse_color("cmyk(0, 0, 0, 0)").is_err());
    }

    #[test]
    fn test_gradient_wins_is_styled() {
        let gradient = Gradient {
            kind: GradientType::Radial,
            rotation: None,
            color_stops: vec![ColorStop { offset: 0.0, color: "#000".into() }],
        };
        let fill = FillSpec::new(Some("#fff"), Some(&gradient));
        assert!(fill.is_styled());
        assert!(!FillSpec::new(None, None).is_styled());
    }
}
