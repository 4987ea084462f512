//! Fill resolution.
//!
//! Turns a configured colour or gradient plus the rectangle it must cover into a
//! [`FillDescriptor`] with concrete geometry. Backends only interpret descriptors; no backend
//! recomputes gradient axes.

use std::f64::consts::PI;

use crate::config::{parse_color, Color, FillSpec, GradientType};
use crate::error::Result;
use crate::layout::DrawRegion;

/// A colour as configured plus its parsed value.
#[derive(Clone, PartialEq, Debug)]
pub struct ResolvedColor {
    /// Text emitted into vector output.
    pub css: String,
    pub rgba: Color,
}

impl ResolvedColor {
    pub fn parse(css: &str) -> Result<Self> {
        Ok(Self {
            css: css.to_string(),
            rgba: parse_color(css)?,
        })
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct ResolvedStop {
    pub offset: f32,
    pub color: ResolvedColor,
}

/// Paint for one styled area, in absolute canvas coordinates.
#[derive(Clone, PartialEq, Debug)]
pub enum FillDescriptor {
    /// Nothing is painted.
    Transparent,
    Solid(ResolvedColor),
    Linear {
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        stops: Vec<ResolvedStop>,
    },
    Radial {
        cx: f32,
        cy: f32,
        radius: f32,
        stops: Vec<ResolvedStop>,
    },
}

/// Resolves the paint for `region`.
///
/// `additional_rotation` is added to the gradient's own rotation so one configured gradient
/// can be turned with each finder corner. A gradient takes precedence over a colour; with
/// neither, the area is transparent.
pub fn resolve_fill(
    region: DrawRegion,
    fill: FillSpec<'_>,
    additional_rotation: f64,
) -> Result<FillDescriptor> {
    let Some(gradient) = fill.gradient else {
        return Ok(match fill.color {
            Some(color) => FillDescriptor::Solid(ResolvedColor::parse(color)?),
            None => FillDescriptor::Transparent,
        });
    };

    let stops = gradient
        .color_stops
        .iter()
        .map(|stop| {
            Ok(ResolvedStop {
                offset: stop.offset as f32,
                color: ResolvedColor::parse(&stop.color)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let (cx, cy) = region.center();
    Ok(match gradient.kind {
        GradientType::Radial => FillDescriptor::Radial {
            cx,
            cy,
            radius: region.width.max(region.height) / 2.0,
            stops,
        },
        GradientType::Linear => {
            let rotation = gradient.rotation.unwrap_or(0.0) + additional_rotation;
            let (x0, y0, x1, y1) = linear_axis(region, rotation);
            FillDescriptor::Linear { x0, y0, x1, y1, stops }
        }
    })
}

/// Endpoints of a linear gradient axis through the centre of `region` at `rotation`.
///
/// The angle is folded into one of four quarter-turn sectors centred on the axes. In the
/// horizontal sectors the axis spans the full width and leans by `tan`; in the vertical
/// sectors it spans the full height and leans by `1 / tan`.
pub fn linear_axis(region: DrawRegion, rotation: f64) -> (f32, f32, f32, f32) {
    let rotation = rotation % (2.0 * PI);
    let positive = (rotation + 2.0 * PI) % (2.0 * PI);

    let (cx, cy) = region.center();
    let (cx, cy) = (f64::from(cx), f64::from(cy));
    let half_w = f64::from(region.width) / 2.0;
    let half_h = f64::from(region.height) / 2.0;
    let tan = rotation.tan();

    let (x0, y0, x1, y1) = if positive <= 0.25 * PI || positive > 1.75 * PI {
        (cx - half_w, cy - half_h * tan, cx + half_w, cy + half_h * tan)
    } else if positive <= 0.75 * PI {
        (cx - half_w / tan, cy - half_h, cx + half_w / tan, cy + half_h)
    } else if positive <= 1.25 * PI {
        (cx + half_w, cy + half_h * tan, cx - half_w, cy - half_h * tan)
    } else {
        (cx + half_w / tan, cy + half_h, cx - half_w / tan, cy - half_h)
    };
    (x0 as f32, y0 as f32, x1 as f32, y1 as f32)
}
