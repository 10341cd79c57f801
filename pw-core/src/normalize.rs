//! Coordinate normalization into render space
//!
//! Driver positions and the track outline share one linear scale so that
//! markers sit on the drawn track. Render space is `[10, 90] x [10, 90]`
//! (percent of viewport with a fixed 10% margin).
//!
//! A raw coordinate of exactly zero is treated as "no position reported" and
//! excluded, as are NaN and infinities.
//!
//! The scale is pooled per axis: a driver with a usable x but no usable y
//! still contributes its x to the range, but only drivers valid on both axes
//! get a marker.

use crate::model::TrackPoint;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

pub const RENDER_MIN: f64 = 10.0;
pub const RENDER_MAX: f64 = 90.0;
const RENDER_SPAN: f64 = RENDER_MAX - RENDER_MIN;
const RENDER_MID: f64 = (RENDER_MIN + RENDER_MAX) / 2.0;

/// A point in render space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

/// A labelled raw position to place on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverPosition {
    pub label: String,
    pub position: u32,
    /// Strategy-adjusted estimate rather than a measured position
    pub ghost: bool,
    pub raw: TrackPoint,
}

/// A driver placed in render space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverMarker {
    pub label: String,
    pub position: u32,
    pub ghost: bool,
    pub point: NormalizedPoint,
}

/// Closed track outline in render space; the first point is repeated last
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackPath {
    pub points: Vec<NormalizedPoint>,
}

impl TrackPath {
    /// SVG path data (`M x y L x y ... Z`)
    pub fn to_svg_path(&self) -> String {
        let mut d = String::new();
        for (i, p) in self.points.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{}{} {:.2} {:.2}", if i == 0 { "" } else { " " }, cmd, p.x, p.y);
        }
        if !d.is_empty() {
            d.push_str(" Z");
        }
        d
    }

    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => self.points.len() > 1 && first == last,
            _ => false,
        }
    }
}

/// Everything the track map needs, in render space
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub drivers: Vec<DriverMarker>,
    pub track: Option<TrackPath>,
}

impl RenderFrame {
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty() && self.track.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisRange {
    min: f64,
    max: f64,
}

impl AxisRange {
    fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| {
            Some(match acc {
                None => AxisRange { min: v, max: v },
                Some(r) => AxisRange {
                    min: r.min.min(v),
                    max: r.max.max(v),
                },
            })
        })
    }

    /// Zero-width ranges collapse to the midpoint of render space
    fn map(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return RENDER_MID;
        }
        ((v - self.min) / span * RENDER_SPAN + RENDER_MIN).clamp(RENDER_MIN, RENDER_MAX)
    }
}

fn is_valid(v: f64) -> bool {
    v.is_finite() && v != 0.0
}

/// Whether `p` carries a reported position on both axes
pub fn is_valid_point(p: &TrackPoint) -> bool {
    is_valid(p.x) && is_valid(p.y)
}

/// Map driver positions and an optional track outline into render space.
///
/// Returns an empty frame when either axis has no usable values.
pub fn normalize(drivers: &[DriverPosition], track: Option<&[TrackPoint]>) -> RenderFrame {
    let outline = track.unwrap_or(&[]);

    // Outline values go into the pool first, then driver values
    let xs = outline
        .iter()
        .map(|p| p.x)
        .chain(drivers.iter().map(|d| d.raw.x))
        .filter(|v| is_valid(*v));
    let ys = outline
        .iter()
        .map(|p| p.y)
        .chain(drivers.iter().map(|d| d.raw.y))
        .filter(|v| is_valid(*v));

    let (Some(x_range), Some(y_range)) = (AxisRange::from_values(xs), AxisRange::from_values(ys))
    else {
        return RenderFrame::default();
    };

    let project = |p: &TrackPoint| NormalizedPoint {
        x: x_range.map(p.x),
        y: y_range.map(p.y),
    };

    let markers = drivers
        .iter()
        .filter(|d| is_valid_point(&d.raw))
        .map(|d| DriverMarker {
            label: d.label.clone(),
            position: d.position,
            ghost: d.ghost,
            point: project(&d.raw),
        })
        .collect();

    let mut path: Vec<NormalizedPoint> = outline.iter().filter(|p| is_valid_point(p)).map(project).collect();
    if let Some(&first) = path.first() {
        if path.len() == 1 || path.last() != Some(&first) {
            path.push(first);
        }
    }

    RenderFrame {
        drivers: markers,
        track: if path.is_empty() {
            None
        } else {
            Some(TrackPath { points: path })
        },
    }
}
