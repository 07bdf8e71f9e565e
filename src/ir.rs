// Geometry IR: the pixel-space output of every layout algorithm.
//
// Layouts produce a `Geometry`; views hit-test it; the renderer draws it.
// Nothing here knows about plotters.

use crate::data::Record;
use crate::palette::Rgb;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

pub type PrimitiveId = usize;

/// Pointer tolerance in pixels for line-like shapes.
const STROKE_HIT_TOLERANCE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 60.0,
            right: 40.0,
            bottom: 80.0,
            left: 80.0,
        }
    }
}

/// Outer size of the drawing surface plus the margins around the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
}

impl Frame {
    pub fn new(width: f64, height: f64, margin: Margin) -> Self {
        Self { width, height, margin }
    }

    pub fn inner_width(&self) -> f64 {
        (self.width - self.margin.left - self.margin.right).max(0.0)
    }

    pub fn inner_height(&self) -> f64 {
        (self.height - self.margin.top - self.margin.bottom).max(0.0)
    }

    /// Left-to-right pixel range of the plot area.
    pub fn x_range(&self) -> (f64, f64) {
        (self.margin.left, self.margin.left + self.inner_width())
    }

    /// Bottom-to-top pixel range of the plot area (pixel y grows downward).
    pub fn y_range(&self) -> (f64, f64) {
        (self.margin.top + self.inner_height(), self.margin.top)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.margin.left + self.inner_width() / 2.0,
            self.margin.top + self.inner_height() / 2.0,
        )
    }

    /// Largest circle radius that fits in the plot area.
    pub fn radius(&self) -> f64 {
        self.inner_width().min(self.inner_height()) / 2.0
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new(800.0, 500.0, Margin::default())
    }
}

/// Drawable shape in pixel coordinates.
///
/// Arc angles are in radians, measured clockwise from twelve o'clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Arc {
        cx: f64,
        cy: f64,
        start_angle: f64,
        end_angle: f64,
        inner_radius: f64,
        outer_radius: f64,
    },
    Polygon {
        points: Vec<(f64, f64)>,
    },
    Polyline {
        points: Vec<(f64, f64)>,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
}

impl Shape {
    /// Rectangle from two corners in any order.
    pub fn rect_between(x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        Shape::Rect {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        match self {
            Shape::Rect { x, y, width, height } => {
                px >= *x && px <= x + width && py >= *y && py <= y + height
            }
            Shape::Circle { cx, cy, r } => (px - cx).hypot(py - cy) <= *r,
            Shape::Arc {
                cx,
                cy,
                start_angle,
                end_angle,
                inner_radius,
                outer_radius,
            } => {
                if end_angle <= start_angle {
                    return false;
                }
                let (dx, dy) = (px - cx, py - cy);
                let dist = dx.hypot(dy);
                if dist < *inner_radius || dist > *outer_radius {
                    return false;
                }
                let angle = dx.atan2(-dy).rem_euclid(TAU);
                angle >= *start_angle && angle <= *end_angle
            }
            Shape::Polygon { points } => polygon_contains(points, px, py),
            Shape::Polyline { points } => points
                .windows(2)
                .any(|w| segment_distance(w[0], w[1], (px, py)) <= STROKE_HIT_TOLERANCE),
            Shape::Line { x1, y1, x2, y2 } => {
                segment_distance((*x1, *y1), (*x2, *y2), (px, py)) <= STROKE_HIT_TOLERANCE
            }
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Shape::Rect { x, y, width, height } => [x, y, width, height].iter().all(|v| v.is_finite()),
            Shape::Circle { cx, cy, r } => [cx, cy, r].iter().all(|v| v.is_finite()),
            Shape::Arc {
                cx,
                cy,
                start_angle,
                end_angle,
                inner_radius,
                outer_radius,
            } => [cx, cy, start_angle, end_angle, inner_radius, outer_radius]
                .iter()
                .all(|v| v.is_finite()),
            Shape::Polygon { points } | Shape::Polyline { points } => {
                points.iter().all(|(x, y)| x.is_finite() && y.is_finite())
            }
            Shape::Line { x1, y1, x2, y2 } => [x1, y1, x2, y2].iter().all(|v| v.is_finite()),
        }
    }
}

/// Point on an arc, using the clockwise-from-top convention.
pub fn polar(cx: f64, cy: f64, radius: f64, angle: f64) -> (f64, f64) {
    (cx + radius * angle.sin(), cy - radius * angle.cos())
}

fn polygon_contains(points: &[(f64, f64)], px: f64, py: f64) -> bool {
    let mut inside = false;
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = points[i];
        let (xj, yj) = points[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn segment_distance(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
    };
    (p.0 - (a.0 + t * dx)).hypot(p.1 - (a.1 + t * dy))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
    pub fill: Option<Rgb>,
    pub stroke: Option<Rgb>,
    pub stroke_width: f64,
    pub opacity: f64,
    pub dashed: bool,
}

impl Style {
    pub fn filled(color: Rgb) -> Self {
        Self {
            fill: Some(color),
            ..Self::default()
        }
    }

    pub fn stroked(color: Rgb, width: f64) -> Self {
        Self {
            stroke: Some(color),
            stroke_width: width,
            ..Self::default()
        }
    }

    pub fn with_stroke(mut self, color: Rgb, width: f64) -> Self {
        self.stroke = Some(color);
        self.stroke_width = width;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
            dashed: false,
        }
    }
}

/// A hoverable mark tied to the record it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Primitive {
    pub id: PrimitiveId,
    /// Series or category the mark belongs to (e.g. the medal key of a stack segment).
    pub key: String,
    pub datum: Record,
    pub shape: Shape,
    pub style: Style,
}

/// A non-interactive mark: violin boxes, median lines, gridlines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decoration {
    pub shape: Shape,
    pub style: Style,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Start,
    #[default]
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub anchor: Anchor,
    pub size: f64,
    pub color: Rgb,
}

impl Label {
    pub fn new(x: f64, y: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
            anchor: Anchor::Middle,
            size: 11.0,
            color: Rgb::STROKE,
        }
    }

    pub fn sized(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn colored(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn anchored(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Bottom,
    Left,
    /// Vertical axis placed at an arbitrary x, used by parallel coordinates.
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

/// An axis line with ticks. `offset` is the fixed coordinate (y for bottom, x for left/vertical),
/// `span` the pixel extent along the axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub orientation: Orientation,
    pub offset: f64,
    pub span: (f64, f64),
    pub ticks: Vec<Tick>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb,
}

/// Everything a view needs to draw and hit-test one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    pub frame: Frame,
    pub primitives: Vec<Primitive>,
    pub decorations: Vec<Decoration>,
    pub labels: Vec<Label>,
    pub axes: Vec<Axis>,
    pub legend: Vec<LegendEntry>,
}

impl Geometry {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            primitives: Vec::new(),
            decorations: Vec::new(),
            labels: Vec::new(),
            axes: Vec::new(),
            legend: Vec::new(),
        }
    }

    /// Append a primitive; ids are assigned in draw order.
    pub fn push(&mut self, key: impl Into<String>, datum: Record, shape: Shape, style: Style) -> PrimitiveId {
        let id = self.primitives.len();
        self.primitives.push(Primitive {
            id,
            key: key.into(),
            datum,
            shape,
            style,
        });
        id
    }

    pub fn decorate(&mut self, shape: Shape, style: Style) {
        self.decorations.push(Decoration { shape, style });
    }

    pub fn primitive(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(id)
    }

    /// Topmost primitive under the pointer. Later primitives are drawn on top.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&Primitive> {
        self.primitives.iter().rev().find(|p| p.shape.contains(x, y))
    }

    pub fn is_finite(&self) -> bool {
        self.primitives.iter().all(|p| p.shape.is_finite())
            && self.decorations.iter().all(|d| d.shape.is_finite())
            && self.labels.iter().all(|l| l.x.is_finite() && l.y.is_finite())
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}
