//! # Paths
//!
//! The vector model: points, the style and topology a path is born with, and the path itself.
//! Paths are plain values. Whoever holds one owns it; the document keeps copies, never references.

use crate::color::{ColorParseError, Paint};
use crate::util::{FiniteF32, NumberError, PositiveF32};

/// A surface-local coordinate. Always finite.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Point {
    x: FiniteF32,
    y: FiniteF32,
}
impl Point {
    /// `None` if either coordinate is NaN or infinite.
    #[must_use]
    pub fn new(x: f32, y: f32) -> Option<Self> {
        Some(Self {
            x: FiniteF32::new(x).ok()?,
            y: FiniteF32::new(y).ok()?,
        })
    }
    #[must_use]
    pub fn x(&self) -> f32 {
        self.x.get()
    }
    #[must_use]
    pub fn y(&self) -> f32 {
        self.y.get()
    }
    #[must_use]
    pub fn as_array(&self) -> [f32; 2] {
        [self.x(), self.y()]
    }
}

/// Paint settings captured when a path begins.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PathStyle {
    pub fill: Paint,
    pub stroke: Paint,
    pub stroke_width: PositiveF32,
}
impl Default for PathStyle {
    fn default() -> Self {
        Self {
            fill: Paint::None,
            stroke: Paint::Color(crate::color::Color::BLACK),
            stroke_width: PositiveF32::ONE,
        }
    }
}
impl PathStyle {
    /// Build a style from host-facing values.
    pub fn parse(fill: &str, stroke: &str, stroke_width: f32) -> Result<Self, StyleError> {
        Ok(Self {
            fill: fill.parse().map_err(StyleError::Fill)?,
            stroke: stroke.parse().map_err(StyleError::Stroke)?,
            stroke_width: PositiveF32::new(stroke_width).map_err(StyleError::StrokeWidth)?,
        })
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("bad fill: {0}")]
    Fill(ColorParseError),
    #[error("bad stroke: {0}")]
    Stroke(ColorParseError),
    #[error("bad stroke width: {0}")]
    StrokeWidth(NumberError),
}

/// Topology flags, fixed when a path begins.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct PathOptions {
    /// Join the last point back to the first.
    pub closed: bool,
    /// Trace through point midpoints with curves instead of straight segments.
    pub smooth: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Path {
    points: Vec<Point>,
    pub style: PathStyle,
    pub options: PathOptions,
}
impl Path {
    #[must_use]
    pub fn new(style: PathStyle, options: PathOptions) -> Self {
        Self {
            points: Vec::new(),
            style,
            options,
        }
    }
    /// Points in the order they were appended.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    // Append-only. Only the builder gets to grow a path.
    pub(crate) fn push(&mut self, point: Point) {
        self.points.push(point);
    }
}
