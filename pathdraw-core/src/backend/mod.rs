//! # Geometry backends
//!
//! The engine never draws anything itself. A backend owns path geometry and the serialized document,
//! and is handed to the engine as a capability object. Backends are made by a [`GeometryModule`],
//! which is loaded once per process and shared by reference between engines.
//!
//! The contract is synchronous and infallible for valid input: coordinates are finite, sizes are
//! non-negative. Feeding it anything else is a bug in the caller.

pub mod svg;

use crate::path::{Path, PathOptions, PathStyle, Point};

/// Marker for backend path handles.
pub struct BackendPath;
pub type PathHandle = crate::id::Id<BackendPath>;

pub trait GeometryBackend {
    /// Start a new, empty path with fixed topology.
    fn create_path(&mut self, options: PathOptions) -> PathHandle;
    fn path_append_point(&mut self, handle: PathHandle, point: Point);
    fn path_set_style(&mut self, handle: PathHandle, style: &PathStyle);
    /// The builder is done with this handle. Unknown handles are ignored.
    fn path_release(&mut self, handle: PathHandle);

    fn document_add_path(&mut self, path: &Path);
    /// Replace the last path of the document.
    fn document_update_path(&mut self, path: &Path);
    fn document_remove_last(&mut self) -> Option<Path>;
    fn document_clear(&mut self) {
        while self.document_remove_last().is_some() {}
    }
    /// A complete markup representation of the document.
    fn document_serialize(&self) -> String;
    fn document_resize(&mut self, width: f32, height: f32);
}

/// A loaded backend implementation. One per process, never reloaded.
pub trait GeometryModule: Send + Sync {
    fn name(&self) -> &'static str;
    /// A fresh, empty document backend of the given canvas size.
    fn create_document(&self, width: f32, height: f32) -> Box<dyn GeometryBackend>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendLoadError {
    #[error("geometry backend {0:?} is unavailable: {1}")]
    Unavailable(String, String),
}

/// The built-in SVG backend module.
#[must_use]
pub fn svg_module() -> &'static svg::SvgModule {
    static MODULE: std::sync::OnceLock<svg::SvgModule> = std::sync::OnceLock::new();
    MODULE.get_or_init(svg::SvgModule::default)
}

/// One step of a traced outline, in surface-local pixels.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Segment {
    MoveTo([f32; 2]),
    LineTo([f32; 2]),
    QuadTo { ctrl: [f32; 2], to: [f32; 2] },
    Close,
}

/// Trace the outline a path is drawn with.
///
/// * A single point becomes a zero-length segment, visible given round caps.
/// * Smooth paths run through the midpoints between samples, using each sample as a control point.
#[must_use]
pub fn trace(path: &Path) -> Vec<Segment> {
    let points = path.points();
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let mut segments = Vec::with_capacity(points.len() + 2);
    segments.push(Segment::MoveTo(first.as_array()));
    match points {
        [only] => segments.push(Segment::LineTo(only.as_array())),
        [_, .., last] if path.options.smooth && points.len() >= 3 => {
            let mid = |a: &Point, b: &Point| [(a.x() + b.x()) / 2.0, (a.y() + b.y()) / 2.0];
            segments.push(Segment::LineTo(mid(&points[0], &points[1])));
            for pair in points[1..].windows(2) {
                segments.push(Segment::QuadTo {
                    ctrl: pair[0].as_array(),
                    to: mid(&pair[0], &pair[1]),
                });
            }
            segments.push(Segment::LineTo(last.as_array()));
        }
        _ => segments.extend(points[1..].iter().map(|p| Segment::LineTo(p.as_array()))),
    }
    if path.options.closed {
        segments.push(Segment::Close);
    }
    segments
}
