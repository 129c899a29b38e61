//! # Coordinates
//!
//! Converts absolute device positions into surface-local points and keeps track of the surface size.
//! Points are anchored to the pixel they were captured at: a resize changes the canvas bounds,
//! never the geometry already drawn.

use crate::host::Rect;
use crate::path::Point;
use crate::util::sanitize_dimension;

/// Result of mapping one event.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Mapped {
    /// `None` if the position was not finite after translation.
    pub point: Option<Point>,
    /// The new size, if the rect disagreed with the last known size.
    pub resized: Option<[f32; 2]>,
}

#[derive(Clone, Debug, Default)]
pub struct CoordinateMapper {
    size: [f32; 2],
}
impl CoordinateMapper {
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: [sanitize_dimension(width), sanitize_dimension(height)],
        }
    }
    #[must_use]
    pub fn size(&self) -> [f32; 2] {
        self.size
    }
    /// Translate `client` into the space of `rect`, which the caller must have just queried.
    pub fn to_local(&mut self, rect: Rect, client: [f32; 2]) -> Mapped {
        let resized = self.on_resize(rect.width, rect.height).then_some(self.size);
        Mapped {
            point: Point::new(client[0] - rect.left, client[1] - rect.top),
            resized,
        }
    }
    /// Record a new surface size. Returns true if it changed.
    pub fn on_resize(&mut self, width: f32, height: f32) -> bool {
        let size = [sanitize_dimension(width), sanitize_dimension(height)];
        if size == self.size {
            false
        } else {
            log::debug!("surface resized {:?} -> {:?}", self.size, size);
            self.size = size;
            true
        }
    }
}
