//! # Path builder
//!
//! Holds the one in-progress path and mirrors every step of it into the backend. Points are kept in
//! exactly the order they were appended; nothing is reordered or simplified here.

use crate::backend::{GeometryBackend, PathHandle};
use crate::path::{Path, PathOptions, PathStyle, Point};

struct InProgress {
    handle: PathHandle,
    path: Path,
}

#[derive(Default)]
pub struct PathBuilder {
    slot: Option<InProgress>,
}
impl PathBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Open a path at `point`. An already-open path is abandoned (its backend handle released).
    pub fn begin(
        &mut self,
        backend: &mut dyn GeometryBackend,
        point: Point,
        style: PathStyle,
        options: PathOptions,
    ) -> PathHandle {
        if let Some(abandoned) = self.slot.take() {
            log::warn!("path {} abandoned by a new begin", abandoned.handle);
            backend.path_release(abandoned.handle);
        }
        let handle = backend.create_path(options);
        backend.path_set_style(handle, &style);
        backend.path_append_point(handle, point);

        let mut path = Path::new(style, options);
        path.push(point);
        self.slot = Some(InProgress { handle, path });
        handle
    }
    /// Append to the open path. A finished or unknown handle is ignored and yields `None`.
    pub fn append(
        &mut self,
        backend: &mut dyn GeometryBackend,
        handle: PathHandle,
        point: Point,
    ) -> Option<&Path> {
        let Some(open) = self.slot.as_mut().filter(|open| open.handle == handle) else {
            log::trace!("append to stale path handle {handle}");
            return None;
        };
        backend.path_append_point(handle, point);
        open.path.push(point);
        Some(&open.path)
    }
    /// Close the path and hand it over. `None` if the handle is not the open one.
    pub fn finish(&mut self, backend: &mut dyn GeometryBackend, handle: PathHandle) -> Option<Path> {
        if self.slot.as_ref()?.handle != handle {
            log::trace!("finish of stale path handle {handle}");
            return None;
        }
        let InProgress { handle, path } = self.slot.take()?;
        backend.path_release(handle);
        Some(path)
    }
    /// The open path, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Path> {
        self.slot.as_ref().map(|open| &open.path)
    }
    #[must_use]
    pub fn handle(&self) -> Option<PathHandle> {
        self.slot.as_ref().map(|open| open.handle)
    }
}

#[cfg(test)]
mod test {
    use super::PathBuilder;
    use crate::backend::svg::SvgBackend;
    use crate::path::{PathOptions, PathStyle, Point};

    fn pt(x: f32, y: f32) -> Point {
        Point::new(x, y).unwrap()
    }
    #[test]
    fn keeps_append_order() {
        let mut backend = SvgBackend::new(10.0, 10.0);
        let mut builder = PathBuilder::new();
        let handle = builder.begin(&mut backend, pt(0.0, 0.0), PathStyle::default(), PathOptions::default());
        for i in [5.0, 1.0, 3.0] {
            assert!(builder.append(&mut backend, handle, pt(i, i)).is_some());
        }
        let path = builder.finish(&mut backend, handle).unwrap();
        let xs: Vec<f32> = path.points().iter().map(Point::x).collect();
        assert_eq!(xs, [0.0, 5.0, 1.0, 3.0]);
        assert_eq!(backend.open_handles(), 0);
    }
    #[test]
    fn append_after_finish_is_noop() {
        let mut backend = SvgBackend::new(10.0, 10.0);
        let mut builder = PathBuilder::new();
        let handle = builder.begin(&mut backend, pt(1.0, 1.0), PathStyle::default(), PathOptions::default());
        let finished = builder.finish(&mut backend, handle).unwrap();
        assert!(builder.append(&mut backend, handle, pt(2.0, 2.0)).is_none());
        assert!(builder.finish(&mut backend, handle).is_none());
        assert!(builder.current().is_none());
        assert_eq!(finished.len(), 1);
    }
    #[test]
    fn stale_handle_cannot_touch_new_path() {
        let mut backend = SvgBackend::new(10.0, 10.0);
        let mut builder = PathBuilder::new();
        let old = builder.begin(&mut backend, pt(1.0, 1.0), PathStyle::default(), PathOptions::default());
        let new = builder.begin(&mut backend, pt(2.0, 2.0), PathStyle::default(), PathOptions::default());
        assert_ne!(old, new);
        // The abandoned handle was released, only the new one stays open.
        assert_eq!(backend.open_handles(), 1);
        assert!(builder.append(&mut backend, old, pt(9.0, 9.0)).is_none());
        assert_eq!(builder.current().unwrap().len(), 1);
    }
}
