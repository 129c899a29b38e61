//! # Draw session
//!
//! The gesture state machine. `Idle` until a gesture starts, `Drawing` while one path is open, back
//! to `Idle` once that path is committed. Out-of-order input (a move with nothing open, a second
//! end) is dropped without complaint; hosts deliver plenty of it.

use crate::backend::{GeometryBackend, PathHandle};
use crate::builder::PathBuilder;
use crate::document::DocumentModel;
use crate::path::{PathOptions, PathStyle, Point};

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum DrawState {
    #[default]
    Idle,
    Drawing {
        handle: PathHandle,
    },
}

#[derive(Default)]
pub struct DrawSession {
    state: DrawState,
    builder: PathBuilder,
}
impl DrawSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn state(&self) -> DrawState {
        self.state
    }
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing { .. })
    }
    /// Begin a gesture at `point`. A gesture already in progress is committed first.
    ///
    /// Returns whether the document changed.
    pub fn start(
        &mut self,
        backend: &mut dyn GeometryBackend,
        document: &mut DocumentModel,
        point: Point,
        style: PathStyle,
        options: PathOptions,
    ) -> bool {
        if self.is_drawing() {
            log::debug!("gesture start while drawing, committing the open path");
            self.finish(backend, document);
        }
        let handle = self.builder.begin(backend, point, style, options);
        if let Some(path) = self.builder.current() {
            document.add_preview(backend, path.clone());
        }
        self.state = DrawState::Drawing { handle };
        log::trace!("drawing {handle}");
        true
    }
    /// Extend the open path. Ignored while idle.
    pub fn extend(
        &mut self,
        backend: &mut dyn GeometryBackend,
        document: &mut DocumentModel,
        point: Point,
    ) -> bool {
        let DrawState::Drawing { handle } = self.state else {
            log::trace!("move while idle");
            return false;
        };
        match self.builder.append(backend, handle, point) {
            Some(path) => {
                document.update_preview(backend, path.clone());
                true
            }
            None => false,
        }
    }
    /// End the gesture, adding `point` as the final sample. Ignored while idle.
    pub fn end(
        &mut self,
        backend: &mut dyn GeometryBackend,
        document: &mut DocumentModel,
        point: Point,
    ) -> bool {
        if !self.is_drawing() {
            log::trace!("end while idle");
            return false;
        }
        self.extend(backend, document, point);
        self.finish(backend, document)
    }
    /// End the gesture without a final sample. Ignored while idle.
    pub fn finish(
        &mut self,
        backend: &mut dyn GeometryBackend,
        document: &mut DocumentModel,
    ) -> bool {
        let DrawState::Drawing { handle } = std::mem::take(&mut self.state) else {
            return false;
        };
        let Some(path) = self.builder.finish(backend, handle) else {
            log::warn!("session lost its open path {handle}");
            return false;
        };
        log::debug!("committing path of {} points", path.len());
        document.update_preview(backend, path);
        document.commit();
        true
    }
    /// Point-click input: the first click opens a path, later ones extend it.
    pub fn click(
        &mut self,
        backend: &mut dyn GeometryBackend,
        document: &mut DocumentModel,
        point: Point,
        style: PathStyle,
        options: PathOptions,
    ) -> bool {
        if self.is_drawing() {
            self.extend(backend, document, point)
        } else {
            self.start(backend, document, point, style, options)
        }
    }
}

#[cfg(test)]
mod test {
    use super::{DrawSession, DrawState};
    use crate::backend::svg::SvgBackend;
    use crate::color::{Color, Paint};
    use crate::document::DocumentModel;
    use crate::path::{PathOptions, PathStyle, Point};

    fn pt(x: f32) -> Point {
        Point::new(x, x).unwrap()
    }
    struct Fixture {
        backend: SvgBackend,
        document: DocumentModel,
        session: DrawSession,
    }
    impl Fixture {
        fn new() -> Self {
            Self {
                backend: SvgBackend::new(100.0, 100.0),
                document: DocumentModel::new(100.0, 100.0),
                session: DrawSession::new(),
            }
        }
        fn start(&mut self, x: f32) -> bool {
            self.session.start(
                &mut self.backend,
                &mut self.document,
                pt(x),
                PathStyle::default(),
                PathOptions::default(),
            )
        }
        fn extend(&mut self, x: f32) -> bool {
            self.session
                .extend(&mut self.backend, &mut self.document, pt(x))
        }
        fn end(&mut self, x: f32) -> bool {
            self.session.end(&mut self.backend, &mut self.document, pt(x))
        }
        fn xs(&self, index: usize) -> Vec<f32> {
            self.document.paths()[index]
                .points()
                .iter()
                .map(Point::x)
                .collect()
        }
    }
    #[test]
    fn gesture_lifecycle() {
        let mut fixture = Fixture::new();
        assert!(fixture.start(1.0));
        // Preview visible with a single point.
        assert_eq!(fixture.document.paths().len(), 1);
        assert!(fixture.document.is_previewing());
        assert!(fixture.extend(2.0));
        assert!(fixture.end(3.0));
        assert_eq!(fixture.session.state(), DrawState::Idle);
        assert!(!fixture.document.is_previewing());
        assert_eq!(fixture.xs(0), [1.0, 2.0, 3.0]);
        assert_eq!(fixture.backend.paths(), fixture.document.paths());
        assert_eq!(fixture.backend.open_handles(), 0);
    }
    #[test]
    fn idle_input_is_ignored() {
        let mut fixture = Fixture::new();
        assert!(!fixture.extend(1.0));
        assert!(!fixture.end(1.0));
        assert!(fixture.document.paths().is_empty());
        fixture.start(1.0);
        fixture.end(2.0);
        // Second end is a duplicate.
        assert!(!fixture.end(3.0));
        assert_eq!(fixture.xs(0), [1.0, 2.0]);
    }
    #[test]
    fn start_while_drawing_commits() {
        let mut fixture = Fixture::new();
        fixture.start(1.0);
        fixture.extend(2.0);
        fixture.start(5.0);
        assert!(fixture.session.is_drawing());
        assert_eq!(fixture.document.paths().len(), 2);
        assert_eq!(fixture.xs(0), [1.0, 2.0]);
        assert_eq!(fixture.xs(1), [5.0]);
        // Only one handle is ever open.
        assert_eq!(fixture.backend.open_handles(), 1);
    }
    #[test]
    fn commit_clears_redo() {
        let mut fixture = Fixture::new();
        fixture.start(1.0);
        fixture.end(1.0);
        fixture.document.undo(&mut fixture.backend);
        assert_eq!(fixture.document.redo_len(), 1);
        fixture.start(2.0);
        // Not yet committed.
        assert_eq!(fixture.document.redo_len(), 1);
        fixture.end(2.0);
        assert_eq!(fixture.document.redo_len(), 0);
    }
    #[test]
    fn style_is_fixed_at_start() {
        let mut fixture = Fixture::new();
        let red = PathStyle {
            stroke: Paint::Color(Color::opaque(255, 0, 0)),
            ..PathStyle::default()
        };
        fixture.session.start(
            &mut fixture.backend,
            &mut fixture.document,
            pt(1.0),
            red,
            PathOptions::default(),
        );
        fixture.end(2.0);
        assert_eq!(fixture.document.paths()[0].style, red);
    }
    #[test]
    fn clicks_build_one_path() {
        let mut fixture = Fixture::new();
        for x in [1.0, 2.0, 3.0] {
            assert!(fixture.session.click(
                &mut fixture.backend,
                &mut fixture.document,
                pt(x),
                PathStyle::default(),
                PathOptions::default(),
            ));
        }
        assert!(fixture
            .session
            .finish(&mut fixture.backend, &mut fixture.document));
        assert!(!fixture
            .session
            .finish(&mut fixture.backend, &mut fixture.document));
        assert_eq!(fixture.document.paths().len(), 1);
        assert_eq!(fixture.xs(0), [1.0, 2.0, 3.0]);
    }
    #[test]
    fn resize_mid_gesture_keeps_drawing() {
        let mut fixture = Fixture::new();
        fixture.start(10.0);
        fixture.document.resize(&mut fixture.backend, 20.0, 20.0);
        assert!(fixture.extend(30.0));
        fixture.end(40.0);
        // Points keep their original coordinates.
        assert_eq!(fixture.xs(0), [10.0, 30.0, 40.0]);
    }
}
