//! # Document
//!
//! The ordered list of paths (first = bottom) plus the redo history. Undo always removes the newest
//! path, so the document's own tail *is* the undo history; undone paths move, with ownership, onto
//! the redo stack and come back onto the tail in reverse order.
//!
//! While a gesture is in progress, the last entry is a preview: a copy of the builder's path that is
//! replaced on every append and becomes the committed entry when the gesture ends.
//!
//! Every change is mirrored into the geometry backend, which owns the serialized form.

use crate::backend::GeometryBackend;
use crate::path::Path;
use crate::util::sanitize_dimension;

#[derive(Default, Debug)]
pub struct DocumentModel {
    paths: Vec<Path>,
    redo: Vec<Path>,
    /// Whether the last entry of `paths` is a live preview.
    previewing: bool,
    width: f32,
    height: f32,
}
impl DocumentModel {
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: sanitize_dimension(width),
            height: sanitize_dimension(height),
            ..Self::default()
        }
    }
    #[must_use]
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
    #[must_use]
    pub fn is_previewing(&self) -> bool {
        self.previewing
    }
    #[must_use]
    pub fn size(&self) -> [f32; 2] {
        [self.width, self.height]
    }
    /// Push the preview of a path that just began.
    pub fn add_preview(&mut self, backend: &mut dyn GeometryBackend, path: Path) {
        debug_assert!(!self.previewing, "two previews at once");
        backend.document_add_path(&path);
        self.paths.push(path);
        self.previewing = true;
    }
    /// Replace the preview in place. Ignored when nothing is being previewed.
    pub fn update_preview(&mut self, backend: &mut dyn GeometryBackend, path: Path) {
        if !self.previewing {
            log::trace!("preview update without a preview");
            return;
        }
        let Some(last) = self.paths.last_mut() else {
            self.previewing = false;
            return;
        };
        backend.document_update_path(&path);
        *last = path;
    }
    /// The preview is now a permanent entry. Redo history does not survive new drawing.
    pub fn commit(&mut self) {
        if !self.previewing {
            return;
        }
        self.previewing = false;
        if !self.redo.is_empty() {
            log::debug!("commit dropped {} redo entries", self.redo.len());
            self.redo.clear();
        }
    }
    /// Move the newest path onto the redo stack, returning a copy of it.
    pub fn undo(&mut self, backend: &mut dyn GeometryBackend) -> Option<Path> {
        debug_assert!(!self.previewing, "undo during a gesture");
        let path = self.paths.pop()?;
        backend.document_remove_last();
        self.redo.push(path.clone());
        Some(path)
    }
    /// Move the most recently undone path back onto the tail, returning a copy of it.
    pub fn redo(&mut self, backend: &mut dyn GeometryBackend) -> Option<Path> {
        debug_assert!(!self.previewing, "redo during a gesture");
        let path = self.redo.pop()?;
        backend.document_add_path(&path);
        self.paths.push(path.clone());
        Some(path)
    }
    /// Drop every path and the redo history. Not undoable.
    pub fn clear(&mut self, backend: &mut dyn GeometryBackend) {
        self.paths.clear();
        self.redo.clear();
        self.previewing = false;
        backend.document_clear();
    }
    /// New canvas bounds. Existing geometry is untouched.
    pub fn resize(&mut self, backend: &mut dyn GeometryBackend, width: f32, height: f32) {
        self.width = sanitize_dimension(width);
        self.height = sanitize_dimension(height);
        backend.document_resize(self.width, self.height);
    }
}
