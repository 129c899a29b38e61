//! Input capture and path sessions for a vector drawing surface.
//!
//! A host (a windowing layer, a widget, a test harness) feeds raw device events into an
//! [`Engine`]; the engine throttles them, turns gestures into paths, keeps the document and its
//! undo/redo history, and hands markup back to the host to display or export.

pub mod backend;
pub mod builder;
pub mod clock;
pub mod color;
pub mod config;
pub mod coords;
pub mod document;
pub mod engine;
pub mod export;
pub mod host;
pub mod id;
pub mod input;
pub mod path;
pub mod session;
pub mod throttle;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{Engine, InitError};
pub use export::{Blob, ExportError, ExportFormat};
pub use path::{Path, PathOptions, PathStyle, Point};
