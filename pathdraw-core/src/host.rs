//! # Host surface
//!
//! What the engine needs from the thing it draws on: where it is, a way to subscribe to its events,
//! and a way to show the current markup.

use crate::input::EventKind;

/// Marker for subscription ids.
pub struct Subscription;
pub type SubscriptionID = crate::id::Id<Subscription>;

/// A surface's bounding box in the host's absolute coordinate space.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ListenOptions {
    /// A passive listener promises never to cancel the event's default action (scrolling, etc.)
    pub passive: bool,
}

pub trait HostSurface {
    /// Current bounds. Queried fresh for every event, the surface may move at any time.
    fn bounding_rect(&self) -> Rect;
    /// Start delivering events of `kind` to the engine.
    fn subscribe(&mut self, kind: EventKind, options: ListenOptions) -> SubscriptionID;
    /// Stop delivering. Unknown ids are ignored.
    fn unsubscribe(&mut self, subscription: SubscriptionID);
    /// Show the document, as serialized by the backend.
    fn present(&mut self, markup: &str);
}
