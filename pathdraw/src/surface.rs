//! A drawing surface with no window behind it. It keeps just enough state to behave like a real
//! one: where it is, which events someone listens for, and what it was last asked to show.

use pathdraw_core::host::{HostSurface, ListenOptions, Rect, SubscriptionID};
use pathdraw_core::input::EventKind;

#[derive(Default)]
struct State {
    rect: Rect,
    listeners: hashbrown::HashMap<SubscriptionID, EventKind>,
    markup: Option<String>,
    frames: usize,
}

/// Cheap to clone; clones are views of the same surface.
#[derive(Clone, Default)]
pub struct HeadlessSurface(std::rc::Rc<std::cell::RefCell<State>>);
impl HeadlessSurface {
    #[must_use]
    pub fn new(rect: Rect) -> Self {
        let surface = Self::default();
        surface.0.borrow_mut().rect = rect;
        surface
    }
    #[must_use]
    pub fn rect(&self) -> Rect {
        self.0.borrow().rect
    }
    pub fn set_rect(&self, rect: Rect) {
        self.0.borrow_mut().rect = rect;
    }
    /// Whether an event of this kind would reach a listener.
    #[must_use]
    pub fn is_listened(&self, kind: EventKind) -> bool {
        self.0.borrow().listeners.values().any(|k| *k == kind)
    }
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.0.borrow().listeners.len()
    }
    /// Whether `client` lies inside the surface.
    #[must_use]
    pub fn contains(&self, [x, y]: [f32; 2]) -> bool {
        let Rect {
            left,
            top,
            width,
            height,
        } = self.rect();
        (left..left + width).contains(&x) && (top..top + height).contains(&y)
    }
    /// The last presented markup, if anything was presented yet.
    #[must_use]
    pub fn markup(&self) -> Option<String> {
        self.0.borrow().markup.clone()
    }
    #[must_use]
    pub fn frames(&self) -> usize {
        self.0.borrow().frames
    }
}
impl HostSurface for HeadlessSurface {
    fn bounding_rect(&self) -> Rect {
        self.rect()
    }
    fn subscribe(&mut self, kind: EventKind, options: ListenOptions) -> SubscriptionID {
        let id = SubscriptionID::default();
        log::trace!("{id}: {kind} (passive: {})", options.passive);
        self.0.borrow_mut().listeners.insert(id, kind);
        id
    }
    fn unsubscribe(&mut self, subscription: SubscriptionID) {
        self.0.borrow_mut().listeners.remove(&subscription);
    }
    fn present(&mut self, markup: &str) {
        let mut state = self.0.borrow_mut();
        state.frames += 1;
        state.markup = Some(markup.to_owned());
    }
}
