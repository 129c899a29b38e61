//! Fakes for exercising the engine without a real host.

use crate::host::{HostSurface, ListenOptions, Rect, SubscriptionID};
use crate::input::EventKind;

#[derive(Default)]
pub struct SurfaceLog {
    pub rect: Rect,
    pub subscriptions: hashbrown::HashMap<SubscriptionID, (EventKind, ListenOptions)>,
    pub presented: Vec<String>,
}
impl SurfaceLog {
    pub fn kinds(&self) -> Vec<EventKind> {
        let mut kinds: Vec<_> = self.subscriptions.values().map(|(kind, _)| *kind).collect();
        kinds.sort_by_key(ToString::to_string);
        kinds
    }
}

/// A surface whose log stays inspectable after the engine takes ownership.
#[derive(Clone, Default)]
pub struct FakeSurface(pub std::rc::Rc<std::cell::RefCell<SurfaceLog>>);
impl FakeSurface {
    pub fn new(rect: Rect) -> Self {
        let surface = Self::default();
        surface.0.borrow_mut().rect = rect;
        surface
    }
    pub fn log(&self) -> std::cell::Ref<'_, SurfaceLog> {
        self.0.borrow()
    }
    pub fn set_rect(&self, rect: Rect) {
        self.0.borrow_mut().rect = rect;
    }
}
impl HostSurface for FakeSurface {
    fn bounding_rect(&self) -> Rect {
        self.0.borrow().rect
    }
    fn subscribe(&mut self, kind: EventKind, options: ListenOptions) -> SubscriptionID {
        let id = SubscriptionID::default();
        self.0.borrow_mut().subscriptions.insert(id, (kind, options));
        id
    }
    fn unsubscribe(&mut self, subscription: SubscriptionID) {
        self.0.borrow_mut().subscriptions.remove(&subscription);
    }
    fn present(&mut self, markup: &str) {
        self.0.borrow_mut().presented.push(markup.to_owned());
    }
}
