//! # Engine
//!
//! One drawing session bound to one host surface. Owns the document, the gesture state machine and
//! the listener set for the current input mode, and exposes everything a host may ask of it.
//!
//! The engine is inert until a geometry backend is attached: events are dropped, commands do
//! nothing, exports report [`ExportError::Unavailable`]. After [`Engine::teardown`] (or drop) it is
//! inert for good.
//!
//! Everything runs on the host's thread. The only asynchronous operation is rasterization, which
//! works from a snapshot and so never holds the engine across an await.

use std::time::{Duration, Instant};

use crate::backend::{BackendLoadError, GeometryBackend, GeometryModule};
use crate::clock::Clock;
use crate::config::{throttle_interval, EngineConfig};
use crate::coords::CoordinateMapper;
use crate::document::DocumentModel;
use crate::export::{Blob, ExportError, ExportFormat, ExportPipeline, Scene};
use crate::host::{HostSurface, ListenOptions, SubscriptionID};
use crate::input::{DeviceEvent, EventKind, GesturePhase, InputMode, InputSource};
use crate::path::{Path, PathOptions, PathStyle, Point};
use crate::session::{DrawSession, DrawState};
use crate::throttle::{Throttle, ThrottleOptions};
use crate::util::PositiveF32;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    #[error(transparent)]
    Backend(#[from] BackendLoadError),
    #[error("a geometry backend is already attached")]
    AlreadyAttached,
    #[error("engine has been torn down")]
    TornDown,
}

/// Everything that shapes the *next* path or the next listener set.
#[derive(Clone, Debug)]
struct Settings {
    style: PathStyle,
    options: PathOptions,
    throttle: Duration,
    edges: ThrottleOptions,
    mode: InputMode,
    source: InputSource,
    passive: bool,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            style: PathStyle::default(),
            options: PathOptions {
                closed: false,
                smooth: true,
            },
            throttle: Duration::from_millis(20),
            edges: ThrottleOptions::default(),
            mode: InputMode::default(),
            source: InputSource::default(),
            passive: false,
        }
    }
}

/// The subscriptions for one mode + source, and the throttle gating its moves.
/// Installed and removed only as a whole.
struct ListenerSet {
    kinds: &'static [EventKind],
    subscriptions: smallvec::SmallVec<[SubscriptionID; 4]>,
    throttle: Throttle<Point>,
}

/// Either already finished or waiting on a render.
enum Prepared<F> {
    Ready(Blob),
    Render(F),
}

pub struct Engine {
    surface: Box<dyn HostSurface>,
    clock: Box<dyn Clock>,
    backend: Option<Box<dyn GeometryBackend>>,
    mapper: CoordinateMapper,
    session: DrawSession,
    document: DocumentModel,
    listeners: Option<ListenerSet>,
    settings: Settings,
    exporter: ExportPipeline,
    torn_down: bool,
}
impl Engine {
    /// Bind to a surface. Settings from `config` are validated one by one; invalid ones are
    /// reported and left at their defaults.
    pub fn new(surface: Box<dyn HostSurface>, clock: Box<dyn Clock>, config: &EngineConfig) -> Self {
        let rect = surface.bounding_rect();
        let mapper = CoordinateMapper::new(rect.width, rect.height);
        let [width, height] = mapper.size();
        let mut engine = Self {
            surface,
            clock,
            backend: None,
            mapper,
            session: DrawSession::new(),
            document: DocumentModel::new(width, height),
            listeners: None,
            settings: Settings::default(),
            exporter: ExportPipeline::new(config.jpeg_quality),
            torn_down: false,
        };
        engine.apply_config(config);
        engine
    }
    /// Hand the engine its backend, once the host managed to load one. On failure the engine
    /// stays inert and the error is passed back.
    pub fn attach_backend(
        &mut self,
        module: Result<&'static dyn GeometryModule, BackendLoadError>,
    ) -> Result<(), InitError> {
        if self.torn_down {
            return Err(InitError::TornDown);
        }
        if self.backend.is_some() {
            return Err(InitError::AlreadyAttached);
        }
        let module = module.map_err(|err| {
            log::error!("{err}");
            InitError::Backend(err)
        })?;
        let [width, height] = self.mapper.size();
        log::info!("attached {} backend at {width}x{height}", module.name());
        self.backend = Some(module.create_document(width, height));
        self.document = DocumentModel::new(width, height);
        self.install_listeners();
        self.render();
        Ok(())
    }
    /// Whether a backend is attached and the engine is live.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.backend.is_some() && !self.torn_down
    }
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // ===== Input =====

    /// Feed one host event. Events for kinds the current listener set doesn't include are
    /// dropped, as if they had never been subscribed to.
    pub fn handle_event(&mut self, event: &DeviceEvent) {
        if !self.is_ready() {
            log::trace!("event while inert");
            return;
        }
        if let DeviceEvent::Resize { width, height } = *event {
            self.resize(width, height);
            return;
        }
        let (Some(kind), Some(gesture)) = (event.kind(), event.gesture()) else {
            return;
        };
        if !self
            .listeners
            .as_ref()
            .is_some_and(|listeners| listeners.kinds.contains(&kind))
        {
            log::trace!("{kind} is not in the active listener set");
            return;
        }
        if gesture == GesturePhase::ClickOutside {
            if self.finish_gesture() {
                self.render();
            }
            return;
        }
        let Some(point) = event.client_position().and_then(|client| self.map_point(client)) else {
            log::trace!("{kind} without a usable position");
            // An end still ends the gesture, just without a final sample.
            if gesture == GesturePhase::End && self.finish_gesture() {
                self.render();
            }
            return;
        };
        let changed = match gesture {
            GesturePhase::Start => {
                self.cancel_throttle();
                self.with_backend(|session, backend, document, settings| {
                    session.start(backend, document, point, settings.style, settings.options)
                })
            }
            GesturePhase::Move => {
                let now = self.clock.now();
                match self
                    .listeners
                    .as_mut()
                    .and_then(|listeners| listeners.throttle.call(now, point))
                {
                    Some(point) => self.extend(point),
                    None => false,
                }
            }
            GesturePhase::End => {
                self.cancel_throttle();
                self.with_backend(|session, backend, document, _| {
                    session.end(backend, document, point)
                })
            }
            GesturePhase::Click => self.with_backend(|session, backend, document, settings| {
                session.click(backend, document, point, settings.style, settings.options)
            }),
            GesturePhase::ClickOutside => false,
        };
        if changed {
            self.render();
        }
    }
    /// Run a throttled sample whose window has closed. Hosts call this at (or after)
    /// [`Engine::next_deadline`].
    pub fn poll_timers(&mut self) {
        if !self.is_ready() {
            return;
        }
        let now = self.clock.now();
        let Some(point) = self
            .listeners
            .as_mut()
            .and_then(|listeners| listeners.throttle.poll(now))
        else {
            return;
        };
        if self.extend(point) {
            self.render();
        }
    }
    /// When [`Engine::poll_timers`] next has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.listeners
            .as_ref()
            .and_then(|listeners| listeners.throttle.deadline())
    }

    // ===== History =====

    /// Drop every path. Cannot be undone.
    pub fn clear(&mut self) {
        if !self.is_ready() {
            return;
        }
        self.finish_gesture();
        if let Some(backend) = self.backend.as_deref_mut() {
            self.document.clear(backend);
        }
        log::debug!("cleared");
        self.render();
    }
    /// Remove the newest path. Returns whether anything was undone.
    pub fn undo(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.finish_gesture();
        let undone = self
            .backend
            .as_deref_mut()
            .and_then(|backend| self.document.undo(backend))
            .is_some();
        if undone {
            self.render();
        }
        undone
    }
    /// Restore the most recently undone path. Returns whether anything was redone.
    pub fn redo(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.finish_gesture();
        let redone = self
            .backend
            .as_deref_mut()
            .and_then(|backend| self.document.redo(backend))
            .is_some();
        if redone {
            self.render();
        }
        redone
    }

    // ===== Settings =====

    /// Apply every field of a configuration, as the individual setters would.
    pub fn apply_config(&mut self, config: &EngineConfig) {
        self.set_fill(&config.fill);
        self.set_stroke(&config.stroke);
        self.set_stroke_width(config.stroke_width);
        self.set_options(PathOptions {
            closed: config.path_close,
            smooth: config.path_circular,
        });
        let relisten = self.settings.edges != config.throttle_edges
            || self.settings.passive != config.passive_listeners;
        self.settings.edges = config.throttle_edges;
        self.settings.passive = config.passive_listeners;
        self.exporter.set_jpeg_quality(config.jpeg_quality);
        self.change_throttle(config.throttle_ms);
        let listening_for = (self.settings.mode, self.settings.source);
        self.set_input_source(config.input_source);
        self.set_mode(config.mode);
        // A mode or source switch already installed a fresh set.
        if relisten && listening_for == (self.settings.mode, self.settings.source) {
            self.reinstall_listeners();
        }
    }
    /// New minimum time between freehand samples. Negative or non-finite values are ignored.
    pub fn change_throttle(&mut self, ms: f64) {
        let interval = match throttle_interval(ms) {
            Ok(interval) => interval,
            Err(err) => {
                log::warn!("ignoring throttle of {ms}ms: {err}");
                return;
            }
        };
        self.settings.throttle = interval;
        if let Some(listeners) = self.listeners.as_mut() {
            // The old window's trailing sample is dropped, never fired early.
            listeners.throttle.cancel();
            listeners.throttle = Throttle::new(interval, self.settings.edges);
        }
    }
    /// Style for paths started from now on.
    pub fn set_style(&mut self, style: PathStyle) {
        self.settings.style = style;
    }
    pub fn set_fill(&mut self, fill: &str) {
        match fill.parse() {
            Ok(paint) => self.settings.style.fill = paint,
            Err(err) => log::warn!("ignoring fill {fill:?}: {err}"),
        }
    }
    pub fn set_stroke(&mut self, stroke: &str) {
        match stroke.parse() {
            Ok(paint) => self.settings.style.stroke = paint,
            Err(err) => log::warn!("ignoring stroke {stroke:?}: {err}"),
        }
    }
    pub fn set_stroke_width(&mut self, width: f32) {
        match PositiveF32::new(width) {
            Ok(width) => self.settings.style.stroke_width = width,
            Err(err) => log::warn!("ignoring stroke width {width}: {err}"),
        }
    }
    pub fn set_path_close(&mut self, closed: bool) {
        self.settings.options.closed = closed;
    }
    pub fn set_path_circular(&mut self, smooth: bool) {
        self.settings.options.smooth = smooth;
    }
    pub fn set_options(&mut self, options: PathOptions) {
        self.settings.options = options;
    }
    /// Switch between freehand and point-click input. An open path is committed first.
    pub fn set_mode(&mut self, mode: InputMode) {
        if self.settings.mode == mode {
            return;
        }
        log::debug!("mode {} -> {mode}", self.settings.mode);
        self.settings.mode = mode;
        self.reinstall_listeners();
    }
    /// Switch which device family drives freehand input. An open path is committed first.
    pub fn set_input_source(&mut self, source: InputSource) {
        if self.settings.source == source {
            return;
        }
        log::debug!("input source {} -> {source}", self.settings.source);
        self.settings.source = source;
        self.reinstall_listeners();
    }

    // ===== Export =====

    /// The document's markup, as the backend serializes it.
    #[must_use]
    pub fn serialize(&self) -> Option<String> {
        self.live_backend().map(GeometryBackend::document_serialize)
    }
    #[must_use]
    pub fn svg_data_url(&self) -> Option<String> {
        self.serialize()
            .map(|markup| crate::export::svg_data_url(&markup))
    }
    /// Render the current document to a raster image. The document is captured now; later edits
    /// don't affect the result.
    pub fn rasterize(
        &self,
        format: ExportFormat,
    ) -> impl std::future::Future<Output = Result<Blob, ExportError>> + Send + 'static {
        let render = self
            .live_backend()
            .map(|backend| self.exporter.rasterize(self.scene(backend), format));
        async move {
            match render {
                Some(render) => render.await,
                None => Err(ExportError::Unavailable),
            }
        }
    }
    /// Export in any format. SVG is immediate; raster formats render as [`Engine::rasterize`].
    pub fn download(
        &self,
        format: ExportFormat,
    ) -> impl std::future::Future<Output = Result<Blob, ExportError>> + Send + 'static {
        let prepared = match (self.live_backend(), format) {
            (None, _) => Err(ExportError::Unavailable),
            (Some(backend), ExportFormat::Svg) => Ok(Prepared::Ready(ExportPipeline::svg(
                backend.document_serialize(),
            ))),
            (Some(backend), _) => Ok(Prepared::Render(
                self.exporter.rasterize(self.scene(backend), format),
            )),
        };
        async move {
            match prepared {
                Ok(Prepared::Ready(blob)) => Ok(blob),
                Ok(Prepared::Render(render)) => render.await,
                Err(err) => Err(err),
            }
        }
    }

    // ===== Lifecycle =====

    /// Commit any open path, detach from the surface and release the backend. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.finish_gesture();
        self.uninstall_listeners();
        self.backend = None;
        self.torn_down = true;
        log::debug!("engine torn down");
    }

    // ===== Inspection =====

    #[must_use]
    pub fn document(&self) -> &DocumentModel {
        &self.document
    }
    #[must_use]
    pub fn paths(&self) -> &[Path] {
        self.document.paths()
    }
    #[must_use]
    pub fn draw_state(&self) -> DrawState {
        self.session.state()
    }
    #[must_use]
    pub fn mode(&self) -> InputMode {
        self.settings.mode
    }
    #[must_use]
    pub fn input_source(&self) -> InputSource {
        self.settings.source
    }
    #[must_use]
    pub fn style(&self) -> PathStyle {
        self.settings.style
    }
    #[must_use]
    pub fn options(&self) -> PathOptions {
        self.settings.options
    }
    #[must_use]
    pub fn throttle_interval(&self) -> Duration {
        self.settings.throttle
    }
    #[must_use]
    pub fn size(&self) -> [f32; 2] {
        self.mapper.size()
    }

    // ===== Internals =====

    fn live_backend(&self) -> Option<&dyn GeometryBackend> {
        if self.torn_down {
            None
        } else {
            self.backend.as_deref()
        }
    }
    fn scene(&self, backend: &dyn GeometryBackend) -> Scene {
        let [width, height] = self.document.size();
        Scene {
            width,
            height,
            markup: backend.document_serialize(),
        }
    }
    /// Run a session transition with the split borrows it needs. `false` without a backend.
    fn with_backend(
        &mut self,
        transition: impl FnOnce(
            &mut DrawSession,
            &mut dyn GeometryBackend,
            &mut DocumentModel,
            &Settings,
        ) -> bool,
    ) -> bool {
        let Some(backend) = self.backend.as_deref_mut() else {
            return false;
        };
        transition(&mut self.session, backend, &mut self.document, &self.settings)
    }
    fn extend(&mut self, point: Point) -> bool {
        self.with_backend(|session, backend, document, _| session.extend(backend, document, point))
    }
    /// Commit the open path, if any, without a final sample. Returns whether one was open.
    fn finish_gesture(&mut self) -> bool {
        self.cancel_throttle();
        self.with_backend(|session, backend, document, _| session.finish(backend, document))
    }
    fn cancel_throttle(&mut self) {
        if let Some(listeners) = self.listeners.as_mut() {
            listeners.throttle.cancel();
        }
    }
    /// Freshly query the surface, follow any size change, and make `client` local.
    fn map_point(&mut self, client: [f32; 2]) -> Option<Point> {
        let rect = self.surface.bounding_rect();
        let mapped = self.mapper.to_local(rect, client);
        if let (Some([width, height]), Some(backend)) =
            (mapped.resized, self.backend.as_deref_mut())
        {
            self.document.resize(backend, width, height);
        }
        mapped.point
    }
    fn resize(&mut self, width: f32, height: f32) {
        if !self.mapper.on_resize(width, height) {
            return;
        }
        let [width, height] = self.mapper.size();
        if let Some(backend) = self.backend.as_deref_mut() {
            self.document.resize(backend, width, height);
        }
        self.render();
    }
    fn install_listeners(&mut self) {
        debug_assert!(self.listeners.is_none(), "listener set installed twice");
        let kinds = EventKind::listeners_for(self.settings.mode, self.settings.source);
        let options = ListenOptions {
            passive: self.settings.passive,
        };
        let subscriptions = kinds
            .iter()
            .map(|&kind| self.surface.subscribe(kind, options))
            .collect();
        log::debug!(
            "listening for {} {} events",
            self.settings.mode,
            self.settings.source
        );
        self.listeners = Some(ListenerSet {
            kinds,
            subscriptions,
            throttle: Throttle::new(self.settings.throttle, self.settings.edges),
        });
    }
    fn uninstall_listeners(&mut self) {
        let Some(mut listeners) = self.listeners.take() else {
            return;
        };
        listeners.throttle.cancel();
        for subscription in listeners.subscriptions {
            self.surface.unsubscribe(subscription);
        }
    }
    /// Swap the listener set for the current mode and source. Nothing is installed while inert.
    fn reinstall_listeners(&mut self) {
        if !self.is_ready() {
            return;
        }
        if self.finish_gesture() {
            self.render();
        }
        self.uninstall_listeners();
        self.install_listeners();
    }
    fn render(&mut self) {
        if let Some(backend) = self.live_backend() {
            let markup = backend.document_serialize();
            self.surface.present(&markup);
        }
    }
}
impl Drop for Engine {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod test {
    use super::{Engine, InitError};
    use crate::backend::svg::SvgBackend;
    use crate::backend::{
        svg_module, BackendLoadError, GeometryBackend, GeometryModule, PathHandle,
    };
    use crate::clock::{Clock, ManualClock};
    use crate::color::{Color, Paint};
    use crate::config::EngineConfig;
    use crate::export::{ExportError, ExportFormat};
    use crate::host::Rect;
    use crate::input::{DeviceEvent, EventKind, InputMode, InputSource, MousePhase, TouchPhase};
    use crate::path::{Path, PathOptions, PathStyle, Point};
    use crate::session::DrawState;
    use crate::testing::FakeSurface;
    use crate::throttle::ThrottleOptions;
    use std::time::Duration;

    const RECT: Rect = Rect {
        left: 10.0,
        top: 20.0,
        width: 200.0,
        height: 100.0,
    };
    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }
    fn engine_with(config: &EngineConfig) -> (Engine, FakeSurface, ManualClock) {
        let surface = FakeSurface::new(RECT);
        let clock = ManualClock::default();
        let mut engine = Engine::new(Box::new(surface.clone()), Box::new(clock.clone()), config);
        engine
            .attach_backend(Ok(svg_module() as &'static dyn GeometryModule))
            .unwrap();
        (engine, surface, clock)
    }
    fn engine() -> (Engine, FakeSurface, ManualClock) {
        engine_with(&EngineConfig::default())
    }
    /// Mouse event at a surface-local position.
    fn mouse(phase: MousePhase, x: f32, y: f32) -> DeviceEvent {
        DeviceEvent::mouse(phase, x + RECT.left, y + RECT.top)
    }
    fn xs(engine: &Engine, index: usize) -> Vec<f32> {
        engine.paths()[index].points().iter().map(Point::x).collect()
    }

    #[test]
    fn inert_without_backend() {
        let surface = FakeSurface::new(RECT);
        let mut engine = Engine::new(
            Box::new(surface.clone()),
            Box::new(ManualClock::default()),
            &EngineConfig::default(),
        );
        engine.handle_event(&mouse(MousePhase::Down, 1.0, 1.0));
        engine.clear();
        assert!(!engine.undo());
        assert!(engine.serialize().is_none());
        assert!(engine.paths().is_empty());
        assert!(surface.log().subscriptions.is_empty());

        let err = BackendLoadError::Unavailable("svg".into(), "missing".into());
        assert_eq!(
            engine.attach_backend(Err(err.clone())),
            Err(InitError::Backend(err))
        );
        assert!(!engine.is_ready());
        assert!(surface.log().presented.is_empty());
    }
    #[test]
    fn attach_renders_and_subscribes() {
        let (mut engine, surface, _) = engine();
        assert_eq!(
            surface.log().kinds(),
            [
                EventKind::MouseDown,
                EventKind::MouseLeave,
                EventKind::MouseMove,
                EventKind::MouseUp
            ]
        );
        assert!(surface.log().presented[0].contains(r#"width="200""#));
        assert_eq!(
            engine.attach_backend(Ok(svg_module() as &'static dyn GeometryModule)),
            Err(InitError::AlreadyAttached)
        );
    }
    #[test]
    fn pencil_gesture_is_throttled() {
        let (mut engine, _, clock) = engine();
        engine.handle_event(&mouse(MousePhase::Down, 0.0, 0.0));
        assert!(matches!(engine.draw_state(), DrawState::Drawing { .. }));
        engine.handle_event(&mouse(MousePhase::Move, 1.0, 0.0));
        clock.advance(ms(5));
        engine.handle_event(&mouse(MousePhase::Move, 2.0, 0.0));
        // Suppressed, scheduled for the end of the window.
        assert_eq!(engine.next_deadline(), Some(clock.now() + ms(15)));
        clock.advance(ms(15));
        engine.poll_timers();
        assert_eq!(engine.next_deadline(), None);
        engine.handle_event(&mouse(MousePhase::Up, 3.0, 0.0));

        assert_eq!(engine.draw_state(), DrawState::Idle);
        assert_eq!(xs(&engine, 0), [0.0, 1.0, 2.0, 3.0]);
    }
    #[test]
    fn unpolled_trailing_is_superseded() {
        let (mut engine, _, clock) = engine();
        engine.handle_event(&mouse(MousePhase::Down, 0.0, 0.0));
        engine.handle_event(&mouse(MousePhase::Move, 1.0, 0.0));
        clock.advance(ms(5));
        engine.handle_event(&mouse(MousePhase::Move, 5.0, 0.0));
        clock.advance(ms(45));
        engine.handle_event(&mouse(MousePhase::Move, 50.0, 0.0));
        engine.poll_timers();
        assert_eq!(xs(&engine, 0), [0.0, 1.0, 50.0]);
    }
    #[test]
    fn end_drops_pending_sample() {
        let (mut engine, _, clock) = engine();
        engine.handle_event(&mouse(MousePhase::Down, 0.0, 0.0));
        engine.handle_event(&mouse(MousePhase::Move, 1.0, 0.0));
        engine.handle_event(&mouse(MousePhase::Move, 2.0, 0.0));
        engine.handle_event(&mouse(MousePhase::Leave, 3.0, 0.0));
        assert_eq!(engine.next_deadline(), None);
        clock.advance(ms(100));
        engine.poll_timers();
        assert_eq!(xs(&engine, 0), [0.0, 1.0, 3.0]);
    }
    #[test]
    fn inactive_source_is_ignored() {
        let (mut engine, surface, _) = engine();
        engine.handle_event(&DeviceEvent::touch(TouchPhase::Start, 50.0, 50.0));
        assert!(engine.paths().is_empty());

        engine.set_input_source(InputSource::Touch);
        assert_eq!(surface.log().subscriptions.len(), 4);
        assert!(surface
            .log()
            .kinds()
            .iter()
            .all(|kind| matches!(
                kind,
                EventKind::TouchStart
                    | EventKind::TouchMove
                    | EventKind::TouchEnd
                    | EventKind::TouchCancel
            )));
        engine.handle_event(&mouse(MousePhase::Down, 1.0, 1.0));
        assert!(engine.paths().is_empty());
        engine.handle_event(&DeviceEvent::touch(TouchPhase::Start, 50.0, 50.0));
        engine.handle_event(&DeviceEvent::touch(TouchPhase::Cancel, 60.0, 50.0));
        assert_eq!(xs(&engine, 0), [40.0, 50.0]);
    }
    #[test]
    fn pen_mode_clicks() {
        let (mut engine, surface, _) = engine();
        engine.set_mode(InputMode::Pen);
        assert_eq!(surface.log().kinds(), [EventKind::Click]);
        let click = |x: f32, inside| DeviceEvent::Click {
            client: [x + RECT.left, RECT.top],
            inside,
        };
        engine.handle_event(&click(1.0, true));
        engine.handle_event(&click(2.0, true));
        // Pen clicks are never throttled.
        assert_eq!(engine.next_deadline(), None);
        engine.handle_event(&click(3.0, true));
        engine.handle_event(&click(500.0, false));
        assert_eq!(engine.draw_state(), DrawState::Idle);
        engine.handle_event(&click(9.0, true));
        assert_eq!(engine.paths().len(), 2);
        assert_eq!(xs(&engine, 0), [1.0, 2.0, 3.0]);
        assert_eq!(xs(&engine, 1), [9.0]);
    }
    #[test]
    fn mode_switch_commits_open_path() {
        let (mut engine, _, _) = engine();
        engine.handle_event(&mouse(MousePhase::Down, 0.0, 0.0));
        engine.set_mode(InputMode::Pen);
        assert_eq!(engine.draw_state(), DrawState::Idle);
        assert_eq!(engine.paths().len(), 1);
        assert!(!engine.document().is_previewing());
        // The old listener set is gone.
        engine.handle_event(&mouse(MousePhase::Move, 5.0, 5.0));
        assert_eq!(xs(&engine, 0), [0.0]);
    }
    #[test]
    fn undo_redo_and_clear() {
        let (mut engine, surface, _) = engine();
        for x in [1.0, 2.0] {
            engine.handle_event(&mouse(MousePhase::Down, x, x));
            engine.handle_event(&mouse(MousePhase::Up, x, x));
        }
        let two = engine.serialize().unwrap();
        assert!(engine.undo());
        assert_eq!(engine.paths().len(), 1);
        assert!(engine.redo());
        assert_eq!(engine.serialize().unwrap(), two);
        assert!(!engine.redo());
        assert_eq!(surface.log().presented.last(), Some(&two));

        engine.clear();
        assert!(engine.paths().is_empty());
        assert!(!engine.undo());
        assert!(!engine.redo());
    }
    #[test]
    fn undo_while_drawing_commits_first() {
        let (mut engine, _, _) = engine();
        engine.handle_event(&mouse(MousePhase::Down, 1.0, 1.0));
        engine.handle_event(&mouse(MousePhase::Move, 2.0, 2.0));
        assert!(engine.undo());
        assert!(engine.paths().is_empty());
        assert!(engine.redo());
        assert_eq!(xs(&engine, 0), [1.0, 2.0]);
        // Further input of the interrupted gesture is ignored.
        engine.handle_event(&mouse(MousePhase::Move, 3.0, 3.0));
        assert_eq!(xs(&engine, 0), [1.0, 2.0]);
    }
    #[test]
    fn style_applies_to_next_path() {
        let (mut engine, _, _) = engine();
        engine.handle_event(&mouse(MousePhase::Down, 1.0, 1.0));
        engine.set_stroke("red");
        engine.set_stroke_width(4.0);
        engine.handle_event(&mouse(MousePhase::Up, 2.0, 2.0));
        engine.handle_event(&mouse(MousePhase::Down, 3.0, 3.0));
        engine.handle_event(&mouse(MousePhase::Up, 4.0, 4.0));
        let [first, second] = engine.paths() else {
            panic!("expected two paths");
        };
        assert_eq!(first.style.stroke, Paint::Color(Color::BLACK));
        assert_eq!(second.style.stroke, Paint::Color(Color::opaque(255, 0, 0)));
        assert!((second.style.stroke_width.get() - 4.0).abs() < f32::EPSILON);
    }
    #[test]
    fn invalid_settings_are_ignored() {
        let (mut engine, _, _) = engine();
        let style = engine.style();
        engine.set_fill("not a color");
        engine.set_stroke("");
        engine.set_stroke_width(-2.0);
        engine.set_stroke_width(f32::NAN);
        engine.change_throttle(-5.0);
        engine.change_throttle(f64::INFINITY);
        assert_eq!(engine.style(), style);
        assert_eq!(engine.throttle_interval(), ms(20));
        engine.change_throttle(50.0);
        assert_eq!(engine.throttle_interval(), ms(50));
    }
    #[test]
    fn change_throttle_keeps_gesture() {
        let (mut engine, _, clock) = engine();
        engine.handle_event(&mouse(MousePhase::Down, 0.0, 0.0));
        engine.handle_event(&mouse(MousePhase::Move, 1.0, 0.0));
        engine.handle_event(&mouse(MousePhase::Move, 2.0, 0.0));
        engine.change_throttle(100.0);
        // Pending sample dropped, not fired early.
        assert_eq!(engine.next_deadline(), None);
        assert!(matches!(engine.draw_state(), DrawState::Drawing { .. }));
        clock.advance(ms(1));
        engine.handle_event(&mouse(MousePhase::Move, 3.0, 0.0));
        engine.handle_event(&mouse(MousePhase::Up, 4.0, 0.0));
        assert_eq!(xs(&engine, 0), [0.0, 1.0, 3.0, 4.0]);
    }
    #[test]
    fn resize_mid_gesture() {
        let (mut engine, surface, _) = engine();
        engine.handle_event(&mouse(MousePhase::Down, 10.0, 10.0));
        engine.handle_event(&DeviceEvent::Resize {
            width: 400.0,
            height: 300.0,
        });
        assert!(matches!(engine.draw_state(), DrawState::Drawing { .. }));
        assert_eq!(engine.document().size(), [400.0, 300.0]);
        // The surface also moved; the next event queries it fresh.
        surface.set_rect(Rect {
            left: 0.0,
            top: 0.0,
            width: 500.0,
            height: 300.0,
        });
        engine.handle_event(&DeviceEvent::mouse(MousePhase::Up, 30.0, 30.0));
        assert_eq!(engine.size(), [500.0, 300.0]);
        assert_eq!(xs(&engine, 0), [10.0, 30.0]);
        assert!(engine.serialize().unwrap().contains(r#"width="500""#));
    }
    #[test]
    fn teardown_detaches_everything() {
        let (mut engine, surface, clock) = engine();
        engine.handle_event(&mouse(MousePhase::Down, 0.0, 0.0));
        engine.handle_event(&mouse(MousePhase::Move, 1.0, 0.0));
        engine.handle_event(&mouse(MousePhase::Move, 2.0, 0.0));
        engine.teardown();
        assert!(surface.log().subscriptions.is_empty());
        assert_eq!(engine.next_deadline(), None);
        // Open path was committed before detaching.
        assert_eq!(xs(&engine, 0), [0.0, 1.0]);

        let presented = surface.log().presented.len();
        clock.advance(ms(100));
        engine.poll_timers();
        engine.handle_event(&mouse(MousePhase::Down, 5.0, 5.0));
        engine.clear();
        engine.set_mode(InputMode::Pen);
        assert_eq!(engine.paths().len(), 1);
        assert!(surface.log().subscriptions.is_empty());
        assert_eq!(surface.log().presented.len(), presented);
        assert_eq!(
            engine.attach_backend(Ok(svg_module() as &'static dyn GeometryModule)),
            Err(InitError::TornDown)
        );
        engine.teardown();
    }
    #[test]
    fn drop_unsubscribes() {
        let (engine, surface, _) = engine();
        assert!(!surface.log().subscriptions.is_empty());
        drop(engine);
        assert!(surface.log().subscriptions.is_empty());
    }
    #[test]
    fn config_is_applied() {
        let config = EngineConfig {
            mode: InputMode::Pen,
            fill: "#ff000080".into(),
            stroke_width: 0.0,
            throttle_ms: 35.0,
            ..EngineConfig::default()
        };
        let (engine, surface, _) = engine_with(&config);
        assert_eq!(surface.log().kinds(), [EventKind::Click]);
        assert_eq!(engine.throttle_interval(), ms(35));
        assert_eq!(engine.style().fill.color().map(|c| c.a), Some(0x80));
        // Invalid width kept the default.
        assert!((engine.style().stroke_width.get() - 1.0).abs() < f32::EPSILON);
        assert!(engine.options().smooth);
    }
    #[test]
    fn markup_changes_with_a_point() {
        let (mut engine, _, _) = engine();
        let empty = engine.serialize().unwrap();
        assert!(empty.contains(r#"height="100""#));
        engine.handle_event(&mouse(MousePhase::Down, 5.0, 5.0));
        engine.handle_event(&mouse(MousePhase::Up, 5.0, 5.0));
        assert_ne!(engine.serialize().unwrap(), empty);
        assert!(engine
            .svg_data_url()
            .unwrap()
            .starts_with("data:image/svg+xml;base64,"));
    }
    #[tokio::test]
    async fn downloads() {
        let (mut engine, _, _) = engine();
        engine.handle_event(&mouse(MousePhase::Down, 5.0, 5.0));
        engine.handle_event(&mouse(MousePhase::Up, 5.0, 5.0));

        let svg = engine.download(ExportFormat::Svg).await.unwrap();
        assert_eq!(svg.bytes, engine.serialize().unwrap().into_bytes());
        assert!(svg.filename.ends_with(".svg"));

        let png = engine.download(ExportFormat::Png).await.unwrap();
        assert_eq!(png.mime(), "image/png");
        let decoded = image::load_from_memory(&png.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 100));

        let first = engine.rasterize(ExportFormat::Jpg);
        let second = engine.download(ExportFormat::Png);
        assert!(matches!(second.await, Err(ExportError::Busy)));
        assert!(first.await.is_ok());

        engine.teardown();
        assert!(matches!(
            engine.download(ExportFormat::Svg).await,
            Err(ExportError::Unavailable)
        ));
    }
    #[test]
    fn end_without_position_still_ends() {
        let config = EngineConfig {
            input_source: InputSource::Touch,
            ..EngineConfig::default()
        };
        let (mut engine, _, _) = engine_with(&config);
        engine.handle_event(&DeviceEvent::touch(TouchPhase::Start, 50.0, 50.0));
        engine.handle_event(&DeviceEvent::Touch {
            phase: TouchPhase::End,
            changed: smallvec::SmallVec::new(),
        });
        assert_eq!(engine.draw_state(), DrawState::Idle);
        assert!(!engine.document().is_previewing());
        // Stray moves don't grow the finished path.
        engine.handle_event(&DeviceEvent::touch(TouchPhase::Move, 60.0, 50.0));
        assert_eq!(xs(&engine, 0), [40.0]);

        engine.handle_event(&DeviceEvent::touch(TouchPhase::Start, 70.0, 50.0));
        engine.handle_event(&DeviceEvent::touch(TouchPhase::Cancel, f32::INFINITY, 5.0));
        assert_eq!(engine.draw_state(), DrawState::Idle);
        assert_eq!(engine.paths().len(), 2);
        assert_eq!(xs(&engine, 1), [60.0]);
    }
    #[test]
    fn config_change_relistens() {
        let (mut engine, surface, clock) = engine();
        assert!(surface
            .log()
            .subscriptions
            .values()
            .all(|(_, options)| !options.passive));
        let config = EngineConfig {
            passive_listeners: true,
            throttle_edges: ThrottleOptions {
                leading: false,
                trailing: true,
            },
            ..EngineConfig::default()
        };
        engine.apply_config(&config);
        assert_eq!(surface.log().subscriptions.len(), 4);
        assert!(surface
            .log()
            .subscriptions
            .values()
            .all(|(_, options)| options.passive));
        // Without a leading edge, the first move waits for the window to close.
        engine.handle_event(&mouse(MousePhase::Down, 0.0, 0.0));
        engine.handle_event(&mouse(MousePhase::Move, 1.0, 0.0));
        assert_eq!(xs(&engine, 0), [0.0]);
        assert_eq!(engine.next_deadline(), Some(clock.now() + ms(20)));
    }

    /// Keeps geometry like the SVG backend, but always serializes a blank document.
    struct BlankBackend(SvgBackend);
    impl GeometryBackend for BlankBackend {
        fn create_path(&mut self, options: PathOptions) -> PathHandle {
            self.0.create_path(options)
        }
        fn path_append_point(&mut self, handle: PathHandle, point: Point) {
            self.0.path_append_point(handle, point);
        }
        fn path_set_style(&mut self, handle: PathHandle, style: &PathStyle) {
            self.0.path_set_style(handle, style);
        }
        fn path_release(&mut self, handle: PathHandle) {
            self.0.path_release(handle);
        }
        fn document_add_path(&mut self, path: &Path) {
            self.0.document_add_path(path);
        }
        fn document_update_path(&mut self, path: &Path) {
            self.0.document_update_path(path);
        }
        fn document_remove_last(&mut self) -> Option<Path> {
            self.0.document_remove_last()
        }
        fn document_serialize(&self) -> String {
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100"/>"#.to_owned()
        }
        fn document_resize(&mut self, width: f32, height: f32) {
            self.0.document_resize(width, height);
        }
    }
    struct BlankModule;
    impl GeometryModule for BlankModule {
        fn name(&self) -> &'static str {
            "blank"
        }
        fn create_document(&self, width: f32, height: f32) -> Box<dyn GeometryBackend> {
            Box::new(BlankBackend(SvgBackend::new(width, height)))
        }
    }
    static BLANK: BlankModule = BlankModule;

    #[tokio::test]
    async fn raster_follows_backend_markup() {
        let draw = |engine: &mut Engine| {
            engine.set_stroke_width(6.0);
            engine.handle_event(&mouse(MousePhase::Down, 0.0, 10.0));
            engine.handle_event(&mouse(MousePhase::Up, 50.0, 10.0));
        };
        let (mut drawn, _, _) = engine();
        draw(&mut drawn);
        let png = drawn.download(ExportFormat::Png).await.unwrap();
        let decoded = image::load_from_memory(&png.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(20, 10).0, [0, 0, 0, 255]);

        let surface = FakeSurface::new(RECT);
        let mut blank = Engine::new(
            Box::new(surface),
            Box::new(ManualClock::default()),
            &EngineConfig::default(),
        );
        blank
            .attach_backend(Ok(&BLANK as &'static dyn GeometryModule))
            .unwrap();
        draw(&mut blank);
        assert_eq!(blank.paths().len(), 1);
        let png = blank.download(ExportFormat::Png).await.unwrap();
        let decoded = image::load_from_memory(&png.bytes).unwrap().to_rgba8();
        assert!(decoded.pixels().all(|pixel| pixel.0[3] == 0));
    }
}
