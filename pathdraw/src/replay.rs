//! # Replay
//!
//! Scripted sessions. A script places a surface, then lists timed steps: device events as a host
//! would deliver them, and host commands. Time is virtual; throttle deadlines that fall between two
//! steps are polled exactly when they come due, so a replay is deterministic.
//!
//! ```toml
//! exports = ["svg", "png"]
//!
//! [surface]
//! left = 0.0
//! top = 0.0
//! width = 300.0
//! height = 200.0
//!
//! [[step]]
//! at_ms = 0
//! do = "mouse"
//! phase = "down"
//! x = 10.0
//! y = 10.0
//!
//! [[step]]
//! at_ms = 250
//! do = "undo"
//! ```
//!
//! Positions are in the host's absolute space, like real events.

use std::time::Duration;

use pathdraw_core::clock::{Clock, ManualClock};
use pathdraw_core::export::ExportFormat;
use pathdraw_core::host::Rect;
use pathdraw_core::input::{DeviceEvent, InputMode, InputSource, MousePhase, TouchPhase};
use pathdraw_core::Engine;

use crate::surface::HeadlessSurface;

#[derive(Copy, Clone, Debug, serde::Deserialize)]
pub struct SurfaceRect {
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub top: f32,
    pub width: f32,
    pub height: f32,
}
impl From<SurfaceRect> for Rect {
    fn from(rect: SurfaceRect) -> Self {
        Self {
            left: rect.left,
            top: rect.top,
            width: rect.width,
            height: rect.height,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct Script {
    pub surface: SurfaceRect,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub exports: Vec<ExportFormat>,
}

#[derive(Debug, serde::Deserialize)]
pub struct Step {
    /// Offset from the start of the replay. Steps must be in order.
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Copy, Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Down,
    Move,
    Up,
    /// Mouse only: left the surface.
    Leave,
    /// Touch only.
    Cancel,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(tag = "do", rename_all = "snake_case")]
pub enum Action {
    Mouse { phase: Phase, x: f32, y: f32 },
    Touch { phase: Phase, x: f32, y: f32 },
    /// Inside or outside is decided by the surface's current rect.
    Click { x: f32, y: f32 },
    Resize { width: f32, height: f32 },
    /// The surface moved without changing size.
    Reposition { left: f32, top: f32 },
    Undo,
    Redo,
    Clear,
    Throttle { ms: f64 },
    Fill { color: String },
    Stroke { color: String },
    Width { width: f32 },
    Close { enabled: bool },
    Circular { enabled: bool },
    Mode { mode: InputMode },
    Source { source: InputSource },
}

#[derive(thiserror::Error, Debug)]
pub enum ScriptError {
    #[error("step {index} at {at_ms}ms is earlier than the step before it")]
    OutOfOrder { index: usize, at_ms: u64 },
    #[error("{phase:?} is not a {device} phase")]
    BadPhase { phase: Phase, device: &'static str },
}

impl Action {
    /// The device event this action delivers, if it is one.
    fn event(&self, surface: &HeadlessSurface) -> Result<Option<DeviceEvent>, ScriptError> {
        Ok(Some(match *self {
            Self::Mouse { phase, x, y } => {
                let phase = match phase {
                    Phase::Down => MousePhase::Down,
                    Phase::Move => MousePhase::Move,
                    Phase::Up => MousePhase::Up,
                    Phase::Leave => MousePhase::Leave,
                    Phase::Cancel => {
                        return Err(ScriptError::BadPhase {
                            phase,
                            device: "mouse",
                        })
                    }
                };
                DeviceEvent::mouse(phase, x, y)
            }
            Self::Touch { phase, x, y } => {
                let phase = match phase {
                    Phase::Down => TouchPhase::Start,
                    Phase::Move => TouchPhase::Move,
                    Phase::Up => TouchPhase::End,
                    Phase::Cancel => TouchPhase::Cancel,
                    Phase::Leave => {
                        return Err(ScriptError::BadPhase {
                            phase,
                            device: "touch",
                        })
                    }
                };
                DeviceEvent::touch(phase, x, y)
            }
            Self::Click { x, y } => DeviceEvent::Click {
                client: [x, y],
                inside: surface.contains([x, y]),
            },
            Self::Resize { width, height } => DeviceEvent::Resize { width, height },
            _ => return Ok(None),
        }))
    }
}

/// Apply one step's action to the engine, as the host would.
fn apply(engine: &mut Engine, surface: &HeadlessSurface, action: &Action) -> Result<(), ScriptError> {
    if let Some(event) = action.event(surface)? {
        if let DeviceEvent::Resize { width, height } = event {
            surface.set_rect(Rect {
                width,
                height,
                ..surface.rect()
            });
        }
        // A real host only delivers what someone subscribed to.
        match event.kind() {
            Some(kind) if !surface.is_listened(kind) => log::trace!("nobody listens for {kind}"),
            _ => engine.handle_event(&event),
        }
        return Ok(());
    }
    match action {
        Action::Reposition { left, top } => surface.set_rect(Rect {
            left: *left,
            top: *top,
            ..surface.rect()
        }),
        Action::Undo => {
            engine.undo();
        }
        Action::Redo => {
            engine.redo();
        }
        Action::Clear => engine.clear(),
        Action::Throttle { ms } => engine.change_throttle(*ms),
        Action::Fill { color } => engine.set_fill(color),
        Action::Stroke { color } => engine.set_stroke(color),
        Action::Width { width } => engine.set_stroke_width(*width),
        Action::Close { enabled } => engine.set_path_close(*enabled),
        Action::Circular { enabled } => engine.set_path_circular(*enabled),
        Action::Mode { mode } => engine.set_mode(*mode),
        Action::Source { source } => engine.set_input_source(*source),
        // Device events were handled above.
        Action::Mouse { .. }
        | Action::Touch { .. }
        | Action::Click { .. }
        | Action::Resize { .. } => (),
    }
    Ok(())
}

/// Poll every throttle deadline up to and including `until`, advancing the clock to each.
fn run_timers(engine: &mut Engine, clock: &ManualClock, until: std::time::Instant) {
    while let Some(deadline) = engine.next_deadline().filter(|deadline| *deadline <= until) {
        clock.set(deadline);
        engine.poll_timers();
        // Polling at the deadline always fires; guard against a stuck timer anyway.
        if engine.next_deadline() == Some(deadline) {
            log::warn!("throttle deadline did not fire");
            break;
        }
    }
}

/// Play the whole script, leaving no timer pending.
pub fn replay(
    engine: &mut Engine,
    clock: &ManualClock,
    surface: &HeadlessSurface,
    script: &Script,
) -> Result<(), ScriptError> {
    let start = clock.now();
    let mut last = 0;
    for (index, step) in script.steps.iter().enumerate() {
        if step.at_ms < last {
            return Err(ScriptError::OutOfOrder {
                index,
                at_ms: step.at_ms,
            });
        }
        last = step.at_ms;
        let at = start + Duration::from_millis(step.at_ms);
        run_timers(engine, clock, at);
        clock.set(at);
        apply(engine, surface, &step.action)?;
    }
    if let Some(deadline) = engine.next_deadline() {
        run_timers(engine, clock, deadline);
    }
    Ok(())
}
