//! # Input
//!
//! Raw device events as the host surface delivers them, and their reduction to gestures.
//! Positions here are in the host's absolute (client) space; [`crate::coords`] makes them local.

use smallvec::SmallVec;

/// Freehand or point-click drawing.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    strum::EnumIter,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Press, drag, release. Moves are throttled.
    #[default]
    Pencil,
    /// Every click inside the surface adds a point; a click outside finishes the path.
    Pen,
}

/// Which device family drives pencil mode. Only one is live at a time.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    strum::EnumIter,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    #[default]
    Mouse,
    Touch,
}

/// Every event type a host can be asked to subscribe to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    MouseDown,
    MouseMove,
    MouseUp,
    MouseLeave,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
    Click,
}
impl EventKind {
    /// The listener set needed for a mode + source combination.
    #[must_use]
    pub fn listeners_for(mode: InputMode, source: InputSource) -> &'static [EventKind] {
        match (mode, source) {
            (InputMode::Pen, _) => &[Self::Click],
            (InputMode::Pencil, InputSource::Mouse) => &[
                Self::MouseDown,
                Self::MouseMove,
                Self::MouseUp,
                Self::MouseLeave,
            ],
            (InputMode::Pencil, InputSource::Touch) => &[
                Self::TouchStart,
                Self::TouchMove,
                Self::TouchEnd,
                Self::TouchCancel,
            ],
        }
    }
    /// Whether events of this kind go through the throttle.
    #[must_use]
    pub fn is_move(self) -> bool {
        matches!(self, Self::MouseMove | Self::TouchMove)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MousePhase {
    Down,
    Move,
    Up,
    /// The pointer left the surface. Ends a gesture like `Up`.
    Leave,
}
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

#[derive(Clone, PartialEq, Debug)]
pub enum DeviceEvent {
    Mouse {
        phase: MousePhase,
        client: [f32; 2],
    },
    Touch {
        phase: TouchPhase,
        /// Touches that changed in this event. Only the first one draws.
        changed: SmallVec<[[f32; 2]; 2]>,
    },
    Click {
        client: [f32; 2],
        /// Whether the click target lies within the surface.
        inside: bool,
    },
    /// The surface's content box changed size.
    Resize { width: f32, height: f32 },
}
impl DeviceEvent {
    /// The subscription this event is delivered through. `None` for resize, which is observed
    /// for the engine's whole lifetime rather than per listener set.
    #[must_use]
    pub fn kind(&self) -> Option<EventKind> {
        Some(match self {
            Self::Mouse { phase, .. } => match phase {
                MousePhase::Down => EventKind::MouseDown,
                MousePhase::Move => EventKind::MouseMove,
                MousePhase::Up => EventKind::MouseUp,
                MousePhase::Leave => EventKind::MouseLeave,
            },
            Self::Touch { phase, .. } => match phase {
                TouchPhase::Start => EventKind::TouchStart,
                TouchPhase::Move => EventKind::TouchMove,
                TouchPhase::End => EventKind::TouchEnd,
                TouchPhase::Cancel => EventKind::TouchCancel,
            },
            Self::Click { .. } => EventKind::Click,
            Self::Resize { .. } => return None,
        })
    }
    /// The absolute position this event draws at, if any.
    #[must_use]
    pub fn client_position(&self) -> Option<[f32; 2]> {
        match self {
            Self::Mouse { client, .. } | Self::Click { client, .. } => Some(*client),
            Self::Touch { changed, .. } => changed.first().copied(),
            Self::Resize { .. } => None,
        }
    }
    /// What this event means for the draw session.
    #[must_use]
    pub fn gesture(&self) -> Option<GesturePhase> {
        Some(match self {
            Self::Mouse { phase, .. } => match phase {
                MousePhase::Down => GesturePhase::Start,
                MousePhase::Move => GesturePhase::Move,
                MousePhase::Up | MousePhase::Leave => GesturePhase::End,
            },
            Self::Touch { phase, .. } => match phase {
                TouchPhase::Start => GesturePhase::Start,
                TouchPhase::Move => GesturePhase::Move,
                TouchPhase::End | TouchPhase::Cancel => GesturePhase::End,
            },
            Self::Click { inside: true, .. } => GesturePhase::Click,
            Self::Click { inside: false, .. } => GesturePhase::ClickOutside,
            Self::Resize { .. } => return None,
        })
    }
    #[must_use]
    pub fn mouse(phase: MousePhase, x: f32, y: f32) -> Self {
        Self::Mouse {
            phase,
            client: [x, y],
        }
    }
    #[must_use]
    pub fn touch(phase: TouchPhase, x: f32, y: f32) -> Self {
        Self::Touch {
            phase,
            changed: smallvec::smallvec![[x, y]],
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GesturePhase {
    Start,
    Move,
    End,
    /// Pen mode: starts a path, or extends the open one.
    Click,
    /// Pen mode: finishes the open path.
    ClickOutside,
}
