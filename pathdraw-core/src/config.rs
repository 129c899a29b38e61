//! # Engine configuration
//!
//! Host-facing settings, in the loose types hosts speak (strings for colors, floats for widths and
//! milliseconds). Validation happens when the engine applies them: anything invalid is logged and
//! the previous good value stays.

use crate::input::{InputMode, InputSource};
use crate::throttle::ThrottleOptions;
use crate::util::NumberError;

pub const DEFAULT_THROTTLE_MS: f64 = 20.0;
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum time between two freehand samples.
    pub throttle_ms: f64,
    pub throttle_edges: ThrottleOptions,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f32,
    /// Close new paths back to their first point.
    pub path_close: bool,
    /// Trace new paths with curves through their points.
    pub path_circular: bool,
    pub mode: InputMode,
    pub input_source: InputSource,
    /// Register listeners as passive. Off by default: drawing cancels scrolling on touch surfaces.
    pub passive_listeners: bool,
    pub jpeg_quality: u8,
}
impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            throttle_ms: DEFAULT_THROTTLE_MS,
            throttle_edges: ThrottleOptions::default(),
            fill: "none".to_owned(),
            stroke: "#000".to_owned(),
            stroke_width: 1.0,
            path_close: false,
            path_circular: true,
            mode: InputMode::default(),
            input_source: InputSource::default(),
            passive_listeners: false,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Convert a host millisecond count into a throttle interval. Zero is allowed and disables
/// throttling in effect.
pub fn throttle_interval(ms: f64) -> Result<std::time::Duration, NumberError> {
    if !ms.is_finite() {
        return Err(NumberError::NotFinite);
    }
    if ms < 0.0 {
        return Err(NumberError::Negative);
    }
    use az::CheckedAs;
    let nanos: u64 = (ms * 1_000_000.0)
        .round()
        .checked_as()
        .ok_or(NumberError::NotFinite)?;
    Ok(std::time::Duration::from_nanos(nanos))
}
