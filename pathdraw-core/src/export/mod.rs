//! # Export
//!
//! Turns the document into something a host can save: SVG markup, or a raster image encoded as
//! PNG or JPEG. Saving the result is the host's business.
//!
//! Rasterization works from a [`Scene`]: the backend's serialized markup, taken synchronously, so
//! the document can keep changing while a render is in flight and the raster always shows what the
//! markup says. Only one render may be in flight per pipeline.

pub mod raster;

#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    strum::EnumIter,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Svg,
    Png,
    #[strum(to_string = "jpg", serialize = "jpeg")]
    #[serde(alias = "jpeg")]
    Jpg,
}
impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
        }
    }
    #[must_use]
    pub fn is_raster(self) -> bool {
        !matches!(self, Self::Svg)
    }
}

/// An exported file, ready to be saved.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Blob {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    /// `<unix millis>.<ext>`
    pub filename: String,
}
impl Blob {
    #[must_use]
    pub fn new(format: ExportFormat, bytes: Vec<u8>) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        Self {
            format,
            bytes,
            filename: format!("{millis}.{}", format.extension()),
        }
    }
    #[must_use]
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }
}

/// A frozen copy of everything a render needs.
#[derive(Clone, Debug)]
pub struct Scene {
    /// Canvas size. The markup is scaled to fit it.
    pub width: f32,
    pub height: f32,
    /// Complete SVG markup, as a backend serialized it.
    pub markup: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("another export is still in progress")]
    Busy,
    #[error("no geometry backend is attached")]
    Unavailable,
    #[error("cannot rasterize an empty surface")]
    EmptySurface,
    #[error("surface of {width}x{height} is too large to rasterize")]
    TooLarge { width: f32, height: f32 },
    #[error("{0} is not a raster format")]
    NotRaster(ExportFormat),
    #[error("unreadable markup: {0}")]
    Markup(#[from] usvg::Error),
    #[error(transparent)]
    Tessellation(#[from] lyon_tessellation::TessellationError),
    #[error(transparent)]
    Encode(#[from] image::ImageError),
    #[error("render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// `data:` URL of some SVG markup.
#[must_use]
pub fn svg_data_url(markup: &str) -> String {
    use base64::Engine;
    format!(
        "data:image/svg+xml;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(markup)
    )
}

pub struct ExportPipeline {
    in_flight: std::sync::Arc<tokio::sync::Semaphore>,
    jpeg_quality: u8,
}
impl ExportPipeline {
    #[must_use]
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            in_flight: std::sync::Arc::new(tokio::sync::Semaphore::new(1)),
            jpeg_quality,
        }
    }
    #[must_use]
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }
    pub fn set_jpeg_quality(&mut self, quality: u8) {
        self.jpeg_quality = quality;
    }
    /// Whether a rasterization currently holds the pipeline.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.available_permits() == 0
    }
    /// Wrap markup as an SVG blob. Never busy, SVG export is synchronous.
    #[must_use]
    pub fn svg(markup: String) -> Blob {
        Blob::new(ExportFormat::Svg, markup.into_bytes())
    }
    /// Render and encode the scene.
    ///
    /// The in-flight slot is claimed *now*, not when the future is first polled, so a second call
    /// made before this one resolves is rejected with [`ExportError::Busy`] regardless of polling
    /// order. Must be awaited inside a tokio runtime.
    pub fn rasterize(
        &self,
        scene: Scene,
        format: ExportFormat,
    ) -> impl std::future::Future<Output = Result<Blob, ExportError>> + Send + 'static {
        let permit = self.in_flight.clone().try_acquire_owned();
        let quality = self.jpeg_quality;
        async move {
            let _permit = permit.map_err(|_| ExportError::Busy)?;
            if !format.is_raster() {
                return Err(ExportError::NotRaster(format));
            }
            raster::pixel_size(&scene)?;
            log::debug!(
                "rasterizing {} bytes of markup at {}x{} as {format}",
                scene.markup.len(),
                scene.width,
                scene.height
            );
            let bytes = tokio::task::spawn_blocking(move || {
                let canvas = raster::render(&scene, format)?;
                raster::encode(canvas, format, quality)
            })
            .await??;
            Ok::<_, ExportError>(Blob::new(format, bytes))
        }
    }
}
impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_JPEG_QUALITY)
    }
}
