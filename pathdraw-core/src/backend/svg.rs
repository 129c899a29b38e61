//! The built-in backend, emitting SVG markup through the `svg` crate.

use super::{trace, GeometryBackend, GeometryModule, PathHandle, Segment};
use crate::color::Paint;
use crate::path::{Path, PathOptions, PathStyle, Point};

#[derive(Default, Debug)]
pub struct SvgModule;
impl GeometryModule for SvgModule {
    fn name(&self) -> &'static str {
        "svg"
    }
    fn create_document(&self, width: f32, height: f32) -> Box<dyn GeometryBackend> {
        Box::new(SvgBackend::new(width, height))
    }
}

pub struct SvgBackend {
    width: f32,
    height: f32,
    paths: Vec<Path>,
    /// Paths still being built, by handle.
    open: hashbrown::HashMap<PathHandle, Path>,
}
impl SvgBackend {
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            paths: Vec::new(),
            open: hashbrown::HashMap::new(),
        }
    }
    #[must_use]
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }
    /// Number of handles created and not yet released.
    #[must_use]
    pub fn open_handles(&self) -> usize {
        self.open.len()
    }
}

/// Set a paint attribute, splitting alpha out into its `-opacity` sibling for renderers that
/// don't understand `rgba()`.
fn set_paint(element: svg::node::element::Path, name: &str, paint: Paint) -> svg::node::element::Path {
    match paint.color() {
        None => element.set(name, "none"),
        Some(color) if color.a == 255 => element.set(name, color.hex_rgb()),
        Some(color) => element
            .set(name, color.hex_rgb())
            .set(format!("{name}-opacity"), color.opacity()),
    }
}

fn element_for(path: &Path) -> svg::node::element::Path {
    use svg::node::element::path::Data;
    let data = trace(path)
        .into_iter()
        .fold(Data::new(), |data, segment| match segment {
            Segment::MoveTo([x, y]) => data.move_to((x, y)),
            Segment::LineTo([x, y]) => data.line_to((x, y)),
            Segment::QuadTo {
                ctrl: [cx, cy],
                to: [x, y],
            } => data.quadratic_curve_to((cx, cy, x, y)),
            Segment::Close => data.close(),
        });
    let element = svg::node::element::Path::new()
        .set("stroke-width", path.style.stroke_width.get())
        .set("stroke-linecap", "round")
        .set("stroke-linejoin", "round")
        .set("d", data);
    let element = set_paint(element, "fill", path.style.fill);
    set_paint(element, "stroke", path.style.stroke)
}

impl GeometryBackend for SvgBackend {
    fn create_path(&mut self, options: PathOptions) -> PathHandle {
        let handle = PathHandle::default();
        self.open
            .insert(handle, Path::new(PathStyle::default(), options));
        handle
    }
    fn path_append_point(&mut self, handle: PathHandle, point: Point) {
        if let Some(path) = self.open.get_mut(&handle) {
            path.push(point);
        }
    }
    fn path_set_style(&mut self, handle: PathHandle, style: &PathStyle) {
        if let Some(path) = self.open.get_mut(&handle) {
            path.style = *style;
        }
    }
    fn path_release(&mut self, handle: PathHandle) {
        self.open.remove(&handle);
    }
    fn document_add_path(&mut self, path: &Path) {
        self.paths.push(path.clone());
    }
    fn document_update_path(&mut self, path: &Path) {
        match self.paths.last_mut() {
            Some(last) => last.clone_from(path),
            None => self.paths.push(path.clone()),
        }
    }
    fn document_remove_last(&mut self) -> Option<Path> {
        self.paths.pop()
    }
    fn document_clear(&mut self) {
        self.paths.clear();
    }
    fn document_serialize(&self) -> String {
        let document = svg::Document::new()
            .set("xmlns", "http://www.w3.org/2000/svg")
            .set("width", self.width)
            .set("height", self.height)
            .set("viewBox", (0.0, 0.0, self.width, self.height));
        self.paths
            .iter()
            .fold(document, |document, path| document.add(element_for(path)))
            .to_string()
    }
    fn document_resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }
}
