//! Software rasterization of a [`Scene`]. The scene's markup is parsed with usvg, every path is
//! tessellated with lyon, each tessellation is scan-converted into a sampled coverage mask, and
//! masks are composited bottom to top in document order.
//!
//! Only solid paints are drawn. Four samples per pixel give a coarse antialiasing.

use super::{ExportError, ExportFormat, Scene};
use crate::color::Color;

/// Past this, a canvas is almost certainly a host bug rather than a real surface.
pub const MAX_DIMENSION: u32 = 16384;

/// Consumes lyon tessellator events into positions plus triangle index triples.
struct TriangleSink<'data> {
    vertices: &'data mut Vec<[f32; 2]>,
    triangles: &'data mut Vec<[u32; 3]>,
    // Past-the-end positions for when the last begin_geometry was called.
    begin_triangle_pos: usize,
    begin_vertex_pos: u32,
}
impl<'data> TriangleSink<'data> {
    fn new(vertices: &'data mut Vec<[f32; 2]>, triangles: &'data mut Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            begin_triangle_pos: 0,
            begin_vertex_pos: 0,
        }
    }
    fn push_vertex(
        &mut self,
        position: lyon_tessellation::math::Point,
    ) -> Result<lyon_tessellation::VertexId, lyon_tessellation::GeometryBuilderError> {
        self.vertices.push([position.x, position.y]);
        let index = self.vertices.len() - 1;
        u32::try_from(index)
            .map_err(|_| lyon_tessellation::GeometryBuilderError::TooManyVertices)
            .map(lyon_tessellation::VertexId)
    }
}
impl lyon_tessellation::GeometryBuilder for TriangleSink<'_> {
    fn begin_geometry(&mut self) {
        self.begin_triangle_pos = self.triangles.len();
        self.begin_vertex_pos = az::wrapping_cast(self.vertices.len());
    }
    fn add_triangle(
        &mut self,
        a: lyon_tessellation::VertexId,
        b: lyon_tessellation::VertexId,
        c: lyon_tessellation::VertexId,
    ) {
        use az::CheckedAs;
        let min = self.begin_vertex_pos;
        let Some(max) = self
            .vertices
            .len()
            .checked_sub(1)
            .and_then(CheckedAs::checked_as::<u32>)
        else {
            return;
        };
        let [a, b, c] = [a.0, b.0, c.0];
        // Lyon promises indices from the current geometry. Drop the triangle if not.
        if [a, b, c].iter().all(|&i| min <= i && i <= max) {
            self.triangles.push([a, b, c]);
        } else {
            debug_assert!(false, "bad index requested");
        }
    }
    fn abort_geometry(&mut self) {
        self.vertices.truncate(self.begin_vertex_pos as usize);
        self.triangles.truncate(self.begin_triangle_pos);
    }
}
impl lyon_tessellation::FillGeometryBuilder for TriangleSink<'_> {
    fn add_fill_vertex(
        &mut self,
        vertex: lyon_tessellation::FillVertex,
    ) -> Result<lyon_tessellation::VertexId, lyon_tessellation::GeometryBuilderError> {
        self.push_vertex(vertex.position())
    }
}
impl lyon_tessellation::StrokeGeometryBuilder for TriangleSink<'_> {
    fn add_stroke_vertex(
        &mut self,
        vertex: lyon_tessellation::StrokeVertex,
    ) -> Result<lyon_tessellation::VertexId, lyon_tessellation::GeometryBuilderError> {
        self.push_vertex(vertex.position())
    }
}

/// Build a lyon path from parsed path data, mapped through `transform`.
fn lyon_path(
    data: &usvg::tiny_skia_path::Path,
    transform: usvg::Transform,
) -> lyon_tessellation::path::Path {
    use lyon_tessellation::math::point;
    use usvg::tiny_skia_path::PathSegment;
    let map = |mut p: usvg::tiny_skia_path::Point| {
        transform.map_points(std::slice::from_mut(&mut p));
        point(p.x, p.y)
    };
    let mut builder = lyon_tessellation::path::Path::builder();
    let mut open = false;
    let mut last = point(0.0, 0.0);
    for segment in data.segments() {
        match segment {
            PathSegment::MoveTo(to) => {
                if open {
                    builder.end(false);
                }
                last = map(to);
                builder.begin(last);
                open = true;
            }
            PathSegment::Close => {
                if open {
                    builder.end(true);
                    open = false;
                }
            }
            drawing => {
                // A subpath may continue from where a closed one ended.
                if !open {
                    builder.begin(last);
                    open = true;
                }
                match drawing {
                    PathSegment::LineTo(to) => {
                        last = map(to);
                        builder.line_to(last);
                    }
                    PathSegment::QuadTo(ctrl, to) => {
                        last = map(to);
                        builder.quadratic_bezier_to(map(ctrl), last);
                    }
                    PathSegment::CubicTo(ctrl1, ctrl2, to) => {
                        last = map(to);
                        builder.cubic_bezier_to(map(ctrl1), map(ctrl2), last);
                    }
                    PathSegment::MoveTo(_) | PathSegment::Close => (),
                }
            }
        }
    }
    if open {
        builder.end(false);
    }
    builder.build()
}

/// Coverage samples per pixel, on a 2x2 grid.
const SAMPLES: usize = 4;
const SAMPLE_OFFSETS: [[f32; 2]; SAMPLES] = [[0.25, 0.25], [0.75, 0.25], [0.25, 0.75], [0.75, 0.75]];

/// Sample coverage of one shape, [`SAMPLES`] bits per pixel, row-major.
struct Mask {
    width: u32,
    height: u32,
    bits: bitvec::vec::BitVec,
}
impl Mask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: bitvec::vec::BitVec::repeat(false, width as usize * height as usize * SAMPLES),
        }
    }
    fn clear(&mut self) {
        self.bits.fill(false);
    }
    /// Mark every sample that lies in the triangle. Either winding is accepted.
    fn fill_triangle(&mut self, [a, b, c]: [[f32; 2]; 3]) {
        use az::SaturatingAs;
        let edge = |p: [f32; 2], q: [f32; 2], r: [f32; 2]| {
            (q[0] - p[0]) * (r[1] - p[1]) - (q[1] - p[1]) * (r[0] - p[0])
        };
        let area = edge(a, b, c);
        if area == 0.0 || !area.is_finite() {
            return;
        }
        let min_x: u32 = a[0].min(b[0]).min(c[0]).floor().saturating_as();
        let min_y: u32 = a[1].min(b[1]).min(c[1]).floor().saturating_as();
        let max_x: u32 = a[0].max(b[0]).max(c[0]).ceil().saturating_as();
        let max_y: u32 = a[1].max(b[1]).max(c[1]).ceil().saturating_as();
        for y in min_y..max_y.min(self.height) {
            for x in min_x..max_x.min(self.width) {
                let pixel = (y * self.width + x) as usize * SAMPLES;
                for (sample, [dx, dy]) in SAMPLE_OFFSETS.iter().enumerate() {
                    #[allow(clippy::cast_precision_loss)]
                    let at = [x as f32 + dx, y as f32 + dy];
                    let w0 = edge(b, c, at) * area.signum();
                    let w1 = edge(c, a, at) * area.signum();
                    let w2 = edge(a, b, at) * area.signum();
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        self.bits.set(pixel + sample, true);
                    }
                }
            }
        }
    }
    fn fill(&mut self, vertices: &[[f32; 2]], triangles: &[[u32; 3]]) {
        for &[a, b, c] in triangles {
            let (Some(&a), Some(&b), Some(&c)) = (
                vertices.get(a as usize),
                vertices.get(b as usize),
                vertices.get(c as usize),
            ) else {
                continue;
            };
            self.fill_triangle([a, b, c]);
        }
    }
    /// Source-over `color` onto every covered pixel of `canvas`, scaled by sample coverage.
    fn composite(&self, canvas: &mut image::RgbaImage, color: [u8; 4]) {
        use az::SaturatingAs;
        for (index, samples) in self.bits.chunks_exact(SAMPLES).enumerate() {
            let covered = samples.count_ones();
            if covered == 0 {
                continue;
            }
            // `index` is always in-bounds of a mask built with the canvas size.
            #[allow(clippy::cast_possible_truncation)]
            let (x, y) = (index as u32 % self.width, index as u32 / self.width);
            let [r, g, b, a] = color;
            let alpha: u8 = (u32::from(a) * covered as u32 / SAMPLES as u32).saturating_as();
            let pixel = canvas.get_pixel_mut(x, y);
            pixel.0 = blend(pixel.0, [r, g, b, alpha]);
        }
    }
}

/// Straight-alpha source-over.
fn blend(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    use az::SaturatingAs;
    let sa = f32::from(src[3]) / 255.0;
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0; 4];
    }
    let channel = |s: u8, d: u8| -> u8 {
        let value = (f32::from(s) * sa + f32::from(d) * da * (1.0 - sa)) / out_a;
        value.round().saturating_as()
    };
    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round().saturating_as(),
    ]
}

/// A flat color with opacity applied, or `None` for paints this renderer can't draw.
fn solid(paint: &usvg::Paint, opacity: f32) -> Option<[u8; 4]> {
    use az::SaturatingAs;
    match paint {
        usvg::Paint::Color(usvg::Color { red, green, blue }) => {
            Some([*red, *green, *blue, (opacity * 255.0).round().saturating_as()])
        }
        _ => {
            log::trace!("skipping non-solid paint");
            None
        }
    }
}

/// Pixel size of a scene, rounding partial pixels up.
pub fn pixel_size(scene: &Scene) -> Result<[u32; 2], ExportError> {
    use az::CheckedAs;
    let width: Option<u32> = scene.width.ceil().checked_as();
    let height: Option<u32> = scene.height.ceil().checked_as();
    match (width, height) {
        (Some(0), _) | (_, Some(0)) => Err(ExportError::EmptySurface),
        (Some(width), Some(height)) if width <= MAX_DIMENSION && height <= MAX_DIMENSION => {
            Ok([width, height])
        }
        _ => Err(ExportError::TooLarge {
            width: scene.width,
            height: scene.height,
        }),
    }
}

/// Reusable tessellation state for drawing one tree.
struct Painter {
    fill_tessellator: lyon_tessellation::FillTessellator,
    stroke_tessellator: lyon_tessellation::StrokeTessellator,
    mask: Mask,
    // Reused across paths to amortize allocation.
    vertices: Vec<[f32; 2]>,
    triangles: Vec<[u32; 3]>,
    /// Maps the markup's user space onto the canvas.
    base: usvg::Transform,
}
impl Painter {
    fn draw_group(
        &mut self,
        group: &usvg::Group,
        canvas: &mut image::RgbaImage,
    ) -> Result<(), ExportError> {
        for node in group.children() {
            match node {
                usvg::Node::Group(group) => self.draw_group(group, canvas)?,
                usvg::Node::Path(path) => self.draw_path(path, canvas)?,
                _ => log::trace!("skipping non-path node"),
            }
        }
        Ok(())
    }
    fn draw_path(
        &mut self,
        path: &usvg::Path,
        canvas: &mut image::RgbaImage,
    ) -> Result<(), ExportError> {
        if !path.is_visible() {
            return Ok(());
        }
        let transform = self.base.pre_concat(path.abs_transform());
        let outline = lyon_path(path.data(), transform);
        if let Some(fill) = path.fill() {
            if let Some(color) = solid(fill.paint(), fill.opacity().get()) {
                let options = match fill.rule() {
                    usvg::FillRule::NonZero => lyon_tessellation::FillOptions::non_zero(),
                    usvg::FillRule::EvenOdd => lyon_tessellation::FillOptions::even_odd(),
                };
                self.vertices.clear();
                self.triangles.clear();
                self.fill_tessellator.tessellate_path(
                    &outline,
                    &options,
                    &mut TriangleSink::new(&mut self.vertices, &mut self.triangles),
                )?;
                self.paint(canvas, color);
            }
        }
        if let Some(stroke) = path.stroke() {
            if let Some(color) = solid(stroke.paint(), stroke.opacity().get()) {
                // Mean axis scale, so widths follow a resized canvas.
                let scale = (transform.sx.hypot(transform.ky) + transform.kx.hypot(transform.sy)) / 2.0;
                let options = lyon_tessellation::StrokeOptions::default()
                    .with_line_width(stroke.width().get() * scale)
                    .with_line_cap(match stroke.linecap() {
                        usvg::LineCap::Butt => lyon_tessellation::LineCap::Butt,
                        usvg::LineCap::Round => lyon_tessellation::LineCap::Round,
                        usvg::LineCap::Square => lyon_tessellation::LineCap::Square,
                    })
                    .with_line_join(match stroke.linejoin() {
                        usvg::LineJoin::Miter => lyon_tessellation::LineJoin::Miter,
                        usvg::LineJoin::MiterClip => lyon_tessellation::LineJoin::MiterClip,
                        usvg::LineJoin::Round => lyon_tessellation::LineJoin::Round,
                        usvg::LineJoin::Bevel => lyon_tessellation::LineJoin::Bevel,
                    });
                self.vertices.clear();
                self.triangles.clear();
                self.stroke_tessellator.tessellate_path(
                    &outline,
                    &options,
                    &mut TriangleSink::new(&mut self.vertices, &mut self.triangles),
                )?;
                self.paint(canvas, color);
            }
        }
        Ok(())
    }
    fn paint(&mut self, canvas: &mut image::RgbaImage, color: [u8; 4]) {
        self.mask.clear();
        self.mask.fill(&self.vertices, &self.triangles);
        self.mask.composite(canvas, color);
    }
}

/// Draw the scene's markup onto a fresh canvas of the scene's size. JPEG has no alpha, so it gets
/// a white background.
pub fn render(scene: &Scene, format: ExportFormat) -> Result<image::RgbaImage, ExportError> {
    let [width, height] = pixel_size(scene)?;
    let tree = usvg::Tree::from_str(&scene.markup, &usvg::Options::default())?;

    let background = match format {
        ExportFormat::Jpg => image::Rgba(Color::WHITE.as_array()),
        _ => image::Rgba([0; 4]),
    };
    let mut canvas = image::RgbaImage::from_pixel(width, height, background);

    let size = tree.size();
    let mut painter = Painter {
        fill_tessellator: lyon_tessellation::FillTessellator::new(),
        stroke_tessellator: lyon_tessellation::StrokeTessellator::new(),
        mask: Mask::new(width, height),
        vertices: Vec::new(),
        triangles: Vec::new(),
        base: usvg::Transform::from_scale(
            scene.width / size.width(),
            scene.height / size.height(),
        ),
    };
    painter.draw_group(tree.root(), &mut canvas)?;
    Ok(canvas)
}

/// Encode a rendered canvas.
pub fn encode(
    canvas: image::RgbaImage,
    format: ExportFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, ExportError> {
    use image::ImageEncoder;
    let (width, height) = canvas.dimensions();
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => image::codecs::png::PngEncoder::new(&mut bytes).write_image(
            canvas.as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgba8,
        )?,
        ExportFormat::Jpg => {
            let rgb = image::DynamicImage::ImageRgba8(canvas).into_rgb8();
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, jpeg_quality.clamp(1, 100))
                .write_image(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)?;
        }
        ExportFormat::Svg => return Err(ExportError::NotRaster(format)),
    }
    Ok(bytes)
}
