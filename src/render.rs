// Drawing-surface adapter: turns a Scene into PNG or SVG bytes with plotters

use crate::error::{BoardError, BoardResult};
use crate::ir::{polar, Anchor, Axis, Frame, Geometry, Label, Orientation, Shape, Style};
use crate::palette::Rgb;
use crate::view::Scene;
use crate::OutputFormat;
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::element::DashedPathElement;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const FONT: &str = "sans-serif";
const TICK_LENGTH: i32 = 5;
/// Angular step used when approximating arcs with polygons.
const ARC_STEP: f64 = std::f64::consts::PI / 90.0;

impl From<Rgb> for RGBColor {
    fn from(c: Rgb) -> Self {
        RGBColor(c.0, c.1, c.2)
    }
}

fn render_err<E: std::fmt::Display>(what: &str) -> impl FnOnce(E) -> BoardError + '_ {
    move |e| BoardError::render(format!("{}: {}", what, e))
}

/// Render a scene to encoded bytes.
#[tracing::instrument(level = "debug", skip_all, fields(width = frame.width, height = frame.height))]
pub fn render(scene: &Scene, frame: &Frame, format: &OutputFormat) -> BoardResult<Vec<u8>> {
    let (width, height) = (frame.width.max(1.0) as u32, frame.height.max(1.0) as u32);
    match format {
        OutputFormat::Png => render_png(scene, frame, width, height),
        OutputFormat::Svg => render_svg(scene, frame, width, height),
    }
}

/// Bytes needed for an RGB8 bitmap of the given size.
fn rgb_buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

fn render_png(scene: &Scene, frame: &Frame, width: u32, height: u32) -> BoardResult<Vec<u8>> {
    let mut buffer = vec![0u8; rgb_buffer_len(width, height)];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_scene(&root, scene, frame)?;
        root.present().map_err(render_err("Failed to present drawing"))?;
    }

    let mut png_bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png_bytes)
        .write_image(&buffer, width, height, image::ColorType::Rgb8)
        .map_err(render_err("Failed to encode PNG"))?;
    Ok(png_bytes)
}

fn render_svg(scene: &Scene, frame: &Frame, width: u32, height: u32) -> BoardResult<Vec<u8>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        draw_scene(&root, scene, frame)?;
        root.present().map_err(render_err("Failed to present drawing"))?;
    }
    Ok(svg.into_bytes())
}

fn draw_scene<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &Scene, frame: &Frame) -> BoardResult<()> {
    root.fill(&WHITE).map_err(render_err("Failed to fill background"))?;
    match scene {
        Scene::Chart { title, geometry } => {
            draw_geometry(root, geometry)?;
            let (cx, _) = frame.center();
            draw_label(root, &Label::new(cx, frame.margin.top / 2.0, title.as_str()).sized(18.0));
        }
        Scene::Placeholder { message } => draw_placeholder(root, frame, message)?,
    }
    Ok(())
}

fn draw_placeholder<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, frame: &Frame, message: &str) -> BoardResult<()> {
    let (x0, x1) = frame.x_range();
    let (y1, y0) = frame.y_range();
    let border = Shape::rect_between(x0, y0, x1, y1);
    draw_shape(root, &border, &Style::stroked(Rgb::GREY, 2.0).dashed())?;
    let (cx, cy) = frame.center();
    draw_label(root, &Label::new(cx, cy, message).sized(14.0).colored(Rgb::GREY));
    Ok(())
}

fn draw_geometry<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, geometry: &Geometry) -> BoardResult<()> {
    for primitive in &geometry.primitives {
        draw_shape(root, &primitive.shape, &primitive.style)?;
    }
    for decoration in &geometry.decorations {
        draw_shape(root, &decoration.shape, &decoration.style)?;
    }
    for axis in &geometry.axes {
        draw_axis(root, axis)?;
    }
    for label in &geometry.labels {
        draw_label(root, label);
    }
    draw_legend(root, geometry)
}

fn px(p: (f64, f64)) -> (i32, i32) {
    (p.0.round() as i32, p.1.round() as i32)
}

fn arc_points(cx: f64, cy: f64, start: f64, end: f64, inner: f64, outer: f64) -> Vec<(i32, i32)> {
    let steps = (((end - start) / ARC_STEP).ceil() as usize).max(2);
    let angle = |i: usize| start + (end - start) * i as f64 / steps as f64;
    let mut points: Vec<(i32, i32)> = (0..=steps).map(|i| px(polar(cx, cy, outer, angle(i)))).collect();
    if inner > 0.0 {
        points.extend((0..=steps).rev().map(|i| px(polar(cx, cy, inner, angle(i)))));
    } else {
        points.push(px((cx, cy)));
    }
    points
}

fn draw_shape<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, shape: &Shape, style: &Style) -> BoardResult<()> {
    let fill = style.fill.map(|c| RGBColor::from(c).mix(style.opacity).filled());
    let stroke = style
        .stroke
        .map(|c| RGBColor::from(c).mix(style.opacity).stroke_width(style.stroke_width.round().max(1.0) as u32));

    // Closed outlines are drawn as paths so they can be dashed.
    let outline: Option<Vec<(i32, i32)>> = match shape {
        Shape::Rect { x, y, width, height } => {
            let (a, b) = (px((*x, *y)), px((x + width, y + height)));
            if let Some(fill) = fill {
                root.draw(&Rectangle::new([a, b], fill)).map_err(render_err("Failed to draw rect"))?;
            }
            Some(vec![a, (b.0, a.1), b, (a.0, b.1), a])
        }
        Shape::Circle { cx, cy, r } => {
            let center = px((*cx, *cy));
            let radius = r.round() as i32;
            if let Some(fill) = fill {
                root.draw(&Circle::new(center, radius, fill)).map_err(render_err("Failed to draw circle"))?;
            }
            if let Some(stroke) = stroke {
                root.draw(&Circle::new(center, radius, stroke)).map_err(render_err("Failed to draw circle"))?;
            }
            None
        }
        Shape::Arc {
            cx,
            cy,
            start_angle,
            end_angle,
            inner_radius,
            outer_radius,
        } => {
            if end_angle <= start_angle {
                return Ok(());
            }
            let mut points = arc_points(*cx, *cy, *start_angle, *end_angle, *inner_radius, *outer_radius);
            if let Some(fill) = fill {
                root.draw(&Polygon::new(points.clone(), fill)).map_err(render_err("Failed to draw arc"))?;
            }
            points.push(points[0]);
            Some(points)
        }
        Shape::Polygon { points } => {
            let mut points: Vec<(i32, i32)> = points.iter().copied().map(px).collect();
            if points.is_empty() {
                return Ok(());
            }
            if let Some(fill) = fill {
                root.draw(&Polygon::new(points.clone(), fill)).map_err(render_err("Failed to draw polygon"))?;
            }
            points.push(points[0]);
            Some(points)
        }
        Shape::Polyline { points } => Some(points.iter().copied().map(px).collect()),
        Shape::Line { x1, y1, x2, y2 } => Some(vec![px((*x1, *y1)), px((*x2, *y2))]),
    };

    if let (Some(points), Some(stroke)) = (outline, stroke) {
        if style.dashed {
            root.draw(&DashedPathElement::new(points, 6, 4, stroke))
                .map_err(render_err("Failed to draw dashed path"))?;
        } else {
            root.draw(&PathElement::new(points, stroke)).map_err(render_err("Failed to draw path"))?;
        }
    }
    Ok(())
}

/// Text failures (e.g. no usable system font) are logged and skipped.
fn draw_label<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, label: &Label) {
    let h = match label.anchor {
        Anchor::Start => HPos::Left,
        Anchor::Middle => HPos::Center,
        Anchor::End => HPos::Right,
    };
    let color = RGBColor::from(label.color);
    let style = TextStyle::from((FONT, label.size).into_font())
        .color(&color)
        .pos(Pos::new(h, VPos::Center));
    if let Err(e) = root.draw(&Text::new(label.text.clone(), px((label.x, label.y)), style)) {
        tracing::warn!(text = %label.text, error = %e, "failed to draw label");
    }
}

fn draw_axis<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, axis: &Axis) -> BoardResult<()> {
    let stroke = Style::stroked(Rgb::STROKE, 1.0);
    let (a, b) = axis.span;
    match axis.orientation {
        Orientation::Bottom => {
            let y = axis.offset;
            draw_shape(root, &Shape::Line { x1: a, y1: y, x2: b, y2: y }, &stroke)?;
            for tick in &axis.ticks {
                let x = tick.position;
                let tip = y + TICK_LENGTH as f64;
                draw_shape(root, &Shape::Line { x1: x, y1: y, x2: x, y2: tip }, &stroke)?;
                draw_label(root, &Label::new(x, tip + 8.0, tick.label.as_str()).sized(10.0));
            }
            if let Some(title) = &axis.title {
                draw_label(root, &Label::new((a + b) / 2.0, y + 40.0, title.as_str()).sized(12.0));
            }
        }
        Orientation::Left => {
            let x = axis.offset;
            draw_shape(root, &Shape::Line { x1: x, y1: a, x2: x, y2: b }, &stroke)?;
            for tick in &axis.ticks {
                let y = tick.position;
                let tip = x - TICK_LENGTH as f64;
                draw_shape(root, &Shape::Line { x1: tip, y1: y, x2: x, y2: y }, &stroke)?;
                draw_label(root, &Label::new(tip - 3.0, y, tick.label.as_str()).sized(10.0).anchored(Anchor::End));
            }
            if let Some(title) = &axis.title {
                draw_label(root, &Label::new(x, b - 15.0, title.as_str()).sized(12.0).anchored(Anchor::End));
            }
        }
        Orientation::Vertical => {
            let x = axis.offset;
            draw_shape(root, &Shape::Line { x1: x, y1: a, x2: x, y2: b }, &stroke)?;
            for tick in &axis.ticks {
                draw_label(root, &Label::new(x + 4.0, tick.position, tick.label.as_str()).sized(9.0).anchored(Anchor::Start));
            }
            if let Some(title) = &axis.title {
                draw_label(root, &Label::new(x, a.max(b) + 20.0, title.as_str()).sized(11.0));
            }
        }
    }
    Ok(())
}

fn draw_legend<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, geometry: &Geometry) -> BoardResult<()> {
    let frame = &geometry.frame;
    let x = frame.width - frame.margin.right - 100.0;
    for (i, entry) in geometry.legend.iter().enumerate() {
        let y = frame.margin.top + 20.0 * i as f64;
        draw_shape(root, &Shape::Rect { x, y, width: 15.0, height: 15.0 }, &Style::filled(entry.color))?;
        draw_label(root, &Label::new(x + 20.0, y + 7.5, entry.label.as_str()).anchored(Anchor::Start));
    }
    Ok(())
}
