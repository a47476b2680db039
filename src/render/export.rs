//! Static export of a frame through plotters: SVG for `.svg` paths, PNG otherwise.
//!
//! Text is emitted as SVG `<text>` elements. The bitmap backend is built without a
//! font engine, so PNG exports carry shapes only.

use super::legend::{LEGEND_FONT_PX, LEGEND_TITLE_FONT_PX};
use super::{ATTRIBUTION_FONT_PX, Frame, MapScene, triangulate};
use crate::color::Rgb;
use crate::controller::MapController;
use crate::error::{MapError, Result};
use crate::models::Coord;
use log::info;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::path::Path;

const TEXT_DARK: RGBColor = RGBColor(0x1F, 0x29, 0x37);
const TEXT_MUTED: RGBColor = RGBColor(0x6B, 0x72, 0x80);
const TOOLTIP_BORDER: RGBColor = RGBColor(0xD1, 0xD5, 0xDB);

fn render_err<E: std::fmt::Debug>(e: E) -> MapError {
    MapError::Render(format!("{e:?}"))
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

fn px([x, y]: Coord) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

fn backend_size(scene: &MapScene) -> (u32, u32) {
    let s = scene.surface();
    (
        s.width.round().max(1.0) as u32,
        s.height.round().max(1.0) as u32,
    )
}

/// Render the current frame to `path`. The extension picks the backend.
pub fn render_to_file<P: AsRef<Path>>(
    scene: &MapScene,
    controller: &MapController,
    now: f64,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let frame = scene.frame(controller, now);
    let size = backend_size(scene);
    let is_svg = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        let root = SVGBackend::new(path, size).into_drawing_area();
        draw_frame(&root, scene, &frame)?;
        root.present().map_err(render_err)?;
    } else {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        draw_frame(&root, scene, &frame)?;
        root.present().map_err(render_err)?;
    }
    info!("exported map to {}", path.display());
    Ok(())
}

/// Render the current frame to an in-memory SVG document.
pub fn render_to_svg_string(scene: &MapScene, controller: &MapController, now: f64) -> Result<String> {
    let frame = scene.frame(controller, now);
    let mut out = String::new();
    {
        let root = SVGBackend::with_string(&mut out, backend_size(scene)).into_drawing_area();
        draw_frame(&root, scene, &frame)?;
        root.present().map_err(render_err)?;
    }
    Ok(out)
}

/// Draw `frame` onto any plotters drawing area sized like the scene surface.
pub fn draw_frame<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    scene: &MapScene,
    frame: &Frame,
) -> Result<()> {
    area.fill(&WHITE).map_err(render_err)?;

    // Regions: transformed content group.
    for paint in &frame.regions {
        let region = &scene.regions()[paint.index];
        let fill = rgb(paint.fill).mix(paint.opacity).filled();
        let stroke = rgb(paint.stroke)
            .mix(paint.opacity)
            .stroke_width(paint.stroke_width.round().max(1.0) as u32);

        for poly in &region.polygons {
            if poly.len() > 1 {
                // Holes: fill the triangulation instead of the outer ring.
                let mesh = triangulate(std::slice::from_ref(poly));
                for t in &mesh.triangles {
                    let pts: Vec<(i32, i32)> = t
                        .iter()
                        .map(|&i| px(frame.view.apply(mesh.vertices[i])))
                        .collect();
                    area.draw(&Polygon::new(pts, fill)).map_err(render_err)?;
                }
            } else if let Some(outer) = poly.first() {
                let pts: Vec<(i32, i32)> = outer.iter().map(|c| px(frame.view.apply(*c))).collect();
                area.draw(&Polygon::new(pts, fill)).map_err(render_err)?;
            }
            for ring in poly {
                let mut pts: Vec<(i32, i32)> = ring.iter().map(|c| px(frame.view.apply(*c))).collect();
                if let Some(&first) = pts.first() {
                    pts.push(first);
                }
                area.draw(&PathElement::new(pts, stroke)).map_err(render_err)?;
            }
        }
    }

    // Overlay: legend, tooltip, attribution are not transformed.
    let layout = &frame.legend_layout;
    if frame.legend.has_title() {
        let style = ("sans-serif", LEGEND_TITLE_FONT_PX).into_font().color(&TEXT_DARK);
        area.draw(&Text::new(
            layout.fitted_title(&frame.legend),
            px([layout.bar_origin[0], layout.title_y]),
            style,
        ))
        .map_err(render_err)?;
    }
    let n = frame.legend.swatches.len();
    for (i, c) in frame.legend.swatches.iter().enumerate() {
        let (a, b) = layout.swatch_rect(i, n);
        area.draw(&Rectangle::new([px(a), px(b)], rgb(*c).filled()))
            .map_err(render_err)?;
    }
    let label_style = ("sans-serif", LEGEND_FONT_PX).into_font().color(&TEXT_MUTED);
    for label in &frame.legend.labels {
        area.draw(&Text::new(
            label.text.clone(),
            px([layout.label_x(label), layout.label_y]),
            label_style.clone(),
        ))
        .map_err(render_err)?;
    }

    if let Some(caption) = &frame.period_caption {
        let style = ("sans-serif", LEGEND_TITLE_FONT_PX).into_font().color(&TEXT_DARK);
        let p = frame.surface.padding;
        area.draw(&Text::new(caption.clone(), px([p, p]), style))
            .map_err(render_err)?;
    }

    if let Some(tip) = &frame.tooltip {
        let [x, y] = tip.origin;
        let corners = [px([x, y]), px([x + tip.width, y + tip.height])];
        area.draw(&Rectangle::new(corners, WHITE.mix(0.96).filled()))
            .map_err(render_err)?;
        area.draw(&Rectangle::new(corners, TOOLTIP_BORDER.stroke_width(1)))
            .map_err(render_err)?;
        for (at, line) in tip.line_positions() {
            let color = if line.emphasis { TEXT_DARK } else { TEXT_MUTED };
            let font = ("sans-serif", line.font_px).into_font();
            let font = if line.emphasis {
                font.style(FontStyle::Bold)
            } else {
                font
            };
            area.draw(&Text::new(line.text.clone(), px(at), font.color(&color)))
                .map_err(render_err)?;
        }
    }

    if let Some(attr) = &frame.attribution {
        let style = ("sans-serif", ATTRIBUTION_FONT_PX).into_font().color(&TEXT_MUTED);
        area.draw(&Text::new(attr.text.clone(), px(attr.position), style))
            .map_err(render_err)?;
    }
    Ok(())
}
