/*!
 * Desktop viewer for fiscal-map choropleths.
 *
 * - Load a GeoJSON boundary feed (file or URL) and a metric feed
 * - Pan (drag), zoom (wheel / buttons), click or search to highlight a region
 * - Switch periods and export the current view to SVG
 */

use clap::Parser;
use eframe::egui;
use egui::epaint::Mesh;
use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Vec2};
use fiscal_map::loader::{PendingGeometry, spawn_load};
use fiscal_map::models::Coord;
use fiscal_map::render::export;
use fiscal_map::render::{Frame, TooltipBox};
use fiscal_map::{
    GeometryClient, GeometrySource, MapConfig, MapController, MapScene, MapStatus, Rgb, metrics,
};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, channel};

#[derive(Parser, Debug)]
#[command(name = "fmap-gui", version, about = "Interactive choropleth viewer")]
struct ViewerArgs {
    /// GeoJSON FeatureCollection: a file path or an http(s) URL.
    #[arg(short, long)]
    geometry: Option<String>,
    /// Metric feed (.csv or .json).
    #[arg(short, long)]
    metrics: Option<PathBuf>,
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    let args = ViewerArgs::parse();

    let config = match &args.config {
        Some(path) => MapConfig::load_from_file(path).unwrap_or_else(|e| {
            log::warn!("ignoring config {}: {e}", path.display());
            MapConfig::default()
        }),
        None => MapConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 940.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("fiscal-map viewer"),
        ..Default::default()
    };

    eframe::run_native(
        "fiscal-map viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(MapViewer::new(config, args)))),
    )
}

struct MapViewer {
    config: MapConfig,

    // Inputs
    geometry_input: String,
    metrics_input: String,
    search_input: String,

    // Map state
    status: Option<MapStatus>,
    pending: Option<PendingGeometry>,
    scene: Option<MapScene>,
    controller: MapController,
    period_tx: Sender<String>,
    period_rx: Receiver<String>,

    // UI messages
    status_message: String,
    error_message: String,
}

/// Placement of the map surface inside the central panel.
#[derive(Clone, Copy)]
struct Placement {
    origin: Pos2,
    scale: f32,
}

impl Placement {
    fn to_screen(&self, [x, y]: Coord) -> Pos2 {
        self.origin + Vec2::new(x as f32, y as f32) * self.scale
    }

    fn to_surface(&self, p: Pos2) -> Coord {
        let v = (p - self.origin) / self.scale;
        [v.x as f64, v.y as f64]
    }
}

fn color(c: Rgb, opacity: f64) -> Color32 {
    Color32::from_rgba_unmultiplied(c.r, c.g, c.b, (opacity.clamp(0.0, 1.0) * 255.0).round() as u8)
}

impl MapViewer {
    fn new(config: MapConfig, args: ViewerArgs) -> Self {
        let controller = MapController::new(&config);
        let (period_tx, period_rx) = channel();
        let mut viewer = Self {
            geometry_input: args.geometry.clone().unwrap_or_default(),
            metrics_input: args
                .metrics
                .as_ref()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default(),
            search_input: String::new(),
            status: None,
            pending: None,
            scene: None,
            controller,
            period_tx,
            period_rx,
            status_message: String::new(),
            error_message: String::new(),
            config,
        };
        if args.geometry.is_some() {
            viewer.start_load();
        }
        viewer
    }

    fn start_load(&mut self) {
        let source = self.geometry_input.trim();
        if source.is_empty() {
            self.error_message = "Please enter a GeoJSON file path or URL".to_string();
            return;
        }
        match GeometryClient::new(self.config.feed.clone()) {
            Ok(client) => {
                // Replacing the handle abandons any load still in flight.
                self.pending = Some(spawn_load(client, GeometrySource::parse(source)));
                self.status = Some(MapStatus::Loading);
                self.scene = None;
                self.error_message.clear();
                self.status_message = format!("Loading {source}…");
            }
            Err(e) => self.status = Some(MapStatus::Unavailable(e.to_string())),
        }
    }

    fn check_load_result(&mut self, now: f64) {
        let Some(pending) = &self.pending else {
            return;
        };
        let Some(result) = pending.poll() else {
            return;
        };
        self.pending = None;
        match result {
            Ok(regions) => {
                let mut scene = MapScene::new(&regions, &self.config);
                let tx = self.period_tx.clone();
                scene.set_on_period_change(Box::new(move |period: &str| {
                    let _ = tx.send(period.to_string());
                }));
                self.controller = MapController::new(&self.config);
                self.search_input.clear();
                self.status_message = format!("Loaded {} regions", regions.len());
                self.load_metrics_into(&mut scene, now);
                self.scene = Some(scene);
                self.status = Some(MapStatus::Ready);
            }
            Err(e) => {
                self.status = Some(MapStatus::Unavailable(e.to_string()));
                self.status_message.clear();
            }
        }
    }

    fn check_period_changes(&mut self) {
        while let Ok(period) = self.period_rx.try_recv() {
            self.status_message = format!("Showing period {period}");
        }
    }

    fn load_metrics_into(&mut self, scene: &mut MapScene, now: f64) {
        let path = self.metrics_input.trim();
        if path.is_empty() {
            return;
        }
        match metrics::load(path) {
            Ok(rows) => {
                self.status_message = format!("{} · {} metric rows", self.status_message, rows.len());
                scene.set_metrics(rows, now);
            }
            Err(e) => self.error_message = format!("Metrics: {e}"),
        }
    }

    fn reload_metrics(&mut self, now: f64) {
        if let Some(mut scene) = self.scene.take() {
            self.status_message = "Metrics reloaded".to_string();
            self.error_message.clear();
            self.load_metrics_into(&mut scene, now);
            self.scene = Some(scene);
        }
    }

    fn export_svg(&mut self, now: f64) {
        let Some(scene) = &self.scene else {
            return;
        };
        let dir = dirs::picture_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let Some(path) = rfd::FileDialog::new()
            .set_directory(dir)
            .set_file_name("map.svg")
            .add_filter("SVG", &["svg"])
            .save_file()
        else {
            return;
        };
        match export::render_to_file(scene, &self.controller, now, &path) {
            Ok(()) => {
                self.status_message = format!("Exported {}", path.display());
                self.error_message.clear();
            }
            Err(e) => self.error_message = format!("Export failed: {e}"),
        }
    }

    fn controls_panel(&mut self, ui: &mut egui::Ui, now: f64) {
        ui.heading("fiscal-map");
        ui.add_space(8.0);

        ui.group(|ui| {
            ui.label("Data");
            ui.horizontal(|ui| {
                ui.label("Geometry:");
                ui.text_edit_singleline(&mut self.geometry_input)
                    .on_hover_text("GeoJSON file path or http(s) URL");
            });
            ui.horizontal(|ui| {
                ui.label("Metrics:");
                ui.text_edit_singleline(&mut self.metrics_input);
                if ui.button("Browse").clicked()
                    && let Some(path) = rfd::FileDialog::new()
                        .add_filter("Metrics", &["csv", "json"])
                        .pick_file()
                {
                    self.metrics_input = path.to_string_lossy().to_string();
                }
            });
            ui.horizontal(|ui| {
                let loading = matches!(self.status, Some(MapStatus::Loading));
                if ui.add_enabled(!loading, egui::Button::new("Load map")).clicked() {
                    self.start_load();
                }
                if ui
                    .add_enabled(self.scene.is_some(), egui::Button::new("Reload metrics"))
                    .clicked()
                {
                    self.reload_metrics(now);
                }
            });
        });

        let Some(scene) = &mut self.scene else {
            return;
        };
        ui.add_space(8.0);

        ui.group(|ui| {
            ui.label("Find a region");
            if ui.text_edit_singleline(&mut self.search_input).changed() {
                self.controller.set_search_query(scene, &self.search_input);
            }
            let results = self.controller.search().results.clone();
            let mut picked = None;
            for (i, r) in results.iter().enumerate() {
                if ui.selectable_label(false, scene.result_label(r)).clicked() {
                    picked = Some(i);
                }
            }
            if let Some(i) = picked
                && self.controller.pick_search_result(scene, i, now)
            {
                self.search_input.clear();
            }
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("＋").on_hover_text("Zoom in").clicked() {
                self.controller.zoom_in(now);
            }
            if ui.button("－").on_hover_text("Zoom out").clicked() {
                self.controller.zoom_out(now);
            }
            if ui.button("Reset").clicked() {
                self.controller.reset(now);
            }
        });

        if let Some(selector) = scene.period().cloned() {
            ui.add_space(8.0);
            let current = selector.current().unwrap_or_default().to_string();
            let mut choice = current.clone();
            egui::ComboBox::from_label("Period")
                .selected_text(&current)
                .show_ui(ui, |ui| {
                    for p in &selector.periods {
                        ui.selectable_value(&mut choice, p.clone(), p);
                    }
                });
            if choice != current {
                scene.select_period(&choice, now);
            }
        }

        if let Some(tip) = self.controller.tooltip() {
            ui.add_space(8.0);
            let name = tip.region.name.clone();
            ui.horizontal(|ui| {
                ui.label(format!("Selected: {name}"));
                if ui.small_button("✕").on_hover_text("Close tooltip").clicked() {
                    self.controller.dismiss_tooltip();
                }
            });
        }

        ui.add_space(8.0);
        if ui.button("Export SVG…").clicked() {
            self.export_svg(now);
        }
    }

    fn map_panel(&mut self, ui: &mut egui::Ui, now: f64) {
        match &self.status {
            None => {
                ui.centered_and_justified(|ui| ui.label("Load a boundary file to begin."));
                return;
            }
            Some(MapStatus::Loading) => {
                ui.centered_and_justified(|ui| ui.add(egui::Spinner::new()));
                return;
            }
            Some(MapStatus::Unavailable(msg)) => {
                // No surface and no retry for this view.
                ui.centered_and_justified(|ui| {
                    ui.colored_label(Color32::from_rgb(0xB7, 0x1C, 0x1C), format!("Map unavailable: {msg}"))
                });
                return;
            }
            Some(MapStatus::Ready) => {}
        }
        let Some(scene) = &self.scene else {
            return;
        };

        let surface = *scene.surface();
        let avail = ui.available_size();
        let scale = (avail.x / surface.width as f32)
            .min(avail.y / surface.height as f32)
            .max(0.1);
        let size = Vec2::new(surface.width as f32, surface.height as f32) * scale;
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let placement = Placement {
            origin: response.rect.min,
            scale,
        };

        // Input first so the frame reflects it.
        if response.dragged() {
            let d = response.drag_delta() / scale;
            self.controller.pan_by(d.x as f64, d.y as f64, now);
        }
        if response.hovered() {
            let (scroll, pinch) = ui.input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
            let factor = (scroll as f64 / 200.0).exp() * pinch as f64;
            if (factor - 1.0).abs() > 1e-6
                && let Some(pos) = response.hover_pos()
            {
                self.controller.zoom_at(factor, placement.to_surface(pos), now);
            }
        }
        let view = self.controller.view_at(now);
        let hit = response
            .hover_pos()
            .and_then(|pos| scene.hit_test(placement.to_surface(pos), &view));
        self.controller.hover(hit.map(|r| r.id.as_str()));
        if response.clicked() {
            match hit {
                Some(r) => self.controller.click_region(scene, &r.id, now),
                None => self.controller.click_background(),
            }
        }
        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.controller.dismiss_tooltip();
        }

        let frame = scene.frame(&self.controller, now);
        paint_frame(&painter, scene, &frame, placement);
    }
}

fn paint_frame(painter: &egui::Painter, scene: &MapScene, frame: &Frame, at: Placement) {
    let surface_rect = Rect::from_min_size(
        at.origin,
        Vec2::new(frame.surface.width as f32, frame.surface.height as f32) * at.scale,
    );
    painter.rect_filled(surface_rect, 0.0, Color32::WHITE);
    let clipped = painter.with_clip_rect(surface_rect);

    for paint in &frame.regions {
        let region = &scene.regions()[paint.index];
        let fill = color(paint.fill, paint.opacity);
        let mut mesh = Mesh::default();
        for v in &region.mesh.vertices {
            mesh.colored_vertex(at.to_screen(frame.view.apply(*v)), fill);
        }
        for [a, b, c] in &region.mesh.triangles {
            mesh.add_triangle(*a as u32, *b as u32, *c as u32);
        }
        clipped.add(egui::Shape::mesh(mesh));

        let stroke = Stroke::new(paint.stroke_width as f32, color(paint.stroke, paint.opacity));
        for ring in region.polygons.iter().flatten() {
            let pts: Vec<Pos2> = ring
                .iter()
                .map(|c| at.to_screen(frame.view.apply(*c)))
                .collect();
            clipped.add(egui::Shape::closed_line(pts, stroke));
        }
    }

    // Overlay.
    let legend = &frame.legend;
    let layout = &frame.legend_layout;
    let text_color = Color32::from_rgb(0x1F, 0x29, 0x37);
    let muted = Color32::from_rgb(0x6B, 0x72, 0x80);
    if legend.has_title() {
        painter.text(
            at.to_screen([layout.bar_origin[0], layout.title_y]),
            Align2::LEFT_TOP,
            layout.fitted_title(legend),
            FontId::proportional(12.0 * at.scale),
            text_color,
        );
    }
    for (i, c) in legend.swatches.iter().enumerate() {
        let (a, b) = layout.swatch_rect(i, legend.swatches.len());
        painter.rect_filled(
            Rect::from_min_max(at.to_screen(a), at.to_screen(b)),
            0.0,
            color(*c, 1.0),
        );
    }
    for label in &legend.labels {
        painter.text(
            at.to_screen([layout.label_x(label), layout.label_y]),
            Align2::LEFT_TOP,
            &label.text,
            FontId::proportional(11.0 * at.scale),
            muted,
        );
    }

    if let Some(tip) = &frame.tooltip {
        paint_tooltip(painter, tip, at, text_color, muted);
    }

    if let Some(attr) = &frame.attribution {
        painter.text(
            at.to_screen(attr.position),
            Align2::LEFT_TOP,
            &attr.text,
            FontId::proportional(10.0 * at.scale),
            muted,
        );
    }
}

fn paint_tooltip(painter: &egui::Painter, tip: &TooltipBox, at: Placement, text: Color32, muted: Color32) {
    let [x, y] = tip.origin;
    let rect = Rect::from_min_max(at.to_screen([x, y]), at.to_screen([x + tip.width, y + tip.height]));
    painter.rect_filled(rect, 4.0, Color32::from_white_alpha(245));
    painter.rect_stroke(rect, 4.0, Stroke::new(1.0, Color32::from_gray(0xD1)));
    for (pos, line) in tip.line_positions() {
        painter.text(
            at.to_screen(pos),
            Align2::LEFT_TOP,
            &line.text,
            FontId::proportional(line.font_px as f32 * at.scale),
            if line.emphasis { text } else { muted },
        );
    }
}

impl eframe::App for MapViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        self.check_load_result(now);
        self.check_period_changes();
        self.controller.tick(now);

        let animating = self.controller.is_animating()
            || self.scene.as_ref().is_some_and(|s| s.is_recoloring(now));
        if animating || self.pending.is_some() {
            ctx.request_repaint();
        }

        egui::SidePanel::left("controls")
            .resizable(false)
            .default_width(280.0)
            .show(ctx, |ui| {
                self.controls_panel(ui, now);

                if !self.status_message.is_empty() {
                    ui.add_space(8.0);
                    ui.label(&self.status_message);
                }
                if !self.error_message.is_empty() {
                    ui.add_space(8.0);
                    ui.colored_label(Color32::RED, &self.error_message);
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.map_panel(ui, now);
        });
    }
}
