//! Render surface: projected geometry, fills, and per-frame draw lists.
//!
//! [`MapScene`] is built once per geometry load. Projection, bounds, centroids and fill
//! meshes are computed there and never again; a metric update only recolours. Each
//! frame reads the controller's transform and stroke states and produces a [`Frame`]
//! that any backend (egui painter, plotters SVG/PNG) can draw without further logic.

pub mod export;
pub mod format;
pub mod legend;
pub mod text;

use crate::color::{ColorScale, NO_DATA, Rgb};
use crate::config::{MapConfig, StyleConfig, ValueFormat};
use crate::controller::{MapController, RegionLookup, StrokeState, Tooltip, ViewTransform};
use crate::metrics::MetricIndex;
use crate::models::{Bounds, Coord, PeriodSelector, Region, RegionMetric, RegionRef, apply_period};
use crate::projection::{AffineFit, FitFactors, Surface};
use crate::search::SearchIndex;
use ahash::AHashMap;
use earcutr::earcut;
use log::{debug, info};

use format::format_value;
use legend::{Legend, LegendLayout};
use text::{text_width, wrap_lines};

pub const STROKE_NORMAL: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
pub const STROKE_HIGHLIGHT: Rgb = Rgb::new(0x1A, 0x53, 0x5C);
pub const STROKE_WIDTH_NORMAL: f64 = 0.5;
pub const STROKE_WIDTH_HOVER: f64 = 2.0;
pub const STROKE_WIDTH_HIGHLIGHT: f64 = 2.5;
pub const OPACITY_NORMAL: f64 = 0.9;

pub const TOOLTIP_WIDTH: f64 = 200.0;
const TOOLTIP_PAD: f64 = 8.0;
const TOOLTIP_OFFSET: f64 = 12.0;
const TOOLTIP_LINE_GAP: f64 = 3.0;
pub const ATTRIBUTION_FONT_PX: f64 = 10.0;

/// Triangulated fill of one region, in surface coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Coord>,
    pub triangles: Vec<[usize; 3]>,
}

/// One region after projection.
#[derive(Debug, Clone)]
pub struct ProjectedRegion {
    pub region: RegionRef,
    /// Polygons of rings in surface coordinates; first ring of each polygon is outer.
    pub polygons: Vec<Vec<Vec<Coord>>>,
    pub bounds: Bounds,
    /// Area-weighted centroid of the outer rings; tooltip anchor.
    pub centroid: Coord,
    pub mesh: Mesh,
}

impl ProjectedRegion {
    fn new(region: &Region, fit: &AffineFit) -> Self {
        let polygons: Vec<Vec<Vec<Coord>>> = region
            .polygons
            .iter()
            .map(|poly| poly.iter().map(|ring| fit.project_ring(ring)).collect())
            .collect();
        let mut bounds = Bounds::empty();
        for c in polygons.iter().flatten().flatten() {
            bounds.extend(*c);
        }
        let centroid = area_centroid(&polygons).unwrap_or_else(|| bounds.center());
        let mesh = triangulate(&polygons);
        Self {
            region: region.region_ref(),
            polygons,
            bounds,
            centroid,
            mesh,
        }
    }

    /// Even-odd containment over every ring, so holes are excluded.
    pub fn contains(&self, p: Coord) -> bool {
        if !self.bounds.contains(p) {
            return false;
        }
        self.polygons.iter().any(|poly| {
            poly.iter()
                .filter(|ring| ring_contains(ring, p))
                .count()
                % 2
                == 1
        })
    }
}

fn ring_contains(ring: &[Coord], [px, py]: Coord) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn ring_area_centroid(ring: &[Coord]) -> (f64, Coord) {
    let mut a = 0.0;
    let (mut cx, mut cy) = (0.0, 0.0);
    for (i, [x0, y0]) in ring.iter().enumerate() {
        let [x1, y1] = ring[(i + 1) % ring.len()];
        let cross = x0 * y1 - x1 * y0;
        a += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    let a = a / 2.0;
    if a.abs() < f64::EPSILON {
        return (0.0, [0.0, 0.0]);
    }
    (a.abs(), [cx / (6.0 * a), cy / (6.0 * a)])
}

fn area_centroid(polygons: &[Vec<Vec<Coord>>]) -> Option<Coord> {
    let mut total = 0.0;
    let (mut sx, mut sy) = (0.0, 0.0);
    for outer in polygons.iter().filter_map(|p| p.first()) {
        let (area, [cx, cy]) = ring_area_centroid(outer);
        total += area;
        sx += cx * area;
        sy += cy * area;
    }
    (total > 0.0).then(|| [sx / total, sy / total])
}

/// Ear-clip every polygon (holes included) into one vertex/triangle list.
pub(crate) fn triangulate(polygons: &[Vec<Vec<Coord>>]) -> Mesh {
    let mut mesh = Mesh::default();
    for poly in polygons {
        let base = mesh.vertices.len();
        let mut flat: Vec<f64> = Vec::new();
        let mut holes: Vec<usize> = Vec::new();
        let mut count = 0usize;
        for (ring_i, ring) in poly.iter().enumerate() {
            let ring = drop_closing_duplicate(ring);
            if ring.len() < 3 {
                continue;
            }
            if ring_i > 0 {
                holes.push(count);
            }
            for [x, y] in ring {
                flat.push(*x);
                flat.push(*y);
                mesh.vertices.push([*x, *y]);
                count += 1;
            }
        }
        if count < 3 {
            mesh.vertices.truncate(base);
            continue;
        }
        match earcut(&flat, &holes, 2) {
            Ok(ix) => mesh.triangles.extend(
                ix.chunks_exact(3)
                    .map(|t| [base + t[0], base + t[1], base + t[2]]),
            ),
            Err(e) => {
                debug!("triangulation failed: {e:?}");
                mesh.vertices.truncate(base);
            }
        }
    }
    mesh
}

fn drop_closing_duplicate(ring: &[Coord]) -> &[Coord] {
    match ring {
        [first, rest @ .., last] if !rest.is_empty() && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

#[derive(Debug, Clone, Copy)]
struct FillState {
    from: Rgb,
    to: Rgb,
    start: f64,
}

/// Draw instructions for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPaint {
    /// Index into [`MapScene::regions`].
    pub index: usize,
    pub id: String,
    pub fill: Rgb,
    pub stroke: Rgb,
    /// Screen pixels; not scaled by zoom.
    pub stroke_width: f64,
    pub opacity: f64,
    pub state: StrokeState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipLine {
    pub text: String,
    pub font_px: f64,
    pub emphasis: bool,
}

/// Tooltip placed in screen coordinates and kept inside the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipBox {
    pub region: RegionRef,
    pub anchor: Coord,
    pub origin: Coord,
    pub width: f64,
    pub height: f64,
    pub lines: Vec<TooltipLine>,
}

impl TooltipBox {
    fn layout(tip: &Tooltip, view: &ViewTransform, surface: &Surface, fmt: &ValueFormat) -> Self {
        let inner = TOOLTIP_WIDTH - 2.0 * TOOLTIP_PAD;
        let mut lines = Vec::new();
        let mut push = |text: &str, font_px: f64, emphasis: bool| {
            for l in wrap_lines(text, font_px, inner) {
                lines.push(TooltipLine {
                    text: l,
                    font_px,
                    emphasis,
                });
            }
        };
        let name = tip.metric.name.as_deref().unwrap_or(&tip.region.name);
        push(name, 14.0, true);
        if let Some(group) = tip.metric.group.as_deref() {
            push(group, 11.0, false);
        }
        push(&format_value(tip.metric.value, fmt), 16.0, true);
        for field in &tip.metric.secondary {
            push(&format!("{}: {}", field.label, format_value(field.value, fmt)), 11.0, false);
        }

        let height = 2.0 * TOOLTIP_PAD
            + lines
                .iter()
                .map(|l| l.font_px + TOOLTIP_LINE_GAP)
                .sum::<f64>();
        let anchor = view.apply(tip.anchor);

        let mut x = anchor[0] + TOOLTIP_OFFSET;
        if x + TOOLTIP_WIDTH > surface.width {
            x = anchor[0] - TOOLTIP_OFFSET - TOOLTIP_WIDTH;
        }
        let mut y = anchor[1] + TOOLTIP_OFFSET;
        if y + height > surface.height {
            y = anchor[1] - TOOLTIP_OFFSET - height;
        }
        let x = x.clamp(0.0, (surface.width - TOOLTIP_WIDTH).max(0.0));
        let y = y.clamp(0.0, (surface.height - height).max(0.0));

        Self {
            region: tip.region.clone(),
            anchor,
            origin: [x, y],
            width: TOOLTIP_WIDTH,
            height,
            lines,
        }
    }

    /// Top of each line, paired with the line.
    pub fn line_positions(&self) -> impl Iterator<Item = (Coord, &TooltipLine)> {
        let x = self.origin[0] + TOOLTIP_PAD;
        let mut y = self.origin[1] + TOOLTIP_PAD;
        self.lines.iter().map(move |l| {
            let at = [x, y];
            y += l.font_px + TOOLTIP_LINE_GAP;
            (at, l)
        })
    }
}

/// Attribution text, right-aligned at the bottom-right corner. Never transformed.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    pub text: String,
    /// Top-left of the text.
    pub position: Coord,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub surface: Surface,
    pub view: ViewTransform,
    /// Draw order: normal, hovered, highlighted.
    pub regions: Vec<RegionPaint>,
    pub legend: Legend,
    pub legend_layout: LegendLayout,
    pub tooltip: Option<TooltipBox>,
    pub attribution: Option<Attribution>,
    /// Selected period label, for backends without an external selector control.
    pub period_caption: Option<String>,
}

impl Frame {
    pub fn highlighted(&self) -> Option<&RegionPaint> {
        self.regions
            .iter()
            .find(|p| p.state == StrokeState::Highlighted)
    }
}

pub type PeriodCallback = Box<dyn FnMut(&str)>;

pub struct MapScene {
    surface: Surface,
    fit: AffineFit,
    style: StyleConfig,
    regions: Vec<ProjectedRegion>,
    by_id: AHashMap<String, usize>,
    search: SearchIndex,
    raw_metrics: Vec<RegionMetric>,
    metrics: MetricIndex,
    scale: ColorScale,
    legend: Legend,
    fills: Vec<FillState>,
    period: Option<PeriodSelector>,
    on_period_change: Option<PeriodCallback>,
}

impl MapScene {
    /// Project `regions` onto the configured surface. Regions start with the no-data fill.
    pub fn new(regions: &[Region], config: &MapConfig) -> Self {
        let surface = Surface::from(&config.surface);
        let bounds = regions
            .iter()
            .fold(Bounds::empty(), |acc, r| acc.union(&r.bounds()));
        let fit = AffineFit::fit(&bounds, &surface, FitFactors::from(&config.surface));

        let projected: Vec<ProjectedRegion> =
            regions.iter().map(|r| ProjectedRegion::new(r, &fit)).collect();
        let by_id = projected
            .iter()
            .enumerate()
            .map(|(i, r)| (r.region.id.clone(), i))
            .collect();
        let search = SearchIndex::new(
            projected.iter().map(|r| r.region.clone()),
            config.search.limit,
        );
        let scale = ColorScale::from_values(&[]);
        let legend = Legend::from_scale(&scale, &config.style.value_format, &config.style.legend_title);
        let fills = vec![
            FillState {
                from: NO_DATA,
                to: NO_DATA,
                start: f64::NEG_INFINITY,
            };
            projected.len()
        ];
        info!(
            "scene ready: {} regions, scale ({:.4}, {:.4})",
            projected.len(),
            fit.scale_x,
            fit.scale_y
        );

        Self {
            surface,
            fit,
            style: config.style.clone(),
            regions: projected,
            by_id,
            search,
            raw_metrics: Vec::new(),
            metrics: MetricIndex::default(),
            scale,
            legend,
            fills,
            period: None,
            on_period_change: None,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn fit(&self) -> &AffineFit {
        &self.fit
    }

    pub fn regions(&self) -> &[ProjectedRegion] {
        &self.regions
    }

    pub fn region(&self, id: &str) -> Option<&ProjectedRegion> {
        self.by_id.get(id).map(|&i| &self.regions[i])
    }

    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn metrics(&self) -> &MetricIndex {
        &self.metrics
    }

    /// Metrics as currently displayed (period applied).
    pub fn displayed_metrics(&self) -> Vec<RegionMetric> {
        match self.period.as_ref().and_then(|p| p.current()) {
            Some(p) => apply_period(&self.raw_metrics, p),
            None => self.raw_metrics.clone(),
        }
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn period(&self) -> Option<&PeriodSelector> {
        self.period.as_ref()
    }

    pub fn set_on_period_change(&mut self, cb: PeriodCallback) {
        self.on_period_change = Some(cb);
    }

    /// Replace the metric feed. Colours transition from what is on screen at `now`.
    pub fn set_metrics(&mut self, metrics: Vec<RegionMetric>, now: f64) {
        self.period = PeriodSelector::from_metrics(&metrics);
        self.raw_metrics = metrics;
        self.recolor(now);
    }

    /// Switch the displayed period. Returns `false` for unknown or unchanged labels.
    pub fn select_period(&mut self, period: &str, now: f64) -> bool {
        let changed = self.period.as_mut().is_some_and(|p| p.select(period));
        if changed {
            self.recolor(now);
            if let Some(cb) = self.on_period_change.as_mut() {
                cb(period);
            }
        }
        changed
    }

    fn recolor(&mut self, now: f64) {
        let (matched, unknown): (Vec<_>, Vec<_>) = self
            .displayed_metrics()
            .into_iter()
            .partition(|m| self.by_id.contains_key(&m.id));
        if !unknown.is_empty() {
            debug!("{} metric rows do not match any region and are ignored", unknown.len());
        }

        let values: Vec<f64> = matched.iter().map(|m| m.value).collect();
        self.scale = ColorScale::from_values(&values);
        self.legend = Legend::from_scale(&self.scale, &self.style.value_format, &self.style.legend_title);
        self.metrics = MetricIndex::new(matched);

        for i in 0..self.regions.len() {
            let target = self.target_fill(i);
            let current = self.fill_at(i, now);
            self.fills[i] = FillState {
                from: current,
                to: target,
                start: now,
            };
        }
        if self.metrics.is_empty() {
            debug!("no metric rows match a region; every region uses the no-data fill");
            return;
        }
        debug!(
            "recoloured {} regions: domain [{}, {}] ({})",
            self.metrics.len(),
            self.scale.domain().min,
            self.scale.domain().max,
            self.scale.domain().sign.label()
        );
    }

    fn target_fill(&self, index: usize) -> Rgb {
        let id = &self.regions[index].region.id;
        self.metrics
            .get(id)
            .map(|m| self.scale.color_for(m.value))
            .unwrap_or(NO_DATA)
    }

    /// Fill of the region at `index` at time `now`, mid-transition if one is running.
    pub fn fill_at(&self, index: usize, now: f64) -> Rgb {
        let Some(state) = self.fills.get(index) else {
            return NO_DATA;
        };
        let d = self.style.fill_duration;
        if d <= 0.0 {
            return state.to;
        }
        let t = ((now - state.start) / d).clamp(0.0, 1.0);
        state.from.lerp(state.to, t)
    }

    /// Whether any fill transition is still running.
    pub fn is_recoloring(&self, now: f64) -> bool {
        let d = self.style.fill_duration;
        d > 0.0 && self.fills.iter().any(|f| now - f.start < d)
    }

    /// Topmost region under a screen point, given the transform on screen.
    pub fn hit_test(&self, screen: Coord, view: &ViewTransform) -> Option<&RegionRef> {
        let p = view.invert(screen);
        self.regions
            .iter()
            .rev()
            .find(|r| r.contains(p))
            .map(|r| &r.region)
    }

    /// Search result label: name and formatted value when the region has data.
    pub fn result_label(&self, region: &RegionRef) -> String {
        match self.metrics.get(&region.id) {
            Some(m) => format!(
                "{} ({})",
                region.name,
                format_value(m.value, &self.style.value_format)
            ),
            None => region.name.clone(),
        }
    }

    /// Build the draw list for `now`, reading transform and selection from `controller`.
    pub fn frame(&self, controller: &MapController, now: f64) -> Frame {
        let view = controller.view_at(now);
        let mut regions: Vec<RegionPaint> = self
            .regions
            .iter()
            .enumerate()
            .map(|(index, r)| {
                let state = controller.stroke_state(&r.region.id);
                let (stroke, stroke_width, opacity) = match state {
                    StrokeState::Normal => (STROKE_NORMAL, STROKE_WIDTH_NORMAL, OPACITY_NORMAL),
                    StrokeState::Hovered => (STROKE_NORMAL, STROKE_WIDTH_HOVER, 1.0),
                    StrokeState::Highlighted => (STROKE_HIGHLIGHT, STROKE_WIDTH_HIGHLIGHT, 1.0),
                };
                RegionPaint {
                    index,
                    id: r.region.id.clone(),
                    fill: self.fill_at(index, now),
                    stroke,
                    stroke_width,
                    opacity,
                    state,
                }
            })
            .collect();
        // Stable: keeps feed order within each stroke state.
        regions.sort_by_key(|p| match p.state {
            StrokeState::Normal => 0,
            StrokeState::Hovered => 1,
            StrokeState::Highlighted => 2,
        });

        let tooltip = controller
            .tooltip()
            .map(|t| TooltipBox::layout(t, &view, &self.surface, &self.style.value_format));

        let attribution = (!self.style.attribution.trim().is_empty()).then(|| {
            let text = self.style.attribution.trim().to_string();
            let w = text_width(&text, ATTRIBUTION_FONT_PX);
            Attribution {
                position: [
                    self.surface.width - self.surface.padding - w,
                    self.surface.height - self.surface.padding - ATTRIBUTION_FONT_PX,
                ],
                text,
            }
        });

        Frame {
            surface: self.surface,
            view,
            regions,
            legend: self.legend.clone(),
            legend_layout: LegendLayout::place(&self.surface, &self.legend),
            tooltip,
            attribution,
            period_caption: self
                .period
                .as_ref()
                .and_then(|p| p.current())
                .map(str::to_string),
        }
    }
}

impl RegionLookup for MapScene {
    fn region_bounds(&self, id: &str) -> Option<Bounds> {
        self.region(id).map(|r| r.bounds)
    }

    fn region_anchor(&self, id: &str) -> Option<Coord> {
        self.region(id).map(|r| r.centroid)
    }

    fn region_ref(&self, id: &str) -> Option<RegionRef> {
        self.region(id).map(|r| r.region.clone())
    }

    fn metric_snapshot(&self, region: &RegionRef) -> RegionMetric {
        match self.metrics.get(&region.id) {
            Some(m) => {
                let mut m = m.clone();
                if m.name.is_none() {
                    m.name = Some(region.name.clone());
                }
                m
            }
            None => RegionMetric::placeholder(region, self.metrics.template()),
        }
    }

    fn search(&self, query: &str) -> Vec<RegionRef> {
        self.search.search(query)
    }
}
