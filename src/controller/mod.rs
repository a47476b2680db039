//! Selection & viewport controller.
//!
//! Owns the pan/zoom transform, the highlighted region, hover emphasis, the tooltip
//! and the search panel. Selection can come from three places (pointer click, an
//! externally controlled value, a search pick) and all of them funnel into one
//! [`MapController::focus`] path.
//!
//! Time is supplied by the caller as seconds (`now`). A discrete transition (click,
//! controlled change, search pick, zoom button, reset) always replaces the in-flight
//! one and starts from the transform currently on screen; pointer gestures cancel the
//! in-flight transition and move the transform directly.
//!
//! In [`SelectionMode::Controlled`] the highlight belongs to the parent: handlers only
//! report intent through the `on_select` callback and the parent answers with
//! [`MapController::sync_selection`]. The mode is fixed at construction.

pub mod view;

pub use view::{Transition, ViewTransform, ease_cubic_in_out};

use crate::config::{MapConfig, ZoomConfig};
use crate::models::{Bounds, Coord, RegionMetric, RegionRef};
use crate::projection::Surface;
use crate::search::SearchState;
use log::{debug, warn};

/// What the controller needs to know about regions. Implemented by the render scene.
pub trait RegionLookup {
    /// Region bounds in surface coordinates.
    fn region_bounds(&self, id: &str) -> Option<Bounds>;
    /// Tooltip anchor (centroid) in surface coordinates.
    fn region_anchor(&self, id: &str) -> Option<Coord>;
    fn region_ref(&self, id: &str) -> Option<RegionRef>;
    /// Current metric for the region, or a zero-valued placeholder.
    fn metric_snapshot(&self, region: &RegionRef) -> RegionMetric;
    fn search(&self, query: &str) -> Vec<RegionRef>;
}

/// Receives `Some(region)` or `None` whenever the map wants the selection to change.
pub type SelectCallback = Box<dyn FnMut(Option<&RegionRef>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// The controller owns the highlight.
    Internal,
    /// A parent owns the highlight and drives it through `sync_selection`.
    Controlled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeState {
    Normal,
    Hovered,
    Highlighted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub region: RegionRef,
    /// Anchor in surface coordinates; apply the current view to place it on screen.
    pub anchor: Coord,
    pub metric: RegionMetric,
}

pub struct MapController {
    zoom: ZoomConfig,
    viewport: Surface,
    mode: SelectionMode,
    view: ViewTransform,
    transition: Option<Transition>,
    generation: u64,
    highlighted: Option<RegionRef>,
    hovered: Option<String>,
    tooltip: Option<Tooltip>,
    search: SearchState,
    on_select: Option<SelectCallback>,
}

impl MapController {
    /// Controller that owns its own selection.
    pub fn new(config: &MapConfig) -> Self {
        Self::with_mode(config, SelectionMode::Internal, None)
    }

    /// Controller whose selection is driven by a parent through [`Self::sync_selection`].
    pub fn controlled(config: &MapConfig, on_select: SelectCallback) -> Self {
        Self::with_mode(config, SelectionMode::Controlled, Some(on_select))
    }

    fn with_mode(config: &MapConfig, mode: SelectionMode, on_select: Option<SelectCallback>) -> Self {
        Self {
            zoom: config.zoom.clone(),
            viewport: Surface::from(&config.surface),
            mode,
            view: ViewTransform::IDENTITY,
            transition: None,
            generation: 0,
            highlighted: None,
            hovered: None,
            tooltip: None,
            search: SearchState::default(),
            on_select,
        }
    }

    /// Observe selection changes in internal mode.
    pub fn with_on_select(mut self, on_select: SelectCallback) -> Self {
        self.on_select = Some(on_select);
        self
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn highlighted(&self) -> Option<&RegionRef> {
        self.highlighted.as_ref()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn viewport(&self) -> &Surface {
        &self.viewport
    }

    /// Incremented every time a transition starts or is cancelled.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Transform on screen at `now`.
    pub fn view_at(&self, now: f64) -> ViewTransform {
        match &self.transition {
            Some(t) => t.value_at(now),
            None => self.view,
        }
    }

    /// Where the view is heading: the in-flight destination, or the settled transform.
    pub fn target_view(&self) -> ViewTransform {
        self.transition.map(|t| t.to).unwrap_or(self.view)
    }

    /// Settle a finished transition. Returns `true` while one is still running.
    pub fn tick(&mut self, now: f64) -> bool {
        if let Some(t) = self.transition
            && t.is_finished(now)
        {
            self.view = t.to;
            self.transition = None;
        }
        self.transition.is_some()
    }

    pub fn stroke_state(&self, id: &str) -> StrokeState {
        if self.highlighted.as_ref().is_some_and(|h| h.id == id) {
            StrokeState::Highlighted
        } else if self.hovered.as_deref() == Some(id) {
            StrokeState::Hovered
        } else {
            StrokeState::Normal
        }
    }

    // ------------------------ discrete transitions ------------------------

    /// Pointer click on a region. Clicking the highlighted region again does nothing.
    pub fn click_region(&mut self, regions: &dyn RegionLookup, id: &str, now: f64) {
        if self.highlighted.as_ref().is_some_and(|h| h.id == id) {
            return;
        }
        let Some(region) = regions.region_ref(id) else {
            debug!("click on unknown region {id}");
            return;
        };
        match self.mode {
            SelectionMode::Internal => self.focus(regions, region, now),
            SelectionMode::Controlled => self.request(Some(&region)),
        }
    }

    /// Click on the map background: clear highlight, tooltip and hover emphasis. The
    /// zoom level is kept.
    pub fn click_background(&mut self) {
        self.hovered = None;
        match self.mode {
            SelectionMode::Internal => {
                let had = self.highlighted.take().is_some();
                self.tooltip = None;
                if had {
                    self.notify(None);
                }
            }
            SelectionMode::Controlled => {
                if self.highlighted.is_some() {
                    self.request(None);
                }
            }
        }
    }

    /// Apply the parent's selection. Ignored in internal mode.
    pub fn sync_selection(&mut self, regions: &dyn RegionLookup, selection: Option<&RegionRef>, now: f64) {
        if self.mode == SelectionMode::Internal {
            debug!("sync_selection ignored: controller owns its selection");
            return;
        }
        match selection {
            Some(sel) if self.highlighted.as_ref().is_some_and(|h| h.id == sel.id) => {}
            Some(sel) => {
                if regions.region_bounds(&sel.id).is_none() {
                    warn!("controlled selection {} does not match any region", sel.id);
                    self.clear_selection();
                    return;
                }
                let region = regions.region_ref(&sel.id).unwrap_or_else(|| sel.clone());
                self.focus(regions, region, now);
            }
            None => self.clear_selection(),
        }
    }

    /// Update the search query and recompute results.
    pub fn set_search_query(&mut self, regions: &dyn RegionLookup, query: &str) {
        self.search.query = query.to_string();
        self.search.results = regions.search(query);
    }

    /// Pick the `index`-th search result. Clears the query and results, then selects.
    pub fn pick_search_result(&mut self, regions: &dyn RegionLookup, index: usize, now: f64) -> bool {
        let Some(region) = self.search.results.get(index).cloned() else {
            return false;
        };
        self.search.clear();
        if self.highlighted.as_ref().is_some_and(|h| h.id == region.id) {
            return true;
        }
        match self.mode {
            SelectionMode::Internal => self.focus(regions, region, now),
            SelectionMode::Controlled => self.request(Some(&region)),
        }
        true
    }

    pub fn zoom_in(&mut self, now: f64) {
        self.zoom_by(self.zoom.step, now);
    }

    pub fn zoom_out(&mut self, now: f64) {
        self.zoom_by(1.0 / self.zoom.step, now);
    }

    /// Scale about the viewport centre. Steps compound on the unclamped scale of any
    /// in-flight zoom, so quick in/out presses cancel out exactly, even at the extents.
    fn zoom_by(&mut self, factor: f64, now: f64) {
        let base = self.target_view();
        let requested = self
            .transition
            .filter(|t| !t.is_finished(now))
            .map_or(base.k, |t| t.requested_k)
            * factor;
        let to = base.scaled_about(
            requested / base.k,
            self.viewport.center(),
            self.zoom.min,
            self.zoom.max,
        );
        self.animate(to, requested, now);
    }

    /// Animate back to identity and drop the selection.
    pub fn reset(&mut self, now: f64) {
        self.start_transition(ViewTransform::IDENTITY, now);
        self.hovered = None;
        self.tooltip = None;
        match self.mode {
            SelectionMode::Internal => {
                if self.highlighted.take().is_some() {
                    self.notify(None);
                }
            }
            SelectionMode::Controlled => {
                if self.highlighted.is_some() {
                    self.request(None);
                }
            }
        }
    }

    pub fn dismiss_tooltip(&mut self) {
        self.tooltip = None;
    }

    // ------------------------ continuous input ------------------------

    /// Pointer hover. Only changes stroke emphasis; the highlighted stroke wins.
    pub fn hover(&mut self, id: Option<&str>) {
        self.hovered = id.map(str::to_string);
    }

    /// Drag pan in surface units. Cancels any in-flight transition.
    pub fn pan_by(&mut self, dx: f64, dy: f64, now: f64) {
        let current = self.cancel_transition(now);
        self.view = current.panned(dx, dy);
    }

    /// Wheel/pinch zoom about `focus` (surface units, in transformed space).
    pub fn zoom_at(&mut self, factor: f64, focus: Coord, now: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let current = self.cancel_transition(now);
        self.view = current.scaled_about(factor, focus, self.zoom.min, self.zoom.max);
    }

    // ------------------------ internals ------------------------

    /// Highlight `region`, zoom to it and open its tooltip.
    fn focus(&mut self, regions: &dyn RegionLookup, region: RegionRef, now: f64) {
        let Some(bounds) = regions.region_bounds(&region.id) else {
            warn!("cannot focus {}: no geometry", region.id);
            return;
        };
        let anchor = regions
            .region_anchor(&region.id)
            .unwrap_or_else(|| bounds.center());
        let metric = regions.metric_snapshot(&region);

        self.start_transition(self.fit_region(&bounds), now);
        self.tooltip = Some(Tooltip {
            region: region.clone(),
            anchor,
            metric,
        });
        self.highlighted = Some(region);
        if self.mode == SelectionMode::Internal {
            let selected = self.highlighted.clone();
            self.notify(selected.as_ref());
        }
    }

    fn clear_selection(&mut self) {
        self.highlighted = None;
        self.tooltip = None;
        self.hovered = None;
    }

    /// Transform that centres `bounds` and fits it into the viewport with the margin.
    pub fn fit_region(&self, bounds: &Bounds) -> ViewTransform {
        let Surface { width, height, .. } = self.viewport;
        let ratio = (bounds.width() / width).max(bounds.height() / height);
        let k = if ratio > 0.0 && ratio.is_finite() {
            self.zoom.fit_margin / ratio
        } else {
            self.zoom.max
        }
        .clamp(self.zoom.min, self.zoom.max);
        let [cx, cy] = bounds.center();
        ViewTransform::new(k, width / 2.0 - k * cx, height / 2.0 - k * cy)
    }

    fn start_transition(&mut self, to: ViewTransform, now: f64) {
        self.animate(to, to.k, now);
    }

    fn animate(&mut self, to: ViewTransform, requested_k: f64, now: f64) {
        let from = self.view_at(now);
        self.generation += 1;
        self.view = from;
        self.transition = Some(Transition {
            from,
            to,
            start: now,
            duration: self.zoom.duration,
            requested_k,
        });
    }

    fn cancel_transition(&mut self, now: f64) -> ViewTransform {
        let current = self.view_at(now);
        if self.transition.take().is_some() {
            self.generation += 1;
        }
        self.view = current;
        current
    }

    fn request(&mut self, region: Option<&RegionRef>) {
        match self.on_select.as_mut() {
            Some(cb) => cb(region),
            None => debug!("selection intent dropped: no on_select callback"),
        }
    }

    fn notify(&mut self, region: Option<&RegionRef>) {
        if let Some(cb) = self.on_select.as_mut() {
            cb(region);
        }
    }
}
