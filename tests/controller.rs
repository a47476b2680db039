use fiscal_map::controller::{MapController, RegionLookup, SelectionMode, StrokeState, ViewTransform};
use fiscal_map::models::{Region, RegionMetric, RegionRef};
use fiscal_map::{MapConfig, MapScene};
use std::cell::RefCell;
use std::rc::Rc;

fn square(id: &str, name: &str, x: f64, y: f64, size: f64) -> Region {
    Region {
        id: id.into(),
        name: name.into(),
        polygons: vec![vec![vec![
            [x, y],
            [x + size, y],
            [x + size, y + size],
            [x, y + size],
            [x, y],
        ]]],
    }
}

fn sample_scene(config: &MapConfig) -> MapScene {
    let regions = vec![
        square("S1", "Glasgow East", 0.0, 0.0, 10.0),
        square("S2", "Glasgow North", 10.0, 0.0, 10.0),
        square("S3", "Falkirk", 0.0, 10.0, 10.0),
        square("S4", "Fife", 10.0, 10.0, 10.0),
    ];
    let mut scene = MapScene::new(&regions, config);
    scene.set_metrics(
        vec![
            RegionMetric::new("S1", 1.5).with_secondary("households", 1200.0),
            RegionMetric::new("S2", -0.5).with_secondary("households", 800.0),
            RegionMetric::new("S3", 2.0).with_secondary("households", 640.0),
        ],
        0.0,
    );
    scene
}

/// Time after every transition has finished.
const LATER: f64 = 10.0;

#[test]
fn clicking_a_then_b_leaves_one_highlight_and_tooltip() {
    let config = MapConfig::default();
    let scene = sample_scene(&config);
    let mut c = MapController::new(&config);

    c.click_region(&scene, "S1", 0.0);
    c.click_region(&scene, "S3", 0.1);

    assert_eq!(c.highlighted().map(|r| r.id.as_str()), Some("S3"));
    let tip = c.tooltip().expect("tooltip open");
    assert_eq!(tip.region.id, "S3");
    assert_eq!(tip.metric.value, 2.0);
    assert_eq!(c.stroke_state("S1"), StrokeState::Normal);
    assert_eq!(c.stroke_state("S3"), StrokeState::Highlighted);

    let frame = scene.frame(&c, LATER);
    let highlighted: Vec<_> = frame
        .regions
        .iter()
        .filter(|p| p.state == StrokeState::Highlighted)
        .collect();
    assert_eq!(highlighted.len(), 1);
    assert_eq!(frame.regions.last().map(|p| p.id.as_str()), Some("S3"));
    assert!(frame.tooltip.is_some());
}

#[test]
fn background_click_clears_and_search_pick_restores() {
    let config = MapConfig::default();
    let scene = sample_scene(&config);
    let mut c = MapController::new(&config);

    c.click_region(&scene, "S2", 0.0);
    c.tick(LATER);
    let zoomed = c.view_at(LATER);
    c.click_background();
    assert!(c.highlighted().is_none());
    assert!(c.tooltip().is_none());
    // Zoom level is kept.
    assert_eq!(c.view_at(LATER), zoomed);

    c.set_search_query(&scene, "fal");
    assert_eq!(c.search().results.len(), 1);
    assert!(c.pick_search_result(&scene, 0, LATER));
    assert_eq!(c.highlighted().map(|r| r.id.as_str()), Some("S3"));
    assert!(c.tooltip().is_some());
    assert!(c.search().query.is_empty());
    assert!(c.search().results.is_empty());
}

#[test]
fn zoom_in_then_out_before_completion_returns_to_initial_scale() {
    let config = MapConfig::default();
    let mut c = MapController::new(&config);
    c.zoom_in(0.0);
    c.zoom_out(0.1);
    let target = c.target_view();
    assert!((target.k - 1.0).abs() < 1e-12);
    c.tick(LATER);
    let settled = c.view_at(LATER);
    assert!((settled.k - 1.0).abs() < 1e-12);
    assert!(settled.x.abs() < 1e-9 && settled.y.abs() < 1e-9);
}

#[test]
fn zoom_pair_cancels_at_max_scale() {
    let config = MapConfig::default();
    let mut c = MapController::new(&config);
    for i in 0..6 {
        c.zoom_in(i as f64);
    }
    c.tick(LATER);
    let initial = c.view_at(LATER);
    assert_eq!(initial.k, 8.0);

    c.zoom_in(LATER);
    assert_eq!(c.target_view().k, 8.0);
    c.zoom_out(LATER + 0.1);
    let target = c.target_view();
    assert!((target.k - 8.0).abs() < 1e-12);
    assert!((target.x - initial.x).abs() < 1e-9 && (target.y - initial.y).abs() < 1e-9);
}

#[test]
fn zoom_pair_cancels_at_min_scale() {
    let config = MapConfig::default();
    let mut c = MapController::new(&config);
    c.zoom_out(0.0);
    assert_eq!(c.target_view().k, 1.0);
    c.zoom_in(0.1);
    let target = c.target_view();
    assert!((target.k - 1.0).abs() < 1e-12);
    assert!(target.x.abs() < 1e-9 && target.y.abs() < 1e-9);
}

#[test]
fn settled_zoom_does_not_carry_clamped_steps() {
    let config = MapConfig::default();
    let mut c = MapController::new(&config);
    for i in 0..6 {
        c.zoom_in(i as f64);
    }
    c.zoom_in(LATER);
    c.tick(2.0 * LATER);
    c.zoom_out(2.0 * LATER);
    assert!((c.target_view().k - 8.0 / 1.5).abs() < 1e-9);
}

#[test]
fn zoom_buttons_respect_extent() {
    let config = MapConfig::default();
    let mut c = MapController::new(&config);
    for i in 0..20 {
        c.zoom_in(i as f64);
    }
    assert_eq!(c.target_view().k, 8.0);
    for i in 0..20 {
        c.zoom_out(20.0 + i as f64);
    }
    assert_eq!(c.target_view().k, 1.0);
}

#[test]
fn reset_restores_identity_and_clears_selection() {
    let config = MapConfig::default();
    let scene = sample_scene(&config);
    let mut c = MapController::new(&config);
    c.click_region(&scene, "S4", 0.0);
    c.hover(Some("S1"));
    c.tick(LATER);
    assert!(c.view_at(LATER).k > 1.0);

    c.reset(LATER);
    c.tick(2.0 * LATER);
    assert_eq!(c.view_at(2.0 * LATER), ViewTransform::IDENTITY);
    assert!(c.highlighted().is_none());
    assert!(c.tooltip().is_none());
    assert!(c.hovered().is_none());
}

#[test]
fn zoom_to_region_centres_it() {
    let config = MapConfig::default();
    let scene = sample_scene(&config);
    let mut c = MapController::new(&config);
    c.click_region(&scene, "S1", 0.0);
    let view = c.target_view();
    let bounds = scene.region_bounds("S1").unwrap();
    let [cx, cy] = view.apply(bounds.center());
    assert!((cx - 300.0).abs() < 1e-6);
    assert!((cy - 450.0).abs() < 1e-6);
    assert!(view.k >= 1.0 && view.k <= 8.0);
}

#[test]
fn transition_is_animated_and_superseded() {
    let config = MapConfig::default();
    let scene = sample_scene(&config);
    let mut c = MapController::new(&config);

    c.click_region(&scene, "S1", 0.0);
    let first = c.generation();
    let mid = c.view_at(0.3);
    assert!(mid.k > 1.0 && mid.k < c.target_view().k);

    c.click_region(&scene, "S4", 0.3);
    assert!(c.generation() > first);
    let t = c.transition().unwrap();
    // New transition starts from what was on screen.
    assert_eq!(t.from, mid);
    assert!(c.tick(0.5));
    assert!(!c.tick(LATER));
}

#[test]
fn pan_cancels_in_flight_transition() {
    let config = MapConfig::default();
    let scene = sample_scene(&config);
    let mut c = MapController::new(&config);
    c.click_region(&scene, "S2", 0.0);
    let on_screen = c.view_at(0.2);
    c.pan_by(15.0, -5.0, 0.2);
    assert!(!c.is_animating());
    let v = c.view_at(LATER);
    assert_eq!(v.k, on_screen.k);
    assert!((v.x - (on_screen.x + 15.0)).abs() < 1e-9);
}

#[test]
fn reclicking_highlighted_region_is_a_no_op() {
    let config = MapConfig::default();
    let scene = sample_scene(&config);
    let mut c = MapController::new(&config);
    c.click_region(&scene, "S1", 0.0);
    let generation = c.generation();
    c.click_region(&scene, "S1", 0.2);
    assert_eq!(c.generation(), generation);
}

#[test]
fn hover_never_overrides_highlight() {
    let config = MapConfig::default();
    let scene = sample_scene(&config);
    let mut c = MapController::new(&config);
    c.click_region(&scene, "S1", 0.0);
    c.hover(Some("S1"));
    assert_eq!(c.stroke_state("S1"), StrokeState::Highlighted);
    c.hover(Some("S2"));
    assert_eq!(c.stroke_state("S2"), StrokeState::Hovered);
    c.hover(None);
    assert_eq!(c.stroke_state("S2"), StrokeState::Normal);
}

#[test]
fn controlled_mode_reports_intent_without_mutating() {
    let config = MapConfig::default();
    let scene = sample_scene(&config);
    let seen: Rc<RefCell<Vec<Option<String>>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut c = MapController::controlled(
        &config,
        Box::new(move |r: Option<&RegionRef>| sink.borrow_mut().push(r.map(|r| r.id.clone()))),
    );
    assert_eq!(c.mode(), SelectionMode::Controlled);

    c.click_region(&scene, "S2", 0.0);
    assert!(c.highlighted().is_none());
    assert!(!c.is_animating());
    assert_eq!(seen.borrow().as_slice(), [Some("S2".to_string())]);

    // Parent answers.
    c.sync_selection(&scene, Some(&RegionRef::new("S2", "Glasgow North")), 0.0);
    assert_eq!(c.highlighted().map(|r| r.id.as_str()), Some("S2"));
    assert!(c.tooltip().is_some());

    c.click_background();
    assert_eq!(seen.borrow().last(), Some(&None));
    assert!(c.highlighted().is_some());

    c.sync_selection(&scene, None, 1.0);
    assert!(c.highlighted().is_none());
    assert!(c.tooltip().is_none());
}

#[test]
fn controlled_selection_without_metric_gets_placeholder() {
    let config = MapConfig::default();
    let scene = sample_scene(&config);
    let mut c = MapController::controlled(&config, Box::new(|_: Option<&RegionRef>| {}));
    c.sync_selection(&scene, Some(&RegionRef::new("S4", "Fife")), 0.0);
    let tip = c.tooltip().expect("tooltip");
    assert_eq!(tip.metric.value, 0.0);
    assert_eq!(tip.metric.name.as_deref(), Some("Fife"));
    assert_eq!(tip.metric.secondary.len(), 1);
    assert_eq!(tip.metric.secondary[0].label, "households");
    assert_eq!(tip.metric.secondary[0].value, 0.0);
}

#[test]
fn controlled_selection_of_unknown_id_clears() {
    let config = MapConfig::default();
    let scene = sample_scene(&config);
    let mut c = MapController::controlled(&config, Box::new(|_: Option<&RegionRef>| {}));
    c.sync_selection(&scene, Some(&RegionRef::new("S1", "Glasgow East")), 0.0);
    c.sync_selection(&scene, Some(&RegionRef::new("S99", "Nowhere")), 1.0);
    assert!(c.highlighted().is_none());
    assert!(c.tooltip().is_none());
}

#[test]
fn internal_mode_notifies_after_change() {
    let config = MapConfig::default();
    let scene = sample_scene(&config);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut c = MapController::new(&config).with_on_select(Box::new(move |r: Option<&RegionRef>| {
        sink.borrow_mut().push(r.map(|r| r.id.clone()))
    }));
    c.click_region(&scene, "S1", 0.0);
    c.click_background();
    assert_eq!(seen.borrow().as_slice(), [Some("S1".to_string()), None]);
    // Internal mode ignores external sync.
    c.sync_selection(&scene, Some(&RegionRef::new("S2", "Glasgow North")), 1.0);
    assert!(c.highlighted().is_none());
}

#[test]
fn dismiss_tooltip_keeps_highlight() {
    let config = MapConfig::default();
    let scene = sample_scene(&config);
    let mut c = MapController::new(&config);
    c.click_region(&scene, "S3", 0.0);
    c.dismiss_tooltip();
    assert!(c.tooltip().is_none());
    assert_eq!(c.highlighted().map(|r| r.id.as_str()), Some("S3"));
}
