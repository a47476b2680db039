use fiscal_map::metrics::{self, MetricIndex};
use fiscal_map::models::{PeriodSelector, RegionMetric, apply_period};
use std::fs;

fn sample() -> Vec<RegionMetric> {
    vec![
        RegionMetric::new("S1", 1.25)
            .with_secondary("households", 1200.0)
            .with_period("2026", 1.25)
            .with_period("2027", 1.75),
        RegionMetric::new("S2", -0.5)
            .with_secondary("households", 800.0)
            .with_period("2026", -0.5),
    ]
}

#[test]
fn csv_round_trip_keeps_secondary_and_periods() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("impacts.csv");
    metrics::save_csv(&sample(), &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("id,name,group,value,households,value_2026,value_2027"));

    let back = metrics::load(&path).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back[0].secondary[0].label, "households");
    assert_eq!(back[0].breakdown.get("2027"), Some(&1.75));
    assert!(back[1].breakdown.get("2027").is_none());
    assert_eq!(back[1].value, -0.5);
}

#[test]
fn json_feed_is_loaded_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("impacts.json");
    fs::write(
        &path,
        r#"[{"id": "S1", "name": "Fife", "group": "Fife Council", "value": 3.5},
            {"id": "S2", "value": -1.0, "secondary": [{"label": "rev", "value": 2.0}]}]"#,
    )
    .unwrap();
    let rows = metrics::load(&path).unwrap();
    assert_eq!(rows[0].group.as_deref(), Some("Fife Council"));
    assert!(rows[0].secondary.is_empty());
    assert_eq!(rows[1].secondary[0].value, 2.0);
}

#[test]
fn index_template_shapes_placeholders() {
    let idx = MetricIndex::new(sample());
    assert_eq!(idx.len(), 2);
    assert_eq!(idx.get("S2").map(|m| m.value), Some(-0.5));
    assert!(idx.get("S9").is_none());
    assert_eq!(idx.template().map(|t| t.id.as_str()), Some("S1"));
}

#[test]
fn period_selection_rekeys_values() {
    let rows = sample();
    let mut selector = PeriodSelector::from_metrics(&rows).unwrap();
    assert_eq!(selector.periods, ["2026", "2027"]);
    assert_eq!(selector.current(), Some("2026"));
    assert!(selector.select("2027"));
    assert!(!selector.select("2027"));
    assert!(!selector.select("1999"));

    let shown = apply_period(&rows, "2027");
    assert_eq!(shown[0].value, 1.75);
    // No entry for that period: value unchanged.
    assert_eq!(shown[1].value, -0.5);
}
