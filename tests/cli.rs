use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn write_fixtures(dir: &Path) -> (PathBuf, PathBuf) {
    let square = |x: f64| json!([[[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0], [x, 0.0]]]);
    let geo = json!({
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature",
              "properties": { "SPC21CD": "S16000111", "SPC21NM": "Glasgow East" },
              "geometry": { "type": "Polygon", "coordinates": square(0.0) } },
            { "type": "Feature",
              "properties": { "SPC21CD": "S16000112", "SPC21NM": "Glasgow North" },
              "geometry": { "type": "Polygon", "coordinates": square(1.0) } },
            { "type": "Feature",
              "properties": { "SPC21CD": "S16000113", "SPC21NM": "Falkirk" },
              "geometry": { "type": "Polygon", "coordinates": square(2.0) } }
        ]
    });
    let geo_path = dir.join("regions.geojson");
    fs::write(&geo_path, geo.to_string()).unwrap();

    let csv_path = dir.join("impacts.csv");
    fs::write(
        &csv_path,
        "id,name,group,value,value_2026,value_2027\n\
         S16000111,Glasgow East,Glasgow City,-30,-30,-12\n\
         S16000112,Glasgow North,Glasgow City,10,10,15\n\
         S16000113,Falkirk,Falkirk,40,40,22\n",
    )
    .unwrap();
    (geo_path, csv_path)
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("fmap").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("search"));
}

#[test]
fn viewer_parses_args_without_a_display() {
    let mut cmd = Command::cargo_bin("fmap-gui").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--geometry"));
}

#[test]
fn domain_reports_sign_type() {
    let dir = tempfile::tempdir().unwrap();
    let (_, csv) = write_fixtures(dir.path());
    let mut cmd = Command::cargo_bin("fmap").unwrap();
    cmd.args(["domain", "--metrics"]).arg(&csv);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("min=-30 max=40 sign=mixed"));
}

#[test]
fn search_lists_matches_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let (geo, csv) = write_fixtures(dir.path());
    let mut cmd = Command::cargo_bin("fmap").unwrap();
    cmd.args(["search", "--geometry"])
        .arg(&geo)
        .arg("--metrics")
        .arg(&csv)
        .arg("glas");
    cmd.assert().success().stdout(
        predicate::str::contains("S16000111\tGlasgow East (-30.00)")
            .and(predicate::str::contains("Glasgow North"))
            .and(predicate::str::contains("Falkirk").not()),
    );
}

#[test]
fn render_writes_svg_with_selection() {
    let dir = tempfile::tempdir().unwrap();
    let (geo, csv) = write_fixtures(dir.path());
    let out = dir.path().join("map.svg");
    let joined = dir.path().join("joined.csv");

    let mut cmd = Command::cargo_bin("fmap").unwrap();
    cmd.args(["render", "--geometry"])
        .arg(&geo)
        .arg("--metrics")
        .arg(&csv)
        .arg("--out")
        .arg(&out)
        .args(["--search", "falk", "--period", "2027", "--zoom-steps", "-1"])
        .arg("--save-metrics")
        .arg(&joined);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Highlighted Falkirk (S16000113)"));

    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.contains("Falkirk"));
    assert!(svg.contains("2027"));
    let rows = fs::read_to_string(&joined).unwrap();
    assert_eq!(rows.lines().count(), 4);
}

#[test]
fn render_rejects_unknown_region() {
    let dir = tempfile::tempdir().unwrap();
    let (geo, _) = write_fixtures(dir.path());
    let mut cmd = Command::cargo_bin("fmap").unwrap();
    cmd.args(["render", "--geometry"])
        .arg(&geo)
        .arg("--out")
        .arg(dir.path().join("x.svg"))
        .args(["--select", "S99"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no region with id"));
}

#[test]
fn unreadable_geometry_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.geojson");
    fs::write(&bad, r#"{"type": "Point", "coordinates": [0, 0]}"#).unwrap();
    let mut cmd = Command::cargo_bin("fmap").unwrap();
    cmd.args(["search", "--geometry"]).arg(&bad).arg("x");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("FeatureCollection"));
}

// Live test (opt-in): cargo test --features online
#[cfg(feature = "online")]
#[test]
fn render_from_unreachable_url_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("fmap").unwrap();
    cmd.args(["render", "--geometry", "http://127.0.0.1:9/x.geojson", "--out"])
        .arg(dir.path().join("x.svg"));
    cmd.assert().failure();
}
