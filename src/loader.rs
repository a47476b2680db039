//! Region boundary loading from a GeoJSON feature collection (local file or HTTP).
//!
//! Only `Polygon` and `MultiPolygon` features are kept. Each feature needs an identifier
//! and a display name, read from configurable property keys ([`FeedConfig`]).
//!
//! Failures are terminal for one map view: there is no automatic retry, the caller
//! shows [`MapStatus::Unavailable`] instead of drawing the surface.
//!
//! Typical usage:
//! ```no_run
//! # use fiscal_map::loader::{GeometryClient, GeometrySource};
//! # use fiscal_map::config::FeedConfig;
//! let client = GeometryClient::new(FeedConfig::default())?;
//! let regions = client.load(&GeometrySource::parse("data/constituencies.geojson"))?;
//! # Ok::<(), fiscal_map::MapError>(())
//! ```

use crate::config::FeedConfig;
use crate::error::{MapError, Result};
use crate::models::{Coord, Polygon, Region, Ring};
use geojson::{Feature, GeoJson, Value};
use log::{debug, info, warn};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Where the geometry feed lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometrySource {
    Url(String),
    File(PathBuf),
}

impl GeometrySource {
    /// `http://` / `https://` prefixes mean a URL, anything else is a file path.
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        if t.starts_with("http://") || t.starts_with("https://") {
            GeometrySource::Url(t.to_string())
        } else {
            GeometrySource::File(PathBuf::from(t))
        }
    }
}

impl std::fmt::Display for GeometrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometrySource::Url(u) => write!(f, "{u}"),
            GeometrySource::File(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Load state of one map view.
#[derive(Debug, Clone, PartialEq)]
pub enum MapStatus {
    Loading,
    Ready,
    /// Terminal: the surface is not drawn and no retry is attempted.
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct GeometryClient {
    feed: FeedConfig,
    http: HttpClient,
}

impl GeometryClient {
    pub fn new(feed: FeedConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30)) // total request timeout
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("fiscal_map/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { feed, http })
    }

    pub fn feed(&self) -> &FeedConfig {
        &self.feed
    }

    pub fn load(&self, source: &GeometrySource) -> Result<Vec<Region>> {
        match source {
            GeometrySource::Url(url) => self.fetch(url),
            GeometrySource::File(path) => {
                let text = std::fs::read_to_string(path)?;
                let regions = parse_regions(&text, &self.feed)?;
                info!("loaded {} regions from {}", regions.len(), path.display());
                Ok(regions)
            }
        }
    }

    /// Single GET; any non-success status is surfaced as [`MapError::Status`].
    pub fn fetch(&self, url: &str) -> Result<Vec<Region>> {
        debug!("GET {url}");
        let resp = self.http.get(url).send()?;
        if !resp.status().is_success() {
            return Err(MapError::Status(resp.status()));
        }
        let text = resp.text()?;
        let regions = parse_regions(&text, &self.feed)?;
        info!("loaded {} regions from {url}", regions.len());
        Ok(regions)
    }
}

/// Parse a FeatureCollection into regions, in feed order.
pub fn parse_regions(text: &str, feed: &FeedConfig) -> Result<Vec<Region>> {
    let gj: GeoJson = text.parse()?;
    let fc = match gj {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(_) => return Err(MapError::NotFeatureCollection("Feature")),
        GeoJson::Geometry(_) => return Err(MapError::NotFeatureCollection("Geometry")),
    };

    let mut out = Vec::with_capacity(fc.features.len());
    for (i, feature) in fc.features.iter().enumerate() {
        match region_from_feature(feature, feed) {
            Some(region) => out.push(region),
            None => debug!("skipping feature #{i}: no polygon geometry or identity"),
        }
    }
    if out.is_empty() {
        return Err(MapError::EmptyGeometry);
    }
    Ok(out)
}

fn region_from_feature(feature: &Feature, feed: &FeedConfig) -> Option<Region> {
    let polygons = match &feature.geometry.as_ref()?.value {
        Value::Polygon(rings) => vec![convert_polygon(rings)],
        Value::MultiPolygon(polys) => polys.iter().map(|p| convert_polygon(p)).collect(),
        _ => return None,
    };
    let polygons: Vec<Polygon> = polygons.into_iter().filter(|p| !p.is_empty()).collect();
    if polygons.is_empty() {
        return None;
    }

    let id = property_string(feature, &feed.id_property).or_else(|| {
        feature.id.as_ref().map(|id| match id {
            geojson::feature::Id::String(s) => s.clone(),
            geojson::feature::Id::Number(n) => n.to_string(),
        })
    });
    let name = property_string(feature, &feed.name_property);

    let (id, name) = match (id, name) {
        (Some(id), Some(name)) => (id, name),
        (Some(id), None) => (id.clone(), id),
        (None, Some(name)) => {
            warn!("feature `{name}` has no `{}`; using its name as id", feed.id_property);
            (name.clone(), name)
        }
        (None, None) => return None,
    };

    Some(Region { id, name, polygons })
}

fn property_string(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn convert_polygon(rings: &[Vec<Vec<f64>>]) -> Polygon {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .filter_map(|pos| match pos.as_slice() {
                    [x, y, ..] => Some::<Coord>([*x, *y]),
                    _ => None,
                })
                .collect::<Ring>()
        })
        .filter(|ring| ring.len() >= 3)
        .collect()
}

/// Handle to a geometry load running on a worker thread.
///
/// Dropping the handle abandons the load: when the worker finishes, its send fails and
/// the result is discarded instead of reaching a view that no longer exists.
#[derive(Debug)]
pub struct PendingGeometry {
    source: GeometrySource,
    receiver: mpsc::Receiver<Result<Vec<Region>>>,
}

impl PendingGeometry {
    pub fn source(&self) -> &GeometrySource {
        &self.source
    }

    /// Non-blocking check; `None` while the load is still running.
    pub fn poll(&self) -> Option<Result<Vec<Region>>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(MapError::Disconnected)),
        }
    }

    /// Block until the load finishes.
    pub fn wait(self) -> Result<Vec<Region>> {
        self.receiver.recv().map_err(|_| MapError::Disconnected)?
    }
}

/// Start loading `source` in the background.
pub fn spawn_load(client: GeometryClient, source: GeometrySource) -> PendingGeometry {
    let (sender, receiver) = mpsc::channel();
    let worker_source = source.clone();
    thread::spawn(move || {
        let result = client.load(&worker_source);
        if sender.send(result).is_err() {
            debug!("geometry load for {worker_source} finished after its view was dropped");
        }
    });
    PendingGeometry { source, receiver }
}
