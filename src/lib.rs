//! fiscal_map
//!
//! Interactive choropleth maps of per-region policy impacts. Pairs with the `fmap` CLI
//! and the `fmap-gui` desktop viewer.
//!
//! ### Features
//! - Load region boundaries from a GeoJSON FeatureCollection (file or URL)
//! - Fit them onto a fixed drawing surface with an affine, y-flipped transform
//! - Colour regions from a metric feed with a sign-aware (sequential or diverging) scale
//! - Highlight by click, search, or a parent-controlled selection, with animated zoom
//! - Export the current view to SVG or PNG
//!
//! ### Example
//! ```no_run
//! use fiscal_map::{GeometryClient, GeometrySource, MapConfig, MapController, MapScene};
//!
//! let config = MapConfig::default();
//! let client = GeometryClient::new(config.feed.clone())?;
//! let regions = client.load(&GeometrySource::parse("constituencies.geojson"))?;
//!
//! let mut scene = MapScene::new(&regions, &config);
//! scene.set_metrics(fiscal_map::metrics::load("impacts.csv")?, 0.0);
//!
//! let mut controller = MapController::new(&config);
//! controller.set_search_query(&scene, "glas");
//! controller.pick_search_result(&scene, 0, 0.0);
//! fiscal_map::render::export::render_to_file(&scene, &controller, 10.0, "map.svg")?;
//! # Ok::<(), fiscal_map::MapError>(())
//! ```

pub mod color;
pub mod config;
pub mod controller;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod projection;
pub mod render;
pub mod search;

pub use color::{ColorDomain, ColorScale, Rgb, SignType};
pub use config::MapConfig;
pub use controller::{MapController, RegionLookup, SelectionMode, StrokeState, ViewTransform};
pub use error::MapError;
pub use loader::{GeometryClient, GeometrySource, MapStatus};
pub use models::{Bounds, PeriodSelector, Region, RegionMetric, RegionRef};
pub use projection::{AffineFit, FitFactors, Surface};
pub use render::MapScene;
pub use search::SearchIndex;
