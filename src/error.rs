use thiserror::Error;

/// Errors surfaced by the map engine. Everything here is local to one map view;
/// none of it should take down the surrounding dashboard.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request failed with HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid geojson: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("expected a FeatureCollection, got {0}")]
    NotFeatureCollection(&'static str),

    #[error("geometry feed contains no polygon features")]
    EmptyGeometry,

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required column `{0}`")]
    MissingColumn(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("geometry loader stopped before delivering a result")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, MapError>;
