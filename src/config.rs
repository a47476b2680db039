//! Map configuration with defaults matching the reference dashboard map.
//!
//! Every section is optional in the JSON file; missing fields fall back to `Default`.

use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MapConfig {
    pub surface: SurfaceConfig,
    pub zoom: ZoomConfig,
    pub style: StyleConfig,
    pub search: SearchConfig,
    pub feed: FeedConfig,
}

/// Fixed drawing surface the geometry is fitted into.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    /// Horizontal fill fraction of the padded area, in `(0, 1]`.
    pub scale_x: f64,
    /// Vertical fill fraction of the padded area, in `(0, 1]`.
    pub scale_y: f64,
    /// Use one scale for both axes instead of stretching each independently.
    pub preserve_aspect: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 900.0,
            padding: 20.0,
            scale_x: 0.92,
            scale_y: 0.92,
            preserve_aspect: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f64,
    pub max: f64,
    /// Factor applied by the zoom-in / zoom-out controls.
    pub step: f64,
    /// Duration of discrete transitions, seconds.
    pub duration: f64,
    /// Fraction of the viewport a zoomed-to region may occupy.
    pub fit_margin: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 8.0,
            step: 1.5,
            duration: 0.75,
            fit_margin: 0.9,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Fill colour transition after a data change, seconds.
    pub fill_duration: f64,
    pub attribution: String,
    pub legend_title: String,
    pub value_format: ValueFormat,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            fill_duration: 0.3,
            attribution: "PolicyEngine".to_string(),
            legend_title: String::new(),
            value_format: ValueFormat::default(),
        }
    }
}

/// How primary and secondary values are printed in legends, tooltips and search results.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValueFormat {
    pub prefix: String,
    pub suffix: String,
    pub decimals: usize,
    /// Locale tag for thousands/decimal separators ("en", "de", ...).
    pub locale: String,
}

impl Default for ValueFormat {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            decimals: 2,
            locale: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { limit: 5 }
    }
}

/// Property keys used to read region identity from the geometry feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub id_property: String,
    pub name_property: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            id_property: "SPC21CD".to_string(),
            name_property: "SPC21NM".to_string(),
        }
    }
}

impl MapConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: MapConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: MapConfig =
            serde_json::from_str(r#"{"zoom": {"max": 4.0}, "search": {"limit": 3}}"#).unwrap();
        assert_eq!(cfg.zoom.max, 4.0);
        assert_eq!(cfg.zoom.min, 1.0);
        assert_eq!(cfg.search.limit, 3);
        assert_eq!(cfg.surface.width, 600.0);
        assert_eq!(cfg.feed.name_property, "SPC21NM");
    }
}
