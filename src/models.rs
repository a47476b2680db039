use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `[x, y]` coordinate in the geometry's own reference system.
pub type Coord = [f64; 2];

/// A closed ring of coordinates (the closing duplicate is optional).
pub type Ring = Vec<Coord>;

/// A polygon: first ring is the outer boundary, the rest are holes.
pub type Polygon = Vec<Ring>;

/// A geographic/administrative area with a stable identifier and boundary polygons.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub polygons: Vec<Polygon>,
}

impl Region {
    /// Bounding box over every ring of every polygon.
    pub fn bounds(&self) -> Bounds {
        let mut b = Bounds::empty();
        for ring in self.polygons.iter().flatten() {
            for c in ring {
                b.extend(*c);
            }
        }
        b
    }

    pub fn region_ref(&self) -> RegionRef {
        RegionRef::new(&self.id, &self.name)
    }
}

/// Lightweight `{identifier, displayName}` pair used for selection and search results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionRef {
    pub id: String,
    pub name: String,
}

impl RegionRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Axis-aligned bounding box. An empty box has `x_min > x_max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn empty() -> Self {
        Self {
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.x_min <= self.x_max && self.y_min <= self.y_max)
    }

    pub fn extend(&mut self, [x, y]: Coord) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.x_min = self.x_min.min(x);
        self.x_max = self.x_max.max(x);
        self.y_min = self.y_min.min(y);
        self.y_max = self.y_max.max(y);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            x_min: self.x_min.min(other.x_min),
            x_max: self.x_max.max(other.x_max),
            y_min: self.y_min.min(other.y_min),
            y_max: self.y_max.max(other.y_max),
        }
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.x_max - self.x_min }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.y_max - self.y_min }
    }

    pub fn center(&self) -> Coord {
        if self.is_empty() {
            return [0.0, 0.0];
        }
        [
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        ]
    }

    pub fn contains(&self, [x, y]: Coord) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// Named secondary value shown in the tooltip only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricField {
    pub label: String,
    pub value: f64,
}

/// Per-region data row supplied by the metric feed.
///
/// `value` drives the fill colour; `secondary` fields are shown in the tooltip;
/// `breakdown` holds per-period values that a period selector can switch between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMetric {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Grouping label shown under the name (e.g. the council a constituency belongs to).
    #[serde(default)]
    pub group: Option<String>,
    pub value: f64,
    #[serde(default)]
    pub secondary: Vec<MetricField>,
    #[serde(default)]
    pub breakdown: BTreeMap<String, f64>,
}

impl RegionMetric {
    pub fn new(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            name: None,
            group: None,
            value,
            secondary: Vec::new(),
            breakdown: BTreeMap::new(),
        }
    }

    pub fn with_secondary(mut self, label: impl Into<String>, value: f64) -> Self {
        self.secondary.push(MetricField {
            label: label.into(),
            value,
        });
        self
    }

    pub fn with_period(mut self, period: impl Into<String>, value: f64) -> Self {
        self.breakdown.insert(period.into(), value);
        self
    }

    /// Zero-valued stand-in for a region the feed does not cover. Secondary labels are
    /// copied from `template` (if any) with zero values so tooltips keep their shape.
    pub fn placeholder(region: &RegionRef, template: Option<&RegionMetric>) -> Self {
        let secondary = template
            .map(|t| {
                t.secondary
                    .iter()
                    .map(|f| MetricField {
                        label: f.label.clone(),
                        value: 0.0,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            id: region.id.clone(),
            name: Some(region.name.clone()),
            group: None,
            value: 0.0,
            secondary,
            breakdown: BTreeMap::new(),
        }
    }
}

/// Optional period/year selector rendered next to the map. The map never interprets
/// the labels; it only re-keys metric values from each metric's `breakdown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSelector {
    pub periods: Vec<String>,
    pub selected: usize,
}

impl PeriodSelector {
    pub fn new(periods: Vec<String>) -> Option<Self> {
        if periods.is_empty() {
            None
        } else {
            Some(Self {
                periods,
                selected: 0,
            })
        }
    }

    /// Collect the distinct period labels found in the metrics' breakdowns.
    pub fn from_metrics(metrics: &[RegionMetric]) -> Option<Self> {
        let mut periods: Vec<String> = metrics
            .iter()
            .flat_map(|m| m.breakdown.keys().cloned())
            .collect();
        periods.sort();
        periods.dedup();
        Self::new(periods)
    }

    pub fn current(&self) -> Option<&str> {
        self.periods.get(self.selected).map(|s| s.as_str())
    }

    /// Select a period by label; returns `true` when the selection changed.
    pub fn select(&mut self, period: &str) -> bool {
        match self.periods.iter().position(|p| p == period) {
            Some(i) if i != self.selected => {
                self.selected = i;
                true
            }
            _ => false,
        }
    }
}

/// Re-key every metric's primary value from its breakdown entry for `period`.
/// Metrics without an entry for that period keep their current value.
pub fn apply_period(metrics: &[RegionMetric], period: &str) -> Vec<RegionMetric> {
    metrics
        .iter()
        .map(|m| {
            let mut out = m.clone();
            if let Some(v) = m.breakdown.get(period) {
                out.value = *v;
            }
            out
        })
        .collect()
}
