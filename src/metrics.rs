//! Metric feed IO and the id → metric index the map reads from.
//!
//! CSV layout: an `id` column and a `value` column are required. Optional `name` and
//! `group` columns carry display text. Columns named `value_<period>` become the
//! per-period breakdown; every other numeric column becomes a secondary tooltip field.

use crate::error::{MapError, Result};
use crate::models::{MetricField, RegionMetric};
use ahash::AHashMap;
use csv::{ReaderBuilder, WriterBuilder};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const PERIOD_PREFIX: &str = "value_";

/// Load metrics from `.json` (array of records) or anything else as CSV.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<RegionMetric>> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_json(path),
        _ => load_csv(path),
    }
}

pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Vec<RegionMetric>> {
    let f = File::open(path)?;
    Ok(serde_json::from_reader(f)?)
}

pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RegionMetric>> {
    read_csv(File::open(path)?)
}

/// Parse CSV metric rows from any reader.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RegionMetric>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let id_col = col("id").ok_or_else(|| MapError::MissingColumn("id".into()))?;
    let value_col = col("value").ok_or_else(|| MapError::MissingColumn("value".into()))?;
    let name_col = col("name");
    let group_col = col("group");

    let reserved: BTreeSet<usize> = [Some(id_col), Some(value_col), name_col, group_col]
        .into_iter()
        .flatten()
        .collect();

    let mut out = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let id = record.get(id_col).unwrap_or_default().to_string();
        if id.is_empty() {
            continue;
        }
        let value = record
            .get(value_col)
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(f64::NAN);
        let mut metric = RegionMetric::new(id, value);
        metric.name = name_col
            .and_then(|c| record.get(c))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        metric.group = group_col
            .and_then(|c| record.get(c))
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        for (i, header) in headers.iter().enumerate() {
            if reserved.contains(&i) {
                continue;
            }
            let Some(v) = record.get(i).and_then(|s| s.parse::<f64>().ok()) else {
                continue;
            };
            match header.strip_prefix(PERIOD_PREFIX) {
                Some(period) if !period.is_empty() => {
                    metric.breakdown.insert(period.to_string(), v);
                }
                _ => metric.secondary.push(MetricField {
                    label: header.to_string(),
                    value: v,
                }),
            }
        }
        out.push(metric);
    }
    Ok(out)
}

/// Save metrics as CSV with the same layout [`read_csv`] accepts.
pub fn save_csv<P: AsRef<Path>>(metrics: &[RegionMetric], path: P) -> Result<()> {
    let secondary: Vec<String> = ordered_labels(metrics.iter().flat_map(|m| {
        m.secondary.iter().map(|f| f.label.clone())
    }));
    let periods: Vec<String> = ordered_labels(metrics.iter().flat_map(|m| m.breakdown.keys().cloned()));

    let mut wtr = WriterBuilder::new().from_path(path)?;
    let mut header = vec![
        "id".to_string(),
        "name".to_string(),
        "group".to_string(),
        "value".to_string(),
    ];
    header.extend(secondary.iter().cloned());
    header.extend(periods.iter().map(|p| format!("{PERIOD_PREFIX}{p}")));
    wtr.write_record(&header)?;

    for m in metrics {
        let mut row = vec![
            m.id.clone(),
            m.name.clone().unwrap_or_default(),
            m.group.clone().unwrap_or_default(),
            m.value.to_string(),
        ];
        for label in &secondary {
            let v = m.secondary.iter().find(|f| &f.label == label).map(|f| f.value);
            row.push(v.map(|v| v.to_string()).unwrap_or_default());
        }
        for p in &periods {
            row.push(m.breakdown.get(p).map(|v| v.to_string()).unwrap_or_default());
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save metrics as a pretty JSON array.
pub fn save_json<P: AsRef<Path>>(metrics: &[RegionMetric], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(metrics)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

fn ordered_labels(labels: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    labels.filter(|l| seen.insert(l.clone())).collect()
}

/// Read-only id → metric lookup, rebuilt whenever the feed changes.
#[derive(Debug, Clone, Default)]
pub struct MetricIndex {
    by_id: AHashMap<String, RegionMetric>,
    /// First metric carrying secondary fields; its labels shape placeholder metrics.
    template: Option<RegionMetric>,
}

impl MetricIndex {
    pub fn new(metrics: Vec<RegionMetric>) -> Self {
        let template = metrics.iter().find(|m| !m.secondary.is_empty()).cloned();
        let by_id = metrics.into_iter().map(|m| (m.id.clone(), m)).collect();
        Self { by_id, template }
    }

    pub fn get(&self, id: &str) -> Option<&RegionMetric> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn template(&self) -> Option<&RegionMetric> {
        self.template.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_columns_are_classified() {
        let data = "id,name,group,value,estimated_sales,value_2026,value_2027\n\
                    S1,Glasgow East,Glasgow City,1.5,12,1.5,2.0\n\
                    S2,Falkirk,,-0.5,x,,\n";
        let rows = read_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name.as_deref(), Some("Glasgow East"));
        assert_eq!(rows[0].group.as_deref(), Some("Glasgow City"));
        assert_eq!(rows[0].secondary.len(), 1);
        assert_eq!(rows[0].secondary[0].label, "estimated_sales");
        assert_eq!(rows[0].breakdown.get("2027"), Some(&2.0));
        assert!(rows[1].group.is_none());
        assert!(rows[1].secondary.is_empty());
        assert_eq!(rows[1].value, -0.5);
    }

    #[test]
    fn missing_value_column_is_an_error() {
        let err = read_csv("id,name\nS1,A\n".as_bytes()).unwrap_err();
        assert!(matches!(err, MapError::MissingColumn(c) if c == "value"));
    }
}
