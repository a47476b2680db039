//! Colour legend: a sampled gradient bar with domain labels, laid out in surface units.
//!
//! The legend reads the [`ColorScale`] only; the same [`Legend`] feeds the egui viewer
//! and the plotters export so both show identical samples and labels.

use super::format::format_value;
use super::text::{ellipsize, text_width};
use crate::color::{ColorScale, Rgb, SignType};
use crate::config::ValueFormat;
use crate::models::Coord;
use crate::projection::Surface;

/// Number of gradient cells along the bar.
pub const LEGEND_SAMPLES: usize = 48;

// Layout constants shared by every backend.
pub const LEGEND_FONT_PX: f64 = 11.0;
pub const LEGEND_TITLE_FONT_PX: f64 = 12.0;
const BAR_MAX_WIDTH: f64 = 220.0;
const BAR_HEIGHT: f64 = 10.0;
const LABEL_GAP: f64 = 3.0;
const TITLE_GAP: f64 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LegendLabel {
    /// Position along the bar in `[0, 1]`.
    pub position: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub title: String,
    pub sign: SignType,
    /// Gradient cells, left to right.
    pub swatches: Vec<Rgb>,
    pub labels: Vec<LegendLabel>,
}

impl Legend {
    /// Sample `scale` in stop space. Mixed domains get a centred `0` label.
    pub fn from_scale(scale: &ColorScale, fmt: &ValueFormat, title: &str) -> Self {
        let n = LEGEND_SAMPLES;
        let swatches = (0..n)
            .map(|i| scale.color_at_position((i as f64 + 0.5) / n as f64))
            .collect();

        let domain = scale.domain();
        let labels = if domain.min == domain.max {
            vec![LegendLabel {
                position: 0.5,
                text: format_value(domain.min, fmt),
            }]
        } else {
            let mut labels = vec![LegendLabel {
                position: 0.0,
                text: format_value(domain.min, fmt),
            }];
            if domain.sign == SignType::Mixed {
                labels.push(LegendLabel {
                    position: 0.5,
                    text: format_value(0.0, fmt),
                });
            }
            labels.push(LegendLabel {
                position: 1.0,
                text: format_value(domain.max, fmt),
            });
            labels
        };

        Self {
            title: title.trim().to_string(),
            sign: domain.sign,
            swatches,
            labels,
        }
    }

    pub fn has_title(&self) -> bool {
        !self.title.is_empty()
    }
}

/// Where the legend sits on the surface. Anchored bottom-left, inside the padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendLayout {
    /// Top-left corner of the gradient bar.
    pub bar_origin: Coord,
    pub bar_width: f64,
    pub bar_height: f64,
    /// Baseline-top of the title, when there is one.
    pub title_y: f64,
    /// Top of the label row under the bar.
    pub label_y: f64,
}

impl LegendLayout {
    pub fn place(surface: &Surface, legend: &Legend) -> Self {
        let bar_width = (surface.width / 2.0 - surface.padding).clamp(40.0, BAR_MAX_WIDTH);
        let label_y_offset = BAR_HEIGHT + LABEL_GAP;
        let bottom = surface.height - surface.padding;
        let bar_y = bottom - label_y_offset - LEGEND_FONT_PX;
        let title_y = if legend.has_title() {
            bar_y - TITLE_GAP - LEGEND_TITLE_FONT_PX
        } else {
            bar_y
        };
        Self {
            bar_origin: [surface.padding, bar_y],
            bar_width,
            bar_height: BAR_HEIGHT,
            title_y,
            label_y: bar_y + label_y_offset,
        }
    }

    /// Rectangle of the `i`-th gradient cell as `(top_left, bottom_right)`.
    pub fn swatch_rect(&self, i: usize, count: usize) -> (Coord, Coord) {
        let count = count.max(1) as f64;
        let [x0, y0] = self.bar_origin;
        let w = self.bar_width / count;
        let left = x0 + w * i as f64;
        ([left, y0], [left + w, y0 + self.bar_height])
    }

    /// Left edge for a label so it stays under the bar: the first label is
    /// left-aligned, the last right-aligned, anything else centred on its position.
    pub fn label_x(&self, label: &LegendLabel) -> f64 {
        let w = text_width(&label.text, LEGEND_FONT_PX);
        let at = self.bar_origin[0] + self.bar_width * label.position;
        if label.position <= 0.0 {
            at
        } else if label.position >= 1.0 {
            at - w
        } else {
            at - w / 2.0
        }
    }

    /// Title cut to the bar width.
    pub fn fitted_title(&self, legend: &Legend) -> String {
        ellipsize(&legend.title, LEGEND_TITLE_FONT_PX, self.bar_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_legend_has_centred_zero() {
        let scale = ColorScale::from_values(&[-30.0, -5.0, 0.0, 10.0, 40.0]);
        let legend = Legend::from_scale(&scale, &ValueFormat::default(), "");
        let texts: Vec<_> = legend.labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["-30.00", "0.00", "40.00"]);
        assert_eq!(legend.labels[1].position, 0.5);
        assert_eq!(legend.swatches.len(), LEGEND_SAMPLES);
    }

    #[test]
    fn layout_stays_inside_padding() {
        let surface = Surface::new(600.0, 900.0, 20.0);
        let scale = ColorScale::from_values(&[0.0, 5.0]);
        let legend = Legend::from_scale(&scale, &ValueFormat::default(), "Average gain");
        let layout = LegendLayout::place(&surface, &legend);
        assert!(layout.title_y >= surface.padding);
        assert!(layout.label_y + LEGEND_FONT_PX <= surface.height - surface.padding + 1e-9);
        let (_, last) = layout.swatch_rect(LEGEND_SAMPLES - 1, LEGEND_SAMPLES);
        assert!((last[0] - (surface.padding + layout.bar_width)).abs() < 1e-9);
    }
}
