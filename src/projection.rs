//! Affine fit-to-surface transform.
//!
//! This is not a cartographic projection: source coordinates are scaled per axis,
//! centred, and flipped vertically so that "north" (increasing y) points up on a
//! surface whose y axis grows downward.

use crate::config::SurfaceConfig;
use crate::models::{Bounds, Coord};

/// Target drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Surface {
    pub fn new(width: f64, height: f64, padding: f64) -> Self {
        Self {
            width,
            height,
            padding,
        }
    }

    pub fn center(&self) -> Coord {
        [self.width / 2.0, self.height / 2.0]
    }

    /// The rectangle inside the padding, as bounds in surface coordinates.
    pub fn padded(&self) -> Bounds {
        Bounds {
            x_min: self.padding,
            x_max: self.width - self.padding,
            y_min: self.padding,
            y_max: self.height - self.padding,
        }
    }
}

impl From<&SurfaceConfig> for Surface {
    fn from(cfg: &SurfaceConfig) -> Self {
        Surface::new(cfg.width, cfg.height, cfg.padding)
    }
}

/// Fill fractions for each axis. Values are clamped into `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitFactors {
    pub x: f64,
    pub y: f64,
    pub preserve_aspect: bool,
}

impl Default for FitFactors {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            preserve_aspect: false,
        }
    }
}

impl From<&SurfaceConfig> for FitFactors {
    fn from(cfg: &SurfaceConfig) -> Self {
        Self {
            x: cfg.scale_x,
            y: cfg.scale_y,
            preserve_aspect: cfg.preserve_aspect,
        }
    }
}

fn clamp_factor(f: f64) -> f64 {
    if f.is_finite() && f > 0.0 { f.min(1.0) } else { 1.0 }
}

/// Precomputed `project(x, y)` for one geometry load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineFit {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    x_min: f64,
    y_min: f64,
    height: f64,
}

impl AffineFit {
    /// Fit `bounds` into `surface`. A zero-extent (or empty) axis uses scale 1.
    pub fn fit(bounds: &Bounds, surface: &Surface, factors: FitFactors) -> Self {
        let (x_min, y_min) = if bounds.is_empty() {
            (0.0, 0.0)
        } else {
            (bounds.x_min, bounds.y_min)
        };
        let data_w = bounds.width();
        let data_h = bounds.height();
        let inner_w = (surface.width - 2.0 * surface.padding).max(0.0);
        let inner_h = (surface.height - 2.0 * surface.padding).max(0.0);

        let axis_scale = |inner: f64, extent: f64, factor: f64| -> Option<f64> {
            if extent > 0.0 && extent.is_finite() {
                Some(inner / extent * clamp_factor(factor))
            } else {
                None
            }
        };
        let sx = axis_scale(inner_w, data_w, factors.x);
        let sy = axis_scale(inner_h, data_h, factors.y);

        let (scale_x, scale_y) = match (sx, sy) {
            (Some(a), Some(b)) if factors.preserve_aspect => (a.min(b), a.min(b)),
            (a, b) => (a.unwrap_or(1.0), b.unwrap_or(1.0)),
        };

        let offset_x = (surface.width - data_w * scale_x) / 2.0;
        let offset_y = (surface.height - data_h * scale_y) / 2.0;

        Self {
            scale_x,
            scale_y,
            offset_x,
            offset_y,
            x_min,
            y_min,
            height: surface.height,
        }
    }

    #[inline]
    pub fn project(&self, x: f64, y: f64) -> Coord {
        [
            (x - self.x_min) * self.scale_x + self.offset_x,
            self.height - ((y - self.y_min) * self.scale_y + self.offset_y),
        ]
    }

    pub fn project_ring(&self, ring: &[Coord]) -> Vec<Coord> {
        ring.iter().map(|[x, y]| self.project(*x, *y)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_axis_is_flipped() {
        let b = Bounds {
            x_min: 0.0,
            x_max: 10.0,
            y_min: 0.0,
            y_max: 10.0,
        };
        let fit = AffineFit::fit(&b, &Surface::new(100.0, 100.0, 0.0), FitFactors::default());
        let [_, top] = fit.project(0.0, 10.0);
        let [_, bottom] = fit.project(0.0, 0.0);
        assert!(top < bottom);
        assert_eq!(top, 0.0);
        assert_eq!(bottom, 100.0);
    }
}
