//! Pan/zoom transform and its time-driven transitions.

use crate::models::Coord;

/// `screen = (x + k·px, y + k·py)` for a point `p` in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn new(k: f64, x: f64, y: f64) -> Self {
        Self { k, x, y }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    #[inline]
    pub fn apply(&self, [px, py]: Coord) -> Coord {
        [self.x + self.k * px, self.y + self.k * py]
    }

    #[inline]
    pub fn invert(&self, [sx, sy]: Coord) -> Coord {
        [(sx - self.x) / self.k, (sy - self.y) / self.k]
    }

    pub fn panned(&self, dx: f64, dy: f64) -> Self {
        Self {
            k: self.k,
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Multiply the scale by `factor` (clamped to `[min, max]`) keeping `focus`, a point in
    /// transformed space, fixed.
    pub fn scaled_about(&self, factor: f64, focus: Coord, min: f64, max: f64) -> Self {
        let k = (self.k * factor).clamp(min, max);
        let ratio = k / self.k;
        Self {
            k,
            x: focus[0] - (focus[0] - self.x) * ratio,
            y: focus[1] - (focus[1] - self.y) * ratio,
        }
    }

    /// Scale interpolates geometrically so zooming feels uniform; translation linearly.
    pub fn interpolate(a: &ViewTransform, b: &ViewTransform, t: f64) -> ViewTransform {
        let t = t.clamp(0.0, 1.0);
        let k = if a.k > 0.0 && b.k > 0.0 {
            a.k * (b.k / a.k).powf(t)
        } else {
            a.k + (b.k - a.k) * t
        };
        ViewTransform {
            k,
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }
}

/// Cubic in-out easing.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

/// One animated move between two transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: ViewTransform,
    pub to: ViewTransform,
    pub start: f64,
    pub duration: f64,
    /// Scale a zoom step asked for before clamping. Equals `to.k` for other moves.
    pub requested_k: f64,
}

impl Transition {
    pub fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start) / self.duration).clamp(0.0, 1.0)
    }

    pub fn value_at(&self, now: f64) -> ViewTransform {
        let p = self.progress(now);
        if p >= 1.0 {
            return self.to;
        }
        ViewTransform::interpolate(&self.from, &self.to, ease_cubic_in_out(p))
    }

    pub fn is_finished(&self, now: f64) -> bool {
        self.progress(now) >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_hits_endpoints() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert!((ease_cubic_in_out(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn scaled_about_keeps_focus_fixed() {
        let v = ViewTransform::new(2.0, -40.0, 10.0);
        let focus = [300.0, 450.0];
        let before = v.invert(focus);
        let z = v.scaled_about(1.5, focus, 1.0, 8.0);
        let after = z.invert(focus);
        assert!((before[0] - after[0]).abs() < 1e-9);
        assert!((before[1] - after[1]).abs() < 1e-9);
    }
}
