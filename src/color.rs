//! Value → colour mapping whose palette depends on the sign structure of the data.
//!
//! - Non-negative data: light → dark teal over `[min, max]`.
//! - Non-positive data: dark red at `min` (most negative) → light at `max`.
//! - Mixed data: diverging red / neutral / teal with zero pinned to the middle stop.
//!   The negative half spans `[min, 0]` and the positive half `[0, max]` independently,
//!   so the scale is not linear across the whole domain when it is asymmetric.
//!
//! Inputs outside the domain clamp to the nearest end colour.

use serde::Serialize;

/// 8-bit RGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let h = hex.trim().trim_start_matches('#');
        if h.len() != 6 || !h.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&h[0..2], 16).ok()?;
        let g = u8::from_str_radix(&h[2..4], 16).ok()?;
        let b = u8::from_str_radix(&h[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Straight RGB interpolation, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let mix = |a: u8, b: u8| -> u8 {
            (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

/// Fill for regions the metric feed does not cover.
pub const NO_DATA: Rgb = Rgb::new(0xE5, 0xE5, 0xE5);

/// Non-negative ramp (light → dark teal).
pub const POSITIVE_LIGHT: Rgb = Rgb::new(0xE8, 0xF4, 0xF8);
pub const POSITIVE_DARK: Rgb = Rgb::new(0x1A, 0x53, 0x5C);

/// Non-positive ramp (light → dark red).
pub const NEGATIVE_LIGHT: Rgb = Rgb::new(0xFB, 0xE9, 0xE7);
pub const NEGATIVE_DARK: Rgb = Rgb::new(0xB7, 0x1C, 0x1C);

/// Middle stop of the diverging scale; value 0 always maps here.
pub const DIVERGING_MID: Rgb = Rgb::new(0xF5, 0xF5, 0xF5);

/// Domain used when there are no values at all.
pub const FALLBACK_DOMAIN: (f64, f64) = (0.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignType {
    NonNegative,
    NonPositive,
    Mixed,
}

impl SignType {
    pub fn label(self) -> &'static str {
        match self {
            SignType::NonNegative => "non-negative",
            SignType::NonPositive => "non-positive",
            SignType::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorDomain {
    pub min: f64,
    pub max: f64,
    pub sign: SignType,
}

impl ColorDomain {
    /// `min = floor(min(values))`, `max = ceil(max(values))`. Non-finite values are skipped;
    /// an empty (or all non-finite) input yields [`FALLBACK_DOMAIN`].
    pub fn from_values(values: &[f64]) -> Self {
        let (lo, hi) = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let (min, max) = if lo <= hi {
            (lo.floor(), hi.ceil())
        } else {
            FALLBACK_DOMAIN
        };
        Self::new(min, max)
    }

    fn new(min: f64, max: f64) -> Self {
        let sign = if min >= 0.0 {
            SignType::NonNegative
        } else if max <= 0.0 {
            SignType::NonPositive
        } else {
            SignType::Mixed
        };
        Self { min, max, sign }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Cached scale for one value series.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    domain: ColorDomain,
}

impl ColorScale {
    pub fn new(domain: ColorDomain) -> Self {
        Self { domain }
    }

    pub fn from_values(values: &[f64]) -> Self {
        Self::new(ColorDomain::from_values(values))
    }

    pub fn domain(&self) -> &ColorDomain {
        &self.domain
    }

    /// Colour stops in ascending value order, as `(value, colour)`.
    pub fn stops(&self) -> Vec<(f64, Rgb)> {
        let ColorDomain { min, max, sign } = self.domain;
        match sign {
            SignType::NonNegative => vec![(min, POSITIVE_LIGHT), (max, POSITIVE_DARK)],
            SignType::NonPositive => vec![(min, NEGATIVE_DARK), (max, NEGATIVE_LIGHT)],
            SignType::Mixed => vec![
                (min, NEGATIVE_DARK),
                (0.0, DIVERGING_MID),
                (max, POSITIVE_DARK),
            ],
        }
    }

    /// Map a value to its colour, clamping to the domain. Non-finite input → [`NO_DATA`].
    pub fn color_for(&self, value: f64) -> Rgb {
        if !value.is_finite() {
            return NO_DATA;
        }
        let ColorDomain { min, max, sign } = self.domain;
        let v = value.clamp(min, max);
        match sign {
            SignType::NonNegative => POSITIVE_LIGHT.lerp(POSITIVE_DARK, fraction(v, min, max)),
            // Dark at the negative end: ordering is by value, not by magnitude.
            SignType::NonPositive => NEGATIVE_DARK.lerp(NEGATIVE_LIGHT, 1.0 - fraction(v, max, min)),
            SignType::Mixed => {
                if v < 0.0 {
                    NEGATIVE_DARK.lerp(DIVERGING_MID, (v - min) / (0.0 - min))
                } else {
                    DIVERGING_MID.lerp(POSITIVE_DARK, v / max)
                }
            }
        }
    }

    /// Colour at position `u ∈ [0, 1]` along the legend bar. For mixed domains the bar is
    /// split in stop space: the left half covers `[min, 0]`, the right half `[0, max]`.
    pub fn color_at_position(&self, u: f64) -> Rgb {
        self.color_for(self.value_at_position(u))
    }

    pub fn value_at_position(&self, u: f64) -> f64 {
        let u = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.0 };
        let ColorDomain { min, max, sign } = self.domain;
        match sign {
            SignType::Mixed => {
                if u < 0.5 {
                    min * (1.0 - 2.0 * u)
                } else {
                    max * (2.0 * u - 1.0)
                }
            }
            _ => min + (max - min) * u,
        }
    }
}

/// Position of `v` between `light_end` (0.0) and `dark_end` (1.0). A zero-width domain
/// maps everything to the dark end.
fn fraction(v: f64, light_end: f64, dark_end: f64) -> f64 {
    let span = dark_end - light_end;
    if span == 0.0 {
        1.0
    } else {
        ((v - light_end) / span).clamp(0.0, 1.0)
    }
}
