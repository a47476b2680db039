//! Text measurement and fitting for labels drawn on the map surface.
//!
//! Neither plotters nor the SVG output can measure text, so widths are estimated from
//! character count and font size. Good enough to size tooltip boxes and legend labels.

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.6;

/// Estimated rendered width of `text` at `font_px`.
pub fn text_width(text: &str, font_px: f64) -> f64 {
    text.chars().count() as f64 * font_px * GLYPH_ADVANCE
}

/// Cut `text` so it fits `max_px`, ending with a single ellipsis when shortened.
pub fn ellipsize(text: &str, font_px: f64, max_px: f64) -> String {
    if text_width(text, font_px) <= max_px {
        return text.to_string();
    }
    let budget = ((max_px / (font_px * GLYPH_ADVANCE)).floor() as usize).saturating_sub(1);
    if budget == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(budget).collect();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

/// Break `text` on whitespace into lines no wider than `max_px`. A single word that is
/// too wide on its own is ellipsized rather than split mid-word.
pub fn wrap_lines(text: &str, font_px: f64, max_px: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, font_px) <= max_px {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width(word, font_px) <= max_px {
            current = word.to_string();
        } else {
            lines.push(ellipsize(word, font_px, max_px));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
