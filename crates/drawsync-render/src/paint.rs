//! Translation from stroke styles to tiny-skia paint settings.

use drawsync_core::StrokeStyle;
use peniko::Color;
use peniko::color::Srgb;
use tiny_skia::{LineCap, Paint, Stroke, StrokeDash};

/// Parse a CSS color string (`black`, `#2B353E`, `rgba(255, 255, 255, 0.5)`).
/// Unparseable strings fall back to opaque black.
pub fn parse_color(value: &str) -> Color {
    match peniko::color::parse_color(value.trim()) {
        Ok(color) => color.to_alpha_color::<Srgb>(),
        Err(e) => {
            log::debug!("Unparseable color '{}' ({:?}), using black", value, e);
            Color::BLACK
        }
    }
}

/// Solid paint for a style. Effective alpha is the color's alpha times the
/// style's opacity.
pub fn stroke_paint(style: &StrokeStyle) -> Paint<'static> {
    let rgba = parse_color(&style.color).to_rgba8();
    let alpha = (f64::from(rgba.a) * style.opacity.clamp(0.0, 1.0)).round() as u8;

    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, alpha);
    paint.anti_alias = true;
    paint
}

/// Stroke geometry for a style: width, butt caps and the dash pattern.
pub fn stroke_style(style: &StrokeStyle) -> Stroke {
    let pattern = style.dash.pattern();
    let dash = if pattern.is_empty() {
        None
    } else {
        StrokeDash::new(pattern.to_vec(), 0.0)
    };

    Stroke {
        width: style.line_width as f32,
        line_cap: LineCap::Butt,
        dash,
        ..Stroke::default()
    }
}
