use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Risk colours
// ---------------------------------------------------------------------------

fn to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

/// Green at probability 0 through amber to red at 1. Out-of-range and NaN
/// inputs are clamped.
pub fn risk_color(probability: f64) -> Color32 {
    let p = if probability.is_nan() { 0.0 } else { probability.clamp(0.0, 1.0) };
    let hue = 120.0 * (1.0 - p as f32);
    to_color32(Hsl::new(hue, 0.70, 0.45))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_color_endpoints() {
        let low = risk_color(0.0);
        let high = risk_color(1.0);
        assert!(low.g() > low.r());
        assert!(high.r() > high.g());
        assert_eq!(risk_color(7.0), high);
        assert_eq!(risk_color(f64::NAN), low);
    }
}
