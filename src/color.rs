use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Fixed series colours
// ---------------------------------------------------------------------------

/// Raw monthly victim counts in the time-series chart.
pub const VICTIMS_COLOR: Color32 = Color32::from_rgb(0x4f, 0x8f, 0xd0);
/// Trailing 12-month moving average line.
pub const MM12_COLOR: Color32 = Color32::from_rgb(0xe0, 0x7a, 0x3f);
/// Points of the geographic scatter.
pub const MAP_COLOR: Color32 = Color32::from_rgb(0xd0, 0x4f, 0x4f);

// ---------------------------------------------------------------------------
// Category → colour mapping for the ranking bar charts
// ---------------------------------------------------------------------------

/// Maps category labels (province names, vehicle types) to distinct colours,
/// stable for the lifetime of one views computation.
#[derive(Debug, Clone)]
pub struct CategoryColors {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl CategoryColors {
    /// Build a colour per label, in the order given (ranking order).
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let labels: Vec<&str> = labels.into_iter().collect();
        let palette = generate_palette(labels.len());
        let mapping: BTreeMap<String, Color32> = labels
            .into_iter()
            .zip(palette)
            .map(|(label, color)| (label.to_string(), color))
            .collect();

        CategoryColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a label.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_distinct_and_sized() {
        let palette = generate_palette(12);
        assert_eq!(palette.len(), 12);
        let unique: std::collections::HashSet<_> =
            palette.iter().map(|c| c.to_array()).collect();
        assert_eq!(unique.len(), 12);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn unknown_labels_fall_back_to_gray() {
        let colors = CategoryColors::new(["Córdoba", "Chaco"]);
        assert_ne!(colors.color_for("Córdoba"), colors.color_for("Chaco"));
        assert_eq!(colors.color_for("Neuquén"), Color32::GRAY);
    }
}
