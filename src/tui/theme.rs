use ratatui::style::Color;
use tracing::warn;

use crate::model::config::AppearanceConfig;
use crate::model::task::Progress;

/// Parsed panel colors
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub accent: Color,
    pub dim: Color,
    pub selection_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::from_config(&AppearanceConfig::default())
    }
}

/// Parse a hex color string like "#2E2E2E" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

fn color_or(name: &str, value: &str, fallback: Color) -> Color {
    parse_hex_color(value).unwrap_or_else(|| {
        warn!(color = name, value, "invalid color, using default");
        fallback
    })
}

/// Halfway between two colors; used for the selected row background
fn blend(a: Color, b: Color) -> Color {
    match (a, b) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => Color::Rgb(
            ((r1 as u16 + r2 as u16) / 2) as u8,
            ((g1 as u16 + g2 as u16) / 2) as u8,
            ((b1 as u16 + b2 as u16) / 2) as u8,
        ),
        _ => a,
    }
}

impl Theme {
    /// Build from the appearance section; unparseable colors keep defaults
    pub fn from_config(appearance: &AppearanceConfig) -> Self {
        let background = color_or(
            "background_color",
            &appearance.background_color,
            Color::Rgb(0x2E, 0x2E, 0x2E),
        );
        let text = color_or("text_color", &appearance.text_color, Color::Rgb(0xFF, 0xFF, 0xFF));
        let accent = color_or(
            "accent_color",
            &appearance.accent_color,
            Color::Rgb(0x50, 0x90, 0xD0),
        );
        let dim = color_or("dim_color", &appearance.dim_color, Color::Rgb(0x70, 0x70, 0x70));
        Theme {
            background,
            text,
            accent,
            dim,
            selection_bg: blend(background, accent),
        }
    }

    /// Checkbox color for a row
    pub fn progress_color(&self, progress: Progress) -> Color {
        match progress {
            Progress::Unchecked => self.text,
            Progress::Partial => self.accent,
            Progress::Checked => self.dim,
        }
    }
}
