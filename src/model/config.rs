use serde::{Deserialize, Serialize};

/// Configuration from config.json. Every section and field has a default,
/// so a partial (or empty) document is valid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub appearance: AppearanceConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub shortcuts: ShortcutConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub parser: ParserConfig,
}

/// Panel colors as `#RRGGBB` strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    pub background_color: String,
    pub text_color: String,
    pub accent_color: String,
    pub dim_color: String,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        AppearanceConfig {
            background_color: "#2E2E2E".into(),
            text_color: "#FFFFFF".into(),
            accent_color: "#5090D0".into(),
            dim_color: "#707070".into(),
        }
    }
}

/// Which corner of the terminal the panel is pinned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Panel width in terminal columns
    pub width: u16,
    pub anchor: Anchor,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: 48,
            anchor: Anchor::TopRight,
        }
    }
}

/// Hotkey strings like `ctrl+shift+x`. `null` disables a binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutConfig {
    pub toggle_visibility: Option<String>,
    pub peek_visibility: Option<String>,
    pub peek_duration_seconds: f64,
    pub exit_application: Option<String>,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        ShortcutConfig {
            toggle_visibility: Some("ctrl+shift+x".into()),
            peek_visibility: Some("ctrl+alt+x".into()),
            peek_duration_seconds: 3.0,
            exit_application: Some("ctrl+shift+q".into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Shrink the panel to fit its rows instead of spanning the terminal
    pub auto_shrink_to_fit_tasks: bool,
    /// Lower bound on panel height (rows) while shrunk
    pub min_height_one_task: u16,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            auto_shrink_to_fit_tasks: true,
            min_height_one_task: 3,
        }
    }
}

/// How a pasted line is split into steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmenterKind {
    /// Unicode sentence boundaries; multi-sentence lines become steps
    #[default]
    Sentence,
    /// Never split; every line is a directly-checkable task
    Line,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub segmenter: SegmenterKind,
}
