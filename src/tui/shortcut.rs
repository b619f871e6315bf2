use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};

use crate::model::config::ShortcutConfig;

/// Overlay-level actions reachable by a configurable hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ToggleVisibility,
    PeekVisibility,
    ExitApplication,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShortcutError {
    #[error("empty shortcut")]
    Empty,
    #[error("unknown key '{0}'")]
    UnknownKey(String),
    #[error("shortcut '{0}' has no key, only modifiers")]
    MissingKey(String),
    #[error("shortcut '{0}' names more than one key")]
    MultipleKeys(String),
}

const MODIFIER_MASK: KeyModifiers = KeyModifiers::CONTROL
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::SHIFT)
    .union(KeyModifiers::SUPER);

/// A parsed hotkey such as `ctrl+shift+x`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub modifiers: KeyModifiers,
    pub code: KeyCode,
}

impl KeyBinding {
    /// Whether a terminal key event is this binding. Letters compare
    /// case-insensitively; an uppercase letter implies shift.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        let mut modifiers = key.modifiers & MODIFIER_MASK;
        let code = match key.code {
            KeyCode::Char(c) => {
                if c.is_uppercase() {
                    modifiers |= KeyModifiers::SHIFT;
                }
                KeyCode::Char(c.to_lowercase().next().unwrap_or(c))
            }
            KeyCode::BackTab => {
                modifiers |= KeyModifiers::SHIFT;
                KeyCode::Tab
            }
            other => other,
        };
        modifiers == self.modifiers && code == self.code
    }
}

impl FromStr for KeyBinding {
    type Err = ShortcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ShortcutError::Empty);
        }
        let mut modifiers = KeyModifiers::NONE;
        let mut code = None;
        for part in s.split('+') {
            let part = part.trim().to_lowercase();
            match part.as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" | "option" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                "cmd" | "super" | "win" => modifiers |= KeyModifiers::SUPER,
                key => {
                    if code.is_some() {
                        return Err(ShortcutError::MultipleKeys(s.to_string()));
                    }
                    code = Some(parse_key(key)?);
                }
            }
        }
        let code = code.ok_or_else(|| ShortcutError::MissingKey(s.to_string()))?;
        Ok(KeyBinding { modifiers, code })
    }
}

fn parse_key(key: &str) -> Result<KeyCode, ShortcutError> {
    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }
    let code = match key {
        "space" => KeyCode::Char(' '),
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        _ => match key.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            Some(n @ 1..=24) => KeyCode::F(n),
            _ => return Err(ShortcutError::UnknownKey(key.to_string())),
        },
    };
    Ok(code)
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, name) in [
            (KeyModifiers::CONTROL, "ctrl"),
            (KeyModifiers::ALT, "alt"),
            (KeyModifiers::SHIFT, "shift"),
            (KeyModifiers::SUPER, "super"),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "{}+", name)?;
            }
        }
        match self.code {
            KeyCode::Char(' ') => write!(f, "space"),
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::F(n) => write!(f, "f{}", n),
            KeyCode::Enter => write!(f, "enter"),
            KeyCode::Esc => write!(f, "esc"),
            KeyCode::Tab => write!(f, "tab"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// The configured hotkeys. Invalid or disabled bindings are absent.
#[derive(Debug, Clone, Default)]
pub struct ShortcutMap {
    bindings: Vec<(KeyBinding, Action)>,
}

impl ShortcutMap {
    pub fn from_config(config: &ShortcutConfig) -> Self {
        let mut bindings = Vec::new();
        for (action, keys) in [
            (Action::ToggleVisibility, &config.toggle_visibility),
            (Action::PeekVisibility, &config.peek_visibility),
            (Action::ExitApplication, &config.exit_application),
        ] {
            let Some(keys) = keys else {
                debug!(?action, "shortcut disabled");
                continue;
            };
            match keys.parse::<KeyBinding>() {
                Ok(binding) => bindings.push((binding, action)),
                Err(e) => warn!(?action, shortcut = %keys, error = %e, "ignoring invalid shortcut"),
            }
        }
        ShortcutMap { bindings }
    }

    pub fn action_for(&self, key: &KeyEvent) -> Option<Action> {
        self.bindings
            .iter()
            .find(|(binding, _)| binding.matches(key))
            .map(|(_, action)| *action)
    }

    pub fn binding_for(&self, action: Action) -> Option<&KeyBinding> {
        self.bindings
            .iter()
            .find(|(_, a)| *a == action)
            .map(|(binding, _)| binding)
    }
}
