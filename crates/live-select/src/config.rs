//! Widget configuration read from attributes on the widget root.
//!
//! | attribute | field |
//! |---|---|
//! | `data-debounce` | [`WidgetConfig::debounce`] (milliseconds) |
//! | `data-update-min-len` | [`WidgetConfig::update_min_len`] |
//! | `data-keyboard` | [`WidgetConfig::keyboard_mode`] (`server` or `hook`) |
//! | `data-active-option-classes` | [`WidgetConfig::active_option_classes`] |
//! | `data-phx-target` | [`WidgetConfig::target`] |
//! | `data-field` | [`WidgetConfig::field`] |
//! | `data-mode` | [`WidgetConfig::selection_mode`] |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::dom::Element;
use crate::protocol::SelectionMode;

/// Default quiet period before a text change is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Default minimum query length before a text change is sent.
pub const DEFAULT_UPDATE_MIN_LEN: usize = 1;

/// Attribute names.
pub mod attributes {
    /// Debounce quiet period in milliseconds.
    pub const DEBOUNCE: &str = "data-debounce";
    /// Minimum query length.
    pub const UPDATE_MIN_LEN: &str = "data-update-min-len";
    /// Keyboard navigation mode.
    pub const KEYBOARD: &str = "data-keyboard";
    /// Space-separated highlight classes.
    pub const ACTIVE_OPTION_CLASSES: &str = "data-active-option-classes";
    /// Delegation target.
    pub const TARGET: &str = "data-phx-target";
    /// Form field name.
    pub const FIELD: &str = "data-field";
    /// Selection mode marker.
    pub const MODE: &str = "data-mode";
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A numeric attribute is not a non-negative integer.
    #[error("Invalid value for '{attribute}': expected a non-negative integer, got '{value}'")]
    InvalidNumber { attribute: String, value: String },

    /// Unknown keyboard mode.
    #[error("Invalid keyboard mode '{0}': expected 'server' or 'hook'")]
    InvalidKeyboardMode(String),
}

/// Who computes the highlighted option during keyboard navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KeyboardMode {
    /// Key presses are forwarded; the remote owner moves the highlight.
    #[default]
    Server,
    /// The highlight is moved locally by the navigation state machine.
    Hook,
}

impl KeyboardMode {
    /// The attribute value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Hook => "hook",
        }
    }
}

impl FromStr for KeyboardMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server" => Ok(Self::Server),
            "hook" => Ok(Self::Hook),
            other => Err(ConfigError::InvalidKeyboardMode(other.to_string())),
        }
    }
}

impl fmt::Display for KeyboardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-widget configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    /// Quiet period before a text change is sent.
    pub debounce: Duration,
    /// Minimum trimmed text length (in characters) before a change is sent.
    pub update_min_len: usize,
    /// Keyboard navigation mode.
    pub keyboard_mode: KeyboardMode,
    /// Classes that mark the highlighted option, without duplicates.
    pub active_option_classes: Vec<String>,
    /// Delegation target for parent-facing events.
    pub target: Option<String>,
    /// Form field name reported in `live_select_change`.
    pub field: Option<String>,
    /// Selection mode declared in markup, if any.
    pub selection_mode: Option<SelectionMode>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            update_min_len: DEFAULT_UPDATE_MIN_LEN,
            keyboard_mode: KeyboardMode::default(),
            active_option_classes: Vec::new(),
            target: None,
            field: None,
            selection_mode: None,
        }
    }
}

impl WidgetConfig {
    /// Read the configuration, rejecting invalid attributes.
    ///
    /// Missing attributes take their defaults.
    pub fn try_from_element(element: &Element) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            debounce: match element.attribute(attributes::DEBOUNCE) {
                Some(raw) => Duration::from_millis(parse_number(attributes::DEBOUNCE, raw)?),
                None => defaults.debounce,
            },
            update_min_len: match element.attribute(attributes::UPDATE_MIN_LEN) {
                Some(raw) => parse_number(attributes::UPDATE_MIN_LEN, raw)? as usize,
                None => defaults.update_min_len,
            },
            keyboard_mode: match element.attribute(attributes::KEYBOARD) {
                Some(raw) if !raw.is_empty() => raw.parse()?,
                _ => defaults.keyboard_mode,
            },
            ..Self::read_lenient_fields(element)
        })
    }

    /// Read the configuration, replacing invalid attributes with defaults.
    ///
    /// Every replaced attribute is reported at `warn` level.
    pub fn from_element(element: &Element) -> Self {
        let defaults = Self::default();
        let debounce = element
            .attribute(attributes::DEBOUNCE)
            .and_then(|raw| lenient(parse_number(attributes::DEBOUNCE, raw)))
            .map(Duration::from_millis)
            .unwrap_or(defaults.debounce);
        let update_min_len = element
            .attribute(attributes::UPDATE_MIN_LEN)
            .and_then(|raw| lenient(parse_number(attributes::UPDATE_MIN_LEN, raw)))
            .map(|n| n as usize)
            .unwrap_or(defaults.update_min_len);
        let keyboard_mode = element
            .attribute(attributes::KEYBOARD)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| lenient(raw.parse()))
            .unwrap_or(defaults.keyboard_mode);

        Self {
            debounce,
            update_min_len,
            keyboard_mode,
            ..Self::read_lenient_fields(element)
        }
    }

    /// Fields that cannot be invalid.
    fn read_lenient_fields(element: &Element) -> Self {
        let non_empty = |name: &str| {
            element
                .attribute(name)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Self {
            active_option_classes: element
                .attribute(attributes::ACTIVE_OPTION_CLASSES)
                .map(parse_class_list)
                .unwrap_or_default(),
            target: non_empty(attributes::TARGET),
            field: non_empty(attributes::FIELD),
            selection_mode: non_empty(attributes::MODE).map(SelectionMode::from),
            ..Self::default()
        }
    }
}

/// Parse a non-negative integer attribute.
fn parse_number(attribute: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber {
            attribute: attribute.to_string(),
            value: raw.to_string(),
        })
}

fn lenient<T>(result: Result<T, ConfigError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(target: "live_select::config", %err, "falling back to default");
            None
        }
    }
}

/// Split a space-separated class list, dropping blanks and duplicates.
pub fn parse_class_list(raw: &str) -> Vec<String> {
    let mut classes: Vec<String> = Vec::new();
    for class in raw.split_whitespace() {
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }
    classes
}
