//! Event names and payloads exchanged with the remote owner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event names on the channel.
pub mod events {
    /// Debounced text change, to the widget's counterpart.
    pub const CHANGE: &str = "change";
    /// Debounced text change, to the delegation target.
    pub const LIVE_SELECT_CHANGE: &str = "live_select_change";
    /// Input dropped below the minimum length.
    pub const OPTIONS_CLEAR: &str = "options_clear";
    /// An option was picked.
    pub const OPTION_CLICK: &str = "option_click";
    /// A selected option was removed.
    pub const OPTION_REMOVE: &str = "option_remove";
    /// A raw key press forwarded to the remote owner.
    pub const KEYDOWN: &str = "keydown";
    /// Full selection re-sent after a reconnect.
    pub const SELECTION_RECOVERY: &str = "selection_recovery";

    /// Pushed: apply a selection.
    pub const SELECT: &str = "select";
    /// Pushed: reveal the active option.
    pub const ACTIVE: &str = "active";
    /// Pushed: relay an event to the delegation target.
    pub const PARENT_EVENT: &str = "parent_event";
}

/// How many options a widget can hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SelectionMode {
    /// At most one selected option; its label is shown in the text field.
    #[default]
    Single,
    /// Any number of selected options (`tags`, `quick_tags`); the text field
    /// holds free text only.
    Multiple,
}

impl SelectionMode {
    /// The wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "tags",
        }
    }
}

impl From<&str> for SelectionMode {
    fn from(value: &str) -> Self {
        if value == "single" {
            Self::Single
        } else {
            Self::Multiple
        }
    }
}

impl From<String> for SelectionMode {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<SelectionMode> for String {
    fn from(mode: SelectionMode) -> Self {
        mode.as_str().to_string()
    }
}

impl FromStr for SelectionMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selected option, as pushed by the remote owner.
///
/// Fields other than `label` and `value` are kept so the record can be sent
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionItem {
    /// Display label.
    pub label: String,
    /// Submitted value.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SelectionItem {
    /// Create an item with a label and value.
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            extra: Map::new(),
        }
    }
}

/// An option index as sent over the wire: either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionIndex {
    /// Numeric form.
    Number(u64),
    /// String form, as read from a `data-idx` attribute.
    Text(String),
}

impl fmt::Display for OptionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Payload of a pushed `select` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectPayload {
    /// Target widget id.
    pub id: String,
    /// The authoritative selection.
    #[serde(default)]
    pub selection: Vec<SelectionItem>,
    /// The selection mode; falls back to the widget's configured mode.
    #[serde(default)]
    pub mode: Option<SelectionMode>,
    /// The free text the remote owner wants in the text field.
    #[serde(default)]
    pub current_text: Option<String>,
    /// Dispatch a synthetic `input` event after applying.
    #[serde(default)]
    pub input_event: Option<bool>,
    /// Event to emit to the delegation target after applying.
    #[serde(default)]
    pub parent_event: Option<String>,
}

/// Payload of a pushed `active` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivePayload {
    /// Target widget id.
    pub id: String,
    /// Index of the option to reveal.
    pub idx: OptionIndex,
}

/// Payload of a pushed `parent_event` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParentEventPayload {
    /// Target widget id.
    pub id: String,
    /// Event name to relay.
    pub event: String,
    /// Payload to relay.
    #[serde(default)]
    pub payload: Value,
}
