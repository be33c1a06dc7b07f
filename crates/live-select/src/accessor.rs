//! Lookups of the widget's sub-elements.
//!
//! Every lookup is scoped to the widget root and runs against the current
//! document; results are never cached because the remote owner may replace
//! any part of the markup between two calls.

use crate::dom::{Document, NodeId, Selector};
use crate::protocol::SelectionMode;

/// `input[type=text]`
pub fn text_input_selector() -> Selector {
    Selector::tag("input").attr_eq("type", "text")
}

/// `div[data-idx]`
pub fn option_selector() -> Selector {
    Selector::tag("div").attr("data-idx")
}

/// `button[data-idx]`
pub fn remove_button_selector() -> Selector {
    Selector::tag("button").attr("data-idx")
}

/// The text field the user types into.
pub fn text_input(doc: &Document, root: NodeId) -> Option<NodeId> {
    doc.query_selector(root, &text_input_selector())
}

/// The dropdown list, present only while options are rendered.
pub fn dropdown(doc: &Document, root: NodeId) -> Option<NodeId> {
    doc.query_selector(root, &Selector::tag("ul"))
}

/// The option elements inside the dropdown, in document order.
///
/// Empty when there is no dropdown.
pub fn options(doc: &Document, root: NodeId) -> Vec<NodeId> {
    dropdown(doc, root)
        .map(|ul| doc.query_selector_all(ul, &option_selector()))
        .unwrap_or_default()
}

/// The option whose `data-idx` equals `idx`.
pub fn option_by_idx(doc: &Document, root: NodeId, idx: &str) -> Option<NodeId> {
    doc.query_selector(root, &Selector::tag("div").attr_eq("data-idx", idx))
}

/// The option element containing `target`, if any.
pub fn option_for_target(doc: &Document, target: NodeId) -> Option<NodeId> {
    doc.closest(target, &option_selector())
}

/// The clear button, `button[phx-click=clear]`.
pub fn clear_button(doc: &Document, root: NodeId) -> Option<NodeId> {
    doc.query_selector(root, &Selector::tag("button").attr_eq("phx-click", "clear"))
}

/// Buttons that remove a selected option.
pub fn remove_buttons(doc: &Document, root: NodeId) -> Vec<NodeId> {
    doc.query_selector_all(root, &remove_button_selector())
}

/// The element that receives the synthetic `input` event after a selection
/// is applied.
pub fn synthetic_input_target(
    doc: &Document,
    root: NodeId,
    mode: SelectionMode,
    selection_empty: bool,
) -> Option<NodeId> {
    let selector = match mode {
        SelectionMode::Single => Selector::tag("input").class("single-mode"),
        SelectionMode::Multiple if selection_empty => {
            Selector::tag("input").attr("data-live-select-empty")
        }
        SelectionMode::Multiple => Selector::tag("input").attr_eq("type", "hidden"),
    };
    doc.query_selector(root, &selector)
}

/// Position the clear button over the right edge of the text field.
///
/// Returns `false` when either element is missing.
pub fn style_clear_button(doc: &mut Document, root: NodeId) -> bool {
    let Some(button) = clear_button(doc, root) else {
        return false;
    };
    let Some(container) = text_input(doc, root).and_then(|input| doc.parent(input)) else {
        return false;
    };

    doc.set_style(container, "position", "relative");
    for (property, value) in [
        ("position", "absolute"),
        ("top", "0px"),
        ("bottom", "0px"),
        ("right", "5px"),
        ("display", "block"),
    ] {
        doc.set_style(button, property, value);
    }
    true
}
