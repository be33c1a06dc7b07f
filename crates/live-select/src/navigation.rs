//! Client-side keyboard navigation over the rendered options.
//!
//! Only used when the widget runs with [`KeyboardMode::Hook`]; in server mode
//! key presses are forwarded and the remote owner moves the highlight.
//!
//! The highlight lives in the markup: the active option is the one carrying
//! every configured highlight class. [`NavState`] tracks its position among
//! the options so moves do not depend on the remote owner echoing the
//! classes back.
//!
//! [`KeyboardMode::Hook`]: crate::config::KeyboardMode::Hook

use crate::accessor;
use crate::dom::{Document, NodeId};

/// Navigation keys recognised in hook mode, by their logical key value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavKey {
    /// `ArrowDown`
    Down,
    /// `ArrowUp`
    Up,
    /// `Enter`
    Enter,
    /// `Escape`
    Escape,
}

impl NavKey {
    /// Map a logical key value to a navigation key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowDown" => Some(Self::Down),
            "ArrowUp" => Some(Self::Up),
            "Enter" => Some(Self::Enter),
            "Escape" => Some(Self::Escape),
            _ => None,
        }
    }
}

/// Direction of a highlight move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    /// Towards the end of the list, wrapping to the first option.
    Next,
    /// Towards the start of the list, wrapping to the last option.
    Previous,
}

/// Position of the highlight among the rendered options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NavState {
    /// No option is highlighted.
    #[default]
    Idle,
    /// The option at this position is highlighted.
    Highlighted(usize),
}

impl NavState {
    /// The state after moving over `count` options.
    ///
    /// With no options the state is unchanged.
    pub fn step(self, mv: Move, count: usize) -> Self {
        if count == 0 {
            return self;
        }
        let last = count - 1;
        let position = match (mv, self) {
            (Move::Next, Self::Highlighted(i)) if i < last => i + 1,
            (Move::Next, _) => 0,
            (Move::Previous, Self::Highlighted(i)) if i > 0 => (i - 1).min(last),
            (Move::Previous, _) => last,
        };
        Self::Highlighted(position)
    }

    /// The highlighted position, if any.
    pub fn position(self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Highlighted(i) => Some(i),
        }
    }
}

/// The option highlighted by a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    /// Position among the rendered options.
    pub position: usize,
    /// The option element.
    pub node: NodeId,
    /// The option's `data-idx`, exactly as written in the markup.
    pub index: Option<String>,
}

/// Whether `node` carries every class in `classes`. An empty set never
/// matches.
fn is_highlighted(doc: &Document, node: NodeId, classes: &[String]) -> bool {
    !classes.is_empty() && classes.iter().all(|class| doc.has_class(node, class))
}

/// Recover the navigation state from the markup.
///
/// When several options carry the highlight classes the last one wins.
pub fn recover(doc: &Document, root: NodeId, classes: &[String]) -> NavState {
    accessor::options(doc, root)
        .iter()
        .rposition(|&node| is_highlighted(doc, node, classes))
        .map_or(NavState::Idle, NavState::Highlighted)
}

/// Recover the active option's `data-idx` from the markup.
pub fn recover_active_index(doc: &Document, root: NodeId, classes: &[String]) -> Option<String> {
    let options = accessor::options(doc, root);
    let position = recover(doc, root, classes).position()?;
    data_index(doc, options[position])
}

fn data_index(doc: &Document, node: NodeId) -> Option<String> {
    doc.attribute(node, "data-idx").map(str::to_string)
}

/// Move the highlight from `state` and update the markup.
///
/// Strips the highlight classes from every option, applies them to the new
/// active option and scrolls it into view. Returns `None` when there is no
/// dropdown or it has no options.
pub fn move_focus(
    doc: &mut Document,
    root: NodeId,
    classes: &[String],
    state: NavState,
    mv: Move,
) -> Option<Highlight> {
    let options = accessor::options(doc, root);
    let position = state.step(mv, options.len()).position()?;
    let node = options[position];

    for &option in &options {
        for class in classes {
            doc.remove_class(option, class);
        }
    }
    for class in classes {
        doc.add_class(node, class);
    }
    doc.scroll_into_view(node);

    let index = data_index(doc, node);
    tracing::trace!(target: "live_select::navigation", ?mv, position, index = ?index, "moved highlight");
    Some(Highlight {
        position,
        node,
        index,
    })
}
