//! In-memory element tree shared by the host and the controller.
//!
//! The host mirrors the widget markup into a [`Document`] and replaces
//! subtrees whenever the remote owner re-renders. Node ids of removed elements
//! become invalid, so stale references can always be detected with
//! [`Document::contains`] or [`Document::is_connected`].
//!
//! Visual side effects the controller requests but cannot perform itself
//! (scrolling, synthetic event dispatch) are recorded as [`DomEffect`]s for
//! the host to drain with [`Document::take_effects`].
//!
//! # Example
//!
//! ```
//! use live_select::dom::{Document, NodeSpec, Selector};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let root = doc.mount(
//!     body,
//!     NodeSpec::new("div")
//!         .id("city")
//!         .child(NodeSpec::new("input").attr("type", "text")),
//! );
//!
//! let input = doc.query_selector(root, &Selector::tag("input").attr_eq("type", "text"));
//! assert!(input.is_some());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A unique identifier for an element in a [`Document`].
    pub struct NodeId;
}

/// A document shared between the host and any attached controllers.
pub type SharedDocument = Arc<Mutex<Document>>;

/// A single element.
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    value: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    /// The lowercase tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The value of an attribute, if present.
    ///
    /// Classes are kept separately, see [`classes`](Self::classes).
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// A `data-*` attribute by its suffix, e.g. `data("idx")` for `data-idx`.
    pub fn data(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(&format!("data-{key}"))
            .map(String::as_str)
    }

    /// The element's classes, in insertion order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Whether the element carries `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// An inline style property.
    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    /// The current form value (only meaningful for inputs).
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The parent element.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The child elements, in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        if name == "class" {
            self.classes.clear();
            for class in value.split_whitespace() {
                self.add_class(class);
            }
        } else {
            self.attributes.insert(name.to_string(), value.to_string());
        }
    }
}

/// An attribute condition inside a [`Selector`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeMatch {
    name: String,
    value: Option<String>,
}

/// A compound selector: optional tag, classes and attribute conditions.
///
/// Covers the subset of CSS the controller needs (`input[type=text]`,
/// `div[data-idx]`, `input.single-mode`, ...) without string parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

impl Selector {
    /// Match elements with the given tag.
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into().to_ascii_lowercase()),
            ..Default::default()
        }
    }

    /// Additionally require a class.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Additionally require an attribute to be present.
    pub fn attr(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(AttributeMatch {
            name: name.into(),
            value: None,
        });
        self
    }

    /// Additionally require an attribute to have an exact value.
    pub fn attr_eq(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(AttributeMatch {
            name: name.into(),
            value: Some(value.into()),
        });
        self
    }

    /// Whether `element` satisfies every condition.
    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag
            && tag != &element.tag
        {
            return false;
        }
        self.classes.iter().all(|class| element.has_class(class))
            && self.attributes.iter().all(|cond| {
                match (element.attribute(&cond.name), &cond.value) {
                    (None, _) => false,
                    (Some(_), None) => true,
                    (Some(actual), Some(expected)) => actual == expected,
                }
            })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{tag}")?,
            None if self.classes.is_empty() && self.attributes.is_empty() => write!(f, "*")?,
            None => {}
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for cond in &self.attributes {
            match &cond.value {
                Some(value) => write!(f, "[{}=\"{}\"]", cond.name, value)?,
                None => write!(f, "[{}]", cond.name)?,
            }
        }
        Ok(())
    }
}

/// A side effect requested on the document that only the host can perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEffect {
    /// Scroll the element into the nearest visible position of its scroll
    /// container.
    ScrollIntoView {
        /// The element to reveal.
        node: NodeId,
    },
    /// Dispatch a synthetic event on the element.
    Dispatch {
        /// The event target.
        node: NodeId,
        /// The event type, e.g. `input`.
        event: String,
        /// Whether the event bubbles.
        bubbles: bool,
    },
}

/// A DOM event delivered by the host to an attached controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
    /// A key was pressed.
    KeyDown {
        /// The logical key value, e.g. `ArrowDown`.
        key: String,
        /// The physical key code, e.g. `ArrowDown` or `KeyA`.
        code: String,
    },
    /// The value of a text field changed; the new value is read from the
    /// target element.
    Input,
    /// A pointer button went down.
    MouseDown,
    /// The element was clicked.
    Click,
}

impl DomEvent {
    /// A key press whose key and code share a name (navigation keys, Enter,
    /// Escape).
    pub fn key(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::KeyDown {
            key: name.clone(),
            code: name,
        }
    }
}

/// What a listener did with a dispatched [`DomEvent`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOutcome {
    /// A listener ran for this event.
    pub handled: bool,
    /// The browser default action must be suppressed.
    pub default_prevented: bool,
    /// The event must not propagate further.
    pub propagation_stopped: bool,
}

impl EventOutcome {
    /// No listener ran.
    pub fn ignored() -> Self {
        Self::default()
    }

    /// A listener ran and left the default action alone.
    pub fn handled() -> Self {
        Self {
            handled: true,
            ..Self::default()
        }
    }

    /// A listener ran and prevented the default action.
    pub fn prevented() -> Self {
        Self {
            handled: true,
            default_prevented: true,
            propagation_stopped: false,
        }
    }

    /// A listener ran, prevented the default action and stopped propagation.
    pub fn consumed() -> Self {
        Self {
            handled: true,
            default_prevented: true,
            propagation_stopped: true,
        }
    }
}

/// Declarative description of an element subtree, for mounting markup.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    tag: String,
    attributes: Vec<(String, String)>,
    value: String,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Describe an element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set the `id` attribute.
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Set an attribute. `class` is split into individual classes.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Set a `data-*` attribute.
    pub fn data(self, key: &str, value: impl Into<String>) -> Self {
        self.attr(format!("data-{key}"), value)
    }

    /// Add classes (space separated).
    pub fn class(self, classes: impl Into<String>) -> Self {
        self.attr("class", classes)
    }

    /// Set the form value.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Append a child.
    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children.
    pub fn children(mut self, children: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.children.extend(children);
        self
    }
}

/// An arena of elements rooted at a `body` element.
#[derive(Debug)]
pub struct Document {
    nodes: SlotMap<NodeId, Element>,
    body: NodeId,
    effects: Vec<DomEffect>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with a `body` element.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let body = nodes.insert(Element::new("body"));
        Self {
            nodes,
            body,
            effects: Vec::new(),
        }
    }

    /// Wrap the document for sharing with controllers.
    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    /// The `body` element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Look up an element.
    pub fn get(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node)
    }

    /// Whether the node still exists (it may be detached).
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    /// Whether the node exists and is reachable from `body`.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.nodes.get(id).and_then(|el| el.parent);
        }
        false
    }

    /// Move `child` to the end of `parent`'s children.
    ///
    /// Returns `false` if either node is missing or the move would create a
    /// cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.contains(parent) || !self.contains(child) || self.is_inclusive_ancestor(child, parent)
        {
            return false;
        }
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        true
    }

    /// Build `spec` and append it to `parent`. Returns the new subtree root.
    pub fn mount(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
        let node = self.build(spec);
        self.append_child(parent, node);
        node
    }

    fn build(&mut self, spec: NodeSpec) -> NodeId {
        let mut element = Element::new(spec.tag);
        for (name, value) in &spec.attributes {
            if name == "class" {
                for class in value.split_whitespace() {
                    element.add_class(class);
                }
            } else {
                element.set_attribute(name, value);
            }
        }
        element.value = spec.value;
        let node = self.nodes.insert(element);
        for child in spec.children {
            let child = self.build(child);
            self.append_child(node, child);
        }
        node
    }

    /// Remove `node` and its whole subtree. Their ids become invalid.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.body {
            return;
        }
        self.detach(node);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(element) = self.nodes.remove(id) {
                stack.extend(element.children);
            }
        }
    }

    /// Replace every child of `parent` with freshly built `specs`, the way a
    /// re-render replaces markup. Returns the ids of the new children.
    pub fn replace_children(
        &mut self,
        parent: NodeId,
        specs: impl IntoIterator<Item = NodeSpec>,
    ) -> Vec<NodeId> {
        let Some(element) = self.nodes.get(parent) else {
            return Vec::new();
        };
        for child in element.children.clone() {
            self.remove(child);
        }
        specs
            .into_iter()
            .map(|spec| self.mount(parent, spec))
            .collect()
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes.get_mut(node).and_then(|el| el.parent.take())
            && let Some(parent) = self.nodes.get_mut(parent)
        {
            parent.children.retain(|&c| c != node);
        }
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|el| el.parent);
        }
        false
    }

    /// The value of an attribute.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get(node).and_then(|el| el.attribute(name))
    }

    /// Set an attribute. `class` replaces the class list.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.nodes.get_mut(node) {
            element.set_attribute(name, value);
        }
    }

    /// Whether the element carries `class`.
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get(node).is_some_and(|el| el.has_class(class))
    }

    /// Add a class if not present.
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.nodes.get_mut(node) {
            element.add_class(class);
        }
    }

    /// Remove a class if present.
    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.nodes.get_mut(node) {
            element.classes.retain(|c| c != class);
        }
    }

    /// An inline style property.
    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.get(node).and_then(|el| el.style(property))
    }

    /// Set an inline style property.
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(element) = self.nodes.get_mut(node) {
            element.style.insert(property.to_string(), value.to_string());
        }
    }

    /// The form value of the element.
    pub fn value(&self, node: NodeId) -> Option<&str> {
        self.get(node).map(Element::value)
    }

    /// Set the form value of the element.
    pub fn set_value(&mut self, node: NodeId, value: impl Into<String>) {
        if let Some(element) = self.nodes.get_mut(node) {
            element.value = value.into();
        }
    }

    /// The parent element.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(Element::parent)
    }

    /// Whether the element matches `selector`.
    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        self.get(node).is_some_and(|el| selector.matches(el))
    }

    /// The nearest inclusive ancestor matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            let element = self.nodes.get(id)?;
            if selector.matches(element) {
                return Some(id);
            }
            current = element.parent;
        }
        None
    }

    /// The first descendant of `root` (excluding `root`) matching `selector`,
    /// in document order.
    pub fn query_selector(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(root)
            .find(|&id| self.matches(id, selector))
    }

    /// Every descendant of `root` (excluding `root`) matching `selector`, in
    /// document order.
    pub fn query_selector_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|&id| self.matches(id, selector))
            .collect()
    }

    /// Descendants of `root` in document (pre-)order.
    pub fn descendants(&self, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self
            .get(root)
            .map(|el| el.children.iter().rev().copied().collect())
            .unwrap_or_default();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            if let Some(element) = self.nodes.get(id) {
                stack.extend(element.children.iter().rev().copied());
            }
            Some(id)
        })
    }

    /// Request that the element be scrolled into the nearest visible
    /// position.
    pub fn scroll_into_view(&mut self, node: NodeId) {
        if self.contains(node) {
            self.effects.push(DomEffect::ScrollIntoView { node });
        }
    }

    /// Request dispatch of a synthetic event on the element.
    pub fn dispatch_event(&mut self, node: NodeId, event: impl Into<String>, bubbles: bool) {
        if self.contains(node) {
            self.effects.push(DomEffect::Dispatch {
                node,
                event: event.into(),
                bubbles,
            });
        }
    }

    /// Effects recorded since the last drain.
    pub fn effects(&self) -> &[DomEffect] {
        &self.effects
    }

    /// Drain the recorded effects.
    pub fn take_effects(&mut self) -> Vec<DomEffect> {
        std::mem::take(&mut self.effects)
    }
}

static_assertions::assert_impl_all!(Document: Send, Sync);
