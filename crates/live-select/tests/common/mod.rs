//! Shared fixtures for widget integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use live_select::{
    Channel, Document, DomEffect, DomEvent, EventOutcome, LiveSelect, NodeId, NodeSpec,
    OutboundEvent, QueuedTransport, Selector, SharedDocument, SharedTaskScheduler, accessor,
};
use serde_json::Value;

/// Highlight classes used by hook-mode fixtures.
pub const ACTIVE_CLASSES: &str = "active bg-gray-300";

/// Install a test subscriber; `RUST_LOG` selects what is shown.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The dropdown with `count` options whose `data-idx` starts at `first_idx`.
///
/// The option at position `active` carries the highlight classes.
pub fn option_list(count: usize, first_idx: usize, active: Option<usize>) -> NodeSpec {
    NodeSpec::new("ul").children((0..count).map(|position| {
        let mut option = NodeSpec::new("div")
            .data("idx", (first_idx + position).to_string())
            .class("option")
            .child(NodeSpec::new("span").attr("data-label", "true"));
        if active == Some(position) {
            option = option.class(format!("option {ACTIVE_CLASSES}"));
        }
        NodeSpec::new("li").child(option)
    }))
}

/// The children of a widget root: text field with clear button, hidden
/// single-mode input, two tag removal buttons and an optional dropdown.
pub fn widget_body(dropdown: Option<NodeSpec>) -> Vec<NodeSpec> {
    let mut children = vec![
        NodeSpec::new("div")
            .class("container")
            .child(NodeSpec::new("input").attr("type", "text"))
            .child(NodeSpec::new("button").attr("phx-click", "clear")),
        NodeSpec::new("input")
            .attr("type", "hidden")
            .class("single-mode"),
        NodeSpec::new("div")
            .class("tags")
            .child(NodeSpec::new("button").data("idx", "0").child(NodeSpec::new("svg")))
            .child(NodeSpec::new("button").data("idx", "1")),
    ];
    children.extend(dropdown);
    children
}

/// A widget root with `attrs` and the standard body.
pub fn widget_markup(id: &str, attrs: &[(&str, &str)], dropdown: Option<NodeSpec>) -> NodeSpec {
    attrs
        .iter()
        .fold(NodeSpec::new("div").id(id), |spec, (name, value)| {
            spec.attr(*name, *value)
        })
        .children(widget_body(dropdown))
}

/// One widget attached to a fresh document and channel.
pub struct Harness {
    pub document: SharedDocument,
    pub root: NodeId,
    pub transport: Arc<QueuedTransport>,
    pub channel: Arc<Channel>,
    pub scheduler: SharedTaskScheduler,
    pub widget: LiveSelect,
}

impl Harness {
    /// Mount `markup` into a new document and attach a controller to it.
    pub fn new(markup: NodeSpec) -> Self {
        init_tracing();
        let mut doc = Document::new();
        let body = doc.body();
        let root = doc.mount(body, markup);
        let document = doc.into_shared();

        let transport = Arc::new(QueuedTransport::new());
        let channel = Arc::new(Channel::new(transport.clone()));
        let scheduler = SharedTaskScheduler::new();
        let widget = LiveSelect::attach(document.clone(), root, channel.clone(), scheduler.clone())
            .expect("attach widget");

        Self {
            document,
            root,
            transport,
            channel,
            scheduler,
            widget,
        }
    }

    /// A widget with the given root attributes and dropdown.
    pub fn with(attrs: &[(&str, &str)], dropdown: Option<NodeSpec>) -> Self {
        Self::new(widget_markup("city", attrs, dropdown))
    }

    /// Attach a second widget to the same document and channel.
    pub fn attach_sibling(&self, markup: NodeSpec) -> (NodeId, LiveSelect) {
        let body = self.document.lock().body();
        let root = self.document.lock().mount(body, markup);
        let widget = LiveSelect::attach(
            self.document.clone(),
            root,
            self.channel.clone(),
            self.scheduler.clone(),
        )
        .expect("attach sibling");
        (root, widget)
    }

    pub fn text_input(&self) -> NodeId {
        accessor::text_input(&self.document.lock(), self.root).expect("text input")
    }

    pub fn dropdown(&self) -> NodeId {
        accessor::dropdown(&self.document.lock(), self.root).expect("dropdown")
    }

    pub fn option(&self, idx: &str) -> NodeId {
        accessor::option_by_idx(&self.document.lock(), self.root, idx).expect("option")
    }

    pub fn query(&self, selector: &Selector) -> NodeId {
        self.document
            .lock()
            .query_selector(self.root, selector)
            .expect("element")
    }

    /// The text field's current value.
    pub fn text(&self) -> String {
        let input = self.text_input();
        self.document
            .lock()
            .value(input)
            .unwrap_or_default()
            .to_string()
    }

    /// Set the text field's value and dispatch `input` on it.
    pub fn type_text(&self, text: &str) -> EventOutcome {
        let input = self.text_input();
        self.document.lock().set_value(input, text);
        self.widget.dispatch(input, &DomEvent::Input)
    }

    /// Dispatch a key press whose key and code share a name.
    pub fn key(&self, name: &str) -> EventOutcome {
        self.widget.dispatch(self.text_input(), &DomEvent::key(name))
    }

    /// Deliver a pushed event to every subscriber on the channel.
    pub fn push(&self, event: &str, payload: Value) -> usize {
        self.channel.deliver(event, payload)
    }

    /// Run every task due within `after`.
    pub fn advance(&self, after: Duration) -> usize {
        self.scheduler.process_ready_at(Instant::now() + after)
    }

    /// Run every task due within the next second.
    pub fn settle(&self) -> usize {
        self.advance(Duration::from_secs(1))
    }

    /// Take every event sent so far.
    pub fn sent(&self) -> Vec<OutboundEvent> {
        self.transport.drain()
    }

    /// Take every recorded document effect.
    pub fn effects(&self) -> Vec<DomEffect> {
        self.document.lock().take_effects()
    }

    /// Nodes carrying every highlight class.
    pub fn highlighted(&self) -> Vec<NodeId> {
        let selector = ACTIVE_CLASSES
            .split_whitespace()
            .fold(Selector::tag("div"), |selector, class| selector.class(class));
        self.document.lock().query_selector_all(self.root, &selector)
    }

    /// Replace the widget's markup the way a re-render does.
    pub fn rerender(&self, dropdown: Option<NodeSpec>) {
        self.document
            .lock()
            .replace_children(self.root, widget_body(dropdown));
    }
}
