//! The live select widget controller.
//!
//! A [`LiveSelect`] is attached to a widget root in a shared [`Document`].
//! From then on the host forwards DOM events on the widget's elements to
//! [`LiveSelect::dispatch`], calls [`LiveSelect::refresh`] after every
//! re-render of the widget markup and [`LiveSelect::reconnected`] after the
//! connection to the remote owner was re-established. Events pushed by the
//! remote owner reach the controller through the [`Channel`] it was attached
//! with.
//!
//! The host must not hold the document lock while calling into the
//! controller or delivering pushed events.
//!
//! [`Document`]: crate::dom::Document

use std::fmt;
use std::sync::{Arc, Weak};

use live_select_core::{Debouncer, SharedTaskScheduler};
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::accessor;
use crate::channel::{Channel, Subscription, WidgetChannel};
use crate::config::{KeyboardMode, WidgetConfig};
use crate::dom::{Document, DomEvent, EventOutcome, NodeId, SharedDocument};
use crate::error::{Error, Result};
use crate::navigation::{self, Move, NavKey, NavState};
use crate::protocol::{
    ActivePayload, ParentEventPayload, SelectPayload, SelectionItem, SelectionMode, events,
};

/// A text change waiting out the debounce period.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChangeRequest {
    text: String,
    field: Option<String>,
}

/// Elements the controller listens on, as of the last attach or refresh.
#[derive(Debug, Default)]
struct Listeners {
    text_input: Option<NodeId>,
    dropdown: Option<NodeId>,
    remove_buttons: Vec<NodeId>,
}

impl Listeners {
    fn wire(doc: &Document, root: NodeId) -> Self {
        Self {
            text_input: accessor::text_input(doc, root),
            dropdown: accessor::dropdown(doc, root),
            remove_buttons: accessor::remove_buttons(doc, root),
        }
    }

    /// Whether `listener` is still in the document and `target` is inside it.
    fn receives(doc: &Document, listener: Option<NodeId>, target: NodeId) -> bool {
        listener.is_some_and(|node| doc.is_connected(node) && doc.is_inclusive_ancestor(node, target))
    }
}

/// Per-instance mutable state.
#[derive(Debug)]
struct WidgetState {
    config: WidgetConfig,
    selection: Vec<SelectionItem>,
    mode: SelectionMode,
    nav: NavState,
    active_index: Option<String>,
    listeners: Listeners,
    detached: bool,
}

/// Work left over once the locks are released.
enum Action {
    Emit { event: &'static str, payload: Value },
    ScheduleChange(ChangeRequest),
    CancelChange,
}

struct Inner {
    root: NodeId,
    id: String,
    document: SharedDocument,
    channel: Arc<WidgetChannel>,
    change_events: Debouncer<ChangeRequest>,
    state: Mutex<WidgetState>,
}

/// Controller for one mounted live select widget.
///
/// Dropping the controller detaches it.
pub struct LiveSelect {
    inner: Arc<Inner>,
    subscriptions: Vec<Subscription>,
}

impl LiveSelect {
    /// Attach a controller to the widget rooted at `root`.
    ///
    /// Reads the configuration from the root's attributes, positions the clear
    /// button, subscribes to the `select`, `active` and `parent_event` pushes
    /// and starts listening on the widget's elements.
    ///
    /// # Errors
    ///
    /// Fails if `root` is not in the document or has no `id`.
    pub fn attach(
        document: SharedDocument,
        root: NodeId,
        channel: Arc<Channel>,
        scheduler: SharedTaskScheduler,
    ) -> Result<Self> {
        let (id, config, listeners, nav, active_index) = {
            let mut doc = document.lock();
            let element = doc.get(root).ok_or(Error::UnknownNode)?;
            let id = element
                .id()
                .filter(|id| !id.is_empty())
                .ok_or(Error::MissingId)?
                .to_string();
            let config = WidgetConfig::from_element(element);

            accessor::style_clear_button(&mut doc, root);
            let listeners = Listeners::wire(&doc, root);
            let nav = navigation::recover(&doc, root, &config.active_option_classes);
            let active_index =
                navigation::recover_active_index(&doc, root, &config.active_option_classes);
            (id, config, listeners, nav, active_index)
        };

        let widget_channel = Arc::new(WidgetChannel::new(channel, id.clone(), config.target.clone()));
        let change_channel = widget_channel.clone();
        let change_events = Debouncer::new(scheduler, config.debounce, move |change: ChangeRequest| {
            send_change(&change_channel, change);
        });

        tracing::debug!(
            target: "live_select::controller",
            widget = %id,
            keyboard = %config.keyboard_mode,
            debounce = ?config.debounce,
            "attached"
        );

        let inner = Arc::new(Inner {
            root,
            id,
            document,
            channel: widget_channel,
            change_events,
            state: Mutex::new(WidgetState {
                mode: config.selection_mode.unwrap_or_default(),
                config,
                selection: Vec::new(),
                nav,
                active_index,
                listeners,
                detached: false,
            }),
        });

        let subscriptions = vec![
            subscribe(&inner, events::SELECT, Inner::on_select),
            subscribe(&inner, events::ACTIVE, Inner::on_active),
            subscribe(&inner, events::PARENT_EVENT, Inner::on_parent_event),
        ];

        Ok(Self {
            inner,
            subscriptions,
        })
    }

    /// The widget's element id.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The widget root.
    pub fn root(&self) -> NodeId {
        self.inner.root
    }

    /// The configuration as of the last attach or refresh.
    pub fn config(&self) -> WidgetConfig {
        self.inner.state.lock().config.clone()
    }

    /// The selection last pushed by the remote owner.
    pub fn selection(&self) -> Vec<SelectionItem> {
        self.inner.state.lock().selection.clone()
    }

    /// The current selection mode.
    pub fn selection_mode(&self) -> SelectionMode {
        self.inner.state.lock().mode
    }

    /// The `data-idx` of the locally highlighted option.
    pub fn active_index(&self) -> Option<String> {
        self.inner.state.lock().active_index.clone()
    }

    /// The local navigation state.
    pub fn nav_state(&self) -> NavState {
        self.inner.state.lock().nav
    }

    /// Whether a text change is waiting out the debounce period.
    pub fn is_change_pending(&self) -> bool {
        self.inner.change_events.is_pending()
    }

    /// Whether the controller has been detached.
    pub fn is_detached(&self) -> bool {
        self.inner.state.lock().detached
    }

    /// Re-read the configuration and re-wire listeners after a re-render.
    ///
    /// Listeners bound to elements the re-render removed stop receiving
    /// events. The navigation state is recovered from the new markup.
    pub fn refresh(&self) {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        if state.detached {
            return;
        }
        let mut doc = inner.document.lock();
        let Some(element) = doc.get(inner.root) else {
            tracing::warn!(target: "live_select::controller", widget = %inner.id, "root removed, skipping refresh");
            return;
        };

        let config = WidgetConfig::from_element(element);
        inner.change_events.set_quiet_period(config.debounce);
        inner.channel.set_delegate(config.target.clone());
        if let Some(mode) = config.selection_mode {
            state.mode = mode;
        }

        accessor::style_clear_button(&mut doc, inner.root);
        state.listeners = Listeners::wire(&doc, inner.root);
        state.nav = navigation::recover(&doc, inner.root, &config.active_option_classes);
        state.active_index =
            navigation::recover_active_index(&doc, inner.root, &config.active_option_classes);
        state.config = config;

        tracing::debug!(
            target: "live_select::controller",
            widget = %inner.id,
            nav = ?state.nav,
            "refreshed"
        );
    }

    /// Re-send the selection after the connection was re-established.
    ///
    /// Nothing is sent when the selection is empty.
    pub fn reconnected(&self) {
        let selection = {
            let state = self.inner.state.lock();
            if state.detached || state.selection.is_empty() {
                return;
            }
            state.selection.clone()
        };

        match serde_json::to_value(&selection) {
            Ok(payload) => {
                tracing::debug!(
                    target: "live_select::controller",
                    widget = %self.inner.id,
                    items = selection.len(),
                    "recovering selection"
                );
                self.inner.channel.emit(events::SELECTION_RECOVERY, payload);
            }
            Err(err) => {
                tracing::warn!(target: "live_select::controller", widget = %self.inner.id, %err, "cannot encode selection");
            }
        }
    }

    /// Detach the controller: cancel any pending text change and stop
    /// handling pushed and DOM events.
    pub fn detach(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        {
            let mut state = self.inner.state.lock();
            if state.detached {
                return;
            }
            state.detached = true;
        }
        let cancelled = self.inner.change_events.cancel();
        self.subscriptions.clear();
        tracing::debug!(
            target: "live_select::controller",
            widget = %self.inner.id,
            cancelled_change = cancelled,
            "detached"
        );
    }

    /// Handle a DOM event dispatched on `target`.
    ///
    /// Events on elements the controller does not listen on (including
    /// elements removed since the last refresh) are ignored.
    pub fn dispatch(&self, target: NodeId, event: &DomEvent) -> EventOutcome {
        let (outcome, actions) = {
            let mut state = self.inner.state.lock();
            if state.detached {
                return EventOutcome::ignored();
            }
            let mut doc = self.inner.document.lock();
            if !doc.is_connected(target) {
                return EventOutcome::ignored();
            }
            self.inner.handle_dom_event(&mut state, &mut doc, target, event)
        };
        self.inner.run(actions);
        outcome
    }
}

impl Drop for LiveSelect {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for LiveSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSelect")
            .field("id", &self.inner.id)
            .field("root", &self.inner.root)
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(LiveSelect: Send, Sync);

fn subscribe<T>(inner: &Arc<Inner>, event: &str, handler: fn(&Inner, T)) -> Subscription
where
    T: serde::de::DeserializeOwned + 'static,
{
    let weak: Weak<Inner> = Arc::downgrade(inner);
    inner.channel.subscribe(event, move |payload: T| {
        if let Some(inner) = weak.upgrade() {
            handler(&inner, payload);
        }
    })
}

fn send_change(channel: &WidgetChannel, change: ChangeRequest) {
    let ChangeRequest { text, field } = change;
    let mut parent_payload = json!({"id": channel.owner(), "text": text});
    if let Some(field) = field {
        parent_payload["field"] = Value::String(field);
    }
    channel.emit(events::CHANGE, json!({"text": text}));
    channel.emit_to_parent(events::LIVE_SELECT_CHANGE, parent_payload);
}

impl Inner {
    fn run(&self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Emit { event, payload } => self.channel.emit(event, payload),
                Action::ScheduleChange(change) => self.change_events.call(change),
                Action::CancelChange => {
                    self.change_events.cancel();
                }
            }
        }
    }

    fn handle_dom_event(
        &self,
        state: &mut WidgetState,
        doc: &mut Document,
        target: NodeId,
        event: &DomEvent,
    ) -> (EventOutcome, Vec<Action>) {
        let text_input = state.listeners.text_input;
        let dropdown = state.listeners.dropdown;
        match event {
            DomEvent::KeyDown { key, code } if Listeners::receives(doc, text_input, target) =>
            {
                match state.config.keyboard_mode {
                    KeyboardMode::Server => server_keydown(code),
                    KeyboardMode::Hook => self.hook_keydown(state, doc, key),
                }
            }
            DomEvent::Input if Listeners::receives(doc, text_input, target) => {
                let text = doc.value(target).unwrap_or_default().trim().to_string();
                (EventOutcome::handled(), input_actions(&state.config, text))
            }
            DomEvent::MouseDown if Listeners::receives(doc, dropdown, target) => {
                let doc: &Document = doc;
                match accessor::option_for_target(doc, target)
                    .filter(|&option| Listeners::receives(doc, dropdown, option))
                    .and_then(|option| doc.attribute(option, "data-idx"))
                {
                    Some(idx) => (
                        EventOutcome::prevented(),
                        vec![Action::Emit {
                            event: events::OPTION_CLICK,
                            payload: json!({"idx": idx}),
                        }],
                    ),
                    None => (EventOutcome::handled(), Vec::new()),
                }
            }
            DomEvent::Click => {
                let doc: &Document = doc;
                let button = state
                    .listeners
                    .remove_buttons
                    .iter()
                    .copied()
                    .find(|&button| Listeners::receives(doc, Some(button), target));
                match button.and_then(|button| doc.attribute(button, "data-idx")) {
                    Some(idx) => (
                        EventOutcome::handled(),
                        vec![Action::Emit {
                            event: events::OPTION_REMOVE,
                            payload: json!({"idx": idx}),
                        }],
                    ),
                    None => (EventOutcome::ignored(), Vec::new()),
                }
            }
            _ => (EventOutcome::ignored(), Vec::new()),
        }
    }

    fn hook_keydown(
        &self,
        state: &mut WidgetState,
        doc: &mut Document,
        key: &str,
    ) -> (EventOutcome, Vec<Action>) {
        let Some(nav_key) = NavKey::from_key(key) else {
            return (EventOutcome::handled(), Vec::new());
        };
        let mut actions = Vec::new();
        match nav_key {
            NavKey::Down | NavKey::Up => {
                let mv = if nav_key == NavKey::Down {
                    Move::Next
                } else {
                    Move::Previous
                };
                if let Some(highlight) = navigation::move_focus(
                    doc,
                    self.root,
                    &state.config.active_option_classes,
                    state.nav,
                    mv,
                ) {
                    state.nav = NavState::Highlighted(highlight.position);
                    state.active_index = highlight.index;
                }
            }
            NavKey::Enter => match &state.active_index {
                Some(idx) => actions.push(Action::Emit {
                    event: events::OPTION_CLICK,
                    payload: json!({ "idx": idx }),
                }),
                None => {
                    tracing::trace!(target: "live_select::navigation", widget = %self.id, "no active option to select");
                }
            },
            NavKey::Escape => actions.push(Action::Emit {
                event: events::KEYDOWN,
                payload: json!({"key": "Escape"}),
            }),
        }
        (EventOutcome::consumed(), actions)
    }

    fn on_select(&self, payload: SelectPayload) {
        let parent_event = {
            let mut state = self.state.lock();
            if state.detached {
                return;
            }
            let mode = payload
                .mode
                .or(state.config.selection_mode)
                .unwrap_or_default();
            state.mode = mode;

            let current_text = payload.current_text.unwrap_or_default();
            let display = match (mode, payload.selection.first()) {
                (SelectionMode::Single, Some(item)) => item.label.clone(),
                _ => current_text,
            };
            let selection_empty = payload.selection.is_empty();
            state.selection = payload.selection;

            let mut doc = self.document.lock();
            match accessor::text_input(&doc, self.root) {
                Some(input) => doc.set_value(input, display),
                None => {
                    tracing::debug!(target: "live_select::controller", widget = %self.id, "no text input to display selection");
                }
            }

            if payload.input_event == Some(true) {
                match accessor::synthetic_input_target(&doc, self.root, mode, selection_empty) {
                    Some(node) => doc.dispatch_event(node, "input", true),
                    None => {
                        tracing::debug!(target: "live_select::controller", widget = %self.id, %mode, "no synthetic input target");
                    }
                }
            }

            tracing::debug!(
                target: "live_select::controller",
                widget = %self.id,
                %mode,
                items = state.selection.len(),
                "applied selection"
            );
            payload.parent_event
        };

        if let Some(event) = parent_event {
            self.channel
                .emit_to_parent(&event, json!({"id": self.id.as_str()}));
        }
    }

    fn on_active(&self, payload: ActivePayload) {
        let state = self.state.lock();
        if state.detached {
            return;
        }
        let mut doc = self.document.lock();
        let idx = payload.idx.to_string();
        match accessor::option_by_idx(&doc, self.root, &idx) {
            Some(option) => doc.scroll_into_view(option),
            None => {
                tracing::trace!(target: "live_select::controller", widget = %self.id, %idx, "active option not rendered");
            }
        }
    }

    fn on_parent_event(&self, payload: ParentEventPayload) {
        if self.state.lock().detached {
            return;
        }
        self.channel.emit_to_parent(&payload.event, payload.payload);
    }
}

fn server_keydown(code: &str) -> (EventOutcome, Vec<Action>) {
    let outcome = if code == "Enter" {
        EventOutcome::prevented()
    } else {
        EventOutcome::handled()
    };
    let action = Action::Emit {
        event: events::KEYDOWN,
        payload: json!({"key": code}),
    };
    (outcome, vec![action])
}

fn input_actions(config: &WidgetConfig, text: String) -> Vec<Action> {
    if text.chars().count() >= config.update_min_len {
        vec![Action::ScheduleChange(ChangeRequest {
            text,
            field: config.field.clone(),
        })]
    } else {
        vec![
            Action::CancelChange,
            Action::Emit {
                event: events::OPTIONS_CLEAR,
                payload: json!({}),
            },
        ]
    }
}
