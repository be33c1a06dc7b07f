//! The event channel between widgets and their remote owner.
//!
//! Outbound events go through a host-provided [`Transport`]. Inbound events
//! pushed by the remote owner are handed to [`Channel::deliver`], which fans
//! them out to every subscriber of that event name in subscription order.
//! A [`WidgetChannel`] scopes the hub to one widget: it routes outbound events
//! to the widget or its delegation target and filters inbound events by the
//! widget's id.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use live_select_core::{ConnectionGuard, Signal};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

/// Where an outbound event is routed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PushTarget {
    /// The remote counterpart of the component with this element id.
    Component(String),
    /// The delegation target named by a `data-phx-target` selector.
    Selector(String),
    /// The hosting view.
    View,
}

impl fmt::Display for PushTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component(id) => write!(f, "#{id}"),
            Self::Selector(selector) => f.write_str(selector),
            Self::View => f.write_str("view"),
        }
    }
}

/// An event sent to the remote owner.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEvent {
    /// Routing target.
    pub target: PushTarget,
    /// Event name.
    pub event: String,
    /// JSON payload.
    pub payload: Value,
}

/// Sends outbound events to the remote owner.
///
/// Delivery is assumed reliable and ordered.
pub trait Transport: Send + Sync {
    /// Send one event.
    fn push(&self, event: OutboundEvent);
}

/// A transport that buffers events until the host drains them.
#[derive(Debug, Default)]
pub struct QueuedTransport {
    queue: Mutex<Vec<OutboundEvent>>,
}

impl QueuedTransport {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered event, oldest first.
    pub fn drain(&self) -> Vec<OutboundEvent> {
        std::mem::take(&mut *self.queue.lock())
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Buffered events with the given name, oldest first, without draining.
    pub fn events_named(&self, event: &str) -> Vec<OutboundEvent> {
        self.queue
            .lock()
            .iter()
            .filter(|e| e.event == event)
            .cloned()
            .collect()
    }
}

impl Transport for QueuedTransport {
    fn push(&self, event: OutboundEvent) {
        self.queue.lock().push(event);
    }
}

/// Per-connection event hub shared by every widget on the connection.
pub struct Channel {
    transport: Arc<dyn Transport>,
    handlers: Mutex<HashMap<String, Arc<Signal<Value>>>>,
}

impl Channel {
    /// Create a hub sending through `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Send an event to the remote owner.
    pub fn push(&self, target: PushTarget, event: &str, payload: Value) {
        tracing::debug!(target: "live_select::channel", %target, event, "pushing event");
        self.transport.push(OutboundEvent {
            target,
            event: event.to_string(),
            payload,
        });
    }

    /// Register a handler for pushed events named `event`.
    ///
    /// The handler stays registered until the returned subscription drops.
    pub fn handle_event<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let signal = self
            .handlers
            .lock()
            .entry(event.to_string())
            .or_insert_with(|| Arc::new(Signal::new()))
            .clone();
        Subscription {
            event: event.to_string(),
            guard: signal.connect_scoped(handler),
        }
    }

    /// Deliver an event pushed by the remote owner to its subscribers.
    ///
    /// Returns the number of handlers invoked.
    pub fn deliver(&self, event: &str, payload: Value) -> usize {
        let signal = self.handlers.lock().get(event).cloned();
        match signal {
            Some(signal) => signal.emit(payload),
            None => {
                tracing::trace!(target: "live_select::channel", event, "no subscribers");
                0
            }
        }
    }

    /// Number of live subscriptions for `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.handlers
            .lock()
            .get(event)
            .map_or(0, |signal| signal.connection_count())
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.lock();
        f.debug_struct("Channel")
            .field("events", &handlers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A registered handler. Dropping it unregisters the handler.
pub struct Subscription {
    event: String,
    guard: ConnectionGuard<Value>,
}

impl Subscription {
    /// The subscribed event name.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Whether the handler is still registered.
    pub fn is_active(&self) -> bool {
        self.guard.is_connected()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("active", &self.is_active())
            .finish()
    }
}

/// The channel as seen by one widget.
pub struct WidgetChannel {
    channel: Arc<Channel>,
    owner: String,
    delegate: Mutex<Option<String>>,
}

impl WidgetChannel {
    /// Scope `channel` to the widget with element id `owner`.
    pub fn new(channel: Arc<Channel>, owner: impl Into<String>, delegate: Option<String>) -> Self {
        Self {
            channel,
            owner: owner.into(),
            delegate: Mutex::new(delegate),
        }
    }

    /// The widget's element id.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The current delegation target.
    pub fn delegate(&self) -> Option<String> {
        self.delegate.lock().clone()
    }

    /// Change the delegation target; configuration may change on refresh.
    pub fn set_delegate(&self, delegate: Option<String>) {
        *self.delegate.lock() = delegate;
    }

    /// Send to the widget's own remote counterpart.
    pub fn emit(&self, event: &str, payload: Value) {
        self.channel
            .push(PushTarget::Component(self.owner.clone()), event, payload);
    }

    /// Send to the delegation target, or to the hosting view without one.
    pub fn emit_to_parent(&self, event: &str, payload: Value) {
        let target = match self.delegate() {
            Some(selector) => PushTarget::Selector(selector),
            None => PushTarget::View,
        };
        self.channel.push(target, event, payload);
    }

    /// Register a typed handler for pushed `event`s addressed to this widget.
    ///
    /// Payloads whose `id` differs from the widget's are skipped before
    /// decoding. Payloads that fail to decode are logged and dropped.
    pub fn subscribe<T, F>(&self, event: &str, handler: F) -> Subscription
    where
        T: DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        let owner = self.owner.clone();
        let name = event.to_string();
        self.channel.handle_event(event, move |payload| {
            if payload.get("id").and_then(Value::as_str) != Some(owner.as_str()) {
                return;
            }
            match serde_json::from_value::<T>(payload.clone()) {
                Ok(decoded) => handler(decoded),
                Err(source) => {
                    let err = Error::payload(name.as_str(), source);
                    tracing::warn!(target: "live_select::channel", widget = %owner, %err, "dropping pushed event");
                }
            }
        })
    }
}

impl fmt::Debug for WidgetChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetChannel")
            .field("owner", &self.owner)
            .field("delegate", &*self.delegate.lock())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Channel: Send, Sync);
static_assertions::assert_impl_all!(WidgetChannel: Send, Sync);
static_assertions::assert_impl_all!(Subscription: Send, Sync);
