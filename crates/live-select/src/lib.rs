//! Live select - client-side controller for remotely owned comboboxes.
//!
//! A live select widget is a text field with a dropdown of options whose
//! contents, selection and highlight are owned by a remote process. This crate
//! wires the widget's elements to that process: typed text is debounced and
//! sent upstream, pushed selections are rendered into the text field, and
//! keyboard navigation either runs locally or is forwarded.
//!
//! This crate re-exports [`live_select_core`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//!
//! use live_select::{
//!     Channel, Document, DomEvent, LiveSelect, NodeSpec, QueuedTransport, SharedTaskScheduler,
//!     accessor,
//! };
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let root = doc.mount(
//!     body,
//!     NodeSpec::new("div")
//!         .id("city")
//!         .attr("data-debounce", "50")
//!         .child(NodeSpec::new("input").attr("type", "text")),
//! );
//! let document = doc.into_shared();
//!
//! let transport = Arc::new(QueuedTransport::new());
//! let channel = Arc::new(Channel::new(transport.clone()));
//! let scheduler = SharedTaskScheduler::new();
//! let widget = LiveSelect::attach(document.clone(), root, channel, scheduler.clone())?;
//!
//! let input = accessor::text_input(&document.lock(), root).unwrap();
//! document.lock().set_value(input, "Rom");
//! widget.dispatch(input, &DomEvent::Input);
//!
//! scheduler.process_ready_at(Instant::now() + Duration::from_millis(60));
//! assert_eq!(transport.events_named("change").len(), 1);
//! # Ok::<(), live_select::Error>(())
//! ```

pub mod accessor;
pub mod channel;
pub mod config;
mod controller;
pub mod dom;
mod error;
pub mod navigation;
pub mod protocol;

pub use live_select_core::*;

pub use channel::{Channel, OutboundEvent, PushTarget, QueuedTransport, Subscription, Transport};
pub use config::{ConfigError, KeyboardMode, WidgetConfig};
pub use controller::LiveSelect;
pub use dom::{Document, DomEffect, DomEvent, EventOutcome, NodeId, NodeSpec, Selector, SharedDocument};
pub use error::{Error, Result};
pub use protocol::{SelectionItem, SelectionMode};
