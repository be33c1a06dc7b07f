//! Event-loop primitives shared by the live select controller.
//!
//! A browser gives a widget script a macrotask queue, timers and event
//! listeners for free. This crate supplies the same three things to a host
//! that drives them explicitly:
//!
//! - [`SharedTaskScheduler`] queues deferred one-shot tasks and runs the due
//!   ones whenever the host processes a turn.
//! - [`Debouncer`] keeps only the last call of a burst and runs it after a
//!   quiet period.
//! - [`Signal`] fans one event out to its connected slots in connection order.
//!
//! ```
//! use live_select_core::{Debouncer, SharedTaskScheduler, Signal};
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use std::time::{Duration, Instant};
//!
//! let scheduler = SharedTaskScheduler::new();
//! let searched = Arc::new(Mutex::new(Vec::new()));
//!
//! let searched_clone = searched.clone();
//! let search = Debouncer::new(scheduler.clone(), Duration::from_millis(50), move |text: String| {
//!     searched_clone.lock().push(text);
//! });
//!
//! let typed = Signal::<String>::new();
//! let id = typed.connect(move |text| search.call(text.clone()));
//! for text in ["R", "Ro", "Rom"] {
//!     typed.emit(text.to_string());
//! }
//! typed.disconnect(id);
//!
//! scheduler.process_ready_at(Instant::now() + Duration::from_millis(60));
//! assert_eq!(*searched.lock(), vec!["Rom".to_string()]);
//! ```

mod debounce;
mod error;
pub mod logging;
mod scheduler;
pub mod signal;

pub use debounce::Debouncer;
pub use error::{Error, Result};
pub use scheduler::{ScheduledTaskId, SharedTaskScheduler};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
