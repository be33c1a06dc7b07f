//! Trailing-edge debouncing on top of the task scheduler.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::scheduler::{ScheduledTaskId, SharedTaskScheduler};

/// Collapses bursts of calls into one trailing call.
///
/// Every [`call`](Self::call) cancels the call still pending from this
/// debouncer and schedules a new one after the quiet period, so a burst of
/// calls closer together than the quiet period runs the callback once, with
/// the arguments of the last call. Superseded arguments are discarded.
///
/// Dropping the debouncer cancels the pending call.
pub struct Debouncer<Args> {
    scheduler: SharedTaskScheduler,
    callback: Arc<dyn Fn(Args) + Send + Sync>,
    quiet: Mutex<Duration>,
    pending: Mutex<Option<ScheduledTaskId>>,
}

impl<Args: Send + 'static> Debouncer<Args> {
    /// Wrap `callback` so it only runs after `quiet` without further calls.
    pub fn new<F>(scheduler: SharedTaskScheduler, quiet: Duration, callback: F) -> Self
    where
        F: Fn(Args) + Send + Sync + 'static,
    {
        Self {
            scheduler,
            callback: Arc::new(callback),
            quiet: Mutex::new(quiet),
            pending: Mutex::new(None),
        }
    }

    /// Schedule the callback with `args`, replacing any pending call.
    pub fn call(&self, args: Args) {
        let mut pending = self.pending.lock();
        if let Some(id) = pending.take()
            && self.scheduler.cancel(id).is_ok()
        {
            tracing::trace!(target: "live_select_core::debounce", ?id, "superseded pending call");
        }

        let callback = self.callback.clone();
        let quiet = *self.quiet.lock();
        *pending = Some(self.scheduler.schedule_once(quiet, move || callback(args)));
    }

    /// Cancel the pending call, if any.
    ///
    /// Returns `true` if a call was actually pending.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(id) => self.scheduler.cancel(id).is_ok(),
            None => false,
        }
    }

    /// Whether a call is scheduled and has not run yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .is_some_and(|id| self.scheduler.is_active(id))
    }

    /// The current quiet period.
    pub fn quiet_period(&self) -> Duration {
        *self.quiet.lock()
    }

    /// Change the quiet period used by later calls.
    ///
    /// A call that is already pending keeps its deadline.
    pub fn set_quiet_period(&self, quiet: Duration) {
        *self.quiet.lock() = quiet;
    }
}

impl<Args> Drop for Debouncer<Args> {
    fn drop(&mut self) {
        if let Some(id) = self.pending.get_mut().take() {
            let _ = self.scheduler.cancel(id);
        }
    }
}

static_assertions::assert_impl_all!(Debouncer<String>: Send, Sync);
