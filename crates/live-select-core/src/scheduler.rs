//! Deferred one-shot tasks, run when the host says so.
//!
//! Nothing here owns a thread or a timer. The host asks how long it may idle
//! with [`SharedTaskScheduler::time_until_next_at`], and then hands control
//! back through [`SharedTaskScheduler::process_ready_at`]. A processing turn
//! runs every task whose deadline has passed, in deadline order. Tasks queued
//! while a turn runs wait for the following turn, even with a zero delay.
//!
//! # Example
//!
//! ```
//! use live_select_core::SharedTaskScheduler;
//! use std::time::{Duration, Instant};
//!
//! let scheduler = SharedTaskScheduler::new();
//! let id = scheduler.schedule_once(Duration::from_millis(100), || {
//!     println!("quiet period over");
//! });
//! assert!(scheduler.is_active(id));
//!
//! let start = Instant::now();
//! assert!(scheduler.time_until_next_at(start).is_some());
//! assert_eq!(scheduler.process_ready_at(start + Duration::from_millis(150)), 1);
//! assert_eq!(scheduler.active_count(), 0);
//! ```

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{Error, Result};

new_key_type! {
    /// Handle to a task queued on a [`SharedTaskScheduler`].
    pub struct ScheduledTaskId;
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Heap key: deadline first, then queueing order.
type Deadline = Reverse<(Instant, u64, ScheduledTaskId)>;

#[derive(Default)]
struct TaskQueue {
    jobs: SlotMap<ScheduledTaskId, Job>,
    // Entries of cancelled jobs stay here until they surface.
    deadlines: BinaryHeap<Deadline>,
    queued: u64,
}

impl TaskQueue {
    fn push(&mut self, at: Instant, job: Job) -> ScheduledTaskId {
        let id = self.jobs.insert(job);
        self.deadlines.push(Reverse((at, self.queued, id)));
        self.queued += 1;
        id
    }

    fn next_deadline(&mut self) -> Option<Instant> {
        while let Some(Reverse((at, _, id))) = self.deadlines.peek().copied() {
            if self.jobs.contains_key(id) {
                return Some(at);
            }
            self.deadlines.pop();
        }
        None
    }

    /// Pop the earliest job due at `now` that was queued before `cutoff`.
    ///
    /// Entries queued at or after `cutoff` are parked in `later` so they keep
    /// their place for the next turn.
    fn next_due(
        &mut self,
        now: Instant,
        cutoff: u64,
        later: &mut Vec<Deadline>,
    ) -> Option<(ScheduledTaskId, Job)> {
        while let Some(entry) = self.deadlines.peek().copied()
            && entry.0.0 <= now
        {
            self.deadlines.pop();
            let Reverse((_, seq, id)) = entry;
            if seq >= cutoff {
                later.push(entry);
            } else if let Some(job) = self.jobs.remove(id) {
                return Some((id, job));
            }
        }
        None
    }
}

/// A cloneable handle to a queue of deferred one-shot tasks.
///
/// Clones share the same queue. Tasks run with the queue unlocked, so a task
/// may queue or cancel other tasks.
#[derive(Clone, Default)]
pub struct SharedTaskScheduler {
    queue: Arc<Mutex<TaskQueue>>,
}

impl SharedTaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run once `delay` has passed.
    pub fn schedule_once<F>(&self, delay: Duration, task: F) -> ScheduledTaskId
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_at(Instant::now() + delay, task)
    }

    /// Queue `task` to run on the first turn at or after `deadline`.
    pub fn schedule_at<F>(&self, deadline: Instant, task: F) -> ScheduledTaskId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.queue.lock().push(deadline, Box::new(task));
        tracing::trace!(target: "live_select_core::scheduler", ?id, "queued");
        id
    }

    /// Remove a queued task before it runs.
    ///
    /// Fails with [`Error::InvalidTaskId`] once the task has run or was
    /// already cancelled.
    pub fn cancel(&self, id: ScheduledTaskId) -> Result<()> {
        match self.queue.lock().jobs.remove(id) {
            Some(_) => {
                tracing::trace!(target: "live_select_core::scheduler", ?id, "cancelled");
                Ok(())
            }
            None => Err(Error::InvalidTaskId),
        }
    }

    /// Whether `id` is still waiting to run.
    pub fn is_active(&self, id: ScheduledTaskId) -> bool {
        self.queue.lock().jobs.contains_key(id)
    }

    pub fn active_count(&self) -> usize {
        self.queue.lock().jobs.len()
    }

    /// How long after `now` the earliest task becomes due.
    ///
    /// `Some(Duration::ZERO)` means a task is already due; `None` means the
    /// queue is empty.
    pub fn time_until_next_at(&self, now: Instant) -> Option<Duration> {
        self.queue
            .lock()
            .next_deadline()
            .map(|at| at.saturating_duration_since(now))
    }

    /// Run one turn: every task due at `now`. Returns how many ran.
    ///
    /// Jobs are taken one at a time, so a job cancelled by an earlier job of
    /// the same turn does not run.
    #[tracing::instrument(skip(self), target = "live_select_core::scheduler", level = "trace")]
    pub fn process_ready_at(&self, now: Instant) -> usize {
        let cutoff = self.queue.lock().queued;
        let mut later = Vec::new();
        let mut ran = 0;
        loop {
            // Bound to a local so the lock is released before the job runs.
            let next = self.queue.lock().next_due(now, cutoff, &mut later);
            let Some((id, job)) = next else { break };
            tracing::trace!(target: "live_select_core::scheduler", ?id, "running");
            job();
            ran += 1;
        }
        if !later.is_empty() {
            self.queue.lock().deadlines.extend(later);
        }
        ran
    }

    /// Run one turn at the current instant.
    pub fn process_ready(&self) -> usize {
        self.process_ready_at(Instant::now())
    }
}

static_assertions::assert_impl_all!(SharedTaskScheduler: Send, Sync);
