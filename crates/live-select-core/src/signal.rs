//! Ordered fan-out of events to connected slots.
//!
//! Each event name a remote owner can push is backed by one [`Signal`];
//! every widget subscribed to that name holds a slot on it. Delivery is
//! synchronous and follows connection order, so pushed events reach widgets
//! in the order they subscribed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use live_select_core::Signal;
//!
//! let pushed = Arc::new(Signal::<String>::new());
//! let guard = pushed.connect_scoped(|payload| {
//!     println!("pushed: {payload}");
//! });
//!
//! assert_eq!(pushed.emit("select".to_string()), 1);
//! drop(guard);
//! assert_eq!(pushed.emit("select".to_string()), 0);
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Identifies one connected slot.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

struct Connection<Args> {
    seq: u64,
    slot: Slot<Args>,
}

struct Connections<Args> {
    slots: SlotMap<ConnectionId, Connection<Args>>,
    next_seq: u64,
}

/// A synchronous event source with any number of slots.
///
/// The connection table is not locked while slots run, so a slot may connect
/// or disconnect slots (including itself). Such changes apply from the next
/// emission on.
pub struct Signal<Args> {
    connections: Mutex<Connections<Args>>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a signal with no slots.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(Connections {
                slots: SlotMap::with_key(),
                next_seq: 0,
            }),
        }
    }

    /// Connect a slot. It runs on every emission until disconnected.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let mut connections = self.connections.lock();
        let seq = connections.next_seq;
        connections.next_seq += 1;
        connections.slots.insert(Connection {
            seq,
            slot: Arc::new(slot),
        })
    }

    /// Disconnect a slot. Returns `false` if it was not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().slots.remove(id).is_some()
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().slots.len()
    }

    /// Run every connected slot with `args`, oldest connection first.
    ///
    /// Returns the number of slots run.
    #[tracing::instrument(skip_all, target = "live_select_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) -> usize {
        let mut slots: Vec<(u64, Slot<Args>)> = self
            .connections
            .lock()
            .slots
            .values()
            .map(|c| (c.seq, c.slot.clone()))
            .collect();
        // Slot keys are reused after removal, so key order is not connection order.
        slots.sort_unstable_by_key(|(seq, _)| *seq);
        tracing::trace!(target: "live_select_core::signal", slots = slots.len(), "emitting");

        for (_, slot) in &slots {
            slot(&args);
        }
        slots.len()
    }

    /// Connect a slot for as long as the returned guard lives.
    ///
    /// The guard holds the signal weakly; dropping it after the signal is gone
    /// does nothing.
    pub fn connect_scoped<F>(self: &Arc<Self>, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        ConnectionGuard {
            signal: Arc::downgrade(self),
            id: self.connect(slot),
        }
    }
}

/// Disconnects its slot when dropped. Created by [`Signal::connect_scoped`].
pub struct ConnectionGuard<Args: 'static> {
    signal: Weak<Signal<Args>>,
    id: ConnectionId,
}

impl<Args: 'static> ConnectionGuard<Args> {
    /// The guarded connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether the slot is still connected to a live signal.
    pub fn is_connected(&self) -> bool {
        self.signal
            .upgrade()
            .is_some_and(|signal| signal.connections.lock().slots.contains_key(self.id))
    }
}

impl<Args: 'static> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.upgrade() {
            signal.disconnect(self.id);
        }
    }
}

static_assertions::assert_impl_all!(Signal<String>: Send, Sync);
static_assertions::assert_impl_all!(ConnectionGuard<String>: Send, Sync);
