//! Double-buffered event storage
//!
//! Two fixed-capacity slot arrays alternate between the *active* role (accepts
//! reservations) and the *flushing* role (drained by a flush). Roles are an
//! index held under the selection lock; the arrays themselves never move.
//!
//! # Locking
//!
//! Every slot carries its own lock. A writer takes its slot's lock *before*
//! releasing the selection lock, then fills the record with only the slot lock
//! held. A flush that swaps roles afterwards and drains the buffer blocks on
//! that slot lock until the writer finishes, so no record is ever read
//! half-written and no reservation straddles a swap.
//!
//! Slot locks are uncontended except for that hand-off: two writers never
//! share a slot, and only one flush drains at a time.

use crate::{EventRecord, TracingError};
use parking_lot::{Mutex, MutexGuard};

type Slot = Mutex<Option<EventRecord>>;

/// Exclusive access to one reserved slot
pub(crate) type SlotGuard<'a> = MutexGuard<'a, Option<EventRecord>>;

/// Outcome of a slot reservation
pub(crate) enum Reservation<'a> {
    /// Slot reserved; the caller must store its record through the guard
    Reserved(SlotGuard<'a>),
    /// Active buffer is at capacity for this epoch
    Full,
    /// Buffer has been closed
    Closed,
}

/// Snapshot of a buffer taken out of the active role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Epoch {
    index: usize,
    count: usize,
}

impl Epoch {
    /// Number of slots reserved during the epoch
    pub(crate) fn len(&self) -> usize {
        self.count
    }
}

#[derive(Debug)]
struct Selection {
    active: usize,
    cursors: [usize; 2],
    open: bool,
}

/// Two fixed-capacity record buffers with an active/flushing role swap
pub(crate) struct DualBuffer {
    selection: Mutex<Selection>,
    buffers: [Box<[Slot]>; 2],
    capacity: usize,
}

impl DualBuffer {
    /// Allocate both buffers
    ///
    /// # Errors
    ///
    /// Returns [`TracingError::ResourceExhausted`] if either buffer cannot be
    /// allocated.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self, TracingError> {
        Ok(Self {
            selection: Mutex::new(Selection {
                active: 0,
                cursors: [0, 0],
                open: true,
            }),
            buffers: [allocate(capacity)?, allocate(capacity)?],
            capacity,
        })
    }

    /// Records each buffer can hold
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reserve the next slot of the active buffer
    ///
    /// O(1) under the selection lock. The returned guard keeps the slot locked
    /// so a concurrent flush waits for the record to be written.
    pub(crate) fn reserve(&self) -> Reservation<'_> {
        let mut selection = self.selection.lock();
        if !selection.open {
            return Reservation::Closed;
        }

        let active = selection.active;
        let Some(cursor) = selection.cursors.get_mut(active) else {
            return Reservation::Full;
        };
        let Some(slot) = self.buffers.get(active).and_then(|b| b.get(*cursor)) else {
            return Reservation::Full;
        };

        let guard = slot.lock();
        *cursor = cursor.saturating_add(1);
        drop(selection);

        Reservation::Reserved(guard)
    }

    /// Hand the active buffer to the flusher and activate the other one
    ///
    /// With `close` set, the buffer stops accepting reservations in the same
    /// critical section, so nothing can be reserved after the final epoch.
    /// Returns `None` if the buffer was already closed.
    pub(crate) fn swap(&self, close: bool) -> Option<Epoch> {
        let mut selection = self.selection.lock();
        if !selection.open {
            return None;
        }

        let flushing = selection.active;
        let active = flushing ^ 1;
        let count = selection.cursors.get(flushing).copied().unwrap_or(0);

        selection.active = active;
        if let Some(cursor) = selection.cursors.get_mut(active) {
            *cursor = 0;
        }
        if close {
            selection.open = false;
        }

        Some(Epoch {
            index: flushing,
            count,
        })
    }

    /// Take every record reserved during `epoch`, in reservation order
    ///
    /// Slots are emptied as they are read, releasing owned string arguments.
    /// Must not run concurrently with another drain or with a later swap.
    pub(crate) fn drain(&self, epoch: Epoch) -> impl Iterator<Item = EventRecord> + '_ {
        self.buffers
            .get(epoch.index)
            .and_then(|buffer| buffer.get(..epoch.count))
            .unwrap_or_default()
            .iter()
            .filter_map(|slot| slot.lock().take())
    }

    /// Records reserved in the active buffer so far
    pub(crate) fn pending(&self) -> usize {
        let selection = self.selection.lock();
        selection
            .cursors
            .get(selection.active)
            .copied()
            .unwrap_or(0)
    }

    /// Returns true until the buffer is closed
    pub(crate) fn is_open(&self) -> bool {
        self.selection.lock().open
    }
}

impl core::fmt::Debug for DualBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let selection = self.selection.lock();
        f.debug_struct("DualBuffer")
            .field("capacity", &self.capacity)
            .field("active", &selection.active)
            .field("cursors", &selection.cursors)
            .field("open", &selection.open)
            .finish()
    }
}

fn allocate(capacity: usize) -> Result<Box<[Slot]>, TracingError> {
    let mut slots: Vec<Slot> = Vec::new();
    slots.try_reserve_exact(capacity).map_err(|e| {
        TracingError::exhausted(format!("cannot allocate {capacity} trace slots: {e}"))
    })?;
    slots.resize_with(capacity, || Mutex::new(None));
    Ok(slots.into_boxed_slice())
}
