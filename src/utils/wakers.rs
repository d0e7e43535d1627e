use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Wake, Waker};

use fixedbitset::FixedBitSet;

/// Tracks which slots have been woken and should be polled again.
#[derive(Debug)]
pub(crate) struct Readiness {
    ready_count: usize,
    ready: FixedBitSet,
    parent_waker: Option<Waker>,
}

impl Readiness {
    /// Create a new instance where every slot starts out ready.
    pub(crate) fn new(len: usize) -> Self {
        let mut ready = FixedBitSet::with_capacity(len);
        ready.set_range(.., true);
        Self {
            ready_count: len,
            ready,
            parent_waker: None,
        }
    }

    /// Mark a slot as ready.
    ///
    /// Returns the previous ready state of the slot.
    pub(crate) fn set_ready(&mut self, index: usize) -> bool {
        if self.ready[index] {
            true
        } else {
            self.ready_count += 1;
            self.ready.insert(index);
            false
        }
    }

    /// Mark a slot as not ready.
    ///
    /// Returns whether the slot was ready.
    pub(crate) fn clear_ready(&mut self, index: usize) -> bool {
        if self.ready[index] {
            self.ready_count -= 1;
            self.ready.set(index, false);
            true
        } else {
            false
        }
    }

    /// Returns `true` if any of the slots are ready.
    pub(crate) fn any_ready(&self) -> bool {
        self.ready_count > 0
    }

    /// Set the parent `Waker`. This needs to be called at the start of every
    /// `poll` function.
    pub(crate) fn set_waker(&mut self, parent: &Waker) {
        match &mut self.parent_waker {
            Some(prev) => prev.clone_from(parent),
            None => self.parent_waker = Some(parent.clone()),
        }
    }

    /// Grow to `len` slots. New slots are marked ready; shrinking is a no-op.
    pub(crate) fn grow(&mut self, len: usize) {
        let old_len = self.ready.len();
        if len > old_len {
            self.ready.grow(len);
            self.ready.set_range(old_len..len, true);
            self.ready_count += len - old_len;
        }
    }
}

/// A slot waker which records its index before waking the parent task.
#[derive(Debug)]
struct SlotWaker {
    index: usize,
    readiness: Arc<Mutex<Readiness>>,
}

impl Wake for SlotWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref()
    }

    fn wake_by_ref(self: &Arc<Self>) {
        let mut readiness = lock(&self.readiness);
        if !readiness.set_ready(self.index) {
            if let Some(parent) = readiness.parent_waker.as_ref() {
                parent.wake_by_ref();
            }
        }
    }
}

/// One waker per slot, all sharing a single `Readiness`.
#[derive(Debug)]
pub(crate) struct WakerVec {
    wakers: Vec<Waker>,
    readiness: Arc<Mutex<Readiness>>,
}

impl WakerVec {
    pub(crate) fn new(len: usize) -> Self {
        let readiness = Arc::new(Mutex::new(Readiness::new(len)));
        let wakers = (0..len)
            .map(|index| slot_waker(index, &readiness))
            .collect();
        Self { wakers, readiness }
    }

    pub(crate) fn len(&self) -> usize {
        self.wakers.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Waker> {
        self.wakers.get(index)
    }

    /// Lock the shared `Readiness`.
    pub(crate) fn readiness(&self) -> MutexGuard<'_, Readiness> {
        lock(&self.readiness)
    }

    /// Make sure there is a waker for every index below `len`.
    pub(crate) fn grow(&mut self, len: usize) {
        let start = self.wakers.len();
        if len <= start {
            return;
        }
        let readiness = &self.readiness;
        self.wakers
            .extend((start..len).map(|index| slot_waker(index, readiness)));
        lock(readiness).grow(len);
    }
}

fn slot_waker(index: usize, readiness: &Arc<Mutex<Readiness>>) -> Waker {
    Arc::new(SlotWaker {
        index,
        readiness: readiness.clone(),
    })
    .into()
}

// A panic while holding the lock cannot leave the bitset half-updated.
fn lock(readiness: &Mutex<Readiness>) -> MutexGuard<'_, Readiness> {
    readiness.lock().unwrap_or_else(PoisonError::into_inner)
}
