use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Per-logical-action idempotence guard: a double-click must not issue two
/// competing submissions for the same action. Different actions carry their
/// own flags and may be in flight concurrently.
#[derive(Clone, Default)]
pub struct InFlightFlag {
    busy: Arc<AtomicBool>,
}

impl InFlightFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag. Returns `None` while a previous claim is still held;
    /// the permit releases on drop.
    pub fn try_begin(&self) -> Option<InFlightPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlightPermit {
                busy: self.busy.clone(),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

pub struct InFlightPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}
