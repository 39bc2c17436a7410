use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::coords::ViewportSize;

/// Consistent copy of the cross-thread state taken at the top of an iteration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Snapshot {
    pub running: bool,
    pub viewport: ViewportSize,
}

/// Run flag and viewport, shared by the control thread and the render thread.
///
/// Both fields sit behind one lock so a reader never sees a width from one
/// resize paired with a height from another. The lock is held only to copy or
/// assign; never across a graphics call.
#[derive(Debug)]
pub(crate) struct SharedState {
    inner: Mutex<Snapshot>,
    changed: Condvar,
}

impl SharedState {
    pub fn new(viewport: ViewportSize) -> Self {
        Self {
            inner: Mutex::new(Snapshot {
                running: true,
                viewport,
            }),
            changed: Condvar::new(),
        }
    }

    // Poisoning carries no meaning for two plain scalars.
    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Snapshot {
        *self.lock()
    }

    pub fn set_viewport(&self, viewport: ViewportSize) {
        self.lock().viewport = viewport;
        self.changed.notify_all();
    }

    /// Clears the run flag. There is no way to set it again.
    pub fn request_stop(&self) {
        self.lock().running = false;
        self.changed.notify_all();
    }

    /// Blocks until the state differs from `seen` or `timeout` elapses.
    pub fn wait_for_change(&self, seen: Snapshot, timeout: Duration) -> Snapshot {
        let guard = self.lock();
        let (guard, _) = self
            .changed
            .wait_timeout_while(guard, timeout, |current| *current == seen)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn stop_is_sticky() {
        let s = SharedState::new(ViewportSize::new(1, 1));
        assert!(s.snapshot().running);
        s.request_stop();
        s.set_viewport(ViewportSize::new(2, 2));
        let snap = s.snapshot();
        assert!(!snap.running);
        assert_eq!(snap.viewport, ViewportSize::new(2, 2));
    }

    #[test]
    fn concurrent_writers_never_produce_torn_pairs() {
        let s = Arc::new(SharedState::new(ViewportSize::new(0, 1)));

        let writers: Vec<_> = (0..4u32)
            .map(|t| {
                let s = Arc::clone(&s);
                thread::spawn(move || {
                    for i in 0..2_000u32 {
                        let w = t * 10_000 + i;
                        s.set_viewport(ViewportSize::new(w, 2 * w + 1));
                    }
                })
            })
            .collect();

        for _ in 0..10_000 {
            let vp = s.snapshot().viewport;
            assert_eq!(vp.height, 2 * vp.width + 1, "torn viewport {vp:?}");
        }

        for w in writers {
            w.join().unwrap();
        }
    }

    #[test]
    fn wait_for_change_times_out_when_nothing_changes() {
        let s = SharedState::new(ViewportSize::new(0, 0));
        let seen = s.snapshot();
        let started = std::time::Instant::now();
        assert_eq!(s.wait_for_change(seen, Duration::from_millis(20)), seen);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn wait_for_change_wakes_on_resize_and_stop() {
        let s = Arc::new(SharedState::new(ViewportSize::new(0, 0)));
        let seen = s.snapshot();

        let waiter = {
            let s = Arc::clone(&s);
            thread::spawn(move || s.wait_for_change(seen, Duration::from_secs(10)))
        };
        s.set_viewport(ViewportSize::new(400, 300));
        assert_eq!(waiter.join().unwrap().viewport, ViewportSize::new(400, 300));

        let seen = s.snapshot();
        let waiter = {
            let s = Arc::clone(&s);
            thread::spawn(move || s.wait_for_change(seen, Duration::from_secs(10)))
        };
        s.request_stop();
        assert!(!waiter.join().unwrap().running);
    }
}
