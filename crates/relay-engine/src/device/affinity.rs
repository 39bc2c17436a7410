use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use super::ContextError;

#[derive(Debug)]
struct AffinityState {
    owner: ThreadId,
    current: bool,
    valid: bool,
}

/// Thread-affinity record for a single-threaded graphics context.
///
/// Invariants:
/// - only `owner` may make the context current
/// - ownership moves only while the context is not current
///
/// The context starts out owned by, and current on, the creating thread.
#[derive(Debug)]
pub struct ContextAffinity {
    state: Mutex<AffinityState>,
}

impl ContextAffinity {
    /// Creates a record owned by, and current on, the calling thread.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AffinityState {
                owner: thread::current().id(),
                current: true,
                valid: true,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AffinityState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn owner(&self) -> ThreadId {
        self.lock().owner
    }

    pub fn is_current(&self) -> bool {
        self.lock().current
    }

    pub fn is_valid(&self) -> bool {
        self.lock().valid
    }

    /// Binds the context to the calling thread. Idempotent for the owner.
    pub fn make_current(&self) -> Result<(), ContextError> {
        let caller = thread::current().id();
        let mut st = self.lock();
        if !st.valid {
            return Err(ContextError::Invalid);
        }
        if st.owner != caller {
            return Err(ContextError::WrongThread {
                owner: st.owner,
                caller,
            });
        }
        st.current = true;
        Ok(())
    }

    /// Fails unless the context is valid, owned by and current on the calling thread.
    pub fn check_current(&self) -> Result<(), ContextError> {
        let caller = thread::current().id();
        let st = self.lock();
        if !st.valid {
            return Err(ContextError::Invalid);
        }
        if st.owner != caller {
            return Err(ContextError::WrongThread {
                owner: st.owner,
                caller,
            });
        }
        if !st.current {
            return Err(ContextError::NotCurrent);
        }
        Ok(())
    }

    /// Unbinds the context. Calls from threads other than the owner are ignored.
    pub fn done_current(&self) {
        let caller = thread::current().id();
        let mut st = self.lock();
        if st.owner == caller {
            st.current = false;
        }
    }

    /// Rebinds ownership to `thread`.
    pub fn move_to(&self, thread: ThreadId) -> Result<(), ContextError> {
        let mut st = self.lock();
        if !st.valid {
            return Err(ContextError::Invalid);
        }
        if st.current {
            return Err(ContextError::StillCurrent);
        }
        st.owner = thread;
        Ok(())
    }

    /// Marks the context unusable; every later acquire fails.
    pub fn invalidate(&self) {
        let mut st = self.lock();
        st.valid = false;
        st.current = false;
    }
}

impl Default for ContextAffinity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_current_on_creating_thread() {
        let a = ContextAffinity::new();
        assert_eq!(a.owner(), thread::current().id());
        assert!(a.is_current());
        assert!(a.make_current().is_ok());
    }

    #[test]
    fn transfer_requires_release_first() {
        let a = ContextAffinity::new();
        let other = thread::spawn(|| ()).thread().id();
        assert_eq!(a.move_to(other), Err(ContextError::StillCurrent));

        a.done_current();
        assert!(a.move_to(other).is_ok());
        assert_eq!(a.owner(), other);
    }

    #[test]
    fn non_owner_cannot_make_current() {
        let a = Arc::new(ContextAffinity::new());
        let worker = {
            let a = Arc::clone(&a);
            thread::spawn(move || a.make_current())
        };
        let result = worker.join().unwrap_or(Err(ContextError::Invalid));
        assert!(matches!(result, Err(ContextError::WrongThread { .. })));
    }

    #[test]
    fn handed_off_context_is_usable_on_the_target_thread_only() {
        let a = Arc::new(ContextAffinity::new());
        a.done_current();

        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let worker = {
            let a = Arc::clone(&a);
            thread::spawn(move || {
                rx.recv().ok();
                let first = a.make_current();
                a.done_current();
                first
            })
        };

        a.move_to(worker.thread().id()).unwrap();
        assert!(matches!(a.make_current(), Err(ContextError::WrongThread { .. })));

        tx.send(()).unwrap();
        assert_eq!(worker.join().unwrap(), Ok(()));
        assert!(!a.is_current());
    }

    #[test]
    fn check_current_requires_an_acquired_context() {
        let a = ContextAffinity::new();
        assert!(a.check_current().is_ok());
        a.done_current();
        assert_eq!(a.check_current(), Err(ContextError::NotCurrent));
        a.make_current().unwrap();
        assert!(a.check_current().is_ok());
    }

    #[test]
    fn done_current_from_non_owner_is_ignored() {
        let a = Arc::new(ContextAffinity::new());
        let a2 = Arc::clone(&a);
        thread::spawn(move || a2.done_current()).join().unwrap();
        assert!(a.is_current());
    }

    #[test]
    fn invalidated_context_rejects_everything() {
        let a = ContextAffinity::new();
        a.invalidate();
        assert_eq!(a.make_current(), Err(ContextError::Invalid));
        assert_eq!(a.move_to(thread::current().id()), Err(ContextError::Invalid));
        assert!(!a.is_valid());
    }
}
