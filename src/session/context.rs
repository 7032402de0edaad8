//! Caller-side execution context.
//!
//! The worker never runs caller callbacks itself. It posts them to the
//! caller's [`CallerContext`], and they run when the caller drains it,
//! on the caller's own thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

type Task = Box<dyn FnOnce() + Send>;

/// Queue of results waiting to run on the caller's thread.
///
/// Dropping the context detaches every [`ContextHandle`] created from it;
/// sessions bound to a detached handle refuse new commands.
pub struct CallerContext {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
    attached: Arc<AtomicBool>,
}

impl CallerContext {
    /// Creates an empty, attached context.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            attached: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Handle through which results are posted back to this context.
    pub fn handle(&self) -> ContextHandle {
        ContextHandle {
            sender: self.sender.clone(),
            attached: Arc::clone(&self.attached),
        }
    }

    /// Runs every result already posted. Returns how many ran.
    pub fn dispatch_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Waits up to `timeout` for one result and runs it.
    ///
    /// Returns false if nothing arrived in time.
    pub fn dispatch_timeout(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => {
                task();
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}

impl Default for CallerContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CallerContext {
    fn drop(&mut self) {
        self.attached.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for CallerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallerContext")
            .field("attached", &self.attached.load(Ordering::Acquire))
            .finish()
    }
}

/// Cloneable sender half of a [`CallerContext`].
#[derive(Clone)]
pub struct ContextHandle {
    sender: Sender<Task>,
    attached: Arc<AtomicBool>,
}

impl ContextHandle {
    /// Returns true while the owning context is alive.
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Queues `task` to run on the caller's thread.
    ///
    /// Returns false if the context is gone and the task was discarded.
    pub(crate) fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.is_attached() && self.sender.send(Box::new(task)).is_ok()
    }
}

impl std::fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextHandle")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_tasks_run_only_when_dispatched() {
        let context = CallerContext::new();
        let handle = context.handle();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&counter);
        let worker = std::thread::spawn(move || {
            handle.post(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
        });
        assert!(worker.join().unwrap());
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        assert_eq!(context.dispatch_pending(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_context_detaches_handles() {
        let context = CallerContext::new();
        let handle = context.handle();
        assert!(handle.is_attached());

        drop(context);
        assert!(!handle.is_attached());
        assert!(!handle.post(|| {}));
    }

    #[test]
    fn test_dispatch_timeout_without_results() {
        let context = CallerContext::new();
        assert!(!context.dispatch_timeout(Duration::from_millis(10)));
    }
}
