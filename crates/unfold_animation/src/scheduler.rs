//! Task scheduler
//!
//! Stands in for the browser's `setTimeout` / `requestAnimationFrame` pair.
//! Two kinds of one-shot tasks are queued:
//!
//! - **Timeouts** fire once the scheduler clock reaches their due time
//! - **Frames** fire on the next call to [`TaskScheduler::run_frame`]
//!
//! The clock is virtual: it only moves on [`TaskScheduler::advance`] (or
//! [`TaskScheduler::tick`], which advances by wall-clock time and then runs
//! a frame). Tests drive it deterministically; hosts call `tick()` once
//! per rendered frame.
//!
//! Components hold a weak [`SchedulerHandle`] and cancel their tasks on
//! teardown. Callbacks run with the scheduler unlocked, so they are free to
//! schedule or cancel further work.
//!
//! ```
//! use std::time::Duration;
//! use unfold_animation::TaskScheduler;
//!
//! let scheduler = TaskScheduler::new();
//! let handle = scheduler.handle();
//! handle.set_timeout(Duration::from_millis(300), || println!("done"));
//!
//! assert_eq!(scheduler.advance(Duration::from_millis(299)), 0);
//! assert_eq!(scheduler.advance(Duration::from_millis(1)), 1);
//! ```

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

new_key_type! {
    /// Handle to a scheduled task
    pub struct TaskId;
}

/// One-shot task body
pub type TaskCallback = Box<dyn FnOnce() + Send>;

/// When a task fires
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// At a point on the scheduler clock
    Timeout { due: Duration },
    /// On the next animation frame
    Frame,
}

struct Task {
    kind: TaskKind,
    /// Scheduling order, breaks ties between equal due times
    seq: u64,
    callback: TaskCallback,
}

/// Internal state of the task scheduler
struct SchedulerInner {
    tasks: SlotMap<TaskId, Task>,
    now: Duration,
    next_seq: u64,
    last_tick: Instant,
}

fn lock(inner: &Mutex<SchedulerInner>) -> MutexGuard<'_, SchedulerInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of all pending timeouts and frame callbacks
///
/// Dropping the scheduler drops every pending task; handles then turn
/// into no-ops.
pub struct TaskScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                tasks: SlotMap::with_key(),
                now: Duration::ZERO,
                next_seq: 0,
                last_tick: Instant::now(),
            })),
        }
    }

    /// Get a handle to this scheduler for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Current scheduler clock
    pub fn now(&self) -> Duration {
        lock(&self.inner).now
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.inner).tasks.len()
    }

    pub fn has_pending(&self) -> bool {
        !lock(&self.inner).tasks.is_empty()
    }

    pub fn has_pending_frames(&self) -> bool {
        lock(&self.inner)
            .tasks
            .values()
            .any(|task| task.kind == TaskKind::Frame)
    }

    /// Move the clock forward by `dt`, firing every timeout that falls due
    ///
    /// Timeouts fire in due-time order; a timeout scheduled by a callback
    /// that falls inside the window fires too. Returns the number fired.
    pub fn advance(&self, dt: Duration) -> usize {
        let target = lock(&self.inner).now + dt;
        let mut fired = 0;

        loop {
            let next = {
                let mut inner = lock(&self.inner);
                let due = inner
                    .tasks
                    .iter()
                    .filter_map(|(id, task)| match task.kind {
                        TaskKind::Timeout { due } if due <= target => Some((due, task.seq, id)),
                        _ => None,
                    })
                    .min_by_key(|&(due, seq, _)| (due, seq));

                match due {
                    Some((due, _, id)) => {
                        inner.now = inner.now.max(due);
                        inner.tasks.remove(id)
                    }
                    None => {
                        inner.now = target;
                        None
                    }
                }
            };

            match next {
                Some(task) => {
                    (task.callback)();
                    fired += 1;
                }
                None => break,
            }
        }

        fired
    }

    /// Run the frame callbacks queued before this call
    ///
    /// Frames requested while running wait for the next frame. Returns the
    /// number fired.
    pub fn run_frame(&self) -> usize {
        let mut queued: SmallVec<[(u64, TaskId); 8]> = lock(&self.inner)
            .tasks
            .iter()
            .filter(|(_, task)| task.kind == TaskKind::Frame)
            .map(|(id, task)| (task.seq, id))
            .collect();
        queued.sort_unstable_by_key(|&(seq, _)| seq);

        let mut fired = 0;
        for (_, id) in queued {
            // An earlier callback may have cancelled this one
            let task = lock(&self.inner).tasks.remove(id);
            if let Some(task) = task {
                (task.callback)();
                fired += 1;
            }
        }

        fired
    }

    /// Advance by the wall-clock time since the last tick, then run a frame
    pub fn tick(&self) -> usize {
        let dt = {
            let mut inner = lock(&self.inner);
            let now = Instant::now();
            let dt = now - inner.last_tick;
            inner.last_tick = now;
            dt
        };

        self.advance(dt) + self.run_frame()
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak handle to the task scheduler
///
/// This is passed to components that need to schedule work.
/// It won't prevent the scheduler from being dropped.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Run `f` once `delay` has elapsed on the scheduler clock
    pub fn set_timeout<F>(&self, delay: Duration, f: F) -> Option<TaskId>
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule(Some(delay), Box::new(f))
    }

    /// Run `f` on the next animation frame
    pub fn request_frame<F>(&self, f: F) -> Option<TaskId>
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule(None, Box::new(f))
    }

    /// Cancel a pending task. Returns `true` if it was still pending.
    pub fn cancel(&self, id: TaskId) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        // Drop the task outside the lock; its captures may reach back in
        let removed = lock(&inner).tasks.remove(id);
        removed.is_some()
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let pending = lock(&inner).tasks.contains_key(id);
        pending
    }

    /// Scheduler clock, or `None` if the scheduler is gone
    pub fn now(&self) -> Option<Duration> {
        let inner = self.inner.upgrade()?;
        let now = lock(&inner).now;
        Some(now)
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    fn schedule(&self, delay: Option<Duration>, callback: TaskCallback) -> Option<TaskId> {
        let inner = self.inner.upgrade()?;
        let mut guard = lock(&inner);

        let kind = match delay {
            Some(delay) => TaskKind::Timeout {
                due: guard.now + delay,
            },
            None => TaskKind::Frame,
        };
        let seq = guard.next_seq;
        guard.next_seq += 1;

        let id = guard.tasks.insert(Task {
            kind,
            seq,
            callback,
        });
        tracing::trace!("TaskScheduler: scheduled {:?} as {:?}", kind, id);
        Some(id)
    }
}
