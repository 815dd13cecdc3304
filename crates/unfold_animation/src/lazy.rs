//! Lazy mount lifecycle
//!
//! Decides whether an item's content exists at all. With `lazy_mount` the
//! content is created on first open and kept; with `unmount_on_close` it is
//! destroyed again once a close has been followed by `unmount_delay`, and
//! [`LazyMount::is_unmounting`] covers that window so the renderer can play
//! an exit animation first.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scheduler::{SchedulerHandle, TaskId};

/// Mount/unmount policy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LazyMountConfig {
    /// Don't create content until first opened
    pub lazy_mount: bool,
    /// Destroy content after it closes
    pub unmount_on_close: bool,
    /// Grace period before a closed item is unmounted
    #[serde(with = "crate::serde_ms")]
    pub unmount_delay: Duration,
}

impl LazyMountConfig {
    pub const DEFAULT_UNMOUNT_DELAY: Duration = Duration::from_millis(300);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn lazy(mut self) -> Self {
        self.lazy_mount = true;
        self
    }

    pub fn unmount_on_close(mut self) -> Self {
        self.unmount_on_close = true;
        self
    }

    pub fn with_unmount_delay(mut self, delay: Duration) -> Self {
        self.unmount_delay = delay;
        self
    }
}

impl Default for LazyMountConfig {
    fn default() -> Self {
        Self {
            lazy_mount: false,
            unmount_on_close: false,
            unmount_delay: Self::DEFAULT_UNMOUNT_DELAY,
        }
    }
}

struct LazyState {
    is_open: bool,
    /// Monotonic
    has_been_opened: bool,
    unmounting: bool,
    forced: Option<bool>,
    timer: Option<TaskId>,
    generation: u64,
}

fn lock(state: &Mutex<LazyState>) -> MutexGuard<'_, LazyState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-item mount decision
pub struct LazyMount {
    state: Arc<Mutex<LazyState>>,
    handle: SchedulerHandle,
    config: LazyMountConfig,
}

impl LazyMount {
    pub fn new(is_open: bool, handle: SchedulerHandle, config: LazyMountConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(LazyState {
                is_open,
                has_been_opened: is_open,
                unmounting: false,
                forced: None,
                timer: None,
                generation: 0,
            })),
            handle,
            config,
        }
    }

    pub fn config(&self) -> &LazyMountConfig {
        &self.config
    }

    /// Feed the current open flag
    pub fn set_open(&self, open: bool) {
        let mut state = lock(&self.state);
        if state.is_open == open {
            return;
        }
        state.is_open = open;
        self.cancel_timer(&mut state);

        if open {
            state.has_been_opened = true;
            state.unmounting = false;
            tracing::debug!("LazyMount: opened, mounting");
            return;
        }

        if !self.config.unmount_on_close || self.config.unmount_delay.is_zero() {
            return;
        }

        state.unmounting = true;
        let generation = state.generation;
        let weak = Arc::downgrade(&self.state);
        let timer = self.handle.set_timeout(self.config.unmount_delay, move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let mut state = lock(&state);
            if state.generation == generation {
                state.unmounting = false;
                state.timer = None;
                tracing::debug!("LazyMount: unmount delay elapsed");
            }
        });

        match timer {
            Some(timer) => state.timer = Some(timer),
            None => state.unmounting = false,
        }
    }

    /// Whether the content should exist in the tree
    pub fn should_mount(&self) -> bool {
        let state = lock(&self.state);
        if let Some(forced) = state.forced {
            return forced;
        }
        if state.is_open || state.unmounting {
            return true;
        }
        if self.config.unmount_on_close {
            return false;
        }
        !self.config.lazy_mount || state.has_been_opened
    }

    /// Closed but still inside the unmount delay
    pub fn is_unmounting(&self) -> bool {
        lock(&self.state).unmounting
    }

    pub fn has_been_opened(&self) -> bool {
        lock(&self.state).has_been_opened
    }

    /// Keep the content mounted until [`LazyMount::clear_force`]
    pub fn force_mount(&self) {
        self.force(true);
    }

    /// Keep the content unmounted until [`LazyMount::clear_force`]
    pub fn force_unmount(&self) {
        self.force(false);
    }

    /// Return to the derived decision
    pub fn clear_force(&self) {
        lock(&self.state).forced = None;
    }

    pub fn is_forced(&self) -> Option<bool> {
        lock(&self.state).forced
    }

    /// Cancel the unmount timer; a pending unmount completes now
    pub fn dispose(&self) {
        let mut state = lock(&self.state);
        self.cancel_timer(&mut state);
        state.unmounting = false;
    }

    fn force(&self, mounted: bool) {
        let mut state = lock(&self.state);
        self.cancel_timer(&mut state);
        state.unmounting = false;
        state.forced = Some(mounted);
        tracing::debug!("LazyMount: forced mounted={}", mounted);
    }

    fn cancel_timer(&self, state: &mut LazyState) {
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            self.handle.cancel(timer);
        }
    }
}

impl Drop for LazyMount {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for LazyMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("LazyMount")
            .field("is_open", &state.is_open)
            .field("has_been_opened", &state.has_been_opened)
            .field("unmounting", &state.unmounting)
            .field("forced", &state.forced)
            .field("config", &self.config)
            .finish()
    }
}
