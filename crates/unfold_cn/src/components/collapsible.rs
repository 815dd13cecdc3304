//! Collapsible component for a single expandable section
//!
//! The one-item sibling of the accordion: a trigger that shows and hides
//! its content with the same height transition.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use unfold_cn::prelude::*;
//!
//! let scheduler = TaskScheduler::new();
//! let mut details = cn::collapsible().build(scheduler.handle(), || 64.0);
//!
//! assert!(!details.should_render());
//! details.toggle();
//! assert!(details.should_render());
//! assert!(details.is_animating());
//!
//! scheduler.advance(Duration::from_millis(300));
//! assert!(details.is_open());
//! assert!(!details.is_animating());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use unfold_animation::{
    ContentMeasure, Easing, HeightStyle, HeightTransition, SchedulerHandle, TransitionConfig,
    TransitionPhase,
};

use crate::components::accordion::OpenChangeCallback;
use crate::key::InstanceKey;

/// Where the open flag lives, fixed at build time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OpenSource {
    Owned,
    Delegated,
}

/// Builder for creating Collapsible components with fluent API
pub struct CollapsibleBuilder {
    instance_key: InstanceKey,
    open: bool,
    source: OpenSource,
    disabled: bool,
    force_mount: bool,
    transition: TransitionConfig,
    on_open_change: Option<OpenChangeCallback>,
    on_animation_start: Option<Box<dyn Fn(TransitionPhase) + Send + Sync>>,
    on_animation_end: Option<Box<dyn Fn(TransitionPhase) + Send + Sync>>,
}

impl CollapsibleBuilder {
    #[track_caller]
    pub fn new() -> Self {
        Self {
            instance_key: InstanceKey::new("collapsible"),
            open: false,
            source: OpenSource::Owned,
            disabled: false,
            force_mount: false,
            transition: TransitionConfig::default(),
            on_open_change: None,
            on_animation_start: None,
            on_animation_end: None,
        }
    }

    /// Use a fixed key for trigger and content ids
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.instance_key = InstanceKey::explicit(key);
        self
    }

    /// Start open (uncontrolled)
    pub fn default_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    /// Hand ownership of the open flag to the caller
    ///
    /// Requests arrive through [`on_open_change`](Self::on_open_change) and
    /// are applied with [`Collapsible::sync_open`].
    pub fn controlled(mut self, open: bool) -> Self {
        self.open = open;
        self.source = OpenSource::Delegated;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Render the content even while closed
    pub fn force_mount(mut self) -> Self {
        self.force_mount = true;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.transition.duration = duration;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.transition.easing = easing;
        self
    }

    pub fn on_open_change<F>(mut self, f: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.on_open_change = Some(Arc::new(f));
        self
    }

    pub fn on_animation_start<F>(mut self, f: F) -> Self
    where
        F: Fn(TransitionPhase) + Send + Sync + 'static,
    {
        self.on_animation_start = Some(Box::new(f));
        self
    }

    pub fn on_animation_end<F>(mut self, f: F) -> Self
    where
        F: Fn(TransitionPhase) + Send + Sync + 'static,
    {
        self.on_animation_end = Some(Box::new(f));
        self
    }

    /// Build the collapsible on `scheduler`, measuring content with `measure`
    pub fn build<M>(self, scheduler: SchedulerHandle, measure: M) -> Collapsible
    where
        M: ContentMeasure + 'static,
    {
        let mut height = HeightTransition::new(self.open, measure, scheduler, self.transition);
        if let Some(f) = self.on_animation_start {
            height = height.on_animation_start(f);
        }
        if let Some(f) = self.on_animation_end {
            height = height.on_animation_end(f);
        }

        Collapsible {
            instance_key: self.instance_key,
            open: self.open,
            source: self.source,
            disabled: self.disabled,
            force_mount: self.force_mount,
            on_open_change: self.on_open_change,
            height,
        }
    }
}

impl Default for CollapsibleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapsible component - a single disclosure
pub struct Collapsible {
    instance_key: InstanceKey,
    open: bool,
    source: OpenSource,
    disabled: bool,
    force_mount: bool,
    on_open_change: Option<OpenChangeCallback>,
    height: HeightTransition,
}

impl Collapsible {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_controlled(&self) -> bool {
        self.source == OpenSource::Delegated
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Trigger activation
    pub fn toggle(&mut self) -> bool {
        self.set_open(!self.open)
    }

    /// Request a new open flag
    ///
    /// Ignored while disabled. A controlled collapsible only reports the
    /// request. Returns whether the flag changed.
    pub fn set_open(&mut self, open: bool) -> bool {
        if self.disabled || self.open == open {
            return false;
        }

        if let Some(on_open_change) = &self.on_open_change {
            on_open_change(open);
        }

        match self.source {
            OpenSource::Owned => self.apply(open),
            OpenSource::Delegated => false,
        }
    }

    /// Apply the flag held by the controlling owner
    pub fn sync_open(&mut self, open: bool) -> bool {
        if self.source != OpenSource::Delegated {
            tracing::debug!(
                "Collapsible {}: ignoring controlled flag",
                self.instance_key
            );
            return false;
        }
        if self.open == open {
            return false;
        }
        self.apply(open)
    }

    /// Whether the content exists in the tree
    pub fn should_render(&self) -> bool {
        self.open || self.force_mount || self.height.is_animating()
    }

    pub fn is_animating(&self) -> bool {
        self.height.is_animating()
    }

    pub fn phase(&self) -> TransitionPhase {
        self.height.phase()
    }

    pub fn style(&self) -> HeightStyle {
        self.height.style()
    }

    /// `"open"` or `"closed"`
    pub fn data_state(&self) -> &'static str {
        if self.open {
            "open"
        } else {
            "closed"
        }
    }

    pub fn trigger_id(&self) -> String {
        format!("{}-trigger", self.instance_key)
    }

    pub fn content_id(&self) -> String {
        format!("{}-content", self.instance_key)
    }

    pub fn recalculate(&self) -> bool {
        self.height.recalculate()
    }

    /// Window resize; re-measures while open
    pub fn on_resize(&self) {
        self.height.on_resize();
    }

    fn apply(&mut self, open: bool) -> bool {
        self.open = open;
        self.height.set_open(open);
        tracing::debug!("Collapsible {}: open={}", self.instance_key, open);
        true
    }
}

impl fmt::Debug for Collapsible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collapsible")
            .field("instance_key", &self.instance_key)
            .field("open", &self.open)
            .field("source", &self.source)
            .field("disabled", &self.disabled)
            .field("height", &self.height)
            .finish()
    }
}

/// Create a collapsible builder
#[track_caller]
pub fn collapsible() -> CollapsibleBuilder {
    CollapsibleBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use unfold_animation::{Height, TaskScheduler};

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_uncontrolled_toggle() {
        let scheduler = TaskScheduler::new();
        let mut collapsible = collapsible().build(scheduler.handle(), || 80.0);

        assert!(collapsible.toggle());
        assert!(collapsible.is_open());
        assert_eq!(collapsible.style().height, Height::Px(80.0));

        scheduler.advance(ms(300));
        assert_eq!(collapsible.phase(), TransitionPhase::Open);
        assert_eq!(collapsible.data_state(), "open");
    }

    #[test]
    fn test_renders_while_closing() {
        let scheduler = TaskScheduler::new();
        let mut collapsible = collapsible()
            .default_open(true)
            .build(scheduler.handle(), || 80.0);

        collapsible.toggle();
        assert!(!collapsible.is_open());
        assert!(collapsible.should_render());

        scheduler.advance(ms(300));
        assert!(!collapsible.should_render());
    }

    #[test]
    fn test_force_mount_renders_closed() {
        let scheduler = TaskScheduler::new();
        let collapsible = collapsible()
            .force_mount()
            .build(scheduler.handle(), || 1.0);
        assert!(collapsible.should_render());
    }

    #[test]
    fn test_disabled_ignores_requests() {
        let scheduler = TaskScheduler::new();
        let mut collapsible = collapsible()
            .disabled(true)
            .build(scheduler.handle(), || 1.0);

        assert!(!collapsible.toggle());
        assert!(!collapsible.set_open(true));
        assert!(!collapsible.is_open());

        collapsible.set_disabled(false);
        assert!(collapsible.toggle());
    }

    #[test]
    fn test_controlled_reports_then_syncs() {
        let scheduler = TaskScheduler::new();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let sink = requests.clone();
        let mut collapsible = collapsible()
            .controlled(false)
            .on_open_change(move |open| sink.lock().unwrap().push(open))
            .build(scheduler.handle(), || 1.0);

        assert!(!collapsible.toggle());
        assert!(!collapsible.is_open());
        assert_eq!(requests.lock().unwrap().as_slice(), &[true]);

        assert!(collapsible.sync_open(true));
        assert!(collapsible.is_open());
        assert!(collapsible.is_animating());
    }

    #[test]
    fn test_uncontrolled_ignores_sync() {
        let scheduler = TaskScheduler::new();
        let mut collapsible = collapsible().build(scheduler.handle(), || 1.0);
        assert!(!collapsible.sync_open(true));
        assert!(!collapsible.is_open());
    }

    #[test]
    fn test_ids() {
        let scheduler = TaskScheduler::new();
        let collapsible = collapsible()
            .key("details")
            .build(scheduler.handle(), || 1.0);
        assert_eq!(collapsible.trigger_id(), "details-trigger");
        assert_eq!(collapsible.content_id(), "details-content");
    }
}
