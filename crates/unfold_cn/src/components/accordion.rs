//! Accordion component for expandable content sections
//!
//! A set of stacked disclosure items. Supports single-open (only one
//! section open at a time) or multi-open modes, controlled or
//! uncontrolled. The accordion owns no rendering: the host mounts items,
//! forwards clicks and key presses, and renders from [`ItemSnapshot`]s.
//!
//! Timing runs on the scheduler the accordion is built with.
//!
//! # Example - Single Open
//!
//! ```
//! use std::time::Duration;
//! use unfold_cn::prelude::*;
//!
//! let scheduler = TaskScheduler::new();
//! let mut faq = cn::accordion()
//!     .collapsible()
//!     .default_open("shipping")
//!     .build(scheduler.handle())
//!     .unwrap();
//!
//! faq.mount_item("shipping", ItemOptions::new(), || 96.0);
//! faq.mount_item("returns", ItemOptions::new(), || 120.0);
//!
//! faq.toggle("returns");
//! assert!(faq.is_open("returns"));
//! assert!(!faq.is_open("shipping"));
//!
//! scheduler.advance(Duration::from_millis(300));
//! let returns = faq.item("returns").unwrap();
//! assert_eq!(returns.data_state, "open");
//! assert!(!returns.is_animating);
//! ```
//!
//! # Multi-Open Mode
//!
//! ```ignore
//! cn::accordion()
//!     .multi_open()  // Allow multiple sections open at once
//!     .default_open("a")
//!     .default_open("b")
//!     .build(handle)?
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use unfold_animation::{
    ContentMeasure, Easing, HeightStyle, HeightTransition, LazyMount, LazyMountConfig,
    PhaseCallback, SchedulerHandle, TransitionConfig, TransitionPhase,
};
use unfold_core::{
    FocusNavigator, ItemCallback, ItemId, ItemRegistry, KeyOutcome, KeyboardEvent,
    NavigatorConfig, Orientation, Result, SelectionConfig, SelectionController, SelectionMode,
    SelectionValue, ValueCallback, ValueChange,
};

use crate::key::InstanceKey;

/// Accordion mode - single or multi open
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccordionMode {
    /// Only one section can be open at a time (default)
    #[default]
    Single,
    /// Multiple sections can be open simultaneously
    Multiple,
}

impl From<AccordionMode> for SelectionMode {
    fn from(mode: AccordionMode) -> Self {
        match mode {
            AccordionMode::Single => SelectionMode::Single,
            AccordionMode::Multiple => SelectionMode::Multiple,
        }
    }
}

/// Flat options record for an accordion
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccordionOptions {
    pub mode: AccordionMode,
    /// Single mode: allow closing the open item
    pub collapsible: bool,
    pub orientation: Orientation,
    /// Wrap keyboard focus past either end
    #[serde(rename = "loop")]
    pub loop_focus: bool,
    pub disabled: bool,
    /// Height transition length, in milliseconds when serialized
    #[serde(with = "unfold_animation::serde_ms")]
    pub duration: Duration,
    pub easing: Easing,
    pub lazy_mount: bool,
    pub unmount_on_close: bool,
    /// Defaults to `duration`
    #[serde(
        with = "unfold_animation::serde_ms::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub unmount_delay: Option<Duration>,
}

impl Default for AccordionOptions {
    fn default() -> Self {
        Self {
            mode: AccordionMode::Single,
            collapsible: false,
            orientation: Orientation::Vertical,
            loop_focus: false,
            disabled: false,
            duration: TransitionConfig::DEFAULT_DURATION,
            easing: Easing::default(),
            lazy_mount: false,
            unmount_on_close: false,
            unmount_delay: None,
        }
    }
}

impl AccordionOptions {
    pub fn selection_config(&self) -> SelectionConfig {
        SelectionConfig::new(self.mode.into())
            .collapsible(self.collapsible)
            .disabled(self.disabled)
    }

    pub fn navigator_config(&self) -> NavigatorConfig {
        NavigatorConfig {
            orientation: self.orientation,
            loop_focus: self.loop_focus,
            ..NavigatorConfig::default()
        }
    }

    pub fn transition_config(&self) -> TransitionConfig {
        TransitionConfig::new()
            .with_duration(self.duration)
            .with_easing(self.easing)
    }

    pub fn lazy_config(&self) -> LazyMountConfig {
        LazyMountConfig {
            lazy_mount: self.lazy_mount,
            unmount_on_close: self.unmount_on_close,
            unmount_delay: self.unmount_delay.unwrap_or(self.duration),
        }
    }
}

/// Callback receiving an item's new open flag
pub type OpenChangeCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Per-item options, replaceable by remounting the item
#[derive(Clone, Default)]
pub struct ItemOptions {
    pub disabled: bool,
    /// Render the content even while closed
    pub force_mount: bool,
    on_open_change: Option<OpenChangeCallback>,
    on_animation_start: Option<PhaseCallback>,
    on_animation_end: Option<PhaseCallback>,
}

impl ItemOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn force_mount(mut self, force_mount: bool) -> Self {
        self.force_mount = force_mount;
        self
    }

    /// Called whenever this item's open flag changes
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
        self.on_animation_start = Some(Arc::new(f));
        self
    }

    pub fn on_animation_end<F>(mut self, f: F) -> Self
    where
        F: Fn(TransitionPhase) + Send + Sync + 'static,
    {
        self.on_animation_end = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ItemOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemOptions")
            .field("disabled", &self.disabled)
            .field("force_mount", &self.force_mount)
            .finish_non_exhaustive()
    }
}

/// Everything a renderer needs to draw one item
#[derive(Clone, Debug, PartialEq)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub is_open: bool,
    /// Item or group disabled
    pub disabled: bool,
    /// `"open"` or `"closed"`
    pub data_state: &'static str,
    pub trigger_id: String,
    pub content_id: String,
    /// Whether the content exists in the tree
    pub should_render: bool,
    /// Closed, settled, and not force-mounted
    pub hidden: bool,
    pub is_unmounting: bool,
    pub is_animating: bool,
    pub style: HeightStyle,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runtime state for a mounted item
struct AccordionItemState {
    /// Shared with the transition hooks
    options: Arc<Mutex<ItemOptions>>,
    /// Last open flag pushed to the engines
    is_open: bool,
    height: HeightTransition,
    lazy: LazyMount,
}

/// Builder for creating Accordion components with fluent API
pub struct AccordionBuilder {
    instance_key: InstanceKey,
    options: AccordionOptions,
    default_open: Vec<ItemId>,
    controlled: Option<SelectionValue>,
    on_value_change: Option<ValueCallback>,
    on_open_start: Option<ItemCallback>,
    on_open_end: Option<ItemCallback>,
    on_close_start: Option<ItemCallback>,
    on_close_end: Option<ItemCallback>,
}

impl AccordionBuilder {
    /// Create a new accordion builder
    #[track_caller]
    pub fn new() -> Self {
        Self::from_options(AccordionOptions::default())
    }

    #[track_caller]
    pub fn from_options(options: AccordionOptions) -> Self {
        Self {
            instance_key: InstanceKey::new("accordion"),
            options,
            default_open: Vec::new(),
            controlled: None,
            on_value_change: None,
            on_open_start: None,
            on_open_end: None,
            on_close_start: None,
            on_close_end: None,
        }
    }

    /// Use a fixed key for trigger and content ids
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.instance_key = InstanceKey::explicit(key);
        self
    }

    /// Set to multi-open mode (multiple sections can be open at once)
    pub fn multi_open(mut self) -> Self {
        self.options.mode = AccordionMode::Multiple;
        self
    }

    /// Let the open section be closed again (single mode)
    pub fn collapsible(mut self) -> Self {
        self.options.collapsible = true;
        self
    }

    /// Add an initially open section (by key)
    ///
    /// In single mode the last one given wins.
    pub fn default_open(mut self, key: impl Into<ItemId>) -> Self {
        self.default_open.push(key.into());
        self
    }

    /// Hand ownership of the value to the caller
    ///
    /// Changes are reported through [`on_value_change`](Self::on_value_change)
    /// and applied with [`Accordion::set_value`].
    pub fn controlled(mut self, value: SelectionValue) -> Self {
        self.controlled = Some(value);
        self
    }

    /// Arrange triggers horizontally (Left/Right navigate)
    pub fn horizontal(mut self) -> Self {
        self.options.orientation = Orientation::Horizontal;
        self
    }

    pub fn loop_focus(mut self) -> Self {
        self.options.loop_focus = true;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.options.disabled = disabled;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.options.duration = duration;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.options.easing = easing;
        self
    }

    pub fn lazy_mount(mut self) -> Self {
        self.options.lazy_mount = true;
        self
    }

    pub fn unmount_on_close(mut self) -> Self {
        self.options.unmount_on_close = true;
        self
    }

    pub fn unmount_delay(mut self, delay: Duration) -> Self {
        self.options.unmount_delay = Some(delay);
        self
    }

    pub fn on_value_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&SelectionValue) + Send + Sync + 'static,
    {
        self.on_value_change = Some(Arc::new(f));
        self
    }

    pub fn on_open_start<F>(mut self, f: F) -> Self
    where
        F: Fn(&ItemId) + Send + Sync + 'static,
    {
        self.on_open_start = Some(Arc::new(f));
        self
    }

    pub fn on_open_end<F>(mut self, f: F) -> Self
    where
        F: Fn(&ItemId) + Send + Sync + 'static,
    {
        self.on_open_end = Some(Arc::new(f));
        self
    }

    pub fn on_close_start<F>(mut self, f: F) -> Self
    where
        F: Fn(&ItemId) + Send + Sync + 'static,
    {
        self.on_close_start = Some(Arc::new(f));
        self
    }

    pub fn on_close_end<F>(mut self, f: F) -> Self
    where
        F: Fn(&ItemId) + Send + Sync + 'static,
    {
        self.on_close_end = Some(Arc::new(f));
        self
    }

    /// Build the accordion on `scheduler`
    ///
    /// Fails if a default or controlled value does not match the mode.
    pub fn build(self, scheduler: SchedulerHandle) -> Result<Accordion> {
        let config = self.options.selection_config();

        let mut selection = match self.controlled {
            Some(value) => {
                let on_change = self.on_value_change.clone();
                SelectionController::controlled(config, value, move |value| {
                    if let Some(on_change) = &on_change {
                        on_change(value);
                    }
                })?
            }
            None => {
                let default_value = match config.mode {
                    _ if self.default_open.is_empty() => None,
                    SelectionMode::Single => self
                        .default_open
                        .last()
                        .cloned()
                        .map(SelectionValue::single),
                    SelectionMode::Multiple => Some(SelectionValue::multiple(self.default_open)),
                };
                let mut selection = SelectionController::uncontrolled(config, default_value)?;
                if let Some(on_change) = self.on_value_change {
                    selection = selection.on_value_change(move |value| on_change(value));
                }
                selection
            }
        };

        if let Some(f) = self.on_open_start {
            selection = selection.on_open_start(move |id| f(id));
        }
        if let Some(f) = self.on_close_start {
            selection = selection.on_close_start(move |id| f(id));
        }

        tracing::debug!(
            "Accordion {}: built {:?} mode, controlled={}",
            self.instance_key,
            self.options.mode,
            selection.is_controlled()
        );

        Ok(Accordion {
            instance_key: self.instance_key,
            navigator: FocusNavigator::new(self.options.navigator_config()),
            options: self.options,
            selection,
            registry: ItemRegistry::new(),
            items: FxHashMap::default(),
            scheduler,
            on_open_end: self.on_open_end,
            on_close_end: self.on_close_end,
        })
    }
}

impl Default for AccordionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Accordion component - a group of disclosure items
pub struct Accordion {
    instance_key: InstanceKey,
    options: AccordionOptions,
    selection: SelectionController,
    registry: ItemRegistry,
    navigator: FocusNavigator,
    items: FxHashMap<ItemId, AccordionItemState>,
    scheduler: SchedulerHandle,
    on_open_end: Option<ItemCallback>,
    on_close_end: Option<ItemCallback>,
}

impl Accordion {
    #[track_caller]
    pub fn from_options(options: AccordionOptions, scheduler: SchedulerHandle) -> Result<Self> {
        AccordionBuilder::from_options(options).build(scheduler)
    }

    pub fn instance_key(&self) -> &InstanceKey {
        &self.instance_key
    }

    pub fn options(&self) -> &AccordionOptions {
        &self.options
    }

    pub fn value(&self) -> &SelectionValue {
        self.selection.value()
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.selection.is_open(id)
    }

    pub fn is_controlled(&self) -> bool {
        self.selection.is_controlled()
    }

    pub fn is_disabled(&self) -> bool {
        self.selection.is_disabled()
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.selection.set_disabled(disabled);
        self.options.disabled = disabled;
    }

    /// Mounted item ids in traversal order
    pub fn ids(&self) -> impl Iterator<Item = &ItemId> + '_ {
        self.registry.ids()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn trigger_id(&self, id: &str) -> String {
        self.instance_key.derive("trigger", id)
    }

    pub fn content_id(&self, id: &str) -> String {
        self.instance_key.derive("content", id)
    }

    /// Mount an item, or update the options of a mounted one
    ///
    /// A new item registers last in traversal order and starts settled in
    /// its current open state. Returns `true` if the item was new.
    pub fn mount_item<M>(
        &mut self,
        id: impl Into<ItemId>,
        options: ItemOptions,
        measure: M,
    ) -> bool
    where
        M: ContentMeasure + 'static,
    {
        let id = id.into();
        self.registry.register(id.clone(), (), options.disabled);

        if let Some(item) = self.items.get_mut(id.as_str()) {
            if options.force_mount {
                item.lazy.force_mount();
            } else {
                item.lazy.clear_force();
            }
            *lock(&item.options) = options;
            tracing::trace!("Accordion {}: updated item {}", self.instance_key, id);
            return false;
        }

        let is_open = self.selection.is_open(id.as_str());
        let force_mount = options.force_mount;
        let options = Arc::new(Mutex::new(options));

        let height = HeightTransition::new(
            is_open,
            measure,
            self.scheduler.clone(),
            self.options.transition_config(),
        )
        .on_animation_start({
            let options = options.clone();
            move |phase| {
                let hook = lock(&options).on_animation_start.clone();
                if let Some(hook) = hook {
                    hook(phase);
                }
            }
        })
        .on_animation_end({
            let options = options.clone();
            let on_open_end = self.on_open_end.clone();
            let on_close_end = self.on_close_end.clone();
            let id = id.clone();
            move |phase| {
                let hook = lock(&options).on_animation_end.clone();
                if let Some(hook) = hook {
                    hook(phase);
                }
                let group_hook = match phase {
                    TransitionPhase::Open => &on_open_end,
                    _ => &on_close_end,
                };
                if let Some(group_hook) = group_hook {
                    group_hook(&id);
                }
            }
        });

        let lazy = LazyMount::new(is_open, self.scheduler.clone(), self.options.lazy_config());
        if force_mount {
            lazy.force_mount();
        }

        tracing::debug!(
            "Accordion {}: mounted item {} (open={})",
            self.instance_key,
            id,
            is_open
        );
        self.items.insert(
            id,
            AccordionItemState {
                options,
                is_open,
                height,
                lazy,
            },
        );
        true
    }

    /// Unmount an item, cancelling its pending timers and frames
    pub fn unmount_item(&mut self, id: &str) -> bool {
        self.registry.deregister(id);
        let removed = self.items.remove(id).is_some();
        if removed {
            tracing::debug!("Accordion {}: unmounted item {}", self.instance_key, id);
        }
        removed
    }

    /// Item (or group) disabled
    pub fn is_item_disabled(&self, id: &str) -> bool {
        self.selection.is_disabled() || self.registry.is_disabled(id)
    }

    /// Trigger activation (click)
    pub fn toggle(&mut self, id: &str) -> Option<ValueChange> {
        if self.registry.is_disabled(id) {
            return None;
        }
        let change = self.selection.toggle(id);
        self.apply(change)
    }

    pub fn open(&mut self, id: &str) -> Option<ValueChange> {
        if self.registry.is_disabled(id) {
            return None;
        }
        let change = self.selection.open(id);
        self.apply(change)
    }

    pub fn close(&mut self, id: &str) -> Option<ValueChange> {
        if self.registry.is_disabled(id) {
            return None;
        }
        let change = self.selection.close(id);
        self.apply(change)
    }

    /// Open every enabled item (multiple mode only)
    pub fn open_all(&mut self) -> Option<ValueChange> {
        let ids: Vec<ItemId> = self
            .registry
            .iter()
            .filter(|(_, entry)| !entry.disabled)
            .map(|(id, _)| id.clone())
            .collect();
        let change = self.selection.open_all(ids);
        self.apply(change)
    }

    pub fn close_all(&mut self) -> Option<ValueChange> {
        let change = self.selection.close_all();
        self.apply(change)
    }

    /// Apply the value held by the controlling owner
    pub fn set_value(&mut self, value: SelectionValue) -> Option<ValueChange> {
        let change = self.selection.sync_controlled(value);
        self.apply(change)
    }

    /// Key press on the trigger of `current`
    ///
    /// `focus` is asked to move focus when navigation lands elsewhere.
    pub fn handle_key<F>(&mut self, event: &KeyboardEvent, current: &str, focus: F) -> KeyOutcome
    where
        F: FnOnce(&ItemId),
    {
        let outcome = self.navigator.handle_key(
            event,
            current,
            &self.registry,
            &mut self.selection,
            focus,
        );
        if matches!(outcome, KeyOutcome::Activated(Some(_))) {
            self.sync_items();
        }
        outcome
    }

    /// Window resize; re-measures open items
    pub fn on_resize(&self) {
        for item in self.items.values() {
            item.height.on_resize();
        }
    }

    /// Re-measure one open item whose content changed size
    pub fn recalculate(&self, id: &str) -> bool {
        self.items
            .get(id)
            .is_some_and(|item| item.height.recalculate())
    }

    /// Render state of a mounted item
    pub fn item(&self, id: &str) -> Option<ItemSnapshot> {
        let (id, item) = self.items.get_key_value(id)?;
        let options = lock(&item.options);

        let is_open = self.selection.is_open(id.as_str());
        let is_animating = item.height.is_animating();
        let force_mount = options.force_mount;

        Some(ItemSnapshot {
            id: id.clone(),
            is_open,
            disabled: self.selection.is_disabled() || options.disabled,
            data_state: if is_open { "open" } else { "closed" },
            trigger_id: self.trigger_id(id.as_str()),
            content_id: self.content_id(id.as_str()),
            should_render: item.lazy.should_mount() || force_mount,
            hidden: !is_open && !is_animating && !force_mount,
            is_unmounting: item.lazy.is_unmounting(),
            is_animating,
            style: item.height.style(),
        })
    }

    /// Snapshots of every mounted item in traversal order
    pub fn items(&self) -> Vec<ItemSnapshot> {
        self.registry
            .ids()
            .filter_map(|id| self.item(id.as_str()))
            .collect()
    }

    fn apply(&mut self, change: Option<ValueChange>) -> Option<ValueChange> {
        if change.is_some() {
            self.sync_items();
        }
        change
    }

    /// Push the controller's value into each item's engines
    fn sync_items(&mut self) {
        for id in self.registry.ids() {
            let Some(item) = self.items.get_mut(id.as_str()) else {
                continue;
            };
            let open = self.selection.is_open(id.as_str());
            if item.is_open == open {
                continue;
            }
            item.is_open = open;
            item.lazy.set_open(open);
            item.height.set_open(open);

            let on_open_change = lock(&item.options).on_open_change.clone();
            if let Some(on_open_change) = on_open_change {
                on_open_change(open);
            }
        }
    }
}

impl fmt::Debug for Accordion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accordion")
            .field("instance_key", &self.instance_key)
            .field("options", &self.options)
            .field("value", self.selection.value())
            .field("items", &self.registry.ids().collect::<Vec<_>>())
            .finish()
    }
}

/// Create an accordion builder
///
/// # Example
///
/// ```ignore
/// cn::accordion()
///     .multi_open()
///     .lazy_mount()
///     .build(scheduler.handle())?
/// ```
#[track_caller]
pub fn accordion() -> AccordionBuilder {
    AccordionBuilder::new()
}
