//! Open-state selection for a group of disclosure items
//!
//! The [`SelectionController`] decides which items of a group are open.
//! It runs in one of two modes, fixed at construction:
//!
//! - **Single**: at most one item is open; opening another closes the
//!   current one in the same transition. With `collapsible`, toggling the
//!   open item closes it.
//! - **Multiple**: any subset of items may be open.
//!
//! # Controlled vs uncontrolled
//!
//! A controller either owns its value ([`SelectionController::uncontrolled`])
//! or delegates it to an external owner ([`SelectionController::controlled`]).
//! A delegating controller never mutates its value on `toggle`; it emits the
//! requested value through the change callback and waits for the owner to
//! hand it back via [`SelectionController::sync_controlled`].
//!
//! ```
//! use unfold_core::selection::{SelectionConfig, SelectionController, SelectionMode};
//!
//! let mut selection = SelectionController::uncontrolled(
//!     SelectionConfig::new(SelectionMode::Single).collapsible(true),
//!     None,
//! )
//! .unwrap();
//!
//! selection.toggle("a");
//! assert!(selection.is_open("a"));
//! selection.toggle("a");
//! assert!(selection.value().is_empty());
//! ```

use std::sync::Arc;

use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

use crate::error::{ConfigError, Result};
use crate::id::ItemId;

/// Selection mode - single or multiple open items
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Only one item can be open at a time (default)
    #[default]
    Single,
    /// Multiple items can be open simultaneously
    Multiple,
}

/// The open-state value of a group
///
/// The variant always matches the controller's mode: a single controller
/// never holds a set, a multiple controller never holds a bare id.
/// Equality of `Multiple` values ignores order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionValue {
    /// The open item, or `None`
    Single(Option<ItemId>),
    /// The set of open items
    Multiple(IndexSet<ItemId>),
}

impl SelectionValue {
    /// The "nothing open" value for a mode
    pub fn empty(mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::Single => SelectionValue::Single(None),
            SelectionMode::Multiple => SelectionValue::Multiple(IndexSet::new()),
        }
    }

    /// The value with `id` open; an empty id means nothing open
    pub fn single(id: impl Into<ItemId>) -> Self {
        let id = id.into();
        SelectionValue::Single((!id.is_empty()).then_some(id))
    }

    pub fn multiple<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        SelectionValue::Multiple(
            ids.into_iter()
                .map(Into::into)
                .filter(|id: &ItemId| !id.is_empty())
                .collect(),
        )
    }

    /// The mode this value's shape belongs to
    pub fn mode(&self) -> SelectionMode {
        match self {
            SelectionValue::Single(_) => SelectionMode::Single,
            SelectionValue::Multiple(_) => SelectionMode::Multiple,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }
        match self {
            SelectionValue::Single(current) => current.as_ref().is_some_and(|c| c == id),
            SelectionValue::Multiple(set) => set.contains(id),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SelectionValue::Single(current) => current.is_none(),
            SelectionValue::Multiple(set) => set.is_empty(),
        }
    }

    /// Number of open items
    pub fn len(&self) -> usize {
        match self {
            SelectionValue::Single(current) => usize::from(current.is_some()),
            SelectionValue::Multiple(set) => set.len(),
        }
    }

    /// Iterate over the open ids
    pub fn iter(&self) -> impl Iterator<Item = &ItemId> + '_ {
        let single = match self {
            SelectionValue::Single(current) => current.as_ref(),
            SelectionValue::Multiple(_) => None,
        };
        let many = match self {
            SelectionValue::Multiple(set) => Some(set.iter()),
            SelectionValue::Single(_) => None,
        };
        single.into_iter().chain(many.into_iter().flatten())
    }

    /// Reshape this value for `mode`
    ///
    /// A bare id becomes a one-element set; a set keeps its first member.
    pub fn coerce(self, mode: SelectionMode) -> Self {
        match (self, mode) {
            (SelectionValue::Single(current), SelectionMode::Multiple) => {
                SelectionValue::Multiple(current.into_iter().collect())
            }
            (SelectionValue::Multiple(set), SelectionMode::Single) => {
                SelectionValue::Single(set.into_iter().next())
            }
            (value, _) => value,
        }
    }

    /// Items whose membership differs between `self` and `next`
    pub fn diff(&self, next: &SelectionValue) -> ValueChange {
        ValueChange {
            opened: next
                .iter()
                .filter(|id| !self.contains(id.as_str()))
                .cloned()
                .collect(),
            closed: self
                .iter()
                .filter(|id| !next.contains(id.as_str()))
                .cloned()
                .collect(),
        }
    }
}

impl Serialize for SelectionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            SelectionValue::Single(current) => {
                serializer.serialize_str(current.as_ref().map(ItemId::as_str).unwrap_or(""))
            }
            SelectionValue::Multiple(set) => serializer.collect_seq(set.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for SelectionValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<ItemId>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::One(id) => SelectionValue::single(id),
            Raw::Many(ids) => SelectionValue::multiple(ids),
        })
    }
}

/// Items that changed membership in one value transition
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValueChange {
    /// Items that started opening
    pub opened: SmallVec<[ItemId; 2]>,
    /// Items that started closing
    pub closed: SmallVec<[ItemId; 2]>,
}

impl ValueChange {
    pub fn is_empty(&self) -> bool {
        self.opened.is_empty() && self.closed.is_empty()
    }

    /// Every affected item, closings first
    pub fn affected(&self) -> impl Iterator<Item = &ItemId> + '_ {
        self.closed.iter().chain(self.opened.iter())
    }
}

/// Selection behavior configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectionConfig {
    pub mode: SelectionMode,
    /// Single mode only: allow closing the open item back to none
    pub collapsible: bool,
    /// Disable every mutation
    pub disabled: bool,
}

impl SelectionConfig {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn collapsible(mut self, collapsible: bool) -> Self {
        self.collapsible = collapsible;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Callback receiving a requested value
pub type ValueCallback = Arc<dyn Fn(&SelectionValue) + Send + Sync>;

/// Callback receiving an item id
pub type ItemCallback = Arc<dyn Fn(&ItemId) + Send + Sync>;

/// Where the current value lives, fixed at construction
enum ValueSource {
    /// The controller owns the value
    Owned(SelectionValue),
    /// The value mirrors an external owner, which receives every request
    Delegated {
        value: SelectionValue,
        on_request: ValueCallback,
    },
}

impl ValueSource {
    fn get(&self) -> &SelectionValue {
        match self {
            ValueSource::Owned(value) | ValueSource::Delegated { value, .. } => value,
        }
    }

    fn replace(&mut self, next: SelectionValue) -> SelectionValue {
        match self {
            ValueSource::Owned(value) | ValueSource::Delegated { value, .. } => {
                std::mem::replace(value, next)
            }
        }
    }
}

/// Owns (or mirrors) the open state of a group of items
pub struct SelectionController {
    config: SelectionConfig,
    source: ValueSource,
    on_observe: Option<ValueCallback>,
    on_open_start: Option<ItemCallback>,
    on_close_start: Option<ItemCallback>,
}

impl SelectionController {
    /// Create a controller that owns its value
    ///
    /// `default_value` defaults to nothing open.
    pub fn uncontrolled(
        config: SelectionConfig,
        default_value: Option<SelectionValue>,
    ) -> Result<Self> {
        let value = match default_value {
            Some(value) => check_shape(config.mode, value)?,
            None => SelectionValue::empty(config.mode),
        };

        Ok(Self {
            config,
            source: ValueSource::Owned(value),
            on_observe: None,
            on_open_start: None,
            on_close_start: None,
        })
    }

    /// Create a controller whose value is owned by the caller
    ///
    /// Every mutation is turned into a call of `on_change`; the caller
    /// applies it back with [`sync_controlled`](Self::sync_controlled).
    pub fn controlled<F>(
        config: SelectionConfig,
        value: SelectionValue,
        on_change: F,
    ) -> Result<Self>
    where
        F: Fn(&SelectionValue) + Send + Sync + 'static,
    {
        let value = check_shape(config.mode, value)?;

        Ok(Self {
            config,
            source: ValueSource::Delegated {
                value,
                on_request: Arc::new(on_change),
            },
            on_observe: None,
            on_open_start: None,
            on_close_start: None,
        })
    }

    /// Observe every requested value
    ///
    /// Runs before the controlling owner's callback and never replaces it.
    pub fn on_value_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&SelectionValue) + Send + Sync + 'static,
    {
        self.on_observe = Some(Arc::new(f));
        self
    }

    /// Called once per item that starts opening
    pub fn on_open_start<F>(mut self, f: F) -> Self
    where
        F: Fn(&ItemId) + Send + Sync + 'static,
    {
        self.on_open_start = Some(Arc::new(f));
        self
    }

    /// Called once per item that starts closing
    pub fn on_close_start<F>(mut self, f: F) -> Self
    where
        F: Fn(&ItemId) + Send + Sync + 'static,
    {
        self.on_close_start = Some(Arc::new(f));
        self
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn mode(&self) -> SelectionMode {
        self.config.mode
    }

    pub fn is_controlled(&self) -> bool {
        matches!(self.source, ValueSource::Delegated { .. })
    }

    pub fn is_disabled(&self) -> bool {
        self.config.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.config.disabled = disabled;
    }

    /// The current value
    pub fn value(&self) -> &SelectionValue {
        self.source.get()
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.value().contains(id)
    }

    /// Flip the open state of `id` according to the mode
    ///
    /// Returns the applied change, or `None` if nothing changed (disabled,
    /// already in the requested state, or delegated to a controlling owner).
    pub fn toggle(&mut self, id: &str) -> Option<ValueChange> {
        if self.config.disabled || id.is_empty() {
            return None;
        }

        let next = match self.value() {
            SelectionValue::Single(Some(current)) if current == id => {
                if !self.config.collapsible {
                    return None;
                }
                SelectionValue::Single(None)
            }
            SelectionValue::Single(_) => SelectionValue::single(id),
            SelectionValue::Multiple(set) => {
                let mut set = set.clone();
                if !set.shift_remove(id) {
                    set.insert(ItemId::new(id));
                }
                SelectionValue::Multiple(set)
            }
        };

        self.request(next)
    }

    /// Open `id` if it is closed
    pub fn open(&mut self, id: &str) -> Option<ValueChange> {
        if self.config.disabled || id.is_empty() || self.is_open(id) {
            return None;
        }

        let next = match self.value() {
            SelectionValue::Single(_) => SelectionValue::single(id),
            SelectionValue::Multiple(set) => {
                let mut set = set.clone();
                set.insert(ItemId::new(id));
                SelectionValue::Multiple(set)
            }
        };

        self.request(next)
    }

    /// Close `id` if it is open
    ///
    /// In single mode this follows `toggle`: a non-collapsible group never
    /// returns to "none".
    pub fn close(&mut self, id: &str) -> Option<ValueChange> {
        if self.config.disabled || !self.is_open(id) {
            return None;
        }

        let next = match self.value() {
            SelectionValue::Single(_) if !self.config.collapsible => return None,
            SelectionValue::Single(_) => SelectionValue::Single(None),
            SelectionValue::Multiple(set) => {
                let mut set = set.clone();
                set.shift_remove(id);
                SelectionValue::Multiple(set)
            }
        };

        self.request(next)
    }

    /// Open every id in `ids` (multiple mode only)
    ///
    /// In single mode "all" is ambiguous and this does nothing.
    pub fn open_all<I, T>(&mut self, ids: I) -> Option<ValueChange>
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        if self.config.disabled {
            return None;
        }

        let next = match self.value() {
            SelectionValue::Single(_) => return None,
            SelectionValue::Multiple(set) => {
                let mut set = set.clone();
                set.extend(
                    ids.into_iter()
                        .map(Into::<ItemId>::into)
                        .filter(|id| !id.is_empty()),
                );
                SelectionValue::Multiple(set)
            }
        };

        self.request(next)
    }

    /// Close every open item
    pub fn close_all(&mut self) -> Option<ValueChange> {
        if self.config.disabled {
            return None;
        }

        let next = match self.value() {
            SelectionValue::Single(_) if !self.config.collapsible => return None,
            value => SelectionValue::empty(value.mode()),
        };

        self.request(next)
    }

    /// Apply a value handed back by the controlling owner
    ///
    /// A value of the wrong shape is coerced to the mode. Ignored on an
    /// uncontrolled controller.
    pub fn sync_controlled(&mut self, value: SelectionValue) -> Option<ValueChange> {
        if !self.is_controlled() {
            tracing::debug!("SelectionController: ignoring controlled value on owned state");
            return None;
        }

        let value = if value.mode() != self.config.mode {
            tracing::warn!(
                "SelectionController: coercing {:?} value to {:?} mode",
                value.mode(),
                self.config.mode
            );
            value.coerce(self.config.mode)
        } else {
            value
        };

        if &value == self.value() {
            return None;
        }

        Some(self.commit(value))
    }

    fn request(&mut self, next: SelectionValue) -> Option<ValueChange> {
        if &next == self.value() {
            return None;
        }

        if let Some(on_observe) = &self.on_observe {
            on_observe(&next);
        }

        if let ValueSource::Delegated { on_request, .. } = &self.source {
            on_request(&next);
            return None;
        }
        Some(self.commit(next))
    }

    fn commit(&mut self, next: SelectionValue) -> ValueChange {
        let change = self.value().diff(&next);
        self.source.replace(next);

        tracing::debug!(
            "SelectionController: opened={:?} closed={:?}",
            change.opened,
            change.closed
        );

        if let Some(on_close_start) = &self.on_close_start {
            for id in &change.closed {
                on_close_start(id);
            }
        }
        if let Some(on_open_start) = &self.on_open_start {
            for id in &change.opened {
                on_open_start(id);
            }
        }

        change
    }
}

fn check_shape(mode: SelectionMode, value: SelectionValue) -> Result<SelectionValue> {
    if value.mode() != mode {
        return Err(ConfigError::ValueShape {
            mode,
            found: value.mode(),
        });
    }
    Ok(value)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    enum Op {
        Toggle(&'static str),
        Open(&'static str),
        Close(&'static str),
        CloseAll,
    }

    fn op() -> impl Strategy<Value = Op> {
        let id = prop::sample::select(vec!["a", "b", "c", "d", ""]);
        prop_oneof![
            4 => id.clone().prop_map(Op::Toggle),
            2 => id.clone().prop_map(Op::Open),
            2 => id.prop_map(Op::Close),
            1 => Just(Op::CloseAll),
        ]
    }

    fn apply(selection: &mut SelectionController, op: &Op) -> Option<ValueChange> {
        match op {
            Op::Toggle(id) => selection.toggle(id),
            Op::Open(id) => selection.open(id),
            Op::Close(id) => selection.close(id),
            Op::CloseAll => selection.close_all(),
        }
    }

    proptest! {
        /// Single mode never holds more than one open item
        #[test]
        fn single_mode_at_most_one_open(
            collapsible in any::<bool>(),
            ops in prop::collection::vec(op(), 0..40),
        ) {
            let mut selection = SelectionController::uncontrolled(
                SelectionConfig::new(SelectionMode::Single).collapsible(collapsible),
                None,
            )
            .unwrap();

            for op in &ops {
                let change = apply(&mut selection, op);
                prop_assert!(
                    selection.value().len() <= 1,
                    "{:?} after {:?}",
                    selection.value(),
                    op
                );
                prop_assert!(matches!(selection.value(), SelectionValue::Single(_)));
                prop_assert!(!selection.is_open(""));
                if let Some(change) = change {
                    prop_assert!(change.opened.len() <= 1);
                    prop_assert!(change.closed.len() <= 1);
                }
            }
        }

        /// A non-collapsible single group never returns to nothing open
        #[test]
        fn single_non_collapsible_stays_open(ops in prop::collection::vec(op(), 0..40)) {
            let mut selection = SelectionController::uncontrolled(
                SelectionConfig::new(SelectionMode::Single),
                None,
            )
            .unwrap();

            let mut opened = false;
            for op in &ops {
                apply(&mut selection, op);
                opened |= !selection.value().is_empty();
                prop_assert!(!opened || selection.value().len() == 1);
            }
        }

        /// Toggling the same id twice restores the previous multiple value
        #[test]
        fn multiple_double_toggle_round_trips(
            ops in prop::collection::vec(op(), 0..40),
            id in prop::sample::select(vec!["a", "b", "c", "d"]),
        ) {
            let mut selection = SelectionController::uncontrolled(
                SelectionConfig::new(SelectionMode::Multiple),
                None,
            )
            .unwrap();
            for op in &ops {
                apply(&mut selection, op);
                prop_assert!(matches!(selection.value(), SelectionValue::Multiple(_)));
            }

            let before = selection.value().clone();
            let was_open = selection.is_open(id);
            selection.toggle(id);
            prop_assert_eq!(selection.is_open(id), !was_open);
            selection.toggle(id);
            prop_assert_eq!(selection.value(), &before);
        }

        /// Every reported change matches the value difference it produced
        #[test]
        fn changes_match_value_diff(
            multi in any::<bool>(),
            ops in prop::collection::vec(op(), 0..40),
        ) {
            let mode = if multi { SelectionMode::Multiple } else { SelectionMode::Single };
            let mut selection = SelectionController::uncontrolled(
                SelectionConfig::new(mode).collapsible(true),
                None,
            )
            .unwrap();

            for op in &ops {
                let before = selection.value().clone();
                match apply(&mut selection, op) {
                    Some(change) => {
                        prop_assert!(!change.is_empty());
                        prop_assert_eq!(change, before.diff(selection.value()));
                    }
                    None => prop_assert_eq!(&before, selection.value()),
                }
            }
        }
    }
}
