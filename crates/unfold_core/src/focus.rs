//! Roving-focus keyboard navigation over an item registry
//!
//! The navigator maps key presses to a target item in traversal order and
//! asks the renderer to focus it. It keeps no focus state of its own; the
//! caller passes in the id of the currently focused trigger.
//!
//! Orientation only selects which arrow keys mean next/previous:
//!
//! | Orientation | Next | Previous |
//! |---|---|---|
//! | Vertical | Down | Up |
//! | Horizontal | Right | Left |
//!
//! Home/End jump to the first/last item, Enter/Space activate.

use serde::{Deserialize, Serialize};

use crate::id::ItemId;
use crate::input::{Key, KeyState, KeyboardEvent};
use crate::registry::ItemRegistry;
use crate::selection::{SelectionController, ValueChange};

/// Layout direction of a group's triggers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// What a key press asks for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavIntent {
    Next,
    Previous,
    First,
    Last,
    Activate,
}

/// Navigator configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigatorConfig {
    pub orientation: Orientation,
    /// Wrap past either end instead of stopping at it
    #[serde(rename = "loop")]
    pub loop_focus: bool,
    /// Leave disabled items out of traversal
    ///
    /// Off by default: focus lands on disabled triggers like any other.
    pub skip_disabled: bool,
}

/// Result of feeding a key event to the navigator
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not a navigation key, or a modifier was held
    Ignored,
    /// Focus was moved to this item
    Moved(ItemId),
    /// A boundary was hit without looping; focus stays here
    Stayed(ItemId),
    /// The focused item was activated
    Activated(Option<ValueChange>),
}

impl KeyOutcome {
    /// Whether the host should suppress the key's default action
    pub fn is_handled(&self) -> bool {
        !matches!(self, KeyOutcome::Ignored)
    }
}

/// Maps keyboard input to focus moves and activations
#[derive(Clone, Copy, Debug, Default)]
pub struct FocusNavigator {
    config: NavigatorConfig,
}

impl FocusNavigator {
    pub fn new(config: NavigatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// The intent a key event maps to, if any
    pub fn intent(&self, event: &KeyboardEvent) -> Option<NavIntent> {
        if event.state != KeyState::Pressed || !event.modifiers.is_empty() {
            return None;
        }

        match (&event.key, self.config.orientation) {
            (Key::Down, Orientation::Vertical) | (Key::Right, Orientation::Horizontal) => {
                Some(NavIntent::Next)
            }
            (Key::Up, Orientation::Vertical) | (Key::Left, Orientation::Horizontal) => {
                Some(NavIntent::Previous)
            }
            (Key::Home, _) => Some(NavIntent::First),
            (Key::End, _) => Some(NavIntent::Last),
            (Key::Enter | Key::Space, _) => Some(NavIntent::Activate),
            _ => None,
        }
    }

    /// Resolve the item an intent lands on, starting from `current`
    ///
    /// Returns `None` when nothing can be focused. An unregistered
    /// `current` moves to the first item on `Next` and the last on
    /// `Previous`.
    pub fn target<H>(
        &self,
        registry: &ItemRegistry<H>,
        current: &str,
        intent: NavIntent,
    ) -> Option<ItemId> {
        let candidates: Vec<usize> = (0..registry.len())
            .filter(|&index| {
                !self.config.skip_disabled
                    || registry
                        .id_at(index)
                        .is_some_and(|id| !registry.is_disabled(id.as_str()))
            })
            .collect();

        let index = match intent {
            NavIntent::Activate => return registry.get(current).map(|_| ItemId::new(current)),
            NavIntent::First => *candidates.first()?,
            NavIntent::Last => *candidates.last()?,
            NavIntent::Next => match registry.position(current) {
                None => *candidates.first()?,
                Some(position) => match candidates.iter().find(|&&index| index > position) {
                    Some(&index) => index,
                    None if self.config.loop_focus => *candidates.first()?,
                    None => position,
                },
            },
            NavIntent::Previous => match registry.position(current) {
                None => *candidates.last()?,
                Some(position) => match candidates.iter().rev().find(|&&index| index < position) {
                    Some(&index) => index,
                    None if self.config.loop_focus => *candidates.last()?,
                    None => position,
                },
            },
        };

        registry.id_at(index).cloned()
    }

    /// Move focus according to `intent`, calling `focus` if the target changed
    pub fn navigate<H, F>(
        &self,
        registry: &ItemRegistry<H>,
        current: &str,
        intent: NavIntent,
        focus: F,
    ) -> Option<ItemId>
    where
        F: FnOnce(&ItemId),
    {
        let target = self.target(registry, current, intent)?;
        if target != current {
            tracing::trace!("FocusNavigator: {} -> {} ({:?})", current, target, intent);
            focus(&target);
        }
        Some(target)
    }

    /// Handle a key event on the trigger of `current`
    ///
    /// Activation toggles `current` through the selection controller unless
    /// the item is disabled.
    pub fn handle_key<H, F>(
        &self,
        event: &KeyboardEvent,
        current: &str,
        registry: &ItemRegistry<H>,
        selection: &mut SelectionController,
        focus: F,
    ) -> KeyOutcome
    where
        F: FnOnce(&ItemId),
    {
        let Some(intent) = self.intent(event) else {
            return KeyOutcome::Ignored;
        };

        if intent == NavIntent::Activate {
            if registry.is_disabled(current) {
                return KeyOutcome::Activated(None);
            }
            return KeyOutcome::Activated(selection.toggle(current));
        }

        match self.navigate(registry, current, intent, focus) {
            None => KeyOutcome::Ignored,
            Some(target) if target == current => KeyOutcome::Stayed(target),
            Some(target) => KeyOutcome::Moved(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use crate::selection::{SelectionConfig, SelectionMode};

    fn registry(ids: &[&str]) -> ItemRegistry {
        let mut registry = ItemRegistry::new();
        for id in ids {
            registry.register(*id, (), false);
        }
        registry
    }

    fn navigator(loop_focus: bool) -> FocusNavigator {
        FocusNavigator::new(NavigatorConfig {
            loop_focus,
            ..NavigatorConfig::default()
        })
    }

    #[test]
    fn test_next_from_last_loops() {
        let items = registry(&["a", "b", "c"]);
        let target = navigator(true).target(&items, "c", NavIntent::Next);
        assert_eq!(target, Some(ItemId::new("a")));
    }

    #[test]
    fn test_next_from_last_clamps() {
        let items = registry(&["a", "b", "c"]);
        let target = navigator(false).target(&items, "c", NavIntent::Next);
        assert_eq!(target, Some(ItemId::new("c")));
    }

    #[test]
    fn test_previous_and_bounds() {
        let items = registry(&["a", "b", "c"]);
        let nav = navigator(false);
        assert_eq!(
            nav.target(&items, "b", NavIntent::Previous),
            Some(ItemId::new("a"))
        );
        assert_eq!(
            nav.target(&items, "a", NavIntent::Previous),
            Some(ItemId::new("a"))
        );
        assert_eq!(
            navigator(true).target(&items, "a", NavIntent::Previous),
            Some(ItemId::new("c"))
        );
        assert_eq!(
            nav.target(&items, "b", NavIntent::First),
            Some(ItemId::new("a"))
        );
        assert_eq!(
            nav.target(&items, "b", NavIntent::Last),
            Some(ItemId::new("c"))
        );
    }

    #[test]
    fn test_empty_registry() {
        let items = registry(&[]);
        let nav = navigator(true);
        assert_eq!(nav.target(&items, "a", NavIntent::Next), None);
        assert_eq!(nav.target(&items, "a", NavIntent::First), None);
    }

    #[test]
    fn test_unregistered_current() {
        let items = registry(&["a", "b"]);
        let nav = navigator(false);
        assert_eq!(
            nav.target(&items, "zzz", NavIntent::Next),
            Some(ItemId::new("a"))
        );
        assert_eq!(
            nav.target(&items, "zzz", NavIntent::Previous),
            Some(ItemId::new("b"))
        );
        assert_eq!(nav.target(&items, "zzz", NavIntent::Activate), None);
    }

    #[test]
    fn test_disabled_items_not_skipped_by_default() {
        let mut items = registry(&["a", "b", "c"]);
        items.set_disabled("b", true);
        assert_eq!(
            navigator(false).target(&items, "a", NavIntent::Next),
            Some(ItemId::new("b"))
        );

        let skipping = FocusNavigator::new(NavigatorConfig {
            skip_disabled: true,
            ..NavigatorConfig::default()
        });
        assert_eq!(
            skipping.target(&items, "a", NavIntent::Next),
            Some(ItemId::new("c"))
        );
        assert_eq!(
            skipping.target(&items, "c", NavIntent::Previous),
            Some(ItemId::new("a"))
        );
    }

    #[test]
    fn test_orientation_maps_arrows() {
        let vertical = navigator(false);
        let horizontal = FocusNavigator::new(NavigatorConfig {
            orientation: Orientation::Horizontal,
            ..NavigatorConfig::default()
        });

        let down = KeyboardEvent::pressed(Key::Down);
        let right = KeyboardEvent::pressed(Key::Right);
        assert_eq!(vertical.intent(&down), Some(NavIntent::Next));
        assert_eq!(vertical.intent(&right), None);
        assert_eq!(horizontal.intent(&right), Some(NavIntent::Next));
        assert_eq!(horizontal.intent(&down), None);
        assert_eq!(
            horizontal.intent(&KeyboardEvent::pressed(Key::Home)),
            Some(NavIntent::First)
        );
    }

    #[test]
    fn test_modifiers_and_release_ignored() {
        let nav = navigator(false);
        let ctrl_down = KeyboardEvent::pressed(Key::Down).with_modifiers(Modifiers::ctrl());
        assert_eq!(nav.intent(&ctrl_down), None);

        let released = KeyboardEvent {
            key: Key::Down,
            state: KeyState::Released,
            modifiers: Modifiers::default(),
        };
        assert_eq!(nav.intent(&released), None);
    }

    #[test]
    fn test_handle_key_moves_focus() {
        let items = registry(&["a", "b"]);
        let mut selection =
            SelectionController::uncontrolled(SelectionConfig::default(), None).unwrap();
        let mut focused = None;

        let outcome = navigator(false).handle_key(
            &KeyboardEvent::pressed(Key::Down),
            "a",
            &items,
            &mut selection,
            |id| focused = Some(id.clone()),
        );
        assert_eq!(outcome, KeyOutcome::Moved(ItemId::new("b")));
        assert_eq!(focused, Some(ItemId::new("b")));
    }

    #[test]
    fn test_handle_key_boundary_does_not_refocus() {
        let items = registry(&["a", "b"]);
        let mut selection =
            SelectionController::uncontrolled(SelectionConfig::default(), None).unwrap();
        let mut calls = 0;

        let outcome = navigator(false).handle_key(
            &KeyboardEvent::pressed(Key::End),
            "b",
            &items,
            &mut selection,
            |_| calls += 1,
        );
        assert_eq!(outcome, KeyOutcome::Stayed(ItemId::new("b")));
        assert!(outcome.is_handled());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_activate_toggles_selection() {
        let mut items = registry(&["a", "b"]);
        let mut selection = SelectionController::uncontrolled(
            SelectionConfig::new(SelectionMode::Multiple),
            None,
        )
        .unwrap();
        let nav = navigator(false);

        let outcome = nav.handle_key(
            &KeyboardEvent::pressed(Key::Enter),
            "a",
            &items,
            &mut selection,
            |_| {},
        );
        assert!(matches!(outcome, KeyOutcome::Activated(Some(_))));
        assert!(selection.is_open("a"));

        items.set_disabled("b", true);
        let outcome = nav.handle_key(
            &KeyboardEvent::pressed(Key::Space),
            "b",
            &items,
            &mut selection,
            |_| {},
        );
        assert_eq!(outcome, KeyOutcome::Activated(None));
        assert!(!selection.is_open("b"));
    }

    #[test]
    fn test_config_serde_loop_key() {
        let config: NavigatorConfig =
            serde_json::from_str(r#"{"orientation":"horizontal","loop":true}"#).unwrap();
        assert_eq!(config.orientation, Orientation::Horizontal);
        assert!(config.loop_focus);
        assert!(!config.skip_disabled);
    }
}
