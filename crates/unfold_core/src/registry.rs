//! Ordered registry of mounted items
//!
//! Items register when their trigger mounts and deregister when it
//! unmounts. Registration order is keyboard traversal order. Sibling
//! mount/unmount order is not guaranteed by renderers, so both entry
//! points are idempotent and tolerate any call order.

use indexmap::IndexMap;

use crate::id::ItemId;

/// A registered item
#[derive(Clone, Debug, PartialEq)]
pub struct ItemEntry<H> {
    /// Focusable handle supplied by the renderer
    pub handle: H,
    /// Item-level disabled flag
    pub disabled: bool,
}

/// Arena of registered items keyed by id, in registration order
#[derive(Clone, Debug)]
pub struct ItemRegistry<H = ()> {
    items: IndexMap<ItemId, ItemEntry<H>>,
}

impl<H> ItemRegistry<H> {
    pub fn new() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }

    /// Register an item, or refresh its entry if already present
    ///
    /// A refreshed entry keeps its traversal position. Returns `true` if
    /// the id was newly added.
    pub fn register(&mut self, id: impl Into<ItemId>, handle: H, disabled: bool) -> bool {
        let id = id.into();
        let added = !self.items.contains_key(id.as_str());
        if added {
            tracing::trace!("ItemRegistry: register {}", id);
        }
        self.items.insert(id, ItemEntry { handle, disabled });
        added
    }

    /// Remove an item, keeping the order of the rest
    ///
    /// Returns `true` if the id was registered.
    pub fn deregister(&mut self, id: &str) -> bool {
        let removed = self.items.shift_remove(id).is_some();
        if removed {
            tracing::trace!("ItemRegistry: deregister {}", id);
        }
        removed
    }

    pub fn set_disabled(&mut self, id: &str, disabled: bool) {
        if let Some(entry) = self.items.get_mut(id) {
            entry.disabled = disabled;
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// `false` for unregistered ids
    pub fn is_disabled(&self, id: &str) -> bool {
        self.items.get(id).is_some_and(|entry| entry.disabled)
    }

    pub fn get(&self, id: &str) -> Option<&ItemEntry<H>> {
        self.items.get(id)
    }

    pub fn handle(&self, id: &str) -> Option<&H> {
        self.items.get(id).map(|entry| &entry.handle)
    }

    /// Traversal position of `id`
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.get_index_of(id)
    }

    pub fn id_at(&self, index: usize) -> Option<&ItemId> {
        self.items.get_index(index).map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids in traversal order
    pub fn ids(&self) -> impl Iterator<Item = &ItemId> + '_ {
        self.items.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &ItemEntry<H>)> + '_ {
        self.items.iter()
    }
}

impl<H> Default for ItemRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_order() {
        let mut registry = ItemRegistry::new();
        registry.register("a", (), false);
        registry.register("b", (), false);
        registry.register("c", (), false);

        let ids: Vec<_> = registry.ids().map(ItemId::as_str).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(registry.position("c"), Some(2));
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = ItemRegistry::new();
        assert!(registry.register("a", 1u32, false));
        assert!(registry.register("b", 2u32, false));
        assert!(!registry.register("a", 3u32, true));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.position("a"), Some(0));
        assert_eq!(registry.handle("a"), Some(&3));
        assert!(registry.is_disabled("a"));
    }

    #[test]
    fn test_deregister_any_order() {
        let mut registry = ItemRegistry::new();
        assert!(!registry.deregister("missing"));

        registry.register("a", (), false);
        registry.register("b", (), false);
        registry.register("c", (), false);
        assert!(registry.deregister("b"));
        assert!(!registry.deregister("b"));

        let ids: Vec<_> = registry.ids().map(ItemId::as_str).collect();
        assert_eq!(ids, ["a", "c"]);

        // Re-registering after removal appends
        registry.register("b", (), false);
        assert_eq!(registry.position("b"), Some(2));
    }

    #[test]
    fn test_unknown_id_not_disabled() {
        let registry: ItemRegistry = ItemRegistry::new();
        assert!(!registry.is_disabled("x"));
        assert!(registry.is_empty());
    }
}
