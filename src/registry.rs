//! Registry of resources currently holding device handles.
//!
//! A single ordered set shared across the engine. It lists device-handle
//! holders, not logical identities: after an adoption only the adopting
//! resource is listed. The registry is mutated explicitly by the orchestrating
//! system after `adopt_from` returns, never from inside the resource type.

use crate::pool::TextureId;

/// Ordered set of live GPU resource ids.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: Vec<TextureId>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: TextureId) -> bool {
        self.entries.contains(&id)
    }

    /// Append `id` unless it is already present. Returns true when inserted.
    pub fn insert(&mut self, id: TextureId) -> bool {
        if self.contains(id) {
            false
        } else {
            self.entries.push(id);
            true
        }
    }

    /// Remove `id` by identity. Returns true when it was present.
    pub fn remove(&mut self, id: TextureId) -> bool {
        if let Some(pos) = self.entries.iter().position(|entry| *entry == id) {
            self.entries.remove(pos);
            true
        } else {
            false
        }
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate registered ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.entries.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> TextureId {
        TextureId::from_raw_parts(index, 0)
    }

    #[test]
    fn test_insert_dedup() {
        let mut registry = ResourceRegistry::new();
        assert!(registry.insert(id(1)));
        assert!(!registry.insert(id(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut registry = ResourceRegistry::new();
        registry.insert(id(1));
        registry.insert(id(2));
        assert!(registry.remove(id(1)));
        assert!(!registry.remove(id(1)));
        assert!(registry.contains(id(2)));
    }

    #[test]
    fn test_order_preserved() {
        let mut registry = ResourceRegistry::new();
        registry.insert(id(3));
        registry.insert(id(1));
        registry.insert(id(2));
        registry.remove(id(1));
        let order: Vec<_> = registry.iter().collect();
        assert_eq!(order, vec![id(3), id(2)]);
    }
}
