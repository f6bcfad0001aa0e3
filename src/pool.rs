//! Arena storage for texture resources.
//!
//! Resources live in pool slots addressed by a stable [`TextureId`]. External
//! holders keep their id across rebuilds; ownership transfer swaps slot
//! contents instead of moving heap objects around. Generations detect ids
//! that outlive their slot, which is what guards a completion callback racing
//! against a disposal.

use crate::error::TextureError;
use crate::resource::TextureResource;

/// Stable identifier for a pooled texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId {
    index: u32,
    generation: u32,
}

impl TextureId {
    /// Reassemble an id from its raw parts.
    pub fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index of this id.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot had when this id was minted.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    resource: Option<TextureResource>,
}

/// Arena of texture resources addressed by stable ids.
#[derive(Debug, Default)]
pub struct TexturePool {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl TexturePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live resources.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// True when no resources are pooled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a resource and mint its id.
    pub fn insert(&mut self, resource: TextureResource) -> TextureId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.resource = Some(resource);
            TextureId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                resource: Some(resource),
            });
            TextureId {
                index,
                generation: 0,
            }
        }
    }

    /// Whether `id` still addresses a live resource.
    pub fn contains(&self, id: TextureId) -> bool {
        self.get(id).is_some()
    }

    /// Shared access to a pooled resource.
    pub fn get(&self, id: TextureId) -> Option<&TextureResource> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.resource.as_ref())
    }

    /// Mutable access to a pooled resource.
    pub fn get_mut(&mut self, id: TextureId) -> Option<&mut TextureResource> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.resource.as_mut())
    }

    /// Retire a slot, bumping its generation so outstanding ids go stale.
    pub fn remove(&mut self, id: TextureId) -> Option<TextureResource> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let resource = slot.resource.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(resource)
    }

    /// Move everything the donor owns into the target and retire the donor's
    /// slot.
    ///
    /// Returns the sub-resource ids the adoption displaced; the caller owns
    /// their disposal. Fails without side effects when either id is stale.
    pub fn adopt(
        &mut self,
        target: TextureId,
        donor: TextureId,
    ) -> Result<Vec<TextureId>, TextureError> {
        if !self.contains(target) {
            return Err(TextureError::StaleId(target));
        }
        let donor_resource = self.remove(donor).ok_or(TextureError::StaleId(donor))?;
        let target_resource = self
            .get_mut(target)
            .ok_or(TextureError::StaleId(target))?;
        Ok(target_resource.adopt_from(donor_resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::NullFacade;
    use crate::source::TextureSource;

    fn resource(facade: &mut NullFacade) -> TextureResource {
        TextureResource::new(facade, TextureSource::Raw { data: None }, false).unwrap()
    }

    #[test]
    fn test_insert_get_remove() {
        let mut facade = NullFacade::new();
        let mut pool = TexturePool::new();
        let id = pool.insert(resource(&mut facade));
        assert!(pool.contains(id));
        assert_eq!(pool.len(), 1);

        let removed = pool.remove(id).unwrap();
        assert!(removed.hardware().is_some());
        assert!(!pool.contains(id));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_stale_id_after_reuse() {
        let mut facade = NullFacade::new();
        let mut pool = TexturePool::new();
        let first = pool.insert(resource(&mut facade));
        pool.remove(first);

        let second = pool.insert(resource(&mut facade));
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert!(pool.get(first).is_none());
        assert!(pool.get(second).is_some());
    }

    #[test]
    fn test_adopt_retires_donor() {
        let mut facade = NullFacade::new();
        let mut pool = TexturePool::new();
        let target = pool.insert(resource(&mut facade));
        let donor = pool.insert(resource(&mut facade));
        let donor_handle = pool.get(donor).unwrap().hardware();

        let displaced = pool.adopt(target, donor).unwrap();
        assert!(displaced.is_empty());
        assert!(!pool.contains(donor));
        assert_eq!(pool.get(target).unwrap().hardware(), donor_handle);
    }

    #[test]
    fn test_adopt_stale_target_keeps_donor() {
        let mut facade = NullFacade::new();
        let mut pool = TexturePool::new();
        let target = pool.insert(resource(&mut facade));
        let donor = pool.insert(resource(&mut facade));
        pool.remove(target);

        let err = pool.adopt(target, donor).unwrap_err();
        assert_eq!(err, TextureError::StaleId(target));
        assert!(pool.contains(donor));
    }
}
