use std::rc::Rc;

use super::TextureHandle;

/// Hard upper bound on texture slots per batch (sampler bindings in the
/// batch shader).
pub const MAX_TEXTURE_SLOTS: usize = 16;

/// Slot id meaning "untextured".
pub const NO_TEXTURE_SLOT: u32 = 0;

/// Distinct textures referenced by one batch, in first-seen order.
///
/// Slot ids handed to the vertex packer are `1 + index`; `0` is reserved
/// for untextured shapes.
#[derive(Debug)]
pub struct TextureSlots {
    textures: Vec<TextureHandle>,
    capacity: usize,
}

impl TextureSlots {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity <= MAX_TEXTURE_SLOTS);
        Self {
            textures: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Identity membership test.
    #[inline]
    pub fn contains(&self, texture: &TextureHandle) -> bool {
        self.textures.iter().any(|t| Rc::ptr_eq(t, texture))
    }

    #[inline]
    pub fn has_free_slot(&self) -> bool {
        self.textures.len() < self.capacity
    }

    /// Whether a shape with `texture` can join without exceeding capacity.
    #[inline]
    pub fn accepts(&self, texture: Option<&TextureHandle>) -> bool {
        match texture {
            None => true,
            Some(t) => self.contains(t) || self.has_free_slot(),
        }
    }

    /// Returns the slot id of `texture`, registering it if needed.
    ///
    /// `None` maps to [`NO_TEXTURE_SLOT`]. Registering past capacity is a
    /// caller bug; it is caught in debug builds and degrades to untextured
    /// in release builds.
    pub fn slot_for(&mut self, texture: Option<&TextureHandle>) -> u32 {
        let Some(texture) = texture else {
            return NO_TEXTURE_SLOT;
        };

        if let Some(i) = self.textures.iter().position(|t| Rc::ptr_eq(t, texture)) {
            return i as u32 + 1;
        }

        if !self.has_free_slot() {
            debug_assert!(false, "texture slot registry over capacity ({})", self.capacity);
            return NO_TEXTURE_SLOT;
        }

        self.textures.push(Rc::clone(texture));
        self.textures.len() as u32
    }

    /// Registered textures; `textures()[i]` is bound to slot `i + 1`.
    #[inline]
    pub fn textures(&self) -> &[TextureHandle] {
        &self.textures
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Texture;

    #[test]
    fn untextured_maps_to_slot_zero() {
        let mut slots = TextureSlots::new(8);
        assert_eq!(slots.slot_for(None), NO_TEXTURE_SLOT);
        assert!(slots.is_empty());
    }

    #[test]
    fn slots_start_at_one_in_first_seen_order() {
        let mut slots = TextureSlots::new(8);
        let a = Texture::detached("a", 1, 1);
        let b = Texture::detached("b", 1, 1);

        assert_eq!(slots.slot_for(Some(&a)), 1);
        assert_eq!(slots.slot_for(Some(&b)), 2);
        assert_eq!(slots.slot_for(Some(&a)), 1);
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn membership_is_by_identity() {
        let mut slots = TextureSlots::new(8);
        let a = Texture::detached("same", 4, 4);
        let twin = Texture::detached("same", 4, 4);
        slots.slot_for(Some(&a));

        assert!(slots.contains(&Rc::clone(&a)));
        assert!(!slots.contains(&twin));
    }

    #[test]
    fn full_registry_only_accepts_resident_textures() {
        let mut slots = TextureSlots::new(2);
        let a = Texture::detached("a", 1, 1);
        let b = Texture::detached("b", 1, 1);
        let c = Texture::detached("c", 1, 1);
        slots.slot_for(Some(&a));
        slots.slot_for(Some(&b));

        assert!(!slots.has_free_slot());
        assert!(slots.accepts(Some(&a)));
        assert!(slots.accepts(None));
        assert!(!slots.accepts(Some(&c)));
    }
}
