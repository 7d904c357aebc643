//! Process-wide interner for strings the renderer rasterizes.
//!
//! Screen text repeats from frame to frame (titles, button labels, wrapped
//! paragraph lines), so the renderer keys its pixmap cache by interned id
//! instead of hashing whole strings every frame.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
pub use string_cache::DefaultAtom as Atom;

#[derive(Default)]
struct Interner {
    atoms: Vec<Atom>,
    ids: HashMap<Atom, usize>,
}

lazy_static! {
    static ref TEXT_INTERNER: RwLock<Interner> = RwLock::new(Interner::default());
}

/// Intern a string and return its ID
pub fn intern_text(s: &str) -> usize {
    let atom = Atom::from(s);
    if let Some(id) = TEXT_INTERNER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .ids
        .get(&atom)
    {
        return *id;
    }
    let mut interner = TEXT_INTERNER.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(id) = interner.ids.get(&atom) {
        return *id;
    }
    let id = interner.atoms.len();
    interner.atoms.push(atom.clone());
    interner.ids.insert(atom, id);
    id
}

/// Current count of unique texts
pub fn text_count() -> usize {
    TEXT_INTERNER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .atoms
        .len()
}

pub fn get_text(id: usize) -> Option<Atom> {
    TEXT_INTERNER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .atoms
        .get(id)
        .cloned()
}

/// Cache key for one rasterized run of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextKey {
    pub id: usize,
    size_bits: u32,
    pub rgba: [u8; 4],
}

impl TextKey {
    pub fn new(text: &str, size_px: f32, rgba: [u8; 4]) -> Self {
        Self {
            id: intern_text(text),
            size_bits: size_px.to_bits(),
            rgba,
        }
    }

    pub fn size_px(&self) -> f32 {
        f32::from_bits(self.size_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let a = intern_text("Paragraph 1 of 3");
        let b = intern_text("Paragraph 1 of 3");
        assert_eq!(a, b);
        assert_eq!(get_text(a).as_deref(), Some("Paragraph 1 of 3"));
        assert!(text_count() > a);
    }

    #[test]
    fn unknown_id_is_none() {
        assert!(get_text(usize::MAX).is_none());
    }

    #[test]
    fn keys_differ_by_size_and_color() {
        let white = TextKey::new("Done", 20.0, [255; 4]);
        let bigger = TextKey::new("Done", 24.0, [255; 4]);
        let black = TextKey::new("Done", 20.0, [0, 0, 0, 255]);
        assert_ne!(white, bigger);
        assert_ne!(white, black);
        assert_eq!(white.size_px(), 20.0);
    }
}
