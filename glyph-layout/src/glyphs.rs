use indexmap::IndexSet;

use crate::{error::LoadError, id::GlyphId};

/// Registry of glyph names, assigning each a [`GlyphId`] in order of registration.
#[derive(Debug, Default, Clone)]
pub struct GlyphSet {
    names: IndexSet<String>,
}

impl GlyphSet {
    /// Look up this glyph, registering it if it's new.
    pub fn intern(&mut self, name: &str) -> GlyphId {
        if let Some(index) = self.names.get_index_of(name) {
            return GlyphId(index as u16);
        }
        let (index, _) = self.names.insert_full(name.to_owned());
        GlyphId(index as u16)
    }

    /// Look up a glyph that must already be registered.
    pub fn get(&self, name: &str) -> Result<GlyphId, LoadError> {
        self.names
            .get_index_of(name)
            .map(|i| GlyphId(i as u16))
            .ok_or_else(|| LoadError::UnknownGlyph {
                label: name.to_owned(),
            })
    }

    /// The name this glyph was registered under.
    pub fn name(&self, id: GlyphId) -> &str {
        self.names
            .get_index(id.0 as usize)
            .map(String::as_str)
            .unwrap_or("?")
    }

    /// All glyphs, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (GlyphId, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (GlyphId(i as u16), name.as_str()))
    }

    /// Number of registered glyphs.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut glyphs = GlyphSet::default();
        let a = glyphs.intern("A");
        let b = glyphs.intern("B");
        assert_eq!(glyphs.intern("A"), a);
        assert_ne!(a, b);
        assert_eq!(glyphs.name(b), "B");
        assert_eq!(glyphs.get("B").unwrap(), b);
        assert!(matches!(
            glyphs.get("Z"),
            Err(LoadError::UnknownGlyph { label }) if label == "Z"
        ));
        assert_eq!(glyphs.len(), 2);
    }
}
