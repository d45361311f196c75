use std::collections::BTreeMap;

use tt_types::{FrameNr, IdGen, TextId};

use crate::{Anchor, TextElement};

/// Arena of [`TextElement`]s with stable ids and single selection.
#[derive(Clone, Debug, Default)]
pub struct TextStore {
    texts: BTreeMap<TextId, TextElement>,
    id_gen: IdGen,
}

impl TextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an element bound to `anchor`, existing from `frame` onward.
    pub fn create(&mut self, anchor: Anchor, frame: FrameNr) -> TextId {
        let raw = self.id_gen.mint();
        let id = TextId::from_u64(raw);
        self.texts
            .insert(id, TextElement::new(id, anchor, frame, raw));
        id
    }

    #[inline]
    pub fn get(&self, id: TextId) -> Option<&TextElement> {
        self.texts.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: TextId) -> Option<&mut TextElement> {
        self.texts.get_mut(&id)
    }

    pub fn remove(&mut self, id: TextId) -> Option<TextElement> {
        self.texts.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Elements in id order (creation order).
    pub fn iter(&self) -> impl Iterator<Item = &TextElement> {
        self.texts.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TextElement> {
        self.texts.values_mut()
    }

    /// Elements glued to `anchor`.
    pub fn by_anchor(&self, anchor: Anchor) -> impl Iterator<Item = &TextElement> {
        self.texts.values().filter(move |t| t.anchor == anchor)
    }

    /// Selects `id` exclusively. Returns `false` if the element is gone.
    pub fn select(&mut self, id: TextId) -> bool {
        if !self.texts.contains_key(&id) {
            return false;
        }
        for text in self.texts.values_mut() {
            text.selected = text.id == id;
        }
        true
    }

    pub fn deselect_all(&mut self) {
        for text in self.texts.values_mut() {
            text.selected = false;
        }
    }

    pub fn selected(&self) -> Option<&TextElement> {
        self.texts.values().find(|t| t.selected)
    }
}

// ----------------------------------------------------------------------------

use serde::{Deserialize as _, Serialize as _};

#[derive(serde::Deserialize, serde::Serialize)]
struct TextStoreDoc {
    texts: Vec<TextElement>,
    id_gen: IdGen,
}

impl serde::Serialize for TextStore {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TextStoreDoc {
            texts: self.texts.values().cloned().collect(),
            id_gen: self.id_gen.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for TextStore {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let doc = TextStoreDoc::deserialize(deserializer)?;
        let mut id_gen = doc.id_gen;
        let mut texts = BTreeMap::new();
        for text in doc.texts {
            id_gen.reserve_through(text.id.as_u64());
            texts.insert(text.id, text);
        }
        Ok(Self { texts, id_gen })
    }
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tt_types::{PointId, TrackerId};

    use super::*;

    #[test]
    fn create_names_sequentially() {
        let mut store = TextStore::new();
        let a = store.create(Anchor::Point(PointId::from_u64(1)), FrameNr::ZERO);
        let b = store.create(Anchor::Point(PointId::from_u64(1)), FrameNr::ZERO);
        assert_eq!(store.get(a).unwrap().name, "Text 1");
        assert_eq!(store.get(b).unwrap().name, "Text 2");
    }

    #[test]
    fn selection_is_exclusive() {
        let mut store = TextStore::new();
        let a = store.create(Anchor::Point(PointId::from_u64(1)), FrameNr::ZERO);
        let b = store.create(Anchor::Point(PointId::from_u64(2)), FrameNr::ZERO);

        assert!(store.select(a));
        assert!(store.select(b));
        assert_eq!(store.selected().map(|t| t.id), Some(b));
        assert!(!store.get(a).unwrap().selected);

        store.deselect_all();
        assert!(store.selected().is_none());

        store.remove(b);
        assert!(!store.select(b));
    }

    #[test]
    fn by_anchor_filters() {
        let mut store = TextStore::new();
        let tracker = Anchor::Planar(TrackerId::from_u64(9));
        let point = Anchor::Point(PointId::from_u64(4));
        store.create(tracker, FrameNr::ZERO);
        store.create(tracker, FrameNr::ZERO);
        store.create(point, FrameNr::ZERO);

        assert_eq!(store.by_anchor(tracker).count(), 2);
        assert_eq!(store.by_anchor(point).count(), 1);
    }

    #[test]
    fn deletion_is_plain_removal() {
        let mut store = TextStore::new();
        let id = store.create(Anchor::Point(PointId::from_u64(1)), FrameNr::ZERO);
        assert!(store.remove(id).is_some());
        assert!(store.get(id).is_none());
        assert!(store.remove(id).is_none());
    }

    #[test]
    fn round_trips_through_serde() {
        let mut store = TextStore::new();
        let id = store.create(Anchor::Planar(TrackerId::from_u64(2)), FrameNr::new(5));
        store.get_mut(id).unwrap().content = "Hello".to_owned();

        let json = serde_json::to_string(&store).unwrap();
        let back: TextStore = serde_json::from_str(&json).unwrap();

        let text = back.get(id).unwrap();
        assert_eq!(text.content, "Hello");
        assert_eq!(text.created_frame, FrameNr::new(5));
        assert_eq!(text.anchor, Anchor::Planar(TrackerId::from_u64(2)));
    }
}
