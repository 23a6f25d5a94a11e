//! Item arena.
//!
//! Items live in a `BTreeMap` keyed by a monotonically increasing id, so
//! iteration order is creation order, which is also the simple stacking
//! order of the canvas.

use crate::item::{CanvasItem, ItemId, ItemKind, ItemStyle, Tag};
use kurbo::{Point, Rect};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Which items an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemSelector {
    All,
    Tag(Tag),
    Items(Vec<ItemId>),
}

impl ItemSelector {
    pub fn matches(&self, item: &CanvasItem) -> bool {
        match self {
            ItemSelector::All => true,
            ItemSelector::Tag(tag) => item.has_tag(*tag),
            ItemSelector::Items(ids) => ids.contains(&item.id),
        }
    }
}

/// Arena of canvas items with a monotonic id allocator.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: BTreeMap<ItemId, CanvasItem>,
    next_id: u64,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new item. The id is monotonically increasing and never
    /// reused within a session. Persisted-item bookkeeping tags (`All`, plus
    /// the `Text`/`Image` filter tags) are applied here.
    pub fn create(&mut self, kind: ItemKind, points: Vec<Point>, style: ItemStyle) -> ItemId {
        let mut tags = BTreeSet::from([Tag::All]);
        match kind {
            ItemKind::Text => {
                tags.insert(Tag::Text);
            }
            ItemKind::Image => {
                tags.insert(Tag::Image);
            }
            _ => {}
        }
        self.create_with_tags(kind, points, style, tags)
    }

    /// Allocate a new item with an explicit tag set (grid lines use this to
    /// carry `Grid`+`NoSave` instead of `All`).
    pub fn create_with_tags(
        &mut self,
        kind: ItemKind,
        points: Vec<Point>,
        style: ItemStyle,
        tags: BTreeSet<Tag>,
    ) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.items.insert(
            id,
            CanvasItem {
                id,
                kind,
                points,
                style,
                tags,
                hidden: false,
            },
        );
        id
    }

    pub fn remove(&mut self, id: ItemId) -> Option<CanvasItem> {
        self.items.remove(&id)
    }

    /// Remove every item, keeping the allocator position so ids are not
    /// reused after a load.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, id: ItemId) -> Option<&CanvasItem> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut CanvasItem> {
        self.items.get_mut(&id)
    }

    /// Items in stacking (creation) order.
    pub fn iter(&self) -> impl Iterator<Item = &CanvasItem> {
        self.items.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CanvasItem> {
        self.items.values_mut()
    }

    pub fn ids_matching(&self, selector: &ItemSelector) -> Vec<ItemId> {
        self.iter()
            .filter(|item| selector.matches(item))
            .map(|item| item.id)
            .collect()
    }

    pub fn ids_with_tag(&self, tag: Tag) -> Vec<ItemId> {
        self.ids_matching(&ItemSelector::Tag(tag))
    }

    /// Union bounding box of the items matching `selector`; `None` when
    /// nothing matches or nothing has geometry.
    pub fn bounding_box(&self, selector: &ItemSelector) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for item in self.iter().filter(|i| selector.matches(i)) {
            if let Some(b) = item.bounds() {
                result = Some(match result {
                    Some(r) => r.union(b),
                    None => b,
                });
            }
        }
        result
    }

    /// Bounding box of persisted content (everything not tagged `NoSave`).
    pub fn content_bounds(&self) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for item in self.iter().filter(|i| !i.is_no_save()) {
            if let Some(b) = item.bounds() {
                result = Some(match result {
                    Some(r) => r.union(b),
                    None => b,
                });
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
