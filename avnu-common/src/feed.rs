//! Id-keyed feed reducer
//!
//! In-memory lists fed by two independent write sources (a direct fetch and
//! a racing push event) must not append blindly: the same row can arrive
//! through both paths. All mutations go through an id-keyed upsert, so a
//! duplicate insert replaces the existing entry instead of adding a second
//! copy.

use std::collections::HashMap;

/// Anything that carries a stable row id
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Where new (previously unseen) keys are placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOrder {
    /// Newest entries first (notification feeds)
    Front,
    /// Oldest entries first (message history, `created_at` ascending)
    Back,
}

/// Ordered collection with id-keyed upsert semantics
#[derive(Debug, Clone)]
pub struct Feed<T: Keyed> {
    order: Vec<String>,
    items: HashMap<String, T>,
    insert_order: InsertOrder,
}

impl<T: Keyed> Feed<T> {
    pub fn new(insert_order: InsertOrder) -> Self {
        Self {
            order: Vec::new(),
            items: HashMap::new(),
            insert_order,
        }
    }

    /// Insert or replace by key
    ///
    /// Replacing keeps the entry's position. Returns `true` when the key was
    /// previously unseen.
    pub fn upsert(&mut self, item: T) -> bool {
        let key = item.key().to_string();
        let newly_inserted = !self.items.contains_key(&key);
        if newly_inserted {
            match self.insert_order {
                InsertOrder::Front => self.order.insert(0, key.clone()),
                InsertOrder::Back => self.order.push(key.clone()),
            }
        }
        self.items.insert(key, item);
        newly_inserted
    }

    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            self.upsert(item);
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in feed order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|k| self.items.get(k))
    }

    /// Owned snapshot in feed order
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }
}
