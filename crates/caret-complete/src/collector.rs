// Reachability collector: the categories proposed at the cursor.

use std::collections::BTreeSet;

use caret_core::Category;
use hashbrown::HashSet;

/// Accumulates proposed categories for one request. Duplicates are ignored.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    categories: HashSet<Category>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn collect(&mut self, category: Category) {
        self.categories.insert(category);
    }

    /// Sorted snapshot of everything collected so far.
    pub fn collected(&self) -> BTreeSet<Category> {
        self.categories.iter().copied().collect()
    }

    pub fn contains(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
