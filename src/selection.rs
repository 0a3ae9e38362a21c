use crate::catalog::Catalog;
use crate::storage::{KeyValueStore, StorageError};
use crate::types::ProductId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const SELECTION_KEY: &str = "selectedProductIds";

/// Ordered set of selected product ids. Insertion order drives the summary list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ProductId>", into = "Vec<ProductId>")]
pub struct SelectionSet {
    ids: Vec<ProductId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Adds `id` if absent, removes it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, id: ProductId) -> bool {
        if let Some(index) = self.ids.iter().position(|existing| *existing == id) {
            self.ids.remove(index);
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Keeps only ids accepted by `keep`. Returns true when anything was dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(ProductId) -> bool) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| keep(*id));
        self.ids.len() != before
    }
}

impl From<Vec<ProductId>> for SelectionSet {
    fn from(raw: Vec<ProductId>) -> Self {
        raw.into_iter().collect()
    }
}

impl From<SelectionSet> for Vec<ProductId> {
    fn from(set: SelectionSet) -> Self {
        set.ids
    }
}

impl FromIterator<ProductId> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        let mut set = SelectionSet::new();
        for id in iter {
            if !set.contains(id) {
                set.ids.push(id);
            }
        }
        set
    }
}

/// Selection backed by one durable slot. Every mutation is written through.
pub struct SelectionStore<K> {
    store: K,
    current: SelectionSet,
}

impl<K: KeyValueStore> SelectionStore<K> {
    /// Opens the store and loads whatever the slot currently holds.
    pub fn open(store: K) -> Self {
        let current = load_from(&store);
        Self { store, current }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.current
    }

    /// Re-reads the slot, falling back to an empty set on missing or corrupt data.
    pub fn load(&mut self) -> SelectionSet {
        self.current = load_from(&self.store);
        self.current.clone()
    }

    pub fn save(&mut self, selection: &SelectionSet) -> Result<(), StorageError> {
        self.current = selection.clone();
        self.persist()
    }

    pub fn toggle(&mut self, id: ProductId) -> Result<bool, StorageError> {
        let selected = self.current.toggle(id);
        debug!(id, selected, "toggled product selection");
        self.persist()?;
        Ok(selected)
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.current.clear();
        self.persist()
    }

    /// Drops ids the catalog does not know about, persisting only if something changed.
    pub fn retain_known(&mut self, catalog: &Catalog) -> Result<(), StorageError> {
        if self.current.retain(|id| catalog.find(id).is_some()) {
            debug!(remaining = self.current.len(), "pruned stale selection ids");
            self.persist()?;
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), StorageError> {
        // Serializing a Vec<u64> cannot fail.
        let raw = serde_json::to_string(self.current.ids()).unwrap_or_else(|_| "[]".into());
        self.store.set(SELECTION_KEY, &raw)
    }
}

fn load_from<K: KeyValueStore>(store: &K) -> SelectionSet {
    let raw = match store.get(SELECTION_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return SelectionSet::new(),
        Err(err) => {
            warn!(error = %err, "could not read saved selection, starting empty");
            return SelectionSet::new();
        }
    };

    match serde_json::from_str::<SelectionSet>(&raw) {
        Ok(set) => set,
        Err(err) => {
            warn!(error = %err, "saved selection is malformed, starting empty");
            SelectionSet::new()
        }
    }
}
