use serde::{Deserialize, Serialize};

/// A single catalog entry as persisted in the snapshot
///
/// Records are created once, when an item is first seen as novel, and are
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: i64,
    pub name: String,
}

impl CatalogRecord {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Name used when the catalog gives none
    pub fn placeholder_name(id: i64) -> String {
        format!("Emote_{}", id)
    }

    /// Whether this record still carries the synthetic placeholder name
    pub fn has_placeholder_name(&self) -> bool {
        self.name == Self::placeholder_name(self.id)
    }
}
