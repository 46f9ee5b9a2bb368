//! In-memory tables standing in for a database.

use std::collections::{BTreeMap, HashMap};

use super::{AttributeBatch, EntityRow, StoreBackend, StoreCall};
use crate::error::{StorageError, StorageResult};

const ENTITIES: &str = "entities";
const ATTRIBUTES: &str = "attributes";

/// An entity row as held by [`MemoryBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredEntity {
    /// Containing location's key.
    pub container_id: Option<String>,
    /// Type name.
    pub type_name: String,
    /// Last written revision.
    pub seq: u64,
    /// Last written location blob.
    pub location: String,
}

/// Entity and attribute tables kept in hash maps.
///
/// Enforces row existence the way a keyed table would: inserting an
/// existing key or updating a missing one is an error.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    entities: HashMap<String, StoredEntity>,
    attributes: HashMap<String, BTreeMap<String, String>>,
}

impl MemoryBackend {
    /// Creates empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates tables already holding `rows`, e.g. the world root.
    #[must_use]
    pub fn seeded(rows: impl IntoIterator<Item = EntityRow>) -> Self {
        let mut backend = Self::new();
        for row in rows {
            backend.entities.insert(
                row.id,
                StoredEntity {
                    container_id: row.container_id,
                    type_name: row.type_name,
                    seq: row.seq,
                    location: row.location,
                },
            );
        }
        backend
    }

    /// Looks up an entity row.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<&StoredEntity> {
        self.entities.get(id)
    }

    /// Looks up one attribute row.
    #[must_use]
    pub fn attribute(&self, entity_id: &str, name: &str) -> Option<&str> {
        self.attributes.get(entity_id)?.get(name).map(String::as_str)
    }

    /// Number of entity rows.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of attribute rows across all entities.
    #[must_use]
    pub fn attribute_count(&self) -> usize {
        self.attributes.values().map(BTreeMap::len).sum()
    }

    fn insert_attributes(&mut self, entity_id: String, batch: AttributeBatch) -> StorageResult<()> {
        if !self.entities.contains_key(&entity_id) {
            return Err(StorageError::MissingRow {
                table: ENTITIES,
                id: entity_id,
            });
        }
        let rows = self.attributes.entry(entity_id.clone()).or_default();
        if let Some(name) = batch.keys().find(|name| rows.contains_key(*name)) {
            return Err(StorageError::DuplicateRow {
                table: ATTRIBUTES,
                id: format!("{entity_id}.{name}"),
            });
        }
        rows.extend(batch);
        Ok(())
    }

    fn update_attributes(&mut self, entity_id: String, batch: AttributeBatch) -> StorageResult<()> {
        let Some(rows) = self.attributes.get_mut(&entity_id) else {
            return Err(StorageError::MissingRow {
                table: ATTRIBUTES,
                id: entity_id,
            });
        };
        if let Some(name) = batch.keys().find(|name| !rows.contains_key(*name)) {
            return Err(StorageError::MissingRow {
                table: ATTRIBUTES,
                id: format!("{entity_id}.{name}"),
            });
        }
        rows.extend(batch);
        Ok(())
    }
}

impl StoreBackend for MemoryBackend {
    fn apply(&mut self, call: StoreCall) -> StorageResult<()> {
        match call {
            StoreCall::InsertEntity(row) => {
                if self.entities.contains_key(&row.id) {
                    return Err(StorageError::DuplicateRow {
                        table: ENTITIES,
                        id: row.id,
                    });
                }
                self.entities.insert(
                    row.id,
                    StoredEntity {
                        container_id: row.container_id,
                        type_name: row.type_name,
                        seq: row.seq,
                        location: row.location,
                    },
                );
                Ok(())
            }
            StoreCall::UpdateEntity { id, seq, location } => {
                let Some(stored) = self.entities.get_mut(&id) else {
                    return Err(StorageError::MissingRow { table: ENTITIES, id });
                };
                stored.seq = seq;
                stored.location = location;
                Ok(())
            }
            StoreCall::DropEntity { id } => {
                self.attributes.remove(&id);
                match self.entities.remove(&id) {
                    Some(_) => Ok(()),
                    None => Err(StorageError::MissingRow { table: ENTITIES, id }),
                }
            }
            StoreCall::InsertAttributes { entity_id, batch } => self.insert_attributes(entity_id, batch),
            StoreCall::UpdateAttributes { entity_id, batch } => self.update_attributes(entity_id, batch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> EntityRow {
        EntityRow {
            id: id.to_owned(),
            container_id: Some("0".to_owned()),
            type_name: "tree".to_owned(),
            seq: 0,
            location: r#"{"pos":[0.0,0.0,0.0]}"#.to_owned(),
        }
    }

    fn batch(pairs: &[(&str, &str)]) -> AttributeBatch {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[test]
    fn test_insert_update_drop() {
        let mut backend = MemoryBackend::new();
        backend.apply(StoreCall::InsertEntity(row("1"))).unwrap();
        backend
            .apply(StoreCall::InsertAttributes {
                entity_id: "1".to_owned(),
                batch: batch(&[("hp", r#"{"val":10}"#)]),
            })
            .unwrap();
        backend
            .apply(StoreCall::UpdateAttributes {
                entity_id: "1".to_owned(),
                batch: batch(&[("hp", r#"{"val":5}"#)]),
            })
            .unwrap();
        backend
            .apply(StoreCall::UpdateEntity {
                id: "1".to_owned(),
                seq: 3,
                location: "{}".to_owned(),
            })
            .unwrap();

        assert_eq!(backend.attribute("1", "hp"), Some(r#"{"val":5}"#));
        assert_eq!(backend.entity("1").unwrap().seq, 3);

        backend.apply(StoreCall::DropEntity { id: "1".to_owned() }).unwrap();
        assert_eq!(backend.entity_count(), 0);
        assert_eq!(backend.attribute_count(), 0);
    }

    #[test]
    fn test_keyed_table_errors() {
        let mut backend = MemoryBackend::seeded([row("1")]);

        let err = backend.apply(StoreCall::InsertEntity(row("1"))).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateRow { table: "entities", .. }));

        let err = backend
            .apply(StoreCall::UpdateEntity {
                id: "2".to_owned(),
                seq: 1,
                location: "{}".to_owned(),
            })
            .unwrap_err();
        assert!(matches!(err, StorageError::MissingRow { table: "entities", .. }));

        let err = backend
            .apply(StoreCall::UpdateAttributes {
                entity_id: "1".to_owned(),
                batch: batch(&[("hp", "{}")]),
            })
            .unwrap_err();
        assert!(matches!(err, StorageError::MissingRow { table: "attributes", .. }));

        backend
            .apply(StoreCall::InsertAttributes {
                entity_id: "1".to_owned(),
                batch: batch(&[("hp", "{}")]),
            })
            .unwrap();
        let err = backend
            .apply(StoreCall::InsertAttributes {
                entity_id: "1".to_owned(),
                batch: batch(&[("hp", "{}")]),
            })
            .unwrap_err();
        assert_eq!(
            err,
            StorageError::DuplicateRow {
                table: "attributes",
                id: "1.hp".to_owned()
            }
        );
    }
}
