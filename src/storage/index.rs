use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::catalog::FieldMeta;
use crate::common::{RsqlError, RsqlResult, Value};

use super::record::Rid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMeta {
    pub name: String,
    pub field: FieldMeta,
    pub unique: bool,
}

/// Ordered map from a field's value to the RIDs holding it.
pub trait Index: Send + Sync {
    fn index_meta(&self) -> &IndexMeta;

    fn field_meta(&self) -> &FieldMeta {
        &self.index_meta().field
    }

    fn insert_entry(&mut self, key: &Value, rid: Rid) -> RsqlResult<()>;

    fn delete_entry(&mut self, key: &Value, rid: Rid) -> RsqlResult<()>;

    fn contains_entry(&self, key: &Value, rid: Rid) -> bool;

    /// RIDs stored under `key`, in RID order.
    fn lookup(&self, key: &Value) -> Vec<Rid>;

    /// Move `rid` from `old_key` to `new_key`.
    /// Implementations that can validate both halves up front should override this
    /// so the pair either fully applies or leaves the index untouched.
    fn replace_entry(&mut self, old_key: &Value, new_key: &Value, rid: Rid) -> RsqlResult<()> {
        self.delete_entry(old_key, rid)?;
        self.insert_entry(new_key, rid)
    }
}

pub struct BTreeIndex {
    meta: IndexMeta,
    entries: BTreeMap<Value, BTreeSet<Rid>>,
}

impl BTreeIndex {
    pub fn new(name: &str, field: FieldMeta, unique: bool) -> Self {
        BTreeIndex {
            meta: IndexMeta {
                name: name.to_string(),
                field,
                unique,
            },
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(|rids| rids.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_insert(&self, key: &Value, rid: Rid) -> RsqlResult<()> {
        if let Some(rids) = self.entries.get(key) {
            if rids.contains(&rid) {
                return Err(RsqlError::IndexError(format!(
                    "Entry ({}, {}) already exists in index {}", key, rid, self.meta.name)));
            }
            // NULLs never collide
            if self.meta.unique && !key.is_null() && !rids.is_empty() {
                return Err(RsqlError::IndexError(format!(
                    "Unique constraint violation on index {} for key {}", self.meta.name, key)));
            }
        }
        Ok(())
    }

    fn check_delete(&self, key: &Value, rid: Rid) -> RsqlResult<()> {
        if !self.contains_entry(key, rid) {
            return Err(RsqlError::IndexError(format!(
                "Entry ({}, {}) not found in index {}", key, rid, self.meta.name)));
        }
        Ok(())
    }

    fn remove_unchecked(&mut self, key: &Value, rid: Rid) {
        if let Some(rids) = self.entries.get_mut(key) {
            rids.remove(&rid);
            if rids.is_empty() {
                self.entries.remove(key);
            }
        }
    }
}

impl Index for BTreeIndex {
    fn index_meta(&self) -> &IndexMeta {
        &self.meta
    }

    fn insert_entry(&mut self, key: &Value, rid: Rid) -> RsqlResult<()> {
        self.check_insert(key, rid)?;
        self.entries.entry(key.clone()).or_default().insert(rid);
        Ok(())
    }

    fn delete_entry(&mut self, key: &Value, rid: Rid) -> RsqlResult<()> {
        self.check_delete(key, rid)?;
        self.remove_unchecked(key, rid);
        Ok(())
    }

    fn contains_entry(&self, key: &Value, rid: Rid) -> bool {
        self.entries.get(key).is_some_and(|rids| rids.contains(&rid))
    }

    fn lookup(&self, key: &Value) -> Vec<Rid> {
        self.entries
            .get(key)
            .map(|rids| rids.iter().copied().collect())
            .unwrap_or_default()
    }

    fn replace_entry(&mut self, old_key: &Value, new_key: &Value, rid: Rid) -> RsqlResult<()> {
        self.check_delete(old_key, rid)?;
        if old_key != new_key {
            self.check_insert(new_key, rid)?;
        }
        self.remove_unchecked(old_key, rid);
        self.entries.entry(new_key.clone()).or_default().insert(rid);
        debug!("index {} moved {} from {} to {}", self.meta.name, rid, old_key, new_key);
        Ok(())
    }
}
