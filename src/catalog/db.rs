use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::common::{RsqlError, RsqlResult};
use crate::storage::{Table, TableRef};

use super::table_meta::{AttrInfo, TableMeta};

/// One database: a named set of tables.
pub struct Db {
    name: String,
    tables: RwLock<HashMap<String, TableRef>>,
    next_table_id: AtomicU64,
}

impl Db {
    pub fn new(name: &str) -> Self {
        Db {
            name: name.to_string(),
            tables: RwLock::new(HashMap::new()),
            next_table_id: AtomicU64::new(1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_table(&self, table_name: &str) -> RsqlResult<Option<TableRef>> {
        let tables = self.tables.read()?;
        Ok(tables.get(table_name).cloned())
    }

    pub fn create_table(&self, table_name: &str, attrs: &[AttrInfo]) -> RsqlResult<TableRef> {
        let mut tables = self.tables.write()?;
        if tables.contains_key(table_name) {
            return Err(RsqlError::TableExists(table_name.to_string()));
        }
        let table_id = self.next_table_id.fetch_add(1, Ordering::SeqCst);
        let meta = TableMeta::new(table_id, table_name, attrs)?;
        let table = Table::new(meta).into_ref();
        tables.insert(table_name.to_string(), table.clone());
        info!("created table {}.{} with id {}", self.name, table_name, table_id);
        Ok(table)
    }

    pub fn drop_table(&self, table_name: &str) -> RsqlResult<()> {
        let mut tables = self.tables.write()?;
        match tables.remove(table_name) {
            Some(_) => {
                info!("dropped table {}.{}", self.name, table_name);
                Ok(())
            }
            None => Err(RsqlError::TableNotFound(table_name.to_string())),
        }
    }

    /// Table names in sorted order.
    pub fn table_names(&self) -> RsqlResult<Vec<String>> {
        let tables = self.tables.read()?;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
