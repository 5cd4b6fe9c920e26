use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::common::{RsqlError, RsqlResult};
use crate::config::DEFAULT_DB_NAME;
use crate::transaction::TrxManager;

use super::db::Db;

/// Process-level registry of databases.
pub struct Handler {
    dbs: RwLock<HashMap<String, Arc<Db>>>,
    trx_manager: TrxManager,
}

impl Handler {
    pub fn new() -> Self {
        Handler {
            dbs: RwLock::new(HashMap::new()),
            trx_manager: TrxManager::default(),
        }
    }

    pub fn trx_manager(&self) -> &TrxManager {
        &self.trx_manager
    }

    /// A handler holding only the default database.
    pub fn with_default_db() -> RsqlResult<Self> {
        let handler = Handler::new();
        handler.create_db(DEFAULT_DB_NAME)?;
        Ok(handler)
    }

    pub fn create_db(&self, db_name: &str) -> RsqlResult<Arc<Db>> {
        if db_name.trim().is_empty() {
            return Err(RsqlError::InvalidInput("Database name cannot be blank".to_string()));
        }
        let mut dbs = self.dbs.write()?;
        if dbs.contains_key(db_name) {
            return Err(RsqlError::InvalidInput(format!("Database {} already exists", db_name)));
        }
        let db = Arc::new(Db::new(db_name));
        dbs.insert(db_name.to_string(), db.clone());
        info!("created database {}", db_name);
        Ok(db)
    }

    pub fn find_db(&self, db_name: &str) -> RsqlResult<Option<Arc<Db>>> {
        let dbs = self.dbs.read()?;
        Ok(dbs.get(db_name).cloned())
    }

    pub fn drop_table(&self, db_name: &str, table_name: &str) -> RsqlResult<()> {
        let Some(db) = self.find_db(db_name)? else {
            warn!("drop table {} in unknown database {}", table_name, db_name);
            return Err(RsqlError::DatabaseNotFound(db_name.to_string()));
        };
        db.drop_table(table_name)
    }
}

impl Default for Handler {
    fn default() -> Self {
        Handler::new()
    }
}
