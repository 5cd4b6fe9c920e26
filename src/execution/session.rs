use std::sync::Arc;

use tracing::info;

use crate::catalog::{Db, Handler};
use crate::common::{RsqlError, RsqlResult};
use crate::transaction::TrxRef;

/// Per-connection state: the selected database and the open transaction.
pub struct Session {
    handler: Arc<Handler>,
    current_db: Option<Arc<Db>>,
    trx: Option<TrxRef>,
}

impl Session {
    pub fn new(handler: Arc<Handler>) -> Self {
        Session {
            handler,
            current_db: None,
            trx: None,
        }
    }

    pub fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }

    pub fn current_db(&self) -> Option<&Arc<Db>> {
        self.current_db.as_ref()
    }

    pub fn set_current_db(&mut self, db_name: &str) -> RsqlResult<()> {
        let Some(db) = self.handler.find_db(db_name)? else {
            return Err(RsqlError::DatabaseNotFound(db_name.to_string()));
        };
        info!("session switched to database {}", db_name);
        self.current_db = Some(db);
        Ok(())
    }

    pub fn trx(&self) -> Option<&TrxRef> {
        self.trx.as_ref()
    }

    pub(crate) fn begin_trx(&mut self) -> RsqlResult<&TrxRef> {
        if self.trx.is_some() {
            return Err(RsqlError::InvalidInput("A transaction is already active".to_string()));
        }
        Ok(&*self.trx.insert(self.handler.trx_manager().begin()))
    }

    pub(crate) fn take_trx(&mut self) -> Option<TrxRef> {
        self.trx.take()
    }
}
