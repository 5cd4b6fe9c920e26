use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use super::trx::{Trx, TrxRef};

/// Hands out transactions with monotonically increasing ids.
pub struct TrxManager {
    trx_counter: AtomicU64,
}

impl TrxManager {
    pub fn new(start_trx_id: u64) -> Self {
        TrxManager {
            trx_counter: AtomicU64::new(start_trx_id),
        }
    }

    pub fn begin(&self) -> TrxRef {
        let id = self.trx_counter.fetch_add(1, Ordering::SeqCst);
        info!("transaction {} started", id);
        Trx::new(id).into_ref()
    }
}

impl Default for TrxManager {
    fn default() -> Self {
        TrxManager::new(1)
    }
}
