pub mod trx;
pub use trx::{Trx, TrxRef, TrxState, UndoRecord};
pub mod manager;
pub use manager::TrxManager;
