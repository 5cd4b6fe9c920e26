pub mod record;
pub use record::{Record, Rid};
mod heap;
pub use heap::RecordHeap;
pub mod index;
pub use index::{BTreeIndex, Index, IndexMeta};
pub mod table;
pub use table::{Table, TableRef};
