pub mod table_meta;
pub use table_meta::{AttrInfo, FieldMeta, TableMeta};
pub mod db;
pub use db::Db;
pub mod handler;
pub use handler::Handler;
