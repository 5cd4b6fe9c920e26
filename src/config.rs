//! This file provide some configuration for rsql-dml
//! Caution: the record layout depends on the sizes below, tables created with
//! one setting are not readable with another.

pub const _NAME: &str = "rsql-dml";
pub const _VERSION: &str = "0.1.0";

pub const LOG_LEVEL: &str = "info";
pub const LOG_PATH: &str = "./logs/rsql-dml.log";

pub const MAX_TABLE_NAME_SIZE: usize = 64; // 64 bytes
pub const MAX_COL_NAME_SIZE: usize = 64; // 64 bytes
pub const MAX_CHARS_SIZE: usize = 4096; // 4 KB

pub const PAGE_SIZE_BYTES: usize = 4 * 1024; // 4 KB

pub const DEFAULT_DB_NAME: &str = "sys";
