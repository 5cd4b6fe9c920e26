pub mod parse_defs;
pub mod parser;
pub use parser::parse;
pub mod stmt;
pub mod planner;
