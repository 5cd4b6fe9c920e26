pub mod operator;
pub mod executor;
pub mod result;
pub mod session;
pub mod drop_table_executor;

pub use drop_table_executor::DropTableExecutor;
pub use executor::execute;
pub use result::ExecutionResult;
pub use session::Session;
