//! Optscope Storage - durable result table
//!
//! ## Core Principles
//!
//! 1. **Append-only**: rows are only ever added; the header is written once
//! 2. **Durable per row**: each append is flushed before returning, so a crash
//!    keeps every row recorded so far
//! 3. **No interleaving**: concurrent appenders serialize on the table lock
//!
//! Row order follows task completion. Consumers needing filename order sort
//! downstream.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use optscope_storage::ResultTable;
//!
//! let table = ResultTable::initialize("features.csv")?;
//! table.append(&result)?;
//! ```

pub mod error;
pub mod row;
pub mod table;

pub use error::{ErrorKind, Result, StorageError};
pub use row::{COLUMN_COUNT, HEADER};
pub use table::{read_rows, ResultTable};
