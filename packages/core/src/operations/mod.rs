//! Tree Operations
//!
//! Write-side operations over the cell store:
//!
//! - `OrderManager` - sibling ordering, insertion, reorder/reparent, subtree deletion
//! - `OperationError` - error taxonomy shared by every engine operation

mod error;
mod order;

pub use error::OperationError;
pub use order::OrderManager;
