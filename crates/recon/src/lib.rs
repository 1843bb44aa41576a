//! Address reconciliation between description database generations.
//!
//! A working list carries addresses resolved against one build of the ECU
//! software. When a new build moves variables around, the list's names are
//! still right but its addresses are stale. Reconciliation walks the list,
//! identifies each row in the original description by address, and rewrites
//! the row with the same variable's address from the new description.

pub mod engine;
pub mod error;

pub use engine::{ReconReport, Reconciler};
pub use error::ReconError;
