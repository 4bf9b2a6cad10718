//! The account cleanup pipeline: window scanning, reminder dispatch,
//! billing reconciliation, and permanent deletion.

mod engine;
mod report;
mod windows;

pub use engine::CleanupEngine;
pub use report::RunReport;
pub use windows::{WindowBounds, window_bounds};
