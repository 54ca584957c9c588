//! Dose tracking and reminder reconciliation.
//!
//! Pipeline: stored collections → today's active set → per-dose status
//! → progress and attention badge
//!
//! Nothing here keeps state between calls. Every query re-reads the stored
//! collections and derives status from the dose log, so repeating a call is
//! always safe.

mod progress;
mod service;
mod today;

pub use progress::*;
pub use service::*;
pub use today::*;
