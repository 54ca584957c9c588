//! Domain models for the pillbox system.

mod dosage;
mod draft;
mod medication;
mod schedule;

pub use dosage::*;
pub use draft::*;
pub use medication::*;
pub use schedule::*;
