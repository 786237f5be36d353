//! Shared helpers.

pub mod path;
mod plural;
pub mod task;

pub use plural::plural_count;
