//! Plan generation and mapping compatibility checks.
//!
//! Both are pure functions over one channel's snapshot.

mod compat;
mod generator;

pub use compat::{check_mapping_compatibility, IncompatibleMapping};
pub use generator::{generate_plan, Plan};
