//! Token models: redacted secrets, token records, diagnostics snapshots, and the cached slot.

pub mod token;

pub use token::{cache::*, info::*, record::*, secret::*};
