//! Export core modules shared by the CLI and its callers.

#[cfg(feature = "excel")]
pub mod excel_core;
