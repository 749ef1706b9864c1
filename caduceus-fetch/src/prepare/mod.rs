//! Turning downloaded archives into the flat files the parsers read

pub mod files;
pub mod preparer;
pub mod system;

pub use preparer::FilePreparer;
pub use system::{SystemPreparer, SystemPreparerConfig};
