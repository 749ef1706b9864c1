//! Acquisition of the source corpora: download, archive preparation, update
//! detection, and environment checks

pub mod download;
pub mod prepare;
pub mod update;

pub use download::{Downloader, FileChunkCalculator, HttpClient};
pub use prepare::{FilePreparer, SystemPreparer, SystemPreparerConfig};
pub use update::UpdateChecker;
