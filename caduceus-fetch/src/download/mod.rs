//! HTTP acquisition of the UniProt and NCBI archives

pub mod chunker;
pub mod client;
pub mod downloader;

pub use chunker::FileChunkCalculator;
pub use client::HttpClient;
pub use downloader::Downloader;
