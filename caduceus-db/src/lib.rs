//! PostgreSQL side of the pipeline: bulk-copy adapter, schema lifecycle,
//! setup sizing, and the parallel copy engine

pub mod adapter;
pub mod config;
pub mod copier;
pub mod lifecycle;
pub mod queries;
pub mod sizing;

pub use adapter::{CopyAdapter, CopyRow, PostgresAdapter};
pub use config::{ConnectionConfig, ConnectionPoolConfig, QueueConfig};
pub use copier::CopyDriver;
pub use lifecycle::UniprotLifecycle;
