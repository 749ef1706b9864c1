//! The parallel copy engine: per-stream batch copiers feeding bounded
//! queues of in-flight COPY tasks, coordinated by the shutdown signal

pub mod batch;
pub mod driver;
pub mod queue;

pub use batch::BatchCopier;
pub use driver::CopyDriver;
pub use queue::AsyncQueueManager;
