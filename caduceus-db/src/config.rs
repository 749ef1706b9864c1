//! Connection and queue configuration

use std::time::Duration;

/// Parameters for a single database connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

/// Parameters for one worker's connection pool.
#[derive(Debug, Clone)]
pub struct ConnectionPoolConfig {
    pub connection: ConnectionConfig,
    pub min_size: u32,
    pub max_size: u32,
}

/// Parameters of the in-worker copy-task queue.
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    pub queue_max_size: usize,
    pub queue_workers_number: usize,
    pub task_timeout: Duration,
    pub join_timeout: Duration,
}

impl QueueConfig {
    pub fn new(queue_max_size: usize, queue_workers_number: usize) -> Self {
        Self {
            queue_max_size,
            queue_workers_number,
            task_timeout: Duration::from_secs(40),
            join_timeout: Duration::from_secs(50),
        }
    }
}
