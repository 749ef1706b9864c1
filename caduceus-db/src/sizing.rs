//! Derivation of worker count, pool sizes and queue sizes from the
//! database's connection headroom

use caduceus_core::error::{CaduceusError, CaduceusResult};
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection, Row};
use tracing::{debug, warn};

use crate::config::{ConnectionConfig, ConnectionPoolConfig, QueueConfig};

/// What PostgreSQL hands out when the probing user may not read
/// `pg_stat_activity`.
const DEFAULT_AVAILABLE_CONNECTIONS: usize = 95;

const INSUFFICIENT_PRIVILEGE: &str = "42501";

/// Connection headroom: `max_connections - current activity`, plus one for
/// the probing connection itself, which closes before the pools open.
pub async fn available_connections_amount(config: &ConnectionConfig) -> CaduceusResult<usize> {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .username(&config.user)
        .password(&config.password);

    let mut connection = PgConnection::connect_with(&options)
        .await
        .map_err(|err| CaduceusError::ConnectionDatabase(err.to_string()))?;

    let result = probe_available_connections(&mut connection).await;
    connection
        .close()
        .await
        .map_err(|err| CaduceusError::ConnectionDatabase(err.to_string()))?;

    match result {
        Ok(available) => Ok(available),
        Err(err) if is_privilege_error(&err) => {
            warn!("insufficient privileges to probe connection headroom, assuming the default");
            Ok(DEFAULT_AVAILABLE_CONNECTIONS)
        }
        Err(err) => Err(CaduceusError::QueryExecution(err.to_string())),
    }
}

async fn probe_available_connections(
    connection: &mut PgConnection,
) -> Result<usize, sqlx::Error> {
    let max_connections: String = sqlx::query("SHOW max_connections")
        .fetch_one(&mut *connection)
        .await?
        .get(0);
    let active_connections: i64 = sqlx::query("SELECT COUNT(*) FROM pg_stat_activity")
        .fetch_one(&mut *connection)
        .await?
        .get(0);

    let max_connections = max_connections.parse::<i64>().unwrap_or(0);
    let available = (max_connections - active_connections).max(0) as usize + 1;

    debug!(max_connections, active_connections, available, "probed connection headroom");
    Ok(available)
}

fn is_privilege_error(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == INSUFFICIENT_PRIVILEGE)
}

/// Restrict the desired worker count by CPU count and connection headroom.
pub fn adjust_workers_by_connection_limit(
    desired_workers: usize,
    cpu_count: usize,
    available_connections: usize,
) -> usize {
    if desired_workers <= available_connections && desired_workers <= cpu_count {
        desired_workers
    } else if cpu_count <= available_connections {
        cpu_count
    } else {
        available_connections
    }
}

/// [`adjust_workers_by_connection_limit`] with this machine's CPU count.
pub fn effective_workers(desired_workers: usize, available_connections: usize) -> usize {
    adjust_workers_by_connection_limit(desired_workers, num_cpus::get(), available_connections)
}

/// Split the connection headroom evenly across workers.
pub fn setup_connection_pool_config(
    connection: ConnectionConfig,
    workers: usize,
    available_connections: usize,
) -> ConnectionPoolConfig {
    let (min_size, max_size) = pool_sizes(workers, available_connections);

    ConnectionPoolConfig {
        connection,
        min_size,
        max_size,
    }
}

/// Queue depth follows the pool size; two extra workers keep the queue
/// drained while copies wait on connections.
pub fn setup_queue_config(workers: usize, available_connections: usize) -> QueueConfig {
    const RESERVED_WORKERS: usize = 2;

    let (_, max_size) = pool_sizes(workers, available_connections);
    QueueConfig::new(max_size as usize, max_size as usize + RESERVED_WORKERS)
}

fn pool_sizes(workers: usize, available_connections: usize) -> (u32, u32) {
    let max_size = (available_connections / workers) as u32;
    let min_size = if max_size > 1 { max_size / 2 } else { 1 };
    (min_size, max_size)
}
