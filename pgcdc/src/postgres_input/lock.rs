use crate::error::generic::describe_postgres_error;
use crate::error::{PgCdcError, PgCdcResult};
use crate::postgres_input::connection::connect;
use log::{info, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, Config};

// Nothing on the lease connection may time out the lock wait or the idle
// transaction that holds the lock.
const LEASE_SESSION_SETUP: &str = "SET statement_timeout = 0;
SET lock_timeout = 0;
SET idle_in_transaction_session_timeout = 0;
BEGIN;";

/// Exclusive hold on a connector's lock row.
///
/// The lease owns a dedicated connection with an open transaction that has
/// selected the lock row `FOR UPDATE`. The lock lasts exactly as long as that
/// transaction: [`LockLease::release`] rolls it back, and dropping the lease on
/// any other path closes the connection, which makes the server release it.
pub struct LockLease {
    client: Client,
    driver: JoinHandle<()>,
    lost: oneshot::Receiver<String>,
    lock_table: String,
}

impl LockLease {
    /// Blocks until this instance holds the lock on `qualified_lock_table`.
    ///
    /// Waiters queue inside Postgres; which one is granted the lock next is
    /// up to the server.
    pub async fn acquire(config: &Config, qualified_lock_table: &str) -> PgCdcResult<Self> {
        let (client, connection) = connect(config).await?;

        let (lost_tx, lost) = oneshot::channel();
        let driver = tokio::spawn(async move {
            let reason = match connection.await {
                Ok(()) => "connection closed".to_string(),
                Err(e) => describe_postgres_error(&e),
            };
            let _ = lost_tx.send(reason);
        });

        let lease = LockLease {
            client,
            driver,
            lost,
            lock_table: qualified_lock_table.to_string(),
        };

        lease.client.batch_execute(LEASE_SESSION_SETUP).await?;

        info!("Waiting for leadership lock on {}", lease.lock_table);
        let query = format!(
            "SELECT resource FROM {} WHERE resource = 1 FOR UPDATE",
            lease.lock_table
        );
        let rows = lease.client.query(query.as_str(), &[]).await?;
        if rows.is_empty() {
            return Err(PgCdcError::LockRowMissingError(lease.lock_table.clone()));
        }

        info!("Acquired leadership lock on {}", lease.lock_table);
        Ok(lease)
    }

    /// Resolves once the lease connection has gone away, i.e. the lock is no
    /// longer held. Must not be polled again after it resolves.
    pub async fn lost(&mut self) -> PgCdcError {
        match (&mut self.lost).await {
            Ok(reason) => PgCdcError::LockLostError(reason),
            Err(_) => PgCdcError::LockLostError("connection driver stopped".to_string()),
        }
    }

    pub async fn release(self) {
        if let Err(e) = self.client.batch_execute("ROLLBACK").await {
            warn!("Rolling back lock transaction on {}: {}", self.lock_table, e);
        }
        info!("Released leadership lock on {}", self.lock_table);
    }
}

impl Drop for LockLease {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
