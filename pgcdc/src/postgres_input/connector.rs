use crate::error::PgCdcResult;
use crate::event::Event;
use crate::input::input::Input;
use crate::postgres_input::config::PostgresInputConfig;
use crate::postgres_input::connection::{connect, parse_connection_string, spawn_connection};
use crate::postgres_input::decoder::Decoder;
use crate::postgres_input::identity::ConnectorIdentity;
use crate::postgres_input::listener::NotificationListener;
use crate::postgres_input::lock::LockLease;
use crate::postgres_input::schema::SchemaInstrumenter;
use crate::postgres_input::session;
use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::mpsc::Sender;
use tokio_postgres::{Client, Config};
use tokio_util::sync::CancellationToken;

/// Clusterable Postgres input.
///
/// Any number of replicas may run a `PostgresInput` with the same name
/// against the same database. Each one instruments the schema on startup,
/// but only the replica holding the connector's lock row listens for
/// changes, so every change is emitted once. When that replica's
/// connection goes away the lock passes to one of the waiting replicas.
pub struct PostgresInput {
    config: PostgresInputConfig,
    identity: ConnectorIdentity,
    pg_config: Config,
    client: Client,
    instrumenter: SchemaInstrumenter,
    decoder: Decoder,
}

impl PostgresInput {
    /// Validates the configuration and connects.
    ///
    /// Fails on an invalid name or connection string, and on any connection
    /// error, including taking longer than
    /// [`CONNECT_TIMEOUT`](crate::postgres_input::connection::CONNECT_TIMEOUT).
    pub async fn new(config: PostgresInputConfig) -> PgCdcResult<Self> {
        let identity = ConnectorIdentity::new(&config.name)?;
        let pg_config = parse_connection_string(&config.connection_string)?;

        let (client, connection) = connect(&pg_config).await?;
        spawn_connection(connection, "instrumentation");

        if !config.operations.is_empty() {
            debug!(
                "Operation filters {:?} declared for {}; all operations are delivered",
                config.operations, identity
            );
        }

        Ok(PostgresInput {
            instrumenter: SchemaInstrumenter::new(identity.clone(), config.schema.clone()),
            decoder: Decoder::new(&identity),
            config,
            identity,
            pg_config,
            client,
        })
    }

    /// Installs the trigger function, the table triggers and the lock table,
    /// returning the tables now covered.
    pub async fn configure(&mut self) -> PgCdcResult<Vec<String>> {
        if self.client.is_closed() {
            info!("Reconnecting instrumentation connection for {}", self.identity);
            let (client, connection) = connect(&self.pg_config).await?;
            spawn_connection(connection, "instrumentation");
            self.client = client;
        }

        self.instrumenter.instrument(&mut self.client).await
    }

    /// Blocks until this instance holds the connector's leadership lock.
    pub async fn acquire_lock(&self) -> PgCdcResult<LockLease> {
        let lock_table = self.instrumenter.qualify(&self.identity.lock_table());
        LockLease::acquire(&self.pg_config, &lock_table).await
    }

    async fn listen(
        &self,
        lease: &mut LockLease,
        cancel: &CancellationToken,
        tx: &Sender<Event>,
    ) -> PgCdcResult<()> {
        let mut listener = NotificationListener::listen(
            &self.pg_config,
            self.identity.channel(),
            self.config.listener_error_policy,
        )
        .await?;

        let NotificationListener {
            notifications,
            errors,
            ..
        } = &mut listener;

        session::run(
            &self.decoder,
            self.config.decode_policy,
            notifications,
            errors,
            lease.lost(),
            cancel,
            tx,
        )
        .await
    }
}

#[async_trait]
impl Input for PostgresInput {
    fn id(&self) -> String {
        self.identity.to_string()
    }

    async fn handle(&mut self, cancel: CancellationToken, tx: Sender<Event>) -> PgCdcResult<()> {
        self.configure().await?;

        let mut lease = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            lease = self.acquire_lock() => lease?,
        };

        let result = self.listen(&mut lease, &cancel, &tx).await;
        lease.release().await;

        if let Err(e) = &result {
            info!("Session for {} ended: {}", self.identity, e);
        }
        result
    }
}
