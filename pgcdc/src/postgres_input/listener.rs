use crate::error::{PgCdcError, PgCdcResult};
use crate::postgres_input::connection::connect;
use crate::postgres_input::policy::ListenerErrorPolicy;
use crate::postgres_input::schema::quote_identifier;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_postgres::error::SqlState;
use tokio_postgres::{AsyncMessage, Client, Config};

/// How long an idle listener waits before checking its connection.
pub const PING_INTERVAL: Duration = Duration::from_secs(90);
pub const MIN_RECONNECT_INTERVAL: Duration = Duration::from_secs(1);
pub const MAX_RECONNECT_INTERVAL: Duration = Duration::from_secs(10);

// One slot: the pump only reads the next notification off the connection
// once the session has taken the previous one.
const NOTIFICATION_BUFFER: usize = 1;

type MessageStream = BoxStream<'static, Result<AsyncMessage, tokio_postgres::Error>>;

/// Subscription to one notification channel on its own connection.
///
/// Payloads arrive on `notifications`. The one error that stops the listener
/// arrives on `errors`, after which both channels close.
pub struct NotificationListener {
    pub notifications: mpsc::Receiver<String>,
    pub errors: mpsc::Receiver<PgCdcError>,
    supervisor: JoinHandle<()>,
}

impl NotificationListener {
    /// Connects and issues `LISTEN`. Failing to do either is returned here
    /// rather than on the error stream.
    pub async fn listen(
        config: &Config,
        channel: &str,
        policy: ListenerErrorPolicy,
    ) -> PgCdcResult<Self> {
        let (notification_tx, notifications) = mpsc::channel(NOTIFICATION_BUFFER);
        let (error_tx, errors) = mpsc::channel(1);

        let session = ListenSession::open(config, channel, &notification_tx).await?;
        info!("Listening on channel '{}' ({} policy)", channel, policy);

        let supervisor = tokio::spawn(supervise(
            config.clone(),
            channel.to_string(),
            policy,
            session,
            notification_tx,
            error_tx,
        ));

        Ok(NotificationListener {
            notifications,
            errors,
            supervisor,
        })
    }
}

impl Drop for NotificationListener {
    fn drop(&mut self) {
        self.supervisor.abort();
    }
}

struct ListenSession {
    client: Client,
    messages: MessageStream,
}

impl ListenSession {
    async fn open(
        config: &Config,
        channel: &str,
        notification_tx: &mpsc::Sender<String>,
    ) -> PgCdcResult<Self> {
        let (client, mut connection) = connect(config).await?;
        let messages = futures::stream::poll_fn(move |cx| connection.poll_message(cx)).boxed();

        let mut session = ListenSession { client, messages };
        session
            .execute(&format!("LISTEN {}", quote_identifier(channel)), notification_tx)
            .await?;
        Ok(session)
    }

    /// Runs `query` while continuing to drive the connection.
    async fn execute(
        &mut self,
        query: &str,
        notification_tx: &mpsc::Sender<String>,
    ) -> PgCdcResult<()> {
        let ListenSession { client, messages } = self;
        let query = client.simple_query(query);
        tokio::pin!(query);

        loop {
            tokio::select! {
                result = &mut query => {
                    result.map_err(PgCdcError::ListenerError)?;
                    return Ok(());
                }
                message = messages.next() => forward(message, notification_tx).await?,
            }
        }
    }

    /// Forwards notifications until the connection fails, and returns why.
    async fn pump(&mut self, notification_tx: &mpsc::Sender<String>) -> PgCdcError {
        let mut ping = interval_at(Instant::now() + PING_INTERVAL, PING_INTERVAL);

        loop {
            let result = tokio::select! {
                message = self.messages.next() => {
                    ping.reset();
                    forward(message, notification_tx).await
                }
                _ = ping.tick() => {
                    debug!("Pinging idle listener connection");
                    self.execute("SELECT 1", notification_tx).await
                }
            };

            if let Err(e) = result {
                return e;
            }
        }
    }
}

async fn forward(
    message: Option<Result<AsyncMessage, tokio_postgres::Error>>,
    notification_tx: &mpsc::Sender<String>,
) -> PgCdcResult<()> {
    match message {
        Some(Ok(AsyncMessage::Notification(notification))) => notification_tx
            .send(notification.payload().to_string())
            .await
            .map_err(|_| PgCdcError::ListenerClosedError),
        Some(Ok(AsyncMessage::Notice(notice))) => {
            debug!("Listener notice: {}", notice.message());
            Ok(())
        }
        Some(Ok(_)) => Ok(()),
        Some(Err(e)) => Err(PgCdcError::ListenerError(e)),
        None => Err(PgCdcError::ListenerClosedError),
    }
}

async fn supervise(
    config: Config,
    channel: String,
    policy: ListenerErrorPolicy,
    mut session: ListenSession,
    notification_tx: mpsc::Sender<String>,
    error_tx: mpsc::Sender<PgCdcError>,
) {
    loop {
        let err = session.pump(&notification_tx).await;
        if notification_tx.is_closed() {
            return;
        }

        if policy == ListenerErrorPolicy::Fatal || is_terminal(&err) {
            let _ = error_tx.send(err).await;
            return;
        }

        warn!("Listener on '{}' lost its connection: {}", channel, err);
        session = match reconnect(&config, &channel, &notification_tx).await {
            Ok(session) => session,
            Err(err) => {
                let _ = error_tx.send(err).await;
                return;
            }
        };
    }
}

async fn reconnect(
    config: &Config,
    channel: &str,
    notification_tx: &mpsc::Sender<String>,
) -> PgCdcResult<ListenSession> {
    let mut backoff = MIN_RECONNECT_INTERVAL;
    loop {
        tokio::time::sleep(backoff).await;

        match ListenSession::open(config, channel, notification_tx).await {
            Ok(session) => {
                info!("Listener on '{}' reconnected", channel);
                return Ok(session);
            }
            Err(err) if is_terminal(&err) => return Err(err),
            Err(err) => {
                warn!("Reconnecting listener on '{}' failed: {}", channel, err);
                backoff = next_backoff(backoff);
            }
        }
    }
}

pub fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_RECONNECT_INTERVAL)
}

/// Whether a listener failure should never be retried: bad credentials, an
/// unknown database, or anything that is not a transport problem.
pub fn is_terminal(err: &PgCdcError) -> bool {
    match err {
        PgCdcError::ListenerError(e) | PgCdcError::PostgresError(e) => match e.code() {
            Some(code) => {
                *code == SqlState::INVALID_PASSWORD
                    || *code == SqlState::INVALID_AUTHORIZATION_SPECIFICATION
                    || *code == SqlState::INVALID_CATALOG_NAME
            }
            None => false,
        },
        PgCdcError::ListenerClosedError | PgCdcError::ConnectTimeoutError(_) => false,
        _ => true,
    }
}
