use crate::error::PgCdcResult;
use crate::event::Event;
use async_trait::async_trait;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

/// A source of events, driven by a host orchestrator.
#[async_trait]
pub trait Input {
    fn id(&self) -> String;

    /// Runs until cancelled or until the session fails, pushing events onto `tx`.
    ///
    /// Restarting a failed session is up to the caller.
    async fn handle(&mut self, cancel: CancellationToken, tx: Sender<Event>) -> PgCdcResult<()>;
}
