use crate::error::{PgCdcError, PgCdcResult};
use crate::event::Event;
use crate::postgres_input::decoder::Decoder;
use crate::postgres_input::policy::DecodePolicy;
use log::{debug, warn};
use std::future::Future;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Drives one listening session: waits on whichever of notifications,
/// listener errors, lock loss or cancellation comes first.
///
/// Events go out in the order their notifications arrived. Sending blocks
/// while the consumer is behind.
pub async fn run<L>(
    decoder: &Decoder,
    decode_policy: DecodePolicy,
    notifications: &mut mpsc::Receiver<String>,
    errors: &mut mpsc::Receiver<PgCdcError>,
    lock_lost: L,
    cancel: &CancellationToken,
    output: &mpsc::Sender<Event>,
) -> PgCdcResult<()>
where
    L: Future<Output = PgCdcError>,
{
    tokio::pin!(lock_lost);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => return Ok(()),
            err = &mut lock_lost => return Err(err),
            payload = notifications.recv() => match payload {
                Some(payload) => {
                    if !handle(decoder, decode_policy, &payload, cancel, output).await? {
                        return Ok(());
                    }
                }
                // The listener closes its notification stream after reporting
                // why it stopped, so look for that reason first.
                None => return Err(errors.recv().await.unwrap_or(PgCdcError::ListenerClosedError)),
            },
            err = errors.recv() => return Err(err.unwrap_or(PgCdcError::ListenerClosedError)),
        }
    }
}

/// Returns `Ok(false)` if cancelled while waiting on the output channel.
async fn handle(
    decoder: &Decoder,
    decode_policy: DecodePolicy,
    payload: &str,
    cancel: &CancellationToken,
    output: &mpsc::Sender<Event>,
) -> PgCdcResult<bool> {
    let event = match decoder.decode(payload) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!("Discarding lock table notification");
            return Ok(true);
        }
        Err(e) => match decode_policy {
            DecodePolicy::Skip => {
                warn!("Skipping notification {:?}: {}", payload, e);
                return Ok(true);
            }
            DecodePolicy::Fail => return Err(e),
        },
    };

    tokio::select! {
        _ = cancel.cancelled() => Ok(false),
        sent = output.send(event) => sent.map(|_| true).map_err(|_| PgCdcError::OutputClosedError),
    }
}
