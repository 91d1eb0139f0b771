use log::{error, warn};
use pgcdc::error::PgCdcResult;
use pgcdc::event::Event;
use pgcdc::process::process::Process;
use pgcdc::process::status::{ProcessStatus, Status};
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl DispatchSummary {
    fn record(&mut self, result: Result<PgCdcResult<ProcessStatus>, JoinError>) {
        match result {
            Ok(Ok(status)) if status.status == Status::Success => self.succeeded += 1,
            Ok(Ok(status)) => {
                warn!("Process {} finished with status {}", status.name, status.status);
                self.failed += 1;
            }
            Ok(Err(e)) => {
                error!("Process run failed: {}", e);
                self.failed += 1;
            }
            Err(e) => {
                error!("Process task failed: {}", e);
                self.failed += 1;
            }
        }
    }
}

/// Runs `process` once per event until the event channel closes, with at most
/// `max_concurrent_processes` runs in flight. Waits for in-flight runs before
/// returning.
pub async fn dispatch<P>(
    process: Arc<P>,
    mut events: Receiver<Event>,
    max_concurrent_processes: usize,
    cancel: CancellationToken,
) -> DispatchSummary
where
    P: Process + Send + Sync + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrent_processes.max(1)));
    let mut running = JoinSet::new();
    let mut summary = DispatchSummary::default();

    loop {
        tokio::select! {
            Some(result) = running.join_next(), if !running.is_empty() => summary.record(result),
            event = events.recv() => {
                let Some(event) = event else { break };
                let Ok(permit) = semaphore.clone().acquire_owned().await else { break };

                let process = process.clone();
                let cancel = cancel.clone();
                running.spawn(async move {
                    let _permit = permit;
                    process.run(cancel, event).await
                });
            }
        }
    }

    while let Some(result) = running.join_next().await {
        summary.record(result);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use pgcdc::error::PgCdcError;
    use pgcdc::event::Operation;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    mock! {
        pub TestProcess {}

        #[async_trait]
        impl Process for TestProcess {
            fn id(&self) -> String;
            async fn run(&self, cancel: CancellationToken, event: Event) -> PgCdcResult<ProcessStatus>;
        }
    }

    fn event(operation: Operation) -> Event {
        Event {
            location: "orders".into(),
            operation,
            id: "1".into(),
            trigger: "orders_input".into(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_records_outcomes() {
        let mut process = MockTestProcess::new();
        process
            .expect_run()
            .times(3)
            .returning(|_, event| match event.operation {
                Operation::Create => Ok(ProcessStatus {
                    name: "mock".into(),
                    status: Status::Success,
                    logs: vec![],
                }),
                Operation::Update => Ok(ProcessStatus {
                    name: "mock".into(),
                    status: Status::Fail,
                    logs: vec!["exit 1".into()],
                }),
                _ => Err(PgCdcError::OutputClosedError),
            });

        let (tx, rx) = mpsc::channel(4);
        tx.send(event(Operation::Create)).await.unwrap();
        tx.send(event(Operation::Update)).await.unwrap();
        tx.send(event(Operation::Delete)).await.unwrap();
        drop(tx);

        let summary = dispatch(Arc::new(process), rx, 2, CancellationToken::new()).await;
        assert_eq!(
            summary,
            DispatchSummary {
                succeeded: 1,
                failed: 2
            }
        );
    }

    struct SlowProcess {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Process for SlowProcess {
        fn id(&self) -> String {
            "slow".into()
        }

        async fn run(&self, _cancel: CancellationToken, _event: Event) -> PgCdcResult<ProcessStatus> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            Ok(ProcessStatus {
                name: "slow".into(),
                status: Status::Success,
                logs: vec![],
            })
        }
    }

    #[tokio::test]
    async fn test_dispatch_respects_concurrency_limit() {
        let process = Arc::new(SlowProcess {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });

        let (tx, rx) = mpsc::channel(16);
        for _ in 0..8 {
            tx.send(event(Operation::Create)).await.unwrap();
        }
        drop(tx);

        let summary = dispatch(process.clone(), rx, 2, CancellationToken::new()).await;
        assert_eq!(summary.succeeded, 8);
        assert_eq!(process.peak.load(Ordering::SeqCst), 2);
    }
}
