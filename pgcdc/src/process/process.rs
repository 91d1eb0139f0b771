use crate::error::PgCdcResult;
use crate::event::Event;
use crate::process::status::ProcessStatus;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait Process {
    fn id(&self) -> String;

    async fn run(&self, cancel: CancellationToken, event: Event) -> PgCdcResult<ProcessStatus>;
}
