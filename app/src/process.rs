use async_trait::async_trait;
use log::info;
use pgcdc::error::PgCdcResult;
use pgcdc::event::Event;
use pgcdc::process::process::Process;
use pgcdc::process::status::{ProcessStatus, Status};
use tokio_util::sync::CancellationToken;

/// Writes every event it is given to the log as a JSON line.
pub struct LogProcess {
    name: String,
}

impl LogProcess {
    pub fn new(name: String) -> Self {
        LogProcess { name }
    }
}

#[async_trait]
impl Process for LogProcess {
    fn id(&self) -> String {
        self.name.clone()
    }

    async fn run(&self, _cancel: CancellationToken, event: Event) -> PgCdcResult<ProcessStatus> {
        let mut status = ProcessStatus::new(self.name.clone());

        let line = serde_json::to_string(&event)?;
        info!("{}", line);

        status.logs.push(line);
        status.status = Status::Success;
        Ok(status)
    }
}
