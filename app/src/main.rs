mod args;
mod config;
mod dispatch;
mod process;
mod yaml;

use args::Args;
use clap::Parser;
use dispatch::dispatch;
use log::info;
use pgcdc::input::input::Input;
use pgcdc::postgres_input::PostgresInput;
use process::LogProcess;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use yaml::load_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    info!("run begins");
    let args = Args::parse();
    let app_config = load_config(&args.config)?;

    let mut input = PostgresInput::new(app_config.input).await?;
    let process = Arc::new(LogProcess::new(args.process_name));
    let cancel = CancellationToken::new();

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            shutdown.cancel();
        }
    });

    // Capacity 1: a slow process holds the input back rather than piling up events.
    let (tx, rx) = mpsc::channel(1);
    let dispatcher = tokio::spawn(dispatch(
        process,
        rx,
        app_config.max_concurrent_processes,
        cancel.clone(),
    ));

    info!("Starting input {}", input.id());
    let result = input.handle(cancel, tx).await;

    let summary = dispatcher.await?;
    info!(
        "Processed {} event(s), {} failed",
        summary.succeeded + summary.failed,
        summary.failed
    );

    result?;
    Ok(())
}
