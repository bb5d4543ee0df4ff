use anyhow::{Context, Result};
use clap::Parser;
use formcast::capture::DirectorySource;
use formcast::config::{Config, app_name, version};
use formcast::display::{DisplaySink, LiveView};
use formcast::recorder::{HttpScoreStore, MemoryScoreStore, ScoreStore};
use formcast::session::{SessionCoordinator, SessionOutcome};
use log::{info, warn};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", app_name(), e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let config = Config::parse();
    config.validate()?;
    info!("{} {} starting", app_name(), version());

    let store: Arc<dyn ScoreStore> = if config.no_persist {
        Arc::new(MemoryScoreStore::new())
    } else {
        Arc::new(HttpScoreStore::new(&config.store_url))
    };

    let display = DisplaySink::new();
    let coordinator = SessionCoordinator::new(
        config.session_settings(),
        config.session_info(),
        DirectorySource::new(&config.frames_dir),
        store,
        display.clone(),
    );

    // cancel the session gracefully on Ctrl-C
    let cancel = coordinator.cancellation_token();
    ctrlc::set_handler(move || cancel.cancel()).context("Error setting Ctrl-C handler")?;

    // headless live view: report progress on annotated frames
    let mut view = display.subscribe();
    tokio::spawn(async move {
        let mut shown = 0u64;
        while view.changed().await.is_ok() {
            match &*view.borrow_and_update() {
                LiveView::Frame(_) => {
                    shown += 1;
                    if shown % 50 == 0 {
                        info!("Live view: {} annotated frames shown", shown);
                    }
                }
                LiveView::Ended => break,
                LiveView::Waiting => {}
            }
        }
    });

    let report = coordinator.run().await;
    let code = match report.outcome {
        SessionOutcome::Completed { event, persisted: Ok(()) } => {
            println!("Final score: {}", event.value);
            0
        }
        SessionOutcome::Completed { event, persisted: Err(e) } => {
            println!("Final score: {}", event.value);
            warn!("Score could not be saved: {}", e);
            1
        }
        SessionOutcome::Incomplete { reason } => {
            eprintln!("Attempt incomplete: {}", reason);
            2
        }
        SessionOutcome::Cancelled => 130,
    };
    Ok(code)
}
