pub mod config;
pub mod debounce;
pub mod errors;
pub mod http;
pub mod models;
pub mod query;
pub mod redaction;
pub mod runtime;
pub mod service;
pub mod ui;

#[cfg(test)]
mod test_support;

use crate::config::{ClientSettings, Credential};
use crate::http::ApiClient;
use crate::query::NotesQuery;
use crate::runtime::{AppEvent, Runtime};
use crate::service::NoteService;
use crate::ui::App;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub fn run() {
    if let Err(error) = start() {
        eprintln!("notehub: {:#}", error);
        std::process::exit(1);
    }
}

fn start() -> anyhow::Result<()> {
    let settings = ClientSettings::load()?;
    init_tracing(&settings.resolved_log_dir()).map_err(anyhow::Error::msg)?;

    let credential = Credential::from_env().map_err(|error| {
        tracing::error!(error = %error, "refusing to start without a bearer credential");
        error
    })?;
    tracing::info!(base_url = %settings.base_url, per_page = settings.per_page, "starting notehub client");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_terminal(settings, credential));
    runtime.shutdown_timeout(std::time::Duration::from_millis(200));
    result
}

async fn run_terminal(settings: ClientSettings, credential: Credential) -> anyhow::Result<()> {
    let api = ApiClient::new(&settings, &credential)?;
    let redactor = api.redactor().clone();
    let query = NotesQuery::new(
        Arc::new(NoteService::new(api)),
        settings.per_page,
        settings.cache_capacity,
    );
    let (mut runtime, mut events) = Runtime::new(query, settings.debounce_window(), redactor);
    spawn_input_reader(runtime.events());

    runtime.start().await;
    draw(runtime.app())?;
    while let Some(event) = events.recv().await {
        if !runtime.handle_event(event).await {
            break;
        }
        draw(runtime.app())?;
    }

    tracing::info!("notehub client stopped");
    Ok(())
}

fn spawn_input_reader(events: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if events.send(AppEvent::Input(line)).is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    tracing::warn!(error = %error, "failed reading terminal input");
                    break;
                }
            }
        }
        let _ = events.send(AppEvent::InputClosed);
    });
}

fn draw(app: &App) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "\n========================================")?;
    for line in app.render() {
        writeln!(out, "{}", line)?;
    }
    write!(out, "> ")?;
    out.flush()
}

fn init_tracing(log_dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "notehub.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}
