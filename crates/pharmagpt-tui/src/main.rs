mod app;
mod cli;
mod handler;
mod markdown;
mod tui;
mod ui;

use std::fs::{self, File};
use std::sync::Mutex;

use anyhow::Result;
use clap::Parser;
use pharmagpt_core::config::BASE_URL_ENV;
use pharmagpt_core::{Config, PharmaClient};
use tracing_subscriber::EnvFilter;

use app::App;
use cli::Cli;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring unreadable config file");
        Config::default()
    });
    let env_url = std::env::var(BASE_URL_ENV).ok();
    let resolved = config.resolve(cli.base_url.as_deref(), env_url.as_deref());
    let client = PharmaClient::new(&resolved.base_url);

    match cli.command {
        Some(command) => cli::run(command, client).await,
        None => run_tui(client).await,
    }
}

/// Log to a file so tracing output never lands on the terminal UI
fn init_logging() {
    let Some(dir) = dirs::cache_dir().map(|d| d.join("pharmagpt")) else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = File::create(dir.join("pharmagpt.log")) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

async fn run_tui(client: PharmaClient) -> Result<()> {
    let mut terminal = tui::init()?;
    tui::install_panic_hook();

    let mut app = App::new(client);
    let mut events = EventHandler::new();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            if let Some(event) = events.next().await {
                handler::handle_event(&mut app, event);
            }

            app.poll_tasks().await;
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}
