mod advisor;
mod classifier;
mod config;
mod connectivity;
mod error;
mod extract;
mod journal_entry;
mod journal_state;
mod pipeline;
mod sentiment;
mod storage;
mod submission;
mod timeout;
mod ui;

use advisor::ChatAdvisor;
use chrono::Local;
use classifier::HfClassifier;
use color_eyre::eyre::{eyre, Result};
use config::AppConfig;
use connectivity::TcpProbe;
use journal_state::EntryStore;
use pipeline::Pipeline;
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use storage::FileStore;
use submission::Submitter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use ui::{Action, HistoryAction, Notice, UI};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = AppConfig::load_from_env().map_err(|e| eyre!("Failed to load config: {}", e))?;
    init_logging(&config)?;
    info!("Mood journal v{} starting", env!("CARGO_PKG_VERSION"));

    let client = reqwest::Client::new();
    let pipeline = Pipeline::new(
        Arc::new(HfClassifier::new(
            client.clone(),
            &config.classifier_url,
            &config.api_token,
        )),
        Arc::new(ChatAdvisor::new(
            client,
            &config.chat_url,
            &config.api_token,
            &config.chat_model,
        )),
    );
    let submitter = Submitter::new(
        pipeline,
        Arc::new(TcpProbe::new(
            &config.connectivity_probe,
            config.connectivity_timeout(),
        )),
        config.pipeline_timeout(),
    );

    let storage = FileStore::new(&config.data_dir);
    info!(dir = %storage.dir().display(), "using journal directory");
    let mut store = EntryStore::new(Arc::new(storage));
    store
        .load()
        .await
        .map_err(|e| eyre!("Failed to load journal: {}", e))?;

    let mut ui = UI::new()?;
    let mut notice: Option<Notice> = None;

    loop {
        ui.display(&store, &Local::now(), notice.as_ref())?;

        let Some(action) = ui.handle_input(&store)? else {
            continue;
        };
        notice = None;

        match action {
            Action::Write => {
                if store.submitted_today(&Local::now()) {
                    notice = Some(Notice::error(&error::JournalError::AlreadySubmittedToday));
                    continue;
                }
                let Some(text) = ui.get_new_entry()? else {
                    continue;
                };
                ui.show_loading(&text)?;
                match submitter.submit(&mut store, &text, &Local::now()).await {
                    Ok(_) => notice = Some(Notice::info("Saved. Take care of yourself today.")),
                    Err(err) => {
                        error!(%err, "submission failed");
                        notice = Some(Notice::error(&err));
                    }
                }
            }
            Action::History => {
                while !store.entries().is_empty() {
                    let result = match ui.history(&store, notice.as_ref())? {
                        HistoryAction::Delete(id) => store.remove(id).await.map(|_| ()),
                        HistoryAction::ClearAll => store.clear().await,
                        HistoryAction::Back => break,
                    };
                    notice = result.err().map(|err| {
                        error!(%err, "history update failed");
                        Notice::error(&err)
                    });
                }
            }
            Action::Quit => break,
        }
    }

    ui.restore()?;
    info!("Mood journal exiting");
    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    std::fs::create_dir_all(&config.data_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mood_journal=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}
