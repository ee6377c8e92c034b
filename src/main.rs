mod client;

use std::{path::PathBuf, sync::Arc, time::Duration};

use color_eyre::Result;
use log::{info, warn, LevelFilter};

use token_tracker::{
    engine::{
        prelude::*,
        snapshot::{self, FileStore},
    },
    lookup::{scryfall::ScryfallClient, CardLookup, LookupCache, Offline},
};

use client::App;

const HOME_VAR: &str = "TOKEN_TRACKER_HOME";
const OFFLINE_VAR: &str = "TOKEN_TRACKER_OFFLINE";
const DEFAULT_HOME: &str = ".token-tracker";
const PREFETCH_PAUSE: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    color_eyre::install()?;

    let home = std::env::var_os(HOME_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME));
    std::fs::create_dir_all(&home)?;
    simple_logging::log_to_file(home.join("token-tracker.log"), LevelFilter::Info)?;
    info!("main: starting with data in {}", home.display());

    let store = FileStore::open(&home)?;
    let board = snapshot::load_board(&store).unwrap_or_else(|e| {
        warn!("main: starting with an empty board, saved one was unreadable: {e}");
        Board::new()
    });
    let settings = snapshot::load_settings(&store).unwrap_or_else(|e| {
        warn!("main: using default settings: {e}");
        Settings::default()
    });

    let runtime = tokio::runtime::Runtime::new()?;
    let lookup: Box<dyn CardLookup> = if std::env::var_os(OFFLINE_VAR).is_some() {
        info!("main: card lookups disabled");
        Box::new(Offline)
    } else {
        Box::new(ScryfallClient::new())
    };
    let cache = Arc::new(LookupCache::new(lookup));

    let names: Vec<String> = common_templates()
        .into_iter()
        .chain(board.templates().iter().cloned())
        .map(|template| template.name)
        .collect();
    let prefetch = Arc::clone(&cache);
    runtime.spawn(async move { prefetch.prefetch(names, PREFETCH_PAUSE).await });

    let mut app = App::new(board, settings, Box::new(store), cache, runtime.handle().clone());
    app.run()?;

    info!("main: shutting down");
    runtime.shutdown_timeout(Duration::from_millis(500));
    Ok(())
}
