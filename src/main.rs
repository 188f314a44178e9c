use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod controller;
mod domain;
mod loader;
mod store;
mod ui;

use controller::Controller;
use domain::{Message, TSConfig, TSError};
use store::Store;
use ui::StoreUI;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Tabular data file (csv, parquet, arrow) loaded into the store on start.
    file: Option<String>,

    /// Maximum rendered column width.
    #[arg(long, default_value_t = TSConfig::default().max_column_width)]
    max_column_width: usize,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

// The terminal belongs to the tui, logs go to a file next to the binary.
fn init_logging() -> Result<(), TSError> {
    let logfile = std::fs::File::create("tablestore.log")?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(logfile))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run() -> Result<(), TSError> {
    let args = Args::parse();
    init_logging()?;
    info!("Starting tablestore!");

    let cfg = TSConfig::default().max_column_width(args.max_column_width);
    let store = Store::new();
    store.subscribe(|field| debug!("State changed: {field:?}"));

    // Data load before entering the alternate screen, so load errors print
    // to a normal terminal.
    if let Some(raw) = args.file.as_deref() {
        let path = loader::resolve_path(raw)?;
        loader::load_into_store(&store, path)?;
    }

    let ui = StoreUI::new(&cfg);
    let controller = Controller::new(&cfg);
    let mut terminal = ratatui::init();

    let mut running = true;
    while running {
        // Render the current view
        terminal.draw(|f| ui.draw(&store, f))?;

        // Handle events, map to a Message and apply it to the store
        if let Some(message) = controller.handle_event()? {
            match message {
                Message::Quit => running = false,
                Message::ToggleTable => store.set_visible(!store.visible()),
            }
        }
    }

    Ok(())
}
