use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use otime_server::api;
use otime_server::api::state::AppState;
use otime_server::cache::ResultCache;
use otime_server::db::Database;
use otime_server::formats::text;
use otime_server::model::{entries, events};
use otime_server::notify::Notifier;
use otime_types::event::EventType;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "otime-server")]
#[command(about = "Orienteering event server - ingests SI card reads and serves results")]
struct Cli {
    /// SQLite database path
    #[arg(long, default_value = "otime.db")]
    db_path: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP/WebSocket server
    Serve {
        /// Listen port
        #[arg(long, default_value = "8080")]
        port: u16,
    },
    /// Import a text-format entry list into an event
    Import {
        /// Select the event by id
        #[arg(long, conflicts_with = "key")]
        event_id: Option<i64>,
        /// Select the event by its card-reader key
        #[arg(long)]
        key: Option<String>,
        /// Keep existing entries and classes
        #[arg(long)]
        delta: bool,
        /// Entry list file
        file: PathBuf,
    },
    /// Export an event's entry list in the text format
    Export {
        /// Select the event by id
        #[arg(long, conflicts_with = "key")]
        event_id: Option<i64>,
        /// Select the event by its card-reader key
        #[arg(long)]
        key: Option<String>,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

async fn resolve_event(
    db: &Database,
    event_id: Option<i64>,
    key: Option<String>,
) -> anyhow::Result<EventType> {
    match (event_id, key) {
        (Some(id), _) => Ok(events::get_event(db, id).await?),
        (None, Some(key)) => Ok(events::get_event_by_key(db, &key).await?),
        (None, None) => anyhow::bail!("select an event with --event-id or --key"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let db = Database::open(&cli.db_path).await?;

    match cli.command {
        Command::Serve { port } => {
            let state = AppState::new(db, Arc::new(ResultCache::new()), Notifier::default());
            let app = api::router(state);
            let listener = TcpListener::bind(("0.0.0.0", port)).await?;
            info!(port, "server listening");
            axum::serve(listener, app).await?;
        }
        Command::Import {
            event_id,
            key,
            delta,
            file,
        } => {
            let event = resolve_event(&db, event_id, key).await?;
            let records = text::parse(&std::fs::read_to_string(&file)?)?;
            let count = records.len();
            let cache = ResultCache::new();
            if !delta {
                entries::delete_entries(&db, &cache, event.id).await?;
            }
            entries::import_entries(&db, &cache, event.id, records).await?;
            info!(event = %event.name, imported = count, "entry list imported");
        }
        Command::Export {
            event_id,
            key,
            output,
        } => {
            let event = resolve_event(&db, event_id, key).await?;
            let entries = entries::get_entries(&db, event.id).await?;
            let content = text::create(&entries);
            match output {
                Some(path) => std::fs::write(path, content)?,
                None => print!("{content}"),
            }
        }
    }

    Ok(())
}
