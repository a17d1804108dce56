use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{ClientEvent, DownloadDirSink, GeneratorClient};
use shared::domain::FormFields;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(
    name = "docgen",
    about = "Submit form fields to the document generation endpoint and save the result"
)]
struct Args {
    /// Form field to submit, as NAME=VALUE; repeatable
    #[arg(long = "field", value_name = "NAME=VALUE")]
    fields: Vec<String>,
    /// Override the generation endpoint URL
    #[arg(long)]
    endpoint: Option<String>,
    /// Override the directory the document is saved into
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Configuration file path
    #[arg(long, default_value = "docgen.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config);
    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(output_dir) = args.output_dir {
        settings.output_dir = output_dir;
    }

    let fields = assemble_fields(settings.fields, &args.fields)?;

    let sink = Arc::new(DownloadDirSink::new(&settings.output_dir));
    let client =
        GeneratorClient::with_default_filename(settings.endpoint, sink, settings.default_filename)?;

    let events = client.subscribe_events();
    let printer = tokio::spawn(forward_events(events, |line| println!("{line}")));

    let outcome = client.submit(fields).await;
    drop(client);
    let _ = printer.await;

    outcome
        .map(|_| ())
        .context("document generation failed")
}

/// Forwards client events to `emit` until the event channel closes. A lagged
/// receiver skips ahead rather than exiting.
async fn forward_events<F>(mut events: broadcast::Receiver<ClientEvent>, mut emit: F)
where
    F: FnMut(String),
{
    loop {
        match events.recv().await {
            Ok(ClientEvent::Status(update)) if !update.is_clear() => {
                emit(format!("[{}] {}", update.tone.as_str(), update.message));
            }
            Ok(ClientEvent::Status(_)) => {}
            Ok(ClientEvent::DownloadProgress {
                received_bytes,
                total_bytes,
            }) => {
                debug!(received_bytes, ?total_bytes, "download progress");
            }
            Ok(ClientEvent::DocumentSaved {
                path, size_bytes, ..
            }) => {
                emit(format!("Saved {} ({size_bytes} bytes)", path.display()));
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "event printer lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Config fields come first, then `--field` flags in command-line order; a
/// repeated name overwrites its value in place.
fn assemble_fields(base: BTreeMap<String, String>, flags: &[String]) -> Result<FormFields> {
    let mut fields: FormFields = base.into_iter().collect();
    for raw in flags {
        let (name, value) = parse_field(raw)?;
        fields.insert(name, value);
    }
    Ok(fields)
}

fn parse_field(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => bail!("invalid --field '{raw}': expected NAME=VALUE"),
    }
}
