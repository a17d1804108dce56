use std::{path::PathBuf, sync::Arc};

use futures::StreamExt;
use reqwest::{header, Client};
use shared::{
    domain::{FormFields, StatusTone, StatusUpdate, SubmitPhase},
    protocol::{resolve_download_filename, DEFAULT_DOWNLOAD_FILENAME},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info};
use url::Url;

pub mod error;
pub mod sink;

pub use error::{Result, SubmitError};
pub use sink::{DocumentSink, DownloadDirSink};

pub const REQUESTING_STATUS: &str = "Requesting document generation from the server...";
pub const SUCCESS_STATUS: &str = "Success! Your document has been downloaded.";

#[derive(Debug, Clone)]
pub enum ClientEvent {
    Status(StatusUpdate),
    DownloadProgress {
        received_bytes: u64,
        total_bytes: Option<u64>,
    },
    DocumentSaved {
        filename: String,
        size_bytes: u64,
        path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    pub filename: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// Client for the document generation endpoint. Submits collected form fields
/// as JSON and saves the returned document through the configured sink. At
/// most one request is in flight at a time; concurrent submissions fail fast
/// with [`SubmitError::Busy`].
pub struct GeneratorClient {
    http: Client,
    endpoint: String,
    default_filename: String,
    sink: Arc<dyn DocumentSink>,
    phase: Mutex<SubmitPhase>,
    events: broadcast::Sender<ClientEvent>,
}

impl GeneratorClient {
    pub fn new(endpoint: impl Into<String>, sink: Arc<dyn DocumentSink>) -> Result<Self> {
        Self::with_default_filename(endpoint, sink, DEFAULT_DOWNLOAD_FILENAME)
    }

    pub fn with_default_filename(
        endpoint: impl Into<String>,
        sink: Arc<dyn DocumentSink>,
        default_filename: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        validate_endpoint(&endpoint)?;
        let (events, _) = broadcast::channel(1024);
        Ok(Self {
            http: Client::new(),
            endpoint,
            default_filename: default_filename.into(),
            sink,
            phase: Mutex::new(SubmitPhase::Idle),
            events,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn phase(&self) -> SubmitPhase {
        *self.phase.lock().await
    }

    /// Runs one full generation round trip: POST the fields, download the
    /// document, save it, and report status along the way. Always leaves the
    /// client resubmittable, whatever the outcome.
    pub async fn submit(&self, fields: FormFields) -> Result<SavedDocument> {
        {
            let mut phase = self.phase.lock().await;
            if phase.is_generating() {
                return Err(SubmitError::Busy);
            }
            *phase = SubmitPhase::Generating;
        }
        self.emit_status(REQUESTING_STATUS, StatusTone::Neutral, SubmitPhase::Generating);

        let outcome = self.request_and_save(&fields).await;

        *self.phase.lock().await = SubmitPhase::Idle;
        match &outcome {
            Ok(saved) => {
                info!(
                    filename = %saved.filename,
                    size_bytes = saved.size_bytes,
                    "submit: document saved"
                );
                self.emit_status(SUCCESS_STATUS, StatusTone::Success, SubmitPhase::Idle);
            }
            Err(err) => {
                error!(error = %err, "submit: document generation failed");
                self.emit_status(&err.status_message(), StatusTone::Error, SubmitPhase::Idle);
            }
        }
        outcome
    }

    async fn request_and_save(&self, fields: &FormFields) -> Result<SavedDocument> {
        debug!(endpoint = %self.endpoint, field_count = fields.len(), "submit: requesting document");
        let response = self.http.post(&self.endpoint).json(fields).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await?;
            return Err(SubmitError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        let filename = resolve_download_filename(
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok()),
            &self.default_filename,
        );

        let total_bytes = response.content_length();
        let mut body: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            body.extend_from_slice(&chunk);
            let _ = self.events.send(ClientEvent::DownloadProgress {
                received_bytes: body.len() as u64,
                total_bytes,
            });
        }

        let size_bytes = body.len() as u64;
        // The buffer moves into the sink and is dropped once written out.
        let path = self.sink.save(&filename, body).await?;
        let _ = self.events.send(ClientEvent::DocumentSaved {
            filename: filename.clone(),
            size_bytes,
            path: path.clone(),
        });
        Ok(SavedDocument {
            filename,
            size_bytes,
            path,
        })
    }

    fn emit_status(&self, message: &str, tone: StatusTone, phase: SubmitPhase) {
        let _ = self.events.send(ClientEvent::Status(StatusUpdate {
            message: message.to_string(),
            tone,
            phase,
        }));
    }
}

fn validate_endpoint(endpoint: &str) -> Result<()> {
    let url = Url::parse(endpoint).map_err(|err| SubmitError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SubmitError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
