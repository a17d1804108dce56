//! Where generated documents end up once downloaded.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Destination for a downloaded document. Implementations take ownership of
/// the byte buffer so it is released as soon as the save completes.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn save(&self, filename: &str, bytes: Vec<u8>) -> io::Result<PathBuf>;
}

/// Saves documents into a fixed directory, creating it on first use.
pub struct DownloadDirSink {
    dir: PathBuf,
}

impl DownloadDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DocumentSink for DownloadDirSink {
    async fn save(&self, filename: &str, bytes: Vec<u8>) -> io::Result<PathBuf> {
        if filename.is_empty() || filename.contains('/') || filename.contains('\\') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to save document as '{filename}'"),
            ));
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(filename);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}
