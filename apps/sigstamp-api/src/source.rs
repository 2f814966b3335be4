//! Original PDFs on the local filesystem

use async_trait::async_trait;
use sigstamp_core::{DocumentSource, SourceError};
use std::path::{Path, PathBuf};

/// Whether `id` is safe to use as a file stem
pub fn is_valid_pdf_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Resolves `<pdf_id>` to `<dir>/<pdf_id>.pdf`
#[derive(Debug, Clone)]
pub struct FsDocumentSource {
    dir: PathBuf,
}

impl FsDocumentSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for an id, or `None` if the id could escape the directory
    pub fn path_for(&self, pdf_id: &str) -> Option<PathBuf> {
        is_valid_pdf_id(pdf_id).then(|| self.dir.join(format!("{}.pdf", pdf_id)))
    }
}

#[async_trait]
impl DocumentSource for FsDocumentSource {
    async fn fetch(&self, document_id: &str) -> Result<Vec<u8>, SourceError> {
        let path = self
            .path_for(document_id)
            .ok_or_else(|| SourceError::NotFound(document_id.to_string()))?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SourceError::NotFound(document_id.to_string()))
            }
            Err(e) => Err(SourceError::Io(e)),
        }
    }
}
