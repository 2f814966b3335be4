//! Request-level signing: validate, stamp and hash, then audit best-effort

use async_trait::async_trait;
use tracing::{info, warn};

use crate::asset::{decode_base64_asset, strip_data_uri};
use crate::audit::{content_digest, AuditRecord, AuditStore, SignerMeta};
use crate::engine::DocumentEngine;
use crate::error::{SignError, SourceError};
use crate::pipeline::{composite, CompositeReport};
use crate::types::Field;

/// Resolves a document id to the original document bytes
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, document_id: &str) -> Result<Vec<u8>, SourceError>;
}

/// Everything a signing run needs from the transport
#[derive(Debug, Clone, Default)]
pub struct SignRequest {
    pub document_id: String,
    pub fields: Vec<Field>,
    /// Base64 image, optionally with a `data:image/<type>;base64,` prefix
    pub asset_base64: String,
    pub signer_meta: SignerMeta,
}

impl SignRequest {
    /// Reject requests that lack a document id or an asset
    pub fn validate(&self) -> Result<(), SignError> {
        if self.document_id.trim().is_empty() {
            return Err(SignError::MissingInput("documentId"));
        }
        if strip_data_uri(self.asset_base64.trim()).trim().is_empty() {
            return Err(SignError::MissingInput("asset"));
        }
        Ok(())
    }
}

/// A stamped document and its digests
#[derive(Debug, Clone)]
pub struct Stamped {
    pub signed_bytes: Vec<u8>,
    pub original_hash: String,
    pub signed_hash: String,
    pub report: CompositeReport,
}

/// Decode the asset, composite it with engine `E` and hash both documents.
///
/// Synchronous and CPU bound. Async callers should run it on a blocking
/// thread.
pub fn stamp<E: DocumentEngine>(
    original: &[u8],
    fields: &[Field],
    asset_base64: &str,
) -> Result<Stamped, SignError> {
    let asset = decode_base64_asset(asset_base64)?;
    let composited = composite::<E>(original, fields, &asset)?;

    Ok(Stamped {
        original_hash: content_digest(original),
        signed_hash: content_digest(&composited.bytes),
        signed_bytes: composited.bytes,
        report: composited.report,
    })
}

/// Hand an audit record to the store. Failures are logged, never returned.
pub async fn record_audit<A>(store: &A, record: &AuditRecord) -> Option<String>
where
    A: AuditStore + ?Sized,
{
    match store.save(record).await {
        Ok(id) => {
            info!("Audit log saved: {}", id);
            Some(id)
        }
        Err(e) => {
            warn!(
                "Failed to save audit log for {}, continuing without it: {}",
                record.document_id, e
            );
            None
        }
    }
}
