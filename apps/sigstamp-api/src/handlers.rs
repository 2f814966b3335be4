//! HTTP handlers for the signing API

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use sigstamp_core::{
    record_audit, stamp, AuditRecord, DocumentSource, PdfEngine, SignError, SignRequest,
    SignerMeta, StoredAudit,
};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path as FsPath;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Serve an original PDF
pub async fn get_pdf(
    State(state): State<Arc<AppState>>,
    Path(pdf_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = state
        .source
        .path_for(&pdf_id)
        .ok_or_else(|| ApiError::PdfNotFound(pdf_id.clone()))?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(ApiError::PdfNotFound(pdf_id)),
        Err(e) => return Err(e.into()),
    };

    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes))
}

/// Stamp the signature into every signature field and record an audit entry
pub async fn sign_pdf(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<SignPdfRequest>, JsonRejection>,
) -> Result<Json<SignPdfResponse>, ApiError> {
    let Json(req) = payload?;
    let fields = req
        .fields
        .ok_or_else(|| ApiError::MissingInput("fields".to_string()))?;

    let request = SignRequest {
        document_id: req.pdf_id.unwrap_or_default(),
        fields,
        asset_base64: req.signature_image_base64.unwrap_or_default(),
        signer_meta: SignerMeta {
            ip: connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()),
            user_agent: header_str(&headers, header::USER_AGENT.as_str()),
        },
    };
    request.validate()?;

    let original = state
        .source
        .fetch(&request.document_id)
        .await
        .map_err(SignError::from)?;

    let SignRequest {
        document_id,
        fields,
        asset_base64,
        signer_meta,
    } = request;

    // lopdf work is CPU bound; each run owns its own engine
    let (fields, stamped) = tokio::task::spawn_blocking(move || {
        let stamped = stamp::<PdfEngine>(&original, &fields, &asset_base64);
        (fields, stamped)
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))?;
    let stamped = stamped?;

    let filename = write_signed(&state.signed_dir, &stamped.signed_bytes).await?;

    tracing::info!(
        "Signed {} -> {} ({} drawn, {} skipped)",
        document_id,
        filename,
        stamped.report.placed.len(),
        stamped.report.skipped.len()
    );

    let record = AuditRecord::from_digests(
        &document_id,
        stamped.original_hash.clone(),
        stamped.signed_hash.clone(),
        fields,
        signer_meta,
    );
    let audit_log_id = record_audit(state.audit.as_ref(), &record).await;

    Ok(Json(SignPdfResponse::new(
        signed_pdf_url(&headers, &filename),
        audit_log_id,
        stamped.original_hash,
        stamped.signed_hash,
        &stamped.report,
    )))
}

/// Fetch an audit log entry
pub async fn get_audit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StoredAudit>, ApiError> {
    state
        .audit
        .fetch(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::AuditNotFound(id))
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Public URL of a signed file, built from the request's Host header
pub fn signed_pdf_url(headers: &HeaderMap, filename: &str) -> String {
    match header_str(headers, header::HOST.as_str()) {
        Some(host) => {
            let scheme =
                header_str(headers, "x-forwarded-proto").unwrap_or_else(|| "http".to_string());
            format!("{}://{}/signed/{}", scheme, host, filename)
        }
        None => format!("/signed/{}", filename),
    }
}

/// Write `bytes` as `signed-<unix-millis>.pdf`, never overwriting another run's output
async fn write_signed(dir: &FsPath, bytes: &[u8]) -> Result<String, ApiError> {
    tokio::fs::create_dir_all(dir).await?;
    let millis = Utc::now().timestamp_millis();

    let mut attempt = 0u32;
    loop {
        let filename = if attempt == 0 {
            format!("signed-{}.pdf", millis)
        } else {
            format!("signed-{}-{}.pdf", millis, attempt)
        };

        let path = dir.join(&filename);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => {
                write_or_remove(file, &path, bytes).await?;
                return Ok(filename);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Write `bytes` through `writer`; on failure delete the partial file at `path`
async fn write_or_remove<W>(mut writer: W, path: &FsPath, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(writer);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            tracing::warn!("Failed to remove partial file {}: {}", path.display(), cleanup);
        }
        return Err(e);
    }
    Ok(())
}
