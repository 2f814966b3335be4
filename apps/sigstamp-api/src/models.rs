//! Request and response bodies

use serde::{Deserialize, Serialize};
use sigstamp_core::{CompositeReport, Field};

/// Body of `POST /api/sign-pdf`.
///
/// Every member is optional on the wire so that an absent one is reported as
/// missing input instead of a JSON rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignPdfRequest {
    pub pdf_id: Option<String>,
    pub fields: Option<Vec<Field>>,
    pub signature_image_base64: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFieldResponse {
    pub field_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignPdfResponse {
    pub success: bool,
    pub signed_pdf_url: String,
    pub audit_log_id: Option<String>,
    pub original_hash: String,
    pub signed_hash: String,
    pub fields_drawn: Vec<String>,
    pub fields_skipped: Vec<SkippedFieldResponse>,
}

impl SignPdfResponse {
    pub fn new(
        signed_pdf_url: String,
        audit_log_id: Option<String>,
        original_hash: String,
        signed_hash: String,
        report: &CompositeReport,
    ) -> Self {
        Self {
            success: true,
            signed_pdf_url,
            audit_log_id,
            original_hash,
            signed_hash,
            fields_drawn: report.placed.iter().map(|p| p.field_id.clone()).collect(),
            fields_skipped: report
                .skipped
                .iter()
                .map(|s| SkippedFieldResponse {
                    field_id: s.field_id.clone(),
                    reason: s.reason.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
