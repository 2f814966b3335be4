//! Content digests and the audit record written for each signing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::PersistenceError;
use crate::types::Field;

/// SHA-256 of `bytes` as 64 lowercase hex characters
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Check `bytes` against a previously recorded digest (case-insensitive)
pub fn verify_digest(bytes: &[u8], expected: &str) -> bool {
    content_digest(bytes).eq_ignore_ascii_case(expected.trim())
}

/// Who submitted the signing request, as seen by the transport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Evidence of one successful signing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    #[serde(rename = "pdfId")]
    pub document_id: String,
    pub original_hash: String,
    pub signed_hash: String,
    /// The full submitted field list, not only the drawn ones
    pub fields: Vec<Field>,
    pub signer_meta: SignerMeta,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Build a record by hashing both documents
    pub fn new(
        document_id: &str,
        original: &[u8],
        signed: &[u8],
        fields: Vec<Field>,
        signer_meta: SignerMeta,
    ) -> Self {
        Self::from_digests(
            document_id,
            content_digest(original),
            content_digest(signed),
            fields,
            signer_meta,
        )
    }

    /// Build a record from digests that were already computed
    pub fn from_digests(
        document_id: &str,
        original_hash: String,
        signed_hash: String,
        fields: Vec<Field>,
        signer_meta: SignerMeta,
    ) -> Self {
        Self {
            document_id: document_id.to_string(),
            original_hash,
            signed_hash,
            fields,
            signer_meta,
            created_at: Utc::now(),
        }
    }
}

/// An audit record together with the id the store assigned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAudit {
    pub id: String,
    #[serde(flatten)]
    pub record: AuditRecord,
}

/// Durable storage for audit records
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist a record and return its identifier
    async fn save(&self, record: &AuditRecord) -> Result<String, PersistenceError>;

    /// Look a record up by identifier
    async fn fetch(&self, id: &str) -> Result<Option<StoredAudit>, PersistenceError>;
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: equal bytes give equal digests
        #[test]
        fn digest_is_deterministic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(content_digest(&bytes), content_digest(&bytes.clone()));
        }

        /// Property: flipping any single byte changes the digest
        #[test]
        fn single_byte_flip_changes_digest(
            bytes in prop::collection::vec(any::<u8>(), 1..512),
            idx in any::<prop::sample::Index>(),
        ) {
            let mut tampered = bytes.clone();
            let i = idx.index(tampered.len());
            tampered[i] ^= 0x01;
            prop_assert_ne!(content_digest(&bytes), content_digest(&tampered));
            prop_assert!(!verify_digest(&tampered, &content_digest(&bytes)));
        }
    }
}
