//! SQLite-backed audit log

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sigstamp_core::{AuditRecord, AuditStore, Field, PersistenceError, SignerMeta, StoredAudit};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

type AuditRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
);

/// Audit store over a SQLite pool.
///
/// A store without a pool is disconnected: every call reports
/// [`PersistenceError::Unavailable`] and signing carries on unaudited.
#[derive(Debug, Clone)]
pub struct SqliteAuditStore {
    pool: Option<SqlitePool>,
}

impl SqliteAuditStore {
    /// Connect and migrate, falling back to a disconnected store on failure
    pub async fn connect(database_url: &str) -> Self {
        tracing::info!("Connecting to database: {}", database_url);

        let pool = match SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
        {
            Ok(pool) => pool,
            Err(e) => {
                tracing::warn!("Database connection failed (audit logging disabled): {}", e);
                return Self::disconnected();
            }
        };

        match Self::from_pool(pool).await {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("Database migration failed (audit logging disabled): {}", e);
                Self::disconnected()
            }
        }
    }

    /// Use an existing pool, creating the schema if needed
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        Self::run_migrations(&pool).await?;
        Ok(Self { pool: Some(pool) })
    }

    pub fn disconnected() -> Self {
        Self { pool: None }
    }

    pub fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        tracing::info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_logs (
                id TEXT PRIMARY KEY,
                pdf_id TEXT NOT NULL,
                original_hash TEXT NOT NULL,
                signed_hash TEXT NOT NULL,
                fields_json TEXT NOT NULL,
                signer_ip TEXT,
                signer_user_agent TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_audit_logs_pdf_id ON audit_logs(pdf_id)
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    fn pool(&self) -> Result<&SqlitePool, PersistenceError> {
        self.pool.as_ref().ok_or(PersistenceError::Unavailable)
    }
}

fn row_to_audit(row: AuditRow) -> Result<StoredAudit, PersistenceError> {
    let (id, pdf_id, original_hash, signed_hash, fields_json, ip, user_agent, created_at) = row;

    let fields: Vec<Field> = serde_json::from_str(&fields_json)
        .map_err(|e| PersistenceError::Read(format!("fields of {}: {}", id, e)))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| PersistenceError::Read(format!("created_at of {}: {}", id, e)))?
        .with_timezone(&Utc);

    Ok(StoredAudit {
        id,
        record: AuditRecord {
            document_id: pdf_id,
            original_hash,
            signed_hash,
            fields,
            signer_meta: SignerMeta { ip, user_agent },
            created_at,
        },
    })
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn save(&self, record: &AuditRecord) -> Result<String, PersistenceError> {
        let pool = self.pool()?;
        let id = Uuid::new_v4().to_string();
        let fields_json = serde_json::to_string(&record.fields)
            .map_err(|e| PersistenceError::Write(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, pdf_id, original_hash, signed_hash, fields_json, signer_ip, signer_user_agent, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&record.document_id)
        .bind(&record.original_hash)
        .bind(&record.signed_hash)
        .bind(&fields_json)
        .bind(&record.signer_meta.ip)
        .bind(&record.signer_meta.user_agent)
        .bind(record.created_at.to_rfc3339())
        .execute(pool)
        .await
        .map_err(|e| PersistenceError::Write(e.to_string()))?;

        Ok(id)
    }

    async fn fetch(&self, id: &str) -> Result<Option<StoredAudit>, PersistenceError> {
        let pool = self.pool()?;

        let row: Option<AuditRow> = sqlx::query_as(
            r#"
            SELECT id, pdf_id, original_hash, signed_hash, fields_json, signer_ip, signer_user_agent, created_at
            FROM audit_logs WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| PersistenceError::Read(e.to_string()))?;

        row.map(row_to_audit).transpose()
    }
}
