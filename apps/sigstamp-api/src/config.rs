//! Runtime configuration from the environment

use std::path::PathBuf;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Originals are read from `<pdf_dir>/<pdf_id>.pdf`
    pub pdf_dir: PathBuf,
    /// Signed output is written here and served under `/signed`
    pub signed_dir: PathBuf,
    pub max_body_bytes: usize,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let database_url = lookup("DATABASE_URL").unwrap_or_else(default_database_url);

        let pdf_dir = lookup("PDF_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("pdfs"));

        let signed_dir = lookup("SIGNED_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("signed"));

        let max_body_bytes = lookup("MAX_BODY_BYTES")
            .and_then(|b| b.parse().ok())
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        Self {
            port,
            database_url,
            pdf_dir,
            signed_dir,
            max_body_bytes,
        }
    }
}

fn default_database_url() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sigstamp-api");
    std::fs::create_dir_all(&data_dir).ok();
    format!("sqlite:{}/audit.db?mode=rwc", data_dir.display())
}

/// Get platform-specific data directory
mod dirs {
    use std::path::PathBuf;

    pub fn data_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(target_os = "windows")]
        {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }
}
