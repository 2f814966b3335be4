//! Write the one-page A4 sample document used to try the signing flow
//!
//! Usage: create-sample-pdf [OUTPUT]   (default: pdfs/sample-a4.pdf)

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("create_sample_pdf=info".parse()?),
        )
        .init();

    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("pdfs").join("sample-a4.pdf"));

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let bytes = sigstamp_core::sample_document()?;
    std::fs::write(&output, &bytes).with_context(|| format!("writing {}", output.display()))?;

    info!("Sample PDF created at: {}", output.display());
    Ok(())
}
