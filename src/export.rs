//! Saving exported audiences to disk.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::audience::{AudienceRecord, ExportFormat, Scope};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

const CSV_HEADER: [&str; 7] = [
    "id",
    "name",
    "phone_number",
    "country_code",
    "status",
    "messages",
    "created_at",
];

/// `customers-{brand}-{agent}-{YYYY-MM-DD}.{ext}`
pub fn export_file_name(scope: &Scope, format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "customers-{}-{}-{}.{}",
        scope.brand_id,
        scope.agent_id,
        date.format("%Y-%m-%d"),
        format.as_str()
    )
}

/// Renders the loaded page as CSV, for when the backend export is unavailable.
pub fn render_page_csv(records: &[AudienceRecord]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for record in records {
        writer.write_record([
            record.id.to_string(),
            record.name.clone(),
            record.phone_number.clone(),
            record.country_code.clone(),
            record.status_label().to_string(),
            record.message_count().to_string(),
            record.created_at.to_rfc3339(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Writes `bytes` to `dir/file_name` and returns the full path.
pub fn write_export(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes)?;
    log::info!("Saved export to {}", path.display());
    Ok(path)
}
