//! Export of the working buffer.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ExportError;

/// An encoded PNG ready to be saved.
#[derive(Clone, Debug)]
pub struct ExportedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportedImage {
    pub fn save(&self, path: &Path) -> Result<(), ExportError> {
        std::fs::write(path, &self.bytes)?;
        log::info!("Exported {} bytes to {}", self.bytes.len(), path.display());
        Ok(())
    }
}

/// `<prefix>-<unix millis>.png`
pub fn export_file_name(prefix: &str, now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{prefix}-{millis}.png")
}
