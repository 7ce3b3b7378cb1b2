use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Length of a PDB identifier code.
pub const IDENTIFIER_LEN: usize = 4;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Row {row} of '{path}' has no identifier")]
    EmptyRow { path: String, row: usize },
    #[error(
        "Row {row} of '{path}' holds an invalid structure identifier '{value}' (expected {len} alphanumeric characters)",
        len = IDENTIFIER_LEN
    )]
    InvalidIdentifier {
        path: String,
        row: usize,
        value: String,
    },
}

/// Normalises a structure identifier, returning `None` if it is malformed.
///
/// Valid identifiers are four ASCII alphanumeric characters; they are
/// returned upper-cased.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.len() == IDENTIFIER_LEN && trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(trimmed.to_ascii_uppercase())
    } else {
        None
    }
}

/// Reads the list of structure identifiers from a CSV manifest file.
///
/// The file must start with a header row. The first column of every following
/// row holds one identifier; further columns are ignored.
///
/// # Errors
///
/// Returns [`ManifestError`] if the file cannot be read or any row is malformed.
pub fn read_manifest(path: &Path) -> Result<Vec<String>, ManifestError> {
    let label = path.to_string_lossy().to_string();
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ManifestError::Csv {
            path: label.clone(),
            source: e,
        })?;
    collect_identifiers(reader, &label)
}

/// Reads the list of structure identifiers from any CSV source.
///
/// `label` is used in error messages in place of a file path.
pub fn read_manifest_from<R: Read>(source: R, label: &str) -> Result<Vec<String>, ManifestError> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    collect_identifiers(reader, label)
}

fn collect_identifiers<R: Read>(
    mut reader: csv::Reader<R>,
    label: &str,
) -> Result<Vec<String>, ManifestError> {
    let mut identifiers = Vec::new();
    for (index, result) in reader.records().enumerate() {
        // Row 1 is the header.
        let row = index + 2;
        let record = result.map_err(|e| ManifestError::Csv {
            path: label.to_string(),
            source: e,
        })?;
        let raw = record.get(0).unwrap_or("").trim();
        if raw.is_empty() {
            return Err(ManifestError::EmptyRow {
                path: label.to_string(),
                row,
            });
        }
        let id = normalize_identifier(raw).ok_or_else(|| ManifestError::InvalidIdentifier {
            path: label.to_string(),
            row,
            value: raw.to_string(),
        })?;
        identifiers.push(id);
    }
    debug!("Read {} identifiers from '{}'.", identifiers.len(), label);
    Ok(identifiers)
}
