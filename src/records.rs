//! Descriptor records handed over by the embedding model.
//!
//! A record file is a list of `{ source, descriptor }` entries, stored either
//! as JSON or as postcard bytes. Files are only ever read here.

use anyhow::{Context, Result};
use facematch_engine::Descriptor;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    /// Image name for grouping input, person name for gallery input.
    pub source: String,
    pub descriptor: Descriptor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Postcard,
}

impl RecordFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("bin") | Some("postcard") => Ok(Self::Postcard),
            _ => anyhow::bail!(
                "unsupported record file {} (expected .json, .bin or .postcard)",
                path.display()
            ),
        }
    }
}

pub fn decode_records(data: &[u8], format: RecordFormat) -> Result<Vec<FaceRecord>> {
    Ok(match format {
        RecordFormat::Json => serde_json::from_slice(data)?,
        RecordFormat::Postcard => postcard::from_bytes(data)?,
    })
}

pub fn load_records(path: &Path) -> Result<Vec<FaceRecord>> {
    let format = RecordFormat::from_path(path)?;
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let records = decode_records(&data, format)
        .with_context(|| format!("decoding records in {}", path.display()))?;
    log::debug!("Loaded {} record(s) from {}", records.len(), path.display());
    Ok(records)
}

/// First face of a record file; a file without faces is an error.
pub fn load_first(path: &Path) -> Result<FaceRecord> {
    load_records(path)?
        .into_iter()
        .next()
        .with_context(|| format!("no face records in {}", path.display()))
}
