//! Decodes export artifacts into typed records.
//!
//! The tool emits consecutive JSON values (one per row), optionally wrapped in
//! arrays. An empty file decodes to an empty list; deciding whether that is a
//! failure is up to the caller. The importer never deletes the artifact.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::{AppError, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum Rows<T> {
    Many(Vec<T>),
    One(T),
}

pub fn import<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let bytes = std::fs::read(path).map_err(|source| AppError::File {
        path: path.display().to_string(),
        source,
    })?;

    let mut records = Vec::new();
    for rows in serde_json::Deserializer::from_slice(&bytes).into_iter::<Rows<T>>() {
        let rows = rows.map_err(|source| AppError::Decode {
            path: path.display().to_string(),
            source,
        })?;
        match rows {
            Rows::Many(batch) => records.extend(batch),
            Rows::One(record) => records.push(record),
        }
    }

    tracing::debug!(
        component = "result importer",
        phase = "decode",
        artifact = %path.display(),
        records = records.len(),
        "Decoded query output"
    );
    Ok(records)
}
