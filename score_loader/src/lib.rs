use std::{fs, path::Path};

use anyhow::Context;
use score_schema::UserScoreRecord;
use serde::Deserialize;

/// Either a bare array of records or an object wrapping them under `users`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Bare(Vec<UserScoreRecord>),
    Wrapped { users: Vec<UserScoreRecord> },
}

impl RecordFile {
    fn into_records(self) -> Vec<UserScoreRecord> {
        match self {
            RecordFile::Bare(records) | RecordFile::Wrapped { users: records } => records,
        }
    }
}

pub fn load_records_json_from_path(path: impl AsRef<Path>) -> anyhow::Result<Vec<UserScoreRecord>> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).with_context(|| format!("failed to read records: {}", path.display()))?;
    let file: RecordFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse records json: {}", path.display()))?;
    Ok(file.into_records())
}

pub fn load_records_json_from_str(json: &str) -> anyhow::Result<Vec<UserScoreRecord>> {
    let file: RecordFile = serde_json::from_str(json).context("failed to parse records json")?;
    Ok(file.into_records())
}
