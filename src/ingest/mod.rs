//! Getting ledger rows into the pipeline.
//!
//! Sources produce [`RawRecord`]s; the [`normalizer`] validates them into
//! typed records using the denomination [`classifier`].

pub mod classifier;
pub mod csv_source;
pub mod normalizer;

use crate::core::record::RawRecord;
use thiserror::Error;

/// Errors reading an input source. These abort the run before any stage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("cannot read {source_name}: {message}")]
    Io { source_name: String, message: String },
    #[error("{source_name} has no '{column}' column")]
    MissingColumn { source_name: String, column: String },
}

/// Every raw row of a run, plus the names of the sources they came from.
#[derive(Debug, Clone, Default)]
pub struct InputBatch {
    sources: Vec<String>,
    rows: Vec<RawRecord>,
}

impl InputBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the rows of one source. Rows not yet tagged with a source
    /// are tagged with `name`.
    pub fn push_source(&mut self, name: impl Into<String>, rows: Vec<RawRecord>) {
        let name = name.into();
        self.rows.extend(rows.into_iter().map(|mut row| {
            if row.source.is_none() {
                row.source = Some(name.clone());
            }
            row
        }));
        self.sources.push(name);
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn into_rows(self) -> Vec<RawRecord> {
        self.rows
    }
}

impl FromIterator<RawRecord> for InputBatch {
    /// A single anonymous source holding every row.
    fn from_iter<T: IntoIterator<Item = RawRecord>>(iter: T) -> Self {
        let mut batch = InputBatch::new();
        batch.push_source("<memory>", iter.into_iter().collect());
        batch
    }
}
