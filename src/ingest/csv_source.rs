use crate::core::record::RawRecord;
use crate::ingest::{IngestError, InputBatch};
use std::io::Read;
use std::path::Path;

const DATE: &str = "date";
const DESCRIPTION: &str = "description";
const AMOUNT: &str = "amount";
const PLATFORM: &str = "platform";
const DENOMINATION: &str = "denomination";

/// Column positions resolved from a header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    description: usize,
    amount: usize,
    platform: Option<usize>,
    denomination: Option<usize>,
}

impl Columns {
    fn resolve(source: &str, headers: &csv::ByteRecord) -> Result<Self, IngestError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_ascii_lowercase())
            .collect();
        let find = |name: &str| names.iter().position(|n| n == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| IngestError::MissingColumn {
                source_name: source.to_string(),
                column: name.to_string(),
            })
        };

        let columns = Columns {
            date: require(DATE)?,
            description: require(DESCRIPTION)?,
            amount: require(AMOUNT)?,
            platform: find(PLATFORM),
            denomination: find(DENOMINATION),
        };
        if columns.platform.is_none() && columns.denomination.is_none() {
            return Err(IngestError::MissingColumn {
                source_name: source.to_string(),
                column: PLATFORM.to_string(),
            });
        }
        Ok(columns)
    }
}

/// Reads ledger rows from CSV.
///
/// The header row must name `date`, `description`, `amount` and at least one
/// of `platform` / `denomination`, in any order and case. Other columns are
/// ignored. Cells are read lossily, so invalid UTF-8 shows up as a rejected
/// value later instead of aborting the read.
pub struct CsvSource;

impl CsvSource {
    /// Read one CSV file into raw rows.
    pub fn read_path(path: &Path) -> Result<Vec<RawRecord>, IngestError> {
        let name = path.display().to_string();
        let file = std::fs::File::open(path).map_err(|e| IngestError::Io {
            source_name: name.clone(),
            message: e.to_string(),
        })?;
        Self::read(&name, file)
    }

    /// Read CSV from any reader. `source` only labels errors.
    pub fn read<R: Read>(source: &str, reader: R) -> Result<Vec<RawRecord>, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let to_error = |e: csv::Error| IngestError::Io {
            source_name: source.to_string(),
            message: e.to_string(),
        };
        let headers = reader.byte_headers().map_err(to_error)?.clone();
        let columns = Columns::resolve(source, &headers)?;

        let mut rows = Vec::new();
        for (index, result) in reader.byte_records().enumerate() {
            let record = result.map_err(to_error)?;
            let cell = |i: usize| {
                record
                    .get(i)
                    .map(|b| String::from_utf8_lossy(b).into_owned())
            };
            rows.push(RawRecord {
                line: index + 1,
                date: cell(columns.date),
                description: cell(columns.description),
                amount: cell(columns.amount),
                platform: columns.platform.and_then(cell),
                denomination: columns.denomination.and_then(cell),
                source: Some(source.to_string()),
            });
        }
        log::debug!("read {} rows from {}", rows.len(), source);
        Ok(rows)
    }

    /// Read several files into one batch, in the given order.
    pub fn read_batch<P: AsRef<Path>>(paths: &[P]) -> Result<InputBatch, IngestError> {
        let mut batch = InputBatch::default();
        for path in paths {
            let path = path.as_ref();
            let rows = Self::read_path(path)?;
            batch.push_source(path.display().to_string(), rows);
        }
        Ok(batch)
    }
}
