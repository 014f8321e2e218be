use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{header_row, RunlogError};

/// Ordered table of rows with a header row first. Rows only grow at the end
/// and only the last one can be removed.
pub trait RecordStore {
    /// Every row, header included, in append order.
    fn rows(&self) -> Result<Vec<Vec<String>>, RunlogError>;

    fn append_row(&mut self, row: &[String]) -> Result<(), RunlogError>;

    /// Remove the last data row. Fails when only the header is left.
    fn delete_last_row(&mut self) -> Result<(), RunlogError>;

    /// Number of data rows (header excluded).
    fn record_count(&self) -> Result<usize, RunlogError> {
        Ok(self.rows()?.len().saturating_sub(1))
    }
}

/// In-memory store, used in tests and as a scratch backend.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    rows: Vec<Vec<String>>,
    failure: Option<String>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            rows: vec![header_row()],
            failure: None,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        let mut store = Self::default();
        store.rows.extend(rows);
        store
    }

    /// Make every subsequent call fail with `message`, simulating an unreachable backend.
    pub fn fail_with(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }

    fn check(&self) -> Result<(), RunlogError> {
        match &self.failure {
            Some(message) => Err(RunlogError::Store(message.clone())),
            None => Ok(()),
        }
    }
}

impl RecordStore for MemoryStore {
    fn rows(&self) -> Result<Vec<Vec<String>>, RunlogError> {
        self.check()?;
        Ok(self.rows.clone())
    }

    fn append_row(&mut self, row: &[String]) -> Result<(), RunlogError> {
        self.check()?;
        self.rows.push(row.to_vec());
        Ok(())
    }

    fn delete_last_row(&mut self) -> Result<(), RunlogError> {
        self.check()?;
        if self.rows.len() <= 1 {
            return Err(RunlogError::Store("no data rows to delete".into()));
        }
        self.rows.pop();
        Ok(())
    }
}

/// Store backed by a local CSV file whose first line is the header.
#[derive(Clone, Debug)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Open `path`, writing the header row when the file is missing or empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RunlogError> {
        let path = path.into();
        let needs_header = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        if needs_header {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(header_row())?;
            writer.flush()?;
            debug!("Created store {}", path.display());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reader(&self) -> Result<csv::Reader<File>, RunlogError> {
        Ok(csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?)
    }
}

impl RecordStore for CsvStore {
    fn rows(&self) -> Result<Vec<Vec<String>>, RunlogError> {
        let mut reader = self.reader()?;
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(rows)
    }

    fn append_row(&mut self, row: &[String]) -> Result<(), RunlogError> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
        writer.write_record(row)?;
        writer.flush()?;
        Ok(())
    }

    fn delete_last_row(&mut self) -> Result<(), RunlogError> {
        let mut rows = self.rows()?;
        if rows.len() <= 1 {
            return Err(RunlogError::Store("no data rows to delete".into()));
        }
        rows.pop();

        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&tmp)?;
            for row in &rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
