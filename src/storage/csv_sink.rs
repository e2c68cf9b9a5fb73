//! CSV result sink
//!
//! Rows are appended to an existing file so resumed runs extend earlier
//! output. The header is written only when the file is new or empty.

use crate::state::SellerRecord;
use crate::storage::traits::{ResultSink, StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Append-only CSV writer for seller rows
pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvSink {
    /// Opens `path` for appending, writing the header if needed
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let needs_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(SellerRecord::HEADER)?;
            writer.flush().map_err(|e| StorageError::io(&path, e))?;
        }

        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for CsvSink {
    fn append(&mut self, record: &SellerRecord) -> StorageResult<()> {
        self.writer.write_record(record.to_row())?;
        self.writer
            .flush()
            .map_err(|e| StorageError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn acme(id: u64) -> SellerRecord {
        SellerRecord {
            id,
            business_name: "ACME LTD".to_string(),
            vat_number: "GB999999973".to_string(),
            registered_address: "1 High St, London, SW1A 1AA".to_string(),
            shipped_from: "United Kingdom".to_string(),
            source_reference: format!("https://shop.example/sp?seller={}", id),
        }
    }

    #[test]
    fn test_header_and_quoting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sellers.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&acme(3958)).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("id,business_name,vat_number,registered_address,shipped_from,source_url")
        );
        assert_eq!(
            lines.next(),
            Some("3958,ACME LTD,GB999999973,\"1 High St, London, SW1A 1AA\",United Kingdom,https://shop.example/sp?seller=3958")
        );
    }

    #[test]
    fn test_reopen_appends_without_second_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sellers.csv");

        CsvSink::open(&path).unwrap().append(&acme(1)).unwrap();
        CsvSink::open(&path).unwrap().append(&acme(2)).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let ids: Vec<String> = reader
            .records()
            .map(|row| row.unwrap()[0].to_string())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_empty_existing_file_gets_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sellers.csv");
        fs::write(&path, "").unwrap();

        CsvSink::open(&path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("id,business_name"));
    }
}
