use std::fs::{File, OpenOptions};
use std::path::Path;

use log::info;

use crate::error::SinkError;
use crate::scoring::OutputRow;

pub const HEADER: [&str; 5] = [
    "Participant ID",
    "Trial #",
    "Avg Time (s)",
    "Correctness Rate",
    "Key Count",
];

/// Anything that accepts finished result rows
pub trait ResultsSink {
    fn write_row(&mut self, row: &OutputRow) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn write_rows(&mut self, rows: &[OutputRow]) -> Result<(), SinkError> {
        for row in rows {
            self.write_row(row)?;
        }
        self.flush()
    }
}

/// Appends rows to a CSV file, writing a header each time it is opened
pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(HEADER)?;
        writer.flush()?;
        info!("appending results to {}", path.display());
        Ok(Self { writer })
    }
}

impl ResultsSink for CsvSink {
    fn write_row(&mut self, row: &OutputRow) -> Result<(), SinkError> {
        self.writer.serialize(row)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps rows in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub rows: Vec<OutputRow>,
}

impl ResultsSink for MemorySink {
    fn write_row(&mut self, row: &OutputRow) -> Result<(), SinkError> {
        self.rows.push(row.clone());
        Ok(())
    }
}
