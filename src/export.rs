/// CSV export of sensor readings
///
/// One header line followed by one comma-delimited row per reading. Values
/// are written unquoted, so a field containing the delimiter is rejected.
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

use crate::models::SensorReading;
use crate::utils::format_datetime;

pub const CSV_HEADER: &str = "Timestamp,Sensor ID,Sensor Type,Value,Unit,Valid,Error";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("field {field} contains the CSV delimiter: {value:?}")]
    EmbeddedDelimiter { field: &'static str, value: String },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub struct CsvExporter {
    path: PathBuf,
    file: File,
    rows: u64,
}

impl CsvExporter {
    /// Create or truncate `path` and write the header line
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref().to_path_buf();
        let io_failed = |source| ExportError::Io {
            path: path.clone(),
            source,
        };

        let mut file = File::create(&path).map_err(io_failed)?;
        writeln!(file, "{}", CSV_HEADER).map_err(io_failed)?;
        file.flush().map_err(io_failed)?;

        Ok(Self { path, file, rows: 0 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written since the file was created
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Append one row for `reading`, stamped with `at`, and flush
    pub fn append(
        &mut self,
        sensor_id: &str,
        kind_name: &str,
        reading: &SensorReading,
        at: &OffsetDateTime,
    ) -> Result<(), ExportError> {
        let row = format_row(sensor_id, kind_name, reading, at)?;

        let result = writeln!(self.file, "{}", row).and_then(|_| self.file.flush());
        result.map_err(|source| ExportError::Io {
            path: self.path.clone(),
            source,
        })?;

        self.rows += 1;
        Ok(())
    }
}

/// Render one CSV row without the trailing newline
pub fn format_row(
    sensor_id: &str,
    kind_name: &str,
    reading: &SensorReading,
    at: &OffsetDateTime,
) -> Result<String, ExportError> {
    check_field("Sensor ID", sensor_id)?;
    check_field("Sensor Type", kind_name)?;

    Ok(format!(
        "{},{},{},{:.2},{},{},{}",
        format_datetime(at),
        sensor_id,
        kind_name,
        reading.value,
        reading.unit(),
        if reading.is_valid { "Valid" } else { "Invalid" },
        reading.fault.label()
    ))
}

fn check_field(field: &'static str, value: &str) -> Result<(), ExportError> {
    if value.contains(',') {
        return Err(ExportError::EmbeddedDelimiter {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
