/// Destinations for formatted log lines
use log::{debug, warn};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::InitError;

/// Somewhere a formatted line can be written
///
/// Implementations append the trailing newline and flush before returning.
pub trait LogSink: Send {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

/// Writes lines to standard output
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", line)?;
        out.flush()
    }
}

/// Size-bounded log file with numbered backups
///
/// The active file lives at `path`; backups are `path.1` (newest) through
/// `path.N` (oldest), where N is `max_rotated_files`. A closed handle means
/// file logging is suspended until the next successful [`rotate`] or a new
/// sink is opened.
///
/// [`rotate`]: RotatingFileSink::rotate
#[derive(Debug)]
pub struct RotatingFileSink {
    path: PathBuf,
    file: Option<File>,
    current_size_bytes: u64,
    max_file_size_bytes: u64,
    max_rotated_files: u32,
    /// Set when the file was already at or over the limit when opened
    oversized_at_open: bool,
}

impl RotatingFileSink {
    /// Open `path` for appending, creating its parent directory if needed
    ///
    /// The byte counter starts at the file's existing length, so an
    /// oversized legacy file is rotated before the next write (see
    /// [`oversized_at_open`](RotatingFileSink::oversized_at_open)).
    pub fn open(
        path: impl AsRef<Path>,
        max_file_size_bytes: u64,
        max_rotated_files: u32,
    ) -> Result<Self, InitError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreateFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let open_failed = |source| InitError::FileOpenFailed {
            path: path.clone(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(open_failed)?;
        let current_size_bytes = file.metadata().map_err(open_failed)?.len();

        debug!(
            "Opened log file {} ({} bytes already present)",
            path.display(),
            current_size_bytes
        );

        Ok(Self {
            path,
            file: Some(file),
            current_size_bytes,
            max_file_size_bytes,
            max_rotated_files,
            oversized_at_open: max_file_size_bytes > 0 && current_size_bytes >= max_file_size_bytes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_size_bytes(&self) -> u64 {
        self.current_size_bytes
    }

    /// False once a failed rotation has left the sink without a file
    pub fn is_active(&self) -> bool {
        self.file.is_some()
    }

    pub fn set_limits(&mut self, max_file_size_bytes: u64, max_rotated_files: u32) {
        self.max_file_size_bytes = max_file_size_bytes;
        self.max_rotated_files = max_rotated_files;
    }

    /// A zero size limit disables rotation
    pub fn needs_rotation(&self) -> bool {
        self.is_active()
            && self.max_file_size_bytes > 0
            && self.current_size_bytes >= self.max_file_size_bytes
    }

    /// True until the first rotation if the file was opened already over
    /// the limit and still is
    pub fn oversized_at_open(&self) -> bool {
        self.oversized_at_open && self.needs_rotation()
    }

    /// Path of the `index`-th backup, e.g. `edgetrack.log.2`
    pub fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    /// Shift backups up by one, archive the active file as `path.1` and
    /// start a fresh, empty active file
    ///
    /// Missing backups are skipped. If the active file cannot be archived
    /// or reopened the sink stays closed and the error is returned.
    pub fn rotate(&mut self) -> io::Result<()> {
        self.close();

        if self.max_rotated_files == 0 {
            remove_if_exists(&self.path)?;
        } else {
            for i in (1..=self.max_rotated_files).rev() {
                let source = self.backup_path(i);
                let result = if i == self.max_rotated_files {
                    remove_if_exists(&source)
                } else {
                    rename_if_exists(&source, &self.backup_path(i + 1))
                };
                if let Err(e) = result {
                    warn!("Failed to shift log backup {}: {}", source.display(), e);
                }
            }
            rename_if_exists(&self.path, &self.backup_path(1))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.file = Some(file);
        self.current_size_bytes = 0;
        self.oversized_at_open = false;
        Ok(())
    }

    /// Flush and drop the handle. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush() {
                warn!("Failed to flush log file {}: {}", self.path.display(), e);
            }
        }
    }
}

impl LogSink for RotatingFileSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "log file is not open")
        })?;

        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        file.write_all(&buf)?;
        file.flush()?;
        self.current_size_bytes += buf.len() as u64;
        Ok(())
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        self.close();
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn rename_if_exists(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
