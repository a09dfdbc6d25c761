//! # LogKeeper
//!
//! LogKeeper provides two small loggers for applications:
//!
//! * [`ConsoleLogger`] tags every message with a severity label (`INFO:`,
//!   `ERROR:`, `DEBUG:`, `FATAL:`) and writes it, decorated with the date,
//!   time and caller location, to a swappable output sink.
//! * [`FileLogger`] appends timestamped lines to a file, rotates the file
//!   into a timestamped `.BAK` backup once it reaches a size threshold, and
//!   deletes backups older than a retention window on request.
//!
//! Failures while logging never reach the caller. The file logger reports
//! its own trouble (a failed rename, an unreadable directory) on a separate
//! [`Diagnostics`] channel so a broken log file cannot hide its own
//! breakage. Only construction and [`FileLogger::check_network_path`]
//! return errors.
//!
//! ## Example
//!
//! ```rust
//! use logkeeper::{FileLoggerBuilder, Level, RotationSize};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dir = tempfile::tempdir()?;
//!     let mut logger = FileLoggerBuilder::new(dir.path().join("app.log"))
//!         .max_size(RotationSize::KB(256))
//!         .retention_days(7)
//!         .build()?;
//!
//!     logger.info("Service started");
//!     logger.log(Level::Warning, "Cache is cold");
//!     logger.clean_old_logs();
//!     logger.close()?;
//!     Ok(())
//! }
//! ```
use {
    chrono::{DateTime, FixedOffset, Local, Utc},
    regex::Regex,
    std::{
        fmt,
        fs,
        io::{self, Write as _},
        path::{Path, PathBuf},
    },
};

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};

mod console;
mod error;
mod file;

pub use {
    console::ConsoleLogger,
    error::{FileLoggerError, PathCheckError},
    file::FileLogger,
};

/// Size at which the active log file is rotated unless configured otherwise.
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 5 * 1024 * 1024;

/// Age in days past which backup files are removed by
/// [`FileLogger::clean_old_logs`] unless configured otherwise.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Extension carried by every rotated backup file.
pub const BACKUP_EXTENSION: &str = "BAK";

const DEFAULT_FILE_MODE: u32 = 0o644;
const DEFAULT_DIR_MODE: u32 = 0o755;

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    /// Only the console logger terminates the process at this level; the
    /// file logger records it like any other line.
    Fatal,
}

impl Level {
    /// The label written into log lines, e.g. `INFO`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Defines the size threshold at which the active log file is rotated.
///
/// The file is rotated by the first write that finds it at or above the
/// threshold.
///
/// # Examples
/// ```
/// use logkeeper::{FileLoggerBuilder, RotationSize};
///
/// let dir = tempfile::tempdir().unwrap();
/// let logger = FileLoggerBuilder::new(dir.path().join("large.log"))
///     .max_size(RotationSize::MB(100))
///     .build()
///     .unwrap();
/// assert_eq!(logger.max_size_bytes(), 100 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationSize {
    /// Raw byte count
    Bytes(u64),
    /// Kilobytes (1 KB = 1024 bytes)
    KB(u64),
    /// Megabytes (1 MB = 1024 KB = 1,048,576 bytes)
    MB(u64),
    /// Gigabytes (1 GB = 1024 MB = 1,073,741,824 bytes)
    GB(u64),
}

impl RotationSize {
    /// Get the threshold in bytes.
    pub fn bytes(&self) -> u64 {
        match self {
            RotationSize::Bytes(b) => *b,
            RotationSize::KB(kb) => kb.saturating_mul(1024),
            RotationSize::MB(mb) => mb.saturating_mul(1024 * 1024),
            RotationSize::GB(gb) => gb.saturating_mul(1024 * 1024 * 1024),
        }
    }
}

impl Default for RotationSize {
    fn default() -> Self {
        RotationSize::Bytes(DEFAULT_MAX_SIZE_BYTES)
    }
}

/// Specifies the clock used for line timestamps and backup file names.
///
/// `Local` is resolved on every timestamp, so daylight saving changes are
/// picked up by long-running loggers.
///
/// # Examples
/// ```
/// use logkeeper::TimeZone;
/// use chrono::FixedOffset;
///
/// let utc = TimeZone::UTC;
/// let local = TimeZone::Local;
/// let tokyo = TimeZone::Fix(FixedOffset::east_opt(9 * 3600).unwrap());
/// ```
#[derive(Debug, Clone)]
pub enum TimeZone {
    /// Use UTC. Best when logs from several regions are compared.
    UTC,
    /// Use the system's local time zone.
    Local,
    /// Use a fixed offset regardless of where the application runs.
    Fix(FixedOffset),
}

impl TimeZone {
    /// Get the current time in this time zone.
    fn now(&self) -> DateTime<FixedOffset> {
        match self {
            TimeZone::UTC => Utc::now().fixed_offset(),
            TimeZone::Local => Local::now().fixed_offset(),
            TimeZone::Fix(fixed_offset) => Utc::now().with_timezone(fixed_offset),
        }
    }
}

/// Channel on which the file logger reports its own failures.
///
/// Rotation, cleanup and write failures never propagate to the caller of
/// [`FileLogger::log`]. They are written here instead, one formatted line per
/// failure, so they stay visible even when the managed log file is the thing
/// that broke.
pub enum Diagnostics {
    /// Write diagnostic lines to standard error.
    Stderr,
    /// Write diagnostic lines to a caller-supplied sink.
    Writer(Box<dyn io::Write + Send>),
}

impl Diagnostics {
    /// Route diagnostics to any writer, e.g. an in-memory buffer in tests.
    pub fn writer<W: io::Write + Send + 'static>(writer: W) -> Self {
        Diagnostics::Writer(Box::new(writer))
    }

    pub(crate) fn emit(&mut self, line: &str) {
        // Nowhere left to report a failing diagnostic sink.
        match self {
            Diagnostics::Stderr => {
                let _ = writeln!(io::stderr().lock(), "{line}");
            }
            Diagnostics::Writer(writer) => {
                let _ = writeln!(writer, "{line}");
                let _ = writer.flush();
            }
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics::Stderr
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostics::Stderr => f.write_str("Stderr"),
            Diagnostics::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Configuration of a file logger, fixed once the logger is built.
#[derive(Debug, Clone)]
pub(crate) struct FileLoggerMeta {
    /// Location of the active log file.
    path: PathBuf,
    /// Size at which the active file is rotated.
    max_size: RotationSize,
    /// Age in days past which backups are removed by cleanup.
    retention_days: u32,
    /// Clock used for line timestamps and backup names.
    time_zone: TimeZone,
    /// Mode for newly created log files (Unix-like systems only).
    file_mode: Option<u32>,
    /// Mode for directories created on the way to the log file (Unix-like
    /// systems only).
    dir_mode: u32,
}

impl FileLoggerMeta {
    fn new<P: AsRef<Path>>(path: P) -> Self {
        FileLoggerMeta {
            path: path.as_ref().to_path_buf(),
            max_size: RotationSize::default(),
            retention_days: DEFAULT_RETENTION_DAYS,
            time_zone: TimeZone::Local,
            file_mode: Some(DEFAULT_FILE_MODE),
            dir_mode: DEFAULT_DIR_MODE,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn max_size_bytes(&self) -> u64 {
        self.max_size.bytes()
    }

    pub(crate) fn retention_days(&self) -> u32 {
        self.retention_days
    }

    /// Get the current time in the configured time zone.
    pub(crate) fn now(&self) -> DateTime<FixedOffset> {
        self.time_zone.now()
    }

    /// Format a log line as `MM-DD-YYYY HH:MM:SS.FFFF <LEVEL> <message>`.
    pub(crate) fn format_entry(&self, level: Level, msg: &str) -> String {
        format!("{} {level} {msg}", format_timestamp(&self.now()))
    }

    /// The directory holding the log file and its backups.
    pub(crate) fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// The file name with its last extension stripped, `app` for `app.log`.
    fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Open the log file for appending, creating it and any missing parent
    /// directories first.
    pub(crate) fn create_log_file(&self) -> Result<fs::File, FileLoggerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let mut dir_builder = fs::DirBuilder::new();
            dir_builder.recursive(true);
            #[cfg(unix)]
            {
                dir_builder.mode(self.dir_mode);
            }
            dir_builder
                .create(parent)
                .map_err(|err| FileLoggerError::CreateDirectoryFailed(parent.to_path_buf(), err.to_string()))?;
        }

        let mut open_options = fs::OpenOptions::new();
        open_options.append(true).create(true);
        #[cfg(unix)]
        {
            if let Some(mode) = self.file_mode {
                open_options.mode(mode);
            }
        }

        open_options.open(&self.path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => FileLoggerError::NotFound(self.path.clone(), err.to_string()),
            io::ErrorKind::PermissionDenied => FileLoggerError::PermissionDenied(self.path.clone(), err.to_string()),
            _ => FileLoggerError::CreateFileFailed(self.path.clone(), err.to_string()),
        })
    }

    /// Get the path a rotation at `datetime` renames the active file to.
    ///
    /// The name is `<stem>.<MMDDYYYYHHMMSS>.BAK` next to the active file. A
    /// second rotation within the same second gets a `_N` counter so it never
    /// replaces an earlier backup.
    pub(crate) fn backup_path(&self, datetime: &DateTime<FixedOffset>) -> PathBuf {
        let stem = self.stem();
        let stamp = datetime.format("%m%d%Y%H%M%S").to_string();
        let directory = self.directory();

        let mut candidate = directory.join(format!("{stem}.{stamp}.{BACKUP_EXTENSION}"));
        let mut counter = 1;
        while candidate.exists() {
            candidate = directory.join(format!("{stem}.{stamp}_{counter}.{BACKUP_EXTENSION}"));
            counter += 1;
        }
        candidate
    }

    /// Pattern matching the file names produced by [`Self::backup_path`].
    pub(crate) fn backup_pattern(&self) -> Result<Regex, FileLoggerError> {
        Regex::new(&format!(
            r"^{}\.\d{{14}}(?:_\d+)?\.{BACKUP_EXTENSION}$",
            regex::escape(&self.stem())
        ))
        .map_err(|err| FileLoggerError::InternalError(err.to_string()))
    }
}

/// Format a timestamp as `MM-DD-YYYY HH:MM:SS.FFFF`, truncating to four
/// fractional digits.
fn format_timestamp(datetime: &DateTime<FixedOffset>) -> String {
    // Leap seconds report more than a million microseconds.
    let fraction = (datetime.timestamp_subsec_micros() / 100).min(9999);
    format!("{}.{fraction:04}", datetime.format("%m-%d-%Y %H:%M:%S"))
}

/// Provides a fluent interface for configuring [`FileLogger`] instances.
///
/// # Default Configuration
///
/// If not explicitly configured, the logger uses these defaults:
/// * Rotate at 5 MiB
/// * Remove backups older than 30 days when cleaning
/// * Local system time zone
/// * Mode `0o644` for new files and `0o755` for new directories
/// * Diagnostics on standard error
///
/// # Examples
///
/// ```rust
/// use logkeeper::{FileLoggerBuilder, RotationSize, TimeZone};
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut logger = FileLoggerBuilder::new(dir.path().join("nested/app.log"))
///     .max_size(RotationSize::KB(512))
///     .retention_days(14)
///     .time_zone(TimeZone::UTC)
///     .file_mode(0o640)
///     .build()
///     .unwrap();
/// logger.info("ready");
/// ```
#[derive(Debug)]
pub struct FileLoggerBuilder {
    meta: FileLoggerMeta,
    diagnostics: Diagnostics,
}

impl FileLoggerBuilder {
    /// Create a new builder for the log file at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileLoggerBuilder {
            meta: FileLoggerMeta::new(path),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Set the size at which the log file is rotated.
    pub fn max_size(self, max_size: RotationSize) -> Self {
        Self {
            meta: FileLoggerMeta { max_size, ..self.meta },
            ..self
        }
    }

    /// Set how many days a backup is kept before cleanup removes it.
    pub fn retention_days(self, retention_days: u32) -> Self {
        Self {
            meta: FileLoggerMeta {
                retention_days,
                ..self.meta
            },
            ..self
        }
    }

    /// Set the time zone for line timestamps and backup names.
    pub fn time_zone(self, time_zone: TimeZone) -> Self {
        Self {
            meta: FileLoggerMeta {
                time_zone,
                ..self.meta
            },
            ..self
        }
    }

    /// Set the file permissions for new log files (Unix-like systems only).
    /// This sets the file mode bits in octal notation like when using chmod,
    /// subject to the process umask. Ignored on other platforms.
    pub fn file_mode(self, mode: u32) -> Self {
        Self {
            meta: FileLoggerMeta {
                file_mode: Some(mode),
                ..self.meta
            },
            ..self
        }
    }

    /// Set the channel on which the logger reports its own failures.
    pub fn diagnostics(self, diagnostics: Diagnostics) -> Self {
        Self { diagnostics, ..self }
    }

    /// Create missing directories, open the log file and build the logger.
    pub fn build(self) -> Result<FileLogger, FileLoggerError> {
        let writer = self.meta.create_log_file()?;
        Ok(FileLogger::from_parts(self.meta, writer, self.diagnostics))
    }
}

/// Log through a [`ConsoleLogger`] at `INFO` with `format!`-style arguments.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.info(::std::format_args!($($arg)+))
    };
}

/// Log through a [`ConsoleLogger`] at `ERROR` with `format!`-style arguments.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.error(::std::format_args!($($arg)+))
    };
}

/// Log through a [`ConsoleLogger`] at `DEBUG` with `format!`-style arguments.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debug(::std::format_args!($($arg)+))
    };
}

/// Log through a [`ConsoleLogger`] at `FATAL`, then exit the process with
/// status 1.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatal(::std::format_args!($($arg)+))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_at(path: &Path) -> FileLoggerMeta {
        FileLoggerMeta {
            time_zone: TimeZone::UTC,
            ..FileLoggerMeta::new(path)
        }
    }

    fn fixed_time() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-03-07T14:05:09.123456789+00:00").unwrap()
    }

    #[test]
    fn rotation_size_bytes() {
        assert_eq!(RotationSize::Bytes(10).bytes(), 10);
        assert_eq!(RotationSize::KB(2).bytes(), 2048);
        assert_eq!(RotationSize::MB(5).bytes(), DEFAULT_MAX_SIZE_BYTES);
        assert_eq!(RotationSize::GB(1).bytes(), 1_073_741_824);
        assert_eq!(RotationSize::default().bytes(), 5_242_880);
    }

    #[test]
    fn level_labels() {
        assert_eq!(Level::Info.to_string(), "INFO");
        assert_eq!(Level::Warning.as_str(), "WARNING");
        assert_eq!(Level::Fatal.as_str(), "FATAL");
    }

    #[test]
    fn timestamp_keeps_four_fractional_digits() {
        assert_eq!(format_timestamp(&fixed_time()), "03-07-2026 14:05:09.1234");
    }

    #[test]
    fn entry_format() {
        let meta = meta_at(Path::new("logs/app.log"));
        let entry = meta.format_entry(Level::Warning, "disk almost full");
        let pattern = Regex::new(r"^\d{2}-\d{2}-\d{4} \d{2}:\d{2}:\d{2}\.\d{4} WARNING disk almost full$").unwrap();
        assert!(pattern.is_match(&entry), "unexpected entry: {entry}");
    }

    #[test]
    fn backup_name_strips_extension() {
        let dir = tempfile::tempdir().unwrap();
        let meta = meta_at(&dir.path().join("app.log"));
        let backup = meta.backup_path(&fixed_time());
        assert_eq!(backup, dir.path().join("app.03072026140509.BAK"));
    }

    #[test]
    fn backup_name_avoids_existing_backup() {
        let dir = tempfile::tempdir().unwrap();
        let meta = meta_at(&dir.path().join("app.log"));
        fs::write(dir.path().join("app.03072026140509.BAK"), "older").unwrap();
        fs::write(dir.path().join("app.03072026140509_1.BAK"), "old").unwrap();

        let backup = meta.backup_path(&fixed_time());
        assert_eq!(backup, dir.path().join("app.03072026140509_2.BAK"));
    }

    #[test]
    fn backup_pattern_matches_only_own_backups() {
        let meta = meta_at(Path::new("/var/log/app.log"));
        let pattern = meta.backup_pattern().unwrap();

        assert!(pattern.is_match("app.03072026140509.BAK"));
        assert!(pattern.is_match("app.03072026140509_3.BAK"));
        assert!(!pattern.is_match("app.log.BAK"));
        assert!(!pattern.is_match("app.log"));
        assert!(!pattern.is_match("other.03072026140509.BAK"));
        assert!(!pattern.is_match("app.0307202614050.BAK"));
        assert!(!pattern.is_match("app.03072026140509.BAK.gz"));
    }

    #[test]
    fn backup_pattern_escapes_stem() {
        let meta = meta_at(Path::new("svc+1.log"));
        let pattern = meta.backup_pattern().unwrap();
        assert!(pattern.is_match("svc+1.03072026140509.BAK"));
        assert!(!pattern.is_match("svcc1.03072026140509.BAK"));
    }

    #[test]
    fn fixed_zone_applies_its_offset() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let meta = FileLoggerBuilder::new("app.log").time_zone(TimeZone::Fix(tokyo)).meta;
        assert_eq!(meta.now().offset().local_minus_utc(), 9 * 3600);
        assert_eq!(meta_at(Path::new("app.log")).now().offset().local_minus_utc(), 0);
    }

    #[test]
    fn local_zone_is_resolved_per_timestamp() {
        let meta = FileLoggerMeta::new("app.log");
        assert!(matches!(meta.time_zone, TimeZone::Local));

        let before = Local::now().offset().local_minus_utc();
        let offset = meta.now().offset().local_minus_utc();
        let after = Local::now().offset().local_minus_utc();
        assert!(offset == before || offset == after);
    }

    #[test]
    fn directory_of_bare_file_name_is_current_dir() {
        assert_eq!(meta_at(Path::new("app.log")).directory(), Path::new("."));
        assert_eq!(meta_at(Path::new("logs/app.log")).directory(), Path::new("logs"));
    }
}
