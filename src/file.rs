use {
    crate::{Diagnostics, FileLoggerBuilder, FileLoggerError, FileLoggerMeta, Level, PathCheckError},
    chrono::{DateTime, Duration, Utc},
    std::{
        fs,
        io::{self, Write},
        path::Path,
    },
};

/// A file logger that rotates its file by size and cleans up old backups.
///
/// Every call to [`FileLogger::log`] checks the size of the open file
/// before writing. Once the file has reached the configured threshold it is
/// closed, renamed to `<stem>.<MMDDYYYYHHMMSS>.BAK` next to the original,
/// and a fresh file is opened at the original path.
///
/// The logger assumes a single writer. All mutating operations take
/// `&mut self`, so sharing one logger across threads requires wrapping it in
/// a `Mutex` (or handing it to `tracing_appender::non_blocking`, which owns it
/// on a dedicated thread).
#[derive(Debug)]
pub struct FileLogger {
    meta: FileLoggerMeta,
    /// `None` after a rotation failed between closing the old file and
    /// opening the new one. The next write reopens the file.
    writer: Option<fs::File>,
    /// Whether the last raw write ended a line. Rotation only happens
    /// between lines.
    at_line_start: bool,
    diagnostics: Diagnostics,
}

impl FileLogger {
    /// Open (or create) the log file at `path` with the default 5 MiB
    /// rotation threshold and 30 day retention window.
    ///
    /// Missing parent directories are created. Fails when the directory or
    /// the file cannot be created.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<FileLogger, FileLoggerError> {
        FileLoggerBuilder::new(path).build()
    }

    pub(crate) fn from_parts(meta: FileLoggerMeta, writer: fs::File, diagnostics: Diagnostics) -> Self {
        FileLogger {
            meta,
            writer: Some(writer),
            at_line_start: true,
            diagnostics,
        }
    }

    /// The path of the active log file.
    pub fn path(&self) -> &Path {
        self.meta.path()
    }

    /// The size in bytes at which the active file is rotated.
    pub fn max_size_bytes(&self) -> u64 {
        self.meta.max_size_bytes()
    }

    /// How many days a backup survives [`FileLogger::clean_old_logs`].
    pub fn retention_days(&self) -> u32 {
        self.meta.retention_days()
    }

    /// Write one `MM-DD-YYYY HH:MM:SS.FFFF <LEVEL> <message>` line, rotating
    /// the file first if it has reached the size threshold.
    ///
    /// Never fails. Problems checking, rotating or writing the file are
    /// reported on the diagnostic channel.
    pub fn log(&mut self, level: Level, msg: &str) {
        let entry = self.meta.format_entry(level, msg);

        if self.writer.is_none() {
            self.reopen();
        }
        self.rotate_if_needed();

        let result = match self.writer.as_mut() {
            Some(writer) => writeln!(writer, "{entry}"),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "no open log file")),
        };
        self.at_line_start = true;
        if let Err(err) = result {
            self.report(Level::Error, &format!("Dropped log entry ({err}): {entry}"));
        }
    }

    /// Log a message at `INFO`.
    pub fn info(&mut self, msg: &str) {
        self.log(Level::Info, msg)
    }

    /// Log a message at `WARNING`.
    pub fn warning(&mut self, msg: &str) {
        self.log(Level::Warning, msg)
    }

    /// Log a message at `ERROR`.
    pub fn error(&mut self, msg: &str) {
        self.log(Level::Error, msg)
    }

    /// Remove backups of this log file that were last modified more than the
    /// retention window ago.
    ///
    /// Only files named like the backups this logger produces are
    /// considered. Each file is handled on its own: a failure is reported on
    /// the diagnostic channel and the remaining files are still processed.
    /// Returns how many backups were removed.
    pub fn clean_old_logs(&mut self) -> usize {
        let pattern = match self.meta.backup_pattern() {
            Ok(pattern) => pattern,
            Err(err) => {
                self.report(Level::Error, &format!("Failed to build backup file pattern: {err}"));
                return 0;
            }
        };

        let directory = self.meta.directory().to_path_buf();
        let entries = match fs::read_dir(&directory) {
            Ok(entries) => entries,
            Err(err) => {
                self.report(
                    Level::Error,
                    &format!("Failed to list backup log files in '{}': {err}", directory.display()),
                );
                return 0;
            }
        };

        let retention = Duration::days(i64::from(self.meta.retention_days()));
        let Some(threshold) = Utc::now().checked_sub_signed(retention) else {
            return 0;
        };

        let mut removed = 0;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.report(Level::Warning, &format!("Failed to read directory entry: {err}"));
                    continue;
                }
            };
            if !entry.file_name().to_str().is_some_and(|name| pattern.is_match(name)) {
                continue;
            }

            let path = entry.path();
            let modified = match fs::metadata(&path).and_then(|metadata| {
                if metadata.is_file() {
                    metadata.modified().map(Some)
                } else {
                    Ok(None)
                }
            }) {
                Ok(Some(modified)) => DateTime::<Utc>::from(modified),
                Ok(None) => continue,
                Err(err) => {
                    self.report(
                        Level::Warning,
                        &format!("Failed to stat file '{}': {err}", path.display()),
                    );
                    continue;
                }
            };

            if modified < threshold {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        removed += 1;
                        self.write_internal(Level::Info, &format!("Removed old log file: {}", path.display()));
                    }
                    Err(err) => self.report(
                        Level::Error,
                        &format!("Failed to remove old log file '{}': {err}", path.display()),
                    ),
                }
            }
        }
        removed
    }

    /// Check that the log path is currently reachable, e.g. when it lives on
    /// a network share.
    pub fn check_network_path(&self) -> Result<(), PathCheckError> {
        let path = self.meta.path();
        match fs::metadata(path) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(PathCheckError::NotFound(path.to_path_buf())),
            Err(error) => Err(PathCheckError::Inaccessible {
                path: path.to_path_buf(),
                error,
            }),
        }
    }

    /// Flush the log file to disk and release it.
    ///
    /// Dropping the logger releases the file as well, without reporting
    /// errors.
    pub fn close(mut self) -> Result<(), FileLoggerError> {
        match self.writer.take() {
            Some(writer) => writer.sync_all().map_err(FileLoggerError::FileIOError),
            None => Ok(()),
        }
    }

    /// Rotate the file if it has reached the size threshold.
    fn rotate_if_needed(&mut self) {
        let Some(writer) = self.writer.as_ref() else {
            return;
        };
        match writer.metadata() {
            Ok(metadata) => {
                if metadata.len() >= self.meta.max_size_bytes() {
                    self.rotate();
                }
            }
            Err(err) => self.report(Level::Error, &format!("Failed to check log file size: {err}")),
        }
    }

    /// Close the active file, rename it to a backup and open a fresh file at
    /// the original path.
    ///
    /// A failed close keeps the old file open. A failed rename or reopen
    /// leaves the logger without a file until the next write reopens it.
    fn rotate(&mut self) {
        // 1. Close the current file
        if let Some(writer) = self.writer.take() {
            if let Err(err) = writer.sync_all() {
                self.writer = Some(writer);
                self.report(
                    Level::Error,
                    &format!("Failed to close log file during rotation: {err}"),
                );
                return;
            }
        }

        // 2. Rename it to the backup name
        let backup_path = self.meta.backup_path(&self.meta.now());
        if let Err(err) = fs::rename(self.meta.path(), &backup_path) {
            self.report(
                Level::Error,
                &format!(
                    "Failed to rename log file '{}' to '{}': {err}",
                    self.meta.path().display(),
                    backup_path.display()
                ),
            );
            return;
        }

        // 3. Open a fresh file at the original path
        match self.meta.create_log_file() {
            Ok(file) => {
                self.writer = Some(file);
                self.write_internal(
                    Level::Info,
                    &format!("Log file rotated to {}", backup_path.display()),
                );
                self.write_internal(
                    Level::Info,
                    &format!("Logging resumed in new file: {}", self.meta.path().display()),
                );
            }
            Err(err) => self.report(
                Level::Error,
                &format!("Failed to open new log file after rotation: {err}"),
            ),
        }
    }

    /// Reopen the log file after an earlier rotation lost it.
    fn reopen(&mut self) {
        match self.meta.create_log_file() {
            Ok(file) => self.writer = Some(file),
            Err(err) => self.report(Level::Error, &format!("Failed to reopen log file: {err}")),
        }
    }

    /// Write a line about the logger's own activity into the managed file.
    fn write_internal(&mut self, level: Level, msg: &str) {
        let entry = self.meta.format_entry(level, msg);
        if let Some(writer) = self.writer.as_mut() {
            if let Err(err) = writeln!(writer, "{entry}") {
                self.report(Level::Error, &format!("Failed to write to log file: {err}"));
            }
        }
    }

    /// Send a line to the diagnostic channel.
    fn report(&mut self, level: Level, msg: &str) {
        let line = self.meta.format_entry(level, msg);
        self.diagnostics.emit(&line);
    }
}

/// Raw writes pass through the same rotation check as [`FileLogger::log`],
/// which lets the logger serve as an appender for `tracing_appender` or
/// `writeln!`. Unlike `log`, write failures are returned.
///
/// A line written in several pieces (as `write_fmt` does) is never split
/// across a rotation: the size check only runs when the previous write ended
/// with a newline.
impl io::Write for FileLogger {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.writer.is_none() {
            self.reopen();
        }
        if self.at_line_start {
            self.rotate_if_needed();
        }

        let written = match self.writer.as_mut() {
            Some(writer) => writer.write(buf)?,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotConnected,
                    format!("no open log file at '{}'", self.meta.path().display()),
                ))
            }
        };
        if let Some(last) = buf[..written].last() {
            self.at_line_start = *last == b'\n';
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::RotationSize,
        std::sync::{Arc, Mutex},
    };

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn backups_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".BAK"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn small_file_is_not_rotated() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = FileLoggerBuilder::new(dir.path().join("app.log"))
            .max_size(RotationSize::KB(1))
            .build()
            .unwrap();

        logger.info("hello");
        logger.warning("careful");
        logger.error("broken");

        assert!(backups_in(dir.path()).is_empty());
        let contents = fs::read_to_string(dir.path().join("app.log")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(" INFO hello"));
        assert!(lines[1].ends_with(" WARNING careful"));
        assert!(lines[2].ends_with(" ERROR broken"));
    }

    #[test]
    fn rotation_writes_notice_into_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = FileLoggerBuilder::new(dir.path().join("app.log"))
            .max_size(RotationSize::Bytes(1))
            .build()
            .unwrap();

        logger.info("first");
        logger.info("second");

        let backups = backups_in(dir.path());
        assert_eq!(backups.len(), 1);
        let backup = fs::read_to_string(dir.path().join(&backups[0])).unwrap();
        assert!(backup.ends_with(" INFO first\n"));

        let contents = fs::read_to_string(dir.path().join("app.log")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(&format!("INFO Log file rotated to {}", dir.path().join(&backups[0]).display())));
        assert!(lines[1].contains("INFO Logging resumed in new file: "));
        assert!(lines[2].ends_with(" INFO second"));
    }

    #[test]
    fn lost_file_is_reopened_on_next_write() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let captured = Captured::default();
        let mut logger = FileLoggerBuilder::new(log_dir.join("app.log"))
            .max_size(RotationSize::Bytes(1))
            .diagnostics(Diagnostics::writer(captured.clone()))
            .build()
            .unwrap();

        logger.info("first");
        fs::remove_dir_all(&log_dir).unwrap();

        // The rename fails, so this entry only reaches the diagnostics.
        logger.info("second");
        let diagnostics = captured.contents();
        assert!(diagnostics.contains("ERROR Failed to rename log file"));
        assert!(diagnostics.contains("INFO second"));
        assert!(!log_dir.exists());

        logger.info("third");
        let contents = fs::read_to_string(log_dir.join("app.log")).unwrap();
        assert!(contents.ends_with(" INFO third\n"));
        assert!(!contents.contains("second"));
    }

    #[test]
    fn raw_writes_rotate_too() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = FileLoggerBuilder::new(dir.path().join("raw.log"))
            .max_size(RotationSize::Bytes(10))
            .build()
            .unwrap();

        writeln!(logger, "0123456789").unwrap();
        assert!(backups_in(dir.path()).is_empty());
        writeln!(logger, "next").unwrap();
        logger.flush().unwrap();

        let backups = backups_in(dir.path());
        assert_eq!(backups.len(), 1);
        assert!(backups[0].starts_with("raw."));
        assert_eq!(
            fs::read_to_string(dir.path().join(&backups[0])).unwrap(),
            "0123456789\n"
        );
    }

    #[test]
    fn formatted_line_is_not_split_by_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = FileLoggerBuilder::new(dir.path().join("raw.log"))
            .max_size(RotationSize::Bytes(10))
            .build()
            .unwrap();

        // write_fmt hands these over as three separate writes.
        writeln!(logger, "012345678{}", 42).unwrap();
        writeln!(logger, "012345678{}", 43).unwrap();
        logger.flush().unwrap();

        let backups = backups_in(dir.path());
        assert_eq!(backups.len(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join(&backups[0])).unwrap(),
            "01234567842\n"
        );

        let active = fs::read_to_string(dir.path().join("raw.log")).unwrap();
        let lines: Vec<&str> = active.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("INFO Log file rotated to "));
        assert!(lines[1].contains("INFO Logging resumed in new file: "));
        assert_eq!(lines[2], "01234567843");
    }

    #[test]
    fn close_releases_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = FileLogger::new(dir.path().join("app.log")).unwrap();
        logger.info("bye");
        logger.close().unwrap();

        let contents = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(contents.ends_with(" INFO bye\n"));
    }
}
