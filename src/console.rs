use {
    crate::Level,
    chrono::{DateTime, Local},
    std::{
        fmt,
        io::{self, Write},
        panic::Location,
        path::Path,
        sync::{Mutex, PoisonError},
    },
};

/// A console logger that prefixes every message with its severity.
///
/// Each call writes one line of the form
/// `YYYY/MM/DD HH:MM:SS file.rs:42: INFO: message`, where `file.rs:42` is the
/// location of the call. Output goes to stdout unless another sink is
/// installed with [`ConsoleLogger::with_writer`] or
/// [`ConsoleLogger::set_output`]. Write failures are ignored.
///
/// Use the crate's `info!`, `error!`, `debug!` and `fatal!` macros for
/// `format!`-style arguments:
///
/// ```
/// use logkeeper::{info, error, ConsoleLogger};
///
/// let logger = ConsoleLogger::with_writer(std::io::sink());
/// info!(logger, "listening on port {}", 8080);
/// error!(logger, "request {} failed", "abc");
/// ```
pub struct ConsoleLogger {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleLogger {
    /// Create a logger writing to stdout.
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Create a logger writing to `writer`.
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        ConsoleLogger {
            out: Mutex::new(Box::new(writer)),
        }
    }

    /// Replace the output sink. Lines already written are unaffected.
    pub fn set_output<W: Write + Send + 'static>(&self, writer: W) {
        *self.out.lock().unwrap_or_else(PoisonError::into_inner) = Box::new(writer);
    }

    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.output(Location::caller(), Level::Info, args);
    }

    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.output(Location::caller(), Level::Error, args);
    }

    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.output(Location::caller(), Level::Debug, args);
    }

    /// Write the message, then exit the process with status 1.
    #[track_caller]
    pub fn fatal(&self, args: fmt::Arguments<'_>) -> ! {
        self.output(Location::caller(), Level::Fatal, args);
        std::process::exit(1)
    }

    fn output(&self, location: &Location<'_>, level: Level, args: fmt::Arguments<'_>) {
        let line = format_line(&Local::now(), location, level, args);
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = out.write_all(line.as_bytes());
        let _ = out.flush();
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConsoleLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleLogger").finish_non_exhaustive()
    }
}

fn format_line(now: &DateTime<Local>, location: &Location<'_>, level: Level, args: fmt::Arguments<'_>) -> String {
    let file = Path::new(location.file())
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_else(|| location.file().into());
    format!(
        "{} {file}:{}: {level}: {args}\n",
        now.format("%Y/%m/%d %H:%M:%S"),
        location.line()
    )
}
