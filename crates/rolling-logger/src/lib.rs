//! Rolling Logger
//!
//! File logger that starts a new file every day and keeps the most recent
//! lines in a circular buffer so they can be inspected without reading the
//! log directory.
//!
//! `log` records are picked up through tracing-subscriber's `tracing-log`
//! bridge, so crates that only depend on `log` end up in the same file.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;

/// Number of lines kept in memory
pub const DEFAULT_CAPACITY: usize = 500;

static WRITER: OnceLock<RollingWriter> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Logger setup errors
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("Log file error: {0}")]
    Io(#[from] io::Error),
    #[error("Logger already initialized")]
    AlreadyInitialized,
    #[error("Logger not initialized")]
    NotInitialized,
}

struct RollingState {
    dir: PathBuf,
    app_name: String,
    day: Option<NaiveDate>,
    file: Option<File>,
    recent: VecDeque<String>,
    capacity: usize,
}

impl RollingState {
    fn roll_to(&mut self, day: NaiveDate) -> io::Result<()> {
        if self.day == Some(day) && self.file.is_some() {
            return Ok(());
        }
        let path = file_path(&self.dir, &self.app_name, day);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.file = Some(file);
        self.day = Some(day);
        Ok(())
    }

    fn remember(&mut self, buf: &[u8]) {
        let text = String::from_utf8_lossy(buf);
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            if self.recent.len() == self.capacity {
                self.recent.pop_front();
            }
            self.recent.push_back(line.to_string());
        }
    }
}

/// Writer shared by every formatted event
#[derive(Clone)]
pub struct RollingWriter {
    state: Arc<Mutex<RollingState>>,
}

impl RollingWriter {
    pub fn new(
        dir: impl Into<PathBuf>,
        app_name: &str,
        capacity: usize,
    ) -> Result<Self, LoggerError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            state: Arc::new(Mutex::new(RollingState {
                dir,
                app_name: app_name.to_string(),
                day: None,
                file: None,
                recent: VecDeque::with_capacity(capacity),
                capacity: capacity.max(1),
            })),
        })
    }

    /// Write a chunk into the file for `day`, rolling over if the day changed
    pub fn write_for_day(&self, day: NaiveDate, buf: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();
        state.roll_to(day)?;
        if let Some(file) = state.file.as_mut() {
            file.write_all(buf)?;
        }
        state.remember(buf);
        Ok(())
    }

    /// Most recent lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        self.state.lock().recent.iter().cloned().collect()
    }

    /// Path of the file currently being written, if any
    pub fn current_file(&self) -> Option<PathBuf> {
        let state = self.state.lock();
        state.day.map(|day| file_path(&state.dir, &state.app_name, day))
    }

    fn flush_file(&self) -> io::Result<()> {
        match self.state.lock().file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Handle handed to tracing-subscriber for a single event
pub struct RollingHandle {
    writer: RollingWriter,
}

impl Write for RollingHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let today = chrono::Local::now().date_naive();
        self.writer.write_for_day(today, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush_file()
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingHandle;

    fn make_writer(&'a self) -> Self::Writer {
        RollingHandle { writer: self.clone() }
    }
}

fn file_path(dir: &Path, app_name: &str, day: NaiveDate) -> PathBuf {
    dir.join(format!("{}.{}.log", app_name, day.format("%Y-%m-%d")))
}

/// Install the global subscriber writing into `log_dir`
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), LoggerError> {
    // Held until WRITER is set
    let _guard = INIT_LOCK.lock();
    if WRITER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }
    let writer = RollingWriter::new(log_dir, app_name, DEFAULT_CAPACITY)?;

    tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    WRITER
        .set(writer)
        .map_err(|_| LoggerError::AlreadyInitialized)
}

fn ensure_initialized() -> Result<(), LoggerError> {
    WRITER.get().map(|_| ()).ok_or(LoggerError::NotInitialized)
}

pub fn info(msg: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    log::info!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    log::error!("{}", msg);
    Ok(())
}

/// File the global logger is writing to, once it has written anything
pub fn current_log_file() -> Option<PathBuf> {
    WRITER.get().and_then(RollingWriter::current_file)
}

/// Recent lines of the global logger (empty before `init_logger`)
pub fn recent_lines() -> Vec<String> {
    WRITER.get().map(RollingWriter::recent_lines).unwrap_or_default()
}
