use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};

const LOG_DIR_NAME: &str = "CssCustomProperties";
const LOG_FILE_NAME: &str = "css_custom_properties.log";

/// Writes `[timestamp] [LEVEL] message` lines to a single file
struct FileLogger {
    file: Mutex<File>,
    level: LevelFilter,
}

impl FileLogger {
    /// Open `file_path` for writing, replacing the previous run's log
    fn new(file_path: &Path, level: LevelFilter) -> io::Result<Self> {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(file_path)?;

        Ok(FileLogger {
            file: Mutex::new(file),
            level,
        })
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(
                file,
                "[{}] [{}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            );
            let _ = file.flush();
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Platform-specific log file path under the local data directory
fn get_log_file_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let data_dir = dirs::data_local_dir().ok_or("Could not determine local data directory")?;
    Ok(data_dir.join(LOG_DIR_NAME).join(LOG_FILE_NAME))
}

/// Install the file logger for the process, overwriting previous logs
pub fn init_logger() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let log_file_path = get_log_file_path()?;
    let logger = FileLogger::new(&log_file_path, LevelFilter::Info)?;

    log::set_boxed_logger(Box::new(logger)).map(|()| log::set_max_level(LevelFilter::Info))?;

    Ok(log_file_path)
}
