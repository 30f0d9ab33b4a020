use chrono::Local;
use env_logger::{Builder, Env};
use log::{debug, error, info};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::SystemTime;

use crate::config::LogSettings;

static INIT: Once = Once::new();

/// Initialize the logging system
pub fn init_logger(settings: &LogSettings) {
    INIT.call_once(|| {
        // Create log directory if it doesn't exist
        if let Err(e) = fs::create_dir_all(&settings.directory) {
            eprintln!("Failed to create log directory: {}", e);
        }

        let log_file = get_log_file_path(&settings.directory);

        // LOG_LEVEL wins over the configured level
        let env = Env::default().filter_or("LOG_LEVEL", settings.level.as_str());

        let mut builder = Builder::from_env(env);
        builder.format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        });

        match OpenOptions::new().create(true).append(true).open(&log_file) {
            Ok(file) => {
                builder
                    .target(env_logger::Target::Pipe(Box::new(FileAndStdout { file })))
                    .init();

                info!("Logging initialized: {}", log_file.display());
                debug!("Log level: {}", settings.level);
            }
            Err(e) => {
                // Fall back to stdout only
                builder.init();
                error!("Failed to open log file, logging to stdout only: {}", e);
            }
        }

        if let Err(e) = clean_old_logs(&settings.directory, settings.max_files) {
            error!("Failed to clean old logs: {}", e);
        }
    });
}

/// Get the log file path for the current run
fn get_log_file_path(log_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    log_dir.join(format!("banking_{}.log", timestamp))
}

/// Remove all but the newest `max_files` log files
fn clean_old_logs(log_dir: &Path, max_files: usize) -> std::io::Result<()> {
    let mut log_files = Vec::new();

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();

        if path.is_file() && path.extension().map_or(false, |ext| ext == "log") {
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            log_files.push((modified, path));
        }
    }

    // Newest first
    log_files.sort_by(|a, b| b.0.cmp(&a.0));

    for (_, file) in log_files.iter().skip(max_files) {
        debug!("Removing old log file: {}", file.display());
        fs::remove_file(file)?;
    }

    Ok(())
}

/// Custom writer that writes to both a file and stdout
struct FileAndStdout {
    file: File,
}

impl Write for FileAndStdout {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        std::io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;

        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stdout().flush()?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_old_logs_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();

        for i in 0..5 {
            File::create(dir.path().join(format!("banking_{}.log", i))).unwrap();
        }
        File::create(dir.path().join("notes.txt")).unwrap();

        clean_old_logs(dir.path(), 2).unwrap();

        let remaining_logs = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "log"))
            .count();

        assert_eq!(remaining_logs, 2);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_log_file_path_is_in_directory() {
        let path = get_log_file_path(Path::new("data/logs"));
        assert!(path.starts_with("data/logs"));
        assert_eq!(path.extension().unwrap(), "log");
    }
}
