use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Name of the log file inside the logs directory.
pub const LOG_FILE_NAME: &str = "book_scanner.log";

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the log file: `<exe_dir>/logs/book_scanner.log`
pub fn get_log_file() -> PathBuf {
    get_logs_dir().join(LOG_FILE_NAME)
}

/// Ensures the logs directory exists. Call at startup.
pub fn ensure_log_dir() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())
}
