use std::path::PathBuf;

/// File locations used by the app, resolved against the working directory.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub export_path: PathBuf,
    pub log_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("tasks.db"),
            export_path: PathBuf::from("tasks.json"),
            log_path: PathBuf::from("tasklist.log"),
        }
    }
}
