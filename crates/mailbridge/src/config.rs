//! Runtime configuration.

use std::path::{Path, PathBuf};

/// Environment variable holding the profile database path.
pub const DATABASE_ENV: &str = "MAILBRIDGE_DB";

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `SQLite` file holding the profiles.
    pub database_path: PathBuf,
}

impl Config {
    /// Reads settings from the environment, falling back to the user data directory.
    pub fn from_env() -> Self {
        Self::resolve(
            std::env::var_os(DATABASE_ENV).map(PathBuf::from),
            dirs::data_dir(),
        )
    }

    fn resolve(explicit: Option<PathBuf>, data_dir: Option<PathBuf>) -> Self {
        let database_path = explicit
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| default_database_path(data_dir));
        Self { database_path }
    }

    /// Creates the directory that will hold the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_data_dir(&self) -> std::io::Result<()> {
        match self.database_path.parent() {
            Some(parent) if parent != Path::new("") => std::fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

fn default_database_path(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailbridge")
        .join("mailbridge.db")
}
