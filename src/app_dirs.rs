use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Centralized application directory resolution
#[derive(Debug, Clone)]
pub struct AppDirs {
    data_dir: PathBuf,
}

impl AppDirs {
    /// `$HOME/.local/state/hangr`, else the platform data dir, else the
    /// working directory.
    pub fn resolve() -> Self {
        let data_dir = if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".local").join("state").join("hangr")
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", "hangr") {
            proj_dirs.data_local_dir().to_path_buf()
        } else {
            PathBuf::from(".")
        };
        Self { data_dir }
    }

    pub fn with_data_dir<P: AsRef<Path>>(p: P) -> Self {
        Self {
            data_dir: p.as_ref().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn words_db(&self) -> PathBuf {
        crate::words::db_path(&self.data_dir)
    }

    pub fn users_db(&self) -> PathBuf {
        crate::accounts::db_path(&self.data_dir)
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("hangr.log")
    }
}
