// pensettings/src/paths.rs

use std::path::PathBuf;

/// Directory holding config.yaml and the log file: the executable's folder,
/// falling back to the working directory.
pub fn app_root_dir() -> PathBuf {
    match std::env::current_exe() {
        Ok(path) => match path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => current_dir_or_dot(),
        },
        Err(_) => current_dir_or_dot(),
    }
}

fn current_dir_or_dot() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn config_path() -> PathBuf {
    app_root_dir().join("config.yaml")
}
