//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Database file name under the root folder
pub const DATABASE_FILE: &str = "ptms.db";

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root_folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Resolve the database file path under a root folder, creating the folder
/// if it does not exist yet.
pub fn database_path(root_folder: &PathBuf) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder)?;
    Ok(root_folder.join(DATABASE_FILE))
}

/// Locate the configuration file for the platform
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/ptms/config.toml first, then /etc/ptms/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("ptms").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/ptms/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("ptms").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("ptms"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/ptms"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("ptms"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/ptms"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("ptms"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\ptms"))
    } else {
        PathBuf::from("./ptms_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_arg_wins_over_everything() {
        let path = resolve_root_folder(Some("/tmp/ptms-test"), "PTMS_TEST_UNSET_VAR");
        assert_eq!(path, PathBuf::from("/tmp/ptms-test"));
    }

    #[test]
    fn env_var_used_when_no_cli_arg() {
        std::env::set_var("PTMS_TEST_ROOT_VAR", "/tmp/ptms-env");
        let path = resolve_root_folder(None, "PTMS_TEST_ROOT_VAR");
        std::env::remove_var("PTMS_TEST_ROOT_VAR");
        assert_eq!(path, PathBuf::from("/tmp/ptms-env"));
    }

    #[test]
    fn database_path_creates_root_folder() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("root");
        let db = database_path(&root).unwrap();
        assert!(root.exists());
        assert_eq!(db.file_name().unwrap(), DATABASE_FILE);
    }
}
