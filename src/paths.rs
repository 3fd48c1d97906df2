//! Application path management
//!
//! Resolves where the configuration file lives. In order:
//!
//! 1. An explicit `--config` path
//! 2. `config.yaml` in the current working directory (dev mode)
//! 3. `config.yaml` next to the executable when a `.portable` marker exists
//! 4. The platform config directory (`%APPDATA%\league-pad` on Windows,
//!    `~/.config/league-pad` on Linux)

use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for directories in installed mode
const APP_NAME: &str = "league-pad";

const CONFIG_FILE: &str = "config.yaml";

/// How the config path was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMode {
    Explicit,
    WorkingDir,
    Portable,
    Installed,
}

/// Application paths
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the configuration file (may not exist)
    pub config: PathBuf,
    pub mode: PathMode,
}

impl AppPaths {
    /// Detect paths from the environment
    pub fn detect(explicit: Option<&Path>) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::resolve(explicit, &cwd, &exe_dir, dirs::config_dir())
    }

    /// Pure resolution step behind [`AppPaths::detect`]
    fn resolve(
        explicit: Option<&Path>,
        cwd: &Path,
        exe_dir: &Path,
        config_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = explicit {
            return Self {
                config: path.to_path_buf(),
                mode: PathMode::Explicit,
            };
        }

        let cwd_config = cwd.join(CONFIG_FILE);
        if cwd_config.exists() {
            debug!("Using config from working directory: {}", cwd_config.display());
            return Self {
                config: cwd_config,
                mode: PathMode::WorkingDir,
            };
        }

        // Explicit opt-in; avoids writing next to an exe in a read-only location
        if exe_dir.join(".portable").exists() {
            return Self {
                config: exe_dir.join(CONFIG_FILE),
                mode: PathMode::Portable,
            };
        }

        let base = config_dir.unwrap_or_else(|| exe_dir.to_path_buf());
        Self {
            config: base.join(APP_NAME).join(CONFIG_FILE),
            mode: PathMode::Installed,
        }
    }

    /// Directory holding the config file
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
