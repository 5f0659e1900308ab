//! Device-local persistence: personal best and exported files.
//!
//! ## File format
//!   `best.dat` holds key-value lines; only `best_score=<n>` is used.
//!   A missing or corrupt file reads as a best of 0.
//!
//! The save directory is the executable's directory when writable,
//! otherwise `~/.local/share/flappy-base`, otherwise the CWD.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const BEST_FILE: &str = "best.dat";

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

fn save_dir() -> PathBuf {
    // 1. Exe directory (local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs like /usr/games/ won't be writable
            let test_path = parent.join(".write_test_flappy_base");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/flappy-base");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Store
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    /// Store rooted at the platform save directory.
    pub fn locate() -> Self {
        Self::at(save_dir())
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        SaveStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn best_path(&self) -> PathBuf {
        self.dir.join(BEST_FILE)
    }

    /// Best score ever achieved on this device (0 if none recorded).
    pub fn load_best(&self) -> u32 {
        std::fs::read_to_string(self.best_path())
            .ok()
            .and_then(|content| parse_best(&content))
            .unwrap_or(0)
    }

    pub fn store_best(&self, score: u32) -> Result<()> {
        let path = self.best_path();
        std::fs::write(&path, serialize_best(score))
            .with_context(|| format!("writing {}", path.display()))
    }

    /// Write an arbitrary export (e.g. the rewards CSV) next to the save data.
    pub fn write_export(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        std::fs::write(&path, content)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn serialize_best(score: u32) -> String {
    format!("best_score={}\n", score)
}

fn parse_best(content: &str) -> Option<u32> {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("best_score="))
        .and_then(|val| val.trim().parse().ok())
}
