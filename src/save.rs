//! Highscore persistence
//!
//! One small JSON file under the user's home directory. Read and write
//! failures are logged and swallowed; a missing or unreadable save just
//! means a highscore of zero.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SaveFile {
    highscore: i64,
}

fn save_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".renegade_save").join("save.json"))
}

fn load_from(path: &Path) -> io::Result<i64> {
    let data = fs::read_to_string(path)?;
    let file: SaveFile = serde_json::from_str(&data)?;
    Ok(file.highscore)
}

fn save_to(path: &Path, highscore: i64) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(&SaveFile { highscore })?;
    fs::write(path, data)
}

/// Best score on record, zero when no readable save exists
pub fn load_highscore() -> i64 {
    let Some(path) = save_path() else { return 0 };
    match load_from(&path) {
        Ok(score) => score,
        Err(err) => {
            if path.exists() {
                log::warn!("could not read save file {}: {err}", path.display());
            }
            0
        }
    }
}

pub fn save_highscore(highscore: i64) {
    let Some(path) = save_path() else {
        log::warn!("no home directory, highscore not saved");
        return;
    };
    if let Err(err) = save_to(&path, highscore) {
        log::warn!("could not write save file {}: {err}", path.display());
    }
}
