use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, TodoError};

pub const PIN_FILE: &str = "pin.json";
pub const PIN_LENGTH: usize = 4;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PinRecord {
    #[serde(default)]
    pin_hash: String,
}

/// App-lock PIN, stored only as a hash under the data directory.
pub struct PinStore {
    path: PathBuf,
}

impl PinStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(PIN_FILE),
        }
    }

    pub fn is_pin_set(&self) -> Result<bool> {
        Ok(!self.load()?.pin_hash.trim().is_empty())
    }

    pub fn set_pin(&self, pin: &str) -> Result<()> {
        if !is_well_formed(pin) {
            return Err(TodoError::InvalidPin);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let record = PinRecord {
            pin_hash: hash_pin(pin),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&record)?)?;
        debug!(path = %self.path.display(), "pin stored");
        Ok(())
    }

    /// False for input of the wrong length or when no PIN is stored.
    pub fn verify_pin(&self, pin: &str) -> Result<bool> {
        if pin.chars().count() != PIN_LENGTH {
            return Ok(false);
        }
        let record = self.load()?;
        let stored = record.pin_hash.trim();
        if stored.is_empty() {
            return Ok(false);
        }
        Ok(hash_pin(pin) == stored)
    }

    pub fn clear_pin(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn load(&self) -> Result<PinRecord> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(PinRecord::default()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(PinRecord::default()),
            Err(err) => Err(err.into()),
        }
    }
}

fn is_well_formed(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.chars().all(|c| c.is_ascii_digit())
}

fn hash_pin(pin: &str) -> String {
    STANDARD.encode(Sha256::digest(pin.as_bytes()))
}
