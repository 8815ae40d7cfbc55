use std::path::Path;

use colored::Colorize;

use crate::error::Result;
use crate::output::Format;
use crate::pin::PinStore;
use crate::store::lock::WriterLock;

pub fn set(data_dir: &Path, pin: &str, format: Format) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let _lock = WriterLock::acquire(data_dir)?;
    PinStore::new(data_dir).set_pin(pin)?;
    match format {
        Format::Json => println!("{}", serde_json::json!({ "pin_set": true })),
        Format::Pretty => println!("{}", "PIN set.".green()),
        Format::Minimal => println!("ok"),
    }
    Ok(())
}

/// Prints whether the PIN matches. Returns `Ok(false)` on a mismatch so the
/// caller can pick the exit status.
pub fn verify(data_dir: &Path, pin: &str, format: Format) -> Result<bool> {
    let valid = PinStore::new(data_dir).verify_pin(pin)?;
    match format {
        Format::Json => println!("{}", serde_json::json!({ "valid": valid })),
        Format::Pretty => {
            if valid {
                println!("{}", "PIN accepted.".green());
            } else {
                println!("{}", "Wrong PIN.".red());
            }
        }
        Format::Minimal => println!("{valid}"),
    }
    Ok(valid)
}

pub fn clear(data_dir: &Path, format: Format) -> Result<()> {
    if data_dir.exists() {
        let _lock = WriterLock::acquire(data_dir)?;
        PinStore::new(data_dir).clear_pin()?;
    }
    match format {
        Format::Json => println!("{}", serde_json::json!({ "pin_set": false })),
        Format::Pretty => println!("{}", "PIN cleared.".yellow()),
        Format::Minimal => println!("ok"),
    }
    Ok(())
}

pub fn status(data_dir: &Path, format: Format) -> Result<()> {
    let set = PinStore::new(data_dir).is_pin_set()?;
    match format {
        Format::Json => println!("{}", serde_json::json!({ "pin_set": set })),
        Format::Pretty => println!("PIN {}", if set { "set".green() } else { "not set".dimmed() }),
        Format::Minimal => println!("{set}"),
    }
    Ok(())
}
