use std::path::Path;

use colored::Colorize;

use crate::error::Result;
use crate::output::Format;
use crate::store::lock::WriterLock;
use crate::store::repo::Repo;

pub fn run(data_dir: &Path, format: Format) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let _lock = WriterLock::acquire(data_dir)?;
    let repo = Repo::init(data_dir)?;
    let version = repo.db.schema_version()?;
    match format {
        Format::Json => println!(
            "{}",
            serde_json::json!({
                "data_dir": data_dir.display().to_string(),
                "schema_version": version,
            })
        ),
        Format::Pretty => println!(
            "Initialized {} (schema v{})",
            data_dir.display().to_string().cyan(),
            version
        ),
        Format::Minimal => println!("{}", data_dir.display()),
    }
    Ok(())
}
