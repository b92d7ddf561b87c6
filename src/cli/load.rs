use std::path::PathBuf;

use crate::error::{PennywiseError, Result};
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(path: &str) -> Result<()> {
    let resolved = PathBuf::from(shellexpand_path(path));
    let db_path = resolved.join("pennywise.db");

    if !db_path.exists() {
        return Err(PennywiseError::Settings(format!(
            "No database found at {}\nRun `pennywise init --data-dir {}` to create one.",
            db_path.display(),
            resolved.display()
        )));
    }

    let mut settings = load_settings();
    settings.data_dir = resolved.to_string_lossy().to_string();
    save_settings(&settings)?;

    println!("Switched to {}", resolved.display());
    Ok(())
}
