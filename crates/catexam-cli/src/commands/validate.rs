//! The `catexam validate` command.

use std::path::PathBuf;

use anyhow::Result;

use catexam_core::config::load_config_from;
use catexam_core::parser;

pub fn execute(bank_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    config.validate()?;

    let banks = if bank_path.is_dir() {
        parser::load_bank_directory(&bank_path)?
    } else {
        vec![parser::parse_item_bank(&bank_path)?]
    };

    let mut total_warnings = 0;

    for file in &banks {
        println!(
            "Item bank: {} ({} items, {} scored)",
            file.name,
            file.bank.len(),
            file.bank.scored_count()
        );

        let warnings = parser::validate_item_bank(file, &config);
        for w in &warnings {
            let prefix = w
                .item_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All item banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
