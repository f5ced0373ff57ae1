//! The `catexam inspect` command.

use std::path::PathBuf;

use anyhow::Result;

use catexam_core::report::ExamReport;

pub fn execute(report_path: PathBuf, format: String) -> Result<()> {
    let report = ExamReport::load_json(&report_path)?;

    match format.as_str() {
        "markdown" | "md" => println!("{}", report.to_markdown()),
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => super::simulate::print_summary(&report),
    }

    Ok(())
}
