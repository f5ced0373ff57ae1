//! The `catexam simulate` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use catexam_core::clock::ManualClock;
use catexam_core::config::load_config_from;
use catexam_core::model::Answer;
use catexam_core::parser;
use catexam_core::report::ExamReport;
use catexam_core::selector::probability_correct;
use catexam_core::CatSession;

/// Mixed into the seed so the examinee and the selector draw from different
/// streams.
const EXAMINEE_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

pub fn execute(
    bank_path: PathBuf,
    ability: f64,
    seed: Option<u64>,
    config_path: Option<PathBuf>,
    output: PathBuf,
    format: String,
) -> Result<()> {
    anyhow::ensure!(ability.is_finite(), "ability must be a finite number");

    let config = load_config_from(config_path.as_deref())?;
    let file = parser::parse_item_bank(&bank_path)?;
    let seed = seed.unwrap_or_else(rand::random);

    tracing::info!(
        bank = %file.id,
        items = file.bank.len(),
        ability,
        seed,
        "starting simulated exam"
    );

    let clock = Arc::new(ManualClock::default());
    let mut session = CatSession::new(Arc::new(file.bank), config)?
        .with_seed(seed)
        .with_clock(clock.clone());
    let mut examinee = ChaCha8Rng::seed_from_u64(seed ^ EXAMINEE_STREAM);

    while let Some(item) = session.next_item() {
        let time_spent =
            f64::from(item.item_type().expected_seconds()) * examinee.gen_range(0.5..1.5);
        clock.advance_secs(time_spent);

        let answer = if examinee.gen_bool(probability_correct(&item, ability)) {
            item.correct_answer()
        } else {
            Answer::Omitted
        };
        session.submit_response(&item, &answer, time_spent)?;
    }

    let report = session.report();

    let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
    let report_path = output.join(format!("report-{timestamp}-{}.json", report.id));
    report.save_json(&report_path)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            print_summary(&report);
            println!("Seed: {seed}");
        }
    }
    eprintln!("Report saved to {}", report_path.display());

    Ok(())
}

pub fn print_summary(report: &ExamReport) {
    use comfy_table::{Cell, Table};

    println!("Verdict: {} ({})", report.verdict, report.status.label());
    if let Some(t) = report.status.termination() {
        println!("Ended because: {}", t.reason);
    }
    let (low, high) = report.stats.confidence_interval;
    println!(
        "Ability: {:.3} (SE {:.3}, 95% CI [{:.3}, {:.3}], score {:.1}%)",
        report.stats.ability,
        report.stats.standard_error,
        low,
        high,
        report.stats.score * 100.0
    );
    println!(
        "Items: {} total, {} scored, {} pilot in {:.0}s",
        report.stats.total_items,
        report.stats.scored_items,
        report.stats.pilot_items,
        report.stats.elapsed_seconds
    );

    if report.domain_breakdown.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Domain", "Correct", "Total", "%"]);
    for (domain, score) in &report.domain_breakdown {
        table.add_row(vec![
            Cell::new(domain.label()),
            Cell::new(score.correct),
            Cell::new(score.total),
            Cell::new(format!("{:.1}%", score.percentage)),
        ]);
    }
    println!("\n{table}");
}
