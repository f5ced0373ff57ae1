//! Exam report types with JSON persistence.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::CatConfig;
use crate::model::{Domain, ItemType};
use crate::session::CatSession;
use crate::statistics::{DomainScore, ExamStats};
use crate::stopping::{ExamStatus, Verdict};

/// A snapshot of one exam attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamReport {
    /// Attempt identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    pub status: ExamStatus,
    pub verdict: Verdict,
    /// Configuration the attempt ran under.
    pub config: CatConfig,
    pub stats: ExamStats,
    pub domain_breakdown: BTreeMap<Domain, DomainScore>,
    /// Administration log in order.
    pub responses: Vec<ResponseRecord>,
}

/// One administered item and its graded response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub item_id: String,
    pub domain: Domain,
    pub item_type: ItemType,
    pub difficulty: f64,
    pub is_pilot: bool,
    pub is_correct: bool,
    pub time_spent_seconds: f64,
    pub submitted_at: DateTime<Utc>,
}

impl ExamReport {
    pub fn from_session(session: &CatSession) -> Self {
        let responses = session
            .administered()
            .iter()
            .zip(session.responses())
            .map(|(item, response)| ResponseRecord {
                item_id: item.id.clone(),
                domain: item.domain,
                item_type: item.item_type(),
                difficulty: item.difficulty,
                is_pilot: item.is_pilot,
                is_correct: response.is_correct,
                time_spent_seconds: response.time_spent_seconds,
                submitted_at: response.submitted_at,
            })
            .collect();

        Self {
            id: session.id(),
            created_at: Utc::now(),
            started_at: session.started_at(),
            ended_at: session.ended_at(),
            status: session.status(),
            verdict: session.verdict(),
            config: session.config().clone(),
            stats: session.stats(),
            domain_breakdown: session.domain_breakdown(),
            responses,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ExamReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Render a markdown summary.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "## Exam {}\n", self.id);
        let _ = writeln!(md, "**Verdict:** {} ({})", self.verdict, self.status.label());
        if let Some(t) = self.status.termination() {
            let _ = writeln!(md, "**Ended because:** {}", t.reason);
        }
        let _ = writeln!(
            md,
            "**Ability:** {:.3} (SE {:.3}, score {:.1}%)\n",
            self.stats.ability,
            self.stats.standard_error,
            self.stats.score * 100.0
        );
        let _ = writeln!(
            md,
            "Items: {} total, {} scored, {} pilot. Elapsed {:.0}s, {:.1}s per item.\n",
            self.stats.total_items,
            self.stats.scored_items,
            self.stats.pilot_items,
            self.stats.elapsed_seconds,
            self.stats.average_time_per_item
        );

        if !self.domain_breakdown.is_empty() {
            md.push_str("| Domain | Correct | Total | % |\n|---|---|---|---|\n");
            for (domain, score) in &self.domain_breakdown {
                let _ = writeln!(
                    md,
                    "| {} | {} | {} | {:.1}% |",
                    domain.label(),
                    score.correct,
                    score.total,
                    score.percentage
                );
            }
        }
        md
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bank::ItemBank;
    use crate::model::fixtures::{pilot, single};

    fn finished_session() -> CatSession {
        let bank = ItemBank::new(vec![
            single("a", Domain::SceneSafety, 0.0),
            single("b", Domain::Operations, 1.0),
            pilot("c", Domain::Operations, 0.0),
        ])
        .unwrap();
        let config = CatConfig {
            min_scored_items: 10,
            max_total_items: 20,
            ..Default::default()
        };
        let mut session = CatSession::new(Arc::new(bank), config)
            .unwrap()
            .with_seed(3);
        while let Some(item) = session.next_item() {
            session
                .submit_response(&item, &item.correct_answer(), 12.0)
                .unwrap();
        }
        session
    }

    #[test]
    fn report_captures_session() {
        let session = finished_session();
        let report = session.report();
        assert_eq!(report.id, session.id());
        assert_eq!(report.responses.len(), 3);
        assert_eq!(report.verdict, Verdict::Pass);
        assert!(report.ended_at.is_some());
        assert_eq!(report.stats.pilot_items, 1);
        assert_eq!(report.domain_breakdown.len(), 2);
    }

    #[test]
    fn json_roundtrip_through_file() {
        let report = finished_session().report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        report.save_json(&path).unwrap();

        let loaded = ExamReport::load_json(&path).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.status, report.status);
        assert_eq!(loaded.domain_breakdown, report.domain_breakdown);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ExamReport::load_json(&dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn markdown_lists_domains() {
        let md = finished_session().report().to_markdown();
        assert!(md.contains("**Verdict:** PASS"));
        assert!(md.contains("Scene Safety"));
        assert!(md.contains("item bank exhausted"));
    }
}
