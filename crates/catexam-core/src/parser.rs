//! TOML item bank parser.
//!
//! Loads item banks from TOML files and directories, and checks them against
//! an exam configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::bank::ItemBank;
use crate::config::CatConfig;
use crate::model::{Domain, Item, ItemKind, ItemType};

/// An item bank loaded from disk, with its header.
#[derive(Debug, Clone)]
pub struct BankFile {
    pub id: String,
    pub name: String,
    pub description: String,
    pub bank: ItemBank,
}

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    items: Vec<TomlItem>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    id: String,
    domain: String,
    #[serde(rename = "type")]
    item_type: String,
    difficulty: f64,
    #[serde(default)]
    stem: String,
    #[serde(default)]
    discrimination: Option<f64>,
    #[serde(default)]
    guessing: Option<f64>,
    #[serde(default)]
    pilot: bool,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    correct: Option<usize>,
    #[serde(default)]
    correct_set: Vec<usize>,
    #[serde(default)]
    steps: Vec<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    assignments: BTreeMap<String, String>,
    #[serde(default)]
    regions: Vec<String>,
    #[serde(default)]
    placements: BTreeMap<String, String>,
}

impl TomlItem {
    fn into_item(self) -> Result<Item> {
        let domain: Domain = self
            .domain
            .parse()
            .map_err(|e: String| anyhow::anyhow!("item '{}': {}", self.id, e))?;
        let item_type: ItemType = self
            .item_type
            .parse()
            .map_err(|e: String| anyhow::anyhow!("item '{}': {}", self.id, e))?;

        let kind = match item_type {
            ItemType::SingleSelect => ItemKind::SingleSelect {
                options: self.options,
                correct: self
                    .correct
                    .with_context(|| format!("item '{}': single_select needs `correct`", self.id))?,
            },
            ItemType::MultiSelect => ItemKind::MultiSelect {
                options: self.options,
                correct: self.correct_set.into_iter().collect::<BTreeSet<_>>(),
            },
            ItemType::OrderedList => ItemKind::OrderedList { steps: self.steps },
            ItemType::Categorization => ItemKind::Categorization {
                categories: self.categories,
                assignments: self.assignments,
            },
            ItemType::RegionPlacement => ItemKind::RegionPlacement {
                regions: self.regions,
                placements: self.placements,
            },
        };

        Ok(Item {
            id: self.id,
            domain,
            stem: self.stem,
            difficulty: self.difficulty,
            discrimination: self.discrimination,
            guessing: self.guessing,
            is_pilot: self.pilot,
            kind,
        })
    }
}

/// Parse a single TOML file into a [`BankFile`].
pub fn parse_item_bank(path: &Path) -> Result<BankFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read item bank file: {}", path.display()))?;

    parse_item_bank_str(&content, path)
}

/// Parse a TOML string into a [`BankFile`] (useful for testing).
pub fn parse_item_bank_str(content: &str, source_path: &Path) -> Result<BankFile> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let items = parsed
        .items
        .into_iter()
        .map(TomlItem::into_item)
        .collect::<Result<Vec<_>>>()?;

    let bank = ItemBank::new(items)
        .with_context(|| format!("invalid item bank: {}", source_path.display()))?;

    Ok(BankFile {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        bank,
    })
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<BankFile>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_item_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a bank for problems that would not stop a session from running but
/// would distort the exam.
pub fn validate_item_bank(file: &BankFile, config: &CatConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let bank = &file.bank;
    let bank_warning = |message: String| ValidationWarning {
        item_id: None,
        message,
    };

    let scored = bank.scored_count();
    if scored == 0 {
        warnings.push(bank_warning("bank has no scored items".into()));
    } else if scored < config.min_scored_items {
        warnings.push(bank_warning(format!(
            "only {scored} scored items, fewer than min_scored_items ({})",
            config.min_scored_items
        )));
    }

    if bank.len() < config.max_total_items {
        warnings.push(bank_warning(format!(
            "bank holds {} items, fewer than max_total_items ({}); exams may end by exhaustion",
            bank.len(),
            config.max_total_items
        )));
    }

    let counts = bank.count_by_domain();
    for domain in &config.domain_priority_order {
        if !counts.contains_key(domain) {
            warnings.push(bank_warning(format!(
                "no items for domain '{}'",
                domain.label()
            )));
        }
    }

    let pilots = bank.len() - scored;
    if !bank.is_empty() && pilots * 5 > bank.len() {
        warnings.push(bank_warning(format!(
            "{pilots} of {} items are pilot items (more than 20%)",
            bank.len()
        )));
    }

    for item in bank.iter() {
        if !(-3.0..=3.0).contains(&item.difficulty) {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("difficulty {} outside [-3, 3]", item.difficulty),
            });
        }
        if item.stem.trim().is_empty() {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: "stem is empty".into(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[bank]
id = "sample"
name = "Sample Bank"

[[items]]
id = "ss-1"
domain = "scene_safety"
type = "single_select"
difficulty = -0.5
stem = "First action on arrival?"
options = ["Size up the scene", "Start CPR", "Call for help", "Apply oxygen"]
correct = 0

[[items]]
id = "pa-1"
domain = "Primary Assessment"
type = "multi_select"
difficulty = 0.5
stem = "Signs of inadequate breathing?"
options = ["Cyanosis", "Pink skin", "Accessory muscle use"]
correct_set = [0, 2]

[[items]]
id = "tt-1"
domain = "treatment_transport"
type = "ordered_list"
difficulty = 1.0
stem = "Order the steps."
steps = ["Open airway", "Check breathing", "Check pulse"]
discrimination = 1.6

[[items]]
id = "op-1"
domain = "operations"
type = "categorization"
difficulty = 0.0
stem = "Triage these patients."
categories = ["red", "green"]
assignments = { "not breathing after repositioning" = "red", "walking wounded" = "green" }
pilot = true

[[items]]
id = "sa-1"
domain = "secondary_assessment"
type = "region_placement"
difficulty = 2.0
stem = "Place the AED pads."
regions = ["upper_right_chest", "lower_left_ribs"]
placements = { "pad_1" = "upper_right_chest", "pad_2" = "lower_left_ribs" }
"#;

    #[test]
    fn parse_all_item_types() {
        let file = parse_item_bank_str(SAMPLE, Path::new("sample.toml")).unwrap();
        assert_eq!(file.id, "sample");
        assert_eq!(file.bank.len(), 5);

        let pa = file.bank.get("pa-1").unwrap();
        assert_eq!(pa.domain, Domain::PrimaryAssessment);
        assert_eq!(pa.item_type(), ItemType::MultiSelect);

        let tt = file.bank.get("tt-1").unwrap();
        assert_eq!(tt.discrimination(), 1.6);

        let op = file.bank.get("op-1").unwrap();
        assert!(op.is_pilot);
        assert_eq!(op.item_type(), ItemType::Categorization);

        assert_eq!(
            file.bank.get("sa-1").unwrap().item_type(),
            ItemType::RegionPlacement
        );
    }

    #[test]
    fn unknown_domain_is_an_error() {
        let bad = SAMPLE.replace("domain = \"operations\"", "domain = \"pharmacology\"");
        let err = parse_item_bank_str(&bad, Path::new("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown domain"));
    }

    #[test]
    fn missing_single_select_key_is_an_error() {
        let bad = SAMPLE.replace("correct = 0\n", "");
        let err = parse_item_bank_str(&bad, Path::new("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("needs `correct`"));
    }

    #[test]
    fn inconsistent_key_is_an_error() {
        let bad = SAMPLE.replace("correct_set = [0, 2]", "correct_set = [0, 7]");
        let err = parse_item_bank_str(&bad, Path::new("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("pa-1"));
    }

    #[test]
    fn validation_flags_small_banks() {
        let file = parse_item_bank_str(SAMPLE, Path::new("sample.toml")).unwrap();
        let warnings = validate_item_bank(&file, &CatConfig::default());
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("fewer than min_scored_items")));
        assert!(messages.iter().any(|m| m.contains("fewer than max_total_items")));
        // 1 pilot in 5 items is exactly 20%
        assert!(!messages.iter().any(|m| m.contains("pilot")));
    }

    #[test]
    fn validation_flags_items() {
        let odd = SAMPLE.replace("difficulty = 2.0", "difficulty = 3.5");
        let file = parse_item_bank_str(&odd, Path::new("odd.toml")).unwrap();
        let warnings = validate_item_bank(&file, &CatConfig::default());
        assert!(warnings
            .iter()
            .any(|w| w.item_id.as_deref() == Some("sa-1") && w.message.contains("outside")));
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not [valid").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let banks = load_bank_directory(dir.path()).unwrap();
        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].name, "Sample Bank");

        assert!(load_bank_directory(&dir.path().join("good.toml")).is_err());
    }
}
