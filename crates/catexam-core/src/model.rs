//! Core data model types for catexam.
//!
//! Items are immutable once a bank is built. The question payload is a tagged
//! union keyed by item type; the engine itself only reads the common
//! psychometric fields.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content domains of the exam blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    SceneSafety,
    PrimaryAssessment,
    SecondaryAssessment,
    TreatmentTransport,
    Operations,
}

impl Domain {
    /// All domains in default priority order.
    pub const ALL: [Domain; 5] = [
        Domain::SceneSafety,
        Domain::PrimaryAssessment,
        Domain::SecondaryAssessment,
        Domain::TreatmentTransport,
        Domain::Operations,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Domain::SceneSafety => "Scene Safety",
            Domain::PrimaryAssessment => "Primary Assessment",
            Domain::SecondaryAssessment => "Secondary Assessment",
            Domain::TreatmentTransport => "Treatment & Transport",
            Domain::Operations => "Operations",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Domain::SceneSafety => "scene_safety",
            Domain::PrimaryAssessment => "primary_assessment",
            Domain::SecondaryAssessment => "secondary_assessment",
            Domain::TreatmentTransport => "treatment_transport",
            Domain::Operations => "operations",
        };
        f.write_str(s)
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "scene_safety" => Ok(Domain::SceneSafety),
            "primary_assessment" => Ok(Domain::PrimaryAssessment),
            "secondary_assessment" => Ok(Domain::SecondaryAssessment),
            "treatment_transport" | "treatment_&_transport" => Ok(Domain::TreatmentTransport),
            "operations" => Ok(Domain::Operations),
            other => Err(format!("unknown domain: {other}")),
        }
    }
}

/// Question formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    SingleSelect,
    MultiSelect,
    OrderedList,
    Categorization,
    RegionPlacement,
}

impl ItemType {
    /// Discrimination used when an item does not set one explicitly.
    pub fn default_discrimination(&self) -> f64 {
        match self {
            ItemType::SingleSelect => 1.0,
            ItemType::MultiSelect => 1.2,
            ItemType::OrderedList => 1.3,
            ItemType::Categorization => 1.4,
            ItemType::RegionPlacement => 1.3,
        }
    }

    /// Typical time an examinee needs for one item of this type.
    pub fn expected_seconds(&self) -> u32 {
        match self {
            ItemType::SingleSelect => 60,
            ItemType::MultiSelect => 90,
            ItemType::OrderedList => 120,
            ItemType::Categorization => 120,
            ItemType::RegionPlacement => 90,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemType::SingleSelect => "single_select",
            ItemType::MultiSelect => "multi_select",
            ItemType::OrderedList => "ordered_list",
            ItemType::Categorization => "categorization",
            ItemType::RegionPlacement => "region_placement",
        };
        f.write_str(s)
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "single_select" | "single" => Ok(ItemType::SingleSelect),
            "multi_select" | "multiple" => Ok(ItemType::MultiSelect),
            "ordered_list" | "ordering" => Ok(ItemType::OrderedList),
            "categorization" => Ok(ItemType::Categorization),
            "region_placement" | "hotspot" => Ok(ItemType::RegionPlacement),
            other => Err(format!("unknown item type: {other}")),
        }
    }
}

/// Question payload together with its answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    SingleSelect {
        options: Vec<String>,
        /// Index into `options`.
        correct: usize,
    },
    MultiSelect {
        options: Vec<String>,
        correct: BTreeSet<usize>,
    },
    /// Steps listed in their correct order; the UI shuffles them.
    OrderedList { steps: Vec<String> },
    Categorization {
        categories: Vec<String>,
        /// Entry -> category.
        assignments: BTreeMap<String, String>,
    },
    RegionPlacement {
        regions: Vec<String>,
        /// Label -> region.
        placements: BTreeMap<String, String>,
    },
}

impl ItemKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemKind::SingleSelect { .. } => ItemType::SingleSelect,
            ItemKind::MultiSelect { .. } => ItemType::MultiSelect,
            ItemKind::OrderedList { .. } => ItemType::OrderedList,
            ItemKind::Categorization { .. } => ItemType::Categorization,
            ItemKind::RegionPlacement { .. } => ItemType::RegionPlacement,
        }
    }

    /// Checks that the answer key is consistent with the payload.
    pub fn check_key(&self) -> Result<(), String> {
        match self {
            ItemKind::SingleSelect { options, correct } => {
                if options.len() < 2 {
                    return Err("single-select needs at least two options".into());
                }
                if *correct >= options.len() {
                    return Err(format!(
                        "correct option {correct} out of range for {} options",
                        options.len()
                    ));
                }
            }
            ItemKind::MultiSelect { options, correct } => {
                if correct.is_empty() {
                    return Err("multi-select needs at least one correct option".into());
                }
                if let Some(bad) = correct.iter().find(|&&i| i >= options.len()) {
                    return Err(format!(
                        "correct option {bad} out of range for {} options",
                        options.len()
                    ));
                }
            }
            ItemKind::OrderedList { steps } => {
                if steps.len() < 2 {
                    return Err("ordered list needs at least two steps".into());
                }
                let unique: BTreeSet<&String> = steps.iter().collect();
                if unique.len() != steps.len() {
                    return Err("ordered list contains duplicate steps".into());
                }
            }
            ItemKind::Categorization {
                categories,
                assignments,
            } => check_mapping(categories, assignments, "category")?,
            ItemKind::RegionPlacement {
                regions,
                placements,
            } => check_mapping(regions, placements, "region")?,
        }
        Ok(())
    }
}

fn check_mapping(
    targets: &[String],
    mapping: &BTreeMap<String, String>,
    what: &str,
) -> Result<(), String> {
    if mapping.is_empty() {
        return Err(format!("no {what} assignments defined"));
    }
    for (entry, target) in mapping {
        if !targets.contains(target) {
            return Err(format!("'{entry}' is assigned to unknown {what} '{target}'"));
        }
    }
    Ok(())
}

/// A single test question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier, stable across a session.
    pub id: String,
    /// Blueprint domain.
    pub domain: Domain,
    /// Question text shown to the examinee.
    #[serde(default)]
    pub stem: String,
    /// Difficulty (b), conventionally in [-3, 3].
    pub difficulty: f64,
    /// Explicit discrimination (a); falls back to the item type default.
    #[serde(default)]
    pub discrimination: Option<f64>,
    /// Explicit pseudo-guessing (c); falls back to the item type default.
    #[serde(default)]
    pub guessing: Option<f64>,
    /// Pilot items are administered but never scored.
    #[serde(default)]
    pub is_pilot: bool,
    /// Payload and answer key.
    pub kind: ItemKind,
}

impl Item {
    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    /// Effective discrimination (a).
    pub fn discrimination(&self) -> f64 {
        self.discrimination
            .unwrap_or_else(|| self.item_type().default_discrimination())
    }

    /// Effective pseudo-guessing (c). Single-select items default to the
    /// chance of picking the keyed option blind.
    pub fn guessing(&self) -> f64 {
        if let Some(c) = self.guessing {
            return c;
        }
        match &self.kind {
            ItemKind::SingleSelect { options, .. } if !options.is_empty() => {
                1.0 / options.len() as f64
            }
            _ => 0.0,
        }
    }

    /// The keyed answer in submission form.
    pub fn correct_answer(&self) -> Answer {
        match &self.kind {
            ItemKind::SingleSelect { correct, .. } => Answer::Single(*correct),
            ItemKind::MultiSelect { correct, .. } => Answer::Multiple(correct.clone()),
            ItemKind::OrderedList { steps } => Answer::Ordered(steps.clone()),
            ItemKind::Categorization { assignments, .. } => {
                Answer::Categorized(assignments.clone())
            }
            ItemKind::RegionPlacement { placements, .. } => Answer::Placed(placements.clone()),
        }
    }

    /// Validates item parameters and the answer key.
    pub(crate) fn check(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id is empty".into());
        }
        if !self.difficulty.is_finite() {
            return Err("difficulty must be finite".into());
        }
        let a = self.discrimination();
        if !(a.is_finite() && a > 0.0) {
            return Err(format!("discrimination must be positive, got {a}"));
        }
        let c = self.guessing();
        if !(0.0..1.0).contains(&c) {
            return Err(format!("guessing must be in [0, 1), got {c}"));
        }
        self.kind.check_key()
    }
}

/// A raw answer as submitted by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Single(usize),
    Multiple(BTreeSet<usize>),
    Ordered(Vec<String>),
    Categorized(BTreeMap<String, String>),
    Placed(BTreeMap<String, String>),
    /// No answer given before moving on.
    Omitted,
}

/// The graded record of one administered item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub item_id: String,
    pub is_correct: bool,
    pub time_spent_seconds: f64,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn single(id: &str, domain: Domain, difficulty: f64) -> Item {
        Item {
            id: id.into(),
            domain,
            stem: String::new(),
            difficulty,
            discrimination: None,
            guessing: None,
            is_pilot: false,
            kind: ItemKind::SingleSelect {
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct: 0,
            },
        }
    }

    pub fn pilot(id: &str, domain: Domain, difficulty: f64) -> Item {
        Item {
            is_pilot: true,
            ..single(id, domain, difficulty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::single;
    use super::*;

    #[test]
    fn domain_display_and_parse() {
        assert_eq!(Domain::TreatmentTransport.to_string(), "treatment_transport");
        assert_eq!(
            "Scene Safety".parse::<Domain>().unwrap(),
            Domain::SceneSafety
        );
        assert_eq!(
            "primary-assessment".parse::<Domain>().unwrap(),
            Domain::PrimaryAssessment
        );
        assert!("pharmacology".parse::<Domain>().is_err());
        assert_eq!(Domain::TreatmentTransport.label(), "Treatment & Transport");
    }

    #[test]
    fn item_type_parse() {
        assert_eq!(
            "ordering".parse::<ItemType>().unwrap(),
            ItemType::OrderedList
        );
        assert_eq!(
            "multi-select".parse::<ItemType>().unwrap(),
            ItemType::MultiSelect
        );
        assert!("essay".parse::<ItemType>().is_err());
    }

    #[test]
    fn parameter_defaults_follow_item_type() {
        let item = single("q1", Domain::Operations, 0.0);
        assert_eq!(item.discrimination(), 1.0);
        assert!((item.guessing() - 0.25).abs() < f64::EPSILON);

        let cat = Item {
            kind: ItemKind::Categorization {
                categories: vec!["red".into(), "green".into()],
                assignments: BTreeMap::from([("walking".into(), "green".into())]),
            },
            ..single("q2", Domain::Operations, 0.0)
        };
        assert_eq!(cat.discrimination(), 1.4);
        assert_eq!(cat.guessing(), 0.0);
    }

    #[test]
    fn explicit_parameters_override_defaults() {
        let item = Item {
            discrimination: Some(2.0),
            guessing: Some(0.1),
            ..single("q1", Domain::Operations, 0.0)
        };
        assert_eq!(item.discrimination(), 2.0);
        assert_eq!(item.guessing(), 0.1);
    }

    #[test]
    fn check_rejects_bad_parameters() {
        let item = Item {
            discrimination: Some(0.0),
            ..single("q1", Domain::Operations, 0.0)
        };
        assert!(item.check().is_err());

        let item = Item {
            guessing: Some(1.0),
            ..single("q1", Domain::Operations, 0.0)
        };
        assert!(item.check().is_err());

        let item = Item {
            difficulty: f64::NAN,
            ..single("q1", Domain::Operations, 0.0)
        };
        assert!(item.check().is_err());
    }

    #[test]
    fn check_rejects_inconsistent_keys() {
        let kind = ItemKind::SingleSelect {
            options: vec!["A".into(), "B".into()],
            correct: 2,
        };
        assert!(kind.check_key().is_err());

        let kind = ItemKind::MultiSelect {
            options: vec!["A".into(), "B".into()],
            correct: BTreeSet::new(),
        };
        assert!(kind.check_key().is_err());

        let kind = ItemKind::OrderedList {
            steps: vec!["open airway".into(), "open airway".into()],
        };
        assert!(kind.check_key().is_err());

        let kind = ItemKind::RegionPlacement {
            regions: vec!["chest".into()],
            placements: BTreeMap::from([("pad".into(), "abdomen".into())]),
        };
        assert!(kind.check_key().is_err());
    }

    #[test]
    fn correct_answer_matches_kind() {
        let item = single("q1", Domain::Operations, 0.0);
        assert_eq!(item.correct_answer(), Answer::Single(0));
        assert_eq!(item.item_type(), ItemType::SingleSelect);
    }

    #[test]
    fn item_kind_serde_is_tagged() {
        let item = single("q1", Domain::SceneSafety, 0.5);
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"type\":\"single_select\""));
        let back: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }
}
