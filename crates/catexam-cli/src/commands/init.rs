//! The `catexam init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("catexam.toml").exists() {
        println!("catexam.toml already exists, skipping.");
    } else {
        std::fs::write("catexam.toml", SAMPLE_CONFIG)?;
        println!("Created catexam.toml");
    }

    std::fs::create_dir_all("banks")?;
    let example_path = Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Add items to banks/example.toml");
    println!("  2. Run: catexam validate --bank banks/example.toml");
    println!("  3. Run: catexam simulate --bank banks/example.toml --ability 0.8");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# catexam configuration

min_scored_items = 60
max_total_items = 120
exam_time_limit_secs = 7200
passing_threshold = 0.70
balanced_phase_item_count = 10
domain_priority_order = [
    "scene_safety",
    "primary_assessment",
    "secondary_assessment",
    "treatment_transport",
    "operations",
]
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Item Bank"
description = "One item per domain to get started"

[[items]]
id = "ss-001"
domain = "scene_safety"
type = "single_select"
difficulty = -1.0
stem = "What is the first priority on arrival at any scene?"
options = ["Personal safety", "Patient airway", "Bystander statements", "Vehicle placement"]
correct = 0

[[items]]
id = "pa-001"
domain = "primary_assessment"
type = "multi_select"
difficulty = 0.0
stem = "Which findings indicate inadequate breathing?"
options = ["Cyanosis", "Accessory muscle use", "Speaking in full sentences", "Nasal flaring"]
correct_set = [0, 1, 3]

[[items]]
id = "sa-001"
domain = "secondary_assessment"
type = "region_placement"
difficulty = 0.5
stem = "Place the blood pressure cuff and stethoscope."
regions = ["upper_arm", "antecubital_fossa", "wrist"]
placements = { "cuff" = "upper_arm", "stethoscope" = "antecubital_fossa" }

[[items]]
id = "tt-001"
domain = "treatment_transport"
type = "ordered_list"
difficulty = 1.0
stem = "Order the steps for applying a tourniquet."
steps = [
    "Expose the wound",
    "Place the tourniquet above the wound",
    "Tighten until bleeding stops",
    "Record the time of application",
]

[[items]]
id = "op-001"
domain = "operations"
type = "categorization"
difficulty = 0.5
stem = "Assign a START triage category to each patient."
categories = ["immediate", "delayed", "minor", "deceased"]
assignments = { "walking and talking" = "minor", "respirations above 30" = "immediate", "apneic after airway opened" = "deceased", "unable to walk, obeys commands" = "delayed" }
"#;
