use anyhow::{Context, Result};
use std::env::args;

use ppe_annotation_tools::class_count;
use ppe_annotation_tools::config::ToolConfig;

fn main() -> Result<()> {
    env_logger::init();

    let annotation_dir = args().nth(1).context("missing annotation directory")?;
    let cfg = ToolConfig::default();

    let (counts, report) = class_count::count_dir(&annotation_dir)?;
    println!("{}", counts);
    print!("{}", counts.table(&cfg.class_names));
    if !report.is_clean() {
        println!("{}", report);
    }

    Ok(())
}
