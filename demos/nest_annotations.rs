use anyhow::{Context, Result};
use std::env::args;
use std::time::Instant;

use ppe_annotation_tools::config::ToolConfig;
use ppe_annotation_tools::containment;

fn main() -> Result<()> {
    env_logger::init();

    // 引数: <アノテーションディレクトリ> <出力ディレクトリ> [設定ファイル]
    let annotation_dir = args().nth(1).context("missing annotation directory")?;
    let output_dir = args().nth(2).context("missing output directory")?;
    let cfg = match args().nth(3) {
        Some(path) => ToolConfig::from_file(path)?,
        None => ToolConfig::default(),
    };

    let start = Instant::now();
    let report = containment::process_dir(&annotation_dir, &output_dir, &cfg.roles, cfg.nominal_scale)?;

    let t = start.elapsed().as_secs_f64() * 1000.0;
    println!("{}", report);
    println!("Processing time:{:.03}ms", t);

    Ok(())
}
