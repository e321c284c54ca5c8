use anyhow::{Context, Result};
use std::env::args;

use ppe_annotation_tools::config::ToolConfig;
use ppe_annotation_tools::voc;

fn main() -> Result<()> {
    env_logger::init();

    // 引数: <XMLディレクトリ> <出力ディレクトリ> [設定ファイル]
    let input_dir = args().nth(1).context("missing input directory")?;
    let output_dir = args().nth(2).context("missing output directory")?;
    let cfg = match args().nth(3) {
        Some(path) => ToolConfig::from_file(path)?,
        None => ToolConfig::default(),
    };

    let report = voc::convert_dir(&input_dir, &output_dir, &cfg.class_names)?;
    println!("{}", report);

    Ok(())
}
