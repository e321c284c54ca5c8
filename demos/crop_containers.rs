use anyhow::{Context, Result};
use std::env::args;

use ppe_annotation_tools::config::ToolConfig;
use ppe_annotation_tools::crop;

fn main() -> Result<()> {
    env_logger::init();

    // 引数: <画像ディレクトリ> <アノテーションディレクトリ> <出力ディレクトリ>
    let image_dir = args().nth(1).context("missing image directory")?;
    let annotation_dir = args().nth(2).context("missing annotation directory")?;
    let output_dir = args().nth(3).context("missing output directory")?;
    let cfg = ToolConfig::default();

    let report = crop::crop_dir(&image_dir, &annotation_dir, &output_dir, &cfg.roles)?;
    println!("{}", report);

    Ok(())
}
