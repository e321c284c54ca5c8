//! ディレクトリ内の画像に対して物体検出を行い、結果を描画した画像を保存するモジュール

use std::path::{Path, PathBuf};

use anyhow::Result;
use image::DynamicImage;
use log::{error, info};
use rusttype::Font;

use crate::error::Error;
use crate::img_proc;
use crate::model::Detector;
use crate::report::BatchReport;
use crate::utils;

/// 検出結果の描画設定
pub struct DrawOptions<'f> {
    /// ラベルのフォント。None の場合はボックスのみ描画します
    pub font: Option<&'f Font<'f>>,
    pub font_size: f32,
    pub line_thickness: f32,
}

impl Default for DrawOptions<'_> {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 20.,
            line_thickness: 2.,
        }
    }
}

/// 出力ファイル名 `<stem>_detected.jpg`
pub fn detected_path(image_path: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}_detected.jpg", utils::file_stem(image_path)))
}

/// 1枚の画像を処理します。
///
/// # Args
/// * `detector` - 検出器
/// * `image_path` - 入力画像
/// * `output_dir` - 出力先ディレクトリ (作成済みであること)
/// * `img_size` - 推論時の入力サイズ
/// * `opts` - 描画設定
///
/// # Return
/// * 保存した画像のパス
pub fn process_image<D: Detector>(
    detector: &mut D,
    image_path: &Path,
    output_dir: &Path,
    img_size: u32,
    opts: &DrawOptions,
) -> Result<PathBuf, Error> {
    info!("Processing image: {}", utils::file_stem(image_path));
    let img = img_proc::read_image(image_path)?;

    let detections = detector
        .predict(&img, img_size)
        .map_err(|e| Error::DetectionFailure {
            path: image_path.to_path_buf(),
            reason: format!("{:#}", e),
        })?;

    let mut canvas = img.to_rgb8();
    img_proc::draw_detections(
        &mut canvas,
        &detections,
        opts.font,
        opts.font_size,
        opts.line_thickness,
    );

    let out = detected_path(image_path, output_dir);
    img_proc::write_image(&out, &DynamicImage::ImageRgb8(canvas))?;
    info!("Detection results saved to {}", out.display());
    Ok(out)
}

/// ディレクトリ内の全画像 (`*.jpg`) を処理します。
///
/// 検出器は1つなので画像は順に処理します。
///
/// # Return
/// * 全体のレポート。入力ディレクトリが無い・出力ディレクトリを作れない場合はエラー
pub fn run_dir<D: Detector, P: AsRef<Path>, Q: AsRef<Path>>(
    detector: &mut D,
    image_dir: P,
    output_dir: Q,
    img_size: u32,
    opts: &DrawOptions,
) -> Result<BatchReport> {
    let output_dir = output_dir.as_ref();
    let files = utils::list_files_with_extension(image_dir, "jpg")?;
    utils::ensure_output_dir(output_dir)?;

    let mut report = BatchReport::default();
    for path in &files {
        report.files_processed += 1;
        match process_image(detector, path, output_dir, img_size, opts) {
            Ok(_) => report.outputs_written += 1,
            Err(e) => {
                error!("{}", e);
                report.push_failure(path, e);
            }
        }
    }
    info!("inference: {}", report);
    Ok(report)
}
