//! アノテーションのコンテナ (人物) 領域を画像から切り出して保存するモジュール

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{error, info, warn};
use rayon::prelude::*;

use crate::annotation;
use crate::classify::{ClassRoles, Role};
use crate::error::Error;
use crate::img_proc;
use crate::report::BatchReport;
use crate::utils;

/// アノテーションに対応する画像のパス `<image_dir>/<stem>.jpg`
pub fn image_path_for(annotation_path: &Path, image_dir: &Path) -> PathBuf {
    image_dir.join(format!("{}.jpg", utils::file_stem(annotation_path)))
}

/// 1つのアノテーションファイルに含まれるコンテナを切り出します。
///
/// 座標の変換には実際の画像サイズを使います。
/// 出力ファイル名は `<stem>_<n>.jpg` で、`n` はファイル内のコンテナの通し番号です。
///
/// # Args
/// * `annotation_path` - アノテーションファイル
/// * `image_dir` - 画像ディレクトリ
/// * `output_dir` - 出力先ディレクトリ (作成済みであること)
/// * `roles` - クラスIDと役割の対応
///
/// # Return
/// * このファイル分のレポート
pub fn crop_file(
    annotation_path: &Path,
    image_dir: &Path,
    output_dir: &Path,
    roles: &ClassRoles,
) -> BatchReport {
    let mut report = BatchReport::default();

    let image_path = image_path_for(annotation_path, image_dir);
    if !image_path.exists() {
        warn!("No corresponding image found for {}", annotation_path.display());
        report.push_failure(annotation_path, Error::MissingSourceFile(image_path));
        return report;
    }

    let img = match img_proc::read_image(&image_path) {
        Ok(img) => img,
        Err(e) => {
            error!("{}", e);
            report.push_failure(&image_path, e);
            return report;
        }
    };

    let parsed = match annotation::read_annotation_file(annotation_path) {
        Ok(p) => p,
        Err(e) => {
            report.push_failure(annotation_path, e);
            return report;
        }
    };
    report.files_processed = 1;
    for e in parsed.errors {
        report.push_failure(annotation_path, e);
    }

    let (w, h) = (img.width() as f64, img.height() as f64);
    let stem = utils::file_stem(annotation_path);
    let containers = parsed
        .boxes
        .iter()
        .filter(|b| roles.role_of(b.class_id) == Role::Container);

    for (index, b) in containers.enumerate() {
        let Some(cropped) = img_proc::crop(&img, &b.to_absolute(w, h)) else {
            warn!("{}: container {} is outside the image", annotation_path.display(), index);
            report.push_failure(annotation_path, Error::EmptyCrop { index });
            continue;
        };

        let out = output_dir.join(format!("{}_{}.jpg", stem, index));
        match img_proc::write_image(&out, &cropped) {
            Ok(()) => {
                info!("Cropped image saved as {}", out.display());
                report.outputs_written += 1;
            }
            Err(e) => {
                error!("{}", e);
                report.push_failure(&out, e);
            }
        }
    }
    report
}

/// アノテーションディレクトリ内の全ファイルについて切り出しを行います。
///
/// # Return
/// * 全体のレポート。入力ディレクトリが無い・出力ディレクトリを作れない場合はエラー
pub fn crop_dir<P, Q, R>(
    image_dir: P,
    annotation_dir: Q,
    output_dir: R,
    roles: &ClassRoles,
) -> Result<BatchReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let (image_dir, output_dir) = (image_dir.as_ref(), output_dir.as_ref());
    let files = utils::list_files_with_extension(annotation_dir, "txt")?;
    utils::ensure_output_dir(output_dir)?;

    let reports: Vec<BatchReport> = files
        .par_iter()
        .map(|path| crop_file(path, image_dir, output_dir, roles))
        .collect();

    let mut report = BatchReport::default();
    for r in reports {
        report.merge(r);
    }
    info!("crop: {}", report);
    Ok(report)
}
