//! コンテナ (人など) ごとに重なっている物体を集め、
//! コンテナの座標系で表したアノテーションを組み立てるモジュール

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{error, info};
use rayon::prelude::*;

use crate::annotation::{self, format_line};
use crate::bbox::{NormalizedBox, RelativeBox};
use crate::classify::{classify, ClassRoles};
use crate::error::Error;
use crate::overlap::overlaps;
use crate::report::BatchReport;
use crate::utils;

/// 包含判定に使う固定のキャンバスサイズ
pub const DEFAULT_NOMINAL_SCALE: f64 = 640.;

/// 1つのコンテナに属するアノテーションの集まり
#[derive(Debug, Clone, PartialEq)]
pub struct ContainmentGroup {
    /// 入力中のコンテナの通し番号
    pub index: usize,
    /// コンテナ自身 (変更なし)
    pub container: NormalizedBox,
    /// コンテナと重なる物体 (クラスID, コンテナ座標系での位置)
    pub members: Vec<(u32, RelativeBox)>,
}

impl ContainmentGroup {
    /// 出力用の行を作ります。先頭はコンテナ自身です。
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.members.len() + 1);
        lines.push(self.container.to_line());
        for (class_id, r) in &self.members {
            lines.push(format_line(*class_id, [r.x, r.y, r.w, r.h]));
        }
        lines
    }
}

/// `assemble` の結果
#[derive(Debug, Default)]
pub struct Assembly {
    pub groups: Vec<ContainmentGroup>,
    /// 処理できなかったコンテナ (通し番号, 理由)
    pub failures: Vec<(usize, Error)>,
}

/// 1枚の画像のアノテーションからコンテナごとのグループを組み立てます。
///
/// # Args
/// * `annotations` - 1枚の画像に対するボックスの列
/// * `roles` - クラスIDと役割の対応
/// * `nominal_scale` - 画素座標へ変換する際のキャンバスサイズ (縦横共通)
///
/// # Return
/// * グループの列と、大きさが0のためスキップしたコンテナ
pub fn assemble(annotations: &[NormalizedBox], roles: &ClassRoles, nominal_scale: f64) -> Assembly {
    let partition = classify(annotations, roles);
    let containees: Vec<_> = partition
        .containees
        .iter()
        .map(|b| (b.class_id, b.to_absolute(nominal_scale, nominal_scale)))
        .collect();

    let mut assembly = Assembly::default();
    for (index, container) in partition.containers.into_iter().enumerate() {
        let container_abs = container.to_absolute(nominal_scale, nominal_scale);

        // 重なる物体がなくても大きさ0のコンテナは不正
        let members = container_abs.ensure_non_degenerate().and_then(|()| {
            containees
                .iter()
                .filter(|(_, abs)| overlaps(&container_abs, abs))
                .map(|(class_id, abs)| {
                    abs.to_reference_frame(&container_abs)
                        .map(|r| (*class_id, r))
                })
                .collect::<Result<Vec<_>, Error>>()
        });

        match members {
            Ok(members) => assembly.groups.push(ContainmentGroup {
                index,
                container,
                members,
            }),
            Err(e) => assembly.failures.push((index, e)),
        }
    }
    assembly
}

/// 出力ファイル名 `<stem>_<index>.txt`
pub fn output_path(output_dir: &Path, stem: &str, index: usize) -> PathBuf {
    output_dir.join(format!("{}_{}.txt", stem, index))
}

/// 1つのアノテーションファイルを処理し、コンテナごとのファイルを書き出します。
///
/// # Args
/// * `path` - アノテーションファイル
/// * `output_dir` - 出力先ディレクトリ (作成済みであること)
/// * `roles` - クラスIDと役割の対応
/// * `nominal_scale` - キャンバスサイズ
///
/// # Return
/// * このファイル分のレポート
pub fn process_file(
    path: &Path,
    output_dir: &Path,
    roles: &ClassRoles,
    nominal_scale: f64,
) -> BatchReport {
    let mut report = BatchReport::default();

    let parsed = match annotation::read_annotation_file(path) {
        Ok(p) => p,
        Err(e) => {
            error!("{}: {}", path.display(), e);
            report.push_failure(path, e);
            return report;
        }
    };
    report.files_processed = 1;
    for e in parsed.errors {
        report.push_failure(path, e);
    }

    let assembly = assemble(&parsed.boxes, roles, nominal_scale);
    for (index, e) in assembly.failures {
        error!("{}: skipping container {}: {}", path.display(), index, e);
        report.push_failure(path, e);
    }

    let stem = utils::file_stem(path);
    for group in &assembly.groups {
        let out = output_path(output_dir, &stem, group.index);
        match annotation::write_lines(&out, &group.to_lines()) {
            Ok(()) => report.outputs_written += 1,
            Err(e) => {
                error!("failed to write {}: {}", out.display(), e);
                report.push_failure(&out, e);
            }
        }
    }
    report
}

/// ディレクトリ内の全アノテーションファイル (`*.txt`) を処理します。
///
/// ファイルごとに独立しているので並列に処理し、レポートはパス順に結合します。
///
/// # Return
/// * 全体のレポート。入力ディレクトリが無い・出力ディレクトリを作れない場合はエラー
pub fn process_dir<P: AsRef<Path>, Q: AsRef<Path>>(
    annotation_dir: P,
    output_dir: Q,
    roles: &ClassRoles,
    nominal_scale: f64,
) -> Result<BatchReport> {
    let output_dir = output_dir.as_ref();
    let files = utils::list_files_with_extension(annotation_dir, "txt")?;
    utils::ensure_output_dir(output_dir)?;

    let reports: Vec<BatchReport> = files
        .par_iter()
        .map(|path| process_file(path, output_dir, roles, nominal_scale))
        .collect();

    let mut report = BatchReport::default();
    for r in reports {
        report.merge(r);
    }
    info!("containment: {}", report);
    Ok(report)
}
