//! バッチ処理の結果を集計するモジュール

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, ErrorKind};

/// 読み飛ばした単位1つ分の記録
#[derive(Debug)]
pub struct Failure {
    /// 対象ファイル
    pub path: PathBuf,
    /// 理由
    pub error: Error,
}

/// バッチ処理の結果
#[derive(Debug, Default)]
pub struct BatchReport {
    /// 処理したファイル数
    pub files_processed: usize,
    /// 書き出したファイル数
    pub outputs_written: usize,
    /// 読み飛ばした単位
    pub failures: Vec<Failure>,
}

impl BatchReport {
    pub fn push_failure<P: AsRef<Path>>(&mut self, path: P, error: Error) {
        self.failures.push(Failure {
            path: path.as_ref().to_path_buf(),
            error,
        });
    }

    /// 別のレポートを結合します。
    pub fn merge(&mut self, other: BatchReport) {
        self.files_processed += other.files_processed;
        self.outputs_written += other.outputs_written;
        self.failures.extend(other.failures);
    }

    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.failures
            .iter()
            .filter(|f| f.error.kind() == kind)
            .count()
    }

    /// 種類ごとの失敗数
    pub fn summary(&self) -> BTreeMap<ErrorKind, usize> {
        let mut counts = BTreeMap::new();
        for f in &self.failures {
            *counts.entry(f.error.kind()).or_insert(0) += 1;
        }
        counts
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) processed, {} output(s) written, {} failure(s)",
            self.files_processed,
            self.outputs_written,
            self.failures.len()
        )?;
        for (kind, n) in self.summary() {
            write!(f, "\n  {:?}: {}", kind, n)?;
        }
        Ok(())
    }
}
