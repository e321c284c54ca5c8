//! アノテーション中のクラスごとの出現数を数えるモジュール

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::Result;
use log::{error, info};
use rayon::prelude::*;

use crate::annotation;
use crate::report::BatchReport;
use crate::utils;

/// クラスIDごとの出現数 (クラスID順)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassCounts(pub BTreeMap<u32, usize>);

impl ClassCounts {
    pub fn add(&mut self, class_id: u32) {
        *self.0.entry(class_id).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &ClassCounts) {
        for (&class_id, &n) in &other.0 {
            *self.0.entry(class_id).or_insert(0) += n;
        }
    }

    pub fn get(&self, class_id: u32) -> usize {
        self.0.get(&class_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// クラス名を添えた表を作ります。名前の無いIDはIDのみ表示します。
    pub fn table(&self, class_names: &[String]) -> String {
        let mut out = String::new();
        for (&class_id, &n) in &self.0 {
            match class_names.get(class_id as usize) {
                Some(name) => out.push_str(&format!("{:>3} {:<16} {}\n", class_id, name, n)),
                None => out.push_str(&format!("{:>3} {:<16} {}\n", class_id, "", n)),
            }
        }
        out
    }
}

impl fmt::Display for ClassCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self.0.iter().map(|(c, n)| format!("{}: {}", c, n)).collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}

/// 1ファイル分を数えます。
pub fn count_file(path: &Path) -> (ClassCounts, BatchReport) {
    let mut counts = ClassCounts::default();
    let mut report = BatchReport::default();

    match annotation::read_annotation_file(path) {
        Ok(parsed) => {
            report.files_processed = 1;
            for b in &parsed.boxes {
                counts.add(b.class_id);
            }
            for e in parsed.errors {
                report.push_failure(path, e);
            }
        }
        Err(e) => {
            error!("{}: {}", path.display(), e);
            report.push_failure(path, e);
        }
    }
    (counts, report)
}

/// ディレクトリ内の全アノテーションファイル (`*.txt`) のクラスを数えます。
///
/// # Return
/// * (クラスごとの出現数, レポート)。入力ディレクトリが無い場合はエラー
pub fn count_dir<P: AsRef<Path>>(annotation_dir: P) -> Result<(ClassCounts, BatchReport)> {
    let files = utils::list_files_with_extension(annotation_dir, "txt")?;

    let per_file: Vec<(ClassCounts, BatchReport)> =
        files.par_iter().map(|path| count_file(path)).collect();

    let mut counts = ClassCounts::default();
    let mut report = BatchReport::default();
    for (c, r) in per_file {
        counts.merge(&c);
        report.merge(r);
    }
    info!("class count: {} object(s), {}", counts.total(), report);
    Ok((counts, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn counts_across_files_and_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "0 0.5 0.5 0.1 0.1\n1 0.5 0.5 0.1 0.1\n\n").unwrap();
        fs::write(dir.path().join("b.txt"), "1 0.5 0.5 0.1 0.1\nbad line\n9 0.1 0.1 0.1 0.1\n").unwrap();
        fs::write(dir.path().join("c.jpg"), "not an annotation").unwrap();

        let (counts, report) = count_dir(dir.path()).unwrap();
        assert_eq!(counts.get(0), 1);
        assert_eq!(counts.get(1), 2);
        assert_eq!(counts.get(9), 1);
        assert_eq!(counts.get(5), 0);
        assert_eq!(counts.total(), 4);
        assert_eq!(report.files_processed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(counts.to_string(), "{0: 1, 1: 2, 9: 1}");
    }

    #[test]
    fn table_uses_class_names() {
        let mut counts = ClassCounts::default();
        counts.add(1);
        counts.add(12);
        let names = vec!["person".to_string(), "hard-hat".to_string()];
        let table = counts.table(&names);
        assert!(table.contains("hard-hat"));
        assert_eq!(table.lines().count(), 2);
    }
}
