use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use walkdir::WalkDir;

/// ディレクトリ直下から指定した拡張子のファイルを集めます。
///
/// # Args
/// * `dir` - 探索するディレクトリ (サブディレクトリは見ません)
/// * `ext` - 拡張子 (`"txt"` など、大文字小文字は区別しません)
///
/// # Return
/// * パス順に並べたファイルの一覧
pub fn list_files_with_extension<P: AsRef<Path>>(dir: P, ext: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    ensure!(dir.is_dir(), "not a directory: {}", dir.display());

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matched = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if matched {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// 出力先ディレクトリを作成します。作成できない場合は処理を始められないためエラーにします。
pub fn ensure_output_dir<P: AsRef<Path>>(dir: P) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))
}

/// ファイル名の拡張子を除いた部分
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
