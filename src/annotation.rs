//! YOLO形式のアノテーション行を読み書きするモジュール
//!
//! 1行は `<class_id> <cx> <cy> <w> <h>` の空白区切りです。

use std::fs;
use std::path::Path;

use log::warn;

use crate::bbox::NormalizedBox;
use crate::error::Error;

/// 1ファイル分の読み込み結果
#[derive(Debug, Default)]
pub struct ParsedAnnotations {
    /// 読み込めたボックス (ファイル内の順序)
    pub boxes: Vec<NormalizedBox>,
    /// 読み飛ばした行のエラー
    pub errors: Vec<Error>,
}

/// 1行を解析します。
///
/// # Args
/// * `line` - アノテーション行
/// * `line_num` - 行番号 (1始まり、エラー報告用)
///
/// # Return
/// * 空行の場合は `Ok(None)`
/// * フィールド数や数値が不正な場合は `Error::MalformedAnnotationLine`
pub fn parse_line(line: &str, line_num: usize) -> Result<Option<NormalizedBox>, Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let malformed = |reason: String| Error::MalformedAnnotationLine {
        line: line_num,
        reason,
    };

    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();
    if tokens.len() != 5 {
        return Err(malformed(format!("expected 5 fields, found {}", tokens.len())));
    }

    let class_id = tokens[0]
        .parse::<u32>()
        .map_err(|_| malformed(format!("invalid class id '{}'", tokens[0])))?;

    let mut values = [0f64; 4];
    for (v, token) in values.iter_mut().zip(&tokens[1..]) {
        *v = token
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| malformed(format!("invalid coordinate '{}'", token)))?;
    }
    let [cx, cy, w, h] = values;

    Ok(Some(NormalizedBox::new(class_id, cx, cy, w, h)))
}

/// テキスト全体を解析します。不正な行は読み飛ばしてエラーとして記録します。
pub fn parse_annotations(text: &str) -> ParsedAnnotations {
    let mut parsed = ParsedAnnotations::default();
    for (idx, line) in text.lines().enumerate() {
        match parse_line(line, idx + 1) {
            Ok(Some(b)) => parsed.boxes.push(b),
            Ok(None) => {}
            Err(e) => parsed.errors.push(e),
        }
    }
    parsed
}

/// アノテーションファイルを読み込みます。
///
/// # Args
/// * `path` - アノテーションファイルのパス
///
/// # Return
/// * 読み込み結果。ファイル自体が読めない場合はエラー
pub fn read_annotation_file<P: AsRef<Path>>(path: P) -> Result<ParsedAnnotations, Error> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingSourceFile(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    let parsed = parse_annotations(&text);
    for e in &parsed.errors {
        warn!("{}: {}", path.display(), e);
    }
    Ok(parsed)
}

/// 値を小数点以下6桁で1行に整形します (改行なし)。
pub fn format_line(class_id: u32, values: [f64; 4]) -> String {
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        class_id, values[0], values[1], values[2], values[3]
    )
}

impl NormalizedBox {
    pub fn to_line(&self) -> String {
        format_line(self.class_id, [self.cx, self.cy, self.w, self.h])
    }
}

/// 行の列をファイルに書き出します。各行の末尾に改行を付けます。
pub fn write_lines<P: AsRef<Path>>(path: P, lines: &[String]) -> Result<(), Error> {
    let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}
