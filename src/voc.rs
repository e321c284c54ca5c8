//! PascalVOC形式のXMLアノテーションをYOLO形式に変換するモジュール

use std::fs;
use std::path::Path;

use anyhow::Result;
use log::{error, info, warn};
use roxmltree::{Document, Node};

use crate::annotation;
use crate::bbox::NormalizedBox;
use crate::error::Error;
use crate::report::BatchReport;
use crate::utils;

/// VOCの1物体
#[derive(Debug, Clone, PartialEq)]
pub struct VocObject {
    /// クラス名
    pub name: String,
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

/// VOCの1画像分のアノテーション
#[derive(Debug, Clone, PartialEq)]
pub struct VocAnnotation {
    pub width: u32,
    pub height: u32,
    pub objects: Vec<VocObject>,
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, Error> {
    child(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .ok_or_else(|| Error::InvalidVoc(format!("missing <{}>", name)))
}

fn child_number(node: Node, name: &str) -> Result<f64, Error> {
    let text = child_text(node, name)?;
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidVoc(format!("<{}> is not a number: '{}'", name, text)))
}

impl VocAnnotation {
    /// XML文書を解析します。
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let doc = Document::parse(xml).map_err(|e| Error::InvalidVoc(e.to_string()))?;
        let root = doc.root_element();

        let size = child(root, "size").ok_or_else(|| Error::InvalidVoc("missing <size>".into()))?;
        let width = child_number(size, "width")?;
        let height = child_number(size, "height")?;
        if width < 0. || height < 0. {
            return Err(Error::InvalidVoc(format!("negative image size {}x{}", width, height)));
        }

        let mut objects = Vec::new();
        for obj in root.descendants().filter(|n| n.has_tag_name("object")) {
            let name = child_text(obj, "name")?.to_string();
            let bndbox =
                child(obj, "bndbox").ok_or_else(|| Error::InvalidVoc("missing <bndbox>".into()))?;
            objects.push(VocObject {
                name,
                xmin: child_number(bndbox, "xmin")?,
                xmax: child_number(bndbox, "xmax")?,
                ymin: child_number(bndbox, "ymin")?,
                ymax: child_number(bndbox, "ymax")?,
            });
        }

        Ok(Self {
            width: width as u32,
            height: height as u32,
            objects,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingSourceFile(path.to_path_buf()));
        }
        Self::parse(&fs::read_to_string(path)?)
    }

    /// 正規化ボックスに変換します。
    ///
    /// # Args
    /// * `classes` - クラス名の一覧 (並びがクラスIDになります)
    ///
    /// # Return
    /// * 変換できたボックスと、クラス名が一覧に無いため除外した物体のエラー
    pub fn to_normalized(&self, classes: &[String]) -> Result<(Vec<NormalizedBox>, Vec<Error>), Error> {
        let mut boxes = Vec::with_capacity(self.objects.len());
        let mut skipped = Vec::new();
        for obj in &self.objects {
            let Some(class_id) = classes.iter().position(|c| *c == obj.name) else {
                skipped.push(Error::UnknownClass(obj.name.clone()));
                continue;
            };
            boxes.push(NormalizedBox::from_pascal_voc(
                class_id as u32,
                obj.xmin,
                obj.xmax,
                obj.ymin,
                obj.ymax,
                self.width,
                self.height,
            )?);
        }
        Ok((boxes, skipped))
    }
}

/// 1つのXMLファイルを変換して `<output_dir>/<stem>.txt` に書き出します。
pub fn convert_file(xml_path: &Path, output_dir: &Path, classes: &[String]) -> BatchReport {
    let mut report = BatchReport::default();

    let converted = VocAnnotation::from_file(xml_path).and_then(|voc| voc.to_normalized(classes));
    let (boxes, skipped) = match converted {
        Ok(c) => c,
        Err(e) => {
            error!("{}: {}", xml_path.display(), e);
            report.push_failure(xml_path, e);
            return report;
        }
    };
    report.files_processed = 1;
    for e in skipped {
        warn!("{}: {}", xml_path.display(), e);
        report.push_failure(xml_path, e);
    }

    let out = output_dir.join(format!("{}.txt", utils::file_stem(xml_path)));
    let lines: Vec<String> = boxes.iter().map(|b| b.to_line()).collect();
    match annotation::write_lines(&out, &lines) {
        Ok(()) => report.outputs_written += 1,
        Err(e) => {
            error!("failed to write {}: {}", out.display(), e);
            report.push_failure(&out, e);
        }
    }
    report
}

/// ディレクトリ内の全XMLファイル (`*.xml`) を変換します。
///
/// # Return
/// * 全体のレポート。入力ディレクトリが無い・出力ディレクトリを作れない・
///   クラス名の一覧が空の場合はエラー
pub fn convert_dir<P: AsRef<Path>, Q: AsRef<Path>>(
    input_dir: P,
    output_dir: Q,
    classes: &[String],
) -> Result<BatchReport> {
    anyhow::ensure!(!classes.is_empty(), "class list must not be empty");
    let output_dir = output_dir.as_ref();
    let files = utils::list_files_with_extension(input_dir, "xml")?;
    utils::ensure_output_dir(output_dir)?;

    let mut report = BatchReport::default();
    for path in &files {
        report.merge(convert_file(path, output_dir, classes));
    }
    info!("voc: {}", report);
    Ok(report)
}
