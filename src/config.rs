//! ツール全体の設定
//!
//! JSONファイルから読み込みます。省略した項目には既定値が入ります。

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::classify::ClassRoles;
use crate::containment::DEFAULT_NOMINAL_SCALE;

/// PPEデータセットのクラス名 (並びがクラスIDになります)
pub const DEFAULT_CLASS_NAMES: [&str; 10] = [
    "person",
    "hard-hat",
    "gloves",
    "mask",
    "glasses",
    "boots",
    "vest",
    "ppe-suit",
    "ear-protector",
    "safety-harness",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// クラスIDと役割の対応
    pub roles: ClassRoles,
    /// 包含判定に使うキャンバスサイズ
    pub nominal_scale: f64,
    /// クラス名の一覧
    pub class_names: Vec<String>,
    /// 推論時の入力サイズ
    pub detect_img_size: u32,
    pub train: TrainConfig,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            roles: ClassRoles::default(),
            nominal_scale: DEFAULT_NOMINAL_SCALE,
            class_names: DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
            detect_img_size: 512,
            train: TrainConfig::default(),
        }
    }
}

/// 2段階学習 (人物 → PPE) の設定
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub person_model_path: PathBuf,
    pub ppe_model_path: PathBuf,
    pub person_dataset: PathBuf,
    pub ppe_dataset: PathBuf,
    pub epochs: u32,
    pub person_img_size: u32,
    pub ppe_img_size: u32,
    pub device: String,
    pub person_classes: Vec<u32>,
    pub ppe_classes: Vec<u32>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            person_model_path: PathBuf::from("yolov8n.pt"),
            ppe_model_path: PathBuf::from("yolov8n.pt"),
            person_dataset: PathBuf::from("person.yaml"),
            ppe_dataset: PathBuf::from("ppe.yaml"),
            epochs: 5,
            person_img_size: 512,
            ppe_img_size: 320,
            device: "mps".to_string(),
            person_classes: vec![0],
            ppe_classes: (1..=9).collect(),
        }
    }
}

impl ToolConfig {
    /// JSONファイルから設定を読み込み、検証します。
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg = Self::from_json(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// 設定の矛盾を確認します。ここで失敗した場合は処理を開始しません。
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.class_names.is_empty(), "class_names must not be empty");

        let mut seen = HashSet::new();
        for name in &self.class_names {
            ensure!(!name.trim().is_empty(), "class_names contains an empty name");
            ensure!(seen.insert(name.as_str()), "duplicate class name: {}", name);
        }

        ensure!(
            self.nominal_scale.is_finite() && self.nominal_scale > 0.,
            "nominal_scale must be positive, got {}",
            self.nominal_scale
        );
        ensure!(
            !self.roles.ignored_classes.contains(&self.roles.container_class),
            "container class {} is also ignored",
            self.roles.container_class
        );
        ensure!(self.detect_img_size > 0, "detect_img_size must be positive");
        ensure!(self.train.epochs > 0, "train.epochs must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn empty_json_gives_defaults() {
        let cfg = ToolConfig::from_json("{}").unwrap();
        assert_eq!(cfg, ToolConfig::default());
        assert_eq!(cfg.class_names[3], "mask");
        assert_eq!(cfg.class_names[6], "vest");
    }

    #[test]
    fn partial_override() {
        let cfg = ToolConfig::from_json(
            r#"{"nominal_scale": 416, "roles": {"ignored_classes": [2]}, "train": {"epochs": 20}}"#,
        )
        .unwrap();
        assert_eq!(cfg.nominal_scale, 416.);
        assert_eq!(cfg.roles.container_class, 0);
        assert_eq!(cfg.roles.ignored_classes, BTreeSet::from([2]));
        assert_eq!(cfg.train.epochs, 20);
        assert_eq!(cfg.train.ppe_img_size, 320);
    }

    #[test]
    fn rejects_inconsistent_config() {
        for json in [
            r#"{"class_names": []}"#,
            r#"{"class_names": ["a", "a"]}"#,
            r#"{"nominal_scale": 0}"#,
            r#"{"roles": {"container_class": 3, "ignored_classes": [3]}}"#,
            r#"{"train": {"epochs": 0}}"#,
        ] {
            assert!(ToolConfig::from_json(json).is_err(), "{}", json);
        }
    }

    #[test]
    fn unreadable_file_is_an_error() {
        assert!(ToolConfig::from_file("/nonexistent/config.json").is_err());
    }
}
