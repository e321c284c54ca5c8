//! 外部の検出器・学習器とのインターフェース
//!
//! モデルの中身 (重みの読み込みや推論、学習ループ) はこのクレートの外にあり、
//! ここでは `Detector` と `Trainer` を通してのみ利用します。

use std::path::PathBuf;

use anyhow::{Context, Result};
use image::DynamicImage;
use log::info;

use crate::config::TrainConfig;
use crate::detection_result::Detection;

/// 画像から物体を検出するもの
pub trait Detector {
    /// # Args
    /// * `img` - 入力画像
    /// * `img_size` - 推論時の入力サイズ
    ///
    /// # Return
    /// * 元画像の座標系での検出結果
    fn predict(&mut self, img: &DynamicImage, img_size: u32) -> Result<Vec<Detection>>;
}

/// 学習1回分のパラメータ
#[derive(Debug, Clone, PartialEq)]
pub struct TrainParams {
    /// 事前学習済みモデルのパス
    pub model_path: PathBuf,
    /// データセット設定ファイルのパス
    pub dataset_config: PathBuf,
    pub epochs: u32,
    pub img_size: u32,
    /// 学習に使うデバイス ("cpu", "cuda", "mps" など)
    pub device: String,
    /// 学習対象のクラスID
    pub classes: Vec<u32>,
}

/// モデルを学習するもの
pub trait Trainer {
    /// 学習済みモデルのハンドル
    type Model;

    fn train(&mut self, params: &TrainParams) -> Result<Self::Model>;
}

/// 人物検出モデルとPPE検出モデルを順に学習します。
///
/// # Args
/// * `trainer` - 学習器
/// * `cfg` - 学習の設定
///
/// # Return
/// * (人物検出モデル, PPE検出モデル)
pub fn train_person_and_ppe<T: Trainer>(
    trainer: &mut T,
    cfg: &TrainConfig,
) -> Result<(T::Model, T::Model)> {
    let person = TrainParams {
        model_path: cfg.person_model_path.clone(),
        dataset_config: cfg.person_dataset.clone(),
        epochs: cfg.epochs,
        img_size: cfg.person_img_size,
        device: cfg.device.clone(),
        classes: cfg.person_classes.clone(),
    };
    let ppe = TrainParams {
        model_path: cfg.ppe_model_path.clone(),
        dataset_config: cfg.ppe_dataset.clone(),
        epochs: cfg.epochs,
        img_size: cfg.ppe_img_size,
        device: cfg.device.clone(),
        classes: cfg.ppe_classes.clone(),
    };

    info!("Training person detection model...");
    let person_model = trainer
        .train(&person)
        .context("person detection training failed")?;

    info!("Training PPE detection model...");
    let ppe_model = trainer.train(&ppe).context("PPE detection training failed")?;

    info!("Training completed for both models.");
    Ok((person_model, ppe_model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[derive(Default)]
    struct RecordingTrainer {
        calls: Vec<TrainParams>,
        fail_on: Option<usize>,
    }

    impl Trainer for RecordingTrainer {
        type Model = String;

        fn train(&mut self, params: &TrainParams) -> Result<String> {
            if self.fail_on == Some(self.calls.len()) {
                bail!("out of memory");
            }
            self.calls.push(params.clone());
            Ok(format!("model-{}", params.img_size))
        }
    }

    #[test]
    fn trains_person_then_ppe() {
        let cfg = TrainConfig::default();
        let mut trainer = RecordingTrainer::default();
        let (person, ppe) = train_person_and_ppe(&mut trainer, &cfg).unwrap();

        assert_eq!(person, "model-512");
        assert_eq!(ppe, "model-320");
        assert_eq!(trainer.calls.len(), 2);
        assert_eq!(trainer.calls[0].classes, vec![0]);
        assert_eq!(trainer.calls[1].classes, (1..=9).collect::<Vec<u32>>());
        assert!(trainer.calls.iter().all(|p| p.epochs == 5 && p.device == "mps"));
    }

    #[test]
    fn person_failure_stops_before_ppe() {
        let cfg = TrainConfig::default();
        let mut trainer = RecordingTrainer {
            fail_on: Some(0),
            ..Default::default()
        };
        let err = train_person_and_ppe(&mut trainer, &cfg).unwrap_err();
        assert!(err.to_string().contains("person"));
        assert!(trainer.calls.is_empty());
    }
}
