//! # 人物・PPE検出用 学習データ前処理ライブラリ
//!
//! このクレートは、物体検出モデルの学習データを準備するためのRustライブラリです。
//!
//! ## 主な機能
//!
//! 1. **形式変換**: PascalVOC形式のXMLをYOLO形式 (正規化座標) の行に変換します。
//! 2. **包含関係の再構成**: 人物などのコンテナと重なる物体を集め、コンテナの座標系で表した
//!    アノテーションをコンテナごとに書き出します。
//! 3. **切り出し**: アノテーションのコンテナ領域を画像から切り出して保存します。
//! 4. **集計**: クラスごとの出現数を数えます。
//! 5. **推論・学習の実行**: 外部の検出器・学習器 (`model::Detector`, `model::Trainer`) を使って
//!    ディレクトリ単位で推論し、結果を描画した画像を保存します。
//!
//! ## Example
//! ```no_run
//! use ppe_annotation_tools::config::ToolConfig;
//! use ppe_annotation_tools::containment;
//!
//! let cfg = ToolConfig::default();
//! let report = containment::process_dir("labels", "nested", &cfg.roles, cfg.nominal_scale)?;
//! println!("{}", report);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod annotation;
pub mod bbox;
pub mod class_count;
pub mod classify;
pub mod config;
pub mod containment;
pub mod crop;
pub mod detection_result;
pub mod error;
pub mod img_proc;
pub mod inference;
pub mod model;
pub mod overlap;
pub mod report;
pub mod voc;

mod utils;
