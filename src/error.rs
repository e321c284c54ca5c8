//! バッチ処理中に発生する単位ごとのエラーを定義するモジュール

use std::path::PathBuf;

use thiserror::Error;

/// 1行・1コンテナ・1ファイル単位で発生するエラー
///
/// どのエラーもバッチ全体を中断せず、`BatchReport` に記録されます。
#[derive(Debug, Error)]
pub enum Error {
    #[error("source file not found: {}", .0.display())]
    MissingSourceFile(PathBuf),

    #[error("malformed annotation at line {line}: {reason}")]
    MalformedAnnotationLine { line: usize, reason: String },

    #[error("degenerate reference box ({x1}, {y1}, {x2}, {y2})")]
    InvalidReferenceBox { x1: i32, y1: i32, x2: i32, y2: i32 },

    #[error("failed to load image {}: {reason}", .path.display())]
    ImageLoadFailure { path: PathBuf, reason: String },

    #[error("failed to write image {}: {reason}", .path.display())]
    ImageWriteFailure { path: PathBuf, reason: String },

    #[error("unknown class label: {0}")]
    UnknownClass(String),

    #[error("invalid image size {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },

    #[error("crop region is empty for container {index}")]
    EmptyCrop { index: usize },

    #[error("invalid PascalVOC document: {0}")]
    InvalidVoc(String),

    #[error("detector failed on {}: {reason}", .path.display())]
    DetectionFailure { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// エラーの種類。レポートの集計に使います。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    MissingSourceFile,
    MalformedAnnotationLine,
    InvalidReferenceBox,
    ImageLoadFailure,
    ImageWriteFailure,
    UnknownClass,
    InvalidImageSize,
    EmptyCrop,
    InvalidVoc,
    DetectionFailure,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingSourceFile(_) => ErrorKind::MissingSourceFile,
            Error::MalformedAnnotationLine { .. } => ErrorKind::MalformedAnnotationLine,
            Error::InvalidReferenceBox { .. } => ErrorKind::InvalidReferenceBox,
            Error::ImageLoadFailure { .. } => ErrorKind::ImageLoadFailure,
            Error::ImageWriteFailure { .. } => ErrorKind::ImageWriteFailure,
            Error::UnknownClass(_) => ErrorKind::UnknownClass,
            Error::InvalidImageSize { .. } => ErrorKind::InvalidImageSize,
            Error::EmptyCrop { .. } => ErrorKind::EmptyCrop,
            Error::InvalidVoc(_) => ErrorKind::InvalidVoc,
            Error::DetectionFailure { .. } => ErrorKind::DetectionFailure,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}
