//! エラーハンドリングシステム
//!
//! bi 全体で使用される統一されたエラー型とユーティリティを定義
//! 回復可能なエラーはステータス表示のみ、未分類の障害は緊急保存の対象

use crate::buffer::Address;
use std::path::Path;
use thiserror::Error;

/// アプリケーション全体のエラー型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BiError {
    /// 範囲が不正
    #[error("Invalid range.")]
    InvalidRange { start: Address, end: Address },

    /// 未設定のマーク参照
    #[error("Unknown mark '{0}'.")]
    UnknownMark(char),

    /// 式・構文エラー
    #[error("{0}")]
    InvalidExpression(String),

    /// 正規表現のコンパイル失敗
    #[error("Bad pattern: {0}")]
    BadPattern(String),

    /// ファイル操作エラー
    #[error(transparent)]
    File(#[from] FileError),

    /// 解釈できないコマンド
    #[error("Unrecognized command.")]
    UnrecognizedCommand(String),

    /// バッファの拡張が上限を超えた
    #[error("Memory overflow.")]
    MemoryOverflow,

    /// 未保存の変更があるため終了を拒否
    #[error("No write since last change. To overriding quit, use 'q!'.")]
    UnsavedChanges,

    /// 未分類の障害（致命的）
    #[error("Internal fault: {0}")]
    Fault(String),
}

/// バッファエンジン固有のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("Invalid range: {start}..{end}")]
    InvalidRange { start: Address, end: Address },

    #[error("Buffer would grow to {requested} bytes")]
    Overflow { requested: u64 },
}

/// ファイル操作固有のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("File name not specified.")]
    MissingName,

    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },
}

impl FileError {
    /// `std::io::Error` をパス付きで変換
    pub fn from_io(error: std::io::Error, path: &Path) -> Self {
        let path = path.display().to_string();
        match error.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => FileError::PermissionDenied { path },
            _ => FileError::Io {
                path,
                message: error.to_string(),
            },
        }
    }
}

impl From<BufferError> for BiError {
    fn from(error: BufferError) -> Self {
        match error {
            BufferError::InvalidRange { start, end } => BiError::InvalidRange { start, end },
            BufferError::Overflow { requested } => {
                log::warn!("buffer growth to {} bytes refused", requested);
                BiError::MemoryOverflow
            }
        }
    }
}

/// エラー分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRange,
    UnknownMark,
    InvalidExpression,
    BadPattern,
    FileIo,
    UnrecognizedCommand,
    MemoryOverflow,
    UnsavedChanges,
    Fault,
}

impl BiError {
    /// エラー分類を取得
    pub fn kind(&self) -> ErrorKind {
        match self {
            BiError::InvalidRange { .. } => ErrorKind::InvalidRange,
            BiError::UnknownMark(_) => ErrorKind::UnknownMark,
            BiError::InvalidExpression(_) => ErrorKind::InvalidExpression,
            BiError::BadPattern(_) => ErrorKind::BadPattern,
            BiError::File(_) => ErrorKind::FileIo,
            BiError::UnrecognizedCommand(_) => ErrorKind::UnrecognizedCommand,
            BiError::MemoryOverflow => ErrorKind::MemoryOverflow,
            BiError::UnsavedChanges => ErrorKind::UnsavedChanges,
            BiError::Fault(_) => ErrorKind::Fault,
        }
    }

    /// コマンド単位で回復可能か
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BiError::Fault(_))
    }

    pub fn invalid_syntax() -> Self {
        BiError::InvalidExpression("Invalid syntax.".to_string())
    }

    pub fn invalid_parameter() -> Self {
        BiError::InvalidExpression("Invalid parameter.".to_string())
    }

    /// アドレス演算のオーバーフロー
    pub fn address_overflow() -> Self {
        BiError::Fault("address arithmetic overflow".to_string())
    }
}

/// エラーレベル分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    Info,
    Warning,
    Error,
    Fatal,
}

/// ステータス行に表示するメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub level: ErrorLevel,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: ErrorLevel::Info,
        }
    }

    /// エラーから表示用メッセージを作成
    pub fn from_error(error: &BiError) -> Self {
        let level = match error.kind() {
            ErrorKind::Fault => ErrorLevel::Fatal,
            ErrorKind::UnsavedChanges => ErrorLevel::Warning,
            _ => ErrorLevel::Error,
        };
        Self {
            text: error.to_string(),
            level,
        }
    }
}

/// パニックハンドラの設定
///
/// 端末を raw モードから戻してから位置とメッセージを表示する
pub fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        let _ = crossterm::terminal::disable_raw_mode();

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s
        } else {
            "Unknown panic payload"
        };

        match panic_info.location() {
            Some(location) => {
                eprintln!("PANIC at {}:{}: {}", location.file(), location.line(), message)
            }
            None => eprintln!("PANIC: {}", message),
        }
        eprintln!("Stack trace: {}", std::backtrace::Backtrace::capture());
    }));
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, BiError>;

pub mod buffer {
    pub type Result<T> = std::result::Result<T, super::BufferError>;
}
