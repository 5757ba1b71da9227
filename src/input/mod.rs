//! 入力処理モジュール
//!
//! コマンド行の解析と、画面編集モードのキー解釈を提供

pub mod commands;
pub mod keys;

// 公開API
pub use commands::{strip_comment, Command, CommandParser, RangeOp, SearchPattern, YankSource};
pub use keys::{Action, Key, KeyCode, KeyDecoder, Motion};
