//! bi - scriptable byte-level binary editor
//!
//! vi 風のコマンド言語でバイナリファイルを編集する

// コアモジュール
pub mod config;
pub mod error;
pub mod logging;

// データ層
pub mod address;
pub mod buffer;
pub mod file;

// 編集層
pub mod editor;
pub mod search;

// 入力・表示層
pub mod input;
pub mod minibuffer;
pub mod ui;

// 実行
pub mod app;
pub mod script;

// 公開API
pub use buffer::{Address, MemoryBuffer};
pub use config::{CliOptions, EditorConfig};
pub use editor::{CommandOutcome, Effect, Session};
pub use error::{BiError, Result};
