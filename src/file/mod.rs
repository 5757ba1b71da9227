//! ファイル管理モジュール
//!
//! 編集対象・範囲書き出し・緊急保存のファイル入出力

pub mod io;

pub use io::{expand_path, load, load_or_new, persist, persist_range, save_recovery, Loaded};
