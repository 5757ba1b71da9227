//! エディタモジュール
//!
//! 1つの編集セッションの状態（バッファ・マーク・ヤンク・検索・カーソル）と、
//! コマンド・キー操作の実行を提供

pub mod actions;
pub mod bit_ops;
pub mod dispatch;
pub mod yank;

pub use dispatch::{CommandOutcome, Effect};
pub use yank::YankRegister;

use crate::address::{ExprContext, MarkSet};
use crate::buffer::{Address, MemoryBuffer};
use crate::config::EditorConfig;
use crate::error::{BiError, FileError, Result};
use crate::file::io;
use crate::input::commands::{strip_comment, CommandParser};
use crate::search::SearchEngine;
use crate::ui::viewport::Viewport;
use std::path::Path;

/// 編集セッション
#[derive(Debug)]
pub struct Session {
    buffer: MemoryBuffer,
    marks: MarkSet,
    yank: YankRegister,
    search: SearchEngine,
    viewport: Viewport,
    /// 開いているファイル名（入力されたまま）
    filename: String,
    /// 読み込み時にファイルが存在しなかった
    new_file: bool,
    /// 最後に保存・読み込みしたときのバッファ世代
    saved_revision: u64,
    /// 読み込んだときのバッファ世代
    loaded_revision: u64,
    insert_mode: bool,
    /// 挿入モードで上位ニブルを入力済み
    stroke: bool,
    config: EditorConfig,
}

impl Session {
    /// 空のセッションを作成
    pub fn new(config: EditorConfig) -> Self {
        Self {
            buffer: MemoryBuffer::with_limit(config.max_buffer_len),
            marks: MarkSet::new(),
            yank: YankRegister::new(),
            search: SearchEngine::with_window(config.regex_window),
            viewport: Viewport::default(),
            filename: String::new(),
            new_file: false,
            saved_revision: 0,
            loaded_revision: 0,
            insert_mode: false,
            stroke: false,
            config,
        }
    }

    /// バイト列から作成（ファイル名なし）
    pub fn from_bytes(bytes: Vec<u8>, config: EditorConfig) -> Self {
        let mut session = Self::new(config);
        session.buffer.replace_contents(bytes);
        session.mark_loaded();
        session
    }

    /// ファイルを開く。存在しなければ空の新規ファイル
    pub fn open(filename: &str, config: EditorConfig) -> Result<Self> {
        let mut session = Self::new(config);
        session.filename = filename.to_string();
        session.reload()?;
        Ok(session)
    }

    /// 開いているファイルを読み直す
    pub fn reload(&mut self) -> Result<bool> {
        if self.filename.is_empty() {
            return Err(FileError::MissingName.into());
        }
        let loaded = io::load_or_new(&io::expand_path(&self.filename))?;
        if loaded.bytes.len() as u64 > self.buffer.limit() {
            return Err(BiError::MemoryOverflow);
        }
        self.buffer.replace_contents(loaded.bytes);
        self.new_file = loaded.new_file;
        self.mark_loaded();
        Ok(loaded.new_file)
    }

    fn mark_loaded(&mut self) {
        self.saved_revision = self.buffer.revision();
        self.loaded_revision = self.buffer.revision();
    }

    /// バッファ全体を `path` へ保存
    pub fn write_to(&self, path: &Path) -> Result<()> {
        io::persist(self.buffer.as_bytes(), path)
    }

    /// 開いているファイルへ保存し、未保存フラグを下ろす
    pub fn write_back(&mut self) -> Result<()> {
        if self.filename.is_empty() {
            return Err(FileError::MissingName.into());
        }
        self.write_to(&io::expand_path(&self.filename))?;
        self.saved_revision = self.buffer.revision();
        Ok(())
    }

    /// 1行のコマンドを解析して実行
    pub fn execute_line(&mut self, line: &str) -> Result<CommandOutcome> {
        let line = strip_comment(line);
        let command = CommandParser::new(self.expr_context()).parse(&line)?;
        log::debug!("command {:?}", command);
        self.execute(command)
    }

    /// 式評価用のコンテキスト
    pub fn expr_context(&self) -> ExprContext<'_> {
        ExprContext {
            buffer_len: self.buffer.len(),
            cursor: self.cursor(),
            marks: &self.marks,
        }
    }

    pub fn buffer(&self) -> &MemoryBuffer {
        &self.buffer
    }

    pub fn marks(&self) -> &MarkSet {
        &self.marks
    }

    pub fn yank(&self) -> &YankRegister {
        &self.yank
    }

    pub fn search(&self) -> &SearchEngine {
        &self.search
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn is_new_file(&self) -> bool {
        self.new_file
    }

    pub fn cursor(&self) -> Address {
        self.viewport.cursor()
    }

    pub fn jump(&mut self, addr: Address) {
        self.viewport.jump(addr);
    }

    /// 保存していない変更があるか
    pub fn has_unsaved_changes(&self) -> bool {
        self.buffer.revision() != self.saved_revision
    }

    /// 読み込み後に一度でも変更されたか
    pub fn is_modified(&self) -> bool {
        self.buffer.revision() != self.loaded_revision
    }

    pub fn insert_mode(&self) -> bool {
        self.insert_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_missing_file_is_new() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.bin");
        let session = Session::open(path.to_str().unwrap(), EditorConfig::default()).unwrap();
        assert!(session.is_new_file());
        assert!(session.buffer().is_empty());
        assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn write_back_clears_unsaved_but_not_modified() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"AB").unwrap();
        let mut session = Session::open(path.to_str().unwrap(), EditorConfig::default()).unwrap();
        session.execute_line("0i 58").unwrap();
        assert!(session.has_unsaved_changes());
        session.write_back().unwrap();
        assert!(!session.has_unsaved_changes());
        assert!(session.is_modified());
        assert_eq!(std::fs::read(&path).unwrap(), b"XB");
    }
}
