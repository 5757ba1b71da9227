//! 入力行の履歴
//!
//! `:` コマンド行と `/` 検索語で別々に保持する

use std::collections::VecDeque;

/// 履歴の最大保存数
const MAX_HISTORY_SIZE: usize = 100;

/// セッション内の入力履歴
#[derive(Debug, Clone)]
pub struct SessionHistory {
    /// 履歴エントリ（新しいものが先頭）
    entries: VecDeque<String>,
    max_size: usize,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_SIZE)
    }

    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// エントリを追加。空行は無視し、重複は先頭へ移す
    pub fn add_entry(&mut self, entry: &str) {
        if entry.is_empty() {
            return;
        }
        self.entries.retain(|e| e != entry);
        self.entries.push_front(entry.to_string());
        self.entries.truncate(self.max_size);
    }

    /// インデックス0が最新
    pub fn get_entry(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new()
    }
}
