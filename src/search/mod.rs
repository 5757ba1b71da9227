//! 検索モジュール
//!
//! リテラル（バイト列）と正規表現の2モードを持つ検索エンジン。
//! 探索は1バイトずつのプローブで進み、折り返しは1回まで

pub mod matcher;
pub mod replace;
pub mod types;

use crate::buffer::{Address, MemoryBuffer};
use crate::error::{BiError, Result};
use matcher::{ByteMatcher, LiteralMatcher, RegexMatcher};

pub use matcher::DEFAULT_REGEX_WINDOW;
pub use replace::{substitute, ReplaceSummary};
pub use types::{SearchDirection, SearchKind, SearchMatch};

/// 現在のパターン
#[derive(Debug, Clone)]
enum SearchMode {
    Idle,
    Literal(LiteralMatcher),
    Regex(RegexMatcher),
}

/// 検索状態
#[derive(Debug, Clone)]
pub struct SearchEngine {
    mode: SearchMode,
    /// 直近のマッチ長
    span: u64,
    window: usize,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_REGEX_WINDOW)
    }

    /// 正規表現の照合ウィンドウを指定して作成
    pub fn with_window(window: usize) -> Self {
        Self {
            mode: SearchMode::Idle,
            span: 0,
            window,
        }
    }

    pub fn kind(&self) -> SearchKind {
        match self.mode {
            SearchMode::Idle => SearchKind::Idle,
            SearchMode::Literal(_) => SearchKind::Literal,
            SearchMode::Regex(_) => SearchKind::Regex,
        }
    }

    /// 直近のマッチ長
    pub fn span(&self) -> u64 {
        self.span
    }

    /// 検索できるパターンがあるか
    pub fn has_pattern(&self) -> bool {
        match &self.mode {
            SearchMode::Idle => false,
            SearchMode::Literal(m) => !m.is_empty(),
            SearchMode::Regex(m) => !m.is_empty(),
        }
    }

    /// バイト列パターンを設定
    pub fn set_literal(&mut self, pattern: Vec<u8>) {
        log::debug!("literal search pattern: {} bytes", pattern.len());
        self.span = pattern.len() as u64;
        self.mode = if pattern.is_empty() {
            SearchMode::Idle
        } else {
            SearchMode::Literal(LiteralMatcher::new(pattern))
        };
    }

    /// 正規表現パターンを設定
    ///
    /// コンパイルに失敗した場合は状態を変更しない
    pub fn set_regex(&mut self, source: &str) -> Result<()> {
        if source.is_empty() {
            self.mode = SearchMode::Idle;
            self.span = 0;
            return Ok(());
        }
        let matcher = RegexMatcher::new(source, self.window)
            .map_err(|e| BiError::BadPattern(e.to_string()))?;
        log::debug!("regex search pattern: {}", source);
        self.span = source.len() as u64;
        self.mode = SearchMode::Regex(matcher);
        Ok(())
    }

    /// `addr` での1回の照合。成功すれば `span` を更新する
    pub fn probe(&mut self, buffer: &MemoryBuffer, addr: Address) -> Option<SearchMatch> {
        let span = match &self.mode {
            SearchMode::Idle => None,
            SearchMode::Literal(m) => m.match_at(buffer, addr),
            SearchMode::Regex(m) => m.match_at(buffer, addr),
        }?;
        self.span = span;
        Some(SearchMatch { addr, span })
    }

    /// `from` から前方へ探索（末尾で先頭へ1回折り返す）
    pub fn find_next(&mut self, buffer: &MemoryBuffer, from: Address) -> Option<SearchMatch> {
        self.find(buffer, from, SearchDirection::Forward)
    }

    /// `from` から後方へ探索（先頭で末尾へ1回折り返す）
    pub fn find_prev(&mut self, buffer: &MemoryBuffer, from: Address) -> Option<SearchMatch> {
        self.find(buffer, from, SearchDirection::Backward)
    }

    /// 方向を指定して探索
    ///
    /// バッファ長と同じ回数だけプローブして見つからなければ `None`
    pub fn find(
        &mut self,
        buffer: &MemoryBuffer,
        from: Address,
        direction: SearchDirection,
    ) -> Option<SearchMatch> {
        let len = buffer.len();
        if len == 0 || !self.has_pattern() {
            return None;
        }
        let start = if from < len {
            from
        } else {
            match direction {
                SearchDirection::Forward => 0,
                SearchDirection::Backward => len - 1,
            }
        };

        let mut pos = start;
        for _ in 0..len {
            if let Some(found) = self.probe(buffer, pos) {
                return Some(found);
            }
            pos = match direction {
                SearchDirection::Forward => {
                    if pos + 1 >= len {
                        0
                    } else {
                        pos + 1
                    }
                }
                SearchDirection::Backward => {
                    if pos == 0 {
                        len - 1
                    } else {
                        pos - 1
                    }
                }
            };
        }
        log::debug!("search wrapped around without a match");
        None
    }

    /// 折り返さずに `from` から末尾まで前方探索
    pub fn find_forward(&mut self, buffer: &MemoryBuffer, from: Address) -> Option<SearchMatch> {
        if !self.has_pattern() {
            return None;
        }
        (from..buffer.len()).find_map(|pos| self.probe(buffer, pos))
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(bytes: &[u8]) -> MemoryBuffer {
        MemoryBuffer::from_bytes(bytes.to_vec())
    }

    #[test]
    fn idle_engine_finds_nothing() {
        let mut engine = SearchEngine::new();
        assert_eq!(engine.kind(), SearchKind::Idle);
        assert!(engine.find_next(&buffer(b"abc"), 0).is_none());
    }

    #[test]
    fn empty_buffer_is_not_found() {
        let mut engine = SearchEngine::new();
        engine.set_literal(vec![0]);
        assert!(engine.find_next(&MemoryBuffer::new(), 0).is_none());
        assert!(engine.find_prev(&MemoryBuffer::new(), 0).is_none());
    }

    #[test]
    fn next_wraps_once() {
        let buf = buffer(b"ab--ab--");
        let mut engine = SearchEngine::new();
        engine.set_literal(b"ab".to_vec());
        assert_eq!(engine.find_next(&buf, 1).map(|m| m.addr), Some(4));
        assert_eq!(engine.find_next(&buf, 5).map(|m| m.addr), Some(0));
    }

    #[test]
    fn prev_wraps_once() {
        let buf = buffer(b"--ab--");
        let mut engine = SearchEngine::new();
        engine.set_literal(b"ab".to_vec());
        assert_eq!(engine.find_prev(&buf, 1).map(|m| m.addr), Some(2));
        assert_eq!(engine.find_prev(&buf, 3).map(|m| m.addr), Some(2));
    }

    #[test]
    fn absent_pattern_terminates() {
        let buf = buffer(&[0x11; 4096]);
        let mut engine = SearchEngine::new();
        engine.set_literal(vec![0x22]);
        assert!(engine.find_next(&buf, 100).is_none());
        assert!(engine.find_prev(&buf, 100).is_none());
    }

    #[test]
    fn start_past_end_is_normalized() {
        let buf = buffer(b"xa");
        let mut engine = SearchEngine::new();
        engine.set_literal(b"a".to_vec());
        assert_eq!(engine.find_next(&buf, 10).map(|m| m.addr), Some(1));
        assert_eq!(engine.find_prev(&buf, 10).map(|m| m.addr), Some(1));
    }

    #[test]
    fn regex_updates_span() {
        let buf = buffer(b"..hello..");
        let mut engine = SearchEngine::new();
        engine.set_regex("hel+").unwrap();
        let found = engine.find_next(&buf, 0).unwrap();
        assert_eq!(found, SearchMatch { addr: 2, span: 4 });
        assert_eq!(engine.span(), 4);
    }

    #[test]
    fn bad_regex_keeps_previous_state() {
        let mut engine = SearchEngine::new();
        engine.set_literal(b"a".to_vec());
        let err = engine.set_regex("(").unwrap_err();
        assert!(matches!(err, BiError::BadPattern(_)));
        assert_eq!(engine.kind(), SearchKind::Literal);
    }

    #[test]
    fn forward_scan_does_not_wrap() {
        let buf = buffer(b"a---");
        let mut engine = SearchEngine::new();
        engine.set_literal(b"a".to_vec());
        assert!(engine.find_forward(&buf, 1).is_none());
        assert_eq!(engine.find_forward(&buf, 0).map(|m| m.addr), Some(0));
    }
}
