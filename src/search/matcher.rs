//! 検索用マッチャー
//!
//! どちらのマッチャーも指定アドレスに固定した1回の照合（プローブ）だけを行う

use crate::buffer::{Address, MemoryBuffer};
use regex::Regex;

/// 既定の正規表現照合ウィンドウ（バイト）
pub const DEFAULT_REGEX_WINDOW: usize = 128;

/// バイト列マッチング戦略
pub trait ByteMatcher {
    /// `addr` から始まるマッチがあればそのバイト数を返す
    fn match_at(&self, buffer: &MemoryBuffer, addr: Address) -> Option<u64>;

    /// パターンが空か
    fn is_empty(&self) -> bool;
}

/// バイト列の完全一致
///
/// 末尾を越えた位置は 0 として比較する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralMatcher {
    pattern: Vec<u8>,
}

impl LiteralMatcher {
    pub fn new(pattern: Vec<u8>) -> Self {
        Self { pattern }
    }
}

impl ByteMatcher for LiteralMatcher {
    fn match_at(&self, buffer: &MemoryBuffer, addr: Address) -> Option<u64> {
        let matched = self
            .pattern
            .iter()
            .enumerate()
            .all(|(i, byte)| match addr.checked_add(i as u64) {
                Some(pos) => buffer.byte_at(pos) == *byte,
                None => false,
            });
        matched.then_some(self.pattern.len() as u64)
    }

    fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }
}

/// 正規表現による照合
///
/// `addr` から最大 `window` バイトを UTF-8 として復号し（不正な列は U+FFFD）、
/// 先頭から始まるマッチのみを採用する。マッチ長は復号後の文字列のバイト数
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
    window: usize,
}

impl RegexMatcher {
    /// パターンをコンパイル
    pub fn new(source: &str, window: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(source)?,
            window: window.max(1),
        })
    }

    fn window_bytes<'b>(&self, buffer: &'b MemoryBuffer, addr: Address) -> &'b [u8] {
        let bytes = buffer.as_bytes();
        let Ok(start) = usize::try_from(addr) else {
            return &[];
        };
        if start >= bytes.len() {
            return &[];
        }
        let stop = start.saturating_add(self.window).min(bytes.len());
        &bytes[start..stop]
    }
}

impl ByteMatcher for RegexMatcher {
    fn match_at(&self, buffer: &MemoryBuffer, addr: Address) -> Option<u64> {
        let text = String::from_utf8_lossy(self.window_bytes(buffer, addr));
        self.regex
            .find(&text)
            .filter(|m| m.start() == 0)
            .map(|m| m.as_str().len() as u64)
    }

    fn is_empty(&self) -> bool {
        self.regex.as_str().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(bytes: &[u8]) -> MemoryBuffer {
        MemoryBuffer::from_bytes(bytes.to_vec())
    }

    #[test]
    fn literal_matches_in_place() {
        let buf = buffer(b"xxABCx");
        let matcher = LiteralMatcher::new(b"ABC".to_vec());
        assert_eq!(matcher.match_at(&buf, 2), Some(3));
        assert_eq!(matcher.match_at(&buf, 1), None);
    }

    #[test]
    fn literal_compares_zero_past_end() {
        let buf = buffer(b"AB");
        assert_eq!(LiteralMatcher::new(vec![b'B', 0, 0]).match_at(&buf, 1), Some(3));
        assert_eq!(LiteralMatcher::new(vec![b'B', 1]).match_at(&buf, 1), None);
    }

    #[test]
    fn regex_probe_is_anchored() {
        let buf = buffer(b"--abc");
        let matcher = RegexMatcher::new("ab+", DEFAULT_REGEX_WINDOW).unwrap();
        assert_eq!(matcher.match_at(&buf, 0), None);
        assert_eq!(matcher.match_at(&buf, 2), Some(2));
    }

    #[test]
    fn regex_span_counts_utf8_bytes() {
        let buf = buffer("あいう".as_bytes());
        let matcher = RegexMatcher::new("あい", DEFAULT_REGEX_WINDOW).unwrap();
        assert_eq!(matcher.match_at(&buf, 0), Some(6));
    }

    #[test]
    fn regex_window_is_bounded() {
        let mut bytes = vec![b'a'; 200];
        bytes.push(b'z');
        let buf = buffer(&bytes);
        let matcher = RegexMatcher::new("a+z", 128).unwrap();
        assert_eq!(matcher.match_at(&buf, 0), None);
        assert_eq!(matcher.match_at(&buf, 100), Some(101));
    }

    #[test]
    fn invalid_utf8_becomes_replacement_char() {
        let buf = buffer(&[0xff, b'A']);
        let matcher = RegexMatcher::new("\u{FFFD}A", DEFAULT_REGEX_WINDOW).unwrap();
        assert_eq!(matcher.match_at(&buf, 0), Some(4));
    }
}
