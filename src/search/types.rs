//! 検索関連の共通型

use crate::buffer::Address;

/// 検索方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    /// 前方検索
    Forward,
    /// 後方検索
    Backward,
}

/// 1件の検索マッチ情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// マッチ開始アドレス
    pub addr: Address,
    /// マッチしたバイト数
    pub span: u64,
}

impl SearchMatch {
    /// マッチ末尾の次のアドレス
    pub fn end(&self) -> Address {
        self.addr.saturating_add(self.span)
    }

    /// 長さ 0 のマッチか
    pub fn is_empty(&self) -> bool {
        self.span == 0
    }
}

/// 現在の検索パターンの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// パターン未設定
    Idle,
    /// バイト列の完全一致
    Literal,
    /// 正規表現
    Regex,
}
