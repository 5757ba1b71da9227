//! 範囲指定の解決
//!
//! `[式][,式]` または `[式],*個数` を `start <= end` の包含範囲に変換する

use super::{Evaluator, Scanner};
use crate::buffer::Address;
use crate::error::{BiError, Result};

/// 包含範囲（常に `start <= end`）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: Address,
    end: Address,
}

impl Range {
    /// 範囲を作成。`end < start` なら `end = start` に切り上げる
    pub fn new(start: Address, end: Address) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// 1バイトの範囲
    pub fn single(addr: Address) -> Self {
        Self::new(addr, addr)
    }

    pub fn start(&self) -> Address {
        self.start
    }

    pub fn end(&self) -> Address {
        self.end
    }

    /// バイト数
    pub fn len(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    pub fn contains(&self, addr: Address) -> bool {
        (self.start..=self.end).contains(&addr)
    }
}

/// コマンド行から解決した範囲と、各端点が明示されたか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub range: Range,
    /// 開始アドレスが明示された
    pub start_given: bool,
    /// `,式` で終了アドレスが明示された
    pub end_given: bool,
}

impl RangeSpec {
    /// 範囲指定がまったくなかったか
    pub fn is_implicit(&self) -> bool {
        !self.start_given && !self.end_given
    }
}

impl<'a> Evaluator<'a> {
    /// 範囲指定を解決する
    ///
    /// 開始アドレス省略時はカーソル位置。`,*N` は N バイト（N 省略時 1）
    pub fn resolve_range(&self, s: &mut Scanner) -> Result<RangeSpec> {
        s.skip_spaces();
        let (start, start_given) = match self.expression(s)? {
            Some(addr) => (addr, true),
            None => (self.context().cursor, false),
        };

        let mut end = start;
        let mut end_given = false;

        s.skip_spaces();
        if s.eat(',') {
            s.skip_spaces();
            if s.eat('*') {
                s.skip_spaces();
                let count = self.expression(s)?.unwrap_or(1);
                end = start
                    .checked_add(count)
                    .ok_or_else(BiError::address_overflow)?
                    .saturating_sub(1);
            } else if let Some(addr) = self.expression(s)? {
                end = addr;
                end_given = true;
            }
        }

        Ok(RangeSpec {
            range: Range::new(start, end),
            start_given,
            end_given,
        })
    }
}
