//! バイトバッファ実装
//!
//! 書き込みは必要に応じて 0 埋めで伸長し、読み出しは範囲外を 0 として返す。
//! 各操作は失敗時にバッファを一切変更しない

use super::Address;
use crate::error::{buffer::Result, BufferError};

/// 既定の最大バッファ長（4GiB）
pub const DEFAULT_MAX_LEN: u64 = 1 << 32;

/// 編集対象のバイト列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBuffer {
    /// 内容
    data: Vec<u8>,
    /// 伸長できる上限
    limit: u64,
    /// 変更のたびに増える世代番号
    revision: u64,
}

impl MemoryBuffer {
    /// 空のバッファを作成
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_LEN)
    }

    /// 上限長を指定して作成
    pub fn with_limit(limit: u64) -> Self {
        Self {
            data: Vec::new(),
            limit,
            revision: 0,
        }
    }

    /// 既存のバイト列から作成
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mut buffer = Self::new();
        buffer.data = bytes;
        buffer
    }

    /// 内容を丸ごと置き換える（ファイル再読込用）
    pub fn replace_contents(&mut self, bytes: Vec<u8>) {
        self.data = bytes;
        self.touch();
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// 最終アドレス（空なら 0）
    pub fn last_address(&self) -> Address {
        self.len().saturating_sub(1)
    }

    /// 1バイト読み出し（範囲外は 0）
    pub fn byte_at(&self, addr: Address) -> u8 {
        usize::try_from(addr)
            .ok()
            .and_then(|index| self.data.get(index))
            .copied()
            .unwrap_or(0)
    }

    /// `[start, end]` を読み出す
    ///
    /// 範囲外は 0 として返し、バッファは伸長しない。`end < start` なら空。
    /// 読み出し先を確保できなければ `Overflow`
    pub fn read(&self, start: Address, end: Address) -> Result<Vec<u8>> {
        if end < start {
            return Ok(Vec::new());
        }
        let count = span_len(start, end);
        let mut out = staging(count)?;
        if start < self.len() {
            let stop = end.saturating_add(1).min(self.len());
            out.extend_from_slice(&self.data[start as usize..stop as usize]);
        }
        out.resize(count as usize, 0);
        Ok(out)
    }

    /// 1バイト書き込み（必要なら伸長）
    pub fn set_byte(&mut self, addr: Address, value: u8) -> Result<()> {
        self.overwrite(addr, &[value])
    }

    /// `pos` に `bytes` を挿入
    ///
    /// `pos` が末尾以降なら 0 埋めしてから追加する
    pub fn insert(&mut self, pos: Address, bytes: &[u8]) -> Result<()> {
        let len = self.len();
        let new_len = pos
            .max(len)
            .checked_add(bytes.len() as u64)
            .ok_or(BufferError::Overflow { requested: u64::MAX })?;
        self.reserve_to(new_len)?;

        if pos >= len {
            self.data.resize(pos as usize, 0);
            self.data.extend_from_slice(bytes);
        } else {
            let at = pos as usize;
            self.data.splice(at..at, bytes.iter().copied());
        }
        self.touch();
        Ok(())
    }

    /// `[start, end]` を削除し、削除したバイト列を返す
    ///
    /// `end` は末尾に切り詰める
    pub fn delete(&mut self, start: Address, end: Address) -> Result<Vec<u8>> {
        if end < start || start >= self.len() {
            return Err(BufferError::InvalidRange { start, end });
        }
        let stop = end.min(self.last_address()) as usize;
        let removed: Vec<u8> = self.data.drain(start as usize..=stop).collect();
        self.touch();
        Ok(removed)
    }

    /// `pos` から `bytes` で上書き
    pub fn overwrite(&mut self, pos: Address, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let end = pos
            .checked_add(bytes.len() as u64)
            .ok_or(BufferError::Overflow { requested: u64::MAX })?;
        if end > self.len() {
            self.reserve_to(end)?;
            self.data.resize(end as usize, 0);
        }
        let at = pos as usize;
        self.data[at..at + bytes.len()].copy_from_slice(bytes);
        self.touch();
        Ok(())
    }

    /// `[start, end]` を `dest` へ上書き複写
    pub fn copy(&mut self, start: Address, end: Address, dest: Address) -> Result<()> {
        let bytes = self.read(start, end)?;
        self.overwrite(dest, &bytes)
    }

    /// `[start, end]` を `dest` へ移動し、移動したバイト列の直後のアドレスを返す
    ///
    /// `dest` が範囲内なら何もしない
    pub fn move_range(&mut self, start: Address, end: Address, dest: Address) -> Result<Address> {
        if (start..=end).contains(&dest) {
            return Ok(end.saturating_add(1));
        }
        let len = self.len();
        if start >= len {
            return Ok(dest);
        }

        let width = span_len(start, end);
        let removed = span_len(start, end.min(len - 1));
        // 削除前に最終的な長さを検査し、途中で失敗しないようにする
        let final_len = if dest > len {
            dest.checked_add(width)
                .ok_or(BufferError::Overflow { requested: u64::MAX })?
                .max(len - removed)
        } else {
            len - removed + width
        };
        if final_len > self.limit {
            return Err(BufferError::Overflow { requested: final_len });
        }

        let snapshot = self.read(start, end)?;
        self.delete(start, end)?;

        if dest > len {
            self.overwrite(dest, &snapshot)?;
            Ok(dest + width)
        } else if dest > start {
            let at = dest - (end - start + 1);
            self.insert(at, &snapshot)?;
            Ok(at + width)
        } else {
            self.insert(dest, &snapshot)?;
            Ok(dest + width)
        }
    }

    fn reserve_to(&mut self, new_len: u64) -> Result<()> {
        if new_len > self.limit {
            return Err(BufferError::Overflow { requested: new_len });
        }
        let target = usize::try_from(new_len).map_err(|_| BufferError::Overflow { requested: new_len })?;
        if let Some(additional) = target.checked_sub(self.data.len()) {
            self.data
                .try_reserve(additional)
                .map_err(|_| BufferError::Overflow { requested: new_len })?;
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

impl Default for MemoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// `len` バイト分を確保した空の作業領域
///
/// 確保に失敗したら中断せず `Overflow` を返す
pub fn staging(len: u64) -> Result<Vec<u8>> {
    let overflow = || BufferError::Overflow { requested: len };
    let capacity = usize::try_from(len).map_err(|_| overflow())?;
    let mut out = Vec::new();
    out.try_reserve_exact(capacity).map_err(|_| overflow())?;
    Ok(out)
}

/// 包含範囲のバイト数
pub fn span_len(start: Address, end: Address) -> u64 {
    if end < start {
        0
    } else {
        (end - start).saturating_add(1)
    }
}
