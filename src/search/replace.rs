//! 範囲内の一括置換

use super::{SearchEngine, SearchMatch};
use crate::address::Range;
use crate::buffer::{staging, MemoryBuffer};
use crate::error::{BufferError, Result};

/// 置換結果のサマリ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceSummary {
    /// 置換した回数
    pub replaced: usize,
    /// 置換後のバッファ長
    pub new_len: u64,
}

/// 範囲内で開始するマッチを左から順に集める
///
/// 各マッチの直後から探索を再開し、長さ 0 のマッチでは1バイト進める
fn collect_matches(engine: &mut SearchEngine, buffer: &MemoryBuffer, range: Range) -> Vec<SearchMatch> {
    let mut found = Vec::new();
    let mut pos = range.start();
    while let Some(hit) = engine.find_forward(buffer, pos) {
        if hit.addr > range.end() {
            break;
        }
        found.push(hit);
        pos = hit.addr + hit.span.max(1);
    }
    found
}

/// `range` 内のマッチをすべて `replacement` に置き換える
///
/// マッチは置換前の内容に対して求め、まとめて適用する。
/// 置換後の長さが上限を超える場合はバッファを変更しない
pub fn substitute(
    engine: &mut SearchEngine,
    buffer: &mut MemoryBuffer,
    range: Range,
    replacement: &[u8],
) -> Result<ReplaceSummary> {
    let matches = collect_matches(engine, buffer, range);
    if matches.is_empty() {
        return Ok(ReplaceSummary {
            replaced: 0,
            new_len: buffer.len(),
        });
    }

    let source = buffer.as_bytes();
    let old_len = source.len() as u64;
    let removed: u64 = matches
        .iter()
        .map(|m| m.end().min(old_len) - m.addr)
        .sum();
    let added = (replacement.len() as u64).saturating_mul(matches.len() as u64);
    let new_len = (old_len - removed).saturating_add(added);
    if new_len > buffer.limit() {
        return Err(BufferError::Overflow { requested: new_len }.into());
    }

    let mut out = staging(new_len)?;
    let mut copied = 0usize;
    for hit in &matches {
        let at = hit.addr as usize;
        out.extend_from_slice(&source[copied..at]);
        out.extend_from_slice(replacement);
        copied = hit.end().min(old_len) as usize;
    }
    out.extend_from_slice(&source[copied..]);

    let replaced = matches.len();
    log::debug!("replaced {} matches, length {} -> {}", replaced, old_len, new_len);
    buffer.replace_contents(out);
    Ok(ReplaceSummary { replaced, new_len })
}
