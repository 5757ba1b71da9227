//! コマンド実行
//!
//! 解析済みの `Command` をセッションに適用し、表示用の結果を返す

use super::bit_ops::{self, LogicOp, ShiftSpec};
use super::Session;
use crate::address::{Range, RangeSpec};
use crate::buffer::{staging, Address};
use crate::error::{BiError, BufferError, FileError, Result, StatusMessage};
use crate::file::io;
use crate::input::commands::{Command, RangeOp, SearchPattern, YankSource};
use crate::search;

/// セッションの外で行う処理
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Quit,
    /// スクリプトファイルを実行（入れ子可）
    RunScript { path: String, verbose: bool },
    /// シェルコマンドを実行
    Shell(String),
    /// マーク一覧を表示
    ShowMarks(String),
}

/// コマンド実行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// 結果メッセージ
    pub message: Option<StatusMessage>,
    pub effect: Effect,
}

impl CommandOutcome {
    pub fn done() -> Self {
        Self {
            message: None,
            effect: Effect::None,
        }
    }

    pub fn with_message(text: impl Into<String>) -> Self {
        Self {
            message: Some(StatusMessage::info(text)),
            effect: Effect::None,
        }
    }

    pub fn effect(effect: Effect) -> Self {
        Self {
            message: None,
            effect,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.effect == Effect::Quit
    }
}

fn bytes_message(count: u64, verb: &str) -> CommandOutcome {
    CommandOutcome::with_message(format!("{} bytes {}.", count, verb))
}

fn not_found() -> CommandOutcome {
    CommandOutcome::with_message("Not found.")
}

impl Session {
    /// コマンドを実行
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::Empty => Ok(CommandOutcome::done()),
            Command::Quit { force } => self.quit(force),
            Command::WriteQuit => {
                self.write_back()?;
                Ok(CommandOutcome::effect(Effect::Quit))
            }
            Command::Write(None) => {
                self.write_back()?;
                Ok(CommandOutcome::with_message("File written."))
            }
            Command::Write(Some(path)) => {
                if path.is_empty() {
                    return Err(FileError::MissingName.into());
                }
                self.write_to(&io::expand_path(&path))?;
                Ok(CommandOutcome::with_message("File written."))
            }
            Command::Reload => {
                let new_file = self.reload()?;
                Ok(CommandOutcome::with_message(if new_file {
                    "<new file>"
                } else {
                    "Original file read."
                }))
            }
            Command::RunScript { path, verbose } => {
                Ok(CommandOutcome::effect(Effect::RunScript { path, verbose }))
            }
            Command::SearchNext => {
                let from = self.cursor().saturating_add(1);
                Ok(self.search_from(from, search::SearchDirection::Forward))
            }
            Command::SearchPrev => {
                let from = self.cursor().checked_sub(1).unwrap_or(Address::MAX);
                Ok(self.search_from(from, search::SearchDirection::Backward))
            }
            Command::Shell(line) => Ok(CommandOutcome::effect(Effect::Shell(line))),
            Command::PrintValue(value) => Ok(CommandOutcome::with_message(format_value(value))),
            Command::Search(pattern) => {
                self.set_search_pattern(pattern)?;
                let from = self.cursor();
                Ok(self.search_from(from, search::SearchDirection::Forward))
            }
            Command::Ranged { spec, op } => self.execute_ranged(spec, op),
        }
    }

    /// 終了要求。未保存の変更があれば `force` でない限り拒否
    pub fn quit(&mut self, force: bool) -> Result<CommandOutcome> {
        if !force && self.has_unsaved_changes() {
            return Err(BiError::UnsavedChanges);
        }
        Ok(CommandOutcome::effect(Effect::Quit))
    }

    pub(crate) fn set_search_pattern(&mut self, pattern: SearchPattern) -> Result<()> {
        match pattern {
            SearchPattern::Regex(source) => self.search.set_regex(&source),
            SearchPattern::Literal(bytes) => {
                self.search.set_literal(bytes);
                Ok(())
            }
        }
    }

    pub(crate) fn search_from(
        &mut self,
        from: Address,
        direction: search::SearchDirection,
    ) -> CommandOutcome {
        match self.search.find(&self.buffer, from, direction) {
            Some(found) => {
                self.jump(found.addr);
                CommandOutcome::done()
            }
            None => not_found(),
        }
    }

    fn execute_ranged(&mut self, spec: RangeSpec, op: RangeOp) -> Result<CommandOutcome> {
        let range = spec.range;
        let start = range.start();
        match op {
            RangeOp::Jump => {
                self.jump(start);
                Ok(CommandOutcome::done())
            }
            RangeOp::Yank(source) => self.yank_into_register(range, source),
            RangeOp::Paste { insert } => {
                let bytes = self.yank.bytes().to_vec();
                self.put_bytes(start, &bytes, insert)?;
                self.jump(start.saturating_add(bytes.len() as u64));
                Ok(CommandOutcome::done())
            }
            RangeOp::Mark(letter) => {
                self.marks.set(letter, start);
                Ok(CommandOutcome::done())
            }
            RangeOp::ReadFile { path, insert } => {
                let bytes = io::load(&io::expand_path(&path))?;
                self.put_bytes(start, &bytes, insert)?;
                self.jump(start.saturating_add(bytes.len() as u64));
                Ok(CommandOutcome::done())
            }
            RangeOp::Delete => {
                let removed = self.buffer.delete(start, range.end())?;
                let count = removed.len() as u64;
                self.yank.set(removed);
                self.jump(start);
                Ok(bytes_message(count, "deleted"))
            }
            RangeOp::WriteRange(path) => {
                if path.is_empty() {
                    return Err(FileError::MissingName.into());
                }
                let count = io::persist_range(&self.buffer, range, &io::expand_path(&path))?;
                Ok(bytes_message(count, "written"))
            }
            RangeOp::Substitute {
                pattern,
                replacement,
            } => self.substitute(spec, pattern, &replacement),
            RangeOp::Not => {
                let count = bit_ops::invert(&mut self.buffer, range)?;
                self.jump(range.end().saturating_add(1));
                Ok(bytes_message(count, "noted"))
            }
            RangeOp::Fill {
                pattern,
                count,
                insert,
            } => self.fill(spec, pattern, count, insert),
            RangeOp::Copy { dest, insert } => self.copy(range, dest, insert),
            RangeOp::Move { dest } => self.move_to(range, dest),
            RangeOp::Logic { op, operand } => self.logic(range, op, operand),
            RangeOp::Shift(shift) => self.shift(range, shift),
        }
    }

    /// 範囲（末尾までの実在部分）または与えられたバイト列をヤンク
    fn yank_into_register(&mut self, range: Range, source: YankSource) -> Result<CommandOutcome> {
        match source {
            YankSource::Bytes(bytes) => self.yank.set(bytes),
            YankSource::Range => match self.existing_bytes(range)? {
                Some(bytes) => self.yank.set(bytes),
                None => return Ok(bytes_message(0, "yanked")),
            },
        }
        Ok(bytes_message(self.yank.len() as u64, "yanked"))
    }

    fn put_bytes(&mut self, at: Address, bytes: &[u8], insert: bool) -> Result<()> {
        if insert {
            self.buffer.insert(at, bytes)?;
        } else {
            self.buffer.overwrite(at, bytes)?;
        }
        Ok(())
    }

    /// 範囲の実在部分（ヤンク対象）
    fn existing_bytes(&self, range: Range) -> Result<Option<Vec<u8>>> {
        if range.start() >= self.buffer.len() {
            return Ok(None);
        }
        let end = range.end().min(self.buffer.last_address());
        Ok(Some(self.buffer.read(range.start(), end)?))
    }

    fn substitute(
        &mut self,
        spec: RangeSpec,
        pattern: Option<SearchPattern>,
        replacement: &[u8],
    ) -> Result<CommandOutcome> {
        if let Some(pattern) = pattern {
            self.set_search_pattern(pattern)?;
        }
        if !self.search.has_pattern() {
            return Err(BiError::InvalidExpression(
                "Specify search object.".to_string(),
            ));
        }
        let range = if spec.is_implicit() {
            Range::new(0, self.buffer.last_address())
        } else {
            spec.range
        };
        let cursor = self.cursor();
        let summary = search::substitute(&mut self.search, &mut self.buffer, range, replacement)?;
        self.jump(cursor);
        Ok(CommandOutcome::with_message(format!(
            "  {} times replaced.",
            summary.replaced
        )))
    }

    fn fill(
        &mut self,
        spec: RangeSpec,
        pattern: Vec<u8>,
        count: u64,
        insert: bool,
    ) -> Result<CommandOutcome> {
        let start = spec.range.start();
        if spec.end_given {
            if insert || pattern.is_empty() {
                return Err(BiError::invalid_syntax());
            }
            let data = repeat_to(&pattern, spec.range.len(), self.buffer.limit())?;
            self.buffer.overwrite(start, &data)?;
            self.jump(start.saturating_add(data.len() as u64));
            return Ok(bytes_message(data.len() as u64, "filled"));
        }

        let total = (pattern.len() as u64)
            .checked_mul(count)
            .ok_or(BufferError::Overflow { requested: u64::MAX })?;
        let data = repeat_to(&pattern, total, self.buffer.limit())?;
        self.put_bytes(start, &data, insert)?;
        self.jump(start.saturating_add(data.len() as u64));
        let verb = if insert { "inserted" } else { "overwritten" };
        Ok(bytes_message(data.len() as u64, verb))
    }

    fn copy(&mut self, range: Range, dest: Address, insert: bool) -> Result<CommandOutcome> {
        if range.len() > self.buffer.limit() {
            return Err(BufferError::Overflow {
                requested: range.len(),
            }
            .into());
        }
        let yanked = self.existing_bytes(range)?;
        let data = self.buffer.read(range.start(), range.end())?;
        self.put_bytes(dest, &data, insert)?;
        if let Some(bytes) = yanked {
            self.yank.set(bytes);
        }
        self.jump(dest.saturating_add(data.len() as u64));
        let verb = if insert { "inserted" } else { "copied" };
        Ok(bytes_message(range.len(), verb))
    }

    fn move_to(&mut self, range: Range, dest: Address) -> Result<CommandOutcome> {
        let moving = !range.contains(dest) && range.start() < self.buffer.len();
        let yanked = if moving {
            self.existing_bytes(range)?
        } else {
            None
        };
        let next = self.buffer.move_range(range.start(), range.end(), dest)?;
        self.jump(next);
        match yanked {
            Some(bytes) => {
                self.yank.set(bytes);
                Ok(bytes_message(range.len(), "moved"))
            }
            None => Ok(CommandOutcome::done()),
        }
    }

    fn logic(&mut self, range: Range, op: LogicOp, operand: u8) -> Result<CommandOutcome> {
        let count = bit_ops::apply_logic(&mut self.buffer, range, op, operand)?;
        self.jump(range.end().saturating_add(1));
        Ok(bytes_message(count, op.verb()))
    }

    fn shift(&mut self, range: Range, spec: ShiftSpec) -> Result<CommandOutcome> {
        bit_ops::shift(&mut self.buffer, range, spec)?;
        Ok(CommandOutcome::done())
    }
}

/// `pattern` を `len` バイトになるまで繰り返す
fn repeat_to(pattern: &[u8], len: u64, limit: u64) -> Result<Vec<u8>> {
    if len > limit {
        return Err(BufferError::Overflow { requested: len }.into());
    }
    let mut data = staging(len)?;
    data.extend(pattern.iter().copied().cycle().take(len as usize));
    Ok(data)
}

/// `?` コマンドの表示（10進・16進・8進・2進・文字）
pub fn format_value(value: u64) -> String {
    let glyph = match value {
        v if v < 0x20 => format!("^{} ", char::from(v as u8 + b'@')),
        v if v >= 0x7e => " . ".to_string(),
        v => format!("'{}'", char::from(v as u8)),
    };
    let hex = group_digits(&format!("{:016X}", value));
    let oct = group_digits(&format!("{:024o}", value));
    let bin = group_digits(&format!("{:064b}", value));
    format!("d{:>10}  x{}  o{} {}\nb{}", value, hex, oct, glyph, bin)
}

fn group_digits(digits: &str) -> String {
    digits
        .as_bytes()
        .chunks(4)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
