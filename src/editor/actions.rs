//! 画面編集のキー操作
//!
//! `KeyDecoder` が決めたアクションをセッションへ適用する。
//! プロンプト入力と表示切替は呼び出し側で扱う

use super::dispatch::{CommandOutcome, Effect};
use super::Session;
use crate::error::Result;
use crate::input::keys::{Action, Motion};
use crate::search::SearchDirection;

impl Session {
    /// アクションを1つ適用
    pub fn apply_action(&mut self, action: Action) -> Result<CommandOutcome> {
        match action {
            Action::Move(motion) => {
                self.apply_motion(motion);
                Ok(CommandOutcome::done())
            }
            Action::Nibble(value) => {
                self.edit_nibble(value)?;
                Ok(CommandOutcome::done())
            }
            Action::ToggleInsert => {
                self.insert_mode = !self.insert_mode;
                self.stroke = false;
                Ok(CommandOutcome::done())
            }
            Action::DeleteByte => {
                let at = self.cursor();
                if at < self.buffer.len() {
                    self.buffer.delete(at, at)?;
                }
                Ok(CommandOutcome::done())
            }
            Action::Paste { insert } => {
                let at = self.cursor();
                let bytes = self.yank.bytes().to_vec();
                if insert {
                    self.buffer.insert(at, &bytes)?;
                } else {
                    self.buffer.overwrite(at, &bytes)?;
                }
                self.jump(at.saturating_add(bytes.len() as u64));
                Ok(CommandOutcome::done())
            }
            Action::SetMark(letter) => {
                let at = self.cursor();
                self.marks.set(letter, at);
                Ok(CommandOutcome::done())
            }
            Action::JumpMark(letter) => {
                if let Some(addr) = self.marks.get(letter) {
                    self.jump(addr);
                }
                Ok(CommandOutcome::done())
            }
            Action::ShowMarks => Ok(CommandOutcome::effect(Effect::ShowMarks(
                self.marks_listing(),
            ))),
            Action::SearchNext => {
                let from = self.cursor().saturating_add(1);
                Ok(self.search_from(from, SearchDirection::Forward))
            }
            Action::SearchPrev => {
                let from = self.cursor().checked_sub(1).unwrap_or(u64::MAX);
                Ok(self.search_from(from, SearchDirection::Backward))
            }
            Action::WriteQuit => {
                self.write_back()?;
                Ok(CommandOutcome::effect(Effect::Quit))
            }
            Action::Quit => self.quit(false),
            Action::SearchPrompt
            | Action::CommandPrompt
            | Action::ToggleUtf8
            | Action::CycleUtf8Phase => Ok(CommandOutcome::done()),
        }
    }

    fn apply_motion(&mut self, motion: Motion) {
        let vp = &mut self.viewport;
        match motion {
            Motion::Left => vp.prev_nibble(),
            Motion::Right => vp.next_nibble(),
            Motion::Up => vp.line_up(),
            Motion::Down => vp.line_down(),
            Motion::RowStart => vp.row_start(),
            Motion::RowEnd => vp.row_end(),
            Motion::PageBack(bytes) => vp.page_back(bytes),
            Motion::PageForward(bytes) => vp.page_forward(bytes),
        }
    }

    /// カーソル位置のニブルを書き換えて1ニブル進める
    ///
    /// 挿入モードでは上位ニブルの入力で新しいバイトを挿入し、
    /// 続く下位ニブルはそのバイトを書き換える
    fn edit_nibble(&mut self, value: u8) -> Result<()> {
        let at = self.cursor();
        let low = self.viewport.on_low_nibble();
        let (shift, keep) = if low { (0, 0xf0) } else { (4, 0x0f) };
        let nibble = (value & 0xf) << shift;

        if self.insert_mode {
            if !self.stroke && at < self.buffer.len() {
                self.buffer.insert(at, &[nibble])?;
            } else {
                let merged = self.buffer.byte_at(at) & keep | nibble;
                self.buffer.set_byte(at, merged)?;
            }
            self.stroke = if low { false } else { !self.stroke };
        } else {
            let merged = self.buffer.byte_at(at) & keep | nibble;
            self.buffer.set_byte(at, merged)?;
        }
        self.viewport.next_nibble();
        Ok(())
    }

    /// マーク一覧（1行に3つ）
    pub fn marks_listing(&self) -> String {
        let entries: Vec<String> = self
            .marks
            .iter()
            .map(|(letter, addr)| match addr {
                Some(addr) => format!("{} = {:012X}", letter, addr),
                None => format!("{} = unknown", letter),
            })
            .collect();
        entries
            .chunks(3)
            .map(|row| {
                row.iter()
                    .map(|entry| format!("{:<20}", entry))
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
