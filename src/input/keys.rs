//! 1キー操作モードのキー解釈
//!
//! crossterm のキーイベントを内部表現に変換し、画面編集用のアクションへ対応付ける

use crossterm::event::{KeyCode as CrosstermKeyCode, KeyEvent, KeyModifiers as CrosstermModifiers};

/// キー入力の内部表現
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub ctrl: bool,
    pub code: KeyCode,
}

/// 基本キーコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Insert,
    Esc,
    Unknown,
}

impl Key {
    pub fn plain(ch: char) -> Self {
        Self {
            ctrl: false,
            code: KeyCode::Char(ch),
        }
    }

    pub fn ctrl(ch: char) -> Self {
        Self {
            ctrl: true,
            code: KeyCode::Char(ch),
        }
    }
}

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        let code = match event.code {
            CrosstermKeyCode::Char(c) => KeyCode::Char(c),
            CrosstermKeyCode::Enter => KeyCode::Enter,
            CrosstermKeyCode::Backspace => KeyCode::Backspace,
            CrosstermKeyCode::Up => KeyCode::Up,
            CrosstermKeyCode::Down => KeyCode::Down,
            CrosstermKeyCode::Left => KeyCode::Left,
            CrosstermKeyCode::Right => KeyCode::Right,
            CrosstermKeyCode::Insert => KeyCode::Insert,
            CrosstermKeyCode::Esc => KeyCode::Esc,
            _ => KeyCode::Unknown,
        };
        Key {
            ctrl: event.modifiers.contains(CrosstermModifiers::CONTROL),
            code,
        }
    }
}

/// カーソル移動
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    RowStart,
    RowEnd,
    /// 表示開始アドレスを戻す（バイト数）
    PageBack(u64),
    PageForward(u64),
}

/// 画面編集のアクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Motion),
    /// カーソル位置のニブルを書き換える
    Nibble(u8),
    ToggleInsert,
    DeleteByte,
    Paste { insert: bool },
    SetMark(char),
    JumpMark(char),
    ShowMarks,
    SearchNext,
    SearchPrev,
    SearchPrompt,
    CommandPrompt,
    ToggleUtf8,
    CycleUtf8Phase,
    WriteQuit,
    Quit,
}

/// 2打鍵目を待っている状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Mark,
    JumpMark,
}

/// キー列をアクションへ変換する
#[derive(Debug, Default)]
pub struct KeyDecoder {
    pending: Option<Pending>,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1キーを処理。アクションが確定しなければ `None`
    pub fn feed(&mut self, key: Key) -> Option<Action> {
        if let Some(pending) = self.pending.take() {
            let KeyCode::Char(ch) = key.code else {
                return None;
            };
            let letter = ch.to_ascii_lowercase();
            if !letter.is_ascii_lowercase() {
                return None;
            }
            return Some(match pending {
                Pending::Mark => Action::SetMark(letter),
                Pending::JumpMark => Action::JumpMark(letter),
            });
        }

        if key.ctrl {
            return match key.code {
                KeyCode::Char('b') => Some(Action::Move(Motion::PageBack(256))),
                KeyCode::Char('f') => Some(Action::Move(Motion::PageForward(256))),
                KeyCode::Char('u') => Some(Action::Move(Motion::PageBack(128))),
                KeyCode::Char('d') => Some(Action::Move(Motion::PageForward(128))),
                KeyCode::Char('y') => Some(Action::ToggleUtf8),
                KeyCode::Char('l') => Some(Action::CycleUtf8Phase),
                _ => None,
            };
        }

        let action = match key.code {
            KeyCode::Up => Action::Move(Motion::Up),
            KeyCode::Down => Action::Move(Motion::Down),
            KeyCode::Left => Action::Move(Motion::Left),
            KeyCode::Right => Action::Move(Motion::Right),
            KeyCode::Insert => Action::ToggleInsert,
            KeyCode::Char(ch) => match ch {
                'k' => Action::Move(Motion::Up),
                'j' => Action::Move(Motion::Down),
                'h' => Action::Move(Motion::Left),
                'l' => Action::Move(Motion::Right),
                '^' => Action::Move(Motion::RowStart),
                '$' => Action::Move(Motion::RowEnd),
                'n' => Action::SearchNext,
                'N' => Action::SearchPrev,
                'Z' => Action::WriteQuit,
                'q' => Action::Quit,
                'M' => Action::ShowMarks,
                'm' => {
                    self.pending = Some(Pending::Mark);
                    return None;
                }
                '\'' => {
                    self.pending = Some(Pending::JumpMark);
                    return None;
                }
                '/' => Action::SearchPrompt,
                ':' => Action::CommandPrompt,
                'p' => Action::Paste { insert: false },
                'P' => Action::Paste { insert: true },
                'i' => Action::ToggleInsert,
                'x' => Action::DeleteByte,
                c => Action::Nibble(c.to_digit(16)? as u8),
            },
            _ => return None,
        };
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motions_and_edits() {
        let mut decoder = KeyDecoder::new();
        assert_eq!(decoder.feed(Key::plain('j')), Some(Action::Move(Motion::Down)));
        assert_eq!(decoder.feed(Key::plain('A')), Some(Action::Nibble(0xa)));
        assert_eq!(decoder.feed(Key::plain('7')), Some(Action::Nibble(7)));
        assert_eq!(decoder.feed(Key::plain('z')), None);
        assert_eq!(
            decoder.feed(Key::ctrl('b')),
            Some(Action::Move(Motion::PageBack(256)))
        );
    }

    #[test]
    fn mark_keys_take_a_letter() {
        let mut decoder = KeyDecoder::new();
        assert_eq!(decoder.feed(Key::plain('m')), None);
        assert_eq!(decoder.feed(Key::plain('C')), Some(Action::SetMark('c')));
        assert_eq!(decoder.feed(Key::plain('\'')), None);
        assert_eq!(decoder.feed(Key::plain('1')), None);
        assert_eq!(decoder.feed(Key::plain('1')), Some(Action::Nibble(1)));
    }
}
