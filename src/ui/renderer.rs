//! 画面描画
//!
//! セッションから1画面分の `Frame` を組み立て、crossterm で端末へ描く。
//! 行の整形は端末に依存しない関数に分けてある

use crate::buffer::{Address, MemoryBuffer};
use crate::config::ColorScheme;
use crate::editor::Session;
use crate::error::{ErrorLevel, StatusMessage};
use crate::ui::viewport::BYTES_PER_ROW;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{queue, QueueableCommand};
use std::io::{self, Write};
use unicode_width::UnicodeWidthChar;

/// ダンプ表の見出し行
pub const HEADER: &str =
    "OFFSET       +0 +1 +2 +3 +4 +5 +6 +7 +8 +9 +A +B +C +D +E +F 0123456789ABCDEF ";

/// ファイル名の表示幅
const FILENAME_WIDTH: usize = 35;
/// 先頭の表示行（タイトル2行 + 見出し）
const FIRST_DATA_LINE: u16 = 3;

/// UTF-8 表示の状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayMode {
    pub utf8: bool,
    /// 文字の切れ目をずらすバイト数（0〜3）
    pub phase: u8,
}

impl DisplayMode {
    pub fn toggle_utf8(&mut self) {
        self.utf8 = !self.utf8;
    }

    /// UTF-8 表示中のみ位相を進める
    pub fn cycle_phase(&mut self) {
        if self.utf8 {
            self.phase = (self.phase + 1) % 4;
        }
    }
}

/// ダンプ1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpRow {
    pub offset: String,
    pub hex: String,
    pub text: String,
}

/// 1画面分の表示内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub title: String,
    pub file_info: String,
    pub rows: Vec<DumpRow>,
    /// カーソル位置のバイト情報
    pub byte_info: String,
    pub status: Option<StatusMessage>,
    /// 入力中のプロンプト
    pub prompt: Option<String>,
    /// 端末上のカーソル位置 (列, 行)
    pub cursor: (u16, u16),
}

impl Frame {
    /// セッションの現在の状態から組み立てる
    pub fn compose(
        session: &Session,
        mode: DisplayMode,
        status: Option<StatusMessage>,
        prompt: Option<String>,
    ) -> Self {
        let buffer = session.buffer();
        let vp = session.viewport();
        let rows = (0..vp.rows())
            .map(|row| dump_row(buffer, vp.home().saturating_add(row * BYTES_PER_ROW), mode))
            .collect();
        let column = vp.col() / 2 * 3 + 13 + (vp.col() & 1);
        Self {
            title: title_line(mode, session.insert_mode()),
            file_info: file_line(session.filename(), buffer.len(), session.is_modified()),
            rows,
            byte_info: byte_info(buffer, session.cursor()),
            status,
            prompt,
            cursor: (column as u16, FIRST_DATA_LINE + vp.row() as u16),
        }
    }
}

/// 描画先
pub trait Renderer {
    fn draw(&mut self, frame: &Frame) -> io::Result<()>;

    /// 複数行のテキストを表示（マーク一覧など）
    fn show_text(&mut self, text: &str) -> io::Result<()>;
}

/// タイトル行
pub fn title_line(mode: DisplayMode, insert: bool) -> String {
    let utf8 = if mode.utf8 {
        mode.phase.to_string()
    } else {
        "off".to_string()
    };
    let edit = if insert { "insert   " } else { "overwrite" };
    format!(
        "bi version {}                   utf8mode:{}     {}",
        env!("CARGO_PKG_VERSION"),
        utf8,
        edit
    )
}

/// ファイル情報行
pub fn file_line(filename: &str, len: u64, modified: bool) -> String {
    let name: String = filename.chars().take(FILENAME_WIDTH).collect();
    format!(
        "file:[{:<width$}] length:{} bytes [{}modified]",
        name,
        len,
        if modified { "" } else { "not " },
        width = FILENAME_WIDTH
    )
}

/// `addr` から16バイトのダンプ行
pub fn dump_row(buffer: &MemoryBuffer, addr: Address, mode: DisplayMode) -> DumpRow {
    DumpRow {
        offset: format!("{:012X}", addr & 0xffff_ffff_ffff),
        hex: hex_cells(buffer, addr),
        text: text_column(buffer, addr, mode),
    }
}

/// 16進欄。末尾以降は `~~`
pub fn hex_cells(buffer: &MemoryBuffer, addr: Address) -> String {
    (0..BYTES_PER_ROW)
        .map(|i| {
            let a = addr.saturating_add(i);
            if a >= buffer.len() {
                "~~ ".to_string()
            } else {
                format!("{:02X} ", buffer.byte_at(a))
            }
        })
        .collect()
}

fn ascii_glyph(byte: u8) -> char {
    if (0x20..=0x7e).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}

/// 文字欄
///
/// UTF-8 表示では先頭バイトから文字を復号し、文字幅との差を空白で埋めて
/// バイト数と同じ桁数にそろえる
pub fn text_column(buffer: &MemoryBuffer, addr: Address, mode: DisplayMode) -> String {
    let mut out = String::new();
    let mut offset = 0;
    while offset < BYTES_PER_ROW {
        let a = addr.saturating_add(offset);
        if a >= buffer.len() {
            out.push('~');
            offset += 1;
            continue;
        }
        let lead = buffer.byte_at(a);
        let width = if mode.utf8 { utf8_width(lead) } else { 1 };
        if width == 1 {
            out.push(ascii_glyph(lead));
            offset += 1;
            continue;
        }
        let start = a.saturating_add(mode.phase as u64);
        let bytes = buffer.read(start, start.saturating_add(width - 1)).unwrap_or_default();
        match std::str::from_utf8(&bytes).ok().and_then(|s| s.chars().next()) {
            Some(ch) => {
                let cells = UnicodeWidthChar::width(ch).unwrap_or(1) as u64;
                out.push(ch);
                out.extend(std::iter::repeat(' ').take(width.saturating_sub(cells) as usize));
                offset += width;
            }
            None => {
                out.push('.');
                offset += 1;
            }
        }
    }
    out
}

/// 先頭バイトから見た UTF-8 の文字長（継続バイト等は 1）
fn utf8_width(lead: u8) -> u64 {
    match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 1,
    }
}

/// カーソル位置のバイトを16進・2進・8進・10進・文字で示す
pub fn byte_info(buffer: &MemoryBuffer, addr: Address) -> String {
    if addr >= buffer.len() {
        return format!("{:012X} : ~~", addr);
    }
    let value = buffer.byte_at(addr);
    let glyph = match value {
        v if v < 0x20 => format!("^{}", char::from(v + b'@')),
        v if v >= 0x7e => ".".to_string(),
        v => format!("'{}'", char::from(v)),
    };
    format!(
        "{:012X} : 0x{:02X} 0b{:08b} 0o{:03o} {} {}",
        addr, value, value, value, value, glyph
    )
}

/// 表示要素
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Title,
    FileInfo,
    Header,
    Offset,
    Hex,
    Text,
    Message,
    Error,
}

/// 配色
pub fn component_color(scheme: ColorScheme, component: Component) -> Color {
    let foreground = match scheme {
        ColorScheme::Dark => Color::White,
        ColorScheme::Light => Color::Black,
    };
    match component {
        Component::Title | Component::Text => Color::Cyan,
        Component::FileInfo | Component::Offset => Color::Magenta,
        Component::Header | Component::Message => Color::Blue,
        Component::Error => Color::Yellow,
        Component::Hex => foreground,
    }
}

/// crossterm による端末描画
pub struct TerminalRenderer<W: Write> {
    out: W,
    scheme: ColorScheme,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, scheme: ColorScheme) -> Self {
        Self { out, scheme }
    }

    fn line(&mut self, y: u16, component: Component, text: &str) -> io::Result<()> {
        queue!(
            self.out,
            MoveTo(0, y),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(component_color(self.scheme, component)),
            Print(text)
        )
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        self.out.queue(Hide)?;
        self.line(0, Component::Title, &frame.title)?;
        self.line(1, Component::FileInfo, &frame.file_info)?;
        self.line(2, Component::Header, HEADER)?;

        let mut y = FIRST_DATA_LINE;
        for row in &frame.rows {
            self.line(y, Component::Offset, &format!("{} ", row.offset))?;
            queue!(
                self.out,
                SetForegroundColor(component_color(self.scheme, Component::Hex)),
                Print(&row.hex),
                SetForegroundColor(component_color(self.scheme, Component::Text)),
                Print(&row.text)
            )?;
            y += 1;
        }

        // 2行のメッセージ（`?` の表示）はバイト情報の行も使う
        let mut info_line = Some(frame.byte_info.as_str());
        match (&frame.prompt, &frame.status) {
            (Some(prompt), _) => self.line(y, Component::Message, prompt)?,
            (None, Some(status)) => {
                let component = match status.level {
                    ErrorLevel::Info => Component::Message,
                    _ => Component::Error,
                };
                let mut lines = status.text.lines();
                self.line(y, component, &format!(" {}", lines.next().unwrap_or("")))?;
                if let Some(second) = lines.next() {
                    self.line(y + 1, component, &format!(" {}", second))?;
                    info_line = None;
                }
            }
            (None, None) => self.line(y, Component::Message, "")?,
        }
        if let Some(info) = info_line {
            self.line(y + 1, Component::Title, info)?;
        }

        let cursor = match &frame.prompt {
            Some(prompt) => MoveTo(prompt.chars().count() as u16, y),
            None => MoveTo(frame.cursor.0, frame.cursor.1),
        };
        queue!(self.out, ResetColor, cursor, Show)?;
        self.out.flush()
    }

    fn show_text(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0), ResetColor)?;
        for (y, line) in text.lines().enumerate() {
            queue!(self.out, MoveTo(0, y as u16), Print(line))?;
        }
        self.out.flush()
    }
}
