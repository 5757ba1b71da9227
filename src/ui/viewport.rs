//! ビューポート管理
//!
//! 表示開始アドレスと画面上のカーソル位置（ニブル単位の列・行）を管理する。

use crate::buffer::Address;

/// 1行のバイト数
pub const BYTES_PER_ROW: u64 = 16;
/// 既定の表示行数
pub const DEFAULT_ROWS: u64 = 19;
/// 1行のニブル列数
const NIBBLE_COLUMNS: u64 = BYTES_PER_ROW * 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// 画面左上のアドレス
    home: Address,
    /// ニブル列（0..32）
    col: u64,
    /// 行（0..rows）
    row: u64,
    /// 表示行数
    rows: u64,
}

impl Viewport {
    pub fn new(rows: u64) -> Self {
        Self {
            home: 0,
            col: 0,
            row: 0,
            rows: rows.max(1),
        }
    }

    /// 画面に収まるバイト数
    pub fn bytes_on_screen(&self) -> u64 {
        self.rows * BYTES_PER_ROW
    }

    pub fn home(&self) -> Address {
        self.home
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn col(&self) -> u64 {
        self.col
    }

    pub fn row(&self) -> u64 {
        self.row
    }

    /// 下位ニブル上にいるか
    pub fn on_low_nibble(&self) -> bool {
        self.col & 1 == 1
    }

    /// カーソルのアドレス
    pub fn cursor(&self) -> Address {
        self.home
            .saturating_add(self.col / 2)
            .saturating_add(self.row * BYTES_PER_ROW)
    }

    /// `addr` にカーソルを移動
    ///
    /// 画面外なら `addr & !0xff` を表示開始アドレスにする
    pub fn jump(&mut self, addr: Address) {
        if addr < self.home || addr >= self.home.saturating_add(self.bytes_on_screen()) {
            self.home = addr & !0xff;
        }
        let offset = addr - self.home;
        self.col = (offset % BYTES_PER_ROW) * 2;
        self.row = offset / BYTES_PER_ROW;
    }

    pub fn scroll_up(&mut self) {
        if self.home >= BYTES_PER_ROW {
            self.home -= BYTES_PER_ROW;
        }
    }

    pub fn scroll_down(&mut self) {
        self.home = self.home.saturating_add(BYTES_PER_ROW);
    }

    /// 表示開始アドレスを `bytes` 戻す（0 で止まる）
    pub fn page_back(&mut self, bytes: u64) {
        self.home = self.home.saturating_sub(bytes);
    }

    pub fn page_forward(&mut self, bytes: u64) {
        self.home = self.home.saturating_add(bytes);
    }

    /// 1ニブル右へ。行末で次の行へ、最下行ならスクロール
    pub fn next_nibble(&mut self) {
        if self.col < NIBBLE_COLUMNS - 1 {
            self.col += 1;
        } else {
            self.col = 0;
            self.line_down();
        }
    }

    /// 1ニブル左へ。アドレス 0 の先頭では動かない
    pub fn prev_nibble(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.cursor() != 0 {
            self.col = NIBBLE_COLUMNS - 1;
            self.line_up();
        }
    }

    pub fn line_down(&mut self) {
        if self.row < self.rows - 1 {
            self.row += 1;
        } else {
            self.scroll_down();
        }
    }

    pub fn line_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
        } else {
            self.scroll_up();
        }
    }

    pub fn row_start(&mut self) {
        self.col = 0;
    }

    /// 行末バイトの上位ニブルへ
    pub fn row_end(&mut self) {
        self.col = NIBBLE_COLUMNS - 2;
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_within_screen_keeps_home() {
        let mut vp = Viewport::default();
        vp.jump(0x25);
        assert_eq!(vp.home(), 0);
        assert_eq!((vp.col(), vp.row()), (10, 2));
        assert_eq!(vp.cursor(), 0x25);
    }

    #[test]
    fn jump_off_screen_rehomes() {
        let mut vp = Viewport::default();
        vp.jump(0x1234);
        assert_eq!(vp.home(), 0x1200);
        assert_eq!(vp.cursor(), 0x1234);
        vp.jump(0x10);
        assert_eq!(vp.home(), 0);
    }

    #[test]
    fn nibble_motion_wraps_rows() {
        let mut vp = Viewport::default();
        vp.jump(0x0f);
        vp.next_nibble();
        vp.next_nibble();
        assert_eq!(vp.cursor(), 0x10);
        assert!(!vp.on_low_nibble());
        vp.prev_nibble();
        assert_eq!(vp.cursor(), 0x0f);
        assert!(vp.on_low_nibble());
    }

    #[test]
    fn prev_nibble_stops_at_origin() {
        let mut vp = Viewport::default();
        vp.prev_nibble();
        assert_eq!(vp.cursor(), 0);
        assert_eq!(vp.col(), 0);
    }

    #[test]
    fn line_down_scrolls_at_bottom() {
        let mut vp = Viewport::new(2);
        vp.line_down();
        vp.line_down();
        assert_eq!(vp.home(), 0x10);
        assert_eq!(vp.cursor(), 0x20);
    }
}
