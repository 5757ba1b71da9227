//! UIモジュール
//!
//! 16バイト/行の16進ダンプ画面と表示位置の管理

pub mod renderer;
pub mod viewport;

// 公開API
pub use renderer::{DisplayMode, Frame, Renderer, TerminalRenderer};
pub use viewport::{Viewport, BYTES_PER_ROW, DEFAULT_ROWS};
