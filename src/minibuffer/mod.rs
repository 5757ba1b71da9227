//! ミニバッファ
//!
//! 画面最下行で `:` コマンドと `/` 検索語を1行入力する

pub mod history;

pub use history::SessionHistory;

/// プロンプトの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// `:` コマンド行
    Command,
    /// `/` 検索
    Search,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Command => ":",
            PromptKind::Search => "/",
        }
    }
}

/// 1キー処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    /// 入力確定。`/` 検索では先頭の `/` を付けたコマンド行
    Completed(String),
    Cancelled,
    InProgress,
}

/// プロンプトへの入力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKey {
    Char(char),
    Backspace,
    Enter,
    Escape,
    HistoryPrev,
    HistoryNext,
}

/// 行入力の状態と履歴
#[derive(Debug, Default)]
pub struct Minibuffer {
    active: Option<PromptKind>,
    input: String,
    /// 履歴参照位置（`None` は編集中の行）
    cursor: Option<usize>,
    /// 履歴参照前の入力
    draft: String,
    commands: SessionHistory,
    searches: SessionHistory,
}

impl Minibuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, kind: PromptKind) {
        self.active = Some(kind);
        self.input.clear();
        self.draft.clear();
        self.cursor = None;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn kind(&self) -> Option<PromptKind> {
        self.active
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// 表示用（プロンプト記号 + 入力）
    pub fn display_string(&self) -> Option<String> {
        self.active
            .map(|kind| format!("{}{}", kind.label(), self.input))
    }

    pub fn history(&self, kind: PromptKind) -> &SessionHistory {
        match kind {
            PromptKind::Command => &self.commands,
            PromptKind::Search => &self.searches,
        }
    }

    /// 1キーを処理
    pub fn handle(&mut self, key: PromptKey) -> PromptResult {
        let Some(kind) = self.active else {
            return PromptResult::Cancelled;
        };
        match key {
            PromptKey::Char(ch) => {
                self.input.push(ch);
                self.cursor = None;
                PromptResult::InProgress
            }
            PromptKey::Backspace => {
                // 空のときの BS は入力を取り消す
                if self.input.pop().is_none() {
                    self.end();
                    return PromptResult::Cancelled;
                }
                PromptResult::InProgress
            }
            PromptKey::Escape => {
                self.end();
                PromptResult::Cancelled
            }
            PromptKey::Enter => {
                let line = std::mem::take(&mut self.input);
                self.history_mut(kind).add_entry(&line);
                self.end();
                match kind {
                    PromptKind::Command => PromptResult::Completed(line),
                    PromptKind::Search => PromptResult::Completed(format!("/{}", line)),
                }
            }
            PromptKey::HistoryPrev => {
                let next = self.cursor.map_or(0, |i| i + 1);
                if next < self.history(kind).len() {
                    if self.cursor.is_none() {
                        self.draft = self.input.clone();
                    }
                    self.recall(kind, next);
                }
                PromptResult::InProgress
            }
            PromptKey::HistoryNext => {
                match self.cursor {
                    Some(0) => {
                        self.cursor = None;
                        self.input = std::mem::take(&mut self.draft);
                    }
                    Some(i) => self.recall(kind, i - 1),
                    None => {}
                }
                PromptResult::InProgress
            }
        }
    }

    fn recall(&mut self, kind: PromptKind, index: usize) {
        if let Some(entry) = self.history(kind).get_entry(index).map(str::to_string) {
            self.input = entry;
            self.cursor = Some(index);
        }
    }

    fn history_mut(&mut self, kind: PromptKind) -> &mut SessionHistory {
        match kind {
            PromptKind::Command => &mut self.commands,
            PromptKind::Search => &mut self.searches,
        }
    }

    fn end(&mut self) {
        self.active = None;
        self.input.clear();
        self.draft.clear();
        self.cursor = None;
    }
}
