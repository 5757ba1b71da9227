//! コマンド行の字句走査

/// 文字単位で前進するコマンド行スキャナ
#[derive(Debug, Clone)]
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    pub fn new(text: &str) -> Self {
        Self::at(text, 0)
    }

    /// 文字位置 `pos` から走査を開始
    pub fn at(text: &str, pos: usize) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let pos = pos.min(chars.len());
        Self { chars, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    /// 次の文字が `expected` なら消費する
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// 空白（スペースのみ）を読み飛ばす
    pub fn skip_spaces(&mut self) {
        while self.peek() == Some(' ') {
            self.pos += 1;
        }
    }

    /// 残りの文字列を取り出して末尾まで進める
    pub fn take_rest(&mut self) -> String {
        let rest: String = self.chars[self.pos..].iter().collect();
        self.pos = self.chars.len();
        rest
    }

    /// 述語を満たす間だけ読み進める
    pub fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let mut taken = String::new();
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            taken.push(ch);
            self.pos += 1;
        }
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_multibyte_text_by_char() {
        let mut scanner = Scanner::new("/あい");
        assert!(scanner.eat('/'));
        assert_eq!(scanner.take_rest(), "あい");
        assert!(scanner.is_at_end());
    }

    #[test]
    fn take_while_stops_at_predicate() {
        let mut scanner = Scanner::new("12ab zz");
        assert_eq!(scanner.take_while(|c| c.is_ascii_hexdigit()), "12ab");
        scanner.skip_spaces();
        assert_eq!(scanner.peek(), Some('z'));
    }
}
