//! コマンド行の字句解析
//!
//! 1行を `Command` に変換する。アドレス式はこの段階で評価し、
//! 実行時には値だけを扱う

use crate::address::{ExprContext, Evaluator, RangeSpec, Scanner};
use crate::buffer::Address;
use crate::editor::bit_ops::{LogicOp, ShiftDirection, ShiftSpec};
use crate::error::{BiError, FileError, Result};

/// 検索パターン
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPattern {
    /// `/regex`
    Regex(String),
    /// `//hex …`
    Literal(Vec<u8>),
}

/// `y` の対象
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YankSource {
    /// 解決済みの範囲
    Range,
    /// 範囲指定なしで与えられたバイト列（空ならレジスタを空にする）
    Bytes(Vec<u8>),
}

/// 範囲付きコマンドの操作部
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeOp {
    /// 後続コマンドなし
    Jump,
    Yank(YankSource),
    Paste { insert: bool },
    Mark(char),
    ReadFile { path: String, insert: bool },
    Delete,
    WriteRange(String),
    Substitute {
        pattern: Option<SearchPattern>,
        replacement: Vec<u8>,
    },
    Not,
    Fill { pattern: Vec<u8>, count: u64, insert: bool },
    Copy { dest: Address, insert: bool },
    Move { dest: Address },
    Logic { op: LogicOp, operand: u8 },
    Shift(ShiftSpec),
}

/// 解析済みのコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 何もしない（空行など）
    Empty,
    Quit { force: bool },
    WriteQuit,
    /// `w` / `w file`
    Write(Option<String>),
    /// 開いているファイルを読み直す
    Reload,
    RunScript { path: String, verbose: bool },
    SearchNext,
    SearchPrev,
    Shell(String),
    PrintValue(Address),
    Search(SearchPattern),
    Ranged { spec: RangeSpec, op: RangeOp },
}

/// コメントとエスケープを処理する
///
/// `#` 以降（直前の空白を含む）を捨て、`\#` を `#`、`\n` を改行に置き換える
pub fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '#' => {
                let kept = out.trim_end_matches(' ').len();
                out.truncate(kept);
                break;
            }
            '\\' if chars.peek() == Some(&'#') => {
                chars.next();
                out.push('#');
            }
            '\\' if chars.peek() == Some(&'n') => {
                chars.next();
                out.push('\n');
            }
            other => out.push(other),
        }
    }
    out
}

/// コマンド行の解析器
pub struct CommandParser<'a> {
    eval: Evaluator<'a>,
}

impl<'a> CommandParser<'a> {
    pub fn new(ctx: ExprContext<'a>) -> Self {
        Self {
            eval: Evaluator::new(ctx),
        }
    }

    /// コメント除去済みの1行を解析
    pub fn parse(&self, line: &str) -> Result<Command> {
        if let Some(command) = self.parse_whole_line(line)? {
            return Ok(command);
        }
        self.parse_ranged(line)
    }

    /// 範囲解析より先に判定する行全体のコマンド
    fn parse_whole_line(&self, line: &str) -> Result<Option<Command>> {
        let command = match line {
            "" => Command::Empty,
            "q" => Command::Quit { force: false },
            "q!" => Command::Quit { force: true },
            "wq" | "wq!" => Command::WriteQuit,
            "w" => Command::Write(None),
            "r" => Command::Reload,
            _ => {
                let mut chars = line.chars();
                let Some(first) = chars.next() else {
                    return Ok(Some(Command::Empty));
                };
                let rest = chars.as_str();
                match first {
                    'w' => Command::Write(Some(rest.trim_start().to_string())),
                    'T' | 't' => {
                        let path = rest.trim_start();
                        if path.is_empty() {
                            return Err(BiError::InvalidExpression(
                                "Specify script file name.".to_string(),
                            ));
                        }
                        Command::RunScript {
                            path: path.to_string(),
                            verbose: first == 'T',
                        }
                    }
                    'n' => Command::SearchNext,
                    'N' => Command::SearchPrev,
                    '!' if rest.is_empty() => Command::Empty,
                    '!' => Command::Shell(rest.to_string()),
                    '?' => match self.eval.evaluate(rest, 0)?.value {
                        Some(value) => Command::PrintValue(value),
                        None => Command::Empty,
                    },
                    '/' => self.parse_search(line)?,
                    _ => return Ok(None),
                }
            }
        };
        Ok(Some(command))
    }

    fn parse_search(&self, line: &str) -> Result<Command> {
        let mut s = Scanner::new(line);
        s.bump();
        if s.eat('/') {
            if s.is_at_end() {
                return Ok(Command::Empty);
            }
            return Ok(Command::Search(SearchPattern::Literal(self.hex_list(&mut s)?)));
        }
        if s.is_at_end() {
            return Ok(Command::Empty);
        }
        Ok(Command::Search(SearchPattern::Regex(restricted_text(&mut s))))
    }

    fn parse_ranged(&self, line: &str) -> Result<Command> {
        let mut s = Scanner::new(line);
        let spec = self.eval.resolve_range(&mut s)?;
        s.skip_spaces();

        if s.is_at_end() {
            // `0,3d` の末尾 `d` は終了アドレスの16進数字ではなく削除コマンドとして扱う。
            // `10d` のように終了アドレスがなければ通常のジャンプ
            if let Some(prefix) = trailing_delete_prefix(line) {
                let mut p = Scanner::new(prefix);
                let spec = self.eval.resolve_range(&mut p)?;
                p.skip_spaces();
                if p.is_at_end() && spec.end_given {
                    return Ok(Command::Ranged {
                        spec,
                        op: RangeOp::Delete,
                    });
                }
            }
            return Ok(Command::Ranged {
                spec,
                op: RangeOp::Jump,
            });
        }

        let op = self.parse_op(line, &mut s, &spec)?;
        Ok(Command::Ranged { spec, op })
    }

    fn parse_op(&self, line: &str, s: &mut Scanner, spec: &RangeSpec) -> Result<RangeOp> {
        let unrecognized = || BiError::UnrecognizedCommand(line.to_string());
        let Some(ch) = s.bump() else {
            return Ok(RangeOp::Jump);
        };

        let op = match ch {
            'y' => {
                if spec.is_implicit() {
                    RangeOp::Yank(YankSource::Bytes(self.text_or_hex(s)?))
                } else {
                    RangeOp::Yank(YankSource::Range)
                }
            }
            'p' => RangeOp::Paste { insert: false },
            'P' => RangeOp::Paste { insert: true },
            'm' => match s.bump() {
                Some(letter) if letter.is_ascii_lowercase() => RangeOp::Mark(letter),
                _ => return Err(BiError::invalid_parameter()),
            },
            'r' | 'R' => {
                let path = s.take_rest().trim_start().to_string();
                if path.is_empty() {
                    return Err(FileError::MissingName.into());
                }
                RangeOp::ReadFile {
                    path,
                    insert: ch == 'R',
                }
            }
            'd' => RangeOp::Delete,
            'w' => RangeOp::WriteRange(s.take_rest().trim_start().to_string()),
            's' => self.parse_substitute(s)?,
            '~' => RangeOp::Not,
            'i' | 'I' => self.parse_fill(s, ch == 'I')?,
            '<' | '>' => self.parse_shift(s, ch)?,
            'c' | 'C' | 'v' | '&' | '|' | '^' => {
                let operand = self
                    .eval
                    .expression(s)?
                    .ok_or_else(BiError::invalid_parameter)?;
                match ch {
                    'c' => RangeOp::Copy {
                        dest: operand,
                        insert: false,
                    },
                    'C' => RangeOp::Copy {
                        dest: operand,
                        insert: true,
                    },
                    'v' => RangeOp::Move { dest: operand },
                    '&' => RangeOp::Logic {
                        op: LogicOp::And,
                        operand: operand as u8,
                    },
                    '|' => RangeOp::Logic {
                        op: LogicOp::Or,
                        operand: operand as u8,
                    },
                    _ => RangeOp::Logic {
                        op: LogicOp::Xor,
                        operand: operand as u8,
                    },
                }
            }
            _ => return Err(unrecognized()),
        };
        Ok(op)
    }

    fn parse_substitute(&self, s: &mut Scanner) -> Result<RangeOp> {
        s.skip_spaces();
        let pattern = if s.eat('/') {
            match s.peek() {
                Some('/') => {
                    s.bump();
                    Some(SearchPattern::Literal(self.hex_list(s)?))
                }
                Some(_) => Some(SearchPattern::Regex(restricted_text(s))),
                None => return Err(BiError::invalid_syntax()),
            }
        } else {
            None
        };
        let replacement = self.text_or_hex(s)?;
        Ok(RangeOp::Substitute {
            pattern,
            replacement,
        })
    }

    fn parse_fill(&self, s: &mut Scanner, insert: bool) -> Result<RangeOp> {
        s.skip_spaces();
        let pattern = if s.eat('/') {
            let text = restricted_text(s);
            s.eat('/');
            text.into_bytes()
        } else {
            self.hex_list(s)?
        };

        s.skip_spaces();
        let count = if s.eat('*') {
            self.eval
                .expression(s)?
                .ok_or_else(BiError::invalid_syntax)?
        } else {
            1
        };
        Ok(RangeOp::Fill {
            pattern,
            count,
            insert,
        })
    }

    fn parse_shift(&self, s: &mut Scanner, ch: char) -> Result<RangeOp> {
        let multibyte = s.eat(ch);
        let times = self.eval.expression(s)?.unwrap_or(1);
        s.skip_spaces();
        let carry = if s.eat(',') {
            match self.eval.expression(s)? {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            }
        } else {
            None
        };
        let direction = if ch == '<' {
            ShiftDirection::Left
        } else {
            ShiftDirection::Right
        };
        Ok(RangeOp::Shift(ShiftSpec {
            direction,
            multibyte,
            times,
            carry,
        }))
    }

    /// 式を空白区切りで読めるだけ読み、各値の下位8ビットを並べる
    pub fn hex_list(&self, s: &mut Scanner) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        while !s.is_at_end() {
            match self.eval.expression(s)? {
                Some(value) => bytes.push((value & 0xff) as u8),
                None => break,
            }
        }
        Ok(bytes)
    }

    /// `/text` または `//hex …`。どちらでもなければ空
    pub fn text_or_hex(&self, s: &mut Scanner) -> Result<Vec<u8>> {
        s.skip_spaces();
        if !s.eat('/') {
            return Ok(Vec::new());
        }
        if s.eat('/') {
            self.hex_list(s)
        } else {
            Ok(restricted_text(s).into_bytes())
        }
    }
}

/// `/` までの文字列を読む（`/` は消費しない）
///
/// `\/` は `/`、`\\` はそのまま、行末の `\` は捨てる
pub fn restricted_text(s: &mut Scanner) -> String {
    let mut text = String::new();
    while let Some(ch) = s.peek() {
        match (ch, s.peek_at(1)) {
            ('/', _) => break,
            ('\\', Some('\\')) => {
                text.push_str("\\\\");
                s.bump();
                s.bump();
            }
            ('\\', Some('/')) => {
                text.push('/');
                s.bump();
                s.bump();
            }
            ('\\', None) => {
                s.bump();
                break;
            }
            (other, _) => {
                text.push(other);
                s.bump();
            }
        }
    }
    text
}

/// 末尾が16進数字直後の `d` なら、`d` を除いた部分を返す
fn trailing_delete_prefix(line: &str) -> Option<&str> {
    let prefix = line.strip_suffix('d')?;
    prefix
        .chars()
        .last()
        .filter(|c| c.is_ascii_hexdigit())
        .map(|_| prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{MarkSet, Range};

    fn parse_with(line: &str, marks: &MarkSet) -> Result<Command> {
        let parser = CommandParser::new(ExprContext {
            buffer_len: 0x100,
            cursor: 0x10,
            marks,
        });
        parser.parse(&strip_comment(line))
    }

    fn parse(line: &str) -> Result<Command> {
        parse_with(line, &MarkSet::new())
    }

    fn ranged(line: &str) -> (RangeSpec, RangeOp) {
        match parse(line).unwrap() {
            Command::Ranged { spec, op } => (spec, op),
            other => panic!("expected ranged command, got {:?}", other),
        }
    }

    #[test]
    fn comments_and_escapes() {
        assert_eq!(strip_comment("i/a\\#b # note"), "i/a#b");
        assert_eq!(strip_comment("0,3d   # drop"), "0,3d");
        assert_eq!(strip_comment("i/x\\ny"), "i/x\ny");
        assert_eq!(strip_comment("# only"), "");
    }

    #[test]
    fn whole_line_commands() {
        assert_eq!(parse("q").unwrap(), Command::Quit { force: false });
        assert_eq!(parse("q!").unwrap(), Command::Quit { force: true });
        assert_eq!(parse("wq!").unwrap(), Command::WriteQuit);
        assert_eq!(parse("w").unwrap(), Command::Write(None));
        assert_eq!(
            parse("w  out.bin").unwrap(),
            Command::Write(Some("out.bin".to_string()))
        );
        assert_eq!(parse("r").unwrap(), Command::Reload);
        assert_eq!(parse("n").unwrap(), Command::SearchNext);
        assert_eq!(parse("N").unwrap(), Command::SearchPrev);
        assert_eq!(parse("?%10").unwrap(), Command::PrintValue(10));
        assert_eq!(parse("").unwrap(), Command::Empty);
        assert_eq!(
            parse("T run.bi").unwrap(),
            Command::RunScript {
                path: "run.bi".to_string(),
                verbose: true
            }
        );
        assert!(parse("t").is_err());
    }

    #[test]
    fn search_forms() {
        assert_eq!(
            parse("/ab+c").unwrap(),
            Command::Search(SearchPattern::Regex("ab+c".to_string()))
        );
        assert_eq!(
            parse("//41 42 %67").unwrap(),
            Command::Search(SearchPattern::Literal(vec![0x41, 0x42, 67]))
        );
        assert_eq!(parse("/").unwrap(), Command::Empty);
    }

    #[test]
    fn trailing_d_after_end_address_is_delete() {
        let (spec, op) = ranged("0,3d");
        assert_eq!(op, RangeOp::Delete);
        assert_eq!(spec.range, Range::new(0, 3));

        let (spec, op) = ranged("5d");
        assert_eq!(op, RangeOp::Jump);
        assert_eq!(spec.range, Range::single(0x5d));

        let (spec, op) = ranged("dead");
        assert_eq!(op, RangeOp::Jump);
        assert_eq!(spec.range, Range::single(0xdead));

        let (spec, op) = ranged("d");
        assert_eq!(op, RangeOp::Jump);
        assert_eq!(spec.range, Range::single(0xd));

        let (spec, op) = ranged("0,3 d");
        assert_eq!(op, RangeOp::Delete);
        assert_eq!(spec.range, Range::new(0, 3));
    }

    #[test]
    fn logic_and_copy_operands() {
        let (spec, op) = ranged("2,5&0F");
        assert_eq!(spec.range, Range::new(2, 5));
        assert_eq!(
            op,
            RangeOp::Logic {
                op: LogicOp::And,
                operand: 0x0f
            }
        );
        assert_eq!(ranged("0,3 C 20").1, RangeOp::Copy { dest: 0x20, insert: true });
        assert!(matches!(parse("0,3v"), Err(BiError::InvalidExpression(_))));
    }

    #[test]
    fn yank_operands() {
        assert_eq!(
            ranged("y/AB").1,
            RangeOp::Yank(YankSource::Bytes(b"AB".to_vec()))
        );
        assert_eq!(
            ranged("y//58 59").1,
            RangeOp::Yank(YankSource::Bytes(vec![0x58, 0x59]))
        );
        assert_eq!(ranged("y").1, RangeOp::Yank(YankSource::Bytes(Vec::new())));
        assert_eq!(ranged("0,3y").1, RangeOp::Yank(YankSource::Range));
    }

    #[test]
    fn fill_operands() {
        assert_eq!(
            ranged("i/ab/*3").1,
            RangeOp::Fill {
                pattern: b"ab".to_vec(),
                count: 3,
                insert: false
            }
        );
        assert_eq!(
            ranged("10I 00 ff * 2").1,
            RangeOp::Fill {
                pattern: vec![0x00, 0xff],
                count: 2,
                insert: true
            }
        );
        assert!(parse("i/ab/*").is_err());
    }

    #[test]
    fn shift_forms() {
        assert_eq!(
            ranged("0,3<<2,1").1,
            RangeOp::Shift(ShiftSpec {
                direction: ShiftDirection::Left,
                multibyte: true,
                times: 2,
                carry: Some(true)
            })
        );
        assert_eq!(
            ranged(">").1,
            RangeOp::Shift(ShiftSpec {
                direction: ShiftDirection::Right,
                multibyte: false,
                times: 1,
                carry: None
            })
        );
    }

    #[test]
    fn substitute_forms() {
        assert_eq!(
            ranged("s/a.c/xy").1,
            RangeOp::Substitute {
                pattern: Some(SearchPattern::Regex("a.c".to_string())),
                replacement: b"xy".to_vec()
            }
        );
        assert_eq!(
            ranged("s//0d 0a//0a").1,
            RangeOp::Substitute {
                pattern: Some(SearchPattern::Literal(vec![0x0d, 0x0a])),
                replacement: vec![0x0a]
            }
        );
        assert_eq!(
            ranged("s").1,
            RangeOp::Substitute {
                pattern: None,
                replacement: Vec::new()
            }
        );
        assert!(parse("s/").is_err());
    }

    #[test]
    fn restricted_text_escapes() {
        let mut s = Scanner::new("a\\/b/rest");
        assert_eq!(restricted_text(&mut s), "a/b");
        assert_eq!(s.peek(), Some('/'));
    }

    #[test]
    fn marks_and_errors() {
        let mut marks = MarkSet::new();
        marks.set('a', 2);
        match parse_with("'a", &marks).unwrap() {
            Command::Ranged { spec, op } => {
                assert_eq!(op, RangeOp::Jump);
                assert_eq!(spec.range, Range::single(2));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(ranged("mz").1, RangeOp::Mark('z'));
        assert_eq!(parse("'b"), Err(BiError::UnknownMark('b')));
        assert!(matches!(parse("@print"), Err(BiError::UnrecognizedCommand(_))));
        assert!(matches!(parse("0 r"), Err(BiError::File(FileError::MissingName))));
    }
}
