//! アドレス式の評価
//!
//! `$` `.` `'a` `{0x10}` `%16` `1f` などのトークンをアドレスに変換する。
//! 式は値1つ、または `+`/`-` による二項演算1回のみ

pub mod marks;
pub mod range;
pub mod scanner;

pub use marks::MarkSet;
pub use range::{Range, RangeSpec};
pub use scanner::Scanner;

use crate::buffer::Address;
use crate::error::{BiError, Result};

/// 式評価に必要なセッション状態の参照
#[derive(Debug, Clone, Copy)]
pub struct ExprContext<'a> {
    /// バッファ長
    pub buffer_len: u64,
    /// カーソル位置
    pub cursor: Address,
    /// マーク集合
    pub marks: &'a MarkSet,
}

/// 評価結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluated {
    /// 値（未指定なら `None`）
    pub value: Option<Address>,
    /// 次の走査位置（文字単位）
    pub next: usize,
}

/// アドレス式の評価器
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    ctx: ExprContext<'a>,
}

impl<'a> Evaluator<'a> {
    pub fn new(ctx: ExprContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ExprContext<'a> {
        &self.ctx
    }

    /// `text` の文字位置 `pos` から式を1つ評価
    pub fn evaluate(&self, text: &str, pos: usize) -> Result<Evaluated> {
        let mut scanner = Scanner::at(text, pos);
        let value = self.expression(&mut scanner)?;
        Ok(Evaluated {
            value,
            next: scanner.pos(),
        })
    }

    /// 値1つ、または `値(+|-)値`
    pub fn expression(&self, s: &mut Scanner) -> Result<Option<Address>> {
        let Some(x) = self.value(s)? else {
            return Ok(None);
        };

        match s.peek() {
            Some('+') => {
                s.bump();
                let y = self.operand(s)?;
                x.checked_add(y).map(Some).ok_or_else(BiError::address_overflow)
            }
            Some('-') => {
                s.bump();
                let y = self.operand(s)?;
                Ok(Some(x.saturating_sub(y)))
            }
            _ => Ok(Some(x)),
        }
    }

    fn operand(&self, s: &mut Scanner) -> Result<Address> {
        self.value(s)?
            .ok_or_else(|| BiError::InvalidExpression("Missing operand.".to_string()))
    }

    /// 単一トークンを評価。該当しなければ何も消費せず `None`
    pub fn value(&self, s: &mut Scanner) -> Result<Option<Address>> {
        s.skip_spaces();
        let Some(ch) = s.peek() else {
            return Ok(None);
        };

        match ch {
            '$' => {
                s.bump();
                Ok(Some(self.ctx.buffer_len.saturating_sub(1)))
            }
            '{' => {
                s.bump();
                let mut literal = String::new();
                loop {
                    match s.bump() {
                        Some('}') => break,
                        Some(c) => literal.push(c),
                        None => {
                            return Err(BiError::InvalidExpression(
                                "Unterminated '{'.".to_string(),
                            ))
                        }
                    }
                }
                parse_integer_literal(&literal).map(Some)
            }
            '.' => {
                s.bump();
                Ok(Some(self.ctx.cursor))
            }
            '\'' => {
                let Some(letter) = s.peek_at(1).filter(|c| MarkSet::is_mark_name(*c)) else {
                    return Ok(None);
                };
                match self.ctx.marks.get(letter) {
                    Some(addr) => {
                        s.bump();
                        s.bump();
                        Ok(Some(addr))
                    }
                    None => Err(BiError::UnknownMark(letter)),
                }
            }
            c if c.is_ascii_hexdigit() => {
                let digits = s.take_while(|c| c.is_ascii_hexdigit());
                parse_radix(&digits, 16).map(Some)
            }
            '%' => {
                s.bump();
                let digits = s.take_while(|c| c.is_ascii_digit());
                if digits.is_empty() {
                    return Ok(Some(0));
                }
                parse_radix(&digits, 10).map(Some)
            }
            _ => Ok(None),
        }
    }
}

fn parse_radix(digits: &str, radix: u32) -> Result<Address> {
    u64::from_str_radix(digits, radix)
        .map_err(|_| BiError::InvalidExpression(format!("Number too large: {}", digits)))
}

/// `{…}` 内の整数リテラル（`0x` 16進、先頭 `0` 8進、それ以外10進）
pub fn parse_integer_literal(text: &str) -> Result<Address> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        u64::from_str_radix(&text[1..], 8)
    } else {
        text.parse::<u64>()
    };
    parsed.map_err(|_| BiError::InvalidExpression(format!("Invalid expression: {{{}}}", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_with(text: &str, len: u64, cursor: Address, marks: &MarkSet) -> Result<Evaluated> {
        let evaluator = Evaluator::new(ExprContext {
            buffer_len: len,
            cursor,
            marks,
        });
        evaluator.evaluate(text, 0)
    }

    fn eval(text: &str) -> Result<Evaluated> {
        eval_with(text, 0x100, 0x20, &MarkSet::new())
    }

    #[test]
    fn hex_run_is_greedy() {
        let result = eval("1fz").unwrap();
        assert_eq!(result.value, Some(0x1f));
        assert_eq!(result.next, 2);
    }

    #[test]
    fn dollar_is_last_address() {
        assert_eq!(eval("$").unwrap().value, Some(0xff));
        let marks = MarkSet::new();
        assert_eq!(eval_with("$", 0, 0, &marks).unwrap().value, Some(0));
    }

    #[test]
    fn cursor_and_decimal_tokens() {
        assert_eq!(eval(".").unwrap().value, Some(0x20));
        assert_eq!(eval("%100").unwrap().value, Some(100));
        assert_eq!(eval("  %").unwrap().value, Some(0));
    }

    #[test]
    fn brace_literals_detect_base() {
        assert_eq!(eval("{0x10}").unwrap().value, Some(16));
        assert_eq!(eval("{017}").unwrap().value, Some(15));
        assert_eq!(eval("{ 42 }").unwrap().value, Some(42));
        assert_eq!(eval("{0}").unwrap().value, Some(0));
    }

    #[test]
    fn malformed_brace_literal_is_invalid_expression() {
        assert!(matches!(eval("{12z}"), Err(BiError::InvalidExpression(_))));
        assert!(matches!(eval("{089}"), Err(BiError::InvalidExpression(_))));
        assert!(matches!(eval("{10"), Err(BiError::InvalidExpression(_))));
    }

    #[test]
    fn marks_resolve_or_signal() {
        let mut marks = MarkSet::new();
        marks.set('a', 2);
        assert_eq!(eval_with("'a", 10, 0, &marks).unwrap().value, Some(2));
        assert_eq!(eval_with("'b", 10, 0, &marks), Err(BiError::UnknownMark('b')));
    }

    #[test]
    fn single_binary_operation() {
        assert_eq!(eval("10+%10").unwrap().value, Some(0x1a));
        assert_eq!(eval("5-10").unwrap().value, Some(0));
        let chained = eval("1+1+1").unwrap();
        assert_eq!(chained.value, Some(2));
        assert_eq!(chained.next, 3);
    }

    #[test]
    fn addition_overflow_is_a_fault() {
        let err = eval("ffffffffffffffff+1").unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn unknown_token_stops_after_spaces() {
        let result = eval("  y").unwrap();
        assert_eq!(result.value, None);
        assert_eq!(result.next, 2);
    }
}
