//! ビット演算
//!
//! 範囲内のバイトに論理演算・シフト・ローテートを適用する。
//! 範囲を読み出して変換し、最後に上書きで書き戻す（範囲外は 0 として読み、必要なら伸長する）

use crate::address::Range;
use crate::buffer::MemoryBuffer;
use crate::error::{BufferError, Result};

/// バイト単位の論理演算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
    Xor,
}

impl LogicOp {
    fn apply(self, byte: u8, operand: u8) -> u8 {
        match self {
            LogicOp::And => byte & operand,
            LogicOp::Or => byte | operand,
            LogicOp::Xor => byte ^ operand,
        }
    }

    /// ステータス表示用の動詞
    pub fn verb(self) -> &'static str {
        match self {
            LogicOp::And => "anded",
            LogicOp::Or => "ored",
            LogicOp::Xor => "xored",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    Left,
    Right,
}

/// シフト・ローテートの指定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftSpec {
    pub direction: ShiftDirection,
    /// 範囲全体を1つの整数（リトルエンディアン）として扱う
    pub multibyte: bool,
    /// 繰り返し回数
    pub times: u64,
    /// シフトで入るビット。`None` ならローテート
    pub carry: Option<bool>,
}

fn load(buffer: &MemoryBuffer, range: Range) -> Result<Vec<u8>> {
    let requested = range.end().saturating_add(1);
    if requested > buffer.limit() {
        return Err(BufferError::Overflow { requested }.into());
    }
    buffer.read(range.start(), range.end()).map_err(Into::into)
}

/// 各バイトに `op operand` を適用し、処理したバイト数を返す
pub fn apply_logic(buffer: &mut MemoryBuffer, range: Range, op: LogicOp, operand: u8) -> Result<u64> {
    let mut bytes = load(buffer, range)?;
    for byte in bytes.iter_mut() {
        *byte = op.apply(*byte, operand);
    }
    buffer.overwrite(range.start(), &bytes)?;
    Ok(range.len())
}

/// 各バイトをビット反転
pub fn invert(buffer: &mut MemoryBuffer, range: Range) -> Result<u64> {
    let mut bytes = load(buffer, range)?;
    for byte in bytes.iter_mut() {
        *byte = !*byte;
    }
    buffer.overwrite(range.start(), &bytes)?;
    Ok(range.len())
}

/// シフト・ローテートを `spec.times` 回適用
pub fn shift(buffer: &mut MemoryBuffer, range: Range, spec: ShiftSpec) -> Result<()> {
    if spec.times == 0 {
        return Ok(());
    }
    let mut bytes = load(buffer, range)?;
    if spec.multibyte {
        shift_wide(&mut bytes, spec);
    } else {
        for byte in bytes.iter_mut() {
            *byte = shift_byte(*byte, spec);
        }
    }
    buffer.overwrite(range.start(), &bytes)?;
    Ok(())
}

/// ビット幅以上の繰り返しは結果が変わらないので回数を詰める
fn effective_times(times: u64, bits: u64, rotate: bool) -> u64 {
    if rotate {
        times % bits
    } else {
        times.min(bits)
    }
}

fn shift_byte(byte: u8, spec: ShiftSpec) -> u8 {
    let times = effective_times(spec.times, 8, spec.carry.is_none());
    let mut value = byte;
    for _ in 0..times {
        value = match (spec.direction, spec.carry) {
            (ShiftDirection::Left, None) => value.rotate_left(1),
            (ShiftDirection::Right, None) => value.rotate_right(1),
            (ShiftDirection::Left, Some(c)) => (value << 1) | c as u8,
            (ShiftDirection::Right, Some(c)) => (value >> 1) | ((c as u8) << 7),
        };
    }
    value
}

/// `bytes` を先頭が最下位のリトルエンディアン整数として1ビットずつ動かす
fn shift_wide(bytes: &mut [u8], spec: ShiftSpec) {
    let Some(last) = bytes.len().checked_sub(1) else {
        return;
    };
    let bits = (bytes.len() as u64).saturating_mul(8);
    let times = effective_times(spec.times, bits, spec.carry.is_none());

    for _ in 0..times {
        match spec.direction {
            ShiftDirection::Left => {
                let mut carry = spec.carry.unwrap_or(bytes[last] & 0x80 != 0) as u8;
                for byte in bytes.iter_mut() {
                    let out = *byte >> 7;
                    *byte = (*byte << 1) | carry;
                    carry = out;
                }
            }
            ShiftDirection::Right => {
                let mut carry = spec.carry.unwrap_or(bytes[0] & 0x01 != 0) as u8;
                for byte in bytes.iter_mut().rev() {
                    let out = *byte & 0x01;
                    *byte = (*byte >> 1) | (carry << 7);
                    carry = out;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotate(direction: ShiftDirection, multibyte: bool, times: u64) -> ShiftSpec {
        ShiftSpec {
            direction,
            multibyte,
            times,
            carry: None,
        }
    }

    fn shifted(direction: ShiftDirection, multibyte: bool, carry: bool) -> ShiftSpec {
        ShiftSpec {
            direction,
            multibyte,
            times: 1,
            carry: Some(carry),
        }
    }

    #[test]
    fn and_touches_only_range() {
        let mut buf = MemoryBuffer::from_bytes(vec![0xff; 8]);
        let count = apply_logic(&mut buf, Range::new(2, 5), LogicOp::And, 0x0f).unwrap();
        assert_eq!(count, 4);
        assert_eq!(buf.as_bytes(), &[0xff, 0xff, 0x0f, 0x0f, 0x0f, 0x0f, 0xff, 0xff]);
    }

    #[test]
    fn logic_past_end_grows_buffer() {
        let mut buf = MemoryBuffer::from_bytes(vec![0x01]);
        apply_logic(&mut buf, Range::new(0, 2), LogicOp::Or, 0x10).unwrap();
        assert_eq!(buf.as_bytes(), &[0x11, 0x10, 0x10]);
        invert(&mut buf, Range::single(1)).unwrap();
        assert_eq!(buf.as_bytes(), &[0x11, 0xef, 0x10]);
    }

    #[test]
    fn single_byte_shift_uses_carry() {
        let mut buf = MemoryBuffer::from_bytes(vec![0x81, 0x81]);
        shift(&mut buf, Range::new(0, 1), shifted(ShiftDirection::Left, false, true)).unwrap();
        assert_eq!(buf.as_bytes(), &[0x03, 0x03]);
        shift(&mut buf, Range::single(0), shifted(ShiftDirection::Right, false, true)).unwrap();
        assert_eq!(buf.as_bytes(), &[0x81, 0x03]);
    }

    #[test]
    fn single_byte_rotate_repeats() {
        let mut buf = MemoryBuffer::from_bytes(vec![0x81]);
        shift(&mut buf, Range::single(0), rotate(ShiftDirection::Left, false, 4)).unwrap();
        assert_eq!(buf.as_bytes(), &[0x18]);
        shift(&mut buf, Range::single(0), rotate(ShiftDirection::Right, false, 1)).unwrap();
        assert_eq!(buf.as_bytes(), &[0x0c]);
    }

    #[test]
    fn multibyte_shift_crosses_bytes() {
        let mut buf = MemoryBuffer::from_bytes(vec![0x80, 0x00]);
        shift(&mut buf, Range::new(0, 1), shifted(ShiftDirection::Left, true, false)).unwrap();
        assert_eq!(buf.as_bytes(), &[0x00, 0x01]);
        shift(&mut buf, Range::new(0, 1), shifted(ShiftDirection::Right, true, true)).unwrap();
        assert_eq!(buf.as_bytes(), &[0x80, 0x80]);
    }

    #[test]
    fn multibyte_rotate_wraps_ends() {
        let mut buf = MemoryBuffer::from_bytes(vec![0x01, 0x80]);
        shift(&mut buf, Range::new(0, 1), rotate(ShiftDirection::Left, true, 1)).unwrap();
        assert_eq!(buf.as_bytes(), &[0x03, 0x00]);
        shift(&mut buf, Range::new(0, 1), rotate(ShiftDirection::Right, true, 1)).unwrap();
        assert_eq!(buf.as_bytes(), &[0x01, 0x80]);
    }

    #[test]
    fn shift_saturates_to_carry() {
        let mut buf = MemoryBuffer::from_bytes(vec![0x5a, 0xa5]);
        let spec = ShiftSpec {
            times: 1000,
            ..shifted(ShiftDirection::Left, true, true)
        };
        shift(&mut buf, Range::new(0, 1), spec).unwrap();
        assert_eq!(buf.as_bytes(), &[0xff, 0xff]);
    }

    #[test]
    fn huge_range_is_refused() {
        let mut buf = MemoryBuffer::with_limit(16);
        assert!(invert(&mut buf, Range::new(0, 16)).is_err());
        assert!(buf.is_empty());
    }
}
