//! マーク管理

use crate::buffer::Address;

const MARK_COUNT: usize = 26;

/// a〜z の名前付きアドレス
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkSet {
    slots: [Option<Address>; MARK_COUNT],
}

impl MarkSet {
    /// すべて未設定のマーク集合を作成
    pub fn new() -> Self {
        Self::default()
    }

    fn index(letter: char) -> Option<usize> {
        if letter.is_ascii_lowercase() {
            Some((letter as u8 - b'a') as usize)
        } else {
            None
        }
    }

    /// 有効なマーク名か
    pub fn is_mark_name(letter: char) -> bool {
        Self::index(letter).is_some()
    }

    /// マークの値（未設定・不正な名前は `None`）
    pub fn get(&self, letter: char) -> Option<Address> {
        Self::index(letter).and_then(|i| self.slots[i])
    }

    /// マークを設定。名前が不正なら `false`
    pub fn set(&mut self, letter: char, addr: Address) -> bool {
        match Self::index(letter) {
            Some(i) => {
                self.slots[i] = Some(addr);
                true
            }
            None => false,
        }
    }

    /// (名前, 値) を a から順に列挙
    pub fn iter(&self) -> impl Iterator<Item = (char, Option<Address>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| ((b'a' + i as u8) as char, *slot))
    }
}
