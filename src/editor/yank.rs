//! ヤンクレジスタ実装

/// 単一スロットのクリップボード
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct YankRegister {
    bytes: Vec<u8>,
}

impl YankRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// 内容を丸ごと置き換える
    pub fn set(&mut self, bytes: Vec<u8>) {
        self.bytes = bytes;
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
