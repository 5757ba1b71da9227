//! バッファ管理モジュール
//!
//! 編集対象のバイト列と、その上の挿入・削除・上書き・読み出し・複写・移動操作を提供

pub mod memory;

// 公開API
pub use memory::{staging, MemoryBuffer, DEFAULT_MAX_LEN};

/// バッファ内のバイトオフセット
///
/// 「未指定」は `Option<Address>` の `None` で表し、数値の番兵は使わない
pub type Address = u64;
