use serde::Serialize;
use std::fmt;

use crate::transaction::TxHash;

/// 未花费输出的标识：来源交易哈希 + 输出下标
///
/// 排序先比较哈希字节，再比较下标。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Utxo {
    tx_hash: TxHash,
    index: u32,
}

impl Utxo {
    pub const fn new(tx_hash: TxHash, index: u32) -> Self {
        Utxo { tx_hash, index }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.index)
    }
}
