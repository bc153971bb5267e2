//! # UTXO池模块
//!
//! 当前全部可花费输出的快照。池中没有交易历史，只有 UTXO 到输出的映射。
//! 输出在插入时按值拷贝，之后对原交易的任何操作都不会影响池中的记录。

use log::trace;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

use crate::transaction::{Address, TxOutput};
use crate::utxo::Utxo;

/// 未花费输出池
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoPool {
    utxos: HashMap<Utxo, TxOutput>,
}

impl UtxoPool {
    /// 创建空池
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加 UTXO，已存在时覆盖
    pub fn add_utxo(&mut self, utxo: Utxo, output: TxOutput) {
        trace!("utxo pool: add {} value={}", utxo, output.value);
        self.utxos.insert(utxo, output);
    }

    /// 移除 UTXO，不存在时什么也不做
    pub fn remove_utxo(&mut self, utxo: &Utxo) {
        if self.utxos.remove(utxo).is_some() {
            trace!("utxo pool: remove {}", utxo);
        }
    }

    pub fn get_tx_output(&self, utxo: &Utxo) -> Option<&TxOutput> {
        self.utxos.get(utxo)
    }

    pub fn contains(&self, utxo: &Utxo) -> bool {
        self.utxos.contains_key(utxo)
    }

    /// 调用时刻全部 UTXO 的拷贝，顺序不保证
    pub fn all_utxos(&self) -> Vec<Utxo> {
        self.utxos.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Utxo, &TxOutput)> {
        self.utxos.iter()
    }

    /// 池中全部金额之和
    pub fn total_value(&self) -> i128 {
        self.utxos.values().map(|output| output.value as i128).sum()
    }

    /// 某地址拥有的全部金额
    pub fn balance_of(&self, address: &Address) -> i128 {
        self.utxos
            .values()
            .filter(|output| &output.address == address)
            .map(|output| output.value as i128)
            .sum()
    }

    /// 某地址拥有的 UTXO，按标识排序
    pub fn utxos_owned_by(&self, address: &Address) -> Vec<(Utxo, TxOutput)> {
        let mut owned: Vec<(Utxo, TxOutput)> = self
            .utxos
            .iter()
            .filter(|(_, output)| &output.address == address)
            .map(|(utxo, output)| (*utxo, output.clone()))
            .collect();
        owned.sort_by(|a, b| a.0.cmp(&b.0));
        owned
    }
}

impl FromIterator<(Utxo, TxOutput)> for UtxoPool {
    fn from_iter<I: IntoIterator<Item = (Utxo, TxOutput)>>(iter: I) -> Self {
        UtxoPool {
            utxos: iter.into_iter().collect(),
        }
    }
}

#[derive(Serialize)]
struct PoolEntry<'a> {
    utxo: &'a Utxo,
    value: i64,
    address: &'a Address,
}

impl Serialize for UtxoPool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<(&Utxo, &TxOutput)> = self.utxos.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        serializer.collect_seq(entries.into_iter().map(|(utxo, output)| PoolEntry {
            utxo,
            value: output.value,
            address: &output.address,
        }))
    }
}
