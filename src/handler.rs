//! # 交易处理模块
//!
//! 把一批候选交易应用到账本：按调用者给定的顺序逐个校验，
//! 有效的交易立即从池中移除其花费的 UTXO 并加入新产生的 UTXO，
//! 下一笔交易看到的是更新后的池。
//!
//! 处理是贪心且依赖顺序的：不重排候选交易，也不重试被拒绝的交易。

use log::{debug, info};

use crate::crypto::Crypto;
use crate::error::LedgerResult;
use crate::transaction::{Transaction, TxHash};
use crate::utxo::Utxo;
use crate::utxo_pool::UtxoPool;
use crate::validator::{Rejection, TxValidator, ValidationPolicy};

/// 一批交易的处理结果
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// 被接受的交易，保持输入顺序
    pub accepted: Vec<Transaction>,
    /// 被拒绝的交易哈希及原因，保持输入顺序
    pub rejected: Vec<(TxHash, Rejection)>,
}

/// 账本处理器，独占一个 UTXO 池
pub struct TxHandler<C: Crypto> {
    crypto: C,
    policy: ValidationPolicy,
    utxo_pool: UtxoPool,
}

impl<C: Crypto> TxHandler<C> {
    /// 创建处理器，使用 `utxo_pool` 的拷贝作为当前池
    pub fn new(crypto: C, utxo_pool: &UtxoPool) -> Self {
        Self::with_policy(crypto, utxo_pool, ValidationPolicy::default())
    }

    pub fn with_policy(crypto: C, utxo_pool: &UtxoPool, policy: ValidationPolicy) -> Self {
        TxHandler {
            crypto,
            policy,
            utxo_pool: utxo_pool.clone(),
        }
    }

    pub fn utxo_pool(&self) -> &UtxoPool {
        &self.utxo_pool
    }

    pub fn into_pool(self) -> UtxoPool {
        self.utxo_pool
    }

    pub fn crypto(&self) -> &C {
        &self.crypto
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    fn validator(&self) -> TxValidator<'_, C> {
        TxValidator::new(&self.crypto, self.policy)
    }

    /// 针对当前池校验交易
    pub fn is_valid_tx(&self, tx: &Transaction) -> LedgerResult<bool> {
        self.validator().is_valid(tx, &self.utxo_pool)
    }

    /// 针对当前池校验交易并给出拒绝原因
    pub fn check_tx(&self, tx: &Transaction) -> LedgerResult<Result<(), Rejection>> {
        self.validator().check(tx, &self.utxo_pool)
    }

    /// 处理一批候选交易
    ///
    /// # 参数
    ///
    /// * `possible_txs` - 候选交易，按此顺序处理
    ///
    /// # 返回值
    ///
    /// 被接受的交易列表。密码学后端故障时返回错误，池保持调用前的状态。
    pub fn handle_txs(&mut self, possible_txs: &[Transaction]) -> LedgerResult<Vec<Transaction>> {
        Ok(self.handle_txs_detailed(possible_txs)?.accepted)
    }

    /// 与 [`handle_txs`](Self::handle_txs) 相同，同时返回每笔被拒交易的原因
    pub fn handle_txs_detailed(&mut self, possible_txs: &[Transaction]) -> LedgerResult<BatchOutcome> {
        // 在副本上工作，整批成功后才替换当前池
        let mut working_pool = self.utxo_pool.clone();
        let mut outcome = BatchOutcome::default();
        let validator = self.validator();

        for tx in possible_txs {
            match validator.check(tx, &working_pool)? {
                Ok(()) => {
                    debug!("accepted tx {}", tx.hash());
                    apply_transaction(&mut working_pool, tx);
                    outcome.accepted.push(tx.clone());
                }
                Err(rejection) => {
                    debug!("rejected tx {}: {}", tx.hash(), rejection);
                    outcome.rejected.push((tx.hash(), rejection));
                }
            }
        }

        info!(
            "batch processed: {} candidates, {} accepted, {} rejected, pool size {}",
            possible_txs.len(),
            outcome.accepted.len(),
            outcome.rejected.len(),
            working_pool.len()
        );

        self.utxo_pool = working_pool;
        Ok(outcome)
    }
}

// 移除全部被花费的 UTXO，再按输出位置加入新 UTXO
fn apply_transaction(pool: &mut UtxoPool, tx: &Transaction) {
    for input in tx.inputs() {
        if let Some(utxo) = input.utxo() {
            pool.remove_utxo(&utxo);
        }
    }
    for (index, output) in tx.outputs().iter().enumerate() {
        pool.add_utxo(Utxo::new(tx.hash(), index as u32), output.clone());
    }
}
