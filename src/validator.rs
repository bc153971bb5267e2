//! # 交易校验模块
//!
//! 五条相互独立的规则，逻辑与组合成交易的有效性：
//!
//! 1. 所有输入引用的 UTXO 都在池中
//! 2. 每个输入的签名都能被对应输出的地址验证
//! 3. 同一交易不会重复引用同一 UTXO
//! 4. 所有输出金额非负
//! 5. 输入金额之和不小于输出金额之和
//!
//! 规则只读池，从不修改池。交易无效不是错误，只有密码学后端故障才返回 `Err`。

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::crypto::Crypto;
use crate::error::LedgerResult;
use crate::transaction::{Amount, Transaction, TxHash};
use crate::utxo::Utxo;
use crate::utxo_pool::UtxoPool;

/// 对没有输入或没有输出的交易的处理方式
///
/// 默认全部允许，此时空集合的金额之和按 0 计算。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationPolicy {
    pub allow_empty_inputs: bool,
    pub allow_empty_outputs: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        ValidationPolicy {
            allow_empty_inputs: true,
            allow_empty_outputs: true,
        }
    }
}

impl ValidationPolicy {
    /// 要求至少一个输入和一个输出
    pub fn strict() -> Self {
        ValidationPolicy {
            allow_empty_inputs: false,
            allow_empty_outputs: false,
        }
    }
}

/// 交易被拒绝的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("transaction has no inputs")]
    EmptyInputs,

    #[error("transaction has no outputs")]
    EmptyOutputs,

    #[error("input {index} references an output not in the pool")]
    MissingInput { index: usize, utxo: Option<Utxo> },

    #[error("input {index} has an invalid signature")]
    InvalidSignature { index: usize },

    #[error("output {output_index} of {prev_tx_hash:?} claimed more than once")]
    DuplicateInput { prev_tx_hash: Option<TxHash>, output_index: u32 },

    #[error("output {index} has negative value {value}")]
    NegativeOutput { index: usize, value: Amount },

    #[error("insufficient input value: have {have}, need {need}")]
    InsufficientInput { have: i128, need: i128 },
}

fn find_missing_input(tx: &Transaction, pool: &UtxoPool) -> Option<Rejection> {
    tx.inputs().iter().enumerate().find_map(|(index, input)| {
        let utxo = input.utxo();
        match utxo {
            Some(utxo) if pool.contains(&utxo) => None,
            _ => Some(Rejection::MissingInput { index, utxo }),
        }
    })
}

fn find_invalid_signature<C: Crypto>(
    crypto: &C,
    tx: &Transaction,
    pool: &UtxoPool,
) -> LedgerResult<Option<Rejection>> {
    for (index, input) in tx.inputs().iter().enumerate() {
        // 找不到被引用的输出或没有签名都视为签名无效
        let output = input.utxo().and_then(|utxo| pool.get_tx_output(&utxo));
        let (output, signature) = match (output, &input.signature) {
            (Some(output), Some(signature)) => (output, signature),
            _ => return Ok(Some(Rejection::InvalidSignature { index })),
        };

        let data = tx.raw_data_to_sign(index)?;
        if !crypto.verify(&output.address, &data, signature)? {
            return Ok(Some(Rejection::InvalidSignature { index }));
        }
    }
    Ok(None)
}

fn find_double_spend(tx: &Transaction) -> Option<Rejection> {
    let mut seen = HashSet::with_capacity(tx.num_inputs());
    tx.inputs().iter().find_map(|input| {
        if seen.insert((input.prev_tx_hash, input.output_index)) {
            None
        } else {
            Some(Rejection::DuplicateInput {
                prev_tx_hash: input.prev_tx_hash,
                output_index: input.output_index,
            })
        }
    })
}

fn find_negative_output(tx: &Transaction) -> Option<Rejection> {
    tx.outputs()
        .iter()
        .enumerate()
        .find(|(_, output)| output.value < 0)
        .map(|(index, output)| Rejection::NegativeOutput {
            index,
            value: output.value,
        })
}

fn find_value_deficit(tx: &Transaction, pool: &UtxoPool) -> Option<Rejection> {
    let mut have: i128 = 0;
    for (index, input) in tx.inputs().iter().enumerate() {
        let utxo = input.utxo();
        match utxo.and_then(|utxo| pool.get_tx_output(&utxo)) {
            Some(output) => have += output.value as i128,
            None => return Some(Rejection::MissingInput { index, utxo }),
        }
    }

    let need = tx.total_output_value();
    if have >= need {
        None
    } else {
        Some(Rejection::InsufficientInput { have, need })
    }
}

/// 规则 1：所有输入引用的 UTXO 都在池中
pub fn all_inputs_exist_in_pool(tx: &Transaction, pool: &UtxoPool) -> bool {
    find_missing_input(tx, pool).is_none()
}

/// 规则 2：所有输入签名有效
///
/// 被引用的输出不在池中时该输入按签名无效处理，不会 panic。
pub fn all_signatures_valid<C: Crypto>(
    crypto: &C,
    tx: &Transaction,
    pool: &UtxoPool,
) -> LedgerResult<bool> {
    Ok(find_invalid_signature(crypto, tx, pool)?.is_none())
}

/// 规则 3：没有重复引用的 UTXO
pub fn no_double_spend(tx: &Transaction) -> bool {
    find_double_spend(tx).is_none()
}

/// 规则 4：所有输出金额非负，0 合法
pub fn all_outputs_non_negative(tx: &Transaction) -> bool {
    find_negative_output(tx).is_none()
}

/// 规则 5：输入金额之和不小于输出金额之和
///
/// 空集合之和为 0；有输入不在池中时返回 false。
pub fn sum_inputs_ge_outputs(tx: &Transaction, pool: &UtxoPool) -> bool {
    find_value_deficit(tx, pool).is_none()
}

/// 组合五条规则的校验器
pub struct TxValidator<'a, C: Crypto> {
    crypto: &'a C,
    policy: ValidationPolicy,
}

impl<'a, C: Crypto> TxValidator<'a, C> {
    pub fn new(crypto: &'a C, policy: ValidationPolicy) -> Self {
        TxValidator { crypto, policy }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// 校验交易并给出第一条违反的规则
    ///
    /// 检查顺序：存在、不重复、非负、签名、金额守恒。
    ///
    /// # 返回值
    ///
    /// * `Ok(Ok(()))` - 交易有效
    /// * `Ok(Err(rejection))` - 交易无效及原因
    /// * `Err(_)` - 密码学后端故障
    pub fn check(&self, tx: &Transaction, pool: &UtxoPool) -> LedgerResult<Result<(), Rejection>> {
        if !self.policy.allow_empty_inputs && tx.num_inputs() == 0 {
            return Ok(Err(Rejection::EmptyInputs));
        }
        if !self.policy.allow_empty_outputs && tx.num_outputs() == 0 {
            return Ok(Err(Rejection::EmptyOutputs));
        }

        let structural = find_missing_input(tx, pool)
            .or_else(|| find_double_spend(tx))
            .or_else(|| find_negative_output(tx));
        if let Some(rejection) = structural {
            return Ok(Err(rejection));
        }

        if let Some(rejection) = find_invalid_signature(self.crypto, tx, pool)? {
            return Ok(Err(rejection));
        }

        match find_value_deficit(tx, pool) {
            Some(rejection) => Ok(Err(rejection)),
            None => Ok(Ok(())),
        }
    }

    pub fn is_valid(&self, tx: &Transaction, pool: &UtxoPool) -> LedgerResult<bool> {
        Ok(self.check(tx, pool)?.is_ok())
    }
}
