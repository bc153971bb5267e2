//! # 交易模块
//!
//! 定义交易、交易输入和交易输出，以及用于哈希和签名的规范字节序列化。
//!
//! 交易只能通过 [`TransactionBuilder`] 构造：构建完成时计算一次哈希，
//! 之后交易不可变，因此哈希永远与内容一致。

use serde::{Serialize, Serializer};
use std::fmt;

use crate::crypto::Crypto;
use crate::error::{LedgerError, LedgerResult};
use crate::utxo::Utxo;

/// 金额类型。负值在结构上允许，由校验器拒绝。
pub type Amount = i64;

/// 交易哈希，固定 32 字节
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        TxHash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..8]))
    }
}

/// 接收者地址，即公钥的规范编码字节
///
/// 账本不关心具体签名方案，只用这些字节做序列化和交给 [`Crypto::verify`]。
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(Vec<u8>);

impl Address {
    pub fn new(encoded: Vec<u8>) -> Self {
        Address(encoded)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// 不透明的签名字节
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn new(bytes: Vec<u8>) -> Self {
        Signature(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(&self.0))
    }
}

macro_rules! serialize_as_hex {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(&hex::encode(&self.0))
                }
            }
        )*
    };
}

serialize_as_hex!(TxHash, Address, Signature);

/// 交易输入结构，引用之前交易的输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxInput {
    /// 被花费输出所在交易的哈希；为空时该输入永远无法在池中找到
    pub prev_tx_hash: Option<TxHash>,
    /// 被花费输出在该交易中的下标
    pub output_index: u32,
    /// 对本输入签名数据的签名
    pub signature: Option<Signature>,
}

impl TxInput {
    /// 本输入引用的 UTXO，来源哈希为空时返回 `None`
    pub fn utxo(&self) -> Option<Utxo> {
        self.prev_tx_hash
            .map(|hash| Utxo::new(hash, self.output_index))
    }
}

/// 交易输出结构，表示金额和接收者
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxOutput {
    pub value: Amount,
    pub address: Address,
}

impl TxOutput {
    pub fn new(value: Amount, address: Address) -> Self {
        TxOutput { value, address }
    }
}

/// 不可变交易，哈希在构建时确定
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    hash: TxHash,
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
}

impl Transaction {
    pub fn hash(&self) -> TxHash {
        self.hash
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    pub fn input(&self, index: usize) -> Option<&TxInput> {
        self.inputs.get(index)
    }

    pub fn output(&self, index: usize) -> Option<&TxOutput> {
        self.outputs.get(index)
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// 第 `index` 个输入需要签名的数据
    pub fn raw_data_to_sign(&self, index: usize) -> LedgerResult<Vec<u8>> {
        raw_data_to_sign(&self.inputs, &self.outputs, index)
    }

    /// 计算交易哈希使用的完整字节
    pub fn raw_tx(&self) -> Vec<u8> {
        raw_tx(&self.inputs, &self.outputs)
    }

    /// 所有输出金额之和，空输出时为 0
    pub fn total_output_value(&self) -> i128 {
        self.outputs.iter().map(|output| output.value as i128).sum()
    }

    /// 本交易第 `index` 个输出对应的 UTXO
    pub fn output_utxo(&self, index: usize) -> LedgerResult<Utxo> {
        if index >= self.outputs.len() {
            return Err(LedgerError::IndexOutOfRange {
                index,
                len: self.outputs.len(),
            });
        }
        Ok(Utxo::new(self.hash, index as u32))
    }

    /// 重新打开为构建器。修改后必须重新 `build` 才能得到新哈希。
    pub fn to_builder(&self) -> TransactionBuilder {
        TransactionBuilder {
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
        }
    }
}

/// 交易构建器
///
/// 先添加全部输入和输出，再逐个签名，最后 [`build`](Self::build)。
/// 签名数据包含所有输出，签名后再添加输出会使已有签名失效。
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加输入
    ///
    /// # 参数
    ///
    /// * `prev_tx_hash` - 被花费输出所在交易的哈希，可以为 `None`
    /// * `output_index` - 被花费输出的下标
    pub fn add_input(
        &mut self,
        prev_tx_hash: impl Into<Option<TxHash>>,
        output_index: u32,
    ) -> &mut Self {
        self.inputs.push(TxInput {
            prev_tx_hash: prev_tx_hash.into(),
            output_index,
            signature: None,
        });
        self
    }

    pub fn add_output(&mut self, value: Amount, address: Address) -> &mut Self {
        self.outputs.push(TxOutput::new(value, address));
        self
    }

    pub fn remove_input(&mut self, index: usize) -> LedgerResult<TxInput> {
        if index >= self.inputs.len() {
            return Err(LedgerError::IndexOutOfRange {
                index,
                len: self.inputs.len(),
            });
        }
        Ok(self.inputs.remove(index))
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    pub fn raw_data_to_sign(&self, index: usize) -> LedgerResult<Vec<u8>> {
        raw_data_to_sign(&self.inputs, &self.outputs, index)
    }

    /// 为第 `index` 个输入附加已有签名
    pub fn add_signature(&mut self, signature: Signature, index: usize) -> LedgerResult<&mut Self> {
        let len = self.inputs.len();
        let input = self
            .inputs
            .get_mut(index)
            .ok_or(LedgerError::IndexOutOfRange { index, len })?;
        input.signature = Some(signature);
        Ok(self)
    }

    /// 用私钥为第 `index` 个输入签名
    pub fn sign_input<C: Crypto>(
        &mut self,
        crypto: &C,
        secret_key: &C::SecretKey,
        index: usize,
    ) -> LedgerResult<&mut Self> {
        let data = self.raw_data_to_sign(index)?;
        let signature = crypto.sign(secret_key, &data)?;
        self.add_signature(signature, index)
    }

    /// 计算哈希并产出不可变交易
    pub fn build<C: Crypto>(self, crypto: &C) -> LedgerResult<Transaction> {
        let hash = crypto.hash(&raw_tx(&self.inputs, &self.outputs))?;
        Ok(Transaction {
            hash,
            inputs: self.inputs,
            outputs: self.outputs,
        })
    }
}

// 来源哈希（若有）+ 4 字节大端下标
fn write_outpoint(buf: &mut Vec<u8>, input: &TxInput) {
    if let Some(hash) = &input.prev_tx_hash {
        buf.extend_from_slice(hash.as_bytes());
    }
    buf.extend_from_slice(&input.output_index.to_be_bytes());
}

// 每个输出：8 字节大端金额 + 地址编码
fn write_outputs(buf: &mut Vec<u8>, outputs: &[TxOutput]) {
    for output in outputs {
        buf.extend_from_slice(&output.value.to_be_bytes());
        buf.extend_from_slice(output.address.as_bytes());
    }
}

fn raw_data_to_sign(inputs: &[TxInput], outputs: &[TxOutput], index: usize) -> LedgerResult<Vec<u8>> {
    let input = inputs.get(index).ok_or(LedgerError::IndexOutOfRange {
        index,
        len: inputs.len(),
    })?;

    let mut data = Vec::new();
    write_outpoint(&mut data, input);
    write_outputs(&mut data, outputs);
    Ok(data)
}

fn raw_tx(inputs: &[TxInput], outputs: &[TxOutput]) -> Vec<u8> {
    let mut data = Vec::new();
    for input in inputs {
        write_outpoint(&mut data, input);
        if let Some(signature) = &input.signature {
            data.extend_from_slice(signature.as_bytes());
        }
    }
    write_outputs(&mut data, outputs);
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Secp256k1Crypto;

    fn sample_builder() -> TransactionBuilder {
        let mut builder = TransactionBuilder::new();
        builder
            .add_input(TxHash::new([7u8; 32]), 1)
            .add_output(80, Address::new(vec![0xAA, 0xBB]))
            .add_output(-1, Address::new(vec![0xCC]));
        builder
    }

    #[test]
    fn test_raw_data_to_sign_layout() {
        let builder = sample_builder();
        let data = builder.raw_data_to_sign(0).unwrap();

        let mut expected = vec![7u8; 32];
        expected.extend_from_slice(&[0, 0, 0, 1]);
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 80]);
        expected.extend_from_slice(&[0xAA, 0xBB]);
        expected.extend_from_slice(&[0xFF; 8]);
        expected.push(0xCC);

        assert_eq!(data, expected);
    }

    #[test]
    fn test_raw_data_to_sign_ignores_signatures() {
        let mut builder = sample_builder();
        builder.add_input(TxHash::new([9u8; 32]), 0);
        let before = builder.raw_data_to_sign(0).unwrap();

        builder.add_signature(Signature::new(vec![1, 2, 3]), 0).unwrap();
        builder.add_signature(Signature::new(vec![4, 5, 6]), 1).unwrap();

        assert_eq!(builder.raw_data_to_sign(0).unwrap(), before);
    }

    #[test]
    fn test_input_without_origin_is_omitted() {
        let mut builder = TransactionBuilder::new();
        builder.add_input(None, 3);

        assert_eq!(builder.raw_data_to_sign(0).unwrap(), vec![0, 0, 0, 3]);
        assert!(builder.inputs()[0].utxo().is_none());
    }

    #[test]
    fn test_raw_tx_includes_signatures() {
        let mut builder = sample_builder();
        builder.add_signature(Signature::new(vec![0xEE, 0xEF]), 0).unwrap();
        let tx = builder.build(&Secp256k1Crypto::new()).unwrap();

        let raw = tx.raw_tx();
        assert_eq!(&raw[..32], &[7u8; 32]);
        assert_eq!(&raw[32..36], &[0, 0, 0, 1]);
        assert_eq!(&raw[36..38], &[0xEE, 0xEF]);
        assert_eq!(raw.len(), 38 + 8 + 2 + 8 + 1);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut builder = sample_builder();

        assert!(matches!(
            builder.raw_data_to_sign(1),
            Err(LedgerError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(matches!(
            builder.add_signature(Signature::new(vec![]), 5),
            Err(LedgerError::IndexOutOfRange { index: 5, len: 1 })
        ));
        assert!(builder.remove_input(2).is_err());

        let tx = builder.build(&Secp256k1Crypto::new()).unwrap();
        assert!(tx.raw_data_to_sign(1).is_err());
        assert!(tx.output_utxo(2).is_err());
        assert!(tx.input(1).is_none());
    }

    #[test]
    fn test_hash_tracks_content() {
        let crypto = Secp256k1Crypto::new();
        let tx = sample_builder().build(&crypto).unwrap();
        assert_eq!(tx.hash(), crypto.hash(&tx.raw_tx()).unwrap());

        // 未修改的重建得到相同哈希
        let same = tx.to_builder().build(&crypto).unwrap();
        assert_eq!(same.hash(), tx.hash());

        // 附加签名后哈希改变
        let mut builder = tx.to_builder();
        builder.add_signature(Signature::new(vec![1]), 0).unwrap();
        let signed = builder.build(&crypto).unwrap();
        assert_ne!(signed.hash(), tx.hash());
    }

    #[test]
    fn test_total_output_value() {
        let tx = sample_builder().build(&Secp256k1Crypto::new()).unwrap();
        assert_eq!(tx.total_output_value(), 79);
        assert_eq!(tx.output_utxo(1).unwrap(), Utxo::new(tx.hash(), 1));
    }
}
