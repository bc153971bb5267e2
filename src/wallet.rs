//! # 钱包模块
//!
//! 持有一个密钥对，从池中挑选自己的 UTXO 构造并签名转账交易。

use crate::crypto::{key_fingerprint, Crypto, CryptoResult};
use crate::error::LedgerResult;
use crate::transaction::{Address, Amount, Signature, Transaction, TransactionBuilder};
use crate::utxo_pool::UtxoPool;

pub struct Wallet<C: Crypto> {
    secret_key: C::SecretKey,
    address: Address,
    fingerprint: String,
}

impl<C: Crypto> Wallet<C> {
    /// 用给定后端生成新钱包
    pub fn generate(crypto: &C) -> CryptoResult<Self> {
        let (secret_key, address) = crypto.generate_keypair()?;
        Ok(Self::from_keypair(secret_key, address))
    }

    pub fn from_keypair(secret_key: C::SecretKey, address: Address) -> Self {
        let fingerprint = key_fingerprint(&address);
        Wallet {
            secret_key,
            address,
            fingerprint,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn secret_key(&self) -> &C::SecretKey {
        &self.secret_key
    }

    /// 40 个十六进制字符的公钥指纹
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn balance(&self, utxo_pool: &UtxoPool) -> i128 {
        utxo_pool.balance_of(&self.address)
    }

    pub fn sign(&self, crypto: &C, message: &[u8]) -> CryptoResult<Signature> {
        crypto.sign(&self.secret_key, message)
    }

    /// 创建并签名一笔转账
    ///
    /// 按标识顺序挑选本钱包的 UTXO，直到金额足够；多余部分作为找零回到本钱包。
    ///
    /// # 参数
    ///
    /// * `crypto` - 签名和哈希使用的后端
    /// * `utxo_pool` - 挑选输入的池
    /// * `to` - 接收者地址
    /// * `amount` - 转账金额
    ///
    /// # 返回值
    ///
    /// 余额不足或金额不为正时返回 `Ok(None)`
    pub fn create_transaction(
        &self,
        crypto: &C,
        utxo_pool: &UtxoPool,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<Option<Transaction>> {
        if amount <= 0 {
            return Ok(None);
        }

        let mut builder = TransactionBuilder::new();
        let mut total_input: i128 = 0;

        for (utxo, output) in utxo_pool.utxos_owned_by(&self.address) {
            if total_input >= amount as i128 {
                break;
            }
            if output.value <= 0 {
                continue;
            }
            builder.add_input(utxo.tx_hash(), utxo.index());
            total_input += output.value as i128;
        }

        if total_input < amount as i128 {
            return Ok(None);
        }

        builder.add_output(amount, to.clone());

        // 找零小于最后选中的那个输出，一定能放进 Amount
        let change = total_input - amount as i128;
        if change > 0 {
            builder.add_output(change as Amount, self.address.clone());
        }

        for index in 0..builder.inputs().len() {
            builder.sign_input(crypto, &self.secret_key, index)?;
        }

        builder.build(crypto).map(Some)
    }
}
