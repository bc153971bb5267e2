//! # Scrooge账本
//!
//! 一个最小账本的结算核心：给定一批候选交易和当前的未花费输出池，
//! 按顺序选出相互一致的交易子集，验证签名，并产生下一个池。
//!
//! ## 主要模块
//!
//! * `crypto` - 可插拔的哈希和签名能力，默认使用 secp256k1
//! * `transaction` - 交易结构、构建器和规范字节序列化
//! * `utxo` / `utxo_pool` - UTXO 标识和未花费输出池
//! * `validator` - 交易有效性的五条规则
//! * `handler` - 批量应用交易
//! * `wallet` - 密钥管理和转账构造
//! * `config` - 演示程序配置

pub mod config;
pub mod crypto;
pub mod error;
pub mod handler;
pub mod transaction;
pub mod utxo;
pub mod utxo_pool;
pub mod validator;
pub mod wallet;

pub use crypto::{Crypto, CryptoError, Secp256k1Crypto};
pub use error::{LedgerError, LedgerResult};
pub use handler::{BatchOutcome, TxHandler};
pub use transaction::{
    Address, Amount, Signature, Transaction, TransactionBuilder, TxHash, TxInput, TxOutput,
};
pub use utxo::Utxo;
pub use utxo_pool::UtxoPool;
pub use validator::{Rejection, TxValidator, ValidationPolicy};
pub use wallet::Wallet;
