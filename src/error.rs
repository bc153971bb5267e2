//! # 错误模块
//!
//! 账本中真正的错误条件。交易无效不是错误，它由校验器以布尔值或
//! [`Rejection`](crate::validator::Rejection) 表达。

use thiserror::Error;

use crate::crypto::CryptoError;

/// 账本操作错误
#[derive(Error, Debug)]
pub enum LedgerError {
    /// 访问了不存在的输入或输出下标
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// 密码学后端失败，整个批处理必须中止
    #[error("crypto backend failure: {0}")]
    Crypto(#[from] CryptoError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 账本操作结果类型
pub type LedgerResult<T> = Result<T, LedgerError>;
