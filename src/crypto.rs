//! # 密码学模块
//!
//! 账本只通过 [`Crypto`] 能力使用密码学：哈希、签名、验签、生成密钥对。
//! 默认实现 [`Secp256k1Crypto`] 使用 secp256k1 上的 ECDSA 和 SHA-256。
//!
//! 公钥在账本中总以编码后的字节形式（[`Address`]）出现，后端负责解码。

use ripemd::Ripemd160;
use secp256k1::{ecdsa, All, Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::transaction::{Address, Signature, TxHash};

/// 密码学后端错误
///
/// 只表示后端本身不可用或配置错误。签名不匹配不是错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("digest has unexpected length {0}")]
    DigestLength(usize),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

/// 可插拔的密码学能力
pub trait Crypto {
    /// 私钥类型，由具体签名方案决定
    type SecretKey;

    /// 生成新的密钥对，返回私钥和编码后的公钥
    fn generate_keypair(&self) -> CryptoResult<(Self::SecretKey, Address)>;

    /// 计算固定 256 位摘要
    fn hash(&self, data: &[u8]) -> CryptoResult<TxHash>;

    /// 用私钥对消息签名
    fn sign(&self, secret_key: &Self::SecretKey, message: &[u8]) -> CryptoResult<Signature>;

    /// 验证签名
    ///
    /// # 返回值
    ///
    /// 签名有效返回 `Ok(true)`；签名错误、格式错误或公钥无法解码返回 `Ok(false)`；
    /// 只有后端故障才返回 `Err`
    fn verify(&self, public_key: &Address, message: &[u8], signature: &Signature)
        -> CryptoResult<bool>;
}

/// secp256k1 ECDSA + SHA-256 后端
pub struct Secp256k1Crypto {
    secp: Secp256k1<All>,
}

impl Secp256k1Crypto {
    pub fn new() -> Self {
        Secp256k1Crypto {
            secp: Secp256k1::new(),
        }
    }

    fn digest_message(&self, message: &[u8]) -> CryptoResult<Message> {
        let digest = sha256(message);
        Message::from_slice(&digest).map_err(|_| CryptoError::DigestLength(digest.len()))
    }
}

impl Default for Secp256k1Crypto {
    fn default() -> Self {
        Self::new()
    }
}

impl Crypto for Secp256k1Crypto {
    type SecretKey = SecretKey;

    fn generate_keypair(&self) -> CryptoResult<(SecretKey, Address)> {
        let mut rng = rand::thread_rng();
        let (secret_key, public_key) = self.secp.generate_keypair(&mut rng);
        Ok((secret_key, Address::new(public_key.serialize().to_vec())))
    }

    fn hash(&self, data: &[u8]) -> CryptoResult<TxHash> {
        Ok(TxHash::new(sha256(data)))
    }

    fn sign(&self, secret_key: &SecretKey, message: &[u8]) -> CryptoResult<Signature> {
        let message = self.digest_message(message)?;
        let signature = self.secp.sign_ecdsa(&message, secret_key);
        Ok(Signature::new(signature.serialize_compact().to_vec()))
    }

    fn verify(
        &self,
        public_key: &Address,
        message: &[u8],
        signature: &Signature,
    ) -> CryptoResult<bool> {
        let public_key = match PublicKey::from_slice(public_key.as_bytes()) {
            Ok(key) => key,
            Err(_) => return Ok(false),
        };
        let signature = match ecdsa::Signature::from_compact(signature.as_bytes()) {
            Ok(sig) => sig,
            Err(_) => return Ok(false),
        };
        let message = self.digest_message(message)?;
        Ok(self.secp.verify_ecdsa(&message, &signature, &public_key).is_ok())
    }
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// 公钥指纹，用于日志和展示
///
/// 先 SHA-256 再 RIPEMD-160，结果为 40 个十六进制字符。
pub fn key_fingerprint(address: &Address) -> String {
    let result = sha256(address.as_bytes());

    let mut ripemd = Ripemd160::new();
    ripemd.update(result);
    hex::encode(ripemd.finalize())
}
