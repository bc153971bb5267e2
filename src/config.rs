//! # 配置模块
//!
//! 演示程序的 JSON 配置：校验策略、初始分配和要执行的转账。

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::{LedgerError, LedgerResult};
use crate::transaction::Amount;
use crate::validator::ValidationPolicy;

/// 初始池中分配给某个持有者的一笔输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisAllocation {
    pub owner: String,
    pub value: Amount,
}

/// 一笔转账请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Payment {
    pub from: String,
    pub to: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    pub policy: ValidationPolicy,
    pub genesis: Vec<GenesisAllocation>,
    pub payments: Vec<Payment>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let allocation = |owner: &str, value| GenesisAllocation {
            owner: owner.to_string(),
            value,
        };
        let payment = |from: &str, to: &str, amount| Payment {
            from: from.to_string(),
            to: to.to_string(),
            amount,
        };

        LedgerConfig {
            policy: ValidationPolicy::default(),
            genesis: vec![
                allocation("alice", 80),
                allocation("alice", 20),
                allocation("bob", 50),
            ],
            payments: vec![
                payment("alice", "carol", 90),
                payment("carol", "bob", 30),
                payment("bob", "alice", 10),
            ],
        }
    }
}

impl LedgerConfig {
    /// 从 JSON 文件加载配置
    pub fn load(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> LedgerResult<Self> {
        let config: LedgerConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> LedgerResult<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if let Some(bad) = self.genesis.iter().find(|a| a.value < 0) {
            return Err(LedgerError::Config(format!(
                "genesis allocation for '{}' is negative: {}",
                bad.owner, bad.value
            )));
        }
        if let Some(bad) = self.payments.iter().find(|p| p.amount <= 0) {
            return Err(LedgerError::Config(format!(
                "payment from '{}' to '{}' must be positive, got {}",
                bad.from, bad.to, bad.amount
            )));
        }
        Ok(())
    }

    /// 配置中出现过的全部持有者名字，按字典序
    pub fn owners(&self) -> BTreeSet<&str> {
        self.genesis
            .iter()
            .map(|a| a.owner.as_str())
            .chain(
                self.payments
                    .iter()
                    .flat_map(|p| [p.from.as_str(), p.to.as_str()]),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LedgerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.owners().into_iter().collect::<Vec<_>>(),
            vec!["alice", "bob", "carol"]
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = LedgerConfig::from_json(r#"{"policy": {"allow_empty_inputs": false}}"#).unwrap();
        assert!(!config.policy.allow_empty_inputs);
        assert!(config.policy.allow_empty_outputs);
        assert_eq!(config.genesis, LedgerConfig::default().genesis);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = LedgerConfig::from_json(r#"{"difficulty": 4}"#);
        assert!(matches!(result, Err(LedgerError::Json(_))));
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let json = r#"{"payments": [{"from": "a", "to": "b", "amount": 0}]}"#;
        assert!(matches!(
            LedgerConfig::from_json(json),
            Err(LedgerError::Config(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("ledger_config_{}.json", std::process::id()));
        let config = LedgerConfig {
            policy: ValidationPolicy::strict(),
            ..LedgerConfig::default()
        };

        config.save(&path).unwrap();
        let loaded = LedgerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        // 清理测试文件
        std::fs::remove_file(&path).unwrap();
    }
}
