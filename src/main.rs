//! # 账本演示程序入口
//!
//! 读取配置（第一个命令行参数，缺省时使用内置场景），为每个持有者生成钱包，
//! 构造初始池和一批转账，交给处理器执行并打印结果和余额。

use anyhow::{Context, Result};
use log::debug;
use std::collections::BTreeMap;
use std::env;
use std::slice;

use scrooge_ledger::config::LedgerConfig;
use scrooge_ledger::{Crypto, Secp256k1Crypto, TxHandler, TxOutput, Utxo, UtxoPool, Wallet};

fn main() -> Result<()> {
    // 初始化日志
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => LedgerConfig::load(path)
            .with_context(|| format!("无法加载配置文件 {}", path))?,
        None => LedgerConfig::default(),
    };

    let crypto = Secp256k1Crypto::new();

    // 为每个持有者创建钱包
    let mut wallets: BTreeMap<String, Wallet<Secp256k1Crypto>> = BTreeMap::new();
    for owner in config.owners() {
        let wallet = Wallet::generate(&crypto).context("生成密钥对失败")?;
        println!("👛 {} -> {}", owner, wallet.fingerprint());
        wallets.insert(owner.to_string(), wallet);
    }

    // 初始池：每笔分配一个 UTXO，共用一个虚拟的创世哈希
    let genesis_hash = crypto.hash(b"scrooge-ledger genesis")?;
    let genesis_pool: UtxoPool = config
        .genesis
        .iter()
        .enumerate()
        .map(|(index, allocation)| {
            let owner = wallets[&allocation.owner].address().clone();
            (
                Utxo::new(genesis_hash, index as u32),
                TxOutput::new(allocation.value, owner),
            )
        })
        .collect();
    println!("📦 初始池: {} 个UTXO, 总额 {}", genesis_pool.len(), genesis_pool.total_value());

    // 在预演池上逐笔构造，后面的转账可以花费前面产生的找零
    let mut projection = TxHandler::with_policy(Secp256k1Crypto::new(), &genesis_pool, config.policy);
    let mut batch = Vec::new();
    for payment in &config.payments {
        let sender = &wallets[&payment.from];
        let recipient = wallets[&payment.to].address();

        match sender.create_transaction(&crypto, projection.utxo_pool(), recipient, payment.amount)? {
            Some(tx) => {
                println!(
                    "📝 {} -> {}: {} (交易 {})",
                    payment.from,
                    payment.to,
                    payment.amount,
                    tx.hash()
                );
                projection.handle_txs(slice::from_ref(&tx))?;
                batch.push(tx);
            }
            None => println!(
                "⚠️  余额不足，跳过转账 {} -> {}: {}",
                payment.from, payment.to, payment.amount
            ),
        }
    }

    // 正式处理整批交易
    let mut handler = TxHandler::with_policy(crypto, &genesis_pool, config.policy);
    let outcome = handler
        .handle_txs_detailed(&batch)
        .context("批处理因密码学后端故障中止")?;

    println!("\n✅ 接受 {} 笔交易", outcome.accepted.len());
    for tx in &outcome.accepted {
        println!("  {} ({} 输入, {} 输出)", tx.hash(), tx.num_inputs(), tx.num_outputs());
    }
    if !outcome.rejected.is_empty() {
        println!("❌ 拒绝 {} 笔交易", outcome.rejected.len());
        for (hash, reason) in &outcome.rejected {
            println!("  {}: {}", hash, reason);
        }
    }

    println!("\n💰 余额:");
    for (owner, wallet) in &wallets {
        println!("  {}: {}", owner, wallet.balance(handler.utxo_pool()));
    }

    debug!(
        "final pool: {}",
        serde_json::to_string_pretty(handler.utxo_pool())?
    );

    Ok(())
}
