use scrooge_ledger::{
    Crypto, Secp256k1Crypto, TxHandler, TxHash, TxOutput, Utxo, UtxoPool, Wallet,
};

// 辅助函数：为钱包构造一个池，每个金额一个 UTXO
fn pool_for(wallet: &Wallet<Secp256k1Crypto>, values: &[i64]) -> UtxoPool {
    let origin = TxHash::new([0x42; 32]);
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            (
                Utxo::new(origin, index as u32),
                TxOutput::new(*value, wallet.address().clone()),
            )
        })
        .collect()
}

#[test]
fn test_wallet_creation() {
    let crypto = Secp256k1Crypto::new();
    let wallet = Wallet::generate(&crypto).unwrap();

    // 压缩公钥 33 字节
    assert_eq!(wallet.address().as_bytes().len(), 33);

    // 指纹是 40 个十六进制字符（20 字节的 RIPEMD160 哈希）
    assert_eq!(wallet.fingerprint().len(), 40);
    assert!(wallet.fingerprint().chars().all(|c| c.is_ascii_hexdigit()));

    // 创建另一个钱包，验证地址唯一性
    let wallet2 = Wallet::generate(&crypto).unwrap();
    assert_ne!(wallet.address(), wallet2.address());
    assert_ne!(wallet.fingerprint(), wallet2.fingerprint());
}

#[test]
fn test_transaction_creation_with_sufficient_funds() {
    let crypto = Secp256k1Crypto::new();
    let wallet = Wallet::generate(&crypto).unwrap();
    let recipient = Wallet::generate(&crypto).unwrap();
    let pool = pool_for(&wallet, &[100]);

    let tx = wallet
        .create_transaction(&crypto, &pool, recipient.address(), 50)
        .unwrap()
        .unwrap();

    // 验证交易输入
    assert_eq!(tx.num_inputs(), 1);
    assert_eq!(tx.input(0).unwrap().output_index, 0);
    assert!(tx.input(0).unwrap().signature.is_some());

    // 一个给接收者，一个找零
    assert_eq!(tx.num_outputs(), 2);
    assert_eq!(tx.output(0).unwrap().value, 50);
    assert_eq!(&tx.output(0).unwrap().address, recipient.address());
    assert_eq!(tx.output(1).unwrap().value, 50);
    assert_eq!(&tx.output(1).unwrap().address, wallet.address());
}

#[test]
fn test_transaction_creation_with_exact_funds() {
    let crypto = Secp256k1Crypto::new();
    let wallet = Wallet::generate(&crypto).unwrap();
    let recipient = Wallet::generate(&crypto).unwrap();
    let pool = pool_for(&wallet, &[50]);

    let tx = wallet
        .create_transaction(&crypto, &pool, recipient.address(), 50)
        .unwrap()
        .unwrap();

    // 只有一个输出，没有找零
    assert_eq!(tx.num_outputs(), 1);
    assert_eq!(tx.output(0).unwrap().value, 50);
}

#[test]
fn test_transaction_creation_with_insufficient_funds() {
    let crypto = Secp256k1Crypto::new();
    let wallet = Wallet::generate(&crypto).unwrap();
    let recipient = Wallet::generate(&crypto).unwrap();
    let pool = pool_for(&wallet, &[30]);

    // 资金不足应该返回None
    let tx = wallet
        .create_transaction(&crypto, &pool, recipient.address(), 50)
        .unwrap();
    assert!(tx.is_none());

    // 非正金额同样返回None
    assert!(wallet
        .create_transaction(&crypto, &pool, recipient.address(), 0)
        .unwrap()
        .is_none());
}

#[test]
fn test_only_own_utxos_are_selected() {
    let crypto = Secp256k1Crypto::new();
    let wallet = Wallet::generate(&crypto).unwrap();
    let other = Wallet::generate(&crypto).unwrap();

    let mut pool = pool_for(&wallet, &[10]);
    pool.add_utxo(
        Utxo::new(TxHash::new([0x99; 32]), 0),
        TxOutput::new(1_000, other.address().clone()),
    );

    assert_eq!(wallet.balance(&pool), 10);
    assert!(wallet
        .create_transaction(&crypto, &pool, other.address(), 20)
        .unwrap()
        .is_none());
}

#[test]
fn test_transaction_creation_with_multiple_inputs_is_accepted() {
    let crypto = Secp256k1Crypto::new();
    let wallet = Wallet::generate(&crypto).unwrap();
    let recipient = Wallet::generate(&crypto).unwrap();
    let pool = pool_for(&wallet, &[30, 20, 10]);

    let tx = wallet
        .create_transaction(&crypto, &pool, recipient.address(), 45)
        .unwrap()
        .unwrap();

    // 需要前两个输入才能满足金额
    assert_eq!(tx.num_inputs(), 2);
    assert_eq!(tx.output(1).unwrap().value, 5);

    // 钱包签名的交易能被处理器接受
    let mut handler = TxHandler::new(Secp256k1Crypto::new(), &pool);
    let accepted = handler.handle_txs(&[tx]).unwrap();
    assert_eq!(accepted.len(), 1);
    assert_eq!(wallet.balance(handler.utxo_pool()), 15);
    assert_eq!(recipient.balance(handler.utxo_pool()), 45);
}

#[test]
fn test_wallet_sign_matches_crypto() {
    let crypto = Secp256k1Crypto::new();
    let wallet = Wallet::generate(&crypto).unwrap();

    let signature = wallet.sign(&crypto, b"message").unwrap();
    assert!(crypto.verify(wallet.address(), b"message", &signature).unwrap());
}
