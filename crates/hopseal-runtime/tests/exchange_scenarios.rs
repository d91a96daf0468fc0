//! Two-party exchange runs over the tokio runtime.

use hopseal_crypto::MIN_RSA_BITS;
use hopseal_runtime::{
    ConfigError, ExchangeConfig, RuntimeError, SuiteKind, SystemEnv, exchange_message,
    run_exchange,
};

#[tokio::test]
async fn ten_messages_over_aes_gcm() {
    let config = ExchangeConfig::default();

    let report = run_exchange(&config, SystemEnv::new()).await.unwrap();

    assert_eq!(report.sent, 10);
    let expected: Vec<_> = (0..10).map(exchange_message).collect();
    assert_eq!(report.received, expected);
}

#[tokio::test]
async fn messages_over_chacha20() {
    let config = ExchangeConfig {
        suite: SuiteKind::ChaCha20Poly1305,
        messages: 25,
        ..ExchangeConfig::default()
    };

    let report = run_exchange(&config, SystemEnv::new()).await.unwrap();

    assert_eq!(report.received.len(), 25);
}

#[tokio::test]
async fn one_confidential_message_over_rsa_oaep() {
    let config = ExchangeConfig { suite: SuiteKind::RsaOaep, messages: 1, rsa_bits: MIN_RSA_BITS };

    let report = run_exchange(&config, SystemEnv::new()).await.unwrap();

    assert_eq!(report.received, vec![exchange_message(0)]);
}

#[tokio::test]
async fn zero_messages_is_a_config_error() {
    let config = ExchangeConfig { messages: 0, ..ExchangeConfig::default() };

    let result = run_exchange(&config, SystemEnv::new()).await;

    assert!(matches!(result, Err(RuntimeError::Config(ConfigError::NoMessages))));
}
