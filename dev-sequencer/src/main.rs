// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use alloy_sol_types::Eip712Domain;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing_subscriber::EnvFilter;

use app_core::encoding::L2MessageEncoder;
use app_core::inbox::InboxTestVector;
use app_core::message::ChainParams;
use app_core::transaction::Eip712Signer;
use dev_sequencer::api::{self, AppState};
use dev_sequencer::backend::SequencerBackend;
use dev_sequencer::demo;
use dev_sequencer::l1_emulator::ChainEmulator;
use dev_sequencer::storage::Storage;

const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8547";
const DEFAULT_DB_PATH: &str = "dev-sequencer.db";
const DEFAULT_SQLITE_SYNCHRONOUS: &str = "NORMAL";
const DEFAULT_DEMO_ACCOUNTS: usize = 10;
const DEFAULT_MAX_BODY_BYTES: usize = 128 * 1024;
const DEFAULT_DOMAIN_NAME: &str = "ArbitrumDevChain";
const DEFAULT_DOMAIN_VERSION: &str = "1";
const DEFAULT_DOMAIN_CHAIN_ID: u64 = 1;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let mut rng = match config.l1_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let owner = random_address(&mut rng);
    let rollup_address = random_address(&mut rng);
    let l1 = match config.l1_seed {
        Some(seed) => ChainEmulator::with_seed(seed),
        None => ChainEmulator::new(),
    };

    let mut storage = Storage::open(&config.db_path, &config.sqlite_synchronous)
        .map_err(|e| format!("open inbox store {}: {e}", config.db_path))?;
    // Persisted rows reference blocks of a previous, now gone, L1 ledger.
    storage
        .reset()
        .map_err(|e| format!("reset inbox store: {e}"))?;

    let domain = config.build_domain(rollup_address);
    let backend = Arc::new(SequencerBackend::new(
        storage,
        l1,
        Eip712Signer::new(domain),
        L2MessageEncoder::default(),
    ));

    demo::initialize_chain(&*backend, rollup_address, owner, ChainParams::default())
        .map_err(|e| format!("initialize chain: {e}"))?;
    let accounts = demo::dev_accounts(config.demo_accounts)?;
    demo::fund_accounts(&*backend, &accounts, config.demo_deposit, rollup_address)
        .map_err(|e| format!("fund demo accounts: {e}"))?;

    println!("Rollup address: {rollup_address}");
    println!("Owner: {owner}");
    println!("Available Accounts");
    println!("==================");
    for (index, account) in accounts.iter().enumerate() {
        println!(
            "({index}) {} ({} ETH)",
            account.address,
            demo::wei_to_eth(config.demo_deposit)
        );
    }
    println!();
    println!("Private Keys");
    println!("==================");
    for (index, account) in accounts.iter().enumerate() {
        println!("({index}) {}", account.private_key);
    }

    let state = Arc::new(AppState {
        backend: Arc::clone(&backend),
    });
    let app = api::router(state, config.max_body_bytes);
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;

    tracing::info!(address = %config.http_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(path) = config.save_messages.as_deref() {
        let vector = InboxTestVector::new(backend.snapshot_messages());
        std::fs::write(path, vector.to_json()?)
            .map_err(|e| format!("write inbox test vector {path}: {e}"))?;
        tracing::info!(path, messages = vector.inbox.len(), "inbox test vector saved");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

fn random_address(rng: &mut StdRng) -> Address {
    let mut bytes = [0_u8; 20];
    rng.fill_bytes(&mut bytes);
    Address::from(bytes)
}

struct Config {
    http_addr: String,
    db_path: String,
    sqlite_synchronous: String,
    save_messages: Option<String>,
    demo_accounts: usize,
    demo_deposit: U256,
    l1_seed: Option<u64>,
    max_body_bytes: usize,
    domain_name: String,
    domain_version: String,
    domain_chain_id: u64,
}

impl Config {
    fn from_env() -> Result<Self, String> {
        let demo_deposit = match std::env::var("SEQ_DEMO_DEPOSIT_WEI") {
            Ok(value) => value
                .parse::<U256>()
                .map_err(|e| format!("invalid SEQ_DEMO_DEPOSIT_WEI: {e}"))?,
            Err(_) => demo::default_deposit(),
        };
        let l1_seed = match std::env::var("SEQ_L1_SEED") {
            Ok(value) => Some(
                value
                    .parse::<u64>()
                    .map_err(|e| format!("invalid SEQ_L1_SEED: {e}"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            http_addr: env_string("SEQ_HTTP_ADDR", DEFAULT_HTTP_ADDR),
            db_path: env_string("SEQ_DB_PATH", DEFAULT_DB_PATH),
            sqlite_synchronous: env_string("SEQ_SQLITE_SYNCHRONOUS", DEFAULT_SQLITE_SYNCHRONOUS),
            save_messages: std::env::var("SEQ_SAVE_MESSAGES").ok(),
            demo_accounts: env_usize("SEQ_DEMO_ACCOUNTS", DEFAULT_DEMO_ACCOUNTS),
            demo_deposit,
            l1_seed,
            max_body_bytes: env_usize("SEQ_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
            domain_name: env_string("SEQ_DOMAIN_NAME", DEFAULT_DOMAIN_NAME),
            domain_version: env_string("SEQ_DOMAIN_VERSION", DEFAULT_DOMAIN_VERSION),
            domain_chain_id: env_u64("SEQ_DOMAIN_CHAIN_ID", DEFAULT_DOMAIN_CHAIN_ID),
        })
    }

    fn build_domain(&self, verifying_contract: Address) -> Eip712Domain {
        Eip712Domain {
            name: Some(self.domain_name.clone().into()),
            version: Some(self.domain_version.clone().into()),
            chain_id: Some(U256::from(self.domain_chain_id)),
            verifying_contract: Some(verifying_contract),
            salt: None,
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
