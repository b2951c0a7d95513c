//! Lightweight, nonblocking RPC client utilities for funding accounts and sending journal
//! transactions to a live cluster.

use std::{
    future::Future,
    time::Duration,
};

use anyhow::{
    bail,
    Context,
};
use async_trait::async_trait;
use colored::Colorize;
use journal_interface::error::JournalError;
use solana_account::Account;
use solana_address::Address;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{
        RpcAccountInfoConfig,
        RpcProgramAccountsConfig,
        UiAccountEncoding,
    },
    rpc_filter::{
        Memcmp,
        RpcFilterType,
    },
};
use solana_commitment_config::CommitmentConfig;
use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_sdk::{
    hash::Hash,
    message::Instruction,
    signature::{
        Keypair,
        Signature,
        Signer,
    },
    transaction::Transaction,
};

use crate::{
    cluster::Cluster,
    error::{
        DataAccessError,
        DataAccessResult,
    },
    print_kv,
    rpc::JournalRpc,
    LogColor,
};

pub struct CustomRpcClient {
    pub client: RpcClient,
    pub config: SendTransactionConfig,
}

impl Default for CustomRpcClient {
    fn default() -> Self {
        CustomRpcClient::new_from_cluster(&Cluster::localnet(), Default::default())
    }
}

impl CustomRpcClient {
    pub fn new(client: Option<RpcClient>, config: Option<SendTransactionConfig>) -> Self {
        match (client, config) {
            (Some(client), Some(config)) => Self { client, config },
            (client, config) => {
                let CustomRpcClient {
                    client: default_client,
                    config: default_config,
                } = Default::default();
                Self {
                    client: client.unwrap_or(default_client),
                    config: config.unwrap_or(default_config),
                }
            }
        }
    }

    pub fn new_from_url(url: &str, config: SendTransactionConfig) -> Self {
        CustomRpcClient {
            client: RpcClient::new_with_commitment(url.into(), CommitmentConfig::confirmed()),
            config,
        }
    }

    pub fn new_from_cluster(cluster: &Cluster, config: SendTransactionConfig) -> Self {
        Self::new_from_url(&cluster.url, config)
    }

    pub async fn fund_account(&self, address: &Address) -> anyhow::Result<()> {
        fund(&self.client, address).await
    }

    pub async fn fund_new_account(&self) -> anyhow::Result<Keypair> {
        let kp = Keypair::new();
        fund(&self.client, &kp.pubkey()).await?;

        Ok(kp)
    }
}

const MAX_TRIES: u8 = 20;
const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub const DEFAULT_FUND_AMOUNT: u64 = 10_000_000_000;

async fn fund(rpc: &RpcClient, address: &Address) -> anyhow::Result<()> {
    let airdrop_signature: Signature = rpc
        .request_airdrop(address, DEFAULT_FUND_AMOUNT)
        .await
        .context("Failed to request airdrop")?;

    let signature = &airdrop_signature;
    let landed = poll_until_confirmed(MAX_TRIES, POLL_INTERVAL, move || async move {
        rpc.confirm_transaction(signature)
            .await
            .context("Couldn't confirm transaction")
    })
    .await?;

    if !landed {
        bail!("Airdrop did not land.");
    }

    Ok(())
}

/// Polls `confirmed` once, then up to `retries` more times with `interval` in between. Returns
/// whether any poll confirmed.
async fn poll_until_confirmed<F, Fut>(
    retries: u8,
    interval: Duration,
    mut confirmed: F,
) -> anyhow::Result<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    for attempt in 0..=retries {
        if confirmed().await? {
            return Ok(true);
        }
        if attempt < retries {
            tokio::time::sleep(interval).await;
        }
    }

    Ok(false)
}

#[derive(Clone, Debug)]
pub struct SendTransactionConfig {
    pub compute_budget: Option<u32>,
    pub debug_logs: Option<bool>,
}

impl Default for SendTransactionConfig {
    fn default() -> Self {
        SendTransactionConfig {
            compute_budget: Default::default(),
            debug_logs: Some(false),
        }
    }
}

impl SendTransactionConfig {
    /// Prepends the compute budget instructions, if a budget is configured.
    pub fn with_compute_budget(&self, instructions: &[Instruction]) -> Vec<Instruction> {
        [
            self.compute_budget.map_or(vec![], |budget| {
                vec![
                    ComputeBudgetInstruction::set_compute_unit_limit(budget),
                    ComputeBudgetInstruction::set_compute_unit_price(1),
                ]
            }),
            instructions.to_vec(),
        ]
        .concat()
    }

    pub fn log_submission(&self, payer: &Address, signature: &Signature) {
        if matches!(self.debug_logs, Some(true)) {
            print_kv!("Payer", payer, LogColor::Info);
            print_kv!("Signature", signature, LogColor::Info);
        }
    }
}

#[async_trait]
impl JournalRpc for CustomRpcClient {
    async fn get_account(&self, address: &Address) -> DataAccessResult<Option<Account>> {
        Ok(self
            .client
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await?
            .value)
    }

    async fn get_program_accounts(
        &self,
        program_id: &Address,
        discriminator: &[u8],
    ) -> DataAccessResult<Vec<(Address, Account)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                0,
                discriminator.to_vec(),
            ))]),
            account_config: RpcAccountInfoConfig {
                commitment: Some(CommitmentConfig::confirmed()),
                encoding: Some(UiAccountEncoding::Base64),
                data_slice: None,
                min_context_slot: None,
            },
            with_context: None,
            sort_results: Some(true),
        };

        self.client
            .get_program_ui_accounts_with_config(program_id, config)
            .await?
            .into_iter()
            .map(|(address, account)| {
                account
                    .decode::<Account>()
                    .map(|account| (address, account))
                    .ok_or(DataAccessError::Decode {
                        address,
                        error: JournalError::InvalidAccountData,
                    })
            })
            .collect()
    }

    async fn get_latest_blockhash(&self) -> DataAccessResult<Hash> {
        Ok(self.client.get_latest_blockhash().await?)
    }

    async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
    ) -> DataAccessResult<Signature> {
        Ok(self.client.send_and_confirm_transaction(transaction).await?)
    }

    async fn get_version(&self) -> DataAccessResult<String> {
        Ok(self.client.get_version().await?.solana_core)
    }
}
