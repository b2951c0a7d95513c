use std::{
    sync::Arc,
    time::Duration,
};

use solana_address::Address;
use solana_sdk::signature::{
    Keypair,
    Signer,
};

use crate::{
    cluster::Cluster,
    data_access::{
        DataAccessConfig,
        JournalDataAccess,
    },
    error::DataAccessResult,
    logs::RecordingNotifier,
    query_cache::QueryOptions,
    transactions::DEFAULT_FUND_AMOUNT,
    views::JournalEntryAccount,
};

pub mod ledger;

use ledger::InMemoryLedger;

/// Convenience harness for end-to-end tests and offline demos.
///
/// Upon instantiation it:
/// - Starts an [`InMemoryLedger`] for `cluster`, with the journal program deployed unless
///   [`E2e::without_program`] is used.
/// - Wires a [`JournalDataAccess`] to it with a [`RecordingNotifier`] and millisecond retry
///   delays.
pub struct E2e {
    pub cluster: Cluster,
    pub access: JournalDataAccess<InMemoryLedger>,
    pub notifier: Arc<RecordingNotifier>,
}

impl E2e {
    pub fn new(cluster: Cluster) -> Self {
        let ledger = InMemoryLedger::new(&cluster);
        Self::with_ledger(cluster, ledger)
    }

    pub fn without_program(cluster: Cluster) -> Self {
        let ledger = InMemoryLedger::without_program(&cluster);
        Self::with_ledger(cluster, ledger)
    }

    fn with_ledger(cluster: Cluster, ledger: InMemoryLedger) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        let quick = QueryOptions {
            retry_delay: Duration::from_millis(1),
            max_retry_delay: Duration::from_millis(4),
            ..Default::default()
        };
        let config = DataAccessConfig {
            query: quick.clone(),
            program_query: QueryOptions {
                retry: 0,
                ..quick
            },
            ..Default::default()
        };
        let access = JournalDataAccess::new(ledger)
            .with_notifier(notifier.clone())
            .with_config(config);

        Self {
            cluster,
            access,
            notifier,
        }
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        self.access.rpc()
    }

    /// A new keypair airdropped [`DEFAULT_FUND_AMOUNT`] lamports.
    pub fn new_funded_signer(&self) -> Keypair {
        let kp = Keypair::new();
        self.ledger().airdrop(&kp.pubkey(), DEFAULT_FUND_AMOUNT);
        kp
    }

    pub fn entry_address(&self, owner: &Address, title: &str) -> Address {
        self.access.entry_address(&self.cluster, owner, title)
    }

    /// Fetches the entry `owner` keys with `title`, through the cache.
    pub async fn fetch_entry(&self, owner: &Address, title: &str) -> DataAccessResult<JournalEntryAccount> {
        let address = self.entry_address(owner, title);
        self.access.entry(&self.cluster, &address).await
    }
}
