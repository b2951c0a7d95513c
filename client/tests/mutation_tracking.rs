use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use journal_client::{
    cluster::Cluster,
    data_access::JournalDataAccess,
    e2e_helpers::ledger::InMemoryLedger,
    error::{
        DataAccessError,
        DataAccessResult,
    },
    logs::RecordingNotifier,
    mutations::{
        MutationKind,
        MutationStatus,
    },
    query_cache::{
        QueryKey,
        QueryOptions,
    },
    rpc::JournalRpc,
    transactions::DEFAULT_FUND_AMOUNT,
};
use solana_account::Account;
use solana_address::Address;
use solana_sdk::{
    hash::Hash,
    signature::{
        Keypair,
        Signature,
        Signer,
    },
    transaction::Transaction,
};
use tokio::sync::Semaphore;

/// Holds every transaction at the door until a permit is released.
struct GatedRpc {
    ledger: InMemoryLedger,
    gate: Semaphore,
}

#[async_trait]
impl JournalRpc for GatedRpc {
    async fn get_account(&self, address: &Address) -> DataAccessResult<Option<Account>> {
        self.ledger.get_account(address).await
    }

    async fn get_program_accounts(
        &self,
        program_id: &Address,
        discriminator: &[u8],
    ) -> DataAccessResult<Vec<(Address, Account)>> {
        self.ledger
            .get_program_accounts(program_id, discriminator)
            .await
    }

    async fn get_latest_blockhash(&self) -> DataAccessResult<Hash> {
        self.ledger.get_latest_blockhash().await
    }

    async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
    ) -> DataAccessResult<Signature> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| DataAccessError::Network(e.to_string()))?;
        self.ledger.send_and_confirm_transaction(transaction).await
    }

    async fn get_version(&self) -> DataAccessResult<String> {
        self.ledger.get_version().await
    }
}

fn gated(cluster: &Cluster) -> (JournalDataAccess<GatedRpc>, Keypair) {
    let ledger = InMemoryLedger::new(cluster);
    let author = Keypair::new();
    ledger.airdrop(&author.pubkey(), DEFAULT_FUND_AMOUNT);

    let access = JournalDataAccess::new(GatedRpc {
        ledger,
        gate: Semaphore::new(0),
    })
    .with_notifier(Arc::new(RecordingNotifier::default()));

    (access, author)
}

#[tokio::test]
async fn tracker_is_pending_while_in_flight() {
    let cluster = Cluster::devnet();
    let (access, author) = gated(&cluster);

    let create = access.create_entry(&cluster, &author, "T", "M");
    let observe = async {
        tokio::task::yield_now().await;
        assert_eq!(
            access.mutation_status(MutationKind::Create),
            MutationStatus::Pending
        );
        assert_eq!(
            access.mutation_status(MutationKind::Update),
            MutationStatus::Idle
        );
        access.rpc().gate.add_permits(1);
    };

    let (result, ()) = futures::join!(create, observe);
    assert!(result.is_ok());
    assert_eq!(
        access.mutation_status(MutationKind::Create),
        MutationStatus::Success
    );
}

#[tokio::test]
async fn dropping_an_in_flight_mutation_releases_the_tracker() {
    let cluster = Cluster::devnet();
    let (access, author) = gated(&cluster);

    let create = access.create_entry(&cluster, &author, "T", "M");
    assert!(create.now_or_never().is_none());

    assert_eq!(
        access.mutation_status(MutationKind::Create),
        MutationStatus::Idle
    );
    let address = access.entry_address(&cluster, &author.pubkey(), "T");
    assert!(access.rpc().ledger.account(&address).is_none());
}

#[tokio::test]
async fn invalidation_is_scoped_to_the_mutated_cluster() {
    let devnet = Cluster::devnet();
    let testnet = Cluster::testnet();
    let (access, author) = gated(&devnet);
    access.rpc().gate.add_permits(1);

    // Devnet and testnet share a deployment, so the same ledger serves both.
    access.entries(&devnet).await.unwrap();
    access.entries(&testnet).await.unwrap();

    access
        .create_entry(&devnet, &author, "T", "M")
        .await
        .unwrap();

    let options = QueryOptions::default();
    assert!(access.cache().is_stale(&QueryKey::entries(&devnet), &options));
    assert!(!access.cache().is_stale(&QueryKey::entries(&testnet), &options));

    assert_eq!(access.entries(&devnet).await.unwrap().len(), 1);
    // Testnet still serves its cached, pre-mutation list.
    assert!(access.entries(&testnet).await.unwrap().is_empty());
}
