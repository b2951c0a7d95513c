//! The data-access façade: cached reads, tracked mutations, and the cache invalidation that ties
//! them together.

use std::sync::Arc;

use solana_account::Account;
use solana_address::Address;
use solana_sdk::signature::{
    Signature,
    Signer,
};
use strum::EnumCount;

use crate::{
    bindings::{
        AnchorJournalBindings,
        JournalBindings,
    },
    cluster::Cluster,
    error::DataAccessResult,
    logs::{
        ConsoleNotifier,
        Notification,
        Notifier,
    },
    mutations::{
        submit_mutation,
        EntryMutation,
        MutationKind,
        MutationStatus,
        MutationTracker,
    },
    query_cache::{
        QueryCache,
        QueryKey,
        QueryOptions,
        QueryPrefix,
    },
    rpc::JournalRpc,
    transactions::SendTransactionConfig,
    views::{
        fetch_entry_account,
        fetch_entry_accounts,
        fetch_program_account,
        JournalEntryAccount,
    },
};

#[derive(Clone, Debug)]
pub struct DataAccessConfig {
    pub send: SendTransactionConfig,
    /// Options for entry and cluster version queries.
    pub query: QueryOptions,
    /// Options for the program account query. Never retried by default: a missing program should
    /// show up right away.
    pub program_query: QueryOptions,
}

impl Default for DataAccessConfig {
    fn default() -> Self {
        Self {
            send: Default::default(),
            query: Default::default(),
            program_query: QueryOptions::no_retry(),
        }
    }
}

/// Every read and write of journal entries goes through here. Reads are cached per cluster; a
/// successful mutation invalidates every journal query on its cluster, so the next read sees it.
pub struct JournalDataAccess<R, B = AnchorJournalBindings> {
    rpc: R,
    bindings: B,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
    config: DataAccessConfig,
    trackers: [MutationTracker; MutationKind::COUNT],
}

impl<R: JournalRpc> JournalDataAccess<R> {
    pub fn new(rpc: R) -> Self {
        Self::with_bindings(rpc, AnchorJournalBindings)
    }
}

impl<R: JournalRpc, B: JournalBindings> JournalDataAccess<R, B> {
    pub fn with_bindings(rpc: R, bindings: B) -> Self {
        Self {
            rpc,
            bindings,
            cache: QueryCache::new(),
            notifier: Arc::new(ConsoleNotifier),
            config: Default::default(),
            trackers: Default::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_config(mut self, config: DataAccessConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn bindings(&self) -> &B {
        &self.bindings
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn config(&self) -> &DataAccessConfig {
        &self.config
    }

    /// The node version `cluster` runs, cached until the cluster's queries are cleared.
    pub async fn cluster_version(&self, cluster: &Cluster) -> DataAccessResult<String> {
        let key = QueryKey::new("get-cluster-version", "version", cluster);
        self.cache
            .fetch(key, &self.config.query, || self.rpc.get_version())
            .await
    }

    /// The program account on `cluster`, or `None` if it isn't deployed there.
    pub async fn program_account(&self, cluster: &Cluster) -> DataAccessResult<Option<Account>> {
        let version = self.cluster_version(cluster).await?;
        self.cache
            .fetch(
                QueryKey::program_account(cluster, Some(version)),
                &self.config.program_query,
                || fetch_program_account(&self.rpc, cluster),
            )
            .await
    }

    pub async fn entries(&self, cluster: &Cluster) -> DataAccessResult<Vec<JournalEntryAccount>> {
        self.cache
            .fetch(QueryKey::entries(cluster), &self.config.query, || {
                fetch_entry_accounts(&self.rpc, &self.bindings, cluster)
            })
            .await
    }

    pub async fn entry(
        &self,
        cluster: &Cluster,
        address: &Address,
    ) -> DataAccessResult<JournalEntryAccount> {
        self.cache
            .fetch(QueryKey::entry(cluster, *address), &self.config.query, || {
                fetch_entry_account(&self.rpc, &self.bindings, cluster, address)
            })
            .await
    }

    /// Where the entry `owner` keys with `title` lives on `cluster`.
    pub fn entry_address(&self, cluster: &Cluster, owner: &Address, title: &str) -> Address {
        self.bindings
            .entry_address(&cluster.program_id(), owner, title)
    }

    pub async fn create_entry<S: Signer + ?Sized>(
        &self,
        cluster: &Cluster,
        signer: &S,
        title: &str,
        message: &str,
    ) -> DataAccessResult<Signature> {
        self.mutate(cluster, EntryMutation::create(title, message), signer)
            .await
    }

    pub async fn update_entry<S: Signer + ?Sized>(
        &self,
        cluster: &Cluster,
        signer: &S,
        title: &str,
        message: &str,
    ) -> DataAccessResult<Signature> {
        self.mutate(cluster, EntryMutation::update(title, message), signer)
            .await
    }

    pub async fn delete_entry<S: Signer + ?Sized>(
        &self,
        cluster: &Cluster,
        signer: &S,
        title: &str,
    ) -> DataAccessResult<Signature> {
        self.mutate(cluster, EntryMutation::delete(title), signer)
            .await
    }

    /// Submits `mutation` once. Either way the outcome is reported to the notifier; on success
    /// every journal query on `cluster` is invalidated.
    pub async fn mutate<S: Signer + ?Sized>(
        &self,
        cluster: &Cluster,
        mutation: EntryMutation,
        signer: &S,
    ) -> DataAccessResult<Signature> {
        let kind = mutation.kind();
        let pending = self.tracker(kind).begin();

        let result = submit_mutation(
            &self.rpc,
            &self.bindings,
            cluster,
            &mutation,
            signer,
            &self.config.send,
        )
        .await;

        match &result {
            Ok(signature) => {
                self.cache.invalidate(&QueryPrefix::journal(cluster));
                self.notifier.notify(Notification::Success {
                    label: kind.success_label().into(),
                    signature: *signature,
                });
            }
            Err(err) => self.notifier.notify(Notification::Failure {
                label: kind.failure_label().into(),
                message: err.to_string(),
            }),
        }
        pending.settle(&result, |signature| *signature);

        result
    }

    pub fn tracker(&self, kind: MutationKind) -> &MutationTracker {
        &self.trackers[kind as usize]
    }

    pub fn mutation_status(&self, kind: MutationKind) -> MutationStatus {
        self.tracker(kind).status()
    }
}
