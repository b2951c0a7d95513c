//! A small query cache keyed by composite query keys, with prefix invalidation and a per-query
//! retry policy.

use std::{
    any::Any,
    collections::HashMap,
    future::Future,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
    },
    time::{
        Duration,
        Instant,
    },
};

use solana_address::Address;

use crate::{
    cluster::Cluster,
    error::DataAccessResult,
};

pub const JOURNAL_NAMESPACE: &str = "journal";
pub const PROGRAM_ACCOUNT_NAMESPACE: &str = "get-program-account";

/// `(namespace, operation, cluster, [address], [cluster version])`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct QueryKey {
    pub namespace: String,
    pub operation: String,
    pub cluster: String,
    pub address: Option<Address>,
    pub version: Option<String>,
}

impl QueryKey {
    pub fn new(namespace: &str, operation: &str, cluster: &Cluster) -> Self {
        Self {
            namespace: namespace.into(),
            operation: operation.into(),
            cluster: cluster.id.clone(),
            address: None,
            version: None,
        }
    }

    /// The list of every journal entry on `cluster`.
    pub fn entries(cluster: &Cluster) -> Self {
        Self::new(JOURNAL_NAMESPACE, "accounts", cluster)
    }

    /// A single journal entry.
    pub fn entry(cluster: &Cluster, address: Address) -> Self {
        Self {
            address: Some(address),
            ..Self::new(JOURNAL_NAMESPACE, "account", cluster)
        }
    }

    /// The program account on `cluster`. Keyed by the node version so a redeployed or upgraded
    /// validator gets checked again.
    pub fn program_account(cluster: &Cluster, version: Option<String>) -> Self {
        Self {
            version,
            ..Self::new(PROGRAM_ACCOUNT_NAMESPACE, "account-info", cluster)
        }
    }
}

/// Matches every key in `namespace`, optionally narrowed to one cluster and operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryPrefix {
    pub namespace: String,
    pub cluster: Option<String>,
    pub operation: Option<String>,
}

impl QueryPrefix {
    pub fn namespace(namespace: &str) -> Self {
        Self {
            namespace: namespace.into(),
            cluster: None,
            operation: None,
        }
    }

    /// Every journal query on `cluster`; what a successful mutation invalidates.
    pub fn journal(cluster: &Cluster) -> Self {
        Self {
            cluster: Some(cluster.id.clone()),
            ..Self::namespace(JOURNAL_NAMESPACE)
        }
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        self.namespace == key.namespace
            && self.cluster.as_ref().is_none_or(|c| *c == key.cluster)
            && self.operation.as_ref().is_none_or(|o| *o == key.operation)
    }
}

#[derive(Clone, Debug)]
pub struct QueryOptions {
    /// How many times a transient failure is retried before it's returned.
    pub retry: u32,
    /// The first retry delay; doubled on every further attempt.
    pub retry_delay: Duration,
    pub max_retry_delay: Duration,
    /// How long a value stays fresh. `None` keeps it fresh until it's invalidated.
    pub stale_time: Option<Duration>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            retry: 3,
            retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(30),
            stale_time: None,
        }
    }
}

impl QueryOptions {
    pub fn no_retry() -> Self {
        Self {
            retry: 0,
            ..Default::default()
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.retry_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_retry_delay)
    }
}

struct CacheSlot {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    invalidated: bool,
}

impl CacheSlot {
    fn is_stale(&self, options: &QueryOptions) -> bool {
        self.invalidated
            || options
                .stale_time
                .is_some_and(|stale_time| self.fetched_at.elapsed() >= stale_time)
    }
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<QueryKey, CacheSlot>,
    /// Bumped on every invalidation so a fetch that raced one stores its result as stale.
    epoch: u64,
}

#[derive(Default)]
pub struct QueryCache {
    state: Mutex<CacheState>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The cached value for `key`, fresh or not.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.lock()
            .slots
            .get(key)
            .and_then(|slot| slot.value.downcast_ref::<T>().cloned())
    }

    fn get_fresh<T: Clone + Send + Sync + 'static>(
        &self,
        key: &QueryKey,
        options: &QueryOptions,
    ) -> Option<T> {
        self.lock()
            .slots
            .get(key)
            .filter(|slot| !slot.is_stale(options))
            .and_then(|slot| slot.value.downcast_ref::<T>().cloned())
    }

    pub fn set<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        self.store(key, value, false);
    }

    fn store<T: Send + Sync + 'static>(&self, key: QueryKey, value: T, invalidated: bool) {
        self.lock().slots.insert(
            key,
            CacheSlot {
                value: Arc::new(value),
                fetched_at: Instant::now(),
                invalidated,
            },
        );
    }

    /// Missing keys count as stale.
    pub fn is_stale(&self, key: &QueryKey, options: &QueryOptions) -> bool {
        self.lock()
            .slots
            .get(key)
            .is_none_or(|slot| slot.is_stale(options))
    }

    /// Marks every entry matching `prefix` stale so the next read refetches it. Marking an
    /// already stale entry is a no-op. Returns how many entries went from fresh to stale.
    pub fn invalidate(&self, prefix: &QueryPrefix) -> usize {
        let mut state = self.lock();
        state.epoch += 1;
        state
            .slots
            .iter_mut()
            .filter(|(key, slot)| !slot.invalidated && prefix.matches(key))
            .map(|(_, slot)| slot.invalidated = true)
            .count()
    }

    pub fn remove(&self, key: &QueryKey) -> bool {
        self.lock().slots.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().slots.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the fresh cached value for `key` or runs `query_fn`, retrying transient failures
    /// per `options`. Successful results are cached; errors never are.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        options: &QueryOptions,
        mut query_fn: F,
    ) -> DataAccessResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = DataAccessResult<T>>,
    {
        if let Some(value) = self.get_fresh::<T>(&key, options) {
            return Ok(value);
        }

        let started_at_epoch = self.lock().epoch;
        let mut attempt = 0;
        loop {
            match query_fn().await {
                Ok(value) => {
                    let raced_invalidation = self.lock().epoch != started_at_epoch;
                    self.store(key, value.clone(), raced_invalidation);
                    return Ok(value);
                }
                Err(err) if err.is_transient() && attempt < options.retry => {
                    tokio::time::sleep(options.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
