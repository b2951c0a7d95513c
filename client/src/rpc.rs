//! The RPC seam between the data-access layer and a node.

use async_trait::async_trait;
use solana_account::Account;
use solana_address::Address;
use solana_sdk::{
    hash::Hash,
    signature::Signature,
    transaction::Transaction,
};

use crate::error::DataAccessResult;

/// The node operations the data-access layer needs. Implemented by
/// [`crate::transactions::CustomRpcClient`] for real clusters and by
/// [`crate::e2e_helpers::ledger::InMemoryLedger`] for tests.
#[async_trait]
pub trait JournalRpc: Send + Sync {
    /// Returns `None` when no account exists at `address`.
    async fn get_account(&self, address: &Address) -> DataAccessResult<Option<Account>>;

    /// Every account owned by `program_id` whose data starts with `discriminator`.
    async fn get_program_accounts(
        &self,
        program_id: &Address,
        discriminator: &[u8],
    ) -> DataAccessResult<Vec<(Address, Account)>>;

    async fn get_latest_blockhash(&self) -> DataAccessResult<Hash>;

    /// Sends a signed transaction and waits for confirmation. Never resubmits.
    async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
    ) -> DataAccessResult<Signature>;

    /// The node's software version.
    async fn get_version(&self) -> DataAccessResult<String>;
}
