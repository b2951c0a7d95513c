//! Read-only helpers for fetching journal entry accounts and decoding them into typed records.

use journal_interface::{
    error::JournalError,
    state::journal_entry::JournalEntryState,
};
use solana_account::Account;
use solana_address::Address;

use crate::{
    bindings::JournalBindings,
    cluster::Cluster,
    error::{
        DataAccessError,
        DataAccessResult,
    },
    rpc::JournalRpc,
};

/// A decoded journal entry and the address it lives at.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JournalEntryAccount {
    pub address: Address,
    pub data: JournalEntryState,
}

/// Every journal entry account owned by the program on `cluster`.
///
/// A single scan filtered on the entry discriminator. An account that matches the filter but
/// doesn't decode fails the whole fetch.
pub async fn fetch_entry_accounts<R, B>(
    rpc: &R,
    bindings: &B,
    cluster: &Cluster,
) -> DataAccessResult<Vec<JournalEntryAccount>>
where
    R: JournalRpc + ?Sized,
    B: JournalBindings + ?Sized,
{
    let discriminator = bindings.account_discriminator();
    rpc.get_program_accounts(&cluster.program_id(), &discriminator)
        .await?
        .into_iter()
        .map(|(address, account)| {
            Ok(JournalEntryAccount {
                data: bindings.decode_account(&address, &account.data)?,
                address,
            })
        })
        .collect()
}

/// The journal entry at `address` on `cluster`.
pub async fn fetch_entry_account<R, B>(
    rpc: &R,
    bindings: &B,
    cluster: &Cluster,
    address: &Address,
) -> DataAccessResult<JournalEntryAccount>
where
    R: JournalRpc + ?Sized,
    B: JournalBindings + ?Sized,
{
    let account = rpc
        .get_account(address)
        .await?
        .ok_or(DataAccessError::NotFound(*address))?;

    if account.owner != cluster.program_id() {
        return Err(DataAccessError::Decode {
            address: *address,
            error: JournalError::InvalidAccountOwner,
        });
    }

    Ok(JournalEntryAccount {
        address: *address,
        data: bindings.decode_account(address, &account.data)?,
    })
}

/// The program account itself, or `None` if the program isn't deployed on `cluster`.
pub async fn fetch_program_account<R>(rpc: &R, cluster: &Cluster) -> DataAccessResult<Option<Account>>
where
    R: JournalRpc + ?Sized,
{
    rpc.get_account(&cluster.program_id()).await
}
