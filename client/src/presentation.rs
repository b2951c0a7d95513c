//! View-models a presentation layer renders. They only derive state from data-access results;
//! every decision about the chain is made in [`crate::data_access`].

use solana_account::Account;
use solana_address::Address;
use solana_sdk::signature::{
    Signature,
    Signer,
};
use url::Url;

use crate::{
    bindings::JournalBindings,
    cluster::Cluster,
    data_access::JournalDataAccess,
    error::DataAccessResult,
    mutations::EntryMutation,
    rpc::JournalRpc,
    views::JournalEntryAccount,
};

pub const NO_ENTRIES_TITLE: &str = "No accounts";
pub const NO_ENTRIES_MESSAGE: &str = "No accounts found. Initialize one to get started.";
pub const PROGRAM_MISSING_MESSAGE: &str = "Program account not found. Make sure you have deployed \
                                           the program and are on the correct cluster.";
pub const WALLET_REQUIRED_MESSAGE: &str = "Connect your wallet to create a new entry.";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this entry?";

const EXPLORER_URL: &str = "https://explorer.solana.com";

/// The create/update form. The title doubles as the entry key, so an update form only edits the
/// message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EntryForm {
    pub title: String,
    pub message: String,
}

impl EntryForm {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.message.trim().is_empty()
    }

    /// Whether the submit trigger should be enabled.
    pub fn can_submit(&self, wallet_connected: bool, pending: bool) -> bool {
        wallet_connected && self.is_valid() && !pending
    }

    /// The copy shown in place of a submission when no wallet is connected.
    pub fn wallet_notice(wallet_connected: bool) -> Option<&'static str> {
        (!wallet_connected).then_some(WALLET_REQUIRED_MESSAGE)
    }

    pub fn to_create(&self) -> EntryMutation {
        EntryMutation::create(&self.title, &self.message)
    }

    pub fn to_update(&self) -> EntryMutation {
        EntryMutation::update(&self.title, &self.message)
    }
}

/// What the entry list shows for the current state of its query. `None` means the query hasn't
/// settled yet.
#[derive(Debug)]
pub enum EntryListView<'a> {
    Loading,
    Empty,
    Entries(&'a [JournalEntryAccount]),
    Failed(String),
}

impl<'a> EntryListView<'a> {
    pub fn from_query(query: Option<&'a DataAccessResult<Vec<JournalEntryAccount>>>) -> Self {
        match query {
            None => Self::Loading,
            Some(Ok(entries)) if entries.is_empty() => Self::Empty,
            Some(Ok(entries)) => Self::Entries(entries),
            Some(Err(err)) => Self::Failed(err.to_string()),
        }
    }

    /// The copy shown in place of a list, if any.
    pub fn placeholder(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Empty => Some((NO_ENTRIES_TITLE, NO_ENTRIES_MESSAGE)),
            _ => None,
        }
    }
}

/// Gates every journal view on the program being deployed on the selected cluster.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgramGuard {
    Loading,
    Missing,
    Ready,
}

impl ProgramGuard {
    /// A failed lookup is shown the same way as a missing program.
    pub fn from_query(query: Option<&DataAccessResult<Option<Account>>>) -> Self {
        match query {
            None => Self::Loading,
            Some(Ok(Some(_))) => Self::Ready,
            Some(Ok(None)) | Some(Err(_)) => Self::Missing,
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Missing => Some(PROGRAM_MISSING_MESSAGE),
            _ => None,
        }
    }
}

/// Shortens a long address to its first and last `len` characters. Values the ends would
/// overlap on are returned whole.
pub fn ellipsify(value: &str, len: usize) -> String {
    if value.len() <= 30 || !value.is_ascii() || len.saturating_mul(2) >= value.len() {
        return value.to_string();
    }
    format!("{}..{}", &value[..len], &value[value.len() - len..])
}

/// An explorer link for `path` (e.g. `account/<address>` or `tx/<signature>`) on `cluster`.
pub fn explorer_url(path: &str, cluster: &Cluster) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(EXPLORER_URL)?.join(path)?;
    url.set_query(cluster.explorer_query().as_deref());
    Ok(url)
}

pub fn account_explorer_url(address: &Address, cluster: &Cluster) -> Result<Url, url::ParseError> {
    explorer_url(&format!("account/{address}"), cluster)
}

pub fn transaction_explorer_url(
    signature: &Signature,
    cluster: &Cluster,
) -> Result<Url, url::ParseError> {
    explorer_url(&format!("tx/{signature}"), cluster)
}

/// Asks the user a yes/no question.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Deletes the entry keyed by `title` after the user confirms. A declined prompt returns
/// `Ok(None)` without touching the data-access layer.
pub async fn delete_with_confirmation<R, B, S, C>(
    access: &JournalDataAccess<R, B>,
    cluster: &Cluster,
    signer: &S,
    title: &str,
    confirm: &C,
) -> DataAccessResult<Option<Signature>>
where
    R: JournalRpc,
    B: JournalBindings,
    S: Signer + ?Sized,
    C: Confirm + ?Sized,
{
    if !confirm.confirm(DELETE_PROMPT) {
        return Ok(None);
    }
    access.delete_entry(cluster, signer, title).await.map(Some)
}
