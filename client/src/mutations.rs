//! The mutation dispatcher: validate, build, sign, submit. Each submission is at-most-once.

use std::sync::{
    Mutex,
    MutexGuard,
    PoisonError,
};

use journal_interface::instructions::JournalInstruction;
use solana_sdk::{
    message::Message,
    signature::{
        Signature,
        Signer,
    },
    transaction::Transaction,
};

use crate::{
    bindings::JournalBindings,
    cluster::Cluster,
    error::{
        DataAccessError,
        DataAccessResult,
    },
    rpc::JournalRpc,
    transactions::SendTransactionConfig,
};

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    strum_macros::Display,
    strum_macros::EnumCount,
    strum_macros::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn success_label(&self) -> &'static str {
        match self {
            MutationKind::Create => "Entry created",
            MutationKind::Update => "Entry updated",
            MutationKind::Delete => "Entry deleted",
        }
    }

    pub fn failure_label(&self) -> &'static str {
        match self {
            MutationKind::Create => "Failed to create entry",
            MutationKind::Update => "Failed to update entry",
            MutationKind::Delete => "Failed to delete entry",
        }
    }
}

/// A state-changing operation on one journal entry, keyed by its title.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EntryMutation {
    Create { title: String, message: String },
    Update { title: String, message: String },
    Delete { title: String },
}

impl EntryMutation {
    pub fn create(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Create {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn update(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Update {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn delete(title: impl Into<String>) -> Self {
        Self::Delete {
            title: title.into(),
        }
    }

    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Create { .. } => MutationKind::Create,
            Self::Update { .. } => MutationKind::Update,
            Self::Delete { .. } => MutationKind::Delete,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Create { title, .. } | Self::Update { title, .. } | Self::Delete { title } => {
                title
            }
        }
    }

    /// Client-side field checks. A mutation that fails here never reaches the network.
    pub fn validate(&self) -> DataAccessResult<()> {
        JournalInstruction::from(self.clone())
            .validate()
            .map_err(DataAccessError::Validation)
    }
}

impl From<EntryMutation> for JournalInstruction {
    fn from(mutation: EntryMutation) -> Self {
        match mutation {
            EntryMutation::Create { title, message } => {
                JournalInstruction::CreateJournalEntry { title, message }
            }
            EntryMutation::Update { title, message } => {
                JournalInstruction::UpdateJournalEntry { title, message }
            }
            EntryMutation::Delete { title } => JournalInstruction::DeleteJournalEntry { title },
        }
    }
}

/// Validates, builds, signs and submits `mutation` on `cluster`, then waits for confirmation.
///
/// The signer is both the entry owner and the fee payer. Failures are returned as-is; nothing is
/// resubmitted, since a blind retry of a transaction isn't safe.
pub async fn submit_mutation<R, B, S>(
    rpc: &R,
    bindings: &B,
    cluster: &Cluster,
    mutation: &EntryMutation,
    signer: &S,
    config: &SendTransactionConfig,
) -> DataAccessResult<Signature>
where
    R: JournalRpc + ?Sized,
    B: JournalBindings + ?Sized,
    S: Signer + ?Sized,
{
    mutation.validate()?;

    let owner = signer.pubkey();
    let instruction = bindings.build_instruction(&cluster.program_id(), &owner, mutation)?;
    let instructions = config.with_compute_budget(&[instruction]);

    let blockhash = rpc.get_latest_blockhash().await?;
    let mut transaction = Transaction::new_unsigned(Message::new(&instructions, Some(&owner)));
    transaction.try_sign(&[signer], blockhash)?;

    let signature = rpc.send_and_confirm_transaction(&transaction).await?;
    config.log_submission(&owner, &signature);

    Ok(signature)
}

/// `Idle -> Pending -> {Success | Error}`. A settled tracker goes back to `Idle` on
/// [`MutationTracker::reset`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Clone, Debug)]
enum Settled {
    Success(Signature),
    Error(String),
}

#[derive(Debug, Default)]
struct TrackerState {
    in_flight: usize,
    settled: Option<Settled>,
}

/// Tracks the status of one mutation kind so a presentation layer can disable its trigger while
/// a submission is pending. Concurrent submissions aren't coalesced; the tracker stays `Pending`
/// until all of them settle and reports the last one to settle.
#[derive(Debug, Default)]
pub struct MutationTracker {
    state: Mutex<TrackerState>,
}

impl MutationTracker {
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> MutationStatus {
        let state = self.lock();
        if state.in_flight > 0 {
            return MutationStatus::Pending;
        }
        match state.settled {
            None => MutationStatus::Idle,
            Some(Settled::Success(_)) => MutationStatus::Success,
            Some(Settled::Error(_)) => MutationStatus::Error,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status() == MutationStatus::Pending
    }

    pub fn last_signature(&self) -> Option<Signature> {
        match self.lock().settled {
            Some(Settled::Success(signature)) => Some(signature),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<String> {
        match &self.lock().settled {
            Some(Settled::Error(message)) => Some(message.clone()),
            _ => None,
        }
    }

    pub fn reset(&self) {
        self.lock().settled = None;
    }

    /// Marks a submission in flight until the returned guard is settled or dropped.
    pub fn begin(&self) -> PendingMutation<'_> {
        self.lock().in_flight += 1;
        PendingMutation { tracker: self }
    }
}

/// An in-flight submission. Dropping it without settling (e.g. when the owning future is
/// dropped) releases the pending slot and leaves the previous outcome in place.
#[must_use]
pub struct PendingMutation<'a> {
    tracker: &'a MutationTracker,
}

impl PendingMutation<'_> {
    pub fn settle<T>(self, result: &DataAccessResult<T>, signature: impl FnOnce(&T) -> Signature) {
        self.tracker.lock().settled = Some(match result {
            Ok(value) => Settled::Success(signature(value)),
            Err(err) => Settled::Error(err.to_string()),
        });
    }
}

impl Drop for PendingMutation<'_> {
    fn drop(&mut self) {
        let mut state = self.tracker.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}
