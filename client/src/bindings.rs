//! The narrow interface to the program's generated bindings, so the wire format can be swapped
//! or mocked without touching the data-access layer.

use journal_interface::{
    instructions::JournalInstruction,
    state::{
        journal_entry::{
            JournalEntryState,
            JOURNAL_ENTRY_STATE_DISCRIMINATOR,
        },
        Discriminator,
    },
};
use solana_address::Address;
use solana_instruction::Instruction;

use crate::{
    error::{
        DataAccessError,
        DataAccessResult,
    },
    mutations::EntryMutation,
};

pub trait JournalBindings: Send + Sync {
    /// The prefix every journal entry account's data starts with.
    fn account_discriminator(&self) -> Discriminator;

    /// Builds the program instruction for `mutation`, signed by `owner`.
    fn build_instruction(
        &self,
        program_id: &Address,
        owner: &Address,
        mutation: &EntryMutation,
    ) -> DataAccessResult<Instruction>;

    /// Derives the address of the entry `owner` keys with `title`.
    fn entry_address(&self, program_id: &Address, owner: &Address, title: &str) -> Address;

    fn decode_account(&self, address: &Address, data: &[u8]) -> DataAccessResult<JournalEntryState>;
}

/// The Anchor wire format defined in `journal-interface`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnchorJournalBindings;

impl JournalBindings for AnchorJournalBindings {
    fn account_discriminator(&self) -> Discriminator {
        JOURNAL_ENTRY_STATE_DISCRIMINATOR
    }

    fn build_instruction(
        &self,
        program_id: &Address,
        owner: &Address,
        mutation: &EntryMutation,
    ) -> DataAccessResult<Instruction> {
        JournalInstruction::from(mutation.clone())
            .create_instruction(program_id, owner)
            .map_err(DataAccessError::Validation)
    }

    fn entry_address(&self, program_id: &Address, owner: &Address, title: &str) -> Address {
        journal_interface::seeds::find_journal_entry_address(title, owner, program_id).0
    }

    fn decode_account(&self, address: &Address, data: &[u8]) -> DataAccessResult<JournalEntryState> {
        JournalEntryState::unpack(data).map_err(|error| DataAccessError::Decode {
            address: *address,
            error,
        })
    }
}
