//! The journal program's instruction wire format and client-side instruction builders.
//!
//! Every instruction's data is an 8-byte Anchor discriminator (`sha256("global:<name>")[..8]`)
//! followed by the borsh encoded arguments. All instructions take the same accounts:
//!
//! 0. `[writable]` The journal entry PDA derived from `(title, owner)`.
//! 1. `[signer, writable]` The entry owner, who also pays for and receives the account rent.
//! 2. `[]` The system program.

use borsh::{
    BorshDeserialize,
    BorshSerialize,
};
use solana_address::Address;
use solana_instruction::{
    AccountMeta,
    Instruction,
};

use crate::{
    error::{
        JournalError,
        JournalResult,
    },
    program::SYSTEM_PROGRAM_ID,
    seeds::find_journal_entry_address,
    state::{
        journal_entry::{
            validate_message,
            validate_title,
        },
        Discriminator,
        DISCRIMINATOR_LEN,
    },
};

pub const CREATE_ENTRY_DISCRIMINATOR: Discriminator = [248, 207, 142, 242, 66, 162, 150, 16];
pub const UPDATE_ENTRY_DISCRIMINATOR: Discriminator = [70, 47, 181, 2, 1, 40, 2, 92];
pub const DELETE_ENTRY_DISCRIMINATOR: Discriminator = [227, 198, 83, 191, 70, 23, 194, 58];

/// Displays as the program's instruction name, which seeds the discriminator.
#[derive(Clone, Debug, Eq, PartialEq, strum_macros::Display)]
pub enum JournalInstruction {
    #[strum(serialize = "create_entry")]
    CreateJournalEntry { title: String, message: String },
    #[strum(serialize = "update_entry")]
    UpdateJournalEntry { title: String, message: String },
    #[strum(serialize = "delete_entry")]
    DeleteJournalEntry { title: String },
}

#[derive(BorshSerialize, BorshDeserialize)]
struct EntryArgs {
    title: String,
    message: String,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct TitleArgs {
    title: String,
}

impl JournalInstruction {
    pub fn discriminator(&self) -> Discriminator {
        match self {
            Self::CreateJournalEntry { .. } => CREATE_ENTRY_DISCRIMINATOR,
            Self::UpdateJournalEntry { .. } => UPDATE_ENTRY_DISCRIMINATOR,
            Self::DeleteJournalEntry { .. } => DELETE_ENTRY_DISCRIMINATOR,
        }
    }

    /// The title is the key of the entry every instruction operates on.
    pub fn title(&self) -> &str {
        match self {
            Self::CreateJournalEntry { title, .. }
            | Self::UpdateJournalEntry { title, .. }
            | Self::DeleteJournalEntry { title } => title,
        }
    }

    /// Checks the arguments the way the program's account constraints would.
    pub fn validate(&self) -> JournalResult {
        validate_title(self.title())?;
        match self {
            Self::CreateJournalEntry { message, .. } | Self::UpdateJournalEntry { message, .. } => {
                validate_message(message)
            }
            Self::DeleteJournalEntry { .. } => Ok(()),
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let args = match self {
            Self::CreateJournalEntry { title, message } | Self::UpdateJournalEntry { title, message } => {
                borsh::to_vec(&EntryArgs {
                    title: title.clone(),
                    message: message.clone(),
                })
            }
            Self::DeleteJournalEntry { title } => borsh::to_vec(&TitleArgs {
                title: title.clone(),
            }),
        }
        // Serializing strings into a `Vec` can't fail.
        .unwrap_or_default();

        [self.discriminator().as_slice(), args.as_slice()].concat()
    }

    pub fn unpack(data: &[u8]) -> Result<Self, JournalError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(JournalError::InsufficientByteLength);
        }
        let (discriminator, mut args) = data.split_at(DISCRIMINATOR_LEN);

        let invalid = |_| JournalError::InvalidInstructionData;
        let instruction = match <Discriminator>::try_from(discriminator) {
            Ok(CREATE_ENTRY_DISCRIMINATOR) => {
                let EntryArgs { title, message } =
                    EntryArgs::deserialize(&mut args).map_err(invalid)?;
                Self::CreateJournalEntry { title, message }
            }
            Ok(UPDATE_ENTRY_DISCRIMINATOR) => {
                let EntryArgs { title, message } =
                    EntryArgs::deserialize(&mut args).map_err(invalid)?;
                Self::UpdateJournalEntry { title, message }
            }
            Ok(DELETE_ENTRY_DISCRIMINATOR) => {
                let TitleArgs { title } = TitleArgs::deserialize(&mut args).map_err(invalid)?;
                Self::DeleteJournalEntry { title }
            }
            _ => return Err(JournalError::InvalidInstructionDiscriminant),
        };

        if !args.is_empty() {
            return Err(JournalError::InvalidInstructionData);
        }

        Ok(instruction)
    }

    /// Builds the instruction for `owner` against `program_id`, deriving the entry PDA from the
    /// title.
    pub fn create_instruction(
        &self,
        program_id: &Address,
        owner: &Address,
    ) -> Result<Instruction, JournalError> {
        self.validate()?;
        let (journal_entry, _bump) = find_journal_entry_address(self.title(), owner, program_id);

        Ok(Instruction::new_with_bytes(
            *program_id,
            &self.pack(),
            vec![
                AccountMeta::new(journal_entry, false),
                AccountMeta::new(*owner, true),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            ],
        ))
    }
}

pub fn create_journal_entry(
    program_id: &Address,
    owner: &Address,
    title: impl Into<String>,
    message: impl Into<String>,
) -> Result<Instruction, JournalError> {
    JournalInstruction::CreateJournalEntry {
        title: title.into(),
        message: message.into(),
    }
    .create_instruction(program_id, owner)
}

pub fn update_journal_entry(
    program_id: &Address,
    owner: &Address,
    title: impl Into<String>,
    message: impl Into<String>,
) -> Result<Instruction, JournalError> {
    JournalInstruction::UpdateJournalEntry {
        title: title.into(),
        message: message.into(),
    }
    .create_instruction(program_id, owner)
}

pub fn delete_journal_entry(
    program_id: &Address,
    owner: &Address,
    title: impl Into<String>,
) -> Result<Instruction, JournalError> {
    JournalInstruction::DeleteJournalEntry {
        title: title.into(),
    }
    .create_instruction(program_id, owner)
}

#[cfg(test)]
mod tests {
    use sha2::{
        Digest,
        Sha256,
    };

    use super::*;
    use crate::program;

    fn anchor_discriminator(name: &str) -> Discriminator {
        let hash = Sha256::digest(format!("global:{name}"));
        hash[..DISCRIMINATOR_LEN].try_into().unwrap()
    }

    #[test]
    fn discriminators_match_instruction_names() {
        let instructions = [
            JournalInstruction::CreateJournalEntry {
                title: "t".into(),
                message: "m".into(),
            },
            JournalInstruction::UpdateJournalEntry {
                title: "t".into(),
                message: "m".into(),
            },
            JournalInstruction::DeleteJournalEntry { title: "t".into() },
        ];
        for instruction in instructions {
            assert_eq!(
                instruction.discriminator(),
                anchor_discriminator(&instruction.to_string())
            );
        }
    }

    #[test]
    fn discriminators_follow_the_program_method_names() {
        let create = JournalInstruction::CreateJournalEntry {
            title: "t".into(),
            message: "m".into(),
        };
        assert_eq!(create.to_string(), "create_entry");
        assert_eq!(
            CREATE_ENTRY_DISCRIMINATOR,
            [248, 207, 142, 242, 66, 162, 150, 16]
        );
        assert_eq!(UPDATE_ENTRY_DISCRIMINATOR, anchor_discriminator("update_entry"));
        assert_eq!(DELETE_ENTRY_DISCRIMINATOR, anchor_discriminator("delete_entry"));
    }

    #[test]
    fn create_data_layout() {
        let data = JournalInstruction::CreateJournalEntry {
            title: "ab".into(),
            message: "xyz".into(),
        }
        .pack();

        assert_eq!(&data[..8], &CREATE_ENTRY_DISCRIMINATOR);
        assert_eq!(&data[8..12], &2u32.to_le_bytes());
        assert_eq!(&data[12..14], b"ab");
        assert_eq!(&data[14..18], &3u32.to_le_bytes());
        assert_eq!(&data[18..], b"xyz");
    }

    #[test]
    fn unpack_rejects_bad_data() {
        assert_eq!(
            JournalInstruction::unpack(&[1, 2, 3]),
            Err(JournalError::InsufficientByteLength)
        );
        assert_eq!(
            JournalInstruction::unpack(&[0; 12]),
            Err(JournalError::InvalidInstructionDiscriminant)
        );

        let mut data = JournalInstruction::DeleteJournalEntry { title: "t".into() }.pack();
        data.push(0);
        assert_eq!(
            JournalInstruction::unpack(&data),
            Err(JournalError::InvalidInstructionData)
        );
        assert_eq!(
            JournalInstruction::unpack(&CREATE_ENTRY_DISCRIMINATOR),
            Err(JournalError::InvalidInstructionData)
        );
    }

    #[test]
    fn instruction_accounts() {
        let owner = Address::new_from_array([9; 32]);
        let ix = update_journal_entry(&program::ID, &owner, "title", "new message").unwrap();
        let (entry, _) = find_journal_entry_address("title", &owner, &program::ID);

        assert_eq!(ix.program_id, program::ID);
        assert_eq!(ix.accounts.len(), 3);
        assert_eq!(ix.accounts[0], AccountMeta::new(entry, false));
        assert_eq!(ix.accounts[1], AccountMeta::new(owner, true));
        assert_eq!(ix.accounts[2], AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false));
        assert_eq!(
            JournalInstruction::unpack(&ix.data),
            Ok(JournalInstruction::UpdateJournalEntry {
                title: "title".into(),
                message: "new message".into(),
            })
        );
    }

    #[test]
    fn builders_validate_before_deriving() {
        let owner = Address::new_from_array([9; 32]);
        assert_eq!(
            create_journal_entry(&program::ID, &owner, "", "m").unwrap_err(),
            JournalError::EmptyTitle
        );
        assert_eq!(
            create_journal_entry(&program::ID, &owner, "x".repeat(40), "m").unwrap_err(),
            JournalError::TitleTooLong
        );
        assert!(delete_journal_entry(&program::ID, &owner, "t").is_ok());
    }
}
