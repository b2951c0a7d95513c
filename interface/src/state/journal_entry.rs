//! See [`JournalEntryState`].

use borsh::{
    BorshDeserialize,
    BorshSerialize,
};
use solana_address::Address;
use static_assertions::const_assert_eq;

use crate::{
    error::{
        JournalError,
        JournalResult,
    },
    seeds::MAX_SEED_LEN,
    state::{
        strip_discriminator,
        Discriminator,
        ADDRESS_LEN,
        DISCRIMINATOR_LEN,
        STRING_PREFIX_LEN,
    },
};

/// `sha256("account:JournalEntryState")[..8]`.
pub const JOURNAL_ENTRY_STATE_DISCRIMINATOR: Discriminator = [113, 86, 110, 124, 140, 14, 58, 66];

pub const MAX_TITLE_LEN: usize = MAX_SEED_LEN;
pub const MAX_MESSAGE_LEN: usize = 1000;

/// The fixed space allocated for every journal entry account. Entries with shorter strings leave
/// zeroed padding at the end of the account data.
pub const JOURNAL_ENTRY_SPACE: usize = DISCRIMINATOR_LEN
    + ADDRESS_LEN
    + (STRING_PREFIX_LEN + MAX_TITLE_LEN)
    + (STRING_PREFIX_LEN + MAX_MESSAGE_LEN);

const_assert_eq!(JOURNAL_ENTRY_SPACE, 1080);

/// A single journal entry. The account lives at the PDA derived from `(title, owner)`, so the
/// title is immutable once the entry exists.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JournalEntryState {
    pub owner: Address,
    pub title: String,
    pub message: String,
}

impl JournalEntryState {
    pub fn new(owner: Address, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            owner,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Decodes account data: discriminator, then the borsh encoded fields. Trailing padding is
    /// ignored.
    pub fn unpack(data: &[u8]) -> Result<Self, JournalError> {
        let mut fields = strip_discriminator(
            data,
            &JOURNAL_ENTRY_STATE_DISCRIMINATOR,
            JournalError::InvalidAccountDiscriminant,
        )?;

        Self::deserialize(&mut fields).map_err(|_| JournalError::InvalidAccountData)
    }

    /// Encodes the entry as account data zero-padded to [`JOURNAL_ENTRY_SPACE`].
    pub fn pack(&self) -> Result<Vec<u8>, JournalError> {
        self.validate()?;
        let mut data = Vec::with_capacity(JOURNAL_ENTRY_SPACE);
        data.extend_from_slice(&JOURNAL_ENTRY_STATE_DISCRIMINATOR);
        self.serialize(&mut data)
            .map_err(|_| JournalError::InvalidAccountData)?;
        data.resize(JOURNAL_ENTRY_SPACE, 0);

        Ok(data)
    }

    pub fn validate(&self) -> JournalResult {
        validate_title(&self.title)?;
        validate_message(&self.message)
    }
}

/// A title must be non-blank and fit in a single PDA seed.
pub fn validate_title(title: &str) -> JournalResult {
    if title.trim().is_empty() {
        return Err(JournalError::EmptyTitle);
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(JournalError::TitleTooLong);
    }

    Ok(())
}

pub fn validate_message(message: &str) -> JournalResult {
    if message.trim().is_empty() {
        return Err(JournalError::EmptyMessage);
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err(JournalError::MessageTooLong);
    }

    Ok(())
}

// The owner is stored as raw bytes so the layout doesn't depend on the address type's own borsh
// support.
impl BorshSerialize for JournalEntryState {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.owner.to_bytes().serialize(writer)?;
        self.title.serialize(writer)?;
        self.message.serialize(writer)
    }
}

impl BorshDeserialize for JournalEntryState {
    fn deserialize_reader<R: std::io::Read>(reader: &mut R) -> std::io::Result<Self> {
        let owner = <[u8; ADDRESS_LEN]>::deserialize_reader(reader)?;
        let title = String::deserialize_reader(reader)?;
        let message = String::deserialize_reader(reader)?;

        Ok(Self {
            owner: Address::new_from_array(owner),
            title,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use sha2::{
        Digest,
        Sha256,
    };

    use super::*;

    #[test]
    fn discriminator_matches_anchor_hash() {
        let hash = Sha256::digest(b"account:JournalEntryState");
        assert_eq!(&hash[..DISCRIMINATOR_LEN], &JOURNAL_ENTRY_STATE_DISCRIMINATOR);
    }

    #[test]
    fn unpack_ignores_padding() {
        let entry = JournalEntryState::new(Address::new_from_array([3; 32]), "title", "message");
        let data = entry.pack().unwrap();
        assert_eq!(data.len(), JOURNAL_ENTRY_SPACE);
        assert_eq!(JournalEntryState::unpack(&data).unwrap(), entry);
    }

    #[test]
    fn unpack_checks_discriminator_and_length() {
        assert_eq!(
            JournalEntryState::unpack(&[113, 86, 110]),
            Err(JournalError::InsufficientByteLength)
        );

        let entry = JournalEntryState::new(Address::new_from_array([3; 32]), "title", "message");
        let mut data = entry.pack().unwrap();
        data[0] ^= 0xff;
        assert_eq!(
            JournalEntryState::unpack(&data),
            Err(JournalError::InvalidAccountDiscriminant)
        );

        // A truncated body is a decode failure, not a discriminator mismatch.
        let data = entry.pack().unwrap();
        assert_eq!(
            JournalEntryState::unpack(&data[..DISCRIMINATOR_LEN + 10]),
            Err(JournalError::InvalidAccountData)
        );
    }

    #[test]
    fn field_validation() {
        assert_eq!(validate_title("  "), Err(JournalError::EmptyTitle));
        assert_eq!(
            validate_title(&"x".repeat(MAX_TITLE_LEN + 1)),
            Err(JournalError::TitleTooLong)
        );
        assert_eq!(validate_title(&"x".repeat(MAX_TITLE_LEN)), Ok(()));
        assert_eq!(validate_message(""), Err(JournalError::EmptyMessage));
        assert_eq!(
            validate_message(&"x".repeat(MAX_MESSAGE_LEN + 1)),
            Err(JournalError::MessageTooLong)
        );

        let blank = JournalEntryState::new(Address::new_from_array([0; 32]), "t", "\n");
        assert_eq!(blank.pack(), Err(JournalError::EmptyMessage));
    }
}
