//! Common error types and conversion helpers to represent them as error message strings.

#[derive(Clone, Copy, Debug, Eq, PartialEq, strum_macros::FromRepr)]
#[repr(u8)]
pub enum JournalError {
    InvalidAccountDiscriminant,
    InvalidInstructionDiscriminant,
    InsufficientByteLength,
    InvalidAccountData,
    InvalidInstructionData,
    EmptyTitle,
    EmptyMessage,
    TitleTooLong,
    MessageTooLong,
    AddressMismatch,
    OwnerMismatch,
    InvalidAccountOwner,
}

impl JournalError {
    /// Maps a custom program error code back to a [`JournalError`], if it is one.
    pub fn from_custom_code(code: u32) -> Option<Self> {
        u8::try_from(code).ok().and_then(Self::from_repr)
    }
}

impl From<JournalError> for u32 {
    #[inline(always)]
    fn from(e: JournalError) -> Self {
        e as u32
    }
}

impl From<JournalError> for &'static str {
    fn from(value: JournalError) -> Self {
        match value {
            JournalError::InvalidAccountDiscriminant => "Invalid account discriminant",
            JournalError::InvalidInstructionDiscriminant => "Invalid instruction discriminant",
            JournalError::InsufficientByteLength => "Not enough bytes passed",
            JournalError::InvalidAccountData => "Account data could not be decoded",
            JournalError::InvalidInstructionData => "Instruction data is invalid",
            JournalError::EmptyTitle => "Title can't be empty",
            JournalError::EmptyMessage => "Message can't be empty",
            JournalError::TitleTooLong => "Title exceeds the maximum seed length",
            JournalError::MessageTooLong => "Message exceeds the maximum length",
            JournalError::AddressMismatch => "Entry address doesn't match the derived address",
            JournalError::OwnerMismatch => "Entry isn't owned by the signer",
            JournalError::InvalidAccountOwner => "Account isn't owned by the journal program",
        }
    }
}

impl core::fmt::Display for JournalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str((*self).into())
    }
}

impl std::error::Error for JournalError {}

pub type JournalResult = Result<(), JournalError>;
