//! On-chain account state owned by the journal program.

pub mod journal_entry;

pub const DISCRIMINATOR_LEN: usize = 8;
pub const ADDRESS_LEN: usize = 32;
/// Borsh prefixes every string with its u32 little-endian byte length.
pub const STRING_PREFIX_LEN: usize = core::mem::size_of::<u32>();

/// An 8-byte discriminator prefixing Anchor accounts and instruction data.
pub type Discriminator = [u8; DISCRIMINATOR_LEN];

/// Splits the discriminator off of `data`, returning an error if `data` is too short or it
/// doesn't match `expected`.
pub fn strip_discriminator<'a>(
    data: &'a [u8],
    expected: &Discriminator,
    mismatch: crate::error::JournalError,
) -> Result<&'a [u8], crate::error::JournalError> {
    if data.len() < DISCRIMINATOR_LEN {
        return Err(crate::error::JournalError::InsufficientByteLength);
    }
    let (discriminator, rest) = data.split_at(DISCRIMINATOR_LEN);
    if discriminator != expected {
        return Err(mismatch);
    }

    Ok(rest)
}
