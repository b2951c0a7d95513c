//! PDA seeds for journal entry accounts.

use solana_address::Address;

/// A single PDA seed can't be longer than this, which bounds the length of an entry title.
pub const MAX_SEED_LEN: usize = 32;

/// Expands to the seeds of a journal entry PDA: the title bytes followed by the owner address.
#[macro_export]
macro_rules! journal_entry_seeds {
    ($title:expr, $owner:expr) => {
        &[$title.as_bytes(), $owner.as_ref()]
    };
}

/// Derives the journal entry address for `(owner, title)` under `program_id`.
///
/// The caller must have checked that `title` is at most [`MAX_SEED_LEN`] bytes, otherwise the
/// derivation panics.
pub fn find_journal_entry_address(title: &str, owner: &Address, program_id: &Address) -> (Address, u8) {
    Address::find_program_address(journal_entry_seeds!(title, owner), program_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program;

    #[test]
    fn derivation_is_deterministic_per_owner_and_title() {
        let owner = Address::new_from_array([7; 32]);
        let other = Address::new_from_array([8; 32]);

        let (a, bump_a) = find_journal_entry_address("groceries", &owner, &program::ID);
        let (b, bump_b) = find_journal_entry_address("groceries", &owner, &program::ID);
        assert_eq!(a, b);
        assert_eq!(bump_a, bump_b);

        let (c, _) = find_journal_entry_address("groceries", &other, &program::ID);
        let (d, _) = find_journal_entry_address("chores", &owner, &program::ID);
        let (e, _) = find_journal_entry_address("groceries", &owner, &program::DEVNET_ID);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_ne!(a, e);
    }

    #[test]
    fn max_length_title_derives() {
        let owner = Address::new_from_array([1; 32]);
        let title = "t".repeat(MAX_SEED_LEN);
        let (address, _) = find_journal_entry_address(&title, &owner, &program::ID);
        assert_ne!(address, owner);
    }
}
