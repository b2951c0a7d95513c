//! The error taxonomy every data-access operation reports through.

use journal_interface::error::JournalError;
use solana_address::Address;
use solana_client::client_error::ClientError;
use solana_instruction_error::InstructionError;
use solana_sdk::signer::SignerError;
use solana_transaction_error::TransactionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataAccessError {
    /// Transport or RPC failure. Potentially transient.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Account not found: {0}")]
    NotFound(Address),

    /// The transaction failed simulation or execution on-chain.
    #[error("Transaction rejected: {0}")]
    ChainRejection(#[from] TransactionError),

    /// A client-side check failed before anything was sent.
    #[error("Invalid input: {0}")]
    Validation(JournalError),

    #[error("Couldn't decode account {address}: {error}")]
    Decode {
        address: Address,
        error: JournalError,
    },

    #[error("Signing failed: {0}")]
    Signing(#[from] SignerError),
}

pub type DataAccessResult<T> = Result<T, DataAccessError>;

impl DataAccessError {
    /// Only transport failures are worth retrying; everything else would fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// The journal program error behind a chain rejection, if the program raised one.
    pub fn program_error(&self) -> Option<JournalError> {
        match self {
            Self::ChainRejection(TransactionError::InstructionError(
                _,
                InstructionError::Custom(code),
            )) => JournalError::from_custom_code(*code),
            _ => None,
        }
    }
}

impl From<ClientError> for DataAccessError {
    fn from(err: ClientError) -> Self {
        // Preflight and execution failures carry the transaction error; anything else is the
        // transport's.
        match err.get_transaction_error() {
            Some(tx_err) => DataAccessError::ChainRejection(tx_err),
            None => DataAccessError::Network(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use solana_client::client_error::ClientErrorKind;

    use super::*;

    #[test]
    fn client_errors_split_by_transaction_error() {
        let transport: DataAccessError =
            ClientError::from(ClientErrorKind::Custom("connection refused".into())).into();
        assert!(matches!(transport, DataAccessError::Network(_)));
        assert!(transport.is_transient());

        let rejected: DataAccessError = ClientError::from(ClientErrorKind::TransactionError(
            TransactionError::InsufficientFundsForFee,
        ))
        .into();
        assert!(matches!(
            rejected,
            DataAccessError::ChainRejection(TransactionError::InsufficientFundsForFee)
        ));
        assert!(!rejected.is_transient());
    }

    #[test]
    fn program_error_from_custom_code() {
        let err = DataAccessError::ChainRejection(TransactionError::InstructionError(
            0,
            InstructionError::Custom(JournalError::OwnerMismatch.into()),
        ));
        assert_eq!(err.program_error(), Some(JournalError::OwnerMismatch));

        let err = DataAccessError::ChainRejection(TransactionError::InstructionError(
            0,
            InstructionError::AccountAlreadyInitialized,
        ));
        assert_eq!(err.program_error(), None);
    }
}
