//! An in-memory stand-in for a validator running the journal program, for tests and offline
//! demos.
//!
//! Transactions are checked for signatures and a known blockhash, then executed atomically: if
//! any journal instruction fails, no account changes. Instructions for other programs (compute
//! budget, system) are accepted and ignored.

use std::{
    collections::{
        HashMap,
        HashSet,
    },
    sync::{
        Mutex,
        MutexGuard,
        PoisonError,
    },
};

use async_trait::async_trait;
use itertools::Itertools;
use journal_interface::{
    error::JournalError,
    instructions::JournalInstruction,
    seeds::find_journal_entry_address,
    state::journal_entry::{
        JournalEntryState,
        JOURNAL_ENTRY_SPACE,
    },
};
use solana_account::Account;
use solana_address::Address;
use solana_instruction_error::InstructionError;
use solana_sdk::{
    hash::Hash,
    signature::Signature,
    transaction::Transaction,
};
use solana_transaction_error::TransactionError;

use crate::{
    cluster::Cluster,
    error::{
        DataAccessError,
        DataAccessResult,
    },
    rpc::JournalRpc,
};

pub const BPF_LOADER_UPGRADEABLE_ID: Address =
    Address::from_str_const("BPFLoaderUpgradeab1e11111111111111111111111");

pub const LAMPORTS_PER_SIGNATURE: u64 = 5_000;

const ACCOUNT_STORAGE_OVERHEAD: u64 = 128;
const LAMPORTS_PER_BYTE_YEAR: u64 = 3_480;
const EXEMPTION_THRESHOLD_YEARS: u64 = 2;

pub const LEDGER_VERSION: &str = "3.0.0-ledger";

/// The rent exempt minimum for an account with `space` bytes of data.
pub fn minimum_balance(space: usize) -> u64 {
    (ACCOUNT_STORAGE_OVERHEAD + space as u64) * LAMPORTS_PER_BYTE_YEAR * EXEMPTION_THRESHOLD_YEARS
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RpcMethod {
    GetAccount,
    GetProgramAccounts,
    GetLatestBlockhash,
    SendTransaction,
    GetVersion,
}

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<Address, Account>,
    blockhash_nonce: u64,
    recent_blockhashes: HashSet<Hash>,
    processed: HashSet<Signature>,
    offline: bool,
    failures_remaining: u32,
    requests: HashMap<RpcMethod, usize>,
}

impl LedgerState {
    fn latest_blockhash(&self) -> Hash {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&self.blockhash_nonce.to_le_bytes());
        bytes[31] = 0x1d;
        Hash::new_from_array(bytes)
    }

    fn advance_blockhash(&mut self) {
        self.blockhash_nonce += 1;
        let next = self.latest_blockhash();
        self.recent_blockhashes.insert(next);
    }
}

/// A single-program ledger. Every account it holds lives in memory; nothing persists past the
/// ledger itself.
#[derive(Debug)]
pub struct InMemoryLedger {
    program_id: Address,
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    /// A ledger with the journal program deployed at the id `cluster` resolves to.
    pub fn new(cluster: &Cluster) -> Self {
        let ledger = Self::without_program(cluster);
        ledger.set_account(
            ledger.program_id,
            Account {
                lamports: minimum_balance(36),
                data: vec![],
                owner: BPF_LOADER_UPGRADEABLE_ID,
                executable: true,
                rent_epoch: 0,
            },
        );
        ledger
    }

    /// A ledger where the journal program was never deployed.
    pub fn without_program(cluster: &Cluster) -> Self {
        let mut state = LedgerState::default();
        state.advance_blockhash();
        Self {
            program_id: cluster.program_id(),
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn program_id(&self) -> Address {
        self.program_id
    }

    pub fn account(&self, address: &Address) -> Option<Account> {
        self.lock().accounts.get(address).cloned()
    }

    pub fn set_account(&self, address: Address, account: Account) {
        self.lock().accounts.insert(address, account);
    }

    pub fn balance(&self, address: &Address) -> u64 {
        self.account(address).map_or(0, |account| account.lamports)
    }

    /// Credits `lamports` to `address`, creating a system account if none exists.
    pub fn airdrop(&self, address: &Address, lamports: u64) {
        let mut state = self.lock();
        let account = state.accounts.entry(*address).or_insert_with(|| Account {
            owner: journal_interface::program::SYSTEM_PROGRAM_ID,
            ..Default::default()
        });
        account.lamports = account.lamports.saturating_add(lamports);
    }

    /// While offline, every request fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Fails the next `count` requests with a transport error, then recovers.
    pub fn fail_next_requests(&self, count: u32) {
        self.lock().failures_remaining = count;
    }

    /// How many times `method` was requested, including requests that failed.
    pub fn request_count(&self, method: RpcMethod) -> usize {
        self.lock().requests.get(&method).copied().unwrap_or(0)
    }

    /// How many transactions reached the ledger, whether or not they executed.
    pub fn transactions_sent(&self) -> usize {
        self.request_count(RpcMethod::SendTransaction)
    }

    fn begin_request(&self, method: RpcMethod) -> DataAccessResult<MutexGuard<'_, LedgerState>> {
        let mut state = self.lock();
        *state.requests.entry(method).or_default() += 1;
        if state.offline {
            return Err(DataAccessError::Network("ledger is offline".into()));
        }
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(DataAccessError::Network("connection reset by peer".into()));
        }
        Ok(state)
    }

    fn process_transaction(
        &self,
        state: &mut LedgerState,
        transaction: &Transaction,
    ) -> Result<Signature, TransactionError> {
        transaction.verify()?;

        let signature = *transaction
            .signatures
            .first()
            .ok_or(TransactionError::MissingSignatureForFee)?;
        if state.processed.contains(&signature) {
            return Err(TransactionError::AlreadyProcessed);
        }
        if !state
            .recent_blockhashes
            .contains(&transaction.message.recent_blockhash)
        {
            return Err(TransactionError::BlockhashNotFound);
        }

        let message = &transaction.message;
        let fee_payer = *message
            .account_keys
            .first()
            .ok_or(TransactionError::AccountNotFound)?;
        let fee = LAMPORTS_PER_SIGNATURE * u64::from(message.header.num_required_signatures);

        let mut accounts = state.accounts.clone();
        let payer = accounts
            .get_mut(&fee_payer)
            .ok_or(TransactionError::AccountNotFound)?;
        payer.lamports = payer
            .lamports
            .checked_sub(fee)
            .ok_or(TransactionError::InsufficientFundsForFee)?;

        for (index, instruction) in message.instructions.iter().enumerate() {
            let program_id = message.account_keys[usize::from(instruction.program_id_index)];
            if program_id != self.program_id {
                continue;
            }
            if !accounts
                .get(&program_id)
                .is_some_and(|program| program.executable)
            {
                return Err(TransactionError::ProgramAccountNotFound);
            }

            let keys = instruction
                .accounts
                .iter()
                .map(|&i| usize::from(i))
                .collect::<Vec<_>>();
            self.execute(&mut accounts, message, &keys, &instruction.data)
                .map_err(|err| TransactionError::InstructionError(index as u8, err))?;
        }

        // Commit, fee included.
        state.accounts = accounts;
        state.processed.insert(signature);
        state.advance_blockhash();

        Ok(signature)
    }

    fn execute(
        &self,
        accounts: &mut HashMap<Address, Account>,
        message: &solana_sdk::message::Message,
        keys: &[usize],
        data: &[u8],
    ) -> Result<(), InstructionError> {
        let custom = |err: JournalError| InstructionError::Custom(err.into());

        let instruction = JournalInstruction::unpack(data).map_err(custom)?;
        let &[entry_index, owner_index, ..] = keys else {
            return Err(InstructionError::MissingAccount);
        };
        let entry = message.account_keys[entry_index];
        let owner = message.account_keys[owner_index];

        if !message.is_signer(owner_index) {
            return Err(InstructionError::MissingRequiredSignature);
        }
        instruction.validate().map_err(custom)?;

        let (derived, _bump) = find_journal_entry_address(instruction.title(), &owner, &self.program_id);
        if derived != entry {
            return Err(custom(JournalError::AddressMismatch));
        }

        let existing = accounts
            .get(&entry)
            .filter(|account| account.lamports > 0)
            .cloned();

        match instruction {
            JournalInstruction::CreateJournalEntry { title, message } => {
                if existing.is_some() {
                    return Err(InstructionError::AccountAlreadyInitialized);
                }
                let rent = minimum_balance(JOURNAL_ENTRY_SPACE);
                let payer = accounts
                    .get_mut(&owner)
                    .ok_or(InstructionError::InsufficientFunds)?;
                payer.lamports = payer
                    .lamports
                    .checked_sub(rent)
                    .ok_or(InstructionError::InsufficientFunds)?;

                let state = JournalEntryState::new(owner, title, message);
                accounts.insert(
                    entry,
                    Account {
                        lamports: rent,
                        data: state.pack().map_err(custom)?,
                        owner: self.program_id,
                        executable: false,
                        rent_epoch: 0,
                    },
                );
            }
            JournalInstruction::UpdateJournalEntry { message, .. } => {
                let mut account = existing.ok_or(InstructionError::UninitializedAccount)?;
                let mut state = self.load_entry(&account, &owner)?;
                state.message = message;
                account.data = state.pack().map_err(custom)?;
                accounts.insert(entry, account);
            }
            JournalInstruction::DeleteJournalEntry { .. } => {
                let account = existing.ok_or(InstructionError::UninitializedAccount)?;
                self.load_entry(&account, &owner)?;
                accounts.remove(&entry);
                let refund = accounts.entry(owner).or_default();
                refund.lamports = refund.lamports.saturating_add(account.lamports);
            }
        }

        Ok(())
    }

    fn load_entry(
        &self,
        account: &Account,
        owner: &Address,
    ) -> Result<JournalEntryState, InstructionError> {
        if account.owner != self.program_id {
            return Err(InstructionError::IncorrectProgramId);
        }
        let state = JournalEntryState::unpack(&account.data)
            .map_err(|err| InstructionError::Custom(err.into()))?;
        if state.owner != *owner {
            return Err(InstructionError::Custom(JournalError::OwnerMismatch.into()));
        }
        Ok(state)
    }
}

#[async_trait]
impl JournalRpc for InMemoryLedger {
    async fn get_account(&self, address: &Address) -> DataAccessResult<Option<Account>> {
        let state = self.begin_request(RpcMethod::GetAccount)?;
        Ok(state
            .accounts
            .get(address)
            .filter(|account| account.lamports > 0)
            .cloned())
    }

    async fn get_program_accounts(
        &self,
        program_id: &Address,
        discriminator: &[u8],
    ) -> DataAccessResult<Vec<(Address, Account)>> {
        let state = self.begin_request(RpcMethod::GetProgramAccounts)?;
        Ok(state
            .accounts
            .iter()
            .filter(|(_, account)| {
                account.owner == *program_id && account.data.starts_with(discriminator)
            })
            .map(|(address, account)| (*address, account.clone()))
            .sorted_by_key(|(address, _)| *address)
            .collect())
    }

    async fn get_latest_blockhash(&self) -> DataAccessResult<Hash> {
        let state = self.begin_request(RpcMethod::GetLatestBlockhash)?;
        Ok(state.latest_blockhash())
    }

    async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
    ) -> DataAccessResult<Signature> {
        let mut state = self.begin_request(RpcMethod::SendTransaction)?;
        Ok(self.process_transaction(&mut state, transaction)?)
    }

    async fn get_version(&self) -> DataAccessResult<String> {
        let _state = self.begin_request(RpcMethod::GetVersion)?;
        Ok(LEDGER_VERSION.into())
    }
}

#[cfg(test)]
mod tests {
    use journal_interface::instructions::{
        create_journal_entry,
        delete_journal_entry,
    };
    use solana_sdk::{
        message::Message,
        signature::{
            Keypair,
            Signer,
        },
    };

    use super::*;

    fn signed(ledger: &InMemoryLedger, payer: &Keypair, ix: solana_instruction::Instruction) -> Transaction {
        let blockhash = ledger.lock().latest_blockhash();
        Transaction::new(&[payer], Message::new(&[ix], Some(&payer.pubkey())), blockhash)
    }

    #[tokio::test]
    async fn failed_transactions_change_nothing() {
        let cluster = Cluster::localnet();
        let ledger = InMemoryLedger::new(&cluster);
        let owner = Keypair::new();
        ledger.airdrop(&owner.pubkey(), 1_000_000_000);

        let create = create_journal_entry(&ledger.program_id(), &owner.pubkey(), "t", "m").unwrap();
        // The delete fails, so the create in the same transaction must be rolled back.
        let delete_missing =
            delete_journal_entry(&ledger.program_id(), &owner.pubkey(), "other").unwrap();
        let blockhash = ledger.get_latest_blockhash().await.unwrap();
        let tx = Transaction::new(
            &[&owner],
            Message::new(&[create, delete_missing], Some(&owner.pubkey())),
            blockhash,
        );

        let err = ledger.send_and_confirm_transaction(&tx).await.unwrap_err();
        assert!(matches!(
            err,
            DataAccessError::ChainRejection(TransactionError::InstructionError(
                1,
                InstructionError::UninitializedAccount
            ))
        ));
        assert_eq!(ledger.balance(&owner.pubkey()), 1_000_000_000);
        assert!(ledger
            .get_program_accounts(&ledger.program_id(), &[])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn create_charges_rent_and_delete_refunds_it() {
        let cluster = Cluster::devnet();
        let ledger = InMemoryLedger::new(&cluster);
        let owner = Keypair::new();
        let program_id = ledger.program_id();
        ledger.airdrop(&owner.pubkey(), 1_000_000_000);

        let ix = create_journal_entry(&program_id, &owner.pubkey(), "t", "m").unwrap();
        ledger
            .send_and_confirm_transaction(&signed(&ledger, &owner, ix))
            .await
            .unwrap();
        let rent = minimum_balance(JOURNAL_ENTRY_SPACE);
        assert_eq!(
            ledger.balance(&owner.pubkey()),
            1_000_000_000 - LAMPORTS_PER_SIGNATURE - rent
        );

        let ix = delete_journal_entry(&program_id, &owner.pubkey(), "t").unwrap();
        ledger
            .send_and_confirm_transaction(&signed(&ledger, &owner, ix))
            .await
            .unwrap();
        assert_eq!(
            ledger.balance(&owner.pubkey()),
            1_000_000_000 - 2 * LAMPORTS_PER_SIGNATURE
        );
    }

    #[tokio::test]
    async fn stale_blockhash_and_replays_are_rejected() {
        let cluster = Cluster::localnet();
        let ledger = InMemoryLedger::new(&cluster);
        let owner = Keypair::new();
        ledger.airdrop(&owner.pubkey(), 1_000_000_000);

        let ix = create_journal_entry(&ledger.program_id(), &owner.pubkey(), "t", "m").unwrap();
        let unknown = Transaction::new(
            &[&owner],
            Message::new(&[ix.clone()], Some(&owner.pubkey())),
            Hash::new_from_array([7; 32]),
        );
        assert!(matches!(
            ledger.send_and_confirm_transaction(&unknown).await,
            Err(DataAccessError::ChainRejection(TransactionError::BlockhashNotFound))
        ));

        let tx = signed(&ledger, &owner, ix);
        ledger.send_and_confirm_transaction(&tx).await.unwrap();
        assert!(matches!(
            ledger.send_and_confirm_transaction(&tx).await,
            Err(DataAccessError::ChainRejection(TransactionError::AlreadyProcessed))
        ));
        assert_eq!(ledger.transactions_sent(), 3);
    }

    #[tokio::test]
    async fn instructions_without_the_owner_account_are_rejected() {
        let cluster = Cluster::devnet();
        let ledger = InMemoryLedger::new(&cluster);
        let owner = Keypair::new();
        ledger.airdrop(&owner.pubkey(), 1_000_000_000);

        let mut ix = create_journal_entry(&ledger.program_id(), &owner.pubkey(), "t", "m").unwrap();
        ix.accounts.truncate(1);
        assert!(matches!(
            ledger
                .send_and_confirm_transaction(&signed(&ledger, &owner, ix))
                .await,
            Err(DataAccessError::ChainRejection(TransactionError::InstructionError(
                0,
                InstructionError::MissingAccount
            )))
        ));
    }

    #[tokio::test]
    async fn missing_program_and_outages() {
        let cluster = Cluster::localnet();
        let ledger = InMemoryLedger::without_program(&cluster);
        assert!(ledger
            .get_account(&ledger.program_id())
            .await
            .unwrap()
            .is_none());

        let owner = Keypair::new();
        ledger.airdrop(&owner.pubkey(), 1_000_000_000);
        let ix = create_journal_entry(&ledger.program_id(), &owner.pubkey(), "t", "m").unwrap();
        assert!(matches!(
            ledger
                .send_and_confirm_transaction(&signed(&ledger, &owner, ix))
                .await,
            Err(DataAccessError::ChainRejection(TransactionError::ProgramAccountNotFound))
        ));

        ledger.fail_next_requests(1);
        assert!(matches!(
            ledger.get_version().await,
            Err(DataAccessError::Network(_))
        ));
        assert_eq!(ledger.get_version().await.unwrap(), LEDGER_VERSION);
        assert_eq!(ledger.request_count(RpcMethod::GetVersion), 2);
    }
}
