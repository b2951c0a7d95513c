//! Public interface layer for the journal entry program: program ids, the account layout, the
//! instruction wire format and the PDA seeds shared by clients and test ledgers.

pub mod error;
pub mod instructions;
pub mod seeds;
pub mod state;

pub mod program {
    use solana_address::Address;

    /// The program id the journal program declares. Deployments on mainnet and local validators
    /// use this address.
    pub const ID: Address = Address::from_str_const("5hLo9VzZ4uwDLm4ydjBdbFiMAuPE6hdPu6MjMbRGb1NA");

    /// The program id of the shared devnet/testnet deployment.
    pub const DEVNET_ID: Address =
        Address::from_str_const("6z68wfurCMYkZG51s1Et9BJEd9nJGUusjHXNt4dGbNNF");

    pub const SYSTEM_PROGRAM_ID: Address =
        Address::from_str_const("11111111111111111111111111111111");
}
