//! Creates, updates, lists and deletes a journal entry on a live cluster.
//!
//! Reads `JOURNAL_CLUSTER`, `JOURNAL_RPC_URL` and `JOURNAL_SECRET_KEY`; see
//! [`journal_client::load_env`]. Without a secret key a new keypair is funded by airdrop.

use std::sync::Arc;

use anyhow::bail;
use colored::Colorize;
use journal_client::{
    data_access::{
        DataAccessConfig,
        JournalDataAccess,
    },
    load_env,
    logs::{
        log_divider,
        ConsoleNotifier,
    },
    presentation::{
        account_explorer_url,
        ellipsify,
        EntryListView,
        ProgramGuard,
    },
    print_kv,
    transactions::{
        CustomRpcClient,
        SendTransactionConfig,
    },
    LogColor,
};
use solana_sdk::signer::Signer;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cluster = load_env::cluster();
    let send = SendTransactionConfig {
        compute_budget: Some(200_000),
        debug_logs: Some(true),
    };
    let rpc = CustomRpcClient::new_from_cluster(&cluster, send.clone());

    let author = match load_env::keypair()? {
        Some(kp) => kp,
        None => rpc.fund_new_account().await?,
    };

    let access = JournalDataAccess::new(rpc)
        .with_notifier(Arc::new(ConsoleNotifier))
        .with_config(DataAccessConfig {
            send,
            ..Default::default()
        });

    print_kv!("Cluster", cluster, LogColor::Info);
    print_kv!(
        "Program",
        ellipsify(&cluster.program_id().to_string(), 4),
        LogColor::Info
    );
    print_kv!("Author", author.pubkey(), LogColor::Info);

    let program = access.program_account(&cluster).await;
    if let Some(message) = ProgramGuard::from_query(Some(&program)).message() {
        bail!(message);
    }

    log_divider();
    access
        .create_entry(&cluster, &author, "hello", "My first journal entry.")
        .await?;
    access
        .update_entry(&cluster, &author, "hello", "Edited on-chain.")
        .await?;

    let entries = access.entries(&cluster).await;
    match EntryListView::from_query(Some(&entries)) {
        EntryListView::Entries(entries) => {
            for entry in entries {
                print_kv!(entry.data.title, entry.data.message, LogColor::Highlight);
                print_kv!("  at", account_explorer_url(&entry.address, &cluster)?);
            }
        }
        view => {
            if let Some((title, message)) = view.placeholder() {
                print_kv!(title, message, LogColor::Warning);
            }
        }
    }

    log_divider();
    access.delete_entry(&cluster, &author, "hello").await?;

    Ok(())
}
