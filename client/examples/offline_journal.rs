//! Runs the journal flow against the in-memory ledger, including the failure paths.

use colored::Colorize;
use journal_client::{
    cluster::Cluster,
    e2e_helpers::E2e,
    logs::{
        log_divider,
        ConsoleNotifier,
        Notifier,
    },
    mutations::MutationKind,
    presentation::delete_with_confirmation,
    print_kv,
    LogColor,
};
use solana_sdk::signer::Signer;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let e2e = E2e::new(Cluster::localnet());
    let author = e2e.new_funded_signer();

    e2e.access
        .create_entry(&e2e.cluster, &author, "groceries", "eggs, milk")
        .await?;
    // Same owner and title: rejected by the chain.
    let _ = e2e
        .access
        .create_entry(&e2e.cluster, &author, "groceries", "bread")
        .await;
    // Blank message: rejected before anything is sent.
    let _ = e2e
        .access
        .update_entry(&e2e.cluster, &author, "groceries", " ")
        .await;
    e2e.access
        .update_entry(&e2e.cluster, &author, "groceries", "eggs, milk, bread")
        .await?;

    let entry = e2e.fetch_entry(&author.pubkey(), "groceries").await?;
    print_kv!(entry.data.title, entry.data.message, LogColor::Highlight);
    print_kv!(
        "Create status",
        format!("{:?}", e2e.access.mutation_status(MutationKind::Create))
    );

    delete_with_confirmation(&e2e.access, &e2e.cluster, &author, "groceries", &|prompt: &str| {
        print_kv!("Prompt", prompt, LogColor::Warning);
        true
    })
    .await?;

    log_divider();
    for notification in e2e.notifier.notifications() {
        ConsoleNotifier.notify(notification);
    }
    print_kv!(
        "Transactions sent",
        e2e.ledger().transactions_sent(),
        LogColor::Info
    );

    Ok(())
}
