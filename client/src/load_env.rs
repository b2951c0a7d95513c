//! Environment configuration for demos and binaries.
//!
//! - `JOURNAL_CLUSTER`: a cluster name or id such as `devnet` or `solana:devnet`. Defaults to
//!   localnet.
//! - `JOURNAL_RPC_URL`: overrides the cluster's default RPC endpoint.
//! - `JOURNAL_SECRET_KEY`: the signer, as a JSON byte array or a base58 string.

use anyhow::Context;
use solana_sdk::{
    bs58,
    signature::Keypair,
};

use crate::cluster::Cluster;

pub const CLUSTER_VAR: &str = "JOURNAL_CLUSTER";
pub const RPC_URL_VAR: &str = "JOURNAL_RPC_URL";
pub const SECRET_KEY_VAR: &str = "JOURNAL_SECRET_KEY";

fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn cluster() -> Cluster {
    let mut cluster = var(CLUSTER_VAR)
        .map(|moniker| Cluster::from_moniker(&moniker))
        .unwrap_or_default();
    if let Some(url) = var(RPC_URL_VAR) {
        cluster.url = url;
    }

    cluster
}

/// The signer from `JOURNAL_SECRET_KEY`, or `None` if it isn't set.
pub fn keypair() -> anyhow::Result<Option<Keypair>> {
    var(SECRET_KEY_VAR)
        .map(|secret| parse_keypair(&secret).with_context(|| format!("Invalid {SECRET_KEY_VAR}")))
        .transpose()
}

pub fn parse_keypair(secret: &str) -> anyhow::Result<Keypair> {
    let byte_vec: Vec<u8> = if secret.starts_with('[') {
        serde_json::from_str(secret).context("Invalid JSON keypair")?
    } else {
        bs58::decode(secret)
            .into_vec()
            .context("Invalid base58 keypair")?
    };

    Keypair::try_from(byte_vec.as_slice()).context("Invalid keypair bytes")
}

#[cfg(test)]
mod tests {
    use solana_sdk::signature::Signer;

    use super::*;

    #[test]
    fn keypairs_parse_from_json_and_base58() {
        let kp = Keypair::new();

        let json = serde_json::to_string(&kp.to_bytes().to_vec()).unwrap();
        assert_eq!(parse_keypair(&json).unwrap().pubkey(), kp.pubkey());
        assert_eq!(
            parse_keypair(&kp.to_base58_string()).unwrap().pubkey(),
            kp.pubkey()
        );

        assert!(parse_keypair("[1, 2, 3]").is_err());
        assert!(parse_keypair("not-base58-0OIl").is_err());
    }
}
