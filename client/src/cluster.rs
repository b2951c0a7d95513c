//! Cluster selection and the per-cluster program identifier.

use std::fmt;

use journal_interface::program;
use solana_address::Address;
use url::form_urlencoded;

pub const DEVNET_ID: &str = "solana:devnet";
pub const TESTNET_ID: &str = "solana:testnet";
pub const MAINNET_ID: &str = "solana:mainnet";
pub const LOCALNET_ID: &str = "solana:localnet";

pub const DEVNET_URL: &str = "https://api.devnet.solana.com";
pub const TESTNET_URL: &str = "https://api.testnet.solana.com";
pub const MAINNET_URL: &str = "https://api.mainnet-beta.solana.com";
pub const LOCALNET_URL: &str = "http://localhost:8899";

/// Returns the journal program id deployed on the cluster with id `cluster_id`.
///
/// Devnet and testnet share one deployment. Every other id, known or not, resolves to the id the
/// program declares.
pub fn resolve_program_id(cluster_id: &str) -> Address {
    match cluster_id {
        DEVNET_ID | TESTNET_ID => program::DEVNET_ID,
        _ => program::ID,
    }
}

/// The network a call is made against. Passed explicitly to every data-access call.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Cluster {
    /// A wallet-standard style id such as `solana:devnet`.
    pub id: String,
    /// The RPC endpoint.
    pub url: String,
}

impl Cluster {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }

    pub fn devnet() -> Self {
        Self::new(DEVNET_ID, DEVNET_URL)
    }

    pub fn testnet() -> Self {
        Self::new(TESTNET_ID, TESTNET_URL)
    }

    pub fn mainnet() -> Self {
        Self::new(MAINNET_ID, MAINNET_URL)
    }

    pub fn localnet() -> Self {
        Self::new(LOCALNET_ID, LOCALNET_URL)
    }

    /// Parses a short cluster name (`devnet`) or a full id (`solana:devnet`). Anything else is
    /// treated as a custom cluster id served from `localhost`.
    pub fn from_moniker(moniker: &str) -> Self {
        let moniker = moniker.trim();
        let name = moniker.strip_prefix("solana:").unwrap_or(moniker);
        match name {
            "devnet" => Self::devnet(),
            "testnet" => Self::testnet(),
            "mainnet" | "mainnet-beta" => Self::mainnet(),
            "localnet" | "localhost" => Self::localnet(),
            _ => Self::new(moniker, LOCALNET_URL),
        }
    }

    pub fn program_id(&self) -> Address {
        resolve_program_id(&self.id)
    }

    /// The query string the Solana explorer expects for this cluster, if any. Custom clusters
    /// carry their RPC url as a form-encoded `customUrl` pair.
    pub fn explorer_query(&self) -> Option<String> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        match self.id.as_str() {
            MAINNET_ID => return None,
            DEVNET_ID => query.append_pair("cluster", "devnet"),
            TESTNET_ID => query.append_pair("cluster", "testnet"),
            _ => query
                .append_pair("cluster", "custom")
                .append_pair("customUrl", &self.url),
        };
        Some(query.finish())
    }
}

impl Default for Cluster {
    fn default() -> Self {
        Self::localnet()
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cluster_resolves_to_a_fixed_address() {
        for id in [DEVNET_ID, TESTNET_ID, MAINNET_ID, LOCALNET_ID] {
            let program_id = resolve_program_id(id);
            assert_ne!(program_id, Address::default());
            assert_eq!(program_id, resolve_program_id(id));
        }
        assert_eq!(resolve_program_id(DEVNET_ID), resolve_program_id(TESTNET_ID));
        assert_ne!(resolve_program_id(DEVNET_ID), resolve_program_id(MAINNET_ID));
    }

    #[test]
    fn unknown_clusters_fall_back_to_the_default() {
        let default = resolve_program_id(MAINNET_ID);
        for id in ["", "solana:devnet2", "DEVNET", "eclipse:mainnet"] {
            assert_eq!(resolve_program_id(id), default);
        }
    }

    #[test]
    fn monikers() {
        assert_eq!(Cluster::from_moniker("devnet"), Cluster::devnet());
        assert_eq!(Cluster::from_moniker("solana:testnet"), Cluster::testnet());
        assert_eq!(Cluster::from_moniker(" mainnet-beta "), Cluster::mainnet());
        assert_eq!(Cluster::from_moniker("localhost"), Cluster::localnet());

        let custom = Cluster::from_moniker("solana:custom");
        assert_eq!(custom.id, "solana:custom");
        assert_eq!(custom.program_id(), program::ID);
    }

    #[test]
    fn explorer_queries() {
        assert_eq!(Cluster::mainnet().explorer_query(), None);
        assert_eq!(
            Cluster::devnet().explorer_query().as_deref(),
            Some("cluster=devnet")
        );
        assert_eq!(
            Cluster::localnet().explorer_query().as_deref(),
            Some("cluster=custom&customUrl=http%3A%2F%2Flocalhost%3A8899")
        );
    }

    #[test]
    fn custom_url_query_stays_inside_its_pair() {
        let url = "http://rpc.example:8899/?api-key=abc&region=eu#frag";
        let query = Cluster::new("solana:custom", url).explorer_query().unwrap();
        assert_eq!(
            query,
            "cluster=custom&customUrl=http%3A%2F%2Frpc.example%3A8899%2F%3Fapi-key%3Dabc%26region%3Deu%23frag"
        );

        let pairs: Vec<_> = form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("cluster".to_string(), "custom".to_string()),
                ("customUrl".to_string(), url.to_string()),
            ]
        );
    }
}
