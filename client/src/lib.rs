//! Client-side data access for the journal program.
//!
//! Includes the cluster resolver, account fetch/decode helpers, the mutation dispatcher, a query
//! cache, pretty-printing utilities, and an in-memory ledger for end-to-end tests.

pub mod bindings;
pub mod cluster;
pub mod data_access;
pub mod e2e_helpers;
pub mod error;
pub mod load_env;
pub mod logs;
pub mod mutations;
pub mod presentation;
pub mod query_cache;
pub mod rpc;
pub mod transactions;
pub mod views;

pub use logs::LogColor;
