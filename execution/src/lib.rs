//! Wallet ledger execution layer.
//!
//! This crate contains the deterministic transaction execution logic (`Layer`), the typed
//! ledger schema, and the read-side façade (`Service`) that answers wallet and history queries
//! from host snapshots.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution.
//! - Do not use randomness inside execution.
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! ## Storage invariants
//! A transaction that fails leaves no writes behind, and a block's changes reach the state in
//! a single `apply`. Wallet histories are append-only and hold digests of committed transfers
//! only.
//!
//! The primary entrypoint is [`Layer`].
//!
//! ## Minimal execution pipeline (example)
//! ```rust,ignore
//! use wallet_execution::{mocks::{create_account_keypair, create_wallet_tx, MockNode}, InstanceSpec, Service};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let node = MockNode::default();
//! let mut service = Service::new(InstanceSpec::new("cryptocurrency", 1)?);
//! service.bind(node.clone());
//!
//! let (signer, owner) = create_account_keypair(1);
//! node.execute_block("cryptocurrency", vec![create_wallet_tx(&signer, 100)]).await?;
//! assert_eq!(service.get_wallet(&owner).await?.map(|w| w.balance), Some(100));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod history;
pub mod schema;
pub mod service;
pub mod state_transition;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


mod layer;

mod state;

pub use config::{ConfigError, InstanceSpec};
pub use history::{decode_record, project_history, Inconsistency};
pub use layer::{Layer, Outcome};
pub use schema::Schema;
pub use service::{Binding, Node, QueryError, Service};
pub use state::{State, Status, TransactionLog};

#[cfg(any(test, feature = "mocks"))]
pub use state::Memory;
