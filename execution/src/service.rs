//! Read-side façade of a wallet service instance.

use commonware_cryptography::ed25519::PublicKey;
use std::future::Future;
use thiserror::Error;
use tracing::{info, warn};
use wallet_types::{HistoryRecord, Wallet};

use crate::config::InstanceSpec;
use crate::history::{project_history, Inconsistency};
use crate::schema::Schema;
use crate::state::{State, TransactionLog};

/// Host connection: hands out immutable point-in-time views of the ledger.
pub trait Node {
    type Snapshot: State + TransactionLog;

    fn snapshot(&self) -> impl Future<Output = anyhow::Result<Self::Snapshot>>;
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("service is not bound to a node")]
    Uninitialized,
    #[error(transparent)]
    State(#[from] anyhow::Error),
    #[error("ledger is inconsistent: {0}")]
    Inconsistent(#[from] Inconsistency),
}

pub enum Binding<N> {
    Uninitialized,
    Ready(N),
}

pub struct Service<N: Node> {
    spec: InstanceSpec,
    binding: Binding<N>,
}

impl<N: Node> Service<N> {
    pub fn new(spec: InstanceSpec) -> Self {
        Self {
            spec,
            binding: Binding::Uninitialized,
        }
    }

    pub fn spec(&self) -> &InstanceSpec {
        &self.spec
    }

    pub fn schema(&self) -> Schema<'_> {
        Schema::new(&self.spec.name)
    }

    /// Attaches the host connection, replacing any previous one.
    pub fn bind(&mut self, node: N) {
        info!(instance = %self.spec.name, id = self.spec.id, "service bound to node");
        self.binding = Binding::Ready(node);
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.binding, Binding::Ready(_))
    }

    fn node(&self) -> Result<&N, QueryError> {
        match &self.binding {
            Binding::Ready(node) => Ok(node),
            Binding::Uninitialized => {
                warn!(instance = %self.spec.name, "query against unbound service");
                Err(QueryError::Uninitialized)
            }
        }
    }

    pub async fn get_wallet(&self, owner: &PublicKey) -> Result<Option<Wallet>, QueryError> {
        let snapshot = self.node()?.snapshot().await?;
        Ok(self.schema().wallet(&snapshot, owner).await?)
    }

    /// Transfers involving `owner`, oldest first. Empty for an unknown owner.
    pub async fn get_wallet_history(
        &self,
        owner: &PublicKey,
    ) -> Result<Vec<HistoryRecord>, QueryError> {
        let snapshot = self.node()?.snapshot().await?;
        project_history(self.schema(), &snapshot, owner).await
    }
}
