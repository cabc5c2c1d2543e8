//! Test helpers: deterministic keys, signed transactions, and an in-memory host.

use crate::state::{Memory, State, TransactionLog};
use crate::state_transition::{execute_state_transition, StateTransitionResult};
use anyhow::{bail, Result};
use commonware_codec::Encode;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    sha256::Digest,
    Digestible, Signer,
};
use futures::lock::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use wallet_types::execution::{Instruction, Key, Transaction, Value};
use wallet_types::{CreateWallet, Transfer};

use crate::service::Node;

/// Creates an account keypair for Ed25519 signatures used by wallet owners
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let private = PrivateKey::from_seed(seed);
    let public = private.public_key();
    (private, public)
}

/// Signs a create-wallet transaction. Panics on a negative balance.
pub fn create_wallet_tx(signer: &PrivateKey, initial_balance: i64) -> Transaction {
    let body = CreateWallet::new(initial_balance).expect("valid initial balance");
    Transaction::sign(signer, Instruction::CreateWallet(body))
}

/// Signs a transfer transaction. Panics on a non-positive amount.
pub fn transfer_tx(signer: &PrivateKey, seed: u64, to: &PublicKey, amount: i64) -> Transaction {
    let body = Transfer::new(seed, to.clone(), amount).expect("valid transfer amount");
    Transaction::sign(signer, Instruction::Transfer(body))
}

#[derive(Default)]
struct Ledger {
    state: Memory,
    log: HashMap<Digest, Vec<u8>>,
}

/// In-memory host: a key/value store plus the committed transaction log.
///
/// Clones share the same ledger, so a `Service` bound to a clone observes
/// blocks executed through the original.
#[derive(Clone, Default)]
pub struct MockNode {
    ledger: Arc<Mutex<Ledger>>,
}

impl MockNode {
    /// Verifies, executes and commits a block of transactions.
    ///
    /// Transactions whose digest is already in the log (or earlier in the same
    /// block) are dropped before execution. Every other transaction lands in the
    /// log, including the ones rolled back. The ledger stays locked for the whole
    /// block, so concurrent callers are serialized.
    pub async fn execute_block(
        &self,
        instance: &str,
        transactions: Vec<Transaction>,
    ) -> Result<StateTransitionResult> {
        for tx in &transactions {
            if !tx.verify() {
                bail!("invalid signature on transaction {:?}", tx.digest());
            }
        }

        let mut ledger = self.ledger.lock().await;
        let mut seen = HashSet::new();
        let mut committed = Vec::new();
        let mut accepted = Vec::new();
        for tx in transactions {
            let digest = tx.digest();
            if ledger.log.contains_key(&digest) || !seen.insert(digest) {
                debug!(?digest, "dropping replayed transaction");
                continue;
            }
            committed.push((digest, tx.encode().to_vec()));
            accepted.push(tx);
        }

        let mut state = ledger.state.clone();
        let result = execute_state_transition(&mut state, instance, accepted).await?;
        ledger.state = state;
        ledger.log.extend(committed);
        Ok(result)
    }

    /// Drops a committed transaction from the log.
    pub async fn forget_transaction(&self, digest: &Digest) {
        self.ledger.lock().await.log.remove(digest);
    }

    /// Replaces the bytes stored behind a committed digest.
    pub async fn overwrite_transaction(&self, digest: Digest, bytes: Vec<u8>) {
        self.ledger.lock().await.log.insert(digest, bytes);
    }
}

/// Point-in-time copy of a [`MockNode`]'s ledger.
pub struct MockSnapshot {
    state: Memory,
    log: HashMap<Digest, Vec<u8>>,
}

impl State for MockSnapshot {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        self.state.get(key).await
    }

    async fn insert(&mut self, _: Key, _: Value) -> Result<()> {
        bail!("snapshot is read-only")
    }

    async fn delete(&mut self, _: &Key) -> Result<()> {
        bail!("snapshot is read-only")
    }
}

impl TransactionLog for MockSnapshot {
    async fn transaction(&self, digest: &Digest) -> Result<Option<Vec<u8>>> {
        Ok(self.log.get(digest).cloned())
    }
}

impl Node for MockNode {
    type Snapshot = MockSnapshot;

    async fn snapshot(&self) -> Result<MockSnapshot> {
        let ledger = self.ledger.lock().await;
        Ok(MockSnapshot {
            state: ledger.state.clone(),
            log: ledger.log.clone(),
        })
    }
}
