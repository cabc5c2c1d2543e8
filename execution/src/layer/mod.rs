use anyhow::{Context as _, Result};
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest, Digestible};
use std::collections::BTreeMap;
use tracing::debug;
use wallet_types::execution::{ErrorCode, Event, Instruction, Key, Output, Transaction, Value};

use crate::schema::Schema;
use crate::state::{State, Status};

mod handlers;

/// Result of executing one transaction: its events, or the code explaining
/// why it left the ledger untouched.
pub type Outcome = std::result::Result<Vec<Event>, ErrorCode>;

/// Mutable view of one service instance's indices for the duration of a block.
///
/// Writes of the transaction being executed are staged separately and only
/// merged into `pending` when it succeeds, so a failed transaction leaves no
/// trace. Nothing reaches the underlying state until [`Layer::commit`].
pub struct Layer<'a, S: State> {
    state: &'a S,
    instance: &'a str,

    pending: BTreeMap<Key, Status>,
    staged: BTreeMap<Key, Status>,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, instance: &'a str) -> Self {
        Self {
            state,
            instance,

            pending: BTreeMap::new(),
            staged: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> Schema<'a> {
        Schema::new(self.instance)
    }

    /// Executes a single transaction authored by `transaction.public`.
    ///
    /// `Ok(Err(code))` is a normal ledger outcome. `Err(_)` means the
    /// underlying state could not be read or written and the block must not
    /// be committed.
    pub async fn apply(&mut self, transaction: &Transaction) -> Result<Outcome> {
        debug_assert!(self.staged.is_empty());
        let public = &transaction.public;
        let outcome = match &transaction.instruction {
            Instruction::CreateWallet(body) => self.handle_create_wallet(public, body).await,
            Instruction::Transfer(body) => {
                self.handle_transfer(public, &transaction.digest(), body)
                    .await
            }
        };

        match outcome {
            Ok(Ok(events)) => {
                let staged = std::mem::take(&mut self.staged);
                self.pending.extend(staged);
                Ok(Ok(events))
            }
            Ok(Err(code)) => {
                self.staged.clear();
                Ok(Err(code))
            }
            Err(err) => {
                self.staged.clear();
                Err(err)
            }
        }
    }

    /// Executes a block's transactions in order.
    ///
    /// Each transaction contributes its events (or a single
    /// [`Event::TransactionFailed`]) followed by the transaction itself.
    pub async fn execute(&mut self, transactions: Vec<Transaction>) -> Result<Vec<Output>> {
        let mut outputs = Vec::new();

        for tx in transactions {
            let outcome = self
                .apply(&tx)
                .await
                .with_context(|| format!("execute transaction {:?}", tx.digest()))?;
            match outcome {
                Ok(events) => outputs.extend(events.into_iter().map(Output::Event)),
                Err(code) => {
                    let digest = tx.digest();
                    debug!(
                        public = ?tx.public,
                        ?digest,
                        %code,
                        "transaction failed; changes rolled back"
                    );
                    outputs.push(Output::Event(Event::TransactionFailed {
                        author: tx.public.clone(),
                        digest,
                        code,
                    }));
                }
            }
            outputs.push(Output::Transaction(tx));
        }

        Ok(outputs)
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        let status = self.staged.get(key).or_else(|| self.pending.get(key));
        Ok(match status {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await?,
        })
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.staged.insert(key, Status::Update(value));
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.staged.insert(key.clone(), Status::Delete);
        Ok(())
    }
}
