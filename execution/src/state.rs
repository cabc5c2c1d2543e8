use anyhow::Result;
use commonware_cryptography::sha256::Digest;
use std::future::Future;
use wallet_types::execution::{Key, Value};

#[cfg(any(test, feature = "mocks"))]
use std::collections::HashMap;

/// Key/value view over the host's storage engine.
///
/// During execution this is a fork bound to one block; during queries it is a
/// point-in-time snapshot.
pub trait State {
    fn get(&self, key: &Key) -> impl Future<Output = Result<Option<Value>>>;
    fn insert(&mut self, key: Key, value: Value) -> impl Future<Output = Result<()>>;
    fn delete(&mut self, key: &Key) -> impl Future<Output = Result<()>>;

    fn apply(&mut self, changes: Vec<(Key, Status)>) -> impl Future<Output = Result<()>> {
        async {
            for (key, status) in changes {
                match status {
                    Status::Update(value) => self.insert(key, value).await?,
                    Status::Delete => self.delete(&key).await?,
                }
            }
            Ok(())
        }
    }
}

/// Committed transaction log owned by the host, keyed by transaction digest.
///
/// Entries are the encoded transactions exactly as committed.
pub trait TransactionLog {
    fn transaction(&self, digest: &Digest) -> impl Future<Output = Result<Option<Vec<u8>>>>;
}

#[cfg(any(test, feature = "mocks"))]
#[derive(Clone, Default)]
pub struct Memory {
    state: HashMap<Key, Value>,
}

#[cfg(any(test, feature = "mocks"))]
impl Memory {
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

#[cfg(any(test, feature = "mocks"))]
impl State for Memory {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.state.get(key).cloned())
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.state.insert(key, value);
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.state.remove(key);
        Ok(())
    }
}

/// Pending change to a single key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Update(Value),
    Delete,
}
