//! Typed access to the wallet indices of one service instance.
//!
//! Two logical indices live in the host store, both scoped by the instance
//! name:
//! - `wallets`: owner public key -> [`Wallet`], one entry per owner.
//! - `history(owner)`: append-only list of transaction digests, stored as a
//!   length entry plus one entry per position.

use anyhow::{bail, Context as _, Result};
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest};
use wallet_types::{execution::Key, Value, Wallet};

use crate::state::State;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schema<'a> {
    instance: &'a str,
}

impl<'a> Schema<'a> {
    pub fn new(instance: &'a str) -> Self {
        Self { instance }
    }

    pub fn instance(&self) -> &'a str {
        self.instance
    }

    pub async fn wallet<S: State>(&self, state: &S, owner: &PublicKey) -> Result<Option<Wallet>> {
        let key = Key::wallet(self.instance, owner);
        match state.get(&key).await.context("read wallet")? {
            Some(Value::Wallet(wallet)) => Ok(Some(wallet)),
            None => Ok(None),
            Some(other) => bail!("corrupted wallet entry {key:?}: {other:?}"),
        }
    }

    pub async fn contains_wallet<S: State>(&self, state: &S, owner: &PublicKey) -> Result<bool> {
        Ok(self.wallet(state, owner).await?.is_some())
    }

    pub async fn put_wallet<S: State>(
        &self,
        state: &mut S,
        owner: &PublicKey,
        wallet: Wallet,
    ) -> Result<()> {
        state
            .insert(Key::wallet(self.instance, owner), Value::Wallet(wallet))
            .await
            .context("write wallet")
    }

    /// Number of entries in `owner`'s history. Zero for an unknown owner.
    pub async fn history_len<S: State>(&self, state: &S, owner: &PublicKey) -> Result<u64> {
        let key = Key::history_length(self.instance, owner);
        match state.get(&key).await.context("read history length")? {
            Some(Value::HistoryLength(length)) => Ok(length),
            None => Ok(0),
            Some(other) => bail!("corrupted history length {key:?}: {other:?}"),
        }
    }

    pub async fn history_entry<S: State>(
        &self,
        state: &S,
        owner: &PublicKey,
        position: u64,
    ) -> Result<Option<Digest>> {
        let key = Key::history_entry(self.instance, owner, position);
        match state.get(&key).await.context("read history entry")? {
            Some(Value::HistoryEntry(digest)) => Ok(Some(digest)),
            None => Ok(None),
            Some(other) => bail!("corrupted history entry {key:?}: {other:?}"),
        }
    }

    /// All of `owner`'s history in execution order. Empty for an unknown owner.
    pub async fn history<S: State>(&self, state: &S, owner: &PublicKey) -> Result<Vec<Digest>> {
        let length = self.history_len(state, owner).await?;
        let mut entries = Vec::new();
        for position in 0..length {
            let Some(digest) = self.history_entry(state, owner, position).await? else {
                bail!("history of {owner:?} has length {length} but no entry at {position}");
            };
            entries.push(digest);
        }
        Ok(entries)
    }

    /// Appends `digest` to `owner`'s history and returns its position.
    pub async fn append_history<S: State>(
        &self,
        state: &mut S,
        owner: &PublicKey,
        digest: Digest,
    ) -> Result<u64> {
        let position = self.history_len(state, owner).await?;
        state
            .insert(
                Key::history_entry(self.instance, owner, position),
                Value::HistoryEntry(digest),
            )
            .await
            .context("write history entry")?;
        state
            .insert(
                Key::history_length(self.instance, owner),
                Value::HistoryLength(position + 1),
            )
            .await
            .context("write history length")?;
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::create_account_keypair;
    use crate::state::Memory;
    use commonware_cryptography::{Hasher, Sha256};
    use commonware_runtime::deterministic::Runner;
    use commonware_runtime::Runner as _;

    #[test]
    fn test_unknown_owner_has_no_wallet_and_empty_history() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let schema = Schema::new("cryptocurrency");
            let (_, owner) = create_account_keypair(1);

            assert_eq!(schema.wallet(&state, &owner).await.unwrap(), None);
            assert!(!schema.contains_wallet(&state, &owner).await.unwrap());
            assert_eq!(schema.history_len(&state, &owner).await.unwrap(), 0);
            assert!(schema.history(&state, &owner).await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_history_is_append_only_in_order() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let schema = Schema::new("cryptocurrency");
            let (_, owner) = create_account_keypair(1);

            let digests: Vec<_> = (0u8..3).map(|i| Sha256::hash(&[i])).collect();
            for (expected, digest) in digests.iter().enumerate() {
                let position = schema
                    .append_history(&mut state, &owner, *digest)
                    .await
                    .unwrap();
                assert_eq!(position, expected as u64);
            }

            assert_eq!(schema.history(&state, &owner).await.unwrap(), digests);
            assert_eq!(
                schema.history_entry(&state, &owner, 1).await.unwrap(),
                Some(digests[1])
            );
            assert_eq!(schema.history_entry(&state, &owner, 3).await.unwrap(), None);
        });
    }

    #[test]
    fn test_instances_do_not_share_indices() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let first = Schema::new("cryptocurrency");
            let second = Schema::new("cryptocurrency-2");
            let (_, owner) = create_account_keypair(1);

            first
                .put_wallet(&mut state, &owner, Wallet::new(100))
                .await
                .unwrap();
            first
                .append_history(&mut state, &owner, Sha256::hash(b"tx"))
                .await
                .unwrap();

            assert_eq!(
                first.wallet(&state, &owner).await.unwrap(),
                Some(Wallet::new(100))
            );
            assert_eq!(second.wallet(&state, &owner).await.unwrap(), None);
            assert_eq!(second.history_len(&state, &owner).await.unwrap(), 0);
        });
    }

    #[test]
    fn test_mismatched_value_is_reported_as_corruption() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let schema = Schema::new("cryptocurrency");
            let (_, owner) = create_account_keypair(1);

            state
                .insert(Key::wallet("cryptocurrency", &owner), Value::HistoryLength(3))
                .await
                .unwrap();
            let err = schema.wallet(&state, &owner).await.unwrap_err();
            assert!(err.to_string().contains("corrupted wallet entry"));
        });
    }

    #[test]
    fn test_corrupted_history_length_is_an_error() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let schema = Schema::new("cryptocurrency");
            let (_, owner) = create_account_keypair(1);

            state
                .insert(
                    Key::history_length("cryptocurrency", &owner),
                    Value::HistoryLength(u64::MAX),
                )
                .await
                .unwrap();
            let err = schema.history(&state, &owner).await.unwrap_err();
            assert!(err.to_string().contains("no entry at 0"));
        });
    }
}
