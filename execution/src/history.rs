//! Rebuilds a wallet's transfer history from the committed transaction log.
//!
//! Only digests are persisted per wallet. Each query resolves them against the
//! host's log and decodes the transfers again, so a record can never drift
//! from the transaction it describes.

use commonware_codec::DecodeExt;
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest, Digestible};
use thiserror::Error;
use tracing::error;
use wallet_types::{
    execution::{Instruction, Transaction},
    HistoryRecord,
};

use crate::schema::Schema;
use crate::service::QueryError;
use crate::state::{State, TransactionLog};

/// A history entry that does not resolve to the transfer it was recorded for.
///
/// Execution only ever appends digests of committed transfers, so any of these
/// means the ledger and the log disagree.
#[derive(Debug, Error)]
pub enum Inconsistency {
    #[error("committed transaction {0:?} is missing from the log")]
    MissingTransaction(Digest),
    #[error("committed transaction {digest:?} could not be decoded")]
    Malformed {
        digest: Digest,
        #[source]
        source: commonware_codec::Error,
    },
    #[error("committed transaction {0:?} is not a transfer")]
    NotATransfer(Digest),
    #[error("log entry for {expected:?} hashes to {actual:?}")]
    DigestMismatch { expected: Digest, actual: Digest },
}

/// Decodes one committed transaction into the record shown in a history.
pub fn decode_record(digest: &Digest, bytes: &[u8]) -> Result<HistoryRecord, Inconsistency> {
    let tx = Transaction::decode(bytes).map_err(|source| Inconsistency::Malformed {
        digest: *digest,
        source,
    })?;

    let actual = tx.digest();
    if actual != *digest {
        return Err(Inconsistency::DigestMismatch {
            expected: *digest,
            actual,
        });
    }

    let Instruction::Transfer(transfer) = &tx.instruction else {
        return Err(Inconsistency::NotATransfer(*digest));
    };

    Ok(HistoryRecord {
        seed: transfer.seed(),
        from: tx.public.clone(),
        to: transfer.to().clone(),
        amount: transfer.amount(),
        tx_hash: *digest,
    })
}

/// Returns `owner`'s transfers in the order they were executed.
pub async fn project_history<T: State + TransactionLog>(
    schema: Schema<'_>,
    snapshot: &T,
    owner: &PublicKey,
) -> Result<Vec<HistoryRecord>, QueryError> {
    let digests = schema.history(snapshot, owner).await?;

    let mut records = Vec::with_capacity(digests.len());
    for (position, digest) in digests.iter().enumerate() {
        let Some(bytes) = snapshot.transaction(digest).await? else {
            error!(
                instance = schema.instance(),
                ?owner,
                position,
                ?digest,
                "history entry has no committed transaction"
            );
            return Err(Inconsistency::MissingTransaction(*digest).into());
        };

        let record = decode_record(digest, &bytes).inspect_err(|err| {
            error!(
                instance = schema.instance(),
                ?owner,
                position,
                ?err,
                "history entry does not resolve to a transfer"
            );
        })?;
        records.push(record);
    }

    Ok(records)
}
