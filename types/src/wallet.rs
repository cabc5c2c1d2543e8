//! Wallet ledger records and the validated bodies of wallet instructions.

use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest};
use commonware_utils::{from_hex, hex};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Construction-time rejection of an instruction body.
///
/// A transaction that fails this check is never committed, so these errors are
/// never observable in ledger state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum InvalidArgument {
    #[error("the initial balance ({0}) must not be negative")]
    NegativeInitialBalance(i64),
    #[error("non-positive transfer amount: {0}")]
    NonPositiveAmount(i64),
}

/// A ledger account. Addressed by its owner's public key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: u64,
}

impl Wallet {
    pub fn new(balance: u64) -> Self {
        Self { balance }
    }
}

impl Write for Wallet {
    fn write(&self, writer: &mut impl BufMut) {
        self.balance.write(writer);
    }
}

impl Read for Wallet {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            balance: u64::read(reader)?,
        })
    }
}

impl FixedSize for Wallet {
    const SIZE: usize = u64::SIZE;
}

/// Body of a create-wallet instruction.
///
/// The wire carries a signed integer, so the balance is range-checked before a
/// value of this type can exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CreateWallet {
    initial_balance: u64,
}

impl CreateWallet {
    pub fn new(initial_balance: i64) -> Result<Self, InvalidArgument> {
        let initial_balance = u64::try_from(initial_balance)
            .map_err(|_| InvalidArgument::NegativeInitialBalance(initial_balance))?;
        Ok(Self { initial_balance })
    }

    pub fn initial_balance(&self) -> u64 {
        self.initial_balance
    }
}

impl Write for CreateWallet {
    fn write(&self, writer: &mut impl BufMut) {
        // `new` caps the value at i64::MAX, so the cast is lossless.
        (self.initial_balance as i64).write(writer);
    }
}

impl Read for CreateWallet {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let initial_balance = i64::read(reader)?;
        Self::new(initial_balance)
            .map_err(|_| Error::Invalid("CreateWallet", "negative initial balance"))
    }
}

impl FixedSize for CreateWallet {
    const SIZE: usize = i64::SIZE;
}

/// Body of a transfer instruction. The sender is the transaction author.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Transfer {
    seed: u64,
    to: PublicKey,
    amount: u64,
}

impl Transfer {
    pub fn new(seed: u64, to: PublicKey, amount: i64) -> Result<Self, InvalidArgument> {
        if amount <= 0 {
            return Err(InvalidArgument::NonPositiveAmount(amount));
        }
        Ok(Self {
            seed,
            to,
            amount: amount as u64,
        })
    }

    /// Distinguishes otherwise identical transfers (and therefore their digests).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn to(&self) -> &PublicKey {
        &self.to
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }
}

impl Write for Transfer {
    fn write(&self, writer: &mut impl BufMut) {
        self.seed.write(writer);
        self.to.write(writer);
        (self.amount as i64).write(writer);
    }
}

impl Read for Transfer {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let seed = u64::read(reader)?;
        let to = PublicKey::read(reader)?;
        let amount = i64::read(reader)?;
        Self::new(seed, to, amount)
            .map_err(|_| Error::Invalid("Transfer", "non-positive transfer amount"))
    }
}

impl FixedSize for Transfer {
    const SIZE: usize = u64::SIZE + PublicKey::SIZE + i64::SIZE;
}

/// A transfer as seen from a wallet's history. Rebuilt on every query from the
/// committed transaction behind `tx_hash`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub seed: u64,
    #[serde(with = "serde_public_key_hex")]
    pub from: PublicKey,
    #[serde(with = "serde_public_key_hex")]
    pub to: PublicKey,
    pub amount: u64,
    #[serde(with = "serde_digest_hex")]
    pub tx_hash: Digest,
}

fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    from_hex(s).ok_or_else(|| "invalid hex string".to_string())
}

mod serde_public_key_hex {
    use super::{hex, hex_decode};
    use commonware_codec::DecodeExt;
    use commonware_cryptography::ed25519::PublicKey;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(public_key: &PublicKey, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex(public_key.as_ref()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<PublicKey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex_decode(&s).map_err(serde::de::Error::custom)?;
        PublicKey::decode(bytes.as_slice())
            .map_err(|_| serde::de::Error::custom("invalid public key"))
    }
}

mod serde_digest_hex {
    use super::{hex, hex_decode};
    use commonware_codec::DecodeExt;
    use commonware_cryptography::sha256::Digest;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(digest: &Digest, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex(digest.as_ref()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Digest, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex_decode(&s).map_err(serde::de::Error::custom)?;
        Digest::decode(bytes.as_slice()).map_err(|_| serde::de::Error::custom("invalid digest"))
    }
}
