use crate::wallet::{CreateWallet, Transfer, Wallet};
use bytes::{Buf, BufMut};
use commonware_codec::{Encode, EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{
    ed25519::{self, PublicKey},
    sha256::{Digest, Sha256},
    Digestible, Hasher, Signer, Verifier,
};
use commonware_utils::union;
use thiserror::Error as ThisError;

pub const NAMESPACE: &[u8] = b"_WALLET_LEDGER";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";

/// Upper bound on a service instance name, in bytes.
pub const MAX_INSTANCE_NAME_LENGTH: usize = 64;

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(instruction: &Instruction) -> Vec<u8> {
        instruction.encode().to_vec()
    }

    pub fn sign(private: &ed25519::PrivateKey, instruction: Instruction) -> Self {
        let signature = private.sign(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&instruction),
        );

        Self {
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&self.instruction),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.instruction.encode_size() + self.public.encode_size() + self.signature.encode_size()
    }
}

impl Digestible for Transaction {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.instruction.encode().as_ref());
        hasher.update(self.public.as_ref());
        // We don't include the signature as part of the digest (any valid
        // signature will be valid for the transaction)
        hasher.finalize()
    }
}

/// The closed set of wallet transaction kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Create a wallet owned by the author.
    /// Binary: [0] [initialBalance:i64 BE]
    CreateWallet(CreateWallet),

    /// Move funds from the author's wallet to another wallet.
    /// Binary: [1] [seed:u64 BE] [toWallet:32] [amount:i64 BE]
    Transfer(Transfer),
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::CreateWallet(body) => {
                0u8.write(writer);
                body.write(writer);
            }
            Self::Transfer(body) => {
                1u8.write(writer);
                body.write(writer);
            }
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match u8::read(reader)? {
            0 => Self::CreateWallet(CreateWallet::read(reader)?),
            1 => Self::Transfer(Transfer::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::CreateWallet(_) => CreateWallet::SIZE,
                Self::Transfer(_) => Transfer::SIZE,
            }
    }
}

/// Why a committed transaction had no effect on the ledger.
///
/// The numeric codes are part of the service protocol and must never be
/// renumbered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ThisError)]
#[repr(u8)]
pub enum ErrorCode {
    #[error("WALLET_ALREADY_EXISTS")]
    WalletAlreadyExists = 0,
    #[error("UNKNOWN_RECEIVER")]
    UnknownReceiver = 1,
    #[error("UNKNOWN_SENDER")]
    UnknownSender = 2,
    #[error("INSUFFICIENT_FUNDS")]
    InsufficientFunds = 3,
    #[error("SAME_SENDER_AND_RECEIVER")]
    SameSenderAndReceiver = 4,
    #[error("BALANCE_OVERFLOW")]
    BalanceOverflow = 5,
}

impl ErrorCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::WalletAlreadyExists,
            1 => Self::UnknownReceiver,
            2 => Self::UnknownSender,
            3 => Self::InsufficientFunds,
            4 => Self::SameSenderAndReceiver,
            5 => Self::BalanceOverflow,
            i => return Err(Error::InvalidEnum(i)),
        })
    }
}

impl Write for ErrorCode {
    fn write(&self, writer: &mut impl BufMut) {
        self.code().write(writer);
    }
}

impl Read for ErrorCode {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Self::try_from(u8::read(reader)?)
    }
}

impl FixedSize for ErrorCode {
    const SIZE: usize = u8::SIZE;
}

/// Per-instance index an entry belongs to.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Index {
    /// Wallet of an owner (tag 0)
    Wallet(PublicKey),

    // Append-only transaction history of an owner (tags 1-2)
    HistoryLength(PublicKey),
    HistoryEntry(PublicKey, u64),
}

impl Write for Index {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Wallet(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }
            Self::HistoryLength(pk) => {
                1u8.write(writer);
                pk.write(writer);
            }
            Self::HistoryEntry(pk, position) => {
                2u8.write(writer);
                pk.write(writer);
                position.write(writer);
            }
        }
    }
}

impl Read for Index {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let index = match u8::read(reader)? {
            0 => Self::Wallet(PublicKey::read(reader)?),
            1 => Self::HistoryLength(PublicKey::read(reader)?),
            2 => Self::HistoryEntry(PublicKey::read(reader)?, u64::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(index)
    }
}

impl EncodeSize for Index {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Wallet(_) | Self::HistoryLength(_) => PublicKey::SIZE,
                Self::HistoryEntry(_, _) => PublicKey::SIZE + u64::SIZE,
            }
    }
}

/// Storage key: an index entry scoped to one service instance, so several
/// instances can share a store without colliding.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub struct Key {
    pub instance: String,
    pub index: Index,
}

impl Key {
    pub fn wallet(instance: &str, owner: &PublicKey) -> Self {
        Self {
            instance: instance.to_string(),
            index: Index::Wallet(owner.clone()),
        }
    }

    pub fn history_length(instance: &str, owner: &PublicKey) -> Self {
        Self {
            instance: instance.to_string(),
            index: Index::HistoryLength(owner.clone()),
        }
    }

    pub fn history_entry(instance: &str, owner: &PublicKey, position: u64) -> Self {
        Self {
            instance: instance.to_string(),
            index: Index::HistoryEntry(owner.clone(), position),
        }
    }
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        (self.instance.len() as u32).write(writer);
        writer.put_slice(self.instance.as_bytes());
        self.index.write(writer);
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instance_len = u32::read(reader)? as usize;
        if instance_len > MAX_INSTANCE_NAME_LENGTH {
            return Err(Error::Invalid("Key", "instance name too long"));
        }
        if reader.remaining() < instance_len {
            return Err(Error::EndOfBuffer);
        }
        let mut instance_bytes = vec![0u8; instance_len];
        reader.copy_to_slice(&mut instance_bytes);
        let instance = String::from_utf8(instance_bytes)
            .map_err(|_| Error::Invalid("Key", "invalid UTF-8 in instance name"))?;
        let index = Index::read(reader)?;

        Ok(Self { instance, index })
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u32::SIZE + self.instance.len() + self.index.encode_size()
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Value {
    /// Wallet record (tag 0)
    Wallet(Wallet),

    // History values (tags 1-2)
    HistoryLength(u64),
    HistoryEntry(Digest),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Wallet(wallet) => {
                0u8.write(writer);
                wallet.write(writer);
            }
            Self::HistoryLength(length) => {
                1u8.write(writer);
                length.write(writer);
            }
            Self::HistoryEntry(digest) => {
                2u8.write(writer);
                digest.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Wallet(Wallet::read(reader)?),
            1 => Self::HistoryLength(u64::read(reader)?),
            2 => Self::HistoryEntry(Digest::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Wallet(_) => Wallet::SIZE,
                Self::HistoryLength(_) => u64::SIZE,
                Self::HistoryEntry(_) => Digest::SIZE,
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Wallet events (tags 0-1)
    WalletCreated {
        owner: PublicKey,
        balance: u64,
    },
    Transferred {
        from: PublicKey,
        to: PublicKey,
        amount: u64,
        seed: u64,
    },

    // Outcome of a transaction that was rolled back (tag 2)
    TransactionFailed {
        author: PublicKey,
        digest: Digest,
        code: ErrorCode,
    },
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::WalletCreated { owner, balance } => {
                0u8.write(writer);
                owner.write(writer);
                balance.write(writer);
            }
            Self::Transferred {
                from,
                to,
                amount,
                seed,
            } => {
                1u8.write(writer);
                from.write(writer);
                to.write(writer);
                amount.write(writer);
                seed.write(writer);
            }
            Self::TransactionFailed {
                author,
                digest,
                code,
            } => {
                2u8.write(writer);
                author.write(writer);
                digest.write(writer);
                code.write(writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match u8::read(reader)? {
            0 => Self::WalletCreated {
                owner: PublicKey::read(reader)?,
                balance: u64::read(reader)?,
            },
            1 => Self::Transferred {
                from: PublicKey::read(reader)?,
                to: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
                seed: u64::read(reader)?,
            },
            2 => Self::TransactionFailed {
                author: PublicKey::read(reader)?,
                digest: Digest::read(reader)?,
                code: ErrorCode::read(reader)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::WalletCreated { .. } => PublicKey::SIZE + u64::SIZE,
                Self::Transferred { .. } => PublicKey::SIZE * 2 + u64::SIZE * 2,
                Self::TransactionFailed { .. } => {
                    PublicKey::SIZE + Digest::SIZE + ErrorCode::SIZE
                }
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Event(event) => event.encode_size(),
            Self::Transaction(transaction) => transaction.encode_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::DecodeExt;
    use commonware_cryptography::ed25519::PrivateKey;

    fn signer(seed: u64) -> PrivateKey {
        PrivateKey::from_seed(seed)
    }

    fn create_wallet(balance: i64) -> Instruction {
        Instruction::CreateWallet(CreateWallet::new(balance).unwrap())
    }

    fn transfer(seed: u64, to: &PublicKey, amount: i64) -> Instruction {
        Instruction::Transfer(Transfer::new(seed, to.clone(), amount).unwrap())
    }

    #[test]
    fn test_signed_transaction_verifies() {
        let tx = Transaction::sign(&signer(1), create_wallet(100));
        assert!(tx.verify());

        let mut tampered = tx.clone();
        tampered.instruction = create_wallet(101);
        assert!(!tampered.verify());
    }

    #[test]
    fn test_transaction_round_trip_preserves_digest() {
        let to = signer(2).public_key();
        let tx = Transaction::sign(&signer(1), transfer(7, &to, 30));
        let decoded = Transaction::decode(tx.encode()).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.digest(), tx.digest());
    }

    #[test]
    fn test_digest_ignores_signature_but_not_seed() {
        let to = signer(2).public_key();
        let a = Transaction::sign(&signer(1), transfer(7, &to, 30));
        let b = Transaction::sign(&signer(1), transfer(8, &to, 30));
        assert_ne!(a.digest(), b.digest());

        let mut resigned = a.clone();
        resigned.signature = b.signature.clone();
        assert_eq!(resigned.digest(), a.digest());
    }

    #[test]
    fn test_unknown_instruction_tag_rejected() {
        let bytes = [9u8, 0, 0, 0, 0, 0, 0, 0, 1];
        assert!(matches!(
            Instruction::decode(bytes.as_slice()),
            Err(Error::InvalidEnum(9))
        ));
    }

    #[test]
    fn test_error_codes_are_stable() {
        let codes = [
            (ErrorCode::WalletAlreadyExists, 0, "WALLET_ALREADY_EXISTS"),
            (ErrorCode::UnknownReceiver, 1, "UNKNOWN_RECEIVER"),
            (ErrorCode::UnknownSender, 2, "UNKNOWN_SENDER"),
            (ErrorCode::InsufficientFunds, 3, "INSUFFICIENT_FUNDS"),
            (ErrorCode::SameSenderAndReceiver, 4, "SAME_SENDER_AND_RECEIVER"),
            (ErrorCode::BalanceOverflow, 5, "BALANCE_OVERFLOW"),
        ];
        for (code, value, name) in codes {
            assert_eq!(code.code(), value);
            assert_eq!(code.to_string(), name);
            assert_eq!(ErrorCode::try_from(value).unwrap(), code);
        }
        assert!(ErrorCode::try_from(6).is_err());
    }

    #[test]
    fn test_keys_are_scoped_by_instance() {
        let owner = signer(1).public_key();
        let a = Key::wallet("cryptocurrency", &owner);
        let b = Key::wallet("cryptocurrency-2", &owner);
        assert_ne!(a, b);
        assert_ne!(a.encode(), b.encode());

        let decoded = Key::decode(a.encode()).unwrap();
        assert_eq!(decoded, a);
    }

    #[test]
    fn test_key_rejects_oversized_instance_name() {
        let owner = signer(1).public_key();
        let key = Key::wallet(&"x".repeat(MAX_INSTANCE_NAME_LENGTH + 1), &owner);
        assert!(matches!(
            Key::decode(key.encode()),
            Err(Error::Invalid("Key", _))
        ));
    }

    #[test]
    fn test_failed_outcome_event_round_trip() {
        let author = signer(1).public_key();
        let event = Event::TransactionFailed {
            author,
            digest: Sha256::hash(b"tx"),
            code: ErrorCode::InsufficientFunds,
        };
        let output = Output::Event(event);
        assert_eq!(Output::decode(output.encode()).unwrap(), output);
    }
}
