//! Wire types shared by the wallet ledger service and its clients.
//!
//! Everything that crosses a replica boundary (transaction payloads, storage
//! keys and values, execution outputs) is encoded with `commonware-codec`, so
//! every replica sees identical bytes.

pub mod execution;
pub mod wallet;

#[cfg(test)]
mod compat;

pub use execution::{
    transaction_namespace, ErrorCode, Event, Index, Instruction, Key, Output, Transaction, Value,
    MAX_INSTANCE_NAME_LENGTH, NAMESPACE,
};
pub use wallet::{CreateWallet, HistoryRecord, InvalidArgument, Transfer, Wallet};
