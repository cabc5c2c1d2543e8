#![cfg(test)]
use crate::execution::{ErrorCode, Event, Instruction, Key, Value};
use crate::wallet::{CreateWallet, Transfer, Wallet};
use commonware_codec::Encode;
use commonware_cryptography::{ed25519::PrivateKey, Hasher, Sha256, Signer};

#[test]
fn create_wallet_encoding_is_stable() {
    let instruction = Instruction::CreateWallet(CreateWallet::new(100).unwrap());
    assert_eq!(
        instruction.encode().as_ref(),
        &[0u8, 0, 0, 0, 0, 0, 0, 0, 100]
    );
}

#[test]
fn transfer_encoding_is_stable() {
    let to = PrivateKey::from_seed(2).public_key();
    let instruction = Instruction::Transfer(Transfer::new(7, to.clone(), 30).unwrap());

    let mut expected = vec![1u8, 0, 0, 0, 0, 0, 0, 0, 7];
    expected.extend_from_slice(to.as_ref());
    expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 30]);
    assert_eq!(instruction.encode().as_ref(), expected.as_slice());
}

#[test]
fn wallet_key_encoding_is_stable() {
    let owner = PrivateKey::from_seed(1).public_key();
    let key = Key::wallet("cc", &owner);

    let mut expected = vec![0u8, 0, 0, 2, b'c', b'c', 0];
    expected.extend_from_slice(owner.as_ref());
    assert_eq!(key.encode().as_ref(), expected.as_slice());
}

#[test]
fn value_encoding_is_stable() {
    assert_eq!(
        Value::Wallet(Wallet::new(70)).encode().as_ref(),
        &[0u8, 0, 0, 0, 0, 0, 0, 0, 70]
    );
    assert_eq!(
        Value::HistoryLength(2).encode().as_ref(),
        &[1u8, 0, 0, 0, 0, 0, 0, 0, 2]
    );
}

#[test]
fn failure_event_carries_error_code_byte() {
    let author = PrivateKey::from_seed(1).public_key();
    let digest = Sha256::hash(b"tx");
    let encoded = Event::TransactionFailed {
        author,
        digest,
        code: ErrorCode::SameSenderAndReceiver,
    }
    .encode();
    assert_eq!(encoded.last(), Some(&4u8));
}
