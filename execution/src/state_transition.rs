//! Apply a block's transactions to state.
//!
//! All of a block's changes reach the state in a single `apply` after every
//! transaction has executed, so a storage fault part-way through leaves the
//! state exactly as it was before the block.

use crate::{Layer, State};
use anyhow::Context as _;
use tracing::info;
use wallet_types::execution::{Event, Output, Transaction};

/// Result of executing a block's state transition
#[derive(Debug)]
pub struct StateTransitionResult {
    pub outputs: Vec<Output>,
    /// Transactions that changed the ledger
    pub executed: usize,
    /// Transactions rolled back with an error code
    pub failed: usize,
}

/// Execute state transition for a block
///
/// Transactions are applied in the given order against the indices of
/// `instance`. Each one either succeeds entirely or is recorded as an
/// [`Event::TransactionFailed`] with no effect on state.
pub async fn execute_state_transition<S: State>(
    state: &mut S,
    instance: &str,
    transactions: Vec<Transaction>,
) -> anyhow::Result<StateTransitionResult> {
    let total = transactions.len();

    let (outputs, changes) = {
        let mut layer = Layer::new(&*state, instance);
        let outputs = layer
            .execute(transactions)
            .await
            .context("execute transactions")?;
        (outputs, layer.commit())
    };
    state.apply(changes).await.context("apply changes")?;

    let failed = outputs
        .iter()
        .filter(|output| matches!(output, Output::Event(Event::TransactionFailed { .. })))
        .count();
    let executed = total - failed;
    info!(instance, executed, failed, "applied state transition");

    Ok(StateTransitionResult {
        outputs,
        executed,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{create_account_keypair, create_wallet_tx, transfer_tx};
    use crate::schema::Schema;
    use crate::state::Memory;
    use commonware_runtime::deterministic::Runner;
    use commonware_runtime::Runner as _;
    use wallet_types::Wallet;

    const TEST_INSTANCE: &str = "cryptocurrency";

    #[test]
    fn test_state_transition_counts_outcomes() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let (alice, alice_public) = create_account_keypair(1);
            let (bob, bob_public) = create_account_keypair(2);

            let result = execute_state_transition(
                &mut state,
                TEST_INSTANCE,
                vec![
                    create_wallet_tx(&alice, 100),
                    create_wallet_tx(&alice, 100),
                    create_wallet_tx(&bob, 0),
                    transfer_tx(&alice, 1, &bob_public, 30),
                    transfer_tx(&bob, 2, &alice_public, 31),
                ],
            )
            .await
            .unwrap();

            assert_eq!(result.executed, 3);
            assert_eq!(result.failed, 2);
            assert_eq!(result.outputs.len(), 10);

            let schema = Schema::new(TEST_INSTANCE);
            assert_eq!(
                schema.wallet(&state, &alice_public).await.unwrap(),
                Some(Wallet::new(70))
            );
            assert_eq!(
                schema.wallet(&state, &bob_public).await.unwrap(),
                Some(Wallet::new(30))
            );
        });
    }

    #[test]
    fn test_empty_block_changes_nothing() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let result = execute_state_transition(&mut state, TEST_INSTANCE, vec![])
                .await
                .unwrap();
            assert!(result.outputs.is_empty());
            assert_eq!((result.executed, result.failed), (0, 0));
            assert!(state.is_empty());
        });
    }

    #[test]
    fn test_block_with_only_failures_changes_nothing() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let (alice, _) = create_account_keypair(1);
            let (_, bob_public) = create_account_keypair(2);

            let result = execute_state_transition(
                &mut state,
                TEST_INSTANCE,
                vec![transfer_tx(&alice, 1, &bob_public, 5)],
            )
            .await
            .unwrap();
            assert_eq!(result.failed, 1);
            assert!(state.is_empty());
        });
    }
}
