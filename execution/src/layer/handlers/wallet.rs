use super::super::*;
use super::rejected;
use wallet_types::{CreateWallet, Transfer, Wallet};

impl<'a, S: State> Layer<'a, S> {
    // === Wallet Handlers ===

    pub(in crate::layer) async fn handle_create_wallet(
        &mut self,
        public: &PublicKey,
        body: &CreateWallet,
    ) -> Result<Outcome> {
        let schema = self.schema();
        if schema.contains_wallet(&*self, public).await? {
            return rejected(ErrorCode::WalletAlreadyExists);
        }

        let wallet = Wallet::new(body.initial_balance());
        schema.put_wallet(self, public, wallet).await?;

        Ok(Ok(vec![Event::WalletCreated {
            owner: public.clone(),
            balance: wallet.balance,
        }]))
    }

    pub(in crate::layer) async fn handle_transfer(
        &mut self,
        public: &PublicKey,
        digest: &Digest,
        body: &Transfer,
    ) -> Result<Outcome> {
        let to = body.to();
        if public == to {
            return rejected(ErrorCode::SameSenderAndReceiver);
        }

        let schema = self.schema();
        let Some(sender) = schema.wallet(&*self, public).await? else {
            return rejected(ErrorCode::UnknownSender);
        };
        let Some(receiver) = schema.wallet(&*self, to).await? else {
            return rejected(ErrorCode::UnknownReceiver);
        };

        let amount = body.amount();
        let Some(sender_balance) = sender.balance.checked_sub(amount) else {
            return rejected(ErrorCode::InsufficientFunds);
        };
        let Some(receiver_balance) = receiver.balance.checked_add(amount) else {
            return rejected(ErrorCode::BalanceOverflow);
        };

        schema
            .put_wallet(self, public, Wallet::new(sender_balance))
            .await?;
        schema
            .put_wallet(self, to, Wallet::new(receiver_balance))
            .await?;

        // Both parties see the transfer in their history
        schema.append_history(self, public, *digest).await?;
        schema.append_history(self, to, *digest).await?;

        Ok(Ok(vec![Event::Transferred {
            from: public.clone(),
            to: to.clone(),
            amount,
            seed: body.seed(),
        }]))
    }
}
