use ecash::nuts::{Proofs, ProofsMethods, PublicKey, Token};
use ecash::Amount;
use tracing::instrument;

use super::selection::select_to_cover;
use super::PROOFS_PENDING;
use crate::database;
use crate::types::ProofStatus;
use crate::{Error, Wallet};

impl Wallet {
    /// Prepare proofs worth exactly `amount` to hand over
    ///
    /// Proofs from `available` are selected to cover `amount`. They are split when they
    /// overshoot or do not form the canonical denominations of `amount`. With `reserve` the send
    /// proofs are reserved in the store. Returns `(keep, send)`; `keep` is empty when no split
    /// was needed.
    ///
    /// A split first claims the selected proofs, so they must be held unspent by this wallet and
    /// a concurrent send cannot pick them. The send side is written in its final state together
    /// with the archived inputs.
    #[instrument(skip(self, available))]
    pub async fn split_to_send(
        &self,
        available: Proofs,
        amount: Amount,
        reserve: bool,
    ) -> Result<(Proofs, Proofs), Error> {
        if amount == Amount::ZERO {
            return Err(Error::InvalidAmount);
        }

        let selected = select_to_cover(available, amount)?;

        let needs_split = selected.total_amount()? > amount
            || !self.codec().await?.is_canonical(&selected.amounts());

        if !needs_split {
            if reserve {
                self.reserve_or_pending(selected.ys()?).await?;
                tracing::debug!("Reserved {} proofs worth {}", selected.len(), amount);
            }

            return Ok((Vec::new(), selected));
        }

        let input_ys = selected.ys()?;
        self.reserve_or_pending(input_ys.clone()).await?;

        let send_state = if reserve {
            ProofStatus::Reserved
        } else {
            ProofStatus::Unspent
        };

        match self
            .split_with_send_state(selected, amount, send_state)
            .await
        {
            Ok(split) => Ok(split),
            Err(err) => {
                self.localstore.unreserve_proofs(input_ys).await?;
                Err(err)
            }
        }
    }

    /// Compare-and-set reservation, a lost race reads as pending proofs
    async fn reserve_or_pending(&self, ys: Vec<PublicKey>) -> Result<(), Error> {
        self.localstore
            .reserve_proofs(ys)
            .await
            .map_err(|err| match err {
                database::Error::ProofNotUnspent(y) => {
                    tracing::debug!("Proof {} was taken by another send", y);
                    Error::PendingProofs(PROOFS_PENDING.to_string())
                }
                err => err.into(),
            })
    }

    /// Create a token worth `amount`, its proofs reserved until invalidated or released
    #[instrument(skip(self, memo))]
    pub async fn send(&self, amount: Amount, memo: Option<String>) -> Result<Token, Error> {
        let available = self.get_unspent_proofs().await?;
        let (_, send) = self.split_to_send(available, amount, true).await?;

        Ok(Token::new(self.mint_url.clone(), send, memo)?)
    }
}
