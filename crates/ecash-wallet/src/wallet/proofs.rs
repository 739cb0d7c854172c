use std::collections::HashMap;

use ecash::nuts::{CheckStateRequest, ProofState, Proofs, ProofsMethods};
use ecash::Amount;
use tracing::instrument;

use crate::types::{Invoice, ProofInfo, ProofStatus};
use crate::{Error, Wallet};

impl Wallet {
    /// Held proofs, reserved ones included, smallest first
    #[instrument(skip(self))]
    pub async fn get_proofs(&self) -> Result<Proofs, Error> {
        self.proofs_in(vec![ProofStatus::Unspent, ProofStatus::Reserved]).await
    }

    /// Unspent proofs free for selection, smallest first
    #[instrument(skip(self))]
    pub async fn get_unspent_proofs(&self) -> Result<Proofs, Error> {
        self.proofs_in(vec![ProofStatus::Unspent]).await
    }

    /// Reserved proofs, smallest first
    #[instrument(skip(self))]
    pub async fn get_reserved_proofs(&self) -> Result<Proofs, Error> {
        self.proofs_in(vec![ProofStatus::Reserved]).await
    }

    async fn proofs_in(&self, states: Vec<ProofStatus>) -> Result<Proofs, Error> {
        let mut proofs: Proofs = self
            .localstore
            .get_proofs(Some(states))
            .await?
            .into_iter()
            .map(|info| info.proof)
            .collect();

        proofs.sort_by_key(|p| p.amount);

        Ok(proofs)
    }

    /// Total value of held proofs
    pub async fn balance(&self) -> Result<Amount, Error> {
        Ok(self.get_proofs().await?.total_amount()?)
    }

    /// Value available for new operations, reserved proofs excluded
    pub async fn available_balance(&self) -> Result<Amount, Error> {
        Ok(self.get_unspent_proofs().await?.total_amount()?)
    }

    /// Value earmarked for outgoing sends
    pub async fn reserved_balance(&self) -> Result<Amount, Error> {
        Ok(self.get_reserved_proofs().await?.total_amount()?)
    }

    /// Release reserved proofs back to unspent
    #[instrument(skip_all)]
    pub async fn unreserve(&self, proofs: &Proofs) -> Result<(), Error> {
        let ys = proofs.ys()?;

        self.localstore.unreserve_proofs(ys).await?;

        tracing::debug!("Released {} reserved proofs", proofs.len());

        Ok(())
    }

    /// Check the mint's view of `proofs`, in the order given
    #[instrument(skip_all)]
    pub async fn check_proof_state(&self, proofs: &Proofs) -> Result<Vec<ProofState>, Error> {
        let ys = proofs.ys()?;

        let response = self
            .client
            .post_check_state(CheckStateRequest { ys: ys.clone() })
            .await?;

        let mut states: HashMap<_, _> = response
            .states
            .into_iter()
            .map(|state| (state.y, state))
            .collect();

        ys.iter()
            .map(|y| {
                states
                    .remove(y)
                    .ok_or_else(|| Error::MalformedResponse(format!("no state for proof {y}")))
            })
            .collect()
    }

    /// Mark proofs spent
    ///
    /// With `check_spendable` only the proofs the mint reports spent are removed. Without it
    /// every given proof is removed, whatever the mint thinks of it. Returns the removed proofs.
    #[instrument(skip(self, proofs))]
    pub async fn invalidate(&self, proofs: Proofs, check_spendable: bool) -> Result<Proofs, Error> {
        let invalidated: Proofs = if check_spendable {
            let states = self.check_proof_state(&proofs).await?;

            proofs
                .into_iter()
                .zip(states)
                .filter(|(_, state)| state.spent())
                .map(|(proof, _)| proof)
                .collect()
        } else {
            proofs
        };

        self.localstore.mark_spent(invalidated.ys()?, None).await?;

        tracing::debug!("Invalidated {} proofs", invalidated.len());

        Ok(invalidated)
    }

    /// Archived proofs consumed by split or melt
    pub async fn spent_proofs(&self) -> Result<Vec<ProofInfo>, Error> {
        Ok(self.localstore.get_spent_proofs().await?)
    }

    /// Invoice ledger
    pub async fn invoices(&self) -> Result<Vec<Invoice>, Error> {
        Ok(self.localstore.get_invoices().await?)
    }
}
