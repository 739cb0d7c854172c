use ecash::dhke::construct_proofs;
use ecash::nuts::{PreMintSecrets, PreSplit, Proofs, ProofsMethods, SplitRequest};
use ecash::Amount;
use tracing::instrument;

use super::mint::check_signatures;
use super::PROOFS_PENDING;
use crate::types::{ProofInfo, ProofStatus};
use crate::{Error, Wallet};

impl Wallet {
    /// Split proofs into a set worth `amount` and a set with the rest
    ///
    /// The mint invalidates the inputs and signs both output sets in one exchange. Local state
    /// only changes once the complete answer has been checked. Returns `(keep, send)`.
    #[instrument(skip(self, proofs))]
    pub async fn split(&self, proofs: Proofs, amount: Amount) -> Result<(Proofs, Proofs), Error> {
        self.split_with_send_state(proofs, amount, ProofStatus::Unspent)
            .await
    }

    /// [`Wallet::split`] storing the send side as `send_state`
    ///
    /// The inputs are archived and both output sets stored in one store call.
    pub(crate) async fn split_with_send_state(
        &self,
        proofs: Proofs,
        amount: Amount,
        send_state: ProofStatus,
    ) -> Result<(Proofs, Proofs), Error> {
        if amount == Amount::ZERO {
            return Err(Error::InvalidAmount);
        }

        if proofs.has_duplicates() {
            tracing::debug!("Split request contains the same proof twice");
            return Err(Error::PendingProofs(PROOFS_PENDING.to_string()));
        }

        if amount > proofs.total_amount()? {
            return Err(Error::AmountTooLarge);
        }

        let input_ys = proofs.ys()?;
        let _guard = self.begin_operation(&input_ys)?;

        let pre_split = self.create_split(proofs, amount).await?;

        let split_response = self.client.post_split(pre_split.split_request).await?;

        let mut expected = pre_split.keep.amounts();
        expected.extend(pre_split.send.amounts());
        check_signatures(&split_response.signatures, &expected)?;

        let keys = self
            .keysets
            .fetch_keys_of(pre_split.keep.keyset_id)
            .await?
            .keys;

        let mut keep_signatures = split_response.signatures;
        let send_signatures = keep_signatures.split_off(pre_split.keep.len());

        let keep = construct_proofs(
            &*self.scheme,
            keep_signatures,
            pre_split.keep.rs(),
            pre_split.keep.secrets(),
            &keys,
            self.settings.verify_dleq,
        )?;
        let send = construct_proofs(
            &*self.scheme,
            send_signatures,
            pre_split.send.rs(),
            pre_split.send.secrets(),
            &keys,
            self.settings.verify_dleq,
        )?;

        let mut added = ProofInfo::from_proofs(&keep, ProofStatus::Unspent, None)?;
        added.extend(ProofInfo::from_proofs(&send, send_state, None)?);

        self.localstore.update_proofs(added, input_ys, None).await?;

        tracing::debug!(
            "Split into keep {:?} and send {:?}",
            keep.amounts(),
            send.amounts()
        );

        Ok((keep, send))
    }

    /// Outputs for a split of `proofs` at `amount`, keep first
    #[instrument(skip(self, proofs))]
    pub async fn create_split(&self, proofs: Proofs, amount: Amount) -> Result<PreSplit, Error> {
        let keyset = self.keysets.current_keyset().await?;
        let codec = self.codec().await?;

        let total = proofs.total_amount()?;
        let rest = total.checked_sub(amount).ok_or(Error::AmountTooLarge)?;

        let keep = PreMintSecrets::random(keyset.id, rest, &codec, &*self.scheme)?;
        let send = PreMintSecrets::random(keyset.id, amount, &codec, &*self.scheme)?;

        let mut outputs = keep.blinded_messages();
        outputs.extend(send.blinded_messages());

        Ok(PreSplit {
            keep,
            send,
            split_request: SplitRequest::new(proofs, outputs),
        })
    }
}
