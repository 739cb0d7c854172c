use std::str::FromStr;

use ecash::dhke::construct_proofs;
use ecash::nuts::{MeltQuoteRequest, MeltRequest, PreMintSecrets, Proofs, ProofsMethods};
use ecash::{Amount, Bolt11Invoice};
use tracing::instrument;

use super::PROOFS_PENDING;
use crate::types::{Invoice, InvoiceDirection, Melted, ProofInfo, ProofStatus};
use crate::{Error, Wallet};

impl Wallet {
    /// Amount needed to pay `payment_request`: `(invoice amount + fee reserve, fee reserve)`
    #[instrument(skip(self))]
    pub async fn get_pay_amount_with_fees(
        &self,
        payment_request: &str,
    ) -> Result<(Amount, Amount), Error> {
        let quote = self
            .client
            .post_melt_quote(MeltQuoteRequest {
                payment_request: payment_request.to_string(),
            })
            .await?;

        let total = quote
            .amount
            .checked_add(quote.fee_reserve)
            .ok_or(Error::AmountTooLarge)?;

        Ok((total, quote.fee_reserve))
    }

    /// Pay a lightning invoice with `proofs`
    ///
    /// Blank outputs let the mint return the unused fee reserve as change. The consumed proofs
    /// are archived under the melt id, which also keys the outgoing invoice. The invoice's
    /// payment hash is read from the bolt11 request itself.
    #[instrument(skip(self, proofs))]
    pub async fn pay_lightning(
        &self,
        proofs: Proofs,
        payment_request: &str,
        fee_reserve: Amount,
    ) -> Result<Melted, Error> {
        if proofs.is_empty() {
            return Err(Error::InvalidAmount);
        }

        if proofs.has_duplicates() {
            return Err(Error::PendingProofs(PROOFS_PENDING.to_string()));
        }

        let bolt11 = Bolt11Invoice::from_str(payment_request)?;

        let input_total = proofs.total_amount()?;
        let input_ys = proofs.ys()?;
        let _guard = self.begin_operation(&input_ys)?;

        let keyset = self.keysets.current_keyset().await?;
        let mut blank_outputs = PreMintSecrets::blank(keyset.id, fee_reserve, &*self.scheme)?;

        let melt_id = uuid::Uuid::new_v4().to_string();

        let melt_response = self
            .client
            .post_melt(MeltRequest {
                proofs,
                payment_request: payment_request.to_string(),
                outputs: blank_outputs.blinded_messages(),
            })
            .await?;

        if !melt_response.paid {
            tracing::warn!("Mint could not pay invoice for melt {}", melt_id);
            return Err(Error::PaymentFailed);
        }

        if melt_response.change.len() > blank_outputs.len() {
            return Err(Error::MalformedResponse(format!(
                "{} change signatures for {} outputs",
                melt_response.change.len(),
                blank_outputs.len()
            )));
        }

        let change = match melt_response.change.first().map(|s| s.keyset_id) {
            Some(change_keyset_id) => {
                if melt_response
                    .change
                    .iter()
                    .any(|signature| signature.keyset_id != change_keyset_id)
                {
                    return Err(Error::MalformedResponse(
                        "change signed under more than one keyset".to_string(),
                    ));
                }

                // The mint may sign change under a keyset other than the one requested
                let change_keys = self.keysets.fetch_keys_of(change_keyset_id).await?.keys;

                let _unused = blank_outputs.split_off(melt_response.change.len());

                construct_proofs(
                    &*self.scheme,
                    melt_response.change,
                    blank_outputs.rs(),
                    blank_outputs.secrets(),
                    &change_keys,
                    self.settings.verify_dleq,
                )?
            }
            None => Vec::new(),
        };

        let change_total = change.total_amount()?;

        let change_infos = ProofInfo::from_proofs(&change, ProofStatus::Unspent, None)?;
        self.localstore
            .update_proofs(change_infos, input_ys, Some(melt_id.clone()))
            .await?;

        self.localstore
            .add_invoice(Invoice {
                id: melt_id.clone(),
                payment_hash: bolt11.payment_hash().to_string(),
                payment_request: payment_request.to_string(),
                amount: input_total
                    .checked_sub(change_total)
                    .ok_or(Error::AmountTooLarge)?,
                direction: InvoiceDirection::Outgoing,
                settled: true,
                preimage: melt_response.preimage.clone(),
            })
            .await?;

        tracing::debug!("Melt {} paid, {} returned as change", melt_id, change_total);

        Ok(Melted {
            melt_id,
            paid: true,
            preimage: melt_response.preimage,
            change,
        })
    }
}
