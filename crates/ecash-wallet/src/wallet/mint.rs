use ecash::dhke::construct_proofs;
use ecash::nuts::{BlindSignature, MintQuoteRequest, MintRequest, PreMintSecrets, Proofs};
use ecash::Amount;
use tracing::instrument;

use crate::types::{Invoice, InvoiceDirection, ProofInfo, ProofStatus};
use crate::{Error, Wallet};

impl Wallet {
    /// Request a payment request for `amount` from the mint
    ///
    /// The returned invoice is stored as pending incoming until [`Wallet::mint`] settles it.
    #[instrument(skip(self))]
    pub async fn request_mint(&self, amount: Amount) -> Result<Invoice, Error> {
        if amount == Amount::ZERO {
            return Err(Error::InvalidAmount);
        }

        let quote = self
            .client
            .post_mint_quote(MintQuoteRequest { amount })
            .await?;

        let invoice = Invoice {
            id: quote.id,
            payment_hash: quote.payment_hash,
            payment_request: quote.payment_request,
            amount,
            direction: InvoiceDirection::Incoming,
            settled: false,
            preimage: None,
        };

        self.localstore.add_invoice(invoice.clone()).await?;

        tracing::debug!("Requested mint of {} with quote {}", amount, invoice.id);

        Ok(invoice)
    }

    /// Mint proofs for a paid invoice
    ///
    /// Outputs follow `split` when given, in the caller's order, otherwise the canonical
    /// decomposition of `amount`. The new proofs are tagged with `invoice_id`. Once they are
    /// stored the call succeeds, even if marking the invoice settled fails.
    #[instrument(skip(self, split))]
    pub async fn mint(
        &self,
        amount: Amount,
        split: Option<&[Amount]>,
        invoice_id: &str,
    ) -> Result<Proofs, Error> {
        if amount == Amount::ZERO {
            return Err(Error::InvalidAmount);
        }

        let mut invoice = self
            .localstore
            .get_invoice(invoice_id)
            .await?
            .ok_or(Error::QuoteUnknown)?;

        let keyset = self.keysets.current_keyset().await?;
        let amounts = self.codec().await?.plan(amount, split)?;

        let _guard = self.begin_operation(&[])?;

        let premint_secrets = PreMintSecrets::from_amounts(keyset.id, &amounts, &*self.scheme)?;

        let mint_response = self
            .client
            .post_mint(MintRequest {
                id: invoice_id.to_string(),
                outputs: premint_secrets.blinded_messages(),
            })
            .await?;

        check_signatures(&mint_response.signatures, &premint_secrets.amounts())?;

        let proofs = construct_proofs(
            &*self.scheme,
            mint_response.signatures,
            premint_secrets.rs(),
            premint_secrets.secrets(),
            &keyset.keys,
            self.settings.verify_dleq,
        )?;

        let proof_infos = ProofInfo::from_proofs(
            &proofs,
            ProofStatus::Unspent,
            Some(invoice_id.to_string()),
        )?;
        self.localstore
            .update_proofs(proof_infos, Vec::new(), None)
            .await?;

        // proofs are stored, settling the invoice is best effort
        invoice.settled = true;
        if let Err(err) = self.localstore.add_invoice(invoice).await {
            tracing::warn!("Minted for {} but could not settle its invoice: {}", invoice_id, err);
        }

        tracing::debug!("Minted {} proofs for {}", proofs.len(), amount);

        Ok(proofs)
    }
}

/// The mint must sign every output, in order, for its amount
pub(crate) fn check_signatures(
    signatures: &[BlindSignature],
    expected: &[Amount],
) -> Result<(), Error> {
    if signatures.len() != expected.len() {
        return Err(Error::MalformedResponse(format!(
            "expected {} signatures, got {}",
            expected.len(),
            signatures.len()
        )));
    }

    if let Some((signature, amount)) = signatures
        .iter()
        .zip(expected)
        .find(|(signature, amount)| signature.amount != **amount)
    {
        return Err(Error::MalformedResponse(format!(
            "signature for {} where {} was requested",
            signature.amount, amount
        )));
    }

    Ok(())
}
