use std::str::FromStr;

use ecash::nuts::{Proofs, ProofsMethods, Token};
use ecash::Amount;
use tracing::instrument;

use crate::{Error, Wallet};

impl Wallet {
    /// Exchange received proofs for fresh ones only this wallet knows the secrets of
    ///
    /// Proofs carrying a DLEQ are verified against the issuing keyset first when DLEQ
    /// verification is on.
    #[instrument(skip_all)]
    pub async fn redeem(&self, proofs: Proofs) -> Result<Proofs, Error> {
        if self.settings.verify_dleq {
            self.verify_proofs_dleq(&proofs).await?;
        }

        let total = proofs.total_amount()?;
        let (_, redeemed) = self.split(proofs, total).await?;

        tracing::debug!("Redeemed {} proofs worth {}", redeemed.len(), total);

        Ok(redeemed)
    }

    /// Receive an encoded token from this wallet's mint, returns the value received
    #[instrument(skip_all)]
    pub async fn receive(&self, encoded_token: &str) -> Result<Amount, Error> {
        let token = Token::from_str(encoded_token)?;

        if let Some(mint_url) = token.mint_urls().into_iter().find(|m| *m != self.mint_url) {
            return Err(Error::IncorrectMint(mint_url.to_string()));
        }

        let redeemed = self.redeem(token.proofs()).await?;

        Ok(redeemed.total_amount()?)
    }

    async fn verify_proofs_dleq(&self, proofs: &Proofs) -> Result<(), Error> {
        for proof in proofs.iter().filter(|p| p.dleq.is_some()) {
            let keyset = self.keysets.fetch_keys_of(proof.keyset_id).await?;
            let mint_pubkey = keyset
                .keys
                .amount_key(proof.amount)
                .ok_or(Error::CouldNotVerifyDleq)?;

            if !self.scheme.verify(proof, &mint_pubkey) {
                tracing::warn!("Proof for {} carries an invalid DLEQ", proof.amount);
                return Err(Error::CouldNotVerifyDleq);
            }
        }

        Ok(())
    }
}
