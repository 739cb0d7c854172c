//! Wallet against an in-process mint
//!
//! These tests run the wallet through complete exchanges with the fake mint: minting,
//! splitting, sending, receiving and melting, plus the mint's answers to misuse such as
//! double spends.
//!
//! Test Environment:
//! - Pure in-memory mint and wallet stores
//! - No external dependencies (Lightning nodes, databases) required

use std::str::FromStr;

use anyhow::Result;
use ecash::nuts::{Id, ProofsMethods};
use ecash::{Amount, DenominationCodec};
use ecash_integration_tests::fake_mint::FAKE_MINT_NAME;
use ecash_integration_tests::init_pure_tests::*;
use ecash_integration_tests::{amounts, total, unspent_amounts};
use ecash_wallet::database::WalletDatabase;
use ecash_wallet::types::{InvoiceDirection, ProofStatus};
use ecash_wallet::Error;

/// Splitting 64 at 20 returns the canonical sets of 44 and 20
#[tokio::test]
async fn test_split() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let proofs = fund_wallet(&wallet, 64, None).await?;
    assert_eq!(proofs.amounts(), amounts(&[64]));
    assert_eq!(wallet.balance().await?, Amount::from(64));

    let (keep, send) = wallet.split(proofs, Amount::from(20)).await?;

    assert_eq!(keep.amounts(), amounts(&[4, 8, 32]));
    assert_eq!(send.amounts(), amounts(&[4, 16]));
    assert_eq!(wallet.balance().await?, Amount::from(64));
    assert_eq!(wallet.spent_proofs().await?.len(), 1);

    Ok(())
}

/// Consecutive sends always hand out the canonical denominations of the amount
#[tokio::test]
async fn test_split_to_send_chain() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;
    let codec = DenominationCodec::new(64);

    fund_wallet(&wallet, 64, None).await?;

    for amount in [1, 2, 3] {
        let amount = Amount::from(amount);
        let available = wallet.get_unspent_proofs().await?;
        let (_keep, send) = wallet.split_to_send(available, amount, false).await?;

        let mut sent = send.amounts();
        sent.sort();
        assert_eq!(sent, codec.decompose(amount)?);
        assert_eq!(wallet.balance().await?, Amount::from(64));
    }

    Ok(())
}

#[tokio::test]
async fn test_amount_beyond_proofs() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let proofs = fund_wallet(&wallet, 64, None).await?;

    let err = wallet.split(proofs, Amount::from(65)).await.unwrap_err();
    assert!(matches!(err, Error::AmountTooLarge));
    assert_eq!(err.to_string(), "amount too large.");

    let err = wallet
        .split_to_send(wallet.get_unspent_proofs().await?, Amount::from(65), false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientBalance));
    assert_eq!(err.to_string(), "balance too low.");

    let err = wallet.split(Vec::new(), Amount::ZERO).await.unwrap_err();
    assert_eq!(err.to_string(), "amount must be positive.");

    assert_eq!(wallet.balance().await?, Amount::from(64));

    Ok(())
}

/// Selection is limited to the proofs the caller hands in
#[tokio::test]
async fn test_split_to_send_from_subset() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let eight = fund_wallet(&wallet, 8, None).await?;
    let small = fund_wallet(&wallet, 3, None).await?;

    let (keep, send) = wallet.split_to_send(eight, Amount::from(3), false).await?;
    assert_eq!(keep.amounts(), amounts(&[1, 4]));
    assert_eq!(send.amounts(), amounts(&[1, 2]));

    // the exact [1, 2] outside the subset stays where it was
    let unspent = wallet.get_unspent_proofs().await?;
    assert!(small.iter().all(|proof| unspent.contains(proof)));
    assert_eq!(wallet.balance().await?, Amount::from(11));

    Ok(())
}

/// Paying 64 with a fee reserve of 2 returns the unused reserve as change
#[tokio::test]
async fn test_pay_lightning() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet_alice = create_test_wallet_for_mint(mint.clone()).await?;
    let wallet_bob = create_test_wallet_for_mint(mint).await?;

    fund_wallet(&wallet_alice, 100, None).await?;

    let invoice = wallet_bob.request_mint(Amount::from(64)).await?;

    let (total_needed, fee_reserve) = wallet_alice
        .get_pay_amount_with_fees(&invoice.payment_request)
        .await?;
    assert_eq!(total_needed, Amount::from(66));
    assert_eq!(fee_reserve, Amount::from(2));

    let available = wallet_alice.get_unspent_proofs().await?;
    let (_keep, send) = wallet_alice
        .split_to_send(available, total_needed, true)
        .await?;
    assert_eq!(total(&send), Amount::from(66));

    let melted = wallet_alice
        .pay_lightning(send, &invoice.payment_request, fee_reserve)
        .await?;

    assert!(melted.paid);
    assert_eq!(melted.change.amounts(), amounts(&[2]));
    assert_eq!(wallet_alice.balance().await?, Amount::from(36));
    assert_eq!(wallet_alice.reserved_balance().await?, Amount::ZERO);

    let spent = wallet_alice.spent_proofs().await?;
    let melted_inputs: Vec<_> = spent
        .iter()
        .filter(|info| info.melt_id.as_deref() == Some(melted.melt_id.as_str()))
        .collect();
    assert_eq!(melted_inputs.len(), 2);

    let outgoing = wallet_alice
        .invoices()
        .await?
        .into_iter()
        .find(|i| i.direction == InvoiceDirection::Outgoing)
        .expect("outgoing invoice recorded");
    assert_eq!(outgoing.id, melted.melt_id);
    assert_eq!(outgoing.amount, Amount::from(64));
    assert_eq!(outgoing.payment_hash, invoice.payment_hash);
    assert!(outgoing.settled);

    // The payee's quote was settled by the payment
    wallet_bob
        .mint(Amount::from(64), None, &invoice.id)
        .await?;
    assert_eq!(wallet_bob.balance().await?, Amount::from(64));

    Ok(())
}

#[tokio::test]
async fn test_unknown_payment_request() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let err = wallet
        .get_pay_amount_with_fees("lnbc10n1unknown")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Mint Error: Unknown payment request");

    Ok(())
}

/// Spending the same proofs twice is rejected with the mint's own message
#[tokio::test]
async fn test_double_spend() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let proofs = fund_wallet(&wallet, 64, None).await?;

    wallet.split(proofs.clone(), Amount::from(20)).await?;

    let err = wallet.split(proofs, Amount::from(20)).await.unwrap_err();
    assert!(matches!(err, Error::DoubleSpend(_)));
    assert_eq!(err.to_string(), "Mint Error: Token already spent.");

    assert_eq!(wallet.balance().await?, Amount::from(64));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_proofs() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let proofs = fund_wallet(&wallet, 64, Some(amounts(&[32, 32]).as_slice())).await?;
    let doubled = vec![proofs[0].clone(), proofs[0].clone()];

    let err = wallet.split(doubled, Amount::from(20)).await.unwrap_err();
    assert!(matches!(err, Error::PendingProofs(_)));
    assert_eq!(err.to_string(), "Mint Error: proofs already pending.");

    assert_eq!(wallet.balance().await?, Amount::from(64));

    Ok(())
}

/// Proofs handed over are redeemed by the receiver, then cleaned up by the sender
#[tokio::test]
async fn test_send_and_redeem() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet_alice = create_test_wallet_for_mint(mint.clone()).await?;
    let wallet_carol = create_test_wallet_for_mint(mint).await?;

    fund_wallet(&wallet_alice, 64, None).await?;

    let available = wallet_alice.get_unspent_proofs().await?;
    let (_keep, send) = wallet_alice
        .split_to_send(available, Amount::from(40), true)
        .await?;
    assert_eq!(wallet_alice.reserved_balance().await?, Amount::from(40));
    assert_eq!(wallet_alice.available_balance().await?, Amount::from(24));

    let redeemed = wallet_carol.redeem(send.clone()).await?;
    assert_eq!(total(&redeemed), Amount::from(40));
    assert_eq!(wallet_carol.balance().await?, Amount::from(40));

    let invalidated = wallet_alice.invalidate(send, true).await?;
    assert_eq!(total(&invalidated), Amount::from(40));
    assert_eq!(wallet_alice.balance().await?, Amount::from(24));
    assert_eq!(wallet_alice.reserved_balance().await?, Amount::ZERO);

    Ok(())
}

#[tokio::test]
async fn test_invalidate() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let proofs = fund_wallet(&wallet, 64, Some(amounts(&[32, 32]).as_slice())).await?;

    // Without the check, the proof goes even though the mint still accepts it
    let removed = wallet.invalidate(vec![proofs[0].clone()], false).await?;
    assert_eq!(removed.len(), 1);
    assert_eq!(wallet.balance().await?, Amount::from(32));

    let states = wallet.check_proof_state(&vec![proofs[0].clone()]).await?;
    assert!(states[0].spendable());

    // With the check, an unspent proof stays
    let removed = wallet.invalidate(vec![proofs[1].clone()], true).await?;
    assert!(removed.is_empty());
    assert_eq!(wallet.balance().await?, Amount::from(32));

    Ok(())
}

#[tokio::test]
async fn test_check_proof_state() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let proofs = fund_wallet(&wallet, 7, None).await?;

    let states = wallet.check_proof_state(&proofs).await?;
    assert_eq!(states.len(), 3);
    assert!(states.iter().all(|state| state.spendable()));
    assert_eq!(states[0].y, proofs[0].y()?);

    wallet.split(proofs.clone(), Amount::from(3)).await?;

    let states = wallet.check_proof_state(&proofs).await?;
    assert!(states.iter().all(|state| state.spent()));

    Ok(())
}

#[tokio::test]
async fn test_keysets() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let current = wallet.keysets().current_keyset().await?;
    assert_eq!(current.keys.len(), 64);
    assert_eq!(wallet.codec().await?.max_order(), 64);

    let ids = wallet.fetch_keyset_ids().await?;
    assert_eq!(ids.len(), 2);
    assert_eq!(ids.last(), Some(&current.id));

    // open cached the legacy keyset too
    let legacy = wallet.fetch_keys_of(ids[0]).await?;
    assert!(legacy.verify_id());
    assert_ne!(legacy.id, current.id);

    let err = wallet
        .fetch_keys_of(Id::from_str("AAAAAAAAAAAA")?)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::KeysetNotFound));

    Ok(())
}

#[tokio::test]
async fn test_mint_with_split() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let split = amounts(&[1, 1, 1, 2, 2, 4, 16]);
    let proofs = fund_wallet(&wallet, 27, Some(split.as_slice())).await?;

    assert_eq!(proofs.amounts(), split);
    assert_eq!(wallet.balance().await?, Amount::from(27));

    Ok(())
}

#[tokio::test]
async fn test_mint_with_invalid_split() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let invoice = wallet.request_mint(Amount::from(27)).await?;

    let err = wallet
        .mint(Amount::from(27), Some(amounts(&[1, 2]).as_slice()), &invoice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DenominationMismatch));
    assert_eq!(err.to_string(), "split must sum to amount");

    let err = wallet
        .mint(Amount::from(27), Some(amounts(&[27]).as_slice()), &invoice.id)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Can only mint amounts with 2^n up to 18446744073709551616."
    );

    // Nothing reached the mint, the quote can still be minted
    wallet.mint(Amount::from(27), None, &invoice.id).await?;
    assert_eq!(unspent_amounts(&wallet).await, amounts(&[1, 2, 8, 16]));

    Ok(())
}

#[tokio::test]
async fn test_mint_quote_only_once() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let invoice = wallet.request_mint(Amount::from(16)).await?;
    wallet.mint(Amount::from(16), None, &invoice.id).await?;

    let err = wallet
        .mint(Amount::from(16), None, &invoice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Mint(_)));
    assert_eq!(wallet.balance().await?, Amount::from(16));

    let err = wallet
        .mint(Amount::from(16), None, "not-a-quote")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::QuoteUnknown));

    Ok(())
}

#[tokio::test]
async fn test_minted_proofs_are_tagged() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let invoice = wallet.request_mint(Amount::from(5)).await?;
    assert!(!invoice.settled);
    assert_eq!(invoice.direction, InvoiceDirection::Incoming);

    wallet.mint(Amount::from(5), None, &invoice.id).await?;

    let infos = wallet
        .localstore
        .get_proofs(Some(vec![ProofStatus::Unspent]))
        .await?;
    assert_eq!(infos.len(), 2);
    assert!(infos
        .iter()
        .all(|info| info.mint_id.as_deref() == Some(invoice.id.as_str())));

    let stored = wallet.invoices().await?;
    assert_eq!(stored.len(), 1);
    assert!(stored[0].settled);

    Ok(())
}

#[tokio::test]
async fn test_mint_info() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    let info = wallet.get_info().await?;
    assert_eq!(info.name.as_deref(), Some(FAKE_MINT_NAME));

    wallet.close()?;

    Ok(())
}

/// A token is sent, received once, and refused the second time
#[tokio::test]
async fn test_token_send_receive() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet_alice = create_test_wallet_for_mint(mint.clone()).await?;
    let wallet_carol = create_test_wallet_for_mint(mint).await?;

    fund_wallet(&wallet_alice, 64, None).await?;

    let token = wallet_alice
        .send(Amount::from(40), Some("lunch".to_string()))
        .await?;
    let encoded = token.to_string();
    assert!(encoded.starts_with("cashuA"));
    assert_eq!(wallet_alice.reserved_balance().await?, Amount::from(40));

    let received = wallet_carol.receive(&encoded).await?;
    assert_eq!(received, Amount::from(40));
    assert_eq!(wallet_carol.balance().await?, Amount::from(40));

    let err = wallet_carol.receive(&encoded).await.unwrap_err();
    assert!(matches!(err, Error::DoubleSpend(_)));
    assert_eq!(wallet_carol.balance().await?, Amount::from(40));

    Ok(())
}

#[tokio::test]
async fn test_unreserve_after_send() -> Result<()> {
    setup_tracing();
    let mint = create_and_start_test_mint()?;
    let wallet = create_test_wallet_for_mint(mint).await?;

    fund_wallet(&wallet, 64, None).await?;

    let token = wallet.send(Amount::from(10), None).await?;
    assert_eq!(wallet.available_balance().await?, Amount::from(54));

    wallet.unreserve(&token.proofs()).await?;
    assert_eq!(wallet.available_balance().await?, Amount::from(64));
    assert_eq!(wallet.reserved_balance().await?, Amount::ZERO);

    Ok(())
}
