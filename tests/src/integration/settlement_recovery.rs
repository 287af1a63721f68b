//! # Settlement Recovery
//!
//! Settlement is one item per call and batch deposits are one item per
//! call, so both must be resumable from ledger state alone.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{Market, STARTING_BALANCE};
    use es_02_asset_codec::AssetPayload;
    use es_03_escrow::{
        AddAssetItem, EscrowApi, EscrowError, Ledger, LedgerError, TradeStatus,
    };
    use shared_types::{Address, Scope};

    // =============================================================================
    // INTERRUPTED SETTLEMENT
    // =============================================================================

    #[tokio::test]
    async fn test_settlement_resumes_after_ledger_failure() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let bidder = market.party();
        let (trade, offer) = market.trade_with_offer(owner, bidder).await.unwrap();
        for amount in [100, 200] {
            market
                .escrow_native(Scope::Trade, trade.address, owner, amount)
                .await
                .unwrap();
        }
        market
            .escrow_native(Scope::Offer, offer.address, bidder, 900)
            .await
            .unwrap();
        market
            .service
            .accept_offer(trade.address, offer.address, owner)
            .await
            .unwrap();

        let pending = market.service.pending_settlements(trade.address).await.unwrap();
        assert_eq!(pending.len(), 3);
        market.service.settle(pending[0]).await.unwrap();

        market
            .ledger
            .fail_next_commit(LedgerError::Unavailable("node restarting".into()));
        assert!(matches!(
            market.service.settle_remaining(trade.address).await,
            Err(EscrowError::Ledger(LedgerError::Unavailable(_)))
        ));
        assert_eq!(
            market.service.trade_status(trade.address).await.unwrap(),
            TradeStatus::Settling
        );

        let pending = market.service.pending_settlements(trade.address).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].global_index, 1);
        assert_eq!(pending[1].scope, Scope::Offer);

        let report = market.service.settle_remaining(trade.address).await.unwrap();
        assert_eq!(report.settled.len(), 2);
        assert_eq!(report.status, TradeStatus::Settled);
        assert!(market
            .service
            .pending_settlements(trade.address)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            market.ledger.native_balance(&bidder).await.unwrap(),
            STARTING_BALANCE - 900 + 300
        );
    }

    /// A settler working from a stale pending list loses cleanly.
    #[tokio::test]
    async fn test_stale_pending_list_reports_already_settled() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let bidder = market.party();
        let (trade, offer) = market.trade_with_offer(owner, bidder).await.unwrap();
        market
            .escrow_native(Scope::Offer, offer.address, bidder, 5)
            .await
            .unwrap();
        market
            .service
            .accept_offer(trade.address, offer.address, owner)
            .await
            .unwrap();

        let stale = market.service.pending_settlements(trade.address).await.unwrap();
        let fresh = market.service.pending_settlements(trade.address).await.unwrap();
        market.service.settle(fresh[0]).await.unwrap();
        assert!(matches!(
            market.service.settle(stale[0]).await,
            Err(EscrowError::AlreadySettled(_))
        ));

        let report = market.service.settle_remaining(trade.address).await.unwrap();
        assert!(report.settled.is_empty());
        assert_eq!(report.status, TradeStatus::Settled);
    }

    #[tokio::test]
    async fn test_pending_requires_acceptance() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let (trade, _) = market.trade_with_offer(owner, market.party()).await.unwrap();
        assert!(matches!(
            market.service.pending_settlements(trade.address).await,
            Err(EscrowError::OutOfSequence(_))
        ));
    }

    // =============================================================================
    // BATCH DEPOSITS
    // =============================================================================

    #[tokio::test]
    async fn test_batch_resumes_from_counters() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let (trade, _) = market.trade_with_offer(owner, market.party()).await.unwrap();
        let mint = Address::new_unique();
        let account = market.token_account(mint, owner);

        let plan = market
            .service
            .plan_assets(
                Scope::Trade,
                trade.address,
                vec![
                    AssetPayload::Native { amount: 10 },
                    AssetPayload::Token {
                        mint,
                        token_account: account,
                    },
                    AssetPayload::Native { amount: 30 },
                ],
            )
            .await
            .unwrap();

        // Client stops after the first two.
        for item in &plan.items[..2] {
            let request = AddAssetItem::new(Scope::Trade, trade.address, owner, &item.payload)
                .unwrap()
                .with_expected_slot(item.slot);
            market.service.add_asset_item(request).await.unwrap();
        }

        let counters = market
            .service
            .trade(trade.address)
            .await
            .unwrap()
            .unwrap()
            .assets;
        let remaining = plan.remaining(&counters);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].slot.global_index, 2);
        assert_eq!(remaining[0].slot.type_index, 1);

        // Replaying an item that already landed is caught by its slot.
        let replay = AddAssetItem::new(Scope::Trade, trade.address, owner, &plan.items[0].payload)
            .unwrap()
            .with_expected_slot(plan.items[0].slot);
        assert!(matches!(
            market.service.add_asset_item(replay).await,
            Err(EscrowError::AddressMismatch { what: "asset slot", .. })
        ));

        let request = AddAssetItem::new(Scope::Trade, trade.address, owner, &remaining[0].payload)
            .unwrap()
            .with_expected_slot(remaining[0].slot);
        let receipt = market.service.add_asset_item(request).await.unwrap();
        assert_eq!(receipt.address, remaining[0].address);

        let trade_record = market.service.trade(trade.address).await.unwrap().unwrap();
        assert_eq!(trade_record.assets, plan.end());
    }

    #[tokio::test]
    async fn test_underfunded_deposit_changes_nothing() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let (trade, _) = market.trade_with_offer(owner, market.party()).await.unwrap();

        assert!(matches!(
            market
                .escrow_native(Scope::Trade, trade.address, owner, STARTING_BALANCE + 1)
                .await,
            Err(EscrowError::Ledger(LedgerError::InsufficientFunds { .. }))
        ));
        let record = market.service.trade(trade.address).await.unwrap().unwrap();
        assert_eq!(record.assets.asset_count, 0);
        assert_eq!(market.ledger.native_balance(&owner).await.unwrap(), STARTING_BALANCE);
    }
}
