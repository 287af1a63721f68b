//! # Swap Flows
//!
//! Complete swaps from trade creation through the last settlement.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{Market, STARTING_BALANCE};
    use es_01_address_derivation::AddressDeriver;
    use es_03_escrow::{AssetSlot, EscrowApi, EscrowError, Ledger, SettlementKey, TradeStatus};
    use shared_types::{Address, AssetKind, Scope};

    // =============================================================================
    // FULL SWAPS
    // =============================================================================

    /// Native for native plus a token: every asset ends with the counterparty.
    #[tokio::test]
    async fn test_mixed_swap_settles_every_item() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let bidder = market.party();
        let mint = Address::new_unique();
        let nft = market.token_account(mint, owner);

        let (trade, offer) = market.trade_with_offer(owner, bidder).await.unwrap();
        market
            .escrow_native(Scope::Trade, trade.address, owner, 250_000)
            .await
            .unwrap();
        let token_receipt = market
            .escrow_token(Scope::Trade, trade.address, owner, mint, nft)
            .await
            .unwrap();
        market
            .escrow_native(Scope::Offer, offer.address, bidder, 400_000)
            .await
            .unwrap();

        // Custody sits with the parent records while open.
        assert_eq!(token_receipt.kind, AssetKind::Token);
        assert_eq!(token_receipt.slot.global_index, 1);
        assert_eq!(token_receipt.slot.type_index, 0);
        assert_eq!(
            market.ledger.token_account(&nft).await.unwrap().unwrap().owner,
            trade.address
        );
        assert_eq!(market.ledger.native_balance(&trade.address).await.unwrap(), 250_000);

        market
            .service
            .accept_offer(trade.address, offer.address, owner)
            .await
            .unwrap();
        assert_eq!(
            market.service.trade_status(trade.address).await.unwrap(),
            TradeStatus::Accepted
        );

        let report = market.service.settle_remaining(trade.address).await.unwrap();
        assert_eq!(report.settled.len(), 3);
        assert!(report.already_settled.is_empty());
        assert_eq!(report.status, TradeStatus::Settled);

        assert_eq!(
            market.ledger.native_balance(&owner).await.unwrap(),
            STARTING_BALANCE - 250_000 + 400_000
        );
        assert_eq!(
            market.ledger.native_balance(&bidder).await.unwrap(),
            STARTING_BALANCE - 400_000 + 250_000
        );
        assert_eq!(
            market.ledger.token_account(&nft).await.unwrap().unwrap().owner,
            bidder
        );
        assert_eq!(market.ledger.native_balance(&trade.address).await.unwrap(), 0);
        assert_eq!(market.ledger.native_balance(&offer.address).await.unwrap(), 0);
    }

    /// Records land exactly where a client can derive them offline.
    #[tokio::test]
    async fn test_records_at_offline_derivable_addresses() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let bidder = market.party();
        let (trade, offer) = market.trade_with_offer(owner, bidder).await.unwrap();
        let receipt = market
            .escrow_native(Scope::Offer, offer.address, bidder, 10)
            .await
            .unwrap();

        let offline = AddressDeriver::new(market.service.config().program_id);
        assert_eq!(offline.trade(0).unwrap().address, trade.address);
        assert_eq!(offline.offer(&trade.address, 0).unwrap().address, offer.address);
        assert_eq!(
            offline
                .asset_item(&offer.address, AssetKind::Native, 0)
                .unwrap()
                .address,
            receipt.address
        );
        assert_eq!(
            trade.address.to_string(),
            "BdJ6jBr1bsaLVV6omkh4akyZmUCFefAE6NRcoeyf2Dqe"
        );
        assert_eq!(
            offer.address.to_string(),
            "DfR4wi4BUgNYbVejRw7eNWu28vEydEKPZzNsDahhz3VP"
        );
    }

    /// Losing offers keep their escrow; nothing routes through them.
    #[tokio::test]
    async fn test_losing_offer_cannot_settle() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let winner = market.party();
        let loser = market.party();
        let (trade, winning) = market.trade_with_offer(owner, winner).await.unwrap();
        let losing = market.service.create_offer(trade.address, loser).await.unwrap();
        market
            .escrow_native(Scope::Offer, losing.address, loser, 5_000)
            .await
            .unwrap();
        market
            .service
            .accept_offer(trade.address, winning.address, owner)
            .await
            .unwrap();

        let key = SettlementKey {
            trade_index: trade.index,
            offer_index: losing.index,
            scope: Scope::Offer,
            kind: AssetKind::Native,
            global_index: 0,
            type_index: 0,
        };
        assert!(matches!(
            market.service.settle(key).await,
            Err(EscrowError::OfferNotAccepted(_))
        ));
        assert_eq!(market.ledger.native_balance(&losing.address).await.unwrap(), 5_000);
    }

    // =============================================================================
    // SEQUENCING
    // =============================================================================

    /// Nothing is added to either side after acceptance.
    #[tokio::test]
    async fn test_add_after_accept_is_out_of_sequence() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let bidder = market.party();
        let (trade, offer) = market.trade_with_offer(owner, bidder).await.unwrap();
        market
            .service
            .accept_offer(trade.address, offer.address, owner)
            .await
            .unwrap();

        assert!(matches!(
            market.escrow_native(Scope::Trade, trade.address, owner, 1).await,
            Err(EscrowError::OutOfSequence(_))
        ));
        assert!(matches!(
            market.escrow_native(Scope::Offer, offer.address, bidder, 1).await,
            Err(EscrowError::OutOfSequence(_))
        ));
        assert_eq!(market.ledger.native_balance(&owner).await.unwrap(), STARTING_BALANCE);
    }

    #[tokio::test]
    async fn test_second_accept_is_already_decided() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let (trade, first) = market.trade_with_offer(owner, market.party()).await.unwrap();
        let second = market
            .service
            .create_offer(trade.address, market.party())
            .await
            .unwrap();
        market
            .service
            .accept_offer(trade.address, first.address, owner)
            .await
            .unwrap();

        for offer in [first.address, second.address, Address::new_unique()] {
            match market.service.accept_offer(trade.address, offer, owner).await {
                Err(EscrowError::AlreadyDecided { accepted, .. }) => {
                    assert_eq!(accepted, first.address)
                }
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_offer_from_other_trade_rejected() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let bidder = market.party();
        let (trade_a, _) = market.trade_with_offer(owner, bidder).await.unwrap();
        let (_, offer_b) = market.trade_with_offer(owner, bidder).await.unwrap();

        assert!(matches!(
            market
                .service
                .accept_offer(trade_a.address, offer_b.address, owner)
                .await,
            Err(EscrowError::AddressMismatch { what: "offer trade", .. })
        ));
    }

    #[tokio::test]
    async fn test_double_settle_is_already_settled() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let bidder = market.party();
        let (trade, offer) = market.trade_with_offer(owner, bidder).await.unwrap();
        market
            .escrow_native(Scope::Trade, trade.address, owner, 77)
            .await
            .unwrap();
        market
            .service
            .accept_offer(trade.address, offer.address, owner)
            .await
            .unwrap();

        let key = market.service.pending_settlements(trade.address).await.unwrap()[0];
        market.service.settle(key).await.unwrap();
        assert!(matches!(
            market.service.settle(key).await,
            Err(EscrowError::AlreadySettled(_))
        ));
        assert_eq!(
            market.ledger.native_balance(&bidder).await.unwrap(),
            STARTING_BALANCE + 77
        );
    }

    /// Both sides at slot (0, 0); the offer side goes first.
    #[tokio::test]
    async fn test_offer_side_settles_first() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let bidder = market.party();
        let (trade, offer) = market.trade_with_offer(owner, bidder).await.unwrap();
        let trade_item = market
            .escrow_native(Scope::Trade, trade.address, owner, 1_000_000)
            .await
            .unwrap();
        let offer_item = market
            .escrow_native(Scope::Offer, offer.address, bidder, 500_000)
            .await
            .unwrap();
        let origin = AssetSlot {
            global_index: 0,
            type_index: 0,
        };
        assert_eq!(trade_item.slot, origin);
        assert_eq!(offer_item.slot, origin);

        market
            .service
            .accept_offer(trade.address, offer.address, owner)
            .await
            .unwrap();
        let pending = market.service.pending_settlements(trade.address).await.unwrap();
        assert_eq!(pending.len(), 2);
        let trade_key = pending.iter().copied().find(|k| k.scope == Scope::Trade).unwrap();
        let offer_key = pending.iter().copied().find(|k| k.scope == Scope::Offer).unwrap();

        let first = market.service.settle(offer_key).await.unwrap();
        assert_eq!(first.asset_item, offer_item.address);
        assert_eq!(first.recipient, owner);
        assert_eq!(
            market.service.trade_status(trade.address).await.unwrap(),
            TradeStatus::Settling
        );
        let second = market.service.settle(trade_key).await.unwrap();
        assert_eq!(second.asset_item, trade_item.address);
        assert_eq!(second.recipient, bidder);

        for key in [offer_key, trade_key] {
            assert!(matches!(
                market.service.settle(key).await,
                Err(EscrowError::AlreadySettled(_))
            ));
        }
        assert_eq!(
            market.service.trade_status(trade.address).await.unwrap(),
            TradeStatus::Settled
        );
        assert_eq!(market.ledger.native_balance(&owner).await.unwrap(), 500_000);
        assert_eq!(
            market.ledger.native_balance(&bidder).await.unwrap(),
            STARTING_BALANCE + 500_000
        );
    }

    fn orderings(items: &[usize]) -> Vec<Vec<usize>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut all = Vec::new();
        for (i, head) in items.iter().enumerate() {
            let mut rest = items.to_vec();
            rest.remove(i);
            for mut tail in orderings(&rest) {
                tail.insert(0, *head);
                all.push(tail);
            }
        }
        all
    }

    /// Two items per side; every settle order ends in the same balances.
    #[tokio::test]
    async fn test_any_settle_order_completes() {
        for order in orderings(&[0, 1, 2, 3]) {
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
            for amount in [30, 40] {
                market
                    .escrow_native(Scope::Offer, offer.address, bidder, amount)
                    .await
                    .unwrap();
            }
            market
                .service
                .accept_offer(trade.address, offer.address, owner)
                .await
                .unwrap();

            let pending = market.service.pending_settlements(trade.address).await.unwrap();
            assert_eq!(pending.len(), 4, "order {order:?}");
            for &i in &order {
                market.service.settle(pending[i]).await.unwrap();
            }
            for key in &pending {
                assert!(
                    matches!(
                        market.service.settle(*key).await,
                        Err(EscrowError::AlreadySettled(_))
                    ),
                    "order {order:?}"
                );
            }
            assert_eq!(
                market.service.trade_status(trade.address).await.unwrap(),
                TradeStatus::Settled
            );
            assert_eq!(
                market.ledger.native_balance(&owner).await.unwrap(),
                STARTING_BALANCE - 300 + 70,
                "order {order:?}"
            );
            assert_eq!(
                market.ledger.native_balance(&bidder).await.unwrap(),
                STARTING_BALANCE - 70 + 300,
                "order {order:?}"
            );
        }
    }

    /// Keys are recomputed into addresses; a key naming an empty slot finds nothing.
    #[tokio::test]
    async fn test_key_must_name_stored_item() {
        let market = Market::open().await.unwrap();
        let owner = market.party();
        let bidder = market.party();
        let (trade, offer) = market.trade_with_offer(owner, bidder).await.unwrap();
        market
            .escrow_native(Scope::Trade, trade.address, owner, 10)
            .await
            .unwrap();
        market
            .escrow_native(Scope::Offer, offer.address, bidder, 20)
            .await
            .unwrap();
        market
            .service
            .accept_offer(trade.address, offer.address, owner)
            .await
            .unwrap();

        // Trade side holds no token.
        let key = SettlementKey::from_codes(trade.index, offer.index, 1, 2, 0, 0).unwrap();
        assert!(matches!(
            market.service.settle(key).await,
            Err(EscrowError::NotFound(_))
        ));
        assert!(matches!(
            SettlementKey::from_codes(trade.index, offer.index, 9, 1, 0, 0),
            Err(EscrowError::UnknownCode { field: "from_type", code: 9 })
        ));

        let key = SettlementKey::from_codes(trade.index, offer.index, 1, 1, 0, 0).unwrap();
        let receipt = market.service.settle(key).await.unwrap();
        assert_eq!(receipt.recipient, bidder);
    }
}
