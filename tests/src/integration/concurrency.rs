//! # Concurrency
//!
//! Racing actors on a multi-threaded runtime. Counters must stay gapless,
//! the acceptance latch must hold, and every item must settle exactly once.

#[cfg(test)]
mod tests {
    use super::super::fixtures::Market;
    use es_03_escrow::{EscrowApi, EscrowConfig, EscrowError, Ledger, TradeStatus};
    use shared_types::{Address, Scope};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    async fn contended_market() -> Market {
        let mut config = EscrowConfig::with_program_id(Address::new([7u8; 32]));
        config.max_conflict_retries = 64;
        Market::open_with(config).await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_trades_get_distinct_indices() {
        let market = contended_market().await;
        let mut handles = Vec::new();
        for _ in 0..16 {
            let service = Arc::clone(&market.service);
            let creator = market.party();
            handles.push(tokio::spawn(async move {
                service.create_trade(creator, vec![]).await
            }));
        }

        let mut indices = BTreeSet::new();
        for handle in handles {
            indices.insert(handle.await.unwrap().unwrap().index);
        }
        assert_eq!(indices, (0..16).collect::<BTreeSet<u32>>());
        let authority = market.service.authority().await.unwrap().unwrap();
        assert_eq!(authority.trade_count, 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_offers_get_distinct_indices() {
        let market = contended_market().await;
        let owner = market.party();
        let trade = market.service.create_trade(owner, vec![]).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..12 {
            let service = Arc::clone(&market.service);
            let proposer = market.party();
            handles.push(tokio::spawn(async move {
                service.create_offer(trade.address, proposer).await
            }));
        }

        let mut addresses = BTreeSet::new();
        for handle in handles {
            let created = handle.await.unwrap().unwrap();
            assert_eq!(
                created.address,
                market
                    .service
                    .deriver()
                    .offer(&trade.address, created.index)
                    .unwrap()
                    .address
            );
            addresses.insert(created.address);
        }
        assert_eq!(addresses.len(), 12);
        let stored = market.service.trade(trade.address).await.unwrap().unwrap();
        assert_eq!(stored.offer_count, 12);
    }

    /// Offers racing acceptance either land before the latch or are refused.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_offers_racing_acceptance() {
        let market = contended_market().await;
        let owner = market.party();
        let (trade, first) = market.trade_with_offer(owner, market.party()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&market.service);
            let proposer = market.party();
            handles.push(tokio::spawn(async move {
                service.create_offer(trade.address, proposer).await
            }));
        }
        market
            .service
            .accept_offer(trade.address, first.address, owner)
            .await
            .unwrap();

        let mut landed = 1;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => landed += 1,
                Err(EscrowError::OutOfSequence(_)) => {}
                Err(other) => panic!("unexpected: {other:?}"),
            }
        }
        let stored = market.service.trade(trade.address).await.unwrap().unwrap();
        assert_eq!(stored.offer_count, landed);
        assert_eq!(stored.accepted_offer, Some(first.address));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_settlers_settle_each_item_once() {
        let market = contended_market().await;
        let owner = market.party();
        let bidder = market.party();
        let (trade, offer) = market.trade_with_offer(owner, bidder).await.unwrap();
        for amount in [1, 2, 3] {
            market
                .escrow_native(Scope::Trade, trade.address, owner, amount)
                .await
                .unwrap();
        }
        for amount in [10, 20] {
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
        let total_before = market.ledger.total_native();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let service = Arc::clone(&market.service);
            handles.push(tokio::spawn(async move {
                service.settle_remaining(trade.address).await
            }));
        }

        let mut settled = 0;
        for handle in handles {
            settled += handle.await.unwrap().unwrap().settled.len();
        }
        assert_eq!(settled, 5);
        assert_eq!(
            market.service.trade_status(trade.address).await.unwrap(),
            TradeStatus::Settled
        );
        assert_eq!(market.ledger.total_native(), total_before);
        assert_eq!(market.ledger.native_balance(&trade.address).await.unwrap(), 0);
        assert_eq!(market.ledger.native_balance(&offer.address).await.unwrap(), 0);
    }
}
