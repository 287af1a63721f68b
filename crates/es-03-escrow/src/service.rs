//! Escrow Service - ledger-backed lifecycle and settlement
//!
//! Every mutator is optimistic: read fresh records, compute the transition,
//! commit it conditionally on the versions read. A conflict means another
//! actor advanced a counter or latched the trade first; the operation is
//! re-read and recomputed up to `max_conflict_retries` times. Every other
//! error is returned as is.

use crate::algorithms::{
    custody_transfer, latch_offer, open_offer, open_trade, place_asset_item, plan_batch,
    resolve_settlement, settlement_key, sort_keys, trade_status, BatchPlan, SettlementContext,
};
use crate::domain::{
    invariant_offer_accepted, invariant_owner, invariant_trade_open, invariant_undecided,
    AssetCounters, AssetItem, Authority, EscrowConfig, EscrowError, EscrowResult, LedgerError,
    Offer, Record, SettlementKey, Trade, TradeStatus, Versioned,
};
use crate::ports::inbound::{
    AddAssetItem, AssetItemReceipt, Created, EscrowApi, SettlementReceipt, SettlementReport,
};
use crate::ports::outbound::{ChangeSet, Ledger};
use async_trait::async_trait;
use es_01_address_derivation::AddressDeriver;
use es_02_asset_codec::{decode, AssetPayload};
use shared_types::{Address, Scope};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

fn pick_authority(record: Record) -> Option<Authority> {
    match record {
        Record::Authority(a) => Some(a),
        _ => None,
    }
}

fn pick_trade(record: Record) -> Option<Trade> {
    match record {
        Record::Trade(t) => Some(t),
        _ => None,
    }
}

fn pick_offer(record: Record) -> Option<Offer> {
    match record {
        Record::Offer(o) => Some(o),
        _ => None,
    }
}

fn pick_asset_item(record: Record) -> Option<AssetItem> {
    match record {
        Record::AssetItem(i) => Some(i),
        _ => None,
    }
}

/// A trade or offer read as the parent of new asset items.
struct ParentState {
    record: Record,
    counters: AssetCounters,
    changes: ChangeSet,
    version: u64,
}

fn with_counters(record: Record, assets: AssetCounters) -> Record {
    match record {
        Record::Trade(trade) => Record::Trade(Trade { assets, ..trade }),
        Record::Offer(offer) => Record::Offer(Offer { assets, ..offer }),
        other => other,
    }
}

/// Escrow service over any `Ledger`.
pub struct EscrowService<L: Ledger> {
    config: EscrowConfig,
    deriver: AddressDeriver,
    ledger: Arc<L>,
}

impl<L: Ledger> EscrowService<L> {
    /// Create a service deriving under `config.program_id`.
    pub fn new(config: EscrowConfig, ledger: Arc<L>) -> Self {
        let deriver = AddressDeriver::new(config.program_id);
        Self {
            config,
            deriver,
            ledger,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    /// Address deriver bound to the program id.
    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    /// Underlying ledger.
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Plan a batch of additions under `parent` from its current counters.
    pub async fn plan_assets(
        &self,
        scope: Scope,
        parent: Address,
        payloads: Vec<AssetPayload>,
    ) -> EscrowResult<BatchPlan> {
        let counters = match scope {
            Scope::Trade => self.load_trade(&parent).await?.value.assets,
            Scope::Offer => self.load_offer(&parent).await?.value.assets,
        };
        plan_batch(&self.deriver, parent, &counters, payloads)
    }

    async fn retrying<T, F, Fut>(&self, op: &'static str, mut attempt: F) -> EscrowResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EscrowResult<T>>,
    {
        let max = self.config.max_conflict_retries.max(1);
        let mut tries = 0;
        loop {
            tries += 1;
            match attempt().await {
                Err(e) if e.is_retryable() && tries < max => {
                    debug!("[es-03] {} conflict on attempt {}/{}: {}", op, tries, max, e);
                }
                Err(e) => {
                    warn!("[es-03] {} rejected: {}", op, e);
                    return Err(e);
                }
                ok => return ok,
            }
        }
    }

    async fn load_as<T>(
        &self,
        address: &Address,
        pick: fn(Record) -> Option<T>,
    ) -> EscrowResult<Option<Versioned<T>>> {
        Ok(self
            .ledger
            .load(address)
            .await?
            .and_then(|stored| stored.try_map(pick)))
    }

    async fn load_authority(&self) -> EscrowResult<(Address, Versioned<Authority>)> {
        let address = self.deriver.authority()?.address;
        let authority = self
            .load_as(&address, pick_authority)
            .await?
            .ok_or(EscrowError::NotInitialized)?;
        Ok((address, authority))
    }

    async fn load_trade(&self, address: &Address) -> EscrowResult<Versioned<Trade>> {
        self.load_as(address, pick_trade)
            .await?
            .ok_or(EscrowError::NotFound(*address))
    }

    async fn load_offer(&self, address: &Address) -> EscrowResult<Versioned<Offer>> {
        self.load_as(address, pick_offer)
            .await?
            .ok_or(EscrowError::NotFound(*address))
    }

    async fn load_asset_item(&self, address: &Address) -> EscrowResult<Versioned<AssetItem>> {
        self.load_as(address, pick_asset_item)
            .await?
            .ok_or(EscrowError::NotFound(*address))
    }

    async fn try_create_trade(
        &self,
        creator: Address,
        allowed_users: Vec<Address>,
    ) -> EscrowResult<Created> {
        let (authority_address, authority) = self.load_authority().await?;
        let (next_authority, trade) = open_trade(
            &authority.value,
            creator,
            allowed_users,
            self.config.max_allowed_users,
        )?;
        let index = trade.index;
        let address = self.deriver.trade(index)?.address;

        self.ledger
            .commit(
                ChangeSet::new()
                    .update(authority_address, next_authority, authority.version)
                    .create(address, trade),
            )
            .await?;

        info!("[es-03] Trade {} opened at {} by {}", index, address, creator);
        Ok(Created { address, index })
    }

    async fn try_create_offer(&self, trade_address: Address, proposer: Address) -> EscrowResult<Created> {
        let trade = self.load_trade(&trade_address).await?;
        let (next_trade, offer) = open_offer(&trade_address, &trade.value, proposer)?;
        let index = offer.index;
        let address = self.deriver.offer(&trade_address, index)?.address;

        self.ledger
            .commit(
                ChangeSet::new()
                    .update(trade_address, next_trade, trade.version)
                    .create(address, offer),
            )
            .await?;

        info!(
            "[es-03] Offer {} on trade {} opened at {} by {}",
            index, trade_address, address, proposer
        );
        Ok(Created { address, index })
    }

    /// Read the parent of a new item and check it still accepts additions
    /// from `depositor`.
    async fn load_parent(&self, request: &AddAssetItem) -> EscrowResult<ParentState> {
        let parent = request.parent;
        let stored = self
            .ledger
            .load(&parent)
            .await?
            .ok_or(EscrowError::NotFound(parent))?;
        let version = stored.version;

        match (request.scope, stored.value) {
            (Scope::Trade, Record::Trade(trade)) => {
                invariant_trade_open(&parent, &trade)?;
                invariant_owner(&trade.user, &request.depositor)?;
                Ok(ParentState {
                    counters: trade.assets,
                    record: Record::Trade(trade),
                    changes: ChangeSet::new(),
                    version,
                })
            }
            (Scope::Offer, Record::Offer(offer)) => {
                let trade = self.load_trade(&offer.trade).await?;
                invariant_trade_open(&offer.trade, &trade.value)?;
                invariant_owner(&offer.user, &request.depositor)?;
                Ok(ParentState {
                    counters: offer.assets,
                    // An acceptance racing this add must invalidate it.
                    changes: ChangeSet::new().assert_version(offer.trade, trade.version),
                    record: Record::Offer(offer),
                    version,
                })
            }
            (scope, other) => Err(EscrowError::mismatch(
                "parent scope",
                scope,
                other.kind_name(),
            )),
        }
    }

    /// Check the depositor can hand over custody of a token account.
    async fn check_token_custody(
        &self,
        depositor: &Address,
        mint: &Address,
        token_account: &Address,
    ) -> EscrowResult<()> {
        let account = self
            .ledger
            .token_account(token_account)
            .await?
            .ok_or(EscrowError::NotFound(*token_account))?;
        if account.mint != *mint {
            return Err(EscrowError::mismatch("token mint", account.mint, mint));
        }
        invariant_owner(&account.owner, depositor)
    }

    async fn try_add_asset_item(
        &self,
        request: &AddAssetItem,
        payload: AssetPayload,
    ) -> EscrowResult<AssetItemReceipt> {
        let ParentState {
            record,
            counters,
            changes,
            version,
        } = self.load_parent(request).await?;

        if let AssetPayload::Token {
            mint,
            token_account,
        } = &payload
        {
            self.check_token_custody(&request.depositor, mint, token_account)
                .await?;
        }

        let (next_counters, item) = place_asset_item(
            request.scope,
            request.parent,
            &counters,
            request.depositor,
            payload,
            request.expected_slot,
        )?;
        let kind = item.kind();
        let slot = item.slot;
        let address = self
            .deriver
            .asset_item(&request.parent, kind, slot.type_index)?
            .address;

        let changes = match &item.payload {
            AssetPayload::Native { amount } => {
                changes.transfer_native(request.depositor, request.parent, *amount)
            }
            AssetPayload::Token { token_account, .. } => {
                changes.reassign_token_account(*token_account, request.depositor, request.parent)
            }
        };
        let changes = changes
            .update(request.parent, with_counters(record, next_counters), version)
            .create(address, item);
        self.ledger.commit(changes).await?;

        info!(
            "[es-03] Escrowed {} item {}:{} under {} {} at {}",
            kind, slot.global_index, slot.type_index, request.scope, request.parent, address
        );
        Ok(AssetItemReceipt {
            address,
            parent: request.parent,
            scope: request.scope,
            kind,
            slot,
        })
    }

    async fn try_accept_offer(
        &self,
        trade_address: Address,
        offer_address: Address,
        caller: Address,
    ) -> EscrowResult<()> {
        let trade = self.load_trade(&trade_address).await?;
        // Latch first, so a decided trade answers the same for any named offer.
        invariant_undecided(&trade_address, &trade.value)?;
        let offer = self.load_offer(&offer_address).await?;
        let derived = self.deriver.offer(&trade_address, offer.value.index)?.address;
        let next = latch_offer(
            &trade_address,
            &trade.value,
            &offer_address,
            &offer.value,
            &derived,
            &caller,
        )?;

        self.ledger
            .commit(ChangeSet::new().update(trade_address, next, trade.version))
            .await?;

        info!(
            "[es-03] Trade {} accepted offer {} ({})",
            trade_address, offer.value.index, offer_address
        );
        Ok(())
    }

    async fn try_settle(&self, key: SettlementKey) -> EscrowResult<SettlementReceipt> {
        let trade_address = self.deriver.trade(key.trade_index)?.address;
        let trade = self.load_trade(&trade_address).await?;
        let offer_address = self.deriver.offer(&trade_address, key.offer_index)?.address;
        invariant_offer_accepted(&trade_address, &trade.value, &offer_address)?;
        let offer = self.load_offer(&offer_address).await?;

        let ctx = SettlementContext {
            trade_address: &trade_address,
            trade: &trade.value,
            offer_address: &offer_address,
            offer: &offer.value,
        };
        let parent = ctx.parent_of(key.scope);
        let item_address = self
            .deriver
            .asset_item(&parent, key.kind, key.type_index)?
            .address;
        let item = self.load_asset_item(&item_address).await?;
        let recipient = resolve_settlement(&ctx, &key, &item_address, &item.value)?;

        let changes = custody_transfer(ChangeSet::new(), &item.value, recipient);
        let changes = match key.scope {
            Scope::Trade => {
                let mut next = trade.value.clone();
                next.settled_count = bump_settled(next.settled_count)?;
                changes.update(trade_address, next, trade.version)
            }
            Scope::Offer => {
                let mut next = offer.value.clone();
                next.settled_count = bump_settled(next.settled_count)?;
                changes.update(offer_address, next, offer.version)
            }
        };
        let settled = AssetItem {
            settled_to: Some(recipient),
            ..item.value
        };
        self.ledger
            .commit(changes.update(item_address, settled, item.version))
            .await?;

        info!(
            "[es-03] Settled {} ({}) to {}",
            key, item_address, recipient
        );
        Ok(SettlementReceipt {
            key,
            asset_item: item_address,
            recipient,
        })
    }
}

fn bump_settled(count: u32) -> EscrowResult<u32> {
    count
        .checked_add(1)
        .ok_or(EscrowError::CounterOverflow("settled_count"))
}

#[async_trait]
impl<L: Ledger + 'static> EscrowApi for EscrowService<L> {
    #[instrument(skip(self))]
    async fn initialize(&self, payer: Address) -> EscrowResult<Address> {
        let address = self.deriver.authority()?.address;
        let authority = Authority {
            user: payer,
            trade_count: 0,
        };

        match self
            .ledger
            .commit(ChangeSet::new().create(address, authority))
            .await
        {
            Ok(()) => {
                info!("[es-03] Authority initialized at {} by {}", address, payer);
                Ok(address)
            }
            Err(LedgerError::AlreadyExists(_)) => {
                warn!("[es-03] initialize rejected: authority exists at {}", address);
                Err(EscrowError::AlreadyInitialized)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, allowed_users), fields(allowed = allowed_users.len()))]
    async fn create_trade(
        &self,
        creator: Address,
        allowed_users: Vec<Address>,
    ) -> EscrowResult<Created> {
        let allowed_users = &allowed_users;
        self.retrying("create_trade", move || {
            self.try_create_trade(creator, allowed_users.clone())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn create_offer(&self, trade: Address, proposer: Address) -> EscrowResult<Created> {
        self.retrying("create_offer", move || self.try_create_offer(trade, proposer))
            .await
    }

    #[instrument(skip(self, request), fields(scope = %request.scope, parent = %request.parent))]
    async fn add_asset_item(&self, request: AddAssetItem) -> EscrowResult<AssetItemReceipt> {
        let payload = decode(request.type_code, &request.body).map_err(|e| {
            warn!("[es-03] add_asset_item rejected: {}", e);
            EscrowError::from(e)
        })?;
        let request = &request;
        let payload = &payload;
        self.retrying("add_asset_item", move || {
            self.try_add_asset_item(request, payload.clone())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn accept_offer(
        &self,
        trade: Address,
        offer: Address,
        caller: Address,
    ) -> EscrowResult<()> {
        self.retrying("accept_offer", move || {
            self.try_accept_offer(trade, offer, caller)
        })
        .await
    }

    #[instrument(skip(self, key), fields(key = %key))]
    async fn settle(&self, key: SettlementKey) -> EscrowResult<SettlementReceipt> {
        self.retrying("settle", move || self.try_settle(key)).await
    }

    #[instrument(skip(self))]
    async fn settle_remaining(&self, trade: Address) -> EscrowResult<SettlementReport> {
        let pending = self.pending_settlements(trade).await?;
        let mut settled = Vec::with_capacity(pending.len());
        let mut already_settled = Vec::new();

        for key in pending {
            match self.settle(key).await {
                Ok(receipt) => settled.push(receipt),
                Err(EscrowError::AlreadySettled(address)) => {
                    debug!("[es-03] {} finished by another settler", address);
                    already_settled.push(address);
                }
                Err(e) => return Err(e),
            }
        }

        let status = self.trade_status(trade).await?;
        info!(
            "[es-03] Trade {} settlement pass: {} settled, {} already settled, status {}",
            trade,
            settled.len(),
            already_settled.len(),
            status
        );
        Ok(SettlementReport {
            settled,
            already_settled,
            status,
        })
    }

    async fn pending_settlements(&self, trade_address: Address) -> EscrowResult<Vec<SettlementKey>> {
        let trade = self.load_trade(&trade_address).await?.value;
        let offer_address = trade.accepted_offer.ok_or_else(|| {
            EscrowError::OutOfSequence(format!(
                "trade {trade_address} has not accepted an offer"
            ))
        })?;
        let offer = self.load_offer(&offer_address).await?.value;

        let mut keys = Vec::new();
        for (parent, counters) in [
            (trade_address, trade.assets),
            (offer_address, offer.assets),
        ] {
            let addresses =
                self.deriver
                    .asset_items_of(&parent, counters.native_count, counters.token_count)?;
            for entry in addresses {
                let item = self.load_asset_item(&entry.derived.address).await?.value;
                if !item.is_settled() {
                    keys.push(settlement_key(&trade, &offer, &item));
                }
            }
        }
        sort_keys(&mut keys);
        Ok(keys)
    }

    async fn trade_status(&self, trade_address: Address) -> EscrowResult<TradeStatus> {
        let trade = self.load_trade(&trade_address).await?.value;
        let status = match trade.accepted_offer {
            None => trade_status(&trade, None),
            Some(offer_address) => {
                let offer = self.load_offer(&offer_address).await?.value;
                trade_status(&trade, Some(&offer))
            }
        };
        Ok(status)
    }

    async fn authority(&self) -> EscrowResult<Option<Authority>> {
        let address = self.deriver.authority()?.address;
        Ok(self.load_as(&address, pick_authority).await?.map(|v| v.value))
    }

    async fn trade(&self, address: Address) -> EscrowResult<Option<Trade>> {
        Ok(self.load_as(&address, pick_trade).await?.map(|v| v.value))
    }

    async fn offer(&self, address: Address) -> EscrowResult<Option<Offer>> {
        Ok(self.load_as(&address, pick_offer).await?.map(|v| v.value))
    }

    async fn asset_item(&self, address: Address) -> EscrowResult<Option<AssetItem>> {
        Ok(self.load_as(&address, pick_asset_item).await?.map(|v| v.value))
    }
}
