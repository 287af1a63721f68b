//! Shared scenario setup.

use es_02_asset_codec::AssetPayload;
use es_03_escrow::{
    AddAssetItem, AssetItemReceipt, Created, EscrowApi, EscrowConfig, EscrowResult, EscrowService,
    InMemoryLedger,
};
use shared_types::{Address, Scope};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Program id every scenario derives under.
pub const PROGRAM_ID: [u8; 32] = [7u8; 32];

/// Starting native balance of every funded party.
pub const STARTING_BALANCE: u64 = 1_000_000;

/// Install a test subscriber once; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An initialized service with funded parties.
pub struct Market {
    /// Service under test.
    pub service: Arc<EscrowService<InMemoryLedger>>,
    /// Ledger behind it.
    pub ledger: Arc<InMemoryLedger>,
    /// Payer of the authority record.
    pub admin: Address,
}

impl Market {
    /// Fresh ledger, initialized authority.
    pub async fn open() -> EscrowResult<Self> {
        Self::open_with(EscrowConfig::with_program_id(Address::new(PROGRAM_ID))).await
    }

    /// Fresh ledger with a custom config.
    pub async fn open_with(config: EscrowConfig) -> EscrowResult<Self> {
        init_tracing();
        let ledger = Arc::new(InMemoryLedger::new());
        let service = Arc::new(EscrowService::new(config, Arc::clone(&ledger)));
        let admin = Address::new_unique();
        service.initialize(admin).await?;
        Ok(Self {
            service,
            ledger,
            admin,
        })
    }

    /// A new party holding `STARTING_BALANCE`.
    pub fn party(&self) -> Address {
        let party = Address::new_unique();
        self.ledger.fund(party, STARTING_BALANCE);
        party
    }

    /// A token account of `mint` owned by `owner`.
    pub fn token_account(&self, mint: Address, owner: Address) -> Address {
        let account = Address::new_unique();
        self.ledger.open_token_account(account, mint, owner);
        account
    }

    /// Escrow `amount` native under `parent`.
    pub async fn escrow_native(
        &self,
        scope: Scope,
        parent: Address,
        depositor: Address,
        amount: u64,
    ) -> EscrowResult<AssetItemReceipt> {
        let request = AddAssetItem::new(scope, parent, depositor, &AssetPayload::Native { amount })?;
        self.service.add_asset_item(request).await
    }

    /// Escrow a token account under `parent`.
    pub async fn escrow_token(
        &self,
        scope: Scope,
        parent: Address,
        depositor: Address,
        mint: Address,
        token_account: Address,
    ) -> EscrowResult<AssetItemReceipt> {
        let payload = AssetPayload::Token {
            mint,
            token_account,
        };
        let request = AddAssetItem::new(scope, parent, depositor, &payload)?;
        self.service.add_asset_item(request).await
    }

    /// Open a trade and one offer on it.
    pub async fn trade_with_offer(
        &self,
        owner: Address,
        bidder: Address,
    ) -> EscrowResult<(Created, Created)> {
        let trade = self.service.create_trade(owner, vec![]).await?;
        let offer = self.service.create_offer(trade.address, bidder).await?;
        Ok((trade, offer))
    }
}
