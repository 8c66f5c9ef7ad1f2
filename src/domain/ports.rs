use super::money::Money;
use super::order::{Order, OrderResolution, ResolvedOrder};
use super::pricing::{Catalog, PriceTable};
use super::settings::{CommissionPolicy, SettingUpdate, Settings};
use super::topup::{ResolvedTopup, Topup, TopupResolution};
use super::user::User;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// A commission credited to a referrer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commission {
    pub referrer_id: String,
    pub referred_id: String,
    pub topup_id: String,
    pub amount: Money,
    pub referrer_balance: Money,
}

/// Persisted state of the storefront.
///
/// Each method is atomic with respect to every other method on the same
/// store. State transitions are conditional inside the store; callers never
/// read a record, modify it and write it back.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// Inserts a fresh user. Returns `false` (and changes nothing) if the id
    /// already exists.
    async fn create_user(&self, user: User) -> Result<bool>;

    async fn update_profile(&self, user_id: &str, name: &str, username: &str) -> Result<()>;

    /// Applies `delta` and returns the new balance; a result below zero is
    /// refused with `InsufficientBalance`.
    async fn adjust_balance(&self, user_id: &str, delta: Money) -> Result<Money>;

    async fn append_order(&self, user_id: &str, order: Order) -> Result<()>;

    /// Debits `order.price` and appends the order in one step.
    async fn place_order(&self, user_id: &str, order: Order) -> Result<Money>;

    /// Appends a top-up; `Conflict` if one is already pending for the user.
    async fn append_topup(&self, user_id: &str, topup: Topup) -> Result<()>;

    /// Resolves a pending order. `NotFound` for unknown ids, `Conflict` if it
    /// is no longer pending.
    async fn update_pending_order(
        &self,
        order_id: &str,
        resolution: OrderResolution,
    ) -> Result<ResolvedOrder>;

    /// Resolves a pending top-up, crediting its stored amount on approval.
    async fn update_pending_topup(
        &self,
        topup_id: &str,
        resolution: TopupResolution,
    ) -> Result<ResolvedTopup>;

    /// Pays the referrer of the top-up's owner at most once per top-up.
    async fn pay_referral_commission(
        &self,
        topup_id: &str,
        percentage: Decimal,
        policy: CommissionPolicy,
    ) -> Result<Option<Commission>>;

    async fn find_pending_topup(&self, user_id: &str, amount: Money) -> Result<Option<String>>;

    async fn count_referrals(&self, referrer_id: &str) -> Result<usize>;

    async fn load_authorized_users(&self) -> Result<BTreeSet<String>>;
    async fn add_authorized_user(&self, user_id: &str) -> Result<()>;
    async fn remove_authorized_user(&self, user_id: &str) -> Result<()>;

    async fn load_prices(&self, catalog: Catalog) -> Result<PriceTable>;
    async fn save_prices(&self, catalog: Catalog, prices: PriceTable) -> Result<()>;
    /// Overlays `entries` on the stored table in one step and returns the
    /// result, so concurrent price edits never drop each other.
    async fn merge_prices(&self, catalog: Catalog, entries: Vec<(String, Money)>)
    -> Result<PriceTable>;

    /// Returns the settings document, creating it with defaults if absent.
    async fn load_settings(&self) -> Result<Settings>;
    async fn update_setting(&self, update: SettingUpdate) -> Result<Settings>;
}

pub type LedgerStoreBox = Box<dyn LedgerStore>;
