use crate::domain::money::Money;
use crate::domain::order::{Order, OrderResolution, ResolvedOrder};
use crate::domain::ports::{Commission, LedgerStore};
use crate::domain::pricing::{Catalog, PriceTable};
use crate::domain::settings::{CommissionPolicy, SettingUpdate, Settings};
use crate::domain::topup::{ResolvedTopup, Topup, TopupResolution};
use crate::domain::user::User;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    users: HashMap<String, User>,
    /// order id -> owning user id
    orders: HashMap<String, String>,
    /// topup id -> owning user id
    topups: HashMap<String, String>,
    authorized: BTreeSet<String>,
    prices: HashMap<Catalog, PriceTable>,
    settings: Option<Settings>,
}

impl LedgerState {
    fn user_mut(&mut self, user_id: &str) -> Result<&mut User> {
        self.users
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::NotFound(format!("user {user_id}")))
    }

    fn owner_of(index: &HashMap<String, String>, kind: &str, id: &str) -> Result<String> {
        index
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("{kind} {id}")))
    }
}

/// A thread-safe in-memory ledger.
///
/// Every operation runs under one write guard over the whole state, which is
/// what makes the conditional transitions atomic. Clones share the state.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(user_id).cloned())
    }

    async fn create_user(&self, user: User) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.users.contains_key(&user.user_id) {
            return Ok(false);
        }
        state.users.insert(user.user_id.clone(), user);
        Ok(true)
    }

    async fn update_profile(&self, user_id: &str, name: &str, username: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let user = state.user_mut(user_id)?;
        user.name = name.to_string();
        user.username = username.to_string();
        Ok(())
    }

    async fn adjust_balance(&self, user_id: &str, delta: Money) -> Result<Money> {
        let mut state = self.state.write().await;
        state.user_mut(user_id)?.adjust_balance(delta)
    }

    async fn append_order(&self, user_id: &str, order: Order) -> Result<()> {
        let mut state = self.state.write().await;
        let order_id = order.order_id.clone();
        state.user_mut(user_id)?.orders.push(order);
        state.orders.insert(order_id, user_id.to_string());
        Ok(())
    }

    async fn place_order(&self, user_id: &str, order: Order) -> Result<Money> {
        let mut state = self.state.write().await;
        let order_id = order.order_id.clone();
        let balance = state.user_mut(user_id)?.place_order(order)?;
        state.orders.insert(order_id, user_id.to_string());
        Ok(balance)
    }

    async fn append_topup(&self, user_id: &str, topup: Topup) -> Result<()> {
        let mut state = self.state.write().await;
        let topup_id = topup.topup_id.clone();
        state.user_mut(user_id)?.push_topup(topup)?;
        state.topups.insert(topup_id, user_id.to_string());
        Ok(())
    }

    async fn update_pending_order(
        &self,
        order_id: &str,
        resolution: OrderResolution,
    ) -> Result<ResolvedOrder> {
        let mut state = self.state.write().await;
        let owner = LedgerState::owner_of(&state.orders, "order", order_id)?;
        state.user_mut(&owner)?.resolve_order(order_id, &resolution)
    }

    async fn update_pending_topup(
        &self,
        topup_id: &str,
        resolution: TopupResolution,
    ) -> Result<ResolvedTopup> {
        let mut state = self.state.write().await;
        let owner = LedgerState::owner_of(&state.topups, "topup", topup_id)?;
        state.user_mut(&owner)?.resolve_topup(topup_id, &resolution)
    }

    async fn pay_referral_commission(
        &self,
        topup_id: &str,
        percentage: Decimal,
        policy: CommissionPolicy,
    ) -> Result<Option<Commission>> {
        let mut state = self.state.write().await;
        let owner_id = LedgerState::owner_of(&state.topups, "topup", topup_id)?;

        let Some(referrer_id) = state.user_mut(&owner_id)?.referred_by.clone() else {
            return Ok(None);
        };
        if !state.users.contains_key(&referrer_id) {
            tracing::warn!(%referrer_id, %owner_id, "referrer record missing, commission skipped");
            return Ok(None);
        }

        // Claimed on a copy so a failed credit leaves the owner untouched.
        let mut owner = state.user_mut(&owner_id)?.clone();
        let Some(base) = owner.claim_commission(topup_id, policy)? else {
            return Ok(None);
        };
        let amount = base.percent(percentage);
        if !amount.is_positive() {
            return Ok(None);
        }

        let referrer_balance = state.user_mut(&referrer_id)?.credit_commission(amount)?;
        state.users.insert(owner_id.clone(), owner);

        Ok(Some(Commission {
            referrer_id,
            referred_id: owner_id,
            topup_id: topup_id.to_string(),
            amount,
            referrer_balance,
        }))
    }

    async fn find_pending_topup(&self, user_id: &str, amount: Money) -> Result<Option<String>> {
        let state = self.state.read().await;
        Ok(state.users.get(user_id).and_then(|user| {
            user.topups
                .iter()
                .find(|t| t.is_pending() && t.amount == amount)
                .map(|t| t.topup_id.clone())
        }))
    }

    async fn count_referrals(&self, referrer_id: &str) -> Result<usize> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.referred_by.as_deref() == Some(referrer_id))
            .count())
    }

    async fn load_authorized_users(&self) -> Result<BTreeSet<String>> {
        let state = self.state.read().await;
        Ok(state.authorized.clone())
    }

    async fn add_authorized_user(&self, user_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.authorized.insert(user_id.to_string());
        Ok(())
    }

    async fn remove_authorized_user(&self, user_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.authorized.remove(user_id);
        Ok(())
    }

    async fn load_prices(&self, catalog: Catalog) -> Result<PriceTable> {
        let state = self.state.read().await;
        Ok(state.prices.get(&catalog).cloned().unwrap_or_default())
    }

    async fn save_prices(&self, catalog: Catalog, prices: PriceTable) -> Result<()> {
        let mut state = self.state.write().await;
        state.prices.insert(catalog, prices);
        Ok(())
    }

    async fn merge_prices(
        &self,
        catalog: Catalog,
        entries: Vec<(String, Money)>,
    ) -> Result<PriceTable> {
        let mut state = self.state.write().await;
        let table = state.prices.entry(catalog).or_default();
        table.extend(entries);
        Ok(table.clone())
    }

    async fn load_settings(&self) -> Result<Settings> {
        let mut state = self.state.write().await;
        Ok(state.settings.get_or_insert_with(Settings::default).clone())
    }

    async fn update_setting(&self, update: SettingUpdate) -> Result<Settings> {
        let mut state = self.state.write().await;
        let settings = state.settings.get_or_insert_with(Settings::default);
        update.apply(settings);
        Ok(settings.clone())
    }
}
