use crate::domain::money::Money;
use crate::domain::order::{Order, OrderResolution, ResolvedOrder};
use crate::domain::ports::{Commission, LedgerStore, LedgerStoreBox};
use crate::domain::pricing::{Catalog, PriceTable};
use crate::domain::settings::{CommissionPolicy, SettingUpdate, Settings};
use crate::domain::topup::{ResolvedTopup, Topup, TopupResolution};
use crate::domain::user::User;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

/// Bounds every call on the wrapped store by a deadline.
///
/// An expired call surfaces as `StoreUnavailable`. The inner operation is
/// dropped, which is safe for the backends here because each of them commits
/// a transition in one step.
pub struct TimeoutLedgerStore {
    inner: LedgerStoreBox,
    limit: Duration,
}

impl TimeoutLedgerStore {
    pub fn new(inner: LedgerStoreBox, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(&self, op: &'static str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, limit_ms = self.limit.as_millis() as u64, "store call timed out");
                Err(LedgerError::StoreUnavailable(format!("{op} timed out")))
            }
        }
    }
}

#[async_trait]
impl LedgerStore for TimeoutLedgerStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.bounded("get_user", self.inner.get_user(user_id)).await
    }

    async fn create_user(&self, user: User) -> Result<bool> {
        self.bounded("create_user", self.inner.create_user(user)).await
    }

    async fn update_profile(&self, user_id: &str, name: &str, username: &str) -> Result<()> {
        self.bounded(
            "update_profile",
            self.inner.update_profile(user_id, name, username),
        )
        .await
    }

    async fn adjust_balance(&self, user_id: &str, delta: Money) -> Result<Money> {
        self.bounded("adjust_balance", self.inner.adjust_balance(user_id, delta))
            .await
    }

    async fn append_order(&self, user_id: &str, order: Order) -> Result<()> {
        self.bounded("append_order", self.inner.append_order(user_id, order))
            .await
    }

    async fn place_order(&self, user_id: &str, order: Order) -> Result<Money> {
        self.bounded("place_order", self.inner.place_order(user_id, order))
            .await
    }

    async fn append_topup(&self, user_id: &str, topup: Topup) -> Result<()> {
        self.bounded("append_topup", self.inner.append_topup(user_id, topup))
            .await
    }

    async fn update_pending_order(
        &self,
        order_id: &str,
        resolution: OrderResolution,
    ) -> Result<ResolvedOrder> {
        self.bounded(
            "update_pending_order",
            self.inner.update_pending_order(order_id, resolution),
        )
        .await
    }

    async fn update_pending_topup(
        &self,
        topup_id: &str,
        resolution: TopupResolution,
    ) -> Result<ResolvedTopup> {
        self.bounded(
            "update_pending_topup",
            self.inner.update_pending_topup(topup_id, resolution),
        )
        .await
    }

    async fn pay_referral_commission(
        &self,
        topup_id: &str,
        percentage: Decimal,
        policy: CommissionPolicy,
    ) -> Result<Option<Commission>> {
        self.bounded(
            "pay_referral_commission",
            self.inner
                .pay_referral_commission(topup_id, percentage, policy),
        )
        .await
    }

    async fn find_pending_topup(&self, user_id: &str, amount: Money) -> Result<Option<String>> {
        self.bounded(
            "find_pending_topup",
            self.inner.find_pending_topup(user_id, amount),
        )
        .await
    }

    async fn count_referrals(&self, referrer_id: &str) -> Result<usize> {
        self.bounded("count_referrals", self.inner.count_referrals(referrer_id))
            .await
    }

    async fn load_authorized_users(&self) -> Result<BTreeSet<String>> {
        self.bounded("load_authorized_users", self.inner.load_authorized_users())
            .await
    }

    async fn add_authorized_user(&self, user_id: &str) -> Result<()> {
        self.bounded(
            "add_authorized_user",
            self.inner.add_authorized_user(user_id),
        )
        .await
    }

    async fn remove_authorized_user(&self, user_id: &str) -> Result<()> {
        self.bounded(
            "remove_authorized_user",
            self.inner.remove_authorized_user(user_id),
        )
        .await
    }

    async fn load_prices(&self, catalog: Catalog) -> Result<PriceTable> {
        self.bounded("load_prices", self.inner.load_prices(catalog))
            .await
    }

    async fn save_prices(&self, catalog: Catalog, prices: PriceTable) -> Result<()> {
        self.bounded("save_prices", self.inner.save_prices(catalog, prices))
            .await
    }

    async fn merge_prices(
        &self,
        catalog: Catalog,
        entries: Vec<(String, Money)>,
    ) -> Result<PriceTable> {
        self.bounded("merge_prices", self.inner.merge_prices(catalog, entries))
            .await
    }

    async fn load_settings(&self) -> Result<Settings> {
        self.bounded("load_settings", self.inner.load_settings())
            .await
    }

    async fn update_setting(&self, update: SettingUpdate) -> Result<Settings> {
        self.bounded("update_setting", self.inner.update_setting(update))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryLedgerStore;

    /// Never answers.
    struct StalledStore;

    #[async_trait]
    impl LedgerStore for StalledStore {
        async fn get_user(&self, _: &str) -> Result<Option<User>> {
            std::future::pending().await
        }
        async fn create_user(&self, _: User) -> Result<bool> {
            std::future::pending().await
        }
        async fn update_profile(&self, _: &str, _: &str, _: &str) -> Result<()> {
            std::future::pending().await
        }
        async fn adjust_balance(&self, _: &str, _: Money) -> Result<Money> {
            std::future::pending().await
        }
        async fn append_order(&self, _: &str, _: Order) -> Result<()> {
            std::future::pending().await
        }
        async fn place_order(&self, _: &str, _: Order) -> Result<Money> {
            std::future::pending().await
        }
        async fn append_topup(&self, _: &str, _: Topup) -> Result<()> {
            std::future::pending().await
        }
        async fn update_pending_order(&self, _: &str, _: OrderResolution) -> Result<ResolvedOrder> {
            std::future::pending().await
        }
        async fn update_pending_topup(&self, _: &str, _: TopupResolution) -> Result<ResolvedTopup> {
            std::future::pending().await
        }
        async fn pay_referral_commission(
            &self,
            _: &str,
            _: Decimal,
            _: CommissionPolicy,
        ) -> Result<Option<Commission>> {
            std::future::pending().await
        }
        async fn find_pending_topup(&self, _: &str, _: Money) -> Result<Option<String>> {
            std::future::pending().await
        }
        async fn count_referrals(&self, _: &str) -> Result<usize> {
            std::future::pending().await
        }
        async fn load_authorized_users(&self) -> Result<BTreeSet<String>> {
            std::future::pending().await
        }
        async fn add_authorized_user(&self, _: &str) -> Result<()> {
            std::future::pending().await
        }
        async fn remove_authorized_user(&self, _: &str) -> Result<()> {
            std::future::pending().await
        }
        async fn load_prices(&self, _: Catalog) -> Result<PriceTable> {
            std::future::pending().await
        }
        async fn save_prices(&self, _: Catalog, _: PriceTable) -> Result<()> {
            std::future::pending().await
        }
        async fn merge_prices(&self, _: Catalog, _: Vec<(String, Money)>) -> Result<PriceTable> {
            std::future::pending().await
        }
        async fn load_settings(&self) -> Result<Settings> {
            std::future::pending().await
        }
        async fn update_setting(&self, _: SettingUpdate) -> Result<Settings> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_stalled_call_becomes_store_unavailable() {
        let store = TimeoutLedgerStore::new(Box::new(StalledStore), Duration::from_millis(20));
        assert!(matches!(
            store.load_settings().await,
            Err(LedgerError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let store = TimeoutLedgerStore::new(
            Box::new(InMemoryLedgerStore::new()),
            Duration::from_secs(1),
        );
        assert!(store.create_user(User::new("1", "A", "a", None)).await.unwrap());
        assert!(store.get_user("1").await.unwrap().is_some());
    }
}
