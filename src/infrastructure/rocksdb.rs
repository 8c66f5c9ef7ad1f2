use crate::domain::money::Money;
use crate::domain::order::{Order, OrderResolution, ResolvedOrder};
use crate::domain::ports::{Commission, LedgerStore};
use crate::domain::pricing::{Catalog, PriceTable};
use crate::domain::settings::{CommissionPolicy, SettingUpdate, Settings};
use crate::domain::topup::{ResolvedTopup, Topup, TopupResolution};
use crate::domain::user::User;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family holding one JSON document per user.
pub const CF_USERS: &str = "users";
/// Column Family for the authorized set, price tables and settings.
pub const CF_GLOBALS: &str = "globals";
/// Column Family mapping order and top-up ids to their owner.
pub const CF_INDEX: &str = "index";

const KEY_AUTHORIZED: &str = "authorized_users";
const KEY_SETTINGS: &str = "settings";

fn prices_key(catalog: Catalog) -> String {
    format!("prices:{catalog}")
}

fn order_key(order_id: &str) -> String {
    format!("order:{order_id}")
}

fn topup_key(topup_id: &str) -> String {
    format!("topup:{topup_id}")
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| LedgerError::Corrupt(format!("serialization: {e}")))
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| LedgerError::Corrupt(format!("{key}: {e}")))
}

/// A persistent ledger backed by RocksDB.
///
/// Reads go straight to the database. Mutations are serialised through a
/// store-wide writer lock and each one commits as a single `WriteBatch`, so a
/// transition either lands completely or not at all.
///
/// `Clone` shares the underlying `Arc<DB>` and the writer lock.
#[derive(Clone)]
pub struct RocksDbLedgerStore {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

impl RocksDbLedgerStore {
    /// Opens or creates a RocksDB instance at `path`, creating the column
    /// families on first use.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_USERS, CF_GLOBALS, CF_INDEX]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, families)?;

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LedgerError::Corrupt(format!("column family {name} not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf: &str, key: &str) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => decode(key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn user(&self, user_id: &str) -> Result<User> {
        self.read(CF_USERS, user_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("user {user_id}")))
    }

    fn owner(&self, key: &str, what: String) -> Result<String> {
        self.read(CF_INDEX, key)?
            .ok_or(LedgerError::NotFound(what))
    }

    fn put_user(&self, batch: &mut WriteBatch, user: &User) -> Result<()> {
        batch.put_cf(self.cf(CF_USERS)?, &user.user_id, encode(user)?);
        Ok(())
    }

    fn put_index(&self, batch: &mut WriteBatch, key: &str, user_id: &str) -> Result<()> {
        batch.put_cf(self.cf(CF_INDEX)?, key, encode(&user_id)?);
        Ok(())
    }

    fn put_global<T: Serialize>(&self, batch: &mut WriteBatch, key: &str, value: &T) -> Result<()> {
        batch.put_cf(self.cf(CF_GLOBALS)?, key, encode(value)?);
        Ok(())
    }

    /// Loads one user, applies `transition` and writes it back, all while
    /// holding the writer lock.
    async fn update_user<T>(
        &self,
        user_id: &str,
        transition: impl FnOnce(&mut User) -> Result<T> + Send,
    ) -> Result<T> {
        let _guard = self.writer.lock().await;
        let mut user = self.user(user_id)?;
        let out = transition(&mut user)?;
        let mut batch = WriteBatch::default();
        self.put_user(&mut batch, &user)?;
        self.db.write(batch)?;
        Ok(out)
    }

    fn settings_or_default(&self) -> Result<Settings> {
        Ok(self.read(CF_GLOBALS, KEY_SETTINGS)?.unwrap_or_default())
    }
}

#[async_trait]
impl LedgerStore for RocksDbLedgerStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.read(CF_USERS, user_id)
    }

    async fn create_user(&self, user: User) -> Result<bool> {
        let _guard = self.writer.lock().await;
        if self.db.get_pinned_cf(self.cf(CF_USERS)?, &user.user_id)?.is_some() {
            return Ok(false);
        }
        let mut batch = WriteBatch::default();
        self.put_user(&mut batch, &user)?;
        self.db.write(batch)?;
        Ok(true)
    }

    async fn update_profile(&self, user_id: &str, name: &str, username: &str) -> Result<()> {
        self.update_user(user_id, |user| {
            user.name = name.to_string();
            user.username = username.to_string();
            Ok(())
        })
        .await
    }

    async fn adjust_balance(&self, user_id: &str, delta: Money) -> Result<Money> {
        self.update_user(user_id, |user| user.adjust_balance(delta))
            .await
    }

    async fn append_order(&self, user_id: &str, order: Order) -> Result<()> {
        let _guard = self.writer.lock().await;
        let mut user = self.user(user_id)?;
        let key = order_key(&order.order_id);
        user.orders.push(order);

        let mut batch = WriteBatch::default();
        self.put_user(&mut batch, &user)?;
        self.put_index(&mut batch, &key, user_id)?;
        self.db.write(batch)?;
        Ok(())
    }

    async fn place_order(&self, user_id: &str, order: Order) -> Result<Money> {
        let _guard = self.writer.lock().await;
        let mut user = self.user(user_id)?;
        let key = order_key(&order.order_id);
        let balance = user.place_order(order)?;

        let mut batch = WriteBatch::default();
        self.put_user(&mut batch, &user)?;
        self.put_index(&mut batch, &key, user_id)?;
        self.db.write(batch)?;
        Ok(balance)
    }

    async fn append_topup(&self, user_id: &str, topup: Topup) -> Result<()> {
        let _guard = self.writer.lock().await;
        let mut user = self.user(user_id)?;
        let key = topup_key(&topup.topup_id);
        user.push_topup(topup)?;

        let mut batch = WriteBatch::default();
        self.put_user(&mut batch, &user)?;
        self.put_index(&mut batch, &key, user_id)?;
        self.db.write(batch)?;
        Ok(())
    }

    async fn update_pending_order(
        &self,
        order_id: &str,
        resolution: OrderResolution,
    ) -> Result<ResolvedOrder> {
        let owner = self.owner(&order_key(order_id), format!("order {order_id}"))?;
        self.update_user(&owner, |user| user.resolve_order(order_id, &resolution))
            .await
    }

    async fn update_pending_topup(
        &self,
        topup_id: &str,
        resolution: TopupResolution,
    ) -> Result<ResolvedTopup> {
        let owner = self.owner(&topup_key(topup_id), format!("topup {topup_id}"))?;
        self.update_user(&owner, |user| user.resolve_topup(topup_id, &resolution))
            .await
    }

    async fn pay_referral_commission(
        &self,
        topup_id: &str,
        percentage: Decimal,
        policy: CommissionPolicy,
    ) -> Result<Option<Commission>> {
        let owner_id = self.owner(&topup_key(topup_id), format!("topup {topup_id}"))?;

        let _guard = self.writer.lock().await;
        let mut owner = self.user(&owner_id)?;
        let Some(referrer_id) = owner.referred_by.clone() else {
            return Ok(None);
        };
        let Some(mut referrer) = self.read::<User>(CF_USERS, &referrer_id)? else {
            tracing::warn!(%referrer_id, %owner_id, "referrer record missing, commission skipped");
            return Ok(None);
        };

        let Some(base) = owner.claim_commission(topup_id, policy)? else {
            return Ok(None);
        };
        let amount = base.percent(percentage);
        if !amount.is_positive() {
            return Ok(None);
        }
        referrer.credit_commission(amount)?;

        let mut batch = WriteBatch::default();
        self.put_user(&mut batch, &owner)?;
        self.put_user(&mut batch, &referrer)?;
        self.db.write(batch)?;

        Ok(Some(Commission {
            referrer_id,
            referred_id: owner_id,
            topup_id: topup_id.to_string(),
            amount,
            referrer_balance: referrer.balance,
        }))
    }

    async fn find_pending_topup(&self, user_id: &str, amount: Money) -> Result<Option<String>> {
        let user: Option<User> = self.read(CF_USERS, user_id)?;
        Ok(user.and_then(|user| {
            user.topups
                .into_iter()
                .find(|t| t.is_pending() && t.amount == amount)
                .map(|t| t.topup_id)
        }))
    }

    async fn count_referrals(&self, referrer_id: &str) -> Result<usize> {
        let mut count = 0;
        for item in self.db.iterator_cf(self.cf(CF_USERS)?, IteratorMode::Start) {
            let (key, value) = item?;
            let user: User = decode(&String::from_utf8_lossy(&key), &value)?;
            if user.referred_by.as_deref() == Some(referrer_id) {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn load_authorized_users(&self) -> Result<BTreeSet<String>> {
        Ok(self.read(CF_GLOBALS, KEY_AUTHORIZED)?.unwrap_or_default())
    }

    async fn add_authorized_user(&self, user_id: &str) -> Result<()> {
        let _guard = self.writer.lock().await;
        let mut authorized: BTreeSet<String> =
            self.read(CF_GLOBALS, KEY_AUTHORIZED)?.unwrap_or_default();
        if authorized.insert(user_id.to_string()) {
            let mut batch = WriteBatch::default();
            self.put_global(&mut batch, KEY_AUTHORIZED, &authorized)?;
            self.db.write(batch)?;
        }
        Ok(())
    }

    async fn remove_authorized_user(&self, user_id: &str) -> Result<()> {
        let _guard = self.writer.lock().await;
        let mut authorized: BTreeSet<String> =
            self.read(CF_GLOBALS, KEY_AUTHORIZED)?.unwrap_or_default();
        if authorized.remove(user_id) {
            let mut batch = WriteBatch::default();
            self.put_global(&mut batch, KEY_AUTHORIZED, &authorized)?;
            self.db.write(batch)?;
        }
        Ok(())
    }

    async fn load_prices(&self, catalog: Catalog) -> Result<PriceTable> {
        Ok(self.read(CF_GLOBALS, &prices_key(catalog))?.unwrap_or_default())
    }

    async fn save_prices(&self, catalog: Catalog, prices: PriceTable) -> Result<()> {
        let _guard = self.writer.lock().await;
        let mut batch = WriteBatch::default();
        self.put_global(&mut batch, &prices_key(catalog), &prices)?;
        self.db.write(batch)?;
        Ok(())
    }

    async fn merge_prices(
        &self,
        catalog: Catalog,
        entries: Vec<(String, Money)>,
    ) -> Result<PriceTable> {
        let key = prices_key(catalog);
        let _guard = self.writer.lock().await;
        let mut table: PriceTable = self.read(CF_GLOBALS, &key)?.unwrap_or_default();
        table.extend(entries);
        let mut batch = WriteBatch::default();
        self.put_global(&mut batch, &key, &table)?;
        self.db.write(batch)?;
        Ok(table)
    }

    async fn load_settings(&self) -> Result<Settings> {
        if let Some(settings) = self.read(CF_GLOBALS, KEY_SETTINGS)? {
            return Ok(settings);
        }
        let _guard = self.writer.lock().await;
        let settings = self.settings_or_default()?;
        let mut batch = WriteBatch::default();
        self.put_global(&mut batch, KEY_SETTINGS, &settings)?;
        self.db.write(batch)?;
        Ok(settings)
    }

    async fn update_setting(&self, update: SettingUpdate) -> Result<Settings> {
        let _guard = self.writer.lock().await;
        let mut settings = self.settings_or_default()?;
        update.apply(&mut settings);
        let mut batch = WriteBatch::default();
        self.put_global(&mut batch, KEY_SETTINGS, &settings)?;
        self.db.write(batch)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{GameAccount, OrderDecision, OrderStatus};
    use crate::domain::settings::Feature;
    use crate::domain::topup::{PaymentMethod, TopupDecision, TopupStatus};
    use chrono::Utc;
    use tempfile::tempdir;

    fn order(id: &str, price: i64) -> Order {
        Order {
            order_id: id.into(),
            account: GameAccount::Pubg {
                player_id: "51234567".into(),
            },
            amount: "60uc".into(),
            price: Money::new(price),
            status: OrderStatus::Pending,
            timestamp: Utc::now(),
            user_id: "1".into(),
            chat_id: 1,
            resolved_by: None,
            resolved_at: None,
        }
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDbLedgerStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_USERS).is_some());
        assert!(store.db.cf_handle(CF_GLOBALS).is_some());
        assert!(store.db.cf_handle(CF_INDEX).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_order_lifecycle() {
        let dir = tempdir().unwrap();
        let store = RocksDbLedgerStore::open(dir.path()).unwrap();

        store.create_user(User::new("1", "A", "a", None)).await.unwrap();
        store.adjust_balance("1", Money::new(2000)).await.unwrap();
        let balance = store.place_order("1", order("ORD1", 1500)).await.unwrap();
        assert_eq!(balance, Money::new(500));

        let resolved = store
            .update_pending_order(
                "ORD1",
                OrderResolution {
                    decision: OrderDecision::Cancel,
                    admin: "admin".into(),
                    at: Utc::now(),
                },
            )
            .await
            .unwrap();
        assert_eq!(resolved.new_balance, Money::new(2000));

        let user = store.get_user("1").await.unwrap().unwrap();
        assert_eq!(user.orders[0].status, OrderStatus::Cancelled);
        assert_eq!(user.orders[0].resolved_by.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_rocksdb_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDbLedgerStore::open(dir.path()).unwrap();
            store.create_user(User::new("1", "A", "a", None)).await.unwrap();
            store
                .append_topup(
                    "1",
                    Topup {
                        topup_id: "TOP1".into(),
                        amount: Money::new(5000),
                        payment_method: PaymentMethod::Wave,
                        proof_file_id: "photo".into(),
                        status: TopupStatus::Pending,
                        timestamp: Utc::now(),
                        user_id: "1".into(),
                        chat_id: 1,
                        resolved_by: None,
                        resolved_at: None,
                        commission_paid: false,
                    },
                )
                .await
                .unwrap();
            store.add_authorized_user("1").await.unwrap();
            store
                .update_setting(SettingUpdate::Maintenance(Feature::Topups, false))
                .await
                .unwrap();
        }

        let store = RocksDbLedgerStore::open(dir.path()).unwrap();
        let resolved = store
            .update_pending_topup(
                "TOP1",
                TopupResolution {
                    decision: TopupDecision::Approve,
                    admin: "admin".into(),
                    at: Utc::now(),
                },
            )
            .await
            .unwrap();
        assert_eq!(resolved.new_balance, Money::new(5000));
        assert!(store.load_authorized_users().await.unwrap().contains("1"));
        assert!(!store.load_settings().await.unwrap().maintenance.topups);
    }

    #[tokio::test]
    async fn test_rocksdb_corrupt_record_is_reported() {
        let dir = tempdir().unwrap();
        let store = RocksDbLedgerStore::open(dir.path()).unwrap();
        store
            .db
            .put_cf(store.cf(CF_USERS).unwrap(), "1", b"not json")
            .unwrap();

        assert!(matches!(
            store.get_user("1").await,
            Err(LedgerError::Corrupt(_))
        ));
    }
}
