use crate::domain::money::Money;
use crate::domain::topup::{PaymentMethod, PendingTopupIntent};
use crate::error::{WorkflowError, WorkflowResult};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

/// Declared but not yet submitted top-ups, keyed by user id.
///
/// Entries older than the TTL are treated as absent. They are dropped on
/// access, and every declaration sweeps the whole book.
pub struct IntentBook {
    ttl: TimeDelta,
    entries: Mutex<HashMap<String, PendingTopupIntent>>,
}

impl IntentBook {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn is_live(&self, intent: &PendingTopupIntent, now: DateTime<Utc>) -> bool {
        intent
            .declared_at
            .checked_add_signed(self.ttl)
            .is_none_or(|expires| now < expires)
    }

    /// Records a fresh intent, replacing any earlier one.
    pub async fn declare(&self, user_id: &str, amount: Money) -> PendingTopupIntent {
        let now = Utc::now();
        let intent = PendingTopupIntent {
            amount,
            declared_at: now,
            method: None,
        };
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| self.is_live(entry, now));
        if entries.len() < before {
            tracing::debug!(pruned = before - entries.len(), "expired top-up intents dropped");
        }
        entries.insert(user_id.to_string(), intent.clone());
        intent
    }

    pub async fn get(&self, user_id: &str) -> Option<PendingTopupIntent> {
        let mut entries = self.entries.lock().await;
        let intent = entries.get(user_id)?;
        if self.is_live(intent, Utc::now()) {
            return Some(intent.clone());
        }
        tracing::debug!(%user_id, "top-up intent expired");
        entries.remove(user_id);
        None
    }

    pub async fn contains(&self, user_id: &str) -> bool {
        self.get(user_id).await.is_some()
    }

    /// Attaches a payment method to the live intent declared for `amount`.
    pub async fn select_method(
        &self,
        user_id: &str,
        amount: Money,
        method: PaymentMethod,
    ) -> WorkflowResult<PendingTopupIntent> {
        let mut entries = self.entries.lock().await;
        let now = Utc::now();
        match entries.get_mut(user_id) {
            Some(intent) if intent.amount == amount && self.is_live(intent, now) => {
                intent.method = Some(method);
                Ok(intent.clone())
            }
            _ => Err(WorkflowError::NoPendingIntent),
        }
    }

    /// Removes and returns the live intent, if any.
    pub async fn take(&self, user_id: &str) -> Option<PendingTopupIntent> {
        let intent = self.entries.lock().await.remove(user_id)?;
        self.is_live(&intent, Utc::now()).then_some(intent)
    }

    /// Puts back an intent taken by a submission that did not go through.
    pub async fn restore(&self, user_id: &str, intent: PendingTopupIntent) {
        self.entries
            .lock()
            .await
            .entry(user_id.to_string())
            .or_insert(intent);
    }

    /// Drops the intent; `true` if a live one existed.
    pub async fn discard(&self, user_id: &str) -> bool {
        self.take(user_id).await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_redeclare_replaces_intent() {
        let book = IntentBook::new(Duration::from_secs(1800));
        book.declare("1", Money::new(5000)).await;
        book.declare("1", Money::new(8000)).await;

        assert_eq!(book.get("1").await.unwrap().amount, Money::new(8000));
        assert_eq!(
            book.select_method("1", Money::new(5000), PaymentMethod::Kpay)
                .await,
            Err(WorkflowError::NoPendingIntent)
        );
    }

    #[tokio::test]
    async fn test_select_then_take() {
        let book = IntentBook::new(Duration::from_secs(1800));
        book.declare("1", Money::new(5000)).await;
        book.select_method("1", Money::new(5000), PaymentMethod::Wave)
            .await
            .unwrap();

        let intent = book.take("1").await.unwrap();
        assert_eq!(intent.method, Some(PaymentMethod::Wave));
        assert!(!book.contains("1").await);
    }

    #[tokio::test]
    async fn test_expired_intent_is_gone() {
        let book = IntentBook::new(Duration::ZERO);
        book.declare("1", Money::new(5000)).await;

        assert!(book.get("1").await.is_none());
        assert!(!book.discard("1").await);
    }

    #[tokio::test]
    async fn test_declare_sweeps_abandoned_intents() {
        let book = IntentBook::new(Duration::ZERO);
        book.declare("1", Money::new(5000)).await;
        book.declare("2", Money::new(5000)).await;
        book.declare("3", Money::new(5000)).await;

        let entries = book.entries.lock().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("3"));
    }
}
