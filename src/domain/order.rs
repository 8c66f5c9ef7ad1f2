use super::money::Money;
use super::pricing::Catalog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// The in-game account an order is delivered to.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum GameAccount {
    Mlbb { game_id: String, server_id: String },
    Pubg { player_id: String },
}

impl GameAccount {
    pub fn catalog(&self) -> Catalog {
        match self {
            GameAccount::Mlbb { .. } => Catalog::Mlbb,
            GameAccount::Pubg { .. } => Catalog::Pubg,
        }
    }
}

impl fmt::Display for GameAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameAccount::Mlbb { game_id, server_id } => write!(f, "{game_id} ({server_id})"),
            GameAccount::Pubg { player_id } => write!(f, "{player_id}"),
        }
    }
}

/// A purchase embedded in a user's record.
///
/// `price` is captured when the order is placed and is the only amount ever
/// refunded for it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Order {
    pub order_id: String,
    #[serde(flatten)]
    pub account: GameAccount,
    /// SKU key, e.g. `86` or `wp3`.
    pub amount: String,
    pub price: Money,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub chat_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDecision {
    Confirm,
    Cancel,
}

impl OrderDecision {
    pub fn status(&self) -> OrderStatus {
        match self {
            OrderDecision::Confirm => OrderStatus::Confirmed,
            OrderDecision::Cancel => OrderStatus::Cancelled,
        }
    }
}

/// The admin action applied to a pending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderResolution {
    pub decision: OrderDecision,
    pub admin: String,
    pub at: DateTime<Utc>,
}

/// What the store reports after resolving an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOrder {
    pub order: Order,
    /// Amount credited back to the purchaser (zero unless cancelled).
    pub refunded: Money,
    pub new_balance: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_serializes_flat_game_account() {
        let order = Order {
            order_id: "ORD1".into(),
            account: GameAccount::Mlbb {
                game_id: "12345678".into(),
                server_id: "1234".into(),
            },
            amount: "86".into(),
            price: Money::new(5100),
            status: OrderStatus::Pending,
            timestamp: Utc::now(),
            user_id: "42".into(),
            chat_id: 42,
            resolved_by: None,
            resolved_at: None,
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["game"], "mlbb");
        assert_eq!(json["game_id"], "12345678");
        assert_eq!(json["status"], "pending");
        assert!(json.get("resolved_by").is_none());

        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn test_decision_status() {
        assert_eq!(OrderDecision::Confirm.status(), OrderStatus::Confirmed);
        assert_eq!(OrderDecision::Cancel.status(), OrderStatus::Cancelled);
    }
}
